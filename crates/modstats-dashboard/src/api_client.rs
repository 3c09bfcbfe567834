//! HTTP client for the moderator statistics API

use crate::state::DashboardData;
use async_trait::async_trait;
use modstats_core::{Error, ErrorResponse, ModeratorId, ModeratorRecord, RankingMetric, Result};
use reqwest::{Client, Response, StatusCode, header};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

pub use modstats_api::handlers::moderators::SNAPSHOT_VERSION_HEADER;
pub use modstats_api::handlers::stats::StatsResponse;

/// Fetches to attempt when the listed snapshot is evicted before its stats
/// are requested
const SNAPSHOT_ATTEMPTS: usize = 2;

const SNAPSHOT_EXPIRED_CODE: &str = "SNAPSHOT_EXPIRED";

/// Where the dashboard gets its data
#[async_trait]
pub trait DashboardSource: Send + Sync + 'static {
    /// Fetch the record list and the statistics for that same snapshot
    ///
    /// # Errors
    ///
    /// Returns [`Error::NetworkFailure`] for any transport, status or decode
    /// failure.
    async fn fetch_dashboard(&self, metric: &RankingMetric) -> Result<DashboardData>;
}

/// API client for the moderator statistics server
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    base_url: Url,
}

impl ApiClient {
    /// Create a new API client with a per-request timeout
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(base_url: Url, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::network(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self { client, base_url })
    }

    /// Base URL requests are resolved against
    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Get every moderator and the snapshot version they came from
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails, the response is not a success,
    /// or the snapshot header is missing.
    pub async fn get_moderators(&self) -> Result<(u64, Vec<ModeratorRecord>)> {
        let response = self.get(self.endpoint("api/moderators")?).await?;
        let response = check_status(response).await.map_err(Error::from)?;

        let version = response
            .headers()
            .get(SNAPSHOT_VERSION_HEADER)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.parse::<u64>().ok())
            .ok_or_else(|| Error::network("Response is missing a valid X-Snapshot-Version header"))?;

        let records = response
            .json::<Vec<ModeratorRecord>>()
            .await
            .map_err(|e| Error::network(format!("Failed to parse moderators: {e}")))?;

        Ok((version, records))
    }

    /// Get statistics, pinned to `snapshot` when given
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the response cannot be parsed.
    pub async fn get_stats(
        &self,
        metric: &RankingMetric,
        snapshot: Option<u64>,
    ) -> Result<StatsResponse> {
        Ok(self.fetch_stats(metric, snapshot).await?)
    }

    /// Download one moderator's CSV export, or everyone's when `id` is `None`
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server answers with an
    /// error status, such as 404 for an unknown id.
    pub async fn export_csv(&self, id: Option<ModeratorId>) -> Result<CsvExport> {
        let url = match id {
            Some(id) => self.endpoint(&format!("api/stats/export/{id}"))?,
            None => self.endpoint("api/stats/export")?,
        };
        let response = self.get(url).await?;
        let response = check_status(response).await.map_err(Error::from)?;

        let filename = response
            .headers()
            .get(header::CONTENT_DISPOSITION)
            .and_then(|value| value.to_str().ok())
            .and_then(attachment_filename)
            .unwrap_or_else(|| match id {
                Some(id) => format!("moderator_{id}_stats.csv"),
                None => "all_moderators_stats.csv".to_string(),
            });

        let body = response
            .text()
            .await
            .map_err(|e| Error::network(format!("Failed to read export: {e}")))?;

        Ok(CsvExport { filename, body })
    }

    async fn fetch_stats(
        &self,
        metric: &RankingMetric,
        snapshot: Option<u64>,
    ) -> std::result::Result<StatsResponse, StatsFailure> {
        let response = self.get(self.stats_url(metric, snapshot)?).await?;
        let response = check_status(response).await?;

        response
            .json::<StatsResponse>()
            .await
            .map_err(|e| Error::network(format!("Failed to parse stats: {e}")).into())
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .map_err(|e| Error::malformed("api_base_url", e.to_string()))
    }

    fn stats_url(&self, metric: &RankingMetric, snapshot: Option<u64>) -> Result<Url> {
        let mut url = self.endpoint("api/stats")?;
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("metric", metric.as_str());
            if let Some(version) = snapshot {
                query.append_pair("snapshot", &version.to_string());
            }
        }
        Ok(url)
    }

    async fn get(&self, url: Url) -> Result<Response> {
        debug!("GET {}", url);
        self.client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| Error::network(format!("Request to {url} failed: {e}")))
    }
}

#[async_trait]
impl DashboardSource for ApiClient {
    async fn fetch_dashboard(&self, metric: &RankingMetric) -> Result<DashboardData> {
        let mut last_error = None;

        for attempt in 1..=SNAPSHOT_ATTEMPTS {
            let (version, moderators) = self.get_moderators().await?;

            match self.fetch_stats(metric, Some(version)).await {
                Ok(response) => {
                    return Ok(DashboardData {
                        snapshot_version: response.snapshot_version,
                        moderators,
                        stats: response.stats,
                    });
                }
                Err(StatsFailure::Status(failure)) if failure.is_snapshot_expired() => {
                    warn!(
                        "Snapshot v{} expired before stats were fetched (attempt {})",
                        version, attempt
                    );
                    last_error = Some(Error::from(failure));
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(last_error.unwrap_or_else(|| Error::network("Snapshot kept expiring")))
    }
}

/// A downloaded CSV export and the file name the server offered
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvExport {
    /// Bare file name, never a path
    pub filename: String,
    /// CSV text
    pub body: String,
}

impl CsvExport {
    /// Write the CSV into `dir` under the offered file name
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the file cannot be written.
    pub async fn save_in(&self, dir: &Path) -> Result<PathBuf> {
        let path = dir.join(&self.filename);
        tokio::fs::write(&path, &self.body).await?;
        info!("Saved export to {}", path.display());
        Ok(path)
    }
}

/// `filename` from an `attachment; filename="..."` header, stripped of any
/// directory part
fn attachment_filename(disposition: &str) -> Option<String> {
    let (_, rest) = disposition.split_once("filename=")?;
    let name = rest.split(';').next()?.trim().trim_matches('"');
    let name = name.rsplit(['/', '\\']).next()?;

    (!name.is_empty() && name != "." && name != "..").then(|| name.to_string())
}

/// A non-success response, with the error code from its body when it had one
#[derive(Debug)]
struct HttpFailure {
    status: StatusCode,
    code: Option<String>,
    detail: String,
}

impl HttpFailure {
    fn is_snapshot_expired(&self) -> bool {
        self.status == StatusCode::GONE && self.code.as_deref() == Some(SNAPSHOT_EXPIRED_CODE)
    }
}

impl From<HttpFailure> for Error {
    fn from(failure: HttpFailure) -> Self {
        Self::network(format!(
            "API returned {}: {}",
            failure.status.as_u16(),
            failure.detail
        ))
    }
}

#[derive(Debug)]
enum StatsFailure {
    Status(HttpFailure),
    Other(Error),
}

impl From<HttpFailure> for StatsFailure {
    fn from(failure: HttpFailure) -> Self {
        Self::Status(failure)
    }
}

impl From<Error> for StatsFailure {
    fn from(err: Error) -> Self {
        Self::Other(err)
    }
}

impl From<StatsFailure> for Error {
    fn from(failure: StatsFailure) -> Self {
        match failure {
            StatsFailure::Status(failure) => failure.into(),
            StatsFailure::Other(err) => err,
        }
    }
}

async fn check_status(response: Response) -> std::result::Result<Response, HttpFailure> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let (code, detail) = match response.json::<ErrorResponse>().await {
        Ok(body) => {
            let detail = format!("{} ({})", body.error, body.code);
            (Some(body.code), detail)
        }
        Err(_) => (
            None,
            status
                .canonical_reason()
                .unwrap_or("unknown error")
                .to_string(),
        ),
    };

    Err(HttpFailure {
        status,
        code,
        detail,
    })
}

#[cfg(test)]
#[allow(clippy::missing_panics_doc)]
mod tests {
    use super::*;

    fn client(base: &str) -> ApiClient {
        ApiClient::new(Url::parse(base).unwrap(), Duration::from_secs(1)).unwrap()
    }

    #[test]
    fn test_stats_url_carries_metric_and_snapshot() {
        let url = client("http://localhost:3000")
            .stats_url(&RankingMetric::Action("warnings".to_string()), Some(4))
            .unwrap();
        assert_eq!(
            url.as_str(),
            "http://localhost:3000/api/stats?metric=warnings&snapshot=4"
        );
    }

    #[test]
    fn test_endpoints_respect_base_path() {
        let url = client("http://localhost:3000/dashboard/")
            .endpoint("api/moderators")
            .unwrap();
        assert_eq!(url.as_str(), "http://localhost:3000/dashboard/api/moderators");
    }

    fn failure(status: StatusCode, code: Option<&str>, detail: &str) -> HttpFailure {
        HttpFailure {
            status,
            code: code.map(str::to_string),
            detail: detail.to_string(),
        }
    }

    #[test]
    fn test_snapshot_expired_needs_gone_and_code() {
        assert!(failure(StatusCode::GONE, Some("SNAPSHOT_EXPIRED"), "gone").is_snapshot_expired());
        assert!(!failure(StatusCode::GONE, None, "Gone").is_snapshot_expired());
        assert!(!failure(StatusCode::GONE, Some("NOT_FOUND"), "SNAPSHOT_EXPIRED").is_snapshot_expired());
        assert!(
            !failure(
                StatusCode::INTERNAL_SERVER_ERROR,
                Some("SNAPSHOT_EXPIRED"),
                "SNAPSHOT_EXPIRED"
            )
            .is_snapshot_expired()
        );
    }

    #[test]
    fn test_failure_message_keeps_status_and_detail() {
        let err = Error::from(failure(
            StatusCode::INTERNAL_SERVER_ERROR,
            Some("STORAGE_UNAVAILABLE"),
            "Record store unavailable (STORAGE_UNAVAILABLE)",
        ));
        assert_eq!(
            err.to_string(),
            "Network failure: API returned 500: Record store unavailable (STORAGE_UNAVAILABLE)"
        );
    }

    #[test]
    fn test_attachment_filename() {
        assert_eq!(
            attachment_filename("attachment; filename=\"Bob_stats.csv\"").as_deref(),
            Some("Bob_stats.csv")
        );
        assert_eq!(
            attachment_filename("attachment; filename=\"../../etc/passwd\"").as_deref(),
            Some("passwd")
        );
        assert_eq!(attachment_filename("attachment; filename=\"..\""), None);
        assert_eq!(attachment_filename("inline"), None);
    }
}
