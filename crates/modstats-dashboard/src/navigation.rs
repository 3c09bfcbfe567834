//! Dashboard deep links

use modstats_core::{Error, ModeratorId, Result};
use url::Url;

/// Query parameter naming the moderator to open
pub const MODERATOR_PARAM: &str = "mod";

/// A parsed dashboard URL such as `http://host:3000/?mod=2`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardLink {
    /// API server root, the link's origin
    pub api_base: Url,
    /// Moderator to open in the detail view
    pub moderator: Option<ModeratorId>,
}

impl DashboardLink {
    /// Parse a dashboard URL
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedInput`] if the URL cannot be parsed, has no
    /// host, or carries a `mod` value that is not a positive integer.
    pub fn parse(raw: &str) -> Result<Self> {
        let url = Url::parse(raw).map_err(|e| Error::malformed("url", e.to_string()))?;
        if !url.has_host() {
            return Err(Error::malformed("url", format!("'{raw}' has no host")));
        }

        let moderator = moderator_param(&url)?;
        let api_base = Url::parse(&url.origin().ascii_serialization())
            .map_err(|e| Error::malformed("url", e.to_string()))?;

        Ok(Self { api_base, moderator })
    }
}

/// The `mod` query parameter, if present
///
/// # Errors
///
/// Returns [`Error::MalformedInput`] if the value is not a positive integer.
pub fn moderator_param(url: &Url) -> Result<Option<ModeratorId>> {
    url.query_pairs()
        .find(|(key, _)| key == MODERATOR_PARAM)
        .map(|(_, value)| value.parse::<ModeratorId>())
        .transpose()
}
