//! CSV export of the current snapshot or a single moderator

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use modstats_core::{ModeratorId, ModeratorRecord, utils::humanize_action_key};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{error, info};

/// File name offered to browsers
pub const EXPORT_FILENAME: &str = "all_moderators_stats.csv";

/// Export every moderator in the current snapshot as CSV
///
/// One column per action type present in the snapshot, sorted by key, with
/// zero for moderators that never recorded that action.
///
/// # Errors
///
/// Returns 500 if the store fails or the CSV cannot be written.
pub async fn export_moderators_csv(State(state): State<Arc<AppState>>) -> ApiResult<Response> {
    let snapshot = state.snapshots.current(&state.pool).await?;
    let body = render_csv(&snapshot.records)?;

    info!(
        "Exported {} moderators from snapshot v{}",
        snapshot.records.len(),
        snapshot.version
    );

    Ok(csv_response(EXPORT_FILENAME, body))
}

/// Export one moderator, read straight from the store
///
/// Same columns as the full export, restricted to this moderator's own
/// action types. The file is offered as `<name>_stats.csv`.
///
/// # Errors
///
/// Returns 400 `MALFORMED_ID` for an id that is not a positive integer,
/// 404 `NOT_FOUND` for an unknown id, and 500 if the store fails.
pub async fn export_moderator_csv(
    State(state): State<Arc<AppState>>,
    Path(raw_id): Path<String>,
) -> ApiResult<Response> {
    let id: ModeratorId = raw_id
        .parse()
        .map_err(|_| ApiError::malformed_id(format!("'{raw_id}' is not a positive integer id")))?;

    let record = modstats_database::get_moderator(&state.pool, id).await?;
    let body = render_csv(std::slice::from_ref(&record))?;

    info!("Exported moderator {} ({})", id, record.name);
    Ok(csv_response(&moderator_filename(&record.name), body))
}

/// `<name>_stats.csv`, with anything outside `[A-Za-z0-9_-]` replaced by `_`
#[must_use]
pub fn moderator_filename(name: &str) -> String {
    let stem: String = name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect();
    format!("{stem}_stats.csv")
}

fn csv_response(filename: &str, body: String) -> Response {
    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        body,
    )
        .into_response()
}

/// Render records as CSV text
///
/// # Errors
///
/// Returns an internal error if the writer fails.
pub fn render_csv(records: &[ModeratorRecord]) -> ApiResult<String> {
    let action_types: BTreeSet<&str> = records
        .iter()
        .flat_map(|r| r.action_counts.keys().map(String::as_str))
        .collect();

    let mut writer = csv::Writer::from_writer(Vec::new());

    let mut header_row = vec![
        "ID".to_string(),
        "Moderator".to_string(),
        "Rank".to_string(),
        "Status".to_string(),
    ];
    header_row.extend(action_types.iter().map(|key| humanize_action_key(key)));
    header_row.push("Total".to_string());
    header_row.push("Notes".to_string());
    writer.write_record(&header_row).map_err(csv_error)?;

    for record in records {
        let mut row = vec![
            record.id.to_string(),
            record.name.clone(),
            record.rank.clone().unwrap_or_default(),
            record.status.clone(),
        ];
        row.extend(action_types.iter().map(|key| record.count(key).to_string()));
        row.push(record.total_actions().to_string());
        row.push(record.notes.clone().unwrap_or_default());
        writer.write_record(&row).map_err(csv_error)?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| csv_error(e.into_error().into()))?;
    String::from_utf8(bytes).map_err(|e| {
        error!("CSV export produced invalid UTF-8: {}", e);
        internal()
    })
}

fn csv_error(err: csv::Error) -> ApiError {
    error!("CSV export failed: {}", err);
    internal()
}

fn internal() -> ApiError {
    ApiError::new(
        StatusCode::INTERNAL_SERVER_ERROR,
        "EXPORT_FAILED",
        "Failed to render export",
    )
}
