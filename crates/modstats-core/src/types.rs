//! Core data types for the moderator dashboard

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use validator::{Validate, ValidationError};

/// Per action-type counters, keyed by lowercase identifier
pub type ActionCounts = BTreeMap<String, u64>;

/// Status value for moderators currently on duty
pub const STATUS_ACTIVE: &str = "active";

/// Stable identifier of a moderator record
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModeratorId(i64);

impl ModeratorId {
    /// Wrap a raw id, rejecting zero and negative values
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::MalformedInput`] for non-positive ids.
    pub fn new(raw: i64) -> crate::Result<Self> {
        if raw > 0 {
            Ok(Self(raw))
        } else {
            Err(crate::Error::malformed(
                "id",
                format!("{raw} is not a positive integer"),
            ))
        }
    }

    /// Raw integer value
    #[must_use]
    pub const fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for ModeratorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ModeratorId {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        let raw = s
            .trim()
            .parse::<i64>()
            .map_err(|_| crate::Error::malformed("id", format!("'{s}' is not an integer")))?;
        Self::new(raw)
    }
}

/// A moderator as held by the record store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModeratorRecord {
    /// Store-assigned id, immutable for the record's lifetime
    pub id: ModeratorId,

    /// Display name, unique within the store
    pub name: String,

    /// Optional grouping category
    pub rank: Option<String>,

    /// Duty status, `active` unless changed by the admin tool
    pub status: String,

    /// Counts per action type
    pub action_counts: ActionCounts,

    /// Free-form notes
    pub notes: Option<String>,

    /// When the record was created
    pub created_at: DateTime<Utc>,

    /// When the record was last written
    pub updated_at: DateTime<Utc>,
}

impl ModeratorRecord {
    /// Count for one action type, zero when absent
    #[must_use]
    pub fn count(&self, action: &str) -> u64 {
        self.action_counts.get(action).copied().unwrap_or(0)
    }

    /// Sum of all action counts
    #[must_use]
    pub fn total_actions(&self) -> u64 {
        self.action_counts
            .values()
            .fold(0_u64, |acc, n| acc.saturating_add(*n))
    }

    /// Whether the moderator is on duty
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.status == STATUS_ACTIVE
    }
}

/// Write-side input accepted by the store's upsert
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct ModeratorUpsert {
    /// Existing id to update; `None` lets the store assign one
    pub id: Option<ModeratorId>,

    /// Display name
    #[validate(length(min = 1, max = 100, message = "name must be 1-100 characters"))]
    pub name: String,

    /// Grouping category
    #[validate(length(min = 1, max = 50, message = "rank must be 1-50 characters"))]
    pub rank: Option<String>,

    /// Duty status
    #[validate(length(min = 1, max = 32, message = "status must be 1-32 characters"))]
    pub status: String,

    /// Counts per action type
    #[validate(custom(function = "validate_action_counts"))]
    pub action_counts: ActionCounts,

    /// Free-form notes
    #[validate(length(max = 2000, message = "notes must be at most 2000 characters"))]
    pub notes: Option<String>,
}

impl ModeratorUpsert {
    /// New active moderator with no counts
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            rank: None,
            status: STATUS_ACTIVE.to_string(),
            action_counts: ActionCounts::new(),
            notes: None,
        }
    }

    /// Target an existing id
    #[must_use]
    pub const fn with_id(mut self, id: ModeratorId) -> Self {
        self.id = Some(id);
        self
    }

    /// Set the rank
    #[must_use]
    pub fn with_rank(mut self, rank: impl Into<String>) -> Self {
        self.rank = Some(rank.into());
        self
    }

    /// Set the status
    #[must_use]
    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = status.into();
        self
    }

    /// Set one action count
    #[must_use]
    pub fn with_count(mut self, action: impl Into<String>, count: u64) -> Self {
        self.action_counts.insert(action.into(), count);
        self
    }

    /// Set the notes
    #[must_use]
    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }
}

fn validate_action_counts(counts: &ActionCounts) -> Result<(), ValidationError> {
    if counts.keys().all(|key| crate::utils::is_valid_action_key(key)) {
        Ok(())
    } else {
        let mut err = ValidationError::new("action_key");
        err.message = Some("action types must match [a-z0-9_]{1,64}".into());
        Err(err)
    }
}

/// Error response structure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error message
    pub error: String,

    /// Error code
    pub code: String,
}

impl ErrorResponse {
    /// Create a new error response
    pub fn new(error: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            code: code.into(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::missing_panics_doc)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn record(id: i64, counts: &[(&str, u64)]) -> ModeratorRecord {
        let now = Utc::now();
        ModeratorRecord {
            id: ModeratorId::new(id).unwrap(),
            name: format!("mod-{id}"),
            rank: Some("Mod".to_string()),
            status: STATUS_ACTIVE.to_string(),
            action_counts: counts.iter().map(|(k, v)| ((*k).to_string(), *v)).collect(),
            notes: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[rstest]
    #[case("1", 1)]
    #[case(" 42 ", 42)]
    #[case("9007199254740993", 9_007_199_254_740_993)]
    fn test_moderator_id_parses(#[case] input: &str, #[case] expected: i64) {
        let id: ModeratorId = input.parse().unwrap();
        assert_eq!(id.get(), expected);
    }

    #[rstest]
    #[case("0")]
    #[case("-3")]
    #[case("abc")]
    #[case("1.5")]
    #[case("")]
    fn test_moderator_id_rejects(#[case] input: &str) {
        let err = input.parse::<ModeratorId>().unwrap_err();
        assert!(matches!(err, crate::Error::MalformedInput { .. }));
    }

    #[test]
    fn test_moderator_id_serializes_as_integer() {
        let id = ModeratorId::new(7).unwrap();
        assert_eq!(serde_json::to_string(&id).unwrap(), "7");
    }

    #[test]
    fn test_record_count_helpers() {
        let rec = record(1, &[("warnings", 5), ("bans", 2)]);

        assert_eq!(rec.count("warnings"), 5);
        assert_eq!(rec.count("mutes"), 0);
        assert_eq!(rec.total_actions(), 7);
        assert!(rec.is_active());
    }

    #[test]
    fn test_total_actions_saturates() {
        let rec = record(1, &[("a", u64::MAX), ("b", 10)]);
        assert_eq!(rec.total_actions(), u64::MAX);
    }

    #[test]
    fn test_upsert_builder_validates() {
        let upsert = ModeratorUpsert::new("Alice")
            .with_rank("Mod")
            .with_count("warnings", 5)
            .with_notes("Report Moderator");

        assert!(upsert.validate().is_ok());
        assert_eq!(upsert.status, STATUS_ACTIVE);
        assert!(upsert.id.is_none());
    }

    #[test]
    fn test_upsert_rejects_empty_name() {
        let upsert = ModeratorUpsert::new("");
        let errors = upsert.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("name"));
    }

    #[test]
    fn test_upsert_rejects_bad_action_key() {
        let upsert = ModeratorUpsert::new("Bob").with_count("Warnings Issued", 1);
        let errors = upsert.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("action_counts"));
    }

    #[test]
    fn test_error_response_shape() {
        let body = serde_json::to_value(ErrorResponse::new("Moderator 99 not found", "NOT_FOUND"))
            .unwrap();
        assert_eq!(
            body,
            serde_json::json!({"error": "Moderator 99 not found", "code": "NOT_FOUND"})
        );
    }
}
