//! Search, filter and sort predicates for the moderator table

use modstats_core::{Error, ModeratorRecord, Result, utils::is_valid_action_key};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Row filter; an empty field matches everything
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModeratorFilter {
    /// Case-insensitive substring of the name or rank
    pub search: String,
    /// Exact rank
    pub rank: Option<String>,
    /// Exact status
    pub status: Option<String>,
}

impl ModeratorFilter {
    /// Whether `record` passes every active predicate
    #[must_use]
    pub fn matches(&self, record: &ModeratorRecord) -> bool {
        let term = self.search.trim().to_lowercase();
        let matches_search = term.is_empty()
            || record.name.to_lowercase().contains(&term)
            || record
                .rank
                .as_deref()
                .is_some_and(|rank| rank.to_lowercase().contains(&term));
        let matches_rank = self
            .rank
            .as_deref()
            .is_none_or(|rank| record.rank.as_deref() == Some(rank));
        let matches_status = self
            .status
            .as_deref()
            .is_none_or(|status| record.status == status);

        matches_search && matches_rank && matches_status
    }

    /// No predicate is active
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.search.trim().is_empty() && self.rank.is_none() && self.status.is_none()
    }
}

/// Column the table is ordered by
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SortKey {
    /// Store id
    #[default]
    Id,
    /// Display name, case-insensitive
    Name,
    /// Rank, unranked last
    Rank,
    /// Status
    Status,
    /// Sum of all action counts
    Total,
    /// One action type
    Action(String),
}

/// Sort direction
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortDirection {
    /// Smallest first
    #[default]
    Ascending,
    /// Largest first
    Descending,
}

/// Sort key plus direction; ties always fall back to ascending id
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SortSpec {
    /// Column
    pub key: SortKey,
    /// Direction
    pub direction: SortDirection,
}

impl SortSpec {
    /// Sort by `key` in `direction`
    #[must_use]
    pub const fn new(key: SortKey, direction: SortDirection) -> Self {
        Self { key, direction }
    }

    /// Compare two records under this sort
    #[must_use]
    pub fn compare(&self, a: &ModeratorRecord, b: &ModeratorRecord) -> Ordering {
        let primary = match &self.key {
            SortKey::Id => a.id.cmp(&b.id),
            SortKey::Name => a.name.to_lowercase().cmp(&b.name.to_lowercase()),
            SortKey::Rank => match (&a.rank, &b.rank) {
                (Some(x), Some(y)) => x.cmp(y),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            },
            SortKey::Status => a.status.cmp(&b.status),
            SortKey::Total => a.total_actions().cmp(&b.total_actions()),
            SortKey::Action(action) => a.count(action).cmp(&b.count(action)),
        };

        let directed = match self.direction {
            SortDirection::Ascending => primary,
            SortDirection::Descending => primary.reverse(),
        };
        directed.then_with(|| a.id.cmp(&b.id))
    }
}

impl fmt::Display for SortSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let key = match &self.key {
            SortKey::Id => "id",
            SortKey::Name => "name",
            SortKey::Rank => "rank",
            SortKey::Status => "status",
            SortKey::Total => "total",
            SortKey::Action(action) => action,
        };
        let direction = match self.direction {
            SortDirection::Ascending => "asc",
            SortDirection::Descending => "desc",
        };
        write!(f, "{key}:{direction}")
    }
}

/// Parses `key` or `key:asc|desc`, e.g. `total:desc` or `warnings`
impl FromStr for SortSpec {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let (raw_key, raw_direction) = s.trim().split_once(':').unwrap_or((s.trim(), "asc"));

        let direction = match raw_direction.to_ascii_lowercase().as_str() {
            "asc" | "ascending" => SortDirection::Ascending,
            "desc" | "descending" => SortDirection::Descending,
            other => {
                return Err(Error::malformed(
                    "sort",
                    format!("'{other}' is not a sort direction"),
                ));
            }
        };

        let key = match raw_key {
            "id" => SortKey::Id,
            "name" => SortKey::Name,
            "rank" => SortKey::Rank,
            "status" => SortKey::Status,
            "total" => SortKey::Total,
            action if is_valid_action_key(action) => SortKey::Action(action.to_string()),
            other => {
                return Err(Error::malformed(
                    "sort",
                    format!("'{other}' is not a sort column"),
                ));
            }
        };

        Ok(Self { key, direction })
    }
}

/// Indices into `records` of the rows that pass `filter`, ordered by `sort`
#[must_use]
pub fn select_rows(records: &[ModeratorRecord], filter: &ModeratorFilter, sort: &SortSpec) -> Vec<usize> {
    let mut rows: Vec<(usize, &ModeratorRecord)> = records
        .iter()
        .enumerate()
        .filter(|(_, record)| filter.matches(record))
        .collect();

    rows.sort_by(|(_, a), (_, b)| sort.compare(a, b));
    rows.into_iter().map(|(idx, _)| idx).collect()
}
