use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// Error parsing a status filter or sort key from user input
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ViewParseError {
    #[error("invalid status filter '{0}' (expected all, completed, incomplete, or overdue)")]
    Status(String),
    #[error("invalid sort key '{0}' (expected createdAt, priority, or dueDate)")]
    Sort(String),
}

/// Which tasks the derived view keeps, by completion state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusFilter {
    #[default]
    All,
    Completed,
    Incomplete,
    /// Not completed and due before now
    Overdue,
}

impl StatusFilter {
    pub fn as_str(self) -> &'static str {
        match self {
            StatusFilter::All => "all",
            StatusFilter::Completed => "completed",
            StatusFilter::Incomplete => "incomplete",
            StatusFilter::Overdue => "overdue",
        }
    }
}

impl fmt::Display for StatusFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StatusFilter {
    type Err = ViewParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "all" => Ok(StatusFilter::All),
            "completed" | "done" => Ok(StatusFilter::Completed),
            "incomplete" | "open" => Ok(StatusFilter::Incomplete),
            "overdue" => Ok(StatusFilter::Overdue),
            _ => Err(ViewParseError::Status(s.to_string())),
        }
    }
}

/// Ordering applied by the derived view
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortKey {
    /// Newest first
    #[default]
    CreatedAt,
    /// Highest priority first
    Priority,
    /// Earliest due first; undated tasks sort first
    DueDate,
}

impl SortKey {
    pub fn as_str(self) -> &'static str {
        match self {
            SortKey::CreatedAt => "createdAt",
            SortKey::Priority => "priority",
            SortKey::DueDate => "dueDate",
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortKey {
    type Err = ViewParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace(['-', '_'], "").as_str() {
            "createdat" | "created" => Ok(SortKey::CreatedAt),
            "priority" => Ok(SortKey::Priority),
            "duedate" | "due" => Ok(SortKey::DueDate),
            _ => Err(ViewParseError::Sort(s.to_string())),
        }
    }
}

/// Transient view state. Never touches the store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewParams {
    /// Case-insensitive substring matched against title or any tag
    pub search: String,
    /// A task passes if it carries any of these tags
    pub selected_tags: BTreeSet<String>,
    pub status: StatusFilter,
    pub sort: SortKey,
}
