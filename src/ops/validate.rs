use std::fmt;

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::Serialize;

use crate::model::task::TaskDraft;
use crate::util::text::char_len;

pub const MAX_TITLE_LEN: usize = 40;
pub const MAX_TAG_LEN: usize = 15;
pub const MAX_COMMENT_LEN: usize = 60;
pub const MAX_SUB_TASK_TITLE_LEN: usize = 40;

/// Input field a validation message is attached to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Field {
    Title,
    Tags,
    DueDate,
    Text,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Field::Title => "title",
            Field::Tags => "tags",
            Field::DueDate => "dueDate",
            Field::Text => "text",
        };
        f.write_str(name)
    }
}

/// Field-keyed validation messages, in the order the checks ran.
/// Empty means valid.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors {
    errors: IndexMap<Field, String>,
}

impl ValidationErrors {
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn get(&self, field: Field) -> Option<&str> {
        self.errors.get(&field).map(|s| s.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (Field, &str)> {
        self.errors.iter().map(|(f, m)| (*f, m.as_str()))
    }

    /// Record a message for `field`. A later message for the same field
    /// replaces the earlier one.
    pub fn insert(&mut self, field: Field, message: impl Into<String>) {
        self.errors.insert(field, message.into());
    }

    /// `Ok(())` when empty, otherwise `Err(self)`.
    pub fn into_result(self) -> Result<(), ValidationErrors> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (field, msg)) in self.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{}: {}", field, msg)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

/// Trim and lowercase a single tag.
pub fn normalize_tag(raw: &str) -> String {
    raw.trim().trim_start_matches('#').to_lowercase()
}

/// Normalize a tag list: trim, lowercase, drop empties, and silently drop
/// case-insensitive duplicates (first occurrence wins).
pub fn normalize_tags<S: AsRef<str>>(raw: &[S]) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(raw.len());
    for tag in raw {
        let tag = normalize_tag(tag.as_ref());
        if !tag.is_empty() && !out.contains(&tag) {
            out.push(tag);
        }
    }
    out
}

/// Validate the user-editable fields of a task.
///
/// `check_due` controls the past-due-date rule: it applies to new tasks and
/// to edits that change the due date.
pub fn validate_draft(draft: &TaskDraft, now: DateTime<Utc>, check_due: bool) -> ValidationErrors {
    let mut errors = ValidationErrors::default();

    let title = draft.title.trim();
    if title.is_empty() {
        errors.insert(Field::Title, "Title is required");
    } else if char_len(title) > MAX_TITLE_LEN {
        errors.insert(
            Field::Title,
            format!("Title cannot exceed {} characters", MAX_TITLE_LEN),
        );
    }

    if draft.tags.iter().all(|t| t.trim().is_empty()) {
        errors.insert(Field::Tags, "At least one tag is required");
    } else if draft.tags.iter().any(|t| char_len(t.trim()) > MAX_TAG_LEN) {
        errors.insert(
            Field::Tags,
            format!("Tags cannot exceed {} characters each", MAX_TAG_LEN),
        );
    }

    if check_due {
        check_due_date(&mut errors, draft.due_date, now);
    }

    errors
}

/// Validate comment text.
pub fn validate_comment(text: &str) -> ValidationErrors {
    let mut errors = ValidationErrors::default();
    let text = text.trim();
    if text.is_empty() {
        errors.insert(Field::Text, "Comment cannot be empty");
    } else if char_len(text) > MAX_COMMENT_LEN {
        errors.insert(
            Field::Text,
            format!("Comment cannot exceed {} characters", MAX_COMMENT_LEN),
        );
    }
    errors
}

/// Validate a new sub-task.
pub fn validate_sub_task(
    title: &str,
    due_date: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> ValidationErrors {
    let mut errors = ValidationErrors::default();
    let title = title.trim();
    if title.is_empty() {
        errors.insert(Field::Title, "Title is required");
    } else if char_len(title) > MAX_SUB_TASK_TITLE_LEN {
        errors.insert(
            Field::Title,
            format!("Title cannot exceed {} characters", MAX_SUB_TASK_TITLE_LEN),
        );
    }
    check_due_date(&mut errors, due_date, now);
    errors
}

fn check_due_date(errors: &mut ValidationErrors, due: Option<DateTime<Utc>>, now: DateTime<Utc>) {
    if let Some(due) = due
        && due < now
    {
        errors.insert(Field::DueDate, "Due date cannot be in the past");
    }
}
