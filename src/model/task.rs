use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

/// Task priority, ordered `Low < Medium < High`
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum Priority {
    #[default]
    Low,
    Medium,
    High,
}

impl Priority {
    /// Sort weight: High=3, Medium=2, Low=1
    pub fn weight(self) -> u8 {
        match self {
            Priority::Low => 1,
            Priority::Medium => 2,
            Priority::High => 3,
        }
    }

    /// Weight of an optional priority. A missing priority weighs 0.
    pub fn weight_of(priority: Option<Priority>) -> u8 {
        priority.map_or(0, Priority::weight)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Priority::Low => "Low",
            Priority::Medium => "Medium",
            Priority::High => "High",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "low" => Ok(Priority::Low),
            "medium" | "med" => Ok(Priority::Medium),
            "high" => Ok(Priority::High),
            _ => Err(format!(
                "invalid priority '{}' (expected low, medium, or high)",
                s
            )),
        }
    }
}

/// A timestamped note attached to a task
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

/// A checklist item owned by exactly one task
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubTask {
    pub id: String,
    pub title: String,
    pub created_at: DateTime<Utc>,
    #[serde(
        default,
        deserialize_with = "blank_date_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub completed: bool,
}

/// A task as stored in the deck.
///
/// Field names serialize in camelCase so the persisted blob keeps the
/// `[{"id":..,"createdAt":..}]` layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Opaque unique id (UUID v4)
    pub id: String,
    pub title: String,
    #[serde(
        default,
        deserialize_with = "blank_string_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub description: Option<String>,
    /// Normalized tags (lowercase, no duplicates)
    #[serde(default)]
    pub tags: Vec<String>,
    /// Always set on tasks created here; older records may lack it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    #[serde(
        default,
        deserialize_with = "blank_date_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub due_date: Option<DateTime<Utc>>,
    /// Set once by the store when the task is created
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub completed: bool,
    /// Chronological order (oldest first)
    #[serde(default)]
    pub comments: Vec<Comment>,
    /// Chronological order (oldest first)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub subtasks: Vec<SubTask>,
}

impl Task {
    /// Build a task from a draft. Id and creation time come from the caller
    /// (the store), never from the draft.
    pub fn from_draft(draft: TaskDraft, id: String, created_at: DateTime<Utc>) -> Self {
        Task {
            id,
            title: draft.title,
            description: draft.description,
            tags: draft.tags,
            priority: Some(draft.priority),
            due_date: draft.due_date,
            created_at,
            completed: false,
            comments: Vec::new(),
            subtasks: draft.subtasks,
        }
    }

    /// The editable fields of this task, as a draft
    pub fn to_draft(&self) -> TaskDraft {
        TaskDraft {
            title: self.title.clone(),
            description: self.description.clone(),
            tags: self.tags.clone(),
            priority: self.priority.unwrap_or_default(),
            due_date: self.due_date,
            subtasks: self.subtasks.clone(),
        }
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    pub fn find_sub_task(&self, sub_id: &str) -> Option<&SubTask> {
        self.subtasks.iter().find(|s| s.id == sub_id)
    }
}

/// Browser-written records store "no due date" as `""`.
fn blank_date_as_none<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<String>::deserialize(deserializer)?.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => DateTime::parse_from_rfc3339(s)
            .map(|dt| Some(dt.with_timezone(&Utc)))
            .map_err(serde::de::Error::custom),
    }
}

fn blank_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.filter(|s| !s.trim().is_empty()))
}

/// The caller-supplied part of a new task
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskDraft {
    pub title: String,
    pub description: Option<String>,
    pub tags: Vec<String>,
    pub priority: Priority,
    pub due_date: Option<DateTime<Utc>>,
    pub subtasks: Vec<SubTask>,
}

impl TaskDraft {
    pub fn new(title: impl Into<String>) -> Self {
        TaskDraft {
            title: title.into(),
            ..Default::default()
        }
    }

    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    pub fn priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn due(mut self, due: DateTime<Utc>) -> Self {
        self.due_date = Some(due);
        self
    }

    pub fn description(mut self, text: impl Into<String>) -> Self {
        self.description = Some(text.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn priority_total_order_matches_weight() {
        assert!(Priority::Low < Priority::Medium);
        assert!(Priority::Medium < Priority::High);
        assert_eq!(Priority::weight_of(None), 0);
        assert_eq!(Priority::weight_of(Some(Priority::High)), 3);
    }

    #[test]
    fn priority_parses_case_insensitively() {
        assert_eq!("HIGH".parse::<Priority>(), Ok(Priority::High));
        assert_eq!("med".parse::<Priority>(), Ok(Priority::Medium));
        assert!("urgent".parse::<Priority>().is_err());
    }

    #[test]
    fn reads_blob_written_by_browser_app() {
        let json = r#"[{
            "id": "6f1c",
            "title": "Buy milk",
            "tags": ["errand"],
            "priority": "Low",
            "createdAt": "2025-03-01T10:00:00.000Z",
            "completed": false,
            "comments": [{"text": "hello", "timestamp": "2025-03-01T11:00:00.000Z"}]
        }]"#;
        let tasks: Vec<Task> = serde_json::from_str(json).unwrap();
        assert_eq!(tasks.len(), 1);
        let t = &tasks[0];
        assert_eq!(t.priority, Some(Priority::Low));
        assert_eq!(t.created_at, Utc.with_ymd_and_hms(2025, 3, 1, 10, 0, 0).unwrap());
        assert!(t.subtasks.is_empty());
        assert!(t.due_date.is_none());
        assert_eq!(t.comments[0].text, "hello");
    }

    #[test]
    fn blank_due_date_and_description_read_as_none() {
        let json = r#"[{
            "title": "Buy milk",
            "description": "",
            "tags": ["errand"],
            "priority": "Low",
            "dueDate": "",
            "id": "a",
            "createdAt": "2025-03-01T10:00:00.000Z",
            "completed": false,
            "comments": [],
            "subtasks": [{
                "id": "s",
                "title": "fridge",
                "createdAt": "2025-03-01T10:01:00.000Z",
                "dueDate": null,
                "completed": false
            }]
        }]"#;
        let tasks: Vec<Task> = serde_json::from_str(json).unwrap();
        assert_eq!(tasks[0].due_date, None);
        assert_eq!(tasks[0].description, None);
        assert_eq!(tasks[0].subtasks[0].due_date, None);

        let value = serde_json::to_value(&tasks[0]).unwrap();
        assert!(value.get("dueDate").is_none());
        assert!(value.get("description").is_none());
    }

    #[test]
    fn bad_due_date_is_still_an_error() {
        let json = r#"{"id":"a","title":"t","tags":["x"],"priority":"Low",
            "dueDate":"tomorrow","createdAt":"2025-03-01T10:00:00Z"}"#;
        assert!(serde_json::from_str::<Task>(json).is_err());
    }

    #[test]
    fn missing_priority_reads_as_none() {
        let json = r#"{"id":"a","title":"t","tags":["x"],"createdAt":"2025-03-01T10:00:00Z"}"#;
        let task: Task = serde_json::from_str(json).unwrap();
        assert_eq!(task.priority, None);
        assert_eq!(Priority::weight_of(task.priority), 0);
        assert!(serde_json::to_value(&task).unwrap().get("priority").is_none());
    }

    #[test]
    fn serializes_camel_case_and_omits_empty_optionals() {
        let created = Utc.with_ymd_and_hms(2025, 3, 1, 10, 0, 0).unwrap();
        let task = Task::from_draft(TaskDraft::new("x").tag("a"), "id-1".into(), created);
        let value = serde_json::to_value(&task).unwrap();
        assert!(value.get("createdAt").is_some());
        assert!(value.get("dueDate").is_none());
        assert!(value.get("description").is_none());
        assert!(value.get("subtasks").is_none());
        assert_eq!(value["completed"], false);
    }
}
