use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::model::task::{Priority, SubTask, Task};
use crate::ops::stats::{
    DeckStats, DueUrgency, Progress, due_urgency, has_overdue_sub_tasks, is_overdue,
    is_sub_task_overdue, sub_task_progress,
};
use crate::ops::view::comments_newest_first;
use crate::util::text::{capitalize_first, pad_to_width};
use crate::util::time::{format_date, format_timestamp};

/// Width of the title column in list output
const TITLE_WIDTH: usize = 40;
/// Characters of the id shown in list output
const SHORT_ID_LEN: usize = 8;

// ---------------------------------------------------------------------------
// JSON output structs
// ---------------------------------------------------------------------------

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskDetailJson<'a> {
    #[serde(flatten)]
    pub task: &'a Task,
    pub overdue: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub urgency: Option<DueUrgency>,
    pub sub_task_progress: Progress,
    pub overdue_sub_tasks: bool,
}

pub fn task_detail_json(task: &Task, now: DateTime<Utc>) -> TaskDetailJson<'_> {
    TaskDetailJson {
        task,
        overdue: is_overdue(task, now),
        urgency: task.due_date.map(|due| due_urgency(due, now)),
        sub_task_progress: sub_task_progress(task),
        overdue_sub_tasks: has_overdue_sub_tasks(task, now),
    }
}

// ---------------------------------------------------------------------------
// Human-readable formatting
// ---------------------------------------------------------------------------

fn check(completed: bool) -> char {
    if completed { 'x' } else { ' ' }
}

pub fn short_id(id: &str) -> &str {
    match id.char_indices().nth(SHORT_ID_LEN) {
        Some((i, _)) => &id[..i],
        None => id,
    }
}

fn format_tags(tags: &[String]) -> String {
    tags.iter()
        .map(|t| format!("#{}", t))
        .collect::<Vec<_>>()
        .join(" ")
}

fn urgency_label(urgency: DueUrgency) -> &'static str {
    match urgency {
        DueUrgency::Urgent => "urgent",
        DueUrgency::Soon => "soon",
        DueUrgency::Later => "later",
    }
}

/// Due date with an overdue or urgency marker
fn format_due(due: DateTime<Utc>, overdue: bool, completed: bool, now: DateTime<Utc>) -> String {
    let date = format_date(due);
    if overdue {
        format!("{} (overdue)", date)
    } else if completed {
        date
    } else {
        format!("{} ({})", date, urgency_label(due_urgency(due, now)))
    }
}

/// One-line summary used by `td list`
pub fn format_task_line(task: &Task, now: DateTime<Utc>) -> String {
    let mut line = format!(
        "[{}] {}  {}  {:<6}  {}",
        check(task.completed),
        short_id(&task.id),
        pad_to_width(&capitalize_first(&task.title), TITLE_WIDTH),
        task.priority.map_or("-", Priority::as_str),
        format_tags(&task.tags),
    );
    if !task.completed && has_overdue_sub_tasks(task, now) {
        line.push_str("  (sub-task overdue)");
    }
    if let Some(due) = task.due_date {
        line.push_str("  due ");
        line.push_str(&format_due(due, is_overdue(task, now), task.completed, now));
    }
    line
}

fn format_sub_task_line(sub: &SubTask, now: DateTime<Utc>) -> String {
    let mut line = format!(
        "[{}] {}  {}",
        check(sub.completed),
        short_id(&sub.id),
        capitalize_first(&sub.title)
    );
    if let Some(due) = sub.due_date {
        line.push_str("  due ");
        line.push_str(&format_due(due, is_sub_task_overdue(sub, now), sub.completed, now));
    }
    line
}

/// Full view used by `td show`. Comments are numbered newest first.
pub fn format_task_detail(task: &Task, now: DateTime<Utc>) -> Vec<String> {
    let mut lines = vec![format!(
        "[{}] {}  {}",
        check(task.completed),
        task.id,
        capitalize_first(&task.title)
    )];
    lines.push(format!(
        "priority: {}",
        task.priority.map_or("-", Priority::as_str)
    ));
    lines.push(format!("tags: {}", format_tags(&task.tags)));
    if let Some(due) = task.due_date {
        lines.push(format!(
            "due: {}",
            format_due(due, is_overdue(task, now), task.completed, now)
        ));
    }
    lines.push(format!("created: {}", format_timestamp(task.created_at, now)));
    if let Some(desc) = &task.description {
        lines.push("description:".to_string());
        for line in desc.lines() {
            lines.push(format!("  {}", line));
        }
    }

    if !task.comments.is_empty() {
        lines.push(String::new());
        lines.push(format!("comments ({}):", task.comments.len()));
        for (n, (_, comment)) in comments_newest_first(task).enumerate() {
            lines.push(format!(
                "  {}. {}  ({})",
                n + 1,
                capitalize_first(&comment.text),
                format_timestamp(comment.timestamp, now)
            ));
        }
    }

    if !task.subtasks.is_empty() {
        let p = sub_task_progress(task);
        lines.push(String::new());
        lines.push(format!("sub-tasks ({} / {} completed):", p.completed, p.total));
        for sub in &task.subtasks {
            lines.push(format!("  {}", format_sub_task_line(sub, now)));
        }
    }

    lines
}

pub fn format_progress(p: Progress) -> String {
    format!("Progress: {} / {} completed", p.completed, p.total)
}

pub fn format_stats(stats: &DeckStats) -> Vec<String> {
    vec![
        format_progress(Progress {
            completed: stats.completed,
            total: stats.total,
        }),
        format!("incomplete: {}", stats.incomplete),
        format!("overdue: {}", stats.overdue),
        format!(
            "sub-tasks: {} / {} completed",
            stats.sub_tasks.completed, stats.sub_tasks.total
        ),
    ]
}
