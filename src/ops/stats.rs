use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::model::task::{SubTask, Task};

/// Completed out of total
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Progress {
    pub completed: usize,
    pub total: usize,
}

impl Progress {
    pub fn is_empty(&self) -> bool {
        self.total == 0
    }
}

/// Task counts by status, as shown by `td stats`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeckStats {
    pub total: usize,
    pub completed: usize,
    pub incomplete: usize,
    pub overdue: usize,
    pub sub_tasks: Progress,
}

pub fn progress(tasks: &[Task]) -> Progress {
    Progress {
        completed: tasks.iter().filter(|t| t.completed).count(),
        total: tasks.len(),
    }
}

pub fn sub_task_progress(task: &Task) -> Progress {
    Progress {
        completed: task.subtasks.iter().filter(|s| s.completed).count(),
        total: task.subtasks.len(),
    }
}

pub fn deck_stats(tasks: &[Task], now: DateTime<Utc>) -> DeckStats {
    let overall = progress(tasks);
    let mut sub_tasks = Progress::default();
    for task in tasks {
        let p = sub_task_progress(task);
        sub_tasks.completed += p.completed;
        sub_tasks.total += p.total;
    }
    DeckStats {
        total: overall.total,
        completed: overall.completed,
        incomplete: overall.total - overall.completed,
        overdue: tasks.iter().filter(|t| is_overdue(t, now)).count(),
        sub_tasks,
    }
}

/// Every tag in use, in first-seen order.
pub fn unique_tags(tasks: &[Task]) -> Vec<String> {
    let mut tags: Vec<String> = Vec::new();
    for tag in tasks.iter().flat_map(|t| &t.tags) {
        if !tags.contains(tag) {
            tags.push(tag.clone());
        }
    }
    tags
}

pub fn is_overdue(task: &Task, now: DateTime<Utc>) -> bool {
    !task.completed && task.due_date.is_some_and(|due| due < now)
}

pub fn is_sub_task_overdue(sub: &SubTask, now: DateTime<Utc>) -> bool {
    !sub.completed && sub.due_date.is_some_and(|due| due < now)
}

pub fn has_overdue_sub_tasks(task: &Task, now: DateTime<Utc>) -> bool {
    task.subtasks.iter().any(|s| is_sub_task_overdue(s, now))
}

/// How close a due date is, for highlighting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DueUrgency {
    /// Past due or due within 12 hours
    Urgent,
    /// Due within 2 days
    Soon,
    Later,
}

pub fn due_urgency(due: DateTime<Utc>, now: DateTime<Utc>) -> DueUrgency {
    let remaining = due - now;
    if remaining < Duration::hours(12) {
        DueUrgency::Urgent
    } else if remaining < Duration::days(2) {
        DueUrgency::Soon
    } else {
        DueUrgency::Later
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::task::TaskDraft;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 15, 12, 0, 0).unwrap()
    }

    fn task(id: &str, tags: &[&str]) -> Task {
        let mut draft = TaskDraft::new(id);
        for tag in tags {
            draft = draft.tag(*tag);
        }
        Task::from_draft(draft, id.into(), now())
    }

    fn sub(completed: bool, due: Option<DateTime<Utc>>) -> SubTask {
        SubTask {
            id: "s".into(),
            title: "s".into(),
            created_at: now(),
            due_date: due,
            completed,
        }
    }

    #[test]
    fn progress_counts_completed() {
        let mut tasks = vec![task("a", &["x"]), task("b", &["x"]), task("c", &["x"])];
        tasks[1].completed = true;
        assert_eq!(
            progress(&tasks),
            Progress {
                completed: 1,
                total: 3
            }
        );
        assert!(progress(&[]).is_empty());
    }

    #[test]
    fn unique_tags_first_seen_order() {
        let tasks = vec![task("a", &["work", "home"]), task("b", &["errand", "work"])];
        assert_eq!(unique_tags(&tasks), vec!["work", "home", "errand"]);
    }

    #[test]
    fn overdue_requires_incomplete_and_past_due() {
        let mut t = task("a", &["x"]);
        assert!(!is_overdue(&t, now()));
        t.due_date = Some(now() - Duration::seconds(1));
        assert!(is_overdue(&t, now()));
        t.completed = true;
        assert!(!is_overdue(&t, now()));
    }

    #[test]
    fn sub_task_overdue() {
        let mut t = task("a", &["x"]);
        t.subtasks.push(sub(true, Some(now() - Duration::days(1))));
        assert!(!has_overdue_sub_tasks(&t, now()));
        t.subtasks.push(sub(false, Some(now() - Duration::days(1))));
        assert!(has_overdue_sub_tasks(&t, now()));
        assert_eq!(
            sub_task_progress(&t),
            Progress {
                completed: 1,
                total: 2
            }
        );
    }

    #[test]
    fn urgency_bands() {
        let n = now();
        assert_eq!(due_urgency(n - Duration::hours(1), n), DueUrgency::Urgent);
        assert_eq!(due_urgency(n + Duration::hours(11), n), DueUrgency::Urgent);
        assert_eq!(due_urgency(n + Duration::hours(12), n), DueUrgency::Soon);
        assert_eq!(due_urgency(n + Duration::hours(47), n), DueUrgency::Soon);
        assert_eq!(due_urgency(n + Duration::days(2), n), DueUrgency::Later);
    }

    #[test]
    fn deck_stats_totals() {
        let mut tasks = vec![task("a", &["x"]), task("b", &["x"])];
        tasks[0].due_date = Some(now() - Duration::hours(3));
        tasks[1].completed = true;
        tasks[1].subtasks.push(sub(false, None));
        let stats = deck_stats(&tasks, now());
        assert_eq!(stats.total, 2);
        assert_eq!(stats.completed, 1);
        assert_eq!(stats.incomplete, 1);
        assert_eq!(stats.overdue, 1);
        assert_eq!(stats.sub_tasks.total, 1);
    }
}
