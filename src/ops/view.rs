use std::cmp::Reverse;

use chrono::{DateTime, Utc};

use crate::model::task::{Comment, Priority, Task};
use crate::model::view::{SortKey, StatusFilter, ViewParams};
use crate::ops::stats::is_overdue;

/// Compute the filtered, sorted projection of `tasks` for display.
///
/// Filters run in order (search, tags, status) and all must pass. The sort
/// is stable, so tasks that compare equal keep their collection order.
pub fn derive_view<'a>(tasks: &'a [Task], params: &ViewParams, now: DateTime<Utc>) -> Vec<&'a Task> {
    let needle = params.search.to_lowercase();
    let mut view: Vec<&Task> = tasks
        .iter()
        .filter(|t| matches_search(t, &needle))
        .filter(|t| matches_tags(t, params))
        .filter(|t| matches_status(t, params.status, now))
        .collect();
    sort_tasks(&mut view, params.sort);
    view
}

/// `needle` must already be lowercased. Empty matches everything.
fn matches_search(task: &Task, needle: &str) -> bool {
    needle.is_empty()
        || task.title.to_lowercase().contains(needle)
        || task.tags.iter().any(|tag| tag.to_lowercase().contains(needle))
}

/// Any selected tag is enough. No selection matches everything.
fn matches_tags(task: &Task, params: &ViewParams) -> bool {
    params.selected_tags.is_empty() || params.selected_tags.iter().any(|tag| task.has_tag(tag))
}

pub fn matches_status(task: &Task, status: StatusFilter, now: DateTime<Utc>) -> bool {
    match status {
        StatusFilter::All => true,
        StatusFilter::Completed => task.completed,
        StatusFilter::Incomplete => !task.completed,
        StatusFilter::Overdue => is_overdue(task, now),
    }
}

pub fn sort_tasks(view: &mut [&Task], sort: SortKey) {
    match sort {
        SortKey::Priority => view.sort_by_key(|t| Reverse(Priority::weight_of(t.priority))),
        SortKey::DueDate => view.sort_by_key(|t| t.due_date.map_or(0, |d| d.timestamp_millis())),
        SortKey::CreatedAt => view.sort_by_key(|t| Reverse(t.created_at)),
    }
}

// ---------------------------------------------------------------------------
// Newest-first display order <-> chronological store order
// ---------------------------------------------------------------------------

/// Translate a position in a newest-first listing of `len` items back to
/// the chronological index the store uses.
pub fn display_to_store_index(len: usize, display_idx: usize) -> Option<usize> {
    (display_idx < len).then(|| len - 1 - display_idx)
}

/// Comments newest first, each paired with its store index.
pub fn comments_newest_first(task: &Task) -> impl Iterator<Item = (usize, &Comment)> {
    task.comments.iter().enumerate().rev()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::task::{Priority, TaskDraft};
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 15, 12, 0, 0).unwrap()
    }

    fn task(id: &str, title: &str, tags: &[&str], priority: Priority, minutes: i64) -> Task {
        let mut draft = TaskDraft::new(title).priority(priority);
        for tag in tags {
            draft = draft.tag(*tag);
        }
        Task::from_draft(draft, id.into(), now() - Duration::days(1) + Duration::minutes(minutes))
    }

    fn sample() -> Vec<Task> {
        let mut tasks = vec![
            task("1", "Buy milk", &["errand"], Priority::Low, 0),
            task("2", "Write report", &["work"], Priority::High, 1),
            task("3", "Call plumber", &["home", "errand"], Priority::Medium, 2),
            task("4", "Review PR", &["work", "code"], Priority::High, 3),
        ];
        tasks[0].due_date = Some(now() - Duration::hours(2));
        tasks[1].due_date = Some(now() + Duration::days(1));
        tasks[3].completed = true;
        tasks[3].due_date = Some(now() - Duration::hours(5));
        tasks
    }

    fn ids(view: &[&Task]) -> Vec<String> {
        view.iter().map(|t| t.id.clone()).collect()
    }

    #[test]
    fn default_view_is_newest_first() {
        let tasks = sample();
        let view = derive_view(&tasks, &ViewParams::default(), now());
        assert_eq!(ids(&view), vec!["4", "3", "2", "1"]);
    }

    #[test]
    fn search_matches_title_or_tag_case_insensitively() {
        let tasks = sample();
        let params = ViewParams {
            search: "MILK".into(),
            ..Default::default()
        };
        assert_eq!(ids(&derive_view(&tasks, &params, now())), vec!["1"]);

        let params = ViewParams {
            search: "err".into(),
            ..Default::default()
        };
        assert_eq!(ids(&derive_view(&tasks, &params, now())), vec!["3", "1"]);
    }

    #[test]
    fn selected_tags_use_or_semantics() {
        let tasks = sample();
        let params = ViewParams {
            selected_tags: ["home".to_string(), "code".to_string()].into(),
            ..Default::default()
        };
        assert_eq!(ids(&derive_view(&tasks, &params, now())), vec!["4", "3"]);
    }

    #[test]
    fn search_and_tags_apply_together() {
        let tasks = sample();
        let params = ViewParams {
            search: "review".into(),
            selected_tags: ["errand".to_string()].into(),
            ..Default::default()
        };
        assert!(derive_view(&tasks, &params, now()).is_empty());
    }

    #[test]
    fn status_filters() {
        let tasks = sample();
        let by = |status| {
            let params = ViewParams {
                status,
                ..Default::default()
            };
            ids(&derive_view(&tasks, &params, now()))
        };
        assert_eq!(by(StatusFilter::Completed), vec!["4"]);
        assert_eq!(by(StatusFilter::Incomplete), vec!["3", "2", "1"]);
        // task 4 is past due but completed
        assert_eq!(by(StatusFilter::Overdue), vec!["1"]);
    }

    #[test]
    fn overdue_never_includes_completed() {
        let mut tasks = sample();
        for t in &mut tasks {
            t.due_date = Some(now() - Duration::days(3));
            t.completed = !t.completed;
        }
        let params = ViewParams {
            status: StatusFilter::Overdue,
            ..Default::default()
        };
        assert!(derive_view(&tasks, &params, now()).iter().all(|t| !t.completed));
    }

    #[test]
    fn priority_sort_is_stable() {
        let tasks = sample();
        let params = ViewParams {
            sort: SortKey::Priority,
            ..Default::default()
        };
        // 2 and 4 are both High and keep collection order
        assert_eq!(ids(&derive_view(&tasks, &params, now())), vec!["2", "4", "3", "1"]);
    }

    #[test]
    fn priority_sort_puts_missing_priority_last() {
        let mut tasks = sample();
        tasks[1].priority = None;
        let params = ViewParams {
            sort: SortKey::Priority,
            ..Default::default()
        };
        assert_eq!(ids(&derive_view(&tasks, &params, now())), vec!["4", "3", "1", "2"]);
    }

    #[test]
    fn due_date_sort_puts_undated_first() {
        let tasks = sample();
        let params = ViewParams {
            sort: SortKey::DueDate,
            ..Default::default()
        };
        assert_eq!(ids(&derive_view(&tasks, &params, now())), vec!["3", "4", "1", "2"]);
    }

    #[test]
    fn created_at_sort_descending() {
        let t1 = task("old", "t1", &["x"], Priority::Low, 0);
        let t2 = task("new", "t2", &["x"], Priority::Low, 10);
        let tasks = vec![t1, t2];
        let view = derive_view(&tasks, &ViewParams::default(), now());
        assert_eq!(ids(&view), vec!["new", "old"]);
    }

    #[test]
    fn display_index_translation() {
        assert_eq!(display_to_store_index(3, 0), Some(2));
        assert_eq!(display_to_store_index(3, 2), Some(0));
        assert_eq!(display_to_store_index(3, 3), None);
        assert_eq!(display_to_store_index(0, 0), None);
    }

    #[test]
    fn comments_listed_newest_first_with_store_index() {
        let mut t = task("1", "t", &["x"], Priority::Low, 0);
        for text in ["a", "b", "c"] {
            t.comments.push(Comment {
                text: text.into(),
                timestamp: now(),
            });
        }
        let listed: Vec<(usize, &str)> = comments_newest_first(&t)
            .map(|(i, c)| (i, c.text.as_str()))
            .collect();
        assert_eq!(listed, vec![(2, "c"), (1, "b"), (0, "a")]);
    }
}
