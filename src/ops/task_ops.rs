use chrono::{DateTime, Utc};

use crate::model::task::{Comment, SubTask, Task, TaskDraft};

// ---------------------------------------------------------------------------
// Lookup
// ---------------------------------------------------------------------------

pub fn find_task<'a>(tasks: &'a [Task], id: &str) -> Option<&'a Task> {
    tasks.iter().find(|t| t.id == id)
}

pub fn find_task_mut<'a>(tasks: &'a mut [Task], id: &str) -> Option<&'a mut Task> {
    tasks.iter_mut().find(|t| t.id == id)
}

/// Resolve a full id or a unique id prefix.
///
/// Returns `Err` with every candidate when the prefix is ambiguous, and
/// `Ok(None)` when nothing matches.
pub fn resolve_id<'a>(tasks: &'a [Task], needle: &str) -> Result<Option<&'a Task>, Vec<String>> {
    if let Some(task) = find_task(tasks, needle) {
        return Ok(Some(task));
    }
    if needle.is_empty() {
        return Ok(None);
    }
    let matches: Vec<&Task> = tasks.iter().filter(|t| t.id.starts_with(needle)).collect();
    match matches.as_slice() {
        [] => Ok(None),
        [one] => Ok(Some(*one)),
        many => Err(many.iter().map(|t| t.id.clone()).collect()),
    }
}

// ---------------------------------------------------------------------------
// Task commands
// ---------------------------------------------------------------------------

/// Append a new task built from `draft`. Returns the assigned id.
pub fn add_task(tasks: &mut Vec<Task>, draft: TaskDraft, id: String, now: DateTime<Utc>) -> String {
    tasks.push(Task::from_draft(draft, id.clone(), now));
    id
}

/// Flip `completed` on the matching task.
pub fn toggle_completed(tasks: &mut [Task], id: &str) -> bool {
    match find_task_mut(tasks, id) {
        Some(task) => {
            task.completed = !task.completed;
            true
        }
        None => false,
    }
}

pub fn delete_task(tasks: &mut Vec<Task>, id: &str) -> bool {
    let before = tasks.len();
    tasks.retain(|t| t.id != id);
    tasks.len() != before
}

/// Replace the task with the same id wholesale, keeping its position.
/// The stored `created_at` survives the replacement.
pub fn update_task(tasks: &mut [Task], mut updated: Task) -> bool {
    match find_task_mut(tasks, &updated.id) {
        Some(task) => {
            updated.created_at = task.created_at;
            *task = updated;
            true
        }
        None => false,
    }
}

// ---------------------------------------------------------------------------
// Comments
// ---------------------------------------------------------------------------

pub fn add_comment(tasks: &mut [Task], task_id: &str, text: String, now: DateTime<Utc>) -> bool {
    match find_task_mut(tasks, task_id) {
        Some(task) => {
            task.comments.push(Comment {
                text,
                timestamp: now,
            });
            true
        }
        None => false,
    }
}

/// Remove the comment at `index` in chronological (store) order.
pub fn delete_comment(tasks: &mut [Task], task_id: &str, index: usize) -> bool {
    match find_task_mut(tasks, task_id) {
        Some(task) if index < task.comments.len() => {
            task.comments.remove(index);
            true
        }
        _ => false,
    }
}

// ---------------------------------------------------------------------------
// Sub-tasks
// ---------------------------------------------------------------------------

/// Append a sub-task. Returns false if the parent does not exist.
pub fn add_sub_task(tasks: &mut [Task], task_id: &str, sub: SubTask) -> bool {
    match find_task_mut(tasks, task_id) {
        Some(task) => {
            task.subtasks.push(sub);
            true
        }
        None => false,
    }
}

pub fn toggle_sub_task(tasks: &mut [Task], task_id: &str, sub_id: &str) -> bool {
    let Some(task) = find_task_mut(tasks, task_id) else {
        return false;
    };
    match task.subtasks.iter_mut().find(|s| s.id == sub_id) {
        Some(sub) => {
            sub.completed = !sub.completed;
            true
        }
        None => false,
    }
}

pub fn delete_sub_task(tasks: &mut [Task], task_id: &str, sub_id: &str) -> bool {
    let Some(task) = find_task_mut(tasks, task_id) else {
        return false;
    };
    let before = task.subtasks.len();
    task.subtasks.retain(|s| s.id != sub_id);
    task.subtasks.len() != before
}
