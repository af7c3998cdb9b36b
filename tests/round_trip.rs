use std::fs;
use std::path::Path;

use pretty_assertions::assert_eq;
use taskdeck::io::storage::{FileStore, KeyValueStore};
use taskdeck::{Priority, Task, TaskStore};

/// Helper: copy a fixture into a fresh data directory as the `tasks` slot
fn data_dir_with_fixture(fixture_name: &str) -> tempfile::TempDir {
    let path = Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(fixture_name);
    let source = fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("Could not read fixture {}: {}", fixture_name, e));
    let tmp = tempfile::TempDir::new().unwrap();
    fs::write(tmp.path().join("tasks.json"), source).unwrap();
    tmp
}

fn load(dir: &Path) -> TaskStore {
    TaskStore::load(Box::new(FileStore::open(dir).unwrap()), "tasks")
}

#[test]
fn loads_blob_from_browser_app() {
    let tmp = data_dir_with_fixture("browser_tasks.json");
    let store = load(tmp.path());
    let tasks = store.tasks();
    assert_eq!(tasks.len(), 3);

    assert_eq!(tasks[0].title, "Buy milk");
    assert_eq!(tasks[0].due_date, None);
    assert_eq!(tasks[0].description, None);
    assert_eq!(tasks[0].comments.len(), 2);
    assert_eq!(tasks[0].comments[1].text, "two litres");

    assert_eq!(tasks[1].priority, Some(Priority::High));
    assert!(tasks[1].completed);
    assert_eq!(tasks[1].description.as_deref(), Some("Numbers from finance"));
    assert_eq!(tasks[1].subtasks.len(), 2);
    assert!(tasks[1].subtasks[1].due_date.is_some());

    assert!(tasks[2].subtasks.is_empty());
    assert_eq!(tasks[2].due_date, None);
}

#[test]
fn rewrite_then_reload_is_identical() {
    let tmp = data_dir_with_fixture("browser_tasks.json");
    let mut store = load(tmp.path());
    let before: Vec<Task> = store.tasks().to_vec();

    // Toggle twice: two full rewrites, same collection
    let id = before[2].id.clone();
    store.toggle_completed(&id).unwrap();
    store.toggle_completed(&id).unwrap();

    let reloaded = load(tmp.path());
    assert_eq!(reloaded.tasks(), before.as_slice());
}

#[test]
fn persisted_blob_keeps_field_names() {
    let tmp = data_dir_with_fixture("browser_tasks.json");
    let mut store = load(tmp.path());
    let id = store.tasks()[0].id.clone();
    store.toggle_completed(&id).unwrap();

    let blob = FileStore::open(tmp.path())
        .unwrap()
        .get("tasks")
        .unwrap()
        .unwrap();
    let value: serde_json::Value = serde_json::from_str(&blob).unwrap();
    let first = &value[0];
    assert_eq!(first["completed"], true);
    assert!(first.get("createdAt").is_some());
    assert!(first.get("subtasks").is_none());
    // Blank browser placeholders are dropped, not written back as ""
    assert!(first.get("dueDate").is_none());
    assert!(first.get("description").is_none());
    assert!(value[2].get("subtasks").is_none());
    assert_eq!(value[1]["description"], "Numbers from finance");
    assert_eq!(value[1]["subtasks"][1]["dueDate"], "2025-03-20T12:00:00Z");
}

#[test]
fn corrupt_slot_loads_empty_and_next_write_repairs_it() {
    let tmp = tempfile::TempDir::new().unwrap();
    fs::write(tmp.path().join("tasks.json"), "[{\"id\": ").unwrap();
    let mut store = load(tmp.path());
    assert!(store.tasks().is_empty());

    store
        .add_task(taskdeck::TaskDraft::new("Start over").tag("misc"))
        .unwrap();
    assert_eq!(load(tmp.path()).tasks().len(), 1);
}
