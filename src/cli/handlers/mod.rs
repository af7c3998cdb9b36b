mod config;
pub use config::cmd_config;

use std::error::Error;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

use crate::cli::commands::*;
use crate::cli::output::*;
use crate::io::config_io;
use crate::io::lock::DeckLock;
use crate::io::storage::FileStore;
use crate::model::config::DeckConfig;
use crate::model::task::{Priority, Task, TaskDraft};
use crate::model::view::{SortKey, StatusFilter, ViewParams};
use crate::ops::stats::{deck_stats, progress, unique_tags};
use crate::ops::validate::normalize_tags;
use crate::ops::view::display_to_store_index;
use crate::store::TaskStore;
use crate::util::time::parse_datetime;

type CmdResult = Result<(), Box<dyn Error>>;

/// Environment variable naming the data directory
pub const DATA_DIR_ENV: &str = "TASKDECK_DIR";
const DEFAULT_DATA_DIR: &str = ".taskdeck";

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

pub fn dispatch(cli: Cli) -> CmdResult {
    let json = cli.json;
    let data_dir = resolve_data_dir(cli.data_dir.as_deref())?;
    tracing::debug!(dir = %data_dir.display(), "using data directory");

    match cli.command {
        // Read commands
        Commands::List(args) => cmd_list(&data_dir, args, json),
        Commands::Show(args) => cmd_show(&data_dir, args, json),
        Commands::Tags => cmd_tags(&data_dir, json),
        Commands::Stats => cmd_stats(&data_dir, json),

        // Write commands
        Commands::Add(args) => cmd_add(&data_dir, args, json),
        Commands::Toggle(args) => cmd_toggle(&data_dir, args),
        Commands::Delete(args) => cmd_delete(&data_dir, args),
        Commands::Edit(args) => cmd_edit(&data_dir, args),
        Commands::Comment(args) => cmd_comment(&data_dir, args),
        Commands::Uncomment(args) => cmd_uncomment(&data_dir, args),
        Commands::Sub(args) => match args.action {
            SubAction::Add(a) => cmd_sub_add(&data_dir, a, json),
            SubAction::Toggle(a) => cmd_sub_toggle(&data_dir, a),
            SubAction::Delete(a) => cmd_sub_delete(&data_dir, a),
        },

        Commands::Config(args) => cmd_config(&data_dir, args),
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// `-D` flag, then `$TASKDECK_DIR`, then `./.taskdeck`.
fn resolve_data_dir(flag: Option<&str>) -> Result<PathBuf, Box<dyn Error>> {
    if let Some(dir) = flag {
        return Ok(PathBuf::from(dir));
    }
    if let Some(dir) = std::env::var_os(DATA_DIR_ENV).filter(|d| !d.is_empty()) {
        return Ok(PathBuf::from(dir));
    }
    Ok(std::env::current_dir()?.join(DEFAULT_DATA_DIR))
}

/// Config plus the task store for one command invocation
struct Deck {
    config: DeckConfig,
    store: TaskStore,
}

fn open_deck(data_dir: &Path) -> Result<Deck, Box<dyn Error>> {
    let (config, _doc) = config_io::read_config(data_dir)?;
    let backend = FileStore::open(data_dir)?;
    let store = TaskStore::load(Box::new(backend), &config.storage.slot);
    Ok(Deck { config, store })
}

/// Resolve a task id or unique prefix to the full id.
fn resolve_task_id(store: &TaskStore, needle: &str) -> Result<Option<String>, Box<dyn Error>> {
    match store.resolve(needle) {
        Ok(found) => Ok(found.map(|t| t.id.clone())),
        Err(candidates) => Err(format!(
            "ambiguous id '{}' matches: {}",
            needle,
            candidates.join(", ")
        )
        .into()),
    }
}

fn require_task<'a>(store: &'a TaskStore, needle: &str) -> Result<&'a Task, Box<dyn Error>> {
    let id = resolve_task_id(store, needle)?.ok_or_else(|| format!("task not found: {}", needle))?;
    store
        .get(&id)
        .ok_or_else(|| format!("task not found: {}", needle).into())
}

fn resolve_sub_task_id(task: &Task, needle: &str) -> Result<String, Box<dyn Error>> {
    if task.find_sub_task(needle).is_some() {
        return Ok(needle.to_string());
    }
    let matches: Vec<&str> = task
        .subtasks
        .iter()
        .filter(|s| s.id.starts_with(needle))
        .map(|s| s.id.as_str())
        .collect();
    match matches.as_slice() {
        [one] => Ok(one.to_string()),
        [] => Err(format!("sub-task not found: {}", needle).into()),
        many => Err(format!(
            "ambiguous sub-task id '{}' matches: {}",
            needle,
            many.join(", ")
        )
        .into()),
    }
}

fn parse_priority(input: Option<&str>, default: Priority) -> Result<Priority, Box<dyn Error>> {
    match input {
        Some(s) => Ok(s.parse::<Priority>()?),
        None => Ok(default),
    }
}

fn parse_due(input: Option<&str>, store: &TaskStore) -> Result<Option<DateTime<Utc>>, Box<dyn Error>> {
    input
        .map(|s| parse_datetime(s, store.now()))
        .transpose()
        .map_err(Box::<dyn Error>::from)
}

fn print_json<T: serde::Serialize + ?Sized>(value: &T) -> CmdResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

// ---------------------------------------------------------------------------
// Read commands
// ---------------------------------------------------------------------------

fn cmd_list(data_dir: &Path, args: ListArgs, json: bool) -> CmdResult {
    let deck = open_deck(data_dir)?;
    let params = ViewParams {
        search: args.search.unwrap_or_default(),
        selected_tags: normalize_tags(&args.tags).into_iter().collect(),
        status: match args.status.as_deref() {
            Some(s) => s.parse::<StatusFilter>()?,
            None => deck.config.view.status,
        },
        sort: match args.sort.as_deref() {
            Some(s) => s.parse::<SortKey>()?,
            None => deck.config.view.sort,
        },
    };
    let view = deck.store.view(&params);

    if json {
        return print_json(&view);
    }

    let now = deck.store.now();
    if view.is_empty() {
        println!("no tasks");
    }
    for task in &view {
        println!("{}", format_task_line(task, now));
    }
    println!();
    println!("{}", format_progress(progress(deck.store.tasks())));
    Ok(())
}

fn cmd_show(data_dir: &Path, args: IdArgs, json: bool) -> CmdResult {
    let deck = open_deck(data_dir)?;
    let task = require_task(&deck.store, &args.id)?;
    let now = deck.store.now();
    if json {
        return print_json(&task_detail_json(task, now));
    }
    for line in format_task_detail(task, now) {
        println!("{}", line);
    }
    Ok(())
}

fn cmd_tags(data_dir: &Path, json: bool) -> CmdResult {
    let deck = open_deck(data_dir)?;
    let tags = unique_tags(deck.store.tasks());
    if json {
        return print_json(&tags);
    }
    for tag in tags {
        println!("#{}", tag);
    }
    Ok(())
}

fn cmd_stats(data_dir: &Path, json: bool) -> CmdResult {
    let deck = open_deck(data_dir)?;
    let stats = deck_stats(deck.store.tasks(), deck.store.now());
    if json {
        return print_json(&stats);
    }
    for line in format_stats(&stats) {
        println!("{}", line);
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Write commands
// ---------------------------------------------------------------------------

fn cmd_add(data_dir: &Path, args: AddArgs, json: bool) -> CmdResult {
    let _lock = DeckLock::acquire_default(data_dir)?;
    let mut deck = open_deck(data_dir)?;

    let draft = TaskDraft {
        title: args.title,
        description: args.description,
        tags: args.tags,
        priority: parse_priority(args.priority.as_deref(), deck.config.defaults.priority)?,
        due_date: parse_due(args.due.as_deref(), &deck.store)?,
        subtasks: Vec::new(),
    };
    let id = deck.store.add_task(draft)?;
    if json {
        return print_json(&serde_json::json!({ "id": id }));
    }
    println!("{}", id);
    Ok(())
}

fn cmd_toggle(data_dir: &Path, args: IdArgs) -> CmdResult {
    let _lock = DeckLock::acquire_default(data_dir)?;
    let mut deck = open_deck(data_dir)?;
    let id = require_task(&deck.store, &args.id)?.id.clone();

    deck.store.toggle_completed(&id)?;
    let completed = deck.store.get(&id).is_some_and(|t| t.completed);
    println!("{} {}", if completed { "completed" } else { "reopened" }, id);
    Ok(())
}

/// Deleting an unknown id is not an error.
fn cmd_delete(data_dir: &Path, args: IdArgs) -> CmdResult {
    let _lock = DeckLock::acquire_default(data_dir)?;
    let mut deck = open_deck(data_dir)?;
    match resolve_task_id(&deck.store, &args.id)? {
        Some(id) => {
            deck.store.delete_task(&id)?;
            println!("deleted {}", id);
        }
        None => println!("nothing to delete: {}", args.id),
    }
    Ok(())
}

fn cmd_edit(data_dir: &Path, args: EditArgs) -> CmdResult {
    let _lock = DeckLock::acquire_default(data_dir)?;
    let mut deck = open_deck(data_dir)?;
    let mut task = require_task(&deck.store, &args.id)?.clone();

    if let Some(title) = args.title {
        task.title = title;
    }
    if let Some(desc) = args.description {
        task.description = Some(desc);
    }
    if !args.tags.is_empty() {
        task.tags = args.tags;
    }
    if let Some(p) = args.priority.as_deref() {
        task.priority = Some(p.parse::<Priority>()?);
    }
    if args.clear_due {
        task.due_date = None;
    } else if let Some(due) = parse_due(args.due.as_deref(), &deck.store)? {
        task.due_date = Some(due);
    }

    let id = task.id.clone();
    deck.store.update_task(task)?;
    println!("updated {}", id);
    Ok(())
}

fn cmd_comment(data_dir: &Path, args: CommentArgs) -> CmdResult {
    let _lock = DeckLock::acquire_default(data_dir)?;
    let mut deck = open_deck(data_dir)?;
    let task = require_task(&deck.store, &args.id)?;
    if task.completed {
        return Err(format!("task {} is completed; reopen it to comment", task.id).into());
    }
    let id = task.id.clone();

    deck.store.add_comment(&id, &args.text)?;
    println!("commented on {}", id);
    Ok(())
}

fn cmd_uncomment(data_dir: &Path, args: UncommentArgs) -> CmdResult {
    let _lock = DeckLock::acquire_default(data_dir)?;
    let mut deck = open_deck(data_dir)?;
    let task = require_task(&deck.store, &args.id)?;
    let index = args
        .number
        .checked_sub(1)
        .and_then(|display_idx| display_to_store_index(task.comments.len(), display_idx))
        .ok_or_else(|| format!("no comment #{} on {}", args.number, task.id))?;
    let id = task.id.clone();

    deck.store.delete_comment(&id, index)?;
    println!("deleted comment #{} from {}", args.number, id);
    Ok(())
}

fn cmd_sub_add(data_dir: &Path, args: SubAddArgs, json: bool) -> CmdResult {
    let _lock = DeckLock::acquire_default(data_dir)?;
    let mut deck = open_deck(data_dir)?;
    let task = require_task(&deck.store, &args.id)?;
    if task.completed {
        return Err(format!("task {} is completed; reopen it to add sub-tasks", task.id).into());
    }
    let id = task.id.clone();
    let due = parse_due(args.due.as_deref(), &deck.store)?;

    let sub_id = deck
        .store
        .add_sub_task(&id, &args.title, due)?
        .ok_or_else(|| format!("task not found: {}", args.id))?;
    if json {
        return print_json(&serde_json::json!({ "id": sub_id, "taskId": id }));
    }
    println!("{}", sub_id);
    Ok(())
}

fn cmd_sub_toggle(data_dir: &Path, args: SubRefArgs) -> CmdResult {
    let _lock = DeckLock::acquire_default(data_dir)?;
    let mut deck = open_deck(data_dir)?;
    let task = require_task(&deck.store, &args.id)?;
    let id = task.id.clone();
    let sub_id = resolve_sub_task_id(task, &args.sub_id)?;

    deck.store.toggle_sub_task(&id, &sub_id)?;
    let completed = deck
        .store
        .get(&id)
        .and_then(|t| t.find_sub_task(&sub_id))
        .is_some_and(|s| s.completed);
    println!("{} {}", if completed { "completed" } else { "reopened" }, sub_id);
    Ok(())
}

fn cmd_sub_delete(data_dir: &Path, args: SubRefArgs) -> CmdResult {
    let _lock = DeckLock::acquire_default(data_dir)?;
    let mut deck = open_deck(data_dir)?;
    let task = require_task(&deck.store, &args.id)?;
    let id = task.id.clone();
    let sub_id = match resolve_sub_task_id(task, &args.sub_id) {
        Ok(sub_id) => sub_id,
        Err(_) if !task.subtasks.iter().any(|s| s.id.starts_with(&args.sub_id)) => {
            println!("nothing to delete: {}", args.sub_id);
            return Ok(());
        }
        Err(e) => return Err(e),
    };

    deck.store.delete_sub_task(&id, &sub_id)?;
    println!("deleted {}", sub_id);
    Ok(())
}
