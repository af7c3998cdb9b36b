use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "td", about = concat!("taskdeck v", env!("CARGO_PKG_VERSION"), " - tagged tasks, kept local"), version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Data directory (default: $TASKDECK_DIR, else ./.taskdeck)
    #[arg(short = 'D', long = "data-dir", global = true)]
    pub data_dir: Option<String>,

    /// More log output on stderr (repeatable)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Add a task
    Add(AddArgs),
    /// List tasks (filtered and sorted)
    List(ListArgs),
    /// Show task details, comments and sub-tasks
    Show(IdArgs),
    /// Toggle a task's completed flag
    Toggle(IdArgs),
    /// Delete a task
    Delete(IdArgs),
    /// Edit a task's fields
    Edit(EditArgs),
    /// Add a comment to a task
    Comment(CommentArgs),
    /// Delete a comment by its number in `td show` (1 = newest)
    Uncomment(UncommentArgs),
    /// Sub-task commands
    Sub(SubCmd),
    /// List every tag in use
    Tags,
    /// Show progress and overdue counts
    Stats,
    /// Read or change config.toml
    Config(ConfigCmd),
}

#[derive(Args)]
pub struct IdArgs {
    /// Task ID (or a unique prefix)
    pub id: String,
}

#[derive(Args)]
pub struct AddArgs {
    /// Task title
    pub title: String,
    /// Tag (repeatable, at least one)
    #[arg(short, long = "tag")]
    pub tags: Vec<String>,
    /// low, medium, or high (default from config)
    #[arg(short, long)]
    pub priority: Option<String>,
    /// Due date: RFC 3339, YYYY-MM-DD[ HH:MM], or +N[m|h|d|w]
    #[arg(long)]
    pub due: Option<String>,
    /// Longer description
    #[arg(short, long)]
    pub description: Option<String>,
}

#[derive(Args)]
pub struct ListArgs {
    /// Case-insensitive text matched against titles and tags
    #[arg(short, long)]
    pub search: Option<String>,
    /// Only tasks carrying any of these tags (repeatable)
    #[arg(short, long = "tag")]
    pub tags: Vec<String>,
    /// all, completed, incomplete, or overdue
    #[arg(long)]
    pub status: Option<String>,
    /// createdAt, priority, or dueDate
    #[arg(long)]
    pub sort: Option<String>,
}

#[derive(Args)]
pub struct EditArgs {
    /// Task ID (or a unique prefix)
    pub id: String,
    #[arg(long)]
    pub title: Option<String>,
    #[arg(short, long)]
    pub description: Option<String>,
    /// Replace the tag list (repeatable)
    #[arg(short, long = "tag")]
    pub tags: Vec<String>,
    #[arg(short, long)]
    pub priority: Option<String>,
    #[arg(long, conflicts_with = "clear_due")]
    pub due: Option<String>,
    /// Remove the due date
    #[arg(long)]
    pub clear_due: bool,
}

#[derive(Args)]
pub struct CommentArgs {
    /// Task ID (or a unique prefix)
    pub id: String,
    /// Comment text (max 60 characters)
    pub text: String,
}

#[derive(Args)]
pub struct UncommentArgs {
    /// Task ID (or a unique prefix)
    pub id: String,
    /// Comment number as listed by `td show` (1 = newest)
    pub number: usize,
}

#[derive(Args)]
pub struct SubCmd {
    #[command(subcommand)]
    pub action: SubAction,
}

#[derive(Subcommand)]
pub enum SubAction {
    /// Add a sub-task
    Add(SubAddArgs),
    /// Toggle a sub-task's completed flag
    Toggle(SubRefArgs),
    /// Delete a sub-task
    Delete(SubRefArgs),
}

#[derive(Args)]
pub struct SubAddArgs {
    /// Parent task ID (or a unique prefix)
    pub id: String,
    /// Sub-task title
    pub title: String,
    #[arg(long)]
    pub due: Option<String>,
}

#[derive(Args)]
pub struct SubRefArgs {
    /// Parent task ID (or a unique prefix)
    pub id: String,
    /// Sub-task ID (or a unique prefix)
    pub sub_id: String,
}

#[derive(Args)]
pub struct ConfigCmd {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Print a config value
    Get { key: String },
    /// Set a config value
    Set { key: String, value: String },
}
