use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "consult-time")]
#[command(about = "Log consulting tasks, time them and analyse where the hours went", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Log a new task
    Add {
        /// Task title
        title: String,

        #[command(flatten)]
        fields: TaskFields,
    },

    /// Edit fields of an existing task
    Edit {
        /// Task id
        id: u64,

        /// New title
        #[arg(long)]
        title: Option<String>,

        #[command(flatten)]
        fields: TaskFields,

        /// Overwrite tracked time (seconds)
        #[arg(long)]
        time_spent: Option<u64>,
    },

    /// Delete a task
    Delete {
        /// Task id
        id: u64,
    },

    /// List tasks in the order they were logged
    List,

    /// Run the stopwatch for a task interactively
    Track {
        /// Task id
        id: u64,
    },

    /// Show summary statistics and breakdowns
    Report {
        /// Only one breakdown: summary, category, type, daily, weekly, monthly
        #[arg(short, long)]
        group: Option<String>,

        #[command(flatten)]
        range: RangeArgs,

        /// Output JSON instead of markdown
        #[arg(long)]
        json: bool,
    },

    /// Show the day-of-week by hour-of-day heatmap
    Heatmap {
        #[command(flatten)]
        range: RangeArgs,

        /// Output JSON instead of markdown
        #[arg(long)]
        json: bool,
    },

    /// Export tasks
    Export {
        /// Output format: json or csv (defaults to the configured format)
        #[arg(short, long)]
        format: Option<String>,

        /// Output file path
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Manage category, system and task type options
    Options {
        #[command(subcommand)]
        action: OptionsAction,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Optional task fields shared by `add` and `edit`
#[derive(Args, Default)]
pub struct TaskFields {
    /// Category key
    #[arg(short, long)]
    pub category: Option<String>,

    /// System key
    #[arg(short, long)]
    pub system: Option<String>,

    /// Task type key
    #[arg(short = 't', long = "type")]
    pub task_type: Option<String>,

    #[arg(short, long)]
    pub description: Option<String>,

    /// Ticket number
    #[arg(long)]
    pub ticket: Option<String>,

    #[arg(short, long)]
    pub project: Option<String>,

    /// Date (YYYY-MM-DD), defaults to today
    #[arg(long)]
    pub date: Option<String>,

    /// Start time (HH:MM)
    #[arg(long)]
    pub start: Option<String>,

    /// End time (HH:MM)
    #[arg(long)]
    pub end: Option<String>,
}

#[derive(Args)]
pub struct RangeArgs {
    /// Preset range (today, yesterday, last7days, last14days, last30days,
    /// thisWeek, lastWeek, thisMonth, lastMonth, thisYear) or "all"
    #[arg(short, long)]
    pub range: Option<String>,

    /// First day (YYYY-MM-DD); overrides --range
    #[arg(long)]
    pub from: Option<String>,

    /// Last day (YYYY-MM-DD), defaults to --from
    #[arg(long, requires = "from")]
    pub to: Option<String>,
}

#[derive(Subcommand)]
pub enum OptionsAction {
    /// List options: category, system or type (all when omitted)
    List {
        kind: Option<String>,
    },
    /// Add or relabel an option
    Add {
        /// category, system or type
        kind: String,
        /// Key (slugified)
        key: String,
        /// Display label
        label: String,
    },
    /// Remove an option; tasks using it keep the key
    Remove {
        /// category, system or type
        kind: String,
        key: String,
    },
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Initialize default configuration
    Init,
    /// Open configuration file in editor
    Edit,
    /// Show current configuration
    Show,
}
