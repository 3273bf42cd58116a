//! Main CLI application structure

use anyhow::Result;
use clap::{Parser, Subcommand};

use super::output::{Output, OutputFormat};
use super::{assist, logging, task, Reported};
use crate::agent::UpdateArgs;
use crate::domain::TaskId;
use crate::storage::{Config, Project};

#[derive(Parser)]
#[command(name = "todo")]
#[command(author, version, about = "Natural-language task management")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output format (defaults to `default_format` in the global config)
    #[arg(long, short = 'f', global = true)]
    pub format: Option<OutputFormat>,

    /// Enable debug logging on stderr
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new todo project
    Init {
        /// Path to initialize (defaults to current directory)
        #[arg(default_value = ".")]
        path: String,
    },

    /// Add a task
    ///
    /// Examples:
    ///   todo add "Buy milk" --category shopping
    ///   todo add "Call mom" --at "tomorrow at 6pm" --priority high
    Add {
        /// Task title
        title: String,

        /// Priority: low, medium or high (unknown words mean medium)
        #[arg(long, short)]
        priority: Option<String>,

        /// When the task is scheduled, e.g. "tomorrow", "next friday at 10am"
        #[arg(long)]
        at: Option<String>,

        /// Category: work, personal, administrative (admin) or shopping (shop)
        #[arg(long, short)]
        category: Option<String>,
    },

    /// List tasks, newest first
    List {
        /// Only tasks in this category
        #[arg(long, short)]
        category: Option<String>,
    },

    /// Update a task identified by ID, title match or list number
    Update {
        /// Task ID
        #[arg(long)]
        id: Option<TaskId>,

        /// Text contained in the task title
        #[arg(long = "match", value_name = "TEXT")]
        title_match: Option<String>,

        /// Position in `todo list` (or task ID, per `ordinal_policy`)
        #[arg(long)]
        number: Option<u64>,

        /// New title
        #[arg(long)]
        title: Option<String>,

        /// New priority: low, medium or high
        #[arg(long, short)]
        priority: Option<String>,

        /// New scheduled time
        #[arg(long)]
        at: Option<String>,

        /// New category
        #[arg(long, short)]
        category: Option<String>,
    },

    /// Delete a task identified by ID, title match or list number
    Delete {
        /// Task ID
        id: Option<TaskId>,

        /// Text contained in the task title
        #[arg(long = "match", value_name = "TEXT")]
        title_match: Option<String>,

        /// Position in `todo list` (or task ID, per `ordinal_policy`)
        #[arg(long)]
        number: Option<u64>,
    },

    /// Search task titles and categories
    Search {
        /// Search query
        query: String,
    },

    /// Run a JSON tool call, e.g. {"tool": "list_tasks", "args": {}}
    Dispatch {
        /// Tool call JSON (read from stdin when omitted)
        json: Option<String>,
    },

    /// Resolve a natural-language date expression
    When {
        /// Expression, e.g. "tomorrow at 3pm"
        expression: String,

        /// Anchor time in RFC 3339 (defaults to now)
        #[arg(long)]
        now: Option<String>,
    },
}

/// Main entry point for the CLI
pub fn run() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let format = match cli.format {
        Some(format) => format,
        None => Config::load_global()?.default_format.into(),
    };
    let output = Output::new(format);

    // Errors already printed by a command carry `Reported`; the rest are
    // printed here in JSON mode so stderr stays machine-readable.
    match execute(cli.command, &output) {
        Err(e) if output.is_json() && !e.is::<Reported>() => {
            output.error(&format!("{:#}", e));
            Err(e.context(Reported))
        }
        result => result,
    }
}

fn execute(command: Commands, output: &Output) -> Result<()> {
    match command {
        Commands::Init { path } => {
            let project = Project::init(&path)?;
            tracing::debug!(dir = %project.todo_dir().display(), "initialized project");
            output.success(&format!("Initialized todo project at {}", project.root().display()));
        }

        Commands::Add {
            title,
            priority,
            at,
            category,
        } => task::add(
            output,
            &title,
            priority.as_deref(),
            at.as_deref(),
            category.as_deref(),
        )?,

        Commands::List { category } => task::list(output, category.as_deref())?,

        Commands::Update {
            id,
            title_match,
            number,
            title,
            priority,
            at,
            category,
        } => {
            let target = task::reference(id, title_match.as_deref(), number);
            let changes = UpdateArgs {
                new_title: title.as_deref(),
                priority: priority.as_deref(),
                scheduled_time: at.as_deref(),
                category: category.as_deref(),
            };
            task::update(output, &target, changes)?
        }

        Commands::Delete {
            id,
            title_match,
            number,
        } => {
            let target = task::reference(id, title_match.as_deref(), number);
            task::delete(output, &target)?
        }

        Commands::Search { query } => task::search(output, &query)?,

        Commands::Dispatch { json } => assist::dispatch(output, json.as_deref())?,

        Commands::When { expression, now } => assist::when(output, &expression, now.as_deref())?,
    }

    Ok(())
}
