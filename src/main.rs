//! # Remindust
//!
//! A terminal task reminder. Tasks carry a due date and time, an optional
//! repetition, a priority, a category and reminder offsets. They are shown
//! grouped into **Overdue**, **Today**, **Upcoming** and **Completed**.
//!
//! ## Features
//!
//! *   **Buckets**: a task due earlier today stays under *Today* until the day ends.
//! *   **Repetition**: daily, weekly and monthly tasks are created up front, one
//!     task per occurrence (the count defaults to the `repeatCount` setting).
//! *   **Categories**: colored, case-insensitively unique; filter lists by category.
//! *   **Reminders**: one before and one after each due date; `remindust notify`
//!     prints the ones that are due (run it from cron or a status bar).
//! *   **Dual Interface**: CLI for scripting, TUI for interactive use.
//!
//! ## Usage
//!
//! ```bash
//! # Launch the TUI
//! remindust
//!
//! # A weekly task, 4 occurrences, reminded 15 minutes before
//! remindust add "Team sync" --due "2025-12-01 10:00" --repeat weekly --count 4 --before 15
//!
//! # List open tasks of a category
//! remindust list --category work
//!
//! # Complete a task (any unique id prefix works)
//! remindust complete 3f2a
//! ```
//!
//! ## Data Storage
//!
//! Data lives in your local data directory (`~/.local/share/remindust` on
//! Linux), one JSON file per key. Override it with `REMINDUST_DIR`.
//!
//! Logging goes to stderr and is controlled by `RUST_LOG`.

use std::io;

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use remindust::categories::CategoryRegistry;
use remindust::commands::*;
use remindust::config::data_dir;
use remindust::storage::FileStore;
use remindust::tui::run_tui;

#[derive(Parser)]
#[command(name = "remindust")]
#[command(about = "Terminal task reminder", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Add a new task
    Add {
        /// Task title (quoted if it has spaces)
        title: String,
        /// Due date, "YYYY-MM-DD HH:MM"
        #[arg(short, long)]
        due: String,
        /// Longer description
        #[arg(short = 'D', long)]
        description: Option<String>,
        /// Where the task takes place
        #[arg(short = 'A', long)]
        address: Option<String>,
        /// Repetition (none, daily, weekly, monthly)
        #[arg(short, long)]
        repeat: Option<String>,
        /// Number of occurrences for a repeating task
        #[arg(short = 'n', long)]
        count: Option<u32>,
        /// Remind this many minutes before the due date
        #[arg(short, long)]
        before: Option<u32>,
        /// Remind this many minutes after the due date
        #[arg(short, long)]
        after: Option<u32>,
        /// Priority (normal, important, urgent)
        #[arg(short, long)]
        priority: Option<String>,
        /// Category name
        #[arg(short, long)]
        category: Option<String>,
    },
    /// List tasks grouped by due date
    List {
        /// Only tasks of this category
        #[arg(short, long)]
        category: Option<String>,
        /// Show completed tasks
        #[arg(short, long)]
        all: bool,
    },
    /// Mark a task as complete
    Complete {
        id: String,
    },
    /// Remove a task
    Remove {
        id: String,
    },
    /// Edit a task
    Edit {
        id: String,
        /// New title
        #[arg(short, long)]
        title: Option<String>,
        /// New due date
        #[arg(short, long)]
        due: Option<String>,
        /// New description (empty to clear)
        #[arg(short = 'D', long)]
        description: Option<String>,
        /// New address (empty to clear)
        #[arg(short = 'A', long)]
        address: Option<String>,
        /// New reminder offset before the due date
        #[arg(short, long)]
        before: Option<u32>,
        /// New reminder offset after the due date
        #[arg(short, long)]
        after: Option<u32>,
        /// New priority
        #[arg(short, long)]
        priority: Option<String>,
        /// New category name (empty to clear)
        #[arg(short, long)]
        category: Option<String>,
    },
    /// Show tasks day by day for a month
    Calendar {
        /// Month as YYYY-MM (default: current month)
        #[arg(short, long)]
        month: Option<String>,
    },
    /// Print reminders that are due
    Notify,
    /// Manage categories
    Category {
        #[command(subcommand)]
        command: CategoryCommands,
    },
    /// Show or change preferences
    Settings {
        #[command(subcommand)]
        command: SettingsCommands,
    },
    /// Reset the database (delete all tasks, categories and settings)
    Reset {
        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },
    /// Generate shell completions
    Completions {
        /// Shell to generate completions for (bash, zsh, fish, powershell, elvish)
        shell: String,
    },
    /// Open interactive TUI
    Ui,
}

#[derive(Subcommand)]
enum CategoryCommands {
    /// Add a new category
    Add {
        name: String,
        /// Color token, e.g. "#4285F4"
        #[arg(short, long)]
        color: Option<String>,
    },
    /// List categories
    List,
    /// Rename or recolor a category
    Edit {
        name: String,
        /// New name
        #[arg(short, long)]
        rename: Option<String>,
        /// New color
        #[arg(short, long)]
        color: Option<String>,
    },
    /// Remove a category (tasks keep their reference)
    Remove {
        name: String,
    },
}

#[derive(Subcommand)]
enum SettingsCommands {
    /// Show current preferences
    Show,
    /// Change preferences
    Set {
        /// Default number of occurrences for repeating tasks
        #[arg(short = 'n', long)]
        repeat_count: Option<u32>,
        /// Default reminder offset before the due date (minutes)
        #[arg(short, long)]
        before: Option<u32>,
        /// Default reminder offset after the due date (minutes)
        #[arg(short, long)]
        after: Option<u32>,
    },
}

fn init_logging() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "remindust=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();
}

fn main() {
    let cli = Cli::parse();
    let interactive = matches!(cli.command, None | Some(Commands::Ui));
    // The TUI owns the terminal; only log there when explicitly asked to.
    if !interactive || std::env::var_os("RUST_LOG").is_some() {
        init_logging();
    }

    let store = match FileStore::open(data_dir()) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Failed to open data directory: {}", e);
            std::process::exit(1);
        }
    };
    if let Err(e) = CategoryRegistry::new(&store).initialize() {
        eprintln!("Failed to initialize categories: {}", e);
    }

    match cli.command {
        Some(Commands::Add { title, due, description, address, repeat, count, before, after, priority, category }) => {
            let args = AddArgs { title, due, description, address, repeat, count, before, after, priority, category };
            cmd_add(&store, args, false)
        }
        Some(Commands::List { category, all }) => cmd_list(&store, category, all),
        Some(Commands::Complete { id }) => cmd_complete(&store, &id, false),
        Some(Commands::Remove { id }) => cmd_remove(&store, &id, false),
        Some(Commands::Edit { id, title, due, description, address, before, after, priority, category }) => {
            let args = EditArgs { title, due, description, address, before, after, priority, category };
            cmd_edit(&store, &id, args, false)
        }
        Some(Commands::Calendar { month }) => cmd_calendar(&store, month),
        Some(Commands::Notify) => cmd_notify(&store),
        Some(Commands::Category { command }) => match command {
            CategoryCommands::Add { name, color } => cmd_category_add(&store, name, color, false),
            CategoryCommands::List => cmd_category_list(&store),
            CategoryCommands::Edit { name, rename, color } => cmd_category_edit(&store, name, rename, color, false),
            CategoryCommands::Remove { name } => cmd_category_remove(&store, name, false),
        },
        Some(Commands::Settings { command }) => match command {
            SettingsCommands::Show => cmd_settings_show(&store),
            SettingsCommands::Set { repeat_count, before, after } => cmd_settings_set(&store, repeat_count, before, after, false),
        },
        Some(Commands::Reset { force }) => cmd_reset(&store, force),
        Some(Commands::Completions { shell }) => {
            let shell_enum = match shell.as_str() {
                "bash" => Shell::Bash,
                "zsh" => Shell::Zsh,
                "fish" => Shell::Fish,
                "powershell" => Shell::PowerShell,
                "elvish" => Shell::Elvish,
                _ => {
                    eprintln!("Unsupported shell: {}", shell);
                    return;
                }
            };
            let mut cmd = Cli::command();
            generate(shell_enum, &mut cmd, "remindust", &mut io::stdout());
        }
        Some(Commands::Ui) | None => {
            if let Err(e) = run_tui(&store) {
                eprintln!("Error running TUI: {}", e);
            }
        }
    }
}
