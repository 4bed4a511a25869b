#![forbid(unsafe_code)]

mod cmd;
mod output;

use clap::{CommandFactory, Parser, Subcommand};
use output::OutputMode;
use std::env;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};
use worklog_core::WorklogStore;
use worklog_core::config;
use worklog_core::notify::NoopNotifier;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "worklog: a git-backed meeting-notes and backlog tracker",
    long_about = None
)]
struct Cli {
    /// Enable verbose logging.
    #[arg(short, long)]
    verbose: bool,

    /// Emit JSON output instead of human-readable text.
    #[arg(long, global = true)]
    json: bool,

    /// Path to the worklog repository (defaults to the current directory).
    #[arg(long, global = true, value_name = "DIR")]
    repo: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(
        next_help_heading = "Lifecycle",
        about = "Initialize a worklog repository",
        after_help = "EXAMPLES:\n    # Initialize in the current directory\n    wl init\n\n    # Emit machine-readable output\n    wl init --json"
    )]
    Init,

    #[command(
        next_help_heading = "Lifecycle",
        about = "Create a backlog item",
        after_help = "EXAMPLES:\n    # Create a task\n    wl create --title \"Fix login timeout\"\n\n    # With priority, tags, and a due date\n    wl create --title \"Ship v2\" --priority 1 --tag release --due 2026-09-15"
    )]
    Create(cmd::create::CreateArgs),

    #[command(
        next_help_heading = "Read",
        about = "Show one backlog item",
        after_help = "EXAMPLES:\n    wl show a1b2c3d4\n    wl show a1b2c3d4 --json"
    )]
    Show(cmd::show::ShowArgs),

    #[command(
        next_help_heading = "Read",
        about = "List and query backlog items",
        after_help = "EXAMPLES:\n    # Open work, most urgent first\n    wl list --status todo --status in_progress --sort priority --order asc\n\n    # Search with stats\n    wl list -q auth --stats\n\n    # Page through results\n    wl list -n 20 --offset 20"
    )]
    List(cmd::list::ListArgs),

    #[command(
        next_help_heading = "Lifecycle",
        about = "Update fields on a backlog item",
        after_help = "EXAMPLES:\n    wl update a1b2c3d4 --priority 2 --assignee alice\n    wl update a1b2c3d4 --clear-due"
    )]
    Update(cmd::update::UpdateArgs),

    #[command(
        next_help_heading = "Lifecycle",
        about = "Change a backlog item's status",
        after_help = "EXAMPLES:\n    wl status a1b2c3d4 in_progress\n    wl status a1b2c3d4 done"
    )]
    Status(cmd::status::StatusArgs),

    #[command(
        next_help_heading = "Lifecycle",
        about = "Archive or permanently delete a backlog item",
        after_help = "EXAMPLES:\n    # Archive (recoverable, default)\n    wl delete a1b2c3d4\n\n    # Remove entirely\n    wl delete a1b2c3d4 --permanent"
    )]
    Delete(cmd::delete::DeleteArgs),

    #[command(next_help_heading = "Meetings", about = "Manage meeting notes")]
    Meeting {
        #[command(subcommand)]
        command: cmd::meeting::MeetingCommand,
    },

    #[command(
        next_help_heading = "Monitoring",
        about = "List tasks past their due date",
        after_help = "EXAMPLES:\n    wl overdue\n    wl overdue --json"
    )]
    Overdue,

    #[command(
        next_help_heading = "Monitoring",
        about = "List tasks without recent updates",
        after_help = "EXAMPLES:\n    # Use the configured threshold\n    wl stale\n\n    # Override it\n    wl stale --days 14"
    )]
    Stale(cmd::monitor::StaleArgs),

    #[command(
        next_help_heading = "Read",
        about = "Show commit history for one record",
        after_help = "EXAMPLES:\n    wl history a1b2c3d4\n    wl history 2026-03-01-standup --kind meeting"
    )]
    History(cmd::history::HistoryArgs),

    #[command(
        next_help_heading = "Maintenance",
        about = "Generate shell completion scripts",
        after_help = "EXAMPLES:\n    wl completions bash\n    wl completions zsh"
    )]
    Completions(cmd::completions::CompletionsArgs),
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("WORKLOG_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if env::var("DEBUG").is_ok() {
            "worklog=debug,info"
        } else {
            "worklog=info,warn"
        })
    });

    let format = env::var("WORKLOG_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

    let registry = tracing_subscriber::registry().with(filter);

    match format.as_str() {
        "json" => {
            registry.with(fmt::layer().json().with_ansi(false)).init();
        }
        _ => {
            registry.with(fmt::layer().compact()).init();
        }
    }
}

/// Open the store with the user-level identity fallback applied.
fn open_store(repo: &std::path::Path, output: OutputMode) -> anyhow::Result<WorklogStore> {
    let user = config::load_user_config().unwrap_or_default();
    let store_config = config::with_user_fallback(config::load_store_config(repo)?, &user);
    WorklogStore::open_with(repo, store_config, Arc::new(NoopNotifier))
        .map_err(|e| output::fail(output, e))
}

fn main() -> anyhow::Result<()> {
    init_tracing();

    let cli = Cli::parse();

    if cli.verbose {
        info!("Verbose mode enabled");
    }

    let user_config = config::load_user_config().unwrap_or_default();
    let output = output::resolve_output_mode(cli.json, user_config.output.as_deref());

    let repo = match cli.repo {
        Some(ref path) => path.clone(),
        None => env::current_dir()?,
    };

    match cli.command {
        Commands::Init => cmd::init::run_init(&repo, output),
        Commands::Completions(args) => {
            let mut command = Cli::command();
            cmd::completions::run_completions(args.shell, &mut command)
        }
        Commands::Create(ref args) => {
            let store = open_store(&repo, output)?;
            cmd::create::run_create(args, &store, output)
        }
        Commands::Show(ref args) => {
            let store = open_store(&repo, output)?;
            cmd::show::run_show(args, &store, output)
        }
        Commands::List(ref args) => {
            let store = open_store(&repo, output)?;
            cmd::list::run_list(args, &store, output)
        }
        Commands::Update(ref args) => {
            let store = open_store(&repo, output)?;
            cmd::update::run_update(args, &store, output)
        }
        Commands::Status(ref args) => {
            let store = open_store(&repo, output)?;
            cmd::status::run_status(args, &store, output)
        }
        Commands::Delete(ref args) => {
            let store = open_store(&repo, output)?;
            cmd::delete::run_delete(args, &store, output)
        }
        Commands::Meeting { ref command } => {
            let store = open_store(&repo, output)?;
            cmd::meeting::run_meeting(command, &store, output)
        }
        Commands::Overdue => {
            let store = open_store(&repo, output)?;
            cmd::monitor::run_overdue(&store, output)
        }
        Commands::Stale(ref args) => {
            let store = open_store(&repo, output)?;
            cmd::monitor::run_stale(args, &store, output)
        }
        Commands::History(ref args) => {
            let store = open_store(&repo, output)?;
            cmd::history::run_history(args, &store, output)
        }
    }
}
