//! folio CLI — edit a git-backed portfolio document from the terminal.

use std::io;
use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use folio_core::config::{self, Environment, Overrides};
use folio_core::console::{Console, QuietConsole, StdinConsole};
use folio_core::git::GitReplica;
use folio_core::launcher::ExternalEditor;
use folio_core::{FolioResult, Operation, SyncController};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "folio", about = "folio — git-backed portfolio editor", version)]
struct Cli {
    /// Local replica directory.
    #[arg(long, global = true)]
    repo_dir: Option<PathBuf>,

    /// Remote repository URL, used when the replica has to be cloned.
    #[arg(long, global = true)]
    remote: Option<String>,

    /// Portfolio file, relative to the replica root.
    #[arg(long, global = true)]
    document: Option<PathBuf>,

    /// Editor command for `edit` (overrides $VISUAL and $EDITOR).
    #[arg(long, global = true)]
    editor: Option<String>,

    /// Config file to use instead of the default location.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Clone or update the local replica.
    Pull,

    /// Print a summary of the portfolio.
    View {
        /// Output format: "human" (default) or "json".
        #[arg(long, default_value = "human")]
        format: String,
    },

    /// Edit the whole portfolio document in an external editor.
    Edit {
        /// Commit message (defaults to a timestamped one).
        #[arg(long, short)]
        message: Option<String>,
    },

    /// Add a project interactively.
    AddProject {
        /// Commit message (defaults to a timestamped one).
        #[arg(long, short)]
        message: Option<String>,
    },

    /// Delete a project by title.
    DeleteProject {
        /// Commit message (defaults to a timestamped one).
        #[arg(long, short)]
        message: Option<String>,
    },

    /// Add an education or work entry to the timeline.
    #[command(alias = "add-timeline-entry")]
    AddTimeline {
        /// Commit message (defaults to a timestamped one).
        #[arg(long, short)]
        message: Option<String>,
    },

    /// Add a skill.
    AddSkill {
        /// Commit message (defaults to a timestamped one).
        #[arg(long, short)]
        message: Option<String>,
    },
}

fn main() {
    let cli = Cli::parse();
    init_logging();

    let overrides = Overrides {
        config_file: cli.config,
        remote_url: cli.remote,
        repo_dir: cli.repo_dir,
        document: cli.document,
        editor: cli.editor,
    };

    let result = match cli.command {
        Commands::Pull => cmd_run(overrides, Operation::SyncOnly, None),
        Commands::View { format } => cmd_view(overrides, &format),
        Commands::Edit { message } => cmd_run(overrides, Operation::EditFreeform, message),
        Commands::AddProject { message } => cmd_run(overrides, Operation::AddProject, message),
        Commands::DeleteProject { message } => {
            cmd_run(overrides, Operation::DeleteProject, message)
        }
        Commands::AddTimeline { message } => {
            cmd_run(overrides, Operation::AddTimelineEntry, message)
        }
        Commands::AddSkill { message } => cmd_run(overrides, Operation::AddSkill, message),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        process::exit(1);
    }
}

/// Diagnostics go to stderr, filtered by `FOLIO_LOG` (default `warn`).
fn init_logging() {
    let filter = EnvFilter::try_from_env("FOLIO_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn controller<C: Console>(
    overrides: Overrides,
    console: C,
) -> FolioResult<SyncController<GitReplica, ExternalEditor, C>> {
    let env = Environment::from_process()?;
    let config = config::resolve(overrides, &env)?;

    let scm = GitReplica::new(config.repo_dir.clone(), config.remote_url.clone())
        .with_author(config.author.clone());
    let editor = ExternalEditor::from_command(&config.editor)?;
    Ok(SyncController::new(config, scm, editor, console))
}

fn cmd_run(
    overrides: Overrides,
    op: Operation,
    message: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    tracing::debug!(operation = op.name(), "running");
    let mut controller = controller(overrides, StdinConsole)?;
    controller.run(op, message)?;
    Ok(())
}

fn cmd_view(overrides: Overrides, format: &str) -> Result<(), Box<dyn std::error::Error>> {
    match format {
        "json" => {
            // Progress notices go to the log so stdout holds only JSON.
            let mut controller = controller(overrides, QuietConsole)?;
            let report = controller.run(Operation::ViewSummary, None)?;
            if let Some(summary) = report.summary {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            }
        }
        _ => {
            controller(overrides, StdinConsole)?.run(Operation::ViewSummary, None)?;
        }
    }
    Ok(())
}
