use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use taskdeck::config::DeckConfig;

mod cmd;

#[derive(Parser)]
#[command(name = "taskdeck")]
#[command(version, about = "Operator console for the project tracker")]
pub struct Cli {
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Base URL of the tracker API. Overrides taskdeck.toml and TASKDECK_API_BASE.
    #[arg(long, global = true)]
    pub api_base: Option<String>,

    /// Bearer token for admin requests. Overrides taskdeck.toml and TASKDECK_TOKEN.
    #[arg(long, global = true)]
    pub token: Option<String>,

    #[arg(long, global = true)]
    pub project_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List users with their projects and tasks
    Users {
        /// Only show projects whose title, description, owner name or email match
        #[arg(short, long)]
        query: Option<String>,

        /// Print raw JSON
        #[arg(long)]
        json: bool,
    },
    /// Change the status of a task (pending, in_progress, done)
    SetStatus { task_id: i64, status: String },
    /// Run AI reviews with live progress
    Review {
        /// Project ids to review
        #[arg(required = true)]
        project_ids: Vec<i64>,

        /// UI output mode: full, minimal, json
        #[arg(long, default_value = "full")]
        ui: String,
    },
    /// Serve the review dashboard API
    Serve {
        /// Port to serve on
        #[arg(short, long, default_value = "3142")]
        port: u16,

        /// Open the review list in a browser after the server starts
        #[arg(long)]
        open: bool,

        /// Enable dev mode (permissive CORS, bind all interfaces)
        #[arg(long)]
        dev: bool,
    },
    /// View or validate configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
}

#[derive(Subcommand, Clone)]
pub enum ConfigCommands {
    /// Show current configuration
    Show,
    /// Validate configuration and show any warnings
    Validate,
    /// Initialize a default taskdeck.toml file
    Init,
}

fn init_logging(verbose: bool) {
    let default = if verbose { "info" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    // Logs go to stderr so progress bars on stdout stay intact.
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let project_dir = match cli.project_dir.clone() {
        Some(dir) => dir,
        None => std::env::current_dir().context("Failed to get current directory")?,
    };
    let config = DeckConfig::with_cli_args(&project_dir, cli.api_base.clone(), cli.token.clone())?;

    match cli.command {
        Commands::Users { query, json } => cmd::cmd_users(&config, query.as_deref(), json).await?,
        Commands::SetStatus { task_id, status } => {
            cmd::cmd_set_status(&config, task_id, &status).await?
        }
        Commands::Review { project_ids, ui } => cmd::cmd_review(&config, &project_ids, &ui).await?,
        Commands::Serve { port, open, dev } => cmd::cmd_serve(&config, port, open, dev).await?,
        Commands::Config { command } => cmd::cmd_config(&config, &project_dir, command)?,
    }

    Ok(())
}
