//! `taverna` - command-line client for Taverna Server

mod commands;
mod logging;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use taverna_core::{ErrorCategory, TavernaError};

#[derive(Parser)]
#[command(name = "taverna")]
#[command(version, about = "Create and inspect workflow runs on a Taverna Server")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// JSON configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Server address (overrides config and TAVERNA_SERVER_URL)
    #[arg(long, global = true)]
    server: Option<String>,

    /// Find the server through the HELIO registry instead of a fixed address
    #[arg(long, global = true)]
    discover: bool,

    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Show server capabilities (run limit, notifier protocols, listener types, permitted workflows)
    Info,

    /// List runs visible to the configured identity
    Runs,

    /// Create a run from a workflow file (the run is not started)
    Submit {
        /// Workflow document (t2flow)
        file: PathBuf,
    },

    /// Look up the server endpoint in the registry
    Resolve,
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let _guard = logging::init_tracing();
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            exit_code(&e)
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let ctx = commands::Context {
        config: commands::load_config(cli.config.as_deref(), cli.server.as_deref())?,
        discover: cli.discover,
        json: cli.json,
    };
    tracing::debug!(config = ?ctx.config, discover = ctx.discover, "Loaded configuration");

    match cli.command {
        Commands::Info => commands::info(&ctx).await,
        Commands::Runs => commands::runs(&ctx).await,
        Commands::Submit { file } => commands::submit(&ctx, file).await,
        Commands::Resolve => commands::resolve(&ctx).await,
    }
}

/// Distinct exit codes for local input, discovery, refusal and remote failures
fn exit_code(error: &anyhow::Error) -> ExitCode {
    let category = error
        .chain()
        .find_map(|cause| cause.downcast_ref::<TavernaError>())
        .map(TavernaError::category);

    match category {
        Some(ErrorCategory::LocalInput) => ExitCode::from(2),
        Some(ErrorCategory::Discovery) => ExitCode::from(3),
        Some(ErrorCategory::Refused) => ExitCode::from(4),
        Some(ErrorCategory::Remote) => ExitCode::from(5),
        None => ExitCode::FAILURE,
    }
}
