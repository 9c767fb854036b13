//! CLI binary for aureon.

use aureon::config::AgentConfig;
use aureon::llm::OpenAiCompatLlm;
use aureon::room::ConsoleRoom;
use aureon::tts::TextOnlyTts;
use aureon::{JobRequest, Providers, Worker, game_master_worker};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Aureon: the game master of Eldoria.
#[derive(Parser)]
#[command(name = "aureon", version, about)]
struct Cli {
    /// Path to TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Also print the speech channel in console mode.
    #[arg(long)]
    show_speech: bool,

    /// Subcommand to run.
    #[command(subcommand)]
    command: Option<Command>,
}

/// Available commands.
#[derive(Subcommand)]
enum Command {
    /// Play in the terminal: typed lines are your turns.
    Console,

    /// Print the effective configuration as TOML.
    PrintConfig,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // stdout belongs to the console room.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("aureon=info,reqwest=warn")),
        )
        .init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;

    match cli.command.unwrap_or(Command::Console) {
        Command::Console => run_console(config, cli.show_speech).await,
        Command::PrintConfig => {
            print!("{}", toml::to_string_pretty(&config)?);
            Ok(())
        }
    }
}

fn load_config(path: Option<&std::path::Path>) -> anyhow::Result<AgentConfig> {
    let config = match path {
        Some(path) => AgentConfig::from_file(path)?,
        None => {
            let default_path = AgentConfig::default_config_path();
            if default_path.exists() {
                AgentConfig::from_file(&default_path)?
            } else {
                AgentConfig::default()
            }
        }
    };
    config.validate()?;
    aureon::startup::load_env_file(&config.worker.env_file)?;
    Ok(config)
}

async fn run_console(config: AgentConfig, show_speech: bool) -> anyhow::Result<()> {
    println!("Aureon v{}", env!("CARGO_PKG_VERSION"));

    let config = Arc::new(config);
    let llm = OpenAiCompatLlm::new(&config.llm)?;
    let tts = TextOnlyTts::new(&config.tts);
    let providers = Providers::new(Arc::new(llm), Arc::new(tts));

    let cancel = CancellationToken::new();
    let cancel_clone = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("received Ctrl+C, shutting down...");
            cancel_clone.cancel();
        }
    });

    let (jobs_tx, jobs_rx) = mpsc::channel(1);
    let room = ConsoleRoom::new("Aureon", show_speech);
    jobs_tx
        .send(JobRequest::new(Arc::new(room)))
        .await
        .map_err(|_| anyhow::anyhow!("worker stopped before the console job was queued"))?;
    drop(jobs_tx);

    let report = Worker::new(config, game_master_worker(providers))
        .run(jobs_rx, cancel)
        .await?;
    if report.jobs_failed > 0 {
        anyhow::bail!("console session failed, see the log above");
    }
    Ok(())
}
