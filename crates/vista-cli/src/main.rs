//! Vista CLI entrypoint.

use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod handlers;


use commands::{Commands, ConfigCommands};

#[derive(Debug, Parser)]
#[command(name = "vista")]
#[command(author, version, about = "Embed-credential service for Power BI reports", long_about = None)]
struct Cli {
    /// Settings file (defaults to ./vista.{yaml,json,toml})
    #[arg(long, global = true, env = "VISTA_CONFIG")]
    config: Option<PathBuf>,

    /// Per-call budget in seconds (overrides server.request_timeout_secs)
    #[arg(long, global = true)]
    timeout: Option<u64>,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

fn init_tracing(json: bool) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry().with(env_filter);
    if json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .with_writer(std::io::stderr),
            )
            .init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_tracing(cli.log_json);

    let settings = handlers::load_settings(cli.config.as_deref(), cli.timeout)?;

    match cli.command {
        Commands::Serve { bind } => handlers::serve(settings, bind).await?,
        Commands::Embed {
            workspace,
            report,
            user,
            additional_dataset,
        } => handlers::embed(&settings, workspace, report, &user, additional_dataset).await?,
        Commands::EmbedBatch {
            workspace,
            reports,
            additional_datasets,
        } => handlers::embed_batch(&settings, workspace, &reports, &additional_datasets).await?,
        Commands::Token => handlers::token(&settings).await?,
        Commands::Config { command } => match command {
            ConfigCommands::Show => handlers::show_config(&settings)?,
        },
    }

    Ok(())
}
