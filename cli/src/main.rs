use clap::Parser;
use std::path::PathBuf;

mod commands;
mod config;

use crate::commands::Commands;
use crate::config::AppConfig;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, PartialEq, Debug)]
#[command(name = "lab")]
#[command(about = "Work with GitLab-compatible hosting services from the command line", long_about = None)]
struct Cli {
    /// Use a config file other than ~/.lab/config.toml
    #[arg(long = "config", global = true)]
    config_path: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long = "debug", default_value_t = false, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if cli.debug {
        tracing_subscriber::registry()
            .with(
                tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                    format!("error,{}=debug,lab_api=debug,lab_shared=debug", env!("CARGO_CRATE_NAME"))
                        .into()
                }),
            )
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }

    let config = match AppConfig::load(cli.config_path.as_ref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load config: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = cli.command.run(config).await {
        eprintln!("Ops! something went wrong: {}", e);
        std::process::exit(1);
    }
}
