//! scaffold-cache CLI entry point

use clap::Parser;
use console::style;
use scaffold_cache::cli::{Cli, Commands};
use scaffold_cache::config::{ConfigManager, Settings};
use scaffold_cache::error::ScaffoldResult;
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", style("Error:").red().bold(), e);
            if let Some(hint) = e.hint() {
                eprintln!("{} {}", style("Hint:").yellow(), hint);
            }
            if e.is_retryable() {
                eprintln!(
                    "{} This failure is usually temporary; running the command again may succeed",
                    style("Note:").dim()
                );
            }
            ExitCode::FAILURE
        }
    }
}

async fn run() -> ScaffoldResult<()> {
    let cli = Cli::parse();

    let config_manager = match cli.config {
        Some(ref path) => ConfigManager::with_path(path.clone()),
        None => ConfigManager::new(),
    };
    let config = config_manager.load().await?;

    init_logging(cli.verbose, &config.general.log_format);
    debug!("Loaded configuration from {}", config_manager.path().display());

    let settings = Settings::resolve(&config);
    debug!(
        "Cache root {}, TTL {:?}",
        settings.cache_root.display(),
        settings.ttl
    );

    match cli.command {
        Commands::Fetch(args) => scaffold_cache::cli::commands::fetch(args, &settings).await,
        Commands::Prompt => scaffold_cache::cli::commands::prompt(&settings).await,
        Commands::Status(args) => scaffold_cache::cli::commands::status(args, &settings).await,
        Commands::Clear => scaffold_cache::cli::commands::clear(&settings).await,
        Commands::Config(args) => {
            scaffold_cache::cli::commands::config(args, &config_manager, &config).await
        }
    }
}

/// Logs go to stderr: 0 = warn, 1 = info, 2+ = debug
fn init_logging(verbose: u8, format: &str) {
    let filter = match verbose {
        0 => EnvFilter::new("scaffold_cache=warn"),
        1 => EnvFilter::new("scaffold_cache=info"),
        _ => EnvFilter::new("scaffold_cache=debug"),
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);

    if format == "json" {
        builder.json().init();
    } else {
        builder.without_time().init();
    }
}
