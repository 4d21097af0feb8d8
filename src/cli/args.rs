//! CLI argument definitions using clap derive

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// scaffold-cache - cached project templates and API documents
///
/// Downloads the project template and OpenAPI documents once, keeps them
/// fresh on disk, and shares them between concurrent tool processes.
#[derive(Parser, Debug)]
#[command(name = "scaffold-cache")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Configuration file path
    #[arg(short, long, global = true, env = "SCAFFOLD_CACHE_CONFIG")]
    pub config: Option<PathBuf>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Make sure the template and API documents are cached, downloading if stale
    Fetch(FetchArgs),

    /// Print the template prompt (falls back to the built-in prompt)
    Prompt,

    /// Show cache freshness and contents
    Status(StatusArgs),

    /// Remove all cached files
    Clear,

    /// Show or initialize configuration
    Config(ConfigArgs),
}

/// Arguments for the fetch command
#[derive(Parser, Debug)]
pub struct FetchArgs {
    /// Output format
    #[arg(short, long, default_value = "text")]
    pub format: OutputFormat,
}

/// Arguments for the status command
#[derive(Parser, Debug)]
pub struct StatusArgs {
    /// Output format
    #[arg(short, long, default_value = "text")]
    pub format: OutputFormat,
}

/// Output format options
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable text
    #[default]
    Text,
    /// JSON output
    Json,
}

/// Arguments for the config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    /// Config subcommand
    #[command(subcommand)]
    pub action: Option<ConfigAction>,
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Show configuration file path
    Path,

    /// Write a default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_parses_fetch_json() {
        let cli = Cli::parse_from(["scaffold-cache", "fetch", "--format", "json"]);
        match cli.command {
            Commands::Fetch(args) => assert_eq!(args.format, OutputFormat::Json),
            _ => panic!("expected Fetch command"),
        }
    }

    #[test]
    fn cli_defaults_to_text_output() {
        let cli = Cli::parse_from(["scaffold-cache", "status"]);
        match cli.command {
            Commands::Status(args) => assert_eq!(args.format, OutputFormat::Text),
            _ => panic!("expected Status command"),
        }
    }

    #[test]
    fn cli_parses_config_init_force() {
        let cli = Cli::parse_from(["scaffold-cache", "config", "init", "--force"]);
        match cli.command {
            Commands::Config(ConfigArgs {
                action: Some(ConfigAction::Init { force }),
            }) => assert!(force),
            _ => panic!("expected Config init command"),
        }
    }

    #[test]
    fn cli_config_without_action() {
        let cli = Cli::parse_from(["scaffold-cache", "config"]);
        assert!(matches!(
            cli.command,
            Commands::Config(ConfigArgs { action: None })
        ));
    }

    #[test]
    fn cli_global_config_path() {
        let cli = Cli::parse_from(["scaffold-cache", "prompt", "--config", "/tmp/c.toml"]);
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/c.toml")));
        assert!(matches!(cli.command, Commands::Prompt));
    }

    #[test]
    fn cli_verbose_levels() {
        let cli = Cli::parse_from(["scaffold-cache", "clear"]);
        assert_eq!(cli.verbose, 0);

        let cli = Cli::parse_from(["scaffold-cache", "-v", "clear"]);
        assert_eq!(cli.verbose, 1);

        let cli = Cli::parse_from(["scaffold-cache", "-vv", "clear"]);
        assert_eq!(cli.verbose, 2);
    }
}
