use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "asb-audit",
    about = "Check which security bulletin changes landed in the downstream branch",
    version,
    author
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Path to configuration file
    #[arg(short, long, env = "ASB_AUDIT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Replay the cached change list instead of querying Gerrit
    #[arg(long)]
    pub no_download: bool,

    /// Override the cached change list location
    #[arg(long, value_name = "PATH")]
    pub cache_file: Option<PathBuf>,

    /// Override the Gerrit query
    #[arg(long)]
    pub query: Option<String>,

    /// Verbosity level (can be repeated)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List bulletin topics and how many changes each one has
    ListTopics,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_cli_parsing_basic() {
        let cli = Cli::parse_from(["asb-audit"]);

        assert!(cli.command.is_none());
        assert!(!cli.no_download);
        assert!(cli.cache_file.is_none());
        assert!(cli.query.is_none());
        assert_eq!(cli.verbose, 0);
    }

    #[test]
    fn test_cli_parsing_replay() {
        let cli = Cli::parse_from(["asb-audit", "--no-download", "--cache-file", "/tmp/changes.json", "-vv"]);

        assert!(cli.no_download);
        assert_eq!(cli.cache_file, Some(PathBuf::from("/tmp/changes.json")));
        assert_eq!(cli.verbose, 2);
    }

    #[test]
    fn test_cli_parsing_query() {
        let cli = Cli::parse_from(["asb-audit", "--query", "topic:asb-2019.02-cm11"]);

        assert_eq!(cli.query.as_deref(), Some("topic:asb-2019.02-cm11"));
    }

    #[test]
    fn test_cli_parsing_list_topics() {
        let cli = Cli::parse_from(["asb-audit", "--no-download", "list-topics"]);

        match cli.command {
            Some(Commands::ListTopics) => {}
            _ => panic!("Expected ListTopics command"),
        }
        assert!(cli.no_download);
    }

    #[test]
    fn test_cli_parsing_config_path() {
        let cli = Cli::parse_from(["asb-audit", "--config", "/path/to/config.toml"]);

        assert_eq!(cli.config, Some(PathBuf::from("/path/to/config.toml")));
    }
}
