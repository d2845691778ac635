pub mod commands;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "wallabag-sync")]
#[command(about = "Mirror a JSON feed of article URLs into Wallabag", long_about = None)]
pub struct Cli {
    /// Path to the config file (default: ~/.config/wallabag-sync/config.toml)
    #[arg(short, long, global = true)]
    pub config: Option<std::path::PathBuf>,

    /// Number of concurrent add/archive requests
    #[arg(short, long, global = true)]
    pub workers: Option<usize>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Commands {
    /// Add new feed articles and archive the ones that left the feed
    Sync,
    /// Show what a sync would change without changing anything
    Plan,
    /// Print the resolved configuration with secrets masked
    Config,
}

impl Cli {
    /// `sync` when no subcommand was given.
    pub fn selected_command(&self) -> Commands {
        self.command.unwrap_or(Commands::Sync)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_to_sync() {
        let cli = Cli::parse_from(["wallabag-sync"]);
        assert_eq!(cli.selected_command(), Commands::Sync);
        assert!(cli.workers.is_none());
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::parse_from(["wallabag-sync", "plan", "--workers", "8", "-c", "/tmp/c.toml"]);
        assert_eq!(cli.selected_command(), Commands::Plan);
        assert_eq!(cli.workers, Some(8));
        assert_eq!(cli.config.as_deref(), Some(std::path::Path::new("/tmp/c.toml")));
    }

    #[test]
    fn test_cli_definition_is_consistent() {
        use clap::CommandFactory;
        <Cli as CommandFactory>::command().debug_assert();
    }
}
