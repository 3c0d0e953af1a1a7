//! Command-line interface, parsed with clap.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// taskd - per-user todo service with revocable session tokens
#[derive(Parser)]
#[command(name = "taskd")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Config file to use instead of the default search locations
    #[arg(long, short = 'c', global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Commands {
    /// Run the HTTP API and the maintenance scheduler (default)
    #[command(alias = "daemon")]
    Serve,

    /// Create a default config file with a generated signing secret
    Init,

    /// Delete revocation entries whose tokens have expired
    PurgeTokens,
}

impl Cli {
    #[must_use]
    pub fn resolved_command(&self) -> Commands {
        self.command.unwrap_or(Commands::Serve)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_subcommand_means_serve() {
        let cli = Cli::try_parse_from(["taskd"]).unwrap();
        assert_eq!(cli.resolved_command(), Commands::Serve);
        assert!(cli.config.is_none());
    }

    #[test]
    fn parses_subcommands_and_config_flag() {
        let cli = Cli::try_parse_from(["taskd", "purge-tokens", "--config", "/etc/taskd.toml"])
            .unwrap();
        assert_eq!(cli.resolved_command(), Commands::PurgeTokens);
        assert_eq!(cli.config, Some(PathBuf::from("/etc/taskd.toml")));

        let cli = Cli::try_parse_from(["taskd", "init"]).unwrap();
        assert_eq!(cli.resolved_command(), Commands::Init);
    }

    #[test]
    fn rejects_unknown_subcommand() {
        assert!(Cli::try_parse_from(["taskd", "frobnicate"]).is_err());
    }
}
