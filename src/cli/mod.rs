//! Command-line interface for ReelRater.

use clap::{Parser, Subcommand};

/// ReelRater - caching proxy for movie metadata with user ratings
#[derive(Parser)]
#[command(name = "reelrater")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    /// Run the HTTP API (default)
    #[command(alias = "daemon")]
    Serve,

    /// Create a default config.toml in the working directory
    Init,

    /// Validate configuration and print a summary
    #[command(alias = "check")]
    CheckConfig,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_commands() {
        let cli = Cli::try_parse_from(["reelrater"]).unwrap();
        assert_eq!(cli.command, None);

        let cli = Cli::try_parse_from(["reelrater", "daemon"]).unwrap();
        assert_eq!(cli.command, Some(Commands::Serve));

        let cli = Cli::try_parse_from(["reelrater", "check-config"]).unwrap();
        assert_eq!(cli.command, Some(Commands::CheckConfig));

        assert!(Cli::try_parse_from(["reelrater", "bogus"]).is_err());
    }
}
