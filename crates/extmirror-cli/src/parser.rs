//! Main CLI parser and top-level argument handling.

use clap::Parser;

use crate::commands::Commands;

/// Command-line interface for mirroring marketplace extensions.
#[derive(Debug, Parser)]
#[command(name = "extmirror")]
#[command(about = "Mirror VS Code extensions and JetBrains plugins into a local directory")]
#[command(version)]
pub struct Cli {
    /// Enable verbose/debug output
    #[arg(short = 'v', long = "verbose", global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_parser_builds() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_global_verbose_after_subcommand() {
        let cli = Cli::parse_from(["extmirror", "inventory", "--target-dir", "/srv/ext", "-v"]);
        assert!(cli.verbose);
        assert!(matches!(cli.command, Some(Commands::Inventory(_))));
    }

    #[test]
    fn test_no_command_is_allowed() {
        let cli = Cli::parse_from(["extmirror"]);
        assert!(cli.command.is_none());
    }
}
