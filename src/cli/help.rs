//! CLI command-name contract for logging and routing.

use crate::cli::parse::Commands;

/// Command name string for log fields (e.g. "build", "check").
pub fn command_name(command: &Commands) -> &'static str {
    match command {
        Commands::Build { .. } => "build",
        Commands::Styles => "styles",
        Commands::Check { .. } => "check",
    }
}
