//! CLI definitions using clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub mod commands;

/// qualtrics-sync - keep a local response database in step with a survey
#[derive(Parser, Debug)]
#[command(name = "qsync", author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Database path (default: ~/.qualtrics-sync/data/responses.db)
    #[arg(long, global = true, env = "QSYNC_DB")]
    pub db: Option<PathBuf>,

    /// Output as JSON (for scripting)
    #[arg(long, global = true)]
    pub json: bool,

    /// Increase logging verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (no output except errors)
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create the response database
    Init {
        /// Overwrite an existing database
        #[arg(long)]
        force: bool,
    },

    /// Run the poll loop against the configured survey
    Run {
        /// Run a single poll cycle and exit
        #[arg(long)]
        once: bool,

        /// Seconds between poll cycles
        #[arg(long, default_value = "60")]
        interval: u64,

        /// Seconds to wait for one export job to complete
        #[arg(long, default_value = "600")]
        export_deadline: u64,
    },

    /// List responses awaiting downstream processing
    Pending {
        /// Maximum responses to return
        #[arg(short, long, default_value = "500")]
        limit: usize,
    },

    /// Record the processing outcome for a response
    Mark {
        /// Response id
        id: String,

        /// Terminal status (done, error)
        #[arg(short, long)]
        status: String,

        /// Error message to store alongside an error status
        #[arg(short, long)]
        error: Option<String>,
    },

    /// Show database totals
    Status,

    /// Serve the webhook listener for push-path ingestion
    Webhook {
        /// Port to listen on
        #[arg(short, long, default_value = "8341")]
        port: u16,
    },

    /// Print version information
    Version,

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Supported shells for completions.
#[derive(clap::ValueEnum, Clone, Debug)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
    Elvish,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn run_defaults_match_production_timing() {
        let cli = Cli::parse_from(["qsync", "run"]);
        match cli.command {
            Commands::Run { once, interval, export_deadline } => {
                assert!(!once);
                assert_eq!(interval, 60);
                assert_eq!(export_deadline, 600);
            }
            _ => panic!("expected run command"),
        }
    }

    #[test]
    fn mark_takes_id_and_status() {
        let cli = Cli::parse_from(["qsync", "mark", "R_1", "--status", "done"]);
        match cli.command {
            Commands::Mark { id, status, error } => {
                assert_eq!(id, "R_1");
                assert_eq!(status, "done");
                assert!(error.is_none());
            }
            _ => panic!("expected mark command"),
        }
    }
}
