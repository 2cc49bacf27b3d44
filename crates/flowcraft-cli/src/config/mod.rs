//! CLI configuration management.
//!
//! ```text
//! Cli
//! ├── log_format: LogFormat
//! └── command: Command
//!     ├── validate <DOCUMENT>
//!     ├── run <DOCUMENT> [EngineArgs] [ProviderArgs]
//!     └── upload <DOCUMENT> <NODE> <FILE> [ProviderArgs]
//! ```
//!
//! All provider and engine options can be given as arguments or through
//! environment variables. Use `--help` on each subcommand for details.

mod engine;
mod provider;

use clap::{Parser, ValueEnum};
pub use engine::EngineArgs;
pub use provider::{ProviderArgs, Services};

use crate::command::Command;

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Pretty,
    /// One JSON object per line.
    Json,
}

/// Complete CLI configuration.
#[derive(Debug, Parser)]
#[command(name = "flowcraft")]
#[command(about = "Validate and run media/LLM workflow graphs")]
#[command(version)]
pub struct Cli {
    /// Log output format
    #[arg(long, env = "FLOWCRAFT_LOG_FORMAT", value_enum, default_value_t = LogFormat::Pretty, global = true)]
    pub log_format: LogFormat,

    /// Command to execute.
    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Loads environment variables from a .env file (if enabled) and parses
    /// the arguments.
    ///
    /// The .env file is loaded first so that clap's `env` fallbacks see it.
    pub fn init() -> Self {
        Self::load_dotenv();
        Self::parse()
    }

    #[cfg(feature = "dotenv")]
    fn load_dotenv() {
        if let Err(err) = dotenvy::dotenv()
            && !err.not_found()
        {
            eprintln!("Warning: failed to load .env file: {err}");
        }
    }

    #[cfg(not(feature = "dotenv"))]
    fn load_dotenv() {}
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_scoped_run() {
        let cli = Cli::try_parse_from([
            "flowcraft",
            "run",
            "workflow.json",
            "--mock",
            "--select",
            "a,b",
            "--max-concurrent-nodes",
            "4",
        ])
        .unwrap();

        let Command::Run(args) = cli.command else {
            panic!("expected the run command");
        };
        assert!(args.provider.mock);
        assert_eq!(args.select, vec!["a".to_owned(), "b".to_owned()]);
        assert_eq!(args.engine.max_concurrent_nodes, 4);
    }

    #[test]
    fn test_node_conflicts_with_select() {
        let result = Cli::try_parse_from([
            "flowcraft",
            "run",
            "workflow.json",
            "--select",
            "a",
            "--node",
            "b",
        ]);
        assert!(result.is_err());
    }
}
