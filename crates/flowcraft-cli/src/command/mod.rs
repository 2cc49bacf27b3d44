//! Subcommands.

mod run;
mod upload;
mod validate;

use std::path::Path;

use anyhow::Context;
use clap::Subcommand;
use flowcraft_runtime::graph::WorkflowDocument;
pub use run::RunArgs;
pub use upload::UploadArgs;
pub use validate::ValidateArgs;

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Check a workflow document for cycles and print its execution order.
    Validate(ValidateArgs),
    /// Execute a workflow, or part of it, and print a JSON summary.
    Run(RunArgs),
    /// Upload a file and store its URL on an upload node.
    Upload(UploadArgs),
}

impl Command {
    /// Executes the command.
    pub async fn execute(self) -> anyhow::Result<()> {
        match self {
            Self::Validate(args) => validate::execute(args).await,
            Self::Run(args) => run::execute(args).await,
            Self::Upload(args) => upload::execute(args).await,
        }
    }
}

/// Reads a workflow document from disk.
pub(crate) async fn read_document(path: &Path) -> anyhow::Result<WorkflowDocument> {
    let json = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("failed to read {}", path.display()))?;
    WorkflowDocument::from_json(&json)
        .with_context(|| format!("failed to parse {}", path.display()))
}

/// Writes a workflow document to disk.
pub(crate) async fn write_document(path: &Path, document: &WorkflowDocument) -> anyhow::Result<()> {
    let json = document.to_json()?;
    tokio::fs::write(path, json)
        .await
        .with_context(|| format!("failed to write {}", path.display()))
}

/// Prints a value as pretty JSON on stdout.
pub(crate) fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
