//! `flowcraft upload`.

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Args;
use flowcraft_core::{UploadFile, UploadPolicy, UploadService};
use flowcraft_runtime::graph::{WorkflowDocument, WorkflowGraph};
use flowcraft_runtime::node::{NodeId, NodeType};
use serde_json::json;
use url::Url;

use super::{read_document, write_document};
use crate::TRACING_TARGET_COMMAND;
use crate::config::ProviderArgs;

/// Arguments of the upload command.
#[derive(Debug, Clone, Args)]
pub struct UploadArgs {
    /// Workflow document holding the upload node; rewritten in place
    pub document: PathBuf,

    /// Upload node that receives the URL
    pub node: String,

    /// File to upload
    pub file: PathBuf,

    /// MIME type; guessed from the file extension when omitted
    #[arg(long)]
    pub content_type: Option<String>,

    /// Provider selection.
    #[clap(flatten)]
    pub provider: ProviderArgs,
}

/// Guesses a MIME type from a file extension.
fn content_type_for(path: &Path) -> Option<&'static str> {
    let extension = path.extension()?.to_str()?.to_ascii_lowercase();
    let content_type = match extension.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "webp" => "image/webp",
        "gif" => "image/gif",
        "mp4" => "video/mp4",
        "mov" => "video/quicktime",
        "webm" => "video/webm",
        "m4v" => "video/x-m4v",
        _ => return None,
    };
    Some(content_type)
}

/// Returns the policy and data field for an upload node type.
fn upload_target(node_type: NodeType) -> Option<(UploadPolicy, &'static str)> {
    match node_type {
        NodeType::UploadImage => Some((UploadPolicy::image(), "imageUrl")),
        NodeType::UploadVideo => Some((UploadPolicy::video(), "videoUrl")),
        _ => None,
    }
}

/// Uploads `file` and stores the resulting URL on `node_id`.
pub(crate) async fn upload_to_node(
    graph: &mut WorkflowGraph,
    node_id: &NodeId,
    file: &UploadFile,
    uploads: &UploadService,
) -> anyhow::Result<Url> {
    let node_type = graph
        .node(node_id)
        .with_context(|| format!("node {node_id} not found"))?
        .node_type();
    let (policy, field) = upload_target(node_type)
        .with_context(|| format!("node {node_id} is a {node_type} node, not an upload node"))?;

    let url = uploads.upload(file, &policy).await?;
    graph.patch_node_data(node_id, json!({ field: url.as_str() }))?;
    Ok(url)
}

pub(super) async fn execute(args: UploadArgs) -> anyhow::Result<()> {
    let services = args.provider.create_services()?;
    let document = read_document(&args.document).await?;
    let name = document.name.clone();
    let mut graph = document.into_graph()?;

    let content_type = match &args.content_type {
        Some(content_type) => content_type.clone(),
        None => content_type_for(&args.file)
            .with_context(|| format!("cannot guess the type of {}", args.file.display()))?
            .to_owned(),
    };
    let file_name = args
        .file
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("upload")
        .to_owned();
    let content = tokio::fs::read(&args.file)
        .await
        .with_context(|| format!("failed to read {}", args.file.display()))?;

    let file = UploadFile::new(file_name, content_type, content);
    let node_id = NodeId::from(args.node.as_str());
    let url = upload_to_node(&mut graph, &node_id, &file, &services.upload).await?;

    write_document(&args.document, &WorkflowDocument::from_graph(name, &graph)).await?;

    tracing::info!(
        target: TRACING_TARGET_COMMAND,
        node_id = %node_id,
        url = %url,
        "Upload stored on node"
    );
    println!("{url}");
    Ok(())
}
