//! Single node execution.

use std::collections::HashMap;

use flowcraft_core::{
    CompletionRequest, CropArea, Error, LanguageService, MediaService, PercentRect, SeekTime,
};
use url::Url;

use super::inputs::InputResolver;
use crate::error::NodeError;
use crate::graph::WorkflowGraph;
use crate::node::{FramePosition, InputSlot, Node, NodeId, NodeKind, NodeOutput, NodeResult};

/// Tracing target for node execution.
const TRACING_TARGET: &str = "flowcraft_runtime::engine::executor";

/// A node with every input resolved, ready to run without the graph.
#[derive(Debug, Clone)]
pub enum PreparedNode {
    /// The output is already known.
    Value(NodeOutput),
    /// Crop an image.
    CropImage {
        /// Image to crop.
        image_url: Url,
        /// Region to keep.
        region: PercentRect,
    },
    /// Extract a frame from a video.
    ExtractFrame {
        /// Video to sample.
        video_url: Url,
        /// Frame position.
        position: FramePosition,
    },
    /// Call a language model.
    Llm(CompletionRequest),
}

/// Executes nodes through the media and language services.
#[derive(Debug, Clone)]
pub struct NodeExecutor {
    media: MediaService,
    language: LanguageService,
}

impl NodeExecutor {
    /// Creates an executor over the given services.
    pub fn new(media: MediaService, language: LanguageService) -> Self {
        Self { media, language }
    }

    /// Resolves and executes a node in one step.
    pub async fn execute(
        &self,
        node: &Node,
        graph: &WorkflowGraph,
        results: &HashMap<NodeId, NodeResult>,
    ) -> Result<NodeOutput, NodeError> {
        let prepared = self.prepare(node, graph, results)?;
        self.run(prepared).await
    }

    /// Resolves a node's inputs and validates them.
    pub fn prepare(
        &self,
        node: &Node,
        graph: &WorkflowGraph,
        results: &HashMap<NodeId, NodeResult>,
    ) -> Result<PreparedNode, NodeError> {
        let inputs = InputResolver::new(graph, node, results);

        let prepared = match node.kind() {
            NodeKind::Text(data) => {
                PreparedNode::Value(NodeOutput::Text(inputs.text(InputSlot::Input, &data.value)))
            }
            NodeKind::UploadImage(data) => {
                PreparedNode::Value(uploaded_output(data.image_url.as_deref())?)
            }
            NodeKind::UploadVideo(data) => {
                PreparedNode::Value(uploaded_output(data.video_url.as_deref())?)
            }
            NodeKind::CropImage(data) => {
                let image_url = inputs
                    .first_url(InputSlot::Image, data.image_url.as_deref())
                    .ok_or_else(|| NodeError::validation("crop image node requires an image input"))?;
                PreparedNode::CropImage {
                    image_url,
                    region: data.region(),
                }
            }
            NodeKind::ExtractFrame(data) => {
                let video_url = inputs
                    .first_url(InputSlot::VideoUrl, data.video_url.as_deref())
                    .ok_or_else(|| {
                        NodeError::validation("extract frame node requires a video input")
                    })?;
                PreparedNode::ExtractFrame {
                    video_url,
                    position: data.timestamp.position()?,
                }
            }
            NodeKind::Llm(data) => {
                let user_message = inputs.text(InputSlot::UserMessage, &data.user_message);
                if user_message.trim().is_empty() {
                    return Err(NodeError::validation("userMessage is required"));
                }

                let mut request = CompletionRequest::new(user_message)
                    .with_images(inputs.urls(InputSlot::Images))
                    .with_model(data.model);

                let system_prompt = inputs.text(InputSlot::SystemPrompt, &data.system_prompt);
                if !system_prompt.trim().is_empty() {
                    request = request.with_system_prompt(system_prompt);
                }

                PreparedNode::Llm(request)
            }
        };

        Ok(prepared)
    }

    /// Runs a prepared node.
    pub async fn run(&self, prepared: PreparedNode) -> Result<NodeOutput, NodeError> {
        match prepared {
            PreparedNode::Value(output) => Ok(output),
            PreparedNode::CropImage { image_url, region } => {
                let dimensions = self.media.image_dimensions(&image_url).await?;
                let area = CropArea::resolve(region, dimensions);

                if area.pixels.is_empty() {
                    return Err(NodeError::validation(format!(
                        "invalid crop dimensions {} for a {}x{} image",
                        area.pixels, dimensions.width, dimensions.height
                    )));
                }

                let cropped = self.media.crop_image(&image_url, area).await?;
                Ok(NodeOutput::Url(cropped))
            }
            PreparedNode::ExtractFrame {
                video_url,
                position,
            } => {
                let seek = match position {
                    FramePosition::Seconds(seconds) => SeekTime::from_secs(seconds),
                    FramePosition::Percent(percent) => {
                        let duration = self.media.video_duration(&video_url).await?;
                        SeekTime::from_percent(percent.get(), duration)
                    }
                };

                tracing::trace!(target: TRACING_TARGET, seek = %seek, "Resolved frame position");

                let frame = self.media.extract_frame(&video_url, seek).await?;
                Ok(NodeOutput::Url(frame))
            }
            PreparedNode::Llm(request) => {
                let response = self.language.complete(&request).await?;
                if response.text.trim().is_empty() {
                    return Err(
                        Error::external_error().with_message("No text response returned").into()
                    );
                }
                Ok(NodeOutput::Text(response.text))
            }
        }
    }
}

/// Output of an upload node: its URL, or null before anything was uploaded.
fn uploaded_output(url: Option<&str>) -> Result<NodeOutput, NodeError> {
    match url.map(str::trim) {
        None | Some("") => Ok(NodeOutput::Null),
        Some(url) => Url::parse(url)
            .map(NodeOutput::Url)
            .map_err(|_| NodeError::validation(format!("invalid upload URL: {url}"))),
    }
}

#[cfg(test)]
mod tests {
    use flowcraft_core::{LanguageModel, PixelRect};
    use flowcraft_test::{
        MockLanguageProvider, MockMediaConfig, MockMediaProvider, create_mock_language_service,
        create_mock_media_service,
    };

    use super::*;
    use crate::graph::Edge;
    use crate::node::{
        CropImageData, ExtractFrameData, LlmData, NodeType, TextData, UploadImageData,
        UploadVideoData,
    };

    fn executor() -> NodeExecutor {
        NodeExecutor::new(create_mock_media_service(), create_mock_language_service())
    }

    fn graph(nodes: Vec<Node>, edges: Vec<Edge>) -> WorkflowGraph {
        WorkflowGraph::from_parts(nodes, edges).unwrap()
    }

    fn prepared_request(prepared: PreparedNode) -> CompletionRequest {
        match prepared {
            PreparedNode::Llm(request) => request,
            other => panic!("expected an LLM request, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_text_feeds_llm() {
        let graph = graph(
            vec![
                Node::new("a", TextData::new("hello")),
                Node::new("b", LlmData::default()),
            ],
            vec![Edge::new("a", "b")],
        );
        let node = graph.node(&"b".into()).unwrap();

        let output = executor().execute(node, &graph, &HashMap::new()).await.unwrap();
        assert_eq!(output, NodeOutput::Text("ECHO: hello".into()));
    }

    #[test]
    fn test_connection_overrides_local_field() {
        let graph = graph(
            vec![
                Node::new("a", TextData::new("from edge")),
                Node::new("b", LlmData::new("local message").with_system_prompt("local prompt")),
            ],
            vec![Edge::new("a", "b").with_target_handle("user_message")],
        );
        let node = graph.node(&"b".into()).unwrap();

        let request = prepared_request(executor().prepare(node, &graph, &HashMap::new()).unwrap());
        assert_eq!(request.user_message, "from edge");
        assert_eq!(request.system_prompt.as_deref(), Some("local prompt"));
    }

    #[test]
    fn test_text_slots_join_in_edge_order() {
        let graph = graph(
            vec![
                Node::new("one", TextData::new("first")),
                Node::new("two", TextData::new("second")),
                Node::new("llm", LlmData::default().with_model(LanguageModel::GeminiFlashLite)),
            ],
            vec![
                Edge::new("two", "llm").with_target_handle("user_message"),
                Edge::new("one", "llm").with_target_handle("user_message"),
            ],
        );
        let node = graph.node(&"llm".into()).unwrap();

        let request = prepared_request(executor().prepare(node, &graph, &HashMap::new()).unwrap());
        assert_eq!(request.user_message, "second\nfirst");
        assert_eq!(request.model, LanguageModel::GeminiFlashLite);
        assert_eq!(request.system_prompt, None);
    }

    #[test]
    fn test_results_take_precedence_over_stored_values() {
        let graph = graph(
            vec![
                Node::new("a", TextData::new("stored")),
                Node::new("b", LlmData::default()),
            ],
            vec![Edge::new("a", "b")],
        );
        let node = graph.node(&"b".into()).unwrap();
        let mut results = HashMap::new();
        results.insert(
            NodeId::from("a"),
            NodeResult::success("a".into(), NodeOutput::Text("computed".into())),
        );

        let request = prepared_request(executor().prepare(node, &graph, &results).unwrap());
        assert_eq!(request.user_message, "computed");
    }

    #[test]
    fn test_images_drop_non_http_values() {
        let graph = graph(
            vec![
                Node::new("img1", UploadImageData::new("https://cdn.test/1.png")),
                Node::new("img2", UploadImageData::default()),
                Node::new("note", TextData::new("not a url")),
                Node::new("ftp", UploadImageData::new("ftp://cdn.test/3.png")),
                Node::new("llm", LlmData::new("describe")),
            ],
            vec![
                Edge::new("img1", "llm").with_target_handle("images"),
                Edge::new("img2", "llm").with_target_handle("images"),
                Edge::new("note", "llm").with_target_handle("images"),
                Edge::new("ftp", "llm").with_target_handle("images"),
            ],
        );
        let node = graph.node(&"llm".into()).unwrap();

        let request = prepared_request(executor().prepare(node, &graph, &HashMap::new()).unwrap());
        let urls: Vec<&str> = request.image_urls.iter().map(Url::as_str).collect();
        assert_eq!(urls, vec!["https://cdn.test/1.png"]);
    }

    #[test]
    fn test_missing_inputs_are_validation_errors() {
        let graph = graph(
            vec![
                Node::new("crop", CropImageData::new()),
                Node::new("frame", ExtractFrameData::new("1")),
                Node::new("llm", LlmData::new("   ")),
                Node::new("empty", UploadImageData::default()),
            ],
            vec![Edge::new("empty", "crop")],
        );
        let exec = executor();
        let results = HashMap::new();

        for (id, message) in [
            ("crop", "crop image node requires an image input"),
            ("frame", "extract frame node requires a video input"),
            ("llm", "userMessage is required"),
        ] {
            let node = graph.node(&id.into()).unwrap();
            let error = exec.prepare(node, &graph, &results).unwrap_err();
            assert!(matches!(error, NodeError::Validation(_)));
            assert_eq!(error.to_string(), message);
        }
    }

    #[test]
    fn test_wired_slot_ignores_local_url() {
        // The edge carries no value yet, so the local URL must not be used.
        let graph = graph(
            vec![
                Node::new("upload", UploadImageData::default()),
                Node::new("crop", CropImageData::new().with_image_url("https://cdn.test/local.png")),
            ],
            vec![Edge::new("upload", "crop").with_target_handle("image")],
        );
        let node = graph.node(&"crop".into()).unwrap();
        assert!(executor().prepare(node, &graph, &HashMap::new()).is_err());
    }

    #[tokio::test]
    async fn test_crop_converts_percent_to_pixels() {
        let media = MockMediaProvider::default();
        let exec = NodeExecutor::new(
            MediaService::new(media.clone()),
            create_mock_language_service(),
        );
        let graph = graph(
            vec![
                Node::new("upload", UploadImageData::new("https://cdn.test/a.png")),
                Node::new("crop", CropImageData::new().with_region(10.0, 10.0, 50.0, 50.0)),
            ],
            vec![Edge::new("upload", "crop")],
        );
        let node = graph.node(&"crop".into()).unwrap();

        let output = exec.execute(node, &graph, &HashMap::new()).await.unwrap();
        assert!(matches!(output, NodeOutput::Url(_)));
        assert_eq!(
            media.crops(),
            vec![PixelRect {
                x: 20,
                y: 10,
                width: 100,
                height: 50
            }]
        );
    }

    #[tokio::test]
    async fn test_empty_crop_rejected() {
        let exec = executor();
        let graph = graph(
            vec![Node::new(
                "crop",
                CropImageData::new()
                    .with_image_url("https://cdn.test/a.png")
                    .with_region(0.0, 0.0, 0.1, 50.0),
            )],
            vec![],
        );
        let node = graph.node(&"crop".into()).unwrap();
        let error = exec.execute(node, &graph, &HashMap::new()).await.unwrap_err();
        assert!(error.to_string().starts_with("invalid crop dimensions"));
    }

    #[tokio::test]
    async fn test_frame_percent_resolves_against_duration() {
        let media = MockMediaProvider::new(MockMediaConfig {
            video_duration_secs: 10.0,
            ..MockMediaConfig::default()
        });
        let exec = NodeExecutor::new(
            MediaService::new(media.clone()),
            create_mock_language_service(),
        );
        let graph = graph(
            vec![
                Node::new("video", UploadVideoData::new("https://cdn.test/v.mp4")),
                Node::new("frame", ExtractFrameData::new("50%")),
            ],
            vec![Edge::new("video", "frame").with_target_handle("video_url")],
        );
        let node = graph.node(&"frame".into()).unwrap();

        exec.execute(node, &graph, &HashMap::new()).await.unwrap();
        let seeks = media.seeks();
        assert_eq!(seeks.len(), 1);
        assert_eq!(seeks[0].to_string(), "5.00");
    }

    #[tokio::test]
    async fn test_empty_completion_is_an_error() {
        let exec = NodeExecutor::new(
            create_mock_media_service(),
            LanguageService::new(MockLanguageProvider::with_reply("  ")),
        );
        let graph = graph(vec![Node::new("llm", LlmData::new("hi"))], vec![]);
        let node = graph.node(&"llm".into()).unwrap();

        let error = exec.execute(node, &graph, &HashMap::new()).await.unwrap_err();
        assert!(matches!(error, NodeError::Remote(_)));
        assert_eq!(error.to_string(), "No text response returned");
    }

    #[tokio::test]
    async fn test_upload_nodes_output_their_url() {
        let exec = executor();
        let graph = graph(
            vec![
                Node::new("set", UploadImageData::new("https://cdn.test/a.png")),
                Node::create(NodeType::UploadVideo),
            ],
            vec![],
        );

        let set = graph.node(&"set".into()).unwrap();
        let output = exec.execute(set, &graph, &HashMap::new()).await.unwrap();
        assert_eq!(output.as_value(), Some("https://cdn.test/a.png"));

        let unset = &graph.nodes()[1];
        let output = exec.execute(unset, &graph, &HashMap::new()).await.unwrap();
        assert!(output.is_null());
    }

    #[test]
    fn test_region_from_data() {
        let region = CropImageData::new().with_region(5.0, 6.0, 7.0, 180.0).region();
        assert_eq!(region, PercentRect::new(5.0, 6.0, 7.0, 100.0));
    }
}
