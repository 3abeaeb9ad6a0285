//! Shared fixtures for pipeline integration tests.

use std::sync::Arc;
use vidgraph::ingestion::{MockCompletionClient, PromptFormatter};
use vidgraph::{ApiKey, GenerationPipeline};

pub const GRAPH_REPLY: &str = r#"{
  "nodes": [
    {"id": "A", "label": "Photosynthesis", "type": "core"},
    {"id": "B", "label": "Chlorophyll", "type": "sub"}
  ],
  "edges": [
    {"source": "A", "target": "B", "label": "uses"},
    {"source": "A", "target": "C", "label": "produces"}
  ]
}"#;

pub const QUIZ_REPLY: &str = r#"[
  {"question": "Capital of France?", "options": ["Paris", "Lyon", "Nice", "Lille"], "answer": "Paris"}
]"#;

pub const SUMMARY_REPLY: &str = "Plants turn light into sugar.";

pub fn pipeline(mock: &MockCompletionClient) -> GenerationPipeline<MockCompletionClient> {
    GenerationPipeline::new(
        Arc::new(mock.clone()),
        PromptFormatter::default(),
        ApiKey::new("integration-key"),
    )
}

/// Queues a successful graph, quiz and summary reply, in call order.
pub fn script_generation(mock: &MockCompletionClient) {
    mock.push_response(GRAPH_REPLY);
    mock.push_response(QUIZ_REPLY);
    mock.push_response(SUMMARY_REPLY);
}
