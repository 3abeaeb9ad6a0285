use crate::domain::Task;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionRequest {
    pub task: Task,
    pub instruction: String,
    /// Ask the provider to constrain its output to a JSON value.
    pub json_mode: bool,
}

impl CompletionRequest {
    pub fn new(task: Task, instruction: impl Into<String>) -> Self {
        Self {
            task,
            instruction: instruction.into(),
            json_mode: task.expects_json(),
        }
    }
}

// Model output is untrusted: every field is optional and loosely typed so a single
// odd node or quiz item can be dropped without rejecting the whole response.

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawConceptGraph {
    #[serde(default)]
    pub nodes: Option<Vec<Value>>,
    #[serde(default)]
    pub edges: Option<Vec<Value>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawConceptNode {
    #[serde(default)]
    pub id: Option<Value>,
    #[serde(default)]
    pub label: Option<Value>,
    #[serde(default, rename = "type", alias = "category", alias = "kind")]
    pub category: Option<Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawConceptEdge {
    #[serde(default, alias = "from")]
    pub source: Option<Value>,
    #[serde(default, alias = "to")]
    pub target: Option<Value>,
    #[serde(default, alias = "relation")]
    pub label: Option<Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawQuizItem {
    #[serde(default)]
    pub question: Option<Value>,
    #[serde(default)]
    pub options: Option<Value>,
    #[serde(default)]
    pub answer: Option<Value>,
    #[serde(default)]
    pub explanation: Option<Value>,
}

/// Scalar JSON values as trimmed text; `None` for null, empty strings and containers.
pub fn value_text(value: &Value) -> Option<String> {
    let text = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null | Value::Array(_) | Value::Object(_) => return None,
    };
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}
