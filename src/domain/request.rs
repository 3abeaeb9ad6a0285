use super::persona::Persona;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Task {
    Graph,
    Quiz,
    Summary,
    Chat,
}

impl Task {
    /// Graph and quiz answers are parsed as JSON; summary and chat are prose.
    pub fn expects_json(self) -> bool {
        matches!(self, Task::Graph | Task::Quiz)
    }
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Task::Graph => "graph",
            Task::Quiz => "quiz",
            Task::Summary => "summary",
            Task::Chat => "chat",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationRequest {
    source_text: String,
    persona: Persona,
}

impl GenerationRequest {
    pub fn new(source_text: impl Into<String>, persona: Persona) -> Self {
        Self {
            source_text: source_text.into(),
            persona,
        }
    }

    pub fn source_text(&self) -> &str {
        &self.source_text
    }

    pub fn persona(&self) -> Persona {
        self.persona
    }

    pub fn is_blank(&self) -> bool {
        self.source_text.trim().is_empty()
    }
}
