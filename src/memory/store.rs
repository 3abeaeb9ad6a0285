use crate::domain::{ConceptGraph, Persona, Quiz};
use crate::error::{ErrorKind, PipelineError, PipelineResult};
use crate::ingestion::ValidationReport;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactFailure {
    pub kind: ErrorKind,
    pub message: String,
}

impl fmt::Display for ArtifactFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "could not generate ({}): {}", self.kind, self.message)
    }
}

impl From<&PipelineError> for ArtifactFailure {
    fn from(err: &PipelineError) -> Self {
        Self {
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

/// One artifact of a generation action, or the marker left by its failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactSlot<T> {
    Ready(T),
    Failed(ArtifactFailure),
}

impl<T> ArtifactSlot<T> {
    pub fn from_result(result: PipelineResult<T>) -> Self {
        match result {
            Ok(value) => ArtifactSlot::Ready(value),
            Err(err) => ArtifactSlot::Failed(ArtifactFailure::from(&err)),
        }
    }

    pub fn ready(&self) -> Option<&T> {
        match self {
            ArtifactSlot::Ready(value) => Some(value),
            ArtifactSlot::Failed(_) => None,
        }
    }

    pub fn failure(&self) -> Option<&ArtifactFailure> {
        match self {
            ArtifactSlot::Ready(_) => None,
            ArtifactSlot::Failed(failure) => Some(failure),
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, ArtifactSlot::Ready(_))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactSet {
    pub graph: ArtifactSlot<ConceptGraph>,
    pub quiz: ArtifactSlot<Quiz>,
    pub summary: ArtifactSlot<String>,
    pub persona: Persona,
    pub generated_at: DateTime<Utc>,
    #[serde(default)]
    pub report: ValidationReport,
}

impl ArtifactSet {
    pub fn any_ready(&self) -> bool {
        self.graph.is_ready() || self.quiz.is_ready() || self.summary.is_ready()
    }

    pub fn summary_text(&self) -> Option<&str> {
        self.summary.ready().map(String::as_str)
    }
}

/// Last artifact triple of a session, keyed by the exact source text that produced it.
#[derive(Debug, Clone, Default)]
pub struct ArtifactStore {
    processed_key: Option<String>,
    artifacts: Option<ArtifactSet>,
}

impl ArtifactStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(&mut self, source_text: impl Into<String>, artifacts: ArtifactSet) {
        self.processed_key = Some(source_text.into());
        self.artifacts = Some(artifacts);
    }

    pub fn get(&self) -> Option<&ArtifactSet> {
        self.artifacts.as_ref()
    }

    pub fn processed_key(&self) -> Option<&str> {
        self.processed_key.as_deref()
    }

    pub fn is_processed(&self, source_text: &str) -> bool {
        self.processed_key.as_deref() == Some(source_text)
    }
}
