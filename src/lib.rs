pub mod analysis;
pub mod config;
pub mod domain;
pub mod error;
pub mod ingestion;
pub mod memory;
pub mod render;
pub mod utils;

pub use config::{ApiKey, Config};
pub use domain::{
    ConceptCategory, ConceptEdge, ConceptGraph, ConceptNode, GenerationRequest, Persona, Quiz,
    QuizItem, Task,
};
pub use error::{ErrorKind, PipelineError, PipelineResult};
pub use ingestion::{CompletionClient, GeminiClient, GenerationOutcome, GenerationPipeline};
pub use memory::{ArtifactSet, ArtifactSlot, ArtifactStore, Session, SessionState};
