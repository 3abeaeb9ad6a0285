//! Error types shared by the generation pipeline and its collaborators.

use crate::domain::Task;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("no API key configured: set GEMINI_API_KEY, pass --api-key or add api_key to the config file")]
    MissingCredential,

    #[error("input text is empty")]
    EmptyInput,

    #[error("no document has been processed in this session yet")]
    NoDocument,

    #[error("completion service error: {0}")]
    Service(String),

    #[error("could not parse {task} response: {message}")]
    Parse { task: Task, message: String },

    #[error("configuration error: {0}")]
    Config(String),

    #[error("export error: {0}")]
    Export(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl PipelineError {
    pub fn parse(task: Task, message: impl Into<String>) -> Self {
        PipelineError::Parse {
            task,
            message: message.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            PipelineError::MissingCredential => ErrorKind::MissingCredential,
            PipelineError::EmptyInput => ErrorKind::EmptyInput,
            PipelineError::NoDocument => ErrorKind::NoDocument,
            PipelineError::Service(_) => ErrorKind::Service,
            PipelineError::Parse { .. } | PipelineError::Json(_) => ErrorKind::Parse,
            PipelineError::Config(_) => ErrorKind::Config,
            PipelineError::Export(_) | PipelineError::Io(_) | PipelineError::Other(_) => {
                ErrorKind::Internal
            }
        }
    }
}

/// Serializable tag of a [`PipelineError`], stored on failed artifact slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    MissingCredential,
    EmptyInput,
    NoDocument,
    Service,
    Parse,
    Config,
    Internal,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::MissingCredential => "missing_credential",
            ErrorKind::EmptyInput => "empty_input",
            ErrorKind::NoDocument => "no_document",
            ErrorKind::Service => "service",
            ErrorKind::Parse => "parse",
            ErrorKind::Config => "config",
            ErrorKind::Internal => "internal",
        };
        write!(f, "{}", name)
    }
}

pub type PipelineResult<T> = Result<T, PipelineError>;
