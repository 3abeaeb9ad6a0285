use super::store::{ArtifactSet, ArtifactStore};
use crate::domain::ChatMessage;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Idle,
    Generating,
    Ready,
    Failed,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionState::Idle => "idle",
            SessionState::Generating => "generating",
            SessionState::Ready => "ready",
            SessionState::Failed => "failed",
        };
        write!(f, "{}", name)
    }
}

/// Per-user context: the artifact store, the chat history and the generation state.
///
/// Nothing here is shared between sessions; callers pass the session into every
/// pipeline operation.
#[derive(Debug, Clone)]
pub struct Session {
    id: Uuid,
    created_at: DateTime<Utc>,
    state: SessionState,
    store: ArtifactStore,
    chat: Vec<ChatMessage>,
}

impl Session {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            state: SessionState::Idle,
            store: ArtifactStore::new(),
            chat: Vec::new(),
        }
    }

    /// Session pre-populated with artifacts loaded from disk.
    pub fn with_artifacts(source_text: impl Into<String>, artifacts: ArtifactSet) -> Self {
        let mut session = Self::new();
        session.finish_generation(source_text, artifacts);
        session
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn store(&self) -> &ArtifactStore {
        &self.store
    }

    pub fn artifacts(&self) -> Option<&ArtifactSet> {
        self.store.get()
    }

    pub fn source_text(&self) -> Option<&str> {
        self.store.processed_key()
    }

    pub fn chat_history(&self) -> &[ChatMessage] {
        &self.chat
    }

    pub(crate) fn begin_generation(&mut self) {
        self.state = SessionState::Generating;
    }

    /// Stores the new triple, resets the chat and leaves `Generating`.
    pub(crate) fn finish_generation(&mut self, source_text: impl Into<String>, artifacts: ArtifactSet) {
        self.state = if artifacts.any_ready() {
            SessionState::Ready
        } else {
            SessionState::Failed
        };
        self.store.put(source_text, artifacts);
        self.chat.clear();
    }

    pub(crate) fn append_exchange(&mut self, question: ChatMessage, answer: ChatMessage) {
        self.chat.push(question);
        self.chat.push(answer);
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}
