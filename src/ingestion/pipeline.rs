use super::llm_client::CompletionClient;
use super::prompt::PromptFormatter;
use super::response::CompletionRequest;
use super::validator::{
    strip_code_fences, validate_graph, validate_quiz, validate_summary, ValidationReport,
};
use crate::config::ApiKey;
use crate::domain::{ChatMessage, GenerationRequest, Task};
use crate::error::{PipelineError, PipelineResult};
use crate::memory::{ArtifactSet, ArtifactSlot, Session, SessionState};
use crate::utils::hash_text;
use chrono::Utc;
use std::sync::Arc;
use tracing::{info, warn};

pub const DEFAULT_CHAT_TURNS: usize = 6;

#[derive(Debug, Clone, PartialEq)]
pub enum GenerationOutcome {
    /// The source text matched the stored key; no completion call was made.
    Reused,
    Generated {
        report: ValidationReport,
        failed: Vec<Task>,
    },
}

pub struct GenerationPipeline<C: CompletionClient> {
    llm: Arc<C>,
    formatter: PromptFormatter,
    credential: Option<ApiKey>,
    chat_turns: usize,
}

impl<C: CompletionClient> GenerationPipeline<C> {
    pub fn new(llm: Arc<C>, formatter: PromptFormatter, credential: Option<ApiKey>) -> Self {
        Self {
            llm,
            formatter,
            credential,
            chat_turns: DEFAULT_CHAT_TURNS,
        }
    }

    pub fn with_chat_turns(mut self, turns: usize) -> Self {
        self.chat_turns = turns;
        self
    }

    /// Runs graph, quiz and summary generation in sequence for a new source text.
    ///
    /// Precondition failures (blank input, missing key) return early without touching
    /// the session. Per-artifact failures are recorded in their slot.
    pub fn generate(
        &self,
        session: &mut Session,
        request: GenerationRequest,
    ) -> PipelineResult<GenerationOutcome> {
        if request.is_blank() {
            return Err(PipelineError::EmptyInput);
        }
        // A Failed session regenerates even identical text.
        if session.store().is_processed(request.source_text())
            && session.state() != SessionState::Failed
        {
            info!(session = %session.id(), "source text unchanged, reusing artifacts");
            return Ok(GenerationOutcome::Reused);
        }
        let credential = self.credential()?;

        session.begin_generation();
        let persona = request.persona();
        let chars = request.source_text().chars().count();
        info!(
            session = %session.id(),
            %persona,
            input = %hash_text(request.source_text()),
            chars,
            "generating artifacts"
        );
        if chars > self.formatter.max_chars() {
            warn!(chars, limit = self.formatter.max_chars(), "source text truncated in prompts");
        }

        let mut report = ValidationReport::default();
        let graph = self
            .run_task(credential, &request, Task::Graph, validate_graph)
            .map(|validated| {
                report.merge(validated.report);
                validated.value
            });
        let quiz = self
            .run_task(credential, &request, Task::Quiz, validate_quiz)
            .map(|validated| {
                report.merge(validated.report);
                validated.value
            });
        let summary = self.run_task(credential, &request, Task::Summary, validate_summary);

        if !report.is_clean() {
            warn!(
                dropped_nodes = report.dropped_nodes,
                dropped_edges = report.dropped_edges,
                dropped_items = report.dropped_items,
                unmatched_answers = report.unmatched_answers,
                "model output repaired"
            );
        }

        let artifacts = ArtifactSet {
            graph: ArtifactSlot::from_result(graph),
            quiz: ArtifactSlot::from_result(quiz),
            summary: ArtifactSlot::from_result(summary),
            persona,
            generated_at: Utc::now(),
            report,
        };
        let failed = failed_tasks(&artifacts);
        session.finish_generation(request.source_text(), artifacts);
        info!(session = %session.id(), state = %session.state(), failed = failed.len(), "generation finished");

        Ok(GenerationOutcome::Generated { report, failed })
    }

    /// Answers a question about the processed document and appends the exchange to the chat.
    pub fn ask(&self, session: &mut Session, question: &str) -> PipelineResult<String> {
        if question.trim().is_empty() {
            return Err(PipelineError::EmptyInput);
        }
        let (source_text, artifacts) = match (session.source_text(), session.artifacts()) {
            (Some(source_text), Some(artifacts)) => (source_text, artifacts),
            _ => return Err(PipelineError::NoDocument),
        };
        let credential = self.credential()?;

        let instruction = self.formatter.format_chat(
            source_text,
            artifacts.summary_text(),
            session.chat_history(),
            self.chat_turns,
            question,
            artifacts.persona,
        );
        let request = CompletionRequest::new(Task::Chat, instruction);
        let raw = self.llm.complete(credential, &request)?;
        let answer = strip_code_fences(&raw).to_string();
        if answer.is_empty() {
            return Err(PipelineError::parse(Task::Chat, "answer is empty"));
        }

        session.append_exchange(
            ChatMessage::user(question.trim()),
            ChatMessage::assistant(answer.clone()),
        );
        Ok(answer)
    }

    fn credential(&self) -> PipelineResult<&ApiKey> {
        self.credential
            .as_ref()
            .ok_or(PipelineError::MissingCredential)
    }

    fn run_task<T>(
        &self,
        credential: &ApiKey,
        request: &GenerationRequest,
        task: Task,
        validate: impl FnOnce(&str) -> PipelineResult<T>,
    ) -> PipelineResult<T> {
        let instruction = self
            .formatter
            .format(request.source_text(), task, request.persona());
        let prompt_hash = hash_text(&instruction);
        let completion = CompletionRequest::new(task, instruction);

        let result = self
            .llm
            .complete(credential, &completion)
            .and_then(|raw| validate(&raw));
        match &result {
            Ok(_) => info!(%task, prompt = %prompt_hash, "artifact ready"),
            Err(e) => warn!(%task, prompt = %prompt_hash, error = %e, "artifact failed"),
        }
        result
    }
}

fn failed_tasks(artifacts: &ArtifactSet) -> Vec<Task> {
    let mut failed = Vec::new();
    if !artifacts.graph.is_ready() {
        failed.push(Task::Graph);
    }
    if !artifacts.quiz.is_ready() {
        failed.push(Task::Quiz);
    }
    if !artifacts.summary.is_ready() {
        failed.push(Task::Summary);
    }
    failed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Persona;
    use crate::ingestion::MockCompletionClient;

    const GRAPH: &str = r#"{"nodes":[{"id":"A","label":"A","type":"core"},{"id":"B","label":"B"}],"edges":[{"source":"A","target":"B","label":"r"},{"source":"A","target":"C","label":"x"}]}"#;
    const QUIZ: &str = r#"[{"question":"Q","options":["a","b"],"answer":"a"}]"#;

    fn pipeline(mock: &MockCompletionClient) -> GenerationPipeline<MockCompletionClient> {
        GenerationPipeline::new(
            Arc::new(mock.clone()),
            PromptFormatter::default(),
            ApiKey::new("test-key"),
        )
    }

    fn script_success(mock: &MockCompletionClient) {
        mock.push_response(format!("```json\n{}\n```", GRAPH));
        mock.push_response(QUIZ);
        mock.push_response("A summary.");
    }

    #[test]
    fn generates_three_artifacts_in_order() {
        let mock = MockCompletionClient::default();
        script_success(&mock);
        let mut session = Session::new();
        let outcome = pipeline(&mock)
            .generate(&mut session, GenerationRequest::new("text", Persona::Beginner))
            .unwrap();

        let tasks: Vec<Task> = mock.requests().iter().map(|r| r.task).collect();
        assert_eq!(tasks, vec![Task::Graph, Task::Quiz, Task::Summary]);
        assert_eq!(session.state(), SessionState::Ready);
        match outcome {
            GenerationOutcome::Generated { report, failed } => {
                assert!(failed.is_empty());
                assert_eq!(report.dropped_edges, 1);
            }
            GenerationOutcome::Reused => panic!("expected a fresh generation"),
        }
        let artifacts = session.artifacts().unwrap();
        assert_eq!(artifacts.graph.ready().unwrap().edges.len(), 1);
        assert_eq!(artifacts.persona, Persona::Beginner);
    }

    #[test]
    fn failed_quiz_does_not_block_other_artifacts() {
        let mock = MockCompletionClient::default();
        mock.push_response(GRAPH);
        mock.push_response("this is not json");
        mock.push_response("A summary.");
        let mut session = Session::new();
        pipeline(&mock)
            .generate(&mut session, GenerationRequest::new("text", Persona::Neutral))
            .unwrap();

        let artifacts = session.artifacts().unwrap();
        assert!(artifacts.graph.is_ready());
        assert!(artifacts.summary.is_ready());
        assert!(artifacts.quiz.failure().is_some());
        assert_eq!(session.state(), SessionState::Ready);
    }

    #[test]
    fn all_failures_leave_session_failed() {
        let mock = MockCompletionClient::default();
        mock.push_failure("quota exceeded");
        mock.push_failure("quota exceeded");
        mock.push_failure("quota exceeded");
        let mut session = Session::new();
        let outcome = pipeline(&mock)
            .generate(&mut session, GenerationRequest::new("text", Persona::Neutral))
            .unwrap();
        assert_eq!(session.state(), SessionState::Failed);
        assert!(matches!(outcome, GenerationOutcome::Generated { ref failed, .. } if failed.len() == 3));
        let failure = session.artifacts().unwrap().summary.failure().unwrap();
        assert!(failure.message.contains("quota exceeded"));
    }

    #[test]
    fn failed_generation_can_be_retried_with_same_text() {
        let mock = MockCompletionClient::default();
        for _ in 0..3 {
            mock.push_failure("service unavailable");
        }
        let pipeline = pipeline(&mock);
        let mut session = Session::new();
        pipeline
            .generate(&mut session, GenerationRequest::new("lecture", Persona::Neutral))
            .unwrap();
        assert_eq!(session.state(), SessionState::Failed);

        script_success(&mock);
        let retry = pipeline
            .generate(&mut session, GenerationRequest::new("lecture", Persona::Neutral))
            .unwrap();
        assert!(matches!(retry, GenerationOutcome::Generated { ref failed, .. } if failed.is_empty()));
        assert_eq!(mock.call_count(), 6);
        assert_eq!(session.state(), SessionState::Ready);

        let again = pipeline
            .generate(&mut session, GenerationRequest::new("lecture", Persona::Neutral))
            .unwrap();
        assert_eq!(again, GenerationOutcome::Reused);
        assert_eq!(mock.call_count(), 6);
    }

    #[test]
    fn blank_input_never_calls_the_client() {
        let mock = MockCompletionClient::default();
        let mut session = Session::new();
        let err = pipeline(&mock)
            .generate(&mut session, GenerationRequest::new("  \n ", Persona::Neutral))
            .unwrap_err();
        assert!(matches!(err, PipelineError::EmptyInput));
        assert_eq!(mock.call_count(), 0);
        assert_eq!(session.state(), SessionState::Idle);
    }

    #[test]
    fn missing_credential_blocks_generation() {
        let mock = MockCompletionClient::default();
        let pipeline = GenerationPipeline::new(
            Arc::new(mock.clone()),
            PromptFormatter::default(),
            None,
        );
        let mut session = Session::new();
        let err = pipeline
            .generate(&mut session, GenerationRequest::new("text", Persona::Neutral))
            .unwrap_err();
        assert!(matches!(err, PipelineError::MissingCredential));
        assert_eq!(mock.call_count(), 0);
    }

    #[test]
    fn chat_appends_and_resets_on_new_text() {
        let mock = MockCompletionClient::default();
        script_success(&mock);
        mock.push_response("Because A feeds B.");
        let pipeline = pipeline(&mock);
        let mut session = Session::new();

        let err = pipeline.ask(&mut session, "why?").unwrap_err();
        assert!(matches!(err, PipelineError::NoDocument));

        pipeline
            .generate(&mut session, GenerationRequest::new("text", Persona::Neutral))
            .unwrap();
        let answer = pipeline.ask(&mut session, " why? ").unwrap();
        assert_eq!(answer, "Because A feeds B.");
        assert_eq!(session.chat_history().len(), 2);
        let chat_request = mock.requests().pop().unwrap();
        assert_eq!(chat_request.task, Task::Chat);
        assert!(chat_request.instruction.contains("A summary."));

        script_success(&mock);
        pipeline
            .generate(&mut session, GenerationRequest::new("other text", Persona::Neutral))
            .unwrap();
        assert!(session.chat_history().is_empty());
    }
}
