use vidgraph::analysis::analyze;
use vidgraph::ingestion::{validate_graph, validate_quiz, MockCompletionClient};
use vidgraph::memory::{ArtifactLoader, ArtifactWriter};
use vidgraph::render::StudyGuide;
use vidgraph::{GenerationOutcome, GenerationRequest, Persona, PipelineError, Session, SessionState, Task};

mod common;
use common::{pipeline, script_generation, GRAPH_REPLY, QUIZ_REPLY, SUMMARY_REPLY};

#[test]
fn test_same_source_text_is_not_regenerated() {
    let mock = MockCompletionClient::default();
    script_generation(&mock);
    let pipeline = pipeline(&mock);
    let mut session = Session::new();

    let first = pipeline
        .generate(&mut session, GenerationRequest::new("lecture", Persona::Neutral))
        .unwrap();
    assert!(matches!(first, GenerationOutcome::Generated { .. }));
    assert_eq!(mock.call_count(), 3);
    let before = session.artifacts().cloned();

    let second = pipeline
        .generate(&mut session, GenerationRequest::new("lecture", Persona::Expert))
        .unwrap();
    assert_eq!(second, GenerationOutcome::Reused);
    assert_eq!(mock.call_count(), 3, "no completion call for an unchanged source");
    assert_eq!(session.artifacts().cloned(), before);
}

#[test]
fn test_empty_input_makes_no_call() {
    let mock = MockCompletionClient::default();
    let mut session = Session::new();
    let err = pipeline(&mock)
        .generate(&mut session, GenerationRequest::new("", Persona::Neutral))
        .unwrap_err();
    assert!(matches!(err, PipelineError::EmptyInput));
    assert_eq!(mock.call_count(), 0);
    assert_eq!(session.state(), SessionState::Idle);
    assert!(session.artifacts().is_none());
}

#[test]
fn test_fenced_reply_parses_like_bare_reply() {
    let fenced = format!("```json\n{}\n```", GRAPH_REPLY);
    let bare = validate_graph(GRAPH_REPLY).unwrap();
    let wrapped = validate_graph(&fenced).unwrap();
    assert_eq!(bare.value, wrapped.value);
    assert_eq!(bare.report, wrapped.report);
}

#[test]
fn test_edge_to_unknown_node_is_dropped() {
    let validated = validate_graph(GRAPH_REPLY).unwrap();
    assert_eq!(validated.value.nodes.len(), 2);
    assert_eq!(validated.value.edges.len(), 1);
    assert_eq!(validated.value.edges[0].target_id, "B");
    assert_eq!(validated.report.dropped_edges, 1);
    assert_eq!(validated.value.dangling_edges(), 0);
}

#[test]
fn test_answer_with_trailing_space_is_graded_correct() {
    let quiz = validate_quiz(QUIZ_REPLY).unwrap().value;
    let item = &quiz.items[0];
    assert!(item.is_correct("Paris "));
    assert!(!item.is_correct("paris"));
    assert_eq!(quiz.score(&["Paris "]).correct, 1);
}

#[test]
fn test_generation_persists_and_exports() {
    let mock = MockCompletionClient::default();
    script_generation(&mock);
    let mut session = Session::new();
    pipeline(&mock)
        .generate(&mut session, GenerationRequest::new("lecture", Persona::Beginner))
        .unwrap();
    assert_eq!(session.state(), SessionState::Ready);

    let dir = tempfile::tempdir().unwrap();
    let artifacts = session.artifacts().unwrap();
    ArtifactWriter::save_to_dir(dir.path(), session.source_text().unwrap(), artifacts).unwrap();
    assert!(dir.path().join("graph.json").exists());
    assert!(dir.path().join("quiz.json").exists());
    assert_eq!(
        std::fs::read_to_string(dir.path().join("summary.txt")).unwrap(),
        SUMMARY_REPLY
    );

    let (source, loaded) = ArtifactLoader::load_from_dir(dir.path()).unwrap();
    assert_eq!(source, "lecture");
    assert_eq!(&loaded, artifacts);

    let restored = Session::with_artifacts(source, loaded);
    assert_eq!(restored.state(), SessionState::Ready);
    assert!(restored.store().is_processed("lecture"));

    let insights = analyze(restored.artifacts().unwrap().graph.ready().unwrap());
    assert!(insights.is_connected());

    let pdf = StudyGuide::from_artifacts("Study Guide", restored.artifacts().unwrap())
        .to_pdf()
        .unwrap();
    assert!(pdf.starts_with(b"%PDF"));
}

#[test]
fn test_partial_failure_keeps_successful_artifacts() {
    let mock = MockCompletionClient::default();
    mock.push_failure("model overloaded");
    mock.push_response(QUIZ_REPLY);
    mock.push_response(SUMMARY_REPLY);
    let mut session = Session::new();
    let outcome = pipeline(&mock)
        .generate(&mut session, GenerationRequest::new("lecture", Persona::Neutral))
        .unwrap();

    match outcome {
        GenerationOutcome::Generated { failed, .. } => assert_eq!(failed, vec![Task::Graph]),
        GenerationOutcome::Reused => panic!("expected a fresh generation"),
    }
    let artifacts = session.artifacts().unwrap();
    let failure = artifacts.graph.failure().unwrap();
    assert!(failure.to_string().starts_with("could not generate"));
    assert!(artifacts.quiz.is_ready());
    assert_eq!(artifacts.summary_text(), Some(SUMMARY_REPLY));
    assert_eq!(session.state(), SessionState::Ready);
}

#[test]
fn test_chat_uses_document_context() {
    let mock = MockCompletionClient::default();
    script_generation(&mock);
    mock.push_response("Chlorophyll absorbs light.");
    let pipeline = pipeline(&mock);
    let mut session = Session::new();
    pipeline
        .generate(&mut session, GenerationRequest::new("lecture about plants", Persona::Neutral))
        .unwrap();

    let answer = pipeline.ask(&mut session, "What absorbs light?").unwrap();
    assert_eq!(answer, "Chlorophyll absorbs light.");
    let request = mock.requests().pop().unwrap();
    assert_eq!(request.task, Task::Chat);
    assert!(!request.json_mode);
    assert!(request.instruction.contains("lecture about plants"));
    assert!(request.instruction.contains("What absorbs light?"));
    assert_eq!(session.chat_history().len(), 2);
}
