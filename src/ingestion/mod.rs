mod llm_client;
mod pipeline;
mod prompt;
mod response;
mod validator;

pub use llm_client::{
    extract_text, provider_message, select_model, CompletionClient, GeminiClient,
    MockCompletionClient, DEFAULT_MODEL,
};
pub use pipeline::{GenerationOutcome, GenerationPipeline, DEFAULT_CHAT_TURNS};
pub use prompt::{truncate_chars, PromptFormatter, PromptTemplate};
pub use response::CompletionRequest;
pub use validator::{
    parse_json, repair_graph, strip_code_fences, validate_graph, validate_quiz,
    validate_summary, Validated, ValidationReport,
};
