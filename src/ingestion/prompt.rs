use crate::config::DEFAULT_MAX_INPUT_CHARS;
use crate::domain::{ChatMessage, ChatRole, Persona, Task};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptTemplate {
    pub role: String,
    pub graph: String,
    pub quiz: String,
    pub summary: String,
    pub chat: String,
}

impl Default for PromptTemplate {
    fn default() -> Self {
        let role = "You are an expert teacher who turns transcripts and articles into study material.".to_string();

        let graph = concat!(
            "Analyze the text below and extract its key concepts and the relationships between them.\n",
            "Rules:\n",
            "1. Identify 8-15 key concepts.\n",
            "2. Mark the few central ideas with \"type\": \"core\" and every supporting idea with \"type\": \"sub\".\n",
            "3. Keep labels short (1-3 words).\n",
            "4. Every edge must reference node ids that appear in \"nodes\".\n",
            "5. The graph must be connected: link every core concept cluster to at least one other ",
            "cluster so that no group of concepts is isolated.\n\n",
            "Output STRICTLY one JSON object with this structure and nothing else:\n",
            "{\"nodes\": [{\"id\": \"Concept1\", \"label\": \"Concept1\", \"type\": \"core\"}, ",
            "{\"id\": \"Concept2\", \"label\": \"Concept2\", \"type\": \"sub\"}], ",
            "\"edges\": [{\"source\": \"Concept1\", \"target\": \"Concept2\", \"label\": \"relates to\"}]}"
        )
        .to_string();

        let quiz = concat!(
            "Write a multiple-choice quiz of 5 questions that checks understanding of the text below.\n",
            "Each question has exactly 4 distinct options. The \"answer\" field must be copied verbatim ",
            "from one of the options. Add a one-sentence \"explanation\" for the correct answer.\n\n",
            "Output STRICTLY one JSON array with this structure and nothing else:\n",
            "[{\"question\": \"...\", \"options\": [\"A\", \"B\", \"C\", \"D\"], \"answer\": \"A\", ",
            "\"explanation\": \"...\"}]"
        )
        .to_string();

        let summary = concat!(
            "Write an executive summary of the text below in at most three short paragraphs.\n",
            "Answer in plain prose only: no JSON, no markdown headings, no code fences."
        )
        .to_string();

        let chat = concat!(
            "Answer the user's question using only the document below. If the document does not ",
            "contain the answer, say so. Answer in plain prose without code fences."
        )
        .to_string();

        Self {
            role,
            graph,
            quiz,
            summary,
            chat,
        }
    }
}

/// Builds one instruction string per task from raw text and a persona.
#[derive(Debug, Clone)]
pub struct PromptFormatter {
    template: PromptTemplate,
    max_chars: usize,
}

impl PromptFormatter {
    pub fn new(template: PromptTemplate, max_chars: usize) -> Self {
        Self {
            template,
            max_chars,
        }
    }

    pub fn max_chars(&self) -> usize {
        self.max_chars
    }

    pub fn format(&self, source_text: &str, task: Task, persona: Persona) -> String {
        let contract = match task {
            Task::Graph => &self.template.graph,
            Task::Quiz => &self.template.quiz,
            Task::Summary => &self.template.summary,
            Task::Chat => &self.template.chat,
        };
        format!(
            "{}\n{}\n\n{}\n\nText:\n{}",
            self.template.role,
            persona.style_directive(),
            contract,
            truncate_chars(source_text, self.max_chars)
        )
    }

    /// Chat instruction: document, optional summary, the last `max_turns` messages, then the question.
    pub fn format_chat(
        &self,
        source_text: &str,
        summary: Option<&str>,
        history: &[ChatMessage],
        max_turns: usize,
        question: &str,
        persona: Persona,
    ) -> String {
        let mut prompt = self.format(source_text, Task::Chat, persona);
        if let Some(summary) = summary {
            prompt.push_str("\n\nSummary:\n");
            prompt.push_str(summary);
        }
        let skip = history.len().saturating_sub(max_turns);
        if skip < history.len() {
            prompt.push_str("\n\nConversation so far:\n");
            for message in &history[skip..] {
                let speaker = match message.role {
                    ChatRole::User => "User",
                    ChatRole::Assistant => "Assistant",
                };
                prompt.push_str(&format!("{}: {}\n", speaker, message.content));
            }
        }
        prompt.push_str(&format!("\n\nQuestion: {}", question.trim()));
        prompt
    }
}

impl Default for PromptFormatter {
    fn default() -> Self {
        Self::new(PromptTemplate::default(), DEFAULT_MAX_INPUT_CHARS)
    }
}

/// Cuts on a char boundary after `max_chars` Unicode scalar values.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_index, _)) => &text[..byte_index],
        None => text,
    }
}
