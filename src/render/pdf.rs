use crate::memory::{ArtifactSet, ArtifactSlot};
use anyhow::{anyhow, Result};
use printpdf::{BuiltinFont, IndirectFontRef, Mm, PdfDocument};

pub const SUBSTITUTE_GLYPH: char = '?';
const WRAP_COLUMNS: usize = 90;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineStyle {
    Body,
    Strong,
    Muted,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuideLine {
    pub text: String,
    pub style: LineStyle,
}

impl GuideLine {
    fn body(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            style: LineStyle::Body,
        }
    }

    fn strong(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            style: LineStyle::Strong,
        }
    }

    fn muted(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            style: LineStyle::Muted,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuideSection {
    pub heading: String,
    pub lines: Vec<GuideLine>,
}

/// Printable study guide: Summary, Key Concepts, Quiz and Answer Key, in that order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StudyGuide {
    pub title: String,
    pub sections: Vec<GuideSection>,
}

impl StudyGuide {
    pub fn from_artifacts(title: impl Into<String>, artifacts: &ArtifactSet) -> Self {
        let summary = match &artifacts.summary {
            ArtifactSlot::Ready(text) => text
                .split("\n\n")
                .map(|paragraph| GuideLine::body(paragraph.trim()))
                .filter(|line| !line.text.is_empty())
                .collect(),
            ArtifactSlot::Failed(failure) => vec![GuideLine::muted(failure.to_string())],
        };

        let concepts = match &artifacts.graph {
            ArtifactSlot::Ready(graph) if graph.is_empty() => {
                vec![GuideLine::muted("No concepts were extracted.")]
            }
            ArtifactSlot::Ready(graph) => graph
                .nodes
                .iter()
                .map(|node| {
                    if node.category.is_core() {
                        GuideLine::strong(format!("[CORE] {}", node.label))
                    } else {
                        GuideLine::body(format!("- {}", node.label))
                    }
                })
                .collect(),
            ArtifactSlot::Failed(failure) => vec![GuideLine::muted(failure.to_string())],
        };

        let (questions, answers) = match &artifacts.quiz {
            ArtifactSlot::Ready(quiz) => {
                let mut questions = Vec::new();
                let mut answers = Vec::new();
                for (i, item) in quiz.iter().enumerate() {
                    questions.push(GuideLine::strong(format!("Q{}: {}", i + 1, item.question)));
                    for option in &item.options {
                        questions.push(GuideLine::body(format!("   - {}", option)));
                    }
                    answers.push(GuideLine::body(format!("Q{}: {}", i + 1, item.answer.trim())));
                }
                (questions, answers)
            }
            ArtifactSlot::Failed(failure) => (
                vec![GuideLine::muted(failure.to_string())],
                vec![GuideLine::muted("No answers available.")],
            ),
        };

        Self {
            title: title.into(),
            sections: vec![
                GuideSection {
                    heading: "1. Summary".to_string(),
                    lines: summary,
                },
                GuideSection {
                    heading: "2. Key Concepts".to_string(),
                    lines: concepts,
                },
                GuideSection {
                    heading: "3. Quiz".to_string(),
                    lines: questions,
                },
                GuideSection {
                    heading: "4. Answer Key".to_string(),
                    lines: answers,
                },
            ],
        }
    }

    /// Renders an A4 document with the built-in Helvetica faces.
    pub fn to_pdf(&self) -> Result<Vec<u8>> {
        let title = latin1_safe(&self.title);
        let (doc, first_page, first_layer) =
            PdfDocument::new(title.as_str(), Mm(210.0), Mm(297.0), "Layer 1");
        let regular = builtin_font(&doc, BuiltinFont::Helvetica)?;
        let bold = builtin_font(&doc, BuiltinFont::HelveticaBold)?;
        let oblique = builtin_font(&doc, BuiltinFont::HelveticaOblique)?;

        let mut layer = doc.get_page(first_page).get_layer(first_layer);
        let mut y = 277.0;
        layer.use_text(title.as_str(), 16.0, Mm(20.0), Mm(y), &bold);
        y -= 14.0;

        for section in &self.sections {
            let mut rows = vec![(latin1_safe(&section.heading), &bold, 13.0, 9.0)];
            for line in &section.lines {
                let font = match line.style {
                    LineStyle::Body => &regular,
                    LineStyle::Strong => &bold,
                    LineStyle::Muted => &oblique,
                };
                for wrapped in wrap(&latin1_safe(&line.text), WRAP_COLUMNS) {
                    rows.push((wrapped, font, 11.0, 6.0));
                }
            }
            for (text, font, size, step) in rows {
                if y < 20.0 {
                    let (page, page_layer) = doc.add_page(Mm(210.0), Mm(297.0), "Layer 1");
                    layer = doc.get_page(page).get_layer(page_layer);
                    y = 277.0;
                }
                layer.use_text(text, size, Mm(20.0), Mm(y), font);
                y -= step;
            }
            y -= 6.0;
        }

        doc.save_to_bytes()
            .map_err(|e| anyhow!("unable to serialise PDF: {:?}", e))
    }
}

fn builtin_font(doc: &printpdf::PdfDocumentReference, font: BuiltinFont) -> Result<IndirectFontRef> {
    doc.add_builtin_font(font)
        .map_err(|e| anyhow!("unable to load built-in font: {:?}", e))
}

/// Replaces every character outside Latin-1 with [`SUBSTITUTE_GLYPH`].
pub fn latin1_safe(text: &str) -> String {
    text.chars()
        .map(|c| if (c as u32) <= 0xFF { c } else { SUBSTITUTE_GLYPH })
        .collect()
}

/// Greedy word wrap; words longer than the width are split.
pub fn wrap(text: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    for paragraph in text.lines() {
        let mut current = String::new();
        let mut current_len = 0;
        for word in paragraph.split_whitespace() {
            let mut word: Vec<char> = word.chars().collect();
            while word.len() > width {
                if current_len > 0 {
                    lines.push(std::mem::take(&mut current));
                    current_len = 0;
                }
                lines.push(word.drain(..width).collect());
            }
            if word.is_empty() {
                continue;
            }
            let extra = if current_len == 0 { word.len() } else { word.len() + 1 };
            if current_len + extra > width {
                lines.push(std::mem::take(&mut current));
                current_len = 0;
            }
            if current_len > 0 {
                current.push(' ');
                current_len += 1;
            }
            current.extend(word.iter());
            current_len += word.len();
        }
        if current_len > 0 || paragraph.trim().is_empty() {
            lines.push(current);
        }
    }
    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ConceptGraph, ConceptNode, Persona, Quiz, QuizItem, Task};
    use crate::error::PipelineError;
    use crate::ingestion::ValidationReport;
    use chrono::Utc;

    fn artifacts() -> ArtifactSet {
        ArtifactSet {
            graph: ArtifactSlot::Ready(ConceptGraph::new(
                vec![ConceptNode::core("a", "Entropy"), ConceptNode::sub("b", "Heat")],
                vec![],
            )),
            quiz: ArtifactSlot::Ready(Quiz::new(vec![QuizItem::new(
                "What rises?",
                ["Entropy", "Order"],
                " Entropy ",
            )])),
            summary: ArtifactSlot::Ready("First paragraph.\n\nSecond → paragraph.".into()),
            persona: Persona::Neutral,
            generated_at: Utc::now(),
            report: ValidationReport::default(),
        }
    }

    #[test]
    fn sections_follow_fixed_order() {
        let guide = StudyGuide::from_artifacts("Guide", &artifacts());
        let headings: Vec<_> = guide.sections.iter().map(|s| s.heading.as_str()).collect();
        assert_eq!(headings, vec!["1. Summary", "2. Key Concepts", "3. Quiz", "4. Answer Key"]);
        assert_eq!(guide.sections[0].lines.len(), 2);
        assert_eq!(guide.sections[1].lines[0].text, "[CORE] Entropy");
        assert_eq!(guide.sections[1].lines[1].text, "- Heat");
        assert_eq!(guide.sections[2].lines[0].text, "Q1: What rises?");
        assert_eq!(guide.sections[3].lines[0].text, "Q1: Entropy");
    }

    #[test]
    fn failed_quiz_renders_could_not_generate() {
        let mut set = artifacts();
        set.quiz = ArtifactSlot::from_result(Err(PipelineError::parse(Task::Quiz, "oops")));
        let guide = StudyGuide::from_artifacts("Guide", &set);
        assert!(guide.sections[2].lines[0].text.starts_with("could not generate"));
        assert_eq!(guide.sections[2].lines[0].style, LineStyle::Muted);
    }

    #[test]
    fn non_latin1_characters_are_substituted() {
        assert_eq!(latin1_safe("Café → 東京"), "Café ? ??");
    }

    #[test]
    fn wraps_on_word_boundaries() {
        let lines = wrap("aaa bbb ccc", 7);
        assert_eq!(lines, vec!["aaa bbb", "ccc"]);
        let lines = wrap("abcdefghij", 4);
        assert_eq!(lines, vec!["abcd", "efgh", "ij"]);
        assert_eq!(wrap("", 10), vec![String::new()]);
    }

    #[test]
    fn renders_a_pdf_document() {
        let bytes = StudyGuide::from_artifacts("Guide", &artifacts()).to_pdf().unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }
}
