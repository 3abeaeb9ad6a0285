use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizItem {
    pub question: String,
    pub options: Vec<String>,
    pub answer: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
}

impl QuizItem {
    pub fn new(
        question: impl Into<String>,
        options: impl IntoIterator<Item = impl Into<String>>,
        answer: impl Into<String>,
    ) -> Self {
        Self {
            question: question.into(),
            options: options.into_iter().map(Into::into).collect(),
            answer: answer.into(),
            explanation: None,
        }
    }

    pub fn with_explanation(mut self, explanation: impl Into<String>) -> Self {
        self.explanation = Some(explanation.into());
        self
    }

    /// Whitespace-trimmed, case-sensitive comparison against the expected answer.
    pub fn is_correct(&self, choice: &str) -> bool {
        choice.trim() == self.answer.trim()
    }

    /// Index of the option holding the answer, if any option matches it.
    pub fn answer_index(&self) -> Option<usize> {
        self.options
            .iter()
            .position(|option| option.trim() == self.answer.trim())
    }

    pub fn answer_in_options(&self) -> bool {
        self.answer_index().is_some()
    }

    /// Maps a 1-based option number to its text; anything else is taken as typed.
    pub fn resolve_choice<'a>(&'a self, input: &'a str) -> &'a str {
        let input = input.trim();
        input
            .parse::<usize>()
            .ok()
            .and_then(|n| n.checked_sub(1))
            .and_then(|i| self.options.get(i))
            .map(String::as_str)
            .unwrap_or(input)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Quiz {
    pub items: Vec<QuizItem>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct QuizScore {
    pub correct: usize,
    pub total: usize,
}

impl QuizScore {
    pub fn ratio(&self) -> f32 {
        if self.total == 0 {
            0.0
        } else {
            self.correct as f32 / self.total as f32
        }
    }
}

impl Quiz {
    pub fn new(items: Vec<QuizItem>) -> Self {
        Self { items }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &QuizItem> {
        self.items.iter()
    }

    /// Grades answers positionally; missing answers count as wrong.
    pub fn score<S: AsRef<str>>(&self, answers: &[S]) -> QuizScore {
        let correct = self
            .items
            .iter()
            .zip(answers)
            .filter(|(item, given)| item.is_correct(given.as_ref()))
            .count();
        QuizScore {
            correct,
            total: self.items.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn capital_item() -> QuizItem {
        QuizItem::new(
            "Capital of France?",
            ["Paris", "Lyon", "Nice"],
            "Paris ",
        )
    }

    #[test]
    fn trailing_space_answer_still_matches() {
        let item = capital_item();
        assert!(item.is_correct("Paris"));
        assert_eq!(item.answer_index(), Some(0));
    }

    #[test]
    fn numbered_choice_resolves_to_option_text() {
        let item = capital_item();
        assert_eq!(item.resolve_choice(" 1 "), "Paris");
        assert_eq!(item.resolve_choice("4"), "4");
        assert_eq!(item.resolve_choice("0"), "0");
        assert_eq!(item.resolve_choice("Lyon"), "Lyon");
        assert!(item.is_correct(item.resolve_choice("1")));
    }

    #[test]
    fn comparison_is_case_sensitive() {
        let item = capital_item();
        assert!(!item.is_correct("paris"));
    }

    #[test]
    fn scores_positionally() {
        let quiz = Quiz::new(vec![
            capital_item(),
            QuizItem::new("2 + 2?", ["3", "4"], "4"),
        ]);
        let score = quiz.score(&["Paris", "3"]);
        assert_eq!(score, QuizScore { correct: 1, total: 2 });
        assert_eq!(quiz.score::<&str>(&[]).correct, 0);
        assert!((score.ratio() - 0.5).abs() < f32::EPSILON);
    }

    #[test]
    fn serializes_as_bare_array() {
        let quiz = Quiz::new(vec![capital_item()]);
        let value = serde_json::to_value(&quiz).unwrap();
        assert!(value.is_array());
        assert!(value[0].get("explanation").is_none());
    }
}
