use super::response::{value_text, RawConceptEdge, RawConceptGraph, RawConceptNode, RawQuizItem};
use crate::domain::{ConceptCategory, ConceptEdge, ConceptGraph, ConceptNode, Quiz, QuizItem, Task};
use crate::error::{PipelineError, PipelineResult};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;

/// What the repair pass removed or flagged. Counts only; the artifact itself is still usable.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub dropped_nodes: usize,
    pub dropped_edges: usize,
    pub dropped_items: usize,
    pub unmatched_answers: usize,
}

impl ValidationReport {
    pub fn is_clean(&self) -> bool {
        *self == Self::default()
    }

    pub fn merge(&mut self, other: ValidationReport) {
        self.dropped_nodes += other.dropped_nodes;
        self.dropped_edges += other.dropped_edges;
        self.dropped_items += other.dropped_items;
        self.unmatched_answers += other.unmatched_answers;
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Validated<T> {
    pub value: T,
    pub report: ValidationReport,
}

/// Removes a surrounding Markdown code fence, with or without a language tag.
pub fn strip_code_fences(raw: &str) -> &str {
    // A tag only counts as one when whitespace, a newline or the end follows it.
    static OPENING: Lazy<Regex> = Lazy::new(|| {
        Regex::new(r"^```(?:[A-Za-z0-9_+-]+(?:[ \t]+|[ \t]*\r?\n|$))?[ \t]*(?:\r?\n)?").unwrap()
    });
    let mut text = raw.trim().trim_matches('\u{feff}').trim();
    if let Some(found) = OPENING.find(text) {
        text = &text[found.end()..];
    }
    if let Some(rest) = text.strip_suffix("```") {
        text = rest;
    }
    text.trim()
}

/// Parses the fence-stripped text, falling back to the outermost `{…}` or `[…]` slice.
pub fn parse_json(task: Task, raw: &str) -> PipelineResult<Value> {
    let text = strip_code_fences(raw);
    let first_error = match serde_json::from_str::<Value>(text) {
        Ok(value) => return Ok(value),
        Err(e) => e,
    };

    // Whichever bracket opens first is the outermost value.
    let mut spans: Vec<(usize, char)> = [('{', '}'), ('[', ']')]
        .into_iter()
        .filter_map(|(open, close)| text.find(open).map(|i| (i, close)))
        .collect();
    spans.sort_by_key(|&(i, _)| i);
    for (i, close) in spans {
        if let Some(j) = text.rfind(close).filter(|&j| i < j) {
            if let Ok(value) = serde_json::from_str::<Value>(&text[i..=j]) {
                return Ok(value);
            }
        }
    }

    Err(PipelineError::parse(task, first_error.to_string()))
}

pub fn validate_graph(raw: &str) -> PipelineResult<Validated<ConceptGraph>> {
    let value = parse_json(Task::Graph, raw)?;
    if !value.is_object() {
        return Err(PipelineError::parse(
            Task::Graph,
            "expected a JSON object with \"nodes\" and \"edges\"",
        ));
    }
    let raw_graph: RawConceptGraph = serde_json::from_value(value)
        .map_err(|e| PipelineError::parse(Task::Graph, e.to_string()))?;
    let raw_nodes = raw_graph.nodes.ok_or_else(|| {
        PipelineError::parse(Task::Graph, "missing \"nodes\" array")
    })?;

    let mut report = ValidationReport::default();
    let mut nodes = Vec::with_capacity(raw_nodes.len());
    for value in raw_nodes {
        match serde_json::from_value::<RawConceptNode>(value)
            .ok()
            .and_then(normalize_node)
        {
            Some(node) => nodes.push(node),
            None => report.dropped_nodes += 1,
        }
    }

    let raw_edges = raw_graph.edges.unwrap_or_default();
    let mut edges = Vec::with_capacity(raw_edges.len());
    for value in raw_edges {
        match serde_json::from_value::<RawConceptEdge>(value)
            .ok()
            .and_then(normalize_edge)
        {
            Some(edge) => edges.push(edge),
            None => report.dropped_edges += 1,
        }
    }

    let mut repaired = repair_graph(ConceptGraph::new(nodes, edges));
    repaired.report.merge(report);
    Ok(repaired)
}

/// Drops later duplicates of a node id, then every edge whose endpoint is not a node.
pub fn repair_graph(graph: ConceptGraph) -> Validated<ConceptGraph> {
    let mut report = ValidationReport::default();

    let mut seen = HashSet::new();
    let mut nodes = Vec::with_capacity(graph.nodes.len());
    for node in graph.nodes {
        if seen.insert(node.id.clone()) {
            nodes.push(node);
        } else {
            report.dropped_nodes += 1;
        }
    }

    let edges: Vec<ConceptEdge> = graph
        .edges
        .into_iter()
        .filter(|edge| {
            let keep = seen.contains(&edge.source_id) && seen.contains(&edge.target_id);
            if !keep {
                report.dropped_edges += 1;
            }
            keep
        })
        .collect();

    Validated {
        value: ConceptGraph::new(nodes, edges),
        report,
    }
}

fn normalize_node(raw: RawConceptNode) -> Option<ConceptNode> {
    let id = raw.id.as_ref().and_then(value_text);
    let label = raw.label.as_ref().and_then(value_text);
    let (id, label) = match (id, label) {
        (Some(id), Some(label)) => (id, label),
        (Some(id), None) => (id.clone(), id),
        (None, Some(label)) => (label.clone(), label),
        (None, None) => return None,
    };
    let category = raw
        .category
        .as_ref()
        .and_then(value_text)
        .map(|c| ConceptCategory::from_loose(&c))
        .unwrap_or_default();
    Some(ConceptNode::new(id, label, category))
}

fn normalize_edge(raw: RawConceptEdge) -> Option<ConceptEdge> {
    let source = raw.source.as_ref().and_then(value_text)?;
    let target = raw.target.as_ref().and_then(value_text)?;
    let label = raw.label.as_ref().and_then(value_text).unwrap_or_default();
    Some(ConceptEdge::new(source, target, label))
}

pub fn validate_quiz(raw: &str) -> PipelineResult<Validated<Quiz>> {
    let value = parse_json(Task::Quiz, raw)?;
    let raw_items = match value {
        Value::Array(items) => items,
        Value::Object(mut map) => match ["quiz", "questions", "items"]
            .iter()
            .find_map(|key| map.remove(*key))
        {
            Some(Value::Array(items)) => items,
            _ => {
                return Err(PipelineError::parse(
                    Task::Quiz,
                    "expected a JSON array of quiz items",
                ))
            }
        },
        _ => {
            return Err(PipelineError::parse(
                Task::Quiz,
                "expected a JSON array of quiz items",
            ))
        }
    };

    let mut report = ValidationReport::default();
    let mut items = Vec::with_capacity(raw_items.len());
    for value in raw_items {
        match serde_json::from_value::<RawQuizItem>(value)
            .ok()
            .and_then(normalize_quiz_item)
        {
            Some(item) => {
                if !item.answer_in_options() {
                    report.unmatched_answers += 1;
                }
                items.push(item);
            }
            None => report.dropped_items += 1,
        }
    }

    Ok(Validated {
        value: Quiz::new(items),
        report,
    })
}

// Answers are kept verbatim; the trimmed comparison happens when grading.
fn normalize_quiz_item(raw: RawQuizItem) -> Option<QuizItem> {
    let question = raw.question.as_ref().and_then(value_text)?;
    let answer = match raw.answer? {
        Value::String(s) if !s.trim().is_empty() => s,
        other => value_text(&other)?,
    };
    let options: Vec<String> = match raw.options? {
        Value::Array(values) => values.iter().filter_map(value_text).collect(),
        _ => return None,
    };
    if options.is_empty() {
        return None;
    }
    let explanation = raw.explanation.as_ref().and_then(value_text);
    Some(QuizItem {
        question,
        options,
        answer,
        explanation,
    })
}

pub fn validate_summary(raw: &str) -> PipelineResult<String> {
    let text = strip_code_fences(raw);
    if text.is_empty() {
        return Err(PipelineError::parse(Task::Summary, "summary is empty"));
    }
    Ok(text.to_string())
}
