use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConceptCategory {
    Core,
    Sub,
}

impl ConceptCategory {
    /// Lenient mapping for whatever the model put in the `type` field.
    pub fn from_loose(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "core" | "main" | "primary" | "central" => ConceptCategory::Core,
            _ => ConceptCategory::Sub,
        }
    }

    pub fn is_core(self) -> bool {
        self == ConceptCategory::Core
    }
}

impl Default for ConceptCategory {
    fn default() -> Self {
        ConceptCategory::Sub
    }
}

impl fmt::Display for ConceptCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConceptCategory::Core => write!(f, "core"),
            ConceptCategory::Sub => write!(f, "sub"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConceptNode {
    pub id: String,
    pub label: String,
    #[serde(rename = "type", default)]
    pub category: ConceptCategory,
}

impl ConceptNode {
    pub fn new(
        id: impl Into<String>,
        label: impl Into<String>,
        category: ConceptCategory,
    ) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            category,
        }
    }

    pub fn core(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self::new(id, label, ConceptCategory::Core)
    }

    pub fn sub(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self::new(id, label, ConceptCategory::Sub)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConceptEdge {
    #[serde(rename = "source")]
    pub source_id: String,
    #[serde(rename = "target")]
    pub target_id: String,
    #[serde(rename = "label", default)]
    pub relation_label: String,
}

impl ConceptEdge {
    pub fn new(
        source_id: impl Into<String>,
        target_id: impl Into<String>,
        relation_label: impl Into<String>,
    ) -> Self {
        Self {
            source_id: source_id.into(),
            target_id: target_id.into(),
            relation_label: relation_label.into(),
        }
    }
}

/// Concept map as returned by the model, after repair.
///
/// Every edge endpoint is expected to name a node id; [`ConceptGraph::dangling_edges`]
/// reports the ones that don't.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConceptGraph {
    #[serde(default)]
    pub nodes: Vec<ConceptNode>,
    #[serde(default)]
    pub edges: Vec<ConceptEdge>,
}

impl ConceptGraph {
    pub fn new(nodes: Vec<ConceptNode>, edges: Vec<ConceptEdge>) -> Self {
        Self { nodes, edges }
    }

    pub fn node_ids(&self) -> HashSet<&str> {
        self.nodes.iter().map(|node| node.id.as_str()).collect()
    }

    pub fn get_node(&self, id: &str) -> Option<&ConceptNode> {
        self.nodes.iter().find(|node| node.id == id)
    }

    pub fn core_concepts(&self) -> impl Iterator<Item = &ConceptNode> {
        self.nodes.iter().filter(|node| node.category.is_core())
    }

    pub fn dangling_edges(&self) -> usize {
        let ids = self.node_ids();
        self.edges
            .iter()
            .filter(|edge| {
                !ids.contains(edge.source_id.as_str()) || !ids.contains(edge.target_id.as_str())
            })
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_from_loose_defaults_to_sub() {
        assert_eq!(ConceptCategory::from_loose("Core"), ConceptCategory::Core);
        assert_eq!(ConceptCategory::from_loose(" core "), ConceptCategory::Core);
        assert_eq!(ConceptCategory::from_loose("detail"), ConceptCategory::Sub);
        assert_eq!(ConceptCategory::from_loose(""), ConceptCategory::Sub);
    }

    #[test]
    fn serializes_with_wire_field_names() {
        let graph = ConceptGraph::new(
            vec![ConceptNode::core("A", "Alpha")],
            vec![ConceptEdge::new("A", "A", "self")],
        );
        let value = serde_json::to_value(&graph).unwrap();
        assert_eq!(value["nodes"][0]["type"], "core");
        assert_eq!(value["edges"][0]["source"], "A");
        assert_eq!(value["edges"][0]["target"], "A");
        assert_eq!(value["edges"][0]["label"], "self");
    }

    #[test]
    fn counts_dangling_edges() {
        let graph = ConceptGraph::new(
            vec![ConceptNode::core("A", "A"), ConceptNode::sub("B", "B")],
            vec![ConceptEdge::new("A", "B", "x"), ConceptEdge::new("A", "C", "y")],
        );
        assert_eq!(graph.dangling_edges(), 1);
        assert_eq!(graph.core_concepts().count(), 1);
    }
}
