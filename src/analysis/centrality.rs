use crate::domain::ConceptGraph;
use petgraph::algo::connected_components;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;
use serde::Serialize;
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeCentrality {
    pub id: String,
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphInsights {
    /// Degree centrality in node order.
    pub centrality: Vec<NodeCentrality>,
    /// Weakly-connected components; 1 for a connected non-empty graph.
    pub components: usize,
}

impl GraphInsights {
    pub fn score_of(&self, id: &str) -> f64 {
        self.centrality
            .iter()
            .find(|node| node.id == id)
            .map(|node| node.score)
            .unwrap_or(0.0)
    }

    pub fn is_connected(&self) -> bool {
        self.components <= 1
    }

    /// Ids sorted by descending score; ties keep node order.
    pub fn ranked(&self) -> Vec<&NodeCentrality> {
        let mut ranked: Vec<&NodeCentrality> = self.centrality.iter().collect();
        ranked.sort_by(|a, b| b.score.total_cmp(&a.score));
        ranked
    }
}

/// Degree centrality `(in + out) / (n - 1)` over the repaired graph.
///
/// Parallel edges each count, matching the graph as stored. Edges whose endpoints are
/// not nodes are ignored.
pub fn analyze(graph: &ConceptGraph) -> GraphInsights {
    let mut pg: DiGraph<&str, &str> = DiGraph::new();
    let mut index: HashMap<&str, NodeIndex> = HashMap::new();
    for node in &graph.nodes {
        index
            .entry(node.id.as_str())
            .or_insert_with(|| pg.add_node(node.id.as_str()));
    }
    for edge in &graph.edges {
        if let (Some(&a), Some(&b)) = (
            index.get(edge.source_id.as_str()),
            index.get(edge.target_id.as_str()),
        ) {
            pg.add_edge(a, b, edge.relation_label.as_str());
        }
    }

    let denominator = pg.node_count().saturating_sub(1);
    let centrality = pg
        .node_indices()
        .map(|idx| {
            let degree = pg.edges_directed(idx, Direction::Outgoing).count()
                + pg.edges_directed(idx, Direction::Incoming).count();
            let score = if denominator == 0 {
                0.0
            } else {
                degree as f64 / denominator as f64
            };
            NodeCentrality {
                id: pg[idx].to_string(),
                score,
            }
        })
        .collect();

    GraphInsights {
        centrality,
        components: connected_components(&pg),
    }
}
