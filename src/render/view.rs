use crate::analysis::{analyze, GraphInsights};
use crate::domain::{ConceptCategory, ConceptGraph};
use anyhow::Result;
use serde::Serialize;

pub const CORE_COLOR: &str = "#FFD700";
pub const SUB_COLOR: &str = "#97C2FC";
pub const EDGE_COLOR: &str = "#555555";
const MIN_NODE_SIZE: f64 = 10.0;
const SIZE_RANGE: f64 = 30.0;

/// Node as consumed by vis-network.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViewNode {
    pub id: String,
    pub label: String,
    pub title: String,
    pub color: &'static str,
    pub size: f64,
    pub shape: &'static str,
}

/// Edges carry no visible label; the relation shows up as the hover `title`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViewEdge {
    pub from: String,
    pub to: String,
    pub title: String,
    pub color: &'static str,
    pub arrows: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphView {
    pub nodes: Vec<ViewNode>,
    pub edges: Vec<ViewEdge>,
    #[serde(skip)]
    pub insights: GraphInsights,
}

impl GraphView {
    pub fn build(graph: &ConceptGraph) -> Self {
        let insights = analyze(graph);
        let nodes = graph
            .nodes
            .iter()
            .map(|node| {
                let score = insights.score_of(&node.id);
                ViewNode {
                    id: node.id.clone(),
                    label: node.label.clone(),
                    title: format!("{} ({}, centrality {:.2})", node.label, node.category, score),
                    color: match node.category {
                        ConceptCategory::Core => CORE_COLOR,
                        ConceptCategory::Sub => SUB_COLOR,
                    },
                    size: MIN_NODE_SIZE + SIZE_RANGE * score.clamp(0.0, 1.0),
                    shape: "dot",
                }
            })
            .collect();
        let edges = graph
            .edges
            .iter()
            .map(|edge| ViewEdge {
                from: edge.source_id.clone(),
                to: edge.target_id.clone(),
                title: edge.relation_label.clone(),
                color: EDGE_COLOR,
                arrows: "to",
            })
            .collect();
        Self {
            nodes,
            edges,
            insights,
        }
    }

    /// Standalone page rendering the graph with vis-network, with a fullscreen toggle.
    pub fn to_html(&self, title: &str) -> Result<String> {
        let nodes = serde_json::to_string(&self.nodes)?;
        let edges = serde_json::to_string(&self.edges)?;
        Ok(HTML_TEMPLATE
            .replace("{{TITLE}}", &escape_html(title))
            .replace("{{NODES}}", &escape_script(&nodes))
            .replace("{{EDGES}}", &escape_script(&edges)))
    }
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

// JSON embedded in a <script> block must not close the tag early.
fn escape_script(json: &str) -> String {
    json.replace("</", "<\\/")
}

const HTML_TEMPLATE: &str = r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<title>{{TITLE}}</title>
<script src="https://unpkg.com/vis-network/standalone/umd/vis-network.min.js"></script>
<style>
  body { margin: 0; background-color: #1E1E1E; color: white; font-family: sans-serif; }
  #mynetwork { width: 100%; height: 600px; background-color: #1E1E1E; position: relative; }
  #fullscreen-btn { position: absolute; top: 10px; right: 10px; z-index: 1000;
    background-color: #262730; color: white; border: 1px solid #4B4B4B; padding: 8px 12px;
    cursor: pointer; border-radius: 4px; font-size: 14px; opacity: 0.8; }
  #fullscreen-btn:hover { opacity: 1.0; background-color: #333; }
</style>
</head>
<body>
<h2 style="margin: 12px">{{TITLE}}</h2>
<div id="mynetwork"></div>
<button id="fullscreen-btn" onclick="toggleFullScreen()">Fullscreen</button>
<script>
  var nodes = new vis.DataSet({{NODES}});
  var edges = new vis.DataSet({{EDGES}});
  var container = document.getElementById('mynetwork');
  var options = {
    nodes: { font: { color: 'white' } },
    physics: { solver: 'repulsion', repulsion: { nodeDistance: 150, springLength: 150 } }
  };
  var network = new vis.Network(container, { nodes: nodes, edges: edges }, options);
  function toggleFullScreen() {
    var el = document.getElementById('mynetwork');
    if (!document.fullscreenElement) { el.requestFullscreen(); } else { document.exitFullscreen(); }
  }
</script>
</body>
</html>
"#;
