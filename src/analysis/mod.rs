mod centrality;

pub use centrality::{analyze, GraphInsights, NodeCentrality};
