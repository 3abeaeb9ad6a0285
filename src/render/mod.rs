mod pdf;
mod view;

pub use pdf::{latin1_safe, wrap, GuideLine, GuideSection, LineStyle, StudyGuide, SUBSTITUTE_GLYPH};
pub use view::{GraphView, ViewEdge, ViewNode, CORE_COLOR, EDGE_COLOR, SUB_COLOR};
