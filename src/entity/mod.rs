mod graph;
mod parse;

pub use graph::{Edge, EntityReference, EntityType, Graph, SanitizedGraph};
pub use parse::parse_graph_json;
