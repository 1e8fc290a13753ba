use serde::Deserialize;
use serde_json::Value;

use super::graph::Graph;
use crate::error::{Result, TopologyError};

/// Decodes a graph either bare (`{"nodes": .., "edges": ..}`) or wrapped in
/// a `{"graph": {..}}` envelope as returned by the entity API.
pub fn parse_graph_json(raw: &str) -> Result<Graph> {
    let parsed: Value = serde_json::from_str(raw).map_err(TopologyError::GraphJson)?;

    let body = match parsed {
        Value::Object(mut object) if !object.contains_key("nodes") && object.contains_key("graph") => {
            object.remove("graph").unwrap_or(Value::Null)
        }
        other => other,
    };

    Graph::deserialize(body).map_err(TopologyError::GraphJson)
}
