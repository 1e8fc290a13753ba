pub mod config;
pub mod entity;
pub mod error;
pub mod topology;
pub mod util;

pub use config::{CanvasSize, TopologyConfig};
pub use entity::{Edge, EntityReference, EntityType, Graph, parse_graph_json};
pub use error::{Result, TopologyError};
pub use topology::{RenderMode, Topology, TopologyView};
