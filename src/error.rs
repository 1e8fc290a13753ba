use thiserror::Error;

#[derive(Debug, Error)]
pub enum TopologyError {
    #[error("invalid graph JSON")]
    GraphJson(#[source] serde_json::Error),
    #[error("invalid topology config JSON")]
    ConfigJson(#[source] serde_json::Error),
    #[error("invalid topology config: {0}")]
    InvalidConfig(String),
    #[error("invalid canvas size {width}x{height}")]
    InvalidCanvasSize { width: f32, height: f32 },
}

pub type Result<T, E = TopologyError> = std::result::Result<T, E>;
