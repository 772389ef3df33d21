use thiserror::Error;

use crate::types::{EntityId, NodeId, WayId};

#[derive(Error, Debug)]
pub enum EditError {
    #[error("entity {0} is not in the graph")]
    MissingEntity(EntityId),
    #[error("way {0} has fewer than two distinct nodes")]
    DegenerateWay(WayId),
    #[error("splitting at {0} did not produce the expected way")]
    AmbiguousSplit(NodeId),
    #[error("zero-length geometry near {0}")]
    DegenerateGeometry(NodeId),
    #[error("no way has {0} next to {1}")]
    EdgeNotFound(NodeId, NodeId),
    #[error("nothing to merge")]
    EmptyMerge,
}

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("malformed element: {0}")]
    Malformed(String),
    #[error("unknown element type '{0}'")]
    UnknownType(String),
}

pub type EditResult<T> = std::result::Result<T, EditError>;
