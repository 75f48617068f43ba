//! Model scene graph: node hierarchies with keyframed transforms, bounding
//! volumes and environment mapped rendering, shared with a render thread
//! through a re-entrant frame lock.

use thiserror::Error;

mod handle;
mod model;
mod node;
mod render;
mod transform;

#[cfg(test)]
mod test_utils;

pub use handle::*;
pub use model::*;
pub use node::*;
pub use render::*;
pub use transform::*;

#[derive(Debug, Error)]
pub enum SceneError {
    #[error("invalid node id {0}")]
    InvalidNode(NodeId),
    #[error("model has no state named \"{0}\"")]
    InvalidState(String),
    #[error("node {node} cannot become a child of its own descendant {parent}")]
    CyclicReparent { node: NodeId, parent: NodeId },
    #[error("model frame is already in use on this thread")]
    FrameBusy,
}

pub type Result<T> = std::result::Result<T, SceneError>;
