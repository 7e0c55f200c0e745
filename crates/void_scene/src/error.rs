//! Error types for scene graph edits

use thiserror::Error;

use crate::node::NodeHandle;
use crate::overlay2d::ContainerHandle;

/// Scene graph errors
#[derive(Debug, Error)]
pub enum SceneError {
    /// Node handle is stale or was never issued by this scene
    #[error("Node not found: {0:?}")]
    NodeNotFound(NodeHandle),

    /// 2D container handle is stale
    #[error("2D container not found: {0:?}")]
    ContainerNotFound(ContainerHandle),

    /// Parenting would make a node its own ancestor
    #[error("Cycle detected in hierarchy: {child:?} under {parent:?}")]
    CycleDetected {
        child: NodeHandle,
        parent: NodeHandle,
    },

    /// Parenting would make a 2D container its own ancestor
    #[error("Cycle detected in 2D hierarchy: {child:?} under {parent:?}")]
    ContainerCycle {
        child: ContainerHandle,
        parent: ContainerHandle,
    },
}

/// Result type for scene operations
pub type Result<T> = std::result::Result<T, SceneError>;
