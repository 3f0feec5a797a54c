pub mod algorithms;
pub mod error;
pub mod invariants;
pub mod layout;
pub mod model;
pub mod models;
pub mod operations;

pub mod prelude {
    pub use crate::algorithms::{adjacency_map, node_depths};
    pub use crate::error::{ErrorKind, LibError, Result};
    pub use crate::invariants::{
        WorkflowInvariantViolation, ensure_workflow_invariants, workflow_invariant_violations,
    };
    pub use crate::layout::{IdentityLayout, LayeredLayout, LayoutEngine};
    pub use crate::model::{GraphModel, SubscriberId};
    pub use crate::models::{
        BranchHandle, Edge, EdgeId, EdgeStyle, Node, NodeId, NodeKind, PLACEHOLDER_LABEL,
        Position, seed_graph,
    };
}
