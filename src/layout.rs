use std::collections::HashMap;

use crate::algorithms::node_depths;
use crate::models::{Edge, Node};

/// Strategy that derives 2-D positions from graph structure. Implementations
/// must be pure: same node identities and data out as in, only positions
/// differ, and the result is deterministic for a fixed graph shape so
/// repeated edits stay visually stable.
pub trait LayoutEngine {
    fn compute_layout(&self, nodes: &[Node], edges: &[Edge]) -> Vec<Node>;
}

/// Left-to-right layered placement: a node's column is its longest-path depth
/// from the root, its row is its order of appearance among nodes of the same
/// depth. Simple, deterministic, and good enough for tree-shaped workflows.
#[derive(Debug, Clone, Copy)]
pub struct LayeredLayout {
    pub column_width: f64,
    pub row_height: f64,
}

impl Default for LayeredLayout {
    fn default() -> Self {
        Self {
            column_width: 200.0,
            row_height: 100.0,
        }
    }
}

impl LayoutEngine for LayeredLayout {
    fn compute_layout(&self, nodes: &[Node], edges: &[Edge]) -> Vec<Node> {
        let depths = node_depths(nodes, edges);
        let mut rows: HashMap<usize, usize> = HashMap::new();
        let mut positioned = Vec::with_capacity(nodes.len());
        for node in nodes {
            let depth = depths.get(&node.id).copied().unwrap_or(0);
            let row = rows.entry(depth).or_insert(0);
            let mut node = node.clone();
            node.position.x = depth as f64 * self.column_width;
            node.position.y = *row as f64 * self.row_height;
            *row += 1;
            positioned.push(node);
        }
        positioned
    }
}

/// Pass-through engine that keeps whatever positions the nodes already carry.
/// Useful as a test double and for callers that lay out externally.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityLayout;

impl LayoutEngine for IdentityLayout {
    fn compute_layout(&self, nodes: &[Node], _edges: &[Edge]) -> Vec<Node> {
        nodes.to_vec()
    }
}
