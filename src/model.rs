use serde_json::Value;

use crate::layout::{LayeredLayout, LayoutEngine};
use crate::models::{Edge, Node, seed_graph};
use crate::operations;

pub type SubscriberId = u64;

type Observer = Box<dyn FnMut(&[Node], &[Edge])>;

/// Owner of the canonical `(nodes, edges)` pair for one editing session.
///
/// Every structural mutation runs to completion before control returns: read a
/// snapshot, compute the new sets, recompute layout through the injected
/// engine, publish to observers. Single logical writer, no intermediate state
/// is ever observable. Mutations referencing absent ids are silent no-ops so
/// stale UI references (double-clicks and the like) never crash a session.
pub struct GraphModel {
    nodes: Vec<Node>,
    edges: Vec<Edge>,
    layout: Box<dyn LayoutEngine>,
    observers: Vec<(SubscriberId, Observer)>,
    next_subscriber: SubscriberId,
}

impl GraphModel {
    /// Seeds the session graph (start node wired to one placeholder) and runs
    /// an initial layout pass.
    pub fn new(layout: Box<dyn LayoutEngine>) -> Self {
        let (nodes, edges) = seed_graph();
        let mut model = Self {
            nodes,
            edges,
            layout,
            observers: Vec::new(),
            next_subscriber: 0,
        };
        model.nodes = model.layout.compute_layout(&model.nodes, &model.edges);
        model
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// Registers an observer invoked after every published state change with
    /// the fully updated, layout-applied state.
    pub fn subscribe(&mut self, observer: impl FnMut(&[Node], &[Edge]) + 'static) -> SubscriberId {
        let id = self.next_subscriber;
        self.next_subscriber += 1;
        self.observers.push((id, Box::new(observer)));
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriberId) -> bool {
        let before = self.observers.len();
        self.observers.retain(|(observer_id, _)| *observer_id != id);
        self.observers.len() != before
    }

    /// Substitutes `new_node` for a placeholder slot. With no explicit target,
    /// the first slot with an incoming edge is consumed. Unresolvable targets
    /// leave the graph untouched and unpublished.
    pub fn insert_at_placeholder(&mut self, new_node: Node, target_placeholder_id: Option<&str>) {
        match operations::substitute_placeholder(
            &self.nodes,
            &self.edges,
            new_node,
            target_placeholder_id,
        ) {
            Some((nodes, edges)) => {
                self.nodes = nodes;
                self.edges = edges;
                self.publish();
            }
            None => {
                tracing::debug!(
                    target_placeholder_id,
                    "insertion target could not be resolved; graph unchanged"
                );
            }
        }
    }

    /// Removes the node and every edge touching it, then relays out.
    pub fn remove_node(&mut self, node_id: &str) {
        let (nodes, edges) = operations::remove_node(&self.nodes, &self.edges, node_id);
        self.nodes = nodes;
        self.edges = edges;
        self.publish();
    }

    /// Removes a single edge. Nodes stay, even when that strands the target;
    /// layout is recomputed either way.
    pub fn remove_edge(&mut self, edge_id: &str) {
        self.edges = operations::remove_edge(&self.edges, edge_id);
        self.publish();
    }

    /// Shallow-merges `patch` into the target node's data. No structural
    /// change and no layout recompute; observers still see the result.
    pub fn patch_node_data(&mut self, node_id: &str, patch: &Value) {
        match self.nodes.iter_mut().find(|node| node.id == node_id) {
            Some(node) => {
                if !operations::merge_node_data(&mut node.data, patch) {
                    tracing::debug!(node_id, "non-object patch ignored");
                }
            }
            None => tracing::debug!(node_id, "patch target not found; graph unchanged"),
        }
        self.notify();
    }

    /// Re-derives positions for the current graph; edges unchanged.
    pub fn recompute_layout(&mut self) {
        self.publish();
    }

    fn publish(&mut self) {
        self.nodes = self.layout.compute_layout(&self.nodes, &self.edges);
        tracing::trace!(
            nodes = self.nodes.len(),
            edges = self.edges.len(),
            "published graph state"
        );
        self.notify();
    }

    fn notify(&mut self) {
        let Self {
            nodes,
            edges,
            observers,
            ..
        } = self;
        for (_, observer) in observers.iter_mut() {
            observer(nodes, edges);
        }
    }
}

impl Default for GraphModel {
    fn default() -> Self {
        Self::new(Box::new(LayeredLayout::default()))
    }
}
