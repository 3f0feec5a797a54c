use std::collections::{HashMap, HashSet};

use anyhow::anyhow;
use serde::Serialize;

use crate::error::{LibError, Result};
use crate::models::{BranchHandle, Edge, EdgeId, Node, NodeId, NodeKind};

/// Structural defects a workflow graph can exhibit. The mutation engine never
/// gates on these (stale-reference mutations must stay silent no-ops); they
/// back the property tests and let callers audit a graph on demand.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WorkflowInvariantViolation {
    UnknownNodeReference {
        edge_id: EdgeId,
        missing_node_id: NodeId,
    },
    PlaceholderHasOutgoing {
        node_id: NodeId,
        out_degree: usize,
    },
    MissingBranch {
        node_id: NodeId,
        handle: BranchHandle,
    },
    DuplicateBranch {
        node_id: NodeId,
        handle: BranchHandle,
    },
    UntaggedFanOutEdge {
        node_id: NodeId,
        edge_id: EdgeId,
    },
    InDegreeExceeded {
        node_id: NodeId,
        in_degree: usize,
    },
    InvalidStartCount {
        start_count: usize,
    },
    /// Non-start node with no incoming edge. An accepted state after edge or
    /// fan-out removal (the editor leaves stranded slots for manual cleanup),
    /// so this is reported as a warning rather than a hard violation.
    StrandedNode {
        node_id: NodeId,
    },
}

impl WorkflowInvariantViolation {
    pub const fn error_code(&self) -> &'static str {
        match self {
            WorkflowInvariantViolation::UnknownNodeReference { .. } => {
                "workflow_unknown_node_reference"
            }
            WorkflowInvariantViolation::PlaceholderHasOutgoing { .. } => {
                "workflow_placeholder_outgoing"
            }
            WorkflowInvariantViolation::MissingBranch { .. } => "workflow_missing_branch",
            WorkflowInvariantViolation::DuplicateBranch { .. } => "workflow_duplicate_branch",
            WorkflowInvariantViolation::UntaggedFanOutEdge { .. } => "workflow_untagged_fan_out",
            WorkflowInvariantViolation::InDegreeExceeded { .. } => "workflow_indegree_exceeded",
            WorkflowInvariantViolation::InvalidStartCount { .. } => "workflow_start_count",
            WorkflowInvariantViolation::StrandedNode { .. } => "workflow_stranded_node",
        }
    }

    pub const fn public_message(&self) -> &'static str {
        match self {
            WorkflowInvariantViolation::UnknownNodeReference { .. } => {
                "Edge references a node that does not exist"
            }
            WorkflowInvariantViolation::PlaceholderHasOutgoing { .. } => {
                "Placeholder slots cannot have outgoing edges"
            }
            WorkflowInvariantViolation::MissingBranch { .. } => {
                "Fan-out node is missing a labeled branch"
            }
            WorkflowInvariantViolation::DuplicateBranch { .. } => {
                "Fan-out node has more than one edge for the same branch"
            }
            WorkflowInvariantViolation::UntaggedFanOutEdge { .. } => {
                "Fan-out node has an outgoing edge without a branch handle"
            }
            WorkflowInvariantViolation::InDegreeExceeded { .. } => {
                "Nodes cannot have more than one incoming edge"
            }
            WorkflowInvariantViolation::InvalidStartCount { .. } => {
                "Workflow must have exactly one start node"
            }
            WorkflowInvariantViolation::StrandedNode { .. } => {
                "Node is unreachable: no incoming edge remains"
            }
        }
    }

    /// Warnings describe accepted-but-degraded states; everything else is a
    /// hard structural defect.
    pub const fn is_warning(&self) -> bool {
        matches!(self, WorkflowInvariantViolation::StrandedNode { .. })
    }
}

pub fn workflow_invariant_violations(
    nodes: &[Node],
    edges: &[Edge],
) -> Vec<WorkflowInvariantViolation> {
    let node_ids: HashSet<&NodeId> = nodes.iter().map(|node| &node.id).collect();
    let mut indegree: HashMap<&NodeId, usize> = HashMap::with_capacity(nodes.len());
    let mut outgoing: HashMap<&NodeId, Vec<&Edge>> = HashMap::with_capacity(nodes.len());
    for node in nodes {
        indegree.insert(&node.id, 0);
        outgoing.insert(&node.id, Vec::new());
    }

    let mut violations = Vec::new();
    for edge in edges {
        let mut dangling = false;
        for endpoint in [&edge.source, &edge.target] {
            if !node_ids.contains(endpoint) {
                violations.push(WorkflowInvariantViolation::UnknownNodeReference {
                    edge_id: edge.id.clone(),
                    missing_node_id: endpoint.clone(),
                });
                dangling = true;
            }
        }
        if dangling {
            continue;
        }
        *indegree
            .get_mut(&edge.target)
            .expect("target should exist in indegree map") += 1;
        outgoing
            .get_mut(&edge.source)
            .expect("source should exist in outgoing map")
            .push(edge);
    }

    let start_count = nodes
        .iter()
        .filter(|node| node.kind == NodeKind::Start)
        .count();
    if start_count != 1 {
        violations.push(WorkflowInvariantViolation::InvalidStartCount { start_count });
    }

    for node in nodes {
        let out_edges = &outgoing[&node.id];
        let in_degree = indegree[&node.id];

        if node.kind != NodeKind::Start {
            if in_degree > 1 {
                violations.push(WorkflowInvariantViolation::InDegreeExceeded {
                    node_id: node.id.clone(),
                    in_degree,
                });
            } else if in_degree == 0 {
                violations.push(WorkflowInvariantViolation::StrandedNode {
                    node_id: node.id.clone(),
                });
            }
        }

        match node.kind.fan_out_handles() {
            Some((primary, secondary)) => {
                for handle in [primary, secondary] {
                    let matching = out_edges
                        .iter()
                        .filter(|edge| edge.source_handle == Some(handle))
                        .count();
                    if matching == 0 {
                        violations.push(WorkflowInvariantViolation::MissingBranch {
                            node_id: node.id.clone(),
                            handle,
                        });
                    } else if matching > 1 {
                        violations.push(WorkflowInvariantViolation::DuplicateBranch {
                            node_id: node.id.clone(),
                            handle,
                        });
                    }
                }
                for edge in out_edges {
                    if edge.source_handle.is_none() {
                        violations.push(WorkflowInvariantViolation::UntaggedFanOutEdge {
                            node_id: node.id.clone(),
                            edge_id: edge.id.clone(),
                        });
                    }
                }
            }
            None => {
                if node.kind == NodeKind::Replace && !out_edges.is_empty() {
                    violations.push(WorkflowInvariantViolation::PlaceholderHasOutgoing {
                        node_id: node.id.clone(),
                        out_degree: out_edges.len(),
                    });
                }
            }
        }
    }

    violations
}

/// Fails on the first hard violation; warnings (stranded nodes) pass.
pub fn ensure_workflow_invariants(nodes: &[Node], edges: &[Edge]) -> Result<()> {
    let violations = workflow_invariant_violations(nodes, edges);
    if let Some(first) = violations.iter().find(|v| !v.is_warning()) {
        return Err(LibError::invalid_with_code(
            first.error_code(),
            first.public_message(),
            anyhow!("workflow invariant validation failed: {:?}", violations),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::seed_graph;
    use crate::operations::substitute_placeholder;

    fn grown_graph() -> (Vec<Node>, Vec<Edge>) {
        let (nodes, edges) = seed_graph();
        let action = Node::new("a1", NodeKind::Action, "Do work").expect("valid node");
        let (nodes, edges) =
            substitute_placeholder(&nodes, &edges, action, None).expect("insert action");
        let cond = Node::new("c1", NodeKind::Conditional, "Check").expect("valid node");
        substitute_placeholder(&nodes, &edges, cond, None).expect("insert conditional")
    }

    #[test]
    fn seed_graph_is_clean() {
        let (nodes, edges) = seed_graph();
        assert!(workflow_invariant_violations(&nodes, &edges).is_empty());
        ensure_workflow_invariants(&nodes, &edges).expect("seed graph is valid");
    }

    #[test]
    fn grown_graph_stays_clean_after_every_insertion() {
        let (nodes, edges) = grown_graph();
        assert!(workflow_invariant_violations(&nodes, &edges).is_empty());
    }

    #[test]
    fn dangling_edge_is_reported() {
        let (nodes, mut edges) = seed_graph();
        edges[0].target = NodeId::from("missing");
        let violations = workflow_invariant_violations(&nodes, &edges);
        assert!(violations.iter().any(|v| matches!(
            v,
            WorkflowInvariantViolation::UnknownNodeReference { missing_node_id, .. }
                if *missing_node_id == "missing"
        )));
    }

    #[test]
    fn placeholder_with_outgoing_edge_is_reported() {
        let (nodes, mut edges) = seed_graph();
        edges.push(Edge::new(&nodes[1].id, &nodes[0].id));
        let violations = workflow_invariant_violations(&nodes, &edges);
        assert!(violations.iter().any(|v| matches!(
            v,
            WorkflowInvariantViolation::PlaceholderHasOutgoing { node_id, out_degree: 1 }
                if *node_id == "replace-start"
        )));
    }

    #[test]
    fn missing_branch_is_reported() {
        let (nodes, mut edges) = grown_graph();
        edges.retain(|edge| edge.source_handle != Some(BranchHandle::False));
        let violations = workflow_invariant_violations(&nodes, &edges);
        assert!(violations.iter().any(|v| matches!(
            v,
            WorkflowInvariantViolation::MissingBranch { node_id, handle: BranchHandle::False }
                if *node_id == "c1"
        )));
        // The orphaned false slot also surfaces, but only as a warning.
        assert!(violations.iter().any(|v| v.is_warning()));
        assert!(ensure_workflow_invariants(&nodes, &edges).is_err());
    }

    #[test]
    fn duplicate_branch_is_reported() {
        let (mut nodes, mut edges) = grown_graph();
        let extra_slot = Node::new("extra", NodeKind::Replace, "Replace Me").expect("valid node");
        edges.push(Edge::tagged(
            &NodeId::from("c1"),
            &extra_slot.id,
            BranchHandle::True,
        ));
        nodes.push(extra_slot);
        let violations = workflow_invariant_violations(&nodes, &edges);
        assert!(violations.iter().any(|v| matches!(
            v,
            WorkflowInvariantViolation::DuplicateBranch { handle: BranchHandle::True, .. }
        )));
    }

    #[test]
    fn untagged_fan_out_edge_is_reported() {
        let (nodes, mut edges) = grown_graph();
        for edge in &mut edges {
            if edge.source == "c1" {
                edge.source_handle = None;
            }
        }
        let violations = workflow_invariant_violations(&nodes, &edges);
        assert!(violations.iter().any(|v| matches!(
            v,
            WorkflowInvariantViolation::UntaggedFanOutEdge { node_id, .. } if *node_id == "c1"
        )));
    }

    #[test]
    fn second_incoming_edge_is_reported() {
        let (nodes, mut edges) = grown_graph();
        edges.push(Edge::new(&NodeId::from("start"), &NodeId::from("c1")));
        let violations = workflow_invariant_violations(&nodes, &edges);
        assert!(violations.iter().any(|v| matches!(
            v,
            WorkflowInvariantViolation::InDegreeExceeded { node_id, in_degree: 2 }
                if *node_id == "c1"
        )));
    }

    #[test]
    fn missing_start_is_reported() {
        let (mut nodes, mut edges) = seed_graph();
        nodes.retain(|node| node.kind != NodeKind::Start);
        edges.clear();
        let violations = workflow_invariant_violations(&nodes, &edges);
        assert!(violations.contains(&WorkflowInvariantViolation::InvalidStartCount {
            start_count: 0
        }));
    }

    #[test]
    fn stranded_slots_after_fan_out_removal_are_warnings_only() {
        // Scenario C's aftermath: both branch slots lose their incoming edge
        // but remain in the graph.
        let (nodes, edges) = grown_graph();
        let (nodes, edges) = crate::operations::remove_node(&nodes, &edges, "c1");
        let violations = workflow_invariant_violations(&nodes, &edges);
        assert_eq!(violations.len(), 2);
        assert!(violations.iter().all(|v| v.is_warning()));
        ensure_workflow_invariants(&nodes, &edges).expect("warnings do not fail the check");
    }
}
