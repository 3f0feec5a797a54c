use serde_json::Value;

use crate::models::{Edge, Node, NodeId, NodeKind};

// Cosmetic offsets a fresh slot inherits until the next layout pass overwrites
// them.
const SLOT_DX: f64 = 150.0;
const BRANCH_DY: f64 = 50.0;

/// Substitutes a concrete node for a placeholder slot: consumes the slot's
/// incoming edge, re-wires the predecessor to the new node (preserving the
/// incoming edge's handle), and regenerates fresh slots according to the new
/// node's kind. Fan-out kinds get a tagged slot per branch; everything else
/// gets a single untagged slot.
///
/// Everything is computed from the `(nodes, edges)` snapshot; the caller swaps
/// in the returned pair atomically. Returns `None` when the target cannot be
/// resolved (no eligible slot, unknown explicit id, missing incoming edge or
/// predecessor), which callers treat as a no-op.
pub fn substitute_placeholder(
    nodes: &[Node],
    edges: &[Edge],
    mut new_node: Node,
    target_id: Option<&str>,
) -> Option<(Vec<Node>, Vec<Edge>)> {
    let target_id: NodeId = match target_id {
        Some(id) => NodeId::from(id),
        // Implicit selection: first slot in sequence order that has an
        // incoming edge. Callers needing precision pass an explicit id.
        None => nodes
            .iter()
            .find(|node| {
                node.kind == NodeKind::Replace && edges.iter().any(|edge| edge.target == node.id)
            })?
            .id
            .clone(),
    };

    let target = nodes.iter().find(|node| node.id == target_id)?;
    let incoming = edges.iter().find(|edge| edge.target == target_id)?;
    let predecessor = nodes.iter().find(|node| node.id == incoming.source)?;

    // The slot's position carries over so the new node does not jump before
    // the layout pass lands.
    new_node.position = target.position;
    let inherited_handle = incoming.source_handle;

    let mut out_nodes: Vec<Node> = nodes
        .iter()
        .filter(|node| node.id != target_id)
        .cloned()
        .collect();
    let mut out_edges: Vec<Edge> = edges
        .iter()
        .filter(|edge| edge.target != target_id)
        .cloned()
        .collect();

    out_edges.push(Edge::new(&predecessor.id, &new_node.id).carrying(inherited_handle));

    match new_node.kind.fan_out_handles() {
        Some((primary, secondary)) => {
            let primary_slot = Node::placeholder(
                NodeId(format!("replace-{}-{}", new_node.id, primary)),
                new_node.position.offset(SLOT_DX, -BRANCH_DY),
            );
            let secondary_slot = Node::placeholder(
                NodeId(format!("replace-{}-{}", new_node.id, secondary)),
                new_node.position.offset(SLOT_DX, BRANCH_DY),
            );
            out_edges.push(Edge::tagged(&new_node.id, &primary_slot.id, primary));
            out_edges.push(Edge::tagged(&new_node.id, &secondary_slot.id, secondary));
            out_nodes.push(new_node);
            out_nodes.push(primary_slot);
            out_nodes.push(secondary_slot);
        }
        None => {
            let slot = Node::placeholder(
                NodeId(format!("replace-{}", new_node.id)),
                new_node.position.offset(SLOT_DX, 0.0),
            );
            out_edges.push(Edge::new(&new_node.id, &slot.id));
            out_nodes.push(new_node);
            out_nodes.push(slot);
        }
    }

    Some((out_nodes, out_edges))
}

/// Drops the node and every edge touching it, so no dangling endpoint
/// survives. Unknown ids filter to the same sets.
pub fn remove_node(nodes: &[Node], edges: &[Edge], node_id: &str) -> (Vec<Node>, Vec<Edge>) {
    let out_nodes = nodes
        .iter()
        .filter(|node| node.id != node_id)
        .cloned()
        .collect();
    let out_edges = edges
        .iter()
        .filter(|edge| edge.source != node_id && edge.target != node_id)
        .cloned()
        .collect();
    (out_nodes, out_edges)
}

/// Drops a single edge by id, leaving both endpoint nodes in place even when
/// that strands the target.
pub fn remove_edge(edges: &[Edge], edge_id: &str) -> Vec<Edge> {
    edges
        .iter()
        .filter(|edge| edge.id != edge_id)
        .cloned()
        .collect()
}

/// Shallow merge of a JSON object patch into a node's data: patch keys
/// overwrite, other keys stay. Returns false (and leaves `data` untouched)
/// when either side is not an object.
pub fn merge_node_data(data: &mut Value, patch: &Value) -> bool {
    let Some(patch_object) = patch.as_object() else {
        return false;
    };
    let Some(object) = data.as_object_mut() else {
        return false;
    };
    for (key, value) in patch_object {
        object.insert(key.clone(), value.clone());
    }
    true
}
