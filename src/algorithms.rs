use std::collections::{HashMap, VecDeque};

use crate::models::{Edge, Node, NodeId};

pub fn adjacency_map(nodes: &[Node], edges: &[Edge]) -> HashMap<NodeId, Vec<NodeId>> {
    let mut adjacency: HashMap<NodeId, Vec<NodeId>> = HashMap::with_capacity(nodes.len());
    for node in nodes {
        adjacency.entry(node.id.clone()).or_default();
    }
    for edge in edges {
        if !adjacency.contains_key(&edge.source) || !adjacency.contains_key(&edge.target) {
            // Best-effort behavior: skip dangling edges instead of failing the whole computation.
            continue;
        }
        adjacency
            .get_mut(&edge.source)
            .expect("source should exist in adjacency map")
            .push(edge.target.clone());
    }
    adjacency
}

/// Longest-path depth of every node from the graph's roots (in-degree zero),
/// computed with a Kahn-style traversal. Nodes caught in a cycle never drain
/// and are simply absent from the result; callers default their depth.
pub fn node_depths(nodes: &[Node], edges: &[Edge]) -> HashMap<NodeId, usize> {
    let adjacency = adjacency_map(nodes, edges);
    let mut indegree: HashMap<NodeId, usize> = HashMap::with_capacity(nodes.len());
    for node in nodes {
        indegree.insert(node.id.clone(), 0);
    }
    for edge in edges {
        if !indegree.contains_key(&edge.source) {
            continue;
        }
        if let Some(degree) = indegree.get_mut(&edge.target) {
            *degree += 1;
        }
    }

    let mut depths: HashMap<NodeId, usize> = HashMap::with_capacity(nodes.len());
    let mut queue = VecDeque::new();
    // Seed from the node sequence rather than the indegree map so traversal
    // order is deterministic.
    for node in nodes {
        if indegree.get(&node.id) == Some(&0) {
            depths.insert(node.id.clone(), 0);
            queue.push_back(node.id.clone());
        }
    }

    while let Some(node_id) = queue.pop_front() {
        let depth = depths[&node_id];
        if let Some(children) = adjacency.get(&node_id) {
            for child in children {
                let entry = depths.entry(child.clone()).or_insert(0);
                if *entry < depth + 1 {
                    *entry = depth + 1;
                }
                if let Some(child_degree) = indegree.get_mut(child) {
                    *child_degree -= 1;
                    if *child_degree == 0 {
                        queue.push_back(child.clone());
                    }
                }
            }
        }
    }

    depths
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NodeKind, seed_graph};

    fn node(id: &str) -> Node {
        Node::new(id, NodeKind::Action, id).expect("valid node")
    }

    fn edge(from: &Node, to: &Node) -> Edge {
        Edge::new(&from.id, &to.id)
    }

    #[test]
    fn adjacency_skips_dangling_edges() {
        let a = node("a");
        let b = node("b");
        let mut dangling = edge(&a, &b);
        dangling.target = NodeId::from("missing");
        let adjacency = adjacency_map(&[a.clone(), b.clone()], &[edge(&a, &b), dangling]);
        assert_eq!(adjacency[&a.id], vec![b.id.clone()]);
    }

    #[test]
    fn depths_follow_longest_path() {
        let a = node("a");
        let b = node("b");
        let c = node("c");
        // a -> b -> c and a -> c: c sits at depth 2, not 1.
        let edges = vec![edge(&a, &b), edge(&b, &c), edge(&a, &c)];
        let depths = node_depths(&[a.clone(), b.clone(), c.clone()], &edges);
        assert_eq!(depths[&a.id], 0);
        assert_eq!(depths[&b.id], 1);
        assert_eq!(depths[&c.id], 2);
    }

    #[test]
    fn seed_graph_depths() {
        let (nodes, edges) = seed_graph();
        let depths = node_depths(&nodes, &edges);
        assert_eq!(depths[&nodes[0].id], 0);
        assert_eq!(depths[&nodes[1].id], 1);
    }

    #[test]
    fn nodes_without_incoming_edges_are_roots() {
        let a = node("a");
        let b = node("b");
        let depths = node_depths(&[a.clone(), b.clone()], &[]);
        assert_eq!(depths[&a.id], 0);
        assert_eq!(depths[&b.id], 0);
    }
}
