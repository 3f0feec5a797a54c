use std::fmt;

use anyhow::anyhow;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use uuid::Uuid;

use crate::error::{LibError, Result};

/// Label carried by every unfilled placeholder slot. Fixed, not user-configurable.
pub const PLACEHOLDER_LABEL: &str = "Replace Me";

pub const START_NODE_ID: &str = "start";
pub const SEED_PLACEHOLDER_ID: &str = "replace-start";
pub const SEED_EDGE_ID: &str = "start-to-replace";

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub String);

impl NodeId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for NodeId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for NodeId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl PartialEq<str> for NodeId {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for NodeId {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EdgeId(pub String);

impl EdgeId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for EdgeId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for EdgeId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl PartialEq<str> for EdgeId {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for EdgeId {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

/// Closed set of node kinds. Concrete action kinds beyond `Action` carry their
/// specifics in `Node::data` and are structurally indistinguishable from
/// `Action`; only `Conditional` and `Loop` fan out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Start,
    Replace,
    Action,
    Conditional,
    Loop,
}

impl NodeKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            NodeKind::Start => "start",
            NodeKind::Replace => "replace",
            NodeKind::Action => "action",
            NodeKind::Conditional => "conditional",
            NodeKind::Loop => "loop",
        }
    }

    /// Branch handle pair for fan-out kinds, ordered (primary, secondary).
    pub const fn fan_out_handles(self) -> Option<(BranchHandle, BranchHandle)> {
        match self {
            NodeKind::Conditional => Some((BranchHandle::True, BranchHandle::False)),
            NodeKind::Loop => Some((BranchHandle::Done, BranchHandle::Loop)),
            _ => None,
        }
    }

    pub const fn is_fan_out(self) -> bool {
        self.fan_out_handles().is_some()
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tag on an edge identifying which labeled outgoing port of a fan-out node it
/// leaves from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BranchHandle {
    True,
    False,
    Done,
    Loop,
}

impl BranchHandle {
    pub const fn as_str(self) -> &'static str {
        match self {
            BranchHandle::True => "true",
            BranchHandle::False => "false",
            BranchHandle::Done => "done",
            BranchHandle::Loop => "loop",
        }
    }
}

impl fmt::Display for BranchHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rendering hint only; carries no structural meaning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum EdgeStyle {
    #[default]
    Smoothstep,
    Step,
    Straight,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub const fn offset(self, dx: f64, dy: f64) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }
}

/// A node in the workflow graph. `position` is derived data: the layout engine
/// overwrites it after every structural edit, so it is never a source of truth
/// between edits. `data` is always a JSON object, enforced at construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    pub id: NodeId,
    pub kind: NodeKind,
    pub position: Position,
    pub data: Value,
}

impl Node {
    pub fn new(id: impl Into<NodeId>, kind: NodeKind, label: &str) -> Result<Self> {
        Self::with_data(id, kind, json!({ "label": label }))
    }

    pub fn with_data(id: impl Into<NodeId>, kind: NodeKind, data: Value) -> Result<Self> {
        let id = id.into();
        if id.as_str().trim().is_empty() {
            return Err(LibError::invalid(
                "Node ID is required",
                anyhow!("{} node had empty id", kind),
            ));
        }
        if !data.is_object() {
            return Err(LibError::invalid(
                "Node data must be a JSON object",
                anyhow!("node {} had non-object data: {}", id, data),
            ));
        }
        Ok(Self {
            id,
            kind,
            position: Position::default(),
            data,
        })
    }

    /// Mints a fresh `{kind}-{uuid}` id, for callers that do not manage their
    /// own id space.
    pub fn generated(kind: NodeKind, label: &str) -> Self {
        Self {
            id: NodeId(format!("{}-{}", kind, Uuid::new_v4())),
            kind,
            position: Position::default(),
            data: json!({ "label": label }),
        }
    }

    pub(crate) fn placeholder(id: NodeId, position: Position) -> Self {
        Self {
            id,
            kind: NodeKind::Replace,
            position,
            data: json!({ "label": PLACEHOLDER_LABEL }),
        }
    }

    pub fn label(&self) -> Option<&str> {
        self.data.get("label").and_then(Value::as_str)
    }
}

/// A directed edge. Both endpoints must reference nodes present in the same
/// graph; the mutation engine maintains that invariant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Edge {
    pub id: EdgeId,
    pub source: NodeId,
    pub target: NodeId,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub source_handle: Option<BranchHandle>,
    #[serde(default)]
    pub style: EdgeStyle,
}

impl Edge {
    pub fn new(source: &NodeId, target: &NodeId) -> Self {
        Self {
            id: EdgeId(format!("{source}-to-{target}")),
            source: source.clone(),
            target: target.clone(),
            source_handle: None,
            style: EdgeStyle::default(),
        }
    }

    pub fn tagged(source: &NodeId, target: &NodeId, handle: BranchHandle) -> Self {
        Self::new(source, target).carrying(Some(handle))
    }

    /// Stamps the edge with an inherited handle, preserving which port of the
    /// source it leaves from.
    pub fn carrying(mut self, handle: Option<BranchHandle>) -> Self {
        self.source_handle = handle;
        self
    }
}

/// Initial graph every editing session starts from: a start node wired to a
/// single placeholder slot.
pub fn seed_graph() -> (Vec<Node>, Vec<Edge>) {
    let start = Node {
        id: NodeId::from(START_NODE_ID),
        kind: NodeKind::Start,
        position: Position::default(),
        data: json!({ "label": "Start" }),
    };
    let slot = Node::placeholder(NodeId::from(SEED_PLACEHOLDER_ID), Position::new(150.0, 0.0));
    let edge = Edge {
        id: EdgeId::from(SEED_EDGE_ID),
        source: start.id.clone(),
        target: slot.id.clone(),
        source_handle: None,
        style: EdgeStyle::default(),
    };
    (vec![start, slot], vec![edge])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_construction_rejects_blank_id() {
        let err = Node::new("   ", NodeKind::Action, "Send email").expect_err("blank id");
        assert_eq!(err.public, "Node ID is required");
    }

    #[test]
    fn node_construction_rejects_non_object_data() {
        let err =
            Node::with_data("a1", NodeKind::Action, json!("label")).expect_err("non-object data");
        assert_eq!(err.public, "Node data must be a JSON object");
    }

    #[test]
    fn generated_node_ids_are_unique_and_kind_prefixed() {
        let a = Node::generated(NodeKind::Action, "A");
        let b = Node::generated(NodeKind::Action, "B");
        assert_ne!(a.id, b.id);
        assert!(a.id.as_str().starts_with("action-"));
    }

    #[test]
    fn fan_out_handles_cover_exactly_conditional_and_loop() {
        assert_eq!(
            NodeKind::Conditional.fan_out_handles(),
            Some((BranchHandle::True, BranchHandle::False))
        );
        assert_eq!(
            NodeKind::Loop.fan_out_handles(),
            Some((BranchHandle::Done, BranchHandle::Loop))
        );
        for kind in [NodeKind::Start, NodeKind::Replace, NodeKind::Action] {
            assert_eq!(kind.fan_out_handles(), None);
        }
    }

    #[test]
    fn seed_graph_wires_start_to_one_placeholder() {
        let (nodes, edges) = seed_graph();
        assert_eq!(nodes.len(), 2);
        assert_eq!(edges.len(), 1);
        assert_eq!(nodes[0].kind, NodeKind::Start);
        assert_eq!(nodes[1].kind, NodeKind::Replace);
        assert_eq!(nodes[1].label(), Some(PLACEHOLDER_LABEL));
        assert_eq!(edges[0].source, nodes[0].id);
        assert_eq!(edges[0].target, nodes[1].id);
        assert_eq!(edges[0].source_handle, None);
    }

    #[test]
    fn edge_serializes_with_camel_case_handle() {
        let edge = Edge::tagged(
            &NodeId::from("cond"),
            &NodeId::from("slot"),
            BranchHandle::True,
        );
        let value = serde_json::to_value(&edge).expect("serialize edge");
        assert_eq!(value["sourceHandle"], json!("true"));
        assert_eq!(value["style"], json!("smoothstep"));
        assert_eq!(value["id"], json!("cond-to-slot"));
    }

    #[test]
    fn untagged_edge_omits_handle_field() {
        let edge = Edge::new(&NodeId::from("a"), &NodeId::from("b"));
        let value = serde_json::to_value(&edge).expect("serialize edge");
        assert!(value.get("sourceHandle").is_none());
    }
}
