//! The generic document tree.
//!
//! Every loaded document (the root one and every externally referenced one)
//! lives in a single [`Tree`] arena. Nodes refer to their children by
//! [`NodeId`], so the reference resolver can make two slots share one child,
//! or make a child point back at one of its ancestors, without copying.
//! Identity of a schema is the identity of its node.

mod deserialize;
mod view;

use std::collections::{HashMap, HashSet};
use std::fmt;

use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;

pub use deserialize::{Format, deserialize};
pub use view::NodeRef;

/// Handle of a node inside a [`Tree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct NodeId(u32);

impl NodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node#{}", self.0)
    }
}

/// A reference whose target could not be reached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dangling {
    /// The `$ref` string as written on this node.
    pub reference: String,
    /// The pointer that ultimately failed to resolve. For a chain of
    /// references this is the last link, not the first.
    pub target: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Null,
    Bool(bool),
    Number(serde_json::Number),
    String(String),
    Seq(Vec<NodeId>),
    Map(IndexMap<String, NodeId>),
    /// A `$ref` left behind by the resolver because its target is missing or
    /// the reference chain never reaches a concrete value.
    Unresolved(Dangling),
}

#[derive(Debug, Default)]
pub struct Tree {
    nodes: Vec<Node>,
    /// Overlay copy → the node it was copied from.
    overlays: HashMap<NodeId, NodeId>,
    /// Resolved reference node → its target.
    redirects: HashMap<NodeId, NodeId>,
    /// Map entries that held a `$ref` before resolution.
    reference_slots: HashSet<(NodeId, String)>,
}

impl Tree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn push(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.index()]
    }

    pub fn view(&self, id: NodeId) -> NodeRef<'_> {
        NodeRef::new(self, self.follow(id))
    }

    /// Insert a JSON value as a fresh subtree.
    pub fn insert_json(&mut self, value: &Value) -> NodeId {
        let node = match value {
            Value::Null => Node::Null,
            Value::Bool(b) => Node::Bool(*b),
            Value::Number(n) => Node::Number(n.clone()),
            Value::String(s) => Node::String(s.clone()),
            Value::Array(items) => {
                Node::Seq(items.iter().map(|item| self.insert_json(item)).collect())
            }
            Value::Object(map) => Node::Map(
                map.iter()
                    .map(|(k, v)| (k.clone(), self.insert_json(v)))
                    .collect(),
            ),
        };
        self.push(node)
    }

    /// The `$ref` string of a node that is still an unresolved reference map.
    pub fn ref_string(&self, id: NodeId) -> Option<&str> {
        match self.node(id) {
            Node::Map(map) => map.get("$ref").and_then(|r| match self.node(*r) {
                Node::String(s) => Some(s.as_str()),
                _ => None,
            }),
            _ => None,
        }
    }

    /// The node a resolved reference was replaced with, following chains.
    pub fn follow(&self, mut id: NodeId) -> NodeId {
        let mut hops = 0;
        while let Some(next) = self.redirects.get(&id) {
            if *next == id || hops > self.redirects.len() {
                break;
            }
            id = *next;
            hops += 1;
        }
        id
    }

    /// The canonical identity of a node: overlay copies report the node they
    /// were copied from.
    pub fn canonical(&self, id: NodeId) -> NodeId {
        let mut id = self.follow(id);
        let mut hops = 0;
        while let Some(origin) = self.overlays.get(&id) {
            if hops > self.overlays.len() {
                break;
            }
            id = self.follow(*origin);
            hops += 1;
        }
        id
    }

    pub fn is_overlay(&self, id: NodeId) -> bool {
        self.overlays.contains_key(&self.follow(id))
    }

    pub(crate) fn record_overlay(&mut self, copy: NodeId, origin: NodeId) {
        self.overlays.insert(copy, origin);
    }

    pub(crate) fn record_redirect(&mut self, reference: NodeId, target: NodeId) {
        if reference != target {
            self.redirects.insert(reference, target);
        }
    }

    pub(crate) fn record_reference_slot(&mut self, parent: NodeId, key: &str) {
        self.reference_slots.insert((parent, key.to_string()));
    }

    /// Whether `parent[key]` was written as a reference to another node.
    pub fn is_reference_slot(&self, parent: NodeId, key: &str) -> bool {
        self.reference_slots.contains(&(parent, key.to_string()))
    }

    /// Render a subtree back to JSON. Cycles are cut with `null`.
    pub fn to_json(&self, id: NodeId) -> Value {
        let mut stack = HashSet::new();
        self.to_json_inner(self.follow(id), &mut stack)
    }

    fn to_json_inner(&self, id: NodeId, stack: &mut HashSet<NodeId>) -> Value {
        if !stack.insert(id) {
            return Value::Null;
        }
        let value = match self.node(id) {
            Node::Null => Value::Null,
            Node::Bool(b) => Value::Bool(*b),
            Node::Number(n) => Value::Number(n.clone()),
            Node::String(s) => Value::String(s.clone()),
            Node::Seq(items) => Value::Array(
                items
                    .iter()
                    .map(|item| self.to_json_inner(self.follow(*item), stack))
                    .collect(),
            ),
            Node::Map(map) => Value::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), self.to_json_inner(self.follow(*v), stack)))
                    .collect(),
            ),
            Node::Unresolved(dangling) => {
                serde_json::json!({ "$ref": dangling.reference })
            }
        };
        stack.remove(&id);
        value
    }
}
