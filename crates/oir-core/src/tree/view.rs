use indexmap::IndexMap;
use serde_json::Value;

use super::{Dangling, Node, NodeId, Tree};

/// A borrowed, copyable view of one node. Child accessors transparently
/// follow resolved references.
#[derive(Clone, Copy)]
pub struct NodeRef<'t> {
    tree: &'t Tree,
    id: NodeId,
}

impl std::fmt::Debug for NodeRef<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("NodeRef").field(&self.id).finish()
    }
}

impl<'t> NodeRef<'t> {
    pub(super) fn new(tree: &'t Tree, id: NodeId) -> Self {
        Self { tree, id }
    }

    pub fn id(self) -> NodeId {
        self.id
    }

    pub fn tree(self) -> &'t Tree {
        self.tree
    }

    pub fn canonical(self) -> NodeId {
        self.tree.canonical(self.id)
    }

    pub fn is_overlay(self) -> bool {
        self.tree.is_overlay(self.id)
    }

    /// A view of the node this overlay was copied from (or itself).
    pub fn origin(self) -> NodeRef<'t> {
        self.tree.view(self.canonical())
    }

    pub fn node(self) -> &'t Node {
        self.tree.node(self.id)
    }

    pub fn unresolved(self) -> Option<&'t Dangling> {
        match self.node() {
            Node::Unresolved(dangling) => Some(dangling),
            _ => None,
        }
    }

    pub fn as_map(self) -> Option<&'t IndexMap<String, NodeId>> {
        match self.node() {
            Node::Map(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_seq(self) -> Option<&'t [NodeId]> {
        match self.node() {
            Node::Seq(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_str(self) -> Option<&'t str> {
        match self.node() {
            Node::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(self) -> Option<bool> {
        match self.node() {
            Node::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn is_map(self) -> bool {
        self.as_map().is_some()
    }

    pub fn get(self, key: &str) -> Option<NodeRef<'t>> {
        self.as_map()
            .and_then(|map| map.get(key))
            .map(|id| self.tree.view(*id))
    }

    pub fn has(self, key: &str) -> bool {
        self.as_map().is_some_and(|map| map.contains_key(key))
    }

    /// Entries of a map node; empty for anything else.
    pub fn entries(self) -> impl Iterator<Item = (&'t str, NodeRef<'t>)> {
        let tree = self.tree;
        self.as_map()
            .into_iter()
            .flat_map(|map| map.iter())
            .map(move |(k, v)| (k.as_str(), tree.view(*v)))
    }

    /// Items of a sequence node; empty for anything else.
    pub fn items(self) -> impl Iterator<Item = NodeRef<'t>> {
        let tree = self.tree;
        self.as_seq()
            .into_iter()
            .flat_map(|items| items.iter())
            .map(move |id| tree.view(*id))
    }

    pub fn str_of(self, key: &str) -> Option<&'t str> {
        self.get(key).and_then(NodeRef::as_str)
    }

    pub fn string_of(self, key: &str) -> Option<String> {
        self.str_of(key).map(str::to_string)
    }

    /// A boolean flag, `false` when absent or not a boolean.
    pub fn flag(self, key: &str) -> bool {
        self.get(key).and_then(NodeRef::as_bool).unwrap_or(false)
    }

    /// Strings of a sequence-valued key, skipping non-string items.
    pub fn strings_of(self, key: &str) -> Vec<&'t str> {
        self.get(key)
            .map(|n| n.items().filter_map(NodeRef::as_str).collect())
            .unwrap_or_default()
    }

    /// Non-empty sequence under `key`.
    pub fn non_empty_seq(self, key: &str) -> Option<NodeRef<'t>> {
        self.get(key)
            .filter(|n| n.as_seq().is_some_and(|items| !items.is_empty()))
    }

    /// Vendor extensions (`x-*` keys) minus the ones listed in `skip`.
    pub fn extensions(self, skip: &[&str]) -> IndexMap<String, Value> {
        self.entries()
            .filter(|(k, _)| k.starts_with("x-") && !skip.contains(k))
            .map(|(k, v)| (k.to_string(), v.to_json()))
            .collect()
    }

    pub fn to_json(self) -> Value {
        self.tree.to_json(self.id)
    }
}
