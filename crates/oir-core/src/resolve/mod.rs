//! `$ref` resolution over the document [`Tree`].
//!
//! References are rewritten in place: the slot holding a reference map is
//! pointed at the target node, so every user of a schema shares the same
//! node and cycles in the document become cycles in the tree. A reference
//! carrying sibling keys gets a shallow copy of its target with the siblings
//! merged on top; the copy remembers the node it came from
//! ([`Tree::canonical`]). References that cannot be reached are reported and
//! turned into [`Node::Unresolved`].

mod location;
mod reference;

use std::collections::HashMap;

use log::debug;

pub use location::normalize_path;
pub use reference::Reference;

use crate::diagnostics::Diagnostics;
use crate::error::{ParseError, ResolveError};
use crate::load::ResourceLoader;
use crate::tree::{self, Dangling, Format, Node, NodeId, Tree};

#[derive(Debug, Clone)]
enum Slot {
    Key(NodeId, String),
    Index(NodeId, usize),
    Root,
}

#[derive(Debug)]
struct RefSite {
    slot: Slot,
    node: NodeId,
    path: Vec<String>,
}

#[derive(Debug, Clone)]
enum Outcome {
    Target(NodeId),
    Dangling { target: String, error: ResolveError },
}

pub struct RefResolver<'a> {
    tree: &'a mut Tree,
    loader: &'a dyn ResourceLoader,
    diagnostics: &'a mut Diagnostics,
    root_location: Option<String>,
    /// Location → root node of every document seen so far.
    documents: HashMap<String, NodeId>,
    /// Reference node → location of the document it was written in.
    owners: HashMap<NodeId, String>,
    outcomes: HashMap<NodeId, Outcome>,
    in_progress: Vec<NodeId>,
}

impl<'a> RefResolver<'a> {
    pub fn new(
        tree: &'a mut Tree,
        loader: &'a dyn ResourceLoader,
        diagnostics: &'a mut Diagnostics,
    ) -> Self {
        Self {
            tree,
            loader,
            diagnostics,
            root_location: None,
            documents: HashMap::new(),
            owners: HashMap::new(),
            outcomes: HashMap::new(),
            in_progress: Vec::new(),
        }
    }

    /// Load the document at `location` and resolve it along with everything
    /// it references. Returns the document root. Loads are memoized.
    pub fn load(&mut self, location: &str) -> Result<NodeId, ParseError> {
        if let Some(root) = self.documents.get(location) {
            return Ok(self.tree.follow(*root));
        }
        let bytes = self.loader.load(location)?;
        let format = Format::detect(location, &bytes);
        debug!("loaded {location} as {format:?} ({} bytes)", bytes.len());
        let root = tree::deserialize(self.tree, &bytes, format)?;
        self.resolve_tree(root, location)
    }

    /// Resolve every reference below `root`, a document already in the tree
    /// that was read from `location`.
    pub fn resolve_tree(&mut self, root: NodeId, location: &str) -> Result<NodeId, ParseError> {
        if self.root_location.is_none() {
            self.root_location = Some(location.to_string());
        }
        self.documents.insert(location.to_string(), root);

        let mut sites = Vec::new();
        collect(self.tree, root, Slot::Root, &mut Vec::new(), &mut sites);
        for site in &sites {
            self.owners.insert(site.node, location.to_string());
        }
        sites.sort_by_key(|site| std::cmp::Reverse(site.path.len()));
        debug!("{location}: {} references", sites.len());

        for site in sites {
            match self.target_of(site.node)? {
                Outcome::Target(target) => self.rewrite(&site, target),
                Outcome::Dangling { target, error } => {
                    self.report(location, &site.path, &error);
                    let reference = self
                        .tree
                        .ref_string(site.node)
                        .unwrap_or_default()
                        .to_string();
                    if !reference.is_empty() {
                        *self.tree.node_mut(site.node) =
                            Node::Unresolved(Dangling { reference, target });
                    }
                }
            }
        }
        Ok(self.tree.follow(root))
    }

    fn report(&mut self, location: &str, path: &[String], error: &ResolveError) {
        let mut scope = Vec::with_capacity(path.len() + 1);
        if self.root_location.as_deref() != Some(location) {
            scope.push(location.to_string());
        }
        scope.extend(path.iter().cloned());
        self.diagnostics.warn(scope, error.to_string());
    }

    fn rewrite(&mut self, site: &RefSite, target: NodeId) {
        match &site.slot {
            Slot::Key(parent, key) => {
                if let Node::Map(map) = self.tree.node_mut(*parent) {
                    map.insert(key.clone(), target);
                }
                self.tree.record_reference_slot(*parent, key);
            }
            Slot::Index(parent, index) => {
                if let Node::Seq(items) = self.tree.node_mut(*parent) {
                    items[*index] = target;
                }
            }
            Slot::Root => {}
        }
        self.tree.record_redirect(site.node, target);
    }

    fn target_of(&mut self, node: NodeId) -> Result<Outcome, ParseError> {
        if let Some(outcome) = self.outcomes.get(&node) {
            return Ok(outcome.clone());
        }
        let raw = self.tree.ref_string(node).unwrap_or_default().to_string();
        if self.in_progress.contains(&node) {
            return Ok(Outcome::Dangling {
                target: raw.clone(),
                error: ResolveError::CircularRef(raw),
            });
        }

        self.in_progress.push(node);
        let outcome = self.compute(node, &raw);
        self.in_progress.pop();
        let outcome = outcome?;
        self.outcomes.insert(node, outcome.clone());
        Ok(outcome)
    }

    fn compute(&mut self, node: NodeId, raw: &str) -> Result<Outcome, ParseError> {
        let reference = match Reference::parse(raw) {
            Ok(reference) => reference,
            Err(error) => {
                return Ok(Outcome::Dangling {
                    target: raw.to_string(),
                    error,
                });
            }
        };
        let base = self.owners.get(&node).cloned().unwrap_or_default();
        let target = match self.locate(&reference, &base)? {
            Outcome::Target(target) => target,
            dangling => return Ok(dangling),
        };
        debug!("{base}: {raw} -> {target}");
        Ok(Outcome::Target(self.overlay(node, target)))
    }

    /// Copy `target` with the reference's sibling keys on top, or return it
    /// untouched when there are none.
    fn overlay(&mut self, node: NodeId, target: NodeId) -> NodeId {
        let siblings: Vec<(String, NodeId)> = match self.tree.node(node) {
            Node::Map(map) => map
                .iter()
                .filter(|(key, _)| key.as_str() != "$ref")
                .map(|(key, id)| (key.clone(), *id))
                .collect(),
            _ => Vec::new(),
        };
        if siblings.is_empty() {
            return target;
        }
        let Node::Map(entries) = self.tree.node(target) else {
            return target;
        };
        let mut merged = entries.clone();
        merged.extend(siblings);
        let copy = self.tree.push(Node::Map(merged));
        self.tree.record_overlay(copy, target);
        copy
    }

    fn locate(&mut self, reference: &Reference, base: &str) -> Result<Outcome, ParseError> {
        let root = if reference.is_local() {
            match self.documents.get(base) {
                Some(root) => *root,
                None => {
                    return Ok(not_found(reference));
                }
            }
        } else {
            let location = normalize_path(&reference.source, base);
            self.load(&location)?
        };

        let mut current = match self.settle(root)? {
            Outcome::Target(id) => id,
            dangling => return Ok(dangling),
        };
        for key in &reference.keys {
            let next = match self.tree.node(current) {
                Node::Map(map) => map.get(key).copied(),
                Node::Seq(items) => key.parse::<usize>().ok().and_then(|i| items.get(i).copied()),
                _ => None,
            };
            let Some(next) = next else {
                return Ok(not_found(reference));
            };
            current = match self.settle(next)? {
                Outcome::Target(id) => id,
                dangling => return Ok(dangling),
            };
        }
        Ok(Outcome::Target(current))
    }

    /// The concrete node behind `id`: resolves it first if it is itself a
    /// reference met while walking a pointer.
    fn settle(&mut self, id: NodeId) -> Result<Outcome, ParseError> {
        let id = self.tree.follow(id);
        if let Node::Unresolved(dangling) = self.tree.node(id) {
            return Ok(Outcome::Dangling {
                target: dangling.target.clone(),
                error: ResolveError::RefTargetNotFound(dangling.target.clone()),
            });
        }
        if self.tree.ref_string(id).is_some() && self.owners.contains_key(&id) {
            return self.target_of(id);
        }
        Ok(Outcome::Target(id))
    }
}

fn not_found(reference: &Reference) -> Outcome {
    Outcome::Dangling {
        target: reference.raw.clone(),
        error: ResolveError::RefTargetNotFound(reference.raw.clone()),
    }
}

/// Depth-first walk of a freshly deserialized document collecting every
/// reference map, including references nested in a reference's siblings.
fn collect(tree: &Tree, id: NodeId, slot: Slot, path: &mut Vec<String>, sites: &mut Vec<RefSite>) {
    if tree.ref_string(id).is_some() {
        sites.push(RefSite {
            slot,
            node: id,
            path: path.clone(),
        });
    }
    match tree.node(id) {
        Node::Map(map) => {
            for (key, child) in map {
                if key == "$ref" {
                    continue;
                }
                path.push(key.clone());
                collect(tree, *child, Slot::Key(id, key.clone()), path, sites);
                path.pop();
            }
        }
        Node::Seq(items) => {
            for (index, child) in items.iter().enumerate() {
                path.push(index.to_string());
                collect(tree, *child, Slot::Index(id, index), path, sites);
                path.pop();
            }
        }
        _ => {}
    }
}
