//! Identity-keyed store of the entities produced during one parse session.

use std::collections::HashMap;

use crate::error::RepositoryError;
use crate::ir::{ModelDef, ModelKind, ModelRef, Models};
use crate::tree::NodeId;

/// Which parameters a synthesized object collects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParameterGroup {
    Path,
    Query,
    Header,
    Cookie,
    FormData,
}

/// The identity an entity was produced for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Source {
    /// A schema node, by canonical identity.
    Schema(NodeId),
    /// The parameters of one location, gathered from an operation node.
    Parameters { operation: NodeId, group: ParameterGroup },
}

/// Lookup key accepted by [`Repository::get`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKey {
    Source(Source),
    Ref(ModelRef),
}

impl From<Source> for EntityKey {
    fn from(source: Source) -> Self {
        EntityKey::Source(source)
    }
}

impl From<ModelRef> for EntityKey {
    fn from(handle: ModelRef) -> Self {
        EntityKey::Ref(handle)
    }
}

/// Maps sources to handles and handles to entities.
///
/// Entities are created in two steps: [`reserve`](Repository::reserve) hands
/// out the handle before the entity exists, so a schema that refers back to
/// itself can be pointed at while it is still being built, then
/// [`fill`](Repository::fill) stores the finished entity.
#[derive(Debug, Default)]
pub struct Repository {
    sources: HashMap<Source, ModelRef>,
    entities: Vec<Option<ModelDef>>,
    /// Nullable wrapper → the entity it makes nullable.
    nullable: HashMap<ModelRef, ModelRef>,
    null: Option<ModelRef>,
    unknown: Option<ModelRef>,
}

impl Repository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Store a finished entity for `source`.
    pub fn add(&mut self, model: ModelDef, source: Source) -> Result<ModelRef, RepositoryError> {
        let handle = self.reserve(source)?;
        self.fill(handle, model)?;
        Ok(handle)
    }

    /// Claim a handle for `source` before its entity is built.
    pub fn reserve(&mut self, source: Source) -> Result<ModelRef, RepositoryError> {
        if self.sources.contains_key(&source) {
            return Err(RepositoryError::DuplicateSource(source));
        }
        let handle = self.reserve_anonymous();
        self.sources.insert(source, handle);
        Ok(handle)
    }

    /// Claim a handle for an entity with no source of its own.
    pub fn reserve_anonymous(&mut self) -> ModelRef {
        let handle = ModelRef(self.entities.len() as u32);
        self.entities.push(None);
        handle
    }

    pub fn fill(&mut self, handle: ModelRef, model: ModelDef) -> Result<(), RepositoryError> {
        let slot = self
            .entities
            .get_mut(handle.index())
            .ok_or(RepositoryError::MissingEntity(handle))?;
        if slot.is_some() {
            return Err(RepositoryError::AlreadyFilled(handle));
        }
        *slot = Some(model);
        Ok(())
    }

    /// Store an entity with no source of its own.
    pub fn insert(&mut self, model: ModelDef) -> ModelRef {
        let handle = ModelRef(self.entities.len() as u32);
        self.entities.push(Some(model));
        handle
    }

    pub fn has_source(&self, source: Source) -> bool {
        self.sources.contains_key(&source)
    }

    pub fn handle_of(&self, source: Source) -> Option<ModelRef> {
        self.sources.get(&source).copied()
    }

    pub fn get(&self, key: impl Into<EntityKey>) -> Result<&ModelDef, RepositoryError> {
        let handle = self.resolve_key(key.into())?;
        self.entities
            .get(handle.index())
            .ok_or(RepositoryError::MissingEntity(handle))?
            .as_ref()
            .ok_or(RepositoryError::Unfilled(handle))
    }

    pub fn get_mut(&mut self, key: impl Into<EntityKey>) -> Result<&mut ModelDef, RepositoryError> {
        let handle = self.resolve_key(key.into())?;
        self.entities
            .get_mut(handle.index())
            .ok_or(RepositoryError::MissingEntity(handle))?
            .as_mut()
            .ok_or(RepositoryError::Unfilled(handle))
    }

    fn resolve_key(&self, key: EntityKey) -> Result<ModelRef, RepositoryError> {
        match key {
            EntityKey::Ref(handle) => Ok(handle),
            EntityKey::Source(source) => self
                .handle_of(source)
                .ok_or(RepositoryError::MissingSource(source)),
        }
    }

    /// Handles of every constructed entity in insertion order, restricted to
    /// `kinds` unless it is empty.
    pub fn get_all(&self, kinds: &[ModelKind]) -> Vec<ModelRef> {
        self.entities
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| slot.as_ref().map(|def| (ModelRef(i as u32), def)))
            .filter(|(_, def)| kinds.is_empty() || kinds.contains(&def.kind()))
            .map(|(handle, _)| handle)
            .collect()
    }

    /// Record `wrapper` as the `inner | null` built for a nullable schema.
    pub fn mark_nullable(&mut self, wrapper: ModelRef, inner: ModelRef) {
        self.nullable.insert(wrapper, inner);
    }

    /// The entity a nullable wrapper was built around. Unions written in the
    /// document are never wrappers, whatever their members.
    pub fn nullable_inner(&self, wrapper: ModelRef) -> Option<ModelRef> {
        self.nullable.get(&wrapper).copied()
    }

    /// The shared `null` entity.
    pub fn null(&mut self) -> ModelRef {
        if let Some(handle) = self.null {
            return handle;
        }
        let handle = self.insert(ModelDef::Null);
        self.null = Some(handle);
        handle
    }

    /// The shared `unknown` entity.
    pub fn unknown(&mut self) -> ModelRef {
        if let Some(handle) = self.unknown {
            return handle;
        }
        let handle = self.insert(ModelDef::Unknown);
        self.unknown = Some(handle);
        handle
    }

    /// Consume the repository, requiring every reserved handle to be filled.
    pub fn into_models(self) -> Result<Models, RepositoryError> {
        let entities = self
            .entities
            .into_iter()
            .enumerate()
            .map(|(i, slot)| slot.ok_or(RepositoryError::Unfilled(ModelRef(i as u32))))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Models::new(entities))
    }
}
