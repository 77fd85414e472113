//! Turns a resolved document tree into IR entities.
//!
//! Dialect differences live behind [`VersionAdapter`]; the schema, enum and
//! path normalizers are shared and consult the adapter wherever the
//! dialects disagree.

mod document;
mod enums;
mod path;
mod schema;
mod v2;
mod v3;
mod v31;

use indexmap::IndexMap;
use log::debug;

pub(crate) use document::assemble;
pub use document::detect;
pub use v2::Swagger2;
pub use v3::OpenApi30;
pub use v31::OpenApi31;

use crate::config::ParseContext;
use crate::error::{NormalizeError, ParseError, RepositoryError};
use crate::ir::{
    Combinator, ExtendedModel, HttpMethod, ModelDef, ModelOrigin, ModelRef, PathDef,
    RequestBody, SecurityRequirement, SecurityScheme, Server, SimpleType, SpecVersion,
};
use crate::naming::child_name;
use crate::repository::{Repository, Source};
use crate::tree::NodeRef;

/// State shared by every normalizer during one parse.
pub struct Session<'c> {
    pub(crate) repository: Repository,
    pub(crate) context: &'c mut ParseContext,
}

impl<'c> Session<'c> {
    pub(crate) fn new(context: &'c mut ParseContext) -> Self {
        Self {
            repository: Repository::new(),
            context,
        }
    }

    pub(crate) fn warn<S: Into<String>>(
        &mut self,
        scope: impl IntoIterator<Item = S>,
        message: impl Into<String>,
    ) {
        self.context.diagnostics.warn(scope, message);
    }

    /// An element dropped because it sits on a dangling reference. The
    /// resolver has already recorded the diagnostic for that reference.
    pub(crate) fn skip_unresolved<S: Into<String>>(
        &mut self,
        scope: impl IntoIterator<Item = S>,
        message: impl Into<String>,
    ) {
        let scope: Vec<String> = scope.into_iter().map(Into::into).collect();
        debug!("{}: {}", scope.join(" > "), message.into());
    }

    /// `inner | null` for the overlay `source`, built once per overlay.
    pub(crate) fn nullable(
        &mut self,
        source: Source,
        inner: ModelRef,
    ) -> Result<ModelRef, RepositoryError> {
        if let Some(handle) = self.repository.handle_of(source) {
            return Ok(handle);
        }
        let null = self.repository.null();
        let handle = self.repository.add(
            ModelDef::Extended(ExtendedModel {
                combinator: Combinator::Or,
                members: vec![inner, null],
            }),
            source,
        )?;
        self.repository.mark_nullable(handle, inner);
        Ok(handle)
    }
}

/// How a model produced from a schema should be named.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamingContext {
    pub name: Option<String>,
    pub origin: ModelOrigin,
    pub name_is_original: bool,
}

impl NamingContext {
    /// A schema named in the document's schema map.
    pub fn schema(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            origin: ModelOrigin::Schema,
            name_is_original: true,
        }
    }

    /// A name made up from the surrounding operation.
    pub fn synthesized(name: impl Into<String>, origin: ModelOrigin) -> Self {
        Self {
            name: Some(name.into()),
            origin,
            name_is_original: false,
        }
    }

    pub fn anonymous() -> Self {
        Self {
            name: None,
            origin: ModelOrigin::Schema,
            name_is_original: false,
        }
    }

    /// Context for a schema nested under `segment`.
    pub fn child(&self, segment: &str) -> Self {
        Self {
            name: Some(child_name(self.name(), segment)),
            origin: self.origin,
            name_is_original: false,
        }
    }

    /// Same name and origin, for combinator members.
    pub fn member(&self) -> Self {
        Self {
            name_is_original: false,
            ..self.clone()
        }
    }

    pub fn name(&self) -> &str {
        self.name.as_deref().unwrap_or("Anonymous")
    }
}

/// One OpenAPI dialect.
pub trait VersionAdapter {
    fn version(&self) -> SpecVersion;

    /// Short name used in errors.
    fn label(&self) -> &'static str;

    fn is_supported(&self, doc: NodeRef<'_>) -> bool;

    /// Whether the schema itself declares `null` as an allowed value.
    fn is_nullable(&self, schema: NodeRef<'_>) -> bool;

    /// `type` may be a list of type names.
    fn allows_type_arrays(&self) -> bool {
        false
    }

    fn scalar_type(&self, name: &str) -> Option<SimpleType> {
        match name {
            "integer" => Some(SimpleType::Integer),
            "number" => Some(SimpleType::Number),
            "string" => Some(SimpleType::String),
            "boolean" => Some(SimpleType::Boolean),
            _ => None,
        }
    }

    /// Path item keys that are operations.
    fn methods(&self) -> &'static [&'static str];

    fn map_method(&self, key: &str) -> Result<HttpMethod, ParseError> {
        HttpMethod::from_key(key).ok_or_else(|| ParseError::UnsupportedMethod {
            adapter: self.label(),
            method: key.to_string(),
        })
    }

    /// The named schema map.
    fn schemas<'t>(&self, doc: NodeRef<'t>) -> Option<NodeRef<'t>>;

    /// The schema describing a parameter's value.
    fn parameter_schema<'t>(&self, parameter: NodeRef<'t>) -> Option<NodeRef<'t>>;

    fn request_bodies<'t>(
        &self,
        session: &mut Session<'_>,
        operation: &OperationScope<'t>,
    ) -> Result<Vec<RequestBody>, NormalizeError>;

    /// `(media type, schema)` pairs of one response.
    fn response_contents<'t>(
        &self,
        operation: &OperationScope<'t>,
        response: NodeRef<'t>,
    ) -> Vec<(String, NodeRef<'t>)>;

    fn servers(&self, doc: NodeRef<'_>) -> Result<Vec<Server>, ParseError>;

    fn security_schemes(
        &self,
        session: &mut Session<'_>,
        doc: NodeRef<'_>,
    ) -> Result<IndexMap<String, SecurityScheme>, ParseError>;
}

impl dyn VersionAdapter + '_ {
    pub fn normalize_schema(
        &self,
        session: &mut Session<'_>,
        schema: NodeRef<'_>,
        naming: &NamingContext,
    ) -> Result<ModelRef, NormalizeError> {
        schema::normalize(self, session, schema, naming)
    }

    pub fn normalize_path<'t>(
        &self,
        session: &mut Session<'_>,
        doc: NodeRef<'t>,
        pattern: &str,
        item: NodeRef<'t>,
        default_security: &[SecurityRequirement],
    ) -> Result<Vec<PathDef>, ParseError> {
        path::normalize(self, session, doc, pattern, item, default_security)
    }
}

/// What adapters get to see of the operation being normalized.
#[derive(Debug, Clone)]
pub struct OperationScope<'t> {
    pub doc: NodeRef<'t>,
    pub operation: NodeRef<'t>,
    pub operation_id: String,
    /// PascalCase prefix for synthesized model names.
    pub model_prefix: String,
    /// Merged path and operation parameters, operation entries winning.
    pub parameters: Vec<NodeRef<'t>>,
}

impl OperationScope<'_> {
    pub fn model_name(&self, suffix: &str) -> String {
        format!("{}{suffix}", self.model_prefix)
    }
}

/// `nullable` style flags may be written as booleans or strings.
pub(crate) fn truthy(node: Option<NodeRef<'_>>) -> bool {
    match node {
        Some(n) => n.as_bool().unwrap_or(false) || n.as_str() == Some("true"),
        None => false,
    }
}

/// The document's version string, tolerating an unquoted YAML number.
pub(crate) fn version_of(doc: NodeRef<'_>, key: &str) -> Option<String> {
    let node = doc.get(key)?;
    match node.node() {
        crate::tree::Node::String(s) => Some(s.clone()),
        crate::tree::Node::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

pub(crate) fn deserialize_field<T: serde::de::DeserializeOwned>(
    node: NodeRef<'_>,
    field: &str,
) -> Result<T, ParseError> {
    serde_json::from_value(node.to_json()).map_err(|source| ParseError::InvalidField {
        field: field.to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn child_names_nest_and_drop_originality() {
        let root = NamingContext::schema("Pet");
        let owner = root.child("owner");
        assert_eq!(owner.name(), "PetOwner");
        assert!(!owner.name_is_original);
        assert_eq!(owner.child("address").name(), "PetOwnerAddress");

        let member = root.member();
        assert_eq!(member.name(), "Pet");
        assert!(!member.name_is_original);
        assert_eq!(NamingContext::anonymous().child("x").name(), "AnonymousX");
    }
}
