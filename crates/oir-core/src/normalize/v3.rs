use indexmap::IndexMap;

use super::{OperationScope, Session, VersionAdapter, deserialize_field, path, truthy, version_of};
use crate::error::{NormalizeError, ParseError};
use crate::ir::{RequestBody, SecurityScheme, Server, SpecVersion};
use crate::tree::NodeRef;

pub(super) const METHODS: &[&str] = &["get", "put", "post", "delete", "options", "head", "patch", "trace"];

/// OpenAPI 3.0.x.
#[derive(Debug, Default, Clone, Copy)]
pub struct OpenApi30;

impl VersionAdapter for OpenApi30 {
    fn version(&self) -> SpecVersion {
        SpecVersion::OpenApi30
    }

    fn label(&self) -> &'static str {
        "OpenAPI 3.0"
    }

    fn is_supported(&self, doc: NodeRef<'_>) -> bool {
        version_of(doc, "openapi").is_some_and(|v| v.starts_with("3.0"))
    }

    fn is_nullable(&self, schema: NodeRef<'_>) -> bool {
        truthy(schema.get("nullable"))
    }

    fn methods(&self) -> &'static [&'static str] {
        METHODS
    }

    fn schemas<'t>(&self, doc: NodeRef<'t>) -> Option<NodeRef<'t>> {
        components_schemas(doc)
    }

    fn parameter_schema<'t>(&self, parameter: NodeRef<'t>) -> Option<NodeRef<'t>> {
        content_parameter_schema(parameter)
    }

    fn request_bodies<'t>(
        &self,
        session: &mut Session<'_>,
        scope: &OperationScope<'t>,
    ) -> Result<Vec<RequestBody>, NormalizeError> {
        content_request_bodies(self, session, scope)
    }

    fn response_contents<'t>(
        &self,
        _scope: &OperationScope<'t>,
        response: NodeRef<'t>,
    ) -> Vec<(String, NodeRef<'t>)> {
        content_schemas(response)
    }

    fn servers(&self, doc: NodeRef<'_>) -> Result<Vec<Server>, ParseError> {
        content_servers(doc)
    }

    fn security_schemes(
        &self,
        session: &mut Session<'_>,
        doc: NodeRef<'_>,
    ) -> Result<IndexMap<String, SecurityScheme>, ParseError> {
        component_security_schemes(session, doc)
    }
}

// The 3.x building blocks below are shared with the 3.1 adapter.

pub(super) fn components_schemas(doc: NodeRef<'_>) -> Option<NodeRef<'_>> {
    doc.get("components")?.get("schemas")
}

/// `schema`, or the schema of the first `content` entry.
pub(super) fn content_parameter_schema(parameter: NodeRef<'_>) -> Option<NodeRef<'_>> {
    parameter.get("schema").or_else(|| {
        parameter
            .get("content")?
            .entries()
            .find_map(|(_, media)| media.get("schema"))
    })
}

/// `(media type, schema)` for every `content` entry carrying a schema.
pub(super) fn content_schemas(owner: NodeRef<'_>) -> Vec<(String, NodeRef<'_>)> {
    owner
        .get("content")
        .into_iter()
        .flat_map(NodeRef::entries)
        .filter_map(|(media, content)| content.get("schema").map(|s| (media.to_string(), s)))
        .collect()
}

pub(super) fn content_request_bodies(
    adapter: &dyn VersionAdapter,
    session: &mut Session<'_>,
    scope: &OperationScope<'_>,
) -> Result<Vec<RequestBody>, NormalizeError> {
    let Some(body) = scope.operation.get("requestBody") else {
        return Ok(Vec::new());
    };
    if let Some(dangling) = body.unresolved() {
        session.skip_unresolved(
            [scope.operation_id.as_str(), "requestBody"],
            format!("unresolved reference {}, body skipped", dangling.target),
        );
        return Ok(Vec::new());
    }

    let mut bodies = Vec::new();
    for (media, schema) in content_schemas(body) {
        if let Some(content) = path::body_content(adapter, session, scope, &media, schema)? {
            bodies.push(RequestBody {
                media,
                content,
                required: body.flag("required"),
                description: body.string_of("description"),
            });
        }
    }
    Ok(bodies)
}

pub(super) fn content_servers(doc: NodeRef<'_>) -> Result<Vec<Server>, ParseError> {
    match doc.get("servers") {
        Some(servers) => deserialize_field(servers, "servers"),
        None => Ok(Vec::new()),
    }
}

pub(super) fn component_security_schemes(
    session: &mut Session<'_>,
    doc: NodeRef<'_>,
) -> Result<IndexMap<String, SecurityScheme>, ParseError> {
    let mut schemes = IndexMap::new();
    let declared = doc
        .get("components")
        .and_then(|c| c.get("securitySchemes"))
        .into_iter()
        .flat_map(NodeRef::entries);
    for (name, scheme) in declared {
        if let Some(dangling) = scheme.unresolved() {
            session.skip_unresolved(
                ["securitySchemes", name],
                format!("unresolved reference {}, scheme skipped", dangling.target),
            );
            continue;
        }
        let scheme = deserialize_field(scheme, &format!("security scheme `{name}`"))?;
        schemes.insert(name.to_string(), scheme);
    }
    Ok(schemes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::Tree;
    use serde_json::json;

    #[test]
    fn detects_3_0_documents() {
        let mut tree = Tree::new();
        let v30 = tree.insert_json(&json!({"openapi": "3.0.3"}));
        let v31 = tree.insert_json(&json!({"openapi": "3.1.0"}));
        let v2 = tree.insert_json(&json!({"swagger": "2.0"}));
        assert!(OpenApi30.is_supported(tree.view(v30)));
        assert!(!OpenApi30.is_supported(tree.view(v31)));
        assert!(!OpenApi30.is_supported(tree.view(v2)));
    }

    #[test]
    fn parameter_schema_falls_back_to_content() {
        let mut tree = Tree::new();
        let param = tree.insert_json(&json!({
            "name": "filter",
            "in": "query",
            "content": {"application/json": {"schema": {"type": "object"}}}
        }));
        let schema = OpenApi30.parameter_schema(tree.view(param)).unwrap();
        assert_eq!(schema.str_of("type"), Some("object"));
    }

    #[test]
    fn nullable_keyword() {
        let mut tree = Tree::new();
        let yes = tree.insert_json(&json!({"type": "string", "nullable": true}));
        let no = tree.insert_json(&json!({"type": "string", "x-nullable": true}));
        assert!(OpenApi30.is_nullable(tree.view(yes)));
        assert!(!OpenApi30.is_nullable(tree.view(no)));
    }
}
