use indexmap::IndexMap;

use super::v3::{
    METHODS, component_security_schemes, components_schemas, content_parameter_schema,
    content_request_bodies, content_schemas, content_servers,
};
use super::{OperationScope, Session, VersionAdapter, truthy, version_of};
use crate::error::{NormalizeError, ParseError};
use crate::ir::{RequestBody, SecurityScheme, Server, SpecVersion};
use crate::tree::NodeRef;

/// OpenAPI 3.1.x: like 3.0, but `type` may list several types and `null`
/// is spelled as one of them.
#[derive(Debug, Default, Clone, Copy)]
pub struct OpenApi31;

impl VersionAdapter for OpenApi31 {
    fn version(&self) -> SpecVersion {
        SpecVersion::OpenApi31
    }

    fn label(&self) -> &'static str {
        "OpenAPI 3.1"
    }

    fn is_supported(&self, doc: NodeRef<'_>) -> bool {
        version_of(doc, "openapi").is_some_and(|v| v.starts_with("3.1"))
    }

    fn is_nullable(&self, schema: NodeRef<'_>) -> bool {
        let listed = schema
            .get("type")
            .is_some_and(|t| t.items().any(|item| item.as_str() == Some("null")));
        listed || truthy(schema.get("nullable"))
    }

    fn allows_type_arrays(&self) -> bool {
        true
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::Tree;
    use serde_json::json;

    #[test]
    fn null_in_type_list_is_nullable() {
        let mut tree = Tree::new();
        let listed = tree.insert_json(&json!({"type": ["string", "null"]}));
        let plain = tree.insert_json(&json!({"type": "string"}));
        assert!(OpenApi31.is_nullable(tree.view(listed)));
        assert!(!OpenApi31.is_nullable(tree.view(plain)));
    }

    #[test]
    fn detects_3_1_documents() {
        let mut tree = Tree::new();
        let doc = tree.insert_json(&json!({"openapi": "3.1.0"}));
        assert!(OpenApi31.is_supported(tree.view(doc)));
    }
}
