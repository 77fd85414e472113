use indexmap::IndexMap;

use super::{OperationScope, Session, VersionAdapter, path, truthy, version_of};
use crate::error::{NormalizeError, ParseError};
use crate::ir::{
    ApiKeyLocation, ModelOrigin, OAuthFlow, OAuthFlows, RequestBody, SecurityScheme,
    SecuritySchemeType, Server, SimpleType, SpecVersion,
};
use crate::repository::ParameterGroup;
use crate::tree::NodeRef;

const METHODS: &[&str] = &["get", "put", "post", "delete", "options", "head", "patch"];
const DEFAULT_MEDIA: &str = "application/json";
const MULTIPART: &str = "multipart/form-data";
const URLENCODED: &str = "application/x-www-form-urlencoded";

/// Swagger 2.0.
#[derive(Debug, Default, Clone, Copy)]
pub struct Swagger2;

impl VersionAdapter for Swagger2 {
    fn version(&self) -> SpecVersion {
        SpecVersion::Swagger2
    }

    fn label(&self) -> &'static str {
        "Swagger 2.0"
    }

    fn is_supported(&self, doc: NodeRef<'_>) -> bool {
        version_of(doc, "swagger").is_some_and(|v| v.starts_with("2."))
    }

    fn is_nullable(&self, schema: NodeRef<'_>) -> bool {
        truthy(schema.get("x-nullable"))
    }

    fn scalar_type(&self, name: &str) -> Option<SimpleType> {
        match name {
            "integer" => Some(SimpleType::Integer),
            "number" => Some(SimpleType::Number),
            "string" => Some(SimpleType::String),
            "boolean" => Some(SimpleType::Boolean),
            "file" => Some(SimpleType::File),
            _ => None,
        }
    }

    fn methods(&self) -> &'static [&'static str] {
        METHODS
    }

    fn schemas<'t>(&self, doc: NodeRef<'t>) -> Option<NodeRef<'t>> {
        doc.get("definitions")
    }

    /// Body parameters carry a `schema`; every other parameter describes
    /// its value inline.
    fn parameter_schema<'t>(&self, parameter: NodeRef<'t>) -> Option<NodeRef<'t>> {
        if parameter.str_of("in") == Some("body") {
            parameter.get("schema")
        } else {
            Some(parameter)
        }
    }

    fn request_bodies<'t>(
        &self,
        session: &mut Session<'_>,
        scope: &OperationScope<'t>,
    ) -> Result<Vec<RequestBody>, NormalizeError> {
        let consumes = media_types(scope, "consumes");
        let mut bodies = Vec::new();

        let body = scope
            .parameters
            .iter()
            .find(|p| p.str_of("in") == Some("body"));
        if let Some(body) = body {
            match body.get("schema") {
                Some(schema) => {
                    for media in &consumes {
                        if let Some(content) =
                            path::body_content(self, session, scope, media, schema)?
                        {
                            bodies.push(RequestBody {
                                media: media.to_string(),
                                content,
                                required: body.flag("required"),
                                description: body.string_of("description"),
                            });
                        }
                    }
                }
                None => session.warn(
                    [scope.operation_id.as_str(), "parameters", "body"],
                    "body parameter without schema skipped",
                ),
            }
        }

        let form: Vec<NodeRef<'t>> = scope
            .parameters
            .iter()
            .copied()
            .filter(|p| p.str_of("in") == Some("formData"))
            .collect();
        if !form.is_empty() {
            let content = path::parameter_group(
                self,
                session,
                scope,
                ParameterGroup::FormData,
                &form,
                &scope.model_name("FormData"),
                ModelOrigin::FormData,
            )?;
            let multipart = consumes.iter().any(|m| path::is_form_media(m))
                || form.iter().any(|p| p.str_of("type") == Some("file"));
            bodies.push(RequestBody {
                media: if multipart { MULTIPART } else { URLENCODED }.to_string(),
                content,
                required: form.iter().any(|p| p.flag("required")),
                description: None,
            });
        }
        Ok(bodies)
    }

    fn response_contents<'t>(
        &self,
        scope: &OperationScope<'t>,
        response: NodeRef<'t>,
    ) -> Vec<(String, NodeRef<'t>)> {
        match response.get("schema") {
            Some(schema) => media_types(scope, "produces")
                .into_iter()
                .map(|media| (media, schema))
                .collect(),
            None => Vec::new(),
        }
    }

    /// `schemes × host + basePath`.
    fn servers(&self, doc: NodeRef<'_>) -> Result<Vec<Server>, ParseError> {
        let base_path = doc.str_of("basePath").unwrap_or_default();
        let Some(host) = doc.str_of("host") else {
            if base_path.is_empty() {
                return Ok(Vec::new());
            }
            return Ok(vec![server(base_path.to_string())]);
        };
        let mut schemes = doc.strings_of("schemes");
        if schemes.is_empty() {
            schemes.push("https");
        }
        Ok(schemes
            .into_iter()
            .map(|scheme| server(format!("{scheme}://{host}{base_path}")))
            .collect())
    }

    /// `securityDefinitions`, translated to 3.x vocabulary.
    fn security_schemes(
        &self,
        session: &mut Session<'_>,
        doc: NodeRef<'_>,
    ) -> Result<IndexMap<String, SecurityScheme>, ParseError> {
        let mut schemes = IndexMap::new();
        let declared = doc
            .get("securityDefinitions")
            .into_iter()
            .flat_map(NodeRef::entries);
        for (name, definition) in declared {
            match security_scheme(definition) {
                Some(scheme) => {
                    schemes.insert(name.to_string(), scheme);
                }
                None => session.warn(
                    ["securityDefinitions", name],
                    "unsupported security definition skipped",
                ),
            }
        }
        Ok(schemes)
    }
}

/// The operation's media types for `key`, else the document's, else JSON.
fn media_types(scope: &OperationScope<'_>, key: &str) -> Vec<String> {
    [scope.operation, scope.doc]
        .into_iter()
        .map(|owner| owner.strings_of(key))
        .find(|types| !types.is_empty())
        .unwrap_or_else(|| vec![DEFAULT_MEDIA])
        .into_iter()
        .map(str::to_string)
        .collect()
}

fn server(url: String) -> Server {
    Server {
        url,
        description: None,
        variables: IndexMap::new(),
    }
}

fn security_scheme(definition: NodeRef<'_>) -> Option<SecurityScheme> {
    let mut scheme = SecurityScheme {
        scheme_type: SecuritySchemeType::Http,
        description: definition.string_of("description"),
        name: None,
        location: None,
        scheme: None,
        bearer_format: None,
        flows: None,
        open_id_connect_url: None,
    };
    match definition.str_of("type")? {
        "basic" => scheme.scheme = Some("basic".to_string()),
        "apiKey" => {
            scheme.scheme_type = SecuritySchemeType::ApiKey;
            scheme.name = definition.string_of("name");
            scheme.location = match definition.str_of("in")? {
                "query" => Some(ApiKeyLocation::Query),
                "header" => Some(ApiKeyLocation::Header),
                _ => return None,
            };
        }
        "oauth2" => {
            scheme.scheme_type = SecuritySchemeType::OAuth2;
            let flow = OAuthFlow {
                authorization_url: definition.string_of("authorizationUrl"),
                token_url: definition.string_of("tokenUrl"),
                refresh_url: None,
                scopes: definition
                    .get("scopes")
                    .into_iter()
                    .flat_map(NodeRef::entries)
                    .map(|(k, v)| (k.to_string(), v.as_str().unwrap_or_default().to_string()))
                    .collect(),
            };
            let mut flows = OAuthFlows::default();
            match definition.str_of("flow")? {
                "implicit" => flows.implicit = Some(flow),
                "password" => flows.password = Some(flow),
                "application" => flows.client_credentials = Some(flow),
                "accessCode" => flows.authorization_code = Some(flow),
                _ => return None,
            }
            scheme.flows = Some(flows);
        }
        _ => return None,
    }
    Some(scheme)
}
