use indexmap::IndexMap;
use log::debug;

use super::{NamingContext, OperationScope, Session, VersionAdapter, deserialize_field, schema};
use crate::error::{NormalizeError, ParseError};
use crate::ir::{
    ModelDef, ModelOrigin, ModelRef, ObjectModel, PathDef, PathResponse, Property,
    SecurityRequirement,
};
use crate::naming::{child_name, operation_id, operation_model_name};
use crate::repository::{ParameterGroup, Source};
use crate::tree::NodeRef;

const GROUPS: [(&str, ParameterGroup, &str, ModelOrigin); 4] = [
    ("path", ParameterGroup::Path, "PathParameters", ModelOrigin::PathParameters),
    ("query", ParameterGroup::Query, "QueryParameters", ModelOrigin::QueryParameters),
    ("header", ParameterGroup::Header, "HeaderParameters", ModelOrigin::HeaderParameters),
    ("cookie", ParameterGroup::Cookie, "CookieParameters", ModelOrigin::CookieParameters),
];

/// Every operation of one path item.
pub(super) fn normalize<'t>(
    adapter: &dyn VersionAdapter,
    session: &mut Session<'_>,
    doc: NodeRef<'t>,
    pattern: &str,
    item: NodeRef<'t>,
    default_security: &[SecurityRequirement],
) -> Result<Vec<PathDef>, ParseError> {
    let mut paths = Vec::new();
    for (key, operation) in item.entries() {
        if !adapter.methods().contains(&key) {
            continue;
        }
        let method = adapter.map_method(key)?;
        let id = operation_id(operation.str_of("operationId"), method.as_str(), pattern);
        if let Some(dangling) = operation.unresolved() {
            session.skip_unresolved(
                [pattern, key],
                format!("unresolved reference {}, operation skipped", dangling.target),
            );
            continue;
        }
        debug!("normalizing {method} {pattern} as {id}");

        let scope = OperationScope {
            doc,
            operation,
            model_prefix: operation_model_name(&id),
            parameters: merged_parameters(session, item, operation, &id),
            operation_id: id,
        };

        let mut groups = [None; 4];
        for (slot, (location, group, suffix, origin)) in groups.iter_mut().zip(GROUPS) {
            let params: Vec<NodeRef<'t>> = scope
                .parameters
                .iter()
                .copied()
                .filter(|p| p.str_of("in") == Some(location))
                .collect();
            if !params.is_empty() {
                *slot = Some(parameter_group(
                    adapter,
                    session,
                    &scope,
                    group,
                    &params,
                    &scope.model_name(suffix),
                    origin,
                )?);
            }
        }
        let [path_params, query_params, header_params, cookie_params] = groups;

        let request_bodies = adapter.request_bodies(session, &scope)?;
        let responses = responses(adapter, session, &scope)?;

        let security = match operation.get("security") {
            Some(security) => deserialize_field(security, "security")?,
            None => default_security.to_vec(),
        };

        paths.push(PathDef {
            url_pattern: pattern.to_string(),
            method,
            operation_id: scope.operation_id.clone(),
            request_path_parameters: path_params,
            request_query_parameters: query_params,
            request_header_parameters: header_params,
            request_cookie_parameters: cookie_params,
            request_bodies,
            responses,
            tags: operation.strings_of("tags").into_iter().map(str::to_string).collect(),
            deprecated: operation.flag("deprecated"),
            summaries: [item, operation]
                .iter()
                .filter_map(|n| n.string_of("summary"))
                .collect(),
            descriptions: [item, operation]
                .iter()
                .filter_map(|n| n.string_of("description"))
                .collect(),
            extensions: operation.extensions(&[]),
            security,
        });
    }
    Ok(paths)
}

/// Path item parameters overridden by operation parameters on
/// `(name, in)`.
fn merged_parameters<'t>(
    session: &mut Session<'_>,
    item: NodeRef<'t>,
    operation: NodeRef<'t>,
    operation_id: &str,
) -> Vec<NodeRef<'t>> {
    let mut merged: IndexMap<(&'t str, &'t str), NodeRef<'t>> = IndexMap::new();
    let declared = item
        .get("parameters")
        .into_iter()
        .chain(operation.get("parameters"))
        .flat_map(NodeRef::items);
    for parameter in declared {
        if let Some(dangling) = parameter.unresolved() {
            session.skip_unresolved(
                [operation_id, "parameters"],
                format!("unresolved reference {}, parameter skipped", dangling.target),
            );
            continue;
        }
        match (parameter.str_of("name"), parameter.str_of("in")) {
            (Some(name), Some(location)) => {
                merged.insert((name, location), parameter);
            }
            _ => session.warn(
                [operation_id, "parameters"],
                "parameter without name or location skipped",
            ),
        }
    }
    merged.into_values().collect()
}

/// The synthesized object holding one location's parameters, registered
/// under the operation node so a shared operation yields one entity.
pub(super) fn parameter_group<'t>(
    adapter: &dyn VersionAdapter,
    session: &mut Session<'_>,
    scope: &OperationScope<'t>,
    group: ParameterGroup,
    parameters: &[NodeRef<'t>],
    name: &str,
    origin: ModelOrigin,
) -> Result<ModelRef, NormalizeError> {
    let source = Source::Parameters {
        operation: scope.operation.canonical(),
        group,
    };
    if let Some(handle) = session.repository.handle_of(source) {
        return Ok(handle);
    }
    let handle = session.repository.reserve(source)?;
    let naming = NamingContext::synthesized(name, origin);

    let mut properties = Vec::new();
    for parameter in parameters {
        let param_name = parameter.str_of("name").unwrap_or_default();
        let Some(value_schema) = adapter.parameter_schema(*parameter) else {
            session.warn([name, param_name], "parameter without schema skipped");
            continue;
        };
        let required = parameter.flag("required") || group == ParameterGroup::Path;

        if parameter.str_of("style") == Some("deepObject") && value_schema.has("properties") {
            let nested_required = value_schema.strings_of("required");
            let nested = value_schema.get("properties").into_iter().flat_map(NodeRef::entries);
            for (prop_name, prop) in nested {
                let flat_name = format!("{param_name}.{prop_name}");
                match schema::normalize(adapter, session, prop, &naming.child(&flat_name)) {
                    Ok(def) => properties.push(Property {
                        name: flat_name,
                        def,
                        required: required && nested_required.contains(&prop_name),
                        readonly: false,
                        writeonly: false,
                        deprecated: prop.flag("deprecated") || parameter.flag("deprecated"),
                        description: prop.string_of("description"),
                        extensions: prop.extensions(schema::NULLABLE_EXTENSIONS),
                    }),
                    Err(NormalizeError::UnresolvedReference(target)) => session.skip_unresolved(
                        [name, flat_name.as_str()],
                        format!("unresolved reference {target}, parameter skipped"),
                    ),
                    Err(err) => return Err(err),
                }
            }
            continue;
        }

        let value_naming = NamingContext::synthesized(child_name(name, param_name), origin);
        match schema::normalize(adapter, session, value_schema, &value_naming) {
            Ok(def) => properties.push(Property {
                name: param_name.to_string(),
                def,
                required,
                readonly: false,
                writeonly: false,
                deprecated: parameter.flag("deprecated"),
                description: parameter.string_of("description"),
                extensions: parameter.extensions(schema::NULLABLE_EXTENSIONS),
            }),
            Err(NormalizeError::UnresolvedReference(target)) => session.skip_unresolved(
                [name, param_name],
                format!("unresolved reference {target}, parameter skipped"),
            ),
            Err(err) => return Err(err),
        }
    }

    session.repository.fill(
        handle,
        ModelDef::Object(ObjectModel {
            name: name.to_string(),
            properties,
            additional_properties: None,
            deprecated: false,
            description: None,
            extensions: IndexMap::new(),
            origin,
            name_is_original: false,
        }),
    )?;
    Ok(handle)
}

/// Normalize a request body schema; an unresolved one is dropped.
pub(super) fn body_content(
    adapter: &dyn VersionAdapter,
    session: &mut Session<'_>,
    scope: &OperationScope<'_>,
    media: &str,
    content: NodeRef<'_>,
) -> Result<Option<ModelRef>, NormalizeError> {
    let naming = if is_form_media(media) {
        NamingContext::synthesized(scope.model_name("FormData"), ModelOrigin::FormData)
    } else {
        NamingContext::synthesized(scope.model_name("Body"), ModelOrigin::RequestBody)
    };
    match schema::normalize(adapter, session, content, &naming) {
        Ok(handle) => Ok(Some(handle)),
        Err(NormalizeError::UnresolvedReference(target)) => {
            session.skip_unresolved(
                [scope.operation_id.as_str(), "requestBody", media],
                format!("unresolved reference {target}, body skipped"),
            );
            Ok(None)
        }
        Err(err) => Err(err),
    }
}

pub(super) fn is_form_media(media: &str) -> bool {
    media.starts_with("multipart/form-data")
}

fn responses(
    adapter: &dyn VersionAdapter,
    session: &mut Session<'_>,
    scope: &OperationScope<'_>,
) -> Result<Vec<PathResponse>, NormalizeError> {
    let mut responses = Vec::new();
    let declared = scope.operation.get("responses").into_iter().flat_map(NodeRef::entries);
    for (code, response) in declared {
        let scope_path = [scope.operation_id.as_str(), "responses", code];
        if let Some(dangling) = response.unresolved() {
            session.skip_unresolved(
                scope_path,
                format!("unresolved reference {}, response skipped", dangling.target),
            );
            continue;
        }
        let naming = NamingContext::synthesized(
            child_name(&scope.model_name("Response"), code),
            ModelOrigin::Response,
        );
        for (media, content) in adapter.response_contents(scope, response) {
            match schema::normalize(adapter, session, content, &naming) {
                Ok(handle) => responses.push(PathResponse {
                    code: code.to_string(),
                    media,
                    content: handle,
                    description: response.string_of("description"),
                }),
                Err(NormalizeError::UnresolvedReference(target)) => session.skip_unresolved(
                    scope_path,
                    format!("unresolved reference {target} for {media}, response skipped"),
                ),
                Err(err) => return Err(err),
            }
        }
    }
    Ok(responses)
}

#[cfg(test)]
mod tests {
    use crate::ir::{ModelDef, ModelOrigin, SimpleType};
    use crate::parse::from_yaml;

    const ITEMS: &str = r##"
openapi: 3.0.0
info:
  title: Items
  version: "1"
paths:
  /items/{id}:
    summary: One item
    parameters:
      - name: id
        in: path
        schema:
          type: integer
      - name: verbose
        in: query
        schema:
          type: boolean
      - $ref: "#/components/parameters/Gone"
    get:
      summary: Read it
      parameters:
        - name: verbose
          in: query
          required: true
          schema:
            type: string
        - name: If-Match
          in: header
          schema:
            type: string
      responses:
        "200":
          description: ok
          content:
            application/json:
              schema:
                type: string
            text/plain:
              schema:
                type: string
        "404":
          $ref: "#/components/responses/Gone"
components:
  parameters: {}
"##;

    #[test]
    fn operation_parameters_override_path_parameters() {
        let output = from_yaml(ITEMS).unwrap();
        let doc = &output.document;
        let get = doc.find_path("/items/{id}", "get").unwrap();
        assert_eq!(get.operation_id, "getItem");

        let path = doc.model(get.request_path_parameters.unwrap()).as_object().unwrap();
        assert_eq!(path.origin, ModelOrigin::PathParameters);
        assert!(path.property("id").unwrap().required);

        let query = doc.model(get.request_query_parameters.unwrap()).as_object().unwrap();
        assert_eq!(query.name, "GetItemQueryParameters");
        assert_eq!(query.properties.len(), 1);
        let verbose = query.property("verbose").unwrap();
        assert!(verbose.required);
        match doc.model(verbose.def) {
            ModelDef::Simple(simple) => assert_eq!(simple.base_type, SimpleType::String),
            other => panic!("expected string, got {other:?}"),
        }
        assert!(get.request_header_parameters.is_some());
        assert!(get.request_cookie_parameters.is_none());
    }

    #[test]
    fn responses_per_media_and_summaries_in_order() {
        let output = from_yaml(ITEMS).unwrap();
        let get = output.document.find_path("/items/{id}", "get").unwrap();
        let media: Vec<(&str, &str)> = get
            .responses
            .iter()
            .map(|r| (r.code.as_str(), r.media.as_str()))
            .collect();
        assert_eq!(media, vec![("200", "application/json"), ("200", "text/plain")]);
        assert_eq!(get.summaries, vec!["One item", "Read it"]);
    }

    #[test]
    fn each_dangling_reference_is_reported_once() {
        let output = from_yaml(ITEMS).unwrap();
        let messages: Vec<String> = output.diagnostics.iter().map(ToString::to_string).collect();
        assert_eq!(
            messages,
            vec![
                "paths > /items/{id} > get > responses > 404: unresolved reference: #/components/responses/Gone",
                "paths > /items/{id} > parameters > 2: unresolved reference: #/components/parameters/Gone",
            ]
        );
    }
}
