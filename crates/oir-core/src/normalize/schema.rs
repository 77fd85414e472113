use log::debug;

use super::{NamingContext, Session, VersionAdapter, enums};
use crate::error::NormalizeError;
use crate::ir::{
    ArrayModel, Combinator, ConstantModel, ExtendedModel, ModelDef, ModelRef, ObjectModel,
    Property, SimpleModel,
};
use crate::repository::Source;
use crate::tree::NodeRef;

/// Keywords describing nullability; never carried over as extensions.
pub(super) const NULLABLE_EXTENSIONS: &[&str] = &["x-nullable"];

/// Normalize a schema node, reusing the entity already produced for the
/// same node.
pub(super) fn normalize(
    adapter: &dyn VersionAdapter,
    session: &mut Session<'_>,
    node: NodeRef<'_>,
    naming: &NamingContext,
) -> Result<ModelRef, NormalizeError> {
    if let Some(dangling) = node.unresolved() {
        return Err(NormalizeError::UnresolvedReference(dangling.target.clone()));
    }

    // A reference with siblings: the entity belongs to the referenced node,
    // the overlay may only add nullability.
    if node.is_overlay() {
        let origin = node.origin();
        let handle = normalize(adapter, session, origin, &naming.member())?;
        if adapter.is_nullable(node) && !adapter.is_nullable(origin) {
            let overlay = Source::Schema(node.tree().follow(node.id()));
            return Ok(session.nullable(overlay, handle)?);
        }
        return Ok(handle);
    }

    let source = Source::Schema(node.canonical());
    if let Some(handle) = session.repository.handle_of(source) {
        return Ok(handle);
    }
    let handle = session.repository.reserve(source)?;
    debug!("normalizing {} as {handle}", naming.name());

    let classified = classify(adapter, session, node, naming);
    let (model, mut nullable) = match classified {
        Ok(classified) => classified,
        Err(err) => {
            session.repository.fill(handle, ModelDef::Unknown)?;
            return Err(err);
        }
    };
    nullable |= adapter.is_nullable(node);

    let model = if nullable && !already_nullable(session, &model) {
        let inner = session.repository.insert(model);
        let null = session.repository.null();
        session.repository.mark_nullable(handle, inner);
        ModelDef::Extended(ExtendedModel {
            combinator: Combinator::Or,
            members: vec![inner, null],
        })
    } else {
        model
    };
    session.repository.fill(handle, model)?;
    Ok(handle)
}

fn already_nullable(session: &mut Session<'_>, model: &ModelDef) -> bool {
    match model {
        ModelDef::Null => true,
        ModelDef::Extended(ExtendedModel {
            combinator: Combinator::Or,
            members,
        }) => {
            let null = session.repository.null();
            members.contains(&null)
        }
        _ => false,
    }
}

/// Pick the model variant for a schema. The flag reports values that make
/// the model nullable on top of the adapter's nullability keywords.
fn classify(
    adapter: &dyn VersionAdapter,
    session: &mut Session<'_>,
    node: NodeRef<'_>,
    naming: &NamingContext,
) -> Result<(ModelDef, bool), NormalizeError> {
    if node.has("enum") {
        return Ok(enums::normalize(adapter, session, node, naming));
    }

    let combined = [
        ("allOf", Combinator::And),
        ("oneOf", Combinator::Or),
        ("anyOf", Combinator::Or),
    ]
    .into_iter()
    .find_map(|(key, combinator)| node.non_empty_seq(key).map(|members| (key, combinator, members)));
    if let Some((key, combinator, members)) = combined {
        let model = combination(adapter, session, node, naming, key, combinator, members)?;
        return Ok((model, false));
    }

    if let Some(value) = node.get("const") {
        return Ok((
            ModelDef::Constant(ConstantModel {
                value: value.to_json(),
                format: node.string_of("format"),
            }),
            false,
        ));
    }

    let declared = declared_types(adapter, node);
    let concrete: Vec<&str> = declared.iter().copied().filter(|t| *t != "null").collect();
    let model = match concrete.as_slice() {
        [] if !declared.is_empty() => ModelDef::Null,
        [] if is_object_shaped(node) => object(adapter, session, node, naming)?,
        [] if node.has("items") => array(adapter, session, node, naming)?,
        [] => {
            session.warn([naming.name()], "Unsupported schema, using unknown");
            ModelDef::Unknown
        }
        [single] => typed(adapter, session, node, naming, single)?,
        several => {
            let mut members = Vec::with_capacity(several.len() + 1);
            for type_name in several {
                let model = typed(adapter, session, node, naming, type_name)?;
                members.push(session.repository.insert(model));
            }
            if concrete.len() < declared.len() {
                members.push(session.repository.null());
            }
            ModelDef::Extended(ExtendedModel {
                combinator: Combinator::Or,
                members,
            })
        }
    };
    Ok((model, false))
}

/// Type names listed under `type`.
fn declared_types<'t>(adapter: &dyn VersionAdapter, node: NodeRef<'t>) -> Vec<&'t str> {
    match node.get("type") {
        Some(t) if t.as_str().is_some() => t.as_str().into_iter().collect(),
        Some(t) if adapter.allows_type_arrays() => t.items().filter_map(NodeRef::as_str).collect(),
        _ => Vec::new(),
    }
}

fn is_object_shaped(node: NodeRef<'_>) -> bool {
    node.has("properties") || node.has("additionalProperties")
}

/// The model for a single declared type name.
fn typed(
    adapter: &dyn VersionAdapter,
    session: &mut Session<'_>,
    node: NodeRef<'_>,
    naming: &NamingContext,
    type_name: &str,
) -> Result<ModelDef, NormalizeError> {
    match type_name {
        "object" => object(adapter, session, node, naming),
        "array" => array(adapter, session, node, naming),
        other => match adapter.scalar_type(other) {
            Some(base_type) => Ok(ModelDef::Simple(SimpleModel {
                base_type,
                format: node.string_of("format"),
            })),
            None => {
                session.warn(
                    [naming.name()],
                    format!("Unsupported schema type `{other}`, using unknown"),
                );
                Ok(ModelDef::Unknown)
            }
        },
    }
}

fn combination<'t>(
    adapter: &dyn VersionAdapter,
    session: &mut Session<'_>,
    node: NodeRef<'t>,
    naming: &NamingContext,
    key: &str,
    combinator: Combinator,
    members: NodeRef<'t>,
) -> Result<ModelDef, NormalizeError> {
    let member_naming = naming.member();
    let mut handles = Vec::new();
    for member in members.items() {
        match normalize(adapter, session, member, &member_naming) {
            Ok(handle) => handles.push(handle),
            Err(NormalizeError::UnresolvedReference(target)) => session.skip_unresolved(
                [naming.name(), key],
                format!("unresolved reference {target}, member skipped"),
            ),
            Err(err) => return Err(err),
        }
    }

    // Properties written beside `allOf` are one more member.
    if combinator == Combinator::And && node.has("properties") {
        let own = object(adapter, session, node, &member_naming)?;
        handles.push(session.repository.insert(own));
    }

    if handles.is_empty() {
        session.warn([naming.name(), key], "no usable members, using unknown");
        return Ok(ModelDef::Unknown);
    }
    Ok(ModelDef::Extended(ExtendedModel {
        combinator,
        members: handles,
    }))
}

fn object(
    adapter: &dyn VersionAdapter,
    session: &mut Session<'_>,
    node: NodeRef<'_>,
    naming: &NamingContext,
) -> Result<ModelDef, NormalizeError> {
    let name = naming.name().to_string();
    let required = node.strings_of("required");

    let mut properties = Vec::new();
    if let Some(props) = node.get("properties") {
        for (prop_name, prop) in props.entries() {
            match normalize(adapter, session, prop, &naming.child(prop_name)) {
                Ok(def) => properties.push(Property {
                    name: prop_name.to_string(),
                    def,
                    required: required.contains(&prop_name),
                    readonly: prop.flag("readOnly"),
                    writeonly: prop.flag("writeOnly"),
                    deprecated: prop.flag("deprecated"),
                    description: prop.string_of("description"),
                    extensions: prop.extensions(NULLABLE_EXTENSIONS),
                }),
                Err(NormalizeError::UnresolvedReference(target)) => session.skip_unresolved(
                    [name.as_str(), prop_name],
                    format!("unresolved reference {target}, property skipped"),
                ),
                Err(err) => return Err(err),
            }
        }
    }

    let additional_properties = match node.get("additionalProperties") {
        None => None,
        Some(flag) if flag.as_bool() == Some(true) => Some(session.repository.unknown()),
        Some(flag) if flag.as_bool() == Some(false) => None,
        Some(schema) if schema.is_map() || schema.unresolved().is_some() => {
            match normalize(adapter, session, schema, &naming.child("Value")) {
                Ok(handle) => Some(handle),
                Err(NormalizeError::UnresolvedReference(target)) => {
                    session.skip_unresolved(
                        [name.as_str(), "additionalProperties"],
                        format!("unresolved reference {target}, using unknown"),
                    );
                    Some(session.repository.unknown())
                }
                Err(err) => return Err(err),
            }
        }
        Some(_) => {
            session.warn(
                [name.as_str(), "additionalProperties"],
                "malformed additionalProperties, using unknown",
            );
            Some(session.repository.unknown())
        }
    };

    Ok(ModelDef::Object(ObjectModel {
        name,
        properties,
        additional_properties,
        deprecated: node.flag("deprecated"),
        description: node.string_of("description"),
        extensions: node.extensions(NULLABLE_EXTENSIONS),
        origin: naming.origin,
        name_is_original: naming.name_is_original,
    }))
}

fn array(
    adapter: &dyn VersionAdapter,
    session: &mut Session<'_>,
    node: NodeRef<'_>,
    naming: &NamingContext,
) -> Result<ModelDef, NormalizeError> {
    let item_naming = naming.child("Item");
    let items = match node.get("items") {
        None => {
            session.warn([naming.name()], "array without items, using unknown");
            session.repository.unknown()
        }
        Some(tuple) if tuple.as_seq().is_some() => {
            let mut members = Vec::new();
            for member in tuple.items() {
                match normalize(adapter, session, member, &item_naming) {
                    Ok(handle) => members.push(handle),
                    Err(NormalizeError::UnresolvedReference(target)) => session.skip_unresolved(
                        [naming.name(), "items"],
                        format!("unresolved reference {target}, member skipped"),
                    ),
                    Err(err) => return Err(err),
                }
            }
            if members.is_empty() {
                session.repository.unknown()
            } else {
                session.repository.insert(ModelDef::Extended(ExtendedModel {
                    combinator: Combinator::Or,
                    members,
                }))
            }
        }
        Some(items) => match normalize(adapter, session, items, &item_naming) {
            Ok(handle) => handle,
            Err(NormalizeError::UnresolvedReference(target)) => {
                session.skip_unresolved(
                    [naming.name(), "items"],
                    format!("unresolved reference {target}, using unknown"),
                );
                session.repository.unknown()
            }
            Err(err) => return Err(err),
        },
    };
    Ok(ModelDef::Array(ArrayModel { items }))
}
