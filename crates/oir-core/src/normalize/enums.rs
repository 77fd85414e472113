use serde_json::Value;

use super::{NamingContext, Session, VersionAdapter};
use crate::ir::{EnumBaseType, EnumEntry, EnumModel, ModelDef};
use crate::naming::enum_entry_name;
use crate::tree::NodeRef;

const ENUM_EXTENSIONS: &[&str] = &[
    "x-enumNames",
    "x-ms-enum",
    "x-enum-varnames",
    "x-enum-descriptions",
    "x-nullable",
];

/// Build an enum model. The flag is set when `null` is one of the values.
pub(super) fn normalize(
    adapter: &dyn VersionAdapter,
    session: &mut Session<'_>,
    node: NodeRef<'_>,
    naming: &NamingContext,
) -> (ModelDef, bool) {
    let all: Vec<Value> = node
        .get("enum")
        .map(|values| values.items().map(NodeRef::to_json).collect())
        .unwrap_or_default();
    let has_null = all.iter().any(Value::is_null);
    let values: Vec<Value> = all.into_iter().filter(|v| !v.is_null()).collect();

    let enum_names = node.strings_of("x-enumNames");
    let entries = if !enum_names.is_empty() {
        named_entries(node, &values, &enum_names)
    } else if let Some(entries) = ms_enum_entries(session, node, naming) {
        entries
    } else {
        named_entries(node, &values, &node.strings_of("x-enum-varnames"))
    };

    let model = EnumModel {
        name: naming.name().to_string(),
        base_type: base_type(adapter, node, &values),
        entries,
        format: node.string_of("format"),
        deprecated: node.flag("deprecated"),
        description: node.string_of("description"),
        extensions: node.extensions(ENUM_EXTENSIONS),
        origin: naming.origin,
        name_is_original: naming.name_is_original,
    };
    (ModelDef::Enum(model), has_null)
}

fn base_type(adapter: &dyn VersionAdapter, node: NodeRef<'_>, values: &[Value]) -> EnumBaseType {
    let declared = match node.get("type") {
        Some(t) if t.as_str().is_some() => t.as_str(),
        Some(t) if adapter.allows_type_arrays() => {
            t.items().filter_map(NodeRef::as_str).find(|t| *t != "null")
        }
        _ => None,
    };
    match declared {
        Some("integer") => EnumBaseType::Integer,
        Some("number") => EnumBaseType::Number,
        Some(_) => EnumBaseType::String,
        None if !values.is_empty() && values.iter().all(|v| v.is_i64() || v.is_u64()) => {
            EnumBaseType::Integer
        }
        None if !values.is_empty() && values.iter().all(Value::is_number) => EnumBaseType::Number,
        None => EnumBaseType::String,
    }
}

/// Entries from `x-ms-enum.values`, which replace the `enum` list entirely.
/// A malformed extension is reported and ignored.
fn ms_enum_entries(
    session: &mut Session<'_>,
    node: NodeRef<'_>,
    naming: &NamingContext,
) -> Option<Vec<EnumEntry>> {
    let ms_values = node.get("x-ms-enum")?.get("values")?;
    if ms_values.as_seq().is_none() {
        session.warn([naming.name(), "x-ms-enum"], "values is not a list, extension ignored");
        return None;
    }
    let mut entries = Vec::new();
    for item in ms_values.items() {
        let Some(value) = item.get("value").map(NodeRef::to_json) else {
            session.warn(
                [naming.name(), "x-ms-enum"],
                "entry without a value, extension ignored",
            );
            return None;
        };
        if value.is_null() {
            continue;
        }
        entries.push(EnumEntry {
            name: item
                .string_of("name")
                .unwrap_or_else(|| enum_entry_name(&value)),
            value,
            deprecated: false,
            description: item.string_of("description"),
            extensions: item.extensions(&[]),
        });
    }
    Some(entries)
}

/// Entries from the `enum` list, named by `names` where given and derived
/// from the value otherwise.
fn named_entries(node: NodeRef<'_>, values: &[Value], names: &[&str]) -> Vec<EnumEntry> {
    let descriptions = node.get("x-enum-descriptions");

    values
        .iter()
        .enumerate()
        .map(|(i, value)| EnumEntry {
            name: names
                .get(i)
                .map(|name| name.to_string())
                .unwrap_or_else(|| enum_entry_name(value)),
            value: value.clone(),
            deprecated: false,
            description: descriptions
                .and_then(|d| d.items().nth(i))
                .and_then(NodeRef::as_str)
                .map(str::to_string),
            extensions: Default::default(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ParseContext;
    use crate::normalize::{OpenApi30, OpenApi31};
    use crate::tree::Tree;
    use serde_json::json;

    fn enum_of(adapter: &dyn VersionAdapter, schema: Value) -> (EnumModel, bool, usize) {
        let mut tree = Tree::new();
        let id = tree.insert_json(&schema);
        let mut context = ParseContext::default();
        let mut session = Session::new(&mut context);
        let (model, has_null) =
            normalize(adapter, &mut session, tree.view(id), &NamingContext::schema("Level"));
        let warnings = session.context.diagnostics.len();
        match model {
            ModelDef::Enum(model) => (model, has_null, warnings),
            other => panic!("expected enum, got {other:?}"),
        }
    }

    fn names(model: &EnumModel) -> Vec<&str> {
        model.entries.iter().map(|e| e.name.as_str()).collect()
    }

    #[test]
    fn enum_names_win_over_ms_enum() {
        let (model, _, _) = enum_of(
            &OpenApi30,
            json!({
                "enum": [1, 2, 3],
                "x-enumNames": ["High", "Medium", "Low"],
                "x-ms-enum": {"values": [
                    {"value": 1, "name": "One"},
                    {"value": 2, "name": "Two"},
                    {"value": 3, "name": "Three"}
                ]}
            }),
        );
        assert_eq!(names(&model), vec!["High", "Medium", "Low"]);
        assert_eq!(model.entries[2].value, json!(3));
    }

    #[test]
    fn ms_enum_wins_over_varnames() {
        let (model, _, _) = enum_of(
            &OpenApi30,
            json!({
                "enum": ["on", "off"],
                "x-enum-varnames": ["Active", "Inactive"],
                "x-ms-enum": {"name": "Power", "values": [
                    {"value": "on", "name": "Enabled", "description": "Powered"},
                    {"value": "off"}
                ]}
            }),
        );
        assert_eq!(names(&model), vec!["Enabled", "Off"]);
        assert_eq!(model.entries[0].description.as_deref(), Some("Powered"));
        assert!(model.extensions.is_empty());
    }

    #[test]
    fn varnames_carry_descriptions() {
        let (model, _, _) = enum_of(
            &OpenApi30,
            json!({
                "type": "integer",
                "enum": [0, 1],
                "x-enum-varnames": ["Low", "High"],
                "x-enum-descriptions": ["not much", "a lot"]
            }),
        );
        assert_eq!(names(&model), vec!["Low", "High"]);
        assert_eq!(model.entries[1].description.as_deref(), Some("a lot"));
        assert_eq!(model.base_type, EnumBaseType::Integer);
    }

    #[test]
    fn names_derived_from_values() {
        let (model, _, _) = enum_of(&OpenApi30, json!({"enum": [1.5, -2]}));
        assert_eq!(names(&model), vec!["_1_5", "__2"]);
        assert_eq!(model.base_type, EnumBaseType::Number);

        let (model, _, _) = enum_of(&OpenApi30, json!({"enum": ["in-progress", "done"]}));
        assert_eq!(names(&model), vec!["InProgress", "Done"]);
        assert_eq!(model.base_type, EnumBaseType::String);
    }

    #[test]
    fn short_name_lists_fall_back_per_entry() {
        let (model, _, _) = enum_of(
            &OpenApi30,
            json!({"enum": ["a", "b"], "x-enumNames": ["First"]}),
        );
        assert_eq!(names(&model), vec!["First", "B"]);
    }

    #[test]
    fn malformed_ms_enum_is_reported_and_ignored() {
        let (model, _, warnings) = enum_of(
            &OpenApi30,
            json!({
                "enum": ["a"],
                "x-enum-varnames": ["Alpha"],
                "x-ms-enum": {"values": "nope"}
            }),
        );
        assert_eq!(names(&model), vec!["Alpha"]);
        assert_eq!(warnings, 1);

        let (model, _, warnings) = enum_of(
            &OpenApi30,
            json!({"enum": ["a"], "x-ms-enum": {"values": [{"name": "NoValue"}]}}),
        );
        assert_eq!(names(&model), vec!["A"]);
        assert_eq!(warnings, 1);
    }

    #[test]
    fn null_values_are_dropped_and_flagged() {
        let (model, has_null, _) = enum_of(&OpenApi31, json!({"enum": ["x", null]}));
        assert!(has_null);
        assert_eq!(names(&model), vec!["X"]);

        let (model, has_null, _) = enum_of(&OpenApi31, json!({"enum": []}));
        assert!(!has_null);
        assert!(model.entries.is_empty());
    }

    #[test]
    fn type_list_picks_the_concrete_base_type() {
        let (model, _, _) = enum_of(&OpenApi31, json!({"type": ["null", "integer"], "enum": [1]}));
        assert_eq!(model.base_type, EnumBaseType::Integer);
    }

    #[test]
    fn other_extensions_are_kept() {
        let (model, _, _) = enum_of(
            &OpenApi30,
            json!({"enum": ["a"], "x-enumNames": ["A"], "x-go-type": "Letter"}),
        );
        assert_eq!(model.extensions.len(), 1);
        assert_eq!(model.extensions["x-go-type"], json!("Letter"));
    }
}
