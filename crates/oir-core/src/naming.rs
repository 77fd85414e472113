use heck::{ToLowerCamelCase, ToPascalCase};
use serde_json::Value;

/// Derive a camelCase operation name from HTTP method + path.
///
/// Examples:
/// - `GET /users` → `listUsers`
/// - `POST /users` → `createUsers`
/// - `GET /users/{userId}` → `getUser`
/// - `DELETE /users/{userId}` → `deleteUser`
/// - `GET /users/{userId}/messages` → `listUsersMessages`
pub fn route_to_name(method: &str, path: &str) -> String {
    let mut resource_parts: Vec<&str> = Vec::new();
    let mut ends_with_param = false;

    for seg in path.split('/').filter(|s| !s.is_empty()) {
        if seg.starts_with('{') && seg.ends_with('}') {
            ends_with_param = true;
        } else {
            resource_parts.push(seg);
            ends_with_param = false;
        }
    }

    let prefix = match method.to_ascii_uppercase().as_str() {
        "GET" if ends_with_param => "get".to_string(),
        "GET" => "list".to_string(),
        "POST" => "create".to_string(),
        "PUT" => "update".to_string(),
        "DELETE" => "delete".to_string(),
        "PATCH" => "patch".to_string(),
        other => other.to_lowercase(),
    };

    let mut name = prefix;
    for (i, part) in resource_parts.iter().enumerate() {
        let is_last = i == resource_parts.len() - 1;
        let word = if is_last && ends_with_param {
            singularize(part)
        } else {
            part.to_string()
        };
        name.push_str(&sanitize_identifier(&word).to_pascal_case());
    }
    name
}

/// Naive singularization: strips trailing 's' if present.
fn singularize(word: &str) -> String {
    if word.ends_with("ies") && word.len() > 3 {
        format!("{}y", &word[..word.len() - 3])
    } else if word.ends_with("ses") || word.ends_with("xes") || word.ends_with("zes") {
        word[..word.len() - 2].to_string()
    } else if word.ends_with('s') && !word.ends_with("ss") && word.len() > 1 {
        word[..word.len() - 1].to_string()
    } else {
        word.to_string()
    }
}

/// Keep alphanumeric runs, joined by `_`. Leading digits get a `_` prefix.
pub fn sanitize_identifier(name: &str) -> String {
    let mut result = String::with_capacity(name.len());
    let mut prev_was_separator = false;

    for ch in name.chars() {
        if ch.is_alphanumeric() {
            if result.is_empty() && ch.is_ascii_digit() {
                result.push('_');
            }
            if prev_was_separator && !result.is_empty() {
                result.push('_');
            }
            result.push(ch);
            prev_was_separator = false;
        } else {
            prev_was_separator = true;
        }
    }

    result
}

/// Name of a model nested in `parent` under `segment`, e.g. `Pet` + `owner`
/// → `PetOwner`.
pub fn child_name(parent: &str, segment: &str) -> String {
    format!("{parent}{}", sanitize_identifier(segment).to_pascal_case())
}

/// PascalCase form of an operation id, the prefix of synthesized models.
pub fn operation_model_name(operation_id: &str) -> String {
    sanitize_identifier(operation_id).to_pascal_case()
}

/// camelCase operation id, derived from the route when the document has none.
pub fn operation_id(explicit: Option<&str>, method: &str, path: &str) -> String {
    match explicit {
        Some(id) if !id.trim().is_empty() => id.to_string(),
        _ => route_to_name(method, path).to_lower_camel_case(),
    }
}

/// Entry name derived from an enum value: numbers become `_<value>`,
/// strings PascalCase.
pub fn enum_entry_name(value: &Value) -> String {
    match value {
        Value::Number(n) => format!("_{}", n.to_string().replace(['-', '.'], "_")),
        Value::String(s) => {
            let name = sanitize_identifier(s).to_pascal_case();
            if name.is_empty() {
                "Empty".to_string()
            } else if name.starts_with(|c: char| c.is_ascii_digit()) {
                format!("_{name}")
            } else {
                name
            }
        }
        Value::Bool(b) => b.to_string().to_pascal_case(),
        other => other.to_string().to_pascal_case(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_route_to_name_list() {
        assert_eq!(route_to_name("GET", "/users"), "listUsers");
    }

    #[test]
    fn test_route_to_name_create() {
        assert_eq!(route_to_name("POST", "/users"), "createUsers");
    }

    #[test]
    fn test_route_to_name_get_single() {
        assert_eq!(route_to_name("GET", "/users/{userId}"), "getUser");
    }

    #[test]
    fn test_route_to_name_delete() {
        assert_eq!(route_to_name("delete", "/users/{userId}"), "deleteUser");
    }

    #[test]
    fn test_route_to_name_nested() {
        assert_eq!(
            route_to_name("GET", "/users/{userId}/messages/{messageId}"),
            "getUsersMessage"
        );
        assert_eq!(route_to_name("GET", "/users/{userId}/messages"), "listUsersMessages");
    }

    #[test]
    fn test_route_to_name_odd_segments() {
        assert_eq!(route_to_name("GET", "/"), "list");
        assert_eq!(route_to_name("OPTIONS", "/pet-store"), "optionsPetStore");
        assert_eq!(route_to_name("GET", "/categories/{id}"), "getCategory");
    }

    #[test]
    fn test_operation_id_prefers_explicit() {
        assert_eq!(operation_id(Some("findPets"), "GET", "/pets"), "findPets");
        assert_eq!(operation_id(Some("  "), "GET", "/pets"), "listPets");
        assert_eq!(operation_id(None, "GET", "/pets/{id}"), "getPet");
        assert_eq!(operation_model_name("find-pets_v2"), "FindPetsV2");
    }

    #[test]
    fn test_child_name() {
        assert_eq!(child_name("Pet", "owner"), "PetOwner");
        assert_eq!(child_name("Pet", "home_address"), "PetHomeAddress");
        assert_eq!(child_name("PetOwner", "Item"), "PetOwnerItem");
    }

    #[test]
    fn test_sanitize_identifier() {
        assert_eq!(sanitize_identifier("application/json"), "application_json");
        assert_eq!(sanitize_identifier("3dModel"), "_3dModel");
        assert_eq!(sanitize_identifier("--"), "");
    }

    #[test]
    fn test_enum_entry_names() {
        assert_eq!(enum_entry_name(&json!(1)), "_1");
        assert_eq!(enum_entry_name(&json!(-2.5)), "__2_5");
        assert_eq!(enum_entry_name(&json!("available")), "Available");
        assert_eq!(enum_entry_name(&json!("in-stock")), "InStock");
        assert_eq!(enum_entry_name(&json!("")), "Empty");
        assert_eq!(enum_entry_name(&json!(true)), "True");
    }
}
