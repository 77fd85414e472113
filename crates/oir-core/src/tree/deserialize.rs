use serde_yaml_ng::Value as YamlValue;

use super::{Node, NodeId, Tree};
use crate::error::ParseError;

/// Serialization format of a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Json,
    Yaml,
}

impl Format {
    /// Guess the format from the location's extension, then from content.
    pub fn detect(location: &str, bytes: &[u8]) -> Format {
        let path = location
            .split(['?', '#'])
            .next()
            .unwrap_or(location)
            .to_ascii_lowercase();
        if path.ends_with(".json") {
            return Format::Json;
        }
        if path.ends_with(".yaml") || path.ends_with(".yml") {
            return Format::Yaml;
        }
        match bytes.iter().find(|b| !b.is_ascii_whitespace()) {
            Some(b'{') | Some(b'[') => Format::Json,
            _ => Format::Yaml,
        }
    }
}

/// Deserialize a document into the tree, returning its root.
pub fn deserialize(tree: &mut Tree, bytes: &[u8], format: Format) -> Result<NodeId, ParseError> {
    match format {
        Format::Json => {
            let value: serde_json::Value = serde_json::from_slice(bytes)?;
            Ok(tree.insert_json(&value))
        }
        Format::Yaml => {
            let value: YamlValue = serde_yaml_ng::from_slice(bytes)?;
            Ok(insert_yaml(tree, &value))
        }
    }
}

fn insert_yaml(tree: &mut Tree, value: &YamlValue) -> NodeId {
    let node = match value {
        YamlValue::Null => Node::Null,
        YamlValue::Bool(b) => Node::Bool(*b),
        YamlValue::Number(n) => yaml_number(n),
        YamlValue::String(s) => Node::String(s.clone()),
        YamlValue::Sequence(items) => {
            Node::Seq(items.iter().map(|item| insert_yaml(tree, item)).collect())
        }
        YamlValue::Mapping(mapping) => Node::Map(
            mapping
                .iter()
                .map(|(k, v)| (yaml_key(k), insert_yaml(tree, v)))
                .collect(),
        ),
        YamlValue::Tagged(tagged) => return insert_yaml(tree, &tagged.value),
    };
    tree.push(node)
}

fn yaml_number(n: &serde_yaml_ng::Number) -> Node {
    if let Some(i) = n.as_i64() {
        Node::Number(i.into())
    } else if let Some(u) = n.as_u64() {
        Node::Number(u.into())
    } else {
        n.as_f64()
            .and_then(serde_json::Number::from_f64)
            .map(Node::Number)
            .unwrap_or(Node::Null)
    }
}

/// YAML allows non-string keys (`200:` in a responses map); the tree only
/// has string keys.
fn yaml_key(key: &YamlValue) -> String {
    match key {
        YamlValue::String(s) => s.clone(),
        YamlValue::Number(n) => n.to_string(),
        YamlValue::Bool(b) => b.to_string(),
        YamlValue::Null => "null".to_string(),
        YamlValue::Tagged(tagged) => yaml_key(&tagged.value),
        other => serde_yaml_ng::to_string(other)
            .map(|s| s.trim_end().to_string())
            .unwrap_or_default(),
    }
}
