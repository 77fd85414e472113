use std::fmt;

use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;

/// Handle of an entity stored in [`Models`]. Two handles are equal exactly
/// when they name the same entity, so they can be used as map keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct ModelRef(pub(crate) u32);

impl ModelRef {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for ModelRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Where a named model came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelOrigin {
    Schema,
    PathParameters,
    QueryParameters,
    HeaderParameters,
    CookieParameters,
    RequestBody,
    FormData,
    Response,
}

/// A normalized schema.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ModelDef {
    Object(ObjectModel),
    Array(ArrayModel),
    Enum(EnumModel),
    Extended(ExtendedModel),
    Simple(SimpleModel),
    Constant(ConstantModel),
    Null,
    Unknown,
}

/// Variant discriminant used to filter [`ModelDef`]s.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModelKind {
    Object,
    Array,
    Enum,
    Extended,
    Simple,
    Constant,
    Null,
    Unknown,
}

impl ModelDef {
    pub fn kind(&self) -> ModelKind {
        match self {
            ModelDef::Object(_) => ModelKind::Object,
            ModelDef::Array(_) => ModelKind::Array,
            ModelDef::Enum(_) => ModelKind::Enum,
            ModelDef::Extended(_) => ModelKind::Extended,
            ModelDef::Simple(_) => ModelKind::Simple,
            ModelDef::Constant(_) => ModelKind::Constant,
            ModelDef::Null => ModelKind::Null,
            ModelDef::Unknown => ModelKind::Unknown,
        }
    }

    /// Name of a referenceable model.
    pub fn name(&self) -> Option<&str> {
        match self {
            ModelDef::Object(object) => Some(&object.name),
            ModelDef::Enum(enumeration) => Some(&enumeration.name),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&ObjectModel> {
        match self {
            ModelDef::Object(object) => Some(object),
            _ => None,
        }
    }

    pub fn as_enum(&self) -> Option<&EnumModel> {
        match self {
            ModelDef::Enum(enumeration) => Some(enumeration),
            _ => None,
        }
    }

    pub fn as_extended(&self) -> Option<&ExtendedModel> {
        match self {
            ModelDef::Extended(extended) => Some(extended),
            _ => None,
        }
    }

    /// Rename a referenceable model in place; other variants are untouched.
    pub(crate) fn rename(&mut self, name: &str, origin: ModelOrigin) {
        match self {
            ModelDef::Object(object) => {
                object.name = name.to_string();
                object.origin = origin;
                object.name_is_original = true;
            }
            ModelDef::Enum(enumeration) => {
                enumeration.name = name.to_string();
                enumeration.origin = origin;
                enumeration.name_is_original = true;
            }
            _ => {}
        }
    }

    pub fn name_is_original(&self) -> bool {
        match self {
            ModelDef::Object(object) => object.name_is_original,
            ModelDef::Enum(enumeration) => enumeration.name_is_original,
            _ => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ObjectModel {
    pub name: String,
    pub properties: Vec<Property>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub additional_properties: Option<ModelRef>,
    pub deprecated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub extensions: IndexMap<String, Value>,
    pub origin: ModelOrigin,
    /// The name was written in the document rather than derived.
    pub name_is_original: bool,
}

impl ObjectModel {
    pub fn property(&self, name: &str) -> Option<&Property> {
        self.properties.iter().find(|p| p.name == name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Property {
    /// May contain `.` for flattened deepObject query parameters.
    pub name: String,
    pub def: ModelRef,
    pub required: bool,
    pub readonly: bool,
    pub writeonly: bool,
    pub deprecated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub extensions: IndexMap<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArrayModel {
    pub items: ModelRef,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EnumBaseType {
    Integer,
    Number,
    String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnumModel {
    pub name: String,
    pub base_type: EnumBaseType,
    pub entries: Vec<EnumEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    pub deprecated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub extensions: IndexMap<String, Value>,
    pub origin: ModelOrigin,
    pub name_is_original: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnumEntry {
    pub name: String,
    pub value: Value,
    pub deprecated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub extensions: IndexMap<String, Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Combinator {
    /// `allOf`
    And,
    /// `oneOf` / `anyOf`
    Or,
}

/// A combination of at least one member.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExtendedModel {
    pub combinator: Combinator,
    pub members: Vec<ModelRef>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SimpleType {
    Integer,
    Number,
    String,
    Boolean,
    File,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimpleModel {
    pub base_type: SimpleType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConstantModel {
    pub value: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
}

/// The arena every [`ModelRef`] points into.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Models {
    entities: Vec<ModelDef>,
}

impl Models {
    pub(crate) fn new(entities: Vec<ModelDef>) -> Self {
        Self { entities }
    }

    pub fn get(&self, handle: ModelRef) -> Option<&ModelDef> {
        self.entities.get(handle.index())
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ModelRef, &ModelDef)> {
        self.entities
            .iter()
            .enumerate()
            .map(|(i, def)| (ModelRef(i as u32), def))
    }
}

impl std::ops::Index<ModelRef> for Models {
    type Output = ModelDef;

    fn index(&self, handle: ModelRef) -> &ModelDef {
        &self.entities[handle.index()]
    }
}

/// A model that can be referred to by name.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ReferenceableModel<'a> {
    Object(&'a ObjectModel),
    Enum(&'a EnumModel),
}

impl<'a> ReferenceableModel<'a> {
    pub fn from_def(def: &'a ModelDef) -> Option<Self> {
        match def {
            ModelDef::Object(object) => Some(ReferenceableModel::Object(object)),
            ModelDef::Enum(enumeration) => Some(ReferenceableModel::Enum(enumeration)),
            _ => None,
        }
    }

    pub fn name(&self) -> &'a str {
        match self {
            ReferenceableModel::Object(object) => &object.name,
            ReferenceableModel::Enum(enumeration) => &enumeration.name,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn object(name: &str) -> ModelDef {
        ModelDef::Object(ObjectModel {
            name: name.to_string(),
            properties: Vec::new(),
            additional_properties: None,
            deprecated: false,
            description: None,
            extensions: IndexMap::new(),
            origin: ModelOrigin::Schema,
            name_is_original: false,
        })
    }

    #[test]
    fn rename_marks_name_as_original() {
        let mut def = object("PetOwner");
        def.rename("Owner", ModelOrigin::Schema);
        assert_eq!(def.name(), Some("Owner"));
        assert!(def.name_is_original());

        let mut null = ModelDef::Null;
        null.rename("Ignored", ModelOrigin::Schema);
        assert_eq!(null, ModelDef::Null);
    }

    #[test]
    fn serializes_with_kind_tag() {
        let def = ModelDef::Simple(SimpleModel {
            base_type: SimpleType::Integer,
            format: Some("int64".into()),
        });
        assert_eq!(
            serde_json::to_value(&def).unwrap(),
            serde_json::json!({"kind": "simple", "base_type": "integer", "format": "int64"})
        );
        assert_eq!(
            serde_json::to_value(ModelDef::Null).unwrap(),
            serde_json::json!({"kind": "null"})
        );
    }

    #[test]
    fn referenceable_only_for_objects_and_enums() {
        let def = object("Pet");
        assert_eq!(ReferenceableModel::from_def(&def).map(|m| m.name()), Some("Pet"));
        assert!(ReferenceableModel::from_def(&ModelDef::Unknown).is_none());
    }
}
