use oir_core::ir::{
    Combinator, EnumBaseType, ModelDef, ModelRef, ObjectModel, SimpleType, SpecVersion,
};
use oir_core::{Document, parse};
use serde_json::json;

const INVENTORY: &str = include_str!("fixtures/inventory-3.1.json");

fn inventory() -> Document {
    let output = parse::from_json(INVENTORY).expect("should parse inventory 3.1");
    assert!(
        output.diagnostics.is_empty(),
        "unexpected diagnostics: {:?}",
        output.diagnostics
    );
    output.document
}

fn item(doc: &Document) -> &ObjectModel {
    let handle = doc.find_model("Item").expect("Item should exist");
    doc.model(handle).as_object().unwrap()
}

fn prop(doc: &Document, name: &str) -> ModelRef {
    item(doc).property(name).unwrap().def
}

#[test]
fn detects_3_1() {
    let doc = inventory();
    assert_eq!(doc.version, SpecVersion::OpenApi31);
    assert_eq!(doc.info.title, "Inventory");
    let get = doc.find_path("/items/{itemId}", "get").unwrap();
    assert_eq!(get.responses[0].content, doc.find_model("Item").unwrap());
}

#[test]
fn null_in_type_list_is_nullable() {
    let doc = inventory();
    let price = doc.model(prop(&doc, "price")).as_extended().unwrap();
    assert_eq!(price.combinator, Combinator::Or);
    match doc.model(price.members[0]) {
        ModelDef::Simple(simple) => assert_eq!(simple.base_type, SimpleType::Number),
        other => panic!("expected number, got {other:?}"),
    }
    assert_eq!(doc.model(price.members[1]), &ModelDef::Null);
}

#[test]
fn several_types_are_a_union() {
    let doc = inventory();
    let quantity = doc.model(prop(&doc, "quantity")).as_extended().unwrap();
    assert_eq!(quantity.combinator, Combinator::Or);
    let types: Vec<SimpleType> = quantity
        .members
        .iter()
        .map(|m| match doc.model(*m) {
            ModelDef::Simple(simple) => simple.base_type,
            other => panic!("expected simple, got {other:?}"),
        })
        .collect();
    assert_eq!(types, vec![SimpleType::Integer, SimpleType::String]);
}

#[test]
fn const_and_null_types() {
    let doc = inventory();
    match doc.model(prop(&doc, "kind")) {
        ModelDef::Constant(constant) => assert_eq!(constant.value, json!("item")),
        other => panic!("expected constant, got {other:?}"),
    }
    assert_eq!(doc.model(prop(&doc, "nothing")), &ModelDef::Null);
}

#[test]
fn additional_properties() {
    let doc = inventory();
    let labels = doc.model(prop(&doc, "labels")).as_object().unwrap();
    match doc.model(labels.additional_properties.unwrap()) {
        ModelDef::Simple(simple) => assert_eq!(simple.base_type, SimpleType::String),
        other => panic!("expected string values, got {other:?}"),
    }

    let meta = doc.model(prop(&doc, "meta")).as_object().unwrap();
    assert_eq!(
        doc.model(meta.additional_properties.unwrap()),
        &ModelDef::Unknown
    );
    assert!(item(&doc).additional_properties.is_none());
}

#[test]
fn enum_varnames_and_null_value() {
    let doc = inventory();
    let grade = doc.model(prop(&doc, "grade")).as_extended().unwrap();
    // Null is listed twice (type and value) but wrapped once.
    assert_eq!(grade.members.len(), 2);
    let grade = doc.model(grade.members[0]).as_enum().unwrap();
    assert_eq!(grade.base_type, EnumBaseType::String);
    let names: Vec<&str> = grade.entries.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(names, vec!["GradeA", "GradeB"]);
}

#[test]
fn ms_enum_replaces_entries() {
    let doc = inventory();
    let status = doc.model(prop(&doc, "status")).as_enum().unwrap();
    assert_eq!(status.name, "ItemStatus");
    let names: Vec<&str> = status.entries.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(names, vec!["Enabled", "Disabled"]);
    assert_eq!(status.entries[0].description.as_deref(), Some("Turned on"));
    assert_eq!(status.entries[1].value, json!("off"));
    assert!(status.extensions.is_empty());
}

#[test]
fn required_flags() {
    let doc = inventory();
    let item = item(&doc);
    assert!(item.property("sku").unwrap().required);
    assert!(!item.property("price").unwrap().required);
}
