use std::fs;

use oir_core::error::{LoadError, ParseError};
use oir_core::ir::ModelDef;
use oir_core::{ParseOptions, parse};

const SPLIT_ROOT: &str = r##"
openapi: 3.0.0
info:
  title: Split
  version: "1"
paths:
  /pets:
    get:
      operationId: listPets
      responses:
        "200":
          description: ok
          content:
            application/json:
              schema:
                $ref: "schemas/pet.yaml#/Pet"
components:
  schemas:
    Pet:
      $ref: "schemas/pet.yaml#/Pet"
"##;

const SPLIT_PET: &str = r##"
Pet:
  type: object
  properties:
    owner:
      $ref: "../common.yaml#/Owner"
    friend:
      $ref: "#/Pet"
"##;

const SPLIT_COMMON: &str = r##"
Owner:
  type: object
  properties:
    name:
      type: string
"##;

fn split_dir() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir(dir.path().join("schemas")).unwrap();
    fs::write(dir.path().join("openapi.yaml"), SPLIT_ROOT).unwrap();
    fs::write(dir.path().join("schemas/pet.yaml"), SPLIT_PET).unwrap();
    fs::write(dir.path().join("common.yaml"), SPLIT_COMMON).unwrap();
    dir
}

#[test]
fn external_documents_resolve_relative_to_their_referrer() {
    let dir = split_dir();
    let location = dir.path().join("openapi.yaml");
    let output = parse::from_location(location.to_str().unwrap(), ParseOptions::default())
        .expect("split document should parse");
    assert!(output.diagnostics.is_empty(), "{:?}", output.diagnostics);

    let doc = output.document;
    let pet = doc.find_model("Pet").unwrap();
    let list = doc.find_path("/pets", "get").unwrap();
    assert_eq!(list.responses[0].content, pet);

    let object = doc.model(pet).as_object().unwrap();
    // A reference local to the external document points back into it.
    assert_eq!(object.property("friend").unwrap().def, pet);
    let owner = doc.model(object.property("owner").unwrap().def);
    assert!(owner.as_object().unwrap().property("name").is_some());
}

#[test]
fn missing_external_document_is_fatal() {
    let dir = split_dir();
    fs::remove_file(dir.path().join("common.yaml")).unwrap();
    let location = dir.path().join("openapi.yaml");
    let err = parse::from_location(location.to_str().unwrap(), ParseOptions::default())
        .unwrap_err();
    assert!(matches!(err, ParseError::Load(LoadError::Io { .. })), "{err}");
}

#[test]
fn missing_root_document_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let location = dir.path().join("nope.yaml");
    let err = parse::from_location(location.to_str().unwrap(), ParseOptions::default())
        .unwrap_err();
    assert!(matches!(err, ParseError::Load(_)));
}

#[test]
fn dangling_property_is_skipped_and_reported() {
    let output = parse::from_yaml(
        r##"
openapi: 3.0.0
info:
  title: Dangling
  version: "1"
paths: {}
components:
  schemas:
    Thing:
      type: object
      properties:
        ok:
          type: string
        broken:
          $ref: "#/components/schemas/Missing"
"##,
    )
    .unwrap();

    let doc = output.document;
    let thing = doc
        .model(doc.find_model("Thing").unwrap())
        .as_object()
        .unwrap();
    let names: Vec<&str> = thing.properties.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["ok"]);

    // Reported once, where the reference was written.
    let messages: Vec<String> = output.diagnostics.iter().map(ToString::to_string).collect();
    assert_eq!(
        messages,
        vec![
            "components > schemas > Thing > properties > broken: unresolved reference: #/components/schemas/Missing",
        ]
    );
}

#[test]
fn reference_chains_collapse_onto_the_definition() {
    let output = parse::from_yaml(
        r##"
openapi: 3.0.0
info:
  title: Chain
  version: "1"
paths: {}
components:
  schemas:
    A:
      $ref: "#/components/schemas/B"
    B:
      $ref: "#/components/schemas/C"
    C:
      type: object
      properties:
        value:
          type: string
"##,
    )
    .unwrap();
    let doc = output.document;
    assert!(output.diagnostics.is_empty());

    let names: Vec<&str> = doc.referenceable_models().map(|m| m.name()).collect();
    assert_eq!(names, vec!["C"]);
}

#[test]
fn circular_aliases_are_reported_not_fatal() {
    let output = parse::from_yaml(
        r##"
openapi: 3.0.0
info:
  title: Loop
  version: "1"
paths: {}
components:
  schemas:
    A:
      $ref: "#/components/schemas/B"
    B:
      $ref: "#/components/schemas/A"
    Ok:
      type: string
"##,
    )
    .unwrap();

    assert!(
        output
            .diagnostics
            .iter()
            .any(|d| d.message.starts_with("circular reference detected"))
    );
    let doc = output.document;
    assert_eq!(doc.referenceable_models().count(), 0);
    assert!(
        doc.entities
            .iter()
            .any(|(_, def)| matches!(def, ModelDef::Simple(_)))
    );
}
