use log::{debug, info};

use super::{
    NamingContext, OpenApi30, OpenApi31, Session, Swagger2, VersionAdapter, deserialize_field,
    version_of,
};
use crate::config::ParseContext;
use crate::error::{NormalizeError, ParseError, RepositoryError};
use crate::ir::{Document, Info, ModelKind, ModelOrigin, ModelRef, SecurityRequirement, Tag};
use crate::repository::{Repository, Source};
use crate::tree::{NodeId, NodeRef, Tree};

const ADAPTERS: [&dyn VersionAdapter; 3] = [&Swagger2, &OpenApi30, &OpenApi31];

/// The adapter for a document's dialect.
pub fn detect(doc: NodeRef<'_>) -> Result<&'static dyn VersionAdapter, ParseError> {
    ADAPTERS
        .into_iter()
        .find(|adapter| adapter.is_supported(doc))
        .ok_or_else(|| {
            let version = version_of(doc, "openapi")
                .or_else(|| version_of(doc, "swagger"))
                .unwrap_or_else(|| "unknown".to_string());
            ParseError::UnsupportedVersion(version)
        })
}

/// Normalize a resolved document into the IR.
pub(crate) fn assemble(
    tree: &Tree,
    root: NodeId,
    context: &mut ParseContext,
) -> Result<Document, ParseError> {
    let doc = tree.view(root);
    let adapter = detect(doc)?;
    info!("normalizing {} document", adapter.label());

    let info: Info = match doc.get("info") {
        Some(info) => deserialize_field(info, "info")?,
        None => return Err(ParseError::MissingField("info".to_string())),
    };

    let mut session = Session::new(context);

    if let Some(schemas) = adapter.schemas(doc) {
        for (name, schema) in schemas.entries() {
            let alias = doc.tree().is_reference_slot(schemas.id(), name);
            named_schema(adapter, &mut session, name, schema, alias)?;
        }
    }

    let default_security: Vec<SecurityRequirement> = match doc.get("security") {
        Some(security) => deserialize_field(security, "security")?,
        None => Vec::new(),
    };

    let mut paths = Vec::new();
    for (pattern, item) in doc.get("paths").into_iter().flat_map(NodeRef::entries) {
        if !session.context.options.includes(pattern) {
            debug!("skipping path {pattern}");
            continue;
        }
        if let Some(dangling) = item.unresolved() {
            session.skip_unresolved(
                [pattern],
                format!("unresolved reference {}, path skipped", dangling.target),
            );
            continue;
        }
        paths.extend(adapter.normalize_path(&mut session, doc, pattern, item, &default_security)?);
    }

    let servers = adapter.servers(doc)?;
    let tags: Vec<Tag> = match doc.get("tags") {
        Some(tags) => deserialize_field(tags, "tags")?,
        None => Vec::new(),
    };
    let security_schemes = adapter.security_schemes(&mut session, doc)?;

    let models = session
        .repository
        .get_all(&[ModelKind::Object, ModelKind::Enum]);
    let entities = session.repository.into_models()?;
    info!(
        "normalized {} models, {} paths, {} entities",
        models.len(),
        paths.len(),
        entities.len()
    );

    Ok(Document {
        version: adapter.version(),
        info,
        models,
        paths,
        servers,
        tags,
        security_schemes,
        entities,
    })
}

/// One entry of the named schema map. A schema already reached through a
/// reference keeps its entity, which takes the map's name unless it already
/// carries a name written in the document. An entry that is itself a
/// reference only lends its name until the target's own entry is reached.
fn named_schema(
    adapter: &dyn VersionAdapter,
    session: &mut Session<'_>,
    name: &str,
    schema: NodeRef<'_>,
    alias: bool,
) -> Result<(), ParseError> {
    if !schema.is_overlay() {
        if let Some(handle) = session.repository.handle_of(Source::Schema(schema.canonical())) {
            if !alias {
                rename(&mut session.repository, handle, name)?;
            }
            return Ok(());
        }
    }
    let naming = if alias {
        NamingContext::schema(name).member()
    } else {
        NamingContext::schema(name)
    };
    match adapter.normalize_schema(session, schema, &naming) {
        Ok(_) => Ok(()),
        Err(NormalizeError::UnresolvedReference(target)) => {
            session.skip_unresolved(
                [name],
                format!("unresolved reference {target}, schema skipped"),
            );
            Ok(())
        }
        Err(err) => Err(err.into()),
    }
}

fn rename(repository: &mut Repository, handle: ModelRef, name: &str) -> Result<(), RepositoryError> {
    // A nullable schema's entity is `inner | null`; the name belongs to inner.
    if let Some(inner) = repository.nullable_inner(handle) {
        return rename(repository, inner, name);
    }
    let def = repository.get_mut(handle)?;
    if def.name().is_some() && !def.name_is_original() {
        def.rename(name, ModelOrigin::Schema);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::ir::{Combinator, Document, ModelDef};
    use crate::parse::from_yaml;

    fn parse(schemas: &str) -> Document {
        let source = format!(
            "openapi: 3.0.0\ninfo:\n  title: Names\n  version: \"1\"\npaths: {{}}\ncomponents:\n  schemas:\n{schemas}"
        );
        let output = from_yaml(&source).unwrap();
        assert!(output.diagnostics.is_empty(), "{:?}", output.diagnostics);
        output.document
    }

    fn names(doc: &Document) -> Vec<&str> {
        doc.referenceable_models().map(|m| m.name()).collect()
    }

    #[test]
    fn union_members_keep_their_own_names() {
        let doc = parse(
            r##"
    Owner:
      type: object
      properties:
        pet:
          $ref: "#/components/schemas/Pet"
    Pet:
      oneOf:
        - $ref: "#/components/schemas/Cat"
        - $ref: "#/components/schemas/Dog"
    Cat:
      type: object
      properties:
        meows:
          type: boolean
    Dog:
      type: object
      properties:
        barks:
          type: boolean
"##,
        );
        assert_eq!(names(&doc), vec!["Owner", "Cat", "Dog"]);
        let pet = doc
            .model(doc.find_model("Owner").unwrap())
            .as_object()
            .unwrap()
            .property("pet")
            .unwrap()
            .def;
        let union = doc.model(pet).as_extended().unwrap();
        assert_eq!(union.combinator, Combinator::Or);
        assert_eq!(
            union.members,
            vec![doc.find_model("Cat").unwrap(), doc.find_model("Dog").unwrap()]
        );
    }

    #[test]
    fn nullable_schema_reached_early_takes_its_map_name() {
        let doc = parse(
            r##"
    Owner:
      type: object
      properties:
        pet:
          $ref: "#/components/schemas/Pet"
    Pet:
      type: object
      nullable: true
      properties:
        name:
          type: string
"##,
        );
        assert_eq!(names(&doc), vec!["Owner", "Pet"]);
        let pet = doc.model(doc.find_model("Pet").unwrap());
        assert!(pet.name_is_original());
    }

    #[test]
    fn first_map_name_wins() {
        let doc = parse(
            r##"
    Pet:
      type: object
      properties:
        name:
          type: string
    Animal:
      $ref: "#/components/schemas/Pet"
"##,
        );
        assert_eq!(names(&doc), vec!["Pet"]);
    }

    #[test]
    fn alias_lends_its_name_until_the_target_entry() {
        let doc = parse(
            r##"
    Holder:
      type: object
      properties:
        item:
          $ref: "#/components/schemas/Alias"
    Alias:
      $ref: "#/components/schemas/Target"
    Target:
      type: object
      properties:
        id:
          type: integer
"##,
        );
        assert_eq!(names(&doc), vec!["Holder", "Target"]);
        let target = doc.find_model("Target").unwrap();
        assert!(matches!(doc.model(target), ModelDef::Object(_)));
    }
}
