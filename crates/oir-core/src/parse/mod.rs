//! Entry points: location in, [`Document`] and diagnostics out.

use log::info;

use crate::config::{ParseContext, ParseOptions};
use crate::diagnostics::Diagnostic;
use crate::error::ParseError;
use crate::ir::Document;
use crate::load::{LoaderChain, MemoryLoader, ResourceLoader};
use crate::normalize;
use crate::resolve::RefResolver;
use crate::tree::Tree;

/// A normalized document together with everything worth warning about.
#[derive(Debug)]
pub struct ParseOutput {
    pub document: Document,
    pub diagnostics: Vec<Diagnostic>,
}

/// Parse the document at `location`, a filesystem path or an http(s) URL.
pub fn from_location(location: &str, options: ParseOptions) -> Result<ParseOutput, ParseError> {
    let loader = LoaderChain::standard(options.insecure)?;
    from_location_with(&loader, location, options)
}

/// Parse the document at `location`, fetching it and every document it
/// references through `loader`.
pub fn from_location_with(
    loader: &dyn ResourceLoader,
    location: &str,
    options: ParseOptions,
) -> Result<ParseOutput, ParseError> {
    let mut context = ParseContext::new(options);
    let mut tree = Tree::new();
    let root = {
        let mut resolver = RefResolver::new(&mut tree, loader, &mut context.diagnostics);
        resolver.load(location)?
    };
    info!("resolved {location} into {} nodes", tree.len());

    let document = normalize::assemble(&tree, root, &mut context)?;
    Ok(ParseOutput {
        document,
        diagnostics: context.diagnostics.into_entries(),
    })
}

/// Parse a self-contained YAML document.
pub fn from_yaml(input: &str) -> Result<ParseOutput, ParseError> {
    from_memory("openapi.yaml", input)
}

/// Parse a self-contained JSON document.
pub fn from_json(input: &str) -> Result<ParseOutput, ParseError> {
    from_memory("openapi.json", input)
}

fn from_memory(location: &str, input: &str) -> Result<ParseOutput, ParseError> {
    let loader = MemoryLoader::new().with(location, input);
    from_location_with(&loader, location, ParseOptions::default())
}
