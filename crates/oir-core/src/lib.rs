//! Normalizes OpenAPI 2.0, 3.0 and 3.1 documents into one intermediate
//! representation.
//!
//! A parse runs in three stages: documents are loaded and deserialized into
//! a [`tree::Tree`], every `$ref` is resolved in place by
//! [`resolve::RefResolver`], and the [`normalize`] module turns the resolved
//! tree into entities stored in a [`repository::Repository`] and assembled
//! into an [`ir::Document`].

pub mod config;
pub mod diagnostics;
pub mod error;
pub mod ir;
pub mod load;
pub mod naming;
pub mod normalize;
pub mod parse;
pub mod repository;
pub mod resolve;
pub mod tree;

pub use config::ParseOptions;
pub use diagnostics::Diagnostic;
pub use error::ParseError;
pub use ir::Document;
pub use parse::{ParseOutput, from_json, from_location, from_location_with, from_yaml};
