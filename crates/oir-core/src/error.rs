use thiserror::Error;

use crate::ir::ModelRef;
use crate::repository::Source;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("unsupported location: {0}")]
    UnsupportedLocation(String),

    #[error("failed to read {location}: {source}")]
    Io {
        location: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to fetch {location}: {source}")]
    Http {
        location: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("failed to fetch {location}: HTTP {status}")]
    Status { location: String, status: u16 },

    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("resource not found: {0}")]
    NotFound(String),
}

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("failed to parse YAML: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),

    #[error("failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unsupported OpenAPI version: {0}")]
    UnsupportedVersion(String),

    #[error("missing required field: {0}")]
    MissingField(String),

    #[error(transparent)]
    Load(#[from] LoadError),

    #[error("{adapter} adapter cannot map HTTP method `{method}`")]
    UnsupportedMethod {
        adapter: &'static str,
        method: String,
    },

    #[error("invalid path pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    #[error("invalid {field}: {source}")]
    InvalidField {
        field: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("unresolved reference: {0}")]
    UnresolvedReference(String),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Why a single `$ref` could not be resolved. These never abort a parse; they
/// are reported as diagnostics and the reference is left dangling.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error("unresolved reference: {0}")]
    RefTargetNotFound(String),

    #[error("circular reference detected: {0}")]
    CircularRef(String),

    #[error("invalid reference format: {0}")]
    InvalidRefFormat(String),
}

#[derive(Debug, Error)]
pub enum NormalizeError {
    #[error("unresolved reference: {0}")]
    UnresolvedReference(String),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl From<NormalizeError> for ParseError {
    fn from(err: NormalizeError) -> Self {
        match err {
            NormalizeError::Repository(e) => ParseError::Repository(e),
            NormalizeError::UnresolvedReference(target) => ParseError::UnresolvedReference(target),
        }
    }
}

/// Repository invariant violations. These indicate a bug in the normalizer,
/// not a problem with the input document.
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("source {0:?} is already registered")]
    DuplicateSource(Source),

    #[error("no entity registered for source {0:?}")]
    MissingSource(Source),

    #[error("no entity stored under {0}")]
    MissingEntity(ModelRef),

    #[error("entity {0} was already constructed")]
    AlreadyFilled(ModelRef),

    #[error("entity {0} was reserved but never constructed")]
    Unfilled(ModelRef),
}
