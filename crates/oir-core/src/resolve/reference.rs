use percent_encoding::percent_decode_str;

use crate::error::ResolveError;

/// A parsed `$ref` value: an optional document and a JSON pointer into it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference {
    /// The `$ref` string as written.
    pub raw: String,
    /// Location of the target document, relative to the referring one.
    /// Empty for the same document.
    pub source: String,
    /// Property names / sequence indices from the target document's root.
    pub keys: Vec<String>,
}

impl Reference {
    pub fn parse(raw: &str) -> Result<Self, ResolveError> {
        let (source, fragment) = raw.split_once('#').unwrap_or((raw, ""));
        if source.is_empty() && !raw.starts_with('#') {
            return Err(ResolveError::InvalidRefFormat(raw.to_string()));
        }
        let keys = if fragment.is_empty() {
            Vec::new()
        } else if let Some(pointer) = fragment.strip_prefix('/') {
            pointer.split('/').map(decode_segment).collect()
        } else {
            return Err(ResolveError::InvalidRefFormat(raw.to_string()));
        };
        Ok(Self {
            raw: raw.to_string(),
            source: source.to_string(),
            keys,
        })
    }

    pub fn is_local(&self) -> bool {
        self.source.is_empty()
    }
}

fn decode_segment(segment: &str) -> String {
    percent_decode_str(segment)
        .decode_utf8_lossy()
        .replace("~1", "/")
        .replace("~0", "~")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_pointer() {
        let r = Reference::parse("#/components/schemas/Pet").unwrap();
        assert!(r.is_local());
        assert_eq!(r.keys, vec!["components", "schemas", "Pet"]);
    }

    #[test]
    fn external_document_with_and_without_pointer() {
        let r = Reference::parse("common.yaml#/definitions/Error").unwrap();
        assert_eq!(r.source, "common.yaml");
        assert_eq!(r.keys, vec!["definitions", "Error"]);

        let whole = Reference::parse("pet.yaml").unwrap();
        assert_eq!(whole.source, "pet.yaml");
        assert!(whole.keys.is_empty());
    }

    #[test]
    fn escaped_segments_are_decoded() {
        let r = Reference::parse("#/paths/~1pets~1{id}/get/a~0b/with%20space").unwrap();
        assert_eq!(r.keys, vec!["paths", "/pets/{id}", "get", "a~b", "with space"]);
    }

    #[test]
    fn document_root_pointer() {
        assert!(Reference::parse("#").unwrap().keys.is_empty());
    }

    #[test]
    fn malformed_references() {
        assert!(matches!(
            Reference::parse("#components/schemas/Pet"),
            Err(ResolveError::InvalidRefFormat(_))
        ));
        assert!(matches!(
            Reference::parse(""),
            Err(ResolveError::InvalidRefFormat(_))
        ));
    }
}
