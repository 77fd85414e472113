//! Resource loading: location string → raw bytes.

use std::collections::HashMap;
use std::fs;

use log::debug;
use reqwest::blocking::Client;

use crate::error::LoadError;

/// A strategy able to fetch documents from some kind of location.
pub trait ResourceLoader {
    fn is_supported(&self, location: &str) -> bool;
    fn load(&self, location: &str) -> Result<Vec<u8>, LoadError>;
}

pub(crate) fn has_scheme(location: &str) -> bool {
    match location.split_once("://") {
        Some((scheme, _)) => {
            !scheme.is_empty()
                && scheme
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
        }
        None => false,
    }
}

/// Local filesystem paths and `file://` URLs.
#[derive(Debug, Default, Clone, Copy)]
pub struct FileLoader;

impl ResourceLoader for FileLoader {
    fn is_supported(&self, location: &str) -> bool {
        location.starts_with("file://") || !has_scheme(location)
    }

    fn load(&self, location: &str) -> Result<Vec<u8>, LoadError> {
        let path = location.strip_prefix("file://").unwrap_or(location);
        debug!("reading {path}");
        fs::read(path).map_err(|source| LoadError::Io {
            location: location.to_string(),
            source,
        })
    }
}

/// `http://` or `https://` locations, fetched with a blocking client.
#[derive(Debug, Clone)]
pub struct HttpLoader {
    scheme: &'static str,
    client: Client,
}

impl HttpLoader {
    pub fn http() -> Result<Self, LoadError> {
        Ok(Self {
            scheme: "http://",
            client: Client::builder().build().map_err(LoadError::Client)?,
        })
    }

    /// `insecure` disables certificate verification.
    pub fn https(insecure: bool) -> Result<Self, LoadError> {
        let client = Client::builder()
            .danger_accept_invalid_certs(insecure)
            .build()
            .map_err(LoadError::Client)?;
        Ok(Self {
            scheme: "https://",
            client,
        })
    }
}

impl ResourceLoader for HttpLoader {
    fn is_supported(&self, location: &str) -> bool {
        location
            .get(..self.scheme.len())
            .is_some_and(|prefix| prefix.eq_ignore_ascii_case(self.scheme))
    }

    fn load(&self, location: &str) -> Result<Vec<u8>, LoadError> {
        debug!("fetching {location}");
        let http_err = |source| LoadError::Http {
            location: location.to_string(),
            source,
        };
        let response = self.client.get(location).send().map_err(http_err)?;
        let status = response.status();
        if !status.is_success() {
            return Err(LoadError::Status {
                location: location.to_string(),
                status: status.as_u16(),
            });
        }
        let bytes = response.bytes().map_err(http_err)?;
        Ok(bytes.to_vec())
    }
}

/// Documents held in memory, keyed by location.
#[derive(Debug, Default, Clone)]
pub struct MemoryLoader {
    documents: HashMap<String, Vec<u8>>,
}

impl MemoryLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, location: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        self.insert(location, content);
        self
    }

    pub fn insert(&mut self, location: impl Into<String>, content: impl Into<Vec<u8>>) {
        self.documents.insert(location.into(), content.into());
    }
}

impl ResourceLoader for MemoryLoader {
    fn is_supported(&self, _location: &str) -> bool {
        true
    }

    fn load(&self, location: &str) -> Result<Vec<u8>, LoadError> {
        self.documents
            .get(location)
            .cloned()
            .ok_or_else(|| LoadError::NotFound(location.to_string()))
    }
}

/// Ordered loaders; the first one supporting a location handles it.
#[derive(Default)]
pub struct LoaderChain {
    loaders: Vec<Box<dyn ResourceLoader>>,
}

impl LoaderChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, loader: impl ResourceLoader + 'static) -> Self {
        self.loaders.push(Box::new(loader));
        self
    }

    /// `http://`, then `https://`, then the filesystem.
    pub fn standard(insecure: bool) -> Result<Self, LoadError> {
        Ok(Self::new()
            .with(HttpLoader::http()?)
            .with(HttpLoader::https(insecure)?)
            .with(FileLoader))
    }
}

impl ResourceLoader for LoaderChain {
    fn is_supported(&self, location: &str) -> bool {
        self.loaders.iter().any(|l| l.is_supported(location))
    }

    fn load(&self, location: &str) -> Result<Vec<u8>, LoadError> {
        self.loaders
            .iter()
            .find(|l| l.is_supported(location))
            .ok_or_else(|| LoadError::UnsupportedLocation(location.to_string()))?
            .load(location)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn file_loader_accepts_paths_and_file_urls() {
        assert!(FileLoader.is_supported("specs/openapi.yaml"));
        assert!(FileLoader.is_supported("/abs/openapi.yaml"));
        assert!(FileLoader.is_supported("file:///abs/openapi.yaml"));
        assert!(!FileLoader.is_supported("https://example.com/openapi.yaml"));
        assert!(!FileLoader.is_supported("ftp://example.com/openapi.yaml"));
    }

    #[test]
    fn file_loader_reads_bytes() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"openapi: 3.0.0").unwrap();
        let location = file.path().to_str().unwrap().to_string();

        assert_eq!(FileLoader.load(&location).unwrap(), b"openapi: 3.0.0");
        let url = format!("file://{location}");
        assert_eq!(FileLoader.load(&url).unwrap(), b"openapi: 3.0.0");
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = FileLoader.load("/definitely/not/here.yaml").unwrap_err();
        assert!(matches!(err, LoadError::Io { .. }));
    }

    #[test]
    fn http_loaders_split_by_scheme() {
        let http = HttpLoader::http().unwrap();
        let https = HttpLoader::https(false).unwrap();
        assert!(http.is_supported("http://localhost/spec.json"));
        assert!(!http.is_supported("https://localhost/spec.json"));
        assert!(https.is_supported("HTTPS://localhost/spec.json"));
        assert!(!https.is_supported("spec.json"));
    }

    #[test]
    fn chain_picks_first_supporting_loader() {
        let chain = LoaderChain::new()
            .with(HttpLoader::https(false).unwrap())
            .with(MemoryLoader::new().with("spec.yaml", "a: 1"));
        assert_eq!(chain.load("spec.yaml").unwrap(), b"a: 1");

        let bare = LoaderChain::new().with(HttpLoader::http().unwrap());
        assert!(matches!(
            bare.load("spec.yaml"),
            Err(LoadError::UnsupportedLocation(_))
        ));
    }

    #[test]
    fn memory_loader_reports_missing_documents() {
        let loader = MemoryLoader::new();
        assert!(matches!(loader.load("x.yaml"), Err(LoadError::NotFound(_))));
    }
}
