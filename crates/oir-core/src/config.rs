use std::fs;
use std::path::Path;

use regex::Regex;
use serde::Deserialize;

use crate::diagnostics::Diagnostics;
use crate::error::ParseError;

/// Top-level project configuration loaded from `.oir.yaml`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OirConfig {
    pub input: String,
    /// Where `oir dump` writes the IR. Stdout when unset.
    pub output: Option<String>,
    pub format: OutputFormat,
    /// Skip TLS certificate verification for `https://` documents.
    pub insecure: bool,
    /// Regexes a path pattern must match (any) to be normalized.
    pub include_paths: Vec<String>,
    /// Regexes excluding path patterns. Ignored when `include_paths` is set.
    pub exclude_paths: Vec<String>,
}

impl Default for OirConfig {
    fn default() -> Self {
        Self {
            input: "openapi.yaml".to_string(),
            output: None,
            format: OutputFormat::Yaml,
            insecure: false,
            include_paths: Vec::new(),
            exclude_paths: Vec::new(),
        }
    }
}

/// Serialization format for IR output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    #[default]
    Yaml,
    Json,
}

/// Default config file name.
pub const CONFIG_FILE_NAME: &str = ".oir.yaml";

/// Load config from a YAML file. Returns `None` if the file doesn't exist.
pub fn load_config(path: &Path) -> Result<Option<OirConfig>, String> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)
        .map_err(|e| format!("failed to read config {}: {}", path.display(), e))?;
    let config: OirConfig = serde_yaml_ng::from_str(&content)
        .map_err(|e| format!("failed to parse config {}: {}", path.display(), e))?;
    Ok(Some(config))
}

/// Generate the default config file content.
pub fn default_config_content() -> &'static str {
    r#"# oir configuration
input: openapi.yaml
# output: ir.yaml      # where `oir dump` writes (stdout when unset)
format: yaml           # yaml | json
insecure: false        # skip TLS verification for https:// documents

# Path patterns are regexes tested against each path key, e.g. "^/pets".
# When include_paths is non-empty, exclude_paths is ignored.
include_paths: []
exclude_paths: []
"#
}

/// Options for one parse session.
#[derive(Debug, Clone, Default)]
pub struct ParseOptions {
    pub insecure: bool,
    pub include_paths: Vec<Regex>,
    pub exclude_paths: Vec<Regex>,
}

impl ParseOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insecure(mut self, insecure: bool) -> Self {
        self.insecure = insecure;
        self
    }

    pub fn include<I, S>(mut self, patterns: I) -> Result<Self, ParseError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for pattern in patterns {
            self.include_paths.push(Regex::new(pattern.as_ref())?);
        }
        Ok(self)
    }

    pub fn exclude<I, S>(mut self, patterns: I) -> Result<Self, ParseError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for pattern in patterns {
            self.exclude_paths.push(Regex::new(pattern.as_ref())?);
        }
        Ok(self)
    }

    pub fn from_config(config: &OirConfig) -> Result<Self, ParseError> {
        ParseOptions::new()
            .insecure(config.insecure)
            .include(&config.include_paths)?
            .exclude(&config.exclude_paths)
    }

    /// Whether a path pattern takes part in normalization.
    pub fn includes(&self, pattern: &str) -> bool {
        if !self.include_paths.is_empty() {
            self.include_paths.iter().any(|re| re.is_match(pattern))
        } else if !self.exclude_paths.is_empty() {
            !self.exclude_paths.iter().any(|re| re.is_match(pattern))
        } else {
            true
        }
    }
}

/// Everything threaded through one parse session: the options it was started
/// with and the diagnostics it has collected so far.
#[derive(Debug, Default)]
pub struct ParseContext {
    pub options: ParseOptions,
    pub diagnostics: Diagnostics,
}

impl ParseContext {
    pub fn new(options: ParseOptions) -> Self {
        Self {
            options,
            diagnostics: Diagnostics::new(),
        }
    }
}
