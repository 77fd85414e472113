use std::fmt;

use log::warn;
use serde::Serialize;

/// A recoverable anomaly found while normalizing a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    /// Where the anomaly was found, outermost first, e.g. `["User", "address"]`.
    pub scope: Vec<String>,
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.scope.is_empty() {
            write!(f, "{}", self.message)
        } else {
            write!(f, "{}: {}", self.scope.join(" > "), self.message)
        }
    }
}

/// Write-only sink for warnings. Every entry is also logged.
#[derive(Debug, Default)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn warn<S: Into<String>>(&mut self, scope: impl IntoIterator<Item = S>, message: impl Into<String>) {
        let diagnostic = Diagnostic {
            scope: scope.into_iter().map(Into::into).collect(),
            message: message.into(),
        };
        warn!("{diagnostic}");
        self.entries.push(diagnostic);
    }

    pub fn entries(&self) -> &[Diagnostic] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn into_entries(self) -> Vec<Diagnostic> {
        self.entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_scope_and_message() {
        let mut diagnostics = Diagnostics::new();
        diagnostics.warn(["User", "address"], "Unsupported schema");
        diagnostics.warn(Vec::<String>::new(), "bare");

        assert_eq!(diagnostics.len(), 2);
        assert_eq!(diagnostics.entries()[0].scope, vec!["User", "address"]);
        assert_eq!(
            diagnostics.entries()[0].to_string(),
            "User > address: Unsupported schema"
        );
        assert_eq!(diagnostics.entries()[1].to_string(), "bare");
    }
}
