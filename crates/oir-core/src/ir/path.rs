use std::fmt;

use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;

use super::document::SecurityRequirement;
use super::model::ModelRef;

/// HTTP method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
    Patch,
    Options,
    Head,
    Trace,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Options => "OPTIONS",
            HttpMethod::Head => "HEAD",
            HttpMethod::Trace => "TRACE",
        }
    }

    /// Parse a lowercase path item key.
    pub fn from_key(key: &str) -> Option<Self> {
        Some(match key {
            "get" => HttpMethod::Get,
            "post" => HttpMethod::Post,
            "put" => HttpMethod::Put,
            "delete" => HttpMethod::Delete,
            "patch" => HttpMethod::Patch,
            "options" => HttpMethod::Options,
            "head" => HttpMethod::Head,
            "trace" => HttpMethod::Trace,
            _ => return None,
        })
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One operation of the document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PathDef {
    pub url_pattern: String,
    pub method: HttpMethod,
    /// `operationId`, or a name derived from method and route.
    pub operation_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_path_parameters: Option<ModelRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_query_parameters: Option<ModelRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_header_parameters: Option<ModelRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_cookie_parameters: Option<ModelRef>,
    pub request_bodies: Vec<RequestBody>,
    pub responses: Vec<PathResponse>,
    pub tags: Vec<String>,
    pub deprecated: bool,
    /// Path item summary first, then the operation's.
    pub summaries: Vec<String>,
    pub descriptions: Vec<String>,
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub extensions: IndexMap<String, Value>,
    pub security: Vec<SecurityRequirement>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RequestBody {
    pub media: String,
    pub content: ModelRef,
    pub required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PathResponse {
    /// Status code as written, including `default` and ranges like `4XX`.
    pub code: String,
    pub media: String,
    pub content: ModelRef,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn method_keys_round_trip() {
        for key in ["get", "post", "put", "delete", "patch", "options", "head", "trace"] {
            let method = HttpMethod::from_key(key).unwrap();
            assert_eq!(method.as_str().to_lowercase(), key);
        }
        assert_eq!(HttpMethod::from_key("parameters"), None);
        assert_eq!(HttpMethod::from_key("GET"), None);
    }
}
