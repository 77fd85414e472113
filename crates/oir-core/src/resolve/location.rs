use url::Url;

use crate::load::has_scheme;

/// Resolve `reference` against the location of the document containing it.
///
/// Local paths are joined and normalized lexically (`.` and `..` folded,
/// leading `..` kept for relative paths). As soon as either side is a URL
/// the join follows URL rules; protocol-relative `//host/path` borrows the
/// base's scheme, or `https` when the base is local.
pub fn normalize_path(reference: &str, base: &str) -> String {
    if has_scheme(reference) {
        return reference.to_string();
    }
    if let Some(rest) = reference.strip_prefix("//") {
        let scheme = Url::parse(base)
            .ok()
            .filter(|_| has_scheme(base))
            .map(|url| url.scheme().to_string())
            .unwrap_or_else(|| "https".to_string());
        return format!("{scheme}://{rest}");
    }
    if let Some(path) = base.strip_prefix("file://") {
        return format!("file://{}", normalize_path(reference, path));
    }
    if has_scheme(base) {
        if let Ok(joined) = Url::parse(base).and_then(|url| url.join(reference)) {
            return joined.to_string();
        }
    }
    if reference.starts_with('/') {
        return fold(reference);
    }
    let directory = base.rfind('/').map(|i| &base[..=i]).unwrap_or("");
    fold(&format!("{directory}{reference}"))
}

fn fold(path: &str) -> String {
    let absolute = path.starts_with('/');
    let mut parts: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => match parts.last() {
                Some(last) if *last != ".." => {
                    parts.pop();
                }
                _ if !absolute => parts.push(".."),
                _ => {}
            },
            other => parts.push(other),
        }
    }
    let joined = parts.join("/");
    if absolute {
        format!("/{joined}")
    } else {
        joined
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sibling_and_parent_directories() {
        assert_eq!(normalize_path("../swagger.json", "folder/external.json"), "swagger.json");
        assert_eq!(normalize_path("folder/external.json", "swagger.json"), "folder/external.json");
    }

    #[test]
    fn joins_table() {
        let cases = [
            ("./common.yaml", "specs/api.yaml"),
            ("../../shared/a.yaml", "specs/v1/api.yaml"),
            ("../up.yaml", "api.yaml"),
            ("/abs/a.yaml", "specs/api.yaml"),
            ("../b.yaml", "/srv/specs/api.yaml"),
            ("common.yaml", "file:///srv/specs/api.yaml"),
            ("common.yaml", "https://example.com/specs/api.yaml"),
            ("../common.yaml", "https://example.com/specs/v1/api.yaml"),
            ("//cdn.example.com/a.json", "http://example.com/api.json"),
            ("//cdn.example.com/a.json", "api.json"),
            ("https://other.io/x.json", "api.json"),
        ];
        let table = cases
            .iter()
            .map(|(reference, base)| {
                format!("{reference} @ {base} => {}", normalize_path(reference, base))
            })
            .collect::<Vec<_>>()
            .join("\n");
        insta::assert_snapshot!(table, @r"
        ./common.yaml @ specs/api.yaml => specs/common.yaml
        ../../shared/a.yaml @ specs/v1/api.yaml => shared/a.yaml
        ../up.yaml @ api.yaml => ../up.yaml
        /abs/a.yaml @ specs/api.yaml => /abs/a.yaml
        ../b.yaml @ /srv/specs/api.yaml => /srv/b.yaml
        common.yaml @ file:///srv/specs/api.yaml => file:///srv/specs/common.yaml
        common.yaml @ https://example.com/specs/api.yaml => https://example.com/specs/common.yaml
        ../common.yaml @ https://example.com/specs/v1/api.yaml => https://example.com/specs/common.yaml
        //cdn.example.com/a.json @ http://example.com/api.json => http://cdn.example.com/a.json
        //cdn.example.com/a.json @ api.json => https://cdn.example.com/a.json
        https://other.io/x.json @ api.json => https://other.io/x.json
        ");
    }
}
