//! Resolves references to a changed symbol inside a single
//! already-indexed repository.

use crate::lexer::{enclosing_unescaped_string_literal, find_type_token};
use cpi_api::symbol::SymbolIndex;
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Abstracts file content lookup so tests can run against an in-memory tree
/// without touching disk; production always reads the materialized worktree.
pub trait FileReader: Send + Sync {
    fn read(&self, relative_path: &str) -> Option<String>;
}

pub struct FsFileReader {
    pub root: PathBuf,
}

impl FsFileReader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl FileReader for FsFileReader {
    fn read(&self, relative_path: &str) -> Option<String> {
        std::fs::read_to_string(self.root.join(relative_path)).ok()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UsageKind {
    /// Explicit, wildcard, or same-package type-token reference (U1-U3).
    TypeReference,
    /// Field injected via `@DubboReference`/`@Reference`/`@Autowired`/`@Resource` (U4).
    Injection(cpi_api::InjectionKind),
}

#[derive(Debug, Clone)]
pub struct Usage {
    pub path: String,
    pub line: u32,
    pub snippet: String,
    pub kind: UsageKind,
}

#[derive(Debug, Clone)]
pub struct ApiCall {
    pub path: String,
    pub line: u32,
    pub snippet: String,
    pub route: String,
}

/// Rule applicable to a file for a given `(pkg, simple)` symbol, or `None`
/// if the file has no import/package reason to reference it.
///
/// U2 consults `simple_name_index` to rule out wildcard resolution that's
/// genuinely ambiguous: if another class with the same simple name lives in
/// a package the file also wildcard-imports, a bare `simple` reference in
/// that file can't be pinned to `fqn` without real type inference.
fn applicable_rule(index: &SymbolIndex, meta: &cpi_api::FileMeta, pkg: &str, simple: &str, fqn: &str) -> bool {
    if meta.imports_explicit.get(simple).map(|v| v.as_str()) == Some(fqn) {
        return true; // U1
    }
    let wildcard_hit = meta.imports_wildcard.iter().any(|p| p == pkg);
    let shadowed = meta.imports_explicit.contains_key(simple);
    if wildcard_hit && !shadowed {
        let ambiguous = index
            .simple_name_index
            .get(simple)
            .map(|candidates| {
                candidates.iter().any(|other| {
                    other != fqn
                        && meta
                            .imports_wildcard
                            .iter()
                            .any(|p| other.rsplit_once('.').map(|(other_pkg, _)| other_pkg == p).unwrap_or(false))
                })
            })
            .unwrap_or(false);
        if !ambiguous {
            return true; // U2
        }
    }
    if meta.package == pkg {
        return true; // U3
    }
    false
}

pub fn find_usages(index: &SymbolIndex, fqn: &str, reader: &dyn FileReader) -> Vec<Usage> {
    let simple = SymbolIndex::simple_name(fqn);
    let pkg = fqn.rsplit_once('.').map(|(p, _)| p).unwrap_or("");
    let mut by_line: BTreeMap<(String, u32), Usage> = BTreeMap::new();

    for (path, meta) in &index.file_meta {
        if !applicable_rule(index, meta, pkg, simple, fqn) {
            continue;
        }
        let Some(contents) = reader.read(path) else {
            continue;
        };
        for (idx, line) in contents.lines().enumerate() {
            let trimmed = line.trim_start();
            if trimmed.starts_with("package ") || trimmed.starts_with("import ") {
                continue;
            }
            if find_type_token(line, simple).is_some() {
                by_line.insert(
                    (path.clone(), (idx + 1) as u32),
                    Usage {
                        path: path.clone(),
                        line: (idx + 1) as u32,
                        snippet: line.trim().to_string(),
                        kind: UsageKind::TypeReference,
                    },
                );
            }
        }
    }

    // U4: annotation-driven injection sites already captured at index time.
    if let Some(entries) = index.rpc_map.get(simple) {
        for entry in entries {
            by_line.insert(
                (entry.file.clone(), entry.line),
                Usage {
                    path: entry.file.clone(),
                    line: entry.line,
                    snippet: format!("@{:?} {} injection", entry.kind, entry.interface),
                    kind: UsageKind::Injection(entry.kind),
                },
            );
        }
    }

    by_line.into_values().collect()
}

const ROUTE_CALL_MARKERS: &[&str] = &[
    "getForObject",
    "getForEntity",
    "postForObject",
    "postForEntity",
    "exchange",
    ".uri(",
];

fn route_segments_match(literal: &str, route: &str) -> bool {
    let norm = |s: &str| -> Vec<String> {
        s.split('/')
            .filter(|seg| !seg.is_empty())
            .map(|seg| {
                if seg.starts_with('{') && seg.ends_with('}') {
                    "{}".to_string()
                } else {
                    seg.to_string()
                }
            })
            .collect()
    };
    let a = norm(literal);
    let b = norm(route);
    a.len() == b.len()
        && a.iter().zip(b.iter()).all(|(x, y)| x == y || x == "{}" || y == "{}")
}

/// Scans `index`'s files for RestTemplate/WebClient literal calls against
/// `route`, plus any locally declared API entry matching `route` (e.g. a
/// Feign client interface re-declaring the same mapping).
pub fn find_api_callers(index: &SymbolIndex, route: &str, reader: &dyn FileReader) -> Vec<ApiCall> {
    let mut out = Vec::new();

    if let Some(entries) = index.api_map.get(route) {
        for entry in entries {
            out.push(ApiCall {
                path: entry.file.clone(),
                line: entry.line,
                snippet: format!("{:?} {}", entry.verb, entry.route),
                route: entry.route.clone(),
            });
        }
    }

    for path in &index.files_scanned {
        let Some(contents) = reader.read(path) else {
            continue;
        };
        for (idx, line) in contents.lines().enumerate() {
            if !ROUTE_CALL_MARKERS.iter().any(|m| line.contains(m)) {
                continue;
            }
            let Some(quote_start) = line.find('"') else {
                continue;
            };
            let Some(literal) = enclosing_unescaped_string_literal(line, quote_start + 1) else {
                continue;
            };
            if route_segments_match(literal, route) {
                out.push(ApiCall {
                    path: path.clone(),
                    line: (idx + 1) as u32,
                    snippet: line.trim().to_string(),
                    route: route.to_string(),
                });
            }
        }
    }

    out
}

pub struct InMemoryFileReader {
    files: BTreeMap<String, String>,
}

impl InMemoryFileReader {
    pub fn new(files: BTreeMap<String, String>) -> Self {
        Self { files }
    }
}

impl FileReader for InMemoryFileReader {
    fn read(&self, relative_path: &str) -> Option<String> {
        self.files.get(relative_path).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cpi_api::symbol::{HttpVerb, InjectionKind, RpcEntry};

    fn index_with_file(path: &str, package: &str, wildcard: &[&str], explicit: &[(&str, &str)]) -> SymbolIndex {
        let mut index = SymbolIndex::new("abc");
        let mut meta = cpi_api::FileMeta {
            package: package.to_string(),
            ..Default::default()
        };
        for w in wildcard {
            meta.imports_wildcard.push(w.to_string());
        }
        for (k, v) in explicit {
            meta.imports_explicit.insert(k.to_string(), v.to_string());
        }
        index.file_meta.insert(path.to_string(), meta);
        index
    }

    #[test]
    fn explicit_import_triggers_type_reference_usage() {
        let index = index_with_file(
            "PointManager.java",
            "com.example.provider",
            &[],
            &[("PointClient", "com.example.client.PointClient")],
        );
        let reader = InMemoryFileReader::new(BTreeMap::from([(
            "PointManager.java".to_string(),
            "private PointClient pointClient;\nvoid run() { pointClient.batchUpdatePoints(ids); }\n".to_string(),
        )]));
        let usages = find_usages(&index, "com.example.client.PointClient", &reader);
        // Type-token scanning finds the declaration; call sites reference the
        // lowercase variable, not the capitalized type, so they aren't matched
        // without real type inference, which is out of scope here.
        assert_eq!(usages.len(), 1);
        assert!(usages.iter().all(|u| u.kind == UsageKind::TypeReference));
    }

    #[test]
    fn wildcard_import_ambiguous_with_sibling_wildcard_is_ignored() {
        let mut index = index_with_file(
            "X.java",
            "com.example.other",
            &["com.example.client", "com.example.legacy"],
            &[],
        );
        index.insert_class("com.example.client.PointClient", "PointClient.java");
        index.insert_class("com.example.legacy.PointClient", "LegacyPointClient.java");
        let reader = InMemoryFileReader::new(BTreeMap::from([("X.java".to_string(), "PointClient p;\n".to_string())]));
        let usages = find_usages(&index, "com.example.client.PointClient", &reader);
        assert!(usages.is_empty());
    }

    #[test]
    fn wildcard_import_unambiguous_despite_other_simple_name_hit() {
        let mut index = index_with_file("X.java", "com.example.other", &["com.example.client"], &[]);
        index.insert_class("com.example.client.PointClient", "PointClient.java");
        index.insert_class("com.example.unrelated.PointClient", "UnrelatedPointClient.java");
        let reader = InMemoryFileReader::new(BTreeMap::from([("X.java".to_string(), "PointClient p;\n".to_string())]));
        let usages = find_usages(&index, "com.example.client.PointClient", &reader);
        assert_eq!(usages.len(), 1);
    }

    #[test]
    fn wildcard_import_shadowed_by_explicit_is_ignored() {
        let index = index_with_file(
            "X.java",
            "com.example.other",
            &["com.example.client"],
            &[("PointClient", "com.example.other.PointClient")],
        );
        let reader = InMemoryFileReader::new(BTreeMap::from([(
            "X.java".to_string(),
            "PointClient p;\n".to_string(),
        )]));
        let usages = find_usages(&index, "com.example.client.PointClient", &reader);
        assert!(usages.is_empty());
    }

    #[test]
    fn injection_site_deduplicates_with_type_reference_on_same_line() {
        let mut index = index_with_file("PointManager.java", "com.example.provider", &[], &[]);
        index.rpc_map.insert(
            "PointClient".to_string(),
            vec![RpcEntry {
                interface: "PointClient".to_string(),
                file: "PointManager.java".to_string(),
                line: 1,
                kind: InjectionKind::SpringDi,
            }],
        );
        let reader = InMemoryFileReader::new(BTreeMap::from([(
            "PointManager.java".to_string(),
            "@Resource private PointClient pointClient;\n".to_string(),
        )]));
        let usages = find_usages(&index, "com.example.client.PointClient", &reader);
        assert_eq!(usages.len(), 1);
        assert_eq!(usages[0].kind, UsageKind::Injection(InjectionKind::SpringDi));
    }

    #[test]
    fn route_segments_tolerate_placeholders() {
        assert!(route_segments_match("/users/{id}", "/users/{userId}"));
        assert!(!route_segments_match("/users/{id}", "/accounts/{id}"));
    }

    #[test]
    fn find_api_callers_matches_resttemplate_literal() {
        let mut index = SymbolIndex::new("abc");
        index.files_scanned.insert("Client.java".to_string());
        let reader = InMemoryFileReader::new(BTreeMap::from([(
            "Client.java".to_string(),
            "restTemplate.getForObject(\"/users/{id}\", User.class, id);\n".to_string(),
        )]));
        let calls = find_api_callers(&index, "/users/{userId}", &reader);
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].route, "/users/{userId}");
    }

    #[test]
    fn http_verb_annotation_map_round_trips() {
        assert_eq!(HttpVerb::Get, HttpVerb::Get);
    }
}
