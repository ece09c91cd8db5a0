//! Shared types for the per-repo symbol index. Defined here
//! rather than in `cpi_java` so that `cpi_index` can persist/load a
//! [`SymbolIndex`] without depending on the parser that builds it.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// HTTP verb a route was declared with; `Request` covers a bare
/// `@RequestMapping` with no explicit `method =`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpVerb {
    Get,
    Post,
    Put,
    Delete,
    Patch,
    Request,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiEntry {
    pub route: String,
    pub verb: HttpVerb,
    pub file: String,
    pub line: u32,
}

/// The kind of dependency-injection annotation that introduced an RPC site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InjectionKind {
    Dubbo,
    SpringDi,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RpcEntry {
    /// Simple or fully-qualified type name of the injected interface.
    pub interface: String,
    pub file: String,
    pub line: u32,
    pub kind: InjectionKind,
}

/// Marks a class/interface as a remote-call surface, so C3 knows to also
/// check `api_map`/`rpc_map` rather than only `class_map` for a given FQN.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemoteKind {
    Feign { client_name: String },
    DubboService,
}

/// Per-file metadata retained so the usage tracer can re-scan a file's text
/// against import rules without re-parsing the whole repo.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FileMeta {
    pub package: String,
    /// simple name -> imported FQN
    pub imports_explicit: BTreeMap<String, String>,
    /// package prefixes imported via `import pkg.*;`
    pub imports_wildcard: Vec<String>,
}

/// Per-repository symbol index produced by the indexer and persisted by the
/// index cache keyed on `(repo_root, commit_hash)`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SymbolIndex {
    /// FQN -> file path, relative to repo root.
    pub class_map: BTreeMap<String, String>,
    /// Simple class name -> set of FQNs sharing that name (disambiguation, U2).
    pub simple_name_index: BTreeMap<String, BTreeSet<String>>,
    /// Route -> API entries (a route may be declared more than once).
    pub api_map: BTreeMap<String, Vec<ApiEntry>>,
    /// Interface simple name -> injection sites.
    pub rpc_map: BTreeMap<String, Vec<RpcEntry>>,
    /// FQN -> remote-call marker, populated for `@FeignClient`/`@DubboService` types.
    pub remote_interfaces: BTreeMap<String, RemoteKind>,
    /// file path -> package/imports, used by the usage tracer.
    pub file_meta: BTreeMap<String, FileMeta>,
    pub files_scanned: BTreeSet<String>,
    pub commit_hash: String,
}

impl SymbolIndex {
    pub fn new(commit_hash: impl Into<String>) -> Self {
        Self {
            commit_hash: commit_hash.into(),
            ..Default::default()
        }
    }

    pub fn insert_class(&mut self, fqn: &str, file: &str) {
        self.class_map.insert(fqn.to_string(), file.to_string());
        if let Some((_, simple)) = fqn.rsplit_once('.') {
            self.simple_name_index
                .entry(simple.to_string())
                .or_default()
                .insert(fqn.to_string());
        } else {
            self.simple_name_index
                .entry(fqn.to_string())
                .or_default()
                .insert(fqn.to_string());
        }
    }

    pub fn simple_name(fqn: &str) -> &str {
        fqn.rsplit_once('.').map(|(_, s)| s).unwrap_or(fqn)
    }
}
