//! Single-file Java parsing: the heart of the symbol indexer.
//!
//! Works line by line with a bracket-depth counter and the scanning helpers
//! in [`crate::lexer`]. Deliberately shallow — no grammar, no semantic type
//! resolution — matching the heuristic style of a framework-annotation
//! scanner rather than a compiler front end.

use crate::lexer::{brace_delta, first_string_arg, leading_annotation};
use cpi_api::symbol::{ApiEntry, FileMeta, HttpVerb, InjectionKind, RemoteKind, RpcEntry};
use std::collections::BTreeMap;

const API_ANNOTATIONS: &[(&str, HttpVerb)] = &[
    ("GetMapping", HttpVerb::Get),
    ("PostMapping", HttpVerb::Post),
    ("PutMapping", HttpVerb::Put),
    ("DeleteMapping", HttpVerb::Delete),
    ("PatchMapping", HttpVerb::Patch),
    ("RequestMapping", HttpVerb::Request),
];

const INJECTION_ANNOTATIONS: &[(&str, InjectionKind)] = &[
    ("DubboReference", InjectionKind::Dubbo),
    ("Reference", InjectionKind::Dubbo),
    ("Autowired", InjectionKind::SpringDi),
    ("Resource", InjectionKind::SpringDi),
];

#[derive(Debug, Clone)]
pub struct MethodSpan {
    pub name: String,
    pub start_line: u32,
    pub end_line: u32,
}

/// Everything the indexer pulls out of a single `.java` file's post-image.
#[derive(Debug, Clone, Default)]
pub struct ParsedFile {
    pub package: String,
    pub primary_class: Option<String>,
    pub api_entries: Vec<ApiEntry>,
    pub rpc_entries: Vec<RpcEntry>,
    pub remote_kind: Option<RemoteKind>,
    pub meta: FileMeta,
    pub methods: Vec<MethodSpan>,
}

impl ParsedFile {
    pub fn fqn(&self) -> Option<String> {
        self.primary_class.as_ref().map(|c| {
            if self.package.is_empty() {
                c.clone()
            } else {
                format!("{}.{}", self.package, c)
            }
        })
    }
}

fn normalize_path(base: &str, sub: &str) -> String {
    let joined = format!("{}/{}", base.trim_end_matches('/'), sub.trim_start_matches('/'));
    let mut out = String::with_capacity(joined.len());
    let mut prev_slash = false;
    for c in joined.chars() {
        if c == '/' {
            if prev_slash {
                continue;
            }
            prev_slash = true;
        } else {
            prev_slash = false;
        }
        out.push(c);
    }
    if out.is_empty() {
        "/".to_string()
    } else {
        out
    }
}

/// Extracts `name` from `public ReturnType name(args)`-style declarations.
/// Returns `None` for control-flow keywords that also use parentheses.
fn method_name_before_paren(line: &str) -> Option<String> {
    const KEYWORDS: &[&str] = &[
        "if", "for", "while", "switch", "catch", "synchronized", "return", "new",
    ];
    let paren = line.find('(')?;
    let before = &line[..paren];
    let trimmed = before.trim_end();
    let name_end = trimmed.len();
    let name_start = trimmed
        .rfind(|c: char| !(c.is_alphanumeric() || c == '_' || c == '$'))
        .map(|i| i + 1)
        .unwrap_or(0);
    if name_start >= name_end {
        return None;
    }
    let name = &trimmed[name_start..name_end];
    if name.is_empty() || KEYWORDS.contains(&name) || name.chars().next().unwrap().is_numeric() {
        return None;
    }
    // Needs at least one more token before it (a return type or a modifier),
    // or a preceding annotation/visibility keyword making it look declarative.
    let has_prefix = !trimmed[..name_start].trim().is_empty();
    if !has_prefix {
        return None;
    }
    Some(name.to_string())
}

pub fn parse_file(contents: &str) -> ParsedFile {
    let mut parsed = ParsedFile::default();
    let mut depth: i32 = 0;
    let mut pending_annotations: Vec<String> = Vec::new();
    let mut class_base_path = String::new();
    let mut class_is_controller = false;
    let mut feign_name: Option<String> = None;
    let mut is_dubbo_service = false;
    let mut method_stack: Vec<(String, u32, i32)> = Vec::new();

    for (idx, raw_line) in contents.lines().enumerate() {
        let line_no = (idx + 1) as u32;
        let line = raw_line;
        let depth_before = depth;

        if let Some(pkg_rest) = line.trim_start().strip_prefix("package ") {
            let pkg = pkg_rest.trim().trim_end_matches(';').trim();
            if !pkg.is_empty() {
                parsed.package = pkg.to_string();
                parsed.meta.package = pkg.to_string();
            }
        } else if let Some(import_rest) = line.trim_start().strip_prefix("import ") {
            let import_path = import_rest.trim().trim_end_matches(';').trim();
            let import_path = import_path.strip_prefix("static ").unwrap_or(import_path).trim();
            if let Some(prefix) = import_path.strip_suffix(".*") {
                parsed.meta.imports_wildcard.push(prefix.to_string());
            } else if let Some((_, simple)) = import_path.rsplit_once('.') {
                parsed
                    .meta
                    .imports_explicit
                    .insert(simple.to_string(), import_path.to_string());
            }
        } else if let Some(name) = leading_annotation(line) {
            if name == "FeignClient" {
                feign_name = first_string_arg(line).or_else(|| Some("unknown".to_string()));
            }
            if name == "DubboService" {
                is_dubbo_service = true;
            }
            pending_annotations.push(name.to_string());
            if let Some((kind_name, verb)) = API_ANNOTATIONS.iter().find(|(n, _)| *n == name) {
                if let Some(path) = first_string_arg(line) {
                    if parsed.primary_class.is_none() && depth_before == 0 {
                        // class-level mapping appears before the class keyword
                        // on a following line; remember it once class is seen.
                        class_base_path = path;
                    } else if depth_before >= 1 {
                        if class_is_controller {
                            let route = normalize_path(&class_base_path, &path);
                            parsed.api_entries.push(ApiEntry {
                                route,
                                verb: *verb,
                                file: String::new(),
                                line: line_no,
                            });
                        }
                    } else {
                        class_base_path = path;
                    }
                }
                let _ = kind_name;
            }
            if name == "RestController" || name == "Controller" {
                class_is_controller = true;
            }
        } else if depth_before == 0 {
            if let Some((kw_end, kind_word)) = find_type_keyword(line) {
                if parsed.primary_class.is_none() {
                    if let Some(name) = extract_decl_name(&line[kw_end..]) {
                        parsed.primary_class = Some(name);
                        let _ = kind_word;
                    }
                }
            }
        }

        // Field-level injection: an injection annotation was seen on a
        // previous line (possibly this one) and this line declares a field.
        if pending_annotations
            .iter()
            .any(|a| INJECTION_ANNOTATIONS.iter().any(|(n, _)| n == a))
            && leading_annotation(line).is_none()
        {
            if let Some((type_name, _field_name)) = extract_field_decl(line) {
                for (ann_name, kind) in INJECTION_ANNOTATIONS {
                    if pending_annotations.iter().any(|a| a == ann_name) {
                        parsed.rpc_entries.push(RpcEntry {
                            interface: type_name.clone(),
                            file: String::new(),
                            line: line_no,
                            kind: *kind,
                        });
                        break;
                    }
                }
            }
        }

        if leading_annotation(line).is_none() && !line.trim().is_empty() {
            if let Some(name) = method_name_before_paren(line) {
                if depth_before >= 1 && (line.contains('{') || line.trim_end().ends_with(';')) {
                    let opens = line.contains('{');
                    if opens {
                        method_stack.push((name, line_no, depth_before));
                    }
                }
            }
            if depth_before == 0 {
                pending_annotations.clear();
            } else if !line.trim_start().starts_with('@') {
                pending_annotations.clear();
            }
        }

        depth += brace_delta(line);

        while let Some((_, _, target_depth)) = method_stack.last() {
            if depth <= *target_depth {
                let (name, start, _) = method_stack.pop().unwrap();
                parsed.methods.push(MethodSpan {
                    name,
                    start_line: start,
                    end_line: line_no,
                });
            } else {
                break;
            }
        }
    }

    if let Some(name) = feign_name {
        parsed.remote_kind = Some(RemoteKind::Feign { client_name: name });
    } else if is_dubbo_service {
        parsed.remote_kind = Some(RemoteKind::DubboService);
    }

    parsed
}

fn find_type_keyword(line: &str) -> Option<(usize, &'static str)> {
    for kw in ["class ", "interface ", "enum "] {
        if let Some(pos) = line.find(kw) {
            let before = &line[..pos];
            if before.trim_end().ends_with(|c: char| c.is_whitespace()) || before.trim().is_empty() || before.ends_with(' ') {
                return Some((pos + kw.len(), kw.trim()));
            }
        }
    }
    None
}

fn extract_decl_name(rest: &str) -> Option<String> {
    let end = rest
        .find(|c: char| !(c.is_alphanumeric() || c == '_' || c == '$'))
        .unwrap_or(rest.len());
    if end == 0 {
        None
    } else {
        Some(rest[..end].to_string())
    }
}

/// Heuristic field declaration matcher: `[modifiers] Type name;` or
/// `[modifiers] Type name = ...;`. Returns `(Type, name)`.
fn extract_field_decl(line: &str) -> Option<(String, String)> {
    let trimmed = line.trim().trim_end_matches(';').trim();
    if trimmed.is_empty() || trimmed.contains('(') {
        return None;
    }
    let trimmed = trimmed.split('=').next().unwrap_or(trimmed).trim();
    let tokens: Vec<&str> = trimmed.split_whitespace().collect();
    if tokens.len() < 2 {
        return None;
    }
    const MODIFIERS: &[&str] = &["private", "public", "protected", "final", "static", "volatile"];
    let filtered: Vec<&str> = tokens.into_iter().filter(|t| !MODIFIERS.contains(t)).collect();
    if filtered.len() < 2 {
        return None;
    }
    let name = filtered[filtered.len() - 1];
    let ty = filtered[filtered.len() - 2];
    let ty = ty.split('<').next().unwrap_or(ty);
    Some((ty.to_string(), name.to_string()))
}
