//! Directory-wide symbol indexer: walks a materialized repo root,
//! parses every `.java` file, and assembles a [`SymbolIndex`].

use crate::parse::parse_file;
use cpi_api::{Error, ErrorCode, SymbolIndex};
use std::path::{Path, PathBuf};

const SKIP_DIR_NAMES: &[&str] = &[
    ".git", "target", "build", "node_modules", ".idea", ".gradle", "out",
];

fn is_test_relative_path(path: &str) -> bool {
    path.contains("/src/test/") || path.starts_with("src/test/")
}

/// Deterministically enumerate every `.java` file under `root`, skipping
/// build output and test directories — test sources are not indexed.
pub fn collect_java_files(root: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut out = Vec::new();
    collect_into(root, root, &mut out)?;
    out.sort();
    Ok(out)
}

fn collect_into(root: &Path, dir: &Path, out: &mut Vec<PathBuf>) -> std::io::Result<()> {
    let mut entries: Vec<_> = std::fs::read_dir(dir)?.filter_map(|e| e.ok()).collect();
    entries.sort_by_key(|e| e.file_name());
    for entry in entries {
        let path = entry.path();
        let file_type = entry.file_type()?;
        if file_type.is_dir() {
            let name = entry.file_name();
            let name = name.to_string_lossy();
            if name.starts_with('.') || SKIP_DIR_NAMES.contains(&name.as_ref()) {
                continue;
            }
            collect_into(root, &path, out)?;
        } else if file_type.is_file() && path.extension().map(|e| e == "java").unwrap_or(false) {
            let relative = path.strip_prefix(root).unwrap_or(&path);
            if !is_test_relative_path(&relative.to_string_lossy().replace('\\', "/")) {
                out.push(path);
            }
        }
    }
    Ok(())
}

/// Builds a [`SymbolIndex`] for `repo_root`, tagging it with `commit_hash`
/// (the caller resolves HEAD via the git backend before calling this).
///
/// A file that fails to read is logged by the caller via the returned
/// per-file error list; it never aborts the overall build.
pub struct IndexBuildResult {
    pub index: SymbolIndex,
    pub file_errors: Vec<(String, Error)>,
}

pub fn build_index(repo_root: &Path, commit_hash: &str) -> std::io::Result<IndexBuildResult> {
    let files = collect_java_files(repo_root)?;
    let mut index = SymbolIndex::new(commit_hash);
    let mut file_errors = Vec::new();

    for path in files {
        let relative = path
            .strip_prefix(repo_root)
            .unwrap_or(&path)
            .to_string_lossy()
            .replace('\\', "/");

        let contents = match std::fs::read_to_string(&path) {
            Ok(c) => c,
            Err(e) => {
                file_errors.push((
                    relative.clone(),
                    Error::new(ErrorCode::ParseError, format!("unreadable file: {e}")),
                ));
                continue;
            }
        };

        let parsed = parse_file(&contents);
        index.files_scanned.insert(relative.clone());
        index.file_meta.insert(relative.clone(), parsed.meta.clone());

        let Some(fqn) = parsed.fqn() else {
            file_errors.push((
                relative,
                Error::new(ErrorCode::ParseError, "no class/interface/enum declaration found"),
            ));
            continue;
        };
        index.insert_class(&fqn, &relative);

        for mut entry in parsed.api_entries {
            entry.file = relative.clone();
            index.api_map.entry(entry.route.clone()).or_default().push(entry);
        }
        for mut entry in parsed.rpc_entries {
            entry.file = relative.clone();
            index
                .rpc_map
                .entry(entry.interface.clone())
                .or_default()
                .push(entry);
        }
        if let Some(kind) = parsed.remote_kind {
            index.remote_interfaces.insert(fqn, kind);
        }
    }

    Ok(IndexBuildResult { index, file_errors })
}
