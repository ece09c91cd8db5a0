//! Diff parsing for the analysis orchestrator: `git diff --name-status`
//! output into a change list, and unified-diff hunk headers into post-image
//! line ranges so changed methods can be recovered by intersecting with
//! [`cpi_java::MethodSpan`] ranges.

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeType {
    Added,
    Modified,
    Deleted,
    Renamed,
}

#[derive(Debug, Clone)]
pub struct FileChange {
    pub path: String,
    pub change_type: ChangeType,
    pub old_path: Option<String>,
}

/// Parses `git diff --name-status -M <a>..<b>` output.
pub fn parse_name_status(raw: &str) -> Vec<FileChange> {
    let mut changes = Vec::new();
    for line in raw.lines() {
        if line.trim().is_empty() {
            continue;
        }
        let parts: Vec<&str> = line.split('\t').collect();
        if parts.is_empty() {
            continue;
        }
        let status_code = parts[0].chars().next().unwrap_or(' ');
        let (change_type, path, old_path) = match status_code {
            'A' if parts.len() >= 2 => (ChangeType::Added, parts[1].to_string(), None),
            'M' if parts.len() >= 2 => (ChangeType::Modified, parts[1].to_string(), None),
            'D' if parts.len() >= 2 => (ChangeType::Deleted, parts[1].to_string(), None),
            'R' if parts.len() >= 3 => (
                ChangeType::Renamed,
                parts[2].to_string(),
                Some(parts[1].to_string()),
            ),
            _ => continue,
        };
        changes.push(FileChange {
            path,
            change_type,
            old_path,
        });
    }
    changes
}

/// Post-image `(start_line, end_line)` ranges touched by each `@@ -a,b +c,d @@`
/// hunk header in a unified diff. Context lines count; a hunk with no `+`
/// count (pure deletion) contributes no range.
pub fn hunk_post_image_ranges(unified_diff: &str) -> Vec<(u32, u32)> {
    let mut ranges = Vec::new();
    for line in unified_diff.lines() {
        if !line.starts_with("@@ ") {
            continue;
        }
        let Some(plus_part) = line.split("+").nth(1) else {
            continue;
        };
        let spec = plus_part.split(' ').next().unwrap_or("");
        let mut fields = spec.splitn(2, ',');
        let Some(start) = fields.next().and_then(|s| s.parse::<u32>().ok()) else {
            continue;
        };
        let len = fields.next().and_then(|s| s.parse::<u32>().ok()).unwrap_or(1);
        if len == 0 {
            continue;
        }
        ranges.push((start, start + len - 1));
    }
    ranges
}

/// True if any changed-method span overlaps any hunk range.
pub fn methods_touched_by_ranges(
    methods: &[cpi_java::MethodSpan],
    ranges: &[(u32, u32)],
) -> Vec<String> {
    methods
        .iter()
        .filter(|m| {
            ranges
                .iter()
                .any(|(start, end)| m.start_line <= *end && *start <= m.end_line)
        })
        .map(|m| m.name.clone())
        .collect()
}
