//! Builds the fixed-order per-file prompt, validates the LLM's reply shape
//! with one retry, and merges a reply (or a retry failure) into an
//! [`AnalysisReport`].

use crate::llm::{LlmClient, LlmReply, Prompt};
use cpi_api::{AnalysisReport, Error, ErrorCode, Impact, ImpactType};

/// A code-snippet window around one cited line.
#[derive(Debug, Clone)]
pub struct CodeSnippet {
    pub target_line: u32,
    pub target_code: String,
    pub context_before: Vec<String>,
    pub context_after: Vec<String>,
}

/// Builds a `±k`-line window around `line` (1-based) from `file_contents`.
/// A missing file or out-of-range line yields a placeholder window rather
/// than an error — the window is elided and `target_code` carries a
/// placeholder.
pub fn snippet_window(file_contents: Option<&str>, line: u32, k: u32) -> CodeSnippet {
    let placeholder = |text: &str| CodeSnippet {
        target_line: line,
        target_code: text.to_string(),
        context_before: Vec::new(),
        context_after: Vec::new(),
    };
    let Some(contents) = file_contents else {
        return placeholder("<file unavailable>");
    };
    let lines: Vec<&str> = contents.lines().collect();
    let idx = line.saturating_sub(1) as usize;
    let Some(target) = lines.get(idx) else {
        return placeholder("<line unavailable>");
    };
    let before_start = idx.saturating_sub(k as usize);
    let after_end = (idx + 1 + k as usize).min(lines.len());
    CodeSnippet {
        target_line: line,
        target_code: (*target).to_string(),
        context_before: lines[before_start..idx].iter().map(|s| s.to_string()).collect(),
        context_after: lines[idx + 1..after_end].iter().map(|s| s.to_string()).collect(),
    }
}

fn append_citation(
    text: &mut String,
    impact: &Impact,
    snippet_source: &dyn Fn(&str, &str) -> Option<String>,
    k: u32,
    indent: &str,
) {
    let contents = snippet_source(&impact.project, &impact.file);
    let snippet = snippet_window(contents.as_deref(), impact.line, k);
    text.push_str(&format!("{indent}{}:{} {}\n", impact.file, impact.line, impact.snippet));
    for line in &snippet.context_before {
        text.push_str(&format!("{indent}  {line}\n"));
    }
    text.push_str(&format!("{indent}> {}\n", snippet.target_code));
    for line in &snippet.context_after {
        text.push_str(&format!("{indent}  {line}\n"));
    }
}

/// Assembles the fixed-order per-file prompt: change intent, unified
/// diff, primary downstream findings grouped by file, then cross-project
/// impacts grouped by project then by type. A section with no entries is
/// omitted entirely.
pub fn assemble_prompt(
    change_intent_stub: &str,
    unified_diff: &str,
    downstream: &[Impact],
    cross_project: &[Impact],
    snippet_source: &dyn Fn(&str, &str) -> Option<String>,
    context_lines: u32,
) -> Prompt {
    let mut text = String::new();
    text.push_str("Change intent: ");
    text.push_str(change_intent_stub);
    text.push_str("\n\nUnified diff:\n");
    text.push_str(unified_diff);
    text.push('\n');

    if !downstream.is_empty() {
        text.push_str("\nPrimary downstream findings:\n");
        let mut files: Vec<&str> = downstream.iter().map(|i| i.file.as_str()).collect();
        files.sort();
        files.dedup();

        for file in files {
            text.push_str(&format!("  {file}:\n"));
            for impact in downstream.iter().filter(|i| i.file == file) {
                append_citation(&mut text, impact, snippet_source, context_lines, "    ");
            }
        }
    }

    if !cross_project.is_empty() {
        text.push_str("\nCross-project impacts:\n");
        let mut projects: Vec<&str> = cross_project.iter().map(|i| i.project.as_str()).collect();
        projects.sort();
        projects.dedup();

        for project in projects {
            text.push_str(&format!("  Project {project}:\n"));
            for impact_type in [ImpactType::ClassReference, ImpactType::ApiCall, ImpactType::RpcReference] {
                let matching: Vec<&Impact> = cross_project
                    .iter()
                    .filter(|i| i.project == project && i.impact_type == impact_type)
                    .collect();
                if matching.is_empty() {
                    continue;
                }
                text.push_str(&format!("    {:?}:\n", impact_type));
                for impact in matching {
                    append_citation(&mut text, impact, snippet_source, context_lines, "      ");
                }
            }
        }
    }

    Prompt { text }
}

/// Calls the LLM, retrying once with a clarifying instruction if the first
/// reply is missing required fields.
pub async fn complete_with_retry(client: &dyn LlmClient, prompt: &Prompt) -> Result<LlmReply, Error> {
    let reply = client.complete(prompt).await?;
    if reply.has_required_fields() {
        return Ok(reply);
    }

    let retry_prompt = Prompt {
        text: format!(
            "{}\n\nYour previous reply was missing a required field (risk_level or change_intent). Reply again with both present.",
            prompt.text
        ),
    };
    let retried = client.complete(&retry_prompt).await?;
    if retried.has_required_fields() {
        return Ok(retried);
    }

    Err(Error::new(
        ErrorCode::LlmError,
        "LLM reply missing required fields after one retry",
    ))
}

/// Merges a validated reply into a persisted [`AnalysisReport`].
#[allow(clippy::too_many_arguments)]
pub fn reply_to_report(
    task_id: &str,
    project_name: &str,
    file_name: &str,
    diff_content: &str,
    source_project: &str,
    reply: LlmReply,
    downstream: Vec<Impact>,
    cross_project: Vec<Impact>,
) -> AnalysisReport {
    AnalysisReport {
        task_id: task_id.to_string(),
        project_name: project_name.to_string(),
        file_name: file_name.to_string(),
        diff_content: diff_content.to_string(),
        risk_level: reply.risk_level,
        change_intent: reply.change_intent,
        downstream_dependency: downstream,
        cross_service_impact: cross_project,
        functional_impact: reply.functional_impact,
        test_strategy: reply.test_strategy,
        source_project: source_project.to_string(),
        failed: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::FixedLlmClient;
    use cpi_api::ImpactType;

    fn impact(project: &str, impact_type: ImpactType, file: &str, line: u32) -> Impact {
        Impact {
            project: project.to_string(),
            impact_type,
            file: file.to_string(),
            line,
            snippet: "private PointClient pointClient;".to_string(),
            detail: "type reference".to_string(),
            api: None,
        }
    }

    #[test]
    fn snippet_window_centers_on_target_line() {
        let contents = "a\nb\nc\nd\ne\n";
        let snippet = snippet_window(Some(contents), 3, 1);
        assert_eq!(snippet.target_code, "c");
        assert_eq!(snippet.context_before, vec!["b".to_string()]);
        assert_eq!(snippet.context_after, vec!["d".to_string()]);
    }

    #[test]
    fn snippet_window_missing_file_is_placeholder() {
        let snippet = snippet_window(None, 3, 2);
        assert_eq!(snippet.target_code, "<file unavailable>");
        assert!(snippet.context_before.is_empty());
    }

    #[test]
    fn assemble_prompt_omits_empty_sections() {
        let prompt = assemble_prompt("adds a field", "diff --git a/Foo.java b/Foo.java\n", &[], &[], &|_, _| None, 2);
        assert!(!prompt.text.contains("Cross-project impacts"));
        assert!(!prompt.text.contains("Primary downstream findings"));
    }

    #[test]
    fn assemble_prompt_groups_downstream_by_file() {
        let downstream = vec![
            impact("ucenter", ImpactType::ClassReference, "Zeta.java", 10),
            impact("ucenter", ImpactType::ClassReference, "Alpha.java", 5),
        ];
        let prompt = assemble_prompt("x", "diff", &downstream, &[], &|_, _| None, 2);
        let alpha_pos = prompt.text.find("Alpha.java:").unwrap();
        let zeta_pos = prompt.text.find("Zeta.java:").unwrap();
        assert!(alpha_pos < zeta_pos);
    }

    #[test]
    fn assemble_prompt_groups_cross_project_by_project_then_type() {
        let cross = vec![
            impact("b-repo", ImpactType::ApiCall, "Caller.java", 10),
            impact("a-repo", ImpactType::ClassReference, "Manager.java", 5),
        ];
        let prompt = assemble_prompt("x", "diff", &[], &cross, &|_, _| None, 2);
        let a_pos = prompt.text.find("Project a-repo").unwrap();
        let b_pos = prompt.text.find("Project b-repo").unwrap();
        assert!(a_pos < b_pos);
    }

    #[tokio::test]
    async fn complete_with_retry_succeeds_first_try() {
        let reply = LlmReply {
            risk_level: Some(cpi_api::RiskLevel::Low),
            change_intent: Some("adds a field".to_string()),
            downstream_dependency_notes: None,
            cross_service_impact: None,
            functional_impact: None,
            test_strategy: Vec::new(),
        };
        let client = FixedLlmClient { reply };
        let prompt = Prompt { text: String::new() };
        let result = complete_with_retry(&client, &prompt).await.unwrap();
        assert!(result.has_required_fields());
    }

    #[tokio::test]
    async fn complete_with_retry_fails_when_reply_never_has_required_fields() {
        let reply = LlmReply {
            risk_level: None,
            change_intent: None,
            downstream_dependency_notes: None,
            cross_service_impact: None,
            functional_impact: None,
            test_strategy: Vec::new(),
        };
        let client = FixedLlmClient { reply };
        let prompt = Prompt { text: String::new() };
        let err = complete_with_retry(&client, &prompt).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::LlmError);
    }
}
