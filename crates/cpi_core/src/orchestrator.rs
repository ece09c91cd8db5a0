//! Ties materialization, diffing, per-file symbol recovery, cross-project
//! tracing, and prompt assembly into one task run. Single-threaded with
//! respect to one task; the caller is expected to run distinct tasks on
//! distinct workers.

use crate::diff::{self, ChangeType};
use crate::materializer::{self, MaterializedRepo};
use crate::prompt;
use crate::store::TaskStore;
use crate::tracer::{self, MultiProjectTracer};
use crate::EngineConfig;
use cpi_api::{AnalysisReport, AnalysisTask, Error, ErrorCode, TaskStatus};
use cpi_git::GitBackend;
use cpi_index::IndexCache;
use cpi_java::FsFileReader;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::llm::LlmClient;

/// Checked between files and between repo workers.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }
}

/// Derives a stable, filesystem-safe repo name from a clone URL, used for
/// the main repo's workspace subdirectory (related repos get an explicit
/// `related_name` from `ProjectRelation`).
fn repo_name_from_url(url: &str) -> String {
    let trimmed = url.trim_end_matches('/').trim_end_matches(".git");
    trimmed
        .rsplit(['/', ':'])
        .next()
        .filter(|s| !s.is_empty())
        .unwrap_or("main")
        .to_string()
}

async fn log(store: &dyn TaskStore, task: &mut AnalysisTask, line: impl Into<String>) {
    let line = line.into();
    task.append_log(line.clone());
    let _ = store.append_log(&task.id, &line).await;
}

/// Runs one analysis task to completion, persisting one [`AnalysisReport`]
/// per changed `.java` file. Returns the reports that were produced; a
/// partial failure (a degraded related repo, a file that didn't parse, an
/// LLM retry exhaustion) never aborts the run.
pub async fn run(
    task: &mut AnalysisTask,
    store: &dyn TaskStore,
    git: Arc<dyn GitBackend>,
    cache: &mut IndexCache,
    llm: &dyn LlmClient,
    config: &EngineConfig,
    cancel: &CancellationToken,
) -> Result<Vec<AnalysisReport>, Error> {
    store.update_status(&task.id, TaskStatus::Processing).await?;
    task.status = TaskStatus::Processing;

    let timeout = config.git_op_timeout();
    let task_workspace = config.workspace.join(&task.id);
    let main_name = repo_name_from_url(&task.main_git_url);
    let main_root = task_workspace.join(&main_name);

    let checkout = match materializer::materialize_one(
        git.as_ref(),
        &task.target_branch,
        &task.main_git_url,
        &main_root,
        config.branch_fallback,
        timeout,
    )
    .await
    {
        Ok(c) => c,
        Err(e) => return Err(fail_task(store, task, &e).await),
    };
    log(
        store,
        task,
        format!("materialized main repo at {}", checkout.resolved_commit),
    )
    .await;

    let name_status = match git
        .diff_name_status(&main_root, &task.base_commit, &task.target_commit, timeout)
        .await
    {
        Ok(s) => s,
        Err(e) => return Err(fail_task(store, task, &e).await),
    };
    let changes = diff::parse_name_status(&name_status);

    let mut related_roots: Vec<(String, PathBuf)> = Vec::new();
    if task.enable_cross_project && !cancel.is_cancelled() {
        let pool_size = config.worker_pool_size(task.related_projects.len());
        let outcome = materializer::materialize(
            git.clone(),
            &task.related_projects,
            &task_workspace,
            pool_size,
            config.branch_fallback,
            timeout,
        )
        .await;
        for repo in &outcome.ok {
            related_roots.push((repo.name.clone(), repo.path.clone()));
        }
        for failed in &outcome.fail {
            log(
                store,
                task,
                format!("related repo {} failed to materialize: {}", failed.name, failed.reason),
            )
            .await;
        }
        log_ok_summary(store, task, &outcome.ok).await;
    }

    let tracer = MultiProjectTracer::init(git.as_ref(), cache, &related_roots, timeout).await;
    for degraded in tracer.degraded_projects() {
        log(store, task, format!("project {degraded} index degraded, excluded from trace")).await;
    }

    let main_index = match tracer::build_or_fetch_index(git.as_ref(), cache, &main_root, timeout).await {
        Ok(index) => index,
        Err(e) => return Err(fail_task(store, task, &e).await),
    };

    let mut reports = Vec::new();
    for change in &changes {
        if cancel.is_cancelled() {
            log(store, task, "task cancelled, stopping before remaining files").await;
            store.update_status(&task.id, TaskStatus::Failed).await?;
            task.status = TaskStatus::Failed;
            return Err(Error::new(ErrorCode::CancelError, "task cancelled mid-run"));
        }
        if change.change_type == ChangeType::Deleted || !change.path.ends_with(".java") {
            continue;
        }

        let report = analyze_one_file(
            task,
            &main_root,
            &main_index,
            &tracer,
            &related_roots,
            &git,
            llm,
            config,
            &change.path,
            timeout,
        )
        .await;

        let _ = store.insert_report(report.clone()).await;
        reports.push(report);
    }

    store.update_status(&task.id, TaskStatus::Completed).await?;
    task.status = TaskStatus::Completed;
    Ok(reports)
}

async fn fail_task(store: &dyn TaskStore, task: &mut AnalysisTask, err: &Error) -> Error {
    log(store, task, format!("fatal: {err}")).await;
    let _ = store.update_status(&task.id, TaskStatus::Failed).await;
    task.status = TaskStatus::Failed;
    err.clone()
}

async fn log_ok_summary(store: &dyn TaskStore, task: &mut AnalysisTask, ok: &[MaterializedRepo]) {
    for repo in ok {
        log(
            store,
            task,
            format!("materialized related repo {} at {}", repo.name, repo.resolved_commit),
        )
        .await;
    }
}

#[allow(clippy::too_many_arguments)]
async fn analyze_one_file(
    task: &AnalysisTask,
    main_root: &Path,
    main_index: &cpi_api::SymbolIndex,
    tracer: &MultiProjectTracer,
    related_roots: &[(String, PathBuf)],
    git: &Arc<dyn GitBackend>,
    llm: &dyn LlmClient,
    config: &EngineConfig,
    path: &str,
    timeout: std::time::Duration,
) -> AnalysisReport {
    let unified_diff = git
        .diff_file(main_root, &task.base_commit, &task.target_commit, path, timeout)
        .await
        .unwrap_or_default();
    let post_image = git.show_file(main_root, &task.target_commit, path, timeout).await.ok();

    let (fqn, changed_methods) = match &post_image {
        Some(contents) => {
            let parsed = cpi_java::parse_file(contents);
            let ranges = diff::hunk_post_image_ranges(&unified_diff);
            let methods = diff::methods_touched_by_ranges(&parsed.methods, &ranges);
            (parsed.fqn(), methods)
        }
        None => (None, Vec::new()),
    };

    let downstream: Vec<cpi_api::Impact> = match &fqn {
        Some(fqn) => {
            let reader = FsFileReader::new(main_root);
            cpi_java::find_usages(main_index, fqn, &reader)
                .into_iter()
                .map(|u| tracer::impact_from_usage("main", u))
                .collect()
        }
        None => Vec::new(),
    };

    let cross_project = match &fqn {
        Some(fqn) => tracer.find_cross_project_impacts(main_index, fqn, &changed_methods).impacts,
        None => Vec::new(),
    };

    let main_root_owned = main_root.to_path_buf();
    let related_owned: Vec<(String, PathBuf)> = related_roots.to_vec();
    let snippet_source = move |project: &str, file: &str| -> Option<String> {
        if project == "main" {
            return std::fs::read_to_string(main_root_owned.join(file)).ok();
        }
        related_owned
            .iter()
            .find(|(name, _)| name == project)
            .and_then(|(_, root)| std::fs::read_to_string(root.join(file)).ok())
            .or_else(|| std::fs::read_to_string(main_root_owned.join(file)).ok())
    };

    let change_intent_stub = format!("changes to {path}");
    let prompt = prompt::assemble_prompt(
        &change_intent_stub,
        &unified_diff,
        &downstream,
        &cross_project,
        &snippet_source,
        config.context_lines_k,
    );

    match prompt::complete_with_retry(llm, &prompt).await {
        Ok(reply) => prompt::reply_to_report(
            &task.id,
            &repo_name_from_url(&task.main_git_url),
            path,
            &unified_diff,
            "main",
            reply,
            downstream,
            cross_project,
        ),
        Err(_) => AnalysisReport::failed(
            &task.id,
            &repo_name_from_url(&task.main_git_url),
            path,
            "main",
            "LLM reply invalid after one retry",
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repo_name_from_url_strips_git_suffix_and_path() {
        assert_eq!(repo_name_from_url("git@example.com:org/pay-api.git"), "pay-api");
        assert_eq!(repo_name_from_url("https://example.com/org/pay-api"), "pay-api");
        assert_eq!(repo_name_from_url("https://example.com/org/pay-api/"), "pay-api");
    }

    #[test]
    fn cancellation_token_starts_uncancelled() {
        let token = CancellationToken::new();
        assert!(!token.is_cancelled());
        token.cancel();
        assert!(token.is_cancelled());
    }
}
