//! Clones or refreshes each related repo onto disk under a bounded worker
//! pool. A worker's failure never cancels its siblings — the caller gets
//! back a partitioned `{ok, fail}` result and decides whether the task can
//! still proceed.

use cpi_api::{Error, ProjectRelation};
use cpi_git::{CheckoutResult, GitBackend};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

#[derive(Debug, Clone)]
pub struct MaterializedRepo {
    pub name: String,
    pub path: PathBuf,
    pub resolved_commit: String,
    pub branch: String,
}

#[derive(Debug, Clone)]
pub struct FailedRepo {
    pub name: String,
    pub reason: String,
}

#[derive(Debug, Default)]
pub struct MaterializeOutcome {
    pub ok: Vec<MaterializedRepo>,
    pub fail: Vec<FailedRepo>,
}

/// Clones (if `target` has no `.git`) or refreshes (otherwise) a single repo
/// at `branch`. Shared by the single-entry main-repo path and the bounded
/// worker pool below.
pub async fn materialize_one(
    git: &dyn GitBackend,
    branch: &str,
    url: &str,
    target: &Path,
    branch_fallback: bool,
    timeout: Duration,
) -> Result<CheckoutResult, Error> {
    let is_repo = git.is_repo(target, timeout).await.unwrap_or(false);
    if is_repo {
        git.refresh_at_branch(target, branch, timeout).await
    } else {
        git.clone_at_branch(url, branch, target, branch_fallback, timeout).await
    }
}

/// Materializes every `active` entry in `related` under `workspace/<name>`,
/// bounded to `pool_size` concurrent Git operations.
pub async fn materialize(
    git: Arc<dyn GitBackend>,
    related: &[ProjectRelation],
    workspace: &Path,
    pool_size: usize,
    branch_fallback: bool,
    timeout: Duration,
) -> MaterializeOutcome {
    let semaphore = Arc::new(Semaphore::new(pool_size.max(1)));
    let mut set = JoinSet::new();

    for rel in related {
        if !rel.active {
            continue;
        }
        let git = git.clone();
        let sem = semaphore.clone();
        let name = rel.related_name.clone();
        let url = rel.related_git_url.clone();
        let branch = rel.related_branch.clone();
        let target = workspace.join(&name);

        set.spawn(async move {
            let _permit = sem.acquire_owned().await.expect("semaphore never closed");
            let result = materialize_one(git.as_ref(), &branch, &url, &target, branch_fallback, timeout).await;
            (name, target, result)
        });
    }

    let mut outcome = MaterializeOutcome::default();
    while let Some(joined) = set.join_next().await {
        match joined {
            Ok((name, target, Ok(checkout))) => outcome.ok.push(MaterializedRepo {
                name,
                path: target,
                resolved_commit: checkout.resolved_commit,
                branch: checkout.branch,
            }),
            Ok((name, _target, Err(e))) => outcome.fail.push(FailedRepo {
                name,
                reason: e.to_string(),
            }),
            Err(join_err) => outcome.fail.push(FailedRepo {
                name: "<unknown>".to_string(),
                reason: join_err.to_string(),
            }),
        }
    }

    outcome.ok.sort_by(|a, b| a.name.cmp(&b.name));
    outcome.fail.sort_by(|a, b| a.name.cmp(&b.name));
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use cpi_git::StubGitBackend;

    fn relation(name: &str, active: bool) -> ProjectRelation {
        ProjectRelation {
            main_name: "main".to_string(),
            main_git_url: "git@example.com/main.git".to_string(),
            related_name: name.to_string(),
            related_git_url: format!("git@example.com/{name}.git"),
            related_branch: "master".to_string(),
            active,
        }
    }

    #[tokio::test]
    async fn inactive_relations_are_skipped() {
        let git: Arc<dyn GitBackend> = Arc::new(StubGitBackend);
        let workspace = std::env::temp_dir().join(format!("cpi_materializer_test_{}", std::process::id()));
        let related = vec![relation("skipped", false)];
        let outcome = materialize(git, &related, &workspace, 4, false, Duration::from_secs(5)).await;
        assert!(outcome.ok.is_empty());
        assert!(outcome.fail.is_empty());
    }

    #[tokio::test]
    async fn stub_backend_failures_are_partitioned_into_fail() {
        let git: Arc<dyn GitBackend> = Arc::new(StubGitBackend);
        let workspace = std::env::temp_dir().join(format!("cpi_materializer_test2_{}", std::process::id()));
        let related = vec![relation("a", true), relation("b", true)];
        let outcome = materialize(git, &related, &workspace, 2, false, Duration::from_secs(5)).await;
        assert_eq!(outcome.ok.len(), 0);
        assert_eq!(outcome.fail.len(), 2);
        assert_eq!(outcome.fail[0].name, "a");
        assert_eq!(outcome.fail[1].name, "b");
    }
}
