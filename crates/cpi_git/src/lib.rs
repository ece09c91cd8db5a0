//! Git plumbing adapter layer for the cross-project impact engine.
//!
//! Abstracts the handful of Git operations the materializer and orchestrator
//! need (clone, fetch, checkout, reset, diff, rev-parse, show) behind a
//! trait, so the core can be tested against a [`StubGitBackend`] without a
//! real `git` binary, and driven in production by [`CliBackend`], which
//! shells out to `git`.

pub mod backend;

use async_trait::async_trait;
use cpi_api::{Error, ErrorCode};
use std::path::Path;
use std::time::Duration;

pub use backend::CliBackend;

pub type Result<T> = std::result::Result<T, Error>;

/// Outcome of materializing or checking out a branch.
#[derive(Debug, Clone)]
pub struct CheckoutResult {
    pub resolved_commit: String,
    pub branch: String,
}

/// Git backend trait. Every method takes a `timeout` so callers (the
/// materializer's worker pool) can bound each invocation independently
/// (`git_op_timeout_seconds`, default 120s).
#[async_trait]
pub trait GitBackend: Send + Sync {
    async fn is_repo(&self, path: &Path, timeout: Duration) -> Result<bool>;

    /// `git clone --branch <branch> --single-branch <url> <target>`. If
    /// `branch` does not exist on the remote and `fallback` is `true`, retry
    /// with a plain clone and checkout the first of `{branch, master, main}`
    /// that resolves; otherwise return a `GitOpError`.
    async fn clone_at_branch(
        &self,
        url: &str,
        branch: &str,
        target: &Path,
        fallback: bool,
        timeout: Duration,
    ) -> Result<CheckoutResult>;

    /// `fetch --all --prune` then `checkout <branch>` then
    /// `reset --hard origin/<branch>` on an existing clone.
    async fn refresh_at_branch(
        &self,
        repo: &Path,
        branch: &str,
        timeout: Duration,
    ) -> Result<CheckoutResult>;

    async fn rev_parse(&self, repo: &Path, rev: &str, timeout: Duration) -> Result<String>;

    async fn current_branch(&self, repo: &Path, timeout: Duration) -> Result<Option<String>>;

    /// `git diff --name-status -M <base>..<target>`, raw output.
    async fn diff_name_status(
        &self,
        repo: &Path,
        base: &str,
        target: &str,
        timeout: Duration,
    ) -> Result<String>;

    /// `git diff <base>..<target> -- <path>`, raw unified diff for one file.
    async fn diff_file(
        &self,
        repo: &Path,
        base: &str,
        target: &str,
        path: &str,
        timeout: Duration,
    ) -> Result<String>;

    /// Contents of `path` at `rev` (`git show <rev>:<path>`). Used both by
    /// the indexer (to parse the post-image) and the snippet assembler (to
    /// build context windows).
    async fn show_file(
        &self,
        repo: &Path,
        rev: &str,
        path: &str,
        timeout: Duration,
    ) -> Result<String>;
}

fn not_implemented() -> Error {
    Error::new(ErrorCode::GitOpError, "git backend not implemented")
}

/// Stub backend for unit tests that don't need a real `git` binary.
pub struct StubGitBackend;

#[async_trait]
impl GitBackend for StubGitBackend {
    async fn is_repo(&self, _path: &Path, _timeout: Duration) -> Result<bool> {
        Err(not_implemented())
    }

    async fn clone_at_branch(
        &self,
        _url: &str,
        _branch: &str,
        _target: &Path,
        _fallback: bool,
        _timeout: Duration,
    ) -> Result<CheckoutResult> {
        Err(not_implemented())
    }

    async fn refresh_at_branch(
        &self,
        _repo: &Path,
        _branch: &str,
        _timeout: Duration,
    ) -> Result<CheckoutResult> {
        Err(not_implemented())
    }

    async fn rev_parse(&self, _repo: &Path, _rev: &str, _timeout: Duration) -> Result<String> {
        Err(not_implemented())
    }

    async fn current_branch(&self, _repo: &Path, _timeout: Duration) -> Result<Option<String>> {
        Err(not_implemented())
    }

    async fn diff_name_status(
        &self,
        _repo: &Path,
        _base: &str,
        _target: &str,
        _timeout: Duration,
    ) -> Result<String> {
        Err(not_implemented())
    }

    async fn diff_file(
        &self,
        _repo: &Path,
        _base: &str,
        _target: &str,
        _path: &str,
        _timeout: Duration,
    ) -> Result<String> {
        Err(not_implemented())
    }

    async fn show_file(
        &self,
        _repo: &Path,
        _rev: &str,
        _path: &str,
        _timeout: Duration,
    ) -> Result<String> {
        Err(not_implemented())
    }
}
