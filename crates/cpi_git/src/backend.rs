//! CLI-shelling [`GitBackend`] implementation. Every operation runs `git` as
//! a subprocess and wraps it in [`tokio::time::timeout`]; a timeout or a
//! non-zero exit both surface as a typed error rather than panicking.

use crate::{CheckoutResult, GitBackend, Result};
use async_trait::async_trait;
use cpi_api::{Error, ErrorCode};
use std::path::Path;
use std::time::Duration;
use tokio::process::Command;

pub struct CliBackend {
    git_binary: String,
}

impl CliBackend {
    pub fn new() -> Self {
        Self {
            git_binary: "git".to_string(),
        }
    }
}

impl Default for CliBackend {
    fn default() -> Self {
        Self::new()
    }
}

async fn run_in(
    git_binary: &str,
    dir: Option<&Path>,
    args: &[&str],
    timeout: Duration,
) -> Result<String> {
    let mut cmd = Command::new(git_binary);
    if let Some(dir) = dir {
        cmd.arg("-C").arg(dir);
    }
    cmd.args(args);

    let command_tail = args.join(" ");
    let output = tokio::time::timeout(timeout, cmd.output())
        .await
        .map_err(|_| {
            Error::new(
                ErrorCode::Timeout,
                format!("git {command_tail} exceeded {}s", timeout.as_secs()),
            )
            .with_details(serde_json::json!({ "command": command_tail }))
        })?
        .map_err(|e| Error::new(ErrorCode::GitOpError, format!("failed to spawn git: {e}")))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        return Err(Error::new(
            ErrorCode::GitOpError,
            format!("git {command_tail} failed: {stderr}"),
        )
        .with_details(serde_json::json!({ "command": command_tail, "stderr": stderr })));
    }

    Ok(String::from_utf8_lossy(&output.stdout).to_string())
}

#[async_trait]
impl GitBackend for CliBackend {
    async fn is_repo(&self, path: &Path, timeout: Duration) -> Result<bool> {
        Ok(
            run_in(&self.git_binary, Some(path), &["rev-parse", "--git-dir"], timeout)
                .await
                .is_ok(),
        )
    }

    async fn clone_at_branch(
        &self,
        url: &str,
        branch: &str,
        target: &Path,
        fallback: bool,
        timeout: Duration,
    ) -> Result<CheckoutResult> {
        let target_str = target.to_string_lossy().to_string();
        let direct = run_in(
            &self.git_binary,
            None,
            &["clone", "--branch", branch, "--single-branch", url, &target_str],
            timeout,
        )
        .await;

        let branch_used = match direct {
            Ok(_) => branch.to_string(),
            Err(direct_err) => {
                if !fallback {
                    return Err(direct_err);
                }
                run_in(&self.git_binary, None, &["clone", url, &target_str], timeout).await?;
                let mut resolved = None;
                for candidate in [branch, "master", "main"] {
                    if run_in(
                        &self.git_binary,
                        Some(target),
                        &["checkout", candidate],
                        timeout,
                    )
                    .await
                    .is_ok()
                    {
                        resolved = Some(candidate.to_string());
                        break;
                    }
                }
                resolved.ok_or(direct_err)?
            }
        };

        let resolved_commit = self.rev_parse(target, "HEAD", timeout).await?;
        Ok(CheckoutResult {
            resolved_commit,
            branch: branch_used,
        })
    }

    async fn refresh_at_branch(
        &self,
        repo: &Path,
        branch: &str,
        timeout: Duration,
    ) -> Result<CheckoutResult> {
        run_in(&self.git_binary, Some(repo), &["fetch", "--all", "--prune"], timeout).await?;
        run_in(&self.git_binary, Some(repo), &["checkout", branch], timeout).await?;
        let remote_ref = format!("origin/{branch}");
        run_in(
            &self.git_binary,
            Some(repo),
            &["reset", "--hard", &remote_ref],
            timeout,
        )
        .await?;
        let resolved_commit = self.rev_parse(repo, "HEAD", timeout).await?;
        Ok(CheckoutResult {
            resolved_commit,
            branch: branch.to_string(),
        })
    }

    async fn rev_parse(&self, repo: &Path, rev: &str, timeout: Duration) -> Result<String> {
        let out = run_in(&self.git_binary, Some(repo), &["rev-parse", rev], timeout).await?;
        Ok(out.trim().to_string())
    }

    async fn current_branch(&self, repo: &Path, timeout: Duration) -> Result<Option<String>> {
        let out = run_in(
            &self.git_binary,
            Some(repo),
            &["rev-parse", "--abbrev-ref", "HEAD"],
            timeout,
        )
        .await?;
        let branch = out.trim().to_string();
        if branch == "HEAD" || branch.is_empty() {
            Ok(None)
        } else {
            Ok(Some(branch))
        }
    }

    async fn diff_name_status(
        &self,
        repo: &Path,
        base: &str,
        target: &str,
        timeout: Duration,
    ) -> Result<String> {
        let range = format!("{base}..{target}");
        run_in(
            &self.git_binary,
            Some(repo),
            &["diff", "--name-status", "-M", &range],
            timeout,
        )
        .await
    }

    async fn diff_file(
        &self,
        repo: &Path,
        base: &str,
        target: &str,
        path: &str,
        timeout: Duration,
    ) -> Result<String> {
        let range = format!("{base}..{target}");
        run_in(&self.git_binary, Some(repo), &["diff", &range, "--", path], timeout).await
    }

    async fn show_file(
        &self,
        repo: &Path,
        rev: &str,
        path: &str,
        timeout: Duration,
    ) -> Result<String> {
        let spec = format!("{rev}:{path}");
        run_in(&self.git_binary, Some(repo), &["show", &spec], timeout).await
    }
}
