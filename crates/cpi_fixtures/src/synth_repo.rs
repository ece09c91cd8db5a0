//! Real on-disk Git repo builder for scenario fixtures: every operation
//! shells out to `git`, so integration tests exercise the real `git` binary
//! rather than mocking it.

use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::process::Command;

#[derive(Debug)]
pub enum FixtureError {
    Io(std::io::Error),
    Git(String),
}

impl std::fmt::Display for FixtureError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FixtureError::Io(e) => write!(f, "IO error: {e}"),
            FixtureError::Git(msg) => write!(f, "Git error: {msg}"),
        }
    }
}

impl std::error::Error for FixtureError {}

impl From<std::io::Error> for FixtureError {
    fn from(e: std::io::Error) -> Self {
        FixtureError::Io(e)
    }
}

/// A plain (non-bare) Git repository on disk, built up one commit at a time.
/// Its path doubles as a clone URL: `git clone <path>` works against any
/// local repo, so scenario tests never need a real remote.
pub struct GitRepo {
    pub path: PathBuf,
}

impl GitRepo {
    /// Initializes a fresh repo at `path` on branch `initial_branch`.
    pub fn init(path: impl Into<PathBuf>, initial_branch: &str) -> Result<Self, FixtureError> {
        let path = path.into();
        fs::create_dir_all(&path)?;
        let repo = GitRepo { path };
        repo.run_git(&["init", &format!("--initial-branch={initial_branch}")])?;
        repo.run_git(&["config", "user.name", "fixture"])?;
        repo.run_git(&["config", "user.email", "fixture@example.com"])?;
        Ok(repo)
    }

    pub fn write_file(&self, rel_path: &str, content: &str) -> Result<(), FixtureError> {
        let full_path = self.path.join(rel_path);
        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut file = fs::File::create(&full_path)?;
        file.write_all(content.as_bytes())?;
        Ok(())
    }

    pub fn remove_file(&self, rel_path: &str) -> Result<(), FixtureError> {
        self.run_git(&["rm", rel_path])?;
        Ok(())
    }

    /// Stages everything and commits, returning the resulting commit hash.
    pub fn commit(&self, message: &str) -> Result<String, FixtureError> {
        self.run_git(&["add", "-A"])?;
        self.run_git(&["commit", "-m", message, "--allow-empty"])?;
        self.rev_parse("HEAD")
    }

    pub fn checkout_new_branch(&self, name: &str) -> Result<(), FixtureError> {
        self.run_git(&["checkout", "-b", name])?;
        Ok(())
    }

    pub fn current_branch(&self) -> Result<String, FixtureError> {
        self.run_git(&["rev-parse", "--abbrev-ref", "HEAD"])
            .map(|s| s.trim().to_string())
    }

    pub fn rev_parse(&self, rev: &str) -> Result<String, FixtureError> {
        self.run_git(&["rev-parse", rev]).map(|s| s.trim().to_string())
    }

    /// The local clone URL for this repo: any git operation that takes a URL
    /// accepts a plain filesystem path.
    pub fn url(&self) -> String {
        self.path.to_string_lossy().to_string()
    }

    fn run_git(&self, args: &[&str]) -> Result<String, FixtureError> {
        let output = Command::new("git").current_dir(&self.path).args(args).output()?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(FixtureError::Git(format!("git {} failed: {}", args.join(" "), stderr)));
        }
        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }
}
