//! Layered configuration: an optional TOML file, environment
//! variable overrides for secrets, and `serde(default)` values for every
//! tunable. CLI flags (in `cpi_cli`) take precedence over all of these.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

fn default_parallel_clone_limit() -> u32 {
    8
}

fn default_git_op_timeout_seconds() -> u32 {
    120
}

fn default_context_lines() -> u32 {
    2
}

fn default_branch_fallback() -> bool {
    false
}

fn default_workspace() -> PathBuf {
    std::env::temp_dir().join("cpi_workspace")
}

fn default_cache_dir() -> PathBuf {
    std::env::temp_dir().join("cpi_cache")
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub parallel_clone_limit: u32,
    pub git_op_timeout_seconds: u32,
    pub context_lines_k: u32,
    /// Defaults to fail-on-missing rather than silently substituting the
    /// default branch.
    pub branch_fallback: bool,
    pub workspace: PathBuf,
    pub cache_dir: PathBuf,
    /// API key for the LLM client; normally supplied via `CPI_LLM_API_KEY`,
    /// never committed to a config file.
    pub llm_api_key: Option<String>,
    pub llm_api_url: Option<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            parallel_clone_limit: default_parallel_clone_limit(),
            git_op_timeout_seconds: default_git_op_timeout_seconds(),
            context_lines_k: default_context_lines(),
            branch_fallback: default_branch_fallback(),
            workspace: default_workspace(),
            cache_dir: default_cache_dir(),
            llm_api_key: None,
            llm_api_url: None,
        }
    }
}

impl EngineConfig {
    pub fn load(explicit_path: Option<&Path>) -> Result<Self, cpi_api::Error> {
        let mut config = match explicit_path {
            Some(path) => Self::from_file(path)?,
            None => match std::env::var("CPI_CONFIG") {
                Ok(path) => Self::from_file(Path::new(&path))?,
                Err(_) => Self::default(),
            },
        };
        config.apply_env_overrides();
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, cpi_api::Error> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            cpi_api::Error::new(
                cpi_api::ErrorCode::ConfigError,
                format!("failed to read config file {}: {e}", path.display()),
            )
        })?;
        toml::from_str(&contents).map_err(|e| {
            cpi_api::Error::new(
                cpi_api::ErrorCode::ConfigError,
                format!("failed to parse config file {}: {e}", path.display()),
            )
        })
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(key) = std::env::var("CPI_LLM_API_KEY") {
            self.llm_api_key = Some(key);
        }
        if let Ok(url) = std::env::var("CPI_LLM_API_URL") {
            self.llm_api_url = Some(url);
        }
        if let Ok(val) = std::env::var("CPI_PARALLEL_CLONE_LIMIT") {
            if let Ok(parsed) = val.parse() {
                self.parallel_clone_limit = parsed;
            }
        }
        if let Ok(val) = std::env::var("CPI_GIT_OP_TIMEOUT_SECONDS") {
            if let Ok(parsed) = val.parse() {
                self.git_op_timeout_seconds = parsed;
            }
        }
    }

    pub fn git_op_timeout(&self) -> Duration {
        Duration::from_secs(self.git_op_timeout_seconds as u64)
    }

    pub fn worker_pool_size(&self, related_project_count: usize) -> usize {
        (related_project_count.max(1)).min(self.parallel_clone_limit as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_spec_section_6() {
        let config = EngineConfig::default();
        assert_eq!(config.parallel_clone_limit, 8);
        assert_eq!(config.git_op_timeout_seconds, 120);
        assert_eq!(config.context_lines_k, 2);
        assert!(!config.branch_fallback);
    }

    #[test]
    fn worker_pool_size_is_bounded_by_limit_and_repo_count() {
        let config = EngineConfig::default();
        assert_eq!(config.worker_pool_size(3), 3);
        assert_eq!(config.worker_pool_size(20), 8);
    }

    #[test]
    fn from_file_round_trips_toml() {
        let dir = std::env::temp_dir().join(format!("cpi_config_test_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");
        std::fs::write(&path, "parallel_clone_limit = 4\ngit_op_timeout_seconds = 60\n").unwrap();

        let config = EngineConfig::from_file(&path).unwrap();
        assert_eq!(config.parallel_clone_limit, 4);
        assert_eq!(config.git_op_timeout_seconds, 60);
        assert_eq!(config.context_lines_k, 2); // still defaulted

        let _ = std::fs::remove_dir_all(&dir);
    }
}
