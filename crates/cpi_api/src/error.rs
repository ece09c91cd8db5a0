//! Typed error model for the cross-project impact engine.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Typed error codes, one per failure category recognized by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// Malformed or missing task/config input. Fatal before any work starts.
    ConfigError,
    /// Git subprocess failure (clone, fetch, checkout, diff, rev-parse, ...).
    GitOpError,
    /// A Java source file could not be parsed. Never fatal to the task.
    ParseError,
    /// Index cache read or write failure. Falls back to a fresh build.
    CacheError,
    /// LLM transport failure or a reply that didn't match the expected shape.
    LlmError,
    /// Task was cancelled between files or between repo workers.
    CancelError,
    /// Request shape was invalid independent of domain config.
    InvalidRequest,
    /// A referenced task or report does not exist.
    NotFound,
    /// A git or LLM operation exceeded its wall-clock budget.
    Timeout,
    /// Anything else; should be rare and always logged with details.
    Internal,
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConfigError => write!(f, "config_error"),
            Self::GitOpError => write!(f, "git_op_error"),
            Self::ParseError => write!(f, "parse_error"),
            Self::CacheError => write!(f, "cache_error"),
            Self::LlmError => write!(f, "llm_error"),
            Self::CancelError => write!(f, "cancel_error"),
            Self::InvalidRequest => write!(f, "invalid_request"),
            Self::NotFound => write!(f, "not_found"),
            Self::Timeout => write!(f, "timeout"),
            Self::Internal => write!(f, "internal"),
        }
    }
}

/// Structured, loggable error used across every crate in the workspace.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Error {
    pub code: ErrorCode,
    pub message: String,
    pub remediation: Option<String>,
    /// Structured context: file path, repo name, git command tail, etc.
    pub details: Option<serde_json::Value>,
}

impl Error {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            remediation: None,
            details: None,
        }
    }

    pub fn with_remediation(mut self, remediation: impl Into<String>) -> Self {
        self.remediation = Some(remediation.into());
        self
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    /// Whether this error kind is recoverable at the task level (local
    /// recovery everywhere except ConfigError and a GitOpError on the main repo).
    pub fn is_recoverable(&self) -> bool {
        !matches!(self.code, ErrorCode::ConfigError)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for Error {}
