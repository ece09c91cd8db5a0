//! Progress event DTOs emitted while an analysis task runs.
//!
//! These mirror the one-line milestones a [`crate::entities::AnalysisTask`]
//! log accumulates; callers that want live progress (rather than polling the
//! task log) can subscribe to a stream of these.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Event {
    TaskStatusChanged(TaskStatusChangedEvent),
    RepoMaterialized(RepoMaterializedEvent),
    RepoMaterializeFailed(RepoMaterializeFailedEvent),
    IndexCacheHit(IndexCacheEvent),
    IndexCacheMiss(IndexCacheEvent),
    FileAnalyzed(FileAnalyzedEvent),
    FileAnalysisFailed(FileAnalysisFailedEvent),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskStatusChangedEvent {
    pub task_id: String,
    pub status: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepoMaterializedEvent {
    pub task_id: String,
    pub project_name: String,
    pub resolved_commit: String,
    pub branch: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepoMaterializeFailedEvent {
    pub task_id: String,
    pub project_name: String,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexCacheEvent {
    pub task_id: String,
    pub project_name: String,
    pub commit_hash: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileAnalyzedEvent {
    pub task_id: String,
    pub file_name: String,
    pub impacts_found: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileAnalysisFailedEvent {
    pub task_id: String,
    pub file_name: String,
    pub reason: String,
}
