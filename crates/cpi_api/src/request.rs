//! Request DTOs for the cross-project impact engine's entry points.

use crate::bounds::Cursor;
use crate::entities::ProjectRelation;
use crate::paging::Paging;
use serde::{Deserialize, Serialize};

/// Top-level request envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Request {
    pub version: crate::ApiVersion,
    pub id: String,
    pub payload: RequestPayload,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestPayload {
    /// Start a full cross-project impact analysis.
    RunAnalysis(RunAnalysisRequest),
    /// Fetch a single task's status and log.
    GetTask(GetTaskRequest),
    /// List tasks, most recent first.
    ListTasks(ListTasksRequest),
    /// List the per-file reports produced by a task.
    ListReports(ListReportsRequest),
    /// Cancel a running task.
    CancelTask(CancelTaskRequest),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunAnalysisRequest {
    pub main_git_url: String,
    pub target_branch: String,
    pub base_commit: String,
    pub target_commit: String,
    #[serde(default)]
    pub enable_cross_project: bool,
    #[serde(default)]
    pub related_projects: Vec<ProjectRelation>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetTaskRequest {
    pub task_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListTasksRequest {
    #[serde(default = "Paging::default_for_list")]
    pub paging: Paging,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListReportsRequest {
    pub task_id: String,
    #[serde(default = "Paging::default_for_list")]
    pub paging: Paging,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CancelTaskRequest {
    pub task_id: String,
}

impl Paging {
    pub fn default_for_list() -> Paging {
        Paging {
            page_size: crate::bounds::PageSize::try_from(100).expect("100 is a valid page size"),
            cursor: Cursor::initial(),
        }
    }
}
