//! Response DTOs for the cross-project impact engine's entry points.

use crate::bounds::Cursor;
use crate::entities::{AnalysisReport, AnalysisTask};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Response {
    pub version: crate::ApiVersion,
    pub id: String,
    pub payload: ResponsePayload,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponsePayload {
    RunAnalysis(RunAnalysisResponse),
    Task(TaskResponse),
    Tasks(TasksResponse),
    Reports(ReportsResponse),
    CancelTask(CancelTaskResponse),
    Error(crate::Error),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunAnalysisResponse {
    pub task_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskResponse {
    pub task: AnalysisTask,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TasksResponse {
    pub tasks: Vec<AnalysisTask>,
    pub next_cursor: Option<Cursor>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportsResponse {
    pub reports: Vec<AnalysisReport>,
    pub next_cursor: Option<Cursor>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CancelTaskResponse {
    pub cancelled: bool,
}
