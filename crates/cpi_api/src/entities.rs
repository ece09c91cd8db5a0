//! Core domain entities shared across the workspace: [`ProjectRelation`],
//! [`AnalysisTask`], [`AnalysisReport`], and the [`Impact`] record produced
//! by cross-project tracing.

use serde::{Deserialize, Serialize};

/// A configured main-repo/related-repo pairing. Read by the orchestrator at
/// task start; owned externally (persistence is out of scope for this crate).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectRelation {
    pub main_name: String,
    pub main_git_url: String,
    pub related_name: String,
    pub related_git_url: String,
    #[serde(default = "default_branch")]
    pub related_branch: String,
    pub active: bool,
}

fn default_branch() -> String {
    "master".to_string()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TaskStatus::Pending => write!(f, "pending"),
            TaskStatus::Processing => write!(f, "processing"),
            TaskStatus::Completed => write!(f, "completed"),
            TaskStatus::Failed => write!(f, "failed"),
        }
    }
}

/// One end-to-end analysis run over a single main-repo diff.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisTask {
    pub id: String,
    pub main_git_url: String,
    pub target_branch: String,
    pub base_commit: String,
    pub target_commit: String,
    pub enable_cross_project: bool,
    pub related_projects: Vec<ProjectRelation>,
    pub status: TaskStatus,
    /// Append-only, human-readable milestone/error log.
    pub log: Vec<String>,
}

impl AnalysisTask {
    pub fn new(
        id: impl Into<String>,
        main_git_url: impl Into<String>,
        target_branch: impl Into<String>,
        base_commit: impl Into<String>,
        target_commit: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            main_git_url: main_git_url.into(),
            target_branch: target_branch.into(),
            base_commit: base_commit.into(),
            target_commit: target_commit.into(),
            enable_cross_project: false,
            related_projects: Vec::new(),
            status: TaskStatus::Pending,
            log: Vec::new(),
        }
    }

    pub fn append_log(&mut self, line: impl Into<String>) {
        self.log.push(line.into());
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

/// One analyzed file's report; source_project is `"main"` or a related name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub task_id: String,
    pub project_name: String,
    pub file_name: String,
    pub diff_content: String,
    pub risk_level: Option<RiskLevel>,
    pub change_intent: Option<String>,
    pub downstream_dependency: Vec<Impact>,
    pub cross_service_impact: Vec<Impact>,
    pub functional_impact: Option<String>,
    pub test_strategy: Vec<String>,
    pub source_project: String,
    /// Set when the LLM reply never parsed after the one retry.
    pub failed: bool,
}

impl AnalysisReport {
    pub fn failed(
        task_id: impl Into<String>,
        project_name: impl Into<String>,
        file_name: impl Into<String>,
        source_project: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            task_id: task_id.into(),
            project_name: project_name.into(),
            file_name: file_name.into(),
            diff_content: String::new(),
            risk_level: None,
            change_intent: Some(reason.into()),
            downstream_dependency: Vec::new(),
            cross_service_impact: Vec::new(),
            functional_impact: None,
            test_strategy: Vec::new(),
            source_project: source_project.into(),
            failed: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImpactType {
    ClassReference,
    ApiCall,
    RpcReference,
}

/// A single cross-project (or in-repo) reference site.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Impact {
    pub project: String,
    #[serde(rename = "type")]
    pub impact_type: ImpactType,
    pub file: String,
    pub line: u32,
    pub snippet: String,
    pub detail: String,
    /// Present only for `ImpactType::ApiCall`.
    pub api: Option<String>,
}

impl Impact {
    /// Every required field is non-empty/≥1, `api` present iff api_call.
    pub fn is_well_formed(&self) -> bool {
        if self.line == 0 || self.snippet.trim().is_empty() {
            return false;
        }
        match self.impact_type {
            ImpactType::ApiCall => self.api.is_some(),
            _ => true,
        }
    }
}
