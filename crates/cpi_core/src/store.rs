//! Persistence boundary: the orchestrator depends on a small trait
//! rather than a concrete store. A real relational store is an external
//! collaborator; [`InMemoryTaskStore`] backs the test suite and the CLI's
//! single-shot mode.

use async_trait::async_trait;
use cpi_api::{AnalysisReport, AnalysisTask, Error, ErrorCode, ProjectRelation, TaskStatus};
use std::collections::HashMap;
use std::sync::Mutex;

#[async_trait]
pub trait TaskStore: Send + Sync {
    async fn create_task(&self, task: AnalysisTask) -> Result<(), Error>;
    async fn append_log(&self, task_id: &str, line: &str) -> Result<(), Error>;
    async fn update_status(&self, task_id: &str, status: TaskStatus) -> Result<(), Error>;
    async fn insert_report(&self, report: AnalysisReport) -> Result<(), Error>;
    async fn load_project_relations(&self, main_git_url: &str) -> Result<Vec<ProjectRelation>, Error>;
    async fn get_task(&self, task_id: &str) -> Result<AnalysisTask, Error>;
    async fn list_tasks(&self) -> Result<Vec<AnalysisTask>, Error>;
    async fn list_reports(&self, task_id: &str) -> Result<Vec<AnalysisReport>, Error>;
}

#[derive(Default)]
struct State {
    tasks: HashMap<String, AnalysisTask>,
    task_order: Vec<String>,
    reports: HashMap<String, Vec<AnalysisReport>>,
    relations: HashMap<String, Vec<ProjectRelation>>,
}

pub struct InMemoryTaskStore {
    state: Mutex<State>,
}

impl InMemoryTaskStore {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State::default()),
        }
    }

    pub fn seed_relations(&self, main_git_url: &str, relations: Vec<ProjectRelation>) {
        self.state
            .lock()
            .unwrap()
            .relations
            .insert(main_git_url.to_string(), relations);
    }
}

impl Default for InMemoryTaskStore {
    fn default() -> Self {
        Self::new()
    }
}

fn not_found(task_id: &str) -> Error {
    Error::new(ErrorCode::NotFound, format!("no such task: {task_id}"))
}

#[async_trait]
impl TaskStore for InMemoryTaskStore {
    async fn create_task(&self, task: AnalysisTask) -> Result<(), Error> {
        let mut state = self.state.lock().unwrap();
        state.task_order.push(task.id.clone());
        state.tasks.insert(task.id.clone(), task);
        Ok(())
    }

    async fn append_log(&self, task_id: &str, line: &str) -> Result<(), Error> {
        let mut state = self.state.lock().unwrap();
        let task = state.tasks.get_mut(task_id).ok_or_else(|| not_found(task_id))?;
        task.append_log(line.to_string());
        Ok(())
    }

    async fn update_status(&self, task_id: &str, status: TaskStatus) -> Result<(), Error> {
        let mut state = self.state.lock().unwrap();
        let task = state.tasks.get_mut(task_id).ok_or_else(|| not_found(task_id))?;
        task.status = status;
        Ok(())
    }

    async fn insert_report(&self, report: AnalysisReport) -> Result<(), Error> {
        let mut state = self.state.lock().unwrap();
        state.reports.entry(report.task_id.clone()).or_default().push(report);
        Ok(())
    }

    async fn load_project_relations(&self, main_git_url: &str) -> Result<Vec<ProjectRelation>, Error> {
        let state = self.state.lock().unwrap();
        Ok(state.relations.get(main_git_url).cloned().unwrap_or_default())
    }

    async fn get_task(&self, task_id: &str) -> Result<AnalysisTask, Error> {
        let state = self.state.lock().unwrap();
        state.tasks.get(task_id).cloned().ok_or_else(|| not_found(task_id))
    }

    async fn list_tasks(&self) -> Result<Vec<AnalysisTask>, Error> {
        let state = self.state.lock().unwrap();
        Ok(state
            .task_order
            .iter()
            .rev()
            .filter_map(|id| state.tasks.get(id).cloned())
            .collect())
    }

    async fn list_reports(&self, task_id: &str) -> Result<Vec<AnalysisReport>, Error> {
        let state = self.state.lock().unwrap();
        Ok(state.reports.get(task_id).cloned().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn create_then_get_round_trips() {
        let store = InMemoryTaskStore::new();
        let task = AnalysisTask::new("t1", "git@example.com/main.git", "main", "base", "target");
        store.create_task(task).await.unwrap();

        let fetched = store.get_task("t1").await.unwrap();
        assert_eq!(fetched.id, "t1");
        assert_eq!(fetched.status, TaskStatus::Pending);
    }

    #[tokio::test]
    async fn append_log_and_update_status() {
        let store = InMemoryTaskStore::new();
        store
            .create_task(AnalysisTask::new("t1", "url", "main", "a", "b"))
            .await
            .unwrap();
        store.append_log("t1", "materialized main repo").await.unwrap();
        store.update_status("t1", TaskStatus::Completed).await.unwrap();

        let task = store.get_task("t1").await.unwrap();
        assert_eq!(task.log, vec!["materialized main repo".to_string()]);
        assert_eq!(task.status, TaskStatus::Completed);
    }

    #[tokio::test]
    async fn list_tasks_is_most_recent_first() {
        let store = InMemoryTaskStore::new();
        for id in ["t1", "t2", "t3"] {
            store.create_task(AnalysisTask::new(id, "url", "main", "a", "b")).await.unwrap();
        }
        let tasks = store.list_tasks().await.unwrap();
        assert_eq!(tasks[0].id, "t3");
        assert_eq!(tasks[2].id, "t1");
    }

    #[tokio::test]
    async fn get_missing_task_is_not_found() {
        let store = InMemoryTaskStore::new();
        let err = store.get_task("missing").await.unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
    }
}
