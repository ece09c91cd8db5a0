//! Long-lived engine instance wiring the orchestrator to a concrete
//! [`TaskStore`], [`GitBackend`], [`LlmClient`], and [`IndexCache`] — one
//! facade, many collaborators, built around [`crate::orchestrator::run`].

use crate::config::EngineConfig;
use crate::orchestrator::{self, CancellationToken};
use crate::store::TaskStore;
use crate::tracer::build_or_fetch_index;
use cpi_api::{AnalysisReport, AnalysisTask, Error, ErrorCode, ProjectRelation, TaskStatus};
use cpi_git::GitBackend;
use cpi_index::IndexCache;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::llm::LlmClient;

/// Coordinates one engine instance's shared collaborators. Cheap to clone
/// (everything inside is `Arc`-wrapped), so a server can hand out clones to
/// however many concurrent requests it's servicing.
#[derive(Clone)]
pub struct Engine {
    config: Arc<EngineConfig>,
    store: Arc<dyn TaskStore>,
    git: Arc<dyn GitBackend>,
    llm: Arc<dyn LlmClient>,
    cache: Arc<Mutex<IndexCache>>,
    cancellations: Arc<Mutex<HashMap<String, CancellationToken>>>,
}

impl Engine {
    pub fn new(
        config: EngineConfig,
        store: Arc<dyn TaskStore>,
        git: Arc<dyn GitBackend>,
        llm: Arc<dyn LlmClient>,
    ) -> Self {
        let cache = IndexCache::new(config.cache_dir.clone());
        Self {
            config: Arc::new(config),
            store,
            git,
            llm,
            cache: Arc::new(Mutex::new(cache)),
            cancellations: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Registers a new task from a request and immediately runs it to
    /// completion on the current task (the CLI's single-shot mode).
    pub async fn run_task_to_completion(
        &self,
        mut task: AnalysisTask,
    ) -> Result<(AnalysisTask, Vec<AnalysisReport>), Error> {
        self.store.create_task(task.clone()).await?;
        let cancel = CancellationToken::new();
        self.register(&task.id, cancel.clone()).await;

        let mut cache = self.cache.lock().await;
        let result = orchestrator::run(
            &mut task,
            self.store.as_ref(),
            self.git.clone(),
            &mut cache,
            self.llm.as_ref(),
            &self.config,
            &cancel,
        )
        .await;
        drop(cache);
        self.unregister(&task.id).await;

        result.map(|reports| (task, reports))
    }

    /// Registers a new task and runs it on a spawned background task,
    /// returning immediately with the task id (the IPC server's mode).
    pub async fn spawn_task(&self, mut task: AnalysisTask) -> Result<String, Error> {
        self.store.create_task(task.clone()).await?;
        let cancel = CancellationToken::new();
        self.register(&task.id, cancel.clone()).await;
        let task_id = task.id.clone();

        let engine = self.clone();
        tokio::spawn(async move {
            let mut cache = engine.cache.lock().await;
            let _ = orchestrator::run(
                &mut task,
                engine.store.as_ref(),
                engine.git.clone(),
                &mut cache,
                engine.llm.as_ref(),
                &engine.config,
                &cancel,
            )
            .await;
            drop(cache);
            engine.unregister(&task.id).await;
        });

        Ok(task_id)
    }

    /// Requests cancellation of a running task. Returns `true` if a
    /// cancellation token was found (the task was still running), `false`
    /// if it had already finished or never existed.
    pub async fn cancel_task(&self, task_id: &str) -> bool {
        let tokens = self.cancellations.lock().await;
        match tokens.get(task_id) {
            Some(token) => {
                token.cancel();
                true
            }
            None => false,
        }
    }

    pub async fn get_task(&self, task_id: &str) -> Result<AnalysisTask, Error> {
        self.store.get_task(task_id).await
    }

    pub async fn list_tasks(&self) -> Result<Vec<AnalysisTask>, Error> {
        self.store.list_tasks().await
    }

    pub async fn list_reports(&self, task_id: &str) -> Result<Vec<AnalysisReport>, Error> {
        self.store.list_reports(task_id).await
    }

    pub async fn load_project_relations(&self, main_git_url: &str) -> Result<Vec<ProjectRelation>, Error> {
        self.store.load_project_relations(main_git_url).await
    }

    /// Pre-warms the main repo's index outside of a task run; used by
    /// callers that want to validate a repo URL before enqueueing work.
    pub async fn probe_main_index(&self, root: &std::path::Path) -> Result<(), Error> {
        let mut cache = self.cache.lock().await;
        build_or_fetch_index(self.git.as_ref(), &mut cache, root, self.config.git_op_timeout())
            .await
            .map(|_| ())
    }

    async fn register(&self, task_id: &str, token: CancellationToken) {
        self.cancellations.lock().await.insert(task_id.to_string(), token);
    }

    async fn unregister(&self, task_id: &str) {
        self.cancellations.lock().await.remove(task_id);
    }
}

pub fn config_error(message: impl Into<String>) -> Error {
    Error::new(ErrorCode::ConfigError, message.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::FixedLlmClient;
    use crate::store::InMemoryTaskStore;
    use cpi_api::RiskLevel;
    use cpi_git::StubGitBackend;

    fn fixed_llm() -> Arc<dyn LlmClient> {
        Arc::new(FixedLlmClient {
            reply: crate::llm::LlmReply {
                risk_level: Some(RiskLevel::Low),
                change_intent: Some("test".to_string()),
                downstream_dependency_notes: None,
                cross_service_impact: None,
                functional_impact: None,
                test_strategy: Vec::new(),
            },
        })
    }

    #[tokio::test]
    async fn cancel_unknown_task_returns_false() {
        let config = EngineConfig::default();
        let engine = Engine::new(
            config,
            Arc::new(InMemoryTaskStore::new()),
            Arc::new(StubGitBackend),
            fixed_llm(),
        );
        assert!(!engine.cancel_task("nonexistent").await);
    }

    #[tokio::test]
    async fn run_task_fails_fast_against_stub_git_backend() {
        let config = EngineConfig::default();
        let engine = Engine::new(
            config,
            Arc::new(InMemoryTaskStore::new()),
            Arc::new(StubGitBackend),
            fixed_llm(),
        );
        let task = AnalysisTask::new("t1", "git@example.com/main.git", "main", "a", "b");
        let err = engine.run_task_to_completion(task).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::GitOpError);

        let stored = engine.get_task("t1").await.unwrap();
        assert_eq!(stored.status, TaskStatus::Failed);
    }
}
