use cpi_api::{AnalysisTask, Impact, ProjectRelation, RiskLevel};
use cpi_core::llm::{FixedLlmClient, LlmReply};
use cpi_core::store::InMemoryTaskStore;
use cpi_core::{Engine, EngineConfig};
use cpi_git::CliBackend;
use cpi_fixtures::synth_repo::GitRepo;
use std::sync::Arc;

/// An `Engine` backed by the real `git` binary and a scratch workspace/cache
/// under the OS temp dir, unique per test. Wires a [`FixedLlmClient`] rather
/// than [`cpi_core::llm::StubLlmClient`] — the stub never succeeds, which
/// would mask every report's impacts behind a `failed: true` report.
pub fn engine_for(test_name: &str) -> Engine {
    let base = std::env::temp_dir().join(format!("cpi_scenarios_{test_name}_{}", std::process::id()));
    let config = EngineConfig {
        workspace: base.join("workspace"),
        cache_dir: base.join("cache"),
        ..EngineConfig::default()
    };
    let llm = FixedLlmClient {
        reply: LlmReply {
            risk_level: Some(RiskLevel::Medium),
            change_intent: Some("scenario fixture change".to_string()),
            downstream_dependency_notes: None,
            cross_service_impact: None,
            functional_impact: None,
            test_strategy: Vec::new(),
        },
    };
    Engine::new(
        config,
        Arc::new(InMemoryTaskStore::new()),
        Arc::new(CliBackend::new()),
        Arc::new(llm),
    )
}

pub fn task_for(
    main_repo: &GitRepo,
    base_commit: &str,
    target_commit: &str,
    relations: Vec<ProjectRelation>,
) -> AnalysisTask {
    let mut task = AnalysisTask::new(
        format!("t-{}", std::process::id()),
        main_repo.url(),
        "master",
        base_commit,
        target_commit,
    );
    task.enable_cross_project = true;
    task.related_projects = relations;
    task
}

/// The project name the orchestrator derives from a `GitRepo`'s own
/// filesystem path (its URL is the path itself, so the basename is the
/// derived project name) — used to assert the main repo never appears as
/// a cross-project impact's project.
pub fn main_project_name(main_repo: &GitRepo) -> String {
    main_repo
        .path
        .file_name()
        .unwrap()
        .to_string_lossy()
        .to_string()
}

pub fn impacts_for_project<'a>(impacts: &'a [Impact], project: &str) -> Vec<&'a Impact> {
    impacts.iter().filter(|i| i.project == project).collect()
}
