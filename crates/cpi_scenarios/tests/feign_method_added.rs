//! A main repo adds `batchUpdatePoints` to a `@FeignClient` interface; a
//! related repo field-injects that client via `@Resource`.

mod support;

use cpi_api::{ImpactType, TaskStatus};
use cpi_fixtures::scenarios::feign_scenario;

#[tokio::test]
async fn feign_client_addition_is_traced_to_the_related_project_only() {
    let scenario = feign_scenario().expect("failed to build feign fixture");
    let engine = support::engine_for("feign_method_added");
    let main_name = support::main_project_name(&scenario.main_repo);

    let task = support::task_for(
        &scenario.main_repo,
        &scenario.base_commit,
        &scenario.target_commit,
        vec![scenario.relation.clone()],
    );

    let (task, reports) = engine
        .run_task_to_completion(task)
        .await
        .expect("analysis task should complete");

    assert_eq!(task.status, TaskStatus::Completed);

    let report = reports
        .iter()
        .find(|r| r.file_name.ends_with("PointClient.java"))
        .expect("expected a report for the changed PointClient.java");

    assert!(
        !report.cross_service_impact.is_empty(),
        "expected at least one cross-project impact on the field injection"
    );

    for impact in &report.cross_service_impact {
        assert_ne!(impact.project, main_name, "main repo must never appear as a cross-project impact");
        assert_eq!(impact.project, "ucenter-provider");
        assert_eq!(impact.impact_type, ImpactType::ClassReference);
        assert!(impact.line >= 1);
        assert!(!impact.snippet.trim().is_empty());
    }

    let ordered: Vec<_> = report
        .cross_service_impact
        .iter()
        .map(|i| (i.project.as_str(), i.file.as_str(), i.line))
        .collect();
    let mut sorted = ordered.clone();
    sorted.sort();
    assert_eq!(ordered, sorted, "impacts must be sorted by (project, file, line)");
}
