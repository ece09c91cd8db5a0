//! A main repo changes a `@DubboService`-annotated class; a related repo
//! holds a `@DubboReference` field to it.

mod support;

use cpi_api::{ImpactType, TaskStatus};
use cpi_fixtures::scenarios::dubbo_scenario;

#[tokio::test]
async fn dubbo_reference_is_traced_as_rpc_reference_on_the_related_project_only() {
    let scenario = dubbo_scenario().expect("failed to build dubbo fixture");
    let engine = support::engine_for("dubbo_interface_changed");
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
        .find(|r| r.file_name.ends_with("UserService.java"))
        .expect("expected a report for the changed UserService.java");

    assert_eq!(report.cross_service_impact.len(), 1, "expected exactly one field-injection impact");
    let impact = &report.cross_service_impact[0];
    assert_eq!(impact.impact_type, ImpactType::RpcReference);
    assert_eq!(impact.project, "order-service");
    assert_ne!(impact.project, main_name);
    assert!(impact.snippet.contains("UserService"));
}
