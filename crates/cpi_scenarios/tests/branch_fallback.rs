//! A related repo is configured with a branch that doesn't exist on its
//! remote. Default policy (`branch_fallback = false`) must fail the clone
//! rather than silently substituting the default branch.

use cpi_core::materializer::materialize_one;
use cpi_fixtures::synth_repo::GitRepo;
use cpi_git::CliBackend;
use std::time::Duration;

fn scratch(name: &str) -> std::path::PathBuf {
    let dir = std::env::temp_dir().join(format!("cpi_scenarios_branch_{name}_{}", std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    dir
}

#[tokio::test]
async fn missing_branch_fails_by_default_and_succeeds_with_fallback_enabled() {
    let origin = GitRepo::init(scratch("origin"), "master").unwrap();
    origin.write_file("a.txt", "hello\n").unwrap();
    origin.commit("initial").unwrap();

    let git = CliBackend::new();
    let timeout = Duration::from_secs(30);

    let default_target = scratch("default_policy_clone");
    let err = materialize_one(
        &git,
        "release/2026-q1",
        &origin.url(),
        &default_target,
        false,
        timeout,
    )
    .await
    .expect_err("missing branch must fail when branch_fallback is disabled");
    assert_eq!(err.code, cpi_api::ErrorCode::GitOpError);

    let fallback_target = scratch("fallback_policy_clone");
    let checkout = materialize_one(
        &git,
        "release/2026-q1",
        &origin.url(),
        &fallback_target,
        true,
        timeout,
    )
    .await
    .expect("fallback-enabled clone should succeed against the default branch");
    assert_eq!(checkout.branch, "master");

    let actual_branch = GitRepo {
        path: fallback_target,
    }
    .current_branch()
    .unwrap();
    assert_eq!(actual_branch, "master");
}
