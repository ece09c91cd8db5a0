//! Ready-to-use multi-repo fixtures for the six cross-project impact
//! scenarios. Each builder lays out real on-disk Git repos (via
//! [`crate::synth_repo::GitRepo`]) seeded with [`crate::java`] source, and
//! returns the commit hashes and `ProjectRelation`s a test needs to build an
//! [`cpi_api::AnalysisTask`].

use crate::java;
use crate::synth_repo::{FixtureError, GitRepo};
use cpi_api::ProjectRelation;
use std::path::PathBuf;

fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("cpi_scenario_{name}_{}", std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    dir
}

/// Two commits on the main repo (before/after adding `batchUpdatePoints` to
/// `PointClient`), plus a related repo whose `PointManager` injects that
/// client.
pub struct FeignScenario {
    pub main_repo: GitRepo,
    pub base_commit: String,
    pub target_commit: String,
    pub related_repo: GitRepo,
    pub relation: ProjectRelation,
}

pub fn feign_scenario() -> Result<FeignScenario, FixtureError> {
    let main_repo = GitRepo::init(scratch_dir("feign_main"), "master")?;
    main_repo.write_file(
        "src/main/java/com/cloudE/pay/client/PointClient.java",
        &java::feign_client_v1(),
    )?;
    let base_commit = main_repo.commit("add point client")?;
    main_repo.write_file(
        "src/main/java/com/cloudE/pay/client/PointClient.java",
        &java::feign_client_v2(),
    )?;
    let target_commit = main_repo.commit("add batchUpdatePoints")?;

    let related_repo = GitRepo::init(scratch_dir("feign_related"), "master")?;
    related_repo.write_file(
        "src/main/java/com/example/ucenter/PointManager.java",
        &java::point_manager_consumer(),
    )?;
    related_repo.commit("add point manager")?;

    let relation = ProjectRelation {
        main_name: "pay-api".to_string(),
        main_git_url: main_repo.url(),
        related_name: "ucenter-provider".to_string(),
        related_git_url: related_repo.url(),
        related_branch: "master".to_string(),
        active: true,
    };

    Ok(FeignScenario {
        main_repo,
        base_commit,
        target_commit,
        related_repo,
        relation,
    })
}

/// Main repo's `@DubboService`-annotated `UserService` changes method body,
/// related repo's `UserFacade` holds a `@DubboReference` to it.
pub struct DubboScenario {
    pub main_repo: GitRepo,
    pub base_commit: String,
    pub target_commit: String,
    pub related_repo: GitRepo,
    pub relation: ProjectRelation,
}

pub fn dubbo_scenario() -> Result<DubboScenario, FixtureError> {
    let main_repo = GitRepo::init(scratch_dir("dubbo_main"), "master")?;
    main_repo.write_file(
        "src/main/java/com/example/service/UserService.java",
        &java::dubbo_service_v1(),
    )?;
    let base_commit = main_repo.commit("add user service")?;
    main_repo.write_file(
        "src/main/java/com/example/service/UserService.java",
        &java::dubbo_service_v2(),
    )?;
    let target_commit = main_repo.commit("add cache lookup to getUserById")?;

    let related_repo = GitRepo::init(scratch_dir("dubbo_related"), "master")?;
    related_repo.write_file(
        "src/main/java/com/example/consumer/UserFacade.java",
        &java::user_facade_with_dubbo_reference(),
    )?;
    related_repo.commit("add user facade")?;

    let relation = ProjectRelation {
        main_name: "user-service".to_string(),
        main_git_url: main_repo.url(),
        related_name: "order-service".to_string(),
        related_git_url: related_repo.url(),
        related_branch: "master".to_string(),
        active: true,
    };

    Ok(DubboScenario {
        main_repo,
        base_commit,
        target_commit,
        related_repo,
        relation,
    })
}

/// A related repo that only has a `release` branch, not the `target_branch`
/// requested by the relation — exercises fallback-to-default-branch cloning.
pub struct BranchFallbackScenario {
    pub main_repo: GitRepo,
    pub base_commit: String,
    pub target_commit: String,
    pub related_repo: GitRepo,
    pub relation: ProjectRelation,
}

pub fn branch_fallback_scenario() -> Result<BranchFallbackScenario, FixtureError> {
    let main_repo = GitRepo::init(scratch_dir("branch_main"), "master")?;
    main_repo.write_file(
        "src/main/java/com/example/core/Foo.java",
        &java::foo_v1(),
    )?;
    let base_commit = main_repo.commit("add foo")?;
    main_repo.write_file(
        "src/main/java/com/example/core/Foo.java",
        &java::foo_v2(),
    )?;
    let target_commit = main_repo.commit("change foo")?;

    let related_repo = GitRepo::init(scratch_dir("branch_related"), "master")?;
    related_repo.write_file(
        "src/main/java/com/example/other/Placeholder.java",
        &java::placeholder_class("com.example.other", "Placeholder"),
    )?;
    related_repo.commit("initial")?;

    let relation = ProjectRelation {
        main_name: "core-service".to_string(),
        main_git_url: main_repo.url(),
        related_name: "other-service".to_string(),
        related_git_url: related_repo.url(),
        // requested branch does not exist on related_repo; only "master" does
        related_branch: "release/2026-q1".to_string(),
        active: true,
    };

    Ok(BranchFallbackScenario {
        main_repo,
        base_commit,
        target_commit,
        related_repo,
        relation,
    })
}

/// One reachable related repo and one related repo whose URL never resolves,
/// for exercising degraded (partial) multi-project tracing.
pub struct PartialFailureScenario {
    pub main_repo: GitRepo,
    pub base_commit: String,
    pub target_commit: String,
    pub healthy_repo: GitRepo,
    pub relations: Vec<ProjectRelation>,
}

pub fn partial_failure_scenario() -> Result<PartialFailureScenario, FixtureError> {
    let main_repo = GitRepo::init(scratch_dir("partial_main"), "master")?;
    main_repo.write_file(
        "src/main/java/com/example/core/Foo.java",
        &java::foo_v1(),
    )?;
    let base_commit = main_repo.commit("add foo")?;
    main_repo.write_file(
        "src/main/java/com/example/core/Foo.java",
        &java::foo_v2(),
    )?;
    let target_commit = main_repo.commit("change foo")?;

    let healthy_repo = GitRepo::init(scratch_dir("partial_healthy"), "master")?;
    healthy_repo.write_file(
        "src/main/java/com/example/other/Placeholder.java",
        &java::placeholder_class("com.example.other", "Placeholder"),
    )?;
    healthy_repo.commit("initial")?;

    let unreachable_url = scratch_dir("partial_unreachable_does_not_exist")
        .to_string_lossy()
        .to_string();

    let relations = vec![
        ProjectRelation {
            main_name: "core-service".to_string(),
            main_git_url: main_repo.url(),
            related_name: "healthy-service".to_string(),
            related_git_url: healthy_repo.url(),
            related_branch: "master".to_string(),
            active: true,
        },
        ProjectRelation {
            main_name: "core-service".to_string(),
            main_git_url: main_repo.url(),
            related_name: "unreachable-service".to_string(),
            related_git_url: unreachable_url,
            related_branch: "master".to_string(),
            active: true,
        },
    ];

    Ok(PartialFailureScenario {
        main_repo,
        base_commit,
        target_commit,
        healthy_repo,
        relations,
    })
}

/// A single related repo reused across two analysis runs at the same
/// commit, for asserting the index cache is actually reused rather than
/// rebuilt.
pub struct CacheReuseScenario {
    pub main_repo: GitRepo,
    pub base_commit: String,
    pub target_commit: String,
    pub related_repo: GitRepo,
    pub relation: ProjectRelation,
}

pub fn cache_reuse_scenario() -> Result<CacheReuseScenario, FixtureError> {
    let main_repo = GitRepo::init(scratch_dir("cache_main"), "master")?;
    main_repo.write_file(
        "src/main/java/com/example/service/UserService.java",
        &java::dubbo_service_v1(),
    )?;
    let base_commit = main_repo.commit("add user service")?;
    main_repo.write_file(
        "src/main/java/com/example/service/UserService.java",
        &java::dubbo_service_v2(),
    )?;
    let target_commit = main_repo.commit("change user service")?;

    let related_repo = GitRepo::init(scratch_dir("cache_related"), "master")?;
    related_repo.write_file(
        "src/main/java/com/example/consumer/UserFacade.java",
        &java::user_facade_with_dubbo_reference(),
    )?;
    related_repo.commit("add user facade")?;

    let relation = ProjectRelation {
        main_name: "user-service".to_string(),
        main_git_url: main_repo.url(),
        related_name: "order-service".to_string(),
        related_git_url: related_repo.url(),
        related_branch: "master".to_string(),
        active: true,
    };

    Ok(CacheReuseScenario {
        main_repo,
        base_commit,
        target_commit,
        related_repo,
        relation,
    })
}

/// A single repo where the changed file (`Foo`) is referenced by another
/// file in the *same* repo (`Bar`), and no related projects are configured
/// at all.
pub struct MainRepoOnlyScenario {
    pub main_repo: GitRepo,
    pub base_commit: String,
    pub target_commit: String,
}

pub fn main_repo_only_scenario() -> Result<MainRepoOnlyScenario, FixtureError> {
    let main_repo = GitRepo::init(scratch_dir("selfref_main"), "master")?;
    main_repo.write_file("src/main/java/com/example/core/Foo.java", &java::foo_v1())?;
    main_repo.write_file(
        "src/main/java/com/example/core/Bar.java",
        &java::bar_referencing_foo(),
    )?;
    let base_commit = main_repo.commit("add foo and bar")?;
    main_repo.write_file("src/main/java/com/example/core/Foo.java", &java::foo_v2())?;
    let target_commit = main_repo.commit("change foo")?;

    Ok(MainRepoOnlyScenario {
        main_repo,
        base_commit,
        target_commit,
    })
}
