//! Test-only helpers for generating synthetic multi-repo Git/Java fixtures
//! used by the scenario integration tests.

pub mod java;
pub mod scenarios;
pub mod synth_repo;
