//! Single-shot CLI for the cross-project impact engine.
//!
//! Runs one [`cpi_api::AnalysisTask`] to completion and prints its final
//! status plus every per-file report as JSON. By default output is compact;
//! use `--pretty` for human-readable output. Exit codes: `0` task completed,
//! `2` task failed, `3` configuration error.

use clap::Parser;
use cpi_api::{AnalysisTask, Error, ErrorCode, ProjectRelation};
use cpi_core::llm::StubLlmClient;
use cpi_core::store::InMemoryTaskStore;
use cpi_core::telemetry::new_task_id;
use cpi_core::{Engine, EngineConfig};
use cpi_git::CliBackend;
use serde::Serialize;
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "cpi")]
#[command(about = "Cross-project impact analysis for a single repo diff")]
#[command(version)]
struct Cli {
    /// Clone URL of the main repository under analysis
    main_git_url: String,

    /// Branch to materialize the main repo at
    target_branch: String,

    /// Base commit (old side of the diff)
    base_commit: String,

    /// Target commit (new side of the diff)
    target_commit: String,

    /// Trace references into related repositories
    #[arg(long)]
    enable_cross_project: bool,

    /// Path to a JSON file containing a list of related project relations
    #[arg(long)]
    related_projects: Option<PathBuf>,

    /// Path to a TOML config file (defaults to `CPI_CONFIG` env var, if set)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Output pretty-printed JSON instead of compact JSON
    #[arg(long)]
    pretty: bool,

    /// Log filter (e.g., debug, cpi_core=trace, cpi_git=debug)
    #[arg(long)]
    log: Option<String>,

    /// Output logs as JSON
    #[arg(long)]
    log_json: bool,
}

#[derive(Serialize)]
struct CliOutput {
    task: AnalysisTask,
    reports: Vec<cpi_api::AnalysisReport>,
}

#[derive(Serialize)]
struct CliErrorOutput {
    error: Error,
}

fn print_json<T: Serialize>(value: &T, pretty: bool) -> io::Result<()> {
    let json = if pretty {
        serde_json::to_string_pretty(value).expect("CLI output types always serialize")
    } else {
        serde_json::to_string(value).expect("CLI output types always serialize")
    };
    writeln!(io::stdout(), "{json}")
}

fn load_related_projects(path: &PathBuf) -> Result<Vec<ProjectRelation>, Error> {
    let contents = std::fs::read_to_string(path).map_err(|e| {
        Error::new(
            ErrorCode::ConfigError,
            format!("failed to read related projects file {}: {e}", path.display()),
        )
    })?;
    serde_json::from_str(&contents).map_err(|e| {
        Error::new(
            ErrorCode::ConfigError,
            format!("failed to parse related projects file {}: {e}", path.display()),
        )
    })
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    cpi_core::telemetry::init_telemetry(cli.log.as_deref(), cli.log_json);

    let config = match EngineConfig::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            let _ = print_json(&CliErrorOutput { error: e }, cli.pretty);
            std::process::exit(3);
        }
    };

    let related_projects = match &cli.related_projects {
        Some(path) => match load_related_projects(path) {
            Ok(relations) => relations,
            Err(e) => {
                let _ = print_json(&CliErrorOutput { error: e }, cli.pretty);
                std::process::exit(3);
            }
        },
        None => Vec::new(),
    };

    let mut task = AnalysisTask::new(
        new_task_id(),
        cli.main_git_url,
        cli.target_branch,
        cli.base_commit,
        cli.target_commit,
    );
    task.enable_cross_project = cli.enable_cross_project;
    task.related_projects = related_projects;

    let engine = Engine::new(
        config,
        Arc::new(InMemoryTaskStore::new()),
        Arc::new(CliBackend::new()),
        Arc::new(StubLlmClient),
    );

    match engine.run_task_to_completion(task).await {
        Ok((task, reports)) => {
            print_json(&CliOutput { task, reports }, cli.pretty).expect("failed to write to stdout");
        }
        Err(e) => {
            let _ = print_json(&CliErrorOutput { error: e }, cli.pretty);
            std::process::exit(2);
        }
    }
}
