//! Orchestration core for the cross-project impact engine.
//!
//! Coordinates Git materialization, Java symbol indexing, multi-project
//! tracing, and LLM-backed report assembly for one [`cpi_api::AnalysisTask`]
//! at a time, without any CLI/IPC/UI dependencies.

pub mod config;
pub mod diff;
pub mod engine;
pub mod llm;
pub mod materializer;
pub mod orchestrator;
pub mod prompt;
pub mod store;
pub mod telemetry;
pub mod tracer;

pub use config::EngineConfig;
pub use engine::Engine;
pub use orchestrator::{run, CancellationToken};
