//! Task-scoped structured logging. Every analysis task gets its own
//! span carrying `task_id`/`main_git_url`/`target_branch`, and every
//! recoverable error or milestone inside that span is *also* appended to the
//! task's own log via [`crate::store::TaskStore::append_log`] — tracing
//! alone would leave operators with no durable per-task record.

use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{info_span, Span};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

static TASK_COUNTER: AtomicU64 = AtomicU64::new(0);

pub fn init_telemetry(filter: Option<&str>, json: bool) {
    let filter = filter.unwrap_or("info");
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter));

    let registry = tracing_subscriber::registry().with(filter);
    let fmt_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    if json {
        let _ = registry.with(fmt_layer.json()).try_init();
    } else {
        let _ = registry.with(fmt_layer).try_init();
    }
}

pub fn new_task_id() -> String {
    let counter = TASK_COUNTER.fetch_add(1, Ordering::Relaxed);
    let timestamp = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_millis();
    format!("task_{timestamp}_{counter}")
}

#[derive(Debug)]
pub struct TaskSpan {
    span: Span,
}

impl TaskSpan {
    pub fn new(task_id: &str, main_git_url: &str, target_branch: &str) -> Self {
        let span = info_span!(
            "analysis_task",
            task_id = task_id,
            main_git_url = main_git_url,
            target_branch = target_branch
        );
        Self { span }
    }

    pub fn enter(&self) -> Span {
        self.span.clone()
    }
}

#[macro_export]
macro_rules! step {
    ($name:expr, $block:block) => {{
        let span = tracing::info_span!($name);
        let _enter = span.enter();

        async {
            let start = std::time::Instant::now();
            let result = $block;
            let elapsed_ms = start.elapsed().as_nanos() as f64 / 1_000_000.0;

            match &result {
                Ok(_) => {
                    tracing::info!(elapsed_ms = elapsed_ms, "step completed");
                }
                Err(e) => {
                    tracing::error!(elapsed_ms = elapsed_ms, error = %e, "step failed");
                }
            }

            result
        }
        .await
    }};
}
