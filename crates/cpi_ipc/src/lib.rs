//! JSON-line transport for the cross-project impact engine.
//!
//! Maps [`cpi_api::Request`] to [`cpi_core::Engine`] calls over stdio, one
//! JSON object per line in, one JSON object per line out. A `RunAnalysis`
//! request starts the task on a background worker and returns immediately;
//! progress is polled via `GetTask`/`ListReports`.

use cpi_api::entities::AnalysisTask;
use cpi_api::request::RequestPayload;
use cpi_api::response::{
    CancelTaskResponse, ReportsResponse, ResponsePayload, RunAnalysisResponse, TaskResponse, TasksResponse,
};
use cpi_api::{ApiVersion, Cursor, Error, ErrorCode, Request, Response};
use cpi_core::telemetry::new_task_id;
use cpi_core::Engine;
use std::io::{self, BufRead, Write};

pub struct IpcServer {
    engine: Engine,
}

impl IpcServer {
    pub fn new(engine: Engine) -> Self {
        Self { engine }
    }

    /// Runs the server, reading one request per line from `input` and
    /// writing one response per line to `output`, until EOF.
    pub async fn run(self, input: impl BufRead, mut output: impl Write) -> io::Result<()> {
        for line in input.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let response = self.handle_line(&line).await;
            let response_json = serde_json::to_string(&response).unwrap_or_else(|e| {
                format!(r#"{{"version":"v0","id":"unknown","payload":{{"error":{{"code":"internal","message":"failed to serialize response: {e}"}}}}}}"#)
            });
            writeln!(output, "{response_json}")?;
            output.flush()?;
        }
        Ok(())
    }

    async fn handle_line(&self, line: &str) -> Response {
        let request: Request = match serde_json::from_str(line) {
            Ok(req) => req,
            Err(e) => {
                return Response {
                    version: ApiVersion::V0,
                    id: "unknown".to_string(),
                    payload: ResponsePayload::Error(Error::new(
                        ErrorCode::InvalidRequest,
                        format!("failed to parse request: {e}"),
                    )),
                }
            }
        };

        let payload = self.handle_payload(request.payload).await;
        Response {
            version: ApiVersion::V0,
            id: request.id,
            payload,
        }
    }

    async fn handle_payload(&self, payload: RequestPayload) -> ResponsePayload {
        let result = match payload {
            RequestPayload::RunAnalysis(req) => self.run_analysis(req).await,
            RequestPayload::GetTask(req) => self
                .engine
                .get_task(&req.task_id)
                .await
                .map(|task| ResponsePayload::Task(TaskResponse { task })),
            RequestPayload::ListTasks(req) => self.list_tasks(req).await,
            RequestPayload::ListReports(req) => self.list_reports(req).await,
            RequestPayload::CancelTask(req) => {
                let cancelled = self.engine.cancel_task(&req.task_id).await;
                Ok(ResponsePayload::CancelTask(CancelTaskResponse { cancelled }))
            }
        };

        match result {
            Ok(payload) => payload,
            Err(e) => ResponsePayload::Error(e),
        }
    }

    async fn run_analysis(
        &self,
        req: cpi_api::request::RunAnalysisRequest,
    ) -> Result<ResponsePayload, Error> {
        let mut task = AnalysisTask::new(
            new_task_id(),
            req.main_git_url,
            req.target_branch,
            req.base_commit,
            req.target_commit,
        );
        task.enable_cross_project = req.enable_cross_project;
        task.related_projects = req.related_projects;
        let task_id = self.engine.spawn_task(task).await?;
        Ok(ResponsePayload::RunAnalysis(RunAnalysisResponse { task_id }))
    }

    async fn list_tasks(&self, req: cpi_api::request::ListTasksRequest) -> Result<ResponsePayload, Error> {
        let tasks = self.engine.list_tasks().await?;
        let (page, next_cursor) = paginate(tasks, &req.paging);
        Ok(ResponsePayload::Tasks(TasksResponse {
            tasks: page,
            next_cursor,
        }))
    }

    async fn list_reports(&self, req: cpi_api::request::ListReportsRequest) -> Result<ResponsePayload, Error> {
        let reports = self.engine.list_reports(&req.task_id).await?;
        let (page, next_cursor) = paginate(reports, &req.paging);
        Ok(ResponsePayload::Reports(ReportsResponse {
            reports: page,
            next_cursor,
        }))
    }
}

/// Offset-encoded cursor paging: `cursor` is the decimal string offset into
/// `items` to resume from. Good enough for a transport this thin; a real
/// store-backed cursor would encode something stabler than a raw index.
fn paginate<T>(items: Vec<T>, paging: &cpi_api::Paging) -> (Vec<T>, Option<Cursor>) {
    let offset: usize = paging.cursor.get().parse().unwrap_or(0);
    let page_size = paging.page_size.get() as usize;
    let end = offset.saturating_add(page_size).min(items.len());
    let start = offset.min(items.len());
    let next_cursor = if end < items.len() {
        Some(Cursor::from(end.to_string()))
    } else {
        None
    };
    let page = items.into_iter().skip(start).take(end - start).collect();
    (page, next_cursor)
}
