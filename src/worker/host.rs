//! Hosts builds off the caller's thread
//!
//! Each job runs on tokio's blocking pool. The caller waits up to the
//! configured timeout; a panic, a cancelled task or an expired timeout each
//! surface as their own `WorkerError`, never as an empty result.
//!
//! A blocking build cannot be interrupted in-process. After a fatal error the
//! hosting process is expected to exit; `WorkerHost` makes that exit prompt by
//! abandoning, not joining, jobs still running when it is dropped.

use super::dispatch::dispatch;
use super::message::{Operation, Request, Response};
use super::{WorkerError, WorkerResult};
use crate::chains::ChainsResult;
use crate::config::WorkerConfig;
use std::any::Any;
use std::future::Future;
use std::time::Duration;
use tokio::runtime::Runtime;
use tracing::{debug, warn};

#[derive(Debug, Clone)]
pub struct ChainWorker {
    timeout: Duration,
}

impl ChainWorker {
    pub fn new(config: &WorkerConfig) -> Self {
        Self::with_timeout(config.timeout())
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self { timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Run one operation to completion, or fail.
    pub async fn run(&self, operation: Operation) -> WorkerResult<ChainsResult> {
        let function = operation.function();
        let relationships = operation.relationship_count();
        debug!(?function, relationships, "dispatching chain job");
        self.run_blocking(move || dispatch(operation)).await
    }

    /// Decode-free entry point: request in, `[error, result]` out.
    pub async fn handle(&self, request: Request) -> Response {
        self.run(request.into_operation()).await.into()
    }

    /// Decode one JSON request and run it.
    pub async fn respond(&self, raw: &str) -> Response {
        match serde_json::from_str::<Request>(raw) {
            Ok(request) => self.handle(request).await,
            Err(e) => {
                let err = WorkerError::Decode(e);
                warn!(error = %err, "rejecting undecodable request");
                Response::failure(&err)
            }
        }
    }

    /// Full wire round trip for one JSON request line.
    pub async fn handle_message(&self, raw: &str) -> String {
        encode_response(&self.respond(raw).await)
    }

    pub(crate) async fn run_blocking<F>(&self, job: F) -> WorkerResult<ChainsResult>
    where
        F: FnOnce() -> ChainsResult + Send + 'static,
    {
        let handle = tokio::task::spawn_blocking(job);

        // The blocking thread cannot be interrupted; on timeout its eventual
        // result is dropped.
        match tokio::time::timeout(self.timeout, handle).await {
            Ok(Ok(result)) => Ok(result),
            Ok(Err(join_err)) if join_err.is_panic() => {
                let message = panic_message(join_err.into_panic());
                warn!(%message, "chain job crashed");
                Err(WorkerError::Crashed(message))
            }
            Ok(Err(_)) => {
                warn!("chain job cancelled");
                Err(WorkerError::Cancelled)
            }
            Err(_) => {
                warn!(timeout = ?self.timeout, "chain job timed out");
                Err(WorkerError::TimedOut {
                    after: self.timeout,
                })
            }
        }
    }
}

impl Default for ChainWorker {
    fn default() -> Self {
        Self::new(&WorkerConfig::default())
    }
}

/// A `ChainWorker` together with the runtime its jobs run on.
///
/// Dropping the host shuts the runtime down in the background, so a job that
/// outlived its timeout never holds up process exit.
pub struct WorkerHost {
    runtime: Option<Runtime>,
    worker: ChainWorker,
}

impl WorkerHost {
    pub fn new(worker: ChainWorker) -> std::io::Result<Self> {
        Ok(Self {
            runtime: Some(Runtime::new()?),
            worker,
        })
    }

    pub fn worker(&self) -> &ChainWorker {
        &self.worker
    }

    pub fn run(&self, operation: Operation) -> WorkerResult<ChainsResult> {
        self.block_on(self.worker.run(operation))
    }

    pub fn handle(&self, request: Request) -> Response {
        self.block_on(self.worker.handle(request))
    }

    pub fn respond(&self, raw: &str) -> Response {
        self.block_on(self.worker.respond(raw))
    }

    pub(crate) fn run_job<F>(&self, job: F) -> WorkerResult<ChainsResult>
    where
        F: FnOnce() -> ChainsResult + Send + 'static,
    {
        self.block_on(self.worker.run_blocking(job))
    }

    fn block_on<F: Future>(&self, future: F) -> F::Output {
        match self.runtime.as_ref() {
            Some(rt) => rt.block_on(future),
            None => unreachable!("runtime is only taken when the host is dropped"),
        }
    }
}

impl Drop for WorkerHost {
    fn drop(&mut self) {
        if let Some(rt) = self.runtime.take() {
            rt.shutdown_background();
        }
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

pub fn encode_response(response: &Response) -> String {
    match serde_json::to_string(response) {
        Ok(s) => s,
        Err(e) => {
            let fallback = Response::failure(&WorkerError::Encode(e));
            serde_json::to_string(&fallback)
                .unwrap_or_else(|_| r#"[{"code":"encode","message":"unencodable response"},null]"#.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chains::ChainCount;
    use crate::worker::Function;
    use chrono::{TimeZone, Utc};
    use serde_json::{json, Value};

    #[tokio::test]
    async fn runs_operation() {
        let worker = ChainWorker::default();
        let now = Utc.with_ymd_and_hms(2021, 1, 1, 0, 0, 0).unwrap();
        let result = worker
            .run(Request::new(Function::Count, Vec::new(), 7).at(now).into_operation())
            .await
            .unwrap();
        assert_eq!(result, ChainsResult::Count(ChainCount::empty()));
    }

    #[tokio::test]
    async fn panic_is_reported_as_crash() {
        let worker = ChainWorker::default();
        let err = worker
            .run_blocking(|| panic!("out of memory"))
            .await
            .unwrap_err();
        match err {
            WorkerError::Crashed(message) => assert_eq!(message, "out of memory"),
            other => panic!("expected crash, got {other}"),
        }
    }

    #[tokio::test]
    async fn slow_job_times_out() {
        let worker = ChainWorker::with_timeout(Duration::from_millis(20));
        let err = worker
            .run_blocking(|| {
                std::thread::sleep(Duration::from_millis(500));
                ChainsResult::Count(ChainCount::empty())
            })
            .await
            .unwrap_err();
        assert!(matches!(err, WorkerError::TimedOut { .. }));
        assert_eq!(err.code(), "timed_out");
    }

    #[tokio::test]
    async fn timed_out_job_fills_error_slot() {
        let worker = ChainWorker::with_timeout(Duration::from_millis(20));
        let response = Response::from(
            worker
                .run_blocking(|| {
                    std::thread::sleep(Duration::from_millis(500));
                    ChainsResult::Count(ChainCount::empty())
                })
                .await,
        );

        assert!(!response.is_success());
        assert!(response.is_fatal());
        assert_eq!(response.1, None);
        assert_eq!(response.into_result().unwrap_err().code, "timed_out");
    }

    #[test]
    fn dropping_host_abandons_timed_out_job() {
        let host = WorkerHost::new(ChainWorker::with_timeout(Duration::from_millis(20))).unwrap();
        let err = host
            .run_job(|| {
                std::thread::sleep(Duration::from_secs(3));
                ChainsResult::Count(ChainCount::empty())
            })
            .unwrap_err();
        assert!(matches!(err, WorkerError::TimedOut { .. }));
        assert!(err.is_fatal());

        let started = std::time::Instant::now();
        drop(host);
        assert!(
            started.elapsed() < Duration::from_secs(1),
            "drop waited {:?} for the abandoned job",
            started.elapsed()
        );
    }

    #[test]
    fn host_runs_requests_to_completion() {
        let host = WorkerHost::new(ChainWorker::default()).unwrap();
        let response = host.respond(r#"{"fn": "count", "args": [[], 7]}"#);
        assert!(response.is_success());
        assert!(!response.is_fatal());

        let undecodable = host.respond("[]");
        assert_eq!(undecodable.0.as_ref().map(|e| e.code.as_str()), Some("decode"));
        assert!(!undecodable.is_fatal());
    }

    #[tokio::test]
    async fn handle_message_round_trip() {
        let worker = ChainWorker::default();
        let raw = json!({
            "fn": "count",
            "args": [[{
                "id": "r1",
                "persons": [{"id": "a", "type": "case"}, {"id": "b", "type": "contact"}],
                "contactDate": "2020-03-30T00:00:00Z"
            }], 7],
            "now": "2020-04-01T00:00:00Z"
        })
        .to_string();

        let out: Value = serde_json::from_str(&worker.handle_message(&raw).await).unwrap();
        assert_eq!(
            out,
            json!([null, {"chains": [{"length": 1, "active": true}], "length": 1, "activeChains": 1}])
        );
    }

    #[tokio::test]
    async fn garbage_request_yields_error_slot() {
        let worker = ChainWorker::default();
        let out: Value = serde_json::from_str(&worker.handle_message("{not json").await).unwrap();
        assert_eq!(out[0]["code"], json!("decode"));
        assert_eq!(out[1], Value::Null);
    }
}
