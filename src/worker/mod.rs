//! Worker boundary: request/response contract and job hosting

mod dispatch;
mod host;
mod message;

pub use dispatch::dispatch;
pub use host::{encode_response, ChainWorker, WorkerHost};
pub use message::{Args, Function, Operation, Request, Response, ResponseError};

use std::time::Duration;
use thiserror::Error;

/// Failures at the worker boundary.
///
/// The chain builder itself never fails; everything here comes from
/// decoding, hosting or encoding.
#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("Invalid request: {0}")]
    Decode(#[source] serde_json::Error),

    #[error("Could not encode response: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("Worker crashed: {0}")]
    Crashed(String),

    #[error("Worker timed out after {after:?}")]
    TimedOut { after: Duration },

    #[error("Worker job was cancelled")]
    Cancelled,
}

impl WorkerError {
    /// Stable machine-readable code for the response error slot.
    pub fn code(&self) -> &'static str {
        match self {
            WorkerError::Decode(_) => "decode",
            WorkerError::Encode(_) => "encode",
            WorkerError::Crashed(_) => "crashed",
            WorkerError::TimedOut { .. } => "timed_out",
            WorkerError::Cancelled => "cancelled",
        }
    }

    /// Whether the hosting process may still be running an abandoned job
    /// and should exit once the error has been reported.
    pub fn is_fatal(&self) -> bool {
        is_fatal_code(self.code())
    }
}

pub(crate) fn is_fatal_code(code: &str) -> bool {
    matches!(code, "crashed" | "timed_out" | "cancelled")
}

pub type WorkerResult<T> = Result<T, WorkerError>;
