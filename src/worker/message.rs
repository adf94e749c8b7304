//! Wire contract for the worker boundary
//!
//! Request:  `{"fn": "build" | "count", "args": [relationships, followUpPeriod], "now"?: "<RFC 3339>"}`
//! Response: `[error, result]`, `error` is `null` on success.

use super::{is_fatal_code, WorkerError};
use crate::chains::ChainsResult;
use crate::graph::Relationship;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Function named by a request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Function {
    Build,
    Count,
}

/// Positional arguments: `(relationships, followUpPeriod)`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Args(pub Vec<Relationship>, pub u32);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Request {
    #[serde(rename = "fn")]
    pub function: Function,
    pub args: Args,
    /// Pins the clock used for the activity window
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub now: Option<DateTime<Utc>>,
}

impl Request {
    pub fn new(function: Function, relationships: Vec<Relationship>, follow_up_period: u32) -> Self {
        Self {
            function,
            args: Args(relationships, follow_up_period),
            now: None,
        }
    }

    pub fn at(mut self, now: DateTime<Utc>) -> Self {
        self.now = Some(now);
        self
    }

    /// Resolve the request into an operation, reading the clock if `now` is unset.
    pub fn into_operation(self) -> Operation {
        let Args(relationships, follow_up_period) = self.args;
        let now = self.now.unwrap_or_else(Utc::now);
        match self.function {
            Function::Build => Operation::Build {
                relationships,
                follow_up_period,
                now,
            },
            Function::Count => Operation::Count {
                relationships,
                follow_up_period,
                now,
            },
        }
    }
}

/// One fully-resolved unit of work
#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    Build {
        relationships: Vec<Relationship>,
        follow_up_period: u32,
        now: DateTime<Utc>,
    },
    Count {
        relationships: Vec<Relationship>,
        follow_up_period: u32,
        now: DateTime<Utc>,
    },
}

impl Operation {
    pub fn function(&self) -> Function {
        match self {
            Operation::Build { .. } => Function::Build,
            Operation::Count { .. } => Function::Count,
        }
    }

    pub fn relationship_count(&self) -> usize {
        match self {
            Operation::Build { relationships, .. } | Operation::Count { relationships, .. } => {
                relationships.len()
            }
        }
    }
}

/// Error slot of a response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseError {
    pub code: String,
    pub message: String,
}

impl ResponseError {
    /// See `WorkerError::is_fatal`.
    pub fn is_fatal(&self) -> bool {
        is_fatal_code(&self.code)
    }
}

impl From<&WorkerError> for ResponseError {
    fn from(err: &WorkerError) -> Self {
        Self {
            code: err.code().to_string(),
            message: err.to_string(),
        }
    }
}

/// `[error, result]` pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response(pub Option<ResponseError>, pub Option<ChainsResult>);

impl Response {
    pub fn success(result: ChainsResult) -> Self {
        Self(None, Some(result))
    }

    pub fn failure(err: &WorkerError) -> Self {
        Self(Some(ResponseError::from(err)), None)
    }

    pub fn is_success(&self) -> bool {
        self.0.is_none()
    }

    pub fn is_fatal(&self) -> bool {
        self.0.as_ref().map_or(false, ResponseError::is_fatal)
    }

    /// Check the error slot before looking at the result.
    pub fn into_result(self) -> Result<ChainsResult, ResponseError> {
        match self {
            Response(Some(err), _) => Err(err),
            Response(None, Some(result)) => Ok(result),
            Response(None, None) => Err(ResponseError {
                code: "empty_response".to_string(),
                message: "response carried neither error nor result".to_string(),
            }),
        }
    }
}

impl From<Result<ChainsResult, WorkerError>> for Response {
    fn from(outcome: Result<ChainsResult, WorkerError>) -> Self {
        match outcome {
            Ok(result) => Response::success(result),
            Err(err) => Response::failure(&err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chains::ChainCount;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn decodes_positional_args() {
        let raw = json!({
            "fn": "count",
            "args": [[{
                "id": "r1",
                "persons": [{"id": "a", "type": "case"}, {"id": "b", "type": "contact"}],
                "contactDate": "2020-04-01"
            }], 14],
            "now": "2020-04-10T00:00:00Z"
        });

        let request: Request = serde_json::from_value(raw).unwrap();
        assert_eq!(request.function, Function::Count);
        assert_eq!(request.args.1, 14);

        match request.into_operation() {
            Operation::Count {
                relationships,
                follow_up_period,
                now,
            } => {
                assert_eq!(relationships.len(), 1);
                assert_eq!(follow_up_period, 14);
                assert_eq!(now, Utc.with_ymd_and_hms(2020, 4, 10, 0, 0, 0).unwrap());
            }
            other => panic!("expected count, got {:?}", other.function()),
        }
    }

    #[test]
    fn unknown_function_is_rejected() {
        let raw = json!({"fn": "delete", "args": [[], 1]});
        assert!(serde_json::from_value::<Request>(raw).is_err());
    }

    #[test]
    fn negative_period_is_rejected() {
        let raw = json!({"fn": "build", "args": [[], -1]});
        assert!(serde_json::from_value::<Request>(raw).is_err());
    }

    #[test]
    fn success_serializes_null_error() {
        let response = Response::success(ChainsResult::Count(ChainCount::empty()));
        assert_eq!(
            serde_json::to_value(&response).unwrap(),
            json!([null, {"chains": [], "length": 0, "activeChains": 0}])
        );
    }

    #[test]
    fn failure_is_never_an_empty_result() {
        let err = WorkerError::TimedOut {
            after: std::time::Duration::from_secs(1),
        };
        let response = Response::failure(&err);
        assert!(!response.is_success());

        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value[0]["code"], json!("timed_out"));
        assert_eq!(value[1], json!(null));
        assert_eq!(response.into_result().unwrap_err().code, "timed_out");
    }

    #[test]
    fn response_without_either_slot_is_an_error() {
        assert!(Response(None, None).into_result().is_err());
    }
}
