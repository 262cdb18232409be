use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use fibreg::{Algorithm, SequenceId, SequenceRecord, SequenceStatus};
use serde::Serialize;
use serde_json::value::RawValue;

/// Snapshot of a record as served by `/find/{id}`.
///
/// `fib` is written as a bare JSON number of arbitrary length. `fib` and
/// `duration` are `null` while the computation is pending. A failed record
/// keeps `fib` null and carries the failure in `error`.
#[derive(Debug, Serialize)]
pub struct SequenceResponse {
    pub id: SequenceId,
    pub input: u64,
    pub algo: Algorithm,
    pub status: SequenceStatus,
    pub fib: Option<Box<RawValue>>,
    /// Microseconds from submission to completion.
    pub duration: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TryFrom<&SequenceRecord> for SequenceResponse {
    type Error = ApiError;

    fn try_from(record: &SequenceRecord) -> Result<Self, Self::Error> {
        let fib = record
            .result()
            .map(|value| RawValue::from_string(value.to_string()))
            .transpose()
            .map_err(|e| ApiError::Internal(e.to_string()))?;
        let duration = record
            .elapsed()
            .map(|elapsed| u64::try_from(elapsed.as_micros()).unwrap_or(u64::MAX));

        Ok(Self {
            id: record.id(),
            input: record.input(),
            algo: record.algorithm(),
            status: record.status(),
            fib,
            duration,
            error: record.failure().map(str::to_owned),
        })
    }
}

/// Body of every error and status message.
#[derive(Debug, Serialize)]
pub struct MessageBody {
    pub message: String,
}

impl MessageBody {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    #[error("Please provide valid algorithm: math, recursive, iterate. Got: {0}")]
    InvalidAlgorithm(String),

    #[error("Please provide a valid input number. (Numbers greater than 0 and less than {max} only)")]
    InvalidInput { max: u64 },

    #[error("Please provide valid identifier. (Numbers greater than 0 only)")]
    InvalidId,

    #[error("There is no sequence with the given identifier")]
    NotFound,

    #[error("Please provide a valid endpoint")]
    InvalidEndpoint,

    #[error("Method is not supported")]
    UnsupportedMethod,

    #[error("Service is shutting down")]
    ShuttingDown,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::InvalidAlgorithm(_) | Self::InvalidInput { .. } | Self::InvalidId => {
                StatusCode::BAD_REQUEST
            }
            Self::NotFound | Self::InvalidEndpoint | Self::UnsupportedMethod => {
                StatusCode::NOT_FOUND
            }
            Self::ShuttingDown => StatusCode::SERVICE_UNAVAILABLE,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<fibreg::Error> for ApiError {
    fn from(err: fibreg::Error) -> Self {
        match err {
            fibreg::Error::NotFound { .. } => Self::NotFound,
            fibreg::Error::ServiceShutdown => Self::ShuttingDown,
            fibreg::Error::UnknownAlgorithm { name } => Self::InvalidAlgorithm(name),
            other => Self::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if matches!(self, Self::Internal(_)) {
            tracing::error!("{self}");
        } else {
            tracing::debug!("Rejected request: {self}");
        }
        (status, Json(MessageBody::new(self.to_string()))).into_response()
    }
}
