use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

/// The error taxonomy for the whole system. Every fallible HTTP handler
/// returns `Result<_, ApiError>` and this is the single place that decides
/// what status code a client sees for each one.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("key or value is empty")]
    BadRequest,

    #[error("not the leader{}", .leader_hint.as_ref().map(|a| format!(": try {a}")).unwrap_or_default())]
    NotLeader { leader_hint: Option<String> },

    #[error("timeout")]
    ApplyTimeout,

    #[error("apply rejected: {0}")]
    ApplyRejected(String),

    #[error("key not found")]
    NotFound,

    #[error("unreachable: {0}")]
    Unreachable(String),

    #[error("malformed command: {0}")]
    MalformedCommand(String),

    #[error("corrupt snapshot: {0}")]
    CorruptSnapshot(String),

    #[error("no shards configured")]
    NoShardsConfigured,

    #[error("no config server reachable")]
    NoConfigServerReachable,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::BadRequest => StatusCode::BAD_REQUEST,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::NotLeader { .. }
            | ApiError::ApplyTimeout
            | ApiError::ApplyRejected(_)
            | ApiError::Unreachable(_)
            | ApiError::MalformedCommand(_)
            | ApiError::CorruptSnapshot(_)
            | ApiError::NoShardsConfigured
            | ApiError::NoConfigServerReachable => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, self.to_string()).into_response()
    }
}
