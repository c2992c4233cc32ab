use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use bytes::Bytes;

/// `"ok"` — the fixed success body for every write endpoint.
pub fn ok_response() -> Response {
    (StatusCode::OK, "ok").into_response()
}

/// Raw value bytes with `Content-Type: text/plain`, as returned by `/get`.
pub fn value_response(value: Bytes) -> Response {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain")],
        value,
    )
        .into_response()
}

pub fn json_response<T: serde::Serialize>(value: &T) -> Response {
    (StatusCode::OK, axum::Json(value)).into_response()
}
