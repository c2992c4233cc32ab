use std::sync::Arc;

use axum::extract::{Query, State};
use axum::response::{IntoResponse, Response};
use common::ApiError;
use serde::Deserialize;

use crate::config_client::fetch_config;
use crate::hash::shard_index_from_key;
use crate::state::RouterState;

async fn resolve_shard_address(state: &RouterState, key: &str) -> Result<String, ApiError> {
    let config = fetch_config(&state.client, &state.config_server_ports)
        .await
        .map_err(|e| {
            tracing::warn!(%e, "failed to fetch shard config from any config server");
            ApiError::NoConfigServerReachable
        })?;

    if config.shard_count == 0 {
        return Err(ApiError::NoShardsConfigured);
    }

    // Shard ids in the config map are 1-based; bucket indices are 0-based.
    let shard_id = shard_index_from_key(key, config.shard_count) + 1;

    config
        .http_address_of(shard_id)
        .ok_or(ApiError::NoShardsConfigured)
}

#[derive(Deserialize)]
pub struct KeyQuery {
    key: String,
}

#[derive(Deserialize)]
pub struct KeyValQuery {
    key: String,
    val: String,
}

pub async fn get_handler(
    State(state): State<Arc<RouterState>>,
    Query(q): Query<KeyQuery>,
) -> Result<Response, ApiError> {
    if q.key.is_empty() {
        return Err(ApiError::BadRequest);
    }

    let address = resolve_shard_address(&state, &q.key).await?;
    let url = format!("http://{address}/get?key={}", q.key);
    let resp = state
        .client
        .get(&url)
        .send()
        .await
        .map_err(|e| ApiError::Unreachable(e.to_string()))?;
    forward_response(resp).await
}

pub async fn put_handler(
    State(state): State<Arc<RouterState>>,
    Query(q): Query<KeyValQuery>,
) -> Result<Response, ApiError> {
    if q.key.is_empty() || q.val.is_empty() {
        return Err(ApiError::BadRequest);
    }

    let address = resolve_shard_address(&state, &q.key).await?;
    let url = format!("http://{address}/put?key={}&val={}", q.key, q.val);
    let resp = state
        .client
        .post(&url)
        .send()
        .await
        .map_err(|e| ApiError::Unreachable(e.to_string()))?;
    forward_response(resp).await
}

pub async fn delete_handler(
    State(state): State<Arc<RouterState>>,
    Query(q): Query<KeyQuery>,
) -> Result<Response, ApiError> {
    if q.key.is_empty() {
        return Err(ApiError::BadRequest);
    }

    let address = resolve_shard_address(&state, &q.key).await?;
    let url = format!("http://{address}/delete?key={}", q.key);
    let resp = state
        .client
        .delete(&url)
        .send()
        .await
        .map_err(|e| ApiError::Unreachable(e.to_string()))?;
    forward_response(resp).await
}

pub async fn status_handler(State(state): State<Arc<RouterState>>) -> Result<Response, ApiError> {
    let config = fetch_config(&state.client, &state.config_server_ports)
        .await
        .map_err(|e| {
            tracing::warn!(%e, "failed to fetch shard config from any config server");
            ApiError::NoConfigServerReachable
        })?;
    Ok((axum::http::StatusCode::OK, config.shard_count.to_string()).into_response())
}

/// Copies an upstream replica's status and body through to the router's own
/// client verbatim, rather than reinterpreting it.
async fn forward_response(resp: reqwest::Response) -> Result<Response, ApiError> {
    let status = axum::http::StatusCode::from_u16(resp.status().as_u16())
        .unwrap_or(axum::http::StatusCode::INTERNAL_SERVER_ERROR);
    let body = resp
        .bytes()
        .await
        .map_err(|e| ApiError::Unreachable(e.to_string()))?;
    Ok((status, body).into_response())
}
