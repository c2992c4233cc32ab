use std::sync::Arc;

use axum::extract::{Query, State};
use axum::response::Response;
use bytes::Bytes;
use common::{ApiError, Command};
use consensus::{ApplyError, EngineState};
use rsm::{ShardMap, StateMachine};
use serde::Deserialize;
use serde_json::json;

use crate::http::{json_response, ok_response, value_response};
use crate::state::{ReplicaState, APPLY_TIMEOUT};

fn apply_err(e: ApplyError) -> ApiError {
    match e {
        ApplyError::Timeout => ApiError::ApplyTimeout,
        ApplyError::NotLeader { leader_hint } => ApiError::NotLeader { leader_hint },
        ApplyError::Rejected(msg) => ApiError::ApplyRejected(msg),
    }
}

#[derive(Deserialize)]
pub struct KeyValQuery {
    key: String,
    val: String,
}

#[derive(Deserialize)]
pub struct KeyQuery {
    key: String,
}

pub async fn put_handler(
    State(state): State<Arc<ReplicaState>>,
    Query(q): Query<KeyValQuery>,
) -> Result<Response, ApiError> {
    if q.key.is_empty() || q.val.is_empty() {
        return Err(ApiError::BadRequest);
    }
    tracing::info!(key = %q.key, "put");

    let command = Command::Put {
        key: q.key,
        value: Bytes::from(q.val),
    };
    state.engine.apply(command, APPLY_TIMEOUT).await.map_err(apply_err)?;
    Ok(ok_response())
}

pub async fn get_handler(
    State(state): State<Arc<ReplicaState>>,
    Query(q): Query<KeyQuery>,
) -> Result<Response, ApiError> {
    if q.key.is_empty() {
        return Err(ApiError::BadRequest);
    }

    match state.sm.get(&q.key) {
        Some(value) => {
            tracing::info!(key = %q.key, "get hit");
            Ok(value_response(value))
        }
        None => Err(ApiError::NotFound),
    }
}

pub async fn delete_handler(
    State(state): State<Arc<ReplicaState>>,
    Query(q): Query<KeyQuery>,
) -> Result<Response, ApiError> {
    if q.key.is_empty() {
        return Err(ApiError::BadRequest);
    }
    tracing::info!(key = %q.key, "delete");

    let command = Command::Delete { key: q.key };
    state.engine.apply(command, APPLY_TIMEOUT).await.map_err(apply_err)?;
    Ok(ok_response())
}

#[derive(Deserialize)]
pub struct JoinQuery {
    id: u64,
    address: String,
}

pub async fn raft_join_handler(
    State(state): State<Arc<ReplicaState>>,
    Query(q): Query<JoinQuery>,
) -> Result<Response, ApiError> {
    state.engine.add_voter(q.id, q.address).await.map_err(apply_err)?;
    Ok(json_response(&json!({ "status": "ok" })))
}

#[derive(Deserialize)]
pub struct LeaveQuery {
    id: u64,
}

pub async fn raft_leave_handler(
    State(state): State<Arc<ReplicaState>>,
    Query(q): Query<LeaveQuery>,
) -> Result<Response, ApiError> {
    state.engine.remove_server(q.id).await.map_err(apply_err)?;
    Ok(json_response(&json!({ "status": "ok" })))
}

pub async fn raft_status_handler(State(state): State<Arc<ReplicaState>>) -> Response {
    let body = json!({
        "leader": state.engine.leader(),
        "state": leader_hint_for_state(state.engine.state()),
        "stats": state.engine.stats(),
    });
    json_response(&body)
}

// --- configuration-service-only endpoints ---

pub async fn config_handler(State(state): State<Arc<ReplicaState>>) -> Response {
    let shard_map = ShardMap::from_state_machine(&state.sm);
    json_response(&shard_map)
}

#[derive(Deserialize)]
pub struct ShardQuery {
    #[serde(rename = "shardID")]
    shard_id: String,
    #[serde(rename = "shardAddress")]
    shard_address: String,
}

async fn apply_shard_update(state: &ReplicaState, q: ShardQuery) -> Result<Response, ApiError> {
    if q.shard_id.is_empty() || q.shard_address.is_empty() {
        return Err(ApiError::BadRequest);
    }
    let command = Command::Put {
        key: q.shard_id,
        value: Bytes::from(q.shard_address),
    };
    state.engine.apply(command, APPLY_TIMEOUT).await.map_err(apply_err)?;
    Ok(ok_response())
}

pub async fn addshard_handler(
    State(state): State<Arc<ReplicaState>>,
    Query(q): Query<ShardQuery>,
) -> Result<Response, ApiError> {
    apply_shard_update(&state, q).await
}

pub async fn newleader_handler(
    State(state): State<Arc<ReplicaState>>,
    Query(q): Query<ShardQuery>,
) -> Result<Response, ApiError> {
    tracing::info!(shard_id = %q.shard_id, shard_address = %q.shard_address, "new leader reported");
    apply_shard_update(&state, q).await
}

pub fn leader_hint_for_state(state: EngineState) -> &'static str {
    match state {
        EngineState::Leader => "leader",
        EngineState::Follower => "follower",
        EngineState::Candidate => "candidate",
        EngineState::Shutdown => "shutdown",
    }
}
