use std::sync::Arc;

use axum::routing::{delete, get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::ReplicaState;

/// `/raft/join`, `/raft/leave`, `/raft/status` — present on every replica,
/// data or config.
fn membership_router(state: Arc<ReplicaState>) -> Router {
    Router::new()
        .route("/raft/join", post(handlers::raft_join_handler))
        .route("/raft/leave", post(handlers::raft_leave_handler))
        .route("/raft/status", get(handlers::raft_status_handler))
        .with_state(state)
}

/// `/raft/rpc` is mounted separately because it is keyed on the raw
/// `openraft::Raft` handle rather than `ReplicaState` — inter-replica RPCs
/// don't need the RSM or anything else a client-facing handler needs.
fn raft_rpc_router(raft: consensus::Raft) -> Router {
    Router::new()
        .route("/raft/rpc", post(consensus::rpc::raft_rpc_handler))
        .with_state(Arc::new(raft))
}

/// put/get/delete plus membership, without `/raft/rpc`. Split out from
/// [`data_replica_router`] so tests can exercise the client-facing surface
/// against an `InMemoryEngine` without standing up a real `openraft::Raft`.
pub fn data_replica_client_router(state: Arc<ReplicaState>) -> Router {
    let kv_routes = Router::new()
        .route("/put", post(handlers::put_handler))
        .route("/get", get(handlers::get_handler))
        .route("/delete", delete(handlers::delete_handler))
        .with_state(state.clone());

    kv_routes
        .merge(membership_router(state))
        .layer(TraceLayer::new_for_http())
}

/// The full data-replica surface: put/get/delete, membership, and
/// `/raft/rpc`.
pub fn data_replica_router(state: Arc<ReplicaState>, raft: consensus::Raft) -> Router {
    data_replica_client_router(state).merge(raft_rpc_router(raft))
}

/// The config-only endpoints plus membership, without `/raft/rpc`. Same
/// split as [`data_replica_client_router`], for the same reason.
pub fn config_replica_client_router(state: Arc<ReplicaState>) -> Router {
    let config_routes = Router::new()
        .route("/config", get(handlers::config_handler))
        .route("/addshard", post(handlers::addshard_handler))
        .route("/newleader", post(handlers::newleader_handler))
        .with_state(state.clone());

    config_routes
        .merge(membership_router(state))
        .layer(TraceLayer::new_for_http())
}

/// The full config-replica surface: membership plus the shard-map
/// endpoints and `/raft/rpc`. It has no put/get/delete — the config map is
/// only ever written through `/addshard` and `/newleader`.
pub fn config_replica_router(state: Arc<ReplicaState>, raft: consensus::Raft) -> Router {
    config_replica_client_router(state).merge(raft_rpc_router(raft))
}
