use axum::extract::State;
use axum::Json;
use openraft::raft::{
    AppendEntriesRequest, AppendEntriesResponse, InstallSnapshotRequest, InstallSnapshotResponse,
    VoteRequest, VoteResponse,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::types::{NodeId, Raft};

/// `openraft`'s write response type. It carries no payload of its own — like
/// `rsm::ApplyResponse`, its only job is to prove a command reached `apply`
/// rather than being rejected before commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppResponse;

impl From<rsm::ApplyResponse> for AppResponse {
    fn from(_: rsm::ApplyResponse) -> Self {
        AppResponse
    }
}

/// One `openraft` inter-replica RPC, carried over `POST /raft/rpc`: plain
/// JSON over HTTP to the peer's raft port rather than a custom binary
/// protocol, consistent with the rest of this system's HTTP-only wire
/// surface.
#[derive(Debug, Serialize, Deserialize)]
pub enum RaftRpc {
    AppendEntries(AppendEntriesRequest<crate::types::TypeConfig>),
    InstallSnapshot(InstallSnapshotRequest<crate::types::TypeConfig>),
    Vote(VoteRequest<NodeId>),
}

#[derive(Debug, Serialize, Deserialize)]
pub enum RaftRpcResponse {
    AppendEntries(AppendEntriesResponse<NodeId>),
    InstallSnapshot(InstallSnapshotResponse<NodeId>),
    Vote(VoteResponse<NodeId>),
    Error(String),
}

/// Handler mounted at `POST /raft/rpc` by `pkg/replica`. Dispatches the
/// envelope to the local `openraft::Raft` handle and replies with whatever
/// it returns, or a textual `Error` variant for anything that shouldn't
/// normally happen (e.g. receiving an RPC while the engine is mid-shutdown).
pub async fn raft_rpc_handler(
    State(raft): State<Arc<Raft>>,
    Json(rpc): Json<RaftRpc>,
) -> Json<RaftRpcResponse> {
    let response = match rpc {
        RaftRpc::AppendEntries(req) => match raft.append_entries(req).await {
            Ok(resp) => RaftRpcResponse::AppendEntries(resp),
            Err(e) => RaftRpcResponse::Error(e.to_string()),
        },
        RaftRpc::InstallSnapshot(req) => match raft.install_snapshot(req).await {
            Ok(resp) => RaftRpcResponse::InstallSnapshot(resp),
            Err(e) => RaftRpcResponse::Error(e.to_string()),
        },
        RaftRpc::Vote(req) => match raft.vote(req).await {
            Ok(resp) => RaftRpcResponse::Vote(resp),
            Err(e) => RaftRpcResponse::Error(e.to_string()),
        },
    };
    Json(response)
}
