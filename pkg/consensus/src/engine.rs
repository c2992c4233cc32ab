use std::time::Duration;

use common::Command;
use serde_json::Value;

/// Mirrors `openraft::types::ServerState`, kept as our own enum so nothing
/// outside this crate needs to know `openraft` exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Leader,
    Follower,
    Candidate,
    Shutdown,
}

#[derive(Debug, thiserror::Error)]
pub enum ApplyError {
    #[error("timeout")]
    Timeout,
    #[error("not the leader{}", .leader_hint.as_ref().map(|a| format!(": try {a}")).unwrap_or_default())]
    NotLeader { leader_hint: Option<String> },
    #[error("{0}")]
    Rejected(String),
}

/// The capability set every other component in this system needs from the
/// consensus collaborator: submit a command and wait for it to commit,
/// observe leadership, and change cluster membership. Nothing upstream of
/// this trait ever constructs or matches on an `openraft` type directly.
#[async_trait::async_trait]
pub trait ConsensusEngine: Send + Sync {
    async fn apply(&self, command: Command, timeout: Duration) -> Result<(), ApplyError>;

    /// The current leader's raft address (`host:raft-port`), if known.
    fn leader(&self) -> Option<String>;

    fn state(&self) -> EngineState;

    async fn add_voter(&self, id: u64, address: String) -> Result<(), ApplyError>;

    async fn remove_server(&self, id: u64) -> Result<(), ApplyError>;

    fn stats(&self) -> Value;
}
