use std::sync::Arc;

use consensus::ConsensusEngine;
use rsm::KvStateMachine;

/// Everything an HTTP handler needs: the consensus collaborator to submit
/// writes through, and direct read access to the replicated map. Shared by
/// both the data-replica and config-replica flavors — they mount different
/// routes over the same state, since a config replica's shard map is just a
/// key-value map like any other.
#[derive(Clone)]
pub struct ReplicaState {
    pub engine: Arc<dyn ConsensusEngine>,
    pub sm: Arc<KvStateMachine>,
    pub raft_addr: String,
}

/// Deadline every write handler submits its apply under before reporting
/// `ApplyTimeout` to the caller.
pub const APPLY_TIMEOUT: std::time::Duration = std::time::Duration::from_millis(500);
