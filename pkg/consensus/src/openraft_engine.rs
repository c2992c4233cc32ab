use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use common::Command;
use openraft::{BasicNode, Config as RaftConfig, ServerState, SnapshotPolicy};
use rsm::StateMachine as RsmStateMachine;
use serde_json::json;

use crate::engine::{ApplyError, ConsensusEngine, EngineState};
use crate::log_store::SledLogStore;
use crate::network::HttpNetworkFactory;
use crate::state_machine_store::StateMachineStore;
use crate::types::{NodeId, Raft};

pub const SNAPSHOT_THRESHOLD: u64 = 1000;
pub const SNAPSHOT_INTERVAL: Duration = Duration::from_secs(30);

/// The one production `ConsensusEngine`: an `openraft::Raft` driving a
/// sled-backed log and a `rsm::StateMachine`, talking to peers over HTTP.
pub struct OpenRaftEngine {
    raft: Raft,
    node_id: NodeId,
}

impl OpenRaftEngine {
    pub async fn open(
        node_id: NodeId,
        raft_addr: &str,
        store_dir: &Path,
        sm: Arc<dyn RsmStateMachine>,
    ) -> anyhow::Result<Self> {
        std::fs::create_dir_all(store_dir)?;
        let db = sled::open(store_dir.join("raft"))?;
        let log_store = SledLogStore::open(&db)?;
        let state_machine = StateMachineStore::new(sm, store_dir.join("snapshots"))?;
        let network = HttpNetworkFactory::default();

        let config = RaftConfig {
            heartbeat_interval: 150,
            election_timeout_min: 400,
            election_timeout_max: 800,
            snapshot_policy: SnapshotPolicy::LogsSinceLast(SNAPSHOT_THRESHOLD),
            ..Default::default()
        };
        let config = config.validate()?;

        let raft = Raft::new(
            node_id,
            Arc::new(config),
            network,
            log_store,
            state_machine,
        )
        .await?;

        tracing::info!(node_id, raft_addr, "consensus engine started");

        Ok(OpenRaftEngine { raft, node_id })
    }

    pub fn handle(&self) -> Raft {
        self.raft.clone()
    }

    /// Idempotent cluster genesis. Exactly one replica per group calls this
    /// at first boot; calling it again on an already-initialized cluster is
    /// a harmless no-op from `openraft`'s point of view.
    pub async fn bootstrap(&self, members: BTreeMap<NodeId, String>) -> anyhow::Result<()> {
        let members: BTreeMap<NodeId, BasicNode> = members
            .into_iter()
            .map(|(id, addr)| (id, BasicNode { addr }))
            .collect();
        match self.raft.initialize(members).await {
            Ok(()) => Ok(()),
            Err(e) if e.to_string().contains("NotAllowed") => {
                tracing::info!("cluster already initialized, skipping bootstrap");
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    fn current_voters(&self) -> BTreeMap<NodeId, BasicNode> {
        let metrics = self.raft.metrics().borrow().clone();
        metrics
            .membership_config
            .nodes()
            .map(|(id, node)| (*id, node.clone()))
            .collect()
    }
}

#[async_trait::async_trait]
impl ConsensusEngine for OpenRaftEngine {
    async fn apply(&self, command: Command, timeout: Duration) -> Result<(), ApplyError> {
        match tokio::time::timeout(timeout, self.raft.client_write(command)).await {
            Err(_elapsed) => Err(ApplyError::Timeout),
            Ok(Err(e)) => {
                if let Some(leader_id) = e.forward_to_leader().and_then(|f| f.leader_id) {
                    let leader_hint = self
                        .current_voters()
                        .get(&leader_id)
                        .map(|n| n.addr.clone());
                    Err(ApplyError::NotLeader { leader_hint })
                } else {
                    Err(ApplyError::Rejected(e.to_string()))
                }
            }
            Ok(Ok(_response)) => Ok(()),
        }
    }

    fn leader(&self) -> Option<String> {
        let metrics = self.raft.metrics().borrow().clone();
        let leader_id = metrics.current_leader?;
        let addr = metrics
            .membership_config
            .nodes()
            .find(|(id, _)| **id == leader_id)
            .map(|(_, node)| node.addr.clone());
        addr
    }

    fn state(&self) -> EngineState {
        match self.raft.metrics().borrow().state {
            ServerState::Leader => EngineState::Leader,
            ServerState::Follower | ServerState::Learner => EngineState::Follower,
            ServerState::Candidate => EngineState::Candidate,
            ServerState::Shutdown => EngineState::Shutdown,
        }
    }

    async fn add_voter(&self, id: u64, address: String) -> Result<(), ApplyError> {
        let node = BasicNode { addr: address };
        self.raft
            .add_learner(id, node, true)
            .await
            .map_err(|e| ApplyError::Rejected(e.to_string()))?;

        let mut voters: std::collections::BTreeSet<NodeId> =
            self.current_voters().keys().copied().collect();
        voters.insert(id);

        self.raft
            .change_membership(voters, false)
            .await
            .map_err(|e| ApplyError::Rejected(e.to_string()))?;
        Ok(())
    }

    async fn remove_server(&self, id: u64) -> Result<(), ApplyError> {
        let voters: std::collections::BTreeSet<NodeId> = self
            .current_voters()
            .keys()
            .copied()
            .filter(|v| *v != id)
            .collect();

        self.raft
            .change_membership(voters, false)
            .await
            .map_err(|e| ApplyError::Rejected(e.to_string()))?;
        Ok(())
    }

    fn stats(&self) -> serde_json::Value {
        let metrics = self.raft.metrics().borrow().clone();
        json!({
            "id": self.node_id,
            "state": format!("{:?}", metrics.state),
            "currentTerm": metrics.current_term,
            "lastLogIndex": metrics.last_log_index,
            "lastApplied": metrics.last_applied,
            "currentLeader": metrics.current_leader,
        })
    }
}
