use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use common::Command;
use rsm::StateMachine;
use serde_json::json;

use crate::engine::{ApplyError, ConsensusEngine, EngineState};

/// A single-node stand-in for `OpenRaftEngine`: every `apply` lands directly
/// on the state machine with no log, no peers, and no possibility of ever
/// losing leadership. Lets `pkg/replica` and `pkg/router` be tested against
/// the `ConsensusEngine` trait without standing up a real cluster.
pub struct InMemoryEngine {
    sm: Arc<dyn StateMachine>,
    self_address: String,
    applied: AtomicU64,
}

impl InMemoryEngine {
    pub fn new(sm: Arc<dyn StateMachine>, self_address: impl Into<String>) -> Self {
        Self {
            sm,
            self_address: self_address.into(),
            applied: AtomicU64::new(0),
        }
    }
}

#[async_trait::async_trait]
impl ConsensusEngine for InMemoryEngine {
    async fn apply(&self, command: Command, _timeout: Duration) -> Result<(), ApplyError> {
        let index = self.applied.fetch_add(1, Ordering::SeqCst) + 1;
        self.sm
            .apply(index, 0, &command.encode())
            .map_err(|e| ApplyError::Rejected(e.to_string()))?;
        Ok(())
    }

    fn leader(&self) -> Option<String> {
        Some(self.self_address.clone())
    }

    fn state(&self) -> EngineState {
        EngineState::Leader
    }

    async fn add_voter(&self, _id: u64, _address: String) -> Result<(), ApplyError> {
        Ok(())
    }

    async fn remove_server(&self, _id: u64) -> Result<(), ApplyError> {
        Ok(())
    }

    fn stats(&self) -> serde_json::Value {
        json!({ "kind": "in-memory", "applied": self.applied.load(Ordering::SeqCst) })
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;
    use rsm::KvStateMachine;

    use super::*;

    #[tokio::test]
    async fn applied_command_is_visible_through_the_state_machine() {
        let sm = Arc::new(KvStateMachine::new());
        let engine = InMemoryEngine::new(sm.clone(), "127.0.0.1:9000");

        engine
            .apply(
                Command::Put {
                    key: "a".into(),
                    value: Bytes::from_static(b"1"),
                },
                Duration::from_millis(100),
            )
            .await
            .unwrap();

        assert_eq!(sm.get("a"), Some(Bytes::from_static(b"1")));
    }

    #[tokio::test]
    async fn reports_itself_as_the_permanent_leader() {
        let sm = Arc::new(KvStateMachine::new());
        let engine = InMemoryEngine::new(sm, "127.0.0.1:9000");

        assert_eq!(engine.state(), EngineState::Leader);
        assert_eq!(engine.leader(), Some("127.0.0.1:9000".to_string()));
    }
}
