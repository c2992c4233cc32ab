use std::io::Cursor;
use std::sync::Arc;

use openraft::storage::{RaftStateMachine, Snapshot as RaftSnapshot};
use openraft::{
    Entry, EntryPayload, LogId, OptionalSend, SnapshotMeta, StorageError, StorageIOError,
    StoredMembership,
};

use rsm::{Snapshot as RsmSnapshot, StateMachine};

use crate::rpc::AppResponse;
use crate::types::{NodeId, TypeConfig};

/// Bridges `openraft`'s state-machine contract to `rsm::StateMachine`. This
/// is deliberately thin: every actual mutation is `rsm`'s job, this module
/// only translates `openraft::Entry` batches into the `(index, term,
/// command-bytes)` shape `rsm` expects and persists/restores snapshot bytes
/// under `store_dir/snapshots`.
///
/// `current_snapshot` is an `Arc` because `get_snapshot_builder` hands out a
/// second `StateMachineStore` that runs `build_snapshot` independently of
/// `self`; sharing the `Arc` instead of cloning a fresh `Mutex` is what lets
/// a snapshot built through that builder show up when `openraft` later calls
/// `get_current_snapshot` on the original instance.
pub struct StateMachineStore {
    sm: Arc<dyn StateMachine>,
    snapshot_dir: std::path::PathBuf,
    current_snapshot: Arc<parking_lot::Mutex<Option<(SnapshotMeta<NodeId, openraft::BasicNode>, Vec<u8>)>>>,
}

impl StateMachineStore {
    pub fn new(sm: Arc<dyn StateMachine>, snapshot_dir: std::path::PathBuf) -> std::io::Result<Self> {
        std::fs::create_dir_all(&snapshot_dir)?;
        Ok(StateMachineStore {
            sm,
            snapshot_dir,
            current_snapshot: Arc::new(parking_lot::Mutex::new(None)),
        })
    }

    fn io_err(e: impl std::error::Error + 'static) -> StorageIOError<NodeId> {
        StorageIOError::write(&e)
    }

    fn encode_snapshot(snapshot: &RsmSnapshot) -> Result<Vec<u8>, StorageIOError<NodeId>> {
        serde_json::to_vec(snapshot).map_err(|e| StorageIOError::write(&e))
    }
}

impl RaftStateMachine<TypeConfig> for StateMachineStore {
    type SnapshotBuilder = Self;

    async fn applied_state(
        &mut self,
    ) -> Result<(Option<LogId<NodeId>>, StoredMembership<NodeId, openraft::BasicNode>), StorageError<NodeId>>
    {
        let (index, term) = self.sm.last_applied();
        let last_applied = if index == 0 {
            None
        } else {
            Some(LogId::new(openraft::CommittedLeaderId::new(term, 0), index))
        };
        Ok((last_applied, StoredMembership::default()))
    }

    async fn apply<I>(&mut self, entries: I) -> Result<Vec<AppResponse>, StorageError<NodeId>>
    where
        I: IntoIterator<Item = Entry<TypeConfig>> + OptionalSend,
    {
        let mut responses = Vec::new();
        for entry in entries {
            let index = entry.log_id.index;
            let term = entry.log_id.leader_id.term;
            match entry.payload {
                EntryPayload::Blank => responses.push(AppResponse),
                EntryPayload::Normal(command) => {
                    let encoded = command.encode();
                    let resp = self
                        .sm
                        .apply(index, term, &encoded)
                        .map_err(|e| StorageIOError::write(&e))?;
                    responses.push(resp.into());
                }
                EntryPayload::Membership(_) => responses.push(AppResponse),
            }
        }
        Ok(responses)
    }

    async fn get_snapshot_builder(&mut self) -> Self::SnapshotBuilder {
        StateMachineStore {
            sm: self.sm.clone(),
            snapshot_dir: self.snapshot_dir.clone(),
            current_snapshot: self.current_snapshot.clone(),
        }
    }

    async fn begin_receiving_snapshot(&mut self) -> Result<Box<Cursor<Vec<u8>>>, StorageError<NodeId>> {
        Ok(Box::new(Cursor::new(Vec::new())))
    }

    async fn install_snapshot(
        &mut self,
        meta: &SnapshotMeta<NodeId, openraft::BasicNode>,
        snapshot: Box<Cursor<Vec<u8>>>,
    ) -> Result<(), StorageError<NodeId>> {
        let bytes = snapshot.into_inner();
        let rsm_snapshot: RsmSnapshot =
            serde_json::from_slice(&bytes).map_err(|e| StorageIOError::read(&e))?;

        self.sm
            .restore(rsm_snapshot)
            .map_err(|e| StorageIOError::read(&e))?;

        let path = self.snapshot_dir.join(format!("{:020}", meta.last_log_id.map(|l| l.index).unwrap_or(0)));
        std::fs::write(&path, &bytes).map_err(Self::io_err)?;

        *self.current_snapshot.lock() = Some((meta.clone(), bytes));
        Ok(())
    }

    async fn get_current_snapshot(
        &mut self,
    ) -> Result<Option<RaftSnapshot<TypeConfig>>, StorageError<NodeId>> {
        let guard = self.current_snapshot.lock();
        Ok(guard.as_ref().map(|(meta, bytes)| RaftSnapshot {
            meta: meta.clone(),
            snapshot: Box::new(Cursor::new(bytes.clone())),
        }))
    }
}

impl openraft::storage::RaftSnapshotBuilder<TypeConfig> for StateMachineStore {
    async fn build_snapshot(&mut self) -> Result<RaftSnapshot<TypeConfig>, StorageError<NodeId>> {
        let rsm_snapshot = self.sm.snapshot();
        let last_log_id = if rsm_snapshot.last_applied_index == 0 {
            None
        } else {
            Some(LogId::new(
                openraft::CommittedLeaderId::new(rsm_snapshot.last_applied_term, 0),
                rsm_snapshot.last_applied_index,
            ))
        };

        let bytes = Self::encode_snapshot(&rsm_snapshot)?;

        let meta = SnapshotMeta {
            last_log_id,
            last_membership: StoredMembership::default(),
            snapshot_id: format!("{}-{}", rsm_snapshot.last_applied_term, rsm_snapshot.last_applied_index),
        };

        let path = self
            .snapshot_dir
            .join(format!("{:020}", rsm_snapshot.last_applied_index));
        std::fs::write(&path, &bytes).map_err(Self::io_err)?;

        *self.current_snapshot.lock() = Some((meta.clone(), bytes.clone()));

        Ok(RaftSnapshot {
            meta,
            snapshot: Box::new(Cursor::new(bytes)),
        })
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;
    use common::Command;
    use openraft::storage::RaftSnapshotBuilder;
    use rsm::KvStateMachine;

    use super::*;

    #[tokio::test]
    async fn snapshot_built_through_the_builder_is_visible_on_the_original_instance() {
        let sm = Arc::new(KvStateMachine::new());
        sm.apply(
            1,
            1,
            &Command::Put {
                key: "a".into(),
                value: Bytes::from_static(b"1"),
            }
            .encode(),
        )
        .unwrap();

        let dir = tempfile::tempdir().unwrap();
        let mut store = StateMachineStore::new(sm, dir.path().to_path_buf()).unwrap();

        let mut builder = store.get_snapshot_builder().await;
        builder.build_snapshot().await.unwrap();

        let current = store.get_current_snapshot().await.unwrap();
        assert!(
            current.is_some(),
            "a snapshot built through the builder must be visible on the instance openraft holds"
        );
    }

    #[tokio::test]
    async fn get_current_snapshot_is_none_before_any_snapshot_is_built() {
        let sm = Arc::new(KvStateMachine::new());
        let dir = tempfile::tempdir().unwrap();
        let mut store = StateMachineStore::new(sm, dir.path().to_path_buf()).unwrap();

        assert!(store.get_current_snapshot().await.unwrap().is_none());
    }
}
