use std::fmt::Debug;
use std::ops::RangeBounds;

use openraft::storage::{LogFlushed, LogState, RaftLogStorage};
use openraft::{LogId, OptionalSend, StorageError, StorageIOError, Vote};

use crate::types::{NodeId, TypeConfig};

const LOG_TREE: &str = "raft_log";
const META_TREE: &str = "raft_meta";
const VOTE_KEY: &[u8] = b"vote";

/// The consensus engine's own persistence: every log entry `openraft`
/// accepts and the current-term/voted-for pair, both sled-backed so a
/// replica can restart and resume exactly where it left off. The log and
/// the vote/term metadata live as two separate trees in one sled database
/// under `store_dir`.
#[derive(Clone)]
pub struct SledLogStore {
    log: sled::Tree,
    meta: sled::Tree,
}

impl SledLogStore {
    pub fn open(db: &sled::Db) -> Result<Self, sled::Error> {
        Ok(SledLogStore {
            log: db.open_tree(LOG_TREE)?,
            meta: db.open_tree(META_TREE)?,
        })
    }

    fn index_key(index: u64) -> [u8; 8] {
        index.to_be_bytes()
    }

    fn io_err(e: impl std::error::Error + 'static) -> StorageIOError<NodeId> {
        StorageIOError::write(&e)
    }
}

impl RaftLogStorage<TypeConfig> for SledLogStore {
    type LogReader = Self;

    async fn get_log_state(&mut self) -> Result<LogState<TypeConfig>, StorageError<NodeId>> {
        let last = self
            .log
            .last()
            .map_err(Self::io_err)?
            .map(|(_, v)| bincode_decode(&v))
            .transpose()?;

        let last_purged = self
            .meta
            .get(b"last_purged")
            .map_err(Self::io_err)?
            .map(|v| bincode_decode::<LogId<NodeId>>(&v))
            .transpose()?;

        Ok(LogState {
            last_purged_log_id: last_purged,
            last_log_id: last,
        })
    }

    async fn save_vote(&mut self, vote: &Vote<NodeId>) -> Result<(), StorageError<NodeId>> {
        let bytes = bincode_encode(vote)?;
        self.meta.insert(VOTE_KEY, bytes).map_err(Self::io_err)?;
        self.meta.flush_async().await.map_err(Self::io_err)?;
        Ok(())
    }

    async fn read_vote(&mut self) -> Result<Option<Vote<NodeId>>, StorageError<NodeId>> {
        Ok(self
            .meta
            .get(VOTE_KEY)
            .map_err(Self::io_err)?
            .map(|v| bincode_decode(&v))
            .transpose()?)
    }

    async fn get_log_reader(&mut self) -> Self::LogReader {
        self.clone()
    }

    async fn append<I>(&mut self, entries: I, callback: LogFlushed<TypeConfig>) -> Result<(), StorageError<NodeId>>
    where
        I: IntoIterator<Item = openraft::Entry<TypeConfig>> + OptionalSend,
    {
        for entry in entries {
            let key = Self::index_key(entry.log_id.index);
            let value = bincode_encode(&entry)?;
            self.log.insert(key, value).map_err(Self::io_err)?;
        }
        self.log.flush_async().await.map_err(Self::io_err)?;
        callback.log_io_completed(Ok(()));
        Ok(())
    }

    async fn truncate(&mut self, log_id: LogId<NodeId>) -> Result<(), StorageError<NodeId>> {
        // Remove every entry at or after `log_id.index`: the log diverged
        // here and everything past it was superseded by a new leader.
        let from = Self::index_key(log_id.index);
        let keys: Vec<_> = self
            .log
            .range(from..)
            .keys()
            .filter_map(Result::ok)
            .collect();
        for key in keys {
            self.log.remove(key).map_err(Self::io_err)?;
        }
        Ok(())
    }

    async fn purge(&mut self, log_id: LogId<NodeId>) -> Result<(), StorageError<NodeId>> {
        // Entries up to and including a snapshotted index are no longer
        // needed to reconstruct state; the snapshot itself stands in.
        let upper = Self::index_key(log_id.index + 1);
        let keys: Vec<_> = self
            .log
            .range(..upper)
            .keys()
            .filter_map(Result::ok)
            .collect();
        for key in keys {
            self.log.remove(key).map_err(Self::io_err)?;
        }
        self.meta
            .insert(b"last_purged", bincode_encode(&log_id)?)
            .map_err(Self::io_err)?;
        Ok(())
    }
}

impl openraft::storage::RaftLogReader<TypeConfig> for SledLogStore {
    async fn try_get_log_entries<RB: RangeBounds<u64> + Clone + Debug + OptionalSend>(
        &mut self,
        range: RB,
    ) -> Result<Vec<openraft::Entry<TypeConfig>>, StorageError<NodeId>> {
        let mut out = Vec::new();
        for item in self.log.iter() {
            let (key, value) = item.map_err(Self::io_err)?;
            let index = u64::from_be_bytes(key.as_ref().try_into().expect("8-byte index key"));
            if range.contains(&index) {
                out.push(bincode_decode(&value)?);
            }
        }
        Ok(out)
    }
}

fn bincode_encode<T: serde::Serialize>(value: &T) -> Result<Vec<u8>, StorageIOError<NodeId>> {
    bincode::serialize(value).map_err(|e| StorageIOError::write(&*e))
}

fn bincode_decode<T: serde::de::DeserializeOwned>(bytes: &[u8]) -> Result<T, StorageIOError<NodeId>> {
    bincode::deserialize(bytes).map_err(|e| StorageIOError::read(&*e))
}
