use std::collections::HashMap;

use bytes::Bytes;
use common::command::Command;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

/// Returned by `apply` once a command has reached the map. It carries no
/// data of its own — its only job is to let callers on the leader's submit
/// side tell "my command reached apply" apart from "the engine rejected my
/// command before it ever got here".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ApplyResponse;

/// A consistent point-in-time copy of the map plus the position in the log
/// it was taken at. `last_applied_index` and `last_applied_term` are both
/// `0` for the snapshot of an empty, freshly-created state machine that has
/// never applied an entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Snapshot {
    pub entries: Vec<(String, Vec<u8>)>,
    pub last_applied_index: u64,
    pub last_applied_term: u64,
}

/// The contract the consensus engine drives every replicated map through.
/// `apply`/`snapshot`/`restore` are plain synchronous functions: the engine
/// guarantees they never race each other, and nothing in here is allowed to
/// introduce nondeterminism (wall-clock reads, hash-order-dependent
/// behavior) since every replica must reach the same state from the same
/// log.
pub trait StateMachine: Send + Sync {
    /// Deserializes and applies one committed log entry. A malformed entry
    /// is reported as an error but does not stop the engine from advancing
    /// past it — a single bad entry must not wedge the replica.
    fn apply(&self, index: u64, term: u64, entry: &[u8]) -> Result<ApplyResponse, ApplyError>;

    /// Local, non-blocking read. Never goes through the log, so it may be
    /// stale relative to a very recent commit on another replica.
    fn get(&self, key: &str) -> Option<Bytes>;

    /// Captures a consistent snapshot of the current map.
    fn snapshot(&self) -> Snapshot;

    /// Atomically replaces the map with the contents of a snapshot
    /// previously produced by `snapshot`. A decode failure here is fatal:
    /// the replica cannot safely continue in an unknown state.
    fn restore(&self, snapshot: Snapshot) -> Result<(), RestoreError>;

    /// Returns the `(index, term)` of the last applied log entry.
    fn last_applied(&self) -> (u64, u64);
}

#[derive(Debug, thiserror::Error)]
pub enum ApplyError {
    #[error("malformed command: {0}")]
    MalformedCommand(String),
}

#[derive(Debug, thiserror::Error)]
pub enum RestoreError {
    #[error("corrupt snapshot: {0}")]
    Corrupt(String),
}

/// The one concrete `StateMachine`. Both the data replica flavor (arbitrary
/// string keys, opaque byte values) and the config flavor (decimal shard-id
/// keys, `host:port` values) are this same map — they differ only in what
/// the HTTP edge does with the keys and values, never in how the map itself
/// behaves. See `shard_map` for the config flavor's typed view.
pub struct KvStateMachine {
    inner: RwLock<Inner>,
}

struct Inner {
    map: HashMap<String, Bytes>,
    last_applied_index: u64,
    last_applied_term: u64,
}

impl Default for KvStateMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl KvStateMachine {
    pub fn new() -> Self {
        KvStateMachine {
            inner: RwLock::new(Inner {
                map: HashMap::new(),
                last_applied_index: 0,
                last_applied_term: 0,
            }),
        }
    }

    /// Snapshot of the map for read-only consumers that want a cheap, fully
    /// materialized copy (e.g. `ShardMap`) without holding the lock.
    pub fn entries(&self) -> Vec<(String, Bytes)> {
        let inner = self.inner.read();
        inner.map.iter().map(|(k, v)| (k.clone(), v.clone())).collect()
    }

    pub fn last_applied(&self) -> (u64, u64) {
        let inner = self.inner.read();
        (inner.last_applied_index, inner.last_applied_term)
    }
}

impl StateMachine for KvStateMachine {
    fn apply(&self, index: u64, term: u64, entry: &[u8]) -> Result<ApplyResponse, ApplyError> {
        let command = Command::decode(entry)
            .map_err(|e| ApplyError::MalformedCommand(e.to_string()))?;

        let mut inner = self.inner.write();
        match command {
            Command::Put { key, value } => {
                inner.map.insert(key, value);
            }
            Command::Delete { key } => {
                // Absence is not an error: deleting a key that was never
                // there, or was already deleted, is a no-op.
                inner.map.remove(&key);
            }
        }
        inner.last_applied_index = index;
        inner.last_applied_term = term;

        Ok(ApplyResponse)
    }

    fn get(&self, key: &str) -> Option<Bytes> {
        self.inner.read().map.get(key).cloned()
    }

    fn snapshot(&self) -> Snapshot {
        let inner = self.inner.read();
        Snapshot {
            entries: inner
                .map
                .iter()
                .map(|(k, v)| (k.clone(), v.to_vec()))
                .collect(),
            last_applied_index: inner.last_applied_index,
            last_applied_term: inner.last_applied_term,
        }
    }

    fn restore(&self, snapshot: Snapshot) -> Result<(), RestoreError> {
        let mut map = HashMap::with_capacity(snapshot.entries.len());
        for (k, v) in snapshot.entries {
            map.insert(k, Bytes::from(v));
        }

        let mut inner = self.inner.write();
        inner.map = map;
        inner.last_applied_index = snapshot.last_applied_index;
        inner.last_applied_term = snapshot.last_applied_term;
        Ok(())
    }

    fn last_applied(&self) -> (u64, u64) {
        KvStateMachine::last_applied(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn put(key: &str, value: &str) -> Vec<u8> {
        Command::Put {
            key: key.to_string(),
            value: Bytes::from(value.to_string()),
        }
        .encode()
        .to_vec()
    }

    fn delete(key: &str) -> Vec<u8> {
        Command::Delete {
            key: key.to_string(),
        }
        .encode()
        .to_vec()
    }

    #[test]
    fn put_then_get() {
        let sm = KvStateMachine::new();
        sm.apply(1, 1, &put("foo", "bar")).unwrap();
        assert_eq!(sm.get("foo"), Some(Bytes::from_static(b"bar")));
    }

    #[test]
    fn put_then_delete_removes_key() {
        let sm = KvStateMachine::new();
        sm.apply(1, 1, &put("foo", "bar")).unwrap();
        sm.apply(2, 1, &delete("foo")).unwrap();
        assert_eq!(sm.get("foo"), None);
    }

    #[test]
    fn deleting_an_absent_key_is_not_an_error() {
        let sm = KvStateMachine::new();
        assert!(sm.apply(1, 1, &delete("never-existed")).is_ok());
    }

    #[test]
    fn malformed_entry_is_reported_but_does_not_panic() {
        let sm = KvStateMachine::new();
        let err = sm.apply(1, 1, b"not a command").unwrap_err();
        assert!(matches!(err, ApplyError::MalformedCommand(_)));
    }

    #[test]
    fn snapshot_restore_round_trips() {
        let sm = KvStateMachine::new();
        sm.apply(1, 1, &put("a", "1")).unwrap();
        sm.apply(2, 1, &put("b", "2")).unwrap();
        sm.apply(3, 2, &delete("a")).unwrap();

        let snap = sm.snapshot();

        let restored = KvStateMachine::new();
        restored.restore(snap).unwrap();

        assert_eq!(restored.get("a"), None);
        assert_eq!(restored.get("b"), Some(Bytes::from_static(b"2")));
        assert_eq!(restored.last_applied(), (3, 2));
    }

    #[test]
    fn restore_after_replay_matches_replay_alone() {
        let commands: Vec<(u64, u64, Vec<u8>)> = vec![
            (1, 1, put("k1", "v1")),
            (2, 1, put("k2", "v2")),
            (3, 1, delete("k1")),
            (4, 2, put("k1", "v1-again")),
        ];

        let baseline = KvStateMachine::new();
        for (index, term, entry) in &commands {
            baseline.apply(*index, *term, entry).unwrap();
        }

        let snapshotter = KvStateMachine::new();
        for (index, term, entry) in commands.iter().take(2) {
            snapshotter.apply(*index, *term, entry).unwrap();
        }
        let snap = snapshotter.snapshot();

        let restored = KvStateMachine::new();
        restored.restore(snap).unwrap();
        for (index, term, entry) in commands.iter().skip(2) {
            restored.apply(*index, *term, entry).unwrap();
        }

        let mut baseline_entries = baseline.entries();
        let mut restored_entries = restored.entries();
        baseline_entries.sort();
        restored_entries.sort();
        assert_eq!(baseline_entries, restored_entries);
        assert_eq!(baseline.last_applied(), restored.last_applied());
    }

    proptest::proptest! {
        #[test]
        fn fold_matches_apply_sequence(
            ops in proptest::collection::vec(
                (proptest::sample::select(vec!["a", "b", "c"]), proptest::bool::ANY, ".{0,8}"),
                0..50,
            )
        ) {
            let sm = KvStateMachine::new();
            let mut model: HashMap<&str, String> = HashMap::new();

            for (index, (key, is_put, value)) in ops.into_iter().enumerate() {
                let index = index as u64 + 1;
                if is_put {
                    sm.apply(index, 1, &put(key, &value)).unwrap();
                    model.insert(key, value);
                } else {
                    sm.apply(index, 1, &delete(key)).unwrap();
                    model.remove(key);
                }
            }

            for key in ["a", "b", "c"] {
                let expected = model.get(key).map(|v| Bytes::from(v.clone()));
                proptest::prop_assert_eq!(sm.get(key), expected);
            }
        }
    }
}
