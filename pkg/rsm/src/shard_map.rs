use std::collections::BTreeMap;

use serde::{Serialize, Serializer};

use crate::state_machine::KvStateMachine;

/// Typed view of the configuration service's state map: shard id to its
/// current leader's `host:raft-port`, plus the derived shard count.
///
/// The config RSM itself is just a `KvStateMachine` keyed by the decimal
/// string form of the shard id. `ShardMap` is the one place that knows how
/// to turn that back into real integers and compute `shardCount`, and how
/// to serialize both back out to the wire-compatible
/// `{"1": "...", "shardCount": "4"}` shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShardMap {
    shards: BTreeMap<u32, String>,
}

impl ShardMap {
    /// Builds a typed `ShardMap` from the raw config state machine. Keys
    /// that aren't valid decimal shard ids are ignored rather than causing
    /// the whole read to fail — they can't occur through `/addshard` or
    /// `/newleader`, but a defensive read is cheap and a corrupt map should
    /// never take the whole config endpoint down.
    pub fn from_state_machine(sm: &KvStateMachine) -> Self {
        let mut shards = BTreeMap::new();
        for (key, value) in sm.entries() {
            if let Ok(shard_id) = key.parse::<u32>() {
                if let Ok(address) = std::str::from_utf8(&value) {
                    shards.insert(shard_id, address.to_string());
                }
            }
        }
        ShardMap { shards }
    }

    pub fn address_of(&self, shard_id: u32) -> Option<&str> {
        self.shards.get(&shard_id).map(String::as_str)
    }

    /// The highest contiguous integer key present, starting from 1. Gaps
    /// truncate: shards `{1, 2, 4}` yield a shard count of 2, same as the
    /// original source's loop that stops at the first missing key.
    pub fn shard_count(&self) -> u32 {
        let mut count = 0;
        loop {
            if self.shards.contains_key(&(count + 1)) {
                count += 1;
            } else {
                break;
            }
        }
        count
    }
}

impl Serialize for ShardMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeMap;

        let mut map = serializer.serialize_map(Some(self.shards.len() + 1))?;
        for (shard_id, address) in &self.shards {
            map.serialize_entry(&shard_id.to_string(), address)?;
        }
        map.serialize_entry("shardCount", &self.shard_count().to_string())?;
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use common::Command;
    use crate::state_machine::StateMachine;

    fn add_shard(sm: &KvStateMachine, shard_id: u32, address: &str) {
        let cmd = Command::Put {
            key: shard_id.to_string(),
            value: Bytes::from(address.to_string()),
        };
        sm.apply(shard_id as u64, 1, &cmd.encode()).unwrap();
    }

    #[test]
    fn shard_count_is_highest_contiguous_key() {
        let sm = KvStateMachine::new();
        add_shard(&sm, 1, "h:18001");
        add_shard(&sm, 2, "h:18002");
        add_shard(&sm, 4, "h:18004"); // gap at 3

        let shard_map = ShardMap::from_state_machine(&sm);
        assert_eq!(shard_map.shard_count(), 2);
    }

    #[test]
    fn serializes_to_wire_compatible_shape() {
        let sm = KvStateMachine::new();
        add_shard(&sm, 1, "h:18001");
        add_shard(&sm, 2, "h:18002");

        let shard_map = ShardMap::from_state_machine(&sm);
        let json = serde_json::to_value(&shard_map).unwrap();

        assert_eq!(json["1"], "h:18001");
        assert_eq!(json["2"], "h:18002");
        assert_eq!(json["shardCount"], "2");
    }

    #[test]
    fn empty_map_has_zero_shard_count() {
        let sm = KvStateMachine::new();
        let shard_map = ShardMap::from_state_machine(&sm);
        assert_eq!(shard_map.shard_count(), 0);
        assert_eq!(shard_map.address_of(1), None);
    }

    #[test]
    fn applying_the_same_leader_announcement_twice_is_idempotent() {
        let sm = KvStateMachine::new();
        add_shard(&sm, 1, "h:18001");
        add_shard(&sm, 1, "h:18001");
        let shard_map = ShardMap::from_state_machine(&sm);
        assert_eq!(shard_map.address_of(1), Some("h:18001"));
        assert_eq!(shard_map.shard_count(), 1);
    }
}
