//! The deterministic key-value map that every shard (and the configuration
//! service itself, which is just a shard whose keys happen to be decimal
//! shard ids) replicates via consensus.
//!
//! `state_machine` owns the map and the apply/snapshot/restore contract the
//! consensus engine drives it through; `shard_map` is the one
//! consumer-facing typed view config replicas build on top of the same map.

pub mod shard_map;
pub mod state_machine;

pub use shard_map::ShardMap;
pub use state_machine::{ApplyResponse, KvStateMachine, Snapshot, StateMachine};
