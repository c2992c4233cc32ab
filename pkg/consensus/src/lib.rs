//! The consensus collaborator: a small capability trait (`ConsensusEngine`)
//! that the rest of the system depends on, and one production
//! implementation backed by `openraft` with sled-backed storage and an
//! HTTP-based transport to peers.
//!
//! The leader-election / log-replication algorithm itself lives in
//! `openraft`. Everything in this crate is the wiring around that library:
//! storage adapters, network adapters, and a thin adapter from its API to
//! ours, plus an in-memory stand-in for tests that don't want a real
//! cluster.

mod engine;
mod log_store;
mod memory_engine;
mod network;
mod openraft_engine;
pub mod rpc;
mod state_machine_store;
mod types;

pub use engine::{ApplyError, ConsensusEngine, EngineState};
pub use memory_engine::InMemoryEngine;
pub use openraft_engine::{OpenRaftEngine, SNAPSHOT_INTERVAL, SNAPSHOT_THRESHOLD};
pub use types::{NodeId, Raft, TypeConfig};
