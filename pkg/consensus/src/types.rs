use std::io::Cursor;

use openraft::BasicNode;

use crate::rpc::AppResponse;

pub type NodeId = u64;

openraft::declare_raft_types!(
    /// The `openraft` type configuration for one shard's (or the config
    /// service's) consensus group: write requests are the same `Command`
    /// the RSM applies, write responses are our apply sentinel, nodes carry
    /// nothing but their `host:raft-port` address.
    pub TypeConfig:
        D = common::Command,
        R = AppResponse,
        NodeId = NodeId,
        Node = BasicNode,
        Entry = openraft::Entry<TypeConfig>,
        SnapshotData = Cursor<Vec<u8>>,
        AsyncRuntime = openraft::TokioRuntime,
);

pub type Raft = openraft::Raft<TypeConfig>;
