use std::path::PathBuf;

use clap::Parser;

/// Flags for a data replica: one process participating in one shard's
/// consensus group.
#[derive(Parser, Debug, Clone)]
#[command(name = "data-replica")]
pub struct DataReplicaArgs {
    /// Unique id of this replica within its shard's consensus group.
    #[arg(long)]
    pub node_id: u64,

    /// Port this replica's HTTP surface (get/put/delete, /raft/*) listens on.
    #[arg(long)]
    pub port: u16,

    /// host:port this replica's raft transport listens on. By convention the
    /// raft port is always `port + 10000`.
    #[arg(long)]
    pub raft_addr: String,

    /// Id of the shard this replica belongs to.
    #[arg(long)]
    pub shard_id: u32,

    /// Directory for the sled log/stable store and RSM snapshots. Empty means
    /// "create and later remove a temp directory" — only suitable for tests.
    #[arg(long, default_value = "")]
    pub store_dir: PathBuf,

    /// Base URL of a configuration-service replica this data replica's
    /// leadership observer reports leadership changes to.
    #[arg(long, default_value = "http://127.0.0.1:3001")]
    pub config_server_url: String,
}

/// Flags for a config-service replica. Same machinery as a data replica, but
/// it has no shard id of its own (it stores everyone else's).
#[derive(Parser, Debug, Clone)]
#[command(name = "config-replica")]
pub struct ConfigReplicaArgs {
    #[arg(long)]
    pub node_id: u64,

    #[arg(long)]
    pub port: u16,

    #[arg(long)]
    pub raft_addr: String,

    #[arg(long, default_value = "")]
    pub store_dir: PathBuf,
}

/// Flags for the stateless router.
#[derive(Parser, Debug, Clone)]
#[command(name = "router")]
pub struct RouterArgs {
    #[arg(long, default_value_t = 3000)]
    pub port: u16,

    #[arg(long, default_value_t = 3001)]
    pub config_server_port1: u16,

    #[arg(long, default_value_t = 3002)]
    pub config_server_port2: u16,

    #[arg(long, default_value_t = 3003)]
    pub config_server_port3: u16,
}

impl RouterArgs {
    /// The ordered list of config-server ports to try, in order. A real
    /// `Vec` rather than reusing one of the flag fields as loop state (the
    /// original source reused its `port` flag as the loop variable).
    pub fn config_server_ports(&self) -> Vec<u16> {
        vec![
            self.config_server_port1,
            self.config_server_port2,
            self.config_server_port3,
        ]
    }
}
