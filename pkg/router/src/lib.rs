mod config_client;
mod handlers;
mod hash;
mod router;
mod state;

pub use config_client::{fetch_config, ShardConfig};
pub use hash::{hash_key, shard_index_from_hash, shard_index_from_key, HASH_MODULO};
pub use router::build_router;
pub use state::RouterState;
