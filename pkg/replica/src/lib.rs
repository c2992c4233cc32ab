mod handlers;
mod http;
mod leadership_observer;
mod router;
mod state;

pub use leadership_observer::spawn_leadership_observer;
pub use router::{
    config_replica_client_router, config_replica_router, data_replica_client_router,
    data_replica_router,
};
pub use state::{ReplicaState, APPLY_TIMEOUT};
