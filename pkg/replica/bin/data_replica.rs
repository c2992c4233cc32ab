use std::collections::BTreeMap;
use std::sync::Arc;

use clap::Parser;
use common::config::DataReplicaArgs;
use consensus::{ConsensusEngine, OpenRaftEngine};
use replica::{data_replica_router, spawn_leadership_observer, ReplicaState};
use rsm::KvStateMachine;
use tokio::sync::watch;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    common::logging::init();
    let args = DataReplicaArgs::parse();

    // Held for the lifetime of `main` so an unset `--store-dir` is removed on
    // clean shutdown instead of leaking a directory per run.
    let mut tempdir_guard = None;
    let store_dir = if args.store_dir.as_os_str().is_empty() {
        let dir = tempfile::Builder::new()
            .prefix(&format!("data-replica-{}-", args.node_id))
            .tempdir()?;
        let path = dir.path().to_path_buf();
        tempdir_guard = Some(dir);
        path
    } else {
        args.store_dir.clone()
    };

    let sm = Arc::new(KvStateMachine::new());
    let engine = OpenRaftEngine::open(args.node_id, &args.raft_addr, &store_dir, sm.clone()).await?;
    engine
        .bootstrap(BTreeMap::from([(args.node_id, args.raft_addr.clone())]))
        .await?;
    let raft = engine.handle();

    let state = Arc::new(ReplicaState {
        engine: Arc::new(engine) as Arc<dyn ConsensusEngine>,
        sm,
        raft_addr: args.raft_addr.clone(),
    });

    let (shutdown_tx, shutdown_rx) = watch::channel(());
    let observer = spawn_leadership_observer(
        state.engine.clone(),
        args.shard_id,
        args.raft_addr.clone(),
        args.config_server_url.clone(),
        shutdown_rx,
    );

    let router = data_replica_router(state, raft);
    let listener = tokio::net::TcpListener::bind(("127.0.0.1", args.port)).await?;
    tracing::info!(port = args.port, shard_id = args.shard_id, "data replica listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
        })
        .await?;

    let _ = shutdown_tx.send(());
    let _ = observer.await;

    if let Some(dir) = tempdir_guard {
        dir.close()?;
    }
    Ok(())
}
