use std::sync::Arc;
use std::time::Duration;

use consensus::{ConsensusEngine, EngineState};
use tokio::sync::watch;
use tokio::task::JoinHandle;

const POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Polls a shard's own consensus engine once a second and tells the config
/// service whenever this replica becomes (or stops being) the shard leader.
/// Runs until `shutdown` fires, so a graceful `axum::serve` shutdown can
/// drain it alongside the HTTP listener.
pub fn spawn_leadership_observer(
    engine: Arc<dyn ConsensusEngine>,
    shard_id: u32,
    own_raft_addr: String,
    config_server_url: String,
    mut shutdown: watch::Receiver<()>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let client = reqwest::Client::new();
        let mut was_leader = false;
        let mut ticker = tokio::time::interval(POLL_INTERVAL);

        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                _ = shutdown.changed() => break,
            }

            let is_leader = engine.state() == EngineState::Leader;
            if is_leader && !was_leader {
                report_leadership(&client, &config_server_url, shard_id, &own_raft_addr).await;
            }
            was_leader = is_leader;
        }
    })
}

async fn report_leadership(
    client: &reqwest::Client,
    config_server_url: &str,
    shard_id: u32,
    own_raft_addr: &str,
) {
    let url = format!("{config_server_url}/newleader");
    let result = client
        .post(url)
        .query(&[
            ("shardID", shard_id.to_string()),
            ("shardAddress", own_raft_addr.to_string()),
        ])
        .send()
        .await;

    match result {
        Ok(resp) if resp.status().is_success() => {
            tracing::info!(shard_id, own_raft_addr, "reported leadership to config service");
        }
        Ok(resp) => {
            tracing::warn!(shard_id, status = %resp.status(), "config service rejected leadership report");
        }
        Err(err) => {
            tracing::warn!(shard_id, %err, "failed to reach config service with leadership report");
        }
    }
}
