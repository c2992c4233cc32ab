use std::sync::Arc;

use consensus::{ConsensusEngine, InMemoryEngine};
use http_body_util::BodyExt;
use rsm::KvStateMachine;
use serde_json::Value;
use tower::ServiceExt;

#[tokio::test]
async fn config_endpoint_reports_shard_map_and_derived_count() {
    let sm = Arc::new(KvStateMachine::new());
    let engine = InMemoryEngine::new(sm.clone(), "127.0.0.1:19001");
    let state = Arc::new(replica::ReplicaState {
        engine: Arc::new(engine) as Arc<dyn ConsensusEngine>,
        sm,
        raft_addr: "127.0.0.1:19001".to_string(),
    });

    let router = replica::config_replica_client_router(state);

    for (shard_id, addr) in [
        (1, "h:18001"),
        (2, "h:18002"),
        (3, "h:18003"),
        (4, "h:18004"),
    ] {
        let resp = router
            .clone()
            .oneshot(
                axum::http::Request::builder()
                    .method("POST")
                    .uri(format!("/addshard?shardID={shard_id}&shardAddress={addr}"))
                    .body(axum::body::Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status().as_u16(), 200);
    }

    let resp = router
        .oneshot(
            axum::http::Request::builder()
                .uri("/config")
                .body(axum::body::Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);

    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    let body: Value = serde_json::from_slice(&bytes).unwrap();

    assert_eq!(body["1"], "h:18001");
    assert_eq!(body["2"], "h:18002");
    assert_eq!(body["3"], "h:18003");
    assert_eq!(body["4"], "h:18004");
    assert_eq!(body["shardCount"], "4");
}
