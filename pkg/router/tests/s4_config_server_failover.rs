use axum::routing::get;
use axum::Router;

/// Starts a throwaway `/config` server on an OS-assigned port and returns
/// that port. The server runs for the lifetime of the test process.
async fn spawn_config_server(body: &'static str) -> u16 {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let app = Router::new().route("/config", get(move || async move { body }));
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    port
}

/// A port nothing is listening on: bind then immediately drop the listener,
/// freeing the port while leaving no server behind to answer on it.
async fn unreachable_port() -> u16 {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap().port()
}

#[tokio::test]
async fn falls_over_to_the_next_config_server_when_the_first_is_unreachable() {
    let dead_port = unreachable_port().await;
    let live_port = spawn_config_server(r#"{"1":"127.0.0.1:18001","shardCount":"1"}"#).await;

    let client = reqwest::Client::new();
    let config = router::fetch_config(&client, &[dead_port, live_port])
        .await
        .expect("should fail over to the live config server");

    assert_eq!(config.shard_count, 1);
}
