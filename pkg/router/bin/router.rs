use std::sync::Arc;

use clap::Parser;
use common::config::RouterArgs;
use router::{build_router, RouterState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    common::logging::init();
    let args = RouterArgs::parse();

    let state = Arc::new(RouterState {
        client: reqwest::Client::new(),
        config_server_ports: args.config_server_ports(),
    });

    let app = build_router(state);
    let listener = tokio::net::TcpListener::bind(("127.0.0.1", args.port)).await?;
    tracing::info!(port = args.port, "router listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
        })
        .await?;

    Ok(())
}
