use std::sync::Arc;

use axum::routing::{delete, get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::RouterState;

pub fn build_router(state: Arc<RouterState>) -> Router {
    Router::new()
        .route("/get", get(handlers::get_handler))
        .route("/put", post(handlers::put_handler))
        .route("/delete", delete(handlers::delete_handler))
        .route("/status", get(handlers::status_handler))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}
