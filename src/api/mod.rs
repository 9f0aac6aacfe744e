pub mod checkpoints;
pub mod events;
pub mod health;
pub mod nodes;
pub mod participants;
pub mod reconciliation;

use crate::db::EntityStore;
use crate::orchestration::Indexer;
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tokio::sync::Mutex;
use tower_http::cors::{Any, CorsLayer};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn EntityStore>,
    /// Held for the whole of one event (or batch): the single writer.
    pub indexer: Arc<Mutex<Indexer>>,
}

impl AppState {
    pub fn new(indexer: Indexer) -> Self {
        Self {
            store: indexer.store().clone(),
            indexer: Arc::new(Mutex::new(indexer)),
        }
    }
}

pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health::health))
        .route("/ready", get(health::ready))
        .route("/v1/events", post(events::post_event))
        .route("/v1/events/batch", post(events::post_batch))
        .route("/v1/participants/:id", get(participants::get_participant))
        .route("/v1/checkpoints/latest", get(checkpoints::get_latest))
        .route("/v1/checkpoints/:id", get(checkpoints::get_checkpoint))
        .route(
            "/v1/checkpoints/:id/participants/:participant",
            get(checkpoints::get_participant_checkpoint),
        )
        .route("/v1/nodes/:id", get(nodes::get_node))
        .route("/v1/node-checkpoints/latest", get(nodes::get_latest_node_checkpoint))
        .route("/v1/reconciliation", get(reconciliation::get_reconciliation))
        .layer(cors)
        .with_state(state)
}
