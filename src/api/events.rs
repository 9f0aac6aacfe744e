use crate::api::AppState;
use crate::domain::LedgerEvent;
use crate::error::AppError;
use crate::orchestration::{BatchItem, EventOutcome};
use axum::extract::State;
use axum::Json;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct BatchResponse {
    pub indexed: usize,
    pub already_indexed: usize,
    pub skipped: usize,
    pub results: Vec<BatchItem>,
}

/// Apply one event.
pub async fn post_event(
    State(state): State<AppState>,
    Json(event): Json<LedgerEvent>,
) -> Result<Json<BatchItem>, AppError> {
    let indexer = state.indexer.lock().await;
    let outcome = indexer.process(&event).await?;

    Ok(Json(BatchItem {
        event_id: event.event_id().map(|id| id.to_string()),
        kind: event.kind(),
        outcome,
    }))
}

/// Apply a batch in canonical ledger order.
pub async fn post_batch(
    State(state): State<AppState>,
    Json(events): Json<Vec<LedgerEvent>>,
) -> Result<Json<BatchResponse>, AppError> {
    if events.is_empty() {
        return Err(AppError::BadRequest("batch is empty".into()));
    }

    let indexer = state.indexer.lock().await;
    let results = indexer.process_batch(events).await?;

    let count = |f: fn(&EventOutcome) -> bool| results.iter().filter(|r| f(&r.outcome)).count();
    Ok(Json(BatchResponse {
        indexed: count(|o| matches!(o, EventOutcome::Indexed)),
        already_indexed: count(|o| matches!(o, EventOutcome::AlreadyIndexed)),
        skipped: count(|o| matches!(o, EventOutcome::Skipped(_))),
        results,
    }))
}
