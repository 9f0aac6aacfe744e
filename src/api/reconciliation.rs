use crate::api::AppState;
use crate::error::AppError;
use crate::orchestration::{reconcile, ReconciliationReport};
use axum::extract::State;
use axum::Json;

/// Sum-of-parts check. Holds the writer lock so every read sees the same
/// committed state.
pub async fn get_reconciliation(
    State(state): State<AppState>,
) -> Result<Json<ReconciliationReport>, AppError> {
    let _writer = state.indexer.lock().await;
    let report = reconcile(state.store.as_ref()).await?;
    Ok(Json(report))
}
