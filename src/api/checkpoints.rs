use crate::api::AppState;
use crate::db::load_entity;
use crate::domain::{
    member_checkpoint_id, Address, NetworkCheckpoint, ParticipantCheckpoint, ProtocolRoot,
    PROTOCOL_ROOT_ID,
};
use crate::error::AppError;
use axum::extract::{Path, State};
use axum::Json;

/// Head of the network checkpoint chain.
pub async fn get_latest(
    State(state): State<AppState>,
) -> Result<Json<NetworkCheckpoint>, AppError> {
    let head = load_entity::<ProtocolRoot>(state.store.as_ref(), PROTOCOL_ROOT_ID)
        .await?
        .and_then(|root| root.last_network_checkpoint_ref)
        .ok_or_else(|| AppError::NotFound("no network checkpoint yet".into()))?;

    let checkpoint = load_entity::<NetworkCheckpoint>(state.store.as_ref(), &head)
        .await?
        .ok_or_else(|| AppError::Internal(format!("chain head {} has no record", head)))?;
    Ok(Json(checkpoint))
}

pub async fn get_checkpoint(
    Path(id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<NetworkCheckpoint>, AppError> {
    let checkpoint = load_entity::<NetworkCheckpoint>(state.store.as_ref(), &id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("checkpoint {}", id)))?;
    Ok(Json(checkpoint))
}

pub async fn get_participant_checkpoint(
    Path((id, participant)): Path<(String, String)>,
    State(state): State<AppState>,
) -> Result<Json<ParticipantCheckpoint>, AppError> {
    let address = Address::parse(&participant)
        .map_err(|_| AppError::BadRequest("Invalid participant address".into()))?;

    let key = member_checkpoint_id(&id, &address);
    let checkpoint = load_entity::<ParticipantCheckpoint>(state.store.as_ref(), &key)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("participant checkpoint {}", key)))?;
    Ok(Json(checkpoint))
}
