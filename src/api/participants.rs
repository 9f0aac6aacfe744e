use crate::api::AppState;
use crate::db::load_entity;
use crate::domain::{Address, Participant, ParticipantCheckpoint};
use crate::error::AppError;
use axum::extract::{Path, State};
use axum::Json;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ParticipantResponse {
    pub participant: Participant,
    pub last_checkpoint: Option<ParticipantCheckpoint>,
}

pub async fn get_participant(
    Path(id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<ParticipantResponse>, AppError> {
    let address = Address::parse(&id)
        .map_err(|_| AppError::BadRequest("Invalid participant address".into()))?;

    let participant = load_entity::<Participant>(state.store.as_ref(), address.as_str())
        .await?
        .ok_or_else(|| AppError::NotFound(format!("participant {}", address)))?;

    let last_checkpoint = match &participant.last_checkpoint_ref {
        Some(reference) => {
            load_entity::<ParticipantCheckpoint>(state.store.as_ref(), reference).await?
        }
        None => None,
    };

    Ok(Json(ParticipantResponse {
        participant,
        last_checkpoint,
    }))
}
