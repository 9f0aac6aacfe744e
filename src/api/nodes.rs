use crate::api::AppState;
use crate::db::load_entity;
use crate::domain::{Address, Node, NodeNetworkCheckpoint, ProtocolRoot, PROTOCOL_ROOT_ID};
use crate::error::AppError;
use axum::extract::{Path, State};
use axum::Json;

pub async fn get_node(
    Path(id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<Node>, AppError> {
    let address =
        Address::parse(&id).map_err(|_| AppError::BadRequest("Invalid node address".into()))?;
    let node = load_entity::<Node>(state.store.as_ref(), address.as_str())
        .await?
        .ok_or_else(|| AppError::NotFound(format!("node {}", address)))?;
    Ok(Json(node))
}

pub async fn get_latest_node_checkpoint(
    State(state): State<AppState>,
) -> Result<Json<NodeNetworkCheckpoint>, AppError> {
    let head = load_entity::<ProtocolRoot>(state.store.as_ref(), PROTOCOL_ROOT_ID)
        .await?
        .and_then(|root| root.last_node_checkpoint_ref)
        .ok_or_else(|| AppError::NotFound("no node checkpoint yet".into()))?;

    let checkpoint = load_entity::<NodeNetworkCheckpoint>(state.store.as_ref(), &head)
        .await?
        .ok_or_else(|| AppError::Internal(format!("node chain head {} has no record", head)))?;
    Ok(Json(checkpoint))
}
