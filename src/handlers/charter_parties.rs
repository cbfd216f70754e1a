use axum::{
    extract::{Extension, Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::HashMap;

use crate::error::ApiError;
use crate::middleware::AuthUser;
use crate::models::{CharterParty, NewCharterParty};
use crate::store::StoreError;
use crate::AppState;

/// GET /api/voyages/:voyage_id/charter-parties - List charter parties for a
/// voyage, newest first
pub async fn list(
    Path(voyage_id): Path<String>,
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> Result<Json<Vec<CharterParty>>, ApiError> {
    let records = state
        .store
        .list_for_voyage(&voyage_id)
        .await
        .map_err(|err| {
            tracing::error!(%voyage_id, user_id = %auth_user.user_id, error = %err,
                "failed to fetch charter parties");
            ApiError::retrieval_failed("Failed to fetch charter parties")
        })?;

    Ok(Json(records))
}

/// POST /api/voyages/:voyage_id/charter-parties - Create a charter party.
///
/// The payload is loosely typed; coercion happens in
/// `NewCharterParty::from_payload`, and any field that fails coercion turns
/// into a 400 with per-field detail. The voyage id in the path always wins
/// over anything in the body.
pub async fn create(
    Path(voyage_id): Path<String>,
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Json(payload): Json<Value>,
) -> Result<(StatusCode, Json<CharterParty>), ApiError> {
    let record = NewCharterParty::from_payload(&voyage_id, &payload)?;

    let created = state.store.create(record).await.map_err(|err| {
        tracing::error!(%voyage_id, user_id = %auth_user.user_id, error = %err,
            "failed to create charter party");
        ApiError::create_failed("Failed to create charter party")
    })?;

    Ok((StatusCode::CREATED, Json(created)))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteRequest {
    pub charter_party_id: Option<String>,
}

/// DELETE /api/voyages/:voyage_id/charter-parties - Delete one charter party
/// by the id in the request body.
///
/// Deletion is identifier-scoped: the target's voyage is not checked against
/// the path segment, so the path voyage id is accepted but unused.
pub async fn delete(
    Path(voyage_id): Path<String>,
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Json(request): Json<DeleteRequest>,
) -> Result<Json<Value>, ApiError> {
    let charter_party_id = match request.charter_party_id {
        Some(id) if !id.trim().is_empty() => id,
        _ => {
            let mut field_errors = HashMap::new();
            field_errors.insert("charterPartyId".to_string(), "is required".to_string());
            return Err(ApiError::validation_error(
                "Missing charter party id",
                Some(field_errors),
            ));
        }
    };

    state
        .store
        .delete(&charter_party_id)
        .await
        .map_err(|err| match err {
            StoreError::NotFound(_) => ApiError::not_found("Charter party not found"),
            other => {
                tracing::error!(%voyage_id, %charter_party_id, user_id = %auth_user.user_id,
                    error = %other, "failed to delete charter party");
                ApiError::delete_failed("Failed to delete charter party")
            }
        })?;

    Ok(Json(json!({ "success": true })))
}
