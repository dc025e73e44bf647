use axum::{
    extract::State,
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::{
    aiconfig::repo::AiConfig,
    auth::jwt::AdminUser,
    error::{message, ok, ApiError, MessageBody, Success},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new().route(
        "/aiconfig",
        get(get_config).put(update_config).delete(delete_config),
    )
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct UpdateConfigRequest {
    pub api_key: Option<String>,
    pub model: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ConfigBody {
    pub config: AiConfig,
}

#[derive(Debug, Serialize)]
pub struct UpdatedConfigBody {
    pub message: String,
    pub config: AiConfig,
}

#[instrument(skip(state))]
pub async fn get_config(
    State(state): State<AppState>,
) -> Result<Json<Success<ConfigBody>>, ApiError> {
    let config = AiConfig::get(&state.db)
        .await?
        .ok_or_else(|| ApiError::NotFound("AI configuration not found".into()))?;
    Ok(ok(ConfigBody { config }))
}

#[instrument(skip(state, payload))]
pub async fn update_config(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Json(payload): Json<UpdateConfigRequest>,
) -> Result<Json<Success<UpdatedConfigBody>>, ApiError> {
    let api_key = payload
        .api_key
        .as_deref()
        .filter(|k| !k.trim().is_empty())
        .ok_or_else(|| ApiError::Validation("API key is required".into()))?;
    let model = payload
        .model
        .as_deref()
        .filter(|m| !m.trim().is_empty())
        .ok_or_else(|| ApiError::Validation("Model is required".into()))?;

    let config = AiConfig::upsert(&state.db, api_key, model, &admin.username).await?;

    // Keep the key itself out of the log.
    info!(model = %config.model, admin = %admin.username, "AI configuration updated");
    Ok(ok(UpdatedConfigBody {
        message: "AI configuration updated successfully".into(),
        config,
    }))
}

#[instrument(skip(state))]
pub async fn delete_config(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
) -> Result<Json<Success<MessageBody>>, ApiError> {
    if !AiConfig::delete(&state.db).await? {
        return Err(ApiError::NotFound("AI configuration not found".into()));
    }

    info!(admin = %admin.username, "AI configuration deleted");
    Ok(message("AI configuration deleted successfully"))
}
