//! Discord interactions endpoint

use crate::api::rest::state::AppState;
use crate::error::{ApiError, ApiResult};
use axum::{body::Bytes, extract::State, http::HeaderMap, Json};
use cekincki_discord::{
    verify_interaction_signature, DiscordError, Interaction, InteractionResponse,
};

const SIGNATURE_HEADER: &str = "x-signature-ed25519";
const TIMESTAMP_HEADER: &str = "x-signature-timestamp";

fn header<'a>(headers: &'a HeaderMap, name: &str) -> ApiResult<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::Unauthorized(format!("missing {} header", name)))
}

/// Verify and answer an interaction
pub async fn handle_interaction(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<Json<InteractionResponse>> {
    let Some(public_key) = state.public_key.as_deref() else {
        return Err(ApiError::Unavailable(
            "DISCORD_PUBLIC_KEY is not configured".to_string(),
        ));
    };

    let signature = header(&headers, SIGNATURE_HEADER)?;
    let timestamp = header(&headers, TIMESTAMP_HEADER)?;

    verify_interaction_signature(public_key, signature, timestamp, &body).map_err(|e| match e {
        DiscordError::InvalidSignature(msg) => ApiError::Unauthorized(msg),
        other => {
            tracing::error!(error = %other, "Cannot verify interactions");
            ApiError::Internal(other.to_string())
        }
    })?;

    let interaction: Interaction = serde_json::from_slice(&body)
        .map_err(|e| ApiError::BadRequest(format!("invalid interaction payload: {}", e)))?;

    Ok(Json(state.commands.dispatch(interaction)))
}
