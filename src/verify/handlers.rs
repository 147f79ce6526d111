use axum::{
    extract::{FromRef, State},
    routing::post,
    Json, Router,
};
use serde::Deserialize;
use tracing::{info, instrument, warn};

use crate::{
    auth::{dto::MessageResponse, jwt::JwtKeys},
    error::ApiError,
    state::AppState,
    store::NewUser,
    verify::client::VerificationStatus,
};

#[derive(Debug, Deserialize)]
pub struct StartVerificationRequest {
    pub phone: String,
}

#[derive(Debug, Deserialize)]
pub struct CheckVerificationRequest {
    pub phone: String,
    pub code: String,
}

pub fn verify_routes() -> Router<AppState> {
    Router::new()
        .route("/verify", post(start))
        .route("/verify/check", post(check))
}

#[instrument(skip(state, payload))]
pub async fn start(
    State(state): State<AppState>,
    Json(payload): Json<StartVerificationRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    state.verify.start_verification(&payload.phone).await?;
    info!("verification code sent");
    Ok(Json(MessageResponse {
        message: "Verification code sent".into(),
        token: None,
    }))
}

#[instrument(skip(state, payload))]
pub async fn check(
    State(state): State<AppState>,
    Json(payload): Json<CheckVerificationRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    let status = state
        .verify
        .check_verification(&payload.phone, &payload.code)
        .await?;

    if status != VerificationStatus::Approved {
        // Anything short of an explicit approval, pending included, gets the
        // same generic rejection.
        warn!(?status, "verification not approved");
        return Err(ApiError::InvalidVerificationCode);
    }

    let token = if state.config.verify_link_account {
        let user = match state.users.find_by_phone(&payload.phone).await {
            Some(user) => user,
            None => state
                .users
                .insert(NewUser {
                    name: String::new(),
                    email: String::new(),
                    phone: payload.phone.clone(),
                    password_hash: String::new(),
                })
                .await
                .map_err(anyhow::Error::from)?,
        };
        let keys = JwtKeys::from_ref(&state);
        Some(keys.sign(&user)?)
    } else {
        None
    };

    info!("phone verified");
    Ok(Json(MessageResponse {
        message: "Phone verified successfully".into(),
        token,
    }))
}
