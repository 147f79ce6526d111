use axum::{
    extract::{FromRef, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use tracing::{info, instrument, warn};

use crate::{
    auth::{
        dto::{LoginRequest, SignupRequest, TokenResponse},
        jwt::JwtKeys,
        password::{hash_password, verify_password},
    },
    error::ApiError,
    state::AppState,
    store::NewUser,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/signup", post(signup))
        .route("/login", post(login))
}

#[instrument(skip(state, payload))]
pub async fn signup(
    State(state): State<AppState>,
    Json(mut payload): Json<SignupRequest>,
) -> Result<(StatusCode, Json<TokenResponse>), ApiError> {
    payload.email = payload.email.trim().to_lowercase();

    if state
        .users
        .find_by_email_or_phone(&payload.email, &payload.phone)
        .await
        .is_some()
    {
        warn!(email = %payload.email, "signup conflict");
        return Err(ApiError::UserExists);
    }

    let hash = hash_password(&payload.password)?;
    let user = state
        .users
        .insert(NewUser {
            name: payload.name,
            email: payload.email,
            phone: payload.phone,
            password_hash: hash,
        })
        .await
        // The store re-checks uniqueness under its lock; a racing signup
        // surfaces here as the same conflict.
        .map_err(|_| ApiError::UserExists)?;

    let keys = JwtKeys::from_ref(&state);
    let token = keys.sign(&user)?;
    info!(user_id = user.id, email = %user.email, "user signed up");
    Ok((StatusCode::CREATED, Json(TokenResponse { token })))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(mut payload): Json<LoginRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    payload.email = payload.email.trim().to_lowercase();

    let Some(user) = state.users.find_by_email(&payload.email).await else {
        warn!(email = %payload.email, "login unknown email");
        return Err(ApiError::InvalidCredentials);
    };

    let ok = match verify_password(&payload.password, &user.password_hash) {
        Ok(v) => v,
        Err(err) => {
            // Phone-provisioned records carry no usable hash; treat an
            // unparsable hash as a failed login rather than a server error.
            warn!(user_id = user.id, error = %err, "password hash not verifiable");
            false
        }
    };
    if !ok {
        warn!(email = %payload.email, user_id = user.id, "login invalid password");
        return Err(ApiError::InvalidCredentials);
    }

    let keys = JwtKeys::from_ref(&state);
    let token = keys.sign(&user)?;
    info!(user_id = user.id, email = %user.email, "user logged in");
    Ok(Json(TokenResponse { token }))
}
