use std::str::FromStr;
use std::sync::Arc;

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use tracing::{error, info};

use forkful_core::Forkful;
use forkful_types::api::{Claims, LoginRequest, LoginResponse, RegisterRequest, RegisterResponse};
use forkful_types::models::{Gender, UserId};

use crate::error::ApiError;
use crate::extract::JsonBody;
use crate::run_blocking;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub forkful: Forkful,
    pub jwt_secret: String,
    pub token_ttl_hours: i64,
}

pub(crate) fn parse_gender(raw: Option<&str>) -> Result<Option<Gender>, ApiError> {
    raw.map(Gender::from_str)
        .transpose()
        .map_err(|e| ApiError::BadRequest(e.to_string()))
}

pub async fn register(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let gender = parse_gender(req.gender.as_deref())?;
    let user_id = run_blocking(&state, move |app| {
        app.register(&req.name, &req.password, gender, &req.birthdate)
    })
    .await?;

    Ok((StatusCode::CREATED, Json(RegisterResponse { user_id })))
}

pub async fn login(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let LoginRequest { user_id, password } = req;
    let user_id = run_blocking(&state, move |app| app.login(user_id, &password))
        .await?
        .ok_or(ApiError::InvalidCredentials)?;

    let token = create_token(&state.jwt_secret, user_id, state.token_ttl_hours).map_err(|e| {
        error!("Token encoding failed: {}", e);
        ApiError::Internal
    })?;

    info!("User {} logged in", user_id);
    Ok(Json(LoginResponse { user_id, token }))
}

pub fn create_token(secret: &str, user_id: UserId, ttl_hours: i64) -> anyhow::Result<String> {
    let expires = chrono::TimeDelta::try_hours(ttl_hours)
        .and_then(|ttl| chrono::Utc::now().checked_add_signed(ttl))
        .ok_or_else(|| anyhow::anyhow!("token lifetime of {} hours is out of range", ttl_hours))?;
    let claims = Claims {
        sub: user_id,
        exp: expires.timestamp() as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;

    Ok(token)
}

pub fn decode_token(secret: &str, token: &str) -> Result<Claims, ApiError> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|_| ApiError::InvalidToken)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokens_round_trip_and_reject_other_secrets() {
        let token = create_token("kitchen-secret", 42, 1).unwrap();
        assert_eq!(decode_token("kitchen-secret", &token).unwrap().sub, 42);
        assert!(decode_token("other-secret", &token).is_err());
    }

    #[test]
    fn expired_tokens_are_rejected() {
        let token = create_token("kitchen-secret", 42, -2).unwrap();
        assert!(decode_token("kitchen-secret", &token).is_err());
    }

    #[test]
    fn out_of_range_lifetimes_are_errors() {
        assert!(create_token("kitchen-secret", 42, i64::MAX).is_err());
        assert!(create_token("kitchen-secret", 42, i64::MAX / 2).is_err());
    }

    #[test]
    fn gender_is_optional_but_must_parse() {
        assert_eq!(parse_gender(None).unwrap(), None);
        assert_eq!(parse_gender(Some("female")).unwrap(), Some(Gender::Female));
        assert!(parse_gender(Some("robot")).is_err());
    }
}
