use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};

use forkful_core::ServiceError;
use forkful_types::models::AuthInfo;

use crate::auth::{AppState, decode_token};
use crate::error::ApiError;

/// Validate the bearer token and attach the caller as an `AuthInfo` extension.
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let auth_header = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(ApiError::Service(ServiceError::Unauthenticated))?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or(ApiError::InvalidToken)?;

    let claims = decode_token(&state.jwt_secret, token)?;

    req.extensions_mut().insert(AuthInfo::new(claims.sub));
    Ok(next.run(req).await)
}
