use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{decode, DecodingKey, Validation};
use tracing::error;

use radlink_types::api::Claims;
use radlink_types::models::Principal;
use radlink_types::time;

use crate::auth::AppState;

/// Extract and validate the bearer token, then thread the resulting
/// [`Principal`] into the request. This is also where the identity
/// context stamps `last_seen` — the presence window reads it later.
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let auth_header = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(StatusCode::UNAUTHORIZED)?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or(StatusCode::UNAUTHORIZED)?;

    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(state.jwt_secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|_| StatusCode::UNAUTHORIZED)?;

    let claims = token_data.claims;
    let principal = Principal {
        id: claims.sub,
        username: claims.username,
        role: claims.role,
    };

    let db = state.clone();
    let user_id = principal.id.to_string();
    tokio::task::spawn_blocking(move || db.db.touch_last_seen(&user_id, &time::now_ts()))
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    req.extensions_mut().insert(principal);
    Ok(next.run(req).await)
}
