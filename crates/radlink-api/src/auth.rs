use std::sync::Arc;

use argon2::password_hash::{rand_core::OsRng, SaltString};
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use jsonwebtoken::{encode, EncodingKey, Header};
use tracing::error;

use radlink_db::Database;
use radlink_types::api::{Claims, LoginRequest, LoginResponse};
use radlink_types::models::Role;
use radlink_types::time;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    pub jwt_secret: String,
}

pub const MIN_PASSWORD_LEN: usize = 6;

pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, StatusCode> {
    // Run blocking DB lookup and argon2 verification off the async runtime
    let db = state.clone();
    let user = tokio::task::spawn_blocking(move || {
        let user = db
            .db
            .get_user_by_username(&req.username)
            .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?
            .ok_or(StatusCode::UNAUTHORIZED)?;
        if !verify_password(&user.password, &req.password) {
            return Err(StatusCode::UNAUTHORIZED);
        }
        // stamp activity so the user shows as online right after login
        db.db
            .touch_last_seen(&user.id, &time::now_ts())
            .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
        Ok(user)
    })
    .await
    .map_err(|e| {
        error!("spawn_blocking join error: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })??;

    let user_id = user.id.parse().map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
    let role: Role = user
        .role
        .parse()
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    let token = create_token(&state.jwt_secret, user_id, &user.username, role)
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    Ok(Json(LoginResponse {
        user_id,
        username: user.username,
        role,
        token,
    }))
}

pub fn hash_password(password: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("password hashing failed: {}", e))?;
    Ok(hash.to_string())
}

pub fn verify_password(stored_hash: &str, password: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(stored_hash) else {
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

fn create_token(
    secret: &str,
    user_id: uuid::Uuid,
    username: &str,
    role: Role,
) -> anyhow::Result<String> {
    let claims = Claims {
        sub: user_id,
        username: username.to_string(),
        role,
        exp: (chrono::Utc::now() + chrono::Duration::hours(24)).timestamp() as usize,
    };
    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;
    Ok(token)
}

/// Seed the bootstrap admin account on first run.
pub fn seed_admin(db: &Database, password: &str) -> anyhow::Result<()> {
    if db.get_user_by_username("admin")?.is_some() {
        return Ok(());
    }
    let hash = hash_password(password)?;
    db.create_user(
        &uuid::Uuid::new_v4().to_string(),
        "admin",
        &hash,
        Role::Admin.as_str(),
        &time::now_ts(),
    )?;
    tracing::info!("Seeded default admin account");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_hash_roundtrip() {
        let hash = hash_password("correct horse").unwrap();
        assert!(verify_password(&hash, "correct horse"));
        assert!(!verify_password(&hash, "wrong horse"));
        assert!(!verify_password("not-a-phc-string", "anything"));
    }
}
