use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    middleware,
    routing::{delete, get, post, put},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use radlink_api::auth::{self, AppState, AppStateInner};
use radlink_api::middleware::require_auth;
use radlink_api::{chat, tasks, users};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "radlink=debug,tower_http=debug".into()),
        )
        .init();

    // Config
    let jwt_secret =
        std::env::var("RADLINK_JWT_SECRET").unwrap_or_else(|_| "dev-secret-change-me".into());
    let db_path = std::env::var("RADLINK_DB_PATH").unwrap_or_else(|_| "radlink.db".into());
    let host = std::env::var("RADLINK_HOST").unwrap_or_else(|_| "0.0.0.0".into());
    let port: u16 = std::env::var("RADLINK_PORT")
        .unwrap_or_else(|_| "3000".into())
        .parse()?;
    let admin_password =
        std::env::var("RADLINK_ADMIN_PASSWORD").unwrap_or_else(|_| "admin123".into());

    // Init database and the bootstrap admin
    let db = radlink_db::Database::open(&PathBuf::from(&db_path))?;
    auth::seed_admin(&db, &admin_password)?;

    let state: AppState = Arc::new(AppStateInner { db, jwt_secret });

    // Routes
    let public_routes = Router::new()
        .route("/auth/login", post(auth::login))
        .with_state(state.clone());

    let protected_routes = Router::new()
        .route("/tasks", get(tasks::list_tasks).post(tasks::create_task))
        .route("/tasks/{task_id}/status", post(tasks::update_status))
        .route(
            "/tasks/{task_id}/messages",
            get(chat::get_messages).post(chat::send_message),
        )
        .route("/messages/unread", get(chat::unread_summary))
        .route("/users", get(users::list_users).post(users::create_user))
        .route("/users/{user_id}/password", post(users::reset_password))
        .route("/users/{user_id}", delete(users::delete_user))
        .route("/profile", put(users::update_profile))
        .route(
            "/admin/tasks/{task_id}",
            put(tasks::admin_update).delete(tasks::admin_delete),
        )
        .route("/admin/tasks/status", post(tasks::bulk_status))
        .route("/admin/tasks/reassign", post(tasks::bulk_reassign))
        .route("/admin/stats", get(users::stats))
        .layer(middleware::from_fn_with_state(state.clone(), require_auth))
        .with_state(state);

    let app = Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    info!("radlink server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
