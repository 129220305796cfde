pub mod auth;
pub mod chat;
pub mod error;
pub mod middleware;
pub mod tasks;
pub mod users;

use radlink_db::Database;
use radlink_types::error::CoreError;
use tracing::error;

use crate::auth::AppState;
use crate::error::ApiError;

/// Run a core operation against the store off the async runtime.
pub(crate) async fn run_blocking<T, F>(state: AppState, f: F) -> Result<T, ApiError>
where
    T: Send + 'static,
    F: FnOnce(&Database) -> Result<T, CoreError> + Send + 'static,
{
    tokio::task::spawn_blocking(move || f(&state.db))
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            ApiError(CoreError::Storage(anyhow::anyhow!(e)))
        })?
        .map_err(ApiError)
}
