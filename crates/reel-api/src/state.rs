use std::sync::Arc;
use std::time::Duration;

use tracing::error;

use reel_db::Database;

use crate::error::{ApiError, ApiResult};
use crate::storage::Storage;
use crate::token::TokenKeys;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    pub tokens: TokenKeys,
    pub storage: Storage,
    /// Cover image recorded for uploads, which carry no cover of their own.
    pub default_cover_url: String,
    /// Upper bound on one request's blocking work (token check, queries,
    /// enrichment).
    pub request_timeout: Duration,
}

/// Runs `f` on the blocking pool under the request deadline. A deadline
/// miss is an upstream failure; the detached task is left to finish.
pub async fn run_blocking<F, T>(state: &AppState, f: F) -> ApiResult<T>
where
    F: FnOnce(&AppStateInner) -> ApiResult<T> + Send + 'static,
    T: Send + 'static,
{
    let inner = Arc::clone(state);
    let task = tokio::task::spawn_blocking(move || f(&inner));

    match tokio::time::timeout(state.request_timeout, task).await {
        Ok(Ok(result)) => result,
        Ok(Err(e)) => {
            error!("spawn_blocking join error: {}", e);
            Err(ApiError::upstream("request task", e))
        }
        Err(elapsed) => Err(ApiError::upstream("request deadline", elapsed)),
    }
}
