//! HTTP API and domain services for the reel short-video backend.
//!
//! Each service function (`register_account`, `get_feed`, `get_publish_list`,
//! ...) is synchronous and generic over the `reel-db` store traits; the axum
//! handlers next to them run the service on the blocking pool under the
//! request deadline.

pub mod auth;
pub mod engagement;
pub mod error;
pub mod feed;
pub mod identity;
pub mod password;
pub mod publish;
pub mod state;
pub mod storage;
pub mod token;
pub mod users;

#[cfg(test)]
mod testing;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

pub use error::{ApiError, ApiResult};
pub use state::{AppState, AppStateInner};

pub fn router(state: AppState, max_upload_bytes: usize) -> Router {
    let static_files = ServeDir::new(state.storage.dir());

    let api = Router::new()
        .route("/douyin/user/register/", post(auth::register))
        .route("/douyin/user/login/", post(auth::login))
        .route("/douyin/user/", get(users::user_info))
        .route("/douyin/feed/", get(feed::feed))
        .route("/douyin/publish/list/", get(publish::publish_list))
        .route(
            "/douyin/publish/action/",
            post(publish::publish_action).layer(DefaultBodyLimit::max(max_upload_bytes)),
        )
        .with_state(state);

    Router::new()
        .merge(api)
        .route("/health", get(|| async { "ok" }))
        .nest_service("/static", static_files)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}
