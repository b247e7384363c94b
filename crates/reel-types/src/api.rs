use serde::{Deserialize, Serialize};

use crate::models::{User, Video};

// -- JWT Claims --

/// JWT payload issued on register/login and checked on every
/// token-bearing request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: i64,
    pub username: String,
    pub iat: i64,
    pub exp: usize,
}

// -- Envelope --

pub const STATUS_OK: i32 = 0;

/// Status fields carried by every response body. `status_code` is 0 on
/// success and the HTTP status code otherwise.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Status {
    pub status_code: i32,
    pub status_msg: String,
}

impl Status {
    pub fn ok() -> Self {
        Self {
            status_code: STATUS_OK,
            status_msg: "success".to_string(),
        }
    }
}

// -- Auth --

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Shared by register and login.
#[derive(Debug, Serialize, Deserialize)]
pub struct AuthResponse {
    #[serde(flatten)]
    pub status: Status,
    pub user_id: i64,
    pub token: String,
}

// -- Users --

#[derive(Debug, Deserialize)]
pub struct UserQuery {
    pub user_id: i64,
    pub token: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UserResponse {
    #[serde(flatten)]
    pub status: Status,
    pub user: User,
}

// -- Feed --

#[derive(Debug, Deserialize)]
pub struct FeedQuery {
    /// Exclusive upper bound on publish time (unix seconds). Absent or 0
    /// means "now".
    pub latest_time: Option<i64>,
    pub token: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct FeedResponse {
    #[serde(flatten)]
    pub status: Status,
    pub video_list: Vec<Video>,
    /// Cursor for the next page; absent once the feed is exhausted.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub next_time: Option<i64>,
}

// -- Publish --

#[derive(Debug, Deserialize)]
pub struct PublishListQuery {
    pub user_id: i64,
    pub token: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PublishListResponse {
    #[serde(flatten)]
    pub status: Status,
    pub video_list: Vec<Video>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StatusResponse {
    #[serde(flatten)]
    pub status: Status,
}
