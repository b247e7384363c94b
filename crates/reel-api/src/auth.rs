use axum::{
    Json,
    extract::{Query, State},
};
use tracing::{debug, info};

use reel_db::AccountStore;
use reel_types::api::{AuthResponse, LoginRequest, RegisterRequest, Status};

use crate::error::{ApiError, ApiResult, UpstreamExt};
use crate::password;
use crate::state::{AppState, run_blocking};
use crate::token::TokenKeys;

const MAX_CREDENTIAL_LEN: usize = 32;

/// Account id plus a token bound to it.
#[derive(Debug)]
pub struct Issued {
    pub user_id: i64,
    pub token: String,
}

/// POST /douyin/user/register/
pub async fn register(
    State(state): State<AppState>,
    Query(req): Query<RegisterRequest>,
) -> ApiResult<Json<AuthResponse>> {
    let issued = run_blocking(&state, move |s| {
        register_account(&s.db, &s.tokens, &req.username, &req.password)
    })
    .await?;

    Ok(Json(AuthResponse {
        status: Status::ok(),
        user_id: issued.user_id,
        token: issued.token,
    }))
}

/// POST /douyin/user/login/
pub async fn login(
    State(state): State<AppState>,
    Query(req): Query<LoginRequest>,
) -> ApiResult<Json<AuthResponse>> {
    let issued = run_blocking(&state, move |s| {
        login_account(&s.db, &s.tokens, &req.username, &req.password)
    })
    .await?;

    Ok(Json(AuthResponse {
        status: Status::ok(),
        user_id: issued.user_id,
        token: issued.token,
    }))
}

pub fn register_account<S>(
    store: &S,
    keys: &TokenKeys,
    username: &str,
    password: &str,
) -> ApiResult<Issued>
where
    S: AccountStore + ?Sized,
{
    validate("username", username)?;
    validate("password", password)?;

    if store
        .user_by_username(username)
        .upstream("account lookup")?
        .is_some()
    {
        return Err(ApiError::DuplicateUsername);
    }

    let password_hash = password::hash(password).upstream("password hashing")?;

    // The unique constraint is the real guard; the lookup above can race.
    let user_id = store
        .create_user(username, &password_hash)
        .upstream("account creation")?
        .ok_or(ApiError::DuplicateUsername)?;

    let token = keys.sign(user_id, username).upstream("token signing")?;

    info!("Registered user {} ({})", username, user_id);
    Ok(Issued { user_id, token })
}

/// Unknown usernames and wrong passwords fail identically.
pub fn login_account<S>(
    store: &S,
    keys: &TokenKeys,
    username: &str,
    password: &str,
) -> ApiResult<Issued>
where
    S: AccountStore + ?Sized,
{
    let user = store
        .user_by_username(username)
        .upstream("account lookup")?
        .ok_or(ApiError::InvalidCredential)?;

    if !password::verify(password, &user.password) {
        debug!("Password mismatch for user {}", user.profile.id);
        return Err(ApiError::InvalidCredential);
    }

    let token = keys
        .sign(user.profile.id, &user.profile.username)
        .upstream("token signing")?;

    Ok(Issued {
        user_id: user.profile.id,
        token,
    })
}

fn validate(field: &str, value: &str) -> ApiResult<()> {
    if value.trim().is_empty() {
        return Err(ApiError::InvalidInput(format!("{} is required", field)));
    }
    if value.chars().count() > MAX_CREDENTIAL_LEN {
        return Err(ApiError::InvalidInput(format!(
            "{} must be at most {} characters",
            field, MAX_CREDENTIAL_LEN
        )));
    }
    Ok(())
}
