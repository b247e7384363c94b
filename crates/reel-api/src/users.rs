use axum::{
    Json,
    extract::{Query, State},
    http::HeaderMap,
};

use reel_db::{AccountStore, EngagementStore};
use reel_types::api::{Status, UserQuery, UserResponse};
use reel_types::models::User;

use crate::engagement::user_view;
use crate::error::{ApiError, ApiResult, UpstreamExt};
use crate::identity::{Viewer, presented_token, resolve};
use crate::state::{AppState, run_blocking};
use crate::token::TokenKeys;

/// GET /douyin/user/
pub async fn user_info(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<UserQuery>,
) -> ApiResult<Json<UserResponse>> {
    let token = presented_token(query.token.as_deref(), &headers).map(str::to_owned);
    let user_id = query.user_id;

    let user = run_blocking(&state, move |s| {
        get_user(&s.db, &s.tokens, token.as_deref(), user_id)
    })
    .await?;

    Ok(Json(UserResponse {
        status: Status::ok(),
        user,
    }))
}

pub fn get_user<S>(store: &S, keys: &TokenKeys, token: Option<&str>, user_id: i64) -> ApiResult<User>
where
    S: AccountStore + EngagementStore + ?Sized,
{
    let viewer = resolve(keys, token)?;

    let profile = store
        .profile_by_id(user_id)
        .upstream("account lookup")?
        .ok_or(ApiError::NotFound("user"))?;

    let is_follow = match viewer {
        Viewer::Authenticated { id, .. } if id != profile.id => store
            .following_among(id, &[profile.id])
            .upstream("follow lookup")?
            .contains(&profile.id),
        _ => false,
    };

    Ok(user_view(profile, is_follow))
}
