use axum::{
    Json,
    extract::{Multipart, Query, State},
    http::HeaderMap,
};
use tracing::{debug, info, warn};
use uuid::Uuid;

use reel_db::models::{NewVideo, ProfileRow};
use reel_db::{AccountStore, EngagementStore, VideoStore};
use reel_types::api::{PublishListQuery, PublishListResponse, Status, StatusResponse};
use reel_types::models::Video;

use crate::engagement::enrich;
use crate::error::{ApiError, ApiResult, UpstreamExt};
use crate::identity::{Viewer, presented_token, resolve};
use crate::state::{AppState, run_blocking};
use crate::token::TokenKeys;

const MAX_TITLE_LEN: usize = 128;

/// GET /douyin/publish/list/
pub async fn publish_list(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<PublishListQuery>,
) -> ApiResult<Json<PublishListResponse>> {
    let token = presented_token(query.token.as_deref(), &headers).map(str::to_owned);
    let author_id = query.user_id;

    let videos = run_blocking(&state, move |s| {
        get_publish_list(&s.db, &s.tokens, token.as_deref(), author_id)
    })
    .await?;

    Ok(Json(PublishListResponse {
        status: Status::ok(),
        video_list: videos,
    }))
}

/// Every video by `author_id`, newest first, as the author sees them:
/// their own favorites marked, follow flags always false.
///
/// A presented token must still be valid, but it does not change whose
/// engagement is shown.
pub fn get_publish_list<S>(
    store: &S,
    keys: &TokenKeys,
    token: Option<&str>,
    author_id: i64,
) -> ApiResult<Vec<Video>>
where
    S: AccountStore + VideoStore + EngagementStore + ?Sized,
{
    resolve(keys, token)?;

    let author = store
        .profile_by_id(author_id)
        .upstream("account lookup")?
        .ok_or(ApiError::NotFound("user"))?;

    let rows = store
        .videos_by_author(author.id)
        .upstream("publish list query")?;
    debug!("Publish list for {}: {} videos", author.id, rows.len());

    let viewer = Viewer::Authenticated {
        id: author.id,
        name: author.username,
    };
    enrich(store, &viewer, rows)
}

/// POST /douyin/publish/action/ (multipart: `data`, `token`, `title`)
pub async fn publish_action(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> ApiResult<Json<StatusResponse>> {
    let mut data = None;
    let mut token = None;
    let mut title = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::InvalidInput(format!("malformed upload: {}", e)))?
    {
        let name = field.name().map(str::to_owned);
        let unreadable = |e: axum::extract::multipart::MultipartError| {
            ApiError::InvalidInput(format!("unreadable {} field: {}", name.as_deref().unwrap_or("?"), e))
        };
        match name.as_deref() {
            Some("data") => data = Some(field.bytes().await.map_err(unreadable)?),
            Some("token") => token = Some(field.text().await.map_err(unreadable)?),
            Some("title") => title = Some(field.text().await.map_err(unreadable)?),
            _ => {}
        }
    }

    let viewer = resolve(&state.tokens, presented_token(token.as_deref(), &headers))?;
    let Viewer::Authenticated { id: author_id, .. } = viewer else {
        return Err(ApiError::InvalidCredential);
    };

    let title = title.unwrap_or_default().trim().to_string();
    if title.is_empty() || title.chars().count() > MAX_TITLE_LEN {
        return Err(ApiError::InvalidInput(format!(
            "title must be 1-{} characters",
            MAX_TITLE_LEN
        )));
    }
    let data = data
        .filter(|d| !d.is_empty())
        .ok_or_else(|| ApiError::InvalidInput("video data is required".into()))?;

    let author = run_blocking(&state, move |s| publishing_author(&s.db, author_id)).await?;

    let key = format!("videos/{}.mp4", Uuid::new_v4());
    let play_url = state.storage.put(&key, &data).await.upstream("video upload")?;

    let recorded = run_blocking(&state, move |s| {
        record_video(
            &s.db,
            author_id,
            &play_url,
            &s.default_cover_url,
            &title,
            chrono::Utc::now().timestamp(),
        )
    })
    .await;
    let video_id = match recorded {
        Ok(id) => id,
        Err(e) => {
            if let Err(cleanup) = state.storage.remove(&key).await {
                warn!("Could not remove orphaned object {}: {}", key, cleanup);
            }
            return Err(e);
        }
    };

    info!("{} ({}) published video {}", author.username, author_id, video_id);
    Ok(Json(StatusResponse {
        status: Status::ok(),
    }))
}

/// Account a new upload is attributed to. A token whose subject has no
/// account is treated like any other bad credential.
pub fn publishing_author<S>(store: &S, author_id: i64) -> ApiResult<ProfileRow>
where
    S: AccountStore + ?Sized,
{
    store
        .profile_by_id(author_id)
        .upstream("account lookup")?
        .ok_or(ApiError::InvalidCredential)
}

pub fn record_video<S>(
    store: &S,
    author_id: i64,
    play_url: &str,
    cover_url: &str,
    title: &str,
    publish_time: i64,
) -> ApiResult<i64>
where
    S: VideoStore + ?Sized,
{
    store
        .insert_video(&NewVideo {
            author_id,
            play_url,
            cover_url,
            title,
            publish_time,
        })
        .upstream("video insert")
}
