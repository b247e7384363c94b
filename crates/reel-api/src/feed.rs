use axum::{
    Json,
    extract::{Query, State},
    http::HeaderMap,
};
use tracing::debug;

use reel_db::models::VideoRow;
use reel_db::{EngagementStore, VideoStore};
use reel_types::api::{FeedQuery, FeedResponse, Status};
use reel_types::models::Video;

use crate::engagement::enrich;
use crate::error::{ApiResult, UpstreamExt};
use crate::identity::{presented_token, resolve};
use crate::state::{AppState, run_blocking};
use crate::token::TokenKeys;

/// Target videos per feed page. This is a soft bound: a page never splits a
/// group of videos sharing one publish time, so it comes back shorter when a
/// trailing tie group is deferred, or longer when the whole page is one
/// tie group.
pub const PAGE_SIZE: usize = 30;

#[derive(Debug)]
pub struct FeedPage {
    pub videos: Vec<Video>,
    /// Publish time of the oldest video in the page, or `None` once nothing
    /// older remains.
    pub next_cursor: Option<i64>,
}

/// GET /douyin/feed/
pub async fn feed(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<FeedQuery>,
) -> ApiResult<Json<FeedResponse>> {
    let token = presented_token(query.token.as_deref(), &headers).map(str::to_owned);
    let latest_time = query.latest_time;

    let page = run_blocking(&state, move |s| {
        get_feed(&s.db, &s.tokens, token.as_deref(), latest_time)
    })
    .await?;

    Ok(Json(FeedResponse {
        status: Status::ok(),
        video_list: page.videos,
        next_time: page.next_cursor,
    }))
}

/// Next page of the feed strictly older than `latest_time` (now when absent
/// or zero), enriched for whoever `token` identifies.
pub fn get_feed<S>(
    store: &S,
    keys: &TokenKeys,
    token: Option<&str>,
    latest_time: Option<i64>,
) -> ApiResult<FeedPage>
where
    S: VideoStore + EngagementStore + ?Sized,
{
    let viewer = resolve(keys, token)?;

    let cursor = match latest_time {
        None | Some(0) => chrono::Utc::now().timestamp(),
        Some(t) => t,
    };

    let (rows, more) = select_page(store, cursor)?;
    let next_cursor = if more {
        rows.last().map(|r| r.publish_time)
    } else {
        None
    };

    debug!(
        "Feed page before {}: {} videos, next {:?}, viewer {:?}",
        cursor,
        rows.len(),
        next_cursor,
        viewer.id()
    );

    let videos = enrich(store, &viewer, rows)?;
    Ok(FeedPage {
        videos,
        next_cursor,
    })
}

/// Reads one row past the page to learn whether older videos exist and
/// whether the page boundary splits a group of equal publish times.
///
/// The cursor is a bare timestamp, so a page must end on a timestamp
/// change: a split tie group is dropped from this page and returned whole by
/// the next one. A page made of a single tie group is widened to the entire
/// group instead.
fn select_page<S>(store: &S, cursor: i64) -> ApiResult<(Vec<VideoRow>, bool)>
where
    S: VideoStore + ?Sized,
{
    let mut rows = store
        .videos_before(cursor, PAGE_SIZE as u32 + 1)
        .upstream("feed query")?;

    if rows.len() <= PAGE_SIZE {
        return Ok((rows, false));
    }

    let boundary = rows[PAGE_SIZE - 1].publish_time;
    let split = rows[PAGE_SIZE].publish_time == boundary;
    rows.truncate(PAGE_SIZE);
    if !split {
        return Ok((rows, true));
    }

    rows.retain(|r| r.publish_time != boundary);
    if rows.is_empty() {
        rows = store.videos_at(boundary).upstream("feed query")?;
    }

    Ok((rows, true))
}
