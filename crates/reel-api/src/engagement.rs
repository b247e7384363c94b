use std::collections::HashSet;

use reel_db::EngagementStore;
use reel_db::models::{ProfileRow, VideoRow};
use reel_types::models::{User, Video};

use crate::error::{ApiResult, UpstreamExt};
use crate::identity::Viewer;

/// Annotates a batch of videos with the viewer's favorite and follow state.
///
/// Anonymous viewers get all-false flags without touching the store. An
/// authenticated viewer costs exactly one favorite lookup and one follow
/// lookup for the whole batch. A viewer never follows themself, whatever the
/// store reports. If either lookup fails the batch fails; there is no
/// partially enriched result.
pub fn enrich<S>(store: &S, viewer: &Viewer, rows: Vec<VideoRow>) -> ApiResult<Vec<Video>>
where
    S: EngagementStore + ?Sized,
{
    let (favorited, followed) = match viewer {
        Viewer::Anonymous => (HashSet::new(), HashSet::new()),
        Viewer::Authenticated { id, .. } => {
            let video_ids = distinct(rows.iter().map(|r| r.id));
            let author_ids = distinct(rows.iter().map(|r| r.author.id));

            let favorited = store
                .favorited_among(*id, &video_ids)
                .upstream("favorite lookup")?;
            let mut followed = store
                .following_among(*id, &author_ids)
                .upstream("follow lookup")?;
            followed.remove(id);

            (favorited, followed)
        }
    };

    Ok(rows
        .into_iter()
        .map(|row| {
            let is_follow = followed.contains(&row.author.id);
            Video {
                id: row.id,
                is_favorite: favorited.contains(&row.id),
                author: user_view(row.author, is_follow),
                play_url: row.play_url,
                cover_url: row.cover_url,
                favorite_count: row.favorite_count,
                comment_count: row.comment_count,
                title: row.title,
            }
        })
        .collect())
}

pub fn user_view(profile: ProfileRow, is_follow: bool) -> User {
    User {
        id: profile.id,
        name: profile.username,
        follow_count: profile.follow_count,
        follower_count: profile.follower_count,
        is_follow,
        avatar: profile.avatar,
        background_image: profile.background_image,
        signature: profile.signature,
        total_favorited: profile.total_favorited,
        work_count: profile.work_count,
        favorite_count: profile.favorite_count,
    }
}

/// First-seen order, duplicates dropped.
fn distinct(ids: impl Iterator<Item = i64>) -> Vec<i64> {
    let mut seen = HashSet::new();
    ids.filter(|id| seen.insert(*id)).collect()
}
