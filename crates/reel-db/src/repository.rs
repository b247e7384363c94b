use std::collections::HashSet;

use anyhow::Result;

use crate::models::{NewVideo, ProfileRow, UserRow, VideoRow};

/// Account persistence used by registration, login and profile lookups.
pub trait AccountStore {
    fn user_by_username(&self, username: &str) -> Result<Option<UserRow>>;

    fn profile_by_id(&self, id: i64) -> Result<Option<ProfileRow>>;

    /// Insert a new account and return its id, or `None` when the username
    /// is already taken.
    fn create_user(&self, username: &str, password_hash: &str) -> Result<Option<i64>>;
}

/// Video timeline reads and publishing. Every listing is ordered by
/// `(publish_time DESC, id DESC)`.
pub trait VideoStore {
    /// Up to `limit` videos published strictly before `cursor`.
    fn videos_before(&self, cursor: i64, limit: u32) -> Result<Vec<VideoRow>>;

    /// Every video published at exactly `publish_time`.
    fn videos_at(&self, publish_time: i64) -> Result<Vec<VideoRow>>;

    fn videos_by_author(&self, author_id: i64) -> Result<Vec<VideoRow>>;

    /// Record a video and bump the author's work count.
    fn insert_video(&self, video: &NewVideo<'_>) -> Result<i64>;
}

/// Batched viewer-relative lookups. One call per batch, never per row.
pub trait EngagementStore {
    /// The subset of `video_ids` the viewer has favorited.
    fn favorited_among(&self, viewer_id: i64, video_ids: &[i64]) -> Result<HashSet<i64>>;

    /// The subset of `author_ids` the viewer follows.
    fn following_among(&self, viewer_id: i64, author_ids: &[i64]) -> Result<HashSet<i64>>;
}
