//! In-memory store with call counters for service-level tests.

use std::cell::{Cell, RefCell};
use std::collections::HashSet;

use anyhow::{Result, bail};
use reel_db::models::{NewVideo, ProfileRow, UserRow, VideoRow};
use reel_db::{AccountStore, EngagementStore, VideoStore};

use crate::token::TokenKeys;

pub fn keys() -> TokenKeys {
    TokenKeys::new("test-secret", chrono::Duration::hours(1))
}

pub fn profile(id: i64, username: &str) -> ProfileRow {
    ProfileRow {
        id,
        username: username.to_string(),
        avatar: String::new(),
        background_image: String::new(),
        signature: String::new(),
        follow_count: 0,
        follower_count: 0,
        total_favorited: 0,
        work_count: 0,
        favorite_count: 0,
    }
}

pub fn video(id: i64, author: &ProfileRow, publish_time: i64) -> VideoRow {
    VideoRow {
        id,
        author: author.clone(),
        play_url: format!("http://cdn/{}.mp4", id),
        cover_url: format!("http://cdn/{}.jpg", id),
        title: format!("video {}", id),
        favorite_count: 0,
        comment_count: 0,
        publish_time,
    }
}

#[derive(Default)]
pub struct FakeStore {
    pub users: RefCell<Vec<UserRow>>,
    pub videos: RefCell<Vec<VideoRow>>,
    /// (viewer, video)
    pub favorites: HashSet<(i64, i64)>,
    /// (follower, followee)
    pub follows: HashSet<(i64, i64)>,
    pub favorite_calls: Cell<usize>,
    pub follow_calls: Cell<usize>,
    pub fail_lookups: bool,
    /// Makes `user_by_username` miss, so only the insert can catch a duplicate.
    pub skip_username_lookup: bool,
}

impl FakeStore {
    pub fn with_videos(videos: Vec<VideoRow>) -> Self {
        Self {
            videos: RefCell::new(videos),
            ..Self::default()
        }
    }

    pub fn lookups(&self) -> (usize, usize) {
        (self.favorite_calls.get(), self.follow_calls.get())
    }

    fn sorted(&self, keep: impl Fn(&VideoRow) -> bool) -> Vec<VideoRow> {
        let mut rows: Vec<VideoRow> = self.videos.borrow().iter().filter(|v| keep(v)).cloned().collect();
        rows.sort_by(|a, b| (b.publish_time, b.id).cmp(&(a.publish_time, a.id)));
        rows
    }
}

impl AccountStore for FakeStore {
    fn user_by_username(&self, username: &str) -> Result<Option<UserRow>> {
        if self.skip_username_lookup {
            return Ok(None);
        }
        Ok(self.users.borrow().iter().find(|u| u.profile.username == username).cloned())
    }

    fn profile_by_id(&self, id: i64) -> Result<Option<ProfileRow>> {
        Ok(self
            .users
            .borrow()
            .iter()
            .find(|u| u.profile.id == id)
            .map(|u| u.profile.clone()))
    }

    fn create_user(&self, username: &str, password_hash: &str) -> Result<Option<i64>> {
        let mut users = self.users.borrow_mut();
        if users.iter().any(|u| u.profile.username == username) {
            return Ok(None);
        }
        let id = users.len() as i64 + 1;
        users.push(UserRow {
            profile: profile(id, username),
            password: password_hash.to_string(),
        });
        Ok(Some(id))
    }
}

impl VideoStore for FakeStore {
    fn videos_before(&self, cursor: i64, limit: u32) -> Result<Vec<VideoRow>> {
        let mut rows = self.sorted(|v| v.publish_time < cursor);
        rows.truncate(limit as usize);
        Ok(rows)
    }

    fn videos_at(&self, publish_time: i64) -> Result<Vec<VideoRow>> {
        Ok(self.sorted(|v| v.publish_time == publish_time))
    }

    fn videos_by_author(&self, author_id: i64) -> Result<Vec<VideoRow>> {
        Ok(self.sorted(|v| v.author.id == author_id))
    }

    fn insert_video(&self, new: &NewVideo<'_>) -> Result<i64> {
        let author = self
            .profile_by_id(new.author_id)?
            .unwrap_or_else(|| profile(new.author_id, "unknown"));
        let mut videos = self.videos.borrow_mut();
        let id = videos.len() as i64 + 1;
        let mut row = video(id, &author, new.publish_time);
        row.play_url = new.play_url.to_string();
        row.cover_url = new.cover_url.to_string();
        row.title = new.title.to_string();
        videos.push(row);
        Ok(id)
    }
}

impl EngagementStore for FakeStore {
    fn favorited_among(&self, viewer_id: i64, video_ids: &[i64]) -> Result<HashSet<i64>> {
        self.favorite_calls.set(self.favorite_calls.get() + 1);
        if self.fail_lookups {
            bail!("favorites table unavailable");
        }
        Ok(video_ids
            .iter()
            .copied()
            .filter(|id| self.favorites.contains(&(viewer_id, *id)))
            .collect())
    }

    fn following_among(&self, viewer_id: i64, author_ids: &[i64]) -> Result<HashSet<i64>> {
        self.follow_calls.set(self.follow_calls.get() + 1);
        if self.fail_lookups {
            bail!("follows table unavailable");
        }
        Ok(author_ids
            .iter()
            .copied()
            .filter(|id| self.follows.contains(&(viewer_id, *id)))
            .collect())
    }
}
