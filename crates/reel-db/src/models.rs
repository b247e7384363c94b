//! Database row types. These map directly to SQLite rows and stay
//! independent of the reel-types wire models.

/// Public columns of a `users` row, also joined onto every video row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileRow {
    pub id: i64,
    pub username: String,
    pub avatar: String,
    pub background_image: String,
    pub signature: String,
    pub follow_count: i64,
    pub follower_count: i64,
    pub total_favorited: i64,
    pub work_count: i64,
    pub favorite_count: i64,
}

#[derive(Debug, Clone)]
pub struct UserRow {
    pub profile: ProfileRow,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoRow {
    pub id: i64,
    pub author: ProfileRow,
    pub play_url: String,
    pub cover_url: String,
    pub title: String,
    pub favorite_count: i64,
    pub comment_count: i64,
    pub publish_time: i64,
}

pub struct NewVideo<'a> {
    pub author_id: i64,
    pub play_url: &'a str,
    pub cover_url: &'a str,
    pub title: &'a str,
    pub publish_time: i64,
}
