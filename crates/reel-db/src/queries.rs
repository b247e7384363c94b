use std::collections::HashSet;

use crate::Database;
use crate::models::{NewVideo, ProfileRow, UserRow, VideoRow};
use crate::repository::{AccountStore, EngagementStore, VideoStore};
use anyhow::Result;
use rusqlite::types::ToSql;
use rusqlite::{Connection, Row, ffi};
use tracing::debug;

const PROFILE_COLUMNS: &str = "u.id, u.username, u.avatar, u.background_image, u.signature,
     u.follow_count, u.follower_count, u.total_favorited, u.work_count, u.favorite_count";

// JOIN users so every video carries its author summary in one query (no N+1)
const VIDEO_SELECT: &str = "SELECT v.id, v.play_url, v.cover_url, v.title, v.favorite_count,
            v.comment_count, v.publish_time,
            u.id, u.username, u.avatar, u.background_image, u.signature,
            u.follow_count, u.follower_count, u.total_favorited, u.work_count, u.favorite_count
     FROM videos v
     JOIN users u ON u.id = v.author_id";

const TIMELINE_ORDER: &str = "ORDER BY v.publish_time DESC, v.id DESC";

impl AccountStore for Database {
    fn user_by_username(&self, username: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user_by_username(conn, username))
    }

    fn profile_by_id(&self, id: i64) -> Result<Option<ProfileRow>> {
        self.with_conn(|conn| {
            let sql = format!("SELECT {PROFILE_COLUMNS} FROM users u WHERE u.id = ?1");
            conn.query_row(&sql, [id], |row| profile_from_row(row, 0))
                .optional()
        })
    }

    fn create_user(&self, username: &str, password_hash: &str) -> Result<Option<i64>> {
        self.with_conn_mut(|conn| {
            let inserted = conn.execute(
                "INSERT INTO users (username, password) VALUES (?1, ?2)",
                (username, password_hash),
            );
            match inserted {
                Ok(_) => Ok(Some(conn.last_insert_rowid())),
                Err(rusqlite::Error::SqliteFailure(e, _))
                    if e.extended_code == ffi::SQLITE_CONSTRAINT_UNIQUE =>
                {
                    debug!("Username '{}' rejected by unique constraint", username);
                    Ok(None)
                }
                Err(e) => Err(e.into()),
            }
        })
    }
}

impl VideoStore for Database {
    fn videos_before(&self, cursor: i64, limit: u32) -> Result<Vec<VideoRow>> {
        self.with_conn(|conn| {
            let sql = format!("{VIDEO_SELECT} WHERE v.publish_time < ?1 {TIMELINE_ORDER} LIMIT ?2");
            query_videos(conn, &sql, &[&cursor, &limit])
        })
    }

    fn videos_at(&self, publish_time: i64) -> Result<Vec<VideoRow>> {
        self.with_conn(|conn| {
            let sql = format!("{VIDEO_SELECT} WHERE v.publish_time = ?1 {TIMELINE_ORDER}");
            query_videos(conn, &sql, &[&publish_time])
        })
    }

    fn videos_by_author(&self, author_id: i64) -> Result<Vec<VideoRow>> {
        self.with_conn(|conn| {
            let sql = format!("{VIDEO_SELECT} WHERE v.author_id = ?1 {TIMELINE_ORDER}");
            query_videos(conn, &sql, &[&author_id])
        })
    }

    fn insert_video(&self, video: &NewVideo<'_>) -> Result<i64> {
        self.with_conn_mut(|conn| {
            let tx = conn.unchecked_transaction()?;
            tx.execute(
                "INSERT INTO videos (author_id, play_url, cover_url, title, publish_time)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                rusqlite::params![
                    video.author_id,
                    video.play_url,
                    video.cover_url,
                    video.title,
                    video.publish_time
                ],
            )?;
            let id = tx.last_insert_rowid();
            tx.execute(
                "UPDATE users SET work_count = work_count + 1 WHERE id = ?1",
                [video.author_id],
            )?;
            tx.commit()?;
            Ok(id)
        })
    }
}

impl EngagementStore for Database {
    fn favorited_among(&self, viewer_id: i64, video_ids: &[i64]) -> Result<HashSet<i64>> {
        if video_ids.is_empty() {
            return Ok(HashSet::new());
        }
        self.with_conn(|conn| {
            query_subset(
                conn,
                "SELECT video_id FROM favorites WHERE user_id = ?1 AND video_id IN",
                viewer_id,
                video_ids,
            )
        })
    }

    fn following_among(&self, viewer_id: i64, author_ids: &[i64]) -> Result<HashSet<i64>> {
        if author_ids.is_empty() {
            return Ok(HashSet::new());
        }
        self.with_conn(|conn| {
            query_subset(
                conn,
                "SELECT followee_id FROM follows WHERE follower_id = ?1 AND followee_id IN",
                viewer_id,
                author_ids,
            )
        })
    }
}

fn query_user_by_username(conn: &Connection, username: &str) -> Result<Option<UserRow>> {
    let sql = format!("SELECT {PROFILE_COLUMNS}, u.password FROM users u WHERE u.username = ?1");
    let mut stmt = conn.prepare(&sql)?;

    let row = stmt
        .query_row([username], |row| {
            Ok(UserRow {
                profile: profile_from_row(row, 0)?,
                password: row.get(10)?,
            })
        })
        .optional()?;

    Ok(row)
}

fn query_videos(conn: &Connection, sql: &str, params: &[&dyn ToSql]) -> Result<Vec<VideoRow>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt
        .query_map(params, |row| {
            Ok(VideoRow {
                id: row.get(0)?,
                play_url: row.get(1)?,
                cover_url: row.get(2)?,
                title: row.get(3)?,
                favorite_count: row.get(4)?,
                comment_count: row.get(5)?,
                publish_time: row.get(6)?,
                author: profile_from_row(row, 7)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(rows)
}

/// Ids bound per statement. Stays under SQLite's historical limit of 999
/// host parameters, leaving room for the viewer in `?1`.
const MAX_IDS_PER_QUERY: usize = 900;

/// Runs `{prefix} (?2, ?3, ...)` with the viewer bound to `?1` and returns
/// the first column of every matching row. Large id lists are split across
/// several statements and the results merged.
fn query_subset(conn: &Connection, prefix: &str, viewer_id: i64, ids: &[i64]) -> Result<HashSet<i64>> {
    let mut found = HashSet::new();

    for chunk in ids.chunks(MAX_IDS_PER_QUERY) {
        let placeholders: Vec<String> = (2..=chunk.len() + 1).map(|i| format!("?{}", i)).collect();
        let sql = format!("{} ({})", prefix, placeholders.join(", "));

        let mut params: Vec<&dyn ToSql> = Vec::with_capacity(chunk.len() + 1);
        params.push(&viewer_id);
        params.extend(chunk.iter().map(|id| id as &dyn ToSql));

        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params.as_slice(), |row| row.get::<_, i64>(0))?;
        for id in rows {
            found.insert(id?);
        }
    }

    Ok(found)
}

fn profile_from_row(row: &Row<'_>, offset: usize) -> rusqlite::Result<ProfileRow> {
    Ok(ProfileRow {
        id: row.get(offset)?,
        username: row.get(offset + 1)?,
        avatar: row.get(offset + 2)?,
        background_image: row.get(offset + 3)?,
        signature: row.get(offset + 4)?,
        follow_count: row.get(offset + 5)?,
        follower_count: row.get(offset + 6)?,
        total_favorited: row.get(offset + 7)?,
        work_count: row.get(offset + 8)?,
        favorite_count: row.get(offset + 9)?,
    })
}

/// Extension trait for optional query results
trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
