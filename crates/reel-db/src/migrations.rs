use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS users (
            id                  INTEGER PRIMARY KEY AUTOINCREMENT,
            username            TEXT NOT NULL UNIQUE,
            password            TEXT NOT NULL,
            avatar              TEXT NOT NULL DEFAULT '',
            background_image    TEXT NOT NULL DEFAULT '',
            signature           TEXT NOT NULL DEFAULT '',
            follow_count        INTEGER NOT NULL DEFAULT 0,
            follower_count      INTEGER NOT NULL DEFAULT 0,
            total_favorited     INTEGER NOT NULL DEFAULT 0,
            work_count          INTEGER NOT NULL DEFAULT 0,
            favorite_count      INTEGER NOT NULL DEFAULT 0,
            created_at          TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS videos (
            id              INTEGER PRIMARY KEY AUTOINCREMENT,
            author_id       INTEGER NOT NULL REFERENCES users(id),
            play_url        TEXT NOT NULL,
            cover_url       TEXT NOT NULL DEFAULT '',
            title           TEXT NOT NULL,
            favorite_count  INTEGER NOT NULL DEFAULT 0,
            comment_count   INTEGER NOT NULL DEFAULT 0,
            publish_time    INTEGER NOT NULL
        );

        -- Feed pages walk (publish_time, id) descending
        CREATE INDEX IF NOT EXISTS idx_videos_timeline
            ON videos(publish_time DESC, id DESC);

        CREATE INDEX IF NOT EXISTS idx_videos_author
            ON videos(author_id, publish_time DESC);

        CREATE TABLE IF NOT EXISTS favorites (
            user_id     INTEGER NOT NULL REFERENCES users(id),
            video_id    INTEGER NOT NULL REFERENCES videos(id),
            created_at  TEXT NOT NULL DEFAULT (datetime('now')),
            PRIMARY KEY (user_id, video_id)
        );

        CREATE TABLE IF NOT EXISTS follows (
            follower_id INTEGER NOT NULL REFERENCES users(id),
            followee_id INTEGER NOT NULL REFERENCES users(id),
            created_at  TEXT NOT NULL DEFAULT (datetime('now')),
            PRIMARY KEY (follower_id, followee_id)
        );
        ",
    )?;

    info!("Database migrations complete");
    Ok(())
}
