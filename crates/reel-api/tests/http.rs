use std::sync::Arc;
use std::time::Duration;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use http_body_util::BodyExt;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use reel_api::storage::Storage;
use reel_api::token::TokenKeys;
use reel_api::{AppState, AppStateInner, router};
use reel_db::models::NewVideo;
use reel_db::{Database, VideoStore};

const PUBLIC_BASE: &str = "http://reel.test/static";

struct TestApp {
    app: Router,
    state: AppState,
    storage_dir: TempDir,
}

impl TestApp {
    async fn new() -> Self {
        let storage_dir = tempfile::tempdir().unwrap();
        let storage = Storage::new(storage_dir.path().to_path_buf(), PUBLIC_BASE)
            .await
            .unwrap();
        let state: AppState = Arc::new(AppStateInner {
            db: Database::open_in_memory().unwrap(),
            tokens: TokenKeys::new("test-secret", chrono::Duration::hours(1)),
            storage,
            default_cover_url: "http://reel.test/cover.jpg".into(),
            request_timeout: Duration::from_secs(30),
        });
        let app = router(state.clone(), 1024 * 1024);
        Self {
            app,
            state,
            storage_dir,
        }
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, Vec<u8>) {
        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let body = response.into_body().collect().await.unwrap().to_bytes();
        (status, body.to_vec())
    }

    async fn json(&self, method: &str, uri: &str) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap();
        let (status, body) = self.send(request).await;
        (status, serde_json::from_slice(&body).unwrap())
    }

    async fn register(&self, username: &str, password: &str) -> (i64, String) {
        let uri = format!("/douyin/user/register/?username={}&password={}", username, password);
        let (status, body) = self.json("POST", &uri).await;
        assert_eq!(status, StatusCode::OK, "{}", body);
        (
            body["user_id"].as_i64().unwrap(),
            body["token"].as_str().unwrap().to_string(),
        )
    }
}

fn seed_video(state: &AppState, author_id: i64, publish_time: i64) -> i64 {
    state
        .db
        .insert_video(&NewVideo {
            author_id,
            play_url: "http://reel.test/static/seed.mp4",
            cover_url: "",
            title: "seed",
            publish_time,
        })
        .unwrap()
}

fn video_ids(body: &Value) -> Vec<i64> {
    body["video_list"]
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v["id"].as_i64().unwrap())
        .collect()
}

#[tokio::test]
async fn register_login_and_duplicate() {
    let app = TestApp::new().await;
    let (user_id, _) = app.register("alice", "secret").await;

    let (status, body) = app
        .json("POST", "/douyin/user/register/?username=alice&password=other")
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["status_code"], 409);
    assert_eq!(body["status_msg"], "username already exists");

    let (status, body) = app
        .json("POST", "/douyin/user/login/?username=alice&password=secret")
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status_code"], 0);
    assert_eq!(body["user_id"].as_i64(), Some(user_id));

    let (wrong_status, wrong) = app
        .json("POST", "/douyin/user/login/?username=alice&password=wrong")
        .await;
    let (ghost_status, ghost) = app
        .json("POST", "/douyin/user/login/?username=ghost&password=anything")
        .await;
    assert_eq!(wrong_status, StatusCode::UNAUTHORIZED);
    assert_eq!(ghost_status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong, ghost);
}

#[tokio::test]
async fn feed_paginates_and_flags_engagement() {
    let app = TestApp::new().await;
    let (author, _) = app.register("author", "secret").await;
    let (viewer, token) = app.register("viewer", "secret").await;
    for t in 1..=35 {
        seed_video(&app.state, author, t);
    }
    app.state
        .db
        .with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO favorites (user_id, video_id) VALUES (?1, 35)",
                [viewer],
            )?;
            conn.execute(
                "INSERT INTO follows (follower_id, followee_id) VALUES (?1, ?2)",
                (viewer, author),
            )?;
            Ok(())
        })
        .unwrap();

    let (status, first) = app.json("GET", "/douyin/feed/").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(video_ids(&first), (6..=35).rev().collect::<Vec<_>>());
    assert_eq!(first["next_time"], 6);
    assert_eq!(first["video_list"][0]["is_favorite"], false);
    assert_eq!(first["video_list"][0]["author"]["is_follow"], false);

    let (_, second) = app.json("GET", "/douyin/feed/?latest_time=6").await;
    assert_eq!(video_ids(&second), vec![5, 4, 3, 2, 1]);
    assert!(second.get("next_time").is_none());

    let uri = format!("/douyin/feed/?token={}", token);
    let (_, personal) = app.json("GET", &uri).await;
    assert_eq!(personal["video_list"][0]["is_favorite"], true);
    assert_eq!(personal["video_list"][1]["is_favorite"], false);
    assert_eq!(personal["video_list"][0]["author"]["is_follow"], true);

    let request = Request::builder()
        .uri("/douyin/feed/")
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap();
    let (_, body) = app.send(request).await;
    let by_header: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(by_header["video_list"][0]["is_favorite"], true);
}

#[tokio::test]
async fn bad_token_is_rejected_not_downgraded() {
    let app = TestApp::new().await;

    let (status, body) = app.json("GET", "/douyin/feed/?token=forged").await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["status_msg"], "invalid credentials");
}

#[tokio::test]
async fn publish_then_list_and_download() {
    let app = TestApp::new().await;
    let (author, token) = app.register("creator", "secret").await;

    let boundary = "reel-test-boundary";
    let body = format!(
        "--{b}\r\nContent-Disposition: form-data; name=\"token\"\r\n\r\n{token}\r\n\
         --{b}\r\nContent-Disposition: form-data; name=\"title\"\r\n\r\nmy first clip\r\n\
         --{b}\r\nContent-Disposition: form-data; name=\"data\"; filename=\"clip.mp4\"\r\n\
         Content-Type: video/mp4\r\n\r\nFAKE-MP4-BYTES\r\n\
         --{b}--\r\n",
        b = boundary,
        token = token
    );
    let request = Request::builder()
        .method("POST")
        .uri("/douyin/publish/action/")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", boundary),
        )
        .body(Body::from(body))
        .unwrap();
    let (status, response) = app.send(request).await;
    assert_eq!(status, StatusCode::OK, "{}", String::from_utf8_lossy(&response));

    let uri = format!("/douyin/publish/list/?user_id={}", author);
    let (status, list) = app.json("GET", &uri).await;
    assert_eq!(status, StatusCode::OK);
    let video = &list["video_list"][0];
    assert_eq!(video["title"], "my first clip");
    assert_eq!(video["cover_url"], "http://reel.test/cover.jpg");
    assert_eq!(video["author"]["work_count"], 1);
    assert_eq!(video["author"]["is_follow"], false);

    let play_url = video["play_url"].as_str().unwrap();
    let path = play_url.strip_prefix("http://reel.test").unwrap();
    let request = Request::builder().uri(path).body(Body::empty()).unwrap();
    let (status, bytes) = app.send(request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(bytes, b"FAKE-MP4-BYTES");
}

#[tokio::test]
async fn publish_requires_a_token() {
    let app = TestApp::new().await;

    let boundary = "reel-test-boundary";
    let body = format!(
        "--{b}\r\nContent-Disposition: form-data; name=\"title\"\r\n\r\nanon\r\n\
         --{b}\r\nContent-Disposition: form-data; name=\"data\"; filename=\"a.mp4\"\r\n\r\nX\r\n\
         --{b}--\r\n",
        b = boundary
    );
    let request = Request::builder()
        .method("POST")
        .uri("/douyin/publish/action/")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", boundary),
        )
        .body(Body::from(body))
        .unwrap();

    let (status, _) = app.send(request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn publish_for_a_missing_account_stores_nothing() {
    let app = TestApp::new().await;
    let token = app.state.tokens.sign(404, "ghost").unwrap();

    let boundary = "reel-test-boundary";
    let body = format!(
        "--{b}\r\nContent-Disposition: form-data; name=\"token\"\r\n\r\n{token}\r\n\
         --{b}\r\nContent-Disposition: form-data; name=\"title\"\r\n\r\nghost clip\r\n\
         --{b}\r\nContent-Disposition: form-data; name=\"data\"; filename=\"g.mp4\"\r\n\r\nX\r\n\
         --{b}--\r\n",
        b = boundary,
        token = token
    );
    let request = Request::builder()
        .method("POST")
        .uri("/douyin/publish/action/")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", boundary),
        )
        .body(Body::from(body))
        .unwrap();

    let (status, _) = app.send(request).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(!app.storage_dir.path().join("videos").exists());
}

#[tokio::test]
async fn unknown_user_is_not_found() {
    let app = TestApp::new().await;

    let (status, body) = app.json("GET", "/douyin/user/?user_id=404").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["status_code"], 404);

    let (status, _) = app.json("GET", "/douyin/publish/list/?user_id=404").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn health_check() {
    let app = TestApp::new().await;
    let request = Request::builder().uri("/health").body(Body::empty()).unwrap();

    let (status, body) = app.send(request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, b"ok");
}
