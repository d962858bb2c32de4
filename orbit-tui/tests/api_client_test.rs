use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use orbit::api::{uploaded_name, ApiClient, ApiError, MediaApi, UploadRequest};
use orbit::session::SessionContext;
use orbit_types::{CommentId, Role};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// What the stub server saw, keyed by endpoint.
#[derive(Default)]
struct Seen {
    auth: Vec<Option<String>>,
    queries: HashMap<&'static str, HashMap<String, String>>,
    content_type: Option<String>,
    upload_len: usize,
    comment_body: Option<Value>,
}

type Shared = Arc<Mutex<Seen>>;

fn record(seen: &Shared, headers: &HeaderMap) {
    let auth = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(String::from);
    seen.lock().unwrap().auth.push(auth);
}

async fn list_media(State(seen): State<Shared>, headers: HeaderMap) -> impl IntoResponse {
    record(&seen, &headers);
    Json(json!([
        {"name": "a.jpg", "username": "luna", "caption": "sunset", "likes": 3, "tagged_people": ["sol", "mars"]},
        {"name": "clip.mp4", "url": "http://cdn/clip.mp4"}
    ]))
}

async fn search_media(
    State(seen): State<Shared>,
    Query(q): Query<HashMap<String, String>>,
) -> impl IntoResponse {
    seen.lock().unwrap().queries.insert("search", q);
    Json(json!([]))
}

async fn login(Json(body): Json<Value>) -> impl IntoResponse {
    if body["password"] == "secret" {
        (StatusCode::OK, Json(json!({"token": "tok-1", "role": "Creator"})))
    } else {
        (StatusCode::UNAUTHORIZED, Json(json!({"error": "bad credentials"})))
    }
}

async fn verify_token() -> impl IntoResponse {
    StatusCode::UNAUTHORIZED
}

async fn like_media(Query(q): Query<HashMap<String, String>>) -> impl IntoResponse {
    match q.get("name").map(String::as_str) {
        Some("a.jpg") => Json(json!({"likes": 4})),
        _ => Json(json!({})),
    }
}

async fn delete_media(Query(q): Query<HashMap<String, String>>) -> impl IntoResponse {
    match q.get("name").map(String::as_str) {
        Some("empty.jpg") => (StatusCode::NO_CONTENT, String::new()),
        Some("text.jpg") => (StatusCode::OK, "deleted".to_string()),
        Some("json.jpg") => (StatusCode::OK, r#"{"deleted":true}"#.to_string()),
        Some("html.jpg") => (
            StatusCode::BAD_GATEWAY,
            "<!DOCTYPE html><html>gateway</html>".to_string(),
        ),
        Some("missing.jpg") => (StatusCode::NOT_FOUND, "no such media".to_string()),
        _ => (StatusCode::INTERNAL_SERVER_ERROR, "boom".to_string()),
    }
}

async fn upload_media(
    State(seen): State<Shared>,
    Query(q): Query<HashMap<String, String>>,
    headers: HeaderMap,
    body: Bytes,
) -> impl IntoResponse {
    record(&seen, &headers);
    let mut seen = seen.lock().unwrap();
    seen.queries.insert("upload", q);
    seen.content_type = headers
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .map(String::from);
    seen.upload_len = body.len();
    Json(json!({"name": "stored-1.png"}))
}

async fn get_comments(
    State(seen): State<Shared>,
    Query(q): Query<HashMap<String, String>>,
) -> impl IntoResponse {
    seen.lock().unwrap().queries.insert("comments", q);
    Json(json!([
        {"id": 1, "username": "luna", "comment": "first", "timestamp": "2024-05-01T10:00:00Z"},
        {"id": "c2", "parent_id": 1, "username": "sol", "comment": "reply"}
    ]))
}

async fn add_comment(State(seen): State<Shared>, Json(body): Json<Value>) -> impl IntoResponse {
    seen.lock().unwrap().comment_body = Some(body);
    Json(json!({"ok": true}))
}

async fn ai_caption() -> impl IntoResponse {
    Json(json!({"caption": "A quiet harbour at dusk"}))
}

async fn spawn_stub() -> (String, Shared) {
    let seen: Shared = Arc::default();
    let router = Router::new()
        .route("/api/list_media", get(list_media))
        .route("/api/search_media", get(search_media))
        .route("/api/login", post(login))
        .route("/api/verify_token", post(verify_token))
        .route("/api/like_media", post(like_media))
        .route("/api/delete_media", delete(delete_media))
        .route("/api/upload_media", post(upload_media))
        .route("/api/get_comments", get(get_comments))
        .route("/api/add_comment", post(add_comment))
        .route("/api/ai_caption", get(ai_caption))
        .with_state(seen.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    (format!("http://{}/api/", addr), seen)
}

fn signed_in_session() -> SessionContext {
    let session = SessionContext::in_memory();
    session.store_login("tok-1", Role::Consumer, "luna").unwrap();
    session
}

#[tokio::test]
async fn test_list_media_sends_bearer_token() {
    let (base, seen) = spawn_stub().await;
    let client = ApiClient::new(base, signed_in_session());

    let posts = client.list_media().await.unwrap();

    assert_eq!(posts.len(), 2);
    assert_eq!(posts[0].tagged_people, vec!["sol", "mars"]);
    assert_eq!(posts[1].username, "anonymous");
    assert!(posts[1].is_video());
    assert_eq!(seen.lock().unwrap().auth, vec![Some("Bearer tok-1".to_string())]);
}

#[tokio::test]
async fn test_requests_without_token_omit_header() {
    let (base, seen) = spawn_stub().await;
    let client = ApiClient::new(base, SessionContext::in_memory());

    client.list_media().await.unwrap();

    assert_eq!(seen.lock().unwrap().auth, vec![None]);
}

#[tokio::test]
async fn test_unauthorized_clears_session() {
    let (base, _) = spawn_stub().await;
    let session = signed_in_session();
    let client = ApiClient::new(base, session.clone());

    let err = client.verify_token().await.unwrap_err();

    assert!(err.is_unauthorized());
    assert!(session.token().is_none());
    assert!(!session.is_authenticated());
}

#[tokio::test]
async fn test_login_stores_token_and_role() {
    let (base, _) = spawn_stub().await;
    let session = SessionContext::in_memory();
    let client = ApiClient::new(base, session.clone());

    let response = client.login("luna", "secret").await.unwrap();

    assert_eq!(response.token.as_deref(), Some("tok-1"));
    assert_eq!(session.token().as_deref(), Some("tok-1"));
    assert_eq!(session.role(), Some(Role::Creator));
    assert_eq!(session.username().as_deref(), Some("luna"));
}

#[tokio::test]
async fn test_login_with_bad_password_is_an_error() {
    let (base, _) = spawn_stub().await;
    let session = SessionContext::in_memory();
    let client = ApiClient::new(base, session.clone());

    assert!(client.login("luna", "nope").await.is_err());
    assert!(session.token().is_none());
}

#[tokio::test]
async fn test_search_encodes_query() {
    let (base, seen) = spawn_stub().await;
    let client = ApiClient::new(base, signed_in_session());

    client.search_media("sunset & sea").await.unwrap();

    let seen = seen.lock().unwrap();
    assert_eq!(seen.queries["search"]["q"], "sunset & sea");
}

#[tokio::test]
async fn test_like_returns_server_count_when_present() {
    let (base, _) = spawn_stub().await;
    let client = ApiClient::new(base, signed_in_session());

    assert_eq!(client.like_media("a.jpg").await.unwrap().likes, Some(4));
    assert_eq!(client.like_media("b.jpg").await.unwrap().likes, None);
}

#[tokio::test]
async fn test_delete_accepts_empty_text_and_json_bodies() {
    let (base, _) = spawn_stub().await;
    let client = ApiClient::new(base, signed_in_session());

    assert_eq!(client.delete_media("empty.jpg").await.unwrap(), None);
    assert_eq!(
        client.delete_media("text.jpg").await.unwrap(),
        Some(Value::String("deleted".into()))
    );
    assert_eq!(
        client.delete_media("json.jpg").await.unwrap(),
        Some(json!({"deleted": true}))
    );
}

#[tokio::test]
async fn test_error_statuses_carry_messages() {
    let (base, _) = spawn_stub().await;
    let client = ApiClient::new(base, signed_in_session());

    match client.delete_media("boom.jpg").await {
        Err(ApiError::Http { status, message }) => {
            assert_eq!(status, 500);
            assert_eq!(message, "boom");
        }
        other => panic!("expected http error, got {:?}", other),
    }

    match client.delete_media("html.jpg").await {
        Err(ApiError::Http { status, message }) => {
            assert_eq!(status, 502);
            assert!(message.contains("check the server URL"));
        }
        other => panic!("expected http error, got {:?}", other),
    }

    assert!(matches!(
        client.delete_media("missing.jpg").await,
        Err(ApiError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_upload_with_progress_reaches_full_and_sends_query() {
    let (base, seen) = spawn_stub().await;
    let client = ApiClient::new(base, signed_in_session());
    let body = vec![7u8; 200 * 1024];

    let upload = UploadRequest::new(body, "harbour #dusk", "luna")
        .with_mime_type(Some("image/png".into()));
    let handle = client.upload_media_with_progress(upload);

    while !handle.is_finished() {
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    }
    assert_eq!(handle.progress(), 100);

    let response = handle.finish().await.unwrap();
    assert_eq!(uploaded_name(&response).as_deref(), Some("stored-1.png"));

    let seen = seen.lock().unwrap();
    assert_eq!(seen.upload_len, 200 * 1024);
    assert_eq!(seen.content_type.as_deref(), Some("image/png"));
    assert_eq!(seen.queries["upload"]["caption"], "harbour #dusk");
    assert_eq!(seen.queries["upload"]["username"], "luna");
    assert_eq!(seen.auth, vec![Some("Bearer tok-1".to_string())]);
}

#[tokio::test]
async fn test_plain_upload_falls_back_to_anonymous() {
    let (base, seen) = spawn_stub().await;
    let client = ApiClient::new(base, SessionContext::in_memory());

    client
        .upload_media(UploadRequest::new(vec![1u8, 2, 3], "", " "))
        .await
        .unwrap();

    let seen = seen.lock().unwrap();
    assert_eq!(seen.queries["upload"]["username"], "anonymous");
    assert_eq!(seen.upload_len, 3);
    assert!(seen.content_type.is_none());
}

#[tokio::test]
async fn test_comments_round_trip_through_endpoints() {
    let (base, seen) = spawn_stub().await;
    let client = ApiClient::new(base, signed_in_session());

    let comments = client.get_comments("a.jpg").await.unwrap();
    assert_eq!(comments.len(), 2);
    assert_eq!(comments[1].parent(), Some(&CommentId::Num(1)));
    assert_eq!(comments[0].posted_on().as_deref(), Some("2024-05-01"));

    client
        .add_comment("a.jpg", "nice", Some(CommentId::Text("c2".into())))
        .await
        .unwrap();

    let seen = seen.lock().unwrap();
    assert_eq!(seen.queries["comments"]["media_name"], "a.jpg");
    assert_eq!(
        seen.comment_body,
        Some(json!({"media_name": "a.jpg", "comment": "nice", "parent_id": "c2"}))
    );
}

#[tokio::test]
async fn test_ai_caption() {
    let (base, _) = spawn_stub().await;
    let client = ApiClient::new(base, signed_in_session());

    let caption = client.ai_caption("a.jpg").await.unwrap();
    assert_eq!(caption.caption.as_deref(), Some("A quiet harbour at dusk"));
}
