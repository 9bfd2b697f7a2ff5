use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use base64::Engine;
use base64::engine::general_purpose::STANDARD as B64;
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;
use uuid::Uuid;

use ember_db::Database;
use ember_gateway::Dispatcher;
use ember_rooms::Rooms;
use ember_types::events::RoomEvent;

use crate::state::{AppState, AppStateInner};

struct TestApp {
    router: Router,
    state: AppState,
    db: Arc<Database>,
}

fn test_app() -> TestApp {
    let db = Arc::new(Database::open_in_memory().unwrap());
    let state: AppState = Arc::new(AppStateInner {
        rooms: Rooms::new(db.clone()),
        dispatcher: Dispatcher::new(),
    });
    TestApp {
        router: crate::router(state.clone()),
        state,
        db,
    }
}

async fn call(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

fn post_json(uri: &str, token: Option<&str>, body: &Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn get_with_token(uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap()
}

/// POST /rooms and unpack the ticket pieces used by most tests.
async fn create_room(app: &TestApp, minutes: u32) -> (Uuid, String, String) {
    let (status, body) = call(
        &app.router,
        post_json("/rooms", None, &json!({"duration_minutes": minutes})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let id: Uuid = body["room"]["id"].as_str().unwrap().parse().unwrap();
    let code = body["room"]["code"].as_str().unwrap().to_string();
    let token = body["session_token"].as_str().unwrap().to_string();
    (id, code, token)
}

async fn join_room(app: &TestApp, code: &str) -> (StatusCode, Value) {
    call(&app.router, post_json("/rooms/join", None, &json!({"code": code}))).await
}

fn send_body(kind: &str, plaintext: &[u8]) -> Value {
    json!({"kind": kind, "ciphertext": B64.encode(plaintext)})
}

#[tokio::test]
async fn create_room_issues_a_ticket() {
    let app = test_app();
    let (status, body) = call(
        &app.router,
        post_json("/rooms", None, &json!({"duration_minutes": 30})),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["slot"], 1);
    assert_eq!(body["room"]["status"], "waiting");
    assert_eq!(body["room"]["participant_count"], 1);
    assert_eq!(body["room"]["code"].as_str().unwrap().len(), 6);
    assert_eq!(body["session_token"].as_str().unwrap().len(), 64);
}

#[tokio::test]
async fn create_room_rejects_out_of_range_durations() {
    let app = test_app();
    for minutes in [0, 121] {
        let (status, body) = call(
            &app.router,
            post_json("/rooms", None, &json!({"duration_minutes": minutes})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "invalid_duration");
    }
}

#[tokio::test]
async fn join_activates_the_room_and_notifies_the_creator() {
    let app = test_app();
    let (room_id, code, _) = create_room(&app, 30).await;
    let mut rx = app.state.dispatcher.subscribe(room_id).await;

    let (status, body) = join_room(&app, &code).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["slot"], 2);
    assert_eq!(body["room"]["status"], "active");

    match rx.try_recv().unwrap() {
        RoomEvent::PeerJoined { room } => assert_eq!(room.id, room_id),
        other => panic!("unexpected event: {other:?}"),
    }
}

#[tokio::test]
async fn join_unknown_code_is_not_found() {
    let app = test_app();
    let (status, body) = join_room(&app, "ZZZZZ2").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "room_not_found");
}

#[tokio::test]
async fn join_full_room_reports_room_full() {
    let app = test_app();
    let (_, code, _) = create_room(&app, 30).await;
    join_room(&app, &code).await;

    let (status, body) = join_room(&app, &code).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "room_full");
}

#[tokio::test]
async fn get_room_checks_the_token() {
    let app = test_app();
    let (_, code, token) = create_room(&app, 30).await;

    let (status, body) = call(&app.router, get_with_token(&format!("/rooms/{code}"), &token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["code"], code.as_str());

    let (status, body) = call(
        &app.router,
        get_with_token(&format!("/rooms/{code}"), "wrong-token"),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "unauthorized");

    // No Authorization header at all
    let bare = Request::builder()
        .method("GET")
        .uri(format!("/rooms/{code}"))
        .body(Body::empty())
        .unwrap();
    let (status, _) = call(&app.router, bare).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = call(&app.router, get_with_token("/rooms/ZZZZZ2", &token)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn send_message_persists_and_broadcasts() {
    let app = test_app();
    let (room_id, code, creator) = create_room(&app, 30).await;
    let (_, joined) = join_room(&app, &code).await;
    let peer = joined["session_token"].as_str().unwrap().to_string();

    let mut rx = app.state.dispatcher.subscribe(room_id).await;

    let (status, body) = call(
        &app.router,
        post_json(
            &format!("/rooms/{room_id}/messages"),
            Some(&creator),
            &send_body("text", b"opaque bytes"),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["sender_slot"], 1);
    assert_eq!(body["kind"], "text");
    let message_id = body["id"].as_str().unwrap().to_string();

    match rx.try_recv().unwrap() {
        RoomEvent::MessageCreated { message } => {
            assert_eq!(message.id.to_string(), message_id);
        }
        other => panic!("unexpected event: {other:?}"),
    }

    // The peer fetches the same ciphertext back
    let (status, history) = call(
        &app.router,
        get_with_token(&format!("/rooms/{room_id}/messages"), &peer),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(history.as_array().unwrap().len(), 1);
    assert_eq!(history[0]["ciphertext"], B64.encode(b"opaque bytes"));
}

#[tokio::test]
async fn send_message_validates_kind_and_encoding() {
    let app = test_app();
    let (room_id, _, token) = create_room(&app, 30).await;
    let uri = format!("/rooms/{room_id}/messages");

    let (status, body) = call(
        &app.router,
        post_json(&uri, Some(&token), &send_body("video", b"x")),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_kind");

    let (status, body) = call(
        &app.router,
        post_json(&uri, Some(&token), &json!({"kind": "text", "ciphertext": "!!!not-base64!!!"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_ciphertext");
}

#[tokio::test]
async fn cross_room_token_is_forbidden() {
    let app = test_app();
    let (room_a, _, _) = create_room(&app, 30).await;
    let (_, _, token_b) = create_room(&app, 30).await;

    let (status, body) = call(
        &app.router,
        post_json(
            &format!("/rooms/{room_a}/messages"),
            Some(&token_b),
            &send_body("text", b"x"),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "unauthorized");
}

#[tokio::test]
async fn malformed_room_id_reads_as_not_found() {
    let app = test_app();
    let (_, _, token) = create_room(&app, 30).await;

    let (status, body) = call(
        &app.router,
        post_json("/rooms/not-a-uuid/messages", Some(&token), &send_body("text", b"x")),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "room_not_found");
}

#[tokio::test]
async fn expired_room_refuses_sends_but_serves_history() {
    let app = test_app();
    let room_id = Uuid::new_v4();
    let token = "ab".repeat(32);
    let now = chrono::Utc::now().timestamp_millis();

    // Back-dated room whose deadline already passed
    app.db
        .insert_room(&room_id.to_string(), "AB2CD3", 30, now - 3_600_000, now - 1_000)
        .unwrap();
    app.db
        .insert_participant(&room_id.to_string(), &token, 1, now - 3_600_000)
        .unwrap();
    app.db
        .insert_message(
            &Uuid::new_v4().to_string(),
            &room_id.to_string(),
            &token,
            "text",
            b"old",
            now - 2_000,
        )
        .unwrap();

    let (status, body) = call(
        &app.router,
        post_json(
            &format!("/rooms/{room_id}/messages"),
            Some(&token),
            &send_body("text", b"late"),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "room_closed");

    let (status, history) = call(
        &app.router,
        get_with_token(&format!("/rooms/{room_id}/messages"), &token),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(history.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn history_supports_cursor_and_limit() {
    let app = test_app();
    let (room_id, _, token) = create_room(&app, 30).await;
    let uri = format!("/rooms/{room_id}/messages");

    for byte in 0..3u8 {
        let (status, _) = call(
            &app.router,
            post_json(&uri, Some(&token), &send_body("text", &[byte])),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (_, all) = call(&app.router, get_with_token(&uri, &token)).await;
    let first_seq = all[0]["seq"].as_i64().unwrap();

    let (_, rest) = call(
        &app.router,
        get_with_token(&format!("{uri}?after={first_seq}"), &token),
    )
    .await;
    assert_eq!(rest.as_array().unwrap().len(), 2);

    let (_, page) = call(
        &app.router,
        get_with_token(&format!("{uri}?limit=1"), &token),
    )
    .await;
    assert_eq!(page.as_array().unwrap().len(), 1);
}
