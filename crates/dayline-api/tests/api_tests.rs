//! End-to-end tests driving the router in memory

use std::sync::Arc;

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use chrono::{NaiveDate, NaiveTime};
use serde_json::{Value, json};
use tower::ServiceExt;

use dayline_api::{AppState, app};
use dayline_core::{AuthService, Config, FixedClock, TaskStore};

fn today() -> NaiveDate {
    // A Wednesday
    NaiveDate::from_ymd_opt(2025, 9, 17).unwrap()
}

fn test_app() -> Router {
    let mut config = Config::default();
    config.auth.login_attempts = 3;

    let auth = AuthService::in_memory("test-secret").unwrap().with_rounds(10);
    let tasks = TaskStore::in_memory().unwrap();
    let clock = Arc::new(FixedClock::at(today(), NaiveTime::from_hms_opt(9, 30, 0).unwrap()));

    app(AppState::new(config, auth, tasks, clock))
}

async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).to_string()))
    };
    (status, value)
}

async fn register(app: &Router, login: &str) -> String {
    let (status, body) = send(
        app,
        "POST",
        "/api/auth/register",
        None,
        Some(json!({"login": login, "password": "pw", "name": "Tester"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    body["token"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_health() {
    let app = test_app();
    let (status, body) = send(&app, "GET", "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, Value::String("OK".to_string()));
}

#[tokio::test]
async fn test_register_login_me() {
    let app = test_app();
    register(&app, "alice").await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/auth/login",
        None,
        Some(json!({"login": "alice", "password": "pw"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["login"], "alice");
    assert!(body["user"].get("passwordHash").is_none());
    let token = body["token"].as_str().unwrap().to_string();

    let (status, body) = send(&app, "GET", "/api/auth/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["name"], "Tester");
    assert!(body["user"]["createdAt"].is_string());
}

#[tokio::test]
async fn test_auth_failures() {
    let app = test_app();
    register(&app, "alice").await;

    let (status, body) = send(&app, "POST", "/api/auth/register", None, Some(json!({"login": "alice", "password": "x"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    let (status, _) = send(&app, "POST", "/api/auth/register", None, Some(json!({"login": "bob"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app, "POST", "/api/auth/login", None, Some(json!({"login": "alice"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app, "POST", "/api/auth/login", None, Some(json!({"login": "alice", "password": "nope"}))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(&app, "GET", "/api/auth/me", Some("garbage"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_login_is_throttled() {
    let app = test_app();
    register(&app, "alice").await;

    let attempt = json!({"login": "alice", "password": "wrong"});
    for _ in 0..3 {
        let (status, _) = send(&app, "POST", "/api/auth/login", None, Some(attempt.clone())).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    let (status, body) = send(&app, "POST", "/api/auth/login", None, Some(attempt)).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_tasks_require_token() {
    let app = test_app();
    for (method, uri) in [
        ("GET", "/api/tasks"),
        ("POST", "/api/tasks"),
        ("PATCH", "/api/tasks/some-id"),
        ("DELETE", "/api/tasks/some-id"),
        ("GET", "/api/agenda"),
        ("GET", "/api/days/2025-09-17"),
        ("GET", "/api/auth/me"),
    ] {
        let (status, _) = send(&app, method, uri, None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{method} {uri}");
    }
}

#[tokio::test]
async fn test_task_crud() {
    let app = test_app();
    let token = register(&app, "alice").await;

    let (status, created) = send(
        &app,
        "POST",
        "/api/tasks",
        Some(&token),
        Some(json!({"title": "Dentist", "start": "14:00", "end": "15:00", "date": "2025-09-18", "emoji": "🍎"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(created["date"], "2025-09-18");
    assert_eq!(created["done"], false);
    assert_eq!(created["color"], "#FECACA");
    let id = created["id"].as_str().unwrap().to_string();

    let (status, updated) = send(
        &app,
        "PATCH",
        &format!("/api/tasks/{id}"),
        Some(&token),
        Some(json!({"done": true, "emoji": null})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["done"], true);
    assert_eq!(updated["emoji"], Value::Null);
    assert_eq!(updated["title"], "Dentist");

    let (status, list) = send(&app, "GET", "/api/tasks", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list.as_array().unwrap().len(), 1);

    let (status, body) = send(&app, "DELETE", &format!("/api/tasks/{id}"), Some(&token), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(body, Value::Null);

    let (status, _) = send(&app, "DELETE", &format!("/api/tasks/{id}"), Some(&token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_task_validation() {
    let app = test_app();
    let token = register(&app, "alice").await;

    for bad in [
        json!({"title": "x", "start": "10:00", "end": "09:00", "date": "2025-09-18"}),
        json!({"title": "x", "start": "9", "end": "10:00", "date": "2025-09-18"}),
        json!({"title": "", "start": "09:00", "end": "10:00", "date": "2025-09-18"}),
        json!({"title": "x", "start": "09:00", "end": "10:00", "date": "18.09.2025"}),
        json!({"title": "x", "start": "09:00", "end": "10:00", "weekly": true, "weeklyDay": "someday"}),
    ] {
        let (status, body) = send(&app, "POST", "/api/tasks", Some(&token), Some(bad.clone())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{bad}");
        assert!(body["error"].is_string());
    }

    let (_, list) = send(&app, "GET", "/api/tasks", Some(&token), None).await;
    assert!(list.as_array().unwrap().is_empty());

    let (status, _) = send(&app, "POST", "/api/tasks", Some(&token), Some(Value::String("nope".into()))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_patch_to_weekly_clears_date() {
    let app = test_app();
    let token = register(&app, "alice").await;

    let (_, created) = send(
        &app,
        "POST",
        "/api/tasks",
        Some(&token),
        Some(json!({"title": "Swim", "start": "07:00", "end": "08:00", "date": "2025-09-18"})),
    )
    .await;
    let id = created["id"].as_str().unwrap();

    let (status, updated) = send(
        &app,
        "PATCH",
        &format!("/api/tasks/{id}"),
        Some(&token),
        Some(json!({"weekly": true, "weeklyDay": "Fri", "date": "2025-09-20"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["weekly"], true);
    assert_eq!(updated["weeklyDay"], "fri");
    assert_eq!(updated["date"], Value::Null);

    let (status, _) = send(
        &app,
        "PATCH",
        &format!("/api/tasks/{id}"),
        Some(&token),
        Some(json!({"end": "06:00"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_patch_date_on_weekly_task() {
    let app = test_app();
    let token = register(&app, "alice").await;

    let (_, created) = send(
        &app,
        "POST",
        "/api/tasks",
        Some(&token),
        Some(json!({"title": "Gym", "start": "09:00", "end": "10:00", "weekly": true, "weeklyDay": "mon"})),
    )
    .await;
    let id = created["id"].as_str().unwrap();

    let (status, updated) = send(
        &app,
        "PATCH",
        &format!("/api/tasks/{id}"),
        Some(&token),
        Some(json!({"date": "2025-09-24"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["weekly"], false);
    assert_eq!(updated["weeklyDay"], Value::Null);
    assert_eq!(updated["date"], "2025-09-24");

    // The Monday recurrence is gone, the task sits on its date only
    let (_, page) = send(&app, "GET", "/api/agenda?count=14", Some(&token), None).await;
    let busy: Vec<&str> = page["days"]
        .as_array()
        .unwrap()
        .iter()
        .filter(|d| !d["timeline"]["items"].as_array().unwrap().is_empty())
        .map(|d| d["date"].as_str().unwrap())
        .collect();
    assert_eq!(busy, vec!["2025-09-24"]);
}

#[tokio::test]
async fn test_tasks_are_private() {
    let app = test_app();
    let alice = register(&app, "alice").await;
    let bob = register(&app, "bob").await;

    let (_, created) = send(
        &app,
        "POST",
        "/api/tasks",
        Some(&alice),
        Some(json!({"title": "Secret", "date": "2025-09-18"})),
    )
    .await;
    let id = created["id"].as_str().unwrap();

    let (_, list) = send(&app, "GET", "/api/tasks", Some(&bob), None).await;
    assert!(list.as_array().unwrap().is_empty());

    let (status, _) = send(&app, "PATCH", &format!("/api/tasks/{id}"), Some(&bob), Some(json!({"done": true}))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, "DELETE", &format!("/api/tasks/{id}"), Some(&bob), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_agenda_expands_weekly_tasks() {
    let app = test_app();
    let token = register(&app, "alice").await;

    send(
        &app,
        "POST",
        "/api/tasks",
        Some(&token),
        Some(json!({"title": "Gym", "start": "09:00", "end": "10:00", "weekly": true, "weeklyDay": "mon"})),
    )
    .await;
    send(
        &app,
        "POST",
        "/api/tasks",
        Some(&token),
        Some(json!({"title": "Standup", "start": "09:00", "end": "09:15", "date": "2025-09-17"})),
    )
    .await;

    let (status, page) = send(&app, "GET", "/api/agenda", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["hasMore"], true);
    let days = page["days"].as_array().unwrap();
    assert_eq!(days.len(), 30);

    let first = &days[0];
    assert_eq!(first["date"], "2025-09-17");
    assert_eq!(first["isToday"], true);
    assert_eq!(first["timeline"]["items"][0]["task"]["title"], "Standup");
    assert_eq!(first["timeline"]["startHour"], 8);
    // 09:30 on an 08:00 start
    assert_eq!(first["timeline"]["nowOffset"], 90.0);

    let monday = &days[5];
    assert_eq!(monday["weekday"], "mon");
    assert_eq!(monday["timeline"]["items"][0]["task"]["title"], "Gym");
    assert_eq!(monday["timeline"]["items"][0]["top"], 60.0);
    assert_eq!(monday["timeline"]["items"][0]["height"], 60.0);
    assert_eq!(monday["timeline"]["nowOffset"], Value::Null);

    let (_, last) = send(&app, "GET", "/api/agenda?offset=360&count=30", Some(&token), None).await;
    assert_eq!(last["days"].as_array().unwrap().len(), 5);
    assert_eq!(last["hasMore"], false);
}

#[tokio::test]
async fn test_day_endpoint() {
    let app = test_app();
    let token = register(&app, "alice").await;

    let (status, day) = send(&app, "GET", "/api/days/2025-09-20", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(day["weekday"], "sat");
    assert_eq!(day["timeline"]["startHour"], 6);
    assert_eq!(day["timeline"]["endHour"], 22);
    assert!(day["timeline"]["items"].as_array().unwrap().is_empty());

    let (status, _) = send(&app, "GET", "/api/days/2025-9-20", Some(&token), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
