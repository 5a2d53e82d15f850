#![allow(dead_code)]

use axum::{
    body::{to_bytes, Body, Bytes},
    http::{Method, Request, StatusCode},
    Router,
};
use serde_json::Value;
use std::collections::HashMap;
use tablerest::{
    app_router, connect, hash_password, AppState, BindValue, QueryBuf, Settings, SharedExecutor,
};
use tower::ServiceExt;

pub const SECRET: &str = "test-secret";
pub const PASSWORD: &str = "hunter2";
pub const ALICE: &str = "alice@example.com";

pub fn bearer() -> String {
    format!("Bearer {}", SECRET)
}

pub fn settings(extra: &[(&str, &str)]) -> Settings {
    let mut vars: HashMap<String, String> = HashMap::from([
        ("API_SECRET".to_string(), SECRET.to_string()),
        ("REST_HIDDEN_COLUMNS".to_string(), "password_hash".to_string()),
    ]);
    for (k, v) in extra {
        vars.insert(k.to_string(), v.to_string());
    }
    Settings::from_lookup(move |k| vars.get(k).cloned()).expect("test settings")
}

/// In-memory SQLite with a `users` table: Alice (25, real password hash),
/// Bob (25) and Carol (40).
pub async fn seeded_db(settings: &Settings) -> SharedExecutor {
    let db = connect(settings).await.expect("connect");
    db.execute(&QueryBuf::raw(
        "CREATE TABLE users (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            email TEXT NOT NULL UNIQUE,
            name TEXT,
            age INTEGER,
            password_hash TEXT
        )",
        vec![],
    ))
    .await
    .expect("create users");

    let hash = hash_password(PASSWORD).expect("hash");
    for (email, name, age, pw) in [
        (ALICE, "Alice", 25, hash.as_str()),
        ("bob@example.com", "Bob", 25, "not-a-hash"),
        ("carol@example.com", "Carol", 40, "not-a-hash"),
    ] {
        db.execute(&QueryBuf::raw(
            "INSERT INTO users (email, name, age, password_hash) VALUES (?, ?, ?, ?)",
            vec![
                BindValue::Text(email.into()),
                BindValue::Text(name.into()),
                BindValue::Int(age),
                BindValue::Text(pw.into()),
            ],
        ))
        .await
        .expect("seed user");
    }
    db
}

pub async fn app_with(extra: &[(&str, &str)]) -> Router {
    let settings = settings(extra);
    let db = seeded_db(&settings).await;
    app_router(AppState::new(db, &settings), &settings)
}

pub async fn app() -> Router {
    app_with(&[]).await
}

pub struct Reply {
    pub status: StatusCode,
    pub bytes: Bytes,
}

impl Reply {
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.bytes).expect("response body was not JSON")
    }
}

pub async fn send(app: &Router, method: Method, uri: &str, auth: Option<&str>, body: Option<&str>) -> Reply {
    let mut req = Request::builder().method(method).uri(uri);
    if let Some(auth) = auth {
        req = req.header("authorization", auth);
    }
    if body.is_some() {
        req = req.header("content-type", "application/json");
    }
    let req = req
        .body(body.map(|b| Body::from(b.to_string())).unwrap_or_else(Body::empty))
        .expect("failed to build request");
    let resp = app.clone().oneshot(req).await.expect("request failed");
    let status = resp.status();
    let bytes = to_bytes(resp.into_body(), usize::MAX)
        .await
        .expect("failed to read response body");
    Reply { status, bytes }
}

/// Authenticated request with the shared secret.
pub async fn call(app: &Router, method: Method, uri: &str, body: Option<&str>) -> Reply {
    send(app, method, uri, Some(&bearer()), body).await
}
