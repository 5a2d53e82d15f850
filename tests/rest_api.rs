mod common;

use axum::http::{Method, StatusCode};
use common::*;
use serde_json::{json, Value};

fn names(rows: &Value) -> Vec<&str> {
    rows.as_array()
        .expect("array")
        .iter()
        .map(|r| r["name"].as_str().expect("name"))
        .collect()
}

#[tokio::test]
async fn list_filters_and_sorts() {
    let app = app().await;
    let reply = call(&app, Method::GET, "/rest/users?age=25&sort_by=name&order=desc", None).await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(names(&reply.json()), vec!["Bob", "Alice"]);
}

#[tokio::test]
async fn list_paginates() {
    let app = app().await;
    let reply = call(&app, Method::GET, "/rest/users?sort_by=id&limit=1&offset=1", None).await;
    assert_eq!(names(&reply.json()), vec!["Bob"]);

    // Offset alone does nothing.
    let reply = call(&app, Method::GET, "/rest/users?offset=2", None).await;
    assert_eq!(reply.json().as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn hidden_columns_are_never_returned_or_queried() {
    let app = app().await;
    let reply = call(&app, Method::GET, "/rest/users/1", None).await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(
        reply.json(),
        json!({"id": 1, "email": ALICE, "name": "Alice", "age": 25})
    );

    for uri in ["/rest/users?password_hash=x", "/rest/users?sort_by=password_hash"] {
        let reply = call(&app, Method::GET, uri, None).await;
        assert_eq!(reply.status, StatusCode::BAD_REQUEST, "{uri}");
    }
}

#[tokio::test]
async fn crud_round_trip() {
    let app = app().await;

    let created = call(
        &app,
        Method::POST,
        "/rest/users",
        Some(r#"{"email":"dan@example.com","name":"Dan","age":30}"#),
    )
    .await;
    assert_eq!(created.status, StatusCode::CREATED);
    let row = created.json();
    assert_eq!(row["name"], "Dan");
    assert!(row.get("password_hash").is_none());
    let uri = format!("/rest/users/{}", row["id"]);

    let fetched = call(&app, Method::GET, &uri, None).await;
    assert_eq!(fetched.status, StatusCode::OK);
    assert_eq!(fetched.json(), row);

    let updated = call(&app, Method::PATCH, &uri, Some(r#"{"age":31}"#)).await;
    assert_eq!(updated.status, StatusCode::OK);
    assert_eq!(updated.json()["age"], 31);

    let deleted = call(&app, Method::DELETE, &uri, None).await;
    assert_eq!(deleted.status, StatusCode::OK);
    assert_eq!(deleted.json()["email"], "dan@example.com");

    let gone = call(&app, Method::GET, &uri, None).await;
    assert_eq!(gone.status, StatusCode::NOT_FOUND);
    assert_eq!(gone.json(), json!({"error": "Not found"}));
}

#[tokio::test]
async fn missing_rows_are_404_for_every_member_verb() {
    let app = app().await;
    for (method, body) in [
        (Method::GET, None),
        (Method::PATCH, Some(r#"{"age":1}"#)),
        (Method::DELETE, None),
    ] {
        let reply = call(&app, method.clone(), "/rest/users/999", body).await;
        assert_eq!(reply.status, StatusCode::NOT_FOUND, "{method}");
    }
}

#[tokio::test]
async fn empty_patch_is_rejected() {
    let app = app().await;
    for body in [Some("{}"), None] {
        let reply = call(&app, Method::PATCH, "/rest/users/1", body).await;
        assert_eq!(reply.status, StatusCode::BAD_REQUEST);
        assert_eq!(reply.json(), json!({"error": "No fields to update"}));
    }
}

#[tokio::test]
async fn unsupported_verbs_are_405() {
    let app = app().await;
    for (method, uri) in [
        (Method::PUT, "/rest/users"),
        (Method::PUT, "/rest/users/1"),
        (Method::POST, "/rest/users/1"),
        (Method::DELETE, "/rest/users"),
        (Method::PATCH, "/rest/users"),
    ] {
        let reply = call(&app, method.clone(), uri, Some(r#"{"a":1}"#)).await;
        assert_eq!(reply.status, StatusCode::METHOD_NOT_ALLOWED, "{method} {uri}");
        assert_eq!(reply.json(), json!({"error": "Method not allowed"}));
    }
}

#[tokio::test]
async fn bad_input_is_400() {
    let app = app().await;
    for uri in [
        "/rest/users?sort_by=name&order=sideways",
        "/rest/users?limit=-1",
        "/rest/users?limit=ten",
        "/rest/users?bad%20column=1",
        "/rest/users;drop",
    ] {
        let reply = call(&app, Method::GET, uri, None).await;
        assert_eq!(reply.status, StatusCode::BAD_REQUEST, "{uri}");
    }

    let reply = call(&app, Method::POST, "/rest/users", Some("{broken")).await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    let reply = call(&app, Method::POST, "/rest/users", Some("[1,2]")).await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn database_errors_are_500_with_the_engine_message() {
    let app = app().await;
    let reply = call(&app, Method::GET, "/rest/no_such_table", None).await;
    assert_eq!(reply.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(reply.json()["error"].as_str().unwrap().contains("no such table"));

    // Duplicate email violates the UNIQUE constraint.
    let body = json!({"email": ALICE, "name": "Again"}).to_string();
    let reply = call(&app, Method::POST, "/rest/users", Some(&body)).await;
    assert_eq!(reply.status, StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn injection_attempts_stay_values() {
    let app = app().await;
    let reply = call(&app, Method::GET, "/rest/users?name=x'%20OR%20'1'='1", None).await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.json(), json!([]));

    let reply = call(&app, Method::GET, "/rest/users", None).await;
    assert_eq!(reply.json().as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn table_allowlist_hides_other_tables() {
    let app = app_with(&[("REST_TABLES", "posts")]).await;
    let reply = call(&app, Method::GET, "/rest/users", None).await;
    assert_eq!(reply.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn oversized_bodies_are_413() {
    let app = app_with(&[("BODY_LIMIT_BYTES", "64")]).await;
    let body = json!({"name": "a".repeat(256)}).to_string();
    let reply = call(&app, Method::POST, "/rest/users", Some(&body)).await;
    assert_eq!(reply.status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(reply.json(), json!({"error": "Request body too large"}));
}

#[tokio::test]
async fn undecodable_path_segments_answer_in_json() {
    let app = app().await;
    let reply = call(&app, Method::GET, "/rest/users/%FF", None).await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert!(reply.json()["error"].is_string());
}
