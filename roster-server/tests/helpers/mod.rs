//! Shared fixtures for roster-server integration tests

#![allow(dead_code)]

use axum::body::Body;
use axum::http::Request;
use http_body_util::BodyExt;
use roster_server::{build_router, AppState, DepartmentDirectory};
use serde_json::Value;
use sqlx::{Row, SqlitePool};

pub const BOUNDARY: &str = "roster-test-boundary";

/// In-memory store with CS=4, ECE=5 active and MECH=7 inactive
pub async fn setup_test_db() -> SqlitePool {
    let pool = roster_common::db::init_memory_database()
        .await
        .expect("Failed to create in-memory database");

    sqlx::query(
        r#"
        INSERT INTO m_departments (id, dept_short, dept_name, status) VALUES
            (4, 'CS', 'Computer Science', '1'),
            (5, 'ECE', 'Electronics', '1'),
            (7, 'MECH', 'Mechanical', '0')
        "#,
    )
    .execute(&pool)
    .await
    .expect("Failed to seed departments");

    pool
}

pub async fn load_directory(pool: &SqlitePool) -> DepartmentDirectory {
    DepartmentDirectory::load(pool)
        .await
        .expect("Failed to load directory")
}

pub async fn setup_app() -> (axum::Router, SqlitePool) {
    let pool = setup_test_db().await;
    let directory = load_directory(&pool).await;
    let app = build_router(AppState::new(pool.clone(), directory));
    (app, pool)
}

pub async fn insert_user(pool: &SqlitePool, id: &str, email: &str, dept: i64) {
    sqlx::query(
        "INSERT INTO m_users (id, name, email, dept, year, degree) VALUES (?, ?, ?, ?, '1', 'UG')",
    )
    .bind(id)
    .bind(format!("User {}", id))
    .bind(email)
    .bind(dept)
    .execute(pool)
    .await
    .expect("Failed to insert user");
}

pub async fn count_users(pool: &SqlitePool) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM m_users")
        .fetch_one(pool)
        .await
        .expect("Failed to count users")
}

pub async fn user_status(pool: &SqlitePool, id: &str) -> String {
    sqlx::query("SELECT status FROM m_users WHERE id = ?")
        .bind(id)
        .fetch_one(pool)
        .await
        .expect("User missing")
        .get("status")
}

/// multipart/form-data request with a single file field
pub fn multipart_request(field: &str, filename: &str, contents: &str) -> Request<Body> {
    multipart_request_bytes(field, filename, contents.as_bytes())
}

/// Same as [`multipart_request`] for file contents that are not UTF-8
pub fn multipart_request_bytes(field: &str, filename: &str, contents: &[u8]) -> Request<Body> {
    let mut body = format!(
        "--{b}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"{filename}\"\r\nContent-Type: text/csv\r\n\r\n",
        b = BOUNDARY,
        field = field,
        filename = filename,
    )
    .into_bytes();
    body.extend_from_slice(contents);
    body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());

    Request::builder()
        .method("POST")
        .uri("/api/upload-users")
        .header(
            "content-type",
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(body))
        .unwrap()
}

pub fn json_request(method: &str, uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn empty_request(method: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

pub async fn extract_json(body: Body) -> Value {
    let bytes = body.collect().await.expect("Should read body").to_bytes();
    serde_json::from_slice(&bytes).expect("Should parse JSON")
}
