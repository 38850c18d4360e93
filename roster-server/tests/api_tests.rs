//! HTTP-level tests for roster-server routes

mod helpers;

use axum::http::StatusCode;
use helpers::{
    count_users, empty_request, extract_json, insert_user, json_request, load_directory,
    multipart_request, multipart_request_bytes, setup_app, setup_test_db,
};
use roster_server::db::get_user;
use roster_server::{build_router, AppState};
use tower::util::ServiceExt; // for `oneshot`

const HEADER: &str = "id,name,email,dept,year,degree\n";

// =============================================================================
// Health
// =============================================================================

#[tokio::test]
async fn test_health_endpoint() {
    let (app, _pool) = setup_app().await;

    let response = app.oneshot(empty_request("GET", "/health")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["module"], "roster-server");
    assert!(body["version"].is_string());
    assert_eq!(body["database"], "connected");
    assert_eq!(body["departments"], 2);
}

#[tokio::test]
async fn test_health_reports_unreachable_database() {
    let (app, pool) = setup_app().await;
    pool.close().await;

    let response = app.oneshot(empty_request("GET", "/health")).await.unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["status"], "degraded");
    assert_eq!(body["database"], "unavailable");
}

// =============================================================================
// Upload
// =============================================================================

#[tokio::test]
async fn test_upload_full_success_returns_200() {
    let (app, pool) = setup_app().await;
    let csv = format!("{}S1,Alice,a@x.com,CS,2,BTECH\nS2,Bob,b@x.com,ECE,3,MBA\n", HEADER);

    let response = app
        .oneshot(multipart_request("file", "users.csv", &csv))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["message"], "Users uploaded successfully.");
    assert_eq!(body["imported"], 2);
    assert!(body.get("errors").is_none());

    let user = get_user(&pool, "S1").await.unwrap().unwrap();
    assert_eq!(user.dept, 4);
    assert_eq!(user.degree.as_str(), "UG");
}

#[tokio::test]
async fn test_upload_partial_success_returns_202_with_errors() {
    let (app, pool) = setup_app().await;
    let csv = format!(
        "{}S1,Alice,a@x.com,CS,2,BTECH\nS2,Bob,b@x.com,NOPE,3,MBA\nS3,Carol\n",
        HEADER
    );

    let response = app
        .oneshot(multipart_request("file", "USERS.CSV", &csv))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::ACCEPTED);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["message"], "Users uploaded with some errors.");
    assert_eq!(body["imported"], 1);
    let errors = body["errors"].as_array().unwrap();
    assert_eq!(errors.len(), 2);
    assert_eq!(errors[0], "Row 3 (ID: S2): Department 'NOPE' not found. Skipping.");
    assert_eq!(errors[1], "Row 4: Insufficient columns. Expected 6, got 2. Skipping.");
    assert_eq!(count_users(&pool).await, 1);
}

#[tokio::test]
async fn test_upload_crlf_file_reports_record_numbers() {
    let (app, pool) = setup_app().await;
    let csv = "id,name,email,dept,year,degree\r\nS1,Alice,a@x.com,CS,2,BTECH\r\nS2,Bob,b@x.com,NOPE,3,MBA\r\nS3,Carol\r\n";

    let response = app
        .oneshot(multipart_request("file", "users.csv", csv))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::ACCEPTED);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["imported"], 1);
    assert_eq!(
        body["errors"],
        serde_json::json!([
            "Row 3 (ID: S2): Department 'NOPE' not found. Skipping.",
            "Row 4: Insufficient columns. Expected 6, got 2. Skipping."
        ])
    );
    assert_eq!(count_users(&pool).await, 1);
}

#[tokio::test]
async fn test_upload_latin1_name_keeps_every_row() {
    let (app, pool) = setup_app().await;
    let csv = b"id,name,email,dept,year,degree\nS1,Alice,a@x.com,CS,2,UG\nS2,Jos\xe9,j@x.com,CS,2,UG\nS3,Carol,c@x.com,ECE,1,PG\n";

    let response = app
        .oneshot(multipart_request_bytes("file", "users.csv", csv))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["imported"], 3);
    assert_eq!(count_users(&pool).await, 3);
    let jose = get_user(&pool, "S2").await.unwrap().unwrap();
    assert_eq!(jose.name, "Jos\u{FFFD}");
}

#[tokio::test]
async fn test_upload_unterminated_quote_is_rejected() {
    let (app, pool) = setup_app().await;
    let csv = format!(
        "{}S1,\"Alice,a@x.com,CS,2,UG\nS2,Bob,b@x.com,CS,2,UG\n",
        HEADER
    );

    let response = app
        .oneshot(multipart_request("file", "users.csv", &csv))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["error"]["code"], "BAD_REQUEST");
    assert_eq!(count_users(&pool).await, 0);
}

#[tokio::test]
async fn test_upload_over_body_limit_returns_413() {
    let pool = setup_test_db().await;
    let directory = load_directory(&pool).await;
    let app = build_router(AppState::new(pool.clone(), directory).with_max_upload_bytes(64));
    let mut csv = HEADER.to_string();
    for i in 0..20 {
        csv.push_str(&format!("S{i},Student {i},s{i}@x.com,CS,2,UG\n"));
    }

    let response = app
        .oneshot(multipart_request("file", "users.csv", &csv))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["error"]["code"], "PAYLOAD_TOO_LARGE");
    assert_eq!(count_users(&pool).await, 0);
}

#[tokio::test]
async fn test_upload_rejects_non_csv_filename() {
    let (app, pool) = setup_app().await;
    let csv = format!("{}S1,Alice,a@x.com,CS,2,BTECH\n", HEADER);

    let response = app
        .oneshot(multipart_request("file", "users.xlsx", &csv))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["error"]["code"], "BAD_REQUEST");
    assert_eq!(count_users(&pool).await, 0);
}

#[tokio::test]
async fn test_upload_without_file_field_is_bad_request() {
    let (app, _pool) = setup_app().await;

    let response = app
        .oneshot(multipart_request("attachment", "users.csv", HEADER))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["error"]["message"], "No file uploaded");
}

#[tokio::test]
async fn test_upload_header_only_is_bad_request() {
    let (app, _pool) = setup_app().await;

    let response = app
        .oneshot(multipart_request("file", "users.csv", HEADER))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = extract_json(response.into_body()).await;
    assert_eq!(
        body["error"]["message"],
        "CSV file is empty or has only a header row."
    );
}

// =============================================================================
// Users
// =============================================================================

#[tokio::test]
async fn test_list_users_returns_ordered_array() {
    let (app, pool) = setup_app().await;
    insert_user(&pool, "S2", "b@x.com", 5).await;
    insert_user(&pool, "S1", "a@x.com", 4).await;

    let response = app.oneshot(empty_request("GET", "/api/users")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response.into_body()).await;
    let users = body.as_array().unwrap();
    assert_eq!(users.len(), 2);
    assert_eq!(users[0]["id"], "S1");
    assert_eq!(users[0]["deptName"], "CS");
    assert_eq!(users[1]["id"], "S2");
    assert_eq!(users[1]["deptName"], "ECE");
}

#[tokio::test]
async fn test_update_user_success() {
    let (app, pool) = setup_app().await;
    insert_user(&pool, "S1", "a@x.com", 4).await;

    let response = app
        .oneshot(json_request(
            "PUT",
            "/api/users/S1",
            r#"{"name":"Alice","email":"alice@x.com","dept":5,"year":"3","degree":"m.tech"}"#,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["message"], "User updated successfully");
    assert_eq!(body["user"]["email"], "alice@x.com");
    assert_eq!(body["user"]["degree"], "PG");
    assert_eq!(body["user"]["deptName"], "ECE");
}

#[tokio::test]
async fn test_update_user_email_conflict_returns_409() {
    let (app, pool) = setup_app().await;
    insert_user(&pool, "S1", "a@x.com", 4).await;
    insert_user(&pool, "S2", "b@x.com", 4).await;

    let response = app
        .oneshot(json_request(
            "PUT",
            "/api/users/S1",
            r#"{"name":"Alice","email":"b@x.com","dept":4,"year":"2","degree":"UG"}"#,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["error"]["message"], "Email already exists for another user.");
    assert_eq!(get_user(&pool, "S1").await.unwrap().unwrap().email, "a@x.com");
}

#[tokio::test]
async fn test_update_user_bad_payload_returns_400() {
    let (app, pool) = setup_app().await;
    insert_user(&pool, "S1", "a@x.com", 4).await;

    let response = app
        .oneshot(json_request(
            "PUT",
            "/api/users/S1",
            r#"{"name":"Alice","email":"a@x.com","dept":"four"}"#,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(get_user(&pool, "S1").await.unwrap().unwrap().name, "User S1");
}

#[tokio::test]
async fn test_update_unknown_user_returns_404() {
    let (app, _pool) = setup_app().await;

    let response = app
        .oneshot(json_request(
            "PUT",
            "/api/users/S9",
            r#"{"name":"Ghost","email":"g@x.com","dept":4,"year":"1","degree":"UG"}"#,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_user_success_and_not_found() {
    let (app, pool) = setup_app().await;
    insert_user(&pool, "S1", "a@x.com", 4).await;

    let response = app
        .clone()
        .oneshot(empty_request("DELETE", "/api/users/S1"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["message"], "User deleted successfully");

    let response = app
        .oneshot(empty_request("DELETE", "/api/users/S1"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(count_users(&pool).await, 0);
}

// =============================================================================
// Departments
// =============================================================================

#[tokio::test]
async fn test_list_departments_active_only() {
    let (app, _pool) = setup_app().await;

    let response = app
        .oneshot(empty_request("GET", "/api/departments"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response.into_body()).await;
    let departments = body.as_array().unwrap();
    assert_eq!(departments.len(), 2);
    assert_eq!(departments[0]["dept_short"], "CS");
    assert_eq!(departments[0]["dept_name"], "Computer Science");
    assert_eq!(departments[1]["dept_short"], "ECE");
}
