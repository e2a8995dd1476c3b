use axum::http::StatusCode;
use axum_test::TestServer;
use serde_json::{Value, json};

use bazaar_customers::router::build_router;
use bazaar_customers::state::AppState;
use bazaar_testing::db::outbox_rows;

use crate::helpers::customers_db;

async fn server() -> (TestServer, sea_orm::DatabaseConnection) {
    let db = customers_db().await;
    let server = TestServer::new(build_router(AppState { db: db.clone() })).unwrap();
    (server, db)
}

#[tokio::test]
async fn should_report_healthy() {
    let (server, _db) = server().await;

    server.get("/healthz").await.assert_status_ok();
}

#[tokio::test]
async fn should_create_and_fetch_customer() {
    let (server, db) = server().await;

    let created = server
        .post("/customers")
        .json(&json!({ "name": "Ada Lovelace", "email": "ADA@example.com" }))
        .await;
    created.assert_status(StatusCode::CREATED);
    let body: Value = created.json();
    assert_eq!(body["email"], "ada@example.com");
    let id = body["id"].as_str().unwrap().to_owned();

    let fetched = server.get(&format!("/customers/{id}")).await;
    fetched.assert_status_ok();
    assert_eq!(fetched.json::<Value>()["name"], "Ada Lovelace");

    let rows = outbox_rows(&db).await;
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].event_type, "customer.created");
}

#[tokio::test]
async fn should_assign_request_id() {
    let (server, _db) = server().await;

    let response = server.get("/healthz").await;

    assert!(response.headers().contains_key("x-request-id"));
}

#[tokio::test]
async fn should_map_domain_errors_to_status_codes() {
    let (server, db) = server().await;
    server
        .post("/customers")
        .json(&json!({ "name": "Ada", "email": "ada@example.com" }))
        .await
        .assert_status(StatusCode::CREATED);

    let taken = server
        .post("/customers")
        .json(&json!({ "name": "Ada Again", "email": "ada@example.com" }))
        .await;
    taken.assert_status(StatusCode::CONFLICT);
    assert_eq!(taken.json::<Value>()["kind"], "EMAIL_TAKEN");

    let invalid = server
        .post("/customers")
        .json(&json!({ "name": "Bob", "email": "bob" }))
        .await;
    invalid.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(invalid.json::<Value>()["kind"], "INVALID_EMAIL");

    let missing = server
        .get("/customers/0195a3c4-0000-7000-8000-000000000000")
        .await;
    missing.assert_status(StatusCode::NOT_FOUND);

    assert_eq!(outbox_rows(&db).await.len(), 1);
}

#[tokio::test]
async fn should_update_and_delete_customer() {
    let (server, db) = server().await;
    let body: Value = server
        .post("/customers")
        .json(&json!({ "name": "Ada", "email": "ada@example.com" }))
        .await
        .json();
    let path = format!("/customers/{}", body["id"].as_str().unwrap());

    let updated = server
        .patch(&path)
        .json(&json!({ "name": "Ada King" }))
        .await;
    updated.assert_status_ok();
    assert_eq!(updated.json::<Value>()["name"], "Ada King");

    server
        .delete(&path)
        .await
        .assert_status(StatusCode::NO_CONTENT);
    server
        .delete(&path)
        .await
        .assert_status(StatusCode::NOT_FOUND);

    let types: Vec<String> = outbox_rows(&db)
        .await
        .into_iter()
        .map(|r| r.event_type)
        .collect();
    assert_eq!(
        types,
        ["customer.created", "customer.updated", "customer.deleted"]
    );
}
