mod common;

use axum::http::StatusCode;
use rust_decimal_macros::dec;

use common::{read_json, TestApp};

#[tokio::test]
async fn anonymous_caller_gets_unauthenticated_reason_not_401() {
    let app = TestApp::spawn().await;
    let course = app.seed_course(dec!(500.00)).await;

    let response = app.get(&format!("/access?course_id={}", course.id)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert_eq!(body["hasAccess"], false);
    assert_eq!(body["reason"], "unauthenticated");
}

#[tokio::test]
async fn paid_purchase_grants_access() {
    let app = TestApp::spawn().await;
    let course = app.seed_course(dec!(500.00)).await;
    let token = app.register_user("alice", "alice@example.com").await;
    app.seed_paid_purchase(course.id, "alice@example.com", "cs_1")
        .await;

    let response = app
        .get_authed(&format!("/access?course_id={}", course.id), &token)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert_eq!(body["hasAccess"], true);
    assert!(body.get("reason").is_none());
}

#[tokio::test]
async fn access_is_scoped_to_the_exact_course() {
    let app = TestApp::spawn().await;
    let purchased = app.seed_course(dec!(500.00)).await;
    let other = app.seed_course(dec!(300.00)).await;
    let token = app.register_user("alice", "alice@example.com").await;
    app.seed_paid_purchase(purchased.id, "alice@example.com", "cs_1")
        .await;

    let body = read_json(
        app.get_authed(&format!("/access?course_id={}", other.id), &token)
            .await,
    )
    .await;
    assert_eq!(body["hasAccess"], false);
}

#[tokio::test]
async fn access_is_scoped_to_the_exact_buyer() {
    let app = TestApp::spawn().await;
    let course = app.seed_course(dec!(500.00)).await;
    app.seed_paid_purchase(course.id, "alice@example.com", "cs_1")
        .await;
    let bob_token = app.register_user("bob", "bob@example.com").await;

    let body = read_json(
        app.get_authed(&format!("/access?course_id={}", course.id), &bob_token)
            .await,
    )
    .await;
    assert_eq!(body["hasAccess"], false);
}

#[tokio::test]
async fn garbage_token_reads_as_anonymous() {
    let app = TestApp::spawn().await;
    let course = app.seed_course(dec!(500.00)).await;

    let response = app
        .get_authed(&format!("/access?course_id={}", course.id), "not-a-jwt")
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert_eq!(body["hasAccess"], false);
    assert_eq!(body["reason"], "unauthenticated");
}
