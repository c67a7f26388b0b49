mod common;

use axum::http::StatusCode;
use rust_decimal_macros::dec;
use serde_json::json;

use common::{read_json, TestApp};

#[tokio::test]
async fn pricing_for_fresh_course_has_full_quota() {
    let app = TestApp::spawn().await;
    let course = app.seed_course(dec!(500.00)).await;

    let response = app.get(&format!("/pricing?course_id={}", course.id)).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = read_json(response).await;
    assert_eq!(body["base_price_cents"], 50000);
    assert_eq!(body["discounted_price_cents"], 45000);
    assert_eq!(body["discount_quota"], 10);
    assert_eq!(body["remaining_discounted"], 10);
    assert_eq!(body["is_discount_active"], true);
    assert_eq!(body["currency"], "INR");
}

#[tokio::test]
async fn pricing_counts_only_paid_purchases() {
    let app = TestApp::spawn().await;
    let course = app.seed_course(dec!(500.00)).await;
    for i in 0..3 {
        app.seed_paid_purchase(course.id, &format!("buyer{}@example.com", i), &format!("cs_{}", i))
            .await;
    }

    let body = read_json(app.get(&format!("/pricing?course_id={}", course.id)).await).await;
    assert_eq!(body["remaining_discounted"], 7);
    assert_eq!(body["is_discount_active"], true);
}

#[tokio::test]
async fn discount_deactivates_exactly_at_quota() {
    let app = TestApp::spawn().await;
    let course = app.seed_course(dec!(500.00)).await;
    for i in 0..9 {
        app.seed_paid_purchase(course.id, &format!("buyer{}@example.com", i), &format!("cs_{}", i))
            .await;
    }

    let body = read_json(app.get(&format!("/pricing?course_id={}", course.id)).await).await;
    assert_eq!(body["remaining_discounted"], 1);
    assert_eq!(body["is_discount_active"], true);

    app.seed_paid_purchase(course.id, "buyer9@example.com", "cs_9")
        .await;

    let body = read_json(app.get(&format!("/pricing?course_id={}", course.id)).await).await;
    assert_eq!(body["remaining_discounted"], 0);
    assert_eq!(body["is_discount_active"], false);
}

#[tokio::test]
async fn pricing_unknown_course_is_404() {
    let app = TestApp::spawn().await;
    let response = app
        .get("/pricing?course_id=7f4df0ac-3f5e-44c9-9f43-2a53d9c6f0b1")
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = read_json(response).await;
    assert_eq!(body["error"], "Course not found");
}

#[tokio::test]
async fn checkout_requires_authentication() {
    let app = TestApp::spawn().await;
    let course = app.seed_course(dec!(500.00)).await;

    let response = app
        .post_json("/checkout", json!({ "course_id": course.id, "title": course.title }))
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn checkout_without_title_is_400() {
    let app = TestApp::spawn().await;
    let course = app.seed_course(dec!(500.00)).await;
    let token = app.register_user("alice", "alice@example.com").await;

    for body in [
        json!({ "course_id": course.id }),
        json!({ "course_id": course.id, "title": "  " }),
    ] {
        let response = app.post_json_authed("/checkout", body, &token).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let error = read_json(response).await;
        assert_eq!(error["error"], "course_id and title are required");
    }
}

#[tokio::test]
async fn checkout_returns_gateway_url_and_snapshots_pricing() {
    let app = TestApp::spawn().await;
    let course = app.seed_course(dec!(500.00)).await;
    let token = app.register_user("alice", "alice@example.com").await;

    let response = app
        .post_json_authed("/checkout", json!({ "course_id": course.id, "title": course.title }), &token)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    let url = body["url"].as_str().expect("redirect url");
    assert!(url.starts_with("https://checkout.test/"));

    // The discounted amount and buyer identity are pinned on the session.
    let session = app.gateway.session("cs_test_1").expect("session created");
    assert_eq!(session.amount_total_minor, Some(45000));
    let metadata = session.metadata.expect("metadata");
    assert_eq!(metadata.course_id, course.id);
    assert_eq!(metadata.user_email, "alice@example.com");
    assert_eq!(metadata.base_price_minor, Some(50000));
    assert_eq!(metadata.final_price_minor, Some(45000));
    assert_eq!(metadata.discount_applied, Some(true));
}

#[tokio::test]
async fn checkout_charges_full_price_once_quota_is_spent() {
    let app = TestApp::spawn().await;
    let course = app.seed_course(dec!(500.00)).await;
    for i in 0..10 {
        app.seed_paid_purchase(course.id, &format!("buyer{}@example.com", i), &format!("cs_{}", i))
            .await;
    }
    let token = app.register_user("alice", "alice@example.com").await;

    let response = app
        .post_json_authed("/checkout", json!({ "course_id": course.id, "title": course.title }), &token)
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let session = app.gateway.session("cs_test_1").expect("session created");
    assert_eq!(session.amount_total_minor, Some(50000));
    assert_eq!(session.metadata.expect("metadata").discount_applied, Some(false));
}

#[tokio::test]
async fn checkout_unknown_course_is_404_and_no_session_created() {
    let app = TestApp::spawn().await;
    let token = app.register_user("alice", "alice@example.com").await;

    let response = app
        .post_json_authed(
            "/checkout",
            json!({ "course_id": "7f4df0ac-3f5e-44c9-9f43-2a53d9c6f0b1", "title": "Ghost Course" }),
            &token,
        )
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = read_json(response).await;
    assert_eq!(body["error"], "Course not found");
    assert!(app.gateway.session("cs_test_1").is_none());
}

#[tokio::test]
async fn checkout_surfaces_gateway_outage_as_500() {
    let app = TestApp::spawn().await;
    let course = app.seed_course(dec!(500.00)).await;
    let token = app.register_user("alice", "alice@example.com").await;
    *app.gateway.fail_create.lock().unwrap() = true;

    let response = app
        .post_json_authed("/checkout", json!({ "course_id": course.id, "title": course.title }), &token)
        .await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = read_json(response).await;
    // Outage details stay out of the response body.
    assert_eq!(body["error"], "Payment gateway error");
}
