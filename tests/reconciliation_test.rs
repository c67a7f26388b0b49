mod common;

use axum::http::StatusCode;
use rust_decimal_macros::dec;
use serde_json::json;

use common::{completed_session_event, purchase_count_for_session, read_json, TestApp};

#[tokio::test]
async fn confirm_records_paid_session_once() {
    let app = TestApp::spawn().await;
    let course = app.seed_course(dec!(500.00)).await;
    app.seed_paid_session("cs_paid_1", course.id, "alice@example.com");

    let response = app.get("/confirm?session_id=cs_paid_1").await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert_eq!(body["ok"], true);
    assert!(body["id"].is_string());

    assert_eq!(purchase_count_for_session(&app.db, "cs_paid_1").await, 1);
}

#[tokio::test]
async fn repeated_confirms_return_same_purchase() {
    let app = TestApp::spawn().await;
    let course = app.seed_course(dec!(500.00)).await;
    app.seed_paid_session("cs_paid_1", course.id, "alice@example.com");

    let first = read_json(app.get("/confirm?session_id=cs_paid_1").await).await;
    let second = read_json(app.get("/confirm?session_id=cs_paid_1").await).await;
    let third = read_json(app.get("/confirm?session_id=cs_paid_1").await).await;

    assert_eq!(first["ok"], true);
    assert_eq!(first["id"], second["id"]);
    assert_eq!(second["id"], third["id"]);
    assert_eq!(purchase_count_for_session(&app.db, "cs_paid_1").await, 1);
}

#[tokio::test]
async fn confirm_and_webhook_converge_to_one_row() {
    let app = TestApp::spawn().await;
    let course = app.seed_course(dec!(500.00)).await;
    app.seed_paid_session("cs_paid_1", course.id, "alice@example.com");
    let event = completed_session_event("cs_paid_1", course.id, "alice@example.com");

    // Redirect lands first, then the gateway delivers the event twice.
    let confirm = app.get("/confirm?session_id=cs_paid_1").await;
    assert_eq!(confirm.status(), StatusCode::OK);
    for _ in 0..2 {
        let webhook = app.post_webhook(&event).await;
        assert_eq!(webhook.status(), StatusCode::OK);
        let ack = read_json(webhook).await;
        assert_eq!(ack["received"], true);
    }

    assert_eq!(purchase_count_for_session(&app.db, "cs_paid_1").await, 1);
}

#[tokio::test]
async fn webhook_first_then_confirm_converge_to_one_row() {
    let app = TestApp::spawn().await;
    let course = app.seed_course(dec!(500.00)).await;
    app.seed_paid_session("cs_paid_1", course.id, "alice@example.com");
    let event = completed_session_event("cs_paid_1", course.id, "alice@example.com");

    let webhook = app.post_webhook(&event).await;
    assert_eq!(webhook.status(), StatusCode::OK);

    let confirm = read_json(app.get("/confirm?session_id=cs_paid_1").await).await;
    assert_eq!(confirm["ok"], true);
    assert_eq!(purchase_count_for_session(&app.db, "cs_paid_1").await, 1);
}

#[tokio::test]
async fn unpaid_session_is_not_recorded() {
    let app = TestApp::spawn().await;
    let course = app.seed_course(dec!(500.00)).await;
    let token = app.register_user("alice", "alice@example.com").await;
    let response = app
        .post_json_authed("/checkout", json!({ "course_id": course.id, "title": course.title }), &token)
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    // The fake gateway leaves new sessions unpaid.
    let confirm = app.get("/confirm?session_id=cs_test_1").await;
    assert_eq!(confirm.status(), StatusCode::OK);
    let body = read_json(confirm).await;
    assert_eq!(body["ok"], false);
    assert_eq!(body["reason"], "not_paid");
    assert_eq!(purchase_count_for_session(&app.db, "cs_test_1").await, 0);
}

#[tokio::test]
async fn confirm_without_metadata_is_400() {
    let app = TestApp::spawn().await;
    app.gateway.insert_session(coursehub_api::gateway::GatewaySession {
        id: "cs_bare".to_string(),
        url: None,
        payment_status: coursehub_api::gateway::PaymentStatus::Paid,
        metadata: None,
        amount_total_minor: Some(45000),
        customer_email: None,
    });

    let response = app.get("/confirm?session_id=cs_bare").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(purchase_count_for_session(&app.db, "cs_bare").await, 0);

    // Missing metadata wins over the payment state: an unpaid bare session
    // is still a 400, not "not paid yet".
    app.gateway.insert_session(coursehub_api::gateway::GatewaySession {
        id: "cs_bare_unpaid".to_string(),
        url: None,
        payment_status: coursehub_api::gateway::PaymentStatus::Unpaid,
        metadata: None,
        amount_total_minor: None,
        customer_email: None,
    });
    let response = app.get("/confirm?session_id=cs_bare_unpaid").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn confirm_unknown_session_is_500_from_gateway() {
    let app = TestApp::spawn().await;
    let response = app.get("/confirm?session_id=cs_nonexistent").await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn purchase_sends_access_email_once() {
    let app = TestApp::spawn().await;
    let course = app.seed_course(dec!(500.00)).await;
    app.seed_paid_session("cs_paid_1", course.id, "alice@example.com");

    app.get("/confirm?session_id=cs_paid_1").await;
    app.get("/confirm?session_id=cs_paid_1").await;

    let sent = app.mailer.sent.lock().unwrap();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, "alice@example.com");
}

#[tokio::test]
async fn gateway_verified_email_wins_over_metadata_snapshot() {
    let app = TestApp::spawn().await;
    let course = app.seed_course(dec!(500.00)).await;
    // The snapshot carries the email from checkout time; the gateway reports
    // the address it actually verified during payment.
    app.gateway.insert_session(coursehub_api::gateway::GatewaySession {
        id: "cs_verified".to_string(),
        url: None,
        payment_status: coursehub_api::gateway::PaymentStatus::Paid,
        metadata: Some(coursehub_api::gateway::SessionMetadata::identity(
            course.id,
            "stale@example.com",
        )),
        amount_total_minor: Some(45000),
        customer_email: Some("verified@example.com".to_string()),
    });

    let confirm = read_json(app.get("/confirm?session_id=cs_verified").await).await;
    assert_eq!(confirm["ok"], true);

    let buyer = app.register_user("verified", "verified@example.com").await;
    let access = read_json(
        app.get_authed(&format!("/access?course_id={}", course.id), &buyer)
            .await,
    )
    .await;
    assert_eq!(access["hasAccess"], true);

    let stale = app.register_user("stale", "stale@example.com").await;
    let access = read_json(
        app.get_authed(&format!("/access?course_id={}", course.id), &stale)
            .await,
    )
    .await;
    assert_eq!(access["hasAccess"], false);
}

#[tokio::test]
async fn two_sessions_for_same_course_both_record() {
    let app = TestApp::spawn().await;
    let course = app.seed_course(dec!(500.00)).await;
    app.seed_paid_session("cs_a", course.id, "alice@example.com");
    app.seed_paid_session("cs_b", course.id, "bob@example.com");

    assert_eq!(app.get("/confirm?session_id=cs_a").await.status(), StatusCode::OK);
    assert_eq!(app.get("/confirm?session_id=cs_b").await.status(), StatusCode::OK);

    assert_eq!(purchase_count_for_session(&app.db, "cs_a").await, 1);
    assert_eq!(purchase_count_for_session(&app.db, "cs_b").await, 1);
}
