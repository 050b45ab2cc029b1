//! Integration tests for the account-provisioning webhook.

use agentbi_core::{AccountId, AccountRecord};
use agentbi_integration_tests::TestContext;
use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
};

const USER_CREATED: &str = r#"{"type":"user.created","data":{"id":"u1","email_addresses":[{"email_address":"a@x.com"}]}}"#;

// =============================================================================
// Provisioning
// =============================================================================

#[tokio::test]
async fn test_user_created_inserts_account() {
    let ctx = TestContext::new();

    let response = ctx.send(ctx.signed_webhook("msg_1", USER_CREATED)).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(
        response.body,
        serde_json::json!({"message": "User data inserted successfully"})
    );
    assert_eq!(
        ctx.accounts.get(&AccountId::new("u1")),
        Some(AccountRecord::new("u1", "a@x.com"))
    );
}

#[tokio::test]
async fn test_redelivery_creates_one_record() {
    let ctx = TestContext::new();

    let first = ctx.send(ctx.signed_webhook("msg_1", USER_CREATED)).await;
    let second = ctx.send(ctx.signed_webhook("msg_1", USER_CREATED)).await;

    assert_eq!(first.status, StatusCode::OK);
    assert_eq!(second.status, StatusCode::OK);
    assert_eq!(ctx.accounts.accounts().len(), 1);
}

#[tokio::test]
async fn test_user_without_email_gets_empty_email() {
    let ctx = TestContext::new();
    let body = r#"{"type":"user.created","data":{"id":"u2","email_addresses":[]}}"#;

    let response = ctx.send(ctx.signed_webhook("msg_2", body)).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(
        ctx.accounts.get(&AccountId::new("u2")).map(|a| a.email),
        Some(String::new())
    );
}

#[tokio::test]
async fn test_store_failure_is_500() {
    let ctx = TestContext::new();
    ctx.accounts.set_unavailable(true);

    let response = ctx.send(ctx.signed_webhook("msg_1", USER_CREATED)).await;

    assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response.body["message"], "Failed to insert user data");
    assert_eq!(ctx.accounts.write_attempts(), 1);
}

// =============================================================================
// Rejections
// =============================================================================

#[tokio::test]
async fn test_other_event_kinds_are_rejected_without_writes() {
    let ctx = TestContext::new();
    let body = r#"{"type":"user.updated","data":{"id":"u1"}}"#;

    let response = ctx.send(ctx.signed_webhook("msg_3", body)).await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["message"], "Unhandled event type: user.updated");
    assert_eq!(ctx.accounts.write_attempts(), 0);
}

#[tokio::test]
async fn test_missing_headers_rejected() {
    let ctx = TestContext::new();
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/webhooks")
        .body(Body::from(USER_CREATED))
        .unwrap();

    let response = ctx.send(request).await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["message"], "Webhook verification failed");
    assert_eq!(ctx.accounts.write_attempts(), 0);
}

#[tokio::test]
async fn test_tampered_body_rejected() {
    let ctx = TestContext::new();
    let mut request = ctx.signed_webhook("msg_1", USER_CREATED);
    *request.body_mut() = Body::from(USER_CREATED.replace("a@x.com", "evil@x.com"));

    let response = ctx.send(request).await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["message"], "Webhook verification failed");
    assert!(ctx.accounts.accounts().is_empty());
}

#[tokio::test]
async fn test_tampered_signature_rejected() {
    let ctx = TestContext::new();
    let mut request = ctx.signed_webhook("msg_1", USER_CREATED);
    request.headers_mut().insert(
        "svix-signature",
        "v1,AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA=".parse().unwrap(),
    );

    let response = ctx.send(request).await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert!(ctx.accounts.accounts().is_empty());
}

#[tokio::test]
async fn test_webhook_needs_no_session() {
    // The identity gate must not redirect or 401 a signed delivery
    let ctx = TestContext::new();
    let response = ctx.send(ctx.signed_webhook("msg_1", USER_CREATED)).await;
    assert_eq!(response.status, StatusCode::OK);
}
