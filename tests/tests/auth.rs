//! API key middleware tests.

use axum_test::TestServer;
use integration_tests::{fixtures, setup::TestContext};

#[tokio::test]
async fn v1_routes_require_the_configured_key() {
    let ctx = TestContext::with_api_key(&fixtures::test_api_key());
    let server = TestServer::new(ctx.router.clone()).expect("failed to create test server");

    let body = fixtures::ndjson(&[fixtures::event_line(
        "2026-02-06T23:01:02Z",
        "users",
        "user.created",
    )]);

    // Missing key.
    let response = server
        .post("/v1/events")
        .bytes(body.clone().into_bytes().into())
        .await;
    response.assert_status_unauthorized();

    // Wrong key.
    let response = server
        .post("/v1/events")
        .add_header("X-Api-Key", "wrong")
        .bytes(body.clone().into_bytes().into())
        .await;
    response.assert_status_unauthorized();

    // Nothing was enqueued by the rejected requests.
    assert_eq!(ctx.queue.stats().enqueued, 0);

    // Correct key.
    let response = server
        .post("/v1/events")
        .add_header("X-Api-Key", fixtures::test_api_key())
        .bytes(body.into_bytes().into())
        .await;
    response.assert_status_ok();
    assert_eq!(ctx.queue.stats().enqueued, 1);
}

#[tokio::test]
async fn health_is_open_even_with_a_key_configured() {
    let ctx = TestContext::with_api_key(&fixtures::test_api_key());
    let server = TestServer::new(ctx.router.clone()).expect("failed to create test server");

    let response = server.get("/health").await;
    response.assert_status_ok();
}

#[tokio::test]
async fn without_configured_key_everything_passes() {
    let ctx = TestContext::new();
    let server = TestServer::new(ctx.router.clone()).expect("failed to create test server");

    let body = fixtures::ndjson(&[fixtures::event_line(
        "2026-02-06T23:01:02Z",
        "users",
        "user.created",
    )]);

    let response = server.post("/v1/events").bytes(body.into_bytes().into()).await;
    response.assert_status_ok();
}
