//! Health endpoint tests.

use axum_test::TestServer;
use integration_tests::{fixtures, setup::TestContext};

#[tokio::test]
async fn reports_ok_with_zeroed_counters() {
    let ctx = TestContext::new();
    let server = TestServer::new(ctx.router.clone()).expect("failed to create test server");

    let response = server.get("/health").await;
    response.assert_status_ok();

    let json: serde_json::Value = response.json();
    assert_eq!(
        json,
        serde_json::json!({
            "status": "ok",
            "enqueued": 0,
            "dropped": 0,
            "pending": 0,
        })
    );
}

#[tokio::test]
async fn counters_reflect_ingested_events() {
    let ctx = TestContext::new();
    let server = TestServer::new(ctx.router.clone()).expect("failed to create test server");

    let body = fixtures::ndjson(&[
        fixtures::event_line("2026-02-06T23:01:02Z", "users", "a"),
        fixtures::event_line("2026-02-06T23:01:03Z", "users", "b"),
    ]);
    server
        .post("/v1/events")
        .bytes(body.into_bytes().into())
        .await
        .assert_status_ok();

    let response = server.get("/health").await;
    let json: serde_json::Value = response.json();
    assert_eq!(json["status"], "ok");
    assert_eq!(json["enqueued"], 2);
    assert_eq!(json["dropped"], 0);
    assert_eq!(json["pending"], 2);
}
