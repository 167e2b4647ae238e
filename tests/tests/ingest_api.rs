//! Ingest endpoint tests: NDJSON parsing, gzip, drop accounting.

use axum_test::TestServer;
use integration_tests::{fixtures, setup::TestContext};

#[tokio::test]
async fn accepts_valid_ndjson_lines() {
    let ctx = TestContext::new();
    let server = TestServer::new(ctx.router.clone()).expect("failed to create test server");

    let body = fixtures::ndjson(&[
        fixtures::event_line("2026-02-06T23:01:02.123Z", "users", "user.created"),
        fixtures::event_line("2026-02-06T23:01:02.456Z", "users", "db.query"),
    ]);

    let response = server
        .post("/v1/events")
        .content_type("application/x-ndjson")
        .bytes(body.into_bytes().into())
        .await;

    response.assert_status_ok();
    let json: serde_json::Value = response.json();
    assert_eq!(json, serde_json::json!({"accepted": 2}));

    let stats = ctx.queue.stats();
    assert_eq!(stats.enqueued, 2);
    assert_eq!(stats.dropped, 0);
    assert_eq!(stats.pending, 2);
}

#[tokio::test]
async fn malformed_lines_are_skipped_and_counted() {
    let ctx = TestContext::new();
    let server = TestServer::new(ctx.router.clone()).expect("failed to create test server");

    let body = format!(
        "{}\nnot json at all\n{}\n{}\n",
        fixtures::event_line("2026-02-06T23:01:02Z", "users", "a"),
        fixtures::event_line("2026-02-06T23:01:03Z", "users", "b"),
        // Valid JSON but fails validation: empty service.
        r#"{"timestamp":"2026-02-06T23:01:04Z","service":"","name":"c"}"#,
    );

    let response = server
        .post("/v1/events")
        .content_type("application/x-ndjson")
        .bytes(body.into_bytes().into())
        .await;

    response.assert_status_ok();
    let json: serde_json::Value = response.json();
    assert_eq!(json["accepted"], 2);
    assert_eq!(json["skipped"], 2);
    assert_eq!(ctx.queue.stats().enqueued, 2);
}

#[tokio::test]
async fn decompresses_gzip_bodies() {
    let ctx = TestContext::new();
    let server = TestServer::new(ctx.router.clone()).expect("failed to create test server");

    let body = fixtures::ndjson(&[fixtures::event_line(
        "2026-02-06T23:01:02Z",
        "users",
        "user.created",
    )]);

    let response = server
        .post("/v1/events")
        .content_type("application/x-ndjson")
        .add_header("Content-Encoding", "gzip")
        .bytes(fixtures::gzip(&body).into())
        .await;

    response.assert_status_ok();
    let json: serde_json::Value = response.json();
    assert_eq!(json["accepted"], 1);
}

#[tokio::test]
async fn empty_body_accepts_nothing() {
    let ctx = TestContext::new();
    let server = TestServer::new(ctx.router.clone()).expect("failed to create test server");

    let response = server
        .post("/v1/events")
        .content_type("application/x-ndjson")
        .bytes(Vec::new().into())
        .await;

    response.assert_status_ok();
    let json: serde_json::Value = response.json();
    assert_eq!(json["accepted"], 0);
    assert_eq!(ctx.queue.stats().enqueued, 0);
}

#[tokio::test]
async fn queue_overflow_drops_newest_but_still_accepts() {
    let ctx = TestContext::with_queue_capacity(1);
    let server = TestServer::new(ctx.router.clone()).expect("failed to create test server");

    let body = fixtures::ndjson(&[
        fixtures::event_line("2026-02-06T23:01:01Z", "users", "e0"),
        fixtures::event_line("2026-02-06T23:01:02Z", "users", "e1"),
        fixtures::event_line("2026-02-06T23:01:03Z", "users", "e2"),
    ]);

    let response = server
        .post("/v1/events")
        .content_type("application/x-ndjson")
        .bytes(body.into_bytes().into())
        .await;

    response.assert_status_ok();
    let json: serde_json::Value = response.json();
    // All valid lines were handed to the queue...
    assert_eq!(json["accepted"], 3);

    // ...but only one fit; the rest are visible as drops.
    let stats = ctx.queue.stats();
    assert_eq!(stats.enqueued, 1);
    assert_eq!(stats.dropped, 2);
    assert_eq!(stats.enqueued + stats.dropped, 3);
}
