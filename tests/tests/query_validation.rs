//! Query validation tests.
//!
//! Every request here must be rejected by the compiler before any SQL is
//! issued, so these run against a store handle that never connects.

use axum_test::TestServer;
use integration_tests::setup::TestContext;
use serde_json::json;

fn server() -> TestServer {
    let ctx = TestContext::new();
    TestServer::new(ctx.router).expect("failed to create test server")
}

#[tokio::test]
async fn injection_in_data_field_name_is_rejected() {
    let response = server()
        .post("/v1/analytics")
        .json(&json!({
            "filters": [
                {"field": "data.status; DROP TABLE", "operator": "eq", "value": "x"}
            ]
        }))
        .await;

    response.assert_status_bad_request();
    let body: serde_json::Value = response.json();
    assert!(body["error"]
        .as_str()
        .unwrap()
        .contains("invalid data field name"));
}

#[tokio::test]
async fn unknown_filter_field_is_rejected() {
    let response = server()
        .post("/v1/analytics")
        .json(&json!({
            "filters": [{"field": "password", "operator": "eq", "value": "x"}]
        }))
        .await;

    response.assert_status_bad_request();
    let body: serde_json::Value = response.json();
    assert_eq!(body["error"], "invalid filter field: password");
}

#[tokio::test]
async fn too_many_group_by_fields_is_rejected() {
    let response = server()
        .post("/v1/analytics")
        .json(&json!({"group_by": vec!["service"; 11]}))
        .await;

    response.assert_status_bad_request();
    let body: serde_json::Value = response.json();
    assert!(body["error"].as_str().unwrap().contains("too many group by fields"));
}

#[tokio::test]
async fn oversized_time_range_is_rejected() {
    let response = server()
        .post("/v1/timeseries")
        .json(&json!({
            "interval": "minute",
            "from": "2020-01-01T00:00:00Z",
            "to": "2025-01-01T00:00:00Z",
        }))
        .await;

    response.assert_status_bad_request();
    let body: serde_json::Value = response.json();
    assert!(body["error"].as_str().unwrap().contains("too large"));
}

#[tokio::test]
async fn excessive_point_count_is_rejected() {
    // 80 days of minute buckets: inside the range cap, far over the point cap.
    let response = server()
        .post("/v1/timeseries")
        .json(&json!({
            "interval": "minute",
            "from": "2026-01-01T00:00:00Z",
            "to": "2026-03-22T00:00:00Z",
        }))
        .await;

    response.assert_status_bad_request();
    let body: serde_json::Value = response.json();
    assert!(body["error"].as_str().unwrap().contains("too many data points"));
}

#[tokio::test]
async fn topn_requires_group_by() {
    let response = server().post("/v1/topn").json(&json!({})).await;

    response.assert_status_bad_request();
    let body: serde_json::Value = response.json();
    assert_eq!(body["error"], "group_by is required");
}

#[tokio::test]
async fn compare_requires_a_current_window() {
    let response = server().post("/v1/compare").json(&json!({})).await;

    response.assert_status_bad_request();
    let body: serde_json::Value = response.json();
    assert_eq!(body["error"], "from and to are required");
}

#[tokio::test]
async fn numeric_aggregation_without_field_is_rejected() {
    let response = server()
        .post("/v1/gauge")
        .json(&json!({"aggregation": "p95"}))
        .await;

    response.assert_status_bad_request();
    let body: serde_json::Value = response.json();
    assert_eq!(body["error"], "field is required for p95 aggregation");
}

#[tokio::test]
async fn get_analytics_rejects_bad_aggregation() {
    let response = server().get("/v1/analytics?aggregation=median").await;

    response.assert_status_bad_request();
    let body: serde_json::Value = response.json();
    assert_eq!(body["error"], "invalid aggregation type");
}

#[tokio::test]
async fn unknown_label_is_rejected() {
    let response = server().get("/v1/labels/hostname/values").await;

    response.assert_status_bad_request();
    let body: serde_json::Value = response.json();
    assert_eq!(body["error"], "invalid label: hostname");
}

#[tokio::test]
async fn data_values_requires_a_key() {
    let response = server().get("/v1/data/values").await;

    response.assert_status_bad_request();
    let body: serde_json::Value = response.json();
    assert_eq!(body["error"], "key is required");
}
