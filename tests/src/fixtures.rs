//! Request payload fixtures.

use std::io::Write;

use flate2::write::GzEncoder;
use flate2::Compression;

/// One NDJSON event line.
pub fn event_line(timestamp: &str, service: &str, name: &str) -> String {
    serde_json::json!({
        "timestamp": timestamp,
        "service": service,
        "name": name,
    })
    .to_string()
}

/// Join lines into an NDJSON body.
pub fn ndjson(lines: &[String]) -> String {
    let mut body = lines.join("\n");
    body.push('\n');
    body
}

/// Gzip a request body.
pub fn gzip(body: &str) -> Vec<u8> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(body.as_bytes())
        .expect("gzip write failed");
    encoder.finish().expect("gzip finish failed")
}

pub fn test_api_key() -> String {
    "test-key-123".to_string()
}
