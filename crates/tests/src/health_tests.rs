use axum::http::StatusCode;
use serde_json::json;

use crate::common::{create_entity, get, test_app};

#[tokio::test]
async fn health_reports_counts() {
    let app = test_app();
    create_entity(
        &app,
        "appeals",
        json!({ "filingDate": "2024-01-10" }),
        &[("a.pdf", b"A"), ("b.pdf", b"B")],
    )
    .await;

    let (status, body) = get(&app, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["entities"], 1);
    assert_eq!(body["documents"], 2);
    assert_eq!(body["storage"], "ok (2 objects)");
    assert!(body["version"].is_string());
}
