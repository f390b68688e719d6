use axum::http::StatusCode;
use pretty_assertions::assert_eq;
use serde_json::json;

use crate::common::{
    create_entity, delete, document_ids, document_names, get, post_multipart, put_multipart,
    test_app, MultipartBody, PARENT,
};

#[tokio::test]
async fn create_returns_201_with_documents_in_upload_order() {
    let app = test_app();
    let entity = create_entity(
        &app,
        "appeals",
        json!({ "filingDate": "2024-01-10", "status": "open" }),
        &[("a.pdf", b"A"), ("b.png", b"B"), ("c.txt", b"C")],
    )
    .await;

    assert_eq!(entity["parentId"], PARENT);
    assert_eq!(entity["filingDate"], "2024-01-10");
    assert_eq!(document_names(&entity), vec!["a.pdf", "b.png", "c.txt"]);
    assert_eq!(entity["documents"][1]["contentType"], "image/png");
    assert_eq!(entity["documents"][2]["size"], 1);
}

#[tokio::test]
async fn create_without_files_has_empty_document_list() {
    let app = test_app();
    let entity = create_entity(&app, "decisions", json!({ "decisionDate": "2024-02-01" }), &[]).await;
    assert_eq!(entity["documents"], json!([]));
}

#[tokio::test]
async fn create_applies_description_to_the_batch() {
    let app = test_app();
    let body = MultipartBody::new()
        .fields(json!({ "parentId": PARENT, "settlementDate": "2024-03-01" }))
        .text("description", "  Signed copies  ")
        .file("one.pdf", "application/pdf", b"1")
        .file("two.pdf", "application/pdf", b"2");
    let (status, entity) = post_multipart(&app, "/api/settlements", body).await;

    assert_eq!(status, StatusCode::CREATED);
    for doc in entity["documents"].as_array().unwrap() {
        assert_eq!(doc["description"], "Signed copies");
    }
}

#[tokio::test]
async fn create_requires_parent_id() {
    let app = test_app();
    let body = MultipartBody::new().fields(json!({ "filingDate": "2024-01-10" }));
    let (status, err) = post_multipart(&app, "/api/appeals", body).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(err["kind"], "BadRequest");
}

#[tokio::test]
async fn create_requires_fields_part() {
    let app = test_app();
    let body = MultipartBody::new().file("a.pdf", "application/pdf", b"A");
    let (status, _) = post_multipart(&app, "/api/appeals", body).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn create_rejects_fields_that_are_not_an_object() {
    let app = test_app();
    let body = MultipartBody::new().text("fields", "[1, 2]");
    let (status, _) = post_multipart(&app, "/api/appeals", body).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn create_with_inverted_dates_is_422_with_field_errors() {
    let app = test_app();
    let body = MultipartBody::new().fields(json!({
        "parentId": PARENT,
        "filingDate": "2024-05-10",
        "responseDate": "2024-05-01",
    }));
    let (status, err) = post_multipart(&app, "/api/appeals", body).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(err["kind"], "ValidationError");
    assert!(err["field_errors"]["responseDate"].is_string());
}

#[tokio::test]
async fn create_with_non_string_dates_is_422() {
    let app = test_app();
    let body = MultipartBody::new().fields(json!({
        "parentId": PARENT,
        "filingDate": "2024-02-01",
        "responseDate": 20240101,
    }));
    let (status, err) = post_multipart(&app, "/api/appeals", body).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(err["field_errors"]["responseDate"].is_string());

    let body = MultipartBody::new().fields(json!({ "parentId": PARENT, "decisionDate": 5 }));
    let (status, err) = post_multipart(&app, "/api/decisions", body).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(err["field_errors"]["decisionDate"].is_string());

    let (status, list) = get(&app, &format!("/api/appeals?parentId={PARENT}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list.as_array().map(Vec::len), Some(0));
}

#[tokio::test]
async fn create_without_primary_date_is_422() {
    let app = test_app();
    let body = MultipartBody::new().fields(json!({ "parentId": PARENT }));
    let (status, err) = post_multipart(&app, "/api/recourses", body).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(err["field_errors"]["filingDate"].is_string());
}

#[tokio::test]
async fn rejected_create_stores_nothing() {
    let app = test_app();
    let body = MultipartBody::new()
        .fields(json!({ "parentId": PARENT, "filingDate": "not a date" }))
        .file("a.pdf", "application/pdf", b"A");
    let (status, _) = post_multipart(&app, "/api/appeals", body).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (_, health) = get(&app, "/health").await;
    assert_eq!(health["entities"], 0);
    assert_eq!(health["documents"], 0);
    assert_eq!(health["storage"], "ok (0 objects)");
}

#[tokio::test]
async fn client_supplied_reserved_keys_are_ignored() {
    let app = test_app();
    let entity = create_entity(
        &app,
        "appeals",
        json!({
            "id": "forged",
            "documents": [{ "id": "x", "fileName": "x", "originalFileName": "x" }],
            "filingDate": "2024-01-10",
        }),
        &[],
    )
    .await;

    assert_ne!(entity["id"], "forged");
    assert_eq!(entity["documents"], json!([]));
}

#[tokio::test]
async fn unknown_kind_is_404() {
    let app = test_app();
    let (status, _) = get(&app, "/api/invoices?parentId=claim-1").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn list_requires_parent_id() {
    let app = test_app();
    let (status, _) = get(&app, "/api/appeals").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn list_is_scoped_to_parent_and_kind() {
    let app = test_app();
    let first = create_entity(&app, "appeals", json!({ "filingDate": "2024-01-01" }), &[]).await;
    let second = create_entity(&app, "appeals", json!({ "filingDate": "2024-01-02" }), &[]).await;
    create_entity(
        &app,
        "appeals",
        json!({ "parentId": "claim-2", "filingDate": "2024-01-03" }),
        &[],
    )
    .await;
    create_entity(&app, "decisions", json!({ "decisionDate": "2024-01-04" }), &[]).await;

    let (status, list) = get(&app, "/api/appeals?parentId=claim-1").await;
    assert_eq!(status, StatusCode::OK);
    let ids: Vec<_> = list.as_array().unwrap().iter().map(|e| e["id"].clone()).collect();
    assert_eq!(ids, vec![first["id"].clone(), second["id"].clone()]);
}

#[tokio::test]
async fn update_appends_files_after_existing_ones() {
    let app = test_app();
    let entity = create_entity(
        &app,
        "decisions",
        json!({ "decisionDate": "2024-01-10" }),
        &[("first.pdf", b"1")],
    )
    .await;
    let id = entity["id"].as_str().unwrap();
    let before = document_ids(&entity);

    let body = MultipartBody::new()
        .fields(json!({ "decisionDate": "2024-01-10", "amount": "100.50" }))
        .file("second.pdf", "application/pdf", b"2")
        .file("third.pdf", "application/pdf", b"3");
    let (status, updated) = put_multipart(&app, &format!("/api/decisions/{id}"), body).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["amount"], "100.50");
    assert_eq!(document_names(&updated), vec!["first.pdf", "second.pdf", "third.pdf"]);
    assert_eq!(document_ids(&updated)[0], before[0]);
}

#[tokio::test]
async fn update_with_zero_files_keeps_documents() {
    let app = test_app();
    let entity = create_entity(
        &app,
        "recourses",
        json!({ "filingDate": "2024-01-10" }),
        &[("a.pdf", b"1"), ("b.pdf", b"2")],
    )
    .await;
    let id = entity["id"].as_str().unwrap();

    let body = MultipartBody::new().fields(json!({ "filingDate": "2024-01-11" }));
    let (status, updated) = put_multipart(&app, &format!("/api/recourses/{id}"), body).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["filingDate"], "2024-01-11");
    assert_eq!(document_ids(&updated), document_ids(&entity));
}

#[tokio::test]
async fn update_without_fields_part_keeps_fields() {
    let app = test_app();
    let entity = create_entity(
        &app,
        "settlements",
        json!({ "settlementDate": "2024-01-10", "amount": 250 }),
        &[],
    )
    .await;
    let id = entity["id"].as_str().unwrap();

    let body = MultipartBody::new().file("late.pdf", "application/pdf", b"x");
    let (status, updated) = put_multipart(&app, &format!("/api/settlements/{id}"), body).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["amount"], 250);
    assert_eq!(document_names(&updated), vec!["late.pdf"]);
}

#[tokio::test]
async fn update_unknown_entity_is_404() {
    let app = test_app();
    let body = MultipartBody::new().fields(json!({ "filingDate": "2024-01-10" }));
    let uri = format!("/api/appeals/{}", uuid::Uuid::new_v4());
    let (status, _) = put_multipart(&app, &uri, body).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn update_with_malformed_id_is_400() {
    let app = test_app();
    let body = MultipartBody::new().fields(json!({ "filingDate": "2024-01-10" }));
    let (status, _) = put_multipart(&app, "/api/appeals/not-a-uuid", body).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn delete_removes_entity_and_its_objects() {
    let app = test_app();
    let entity = create_entity(
        &app,
        "appeals",
        json!({ "filingDate": "2024-01-10" }),
        &[("a.pdf", b"1"), ("b.pdf", b"2")],
    )
    .await;
    let id = entity["id"].as_str().unwrap();

    assert_eq!(delete(&app, &format!("/api/appeals/{id}")).await, StatusCode::NO_CONTENT);

    let (_, list) = get(&app, "/api/appeals?parentId=claim-1").await;
    assert_eq!(list, json!([]));
    let (_, health) = get(&app, "/health").await;
    assert_eq!(health["storage"], "ok (0 objects)");

    assert_eq!(delete(&app, &format!("/api/appeals/{id}")).await, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn delete_under_wrong_kind_is_404() {
    let app = test_app();
    let entity = create_entity(&app, "appeals", json!({ "filingDate": "2024-01-10" }), &[]).await;
    let id = entity["id"].as_str().unwrap();
    assert_eq!(delete(&app, &format!("/api/decisions/{id}")).await, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn open_appeal_carries_alert_fields() {
    let app = test_app();
    let entity = create_entity(&app, "appeals", json!({ "filingDate": "2020-01-01" }), &[]).await;
    assert_eq!(entity["alert"], true);
    assert!(entity["alertDays"].as_i64().unwrap() > 30);

    let closed = create_entity(
        &app,
        "appeals",
        json!({ "filingDate": "2020-01-01", "responseDate": "2020-02-01" }),
        &[],
    )
    .await;
    assert!(closed.get("alert").is_none());
    assert!(closed.get("alertDays").is_none());
}

#[tokio::test]
async fn upload_over_the_limit_is_413() {
    let app = test_app();
    let big = vec![0u8; crate::common::TEST_UPLOAD_LIMIT + 1];
    let body = MultipartBody::new()
        .fields(json!({ "parentId": PARENT, "filingDate": "2024-01-10" }))
        .file("huge.bin", "application/octet-stream", &big);
    let (status, _) = post_multipart(&app, "/api/appeals", body).await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);

    let (_, list) = get(&app, "/api/appeals?parentId=claim-1").await;
    assert_eq!(list, json!([]));
}
