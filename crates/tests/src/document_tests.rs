use axum::http::StatusCode;
use pretty_assertions::assert_eq;
use serde_json::json;

use crate::common::{create_entity, delete, document_ids, document_names, get, get_raw, test_app};

#[tokio::test]
async fn preview_is_inline_with_original_name() {
    let app = test_app();
    let entity = create_entity(
        &app,
        "appeals",
        json!({ "filingDate": "2024-01-10" }),
        &[("Pismo od klienta.pdf", b"%PDF-1.7")],
    )
    .await;
    let id = entity["id"].as_str().unwrap();
    let doc = &document_ids(&entity)[0];

    let resp = get_raw(&app, &format!("/api/appeals/{id}/documents/{doc}/preview")).await;

    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.body, b"%PDF-1.7".to_vec());
    assert_eq!(resp.header("content-type"), Some("application/pdf"));
    assert_eq!(
        resp.header("content-disposition"),
        Some("inline; filename=\"Pismo od klienta.pdf\"; filename*=UTF-8''Pismo%20od%20klienta.pdf")
    );
}

#[tokio::test]
async fn download_is_an_attachment() {
    let app = test_app();
    let entity = create_entity(
        &app,
        "decisions",
        json!({ "decisionDate": "2024-01-10" }),
        &[("table.xlsx", b"PK")],
    )
    .await;
    let id = entity["id"].as_str().unwrap();
    let doc = &document_ids(&entity)[0];

    let resp = get_raw(&app, &format!("/api/decisions/{id}/documents/{doc}/download")).await;

    assert_eq!(resp.status, StatusCode::OK);
    assert!(resp
        .header("content-disposition")
        .unwrap()
        .starts_with("attachment; filename=\"table.xlsx\""));
    assert_eq!(
        resp.header("content-type"),
        Some("application/vnd.openxmlformats-officedocument.spreadsheetml.sheet")
    );
}

#[tokio::test]
async fn responses_carry_a_request_id() {
    let app = test_app();
    let resp = get_raw(&app, "/api/appeals?parentId=claim-1").await;
    assert!(resp.header("x-request-id").is_some());
}

#[tokio::test]
async fn document_of_another_entity_is_404() {
    let app = test_app();
    let a = create_entity(&app, "appeals", json!({ "filingDate": "2024-01-10" }), &[("a.pdf", b"A")]).await;
    let b = create_entity(&app, "appeals", json!({ "filingDate": "2024-01-10" }), &[("b.pdf", b"B")]).await;
    let a_doc = &document_ids(&a)[0];
    let b_id = b["id"].as_str().unwrap();

    let resp = get_raw(&app, &format!("/api/appeals/{b_id}/documents/{a_doc}/preview")).await;
    assert_eq!(resp.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn deleting_one_document_keeps_sibling_order() {
    let app = test_app();
    let entity = create_entity(
        &app,
        "settlements",
        json!({ "settlementDate": "2024-01-10" }),
        &[("1.pdf", b"1"), ("2.pdf", b"2"), ("3.pdf", b"3")],
    )
    .await;
    let id = entity["id"].as_str().unwrap();
    let ids = document_ids(&entity);

    let status = delete(&app, &format!("/api/settlements/{id}/documents/{}", ids[1])).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, list) = get(&app, "/api/settlements?parentId=claim-1").await;
    assert_eq!(document_names(&list[0]), vec!["1.pdf", "3.pdf"]);

    let resp = get_raw(&app, &format!("/api/settlements/{id}/documents/{}/preview", ids[1])).await;
    assert_eq!(resp.status, StatusCode::NOT_FOUND);
    let status = delete(&app, &format!("/api/settlements/{id}/documents/{}", ids[1])).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn document_can_be_deleted_by_id_alone() {
    let app = test_app();
    let entity = create_entity(
        &app,
        "recourses",
        json!({ "filingDate": "2024-01-10" }),
        &[("keep.pdf", b"1"), ("drop.pdf", b"2")],
    )
    .await;
    let drop_id = &document_ids(&entity)[1];

    assert_eq!(delete(&app, &format!("/api/documents/{drop_id}")).await, StatusCode::NO_CONTENT);

    let (_, list) = get(&app, "/api/recourses?parentId=claim-1").await;
    assert_eq!(document_names(&list[0]), vec!["keep.pdf"]);
    let (_, health) = get(&app, "/health").await;
    assert_eq!(health["storage"], "ok (1 objects)");
}

#[tokio::test]
async fn malformed_document_id_is_400() {
    let app = test_app();
    let entity = create_entity(&app, "appeals", json!({ "filingDate": "2024-01-10" }), &[]).await;
    let id = entity["id"].as_str().unwrap();
    let resp = get_raw(&app, &format!("/api/appeals/{id}/documents/nope/preview")).await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn multi_document_kinds_have_no_single_document_routes() {
    let app = test_app();
    let entity = create_entity(&app, "appeals", json!({ "filingDate": "2024-01-10" }), &[("a.pdf", b"A")]).await;
    let id = entity["id"].as_str().unwrap();

    let resp = get_raw(&app, &format!("/api/appeals/{id}/preview")).await;
    assert_eq!(resp.status, StatusCode::NOT_FOUND);
    assert_eq!(delete(&app, &format!("/api/appeals/{id}/document")).await, StatusCode::NOT_FOUND);
}
