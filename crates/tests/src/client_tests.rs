use chrono::NaiveDate;
use client::{
    ClaimSection, ClaimsApi, HttpClaimsApi, IntakeChannel, MemoryBlobHost, NotificationKind,
    SectionContext, StagedFile, Submission, ToastQueue, ViewerContent,
};
use pretty_assertions::assert_eq;
use serde_json::json;
use shared_types::{AppErrorKind, EntityKind, PolicyConfig};
use std::rc::Rc;

use crate::common::{spawn_server, PARENT};

struct Harness {
    api: Rc<HttpClaimsApi>,
    host: Rc<MemoryBlobHost>,
    toasts: Rc<ToastQueue>,
    ctx: SectionContext<HttpClaimsApi>,
}

impl Harness {
    async fn start() -> Self {
        let api = Rc::new(HttpClaimsApi::new(spawn_server().await));
        let host = Rc::new(MemoryBlobHost::new());
        let toasts = Rc::new(ToastQueue::new());
        let ctx = SectionContext {
            api: api.clone(),
            host: host.clone(),
            notifier: toasts.clone(),
            policy: PolicyConfig::default(),
        };
        Self {
            api,
            host,
            toasts,
            ctx,
        }
    }

    fn section(&self, kind: EntityKind) -> ClaimSection<HttpClaimsApi> {
        ClaimSection::new(&self.ctx, kind, PARENT)
    }
}

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
}

fn stage(section: &mut ClaimSection<HttpClaimsApi>, files: &[(&str, &[u8])]) {
    let staged = files
        .iter()
        .map(|(name, bytes)| StagedFile::new(*name, bytes.to_vec()))
        .collect();
    section
        .draft_mut()
        .staging_mut()
        .unwrap()
        .add(staged, IntakeChannel::Picker);
}

#[tokio::test]
async fn create_then_edit_keeps_document_order() {
    let h = Harness::start().await;
    let mut section = h.section(EntityKind::Appeal);
    assert!(section.refresh().await);
    assert!(section.store().entities().is_empty());

    assert!(section.open_create(today()));
    section.draft_mut().set_field("amount", "1200.00");
    stage(&mut section, &[("a.pdf", b"%PDF-a"), ("b.png", b"png"), ("c.xlsx", b"PK")]);
    section
        .draft_mut()
        .staging_mut()
        .unwrap()
        .set_description("From the client");
    assert!(section.submit().await);

    assert!(!section.draft().is_open());
    assert_eq!(section.store().entities().len(), 1);
    let entity = section.store().entities()[0].clone();
    let names: Vec<_> = entity.documents.iter().map(|d| d.original_file_name.as_str()).collect();
    assert_eq!(names, vec!["a.pdf", "b.png", "c.xlsx"]);
    assert_eq!(entity.documents[0].description.as_deref(), Some("From the client"));
    assert_eq!(entity.field_str("status"), Some("open"));

    assert!(section.open_edit(&entity.id));
    stage(&mut section, &[("d.pdf", b"%PDF-d")]);
    assert!(section.submit().await);

    let updated = section.store().get(&entity.id).unwrap();
    let ids: Vec<_> = updated.documents.iter().map(|d| d.id.clone()).collect();
    let before: Vec<_> = entity.documents.iter().map(|d| d.id.clone()).collect();
    assert_eq!(&ids[..3], &before[..]);
    assert_eq!(updated.documents[3].original_file_name, "d.pdf");
    assert_eq!(h.toasts.count(NotificationKind::Success), 2);
}

#[tokio::test]
async fn filling_response_date_closes_the_appeal() {
    let h = Harness::start().await;
    let mut section = h.section(EntityKind::Appeal);
    section.refresh().await;

    section.open_create(today());
    section.draft_mut().set_field("responseDate", "2024-06-20");
    assert!(section.submit().await);

    let entity = &section.store().entities()[0];
    assert_eq!(entity.field_str("status"), Some("closed"));
}

#[tokio::test]
async fn preview_fetches_and_revokes_on_close() {
    let h = Harness::start().await;
    let mut section = h.section(EntityKind::Decision);
    section.refresh().await;
    section.open_create(today());
    stage(&mut section, &[("decision.pdf", b"%PDF-1.7"), ("sheet.xlsx", b"PK")]);
    assert!(section.submit().await);

    let entity = section.store().entities()[0].clone();
    assert!(section.preview_document(&entity.id, &entity.documents[0].id).await);
    assert!(matches!(section.viewer().content(), Some(ViewerContent::Frame(_))));
    assert_eq!(h.host.created_count(), 1);

    assert!(section.viewer_mut().next().await);
    match section.viewer().content() {
        Some(ViewerContent::Remote(url)) => {
            assert!(url.starts_with(h.api.base_url()));
            assert!(url.ends_with(&format!(
                "/api/decisions/{}/documents/{}/preview",
                entity.id, entity.documents[1].id
            )));
        }
        other => panic!("expected a remote view, got {other:?}"),
    }

    section.viewer_mut().close();
    assert!(h.host.is_balanced());
}

#[tokio::test]
async fn download_saves_under_the_original_name() {
    let h = Harness::start().await;
    let mut section = h.section(EntityKind::Settlement);
    section.refresh().await;
    section.open_create(today());
    stage(&mut section, &[("Ugoda-koncowa.docx", b"PK-docx")]);
    assert!(section.submit().await);

    let entity = section.store().entities()[0].clone();
    assert!(section.download_document(&entity.id, &entity.documents[0].id).await);

    let (name, blob) = h.host.last_download().unwrap();
    assert_eq!(name, "Ugoda-koncowa.docx");
    assert_eq!(blob.bytes, b"PK-docx".to_vec());
}

#[tokio::test]
async fn removing_documents_and_entities_reaches_the_backend() {
    let h = Harness::start().await;
    let mut section = h.section(EntityKind::Recourse);
    section.refresh().await;
    section.open_create(today());
    stage(&mut section, &[("1.pdf", b"1"), ("2.pdf", b"2"), ("3.pdf", b"3")]);
    assert!(section.submit().await);

    let entity = section.store().entities()[0].clone();
    assert!(section.remove_document(&entity.id, &entity.documents[1].id).await);

    let listed = h.api.list(EntityKind::Recourse, PARENT).await.unwrap();
    let names: Vec<_> = listed[0].documents.iter().map(|d| d.original_file_name.as_str()).collect();
    assert_eq!(names, vec!["1.pdf", "3.pdf"]);

    let pending = section.request_remove(&entity.id).unwrap();
    assert!(section.remove(pending.confirm()).await);
    assert!(section.store().entities().is_empty());
    assert!(h.api.list(EntityKind::Recourse, PARENT).await.unwrap().is_empty());
}

#[tokio::test]
async fn legacy_kind_round_trips_through_the_flat_pair() {
    let h = Harness::start().await;
    let mut section = h.section(EntityKind::ClientClaim);
    section.refresh().await;

    section.open_create(today());
    stage(&mut section, &[("one.pdf", b"1"), ("two.pdf", b"2")]);
    assert!(!section.submit().await);
    assert!(section.draft().field_errors().contains_key("files"));
    assert!(h.api.list(EntityKind::ClientClaim, PARENT).await.unwrap().is_empty());

    section.draft_mut().staging_mut().unwrap().remove(1);
    assert!(section.submit().await);

    let entity = section.store().entities()[0].clone();
    assert_eq!(entity.documents.len(), 1);
    let doc = &entity.documents[0];
    assert!(doc.legacy);
    assert_eq!(doc.display_name(), "one.pdf");

    assert!(section.preview_document(&entity.id, &doc.id).await);
    assert!(matches!(section.viewer().content(), Some(ViewerContent::Frame(_))));

    assert!(section.remove_document(&entity.id, &doc.id).await);
    assert!(!section.viewer().is_open());
    assert!(section.store().get(&entity.id).unwrap().documents.is_empty());
}

#[tokio::test]
async fn backend_validation_errors_come_back_typed() {
    let h = Harness::start().await;
    let mut fields = serde_json::Map::new();
    fields.insert("filingDate".into(), json!("2024-05-10"));
    fields.insert("responseDate".into(), json!("2024-05-01"));
    let submission = Submission {
        parent_id: PARENT.into(),
        fields,
        ..Default::default()
    };

    let err = h.api.create(EntityKind::Appeal, &submission).await.unwrap_err();
    assert_eq!(err.kind, AppErrorKind::ValidationError);
    assert!(err.field_errors.contains_key("responseDate"));
}

#[tokio::test]
async fn unreachable_backend_is_a_network_error() {
    let api = HttpClaimsApi::new("http://127.0.0.1:9");
    let err = api.list(EntityKind::Appeal, PARENT).await.unwrap_err();
    assert_eq!(err.kind, AppErrorKind::Network);
}
