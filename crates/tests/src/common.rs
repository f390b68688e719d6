use axum::{
    body::{to_bytes, Body},
    http::{HeaderMap, Request, StatusCode},
    Router,
};
use serde_json::Value;
use server::db::AppState;
use shared_types::PolicyConfig;
use tower::ServiceExt;

pub const PARENT: &str = "claim-1";
pub const BOUNDARY: &str = "claims-test-boundary";

/// Upload limit used by `test_app`.
pub const TEST_UPLOAD_LIMIT: usize = 64 * 1024;

/// Router over a fresh in-memory state.
pub fn test_app() -> Router {
    test_app_with(PolicyConfig::default(), TEST_UPLOAD_LIMIT)
}

pub fn test_app_with(policy: PolicyConfig, max_upload_bytes: usize) -> Router {
    server::build_router(AppState::in_memory(policy), max_upload_bytes)
}

/// Response with headers kept, for document endpoints.
pub struct RawResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl RawResponse {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body).unwrap_or(Value::Null)
    }
}

/// Multipart body builder for create/update requests.
#[derive(Default)]
pub struct MultipartBody {
    parts: Vec<u8>,
}

impl MultipartBody {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fields(self, fields: Value) -> Self {
        self.text("fields", &fields.to_string())
    }

    pub fn text(mut self, name: &str, value: &str) -> Self {
        self.parts.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
        self
    }

    pub fn file(mut self, file_name: &str, content_type: &str, bytes: &[u8]) -> Self {
        self.parts.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"files\"; filename=\"{file_name}\"\r\nContent-Type: {content_type}\r\n\r\n"
            )
            .as_bytes(),
        );
        self.parts.extend_from_slice(bytes);
        self.parts.extend_from_slice(b"\r\n");
        self
    }

    pub fn finish(mut self) -> Vec<u8> {
        self.parts
            .extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
        self.parts
    }
}

pub async fn send_raw(app: &Router, req: Request<Body>) -> RawResponse {
    let response = app.clone().oneshot(req).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    RawResponse {
        status,
        headers,
        body: body.to_vec(),
    }
}

async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let raw = send_raw(app, req).await;
    (raw.status, raw.json())
}

fn multipart_request(method: &str, uri: &str, body: MultipartBody) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(
            "content-type",
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body.finish()))
        .unwrap()
}

/// POST a multipart body.
pub async fn post_multipart(app: &Router, uri: &str, body: MultipartBody) -> (StatusCode, Value) {
    send(app, multipart_request("POST", uri, body)).await
}

/// PUT a multipart body.
pub async fn put_multipart(app: &Router, uri: &str, body: MultipartBody) -> (StatusCode, Value) {
    send(app, multipart_request("PUT", uri, body)).await
}

pub async fn get(app: &Router, uri: &str) -> (StatusCode, Value) {
    let req = Request::builder().uri(uri).body(Body::empty()).unwrap();
    send(app, req).await
}

pub async fn get_raw(app: &Router, uri: &str) -> RawResponse {
    let req = Request::builder().uri(uri).body(Body::empty()).unwrap();
    send_raw(app, req).await
}

pub async fn delete(app: &Router, uri: &str) -> StatusCode {
    let req = Request::builder()
        .method("DELETE")
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    send_raw(app, req).await.status
}

/// Create an entity of `kind` under `PARENT` with the given files; returns the JSON body.
pub async fn create_entity(
    app: &Router,
    kind: &str,
    fields: Value,
    files: &[(&str, &[u8])],
) -> Value {
    let mut fields = fields;
    if let Some(map) = fields.as_object_mut() {
        map.entry("parentId").or_insert(Value::String(PARENT.into()));
    }
    let mut body = MultipartBody::new().fields(fields);
    for (name, bytes) in files {
        body = body.file(name, "application/octet-stream", bytes);
    }
    let (status, json) = post_multipart(app, &format!("/api/{kind}"), body).await;
    assert_eq!(status, StatusCode::CREATED, "create failed: {json}");
    json
}

/// Ids of `documents[]` in response order.
pub fn document_ids(entity: &Value) -> Vec<String> {
    entity["documents"]
        .as_array()
        .map(|docs| {
            docs.iter()
                .filter_map(|d| d["id"].as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}

/// `originalFileName` of `documents[]` in response order.
pub fn document_names(entity: &Value) -> Vec<String> {
    entity["documents"]
        .as_array()
        .map(|docs| {
            docs.iter()
                .filter_map(|d| d["originalFileName"].as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}

/// Serve a fresh in-memory backend on an ephemeral port; returns its base URL.
pub async fn spawn_server() -> String {
    let app = test_app();
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}
