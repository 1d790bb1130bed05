// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Shared helpers: fake VLM sidecar, fake Cloud Vision API, multipart bodies
#![allow(dead_code)]

use axum::{
    extract::{Form, Query, State},
    http::{header, HeaderMap, StatusCode, Uri},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc, Mutex,
};

pub const BOUNDARY: &str = "pole-vision-test-boundary";

// 1x1 PNG
const TINY_PNG_BASE64: &str =
    "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mP8z8DwHwAFBQIAX8jx0gAAAABJRU5ErkJggg==";

pub fn tiny_png() -> Vec<u8> {
    STANDARD.decode(TINY_PNG_BASE64).unwrap()
}

/// A `multipart/form-data` part: field name, file name, bytes
pub struct Part<'a> {
    pub name: &'a str,
    pub filename: &'a str,
    pub data: Vec<u8>,
}

impl<'a> Part<'a> {
    pub fn png(name: &'a str, filename: &'a str) -> Self {
        Self {
            name,
            filename,
            data: tiny_png(),
        }
    }
}

pub fn multipart_content_type() -> String {
    format!("multipart/form-data; boundary={}", BOUNDARY)
}

pub fn multipart_body(parts: &[Part<'_>]) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        body.extend_from_slice(
            format!(
                "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
                part.name, part.filename
            )
            .as_bytes(),
        );
        body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
        body.extend_from_slice(&part.data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}

async fn serve(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

// --- Fake OpenAI-compatible VLM sidecar ---

#[derive(Clone)]
struct SidecarState {
    answer: String,
    chat_status: StatusCode,
    served_model: String,
    requests: Arc<Mutex<Vec<Value>>>,
    health_hits: Arc<AtomicUsize>,
}

pub struct FakeSidecar {
    pub url: String,
    requests: Arc<Mutex<Vec<Value>>>,
    health_hits: Arc<AtomicUsize>,
}

impl FakeSidecar {
    pub async fn start(answer: &str) -> Self {
        Self::start_with_status(answer, StatusCode::OK).await
    }

    pub async fn start_with_status(answer: &str, chat_status: StatusCode) -> Self {
        let requests = Arc::new(Mutex::new(Vec::new()));
        let health_hits = Arc::new(AtomicUsize::new(0));
        let state = SidecarState {
            answer: answer.to_string(),
            chat_status,
            served_model: "llava-v1.6-mistral-7b-hf-Q4_K_M".to_string(),
            requests: requests.clone(),
            health_hits: health_hits.clone(),
        };

        let router = Router::new()
            .route("/health", get(sidecar_health))
            .route("/v1/models", get(sidecar_models))
            .route("/v1/chat/completions", post(sidecar_chat))
            .with_state(state);

        Self {
            url: serve(router).await,
            requests,
            health_hits,
        }
    }

    /// Every chat completion body received so far
    pub fn requests(&self) -> Vec<Value> {
        self.requests.lock().unwrap().clone()
    }

    pub fn health_hits(&self) -> usize {
        self.health_hits.load(Ordering::SeqCst)
    }
}

async fn sidecar_health(State(state): State<SidecarState>) -> impl IntoResponse {
    state.health_hits.fetch_add(1, Ordering::SeqCst);
    Json(json!({"status": "ok"}))
}

async fn sidecar_models(State(state): State<SidecarState>) -> impl IntoResponse {
    Json(json!({"object": "list", "data": [{"id": state.served_model, "object": "model"}]}))
}

async fn sidecar_chat(
    State(state): State<SidecarState>,
    Json(body): Json<Value>,
) -> impl IntoResponse {
    state.requests.lock().unwrap().push(body);

    if !state.chat_status.is_success() {
        return (state.chat_status, "sidecar exploded").into_response();
    }

    Json(json!({
        "choices": [{"index": 0, "message": {"role": "assistant", "content": state.answer}}],
        "usage": {"prompt_tokens": 42, "completion_tokens": 7}
    }))
    .into_response()
}

// --- Fake Cloud Vision API ---

#[derive(Clone)]
struct VisionState {
    text: String,
    calls: Arc<Mutex<Vec<VisionCall>>>,
}

#[derive(Debug, Clone)]
pub struct VisionCall {
    pub path: String,
    pub key: Option<String>,
    pub authorization: Option<String>,
    pub body: Value,
}

pub struct FakeVisionApi {
    pub url: String,
    calls: Arc<Mutex<Vec<VisionCall>>>,
}

impl FakeVisionApi {
    pub async fn start(text: &str) -> Self {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let state = VisionState {
            text: text.to_string(),
            calls: calls.clone(),
        };

        let router = Router::new().fallback(vision_annotate).with_state(state);

        Self {
            url: serve(router).await,
            calls,
        }
    }

    pub fn calls(&self) -> Vec<VisionCall> {
        self.calls.lock().unwrap().clone()
    }
}

async fn vision_annotate(
    State(state): State<VisionState>,
    uri: Uri,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
    Json(body): Json<Value>,
) -> impl IntoResponse {
    let authorization = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned);

    state.calls.lock().unwrap().push(VisionCall {
        path: uri.path().to_string(),
        key: query.get("key").cloned(),
        authorization,
        body,
    });

    Json(json!({
        "responses": [{
            "textAnnotations": [
                {"locale": "pt", "description": state.text},
                {"description": "WEG"}
            ]
        }]
    }))
}

// --- Fake OAuth token endpoint ---

#[derive(Clone)]
struct TokenState {
    expires_in: i64,
    grants: Arc<Mutex<Vec<HashMap<String, String>>>>,
}

pub struct FakeTokenServer {
    pub url: String,
    grants: Arc<Mutex<Vec<HashMap<String, String>>>>,
}

impl FakeTokenServer {
    pub async fn start() -> Self {
        Self::start_with_expiry(3600).await
    }

    /// Issues tokens that expire `expires_in` seconds after the exchange
    pub async fn start_with_expiry(expires_in: i64) -> Self {
        let grants = Arc::new(Mutex::new(Vec::new()));
        let router = Router::new()
            .route("/token", post(token_exchange))
            .with_state(TokenState {
                expires_in,
                grants: grants.clone(),
            });

        Self {
            url: format!("{}/token", serve(router).await),
            grants,
        }
    }

    /// Form bodies of every token exchange so far
    pub fn grants(&self) -> Vec<HashMap<String, String>> {
        self.grants.lock().unwrap().clone()
    }
}

async fn token_exchange(
    State(state): State<TokenState>,
    Form(form): Form<HashMap<String, String>>,
) -> impl IntoResponse {
    state.grants.lock().unwrap().push(form);
    Json(json!({
        "access_token": "ya29.test-token",
        "expires_in": state.expires_in,
        "token_type": "Bearer"
    }))
}
