// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::http_server::AppState;
use crate::monitoring::PROMETHEUS_CONTENT_TYPE;
use crate::version;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RootResponse {
    pub service: String,
    pub version: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub model_loaded: bool,
    pub served_model: String,
    pub ocr_configured: bool,
}

/// GET /
pub async fn root_handler() -> Json<RootResponse> {
    Json(RootResponse {
        service: version::SERVICE_NAME.to_string(),
        version: version::VERSION.to_string(),
    })
}

/// GET /health - Liveness plus whether the model and OCR are ready
pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: version::VERSION.to_string(),
        model_loaded: state.model_loader.is_loaded(),
        served_model: state.model_loader.config().served_model_name(),
        ocr_configured: state.text_detector.is_some(),
    })
}

/// GET /metrics - Scraped by Prometheus
pub async fn metrics_handler(State(state): State<AppState>) -> Response {
    match state.metrics.render() {
        Ok(body) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, PROMETHEUS_CONTENT_TYPE)],
            body,
        )
            .into_response(),
        Err(e) => {
            warn!("Failed to render metrics: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
    }
}
