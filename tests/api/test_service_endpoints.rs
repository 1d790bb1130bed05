// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Service endpoint tests: GET /, /health, /metrics and router layers

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    response::Response,
};
use pole_vision_node::{
    api::{create_app, AppState, HealthResponse, RootResponse},
    version,
    vision::{ModelConfig, ModelLoader},
};
use tower::ServiceExt;

use crate::common::{multipart_body, multipart_content_type, FakeSidecar, Part};

async fn get(state: AppState, uri: &str) -> Response {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    create_app(state).oneshot(request).await.unwrap()
}

async fn body_bytes(response: Response) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec()
}

#[cfg(test)]
mod service_endpoint_tests {
    use super::*;

    #[tokio::test]
    async fn test_root_reports_service_and_version() {
        let response = get(AppState::new_for_test(), "/").await;
        assert_eq!(response.status(), StatusCode::OK);

        let root: RootResponse = serde_json::from_slice(&body_bytes(response).await).unwrap();
        assert_eq!(root.service, version::SERVICE_NAME);
        assert_eq!(root.version, version::VERSION);
    }

    #[tokio::test]
    async fn test_health_before_any_request() {
        let response = get(AppState::new_for_test(), "/health").await;
        assert_eq!(response.status(), StatusCode::OK);

        let health: HealthResponse =
            serde_json::from_slice(&body_bytes(response).await).unwrap();
        assert_eq!(health.status, "ok");
        assert!(!health.model_loaded);
        assert!(!health.ocr_configured);
        assert_eq!(health.served_model, "llava-v1.6-mistral-7b-hf-Q4_K_M");
    }

    #[tokio::test]
    async fn test_health_reports_model_loaded_after_first_request() {
        let sidecar = FakeSidecar::start("SIM").await;
        let state = AppState::new_for_test().with_model_loader(ModelLoader::new(ModelConfig {
            endpoint: sidecar.url.clone(),
            ..ModelConfig::default()
        }));

        let request = Request::builder()
            .method("POST")
            .uri("/check-vegetation")
            .header(header::CONTENT_TYPE, multipart_content_type())
            .body(Body::from(multipart_body(&[Part::png("files", "a.png")])))
            .unwrap();
        let response = create_app(state.clone()).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let health: HealthResponse =
            serde_json::from_slice(&body_bytes(get(state, "/health").await).await).unwrap();
        assert!(health.model_loaded);
    }

    #[tokio::test]
    async fn test_metrics_exposition() {
        let state = AppState::new_for_test();
        state.metrics.record_prediction();
        state.metrics.record_prediction();
        state.metrics.record_error();

        let response = get(state, "/metrics").await;
        assert_eq!(response.status(), StatusCode::OK);
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .unwrap()
            .to_str()
            .unwrap()
            .to_string();
        assert!(content_type.starts_with("text/plain"));

        let text = String::from_utf8(body_bytes(response).await).unwrap();
        assert!(text.contains("predictions_total 2"));
        assert!(text.contains("prediction_errors_total 1"));
        assert!(text.contains("# TYPE request_processing_seconds histogram"));
    }

    #[tokio::test]
    async fn test_cors_is_permissive() {
        let request = Request::builder()
            .uri("/health")
            .header(header::ORIGIN, "http://inspector.example")
            .body(Body::empty())
            .unwrap();

        let response = create_app(AppState::new_for_test())
            .oneshot(request)
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response
                .headers()
                .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
                .unwrap(),
            "*"
        );
    }

    #[tokio::test]
    async fn test_unknown_route_is_not_found() {
        let response = get(AppState::new_for_test(), "/v1/inference").await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_upload_over_body_limit_is_rejected() {
        let mut state = AppState::new_for_test();
        state.max_upload_bytes = 64;

        let request = Request::builder()
            .method("POST")
            .uri("/check-vegetation")
            .header(header::CONTENT_TYPE, multipart_content_type())
            .body(Body::from(multipart_body(&[
                Part::png("files", "a.png"),
                Part::png("files", "b.png"),
            ])))
            .unwrap();

        let metrics = state.metrics.clone();
        let response = create_app(state).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);

        let json: serde_json::Value =
            serde_json::from_slice(&body_bytes(response).await).unwrap();
        assert_eq!(json["error_type"], "payload_too_large");
        assert_eq!(metrics.errors(), 1);
        assert_eq!(metrics.observed_requests(), 1);
    }
}
