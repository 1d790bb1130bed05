// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Google Cloud Vision `images:annotate` client (TEXT_DETECTION)

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, info};

use super::credentials::{ServiceAccountKey, ServiceAccountTokenSource};
use super::{OcrConfig, OcrError, TextDetector};

pub const DEFAULT_VISION_ENDPOINT: &str = "https://vision.googleapis.com";

// --- Cloud Vision REST serde structs ---

#[derive(Serialize)]
struct AnnotateRequest {
    requests: Vec<AnnotateImageRequest>,
}

#[derive(Serialize)]
struct AnnotateImageRequest {
    image: ImageContent,
    features: Vec<Feature>,
}

#[derive(Serialize)]
struct ImageContent {
    content: String,
}

#[derive(Serialize)]
struct Feature {
    #[serde(rename = "type")]
    feature_type: &'static str,
}

#[derive(Debug, Deserialize)]
struct AnnotateResponse {
    #[serde(default)]
    responses: Vec<AnnotateImageResponse>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AnnotateImageResponse {
    #[serde(default)]
    text_annotations: Vec<EntityAnnotation>,
    #[serde(default)]
    error: Option<RpcStatus>,
}

#[derive(Debug, Deserialize)]
struct EntityAnnotation {
    #[serde(default)]
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RpcStatus {
    #[serde(default)]
    code: i32,
    #[serde(default)]
    message: String,
}

enum VisionAuth {
    ApiKey(String),
    ServiceAccount(ServiceAccountTokenSource),
}

/// Client for the Cloud Vision text detection endpoint
pub struct GoogleVisionClient {
    client: Client,
    endpoint: String,
    auth: VisionAuth,
}

impl GoogleVisionClient {
    /// Build a client from config; an API key takes precedence over a service-account file
    pub fn new(config: &OcrConfig) -> Result<Self, OcrError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        let auth = match (&config.api_key, &config.credentials_path) {
            (Some(key), _) => {
                info!("Cloud Vision auth: API key");
                VisionAuth::ApiKey(key.clone())
            }
            (None, Some(path)) => {
                info!(
                    "GOOGLE_APPLICATION_CREDENTIALS is set to: {}",
                    path.display()
                );
                let key = ServiceAccountKey::from_file(path)?;
                VisionAuth::ServiceAccount(ServiceAccountTokenSource::new(key, client.clone())?)
            }
            (None, None) => return Err(OcrError::NotConfigured),
        };

        Ok(Self {
            client,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            auth,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl TextDetector for GoogleVisionClient {
    async fn detect_text(&self, jpeg: &[u8]) -> Result<String, OcrError> {
        let start = Instant::now();

        let body = AnnotateRequest {
            requests: vec![AnnotateImageRequest {
                image: ImageContent {
                    content: STANDARD.encode(jpeg),
                },
                features: vec![Feature {
                    feature_type: "TEXT_DETECTION",
                }],
            }],
        };

        let url = format!("{}/v1/images:annotate", self.endpoint);
        debug!("Cloud Vision POST {} ({} bytes)", url, jpeg.len());

        let request = self.client.post(&url).json(&body);
        let request = match &self.auth {
            VisionAuth::ApiKey(key) => request.query(&[("key", key.as_str())]),
            VisionAuth::ServiceAccount(source) => request.bearer_auth(source.access_token().await?),
        };

        let response = request.send().await?;
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(OcrError::Status { status, body });
        }

        let annotations: AnnotateResponse = response.json().await?;
        let text = full_text(annotations)?;

        info!(
            "OCR complete: {} chars, {}ms",
            text.len(),
            start.elapsed().as_millis()
        );
        Ok(text)
    }
}

/// The first annotation holds the whole detected text block
fn full_text(response: AnnotateResponse) -> Result<String, OcrError> {
    let Some(first) = response.responses.into_iter().next() else {
        return Ok(String::new());
    };

    if let Some(status) = first.error {
        if status.code != 0 {
            return Err(OcrError::Api {
                code: status.code,
                message: status.message,
            });
        }
    }

    Ok(first
        .text_annotations
        .into_iter()
        .next()
        .and_then(|a| a.description)
        .unwrap_or_default())
}
