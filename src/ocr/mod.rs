// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Cloud OCR for transformer nameplates
//!
//! Text detection is delegated to the Google Cloud Vision `images:annotate`
//! REST API. Only the full-text annotation is used.

pub mod credentials;
pub mod google_vision;

use async_trait::async_trait;
use std::env;
use std::path::PathBuf;
use thiserror::Error;

pub use credentials::{ServiceAccountKey, ServiceAccountTokenSource};
pub use google_vision::{GoogleVisionClient, DEFAULT_VISION_ENDPOINT};

#[derive(Debug, Error)]
pub enum OcrError {
    #[error("OCR credentials are not configured")]
    NotConfigured,

    #[error("invalid OCR credentials: {0}")]
    Credentials(String),

    #[error("OCR request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("OCR service returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("OCR API error {code}: {message}")]
    Api { code: i32, message: String },
}

/// Something that can find the text printed in an image
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TextDetector: Send + Sync {
    /// Full detected text of a JPEG image, or an empty string when none is found
    async fn detect_text(&self, jpeg: &[u8]) -> Result<String, OcrError>;
}

/// Configuration for the Cloud Vision client
#[derive(Debug, Clone)]
pub struct OcrConfig {
    /// API key, sent as the `key` query parameter
    pub api_key: Option<String>,
    /// Service-account JSON key file
    pub credentials_path: Option<PathBuf>,
    pub endpoint: String,
    pub timeout_secs: u64,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            credentials_path: None,
            endpoint: DEFAULT_VISION_ENDPOINT.to_string(),
            timeout_secs: 30,
        }
    }
}

impl OcrConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            api_key: env::var("GOOGLE_VISION_API_KEY")
                .ok()
                .filter(|v| !v.is_empty()),
            credentials_path: env::var("GOOGLE_APPLICATION_CREDENTIALS")
                .ok()
                .filter(|v| !v.is_empty())
                .map(PathBuf::from),
            endpoint: env::var("GOOGLE_VISION_ENDPOINT").unwrap_or(defaults.endpoint),
            timeout_secs: env::var("GOOGLE_VISION_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.timeout_secs),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some() || self.credentials_path.is_some()
    }
}
