// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Service configuration loaded from environment variables

use std::env;

use crate::ocr::OcrConfig;
use crate::vision::ModelConfig;

pub const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:8000";

/// Top-level configuration for the inspection service
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Address the HTTP server binds to
    pub listen_addr: String,
    /// Upper bound on images accepted in one multi-image request
    pub max_images_per_request: usize,
    /// Upper bound on the whole multipart body
    pub max_upload_bytes: usize,
    /// Load the model at startup instead of on the first request
    pub preload_model: bool,
    pub model: ModelConfig,
    pub ocr: OcrConfig,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            listen_addr: DEFAULT_LISTEN_ADDR.to_string(),
            max_images_per_request: 8,
            max_upload_bytes: 50 * 1024 * 1024,
            preload_model: false,
            model: ModelConfig::default(),
            ocr: OcrConfig::default(),
        }
    }
}

impl ServiceConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            listen_addr: env::var("LISTEN_ADDR").unwrap_or(defaults.listen_addr),
            max_images_per_request: env::var("MAX_IMAGES_PER_REQUEST")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|n: &usize| *n > 0)
                .unwrap_or(defaults.max_images_per_request),
            max_upload_bytes: env::var("MAX_UPLOAD_BYTES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.max_upload_bytes),
            preload_model: env::var("PRELOAD_MODEL")
                .map(|v| v.to_lowercase() == "true" || v == "1")
                .unwrap_or(defaults.preload_model),
            model: ModelConfig::from_env(),
            ocr: OcrConfig::from_env(),
        }
    }
}
