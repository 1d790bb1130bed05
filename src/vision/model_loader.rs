// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Lazily loaded, process-wide vision-language model handle

use std::env;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::OnceCell;
use tracing::{info, warn};

use super::vlm_client::{VisionLanguageModel, VlmClient, VlmError};

pub const DEFAULT_MODEL_ID: &str = "llava-hf/llava-v1.6-mistral-7b-hf";
pub const DEFAULT_VLM_ENDPOINT: &str = "http://127.0.0.1:8081";

/// Weight precision of the checkpoint the sidecar serves
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Quantization {
    /// 4-bit NF4 with double quantization, fp16 compute
    #[default]
    Nf4,
    Int8,
    Fp16,
}

impl Quantization {
    /// GGUF-style suffix of the quantized checkpoint
    pub fn checkpoint_suffix(&self) -> &'static str {
        match self {
            Quantization::Nf4 => "Q4_K_M",
            Quantization::Int8 => "Q8_0",
            Quantization::Fp16 => "F16",
        }
    }

    pub fn bits(&self) -> u8 {
        match self {
            Quantization::Nf4 => 4,
            Quantization::Int8 => 8,
            Quantization::Fp16 => 16,
        }
    }
}

impl FromStr for Quantization {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "nf4" | "4bit" | "q4" => Ok(Quantization::Nf4),
            "int8" | "8bit" | "q8" => Ok(Quantization::Int8),
            "fp16" | "f16" | "none" => Ok(Quantization::Fp16),
            other => Err(format!(
                "unknown quantization '{}', expected nf4, int8 or fp16",
                other
            )),
        }
    }
}

impl fmt::Display for Quantization {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Quantization::Nf4 => "nf4",
            Quantization::Int8 => "int8",
            Quantization::Fp16 => "fp16",
        };
        f.write_str(name)
    }
}

/// Configuration for the vision-language model
#[derive(Debug, Clone)]
pub struct ModelConfig {
    /// Hugging Face id of the base checkpoint
    pub model_id: String,
    pub quantization: Quantization,
    /// Name the sidecar registered the model under, if it differs from the derived one
    pub served_model: Option<String>,
    /// Base URL of the OpenAI-compatible sidecar
    pub endpoint: String,
    pub max_new_tokens: u32,
    pub temperature: f32,
    pub request_timeout_secs: u64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            model_id: DEFAULT_MODEL_ID.to_string(),
            quantization: Quantization::default(),
            served_model: None,
            endpoint: DEFAULT_VLM_ENDPOINT.to_string(),
            max_new_tokens: 1000,
            temperature: 0.0,
            request_timeout_secs: 300,
        }
    }
}

impl ModelConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let quantization = match env::var("VLM_QUANTIZATION") {
            Ok(value) => value.parse().unwrap_or_else(|e| {
                warn!("{}; falling back to {}", e, defaults.quantization);
                defaults.quantization
            }),
            Err(_) => defaults.quantization,
        };

        Self {
            model_id: env::var("VLM_MODEL_ID").unwrap_or(defaults.model_id),
            quantization,
            served_model: env::var("VLM_SERVED_MODEL").ok().filter(|v| !v.is_empty()),
            endpoint: env::var("VLM_ENDPOINT").unwrap_or(defaults.endpoint),
            max_new_tokens: env::var("VLM_MAX_NEW_TOKENS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.max_new_tokens),
            temperature: env::var("VLM_TEMPERATURE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.temperature),
            request_timeout_secs: env::var("VLM_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.request_timeout_secs),
        }
    }

    /// Model name sent to the sidecar
    ///
    /// `llava-hf/llava-v1.6-mistral-7b-hf` with `Nf4` becomes
    /// `llava-v1.6-mistral-7b-hf-Q4_K_M`.
    pub fn served_model_name(&self) -> String {
        if let Some(ref name) = self.served_model {
            return name.clone();
        }
        let base = self
            .model_id
            .rsplit('/')
            .next()
            .unwrap_or(&self.model_id);
        format!("{}-{}", base, self.quantization.checkpoint_suffix())
    }
}

/// Holds the model handle, initialized on first use and reused thereafter
pub struct ModelLoader {
    config: ModelConfig,
    model: OnceCell<Arc<dyn VisionLanguageModel>>,
}

impl ModelLoader {
    pub fn new(config: ModelConfig) -> Self {
        Self {
            config,
            model: OnceCell::new(),
        }
    }

    /// Loader with an already initialized model
    pub fn with_model(config: ModelConfig, model: Arc<dyn VisionLanguageModel>) -> Self {
        Self {
            config,
            model: OnceCell::new_with(Some(model)),
        }
    }

    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    pub fn is_loaded(&self) -> bool {
        self.model.initialized()
    }

    /// Get the model, loading it if this is the first call
    ///
    /// Concurrent first callers wait on a single initialization. A failed
    /// load is not memoized; the next call tries again.
    pub async fn get_or_load(&self) -> Result<Arc<dyn VisionLanguageModel>, VlmError> {
        self.model
            .get_or_try_init(|| load_model(&self.config))
            .await
            .cloned()
    }
}

async fn load_model(config: &ModelConfig) -> Result<Arc<dyn VisionLanguageModel>, VlmError> {
    let served = config.served_model_name();
    info!(
        "Loading model {} ({} bit {}) from {}...",
        config.model_id,
        config.quantization.bits(),
        config.quantization,
        config.endpoint
    );

    let client = VlmClient::new(
        &config.endpoint,
        &served,
        Duration::from_secs(config.request_timeout_secs),
    )?
    .with_generation(config.max_new_tokens, config.temperature);

    if !client.health_check().await {
        return Err(VlmError::Unavailable(format!(
            "sidecar at {} is not healthy",
            config.endpoint
        )));
    }

    match client.list_models().await {
        Ok(models) if !models.is_empty() && !models.iter().any(|m| m == &served) => {
            warn!(
                "Sidecar does not list {} (serving: {}); requests will use it anyway",
                served,
                models.join(", ")
            );
        }
        Ok(_) => {}
        Err(e) => warn!("Could not list sidecar models: {}", e),
    }

    info!("Model loaded: {}", served);
    Ok(Arc::new(client))
}
