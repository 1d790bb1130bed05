// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! VLM sidecar client for vision tasks via OpenAI-compatible API

use async_trait::async_trait;
use reqwest::Client;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, info};

use super::conversation::{ChatMessage, Conversation, ConversationError, PreparedImage};

#[derive(Debug, Error)]
pub enum VlmError {
    #[error("sidecar request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("sidecar returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("sidecar returned no choices")]
    EmptyResponse,

    #[error(transparent)]
    Conversation(#[from] ConversationError),

    #[error("model unavailable: {0}")]
    Unavailable(String),
}

/// A loaded vision-language model that can answer a conversation about images
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait VisionLanguageModel: Send + Sync {
    /// Run generation and return only the newly generated text, trimmed
    async fn generate(
        &self,
        conversation: &Conversation,
        images: &[PreparedImage],
    ) -> Result<String, VlmError>;

    /// Name of the model variant answering requests
    fn model_name(&self) -> String;
}

// --- OpenAI-compatible serde structs ---

#[derive(serde::Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(serde::Deserialize)]
struct ChatUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

#[derive(serde::Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
    usage: Option<ChatUsage>,
}

#[derive(serde::Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(serde::Deserialize)]
struct ChatResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(serde::Deserialize)]
struct ModelList {
    data: Vec<ModelEntry>,
}

#[derive(serde::Deserialize)]
struct ModelEntry {
    id: String,
}

/// Client for calling a VLM sidecar service via OpenAI-compatible API
pub struct VlmClient {
    client: Client,
    endpoint: String,
    model_name: String,
    max_tokens: u32,
    temperature: f32,
}

impl VlmClient {
    /// Create a new VLM client
    pub fn new(endpoint: &str, model_name: &str, timeout: Duration) -> Result<Self, VlmError> {
        let client = Client::builder().timeout(timeout).build()?;

        let endpoint = endpoint.trim_end_matches('/').to_string();
        info!(
            "VLM client configured: endpoint={}, model={}",
            endpoint, model_name
        );

        Ok(Self {
            client,
            endpoint,
            model_name: model_name.to_string(),
            max_tokens: 1000,
            temperature: 0.0,
        })
    }

    /// Override the generation limits
    pub fn with_generation(mut self, max_tokens: u32, temperature: f32) -> Self {
        self.max_tokens = max_tokens;
        self.temperature = temperature;
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Check if the VLM sidecar is healthy
    pub async fn health_check(&self) -> bool {
        match self
            .client
            .get(format!("{}/health", self.endpoint))
            .send()
            .await
        {
            Ok(resp) => resp.status().is_success(),
            Err(e) => {
                debug!("VLM health check failed: {}", e);
                false
            }
        }
    }

    /// List the model ids the sidecar is serving
    pub async fn list_models(&self) -> Result<Vec<String>, VlmError> {
        let response = self
            .client
            .get(format!("{}/v1/models", self.endpoint))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(VlmError::Status { status, body });
        }

        let list: ModelList = response.json().await?;
        Ok(list.data.into_iter().map(|m| m.id).collect())
    }
}

#[async_trait]
impl VisionLanguageModel for VlmClient {
    async fn generate(
        &self,
        conversation: &Conversation,
        images: &[PreparedImage],
    ) -> Result<String, VlmError> {
        let start = Instant::now();

        let request = ChatRequest {
            model: self.model_name.clone(),
            messages: conversation.to_chat_messages(images)?,
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        };

        let url = format!("{}/v1/chat/completions", self.endpoint);
        debug!("VLM generate POST {} ({} images)", url, images.len());

        let response = self.client.post(&url).json(&request).send().await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(VlmError::Status { status, body });
        }

        let chat_response: ChatResponse = response.json().await?;
        let text = chat_response
            .choices
            .into_iter()
            .next()
            .ok_or(VlmError::EmptyResponse)?
            .message
            .content
            .unwrap_or_default();

        if let Some(usage) = chat_response.usage {
            debug!(
                "VLM usage: prompt_tokens={}, completion_tokens={}",
                usage.prompt_tokens, usage.completion_tokens
            );
        }
        info!(
            "VLM generation complete: {} chars, {}ms (model: {})",
            text.len(),
            start.elapsed().as_millis(),
            self.model_name
        );

        Ok(text.trim().to_string())
    }

    fn model_name(&self) -> String {
        self.model_name.clone()
    }
}
