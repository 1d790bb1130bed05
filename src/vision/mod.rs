// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Vision processing module
//!
//! This module provides:
//! - Upload decoding and JPEG re-encoding
//! - Conversation templates with image placeholders
//! - The OpenAI-compatible VLM sidecar client
//! - The memoized model loader

pub mod conversation;
pub mod image_utils;
pub mod model_loader;
pub mod vlm_client;

pub use conversation::{
    ChatMessage, ContentPart, Conversation, ConversationError, PreparedImage, Role, Turn,
};
pub use image_utils::{decode_image_bytes, decode_upload, detect_format, ImageError, ImageInfo};
pub use model_loader::{ModelConfig, ModelLoader, Quantization};
pub use vlm_client::{VisionLanguageModel, VlmClient, VlmError};

#[cfg(test)]
pub use vlm_client::MockVisionLanguageModel;
