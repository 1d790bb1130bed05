// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Conversation templates with image placeholders
//!
//! A conversation is built once per task with `ContentPart::Image` slots, then
//! bound to the prepared images when the request is sent to the sidecar.

use image::RgbImage;
use serde::Serialize;
use thiserror::Error;

use super::image_utils::{encode_jpeg, to_data_url, ImageError, JPEG_QUALITY};

#[derive(Debug, Error, PartialEq)]
pub enum ConversationError {
    #[error("conversation has {slots} image slots but {images} images were supplied")]
    ImageCountMismatch { slots: usize, images: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ContentPart {
    Text(String),
    /// Placeholder filled by the next prepared image, in order
    Image,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Turn {
    pub role: Role,
    pub content: Vec<ContentPart>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Conversation {
    turns: Vec<Turn>,
}

/// An image already normalized to RGB and encoded for transport
#[derive(Debug, Clone)]
pub struct PreparedImage {
    pub jpeg: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

impl PreparedImage {
    pub fn from_rgb(image: &RgbImage) -> Result<Self, ImageError> {
        Ok(Self {
            jpeg: encode_jpeg(image, JPEG_QUALITY)?,
            width: image.width(),
            height: image.height(),
        })
    }

    pub fn data_url(&self) -> String {
        to_data_url(&self.jpeg)
    }
}

/// OpenAI-compatible chat message
#[derive(Debug, Clone, Serialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: serde_json::Value,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Single user turn: the instruction text followed by `image_count` image slots
    pub fn user_prompt(text: impl Into<String>, image_count: usize) -> Self {
        let mut content = Vec::with_capacity(image_count + 1);
        content.push(ContentPart::Text(text.into()));
        content.extend(std::iter::repeat(ContentPart::Image).take(image_count));

        Self {
            turns: vec![Turn {
                role: Role::User,
                content,
            }],
        }
    }

    pub fn push_turn(&mut self, turn: Turn) {
        self.turns.push(turn);
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn image_slots(&self) -> usize {
        self.turns
            .iter()
            .flat_map(|t| t.content.iter())
            .filter(|part| matches!(part, ContentPart::Image))
            .count()
    }

    /// All text parts joined with newlines, useful for logging
    pub fn text(&self) -> String {
        self.turns
            .iter()
            .flat_map(|t| t.content.iter())
            .filter_map(|part| match part {
                ContentPart::Text(text) => Some(text.as_str()),
                ContentPart::Image => None,
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Bind images to the placeholders and render OpenAI chat messages
    pub fn to_chat_messages(
        &self,
        images: &[PreparedImage],
    ) -> Result<Vec<ChatMessage>, ConversationError> {
        let slots = self.image_slots();
        if slots != images.len() {
            return Err(ConversationError::ImageCountMismatch {
                slots,
                images: images.len(),
            });
        }

        let mut next_image = images.iter();
        let messages = self
            .turns
            .iter()
            .map(|turn| {
                let parts: Vec<serde_json::Value> = turn
                    .content
                    .iter()
                    .filter_map(|part| match part {
                        ContentPart::Text(text) => {
                            Some(serde_json::json!({"type": "text", "text": text}))
                        }
                        ContentPart::Image => next_image.next().map(|img| {
                            serde_json::json!({
                                "type": "image_url",
                                "image_url": {"url": img.data_url()}
                            })
                        }),
                    })
                    .collect();

                ChatMessage {
                    role: turn.role.as_str().to_string(),
                    content: serde_json::Value::Array(parts),
                }
            })
            .collect();

        Ok(messages)
    }
}
