// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use crate::inspection::InferenceError;
use crate::ocr::OcrError;
use crate::vision::{ImageError, VlmError};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ErrorResponse {
    pub error_type: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<HashMap<String, serde_json::Value>>,
}

#[derive(Debug, Clone)]
pub enum ApiError {
    InvalidRequest(String),
    ValidationError {
        field: String,
        message: String,
    },
    InvalidImage {
        index: usize,
        message: String,
    },
    PayloadTooLarge(String),
    ModelUnavailable(String),
    OcrUnavailable(String),
    OcrFailed(String),
    InferenceFailed(String),
    InternalError(String),
}

impl ApiError {
    pub fn to_response(&self) -> ErrorResponse {
        let (error_type, message, details) = match self {
            ApiError::InvalidRequest(msg) => ("invalid_request", msg.clone(), None),
            ApiError::ValidationError { field, message } => {
                let mut details = HashMap::new();
                details.insert(
                    "field".to_string(),
                    serde_json::Value::String(field.clone()),
                );
                ("validation_error", message.clone(), Some(details))
            }
            ApiError::InvalidImage { index, message } => {
                let mut details = HashMap::new();
                details.insert(
                    "index".to_string(),
                    serde_json::Value::Number((*index).into()),
                );
                ("invalid_image", message.clone(), Some(details))
            }
            ApiError::PayloadTooLarge(msg) => ("payload_too_large", msg.clone(), None),
            ApiError::ModelUnavailable(msg) => ("model_unavailable", msg.clone(), None),
            ApiError::OcrUnavailable(msg) => ("ocr_unavailable", msg.clone(), None),
            ApiError::OcrFailed(msg) => ("ocr_failed", msg.clone(), None),
            ApiError::InferenceFailed(msg) => ("inference_failed", msg.clone(), None),
            ApiError::InternalError(msg) => ("internal_error", msg.clone(), None),
        };

        ErrorResponse {
            error_type: error_type.to_string(),
            message,
            details,
        }
    }

    pub fn status_code(&self) -> u16 {
        match self {
            ApiError::InvalidRequest(_)
            | ApiError::ValidationError { .. }
            | ApiError::InvalidImage { .. } => 400,
            ApiError::PayloadTooLarge(_) => 413,
            ApiError::ModelUnavailable(_) | ApiError::OcrUnavailable(_) => 503,
            ApiError::OcrFailed(_) | ApiError::InferenceFailed(_) => 502,
            ApiError::InternalError(_) => 500,
        }
    }

    pub fn invalid_image(index: usize, err: &ImageError) -> Self {
        ApiError::InvalidImage {
            index,
            message: format!("Invalid image at position {}: {}", index, err),
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::InvalidRequest(msg) => write!(f, "Invalid request: {}", msg),
            ApiError::ValidationError { field, message } => {
                write!(f, "Validation error for {}: {}", field, message)
            }
            ApiError::InvalidImage { message, .. } => write!(f, "{}", message),
            ApiError::PayloadTooLarge(msg) => write!(f, "Payload too large: {}", msg),
            ApiError::ModelUnavailable(msg) => write!(f, "Model unavailable: {}", msg),
            ApiError::OcrUnavailable(msg) => write!(f, "OCR unavailable: {}", msg),
            ApiError::OcrFailed(msg) => write!(f, "OCR failed: {}", msg),
            ApiError::InferenceFailed(msg) => write!(f, "Inference failed: {}", msg),
            ApiError::InternalError(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl From<VlmError> for ApiError {
    fn from(err: VlmError) -> Self {
        match err {
            VlmError::Unavailable(_) => ApiError::ModelUnavailable(err.to_string()),
            VlmError::Request(ref e) if e.is_connect() || e.is_timeout() => {
                ApiError::ModelUnavailable(err.to_string())
            }
            VlmError::Conversation(_) => ApiError::InternalError(err.to_string()),
            VlmError::Request(_) | VlmError::Status { .. } | VlmError::EmptyResponse => {
                ApiError::InferenceFailed(err.to_string())
            }
        }
    }
}

impl From<OcrError> for ApiError {
    fn from(err: OcrError) -> Self {
        match err {
            OcrError::NotConfigured | OcrError::Credentials(_) => {
                ApiError::OcrUnavailable(err.to_string())
            }
            OcrError::Request(_) | OcrError::Status { .. } | OcrError::Api { .. } => {
                ApiError::OcrFailed(err.to_string())
            }
        }
    }
}

impl From<InferenceError> for ApiError {
    fn from(err: InferenceError) -> Self {
        match err {
            InferenceError::NoImages => ApiError::ValidationError {
                field: "files".to_string(),
                message: "at least one image is required".to_string(),
            },
            InferenceError::Image(e) => ApiError::InternalError(e.to_string()),
            InferenceError::Model(e) => e.into(),
            InferenceError::Ocr(e) => e.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self.to_response())).into_response()
    }
}
