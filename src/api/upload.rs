// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Multipart upload extraction for the inspection endpoints

use axum::http::StatusCode;
use axum_extra::extract::multipart::{MultipartError, MultipartRejection};
use axum_extra::extract::Multipart;
use image::RgbImage;
use tracing::debug;

use super::errors::ApiError;
use crate::vision::{decode_upload, ImageInfo};

/// One decoded image part of a multipart upload
#[derive(Debug)]
pub struct UploadedImage {
    pub filename: Option<String>,
    pub image: RgbImage,
    pub info: ImageInfo,
}

/// Turn a failed multipart extraction into a JSON `invalid_request`
pub fn accept_multipart(
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Multipart, ApiError> {
    multipart.map_err(|e| {
        ApiError::InvalidRequest(format!("expected multipart/form-data: {}", e.body_text()))
    })
}

/// Read and decode every part named `field`, in upload order
///
/// Parts with other names are drained and ignored. Fails on the first part
/// that is not a supported image, or once more than `max_images` parts arrive.
pub async fn read_images(
    multipart: &mut Multipart,
    field: &str,
    max_images: usize,
) -> Result<Vec<UploadedImage>, ApiError> {
    let mut images = Vec::new();

    while let Some(part) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(e, "malformed multipart body"))?
    {
        let name = part.name().map(str::to_owned);
        if name.as_deref() != Some(field) {
            debug!("Ignoring multipart field {:?}", name);
            continue;
        }

        if images.len() == max_images {
            return Err(ApiError::ValidationError {
                field: field.to_string(),
                message: format!("too many images, the limit is {} per request", max_images),
            });
        }

        let filename = part.file_name().map(str::to_owned);
        let bytes = part
            .bytes()
            .await
            .map_err(|e| multipart_error(e, &format!("failed to read {}", field)))?;

        let index = images.len();
        let (image, info) =
            decode_upload(&bytes).map_err(|e| ApiError::invalid_image(index, &e))?;

        debug!(
            "Decoded {} #{} ({:?}): {}x{} {:?}, {} bytes",
            field, index, filename, info.width, info.height, info.format, info.size_bytes
        );

        images.push(UploadedImage {
            filename,
            image,
            info,
        });
    }

    Ok(images)
}

fn multipart_error(err: MultipartError, context: &str) -> ApiError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::PayloadTooLarge(err.body_text())
    } else {
        ApiError::InvalidRequest(format!("{}: {}", context, err.body_text()))
    }
}

/// At least one image is required
pub fn require_some(images: &[UploadedImage], field: &str) -> Result<(), ApiError> {
    if images.is_empty() {
        return Err(ApiError::ValidationError {
            field: field.to_string(),
            message: format!("at least one image is required in '{}'", field),
        });
    }
    Ok(())
}
