// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Inspection endpoint handlers

use axum::{extract::State, Json};
use axum_extra::extract::multipart::MultipartRejection;
use axum_extra::extract::Multipart;
use image::RgbImage;
use tracing::{info, warn};

use super::response::InspectionResponse;
use crate::api::errors::ApiError;
use crate::api::http_server::AppState;
use crate::api::upload::{accept_multipart, read_images, require_some};
use crate::inspection::{self, InspectionTask};

/// POST /check-vegetation - Is vegetation touching the pole, wires or transformer?
///
/// # Request
/// `multipart/form-data` with one or more `files` parts, all photos of the same pole.
///
/// # Response
/// `{"response": "SIM" | "NÃO"}` (free text as produced by the model)
///
/// # Errors
/// - 400 Bad Request: not multipart, no images, too many images, or an undecodable image
/// - 413 Payload Too Large: body over the upload limit
/// - 503 Service Unavailable: model sidecar not reachable
/// - 502 Bad Gateway: generation failed
pub async fn check_vegetation_handler(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<InspectionResponse>, ApiError> {
    let _timer = state.metrics.start_request_timer();

    let result = async {
        let mut multipart = accept_multipart(multipart)?;
        let images = pole_images(&state, &mut multipart).await?;
        let model = state.model_loader.get_or_load().await?;
        Ok::<_, ApiError>(inspection::check_vegetation(model.as_ref(), &images).await?)
    }
    .await;

    finish(&state, InspectionTask::Vegetation, result)
}

/// POST /classify-switches - Which sectionalizing switch is installed?
///
/// # Request
/// `multipart/form-data` with one or more `files` parts, all photos of the same pole.
///
/// # Response
/// `{"response": "Fusível" | "Fusível Religadora" | "Faca" | "A gás" | "null"}`
pub async fn classify_switches_handler(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<InspectionResponse>, ApiError> {
    let _timer = state.metrics.start_request_timer();

    let result = async {
        let mut multipart = accept_multipart(multipart)?;
        let images = pole_images(&state, &mut multipart).await?;
        let model = state.model_loader.get_or_load().await?;
        Ok::<_, ApiError>(inspection::classify_switches(model.as_ref(), &images).await?)
    }
    .await;

    finish(&state, InspectionTask::Switches, result)
}

/// POST /process-transformer - Fill the nameplate form from a photo of the plate
///
/// # Request
/// `multipart/form-data` with exactly one `file` part.
///
/// # Response
/// `{"response": "<JSON-like form text>"}` with newlines and backslashes removed
///
/// # Errors
/// - 400 Bad Request: not multipart, or a missing, repeated or undecodable `file`
/// - 413 Payload Too Large: body over the upload limit
/// - 503 Service Unavailable: OCR credentials missing or model sidecar not reachable
/// - 502 Bad Gateway: OCR or generation failed
pub async fn process_transformer_handler(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<InspectionResponse>, ApiError> {
    let _timer = state.metrics.start_request_timer();

    let result = async {
        let mut multipart = accept_multipart(multipart)?;
        let mut uploads = read_images(&mut multipart, "file", 1).await?;
        require_some(&uploads, "file")?;
        let nameplate = uploads.swap_remove(0).image;

        let ocr = state.text_detector.clone().ok_or_else(|| {
            ApiError::OcrUnavailable(
                "set GOOGLE_VISION_API_KEY or GOOGLE_APPLICATION_CREDENTIALS".to_string(),
            )
        })?;
        let model = state.model_loader.get_or_load().await?;

        Ok::<_, ApiError>(
            inspection::extract_transformer_nameplate(model.as_ref(), ocr.as_ref(), &nameplate)
                .await?,
        )
    }
    .await;

    finish(&state, InspectionTask::TransformerNameplate, result)
}

async fn pole_images(
    state: &AppState,
    multipart: &mut Multipart,
) -> Result<Vec<RgbImage>, ApiError> {
    let uploads = read_images(multipart, "files", state.max_images_per_request).await?;
    require_some(&uploads, "files")?;
    Ok(uploads.into_iter().map(|u| u.image).collect())
}

fn finish(
    state: &AppState,
    task: InspectionTask,
    result: Result<String, ApiError>,
) -> Result<Json<InspectionResponse>, ApiError> {
    match result {
        Ok(answer) => {
            state.metrics.record_prediction();
            info!("{} request complete", task.as_str());
            Ok(Json(InspectionResponse::new(answer)))
        }
        Err(e) => {
            state.metrics.record_error();
            warn!("{} request failed: {}", task.as_str(), e);
            Err(e)
        }
    }
}
