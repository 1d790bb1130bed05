// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Inspection routines for utility-pole photos
//!
//! Each routine builds its fixed conversation, binds the uploaded images and
//! asks the vision-language model for an answer:
//! - vegetation encroachment (SIM / NÃO)
//! - sectionalizing switch type
//! - transformer nameplate form, seeded with cloud OCR text

pub mod prompts;

use image::RgbImage;
use thiserror::Error;
use tracing::{debug, info};

use crate::ocr::{OcrError, TextDetector};
use crate::vision::{Conversation, ImageError, PreparedImage, VisionLanguageModel, VlmError};

#[derive(Debug, Error)]
pub enum InferenceError {
    #[error("no images were supplied")]
    NoImages,

    #[error(transparent)]
    Image(#[from] ImageError),

    #[error(transparent)]
    Model(#[from] VlmError),

    #[error(transparent)]
    Ocr(#[from] OcrError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InspectionTask {
    Vegetation,
    Switches,
    TransformerNameplate,
}

impl InspectionTask {
    pub fn as_str(&self) -> &'static str {
        match self {
            InspectionTask::Vegetation => "vegetation",
            InspectionTask::Switches => "switches",
            InspectionTask::TransformerNameplate => "transformer_nameplate",
        }
    }
}

/// Does vegetation touch the pole, wires or transformer in these photos of one pole?
pub async fn check_vegetation(
    model: &dyn VisionLanguageModel,
    images: &[RgbImage],
) -> Result<String, InferenceError> {
    ask_about_pole(model, InspectionTask::Vegetation, prompts::VEGETATION_PROMPT, images).await
}

/// Which sectionalizing switch is installed on the pole in these photos?
pub async fn classify_switches(
    model: &dyn VisionLanguageModel,
    images: &[RgbImage],
) -> Result<String, InferenceError> {
    ask_about_pole(model, InspectionTask::Switches, prompts::SWITCH_PROMPT, images).await
}

/// Fill the transformer nameplate form from a photo of the plate
///
/// The plate is sent to OCR first and the detected text is spliced into the
/// form instructions. Newlines and backslashes are stripped from the answer.
pub async fn extract_transformer_nameplate(
    model: &dyn VisionLanguageModel,
    ocr: &dyn TextDetector,
    image: &RgbImage,
) -> Result<String, InferenceError> {
    let prepared = PreparedImage::from_rgb(image)?;

    let ocr_text = ocr.detect_text(&prepared.jpeg).await?;
    debug!("Nameplate OCR text: {:?}", ocr_text);

    let conversation = Conversation::user_prompt(prompts::nameplate_prompt(&ocr_text), 1);
    let answer = model.generate(&conversation, &[prepared]).await?;

    info!(
        "{} answered: {} chars",
        InspectionTask::TransformerNameplate.as_str(),
        answer.len()
    );
    Ok(clean_nameplate_output(&answer))
}

/// Drop line breaks and escape characters from the model's JSON-ish answer
pub fn clean_nameplate_output(answer: &str) -> String {
    answer.replace('\n', "").replace('\\', "")
}

async fn ask_about_pole(
    model: &dyn VisionLanguageModel,
    task: InspectionTask,
    prompt: &str,
    images: &[RgbImage],
) -> Result<String, InferenceError> {
    if images.is_empty() {
        return Err(InferenceError::NoImages);
    }

    let prepared = images
        .iter()
        .map(PreparedImage::from_rgb)
        .collect::<Result<Vec<_>, _>>()?;

    let conversation = Conversation::user_prompt(prompt, prepared.len());
    let answer = model.generate(&conversation, &prepared).await?;

    info!("{} answered: {:?} ({} images)", task.as_str(), answer, images.len());
    Ok(answer.trim().to_string())
}
