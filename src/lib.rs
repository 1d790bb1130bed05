// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod api;
pub mod cli;
pub mod config;
pub mod inspection;
pub mod monitoring;
pub mod ocr;
pub mod version;
pub mod vision;

pub use api::{create_app, start_server, AppState};
pub use config::ServiceConfig;
pub use inspection::{InferenceError, InspectionTask};
pub use vision::{ModelConfig, ModelLoader, Quantization, VisionLanguageModel};
