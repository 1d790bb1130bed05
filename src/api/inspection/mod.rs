// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Inspection API endpoints
//!
//! Provides POST /check-vegetation, /classify-switches and /process-transformer.

pub mod handler;
pub mod response;

pub use handler::{
    check_vegetation_handler, classify_switches_handler, process_transformer_handler,
};
pub use response::InspectionResponse;
