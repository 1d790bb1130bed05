// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Inspection response types

use serde::{Deserialize, Serialize};

/// Body returned by every inspection endpoint: the model's answer as text
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InspectionResponse {
    pub response: String,
}

impl InspectionResponse {
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            response: response.into(),
        }
    }
}
