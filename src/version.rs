// Version information for the pole vision node

/// Service name reported on `/`
pub const SERVICE_NAME: &str = "pole-vision-node";

/// Full version string with feature description
pub const VERSION: &str = "v0.1.0-pole-inspection-2026-10-16";

/// Semantic version number
pub const VERSION_NUMBER: &str = env!("CARGO_PKG_VERSION");

/// Build date
pub const BUILD_DATE: &str = "2026-10-16";

/// Supported features in this version
pub const FEATURES: &[&str] = &[
    "vegetation-check",
    "switch-classification",
    "transformer-nameplate-ocr",
    "openai-compatible-vlm-sidecar",
    "quantized-checkpoints",
    "cloud-vision-ocr",
    "prometheus-metrics",
];
