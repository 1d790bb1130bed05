// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use anyhow::{Context, Result};
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::{net::SocketAddr, sync::Arc};
use tokio::signal;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};

use super::handlers::{health_handler, metrics_handler, root_handler};
use super::inspection::{
    check_vegetation_handler, classify_switches_handler, process_transformer_handler,
};
use crate::config::ServiceConfig;
use crate::monitoring::ServiceMetrics;
use crate::ocr::{GoogleVisionClient, TextDetector};
use crate::vision::{ModelConfig, ModelLoader};

/// Shared state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub model_loader: Arc<ModelLoader>,
    /// Absent when no OCR credentials are configured
    pub text_detector: Option<Arc<dyn TextDetector>>,
    pub metrics: ServiceMetrics,
    pub max_images_per_request: usize,
    pub max_upload_bytes: usize,
}

impl AppState {
    pub fn new(config: &ServiceConfig) -> Result<Self> {
        let text_detector: Option<Arc<dyn TextDetector>> = if config.ocr.is_configured() {
            match GoogleVisionClient::new(&config.ocr) {
                Ok(client) => {
                    info!("✅ Cloud Vision OCR configured ({})", client.endpoint());
                    Some(Arc::new(client))
                }
                Err(e) => {
                    warn!("⚠️ Failed to configure Cloud Vision OCR: {}", e);
                    None
                }
            }
        } else {
            warn!(
                "⚠️ GOOGLE_APPLICATION_CREDENTIALS is not set; /process-transformer will return 503"
            );
            None
        };

        Ok(Self {
            model_loader: Arc::new(ModelLoader::new(config.model.clone())),
            text_detector,
            metrics: ServiceMetrics::new()?,
            max_images_per_request: config.max_images_per_request,
            max_upload_bytes: config.max_upload_bytes,
        })
    }

    /// State with no reachable model and no OCR
    pub fn new_for_test() -> Self {
        let defaults = ServiceConfig::default();
        let model = ModelConfig {
            endpoint: "http://127.0.0.1:9".to_string(),
            request_timeout_secs: 1,
            ..ModelConfig::default()
        };

        Self {
            model_loader: Arc::new(ModelLoader::new(model)),
            text_detector: None,
            metrics: ServiceMetrics::new().expect("metric registration"),
            max_images_per_request: defaults.max_images_per_request,
            max_upload_bytes: defaults.max_upload_bytes,
        }
    }

    pub fn with_model_loader(mut self, loader: ModelLoader) -> Self {
        self.model_loader = Arc::new(loader);
        self
    }

    pub fn with_text_detector(mut self, detector: Arc<dyn TextDetector>) -> Self {
        self.text_detector = Some(detector);
        self
    }
}

pub fn create_app(state: AppState) -> Router {
    let body_limit = state.max_upload_bytes;

    Router::new()
        .route("/", get(root_handler))
        .route("/health", get(health_handler))
        .route("/metrics", get(metrics_handler))
        .route("/check-vegetation", post(check_vegetation_handler))
        .route("/classify-switches", post(classify_switches_handler))
        .route("/process-transformer", post(process_transformer_handler))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn start_server(config: ServiceConfig) -> Result<()> {
    let state = AppState::new(&config)?;

    if config.preload_model {
        info!("🧠 Preloading vision-language model...");
        if let Err(e) = state.model_loader.get_or_load().await {
            warn!("⚠️ Model preload failed, will retry on first request: {}", e);
        }
    }

    let addr: SocketAddr = config
        .listen_addr
        .parse()
        .with_context(|| format!("invalid LISTEN_ADDR '{}'", config.listen_addr))?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;

    info!("API server listening on {}", listener.local_addr()?);

    axum::serve(listener, create_app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("API server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl-C: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
