// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use anyhow::Result;
use clap::Parser;
use pole_vision_node::{cli::Cli, config::ServiceConfig, start_server, version};
use std::env;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // A missing .env file is fine; the environment may already be set
    let env_loaded = dotenv::from_path(&cli.env_file).is_ok();

    if env::var("RUST_LOG").is_err() {
        env::set_var("RUST_LOG", "info");
    }
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    tracing::info!("🚀 Starting {} {}", version::SERVICE_NAME, version::VERSION);
    tracing::info!("📅 Build date: {}", version::BUILD_DATE);
    tracing::info!("Features: {}", version::FEATURES.join(", "));
    if env_loaded {
        tracing::info!("Loaded environment from {}", cli.env_file.display());
    }

    let config = cli.apply(ServiceConfig::from_env());
    tracing::info!(
        "Model: {} ({}), sidecar: {}, served as {}",
        config.model.model_id,
        config.model.quantization,
        config.model.endpoint,
        config.model.served_model_name()
    );

    start_server(config).await
}
