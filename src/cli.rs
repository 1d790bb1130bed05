// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use clap::Parser;
use std::path::PathBuf;

use crate::config::ServiceConfig;

/// Pole Vision Node
#[derive(Parser, Debug)]
#[command(name = "pole-vision-node")]
#[command(version)]
#[command(about = "HTTP inference service for utility-pole inspection photos", long_about = None)]
pub struct Cli {
    /// Address to listen on (overrides LISTEN_ADDR)
    #[arg(long, env = "LISTEN_ADDR")]
    pub listen_addr: Option<String>,

    /// Load the vision-language model at startup instead of on the first request
    #[arg(long)]
    pub preload: bool,

    /// Environment file to load before reading configuration
    #[arg(long, default_value = ".env")]
    pub env_file: PathBuf,
}

impl Cli {
    /// Apply command-line overrides on top of the environment configuration
    pub fn apply(&self, mut config: ServiceConfig) -> ServiceConfig {
        if let Some(ref addr) = self.listen_addr {
            config.listen_addr = addr.clone();
        }
        if self.preload {
            config.preload_model = true;
        }
        config
    }
}
