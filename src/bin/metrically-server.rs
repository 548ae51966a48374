// ABOUTME: Server binary for the Metrically KPI generation API
// ABOUTME: Loads configuration, initializes logging, and serves HTTP until shutdown
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Metrically

//! # Metrically API Server Binary
//!
//! Starts the HTTP API. Provider credentials are optional: without them the
//! server still starts and reports generation as unavailable.

use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use metrically_server::{config::ServerConfig, logging, resources::ServerResources, server};
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "metrically-server")]
#[command(about = "Metrically API - AI-generated KPI systems for startups")]
pub struct Args {
    /// Override HTTP port
    #[arg(long)]
    http_port: Option<u16>,

    /// Override bind address
    #[arg(long)]
    host: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    logging::init_from_env()?;

    let mut config = ServerConfig::from_env()?;
    if let Some(http_port) = args.http_port {
        config.http.port = http_port;
    }
    if let Some(host) = args.host {
        config.http.host = host;
    }

    info!("Starting Metrically API");
    info!("{}", config.summary());

    let resources = Arc::new(ServerResources::from_config(config)?);

    if let Err(e) = server::run(resources).await {
        error!("Server error: {e:#}");
        return Err(e);
    }
    Ok(())
}
