// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use anyhow::Result;
use clap::Parser;
use nutrivision::{
    api::{start_server, AppState},
    config::ServiceConfig,
    nutrition::{NutrientService, SpreadsheetSource},
    vision::VisionModelManager,
};
use std::{env, path::PathBuf};

/// NutriVision nutrient lookup and portion estimation service
#[derive(Parser, Debug)]
#[command(name = "nutrivision", version, about, long_about = None)]
struct Args {
    /// Service configuration file (TOML); NUTRIVISION_* variables override it
    #[arg(long, short, env = "NUTRIVISION_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();

    // Initialize tracing subscriber for logging
    if env::var("RUST_LOG").is_err() {
        env::set_var("RUST_LOG", "info");
    }
    tracing_subscriber::fmt::init();

    if let Err(e) = run(Args::parse()).await {
        eprintln!("❌ Error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run(args: Args) -> Result<()> {
    println!("🚀 Starting {}...", nutrivision::version::get_version_string());

    let config = ServiceConfig::load(args.config.as_deref())?;
    tracing::info!("Reference data: {}", config.reference_data);

    let nutrient_service =
        NutrientService::from_source(SpreadsheetSource::new(&config.reference_data));
    // Surface a bad reference file at startup; lookups re-read it anyway
    match nutrient_service.table() {
        Ok(table) => tracing::info!("✅ Reference table has {} foods", table.len()),
        Err(e) => tracing::warn!("⚠️ Reference data not readable yet: {}", e),
    }

    println!("👁️ Loading vision models...");
    let manager = VisionModelManager::new(config.vision_config()).await?;
    if manager.is_ready() {
        println!("✅ Photo estimation enabled");
    } else {
        println!("⚠️ Photo estimation disabled; lookup API only");
    }

    let state = AppState::new(nutrient_service).with_vision(&manager);

    println!("🌐 Listening on http://{}", config.listen_addr());
    start_server(&config, state).await
}
