// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use anyhow::{anyhow, Context, Result};
use clap::Args;
use std::path::PathBuf;
use std::time::Instant;
use tracing::{info, warn};

use crate::api::EstimateResponse;
use crate::config::ServiceConfig;
use crate::nutrition::{NameMapper, NutrientService, SpreadsheetSource};
use crate::vision::{load_image_file, VisionModelManager};

/// Arguments for the estimate command
#[derive(Args, Debug)]
pub struct EstimateArgs {
    /// Photo of the food next to the calibration marker
    #[arg(long)]
    pub image: PathBuf,

    /// Service configuration file (TOML)
    #[arg(long, env = "NUTRIVISION_CONFIG")]
    pub config: Option<PathBuf>,
}

/// Run the local pipeline and lookup, printing the result as JSON
pub async fn run(args: EstimateArgs) -> Result<()> {
    let config = ServiceConfig::load(args.config.as_deref())?;

    let manager = VisionModelManager::new(config.vision_config()).await?;
    let pipeline = manager
        .pipeline()
        .ok_or_else(|| anyhow!("Vision models are not loaded; check the model paths"))?;

    let (image, _) = load_image_file(&args.image)
        .with_context(|| format!("Failed to load {}", args.image.display()))?;

    let start = Instant::now();
    let estimate = pipeline.estimate(&image)?;
    let food_name = NameMapper::default().map(&estimate.food_type).to_string();
    info!("{} → {}", estimate.food_type, food_name);

    let service = NutrientService::from_source(SpreadsheetSource::new(&config.reference_data));
    let lookup = service.lookup(&food_name, estimate.weight_grams);

    let mut response =
        EstimateResponse::new(estimate, food_name, start.elapsed().as_millis() as u64);
    match lookup {
        Ok(nutrients) => response.nutrients = Some(nutrients),
        Err(e) => {
            warn!("Nutrient lookup failed: {}", e);
            response.nutrient_error = Some(e.to_string());
        }
    }

    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}
