// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod estimate;
pub mod lookup;

use anyhow::Result;
use clap::{Parser, Subcommand};

/// NutriVision console client
#[derive(Parser, Debug)]
#[command(name = "nutrivision-cli")]
#[command(version)]
#[command(about = "Console tools for the NutriVision service", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Ask the service for the nutrients of a food at a weight
    Lookup(lookup::LookupArgs),

    /// Estimate food type, weight and nutrients from a photo, locally
    Estimate(estimate::EstimateArgs),
}

/// Execute CLI command
pub async fn execute(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Lookup(args) => lookup::run(args).await,
        Commands::Estimate(args) => estimate::run(args).await,
    }
}
