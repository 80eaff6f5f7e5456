// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use anyhow::Result;
use clap::Args;
use std::io::{self, BufRead, Write};
use tracing::debug;

pub const DEFAULT_API_URL: &str = "http://127.0.0.1:8000/nutrient";

/// Arguments for the lookup command
#[derive(Args, Debug)]
pub struct LookupArgs {
    /// Nutrient endpoint of a running service
    #[arg(long, env = "NUTRIVISION_API_URL", default_value = DEFAULT_API_URL)]
    pub url: String,

    /// Food name (prompted for when omitted)
    #[arg(long)]
    pub food: Option<String>,

    /// Weight in grams (prompted for when omitted)
    #[arg(long)]
    pub weight: Option<f64>,

    /// Single nutrient to request (Calories, Carbohydrate, Protein, Fat)
    #[arg(long)]
    pub nutrient: Option<String>,
}

/// Prompt until a food name and a numeric weight are read
///
/// Returns `None` when the input ends first.
pub fn prompt_food_and_weight<R, W>(
    input: &mut R,
    output: &mut W,
) -> io::Result<Option<(String, f64)>>
where
    R: BufRead,
    W: Write,
{
    loop {
        let Some(food) = prompt(input, output, "Name of Food:")? else {
            return Ok(None);
        };
        let Some(weight) = prompt(input, output, "Weight of Food:")? else {
            return Ok(None);
        };

        match weight.trim().parse::<f64>() {
            Ok(weight) if !food.trim().is_empty() => return Ok(Some((food, weight))),
            _ => writeln!(output, "Incorrect Input")?,
        }
    }
}

fn prompt<R: BufRead, W: Write>(
    input: &mut R,
    output: &mut W,
    label: &str,
) -> io::Result<Option<String>> {
    write!(output, "{}", label)?;
    output.flush()?;
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
}

/// Query parameters for the nutrient endpoint
pub fn query_params(
    food: &str,
    weight: f64,
    nutrient: Option<&str>,
) -> Vec<(&'static str, String)> {
    let mut params = vec![("food", food.to_string()), ("weight", weight.to_string())];
    if let Some(nutrient) = nutrient {
        params.push(("nutrient", nutrient.to_string()));
    }
    params
}

/// Run the lookup command; request failures are printed, not returned
pub async fn run(args: LookupArgs) -> Result<()> {
    let (food, weight) = match (args.food, args.weight) {
        (Some(food), Some(weight)) => (food, weight),
        _ => {
            let stdin = io::stdin();
            let mut stdout = io::stdout();
            match prompt_food_and_weight(&mut stdin.lock(), &mut stdout)? {
                Some(pair) => pair,
                None => return Ok(()),
            }
        }
    };

    let params = query_params(&food, weight, args.nutrient.as_deref());
    debug!("GET {} {:?}", args.url, params);

    match fetch(&args.url, &params).await {
        Ok(body) => println!("Response: \n{}", body),
        Err(err) => println!("Error occurred: {}", err),
    }
    Ok(())
}

async fn fetch(url: &str, params: &[(&'static str, String)]) -> Result<String> {
    let response = reqwest::Client::new().get(url).query(params).send().await?;
    let body: serde_json::Value = response.json().await?;
    Ok(serde_json::to_string_pretty(&body)?)
}
