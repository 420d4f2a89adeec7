use anyhow::{Context, Result};
use ghgi::config::DatasetConfig;
use ghgi::impact::expanded_baselines;
use ghgi::repository::shared_repository;
use log::info;
use std::env;
use std::fs;
use std::io::{self, Read};

fn main() -> Result<()> {
    // Initialize logging
    env_logger::init();

    // Load environment variables from .env file
    dotenv::dotenv().ok();

    let config = DatasetConfig::from_env();
    let repository = shared_repository(&config)?;

    let argument = env::args().nth(1);

    // Efficiency baselines report: every efficiency, then the picked baselines
    if argument.as_deref() == Some("--baselines") {
        let expanded = expanded_baselines(repository.catalog(), repository.origins());
        println!("{}", serde_json::to_string_pretty(&expanded)?);
        println!("{}", serde_json::to_string_pretty(repository.baselines())?);
        return Ok(());
    }

    // Ingredient list from the file argument, or stdin
    let text = match argument {
        Some(path) => fs::read_to_string(&path).with_context(|| format!("Failed to read {path}"))?,
        None => {
            let mut text = String::new();
            io::stdin().read_to_string(&mut text).context("Failed to read stdin")?;
            text
        }
    };

    let estimates = repository.estimate_recipe(&text, None)?;
    info!("Estimated {} ingredients", estimates.len());
    for estimate in &estimates {
        println!("{}", serde_json::to_string(estimate)?);
    }

    Ok(())
}
