//! Raider.IO Score Comparison
//!
//! Pick a roster (bundled `wowhead` / `icy`, or a JSON file path), fetch
//! every configured character and write one comparison chart.
//!
//! The choice is read from the first argument, or prompted for on stdin.

use anyhow::{Context, Result};
use std::io::{self, Write};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use io_comparison::{
    build_index, Dataset, OutputTarget, Plotter, ProfileHandler, RaiderIoClient,
    Settings,
};

// ──────────────────────────────────────────────────────────────────────────────
// INPUT
// ──────────────────────────────────────────────────────────────────────────────

fn prompt_for_dataset() -> Result<String> {
    println!("Enter the data JSON file you wish to compare.");
    println!("Enter 'wowhead' to compare the authors of the Wowhead class guides.");
    println!("Enter 'icy' to compare the authors of the Icy Veins class guides.");
    print!("> ");
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    println!();
    Ok(input.trim().to_string())
}

// ──────────────────────────────────────────────────────────────────────────────
// MAIN ENTRY POINT
// ──────────────────────────────────────────────────────────────────────────────

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let settings = Settings::load().context("failed to load settings")?;

    let token = match std::env::args().nth(1) {
        Some(arg) => arg,
        None => prompt_for_dataset()?,
    };
    if token.is_empty() {
        anyhow::bail!("no dataset given");
    }
    let dataset = Dataset::from_token(&token);
    info!("Comparing dataset '{}'", dataset.tag());

    // Every icon must resolve before anything is fetched or drawn.
    let plotter = Plotter::from_settings(settings.clone(), dataset.background_tag())
        .context("failed to load chart assets")?;

    let roster = dataset.roster().context("failed to load roster")?;
    let fetcher = Arc::new(RaiderIoClient::new(settings.api_base_url.clone()));
    let handler = ProfileHandler::new(fetcher, settings.classes.clone(), settings.current_raid.clone());
    let report = handler.generate_profiles(None, Some(roster)).await?;

    info!(
        "Requested {} characters, skipped {} unset slots, rendering {}",
        report.requested,
        report.skipped,
        report.profiles.len()
    );
    for failure in &report.failures {
        warn!(
            "Left out {} ({}/{}): {}",
            failure.character_name, failure.class_name, failure.spec_name, failure.error
        );
    }

    let layout = build_index(&settings.classes);
    let target = OutputTarget::new(
        settings.output_dir.clone(),
        settings
            .output_basename
            .clone()
            .unwrap_or_else(|| dataset.tag().to_string()),
        settings.output_format,
    );

    let path = plotter
        .plot_profiles(&report.profiles, &layout, &target)
        .context("failed to render chart")?;

    println!("Chart written to {}", path.display());
    Ok(())
}
