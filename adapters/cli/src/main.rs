#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that runs a scripted encounter through the pacing director.

mod settings;
mod simulation;

use std::{io, path::PathBuf};

use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::settings::{Overrides, Settings};

/// Runs a scripted encounter through the adaptive pacing director.
#[derive(Debug, Parser)]
#[command(name = "pacing-director", version, about, long_about = None)]
struct CliArgs {
    /// TOML file with optional `[director]` and `[scenario]` tables.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
    #[command(flatten)]
    overrides: Overrides,
}

/// Entry point for the pacing director command-line interface.
fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(io::stderr)
        .init();

    let args = CliArgs::parse();
    let mut settings = match &args.config {
        Some(path) => Settings::load(path)?,
        None => Settings::default(),
    };
    settings.apply(&args.overrides);

    info!(
        seed = settings.director.rng_seed,
        duration = settings.scenario.duration,
        target_rate = settings.director.target_rate,
        "running encounter"
    );
    let summary = simulation::run(&settings)?;
    println!("{summary}");
    Ok(())
}
