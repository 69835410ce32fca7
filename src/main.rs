use anyhow::{Context, Result};
use clap::Parser;
use nightalign::config::AnalysisConfig;
use nightalign::model::{DoseEvent, NightlyMetricRecord};
use nightalign::{cli, engine};
use std::fs;
use tokio_util::sync::CancellationToken;

fn main() -> Result<()> {
    let args = cli::Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let doses: Vec<DoseEvent> = read_json(&args.doses).context("failed to load dose events")?;
    let records: Vec<NightlyMetricRecord> =
        read_json(&args.sleep).context("failed to load nightly metric records")?;
    let config: AnalysisConfig = match &args.config {
        Some(path) => read_json(path).context("failed to load analysis config")?,
        None => AnalysisConfig::default(),
    };

    if args.aligned_only {
        let points = engine::aligned_points(&doses, &records, &config)?;
        println!("{}", serde_json::to_string_pretty(&points)?);
        return Ok(());
    }

    let results = engine::run_analysis(&doses, &records, &config, &CancellationToken::new())?;
    println!("{}", serde_json::to_string_pretty(&results)?);
    Ok(())
}

fn read_json<T: serde::de::DeserializeOwned>(path: &std::path::Path) -> Result<T> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&contents)
        .with_context(|| format!("failed to parse {}", path.display()))
}
