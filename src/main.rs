use std::env;
use std::fs;
use std::fs::File;
use std::io::BufRead;
use std::io::BufReader;

use anyhow::bail;
use anyhow::Context;
use anyhow::Result;
use chrono::NaiveDate;
use montecarlo_rs::config::EngineConfig;
use montecarlo_rs::engine::BatchItem;
use montecarlo_rs::HistoricalSeries;
use montecarlo_rs::ModelType;
use montecarlo_rs::SimulationEngine;
use montecarlo_rs::SimulationRequest;
use tracing::info;
use tracing_subscriber::EnvFilter;

const PATHS: usize = 10_000;
const STEPS: usize = 252;
const SEED: u64 = 42;

/// `montecarlo <prices.csv> [config.json]`
///
/// Each line of the price file is either `price` or `YYYY-MM-DD,price`,
/// one form throughout.
/// Every model is calibrated to the series and simulated one year ahead;
/// the statistics are printed as JSON.
fn main() -> Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
    .init();

  let mut args = env::args().skip(1);
  let prices_path = args
    .next()
    .context("usage: montecarlo <prices.csv> [config.json]")?;
  let config = match args.next() {
    Some(path) => {
      let json = fs::read_to_string(&path).with_context(|| format!("reading {path}"))?;
      EngineConfig::from_json_str(&json)?
    }
    None => EngineConfig::default(),
  };

  let history = read_history(&prices_path)?;
  info!(observations = history.len(), path = %prices_path, "loaded history");

  let engine = SimulationEngine::new(config)?;
  let items: Vec<BatchItem> = ModelType::ALL
    .iter()
    .map(|&model| {
      BatchItem::new(
        model.to_string(),
        SimulationRequest::new(model, PATHS, STEPS, SEED, None, None, None, None),
        Some(history.clone()),
      )
    })
    .collect();

  let mut report = serde_json::Map::new();
  for (label, result) in engine.run_batch(&items) {
    let outcome = result.with_context(|| format!("model {label}"))?;
    report.insert(label, serde_json::to_value(&outcome)?);
  }
  println!("{}", serde_json::to_string_pretty(&report)?);

  Ok(())
}

/// Every line must carry a date, or none may.
fn read_history(path: &str) -> Result<HistoricalSeries> {
  let reader = BufReader::new(File::open(path).with_context(|| format!("opening {path}"))?);
  let mut dated = Vec::new();
  let mut undated = Vec::new();

  for (i, line) in reader.lines().enumerate() {
    let line = line?;
    let line = line.trim();
    if line.is_empty() {
      continue;
    }

    match line.split_once(',') {
      Some((date, price)) => {
        if !undated.is_empty() {
          bail!("line {}: dated price in an undated file", i + 1);
        }
        let date = NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d")
          .with_context(|| format!("line {}: bad date", i + 1))?;
        let price: f64 = price
          .trim()
          .parse()
          .with_context(|| format!("line {}: bad price", i + 1))?;
        dated.push((date, price));
      }
      None => {
        if !dated.is_empty() {
          bail!("line {}: undated price in a dated file", i + 1);
        }
        let price: f64 = line
          .parse()
          .with_context(|| format!("line {}: bad price", i + 1))?;
        undated.push(price);
      }
    }
  }

  let series = if undated.is_empty() {
    HistoricalSeries::new(dated)?
  } else {
    HistoricalSeries::from_prices(&undated)?
  };

  Ok(series)
}
