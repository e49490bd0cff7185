//! Evaluate a file of calculation requests in parallel
//!
//! Input is a JSON array of events, each `{"method": ..., "arguments": {...}}`.
//! Output is CSV with one row per event, in input order:
//!   index,method,result,error

use std::fs;
use std::io;
use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use log::info;
use rayon::prelude::*;
use serde::Serialize;
use serde_json::Value;
use tvm_calculator::{dispatch, Settings};

#[derive(Parser, Debug)]
#[command(name = "run_batch", about = "Evaluate a batch of TVM requests")]
struct Cli {
    /// JSON file holding an array of events
    input: PathBuf,

    /// Write CSV here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
struct BatchRow {
    index: usize,
    method: String,
    result: Option<f64>,
    error: Option<String>,
}

fn write_rows<W: io::Write>(mut writer: csv::Writer<W>, rows: &[BatchRow]) -> Result<()> {
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

fn main() -> Result<()> {
    let settings = Settings::from_env()?;
    settings.init_logging();

    let cli = Cli::parse();
    let start = Instant::now();

    let text = fs::read_to_string(&cli.input)
        .with_context(|| format!("Unable to read {}", cli.input.display()))?;
    let events: Vec<Value> =
        serde_json::from_str(&text).context("Input must be a JSON array of events")?;

    // Each request is independent, so evaluate in parallel
    let rows: Vec<BatchRow> = events
        .par_iter()
        .enumerate()
        .map(|(index, event)| {
            let envelope = dispatch(event);
            BatchRow {
                index,
                method: event
                    .get("method")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
                result: envelope.result(),
                error: envelope.error().map(str::to_string),
            }
        })
        .collect();

    let failures = rows.iter().filter(|row| row.error.is_some()).count();

    match cli.output {
        Some(ref path) => write_rows(
            csv::Writer::from_path(path)
                .with_context(|| format!("Unable to create {}", path.display()))?,
            &rows,
        )?,
        None => write_rows(csv::Writer::from_writer(io::stdout()), &rows)?,
    }

    info!(
        "Evaluated {} requests ({} failed) in {:?}",
        rows.len(),
        failures,
        start.elapsed()
    );

    Ok(())
}
