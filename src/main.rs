//! TVM Calculator CLI
//!
//! Evaluate a single calculation from the command line:
//!   tvm_calculator --method fv --args '{"rate": 0.004166666666667, "nper": 120, "pmt": -100}'
//!   tvm_calculator --method xirr --cashflows flows.csv --args '{"guess": 0.1}'
//!   tvm_calculator --list
//!
//! Prints the `{"result": ...}` / `{"error": ...}` envelope and exits non-zero on error.

use std::fs;
use std::path::PathBuf;

use anyhow::{anyhow, bail, Context, Result};
use clap::Parser;
use serde_json::{json, Value};
use tvm_calculator::loader::load_cash_flows;
use tvm_calculator::validation::Field;
use tvm_calculator::{handle, Operation, Settings};

#[derive(Parser, Debug)]
#[command(name = "tvm_calculator", version, about = "Time-value-of-money calculator")]
struct Cli {
    /// Operation to run: fv, pv, pmt, ppmt, nper, rate, npv, irr, mirr, xnpv, xirr, fvschedule
    #[arg(short, long, required_unless_present = "list")]
    method: Option<Operation>,

    /// Arguments as a JSON object
    #[arg(short, long, conflicts_with = "args_file")]
    args: Option<String>,

    /// File containing the arguments JSON object
    #[arg(long)]
    args_file: Option<PathBuf>,

    /// CSV with an `amount` column and optional `date` column, merged in as values/dates
    #[arg(long)]
    cashflows: Option<PathBuf>,

    /// Print each operation's fields and exit
    #[arg(long)]
    list: bool,
}

fn describe(field: &Field) -> String {
    match field.default {
        Some(default) => format!("{}({})", field.name, default),
        None => field.name.to_string(),
    }
}

fn print_operations() {
    println!("{:<11} {:<29} {:<36} {}", "Method", "Alias", "Required", "Optional (default)");
    println!("{}", "-".repeat(110));
    for op in Operation::ALL {
        let schema = op.schema();
        let required: Vec<String> = schema.required().map(describe).collect();
        let optional: Vec<String> = schema.optional().map(describe).collect();
        println!(
            "{:<11} {:<29} {:<36} {}",
            op.name(),
            op.alias(),
            required.join(", "),
            if optional.is_empty() { "-".to_string() } else { optional.join(", ") },
        );
    }
}

fn read_arguments(cli: &Cli) -> Result<Value> {
    let text = match (&cli.args, &cli.args_file) {
        (Some(text), _) => text.clone(),
        (None, Some(path)) => fs::read_to_string(path)
            .with_context(|| format!("Unable to read arguments from {}", path.display()))?,
        (None, None) => return Ok(json!({})),
    };

    serde_json::from_str(&text).context("Arguments are not valid JSON")
}

fn main() -> Result<()> {
    let settings = Settings::from_env()?;
    settings.init_logging();

    let cli = Cli::parse();

    if cli.list {
        print_operations();
        return Ok(());
    }

    let operation = cli.method.context("--method is required")?;
    let mut arguments = read_arguments(&cli)?;

    if let Some(ref path) = cli.cashflows {
        if !operation.uses_values() {
            bail!("{} does not take a cash-flow series", operation.label());
        }

        let mut loaded = load_cash_flows(path)
            .map_err(|e| anyhow!("Failed to load cash flows from {}: {}", path.display(), e))?;

        if operation.uses_dates() && loaded.dates.is_none() {
            bail!("{} needs a `date` column in {}", operation.label(), path.display());
        }
        if !operation.uses_dates() {
            loaded.dates = None;
        }

        loaded
            .merge_into(&mut arguments)
            .map_err(|e| anyhow!("{}", e))?;
    }

    let envelope = handle(operation, &arguments);
    println!("{}", serde_json::to_string(&envelope)?);

    if envelope.is_error() {
        std::process::exit(1);
    }

    Ok(())
}
