//! espp-report: Compute ESPP purchase and sale taxes for a file of lots.
//!
//! Reads lots as JSON (the shape the lot API returns), applies an optional
//! market price, and prints purchases and sales with their tax breakdowns.
//!
//! Usage:
//!   cargo run -p espp-report -- lots.json
//!   cargo run -p espp-report -- lots.json --market-price 70.00
//!   cargo run -p espp-report -- lots.json --market-price 70.00 --strict
//!
//! Tax rates come from ESPP_ORDINARY_INCOME_RATE, ESPP_LTCG_RATE, and
//! ESPP_PLAN_DISCOUNT (environment or .env), defaulting to 24% / 15% / 15%.

use anyhow::{bail, Context, Result};
use espp_engine::{
    load_purchases_taxes_with, parse_market_price, sort_by_grant_date, EsppCalculator, LoadMode,
    PurchaseTaxes, RawLot, SaleTaxes, TaxRatePolicy,
};
use serde::Serialize;
use std::path::PathBuf;

#[derive(Debug, PartialEq)]
struct Options {
    lots_path: PathBuf,
    market_price: Option<f64>,
    mode: LoadMode,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Report {
    policy: TaxRatePolicy,
    market_price: Option<f64>,
    purchases: Vec<PurchaseTaxes>,
    sales: Vec<SaleTaxes>,
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "espp_report=info,espp_engine=info".into()),
        )
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let options = match parse_args(&args) {
        Ok(options) => options,
        Err(e) => {
            eprintln!("{}", e);
            eprintln!();
            eprintln!("Usage:");
            eprintln!("  espp-report LOTS.json [--market-price PRICE] [--strict]");
            eprintln!();
            eprintln!("Options:");
            eprintln!("  --market-price PRICE   Evaluate dispositions at this price");
            eprintln!("  --strict               Reject malformed numbers and over-sold lots");
            std::process::exit(1);
        }
    };

    let policy = TaxRatePolicy::from_env().context("Invalid tax rate configuration")?;
    let contents = std::fs::read_to_string(&options.lots_path)
        .with_context(|| format!("Failed to read {}", options.lots_path.display()))?;

    let report = build_report(&contents, &options, policy)?;
    tracing::info!(
        "espp-report: {} purchases, {} sales, market_price={:?}",
        report.purchases.len(),
        report.sales.len(),
        report.market_price
    );

    println!("{}", serde_json::to_string_pretty(&report)?);

    Ok(())
}

fn parse_args(args: &[String]) -> Result<Options> {
    let mut lots_path = None;
    let mut market_price = None;
    let mut mode = LoadMode::Lenient;

    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--strict" => mode = LoadMode::Strict,
            "--market-price" => {
                let value = iter.next().context("--market-price needs a value")?;
                // An unusable price clears market values rather than failing
                market_price = parse_market_price(value);
                if market_price.is_none() {
                    tracing::warn!("Ignoring market price {:?}; not a finite number", value);
                }
            }
            flag if flag.starts_with("--") => bail!("Unknown option: {}", flag),
            path => {
                if lots_path.is_some() {
                    bail!("Only one lots file may be given");
                }
                lots_path = Some(PathBuf::from(path));
            }
        }
    }

    Ok(Options {
        lots_path: lots_path.context("Missing lots file")?,
        market_price,
        mode,
    })
}

fn build_report(contents: &str, options: &Options, policy: TaxRatePolicy) -> Result<Report> {
    let raw_lots: Vec<RawLot> =
        serde_json::from_str(contents).context("Lots file is not a JSON array of lots")?;

    let incomplete: Vec<_> = raw_lots
        .iter()
        .filter(|lot| !lot.input.is_valid())
        .map(|lot| format!("{} (missing {})", lot.id, lot.input.missing_fields().join(", ")))
        .collect();
    if !incomplete.is_empty() {
        tracing::warn!("Incomplete lots: {}", incomplete.join("; "));
    }

    let calculator = EsppCalculator::new(policy);
    let loaded = load_purchases_taxes_with(&raw_lots, options.mode).context("Failed to load lots")?;
    let purchases = sort_by_grant_date(calculator.apply(&loaded, options.market_price));
    let sales = calculator.sale_taxes(&purchases);

    Ok(Report {
        policy,
        market_price: options.market_price,
        purchases,
        sales,
    })
}
