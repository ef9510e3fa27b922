// Delivery-delay hotspot report for the Olist e-commerce dataset.
//
// Reads the orders, customers, payments and items CSVs, scores every
// delivered order for lateness and revenue at risk, then writes the city
// and city x seller-count risk tables, a dashboard PNG and a JSON summary
// before printing the audit recommendation.
mod chart;
mod config;
mod error;
mod loader;
mod metrics;
mod output;
mod pipeline;
mod reports;
mod types;
mod util;

use clap::Parser;
use config::{AnalysisConfig, InputPaths, OutputPaths};
use pipeline::Pipeline;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::error;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "olist-delivery-risk")]
#[command(about = "Surface delivery-delay hotspots and revenue at risk by city", long_about = None)]
struct Cli {
    /// Directory holding the four Olist dataset CSVs
    #[arg(short, long, default_value = ".")]
    data_dir: PathBuf,

    /// Override the orders CSV path
    #[arg(long)]
    orders: Option<PathBuf>,

    /// Override the customers CSV path
    #[arg(long)]
    customers: Option<PathBuf>,

    /// Override the payments CSV path
    #[arg(long)]
    payments: Option<PathBuf>,

    /// Override the order items CSV path
    #[arg(long)]
    items: Option<PathBuf>,

    /// Directory the reports are written to
    #[arg(short, long, default_value = ".")]
    out_dir: PathBuf,
}

impl Cli {
    fn input_paths(&self) -> InputPaths {
        let defaults = InputPaths::olist_in(&self.data_dir);
        InputPaths {
            orders: self.orders.clone().unwrap_or(defaults.orders),
            customers: self.customers.clone().unwrap_or(defaults.customers),
            payments: self.payments.clone().unwrap_or(defaults.payments),
            items: self.items.clone().unwrap_or(defaults.items),
        }
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let pipeline = Pipeline::new(AnalysisConfig::default());
    match pipeline.run(&cli.input_paths(), &OutputPaths::in_dir(&cli.out_dir)) {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            error!(kind = ?e.kind(), "{}", e);
            ExitCode::from(e.kind().exit_code())
        }
    }
}
