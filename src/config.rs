//! Run configuration for the delivery-risk pipeline.

use std::path::{Path, PathBuf};

/// Thresholds and row limits applied during aggregation and reporting.
#[derive(Debug, Clone)]
pub struct AnalysisConfig {
    /// Cities whose late percentage exceeds this are reported as critical hotspots.
    pub critical_delay_pct: f64,
    /// Global OTD rate (percent) the network is expected to reach.
    pub otd_benchmark: f64,
    /// Rows kept in the city risk matrix.
    pub city_top_n: usize,
    /// Rows kept in the city x seller-count table.
    pub seller_city_top_n: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            critical_delay_pct: 10.0,
            otd_benchmark: 90.0,
            city_top_n: 10,
            seller_city_top_n: 15,
        }
    }
}

#[derive(Debug, Clone)]
pub struct InputPaths {
    pub orders: PathBuf,
    pub customers: PathBuf,
    pub payments: PathBuf,
    pub items: PathBuf,
}

impl InputPaths {
    /// Olist dataset file names resolved against `dir`.
    pub fn olist_in(dir: &Path) -> Self {
        Self {
            orders: dir.join("olist_orders_dataset.csv"),
            customers: dir.join("olist_customers_dataset.csv"),
            payments: dir.join("olist_order_payments_dataset.csv"),
            items: dir.join("olist_order_items_dataset.csv"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct OutputPaths {
    pub city_matrix: PathBuf,
    pub seller_city: PathBuf,
    pub dashboard: PathBuf,
    pub summary: PathBuf,
}

impl OutputPaths {
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            city_matrix: dir.join("city_volume_value_matrix.csv"),
            seller_city: dir.join("seller_city_root_cause.csv"),
            dashboard: dir.join("supply_chain_specialist_dashboard.png"),
            summary: dir.join("supply_chain_summary.json"),
        }
    }
}
