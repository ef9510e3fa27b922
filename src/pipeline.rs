//! Load -> diagnose -> aggregate -> export, each stage consuming the previous
//! stage's value.

use crate::chart;
use crate::config::{AnalysisConfig, InputPaths, OutputPaths};
use crate::error::Result;
use crate::loader;
use crate::metrics::{self, Diagnostics};
use crate::output;
use crate::reports;
use crate::types::{city_label, CityRiskRow, MergedOrder, SellerCityRiskRow, SummaryStats};
use crate::util::{format_currency, format_int, format_number};
use tracing::{info, warn};

const HOTSPOT_PREVIEW_ROWS: usize = 3;

/// Everything the reporting stage needs, produced once per run.
#[derive(Debug)]
pub struct RiskReport {
    pub diagnostics: Diagnostics,
    pub city_matrix: Vec<CityRiskRow>,
    pub seller_city: Vec<SellerCityRiskRow>,
    pub summary: SummaryStats,
}

pub struct Pipeline {
    config: AnalysisConfig,
}

impl Pipeline {
    pub fn new(config: AnalysisConfig) -> Self {
        Self { config }
    }

    pub fn load(&self, inputs: &InputPaths) -> Result<Vec<MergedOrder>> {
        info!("Loading orders, customers, payments and items");
        let (merged, load) = loader::load_and_merge(inputs)?;
        info!(
            "{} order rows read, {} delivered orders merged ({} payment rows, {} item rows)",
            format_int(load.order_rows),
            format_int(load.delivered_rows),
            format_int(load.payment_rows),
            format_int(load.item_rows)
        );
        if load.without_customer > 0 {
            warn!("{} delivered orders have no matching customer", format_int(load.without_customer));
        }
        if load.without_payment > 0 {
            warn!("{} delivered orders have no payments, counted as 0", format_int(load.without_payment));
        }
        if load.without_items > 0 {
            warn!("{} delivered orders have no items", format_int(load.without_items));
        }
        Ok(merged)
    }

    pub fn diagnose(&self, merged: Vec<MergedOrder>) -> Result<Diagnostics> {
        info!("Computing wait time, lateness and revenue at risk");
        let diag = metrics::compute(merged)?;
        info!("Global OTD rate {:.2}%", diag.otd_rate);
        Ok(diag)
    }

    pub fn aggregate(&self, diagnostics: Diagnostics) -> RiskReport {
        info!("Aggregating risk by city and by city x seller count");
        let city_matrix = reports::city_risk_matrix(&diagnostics.orders, self.config.city_top_n);
        let seller_city = reports::seller_city_risk(&diagnostics.orders, self.config.seller_city_top_n);
        let summary = reports::generate_summary(&diagnostics, &city_matrix, &self.config);
        RiskReport {
            diagnostics,
            city_matrix,
            seller_city,
            summary,
        }
    }

    /// Summary tables as CSV plus the JSON summary.
    pub fn export_tables(&self, report: &RiskReport, outputs: &OutputPaths) -> Result<()> {
        output::write_csv(&outputs.city_matrix, &report.city_matrix)?;
        output::write_csv(&outputs.seller_city, &report.seller_city)?;
        output::write_json(&outputs.summary, &report.summary)?;
        Ok(())
    }

    pub fn export(&self, report: &RiskReport, outputs: &OutputPaths) -> Result<()> {
        info!("Exporting reports");
        self.export_tables(report, outputs)?;
        chart::render_dashboard(&outputs.dashboard, &report.city_matrix)?;
        info!(
            "Reports written: {}, {}, {}, {}",
            outputs.city_matrix.display(),
            outputs.seller_city.display(),
            outputs.dashboard.display(),
            outputs.summary.display()
        );
        Ok(())
    }

    pub fn recommendation(&self, report: &RiskReport) -> String {
        let rule = "=".repeat(45);
        let mut lines = vec![
            rule.clone(),
            "ROOT CAUSE & STRATEGIC RECOMMENDATIONS".to_string(),
            rule,
            format!("GLOBAL OTD: {:.2}%", report.diagnostics.otd_rate),
            format!(
                "OTD BENCHMARK: {:.2}% ({})",
                self.config.otd_benchmark,
                if report.summary.meets_benchmark { "met" } else { "below benchmark" }
            ),
            String::new(),
            "ROOT CAUSE HOTSPOTS (City + Seller Complexity):".to_string(),
            output::preview_table(&report.seller_city, HOTSPOT_PREVIEW_ROWS),
            String::new(),
        ];

        if !report.summary.critical_cities.is_empty() {
            lines.push(format!(
                "CRITICAL DELAY HOTSPOTS (late_pct > {}%): {}",
                format_number(self.config.critical_delay_pct, 2),
                report.summary.critical_cities.join(", ")
            ));
        }
        match report.city_matrix.first() {
            Some(top) => lines.push(format!(
                "ACTION PRIORITY: Audit logistics in {} (Total Risk: {}).",
                city_label(&top.city),
                format_currency(top.revenue_loss)
            )),
            None => lines.push("ACTION PRIORITY: no delivered orders to audit.".to_string()),
        }
        lines.join("\n")
    }

    pub fn run(&self, inputs: &InputPaths, outputs: &OutputPaths) -> Result<RiskReport> {
        let merged = self.load(inputs)?;
        let diagnostics = self.diagnose(merged)?;
        let report = self.aggregate(diagnostics);
        self.export(&report, outputs)?;
        println!("\n{}", self.recommendation(&report));
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::Path;

    fn write_inputs(dir: &Path) -> InputPaths {
        let paths = InputPaths::olist_in(dir);
        fs::write(
            &paths.orders,
            "order_id,customer_id,order_status,order_purchase_timestamp,order_delivered_customer_date,order_estimated_delivery_date\n\
             o1,c1,delivered,2024-01-01 00:00:00,2024-01-12 00:00:00,2024-01-10 00:00:00\n\
             o2,c1,delivered,2024-01-01 00:00:00,2024-01-10 00:00:00,2024-01-10 00:00:00\n\
             o3,c2,delivered,2024-01-02 00:00:00,2024-01-20 00:00:00,2024-01-15 00:00:00\n\
             o4,c3,delivered,2024-01-02 00:00:00,2024-01-21 00:00:00,2024-01-15 00:00:00\n\
             o5,c2,canceled,2024-01-02 00:00:00,,2024-01-15 00:00:00\n",
        )
        .unwrap();
        fs::write(
            &paths.customers,
            "customer_id,customer_city\nc1,sao paulo\nc2,rio de janeiro\n",
        )
        .unwrap();
        fs::write(
            &paths.payments,
            "order_id,payment_value\no1,40.0\no1,60.0\no2,30.0\no3,1500.25\no4,20.0\no5,99.0\n",
        )
        .unwrap();
        fs::write(
            &paths.items,
            "order_id,seller_id\no1,s1\no1,s2\no2,s1\no3,s3\no4,s4\n",
        )
        .unwrap();
        paths
    }

    fn run_to_report(dir: &Path) -> (Pipeline, RiskReport) {
        let pipeline = Pipeline::new(AnalysisConfig::default());
        let merged = pipeline.load(&write_inputs(dir)).unwrap();
        let diag = pipeline.diagnose(merged).unwrap();
        let report = pipeline.aggregate(diag);
        (pipeline, report)
    }

    #[test]
    fn stages_compose_into_ranked_tables() {
        let dir = tempfile::tempdir().unwrap();
        let (_, report) = run_to_report(dir.path());

        assert_eq!(report.diagnostics.orders.len(), 4);
        assert!((report.diagnostics.otd_rate - 25.0).abs() < 1e-9);

        let cities: Vec<&str> = report.city_matrix.iter().map(|r| city_label(&r.city)).collect();
        assert_eq!(cities, vec!["rio de janeiro", "sao paulo", "(unknown)"]);
        assert_eq!(report.city_matrix[1].revenue_loss, 100.0);
        assert_eq!(report.city_matrix[1].late_pct, 50.0);
        assert_eq!(report.seller_city.len(), 4);
        assert_eq!(report.seller_city[1].seller_count, Some(2));
    }

    #[test]
    fn exported_tables_match_summaries() {
        let dir = tempfile::tempdir().unwrap();
        let (pipeline, report) = run_to_report(dir.path());
        let outputs = OutputPaths::in_dir(dir.path());
        pipeline.export_tables(&report, &outputs).unwrap();

        let city = fs::read_to_string(&outputs.city_matrix).unwrap();
        assert_eq!(
            city,
            "customer_city,order_volume,revenue_loss,late_pct\n\
             rio de janeiro,1,1500.25,100.0\n\
             sao paulo,2,100.0,50.0\n\
             ,1,20.0,100.0\n"
        );
        let seller = fs::read_to_string(&outputs.seller_city).unwrap();
        assert!(seller.starts_with("customer_city,seller_count,orders,late_pct,revenue_loss\n"));
        assert_eq!(seller.lines().count(), 5);

        let summary: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&outputs.summary).unwrap()).unwrap();
        assert_eq!(summary["delivered_orders"], 4);
        assert_eq!(summary["meets_benchmark"], false);
    }

    #[test]
    fn recommendation_names_top_city_with_currency() {
        let dir = tempfile::tempdir().unwrap();
        let (pipeline, report) = run_to_report(dir.path());
        let text = pipeline.recommendation(&report);

        assert!(text.contains("GLOBAL OTD: 25.00%"));
        assert!(text.contains("OTD BENCHMARK: 90.00% (below benchmark)"));
        assert!(text.contains("ACTION PRIORITY: Audit logistics in rio de janeiro (Total Risk: $1,500.25)."));
        assert!(text.contains("CRITICAL DELAY HOTSPOTS (late_pct > 10.00%): rio de janeiro, sao paulo, (unknown)"));
    }

    #[test]
    fn recommendation_without_orders() {
        let pipeline = Pipeline::new(AnalysisConfig::default());
        let report = pipeline.aggregate(metrics::compute(Vec::new()).unwrap());
        let text = pipeline.recommendation(&report);
        assert!(text.contains("GLOBAL OTD: 100.00%"));
        assert!(text.contains("(no rows)"));
        assert!(text.ends_with("ACTION PRIORITY: no delivered orders to audit."));
    }

    #[test]
    fn empty_run_exports_header_only_tables() {
        let dir = tempfile::tempdir().unwrap();
        let pipeline = Pipeline::new(AnalysisConfig::default());
        let report = pipeline.aggregate(metrics::compute(Vec::new()).unwrap());
        let outputs = OutputPaths::in_dir(dir.path());
        pipeline.export_tables(&report, &outputs).unwrap();

        let city = fs::read_to_string(&outputs.city_matrix).unwrap();
        assert_eq!(city, "customer_city,order_volume,revenue_loss,late_pct\n");
        let seller = fs::read_to_string(&outputs.seller_city).unwrap();
        assert_eq!(seller, "customer_city,seller_count,orders,late_pct,revenue_loss\n");
    }

    #[test]
    fn config_limits_are_applied() {
        let dir = tempfile::tempdir().unwrap();
        let pipeline = Pipeline::new(AnalysisConfig {
            city_top_n: 1,
            seller_city_top_n: 2,
            ..AnalysisConfig::default()
        });
        let merged = pipeline.load(&write_inputs(dir.path())).unwrap();
        let report = pipeline.aggregate(pipeline.diagnose(merged).unwrap());
        assert_eq!(report.city_matrix.len(), 1);
        assert_eq!(report.seller_city.len(), 2);
    }
}
