use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use tabled::Tabled;

/// Label used wherever a missing grouping key has to be shown to a person.
pub const UNKNOWN_LABEL: &str = "(unknown)";

#[derive(Debug, Deserialize)]
pub struct RawOrder {
    pub order_id: String,
    pub customer_id: String,
    pub order_status: String,
    pub order_purchase_timestamp: Option<String>,
    pub order_delivered_customer_date: Option<String>,
    pub order_estimated_delivery_date: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RawCustomer {
    pub customer_id: String,
    pub customer_city: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RawPayment {
    pub order_id: String,
    pub payment_value: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct RawItem {
    pub order_id: String,
    pub seller_id: Option<String>,
}

/// One delivered order joined with its customer city, summed payments and
/// distinct seller count.
#[derive(Debug, Clone, PartialEq)]
pub struct MergedOrder {
    pub order_id: String,
    pub customer_id: String,
    pub order_status: String,
    pub purchase_ts: Option<NaiveDateTime>,
    pub delivered_ts: Option<NaiveDateTime>,
    pub estimated_ts: Option<NaiveDateTime>,
    pub customer_city: Option<String>,
    pub payment_value: f64,
    pub seller_count: Option<u32>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnrichedOrder {
    pub order: MergedOrder,
    pub wait_time: i64,
    pub is_late: bool,
    pub revenue_at_risk: f64,
}

/// Rows exported as CSV, with the header written even when there are no rows.
pub trait CsvRow: Serialize {
    const COLUMNS: &'static [&'static str];
}

#[derive(Debug, Clone, Serialize, Tabled)]
pub struct CityRiskRow {
    #[serde(rename = "customer_city")]
    #[tabled(rename = "customer_city", display_with = "display_city")]
    pub city: Option<String>,
    pub order_volume: usize,
    pub revenue_loss: f64,
    pub late_pct: f64,
}

#[derive(Debug, Clone, Serialize, Tabled)]
pub struct SellerCityRiskRow {
    #[serde(rename = "customer_city")]
    #[tabled(rename = "customer_city", display_with = "display_city")]
    pub city: Option<String>,
    #[tabled(display_with = "display_seller_count")]
    pub seller_count: Option<u32>,
    pub orders: usize,
    pub late_pct: f64,
    pub revenue_loss: f64,
}

impl CsvRow for CityRiskRow {
    const COLUMNS: &'static [&'static str] = &["customer_city", "order_volume", "revenue_loss", "late_pct"];
}

impl CsvRow for SellerCityRiskRow {
    const COLUMNS: &'static [&'static str] =
        &["customer_city", "seller_count", "orders", "late_pct", "revenue_loss"];
}

#[derive(Debug, Serialize)]
pub struct SummaryStats {
    pub delivered_orders: usize,
    pub otd_rate: f64,
    pub otd_benchmark: f64,
    pub meets_benchmark: bool,
    pub total_revenue_at_risk: f64,
    pub avg_wait_time: f64,
    pub critical_delay_pct: f64,
    pub critical_cities: Vec<String>,
}

pub fn city_label(city: &Option<String>) -> &str {
    city.as_deref().unwrap_or(UNKNOWN_LABEL)
}

fn display_city(city: &Option<String>) -> String {
    city_label(city).to_string()
}

fn display_seller_count(count: &Option<u32>) -> String {
    match count {
        Some(c) => c.to_string(),
        None => UNKNOWN_LABEL.to_string(),
    }
}

