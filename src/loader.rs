use crate::config::InputPaths;
use crate::error::{PipelineError, Result};
use crate::types::{MergedOrder, RawCustomer, RawItem, RawOrder, RawPayment};
use crate::util::parse_timestamp;
use csv::ReaderBuilder;
use serde::de::DeserializeOwned;
use std::collections::{HashMap, HashSet};
use std::path::Path;

const DELIVERED: &str = "delivered";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadReport {
    pub order_rows: usize,
    pub delivered_rows: usize,
    pub payment_rows: usize,
    pub item_rows: usize,
    pub without_customer: usize,
    pub without_payment: usize,
    pub without_items: usize,
}

/// The four raw tables, as read from disk.
#[derive(Debug)]
pub struct RawTables {
    pub orders: Vec<RawOrder>,
    pub customers: Vec<RawCustomer>,
    pub payments: Vec<RawPayment>,
    pub items: Vec<RawItem>,
}

pub fn read_table<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let wrap = |source| PipelineError::ReadCsv {
        path: path.to_path_buf(),
        source,
    };
    let mut rdr = ReaderBuilder::new().has_headers(true).from_path(path).map_err(wrap)?;
    rdr.deserialize::<T>().map(|row| row.map_err(wrap)).collect()
}

pub fn read_tables(paths: &InputPaths) -> Result<RawTables> {
    Ok(RawTables {
        orders: read_table(&paths.orders)?,
        customers: read_table(&paths.customers)?,
        payments: read_table(&paths.payments)?,
        items: read_table(&paths.items)?,
    })
}

/// Sum every installment row into one payment value per order.
pub fn sum_payments(payments: &[RawPayment]) -> HashMap<&str, f64> {
    let mut totals: HashMap<&str, f64> = HashMap::new();
    for p in payments {
        // A blank value contributes nothing but still registers the order.
        *totals.entry(p.order_id.as_str()).or_insert(0.0) += p.payment_value.unwrap_or(0.0);
    }
    totals
}

/// Count distinct sellers per order; blank seller ids are not counted.
pub fn count_sellers(items: &[RawItem]) -> HashMap<&str, u32> {
    let mut sellers: HashMap<&str, HashSet<&str>> = HashMap::new();
    for item in items {
        let e = sellers.entry(item.order_id.as_str()).or_default();
        if let Some(seller) = item.seller_id.as_deref() {
            e.insert(seller);
        }
    }
    sellers
        .into_iter()
        .map(|(order, set)| (order, set.len() as u32))
        .collect()
}

/// First city seen per customer id, kept verbatim as the grouping key.
fn city_lookup(customers: &[RawCustomer]) -> HashMap<&str, Option<&str>> {
    let mut lookup = HashMap::new();
    for c in customers {
        lookup.entry(c.customer_id.as_str()).or_insert(c.customer_city.as_deref());
    }
    lookup
}

fn parse_column(
    order_id: &str,
    column: &'static str,
    value: Option<&str>,
) -> Result<Option<chrono::NaiveDateTime>> {
    parse_timestamp(value).map_err(|source| PipelineError::Timestamp {
        order_id: order_id.to_string(),
        column,
        value: value.unwrap_or_default().to_string(),
        source,
    })
}

/// Filter to delivered orders and left-join city, payment total and seller count.
///
/// Output keeps the order of the orders table. Unmatched orders get a missing
/// city, a payment of 0 and a missing seller count.
pub fn merge(tables: &RawTables) -> Result<(Vec<MergedOrder>, LoadReport)> {
    let payments = sum_payments(&tables.payments);
    let sellers = count_sellers(&tables.items);
    let cities = city_lookup(&tables.customers);

    let mut report = LoadReport {
        order_rows: tables.orders.len(),
        payment_rows: tables.payments.len(),
        item_rows: tables.items.len(),
        ..LoadReport::default()
    };

    let mut merged = Vec::new();
    for o in tables.orders.iter().filter(|o| o.order_status == DELIVERED) {
        let purchase_ts = parse_column(
            &o.order_id,
            "order_purchase_timestamp",
            o.order_purchase_timestamp.as_deref(),
        )?;
        let delivered_ts = parse_column(
            &o.order_id,
            "order_delivered_customer_date",
            o.order_delivered_customer_date.as_deref(),
        )?;
        let estimated_ts = parse_column(
            &o.order_id,
            "order_estimated_delivery_date",
            o.order_estimated_delivery_date.as_deref(),
        )?;

        let customer_city = cities.get(o.customer_id.as_str()).copied().flatten();
        if !cities.contains_key(o.customer_id.as_str()) {
            report.without_customer += 1;
        }
        let payment_value = match payments.get(o.order_id.as_str()) {
            Some(v) => *v,
            None => {
                report.without_payment += 1;
                0.0
            }
        };
        let seller_count = sellers.get(o.order_id.as_str()).copied();
        if seller_count.is_none() {
            report.without_items += 1;
        }

        merged.push(MergedOrder {
            order_id: o.order_id.clone(),
            customer_id: o.customer_id.clone(),
            order_status: o.order_status.clone(),
            purchase_ts,
            delivered_ts,
            estimated_ts,
            customer_city: customer_city.map(str::to_string),
            payment_value,
            seller_count,
        });
    }
    report.delivered_rows = merged.len();
    Ok((merged, report))
}

pub fn load_and_merge(paths: &InputPaths) -> Result<(Vec<MergedOrder>, LoadReport)> {
    let tables = read_tables(paths)?;
    merge(&tables)
}
