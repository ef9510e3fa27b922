use crate::error::{PipelineError, Result};
use crate::types::{EnrichedOrder, MergedOrder};
use crate::util::days_floor;
use chrono::NaiveDateTime;

/// Enriched order table plus the network-wide on-time-delivery rate.
#[derive(Debug, Clone)]
pub struct Diagnostics {
    pub orders: Vec<EnrichedOrder>,
    /// Percentage of orders not delivered late; 100 for an empty table.
    pub otd_rate: f64,
}

fn require(order: &MergedOrder, ts: Option<NaiveDateTime>, column: &'static str) -> Result<NaiveDateTime> {
    ts.ok_or_else(|| PipelineError::MissingTimestamp {
        order_id: order.order_id.clone(),
        column,
    })
}

pub fn enrich(order: MergedOrder) -> Result<EnrichedOrder> {
    let purchased = require(&order, order.purchase_ts, "order_purchase_timestamp")?;
    let delivered = require(&order, order.delivered_ts, "order_delivered_customer_date")?;
    let estimated = require(&order, order.estimated_ts, "order_estimated_delivery_date")?;

    let is_late = delivered > estimated;
    let revenue_at_risk = if is_late { order.payment_value } else { 0.0 };
    Ok(EnrichedOrder {
        wait_time: days_floor(purchased, delivered),
        is_late,
        revenue_at_risk,
        order,
    })
}

pub fn compute(merged: Vec<MergedOrder>) -> Result<Diagnostics> {
    let orders = merged.into_iter().map(enrich).collect::<Result<Vec<_>>>()?;
    let late_share = if orders.is_empty() {
        0.0
    } else {
        orders.iter().filter(|o| o.is_late).count() as f64 / orders.len() as f64
    };
    Ok(Diagnostics {
        otd_rate: (1.0 - late_share) * 100.0,
        orders,
    })
}
