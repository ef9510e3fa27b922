use crate::config::AnalysisConfig;
use crate::metrics::Diagnostics;
use crate::types::{city_label, CityRiskRow, EnrichedOrder, SellerCityRiskRow, SummaryStats};
use crate::util::{mean, pct_of};
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// Grouping key component that orders present values first, then the missing one.
#[derive(Debug, Clone, PartialEq, Eq)]
struct MissingLast<T>(Option<T>);

impl<T: Ord> Ord for MissingLast<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        match (&self.0, &other.0) {
            (Some(a), Some(b)) => a.cmp(b),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        }
    }
}

impl<T: Ord> PartialOrd for MissingLast<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[derive(Default)]
struct Acc {
    orders: usize,
    late: usize,
    revenue_loss: f64,
}

impl Acc {
    fn push(&mut self, o: &EnrichedOrder) {
        self.orders += 1;
        self.late += usize::from(o.is_late);
        self.revenue_loss += o.revenue_at_risk;
    }
}

fn by_revenue_loss_desc(a: f64, b: f64) -> Ordering {
    b.total_cmp(&a)
}

/// Orders, losses and late percentage per customer city, top `top_n` by loss.
///
/// Groups are visited in key order (missing city last) and the sort is
/// stable, so equal losses keep that order.
pub fn city_risk_matrix(orders: &[EnrichedOrder], top_n: usize) -> Vec<CityRiskRow> {
    let mut groups: BTreeMap<MissingLast<String>, Acc> = BTreeMap::new();
    for o in orders {
        let key = MissingLast(o.order.customer_city.clone());
        groups.entry(key).or_default().push(o);
    }
    let mut rows: Vec<CityRiskRow> = groups
        .into_iter()
        .map(|(city, acc)| CityRiskRow {
            city: city.0,
            order_volume: acc.orders,
            revenue_loss: acc.revenue_loss,
            late_pct: pct_of(acc.late, acc.orders),
        })
        .collect();
    rows.sort_by(|a, b| by_revenue_loss_desc(a.revenue_loss, b.revenue_loss));
    rows.truncate(top_n);
    rows
}

/// Same measures per (city, seller count) pair, top `top_n` by loss.
pub fn seller_city_risk(orders: &[EnrichedOrder], top_n: usize) -> Vec<SellerCityRiskRow> {
    let mut groups: BTreeMap<(MissingLast<String>, MissingLast<u32>), Acc> = BTreeMap::new();
    for o in orders {
        let key = (
            MissingLast(o.order.customer_city.clone()),
            MissingLast(o.order.seller_count),
        );
        groups.entry(key).or_default().push(o);
    }
    let mut rows: Vec<SellerCityRiskRow> = groups
        .into_iter()
        .map(|((city, sellers), acc)| SellerCityRiskRow {
            city: city.0,
            seller_count: sellers.0,
            orders: acc.orders,
            late_pct: pct_of(acc.late, acc.orders),
            revenue_loss: acc.revenue_loss,
        })
        .collect();
    rows.sort_by(|a, b| by_revenue_loss_desc(a.revenue_loss, b.revenue_loss));
    rows.truncate(top_n);
    rows
}

/// Cities from the risk matrix whose late percentage is above the critical threshold.
pub fn critical_cities(rows: &[CityRiskRow], threshold_pct: f64) -> Vec<&CityRiskRow> {
    rows.iter().filter(|r| r.late_pct > threshold_pct).collect()
}

pub fn generate_summary(diag: &Diagnostics, city_rows: &[CityRiskRow], config: &AnalysisConfig) -> SummaryStats {
    let waits: Vec<f64> = diag.orders.iter().map(|o| o.wait_time as f64).collect();
    SummaryStats {
        delivered_orders: diag.orders.len(),
        otd_rate: diag.otd_rate,
        otd_benchmark: config.otd_benchmark,
        meets_benchmark: diag.otd_rate >= config.otd_benchmark,
        total_revenue_at_risk: diag.orders.iter().map(|o| o.revenue_at_risk).sum(),
        avg_wait_time: mean(&waits),
        critical_delay_pct: config.critical_delay_pct,
        critical_cities: critical_cities(city_rows, config.critical_delay_pct)
            .into_iter()
            .map(|r| city_label(&r.city).to_string())
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::MergedOrder;

    fn enriched(id: &str, city: Option<&str>, sellers: Option<u32>, payment: f64, late: bool) -> EnrichedOrder {
        EnrichedOrder {
            order: MergedOrder {
                order_id: id.into(),
                customer_id: format!("c-{id}"),
                order_status: "delivered".into(),
                purchase_ts: None,
                delivered_ts: None,
                estimated_ts: None,
                customer_city: city.map(str::to_string),
                payment_value: payment,
                seller_count: sellers,
            },
            wait_time: 5,
            is_late: late,
            revenue_at_risk: if late { payment } else { 0.0 },
        }
    }

    fn sample() -> Vec<EnrichedOrder> {
        vec![
            enriched("o1", Some("sao paulo"), Some(1), 100.0, true),
            enriched("o2", Some("sao paulo"), Some(2), 50.0, false),
            enriched("o3", Some("sao paulo"), Some(1), 30.0, false),
            enriched("o4", Some("rio de janeiro"), Some(1), 200.0, true),
            enriched("o5", None, None, 75.0, true),
            enriched("o6", Some("belo horizonte"), Some(1), 10.0, false),
        ]
    }

    #[test]
    fn city_matrix_aggregates_and_sorts_by_loss() {
        let rows = city_risk_matrix(&sample(), 10);
        let cities: Vec<Option<&str>> = rows.iter().map(|r| r.city.as_deref()).collect();
        assert_eq!(cities, vec![Some("rio de janeiro"), Some("sao paulo"), None, Some("belo horizonte")]);

        let sp = &rows[1];
        assert_eq!(sp.order_volume, 3);
        assert_eq!(sp.revenue_loss, 100.0);
        assert_eq!(sp.late_pct, 33.33);

        let unknown = &rows[2];
        assert_eq!(unknown.order_volume, 1);
        assert_eq!(unknown.late_pct, 100.0);
        assert!(rows.windows(2).all(|w| w[0].revenue_loss >= w[1].revenue_loss));
    }

    #[test]
    fn late_share_is_counted_per_group() {
        let orders: Vec<EnrichedOrder> = (0..1000)
            .map(|i| enriched(&format!("o{i}"), Some("fortaleza"), Some(1), 2.0, i % 8 == 0))
            .collect();
        let rows = city_risk_matrix(&orders, 10);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].order_volume, 1000);
        assert_eq!(rows[0].late_pct, 12.5);
        assert_eq!(rows[0].revenue_loss, 250.0);
    }

    #[test]
    fn city_matrix_truncates_to_top_n() {
        let rows = city_risk_matrix(&sample(), 2);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].revenue_loss, 200.0);
    }

    #[test]
    fn equal_losses_keep_key_order_with_missing_last() {
        let orders = vec![
            enriched("o1", None, Some(1), 0.0, false),
            enriched("o2", Some("recife"), Some(1), 0.0, false),
            enriched("o3", Some("campinas"), Some(1), 0.0, false),
        ];
        let rows = city_risk_matrix(&orders, 10);
        let cities: Vec<Option<&str>> = rows.iter().map(|r| r.city.as_deref()).collect();
        assert_eq!(cities, vec![Some("campinas"), Some("recife"), None]);
    }

    #[test]
    fn seller_city_table_splits_by_seller_count() {
        let rows = seller_city_risk(&sample(), 15);
        assert_eq!(rows.len(), 5);
        assert_eq!(rows[0].city.as_deref(), Some("rio de janeiro"));
        assert_eq!(rows[1].city.as_deref(), Some("sao paulo"));
        assert_eq!(rows[1].seller_count, Some(1));
        assert_eq!(rows[1].orders, 2);
        assert_eq!(rows[1].late_pct, 50.0);
        assert_eq!(rows[2].city, None);
        assert_eq!(rows[2].seller_count, None);
        // zero-loss groups keep key order: belo horizonte before sao paulo/2
        assert_eq!(rows[3].city.as_deref(), Some("belo horizonte"));
        assert_eq!(rows[4].seller_count, Some(2));
        assert!(seller_city_risk(&sample(), 3).len() == 3);
    }

    #[test]
    fn summary_wires_benchmark_and_critical_threshold() {
        let orders = sample();
        let late = orders.iter().filter(|o| o.is_late).count() as f64;
        let diag = Diagnostics {
            otd_rate: (1.0 - late / orders.len() as f64) * 100.0,
            orders,
        };
        let config = AnalysisConfig::default();
        let cities = city_risk_matrix(&diag.orders, config.city_top_n);
        let summary = generate_summary(&diag, &cities, &config);

        assert_eq!(summary.delivered_orders, 6);
        assert!(!summary.meets_benchmark);
        assert_eq!(summary.total_revenue_at_risk, 375.0);
        assert_eq!(summary.avg_wait_time, 5.0);
        assert_eq!(summary.critical_cities, vec!["rio de janeiro", "sao paulo", "(unknown)"]);
    }
}
