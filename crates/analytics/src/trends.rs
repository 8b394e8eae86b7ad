//! Monthly invoice trends over the trailing year.

use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};
use serde::Serialize;

use spendlens_core::date::{month_key, months_before};
use spendlens_core::Money;
use spendlens_invoicing::Invoice;

/// Length of the trend window, in calendar months.
pub const TREND_WINDOW_MONTHS: u32 = 12;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendRow {
    /// `YYYY-MM`.
    pub month: String,
    pub count: u64,
    /// Two-decimal total (exact, since amounts are summed in cents).
    pub total: f64,
}

/// Count and sum invoices per issue month.
///
/// Only invoices issued on or after `today - 12 months` are counted. Rows are
/// ascending by month and only months with at least one invoice appear.
pub fn invoice_trends(invoices: &[Invoice], today: NaiveDate) -> Vec<TrendRow> {
    let window_start = months_before(today, TREND_WINDOW_MONTHS);
    let mut months: BTreeMap<NaiveDate, (u64, Money)> = BTreeMap::new();

    for inv in invoices.iter().filter(|i| i.issue_date >= window_start) {
        let first_of_month = inv.issue_date.with_day(1).unwrap_or(inv.issue_date);
        let entry = months.entry(first_of_month).or_default();
        entry.0 += 1;
        entry.1 += inv.total_amount;
    }

    months
        .into_iter()
        .map(|(month, (count, total))| TrendRow {
            month: month_key(month),
            count,
            total: total.to_major(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{invoice, today, vendor};
    use proptest::prelude::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn groups_by_month_ascending() {
        let v = vendor("Acme");
        let invoices = vec![
            invoice(v.id, 1_050, d(2025, 5, 20), d(2025, 6, 20)),
            invoice(v.id, 2_001, d(2025, 3, 1), d(2025, 4, 1)),
            invoice(v.id, 999, d(2025, 5, 2), d(2025, 6, 2)),
        ];

        let rows = invoice_trends(&invoices, today());
        assert_eq!(
            rows,
            vec![
                TrendRow { month: "2025-03".to_string(), count: 1, total: 20.01 },
                TrendRow { month: "2025-05".to_string(), count: 2, total: 20.49 },
            ]
        );
    }

    #[test]
    fn window_start_is_inclusive() {
        let v = vendor("Acme");
        let invoices = vec![
            invoice(v.id, 100, d(2024, 6, 15), d(2024, 7, 15)),
            invoice(v.id, 100, d(2024, 6, 14), d(2024, 7, 14)),
        ];

        let rows = invoice_trends(&invoices, today());
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].month, "2024-06");
        assert_eq!(rows[0].count, 1);
    }

    #[test]
    fn serializes_with_month_key() {
        let row = TrendRow { month: "2025-01".to_string(), count: 3, total: 10.5 };
        assert_eq!(
            serde_json::to_value(&row).unwrap(),
            serde_json::json!({ "month": "2025-01", "count": 3, "total": 10.5 })
        );
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        /// Counts add up to the invoices inside the window, and no month
        /// precedes the window.
        #[test]
        fn counts_match_window(ages in prop::collection::vec(0i64..800i64, 0..60)) {
            let v = vendor("Acme");
            let invoices: Vec<_> = ages
                .iter()
                .map(|age| {
                    let issued = today() - chrono::Duration::days(*age);
                    invoice(v.id, 100, issued, issued)
                })
                .collect();

            let rows = invoice_trends(&invoices, today());
            let window_start = months_before(today(), TREND_WINDOW_MONTHS);
            let expected = invoices.iter().filter(|i| i.issue_date >= window_start).count() as u64;

            prop_assert_eq!(rows.iter().map(|r| r.count).sum::<u64>(), expected);
            for row in &rows {
                prop_assert!(row.month >= month_key(window_start));
                prop_assert!(row.month <= month_key(today()));
            }
            for pair in rows.windows(2) {
                prop_assert!(pair[0].month < pair[1].month);
            }
        }
    }
}
