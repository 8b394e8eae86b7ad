//! Cash-outflow aging.
//!
//! Unpaid invoices are classified by how many calendar days separate their due
//! date from today. Boundaries are inclusive and evaluated in order; anything
//! due before today lands in `Overdue`.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;

use spendlens_core::Money;
use spendlens_invoicing::Invoice;

/// Due-date bucket. Declaration order is the presentation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum AgingBucket {
    #[serde(rename = "Overdue")]
    Overdue,
    #[serde(rename = "0 - 7 days")]
    DueWithinWeek,
    #[serde(rename = "8 - 30 days")]
    DueWithinMonth,
    #[serde(rename = "31 - 60 days")]
    DueWithinTwoMonths,
    #[serde(rename = "60+ days")]
    DueLater,
}

impl AgingBucket {
    pub fn label(&self) -> &'static str {
        match self {
            AgingBucket::Overdue => "Overdue",
            AgingBucket::DueWithinWeek => "0 - 7 days",
            AgingBucket::DueWithinMonth => "8 - 30 days",
            AgingBucket::DueWithinTwoMonths => "31 - 60 days",
            AgingBucket::DueLater => "60+ days",
        }
    }

    pub fn sort_key(&self) -> u8 {
        match self {
            AgingBucket::Overdue => 0,
            AgingBucket::DueWithinWeek => 1,
            AgingBucket::DueWithinMonth => 2,
            AgingBucket::DueWithinTwoMonths => 3,
            AgingBucket::DueLater => 4,
        }
    }

    /// Classify a due date relative to `today`.
    pub fn classify(due_date: NaiveDate, today: NaiveDate) -> Self {
        match due_date.signed_duration_since(today).num_days() {
            0..=7 => AgingBucket::DueWithinWeek,
            8..=30 => AgingBucket::DueWithinMonth,
            31..=60 => AgingBucket::DueWithinTwoMonths,
            d if d > 60 => AgingBucket::DueLater,
            _ => AgingBucket::Overdue,
        }
    }
}

impl core::fmt::Display for AgingBucket {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.label())
    }
}

/// One row of the cash-outflow view.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CashOutflowRow {
    pub bucket: AgingBucket,
    pub total: f64,
}

/// Sum unpaid invoice totals per aging bucket.
///
/// Paid invoices are ignored even if the caller passes them in. Buckets with
/// no invoices are omitted; rows come back ordered by `AgingBucket::sort_key`.
pub fn cash_outflow(invoices: &[Invoice], today: NaiveDate) -> Vec<CashOutflowRow> {
    let mut totals: BTreeMap<AgingBucket, Money> = BTreeMap::new();

    for inv in invoices.iter().filter(|i| i.status.is_unpaid()) {
        let bucket = AgingBucket::classify(inv.due_date, today);
        *totals.entry(bucket).or_default() += inv.total_amount;
    }

    totals
        .into_iter()
        .map(|(bucket, total)| CashOutflowRow {
            bucket,
            total: total.to_major(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{days_from_today, invoice, today, vendor};
    use proptest::prelude::*;
    use spendlens_invoicing::InvoiceStatus;

    #[test]
    fn scenario_mixed_due_dates() {
        let v = vendor("Acme");
        let invoices = vec![
            invoice(v.id, 10_000, today(), days_from_today(3)),
            invoice(v.id, 5_000, today(), days_from_today(20)),
            invoice(v.id, 3_000, today(), days_from_today(-5)),
        ];

        let rows = cash_outflow(&invoices, today());
        assert_eq!(
            rows,
            vec![
                CashOutflowRow { bucket: AgingBucket::Overdue, total: 30.0 },
                CashOutflowRow { bucket: AgingBucket::DueWithinWeek, total: 100.0 },
                CashOutflowRow { bucket: AgingBucket::DueWithinMonth, total: 50.0 },
            ]
        );
    }

    #[test]
    fn boundaries_are_inclusive() {
        let t = today();
        assert_eq!(AgingBucket::classify(days_from_today(0), t), AgingBucket::DueWithinWeek);
        assert_eq!(AgingBucket::classify(days_from_today(7), t), AgingBucket::DueWithinWeek);
        assert_eq!(AgingBucket::classify(days_from_today(8), t), AgingBucket::DueWithinMonth);
        assert_eq!(AgingBucket::classify(days_from_today(30), t), AgingBucket::DueWithinMonth);
        assert_eq!(AgingBucket::classify(days_from_today(31), t), AgingBucket::DueWithinTwoMonths);
        assert_eq!(AgingBucket::classify(days_from_today(60), t), AgingBucket::DueWithinTwoMonths);
        assert_eq!(AgingBucket::classify(days_from_today(61), t), AgingBucket::DueLater);
        assert_eq!(AgingBucket::classify(days_from_today(-1), t), AgingBucket::Overdue);
    }

    #[test]
    fn paid_invoices_are_excluded() {
        let v = vendor("Acme");
        let mut paid = invoice(v.id, 9_900, today(), days_from_today(2));
        paid.status = InvoiceStatus::Paid;
        let mut overdue = invoice(v.id, 100, today(), days_from_today(90));
        overdue.status = InvoiceStatus::Overdue;

        let rows = cash_outflow(&[paid, overdue], today());
        assert_eq!(rows, vec![CashOutflowRow { bucket: AgingBucket::DueLater, total: 1.0 }]);
    }

    #[test]
    fn no_invoices_yields_no_rows() {
        assert!(cash_outflow(&[], today()).is_empty());
    }

    #[test]
    fn bucket_serializes_as_label() {
        let row = CashOutflowRow { bucket: AgingBucket::DueWithinTwoMonths, total: 12.5 };
        let json = serde_json::to_value(&row).unwrap();
        assert_eq!(json, serde_json::json!({ "bucket": "31 - 60 days", "total": 12.5 }));
    }

    #[test]
    fn sort_key_matches_declaration_order() {
        let all = [
            AgingBucket::Overdue,
            AgingBucket::DueWithinWeek,
            AgingBucket::DueWithinMonth,
            AgingBucket::DueWithinTwoMonths,
            AgingBucket::DueLater,
        ];
        for pair in all.windows(2) {
            assert!(pair[0] < pair[1]);
            assert!(pair[0].sort_key() < pair[1].sort_key());
        }
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        /// Rows are strictly ordered by sort key, never empty, and conserve the
        /// total of all unpaid invoices.
        #[test]
        fn rows_are_ordered_and_conserve_totals(
            offsets in prop::collection::vec((-400i64..400i64, 0i64..1_000_000i64), 0..40)
        ) {
            let v = vendor("Acme");
            let invoices: Vec<_> = offsets
                .iter()
                .map(|(days, cents)| invoice(v.id, *cents, today(), days_from_today(*days)))
                .collect();

            let rows = cash_outflow(&invoices, today());

            for pair in rows.windows(2) {
                prop_assert!(pair[0].bucket.sort_key() < pair[1].bucket.sort_key());
            }
            for row in &rows {
                let count = invoices
                    .iter()
                    .filter(|i| AgingBucket::classify(i.due_date, today()) == row.bucket)
                    .count();
                prop_assert!(count > 0);
            }

            let expected: i64 = offsets.iter().map(|(_, c)| *c).sum();
            let actual: f64 = rows.iter().map(|r| r.total).sum();
            prop_assert!((actual - expected as f64 / 100.0).abs() < 0.01);
        }

        /// Past-due invoices never land in a day-range bucket.
        #[test]
        fn past_due_is_always_overdue(days in 1i64..10_000i64) {
            prop_assert_eq!(
                AgingBucket::classify(days_from_today(-days), today()),
                AgingBucket::Overdue
            );
        }
    }
}
