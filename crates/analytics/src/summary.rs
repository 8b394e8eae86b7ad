//! Portfolio-wide totals for the dashboard header.

use serde::Serialize;

use spendlens_core::Money;
use spendlens_invoicing::Invoice;

/// Count and sum over every stored invoice, regardless of status or date.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InvoiceTotals {
    pub count: u64,
    pub total: Money,
}

impl InvoiceTotals {
    pub fn from_invoices(invoices: &[Invoice]) -> Self {
        Self {
            count: invoices.len() as u64,
            total: invoices.iter().map(|i| i.total_amount).sum(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryStats {
    pub total_spend: f64,
    pub total_invoices: u64,
    pub average_invoice_value: f64,
    /// Configured figure; not derived from stored data.
    pub documents_uploaded: u64,
}

pub fn summary_stats(totals: InvoiceTotals, documents_uploaded: u64) -> SummaryStats {
    let average_invoice_value = if totals.count == 0 {
        0.0
    } else {
        totals.total.to_major() / totals.count as f64
    };

    SummaryStats {
        total_spend: totals.total.to_major(),
        total_invoices: totals.count,
        average_invoice_value,
        documents_uploaded,
    }
}
