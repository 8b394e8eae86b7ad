//! Top vendors by total invoiced amount.
//!
//! Ranking happens in two phases so the name lookup only touches the vendors
//! that made the cut:
//!
//! 1. `rank_vendors` groups invoices by vendor, sums totals and keeps the top N
//!    (descending; equal totals ordered by vendor id ascending).
//! 2. `top_vendor_rows` resolves names and re-sorts ascending for the chart.

use std::collections::HashMap;

use serde::Serialize;

use spendlens_core::{index_by_id, Money, VendorId};
use spendlens_invoicing::{Invoice, Vendor};

/// Number of vendors shown in the ranking.
pub const TOP_VENDOR_LIMIT: usize = 10;

/// Label used when an invoice points at a vendor that no longer resolves.
pub const UNKNOWN_VENDOR: &str = "Unknown";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VendorTotal {
    pub vendor_id: VendorId,
    pub total: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopVendorRow {
    pub name: String,
    pub total: f64,
}

/// Phase 1: per-vendor sums, highest first, truncated to `limit`.
pub fn rank_vendors(invoices: &[Invoice], limit: usize) -> Vec<VendorTotal> {
    let mut sums: HashMap<VendorId, Money> = HashMap::new();
    for inv in invoices {
        *sums.entry(inv.vendor_id).or_default() += inv.total_amount;
    }

    let mut ranked: Vec<VendorTotal> = sums
        .into_iter()
        .map(|(vendor_id, total)| VendorTotal { vendor_id, total })
        .collect();
    ranked.sort_by(|a, b| b.total.cmp(&a.total).then_with(|| a.vendor_id.cmp(&b.vendor_id)));
    ranked.truncate(limit);
    ranked
}

/// Phase 2: join ranked totals to vendor names and order ascending by total.
///
/// `vendors` may contain more or fewer entries than `ranked`; ids without a
/// match render as `UNKNOWN_VENDOR`. Equal totals are ordered by name.
pub fn top_vendor_rows(ranked: &[VendorTotal], vendors: &[Vendor]) -> Vec<TopVendorRow> {
    let by_id = index_by_id(vendors);

    let mut joined: Vec<(Money, &str)> = ranked
        .iter()
        .map(|r| {
            let name = by_id
                .get(&r.vendor_id)
                .map_or(UNKNOWN_VENDOR, |v| v.name.as_str());
            (r.total, name)
        })
        .collect();
    joined.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(b.1)));

    joined
        .into_iter()
        .map(|(total, name)| TopVendorRow {
            name: name.to_string(),
            total: total.to_major(),
        })
        .collect()
}
