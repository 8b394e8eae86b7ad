//! Free-text invoice search.

use serde::Serialize;
use thiserror::Error;

use spendlens_core::InvoiceId;
use spendlens_invoicing::{Invoice, InvoiceStatus};

use crate::vendors::UNKNOWN_VENDOR;

/// Longest accepted search term, in characters.
pub const MAX_QUERY_CHARS: usize = 200;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum QueryError {
    #[error("search term exceeds {MAX_QUERY_CHARS} characters")]
    TooLong,

    #[error("search term contains control characters")]
    ControlCharacters,
}

/// Normalized search term. Absent and empty queries match every invoice.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchQuery {
    needle: String,
}

impl SearchQuery {
    pub fn parse(raw: Option<&str>) -> Result<Self, QueryError> {
        let raw = raw.unwrap_or_default();
        if raw.chars().count() > MAX_QUERY_CHARS {
            return Err(QueryError::TooLong);
        }
        if raw.chars().any(char::is_control) {
            return Err(QueryError::ControlCharacters);
        }
        Ok(Self { needle: raw.to_lowercase() })
    }

    pub fn is_empty(&self) -> bool {
        self.needle.is_empty()
    }

    fn matches(&self, haystack: &str) -> bool {
        haystack.to_lowercase().contains(&self.needle)
    }
}

/// Invoice joined with its vendor's name (`None` when the vendor is gone).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvoiceWithVendor {
    pub invoice: Invoice,
    pub vendor_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceSearchRow {
    pub id: InvoiceId,
    pub invoice_number: String,
    /// `YYYY-MM-DD`.
    pub issue_date: String,
    pub status: InvoiceStatus,
    pub total_amount: f64,
    pub vendor_name: String,
}

impl From<InvoiceWithVendor> for InvoiceSearchRow {
    fn from(row: InvoiceWithVendor) -> Self {
        let InvoiceWithVendor { invoice, vendor_name } = row;
        Self {
            id: invoice.id,
            invoice_number: invoice.invoice_number,
            issue_date: invoice.issue_date.format("%Y-%m-%d").to_string(),
            status: invoice.status,
            total_amount: invoice.total_amount.to_major(),
            vendor_name: vendor_name.unwrap_or_else(|| UNKNOWN_VENDOR.to_string()),
        }
    }
}

/// Invoices whose vendor name or invoice number contains the query
/// (case-insensitive), newest issue date first.
///
/// A missing vendor never matches on name; the invoice number still can.
/// Same-day invoices are ordered by invoice number.
pub fn search_invoices(rows: Vec<InvoiceWithVendor>, query: &SearchQuery) -> Vec<InvoiceSearchRow> {
    let mut hits: Vec<InvoiceWithVendor> = rows
        .into_iter()
        .filter(|row| {
            query.is_empty()
                || query.matches(&row.invoice.invoice_number)
                || row.vendor_name.as_deref().is_some_and(|name| query.matches(name))
        })
        .collect();

    hits.sort_by(|a, b| {
        b.invoice
            .issue_date
            .cmp(&a.invoice.issue_date)
            .then_with(|| a.invoice.invoice_number.cmp(&b.invoice.invoice_number))
    });

    hits.into_iter().map(InvoiceSearchRow::from).collect()
}
