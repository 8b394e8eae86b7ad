//! Record store: where vendors, invoices and line items live.
//!
//! The aggregation engine only ever reads through [`RecordStore`]. Writes go
//! through [`RecordWriter`], which ingestion is the sole user of.
//!
//! Two implementations ship with the crate:
//!
//! - [`InMemoryRecordStore`]: lock-guarded maps, used for dev and tests
//! - [`PostgresRecordStore`]: `sqlx` over a `PgPool`
//!
//! Both are `Send + Sync` and are meant to be shared behind an `Arc`.

pub mod in_memory;
pub mod postgres;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use thiserror::Error;

use spendlens_analytics::{InvoiceTotals, InvoiceWithVendor};
use spendlens_core::{DomainError, VendorId};
use spendlens_invoicing::{Invoice, LineItem, NewInvoice, NewLineItem, NewVendor, Vendor};

pub use in_memory::InMemoryRecordStore;
pub use postgres::PostgresRecordStore;

/// Store-level failure.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    /// The backend could not be reached (pool exhausted/closed, IO, TLS).
    #[error("record store unavailable: {0}")]
    Unavailable(String),

    /// The backend answered but the statement failed or returned bad rows.
    #[error("record store query failed: {0}")]
    Query(String),

    /// A record was rejected before it reached the backend.
    #[error(transparent)]
    Rejected(#[from] DomainError),
}

/// Read side of the record store.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Invoices with status `PENDING` or `OVERDUE`.
    async fn unpaid_invoices(&self) -> Result<Vec<Invoice>, StoreError>;

    /// Invoices with `issue_date >= since`.
    async fn invoices_issued_since(&self, since: NaiveDate) -> Result<Vec<Invoice>, StoreError>;

    async fn all_invoices(&self) -> Result<Vec<Invoice>, StoreError>;

    /// Count and sum over every invoice.
    ///
    /// The default loads every invoice; backends that can aggregate natively
    /// should override it.
    async fn invoice_totals(&self) -> Result<InvoiceTotals, StoreError> {
        let invoices = self.all_invoices().await?;
        Ok(InvoiceTotals::from_invoices(&invoices))
    }

    async fn line_items(&self) -> Result<Vec<LineItem>, StoreError>;

    /// Vendors matching `ids`. Unknown ids are omitted, not errors.
    async fn vendors_by_ids(&self, ids: &[VendorId]) -> Result<Vec<Vendor>, StoreError>;

    /// Every invoice with its vendor's name (`None` when the vendor is gone).
    async fn invoices_with_vendor_names(&self) -> Result<Vec<InvoiceWithVendor>, StoreError>;

    /// Cheap connectivity probe.
    async fn ping(&self) -> Result<(), StoreError>;
}

/// Write side, used by ingestion.
#[async_trait]
pub trait RecordWriter: Send + Sync {
    /// Insert a vendor keyed by its unique name. An existing vendor with the
    /// same name is returned unchanged.
    async fn upsert_vendor(&self, vendor: NewVendor) -> Result<Vendor, StoreError>;

    /// Insert an invoice and its line items atomically.
    async fn insert_invoice(
        &self,
        invoice: NewInvoice,
        line_items: Vec<NewLineItem>,
    ) -> Result<Invoice, StoreError>;

    /// Remove line items, invoices and vendors.
    async fn clear(&self) -> Result<(), StoreError>;
}

#[async_trait]
impl<S> RecordStore for Arc<S>
where
    S: RecordStore + ?Sized,
{
    async fn unpaid_invoices(&self) -> Result<Vec<Invoice>, StoreError> {
        (**self).unpaid_invoices().await
    }

    async fn invoices_issued_since(&self, since: NaiveDate) -> Result<Vec<Invoice>, StoreError> {
        (**self).invoices_issued_since(since).await
    }

    async fn all_invoices(&self) -> Result<Vec<Invoice>, StoreError> {
        (**self).all_invoices().await
    }

    async fn invoice_totals(&self) -> Result<InvoiceTotals, StoreError> {
        (**self).invoice_totals().await
    }

    async fn line_items(&self) -> Result<Vec<LineItem>, StoreError> {
        (**self).line_items().await
    }

    async fn vendors_by_ids(&self, ids: &[VendorId]) -> Result<Vec<Vendor>, StoreError> {
        (**self).vendors_by_ids(ids).await
    }

    async fn invoices_with_vendor_names(&self) -> Result<Vec<InvoiceWithVendor>, StoreError> {
        (**self).invoices_with_vendor_names().await
    }

    async fn ping(&self) -> Result<(), StoreError> {
        (**self).ping().await
    }
}

#[async_trait]
impl<S> RecordWriter for Arc<S>
where
    S: RecordWriter + ?Sized,
{
    async fn upsert_vendor(&self, vendor: NewVendor) -> Result<Vendor, StoreError> {
        (**self).upsert_vendor(vendor).await
    }

    async fn insert_invoice(
        &self,
        invoice: NewInvoice,
        line_items: Vec<NewLineItem>,
    ) -> Result<Invoice, StoreError> {
        (**self).insert_invoice(invoice, line_items).await
    }

    async fn clear(&self) -> Result<(), StoreError> {
        (**self).clear().await
    }
}
