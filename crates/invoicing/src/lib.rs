//! Invoicing domain module.
//!
//! Vendors, invoices and their line items, plus the validation rules applied
//! before a record may enter the store. No IO, no HTTP, no storage.

pub mod invoice;
pub mod line_item;
pub mod vendor;

pub use invoice::{Invoice, InvoiceStatus, NewInvoice, DEFAULT_CURRENCY};
pub use line_item::{LineItem, NewLineItem};
pub use vendor::{NewVendor, Vendor};
