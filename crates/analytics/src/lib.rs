//! Aggregation engine for the invoice dashboard.
//!
//! Every view is a pure function over records loaded from the store plus the
//! current calendar day. Nothing here performs IO or mutates its input; the
//! caller owns loading, timeouts and error mapping.
//!
//! - `aging`: unpaid invoices bucketed by due date (cash outflow)
//! - `trends`: invoices per issue month over the trailing year
//! - `categories`: line-item spend per category
//! - `vendors`: top vendors by total spend
//! - `summary`: portfolio count / spend / average
//! - `search`: free-text invoice lookup joined with vendor names

pub mod aging;
pub mod categories;
pub mod search;
pub mod summary;
pub mod trends;
pub mod vendors;

#[cfg(test)]
pub(crate) mod test_support;

pub use aging::{cash_outflow, AgingBucket, CashOutflowRow};
pub use categories::{category_spend, CategorySpendRow};
pub use search::{search_invoices, InvoiceSearchRow, InvoiceWithVendor, QueryError, SearchQuery, MAX_QUERY_CHARS};
pub use summary::{summary_stats, InvoiceTotals, SummaryStats};
pub use trends::{invoice_trends, TrendRow, TREND_WINDOW_MONTHS};
pub use vendors::{rank_vendors, top_vendor_rows, TopVendorRow, VendorTotal, TOP_VENDOR_LIMIT, UNKNOWN_VENDOR};
