//! Postgres-backed record store.
//!
//! ## Schema
//!
//! `ensure_schema()` creates three tables if they are missing:
//!
//! - `vendors` (unique `name`)
//! - `invoices` (`vendor_id` references `vendors`)
//! - `line_items` (`invoice_id` references `invoices`, `ON DELETE CASCADE`)
//!
//! Amounts are `BIGINT` cents and dates are `DATE`, so rows map onto the
//! domain types without rounding.
//!
//! ## Error Mapping
//!
//! | SQLx Error | StoreError |
//! |------------|------------|
//! | `PoolTimedOut`, `PoolClosed`, `Io`, `Tls` | `Unavailable` |
//! | `Database`, `Decode`, `ColumnNotFound`, other | `Query` |

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Row};
use tracing::{instrument, Span};
use uuid::Uuid;

use spendlens_analytics::{InvoiceTotals, InvoiceWithVendor};
use spendlens_core::{InvoiceId, LineItemId, Money, VendorId};
use spendlens_invoicing::{
    Invoice, InvoiceStatus, LineItem, NewInvoice, NewLineItem, NewVendor, Vendor,
};

use super::{RecordStore, RecordWriter, StoreError};

const SCHEMA: [&str; 5] = [
    r#"
    CREATE TABLE IF NOT EXISTS vendors (
        id UUID PRIMARY KEY,
        name TEXT NOT NULL UNIQUE,
        address TEXT,
        tax_id TEXT
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS invoices (
        id UUID PRIMARY KEY,
        invoice_number TEXT NOT NULL,
        issue_date DATE NOT NULL,
        due_date DATE NOT NULL,
        total_amount_cents BIGINT NOT NULL CHECK (total_amount_cents >= 0),
        currency TEXT NOT NULL,
        status TEXT NOT NULL,
        vendor_id UUID NOT NULL REFERENCES vendors (id)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS line_items (
        id UUID PRIMARY KEY,
        invoice_id UUID NOT NULL REFERENCES invoices (id) ON DELETE CASCADE,
        description TEXT NOT NULL,
        quantity DOUBLE PRECISION NOT NULL,
        unit_price_cents BIGINT NOT NULL,
        category TEXT NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS invoices_vendor_id_idx ON invoices (vendor_id)",
    "CREATE INDEX IF NOT EXISTS invoices_issue_date_idx ON invoices (issue_date)",
];

const INVOICE_COLUMNS: &str = r#"
    i.id,
    i.invoice_number,
    i.issue_date,
    i.due_date,
    i.total_amount_cents,
    i.currency,
    i.status,
    i.vendor_id
"#;

/// Postgres-backed record store.
///
/// Uses the SQLx connection pool, which is `Send + Sync`; clones share it.
#[derive(Debug, Clone)]
pub struct PostgresRecordStore {
    pool: Arc<PgPool>,
}

impl PostgresRecordStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    /// Open a pool against `database_url`.
    ///
    /// `acquire_timeout` bounds how long a call waits for a free connection;
    /// exceeding it surfaces as `StoreError::Unavailable`.
    pub async fn connect(
        database_url: &str,
        max_connections: u32,
        acquire_timeout: Duration,
    ) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(acquire_timeout)
            .connect(database_url)
            .await
            .map_err(|e| map_sqlx_error("connect", e))?;
        Ok(Self::new(pool))
    }

    /// Create tables and indexes if they do not exist yet.
    #[instrument(skip(self), err)]
    pub async fn ensure_schema(&self) -> Result<(), StoreError> {
        for statement in SCHEMA {
            sqlx::query(statement)
                .execute(&*self.pool)
                .await
                .map_err(|e| map_sqlx_error("ensure_schema", e))?;
        }
        Ok(())
    }

    /// Close the pool, waiting for checked-out connections to return.
    pub async fn close(&self) {
        self.pool.close().await;
    }

    async fn fetch_invoices(
        &self,
        operation: &'static str,
        filter: &str,
        since: Option<NaiveDate>,
    ) -> Result<Vec<Invoice>, StoreError> {
        let sql = format!("SELECT {INVOICE_COLUMNS} FROM invoices i {filter}");
        let mut query = sqlx::query(&sql);
        if let Some(since) = since {
            query = query.bind(since);
        }

        let rows = query
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error(operation, e))?;

        Span::current().record("row_count", rows.len());
        rows.iter().map(invoice_from_row).collect()
    }
}

#[async_trait]
impl RecordStore for PostgresRecordStore {
    #[instrument(skip(self), fields(row_count = tracing::field::Empty), err)]
    async fn unpaid_invoices(&self) -> Result<Vec<Invoice>, StoreError> {
        self.fetch_invoices(
            "unpaid_invoices",
            "WHERE i.status IN ('PENDING', 'OVERDUE')",
            None,
        )
        .await
    }

    #[instrument(skip(self), fields(row_count = tracing::field::Empty), err)]
    async fn invoices_issued_since(&self, since: NaiveDate) -> Result<Vec<Invoice>, StoreError> {
        self.fetch_invoices("invoices_issued_since", "WHERE i.issue_date >= $1", Some(since))
            .await
    }

    #[instrument(skip(self), fields(row_count = tracing::field::Empty), err)]
    async fn all_invoices(&self) -> Result<Vec<Invoice>, StoreError> {
        self.fetch_invoices("all_invoices", "", None).await
    }

    #[instrument(skip(self), err)]
    async fn invoice_totals(&self) -> Result<InvoiceTotals, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT
                COUNT(*) AS invoice_count,
                COALESCE(SUM(total_amount_cents), 0)::BIGINT AS total_cents
            FROM invoices
            "#,
        )
        .fetch_one(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("invoice_totals", e))?;

        let count: i64 = row.try_get("invoice_count").map_err(|e| map_sqlx_error("invoice_totals", e))?;
        let total: i64 = row.try_get("total_cents").map_err(|e| map_sqlx_error("invoice_totals", e))?;
        Ok(InvoiceTotals {
            count: u64::try_from(count).unwrap_or_default(),
            total: Money::from_cents(total),
        })
    }

    #[instrument(skip(self), fields(row_count = tracing::field::Empty), err)]
    async fn line_items(&self) -> Result<Vec<LineItem>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT
                id,
                invoice_id,
                description,
                quantity,
                unit_price_cents,
                category
            FROM line_items
            "#,
        )
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("line_items", e))?;

        Span::current().record("row_count", rows.len());
        rows.iter()
            .map(|row| -> Result<LineItem, StoreError> {
                Ok(LineItem {
                    id: LineItemId::from_uuid(get(row, "id")?),
                    invoice_id: InvoiceId::from_uuid(get(row, "invoice_id")?),
                    description: get(row, "description")?,
                    quantity: get(row, "quantity")?,
                    unit_price: Money::from_cents(get(row, "unit_price_cents")?),
                    category: get(row, "category")?,
                })
            })
            .collect()
    }

    #[instrument(skip(self, ids), fields(requested = ids.len()), err)]
    async fn vendors_by_ids(&self, ids: &[VendorId]) -> Result<Vec<Vendor>, StoreError> {
        if ids.is_empty() {
            return Ok(vec![]);
        }
        let uuids: Vec<Uuid> = ids.iter().map(|id| *id.as_uuid()).collect();

        let rows = sqlx::query(
            r#"
            SELECT id, name, address, tax_id
            FROM vendors
            WHERE id = ANY($1)
            "#,
        )
        .bind(uuids)
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("vendors_by_ids", e))?;

        rows.iter().map(vendor_from_row).collect()
    }

    #[instrument(skip(self), fields(row_count = tracing::field::Empty), err)]
    async fn invoices_with_vendor_names(&self) -> Result<Vec<InvoiceWithVendor>, StoreError> {
        let sql = format!(
            "SELECT {INVOICE_COLUMNS}, v.name AS vendor_name \
             FROM invoices i LEFT JOIN vendors v ON v.id = i.vendor_id"
        );
        let rows = sqlx::query(&sql)
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("invoices_with_vendor_names", e))?;

        Span::current().record("row_count", rows.len());
        rows.iter()
            .map(|row| -> Result<InvoiceWithVendor, StoreError> {
                Ok(InvoiceWithVendor {
                    invoice: invoice_from_row(row)?,
                    vendor_name: get(row, "vendor_name")?,
                })
            })
            .collect()
    }

    #[instrument(skip(self), err)]
    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1")
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("ping", e))?;
        Ok(())
    }
}

#[async_trait]
impl RecordWriter for PostgresRecordStore {
    #[instrument(skip(self, vendor), fields(vendor_name = %vendor.name), err)]
    async fn upsert_vendor(&self, vendor: NewVendor) -> Result<Vendor, StoreError> {
        vendor.validate()?;

        // The no-op update makes RETURNING yield the existing row on conflict.
        let row = sqlx::query(
            r#"
            INSERT INTO vendors (id, name, address, tax_id)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (name)
            DO UPDATE SET name = EXCLUDED.name
            RETURNING id, name, address, tax_id
            "#,
        )
        .bind(*VendorId::new().as_uuid())
        .bind(&vendor.name)
        .bind(&vendor.address)
        .bind(&vendor.tax_id)
        .fetch_one(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("upsert_vendor", e))?;

        vendor_from_row(&row)
    }

    #[instrument(
        skip(self, invoice, line_items),
        fields(invoice_number = %invoice.invoice_number, line_count = line_items.len()),
        err
    )]
    async fn insert_invoice(
        &self,
        invoice: NewInvoice,
        line_items: Vec<NewLineItem>,
    ) -> Result<Invoice, StoreError> {
        let stored = invoice.into_invoice(InvoiceId::new())?;
        let lines = line_items
            .into_iter()
            .map(|line| line.into_line_item(LineItemId::new(), stored.id))
            .collect::<Result<Vec<_>, _>>()?;

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))?;

        sqlx::query(
            r#"
            INSERT INTO invoices (
                id,
                invoice_number,
                issue_date,
                due_date,
                total_amount_cents,
                currency,
                status,
                vendor_id
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(stored.id.as_uuid())
        .bind(&stored.invoice_number)
        .bind(stored.issue_date)
        .bind(stored.due_date)
        .bind(stored.total_amount.cents())
        .bind(&stored.currency)
        .bind(stored.status.as_str())
        .bind(stored.vendor_id.as_uuid())
        .execute(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("insert_invoice", e))?;

        for line in &lines {
            sqlx::query(
                r#"
                INSERT INTO line_items (
                    id,
                    invoice_id,
                    description,
                    quantity,
                    unit_price_cents,
                    category
                )
                VALUES ($1, $2, $3, $4, $5, $6)
                "#,
            )
            .bind(line.id.as_uuid())
            .bind(line.invoice_id.as_uuid())
            .bind(&line.description)
            .bind(line.quantity)
            .bind(line.unit_price.cents())
            .bind(&line.category)
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("insert_line_item", e))?;
        }

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))?;

        Ok(stored)
    }

    #[instrument(skip(self), err)]
    async fn clear(&self) -> Result<(), StoreError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))?;

        for table in ["line_items", "invoices", "vendors"] {
            sqlx::query(&format!("DELETE FROM {table}"))
                .execute(&mut *tx)
                .await
                .map_err(|e| map_sqlx_error("clear", e))?;
        }

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))
    }
}

fn get<'r, T>(row: &'r PgRow, column: &str) -> Result<T, StoreError>
where
    T: sqlx::Decode<'r, sqlx::Postgres> + sqlx::Type<sqlx::Postgres>,
{
    row.try_get(column)
        .map_err(|e| map_sqlx_error("decode_row", e))
}

fn invoice_from_row(row: &PgRow) -> Result<Invoice, StoreError> {
    let status: String = get(row, "status")?;
    let status = status
        .parse::<InvoiceStatus>()
        .map_err(|e| StoreError::Query(format!("invoices.status: {e}")))?;

    Ok(Invoice {
        id: InvoiceId::from_uuid(get(row, "id")?),
        invoice_number: get(row, "invoice_number")?,
        issue_date: get(row, "issue_date")?,
        due_date: get(row, "due_date")?,
        total_amount: Money::from_cents(get(row, "total_amount_cents")?),
        currency: get(row, "currency")?,
        status,
        vendor_id: VendorId::from_uuid(get(row, "vendor_id")?),
    })
}

fn vendor_from_row(row: &PgRow) -> Result<Vendor, StoreError> {
    Ok(Vendor {
        id: VendorId::from_uuid(get(row, "id")?),
        name: get(row, "name")?,
        address: get(row, "address")?,
        tax_id: get(row, "tax_id")?,
    })
}

fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::PoolTimedOut => {
            StoreError::Unavailable(format!("timed out acquiring a connection in {operation}"))
        }
        sqlx::Error::PoolClosed => {
            StoreError::Unavailable(format!("connection pool closed in {operation}"))
        }
        sqlx::Error::Io(e) => StoreError::Unavailable(format!("io error in {operation}: {e}")),
        sqlx::Error::Tls(e) => StoreError::Unavailable(format!("tls error in {operation}: {e}")),
        sqlx::Error::Database(db_err) => StoreError::Query(format!(
            "database error in {operation}: {}",
            db_err.message()
        )),
        other => StoreError::Query(format!("sqlx error in {operation}: {other}")),
    }
}
