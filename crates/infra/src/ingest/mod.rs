//! Ingestion of extraction exports into the record store.
//!
//! Input is a JSON array of extraction documents. Each document becomes one
//! vendor (upserted by name), one invoice and zero or more line items.
//! Documents missing a required field are skipped; documents the store
//! rejects are counted as failed. Neither stops the run.

pub mod payload;

use std::path::Path;

use chrono::{Duration, NaiveDate};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{error, info, instrument, warn};

use spendlens_core::date::parse_calendar_date;
use spendlens_core::{DomainError, Money, VendorId};
use spendlens_invoicing::{InvoiceStatus, NewInvoice, NewLineItem, NewVendor, DEFAULT_CURRENCY};

use crate::record_store::{RecordWriter, StoreError};
use payload::{number, text, ExtractionDocument, LineItemSection};

/// Days added to the issue date when a document has no usable due date.
pub const DEFAULT_PAYMENT_TERM_DAYS: i64 = 30;

pub const DEFAULT_LINE_DESCRIPTION: &str = "N/A";
pub const DEFAULT_LINE_CATEGORY: &str = "Operations";

/// Failure that aborts a whole ingestion run.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("failed to read export: {0}")]
    Io(#[from] std::io::Error),

    #[error("export is not a JSON array: {0}")]
    Format(#[from] serde_json::Error),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Why a single document was skipped.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum SkipReason {
    #[error("document does not match the extraction layout: {0}")]
    Malformed(String),

    #[error("missing required field: {0}")]
    MissingField(&'static str),

    #[error("unparseable invoice date: {0}")]
    UnparseableDate(String),

    #[error(transparent)]
    Invalid(#[from] DomainError),
}

/// Outcome counts of an ingestion run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct IngestReport {
    pub processed: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// Invoice fields resolved from a document, waiting for the vendor id.
#[derive(Debug, Clone, PartialEq)]
pub struct InvoiceDraft {
    pub invoice_number: String,
    pub issue_date: NaiveDate,
    pub due_date: NaiveDate,
    pub total_amount: Money,
    pub currency: String,
    pub status: InvoiceStatus,
}

impl InvoiceDraft {
    pub fn for_vendor(self, vendor_id: VendorId) -> NewInvoice {
        NewInvoice {
            invoice_number: self.invoice_number,
            issue_date: self.issue_date,
            due_date: self.due_date,
            total_amount: self.total_amount,
            currency: self.currency,
            status: self.status,
            vendor_id,
        }
    }
}

/// Everything one document contributes to the store.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentRecords {
    pub vendor: NewVendor,
    pub invoice: InvoiceDraft,
    pub line_items: Vec<NewLineItem>,
}

/// Parse an export body into its documents without interpreting them.
pub fn parse_export(bytes: &[u8]) -> Result<Vec<Value>, IngestError> {
    Ok(serde_json::from_slice(bytes)?)
}

/// Map one document onto store records.
///
/// Status is derived from the due date: `PENDING` when it is on or after
/// `today`, `OVERDUE` otherwise.
pub fn map_document(doc: &ExtractionDocument, today: NaiveDate) -> Result<DocumentRecords, SkipReason> {
    let data = doc
        .llm_data()
        .ok_or(SkipReason::MissingField("extractedData.llmData"))?;
    let invoice = data.invoice();
    let vendor = data.vendor();
    let summary = data.summary();

    let vendor_name = vendor
        .and_then(|v| text(&v.vendor_name))
        .ok_or(SkipReason::MissingField("vendor.vendorName"))?;
    let invoice_number = invoice
        .and_then(|i| text(&i.invoice_id))
        .ok_or(SkipReason::MissingField("invoice.invoiceId"))?;
    let total = summary
        .and_then(|s| number(&s.invoice_total))
        .ok_or(SkipReason::MissingField("summary.invoiceTotal"))?;
    let raw_date = invoice
        .and_then(|i| text(&i.invoice_date))
        .ok_or(SkipReason::MissingField("invoice.invoiceDate"))?;

    let issue_date =
        parse_calendar_date(&raw_date).ok_or_else(|| SkipReason::UnparseableDate(raw_date.clone()))?;
    let due_date = data
        .payment()
        .and_then(|p| text(&p.due_date))
        .and_then(|raw| parse_calendar_date(&raw))
        .unwrap_or(issue_date + Duration::days(DEFAULT_PAYMENT_TERM_DAYS));

    let status = if due_date >= today {
        InvoiceStatus::Pending
    } else {
        InvoiceStatus::Overdue
    };

    let line_items = match data.line_items() {
        Some(items) => items.iter().filter_map(|item| map_line_item(item, doc)).collect(),
        None => vec![],
    };

    Ok(DocumentRecords {
        vendor: NewVendor {
            name: vendor_name,
            address: vendor.and_then(|v| text(&v.vendor_address)),
            tax_id: vendor.and_then(|v| text(&v.vendor_tax_id)),
        },
        invoice: InvoiceDraft {
            invoice_number,
            issue_date,
            due_date,
            total_amount: Money::from_major(total)?.abs(),
            currency: summary
                .and_then(|s| text(&s.currency_symbol))
                .unwrap_or_else(|| DEFAULT_CURRENCY.to_string()),
            status,
        },
        line_items,
    })
}

/// Line with per-field fallbacks. Entries that are not objects are dropped.
fn map_line_item(item: &Value, doc: &ExtractionDocument) -> Option<NewLineItem> {
    let section: LineItemSection = match serde_json::from_value(item.clone()) {
        Ok(section) => section,
        Err(err) => {
            warn!(document_id = %doc.display_id(), error = %err, "dropping malformed line item");
            return None;
        }
    };

    let unit_price = number(&section.unit_price)
        .and_then(|p| Money::from_major(p).ok())
        .unwrap_or_default();

    Some(NewLineItem {
        description: text(&section.description).unwrap_or_else(|| DEFAULT_LINE_DESCRIPTION.to_string()),
        quantity: number(&section.quantity).filter(|q| *q > 0.0).unwrap_or(1.0),
        unit_price,
        category: text(&section.category).unwrap_or_else(|| DEFAULT_LINE_CATEGORY.to_string()),
    })
}

/// Write `documents` through `writer`.
///
/// With `replace`, the store is cleared first; a failed clear aborts the run.
#[instrument(skip(writer, documents), fields(documents = documents.len()), err)]
pub async fn ingest_documents<W>(
    writer: &W,
    documents: Vec<Value>,
    today: NaiveDate,
    replace: bool,
) -> Result<IngestReport, IngestError>
where
    W: RecordWriter + ?Sized,
{
    if replace {
        writer.clear().await?;
        info!("cleared existing records");
    }

    let mut report = IngestReport::default();
    for raw in documents {
        let doc: ExtractionDocument = match serde_json::from_value(raw) {
            Ok(doc) => doc,
            Err(err) => {
                warn!(reason = %SkipReason::Malformed(err.to_string()), "skipping document");
                report.skipped += 1;
                continue;
            }
        };

        let records = match map_document(&doc, today) {
            Ok(records) => records,
            Err(reason) => {
                warn!(document_id = %doc.display_id(), %reason, "skipping document");
                report.skipped += 1;
                continue;
            }
        };

        match store_records(writer, records).await {
            Ok(()) => report.processed += 1,
            Err(err) => {
                error!(document_id = %doc.display_id(), error = %err, "failed to store document");
                report.failed += 1;
            }
        }
    }

    info!(
        processed = report.processed,
        skipped = report.skipped,
        failed = report.failed,
        "ingestion finished"
    );
    Ok(report)
}

async fn store_records<W>(writer: &W, records: DocumentRecords) -> Result<(), StoreError>
where
    W: RecordWriter + ?Sized,
{
    let vendor = writer.upsert_vendor(records.vendor).await?;
    writer
        .insert_invoice(records.invoice.for_vendor(vendor.id), records.line_items)
        .await?;
    Ok(())
}

/// Read an export file and ingest it.
pub async fn ingest_file<W>(
    writer: &W,
    path: &Path,
    today: NaiveDate,
    replace: bool,
) -> Result<IngestReport, IngestError>
where
    W: RecordWriter + ?Sized,
{
    let bytes = tokio::fs::read(path).await?;
    let documents = parse_export(&bytes)?;
    info!(path = %path.display(), documents = documents.len(), "loaded export");
    ingest_documents(writer, documents, today, replace).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record_store::{InMemoryRecordStore, RecordStore};
    use serde_json::json;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 15).unwrap()
    }

    fn document(id: &str, vendor: &str, number: &str, total: Value, date: &str) -> Value {
        json!({
            "_id": id,
            "extractedData": {
                "llmData": {
                    "invoice": { "value": {
                        "invoiceId": { "value": number, "confidence": 0.9 },
                        "invoiceDate": { "value": date }
                    }},
                    "vendor": { "value": {
                        "vendorName": { "value": vendor },
                        "vendorAddress": { "value": "Main St 1" },
                        "vendorTaxId": { "value": "" }
                    }},
                    "summary": { "value": {
                        "invoiceTotal": { "value": total }
                    }}
                }
            }
        })
    }

    fn parse(value: Value) -> ExtractionDocument {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn applies_fallbacks() {
        let doc = parse(document("d1", "Acme", "INV-1", json!(-120.5), "2025-05-01"));
        let records = map_document(&doc, today()).unwrap();

        assert_eq!(records.vendor.name, "Acme");
        assert_eq!(records.vendor.address.as_deref(), Some("Main St 1"));
        assert_eq!(records.vendor.tax_id, None);
        assert_eq!(records.invoice.total_amount, Money::from_cents(12_050));
        assert_eq!(records.invoice.currency, DEFAULT_CURRENCY);
        assert_eq!(records.invoice.due_date, NaiveDate::from_ymd_opt(2025, 5, 31).unwrap());
        assert_eq!(records.invoice.status, InvoiceStatus::Overdue);
        assert!(records.line_items.is_empty());
    }

    #[test]
    fn explicit_due_date_and_currency_win() {
        let mut raw = document("d1", "Acme", "INV-1", json!("80"), "2025-06-01T09:00:00Z");
        let llm = &mut raw["extractedData"]["llmData"];
        llm["payment"] = json!({ "value": { "dueDate": { "value": "2025-07-01" } } });
        llm["summary"]["value"]["currencySymbol"] = json!({ "value": "$" });

        let records = map_document(&parse(raw), today()).unwrap();
        assert_eq!(records.invoice.issue_date, NaiveDate::from_ymd_opt(2025, 6, 1).unwrap());
        assert_eq!(records.invoice.due_date, NaiveDate::from_ymd_opt(2025, 7, 1).unwrap());
        assert_eq!(records.invoice.currency, "$");
        assert_eq!(records.invoice.status, InvoiceStatus::Pending);
    }

    #[test]
    fn line_items_use_per_field_defaults() {
        let mut raw = document("d1", "Acme", "INV-1", json!(10), "2025-06-01");
        raw["extractedData"]["llmData"]["lineItems"] = json!({ "value": [
            { "description": { "value": "Hosting" }, "quantity": { "value": 2 },
              "unitPrice": { "value": 4.5 }, "category": { "value": "IT" } },
            { "quantity": { "value": 0 } },
            "not an object"
        ]});

        let records = map_document(&parse(raw), today()).unwrap();
        assert_eq!(
            records.line_items,
            vec![
                NewLineItem {
                    description: "Hosting".to_string(),
                    quantity: 2.0,
                    unit_price: Money::from_cents(450),
                    category: "IT".to_string(),
                },
                NewLineItem {
                    description: DEFAULT_LINE_DESCRIPTION.to_string(),
                    quantity: 1.0,
                    unit_price: Money::zero(),
                    category: DEFAULT_LINE_CATEGORY.to_string(),
                },
            ]
        );
    }

    #[test]
    fn missing_required_fields_skip() {
        let mut raw = document("d1", "Acme", "INV-1", json!(10), "2025-06-01");
        raw["extractedData"]["llmData"]["summary"] = json!({ "value": null });
        assert_eq!(
            map_document(&parse(raw), today()),
            Err(SkipReason::MissingField("summary.invoiceTotal"))
        );

        let raw = document("d2", "", "INV-2", json!(10), "2025-06-01");
        assert_eq!(
            map_document(&parse(raw), today()),
            Err(SkipReason::MissingField("vendor.vendorName"))
        );

        let raw = document("d3", "Acme", "INV-3", json!(10), "last tuesday");
        assert!(matches!(
            map_document(&parse(raw), today()),
            Err(SkipReason::UnparseableDate(_))
        ));
    }

    #[tokio::test]
    async fn ingest_counts_outcomes_and_reuses_vendors() {
        let store = InMemoryRecordStore::new();
        let docs = vec![
            document("d1", "Acme", "INV-1", json!(100), "2025-06-01"),
            document("d2", "Acme", "INV-2", json!(50), "2025-06-02"),
            document("d3", "Globex", "", json!(10), "2025-06-03"),
            json!("garbage"),
        ];

        let report = ingest_documents(&store, docs, today(), true).await.unwrap();
        assert_eq!(report, IngestReport { processed: 2, skipped: 2, failed: 0 });

        let invoices = store.all_invoices().await.unwrap();
        assert_eq!(invoices.len(), 2);
        assert_eq!(invoices[0].vendor_id, invoices[1].vendor_id);
    }

    #[tokio::test]
    async fn replace_clears_previous_run() {
        let store = InMemoryRecordStore::new();
        let docs = vec![document("d1", "Acme", "INV-1", json!(100), "2025-06-01")];

        ingest_documents(&store, docs.clone(), today(), true).await.unwrap();
        ingest_documents(&store, docs.clone(), today(), true).await.unwrap();
        assert_eq!(store.all_invoices().await.unwrap().len(), 1);

        ingest_documents(&store, docs, today(), false).await.unwrap();
        assert_eq!(store.all_invoices().await.unwrap().len(), 2);
    }

    #[test]
    fn export_must_be_an_array() {
        assert!(matches!(parse_export(b"{\"_id\": 1}"), Err(IngestError::Format(_))));
        assert_eq!(parse_export(b"[]").unwrap().len(), 0);
    }
}
