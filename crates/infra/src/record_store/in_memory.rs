use std::collections::{BTreeMap, HashMap};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use chrono::NaiveDate;

use spendlens_analytics::InvoiceWithVendor;
use spendlens_core::{InvoiceId, LineItemId, VendorId};
use spendlens_invoicing::{Invoice, LineItem, NewInvoice, NewLineItem, NewVendor, Vendor};

use super::{RecordStore, RecordWriter, StoreError};

#[derive(Debug, Default)]
struct Records {
    vendors: HashMap<VendorId, Vendor>,
    vendor_ids_by_name: HashMap<String, VendorId>,
    invoices: BTreeMap<InvoiceId, Invoice>,
    line_items: Vec<LineItem>,
}

/// In-memory record store.
///
/// Intended for tests/dev. Every read takes a single read lock, so each call
/// sees one consistent snapshot.
#[derive(Debug, Default)]
pub struct InMemoryRecordStore {
    inner: RwLock<Records>,
}

impl InMemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Records>, StoreError> {
        self.inner
            .read()
            .map_err(|_| StoreError::Unavailable("lock poisoned".to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Records>, StoreError> {
        self.inner
            .write()
            .map_err(|_| StoreError::Unavailable("lock poisoned".to_string()))
    }

    /// Insert an invoice that references `vendor_id` without checking that
    /// the vendor exists. Lets tests model dangling vendor references.
    #[cfg(test)]
    pub(crate) fn insert_unchecked(&self, invoice: Invoice) {
        if let Ok(mut records) = self.inner.write() {
            records.invoices.insert(invoice.id, invoice);
        }
    }
}

#[async_trait]
impl RecordStore for InMemoryRecordStore {
    async fn unpaid_invoices(&self) -> Result<Vec<Invoice>, StoreError> {
        let records = self.read()?;
        Ok(records
            .invoices
            .values()
            .filter(|i| i.status.is_unpaid())
            .cloned()
            .collect())
    }

    async fn invoices_issued_since(&self, since: NaiveDate) -> Result<Vec<Invoice>, StoreError> {
        let records = self.read()?;
        Ok(records
            .invoices
            .values()
            .filter(|i| i.issue_date >= since)
            .cloned()
            .collect())
    }

    async fn all_invoices(&self) -> Result<Vec<Invoice>, StoreError> {
        Ok(self.read()?.invoices.values().cloned().collect())
    }

    async fn line_items(&self) -> Result<Vec<LineItem>, StoreError> {
        Ok(self.read()?.line_items.clone())
    }

    async fn vendors_by_ids(&self, ids: &[VendorId]) -> Result<Vec<Vendor>, StoreError> {
        let records = self.read()?;
        Ok(ids
            .iter()
            .filter_map(|id| records.vendors.get(id).cloned())
            .collect())
    }

    async fn invoices_with_vendor_names(&self) -> Result<Vec<InvoiceWithVendor>, StoreError> {
        let records = self.read()?;
        Ok(records
            .invoices
            .values()
            .map(|invoice| InvoiceWithVendor {
                vendor_name: records.vendors.get(&invoice.vendor_id).map(|v| v.name.clone()),
                invoice: invoice.clone(),
            })
            .collect())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.read().map(|_| ())
    }
}

#[async_trait]
impl RecordWriter for InMemoryRecordStore {
    async fn upsert_vendor(&self, vendor: NewVendor) -> Result<Vendor, StoreError> {
        vendor.validate()?;
        let mut records = self.write()?;

        if let Some(existing) = records
            .vendor_ids_by_name
            .get(&vendor.name)
            .and_then(|id| records.vendors.get(id))
        {
            return Ok(existing.clone());
        }

        let stored = vendor.into_vendor(VendorId::new())?;
        records.vendor_ids_by_name.insert(stored.name.clone(), stored.id);
        records.vendors.insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn insert_invoice(
        &self,
        invoice: NewInvoice,
        line_items: Vec<NewLineItem>,
    ) -> Result<Invoice, StoreError> {
        // Validate everything before taking the lock so a bad line leaves no trace.
        let stored = invoice.into_invoice(InvoiceId::new())?;
        let lines = line_items
            .into_iter()
            .map(|line| line.into_line_item(LineItemId::new(), stored.id))
            .collect::<Result<Vec<_>, _>>()?;

        let mut records = self.write()?;
        if !records.vendors.contains_key(&stored.vendor_id) {
            return Err(StoreError::Query(format!(
                "invoice {} references unknown vendor {}",
                stored.invoice_number, stored.vendor_id
            )));
        }
        records.invoices.insert(stored.id, stored.clone());
        records.line_items.extend(lines);
        Ok(stored)
    }

    async fn clear(&self) -> Result<(), StoreError> {
        let mut records = self.write()?;
        records.line_items.clear();
        records.invoices.clear();
        records.vendors.clear();
        records.vendor_ids_by_name.clear();
        Ok(())
    }
}
