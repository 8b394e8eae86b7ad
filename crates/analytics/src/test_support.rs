use chrono::{Duration, NaiveDate};

use spendlens_core::{InvoiceId, LineItemId, Money, VendorId};
use spendlens_invoicing::{Invoice, InvoiceStatus, LineItem, Vendor, DEFAULT_CURRENCY};

pub fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 6, 15).unwrap()
}

pub fn days_from_today(days: i64) -> NaiveDate {
    today() + Duration::days(days)
}

pub fn vendor(name: &str) -> Vendor {
    Vendor {
        id: VendorId::new(),
        name: name.to_string(),
        address: None,
        tax_id: None,
    }
}

pub fn invoice(vendor_id: VendorId, cents: i64, issue: NaiveDate, due: NaiveDate) -> Invoice {
    Invoice {
        id: InvoiceId::new(),
        invoice_number: format!("INV-{cents}"),
        issue_date: issue,
        due_date: due,
        total_amount: Money::from_cents(cents),
        currency: DEFAULT_CURRENCY.to_string(),
        status: InvoiceStatus::Pending,
        vendor_id,
    }
}

pub fn line_item(category: &str, cents: i64) -> LineItem {
    LineItem {
        id: LineItemId::new(),
        description: "line".to_string(),
        quantity: 1.0,
        unit_price: Money::from_cents(cents),
        category: category.to_string(),
        invoice_id: InvoiceId::new(),
    }
}
