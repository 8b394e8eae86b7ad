use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use spendlens_core::{DomainError, DomainResult, Entity, InvoiceId, Money, VendorId};

/// Currency assumed when the source document names none.
pub const DEFAULT_CURRENCY: &str = "EUR";

/// Invoice payment status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum InvoiceStatus {
    Pending,
    Paid,
    Overdue,
}

impl InvoiceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvoiceStatus::Pending => "PENDING",
            InvoiceStatus::Paid => "PAID",
            InvoiceStatus::Overdue => "OVERDUE",
        }
    }

    /// Pending and overdue invoices still represent a future cash outflow.
    pub fn is_unpaid(&self) -> bool {
        matches!(self, InvoiceStatus::Pending | InvoiceStatus::Overdue)
    }
}

impl core::fmt::Display for InvoiceStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl core::str::FromStr for InvoiceStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "PENDING" => Ok(InvoiceStatus::Pending),
            "PAID" => Ok(InvoiceStatus::Paid),
            "OVERDUE" => Ok(InvoiceStatus::Overdue),
            other => Err(DomainError::validation(format!("unknown invoice status: {other}"))),
        }
    }
}

/// Stored invoice header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invoice {
    pub id: InvoiceId,
    pub invoice_number: String,
    pub issue_date: NaiveDate,
    /// Not guaranteed to be on or after `issue_date`.
    pub due_date: NaiveDate,
    /// Always non-negative.
    pub total_amount: Money,
    pub currency: String,
    pub status: InvoiceStatus,
    pub vendor_id: VendorId,
}

impl Entity for Invoice {
    type Id = InvoiceId;

    fn id(&self) -> InvoiceId {
        self.id
    }
}

/// Invoice about to be written (the store assigns the id).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewInvoice {
    pub invoice_number: String,
    pub issue_date: NaiveDate,
    pub due_date: NaiveDate,
    pub total_amount: Money,
    pub currency: String,
    pub status: InvoiceStatus,
    pub vendor_id: VendorId,
}

impl NewInvoice {
    pub fn validate(&self) -> DomainResult<()> {
        if self.invoice_number.trim().is_empty() {
            return Err(DomainError::validation("invoice number is required"));
        }
        if self.total_amount.is_negative() {
            return Err(DomainError::invariant("invoice total must not be negative"));
        }
        if self.currency.trim().is_empty() {
            return Err(DomainError::validation("currency must not be blank"));
        }
        Ok(())
    }

    /// Validate and attach an id.
    pub fn into_invoice(self, id: InvoiceId) -> DomainResult<Invoice> {
        self.validate()?;
        Ok(Invoice {
            id,
            invoice_number: self.invoice_number,
            issue_date: self.issue_date,
            due_date: self.due_date,
            total_amount: self.total_amount,
            currency: self.currency,
            status: self.status,
            vendor_id: self.vendor_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_invoice() -> NewInvoice {
        NewInvoice {
            invoice_number: "INV-1".to_string(),
            issue_date: NaiveDate::from_ymd_opt(2025, 1, 10).unwrap(),
            due_date: NaiveDate::from_ymd_opt(2025, 2, 9).unwrap(),
            total_amount: Money::from_cents(10_000),
            currency: DEFAULT_CURRENCY.to_string(),
            status: InvoiceStatus::Pending,
            vendor_id: VendorId::new(),
        }
    }

    #[test]
    fn negative_total_is_rejected() {
        let mut inv = new_invoice();
        inv.total_amount = Money::from_cents(-1);
        match inv.validate().unwrap_err() {
            DomainError::InvariantViolation(msg) => assert!(msg.contains("negative")),
            other => panic!("expected invariant violation, got {other:?}"),
        }
    }

    #[test]
    fn blank_invoice_number_is_rejected() {
        let mut inv = new_invoice();
        inv.invoice_number = "  ".to_string();
        assert!(matches!(inv.validate(), Err(DomainError::Validation(_))));
    }

    #[test]
    fn due_date_before_issue_date_is_accepted() {
        let mut inv = new_invoice();
        inv.due_date = NaiveDate::from_ymd_opt(2024, 12, 1).unwrap();
        let id = InvoiceId::new();
        let stored = inv.into_invoice(id).unwrap();
        assert_eq!(stored.id(), id);
    }

    #[test]
    fn status_serializes_uppercase_and_parses_any_case() {
        assert_eq!(serde_json::to_string(&InvoiceStatus::Overdue).unwrap(), "\"OVERDUE\"");
        assert_eq!("paid".parse::<InvoiceStatus>().unwrap(), InvoiceStatus::Paid);
        assert!("void".parse::<InvoiceStatus>().is_err());
    }

    #[test]
    fn only_pending_and_overdue_are_unpaid() {
        assert!(InvoiceStatus::Pending.is_unpaid());
        assert!(InvoiceStatus::Overdue.is_unpaid());
        assert!(!InvoiceStatus::Paid.is_unpaid());
    }
}
