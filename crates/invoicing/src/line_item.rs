use spendlens_core::{DomainError, DomainResult, Entity, InvoiceId, LineItemId, Money};

/// Stored invoice line. Owned by exactly one invoice and removed with it.
#[derive(Debug, Clone, PartialEq)]
pub struct LineItem {
    pub id: LineItemId,
    pub description: String,
    pub quantity: f64,
    /// Carries the line total, not a per-unit price. May be negative on
    /// credit lines.
    pub unit_price: Money,
    pub category: String,
    pub invoice_id: InvoiceId,
}

impl Entity for LineItem {
    type Id = LineItemId;

    fn id(&self) -> LineItemId {
        self.id
    }
}

/// Line item about to be written alongside its invoice.
#[derive(Debug, Clone, PartialEq)]
pub struct NewLineItem {
    pub description: String,
    pub quantity: f64,
    pub unit_price: Money,
    pub category: String,
}

impl NewLineItem {
    pub fn validate(&self) -> DomainResult<()> {
        if !(self.quantity.is_finite() && self.quantity > 0.0) {
            return Err(DomainError::validation("line item quantity must be positive"));
        }
        if self.category.trim().is_empty() {
            return Err(DomainError::validation("line item category is required"));
        }
        Ok(())
    }

    pub fn into_line_item(self, id: LineItemId, invoice_id: InvoiceId) -> DomainResult<LineItem> {
        self.validate()?;
        Ok(LineItem {
            id,
            description: self.description,
            quantity: self.quantity,
            unit_price: self.unit_price,
            category: self.category,
            invoice_id,
        })
    }
}
