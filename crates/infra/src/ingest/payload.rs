//! Serde model of one extraction-export document.
//!
//! Every level is optional. Leaves arrive wrapped as `{"value": ..., ...}`
//! alongside confidence metadata that is ignored here. Leaf values are kept as
//! raw JSON and read through [`text`] / [`number`], which accept the loose
//! typing exports show in practice (numbers as strings, ids as numbers).

use serde::Deserialize;
use serde_json::Value;

/// `{"value": T}` wrapper. A missing or `null` value reads as `None`.
#[derive(Debug, Clone, Deserialize)]
pub struct Wrapped<T> {
    pub value: Option<T>,
}

/// Optional wrapped leaf.
pub type Leaf = Option<Wrapped<Value>>;

#[derive(Debug, Clone, Deserialize)]
pub struct ExtractionDocument {
    #[serde(rename = "_id")]
    pub id: Option<Value>,
    #[serde(rename = "extractedData")]
    pub extracted_data: Option<ExtractedData>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExtractedData {
    #[serde(rename = "llmData")]
    pub llm_data: Option<LlmData>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LlmData {
    pub invoice: Option<Wrapped<InvoiceSection>>,
    pub vendor: Option<Wrapped<VendorSection>>,
    pub payment: Option<Wrapped<PaymentSection>>,
    pub summary: Option<Wrapped<SummarySection>>,
    /// Kept raw: only an array yields line items.
    pub line_items: Leaf,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceSection {
    pub invoice_id: Leaf,
    pub invoice_date: Leaf,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VendorSection {
    pub vendor_name: Leaf,
    pub vendor_address: Leaf,
    pub vendor_tax_id: Leaf,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentSection {
    pub due_date: Leaf,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummarySection {
    pub invoice_total: Leaf,
    pub currency_symbol: Leaf,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItemSection {
    pub description: Leaf,
    pub quantity: Leaf,
    pub unit_price: Leaf,
    pub category: Leaf,
}

impl ExtractionDocument {
    pub fn llm_data(&self) -> Option<&LlmData> {
        self.extracted_data.as_ref()?.llm_data.as_ref()
    }

    /// Printable document id for log lines.
    pub fn display_id(&self) -> String {
        match &self.id {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Object(map)) => map
                .get("$oid")
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| Value::Object(map.clone()).to_string()),
            Some(other) => other.to_string(),
            None => "<no id>".to_string(),
        }
    }
}

impl LlmData {
    pub fn invoice(&self) -> Option<&InvoiceSection> {
        self.invoice.as_ref()?.value.as_ref()
    }

    pub fn vendor(&self) -> Option<&VendorSection> {
        self.vendor.as_ref()?.value.as_ref()
    }

    pub fn payment(&self) -> Option<&PaymentSection> {
        self.payment.as_ref()?.value.as_ref()
    }

    pub fn summary(&self) -> Option<&SummarySection> {
        self.summary.as_ref()?.value.as_ref()
    }

    /// Raw line items, only when the wrapped value is an array.
    pub fn line_items(&self) -> Option<&Vec<Value>> {
        self.line_items.as_ref()?.value.as_ref()?.as_array()
    }
}

/// Non-blank text. Numbers are rendered with their JSON spelling.
pub fn text(leaf: &Leaf) -> Option<String> {
    match leaf.as_ref()?.value.as_ref()? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Finite number, from a JSON number or a numeric string.
pub fn number(leaf: &Leaf) -> Option<f64> {
    let n = match leaf.as_ref()?.value.as_ref()? {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    n.is_finite().then_some(n)
}
