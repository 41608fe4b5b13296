use serde::{Deserialize, Serialize};

use crate::error::AdmissionError;
use super::CatalogItem;

/// Comparison key for operator-typed identifiers: trimmed and lowercased.
///
/// Invoice numbers and serial numbers are case-insensitive everywhere in
/// the pipeline; two values are the same record iff their keys are equal.
pub fn fold_key(value: &str) -> String {
    value.trim().to_lowercase()
}

fn default_quantity() -> u32 {
    1
}

/// ScanEntry: one pending registration of a serial-numbered item.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ScanEntry {
    /// Catalog item reference (opaque).
    pub item_id: String,

    /// Invoice the item arrived on.
    pub invoice_number: String,

    /// Display SKU, taken from the catalog item.
    #[serde(default)]
    pub sku: String,

    /// Display name, taken from the catalog item.
    #[serde(default)]
    pub item_name: String,

    /// Physical barcode value. Unique across the batch and the remote store.
    pub serial_number: String,

    #[serde(default = "default_quantity")]
    pub quantity: u32,
}

impl ScanEntry {
    pub fn serial_key(&self) -> String {
        fold_key(&self.serial_number)
    }

    pub fn invoice_key(&self) -> String {
        fold_key(&self.invoice_number)
    }
}

/// Operator input for a single scan, before validation.
#[derive(Debug, Clone)]
pub struct ScanCandidate {
    pub item: CatalogItem,
    pub invoice_number: String,
    pub serial_number: String,
    pub quantity: Option<u32>,
}

impl ScanCandidate {
    /// Validate required fields and build the entry. Values are trimmed;
    /// a missing quantity becomes 1.
    pub fn into_entry(self) -> Result<ScanEntry, AdmissionError> {
        let item_id = required("itemId", &self.item.item_id)?;
        let invoice_number = required("invoiceNumber", &self.invoice_number)?;
        let serial_number = required("serialNumber", &self.serial_number)?;
        let quantity = match self.quantity {
            Some(0) => return Err(AdmissionError::InvalidQuantity),
            Some(q) => q,
            None => 1,
        };

        Ok(ScanEntry {
            item_id,
            invoice_number,
            sku: self.item.sku.trim().to_string(),
            item_name: self.item.item_name.trim().to_string(),
            serial_number,
            quantity,
        })
    }
}

fn required(field: &'static str, value: &str) -> Result<String, AdmissionError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AdmissionError::EmptyField { field });
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn widget() -> CatalogItem {
        CatalogItem {
            item_id: "item-7".into(),
            sku: "WID-7".into(),
            item_name: "Widget".into(),
        }
    }

    #[test]
    fn candidate_trims_and_defaults_quantity() {
        let entry = ScanCandidate {
            item: widget(),
            invoice_number: "  INV-1 ".into(),
            serial_number: "SN-9\n".into(),
            quantity: None,
        }
        .into_entry()
        .unwrap();

        assert_eq!(entry.invoice_number, "INV-1");
        assert_eq!(entry.serial_number, "SN-9");
        assert_eq!(entry.sku, "WID-7");
        assert_eq!(entry.quantity, 1);
    }

    #[test]
    fn candidate_rejects_blank_fields() {
        let err = ScanCandidate {
            item: widget(),
            invoice_number: "INV-1".into(),
            serial_number: "   ".into(),
            quantity: Some(2),
        }
        .into_entry()
        .unwrap_err();
        assert!(matches!(err, AdmissionError::EmptyField { field: "serialNumber" }));

        let err = ScanCandidate {
            item: widget(),
            invoice_number: "INV-1".into(),
            serial_number: "SN-1".into(),
            quantity: Some(0),
        }
        .into_entry()
        .unwrap_err();
        assert!(matches!(err, AdmissionError::InvalidQuantity));
    }

    #[test]
    fn missing_quantity_deserializes_to_one() {
        let json = r#"{"itemId":"i","invoiceNumber":"INV","serialNumber":"SN"}"#;
        let entry: ScanEntry = serde_json::from_str(json).unwrap();
        assert_eq!(entry.quantity, 1);
        assert_eq!(entry.sku, "");
    }

    #[test]
    fn fold_key_ignores_case_and_padding() {
        assert_eq!(fold_key(" Sn-100 "), fold_key("SN-100"));
        assert_ne!(fold_key("SN-100"), fold_key("SN-1000"));
    }
}
