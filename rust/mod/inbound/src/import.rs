//! Bulk import of spreadsheet rows.
//!
//! The spreadsheet front end exports each sheet row as a JSON object with
//! camelCase keys. Cells may come through as numbers (barcodes typed into a
//! numeric column), so every text field also accepts a number.

use serde::{Deserialize, Deserializer};

use crate::error::AdmissionError;
use crate::model::ScanEntry;

/// One parsed sheet row.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ImportRow {
    #[serde(default, deserialize_with = "text_cell")]
    pub item_id: String,
    #[serde(default, deserialize_with = "text_cell")]
    pub sku: String,
    #[serde(default, deserialize_with = "text_cell")]
    pub item_name: String,
    #[serde(default, deserialize_with = "text_cell")]
    pub invoice_number: String,
    #[serde(default, deserialize_with = "text_cell")]
    pub serial_number: String,
    #[serde(default)]
    pub quantity: Option<u32>,
}

fn text_cell<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Cell {
        Text(String),
        Int(i64),
        Float(f64),
        Empty(()),
    }

    Ok(match Cell::deserialize(d)? {
        Cell::Text(s) => s,
        Cell::Int(n) => n.to_string(),
        Cell::Float(f) => f.to_string(),
        Cell::Empty(()) => String::new(),
    })
}

/// Parse a JSON array of rows.
pub fn parse_rows(data: &[u8]) -> Result<Vec<ImportRow>, serde_json::Error> {
    serde_json::from_slice(data)
}

/// Convert rows into entries. Rows are numbered from 1 in errors. Missing
/// (or zero) quantity becomes 1.
pub fn rows_to_entries(rows: Vec<ImportRow>) -> Result<Vec<ScanEntry>, AdmissionError> {
    rows.into_iter()
        .enumerate()
        .map(|(i, row)| row_to_entry(i + 1, row))
        .collect()
}

fn row_to_entry(row_no: usize, row: ImportRow) -> Result<ScanEntry, AdmissionError> {
    let need = |field: &'static str, value: &str| -> Result<String, AdmissionError> {
        let v = value.trim();
        if v.is_empty() {
            return Err(AdmissionError::InvalidRow { row: row_no, field });
        }
        Ok(v.to_string())
    };

    Ok(ScanEntry {
        item_id: need("itemId", &row.item_id)?,
        invoice_number: need("invoiceNumber", &row.invoice_number)?,
        sku: row.sku.trim().to_string(),
        item_name: row.item_name.trim().to_string(),
        serial_number: need("serialNumber", &row.serial_number)?,
        quantity: row.quantity.filter(|q| *q > 0).unwrap_or(1),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rows_default_quantity_and_accept_numeric_cells() {
        let data = br#"[
            {"itemId": "it-1", "sku": "A-1", "itemName": "Drill", "invoiceNumber": "INV-9", "serialNumber": 88120034, "quantity": 3},
            {"itemId": "it-2", "sku": "B-2", "itemName": "Saw", "invoiceNumber": 4411, "serialNumber": " SN-B "},
            {"itemId": "it-2", "invoiceNumber": "INV-9", "serialNumber": "SN-C", "quantity": null}
        ]"#;
        let entries = rows_to_entries(parse_rows(data).unwrap()).unwrap();

        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].serial_number, "88120034");
        assert_eq!(entries[0].quantity, 3);
        assert_eq!(entries[1].invoice_number, "4411");
        assert_eq!(entries[1].serial_number, "SN-B");
        assert_eq!(entries[1].quantity, 1);
        assert_eq!(entries[2].quantity, 1);
        assert_eq!(entries[2].sku, "");
    }

    #[test]
    fn blank_required_cell_names_the_row() {
        let rows = vec![
            ImportRow {
                item_id: "it-1".into(),
                invoice_number: "INV-1".into(),
                serial_number: "SN-1".into(),
                ..Default::default()
            },
            ImportRow {
                item_id: "it-1".into(),
                invoice_number: "  ".into(),
                serial_number: "SN-2".into(),
                ..Default::default()
            },
        ];
        let err = rows_to_entries(rows).unwrap_err();
        assert!(matches!(
            err,
            AdmissionError::InvalidRow { row: 2, field: "invoiceNumber" }
        ));
    }

    #[test]
    fn null_cell_is_blank() {
        let rows = parse_rows(br#"[{"itemId": "x", "invoiceNumber": "I", "serialNumber": null}]"#).unwrap();
        assert!(rows_to_entries(rows).is_err());
    }
}
