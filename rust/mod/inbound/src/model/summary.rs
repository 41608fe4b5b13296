use serde::Serialize;

/// Quantity rolled up per `(sku, itemName)` within one invoice.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ItemGroup {
    pub sku: String,
    pub item_name: String,
    pub quantity: u64,
    pub entries: usize,
}

/// Quantity rolled up per invoice, with its item breakdown.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceGroup {
    /// First-seen spelling of the invoice number.
    pub invoice_number: String,
    pub quantity: u64,
    pub entries: usize,
    pub items: Vec<ItemGroup>,
}

/// Read-only view of the staged batch grouped by invoice, then item.
#[derive(Debug, Clone, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub invoices: Vec<InvoiceGroup>,
    pub total_entries: usize,
    pub grand_total: u64,
}

impl Summary {
    /// Look up an invoice group, case-insensitively.
    pub fn invoice(&self, invoice_number: &str) -> Option<&InvoiceGroup> {
        let key = super::fold_key(invoice_number);
        self.invoices
            .iter()
            .find(|g| super::fold_key(&g.invoice_number) == key)
    }
}
