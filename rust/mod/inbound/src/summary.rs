use std::collections::HashMap;

use crate::model::{InvoiceGroup, ItemGroup, ScanEntry, Summary};

/// Group a batch by invoice, then by `(sku, itemName)`, summing quantity
/// at each level. Groups keep first-appearance order. Pure: same input,
/// same output.
pub fn project(entries: &[ScanEntry]) -> Summary {
    let mut invoices: Vec<InvoiceGroup> = Vec::new();
    let mut invoice_pos: HashMap<String, usize> = HashMap::new();
    // Item positions, per invoice position.
    let mut item_pos: Vec<HashMap<(String, String), usize>> = Vec::new();
    let mut grand_total = 0u64;

    for entry in entries {
        let qty = u64::from(entry.quantity);
        grand_total += qty;

        let i = *invoice_pos.entry(entry.invoice_key()).or_insert_with(|| {
            invoices.push(InvoiceGroup {
                invoice_number: entry.invoice_number.clone(),
                quantity: 0,
                entries: 0,
                items: Vec::new(),
            });
            item_pos.push(HashMap::new());
            invoices.len() - 1
        });

        let group = &mut invoices[i];
        group.quantity += qty;
        group.entries += 1;

        let item_key = (entry.sku.clone(), entry.item_name.clone());
        let j = *item_pos[i].entry(item_key).or_insert_with(|| {
            group.items.push(ItemGroup {
                sku: entry.sku.clone(),
                item_name: entry.item_name.clone(),
                quantity: 0,
                entries: 0,
            });
            group.items.len() - 1
        });
        group.items[j].quantity += qty;
        group.items[j].entries += 1;
    }

    Summary {
        invoices,
        total_entries: entries.len(),
        grand_total,
    }
}
