use serde::{Deserialize, Serialize};

/// CatalogItem: a master item as listed by the remote catalog.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CatalogItem {
    pub item_id: String,

    #[serde(default)]
    pub sku: String,

    #[serde(default)]
    pub item_name: String,
}

/// One page of catalog results.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CatalogPage {
    pub items: Vec<CatalogItem>,
    #[serde(default)]
    pub total: usize,
}
