use serde::{Deserialize, Serialize};

/// Default number of rows returned by a catalog search when the caller does
/// not ask for a specific limit.
pub const DEFAULT_SEARCH_LIMIT: u32 = 6;

/// A catalog row as stored and as returned to the model in tool output.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub sku: String,
    pub title: String,
    pub description: String,
    pub color: String,
    pub size: String,
    pub price: f64,
    pub currency: String,
    pub url: String,
    pub photo_url: String,
    /// Unix seconds; assigned by the store on first insert.
    pub created_at: i64,
}

/// Fields supplied on upsert. `created_at` is owned by the store: a fresh
/// insert stamps it, a conflicting sku keeps the original stamp while every
/// mutable field is overwritten.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct NewProduct {
    pub sku: String,
    pub title: String,
    pub description: String,
    pub color: String,
    pub size: String,
    pub price: f64,
    pub currency: String,
    pub url: String,
    pub photo_url: String,
}

/// Substring filter applied by catalog search. Empty/absent fields do not
/// constrain; results are ordered most-recently-created first.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CatalogFilter {
    pub query: String,
    pub color: Option<String>,
    pub size: Option<String>,
    pub limit: u32,
}

impl Default for CatalogFilter {
    fn default() -> Self {
        Self { query: String::new(), color: None, size: None, limit: DEFAULT_SEARCH_LIMIT }
    }
}
