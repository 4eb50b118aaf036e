use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One supplier record after field mapping, before grouping.
///
/// Produced fresh on every run by the feed normalizer; never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawItem {
    /// Supplier SKU for this exact variant.
    pub sku: String,
    /// Identifier shared by all variants of one product.
    pub grouping_key: String,
    pub title: String,
    /// Plain text or HTML body; empty when the feed has none.
    pub description: String,
    pub vendor: String,
    pub color: String,
    pub size: String,
    /// Supplier cost. Absent for feeds that only publish retail prices.
    pub wholesale_price: Option<Decimal>,
    pub retail_price: Decimal,
    pub is_outlet: bool,
    /// Image URLs or bare filenames in feed order.
    pub images: Vec<String>,
    pub stock: i64,
    pub barcode: Option<String>,
    /// Category tags derived from the supplier's category rules.
    pub tags: Vec<String>,
}

impl RawItem {
    /// The option tuple that distinguishes variants within one product.
    #[must_use]
    pub fn option_key(&self) -> (String, String) {
        (self.color.to_lowercase(), self.size.to_lowercase())
    }
}

/// Builds a storefront handle (URL slug) from a product title.
///
/// Dots become dashes, characters other than letters, digits, `_` and `-`
/// are dropped, and whitespace runs collapse into single dashes:
/// `"Lady Pro 2.0 Jacka ½"` → `"lady-pro-2-0-jacka"`.
#[must_use]
pub fn handleize(title: &str) -> String {
    let mut cleaned = String::with_capacity(title.len());
    for c in title.to_lowercase().chars() {
        match c {
            '.' => cleaned.push('-'),
            '½' | '®' => {}
            c if c.is_alphanumeric() || c == '_' || c == '-' => cleaned.push(c),
            c if c.is_whitespace() => cleaned.push(' '),
            _ => {}
        }
    }
    cleaned
        .split([' ', '-'])
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}
