//! Groups normalized supplier items into multi-variant products.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use catsync_core::{handleize, RawItem};
use rust_decimal::Decimal;

use crate::canonical::{canonicalize, CanonicalImageKey};
use crate::error::DuplicateVariant;

/// One sellable option of a [`Product`].
#[derive(Debug, Clone, PartialEq)]
pub struct Variant {
    pub sku: String,
    pub color: String,
    pub size: String,
    pub barcode: Option<String>,
    pub wholesale_price: Option<Decimal>,
    pub retail_price: Decimal,
    pub is_outlet: bool,
    /// Sell price; `None` until pricing has run.
    pub price: Option<Decimal>,
    pub compare_at_price: Option<Decimal>,
    pub stock: i64,
    /// Remote variant id once it is known.
    pub remote_id: Option<u64>,
}

impl Variant {
    fn from_item(item: &RawItem) -> Self {
        Self {
            sku: item.sku.clone(),
            color: item.color.clone(),
            size: item.size.clone(),
            barcode: item.barcode.clone(),
            wholesale_price: item.wholesale_price,
            retail_price: item.retail_price,
            is_outlet: item.is_outlet,
            price: None,
            compare_at_price: None,
            stock: item.stock,
            remote_id: None,
        }
    }

    /// Lower-cased `(color, size)` used to match local and remote variants.
    #[must_use]
    pub fn option_key(&self) -> (String, String) {
        (self.color.to_lowercase(), self.size.to_lowercase())
    }
}

/// An image attached to a product, identified by its canonical key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductImage {
    pub key: CanonicalImageKey,
    /// The first filename or URL seen for this key.
    pub source: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Product {
    pub grouping_key: String,
    /// Storefront handle, used to find the product remotely.
    pub handle: String,
    pub title: String,
    pub description: String,
    pub vendor: String,
    pub tags: BTreeSet<String>,
    pub variants: Vec<Variant>,
    pub images: Vec<ProductImage>,
    /// First image seen per lower-cased color.
    pub color_images: BTreeMap<String, CanonicalImageKey>,
}

impl Product {
    fn from_item(item: &RawItem) -> Self {
        Self {
            grouping_key: item.grouping_key.clone(),
            handle: handleize(&item.title),
            title: item.title.clone(),
            description: item.description.clone(),
            vendor: item.vendor.clone(),
            tags: BTreeSet::new(),
            variants: Vec::new(),
            images: Vec::new(),
            color_images: BTreeMap::new(),
        }
    }

    fn absorb_images(&mut self, item: &RawItem) {
        let color = item.color.to_lowercase();
        for source in &item.images {
            let key = canonicalize(source);
            if key.as_str().is_empty() {
                continue;
            }
            if !color.is_empty() {
                self.color_images
                    .entry(color.clone())
                    .or_insert_with(|| key.clone());
            }
            if !self.images.iter().any(|img| img.key == key) {
                self.images.push(ProductImage {
                    key,
                    source: source.clone(),
                });
            }
        }
    }
}

/// Result of [`group`]: accepted products plus the reasons others were dropped.
#[derive(Debug, Default)]
pub struct Grouping {
    pub products: Vec<Product>,
    pub rejected: Vec<DuplicateVariant>,
}

/// Builds products from items in first-seen grouping-key order.
///
/// Variants keep first-seen option order. A product in which two items share
/// an option tuple is rejected as a whole and reported in
/// [`Grouping::rejected`]; later items for that key are discarded too.
#[must_use]
pub fn group(items: &[RawItem]) -> Grouping {
    let mut order: Vec<Product> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut seen_options: Vec<HashMap<(String, String), String>> = Vec::new();
    let mut rejected: Vec<Option<DuplicateVariant>> = Vec::new();

    for item in items {
        let slot = *index.entry(item.grouping_key.as_str()).or_insert_with(|| {
            order.push(Product::from_item(item));
            seen_options.push(HashMap::new());
            rejected.push(None);
            order.len() - 1
        });
        if rejected[slot].is_some() {
            continue;
        }

        let option_key = item.option_key();
        if let Some(first_sku) = seen_options[slot].get(&option_key) {
            tracing::warn!(
                grouping_key = %item.grouping_key,
                sku = %item.sku,
                first_sku = %first_sku,
                "duplicate variant option tuple; rejecting product"
            );
            rejected[slot] = Some(DuplicateVariant {
                grouping_key: item.grouping_key.clone(),
                color: item.color.clone(),
                size: item.size.clone(),
                first_sku: first_sku.clone(),
                duplicate_sku: item.sku.clone(),
            });
            continue;
        }
        seen_options[slot].insert(option_key, item.sku.clone());

        let product = &mut order[slot];
        product.variants.push(Variant::from_item(item));
        product.tags.extend(item.tags.iter().cloned());
        product.absorb_images(item);
    }

    let mut grouping = Grouping::default();
    for (product, rejection) in order.into_iter().zip(rejected) {
        match rejection {
            Some(dup) => grouping.rejected.push(dup),
            None => grouping.products.push(product),
        }
    }
    grouping
}

#[cfg(test)]
#[path = "grouper_test.rs"]
mod tests;
