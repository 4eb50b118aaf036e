//! The commerce platform seen from the sync driver.
//!
//! Implementations translate these calls to a concrete API and classify
//! every failure into a [`PlatformError`].

use rust_decimal::Decimal;

use crate::error::PlatformError;
use crate::grouper::{Product, Variant};
use crate::state::ValidationResult;

/// Attributes of a product that the sync owns.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductDraft {
    pub handle: String,
    pub title: String,
    pub body_html: String,
    pub vendor: String,
    pub tags: Vec<String>,
    pub variants: Vec<VariantDraft>,
    /// Option names in declaration order, e.g. `["Color", "Size"]`.
    pub options: Vec<String>,
}

impl ProductDraft {
    /// Builds the create/update payload for `product`.
    ///
    /// Option columns only appear when at least one variant uses them.
    #[must_use]
    pub fn from_product(product: &Product) -> Self {
        let has_color = product.variants.iter().any(|v| !v.color.is_empty());
        let has_size = product.variants.iter().any(|v| !v.size.is_empty());
        let mut options = Vec::new();
        if has_color {
            options.push("Color".to_string());
        }
        if has_size {
            options.push("Size".to_string());
        }
        Self {
            handle: product.handle.clone(),
            title: product.title.clone(),
            body_html: product.description.clone(),
            vendor: product.vendor.clone(),
            tags: product.tags.iter().cloned().collect(),
            variants: product
                .variants
                .iter()
                .map(|v| VariantDraft::from_variant(v, has_color, has_size))
                .collect(),
            options,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct VariantDraft {
    pub sku: String,
    pub option1: Option<String>,
    pub option2: Option<String>,
    pub price: Decimal,
    pub compare_at_price: Option<Decimal>,
    pub barcode: Option<String>,
    /// Let the platform track stock so inventory levels can be set.
    pub inventory_managed: bool,
}

impl VariantDraft {
    #[must_use]
    pub fn from_variant(variant: &Variant, has_color: bool, has_size: bool) -> Self {
        let non_empty = |s: &str| (!s.is_empty()).then(|| s.to_string());
        let (option1, option2) = match (has_color, has_size) {
            (true, true) => (non_empty(&variant.color), non_empty(&variant.size)),
            (true, false) => (non_empty(&variant.color), None),
            (false, true) => (non_empty(&variant.size), None),
            (false, false) => (None, None),
        };
        Self {
            sku: variant.sku.clone(),
            option1,
            option2,
            price: variant.price.unwrap_or(variant.retail_price),
            compare_at_price: variant.compare_at_price,
            barcode: variant.barcode.clone(),
            inventory_managed: true,
        }
    }

    /// Lower-cased option tuple comparable with [`RemoteVariant::option_key`].
    #[must_use]
    pub fn option_key(&self) -> (String, String) {
        (
            self.option1.as_deref().unwrap_or_default().to_lowercase(),
            self.option2.as_deref().unwrap_or_default().to_lowercase(),
        )
    }
}

/// The mutable pricing attributes of an existing variant.
#[derive(Debug, Clone, PartialEq)]
pub struct VariantUpdate {
    pub price: Decimal,
    pub compare_at_price: Option<Decimal>,
    pub barcode: Option<String>,
}

impl From<&VariantDraft> for VariantUpdate {
    fn from(draft: &VariantDraft) -> Self {
        Self {
            price: draft.price,
            compare_at_price: draft.compare_at_price,
            barcode: draft.barcode.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteVariant {
    pub id: u64,
    pub sku: Option<String>,
    pub option1: Option<String>,
    pub option2: Option<String>,
    pub inventory_item_id: Option<u64>,
}

impl RemoteVariant {
    /// Lower-cased option tuple. The platform's placeholder option
    /// `Default Title` counts as empty.
    #[must_use]
    pub fn option_key(&self) -> (String, String) {
        let norm = |o: &Option<String>| {
            let v = o.as_deref().unwrap_or_default().to_lowercase();
            if v == "default title" {
                String::new()
            } else {
                v
            }
        };
        (norm(&self.option1), norm(&self.option2))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteProduct {
    pub id: u64,
    pub handle: String,
    pub variants: Vec<RemoteVariant>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmartCollection {
    pub id: u64,
    pub title: String,
}

/// Remote operations the sync driver needs.
#[allow(async_fn_in_trait)]
pub trait CommercePlatform {
    /// Looks a product up by its handle.
    async fn find_product(&self, handle: &str) -> Result<Option<RemoteProduct>, PlatformError>;

    async fn create_product(&self, draft: &ProductDraft) -> Result<RemoteProduct, PlatformError>;

    /// Updates title, body, vendor and tags only. Variants are handled
    /// separately.
    async fn update_product(
        &self,
        product_id: u64,
        draft: &ProductDraft,
    ) -> Result<RemoteProduct, PlatformError>;

    async fn create_variant(
        &self,
        product_id: u64,
        draft: &VariantDraft,
    ) -> Result<RemoteVariant, PlatformError>;

    async fn update_variant(
        &self,
        variant_id: u64,
        update: &VariantUpdate,
    ) -> Result<(), PlatformError>;

    /// Attaches the image at `src` to the product and returns its remote id.
    async fn upload_image(&self, product_id: u64, src: &str) -> Result<u64, PlatformError>;

    async fn assign_variant_image(
        &self,
        variant_id: u64,
        image_id: u64,
    ) -> Result<(), PlatformError>;

    /// Returns `preferred` when given, otherwise the first location.
    async fn resolve_location(&self, preferred: Option<u64>) -> Result<u64, PlatformError>;

    async fn set_inventory_level(
        &self,
        location_id: u64,
        inventory_item_id: u64,
        available: i64,
    ) -> Result<(), PlatformError>;

    /// Ensures the product is published to all channels.
    async fn publish(&self, product_id: u64) -> Result<(), PlatformError>;

    async fn list_smart_collections(&self) -> Result<Vec<SmartCollection>, PlatformError>;

    /// Creates a collection whose rule is `tag equals <tag>`.
    async fn create_smart_collection(&self, tag: &str) -> Result<SmartCollection, PlatformError>;
}

/// Checks that an image can be fetched and is acceptable to the platform.
#[allow(async_fn_in_trait)]
pub trait ImageValidator {
    /// `Ok` with a verdict for definite answers (including "invalid");
    /// `Err` for conditions that should be retried in a later run.
    async fn validate(&self, src: &str) -> Result<ValidationResult, PlatformError>;
}
