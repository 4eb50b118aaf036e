//! Admin REST API request and response bodies.
//!
//! Only the fields the sync reads or writes are modelled. Prices travel as
//! decimal strings (`"349.00"`); tags as one comma-separated string.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use catsync_engine::{
    ProductDraft, RemoteProduct, RemoteVariant, SmartCollection, VariantDraft, VariantUpdate,
};

#[derive(Debug, Serialize)]
pub struct ProductEnvelope<T> {
    pub product: T,
}

#[derive(Debug, Serialize)]
pub struct VariantEnvelope<T> {
    pub variant: T,
}

#[derive(Debug, Serialize)]
pub struct ImageEnvelope<T> {
    pub image: T,
}

#[derive(Debug, Serialize)]
pub struct SmartCollectionEnvelope<T> {
    pub smart_collection: T,
}

#[derive(Debug, Serialize)]
pub struct OptionBody {
    pub name: String,
}

#[derive(Debug, Serialize)]
pub struct VariantBody {
    pub sku: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub option1: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub option2: Option<String>,
    pub price: Decimal,
    pub compare_at_price: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub barcode: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inventory_management: Option<&'static str>,
    pub inventory_policy: &'static str,
}

impl From<&VariantDraft> for VariantBody {
    fn from(v: &VariantDraft) -> Self {
        Self {
            sku: v.sku.clone(),
            option1: v.option1.clone(),
            option2: v.option2.clone(),
            price: v.price,
            compare_at_price: v.compare_at_price,
            barcode: v.barcode.clone(),
            inventory_management: v.inventory_managed.then_some("shopify"),
            inventory_policy: "deny",
        }
    }
}

#[derive(Debug, Serialize)]
pub struct NewProductBody {
    pub title: String,
    pub handle: String,
    pub body_html: String,
    pub vendor: String,
    pub tags: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<OptionBody>,
    pub variants: Vec<VariantBody>,
}

impl From<&ProductDraft> for NewProductBody {
    fn from(d: &ProductDraft) -> Self {
        Self {
            title: d.title.clone(),
            handle: d.handle.clone(),
            body_html: d.body_html.clone(),
            vendor: d.vendor.clone(),
            tags: d.tags.join(", "),
            options: d
                .options
                .iter()
                .map(|name| OptionBody { name: name.clone() })
                .collect(),
            variants: d.variants.iter().map(VariantBody::from).collect(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ProductUpdateBody {
    pub id: u64,
    pub title: String,
    pub body_html: String,
    pub vendor: String,
    pub tags: String,
}

impl ProductUpdateBody {
    #[must_use]
    pub fn new(id: u64, d: &ProductDraft) -> Self {
        Self {
            id,
            title: d.title.clone(),
            body_html: d.body_html.clone(),
            vendor: d.vendor.clone(),
            tags: d.tags.join(", "),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PublishBody {
    pub id: u64,
    pub published: bool,
    pub published_scope: &'static str,
}

#[derive(Debug, Serialize)]
pub struct VariantUpdateBody {
    pub id: u64,
    pub price: Decimal,
    pub compare_at_price: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub barcode: Option<String>,
}

impl VariantUpdateBody {
    #[must_use]
    pub fn new(id: u64, u: &VariantUpdate) -> Self {
        Self {
            id,
            price: u.price,
            compare_at_price: u.compare_at_price,
            barcode: u.barcode.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct VariantImageBody {
    pub id: u64,
    pub image_id: u64,
}

#[derive(Debug, Serialize)]
pub struct ImageBody<'a> {
    pub src: &'a str,
}

#[derive(Debug, Serialize)]
pub struct InventoryLevelBody {
    pub location_id: u64,
    pub inventory_item_id: u64,
    pub available: i64,
}

#[derive(Debug, Serialize)]
pub struct CollectionRule<'a> {
    pub column: &'static str,
    pub relation: &'static str,
    pub condition: &'a str,
}

#[derive(Debug, Serialize)]
pub struct NewSmartCollectionBody<'a> {
    pub title: &'a str,
    pub rules: Vec<CollectionRule<'a>>,
    pub published: bool,
}

// ---------------------------------------------------------------------------
// Responses
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct ProductsResponse {
    #[serde(default)]
    pub products: Vec<ProductResponse>,
}

#[derive(Debug, Deserialize)]
pub struct SingleProductResponse {
    pub product: ProductResponse,
}

#[derive(Debug, Deserialize)]
pub struct ProductResponse {
    pub id: u64,
    pub handle: String,
    #[serde(default)]
    pub variants: Vec<VariantResponse>,
}

impl From<ProductResponse> for RemoteProduct {
    fn from(p: ProductResponse) -> Self {
        Self {
            id: p.id,
            handle: p.handle,
            variants: p.variants.into_iter().map(RemoteVariant::from).collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SingleVariantResponse {
    pub variant: VariantResponse,
}

#[derive(Debug, Deserialize)]
pub struct VariantResponse {
    pub id: u64,
    #[serde(default)]
    pub sku: Option<String>,
    #[serde(default)]
    pub option1: Option<String>,
    #[serde(default)]
    pub option2: Option<String>,
    #[serde(default)]
    pub inventory_item_id: Option<u64>,
}

impl From<VariantResponse> for RemoteVariant {
    fn from(v: VariantResponse) -> Self {
        Self {
            id: v.id,
            sku: v.sku,
            option1: v.option1,
            option2: v.option2,
            inventory_item_id: v.inventory_item_id,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SingleImageResponse {
    pub image: IdOnly,
}

#[derive(Debug, Deserialize)]
pub struct IdOnly {
    pub id: u64,
}

#[derive(Debug, Deserialize)]
pub struct LocationsResponse {
    #[serde(default)]
    pub locations: Vec<LocationResponse>,
}

#[derive(Debug, Deserialize)]
pub struct LocationResponse {
    pub id: u64,
    #[serde(default = "default_true")]
    pub active: bool,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Deserialize)]
pub struct SmartCollectionsResponse {
    #[serde(default)]
    pub smart_collections: Vec<SmartCollectionResponse>,
}

#[derive(Debug, Deserialize)]
pub struct SingleSmartCollectionResponse {
    pub smart_collection: SmartCollectionResponse,
}

#[derive(Debug, Deserialize)]
pub struct SmartCollectionResponse {
    pub id: u64,
    pub title: String,
}

impl From<SmartCollectionResponse> for SmartCollection {
    fn from(c: SmartCollectionResponse) -> Self {
        Self {
            id: c.id,
            title: c.title,
        }
    }
}
