//! Shopify Admin REST API implementation of the sync engine's
//! [`catsync_engine::CommercePlatform`].

pub mod client;
pub mod error;
pub mod types;

pub use client::ShopifyAdminClient;
pub use error::ShopifyError;
