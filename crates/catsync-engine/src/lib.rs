//! Sync engine: grouping, pricing, persisted state and the remote driver.
//!
//! Everything here is independent of the concrete feed format and commerce
//! API; those plug in through [`CommercePlatform`], [`ImageValidator`] and
//! [`StateStore`].

pub mod cache;
pub mod canonical;
pub mod driver;
pub mod error;
pub mod grouper;
pub mod platform;
pub mod pricing;
pub mod progress;
pub mod retry;
pub mod state;

pub use cache::SyncCache;
pub use canonical::{canonicalize, CanonicalImageKey};
pub use driver::{ProductFailure, RunReport, SyncDriver, SyncOptions, SyncStep};
pub use error::{
    DuplicateVariant, InvalidPricingInput, PlatformError, ProductError, RunError, StateError,
};
pub use grouper::{group, Grouping, Product, ProductImage, Variant};
pub use platform::{
    CommercePlatform, ImageValidator, ProductDraft, RemoteProduct, RemoteVariant,
    SmartCollection, VariantDraft, VariantUpdate,
};
pub use pricing::{apply_pricing, compare_at, price};
pub use progress::{ProgressState, ProgressTracker};
pub use retry::RetryPolicy;
pub use state::{CacheEntry, JsonFileStore, MemoryStore, StateStore, ValidationResult};
