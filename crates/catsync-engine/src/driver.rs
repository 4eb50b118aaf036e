//! Pushes grouped, priced products to the commerce platform.

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::fmt;

use crate::cache::SyncCache;
use crate::canonical::CanonicalImageKey;
use crate::error::{PlatformError, ProductError, RunError, StateError};
use crate::grouper::{Grouping, Product, ProductImage};
use crate::platform::{
    CommercePlatform, ImageValidator, ProductDraft, RemoteProduct, RemoteVariant, VariantUpdate,
};
use crate::pricing::apply_pricing;
use crate::progress::ProgressTracker;
use crate::retry::RetryPolicy;
use crate::state::StateStore;

/// The remote step a product failed at, for reports and logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncStep {
    LookupProduct,
    CreateProduct,
    UpdateProduct,
    CreateVariant,
    UpdateVariant,
    UploadImage,
    ResolveLocation,
    SetInventory,
    Publish,
}

impl fmt::Display for SyncStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::LookupProduct => "product lookup",
            Self::CreateProduct => "product create",
            Self::UpdateProduct => "product update",
            Self::CreateVariant => "variant create",
            Self::UpdateVariant => "variant update",
            Self::UploadImage => "image upload",
            Self::ResolveLocation => "location lookup",
            Self::SetInventory => "inventory update",
            Self::Publish => "publish",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncOptions {
    /// Inventory location; the platform's first location when unset.
    pub location_id: Option<u64>,
    /// Run every new image through the [`ImageValidator`] before upload.
    pub validate_images: bool,
    /// Create a tag-based smart collection for every product tag.
    pub ensure_collections: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductFailure {
    pub grouping_key: String,
    pub error: ProductError,
}

/// Counters for one run. Per-item failures land here instead of aborting.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    pub products_total: usize,
    pub products_skipped: usize,
    pub products_created: usize,
    pub products_updated: usize,
    pub variants_created: usize,
    pub variants_updated: usize,
    pub variants_rejected: usize,
    pub images_uploaded: usize,
    pub images_cached: usize,
    pub images_invalid: usize,
    pub images_failed: usize,
    pub images_assigned: usize,
    pub inventory_levels_set: usize,
    pub collections_created: usize,
    pub failures: Vec<ProductFailure>,
}

impl RunReport {
    #[must_use]
    pub fn products_failed(&self) -> usize {
        self.failures.len()
    }
}

enum StepError {
    Product(ProductError),
    Fatal(StateError),
}

impl From<ProductError> for StepError {
    fn from(e: ProductError) -> Self {
        Self::Product(e)
    }
}

impl From<StateError> for StepError {
    fn from(e: StateError) -> Self {
        Self::Fatal(e)
    }
}

fn remote(step: SyncStep) -> impl FnOnce(PlatformError) -> StepError {
    move |source| StepError::Product(ProductError::Remote { step, source })
}

/// Sequential sync of one supplier's products.
pub struct SyncDriver<P, S, V> {
    platform: P,
    validator: V,
    retry: RetryPolicy,
    cache: SyncCache<S>,
    progress: ProgressTracker<S>,
    options: SyncOptions,
    location: Option<u64>,
}

impl<P, S, V> SyncDriver<P, S, V>
where
    P: CommercePlatform,
    S: StateStore,
    V: ImageValidator,
{
    pub fn new(
        platform: P,
        validator: V,
        retry: RetryPolicy,
        cache: SyncCache<S>,
        progress: ProgressTracker<S>,
        options: SyncOptions,
    ) -> Self {
        Self {
            platform,
            validator,
            retry,
            cache,
            progress,
            options,
            location: None,
        }
    }

    #[must_use]
    pub fn cache(&self) -> &SyncCache<S> {
        &self.cache
    }

    /// Syncs every product after the stored cursor, then ensures tag
    /// collections and clears the cursor.
    ///
    /// # Errors
    ///
    /// Returns [`RunError::StatePersistence`] when the cache or cursor cannot
    /// be written. The cursor only ever names a product that synced fully, so
    /// a resumed run picks up any product that failed after it.
    pub async fn run(&mut self, grouping: Grouping) -> Result<RunReport, RunError> {
        let Grouping {
            mut products,
            rejected,
        } = grouping;
        let mut report = RunReport {
            products_total: products.len() + rejected.len(),
            ..RunReport::default()
        };
        for dup in rejected {
            report.failures.push(ProductFailure {
                grouping_key: dup.grouping_key.clone(),
                error: ProductError::DuplicateVariant(dup),
            });
        }

        let start = self
            .progress
            .resume_position(products.iter().map(|p| p.grouping_key.as_str()));
        if start > 0 {
            tracing::info!(skipped = start, "resuming after stored progress cursor");
        }
        report.products_skipped = start;

        let tags: BTreeSet<String> = products
            .iter()
            .flat_map(|p| p.tags.iter().cloned())
            .collect();

        for product in products.iter_mut().skip(start) {
            match self.sync_product(product, &mut report).await {
                Ok(()) => self.progress.advance(&product.grouping_key)?,
                Err(StepError::Product(error)) => {
                    tracing::error!(
                        grouping_key = %product.grouping_key,
                        handle = %product.handle,
                        status = error_status(&error),
                        error = %error,
                        "product sync failed"
                    );
                    report.failures.push(ProductFailure {
                        grouping_key: product.grouping_key.clone(),
                        error,
                    });
                }
                Err(StepError::Fatal(e)) => return Err(RunError::StatePersistence(e)),
            }
        }

        if self.options.ensure_collections {
            self.ensure_collections(&tags, &mut report).await;
        }

        self.progress.complete()?;
        Ok(report)
    }

    async fn sync_product(
        &mut self,
        product: &mut Product,
        report: &mut RunReport,
    ) -> Result<(), StepError> {
        for (sku, error) in apply_pricing(product) {
            tracing::warn!(
                grouping_key = %product.grouping_key,
                sku = %sku,
                error = %error,
                "skipping variant with invalid pricing"
            );
            report.variants_rejected += 1;
        }
        if product.variants.is_empty() {
            return Err(ProductError::NoSellableVariants {
                grouping_key: product.grouping_key.clone(),
            }
            .into());
        }

        let draft = ProductDraft::from_product(product);
        let existing = self
            .retry
            .run("find_product", || self.platform.find_product(&draft.handle))
            .await
            .map_err(remote(SyncStep::LookupProduct))?;

        let (remote_product, fresh) = match existing {
            Some(found) => {
                let updated = self
                    .retry
                    .run("update_product", || {
                        self.platform.update_product(found.id, &draft)
                    })
                    .await
                    .map_err(remote(SyncStep::UpdateProduct))?;
                (updated, false)
            }
            None => {
                let created = self
                    .retry
                    .run("create_product", || self.platform.create_product(&draft))
                    .await
                    .map_err(remote(SyncStep::CreateProduct))?;
                (created, true)
            }
        };

        let remote_variants = self
            .upsert_variants(&remote_product, &draft, fresh, report)
            .await?;
        let mut new_variants: HashSet<usize> = HashSet::new();
        for (i, (remote_variant, created)) in remote_variants.iter().enumerate() {
            product.variants[i].remote_id = Some(remote_variant.id);
            if *created {
                new_variants.insert(i);
            }
        }

        let (uploaded, upload_error) = self
            .sync_images(remote_product.id, product, report)
            .await?;

        self.sync_inventory(product, &remote_variants, report)
            .await?;

        self.retry
            .run("publish", || self.platform.publish(remote_product.id))
            .await
            .map_err(remote(SyncStep::Publish))?;

        self.assign_color_images(product, &new_variants, &uploaded, report)
            .await;

        if let Some(source) = upload_error {
            return Err(ProductError::Remote {
                step: SyncStep::UploadImage,
                source,
            }
            .into());
        }

        if fresh {
            report.products_created += 1;
        } else {
            report.products_updated += 1;
        }
        tracing::info!(
            grouping_key = %product.grouping_key,
            handle = %product.handle,
            product_id = remote_product.id,
            created = fresh,
            variants = product.variants.len(),
            "product synced"
        );
        Ok(())
    }

    /// Matches every local variant to a remote one by option tuple, creating
    /// the missing ones. Returns the remote variant per local variant and
    /// whether it was created in this run.
    async fn upsert_variants(
        &self,
        remote_product: &RemoteProduct,
        draft: &ProductDraft,
        fresh: bool,
        report: &mut RunReport,
    ) -> Result<Vec<(RemoteVariant, bool)>, StepError> {
        let mut matched = Vec::with_capacity(draft.variants.len());
        for variant in &draft.variants {
            let key = variant.option_key();
            let existing = remote_product
                .variants
                .iter()
                .find(|rv| rv.option_key() == key)
                .cloned();
            match existing {
                Some(rv) if fresh => {
                    report.variants_created += 1;
                    matched.push((rv, true));
                }
                Some(rv) => {
                    let update = VariantUpdate::from(variant);
                    self.retry
                        .run("update_variant", || {
                            self.platform.update_variant(rv.id, &update)
                        })
                        .await
                        .map_err(remote(SyncStep::UpdateVariant))?;
                    report.variants_updated += 1;
                    matched.push((rv, false));
                }
                None => {
                    let created = self
                        .retry
                        .run("create_variant", || {
                            self.platform.create_variant(remote_product.id, variant)
                        })
                        .await
                        .map_err(remote(SyncStep::CreateVariant))?;
                    tracing::debug!(sku = %variant.sku, variant_id = created.id, "variant created");
                    report.variants_created += 1;
                    matched.push((created, true));
                }
            }
        }
        Ok(matched)
    }

    /// Uploads images the cache has not seen. Every image is attempted; the
    /// first upload error is returned alongside the images uploaded now so
    /// the caller can fail the product after finishing it. Only a cache write
    /// failure aborts here.
    async fn sync_images(
        &mut self,
        product_id: u64,
        product: &Product,
        report: &mut RunReport,
    ) -> Result<(BTreeMap<CanonicalImageKey, u64>, Option<PlatformError>), StepError> {
        let mut uploaded = BTreeMap::new();
        let mut first_error = None;
        for image in &product.images {
            if !self.cache.should_upload(&image.key) {
                report.images_cached += 1;
                continue;
            }
            if self.options.validate_images && !self.image_is_valid(product, image, report).await? {
                continue;
            }

            let result = self
                .retry
                .run("upload_image", || {
                    self.platform.upload_image(product_id, &image.source)
                })
                .await;
            match result {
                Ok(image_id) => {
                    self.cache.mark_uploaded(&image.key, Some(image_id))?;
                    uploaded.insert(image.key.clone(), image_id);
                    report.images_uploaded += 1;
                }
                Err(e) => {
                    tracing::warn!(
                        grouping_key = %product.grouping_key,
                        image = %image.source,
                        status = e.status(),
                        error = %e,
                        "image upload failed"
                    );
                    report.images_failed += 1;
                    first_error.get_or_insert(e);
                }
            }
        }
        Ok((uploaded, first_error))
    }

    async fn image_is_valid(
        &mut self,
        product: &Product,
        image: &ProductImage,
        report: &mut RunReport,
    ) -> Result<bool, StateError> {
        let cached = self.cache.validation(&image.key).cloned();
        let verdict = if let Some(cached) = cached {
            cached
        } else {
            match self.validator.validate(&image.source).await {
                Ok(result) => {
                    self.cache.record_validation(&image.key, result.clone())?;
                    result
                }
                Err(e) => {
                    tracing::warn!(
                        grouping_key = %product.grouping_key,
                        image = %image.source,
                        status = e.status(),
                        error = %e,
                        "image validation unavailable; skipping until next run"
                    );
                    report.images_failed += 1;
                    return Ok(false);
                }
            }
        };
        if !verdict.valid {
            tracing::warn!(
                grouping_key = %product.grouping_key,
                image = %image.source,
                reason = verdict.reason.as_deref().unwrap_or("unknown"),
                "skipping invalid image"
            );
            report.images_invalid += 1;
        }
        Ok(verdict.valid)
    }

    async fn sync_inventory(
        &mut self,
        product: &Product,
        remote_variants: &[(RemoteVariant, bool)],
        report: &mut RunReport,
    ) -> Result<(), StepError> {
        let tracked: Vec<(u64, i64)> = product
            .variants
            .iter()
            .zip(remote_variants)
            .filter_map(|(v, (rv, _))| rv.inventory_item_id.map(|item| (item, v.stock)))
            .collect();
        if tracked.is_empty() {
            return Ok(());
        }

        let location = if let Some(id) = self.location {
            id
        } else {
            let preferred = self.options.location_id;
            let id = self
                .retry
                .run("resolve_location", || self.platform.resolve_location(preferred))
                .await
                .map_err(remote(SyncStep::ResolveLocation))?;
            tracing::info!(location_id = id, "resolved inventory location");
            self.location = Some(id);
            id
        };

        for (inventory_item_id, stock) in tracked {
            self.retry
                .run("set_inventory_level", || {
                    self.platform
                        .set_inventory_level(location, inventory_item_id, stock)
                })
                .await
                .map_err(remote(SyncStep::SetInventory))?;
            report.inventory_levels_set += 1;
        }
        Ok(())
    }

    /// Gives each variant the image of its color. Only done when the variant
    /// or the image is new, so existing manual assignments are left alone.
    async fn assign_color_images(
        &self,
        product: &Product,
        new_variants: &HashSet<usize>,
        uploaded: &BTreeMap<CanonicalImageKey, u64>,
        report: &mut RunReport,
    ) {
        for (i, variant) in product.variants.iter().enumerate() {
            let Some(variant_id) = variant.remote_id else {
                continue;
            };
            let Some(key) = product.color_images.get(&variant.color.to_lowercase()) else {
                continue;
            };
            let image_id = match uploaded.get(key) {
                Some(id) => Some(*id),
                None if new_variants.contains(&i) => self.cache.remote_id(key),
                None => None,
            };
            let Some(image_id) = image_id else {
                continue;
            };
            match self
                .retry
                .run("assign_variant_image", || {
                    self.platform.assign_variant_image(variant_id, image_id)
                })
                .await
            {
                Ok(()) => report.images_assigned += 1,
                Err(e) => {
                    tracing::warn!(
                        grouping_key = %product.grouping_key,
                        sku = %variant.sku,
                        image = %key,
                        status = e.status(),
                        error = %e,
                        "variant image assignment failed"
                    );
                    report.images_failed += 1;
                }
            }
        }
    }

    async fn ensure_collections(&self, tags: &BTreeSet<String>, report: &mut RunReport) {
        if tags.is_empty() {
            return;
        }
        let existing = match self
            .retry
            .run("list_smart_collections", || {
                self.platform.list_smart_collections()
            })
            .await
        {
            Ok(list) => list,
            Err(e) => {
                tracing::warn!(status = e.status(), error = %e, "could not list smart collections");
                return;
            }
        };
        let known: HashSet<String> = existing.iter().map(|c| c.title.to_lowercase()).collect();

        for tag in tags {
            if known.contains(&tag.to_lowercase()) {
                continue;
            }
            match self
                .retry
                .run("create_smart_collection", || {
                    self.platform.create_smart_collection(tag)
                })
                .await
            {
                Ok(collection) => {
                    tracing::info!(tag = %tag, collection_id = collection.id, "smart collection created");
                    report.collections_created += 1;
                }
                Err(e) => {
                    tracing::warn!(tag = %tag, status = e.status(), error = %e, "smart collection create failed");
                }
            }
        }
    }
}

fn error_status(error: &ProductError) -> Option<u16> {
    match error {
        ProductError::Remote { source, .. } => source.status(),
        _ => None,
    }
}
