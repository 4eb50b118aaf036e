//! `catsync sync`: one supplier feed through normalize, group, price and the
//! remote driver.
//!
//! Only feed and state failures abort the command. Per-product failures are
//! reported by the driver and summarised here.

use anyhow::Context;
use catsync_core::{AppConfig, SupplierConfig};
use catsync_engine::{
    apply_pricing, group, Grouping, JsonFileStore, ProgressTracker, RetryPolicy, RunReport,
    SyncCache, SyncDriver, SyncOptions,
};
use catsync_feeds::{normalize, FeedSource, HttpImageValidator};
use catsync_shopify::ShopifyAdminClient;
use rust_decimal::Decimal;

/// Run a full sync for `supplier`.
///
/// When `dry_run` is `true` the feed is fetched, grouped and priced, a summary
/// is printed, and no store call or state write happens.
///
/// # Errors
///
/// Returns an error if the feed cannot be fetched or parsed, a client cannot
/// be built, or the persisted state cannot be read or written.
pub(crate) async fn run_sync(
    config: &AppConfig,
    supplier: &SupplierConfig,
    dry_run: bool,
) -> anyhow::Result<()> {
    let started = chrono::Utc::now();

    let source = FeedSource::new(config.request_timeout_secs)?;
    let records = source
        .load_records(&supplier.feed)
        .await
        .with_context(|| format!("feed unavailable for supplier '{}'", supplier.name))?;
    let normalized = normalize(&records, supplier)?;
    tracing::info!(
        supplier = %supplier.name,
        records = records.len(),
        items = normalized.items.len(),
        skipped = normalized.skipped,
        "feed normalized"
    );

    let grouping = group(&normalized.items);

    if dry_run {
        print_dry_run(&supplier.name, grouping);
        return Ok(());
    }

    let platform = ShopifyAdminClient::new(
        &config.admin_base_url(),
        &config.access_token,
        config.request_timeout_secs,
    )?;
    let validator = HttpImageValidator::new(
        config.request_timeout_secs,
        config.image_max_bytes,
        config.image_max_pixels,
    )?;

    std::fs::create_dir_all(&config.state_dir).with_context(|| {
        format!("failed to create state dir {}", config.state_dir.display())
    })?;
    let store = JsonFileStore::for_supplier(&config.state_dir, &supplier.name);
    let cache = SyncCache::load(store.clone())?;
    let progress = ProgressTracker::load(store, supplier.resumable)?;

    let options = SyncOptions {
        location_id: config.location_id,
        validate_images: supplier.validate_images,
        ensure_collections: true,
    };
    let mut driver = SyncDriver::new(
        platform,
        validator,
        RetryPolicy::from_config(config),
        cache,
        progress,
        options,
    );

    let report = driver
        .run(grouping)
        .await
        .with_context(|| format!("sync aborted for supplier '{}'", supplier.name))?;

    let elapsed = chrono::Utc::now() - started;
    log_report(&supplier.name, &report, elapsed.num_seconds());
    println!(
        "synced {}: {} created, {} updated, {} failed, {} skipped ({}s)",
        supplier.name,
        report.products_created,
        report.products_updated,
        report.products_failed(),
        report.products_skipped,
        elapsed.num_seconds()
    );
    Ok(())
}

fn log_report(supplier: &str, report: &RunReport, elapsed_secs: i64) {
    tracing::info!(
        supplier,
        elapsed_secs,
        products_total = report.products_total,
        products_skipped = report.products_skipped,
        products_created = report.products_created,
        products_updated = report.products_updated,
        products_failed = report.products_failed(),
        variants_created = report.variants_created,
        variants_updated = report.variants_updated,
        variants_rejected = report.variants_rejected,
        images_uploaded = report.images_uploaded,
        images_cached = report.images_cached,
        images_invalid = report.images_invalid,
        images_failed = report.images_failed,
        images_assigned = report.images_assigned,
        inventory_levels_set = report.inventory_levels_set,
        collections_created = report.collections_created,
        "sync run complete"
    );

    for failure in &report.failures {
        tracing::warn!(
            supplier,
            grouping_key = %failure.grouping_key,
            error = %failure.error,
            "product not synced"
        );
    }
}

fn print_dry_run(supplier: &str, grouping: Grouping) {
    for dup in &grouping.rejected {
        println!("dry-run: would skip product: {dup}");
    }

    let products = grouping.products.len();
    let mut variants = 0usize;
    let mut rejected = 0usize;
    for mut product in grouping.products {
        rejected += apply_pricing(&mut product).len();
        variants += product.variants.len();
        let prices: Vec<Decimal> = product.variants.iter().filter_map(|v| v.price).collect();
        match (prices.iter().min(), prices.iter().max()) {
            (Some(lo), Some(hi)) if lo == hi => println!(
                "dry-run: {} ({} variants, {} images) at {lo}",
                product.handle,
                product.variants.len(),
                product.images.len()
            ),
            (Some(lo), Some(hi)) => println!(
                "dry-run: {} ({} variants, {} images) at {lo}-{hi}",
                product.handle,
                product.variants.len(),
                product.images.len()
            ),
            _ => println!("dry-run: {} has no sellable variants", product.handle),
        }
    }

    println!(
        "dry-run: would sync {products} products ({variants} variants) for {supplier}; \
         {} duplicate-variant products and {rejected} unpriceable variants skipped",
        grouping.rejected.len()
    );
}
