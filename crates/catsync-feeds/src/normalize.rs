//! Maps raw feed records onto [`RawItem`]s using a supplier schema.

use std::collections::BTreeSet;
use std::str::FromStr;

use catsync_core::{
    handleize, CategoryRule, GroupingKey, MatchMode, RawItem, SupplierConfig, UnrecognizedFields,
};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use crate::error::FeedError;
use crate::record::RawRecord;

/// Normalizer output for one feed.
#[derive(Debug, Default)]
pub struct Normalized {
    pub items: Vec<RawItem>,
    /// Records dropped for lacking a title or SKU.
    pub skipped: usize,
    /// Feed fields the schema neither reads nor ignores.
    pub unrecognized: BTreeSet<String>,
}

/// Applies `supplier`'s field map to every record.
///
/// # Errors
///
/// Returns [`FeedError::UnrecognizedFields`] when the supplier's policy is
/// `reject` and a record carries a field the schema does not know.
pub fn normalize(records: &[RawRecord], supplier: &SupplierConfig) -> Result<Normalized, FeedError> {
    let known = supplier.known_fields();
    let mut out = Normalized::default();

    for (index, record) in records.iter().enumerate() {
        let unknown: Vec<String> = record
            .field_names()
            .filter(|f| !known.contains(f))
            .map(str::to_string)
            .collect();
        if !unknown.is_empty() {
            if supplier.unrecognized_fields == UnrecognizedFields::Reject {
                return Err(FeedError::UnrecognizedFields {
                    record: index + 1,
                    fields: unknown,
                });
            }
            out.unrecognized.extend(unknown);
        }

        match map_record(record, supplier) {
            Some(item) => out.items.push(item),
            None => out.skipped += 1,
        }
    }

    if supplier.unrecognized_fields == UnrecognizedFields::Warn && !out.unrecognized.is_empty() {
        tracing::warn!(
            supplier = %supplier.name,
            fields = ?out.unrecognized,
            "feed contains fields not described by the supplier schema"
        );
    }
    tracing::info!(
        supplier = %supplier.name,
        items = out.items.len(),
        skipped = out.skipped,
        "feed normalized"
    );
    Ok(out)
}

fn map_record(record: &RawRecord, supplier: &SupplierConfig) -> Option<RawItem> {
    let fields = &supplier.fields;
    let title = record.first(&fields.title);
    if title.is_empty() {
        tracing::debug!(supplier = %supplier.name, "skipping record without title");
        return None;
    }

    let sku = fields
        .sku
        .iter()
        .map(|f| record.first(f))
        .filter(|v| !v.is_empty())
        .collect::<Vec<_>>()
        .join("-");
    if sku.is_empty() {
        tracing::warn!(supplier = %supplier.name, title, "skipping record without SKU");
        return None;
    }

    let grouping_key = match &fields.grouping {
        GroupingKey::Field { field } => {
            let value = record.first(field);
            if value.is_empty() {
                handleize(title)
            } else {
                value.to_string()
            }
        }
        GroupingKey::TitleHandle => handleize(title),
    };

    let description = fields
        .description
        .iter()
        .map(|f| record.first(f))
        .find(|v| !v.is_empty())
        .unwrap_or_default()
        .to_string();

    let optional = |field: &Option<String>| -> String {
        field
            .as_deref()
            .map(|f| record.first(f).to_string())
            .unwrap_or_default()
    };

    let retail_raw = record.first(&fields.retail_price);
    let retail_price = parse_decimal(retail_raw).unwrap_or_else(|| {
        if !retail_raw.is_empty() {
            tracing::warn!(sku = %sku, value = retail_raw, "unparseable retail price");
        }
        Decimal::ZERO
    });
    let wholesale_price = fields
        .wholesale_price
        .as_deref()
        .and_then(|f| parse_decimal(record.first(f)));

    let is_outlet = fields.outlet.as_ref().is_some_and(|rule| {
        let value = record.first(&rule.field);
        rule.values.iter().any(|v| v.eq_ignore_ascii_case(value))
    });

    let stock = fields
        .stock
        .as_deref()
        .map_or(0, |f| parse_stock(record.first(f), supplier));

    let barcode = Some(optional(&fields.barcode)).filter(|b| !b.is_empty());

    let mut images: Vec<String> = Vec::new();
    for field in &fields.images {
        for url in record.all(field) {
            if !images.contains(url) {
                images.push(url.clone());
            }
        }
    }

    Some(RawItem {
        sku,
        grouping_key,
        title: title.to_string(),
        description,
        vendor: supplier.vendor.clone(),
        color: optional(&fields.color),
        size: optional(&fields.size),
        wholesale_price,
        retail_price,
        is_outlet,
        images,
        stock,
        barcode,
        tags: category_tags(record, &supplier.category_rules, supplier.category_separator.as_deref()),
    })
}

/// Parses supplier price notation: `"899,00"`, `"2 499,00"`, `"1.234,50"`,
/// `"1,234.50"`. With both separators present the last one is the decimal
/// point.
#[must_use]
pub fn parse_decimal(raw: &str) -> Option<Decimal> {
    let compact: String = raw
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '\u{a0}')
        .collect();
    if compact.is_empty() {
        return None;
    }
    let normalized = match (compact.rfind(','), compact.rfind('.')) {
        (Some(comma), Some(dot)) if dot > comma => compact.replace(',', ""),
        (Some(_), _) => compact.replace('.', "").replace(',', "."),
        (None, _) => compact,
    };
    Decimal::from_str(&normalized).ok()
}

/// Maps a stock cell to a quantity: symbolic levels first, then numbers.
/// Anything else counts as out of stock.
fn parse_stock(raw: &str, supplier: &SupplierConfig) -> i64 {
    let lower = raw.trim().to_lowercase();
    if let Some(qty) = supplier.stock_levels.get(&lower) {
        return *qty;
    }
    parse_decimal(&lower)
        .and_then(|d| d.trunc().to_i64())
        .unwrap_or(0)
}

/// Applies category rules to a record, returning tags in rule order without
/// duplicates.
#[must_use]
pub fn category_tags(
    record: &RawRecord,
    rules: &[CategoryRule],
    separator: Option<&str>,
) -> Vec<String> {
    let mut tags: Vec<String> = Vec::new();
    for rule in rules {
        let keyword = rule.keyword.to_lowercase();
        let matched = record.all(&rule.field).iter().any(|value| {
            let value = value.to_lowercase();
            match rule.mode {
                MatchMode::Contains => value.contains(&keyword),
                MatchMode::Exact => match separator {
                    Some(sep) => value.split(sep).any(|part| part.trim() == keyword),
                    None => value.trim() == keyword,
                },
            }
        });
        if matched && !tags.contains(&rule.tag) {
            tags.push(rule.tag.clone());
        }
    }
    tags
}

#[cfg(test)]
#[path = "normalize_test.rs"]
mod tests;
