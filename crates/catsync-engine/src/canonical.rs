//! Stable identity keys for supplier image filenames.
//!
//! Shopify appends a (sometimes truncated) UUID to filenames it stores, and
//! supplier feeds append `_1`, `_2`, … when they re-export the same picture.
//! Both must collapse to one key or every run re-uploads the same image.
//! Product codes such as `3733-642` look similar but identify the image and
//! are never stripped.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Extensions removed from the end of a filename before suffix stripping.
const IMAGE_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "png", "gif", "webp", "avif", "tif", "tiff", "bmp",
];

/// Minimum length of an opaque hash suffix.
const MIN_HASH_LEN: usize = 16;

/// Longest numeric run treated as a supplier duplicate counter.
const MAX_COUNTER_LEN: usize = 2;

/// Suffix-stripped, lower-cased identity of an image filename.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CanonicalImageKey(String);

impl CanonicalImageKey {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CanonicalImageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CanonicalImageKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Reduces an image filename or URL to its [`CanonicalImageKey`].
///
/// Query strings and directory/URL prefixes are discarded, the remainder is
/// lower-cased, then image extensions and trailing `_<suffix>` segments are
/// stripped until nothing more matches. Recognised suffixes, in order:
///
/// 1. a platform UUID, full or truncated (`_e450759a-fd73-4409-a7f2`);
/// 2. an opaque alphanumeric hash of at least 16 characters;
/// 3. a one- or two-digit duplicate counter (`_1`).
///
/// The result is a fixed point, so `canonicalize` is idempotent.
#[must_use]
pub fn canonicalize(filename: &str) -> CanonicalImageKey {
    let mut name = filename.trim();
    if let Some(idx) = name.find(['?', '#']) {
        name = &name[..idx];
    }
    if let Some(idx) = name.rfind(['/', '\\']) {
        name = &name[idx + 1..];
    }

    let mut key = name.trim().to_lowercase();
    loop {
        let trimmed = key.trim();
        if trimmed.len() != key.len() {
            key = trimmed.to_string();
        }
        match strip_extension(&key).or_else(|| strip_suffix_segment(&key)) {
            Some(stem) => key = stem.to_string(),
            None => break,
        }
    }
    CanonicalImageKey(key)
}

fn strip_extension(name: &str) -> Option<&str> {
    let (stem, ext) = name.rsplit_once('.')?;
    (!stem.is_empty() && IMAGE_EXTENSIONS.contains(&ext)).then_some(stem)
}

fn strip_suffix_segment(name: &str) -> Option<&str> {
    let (stem, segment) = name.rsplit_once('_')?;
    if stem.is_empty() || segment.is_empty() || is_product_code(segment) {
        return None;
    }
    (is_uuid_segment(segment) || is_hash_segment(segment) || is_duplicate_counter(segment))
        .then_some(stem)
}

/// `digits-digits`, e.g. `3733-642`.
fn is_product_code(segment: &str) -> bool {
    match segment.split_once('-') {
        Some((left, right)) => {
            !left.is_empty()
                && !right.is_empty()
                && left.bytes().all(|b| b.is_ascii_digit())
                && right.bytes().all(|b| b.is_ascii_digit())
        }
        None => false,
    }
}

/// Hex groups separated by dashes: an 8-character head followed by at least
/// two more groups, at most 36 characters in total.
fn is_uuid_segment(segment: &str) -> bool {
    if segment.len() > 36 {
        return false;
    }
    let groups: Vec<&str> = segment.split('-').collect();
    groups.len() >= 3
        && groups[0].len() == 8
        && groups
            .iter()
            .all(|g| !g.is_empty() && g.len() <= 12 && g.bytes().all(|b| b.is_ascii_hexdigit()))
}

fn is_hash_segment(segment: &str) -> bool {
    segment.len() >= MIN_HASH_LEN
        && segment.bytes().all(|b| b.is_ascii_alphanumeric())
        && segment.bytes().any(|b| b.is_ascii_digit())
}

fn is_duplicate_counter(segment: &str) -> bool {
    segment.len() <= MAX_COUNTER_LEN && segment.bytes().all(|b| b.is_ascii_digit())
}
