//! Declarative supplier feed schemas loaded from `config/suppliers.yaml`.
//!
//! Each supplier names the feed columns (CSV) or child elements (XML) that
//! carry the fields of a [`crate::RawItem`]. Anything a schema does not name
//! is handled by its [`UnrecognizedFields`] policy.

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::ConfigError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedFormat {
    Csv,
    Xml,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedConfig {
    pub format: FeedFormat,
    /// `http(s)://` URL or a local file path.
    pub location: String,
    /// CSV field delimiter.
    #[serde(default = "default_delimiter")]
    pub delimiter: char,
    /// XML element wrapping one record.
    #[serde(default = "default_record_element")]
    pub record_element: String,
}

fn default_delimiter() -> char {
    ';'
}

fn default_record_element() -> String {
    "product".to_string()
}

/// How products are keyed when variants are grouped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GroupingKey {
    /// Use the value of a feed field, e.g. a supplier product number.
    Field { field: String },
    /// Use the handle derived from the title field.
    TitleHandle,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutletRule {
    pub field: String,
    /// Case-insensitive values that mark a record as outlet stock.
    pub values: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldMap {
    pub title: String,
    /// Candidate description fields; the first non-empty one wins.
    #[serde(default)]
    pub description: Vec<String>,
    /// Fields joined with `-` to build the variant SKU.
    pub sku: Vec<String>,
    pub grouping: GroupingKey,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub size: Option<String>,
    pub retail_price: String,
    #[serde(default)]
    pub wholesale_price: Option<String>,
    #[serde(default)]
    pub outlet: Option<OutletRule>,
    #[serde(default)]
    pub stock: Option<String>,
    #[serde(default)]
    pub barcode: Option<String>,
    /// Image fields in priority order; each may be multi-valued in XML feeds.
    pub images: Vec<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchMode {
    /// A path segment of the field equals the keyword.
    #[default]
    Exact,
    /// The field contains the keyword anywhere.
    Contains,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryRule {
    pub field: String,
    pub keyword: String,
    pub tag: String,
    #[serde(default)]
    pub mode: MatchMode,
}

/// Policy for feed fields that the schema does not mention.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnrecognizedFields {
    Ignore,
    #[default]
    Warn,
    Reject,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupplierConfig {
    pub name: String,
    pub vendor: String,
    pub feed: FeedConfig,
    pub fields: FieldMap,
    /// Symbolic stock words mapped to quantities, e.g. `instock: 50`.
    #[serde(default)]
    pub stock_levels: BTreeMap<String, i64>,
    #[serde(default)]
    pub category_rules: Vec<CategoryRule>,
    /// Separator for hierarchical category paths such as `"Herr > Jackor"`.
    #[serde(default)]
    pub category_separator: Option<String>,
    /// Fields known to exist in the feed but deliberately unused.
    #[serde(default)]
    pub ignored_fields: Vec<String>,
    #[serde(default)]
    pub unrecognized_fields: UnrecognizedFields,
    /// Validate image size and dimensions before upload.
    #[serde(default)]
    pub validate_images: bool,
    /// Persist a progress cursor so an interrupted run resumes.
    #[serde(default)]
    pub resumable: bool,
}

impl SupplierConfig {
    /// Every feed field this schema reads or explicitly ignores.
    #[must_use]
    pub fn known_fields(&self) -> BTreeSet<&str> {
        let f = &self.fields;
        let mut known: BTreeSet<&str> = BTreeSet::new();
        known.insert(f.title.as_str());
        known.insert(f.retail_price.as_str());
        known.extend(f.description.iter().map(String::as_str));
        known.extend(f.sku.iter().map(String::as_str));
        known.extend(f.images.iter().map(String::as_str));
        for field in [&f.color, &f.size, &f.wholesale_price, &f.stock, &f.barcode]
            .into_iter()
            .flatten()
        {
            known.insert(field.as_str());
        }
        if let GroupingKey::Field { field } = &f.grouping {
            known.insert(field.as_str());
        }
        if let Some(outlet) = &f.outlet {
            known.insert(outlet.field.as_str());
        }
        known.extend(self.category_rules.iter().map(|r| r.field.as_str()));
        known.extend(self.ignored_fields.iter().map(String::as_str));
        known
    }
}

#[derive(Debug, Deserialize)]
pub struct SuppliersFile {
    pub suppliers: Vec<SupplierConfig>,
}

impl SuppliersFile {
    /// Looks a supplier up by case-insensitive name.
    #[must_use]
    pub fn find(&self, name: &str) -> Option<&SupplierConfig> {
        self.suppliers
            .iter()
            .find(|s| s.name.eq_ignore_ascii_case(name))
    }
}

/// Load and validate supplier schemas from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_suppliers(path: &Path) -> Result<SuppliersFile, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::SuppliersFileIo {
        path: path.display().to_string(),
        source: e,
    })?;
    parse_suppliers(&content)
}

/// Parse and validate supplier schemas from YAML text.
///
/// # Errors
///
/// Returns `ConfigError` if the YAML is malformed or fails validation.
pub fn parse_suppliers(content: &str) -> Result<SuppliersFile, ConfigError> {
    let file: SuppliersFile = serde_yaml::from_str(content)?;
    validate_suppliers(&file)?;
    Ok(file)
}

fn validate_suppliers(file: &SuppliersFile) -> Result<(), ConfigError> {
    let mut seen_names = HashSet::new();

    for supplier in &file.suppliers {
        let name = supplier.name.trim();
        if name.is_empty() {
            return Err(ConfigError::Validation(
                "supplier name must be non-empty".to_string(),
            ));
        }
        if !name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(ConfigError::Validation(format!(
                "supplier name '{name}' may only contain ASCII letters, digits, '-' and '_'"
            )));
        }
        if !seen_names.insert(name.to_lowercase()) {
            return Err(ConfigError::Validation(format!(
                "duplicate supplier name: '{name}'"
            )));
        }

        let f = &supplier.fields;
        if f.sku.is_empty() {
            return Err(ConfigError::Validation(format!(
                "supplier '{name}' must map at least one sku field"
            )));
        }
        if f.images.is_empty() {
            return Err(ConfigError::Validation(format!(
                "supplier '{name}' must map at least one image field"
            )));
        }
        if supplier.known_fields().iter().any(|field| field.trim().is_empty()) {
            return Err(ConfigError::Validation(format!(
                "supplier '{name}' has an empty field name in its schema"
            )));
        }
        if let Some(outlet) = &f.outlet {
            if outlet.values.is_empty() {
                return Err(ConfigError::Validation(format!(
                    "supplier '{name}' outlet rule must list at least one value"
                )));
            }
        }
    }

    Ok(())
}

#[cfg(test)]
#[path = "suppliers_test.rs"]
mod tests;
