use std::collections::BTreeMap;

/// One feed record before field mapping: field name → values.
///
/// CSV cells carry exactly one value. XML leaf elements carry one value and
/// container elements (`<images><image/>…</images>`) one value per child.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawRecord {
    fields: BTreeMap<String, Vec<String>>,
}

impl RawRecord {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks `field` as present without adding a value.
    pub fn touch(&mut self, field: &str) {
        self.fields.entry(field.to_string()).or_default();
    }

    /// Appends a trimmed, non-empty value to `field`.
    pub fn push(&mut self, field: &str, value: &str) {
        let entry = self.fields.entry(field.to_string()).or_default();
        let value = value.trim();
        if !value.is_empty() {
            entry.push(value.to_string());
        }
    }

    /// First value of `field`, or `""` when absent.
    #[must_use]
    pub fn first(&self, field: &str) -> &str {
        self.fields
            .get(field)
            .and_then(|v| v.first())
            .map_or("", String::as_str)
    }

    #[must_use]
    pub fn all(&self, field: &str) -> &[String] {
        self.fields.get(field).map_or(&[], Vec::as_slice)
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.values().all(Vec::is_empty)
    }
}

impl<K: AsRef<str>, V: AsRef<str>> FromIterator<(K, V)> for RawRecord {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut record = Self::new();
        for (k, v) in iter {
            record.push(k.as_ref(), v.as_ref());
        }
        record
    }
}
