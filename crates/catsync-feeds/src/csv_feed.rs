//! Delimited-text feeds such as the Deerhunter product export.

use csv::{ReaderBuilder, StringRecord, Trim};

use crate::error::FeedError;
use crate::record::RawRecord;

/// Parses a CSV feed with a header row into records.
///
/// A leading byte-order mark and an Excel `sep=` hint line are skipped.
/// Rows may be shorter than the header; missing cells read as empty.
///
/// # Errors
///
/// Returns [`FeedError::Csv`] for malformed input.
pub fn parse_csv(content: &str, delimiter: char) -> Result<Vec<RawRecord>, FeedError> {
    let mut body = content.strip_prefix('\u{feff}').unwrap_or(content);
    if let Some((first, rest)) = body.split_once('\n') {
        if first.trim().to_lowercase().starts_with("sep=") {
            body = rest;
        }
    }

    let delimiter = u8::try_from(delimiter).unwrap_or(b';');
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .delimiter(delimiter)
        .quote(b'"')
        .flexible(true)
        .trim(Trim::All)
        .from_reader(body.as_bytes());

    let headers: StringRecord = reader.headers()?.clone();
    let mut records = Vec::new();
    for row in reader.records() {
        let row = row?;
        let record: RawRecord = headers.iter().zip(row.iter()).collect();
        if record.is_empty() {
            continue;
        }
        let mut record = record;
        for header in &headers {
            record.touch(header);
        }
        records.push(record);
    }
    tracing::debug!(records = records.len(), columns = headers.len(), "parsed CSV feed");
    Ok(records)
}
