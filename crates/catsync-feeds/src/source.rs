//! Fetching raw feed content from HTTP endpoints or local files.

use std::time::Duration;

use catsync_core::{FeedConfig, FeedFormat};
use reqwest::Client;

use crate::csv_feed::parse_csv;
use crate::error::FeedError;
use crate::record::RawRecord;
use crate::xml_feed::parse_xml;

const USER_AGENT: &str = concat!("catsync/", env!("CARGO_PKG_VERSION"));

/// Reads supplier feeds. `http://` and `https://` locations are downloaded;
/// anything else is read as a local path (files fetched by an external job,
/// e.g. from the supplier's FTP server).
pub struct FeedSource {
    client: Client,
}

impl FeedSource {
    /// # Errors
    ///
    /// Returns [`FeedError::Http`] if the HTTP client cannot be built.
    pub fn new(timeout_secs: u64) -> Result<Self, FeedError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self { client })
    }

    /// Returns the feed body as text.
    ///
    /// # Errors
    ///
    /// Any network, status or I/O failure.
    pub async fn fetch(&self, location: &str) -> Result<String, FeedError> {
        if is_remote(location) {
            let response = self.client.get(location).send().await?;
            let status = response.status();
            if !status.is_success() {
                return Err(FeedError::UnexpectedStatus {
                    url: location.to_string(),
                    status: status.as_u16(),
                });
            }
            Ok(response.text().await?)
        } else {
            tokio::fs::read_to_string(location)
                .await
                .map_err(|source| FeedError::Io {
                    path: location.to_string(),
                    source,
                })
        }
    }

    /// Fetches and parses a feed into raw records.
    ///
    /// # Errors
    ///
    /// See [`FeedSource::fetch`]; parse errors are returned as well.
    pub async fn load_records(&self, feed: &FeedConfig) -> Result<Vec<RawRecord>, FeedError> {
        let content = self.fetch(&feed.location).await?;
        tracing::info!(
            location = %feed.location,
            bytes = content.len(),
            "feed downloaded"
        );
        match feed.format {
            FeedFormat::Csv => parse_csv(&content, feed.delimiter),
            FeedFormat::Xml => parse_xml(&content, &feed.record_element),
        }
    }
}

fn is_remote(location: &str) -> bool {
    let lower = location.trim_start().to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_remote_locations() {
        assert!(is_remote("https://www.chevalier.se/feed.xml"));
        assert!(is_remote("HTTP://host/x.csv"));
        assert!(!is_remote("./feeds/deerhunter.csv"));
        assert!(!is_remote("/srv/feeds/https.csv"));
    }

    #[tokio::test]
    async fn missing_file_is_feed_error() {
        let source = FeedSource::new(5).unwrap();
        let path = std::env::temp_dir().join(format!("catsync-missing-{}.csv", uuid::Uuid::new_v4()));
        let result = source.fetch(&path.display().to_string()).await;
        assert!(matches!(result, Err(FeedError::Io { .. })));
    }

    #[tokio::test]
    async fn reads_local_csv_file() {
        let path = std::env::temp_dir().join(format!("catsync-feed-{}.csv", uuid::Uuid::new_v4()));
        std::fs::write(&path, "sku;name\n1;Cap\n").unwrap();
        let feed = FeedConfig {
            format: FeedFormat::Csv,
            location: path.display().to_string(),
            delimiter: ';',
            record_element: "product".to_string(),
        };
        let records = FeedSource::new(5).unwrap().load_records(&feed).await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].first("name"), "Cap");
        std::fs::remove_file(path).ok();
    }
}
