use thiserror::Error;

/// Every variant means the feed is unavailable and the run must stop before
/// anything is sent to the platform.
#[derive(Debug, Error)]
pub enum FeedError {
    #[error("HTTP error fetching feed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("feed request to {url} returned HTTP {status}")]
    UnexpectedStatus { url: String, status: u16 },

    #[error("failed to read feed file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV parse error: {0}")]
    Csv(#[from] csv::Error),

    #[error("XML parse error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("record {record}: unrecognized fields {fields:?}")]
    UnrecognizedFields { record: usize, fields: Vec<String> },

    #[error("record {record}: invalid value {value:?} for {field}")]
    InvalidValue {
        record: usize,
        field: String,
        value: String,
    },
}
