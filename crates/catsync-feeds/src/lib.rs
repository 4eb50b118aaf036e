//! Supplier feed ingestion: fetching, parsing and normalizing CSV and XML
//! feeds, plus HTTP image validation.

pub mod csv_feed;
pub mod error;
pub mod images;
pub mod normalize;
pub mod record;
pub mod source;
pub mod xml_feed;

pub use csv_feed::parse_csv;
pub use error::FeedError;
pub use images::HttpImageValidator;
pub use normalize::{category_tags, normalize, parse_decimal, Normalized};
pub use record::RawRecord;
pub use source::FeedSource;
pub use xml_feed::parse_xml;
