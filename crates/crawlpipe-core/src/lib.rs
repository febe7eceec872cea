//! Crawlpipe Core - streaming and casting of partitioned crawler output
//!
//! Reads the gzip-compressed, tab-separated partition files a crawler
//! produces, casts every line against the schema registered for its content
//! basename, and exposes typed per-url streams (hosts, paths, query strings,
//! metadata) bounded by the crawl completion boundary.

pub mod caster;
pub mod content;
pub mod decode;
pub mod error;
pub mod factory;
pub mod files;
pub mod group;
pub mod logging;
pub mod manifest;
pub mod progress;
pub mod stream;
pub mod urlparse;

// Re-exports for convenience
pub use caster::{Column, Decoder, FromRecord, Record, Schema, Value};
pub use error::{Error, Result};
pub use factory::{
    DataStream, DataStreamFactory, HostStreamFactory, MetadataStreamFactory, PathStreamFactory,
    QueryStringStreamFactory, nb_crawled_urls,
};
pub use files::{FileStream, FileStreamFactory, part_id_from_filename};
pub use group::GroupByUrlId;
pub use logging::{IndicatifLogger, init_logging};
pub use manifest::{CrawlManifest, MANIFEST_FILENAME};
pub use progress::{ProgressContext, fmt_num};
pub use stream::{GzipLines, GzipReader, open_gzip_file};
