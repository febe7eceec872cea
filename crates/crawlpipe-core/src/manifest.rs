//! Crawl manifest (`files.json`) parsing
//!
//! The crawler writes one manifest per crawl. It lists, for each content
//! basename, the partition files produced, and records the highest url id
//! that was actually crawled. Other keys are kept but ignored.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Manifest filename inside a crawl data directory
pub const MANIFEST_FILENAME: &str = "files.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlManifest {
    /// Highest url id that has been crawled
    pub max_uid_we_crawled: i64,
    #[serde(flatten)]
    entries: BTreeMap<String, serde_json::Value>,
}

impl CrawlManifest {
    pub fn new(max_uid_we_crawled: i64) -> Self {
        Self {
            max_uid_we_crawled,
            entries: BTreeMap::new(),
        }
    }

    /// Register the file list of one content basename
    pub fn with_files<S: Into<String>>(
        mut self,
        content: &str,
        files: impl IntoIterator<Item = S>,
    ) -> Self {
        let files = files
            .into_iter()
            .map(|f| serde_json::Value::String(f.into()))
            .collect();
        self.entries
            .insert(content.to_string(), serde_json::Value::Array(files));
        self
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    /// Load `files.json` from a crawl data directory
    pub fn load(data_dir: &Path) -> Result<Self> {
        let path = data_dir.join(MANIFEST_FILENAME);
        let json = std::fs::read_to_string(&path).map_err(|e| Error::io(&path, e))?;
        let manifest =
            Self::from_json(&json).map_err(|source| Error::Manifest { path, source })?;
        log::debug!(
            "Loaded manifest with {} entries (max crawled url id {})",
            manifest.entries.len(),
            manifest.max_uid_we_crawled
        );
        Ok(manifest)
    }

    /// File list for a content basename, `None` when the crawl has none
    pub fn files(&self, content: &str) -> Option<Vec<&str>> {
        let list = self.entries.get(content)?.as_array()?;
        Some(list.iter().filter_map(|v| v.as_str()).collect())
    }

    pub fn max_crawled_urlid(&self) -> i64 {
        self.max_uid_we_crawled
    }
}
