//! Partition file discovery and ordered, lazily chained streaming
//!
//! The crawler shards each content type into `<basename>.txt.<part_id>.gz`
//! files. Url ids grow monotonically across shards, so files are always
//! streamed in ascending part-id order.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};

use crate::caster::{Cast, Record, Schema};
use crate::content;
use crate::error::{Error, Result};
use crate::manifest::CrawlManifest;
use crate::stream::GzipLines;

/// Extract the part id from `<basename>.txt.<part_id>.gz`
pub fn part_id_from_filename(filename: &str) -> Result<u64> {
    let malformed = || Error::MalformedFileName {
        filename: filename.to_string(),
    };
    let name = Path::new(filename)
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(malformed)?;
    let digits = name
        .strip_suffix(".gz")
        .and_then(|stem| stem.rsplit_once(".txt."))
        .map(|(_, part)| part)
        .filter(|part| !part.is_empty() && part.bytes().all(|b| b.is_ascii_digit()))
        .ok_or_else(malformed)?;
    digits.parse().map_err(|_| malformed())
}

/// Locates the partition files of one content basename and streams them
/// as casted records.
#[derive(Debug, Clone)]
pub struct FileStreamFactory<'m> {
    dirpath: PathBuf,
    content: &'static str,
    schema: &'static Schema,
    part_id: Option<u64>,
    manifest: &'m CrawlManifest,
}

impl<'m> FileStreamFactory<'m> {
    /// Fails with [`Error::UnknownContent`] for unregistered basenames.
    ///
    /// `part_id` selects a single partition; `None` streams all of them.
    pub fn new(
        dirpath: impl Into<PathBuf>,
        content: &str,
        manifest: &'m CrawlManifest,
        part_id: Option<u64>,
    ) -> Result<Self> {
        Ok(Self {
            dirpath: dirpath.into(),
            content: content::registered_name(content)?,
            schema: content::schema_for(content)?,
            part_id,
            manifest,
        })
    }

    pub fn content(&self) -> &'static str {
        self.content
    }

    pub fn manifest(&self) -> &'m CrawlManifest {
        self.manifest
    }

    fn file_pattern(&self) -> Result<glob::Pattern> {
        let part = self
            .part_id
            .map_or_else(|| "*".to_string(), |id| id.to_string());
        let pattern = format!("{}.txt.{part}.gz", glob::Pattern::escape(self.content));
        glob::Pattern::new(&pattern).map_err(|source| Error::Pattern { pattern, source })
    }

    /// Manifest-listed files for this content, relocated into `dirpath`
    /// and filtered by the partition selector. Unordered.
    pub fn file_list(&self) -> Result<Vec<PathBuf>> {
        let Some(files) = self.manifest.files(self.content) else {
            log::warn!("No entry for {} found", self.content);
            return Ok(Vec::new());
        };
        let pattern = self.file_pattern()?;
        Ok(files
            .into_iter()
            .filter_map(|f| Path::new(f).file_name())
            .filter(|name| name.to_str().is_some_and(|n| pattern.matches(n)))
            .map(|name| self.dirpath.join(name))
            .collect())
    }

    /// Files sorted by ascending part id
    pub fn ordered_files(&self) -> Result<Vec<PathBuf>> {
        let mut keyed = self
            .file_list()?
            .into_iter()
            .map(|path| {
                let part_id = part_id_from_filename(&path.to_string_lossy())?;
                Ok((part_id, path))
            })
            .collect::<Result<Vec<_>>>()?;
        keyed.sort_by_key(|(part_id, _)| *part_id);
        Ok(keyed.into_iter().map(|(_, path)| path).collect())
    }

    /// Casted records of every selected file, chained in part-id order.
    ///
    /// Each call starts a fresh pass; files are opened only when reached.
    pub fn stream(&self) -> Result<FileStream> {
        let files = self.ordered_files()?;
        log::info!(
            "Streaming {} file(s) for {}.txt.{}.gz",
            files.len(),
            self.content,
            self.part_id
                .map_or_else(|| "*".to_string(), |id| id.to_string())
        );
        Ok(FileStream::new(self.schema, files))
    }
}

/// Lazy concatenation of casted gzip files. Fused after the first error.
pub struct FileStream {
    schema: &'static Schema,
    pending: VecDeque<PathBuf>,
    current: Option<Cast<'static, GzipLines>>,
    failed: bool,
}

impl FileStream {
    pub fn new(schema: &'static Schema, files: Vec<PathBuf>) -> Self {
        Self {
            schema,
            pending: files.into(),
            current: None,
            failed: false,
        }
    }

    /// Files not opened yet
    pub fn remaining_files(&self) -> usize {
        self.pending.len()
    }
}

impl Iterator for FileStream {
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        loop {
            if let Some(item) = self.current.as_mut().and_then(Iterator::next) {
                self.failed = item.is_err();
                return Some(item);
            }
            self.current = None;
            let path = self.pending.pop_front()?;
            log::debug!(
                "Opening {} ({} more to go)",
                path.display(),
                self.remaining_files()
            );
            match GzipLines::open(&path) {
                Ok(lines) => self.current = Some(self.schema.cast(lines)),
                Err(e) => {
                    self.failed = true;
                    return Some(Err(e));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn part_id_extraction() {
        assert_eq!(part_id_from_filename("urlids.txt.3.gz").unwrap(), 3);
        assert_eq!(part_id_from_filename("/data/urlids.txt.120.gz").unwrap(), 120);
        assert_eq!(part_id_from_filename("analytics_raw_data.txt.0.gz").unwrap(), 0);
        assert_eq!(
            part_id_from_filename("urlids.txt.4294967296.gz").unwrap(),
            4_294_967_296
        );
    }

    #[test]
    fn malformed_filenames() {
        for name in ["urlids.txt.abc.gz", "urlids.txt..gz", "urlids.txt.3", "urlids.3.gz"] {
            let err = part_id_from_filename(name).unwrap_err();
            assert!(
                matches!(err, Error::MalformedFileName { ref filename } if filename == name),
                "{name}"
            );
        }
    }

    #[test]
    fn unknown_content_is_fatal() {
        let manifest = CrawlManifest::new(10);
        let err = FileStreamFactory::new("/tmp", "urlfoo", &manifest, None).unwrap_err();
        assert!(matches!(err, Error::UnknownContent(_)));
    }

    #[test]
    fn missing_manifest_entry_gives_empty_list() {
        let manifest = CrawlManifest::new(10);
        let factory = FileStreamFactory::new("/tmp", "urlids", &manifest, None).unwrap();
        assert!(factory.file_list().unwrap().is_empty());
        assert_eq!(factory.stream().unwrap().count(), 0);
    }

    #[test]
    fn file_list_relocates_and_filters() {
        let manifest = CrawlManifest::new(10).with_files(
            "urlids",
            [
                "/remote/crawl/urlids.txt.2.gz",
                "urlids.txt.0.gz",
                "urlcontents.txt.0.gz",
                "urlids.txt.1.gz",
            ],
        );
        let factory = FileStreamFactory::new("/data", "urlids", &manifest, None).unwrap();
        let ordered = factory.ordered_files().unwrap();
        assert_eq!(
            ordered,
            vec![
                PathBuf::from("/data/urlids.txt.0.gz"),
                PathBuf::from("/data/urlids.txt.1.gz"),
                PathBuf::from("/data/urlids.txt.2.gz"),
            ]
        );
    }

    #[test]
    fn partition_selector() {
        let manifest = CrawlManifest::new(10)
            .with_files("urlids", ["urlids.txt.0.gz", "urlids.txt.1.gz", "urlids.txt.11.gz"]);
        let factory = FileStreamFactory::new("/data", "urlids", &manifest, Some(1)).unwrap();
        assert_eq!(
            factory.file_list().unwrap(),
            vec![PathBuf::from("/data/urlids.txt.1.gz")]
        );
    }

    #[test]
    fn partition_selector_beyond_u32() {
        let manifest = CrawlManifest::new(10)
            .with_files("urlids", ["urlids.txt.0.gz", "urlids.txt.4294967296.gz"]);
        let factory =
            FileStreamFactory::new("/data", "urlids", &manifest, Some(4_294_967_296)).unwrap();
        assert_eq!(
            factory.file_list().unwrap(),
            vec![PathBuf::from("/data/urlids.txt.4294967296.gz")]
        );
    }

    #[test]
    fn numeric_not_lexicographic_order() {
        let manifest = CrawlManifest::new(10)
            .with_files("urlids", ["urlids.txt.10.gz", "urlids.txt.9.gz"]);
        let factory = FileStreamFactory::new("/d", "urlids", &manifest, None).unwrap();
        let ordered = factory.ordered_files().unwrap();
        assert_eq!(ordered[0], PathBuf::from("/d/urlids.txt.9.gz"));
    }

    #[test]
    fn missing_file_surfaces_on_pull() {
        let dir = tempfile::tempdir().unwrap();
        let manifest = CrawlManifest::new(10).with_files("urlids", ["urlids.txt.0.gz"]);
        let factory = FileStreamFactory::new(dir.path(), "urlids", &manifest, None).unwrap();
        let mut stream = factory.stream().unwrap();
        assert_eq!(stream.remaining_files(), 1);
        assert!(matches!(stream.next(), Some(Err(Error::Io { .. }))));
        assert_eq!(stream.remaining_files(), 0);
        assert!(stream.next().is_none());
    }
}
