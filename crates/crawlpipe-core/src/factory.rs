//! Typed per-url streams bounded by the crawl completion boundary
//!
//! Every factory reads one raw content stream, projects and decodes the
//! columns it needs, and stops at the first url id beyond
//! `max_uid_we_crawled`. Url ids are non-decreasing across the whole crawl,
//! so nothing after that point can be in bounds.

use std::path::{Path, PathBuf};

use crate::caster::{FromRecord, Record};
use crate::content::{self, UrlContentRow, UrlIdRow, UrlInfoRow};
use crate::error::Result;
use crate::files::FileStreamFactory;
use crate::group::GroupByUrlId;
use crate::manifest::CrawlManifest;
use crate::urlparse::{QueryString, parse_query_string, url_path};

/// Boxed lazy stream of typed items
pub type DataStream<T> = Box<dyn Iterator<Item = Result<T>>>;

/// Produces a fresh stream of one kind of per-url data on every call
pub trait DataStreamFactory {
    type Item;

    fn stream(&self) -> Result<DataStream<Self::Item>>;
}

/// `take_while` predicate: in bounds until the first id past `max_urlid`
fn within_crawl<T>(
    max_urlid: i64,
    url_id: impl Fn(&T) -> Option<i64>,
) -> impl FnMut(&Result<T>) -> bool {
    move |item| match item.as_ref().ok().and_then(&url_id) {
        Some(id) if id > max_urlid => {
            log::debug!("url id {id} is beyond max crawled url id {max_urlid}, stopping");
            false
        }
        _ => true,
    }
}

fn bounded_records(
    files: &FileStreamFactory<'_>,
) -> Result<impl Iterator<Item = Result<Record>>> {
    let max_urlid = files.manifest().max_crawled_urlid();
    Ok(files
        .stream()?
        .take_while(within_crawl(max_urlid, Record::url_id)))
}

fn url_id_rows(
    files: &FileStreamFactory<'_>,
) -> Result<impl Iterator<Item = Result<UrlIdRow>>> {
    Ok(bounded_records(files)?.map(|r| r.and_then(UrlIdRow::from_record)))
}

/// `(url_id, host)` pairs from `urlids`
#[derive(Debug, Clone)]
pub struct HostStreamFactory<'m> {
    files: FileStreamFactory<'m>,
}

impl<'m> HostStreamFactory<'m> {
    pub fn new(
        dirpath: impl Into<PathBuf>,
        manifest: &'m CrawlManifest,
        part_id: Option<u64>,
    ) -> Result<Self> {
        Ok(Self {
            files: FileStreamFactory::new(dirpath, content::URLIDS, manifest, part_id)?,
        })
    }
}

impl DataStreamFactory for HostStreamFactory<'_> {
    type Item = (i64, String);

    fn stream(&self) -> Result<DataStream<Self::Item>> {
        let rows = url_id_rows(&self.files)?;
        Ok(Box::new(rows.map(|r| r.map(|row| (row.id, row.host)))))
    }
}

/// `(url_id, path)` pairs from `urlids`, path component only
#[derive(Debug, Clone)]
pub struct PathStreamFactory<'m> {
    files: FileStreamFactory<'m>,
}

impl<'m> PathStreamFactory<'m> {
    pub fn new(
        dirpath: impl Into<PathBuf>,
        manifest: &'m CrawlManifest,
        part_id: Option<u64>,
    ) -> Result<Self> {
        Ok(Self {
            files: FileStreamFactory::new(dirpath, content::URLIDS, manifest, part_id)?,
        })
    }
}

impl DataStreamFactory for PathStreamFactory<'_> {
    type Item = (i64, String);

    fn stream(&self) -> Result<DataStream<Self::Item>> {
        let rows = url_id_rows(&self.files)?;
        Ok(Box::new(
            rows.map(|r| r.map(|row| (row.id, url_path(&row.path).to_string()))),
        ))
    }
}

/// `(url_id, parameters)` from `urlids`; urls without a query string column
/// are skipped
#[derive(Debug, Clone)]
pub struct QueryStringStreamFactory<'m> {
    files: FileStreamFactory<'m>,
}

impl<'m> QueryStringStreamFactory<'m> {
    pub fn new(
        dirpath: impl Into<PathBuf>,
        manifest: &'m CrawlManifest,
        part_id: Option<u64>,
    ) -> Result<Self> {
        Ok(Self {
            files: FileStreamFactory::new(dirpath, content::URLIDS, manifest, part_id)?,
        })
    }
}

impl DataStreamFactory for QueryStringStreamFactory<'_> {
    type Item = (i64, QueryString);

    fn stream(&self) -> Result<DataStream<Self::Item>> {
        let rows = url_id_rows(&self.files)?;
        Ok(Box::new(rows.filter_map(|r| match r {
            Ok(row) => row
                .query_string
                .map(|qs| Ok((row.id, parse_query_string(&qs)))),
            Err(e) => Some(Err(e)),
        })))
    }
}

/// `(url_id, texts)` of one metadata kind (`title`, `h1`, ...) from
/// `urlcontents`. Urls without any matching line are omitted.
#[derive(Debug, Clone)]
pub struct MetadataStreamFactory<'m> {
    files: FileStreamFactory<'m>,
    content_type: String,
    content_type_code: i64,
}

impl<'m> MetadataStreamFactory<'m> {
    pub fn new(
        dirpath: impl Into<PathBuf>,
        content_type: &str,
        manifest: &'m CrawlManifest,
        part_id: Option<u64>,
    ) -> Result<Self> {
        Ok(Self {
            files: FileStreamFactory::new(dirpath, content::URLCONTENTS, manifest, part_id)?,
            content_type: content_type.to_string(),
            content_type_code: content::content_type_code(content_type)?,
        })
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }
}

impl DataStreamFactory for MetadataStreamFactory<'_> {
    type Item = (i64, Vec<String>);

    fn stream(&self) -> Result<DataStream<Self::Item>> {
        let code = self.content_type_code;
        let max_urlid = self.files.manifest().max_crawled_urlid();
        let groups = GroupByUrlId::new(self.files.stream()?)
            .take_while(within_crawl(max_urlid, |(id, _): &(i64, Vec<Record>)| Some(*id)));

        Ok(Box::new(groups.filter_map(move |g| {
            let (url_id, records) = match g {
                Ok(group) => group,
                Err(e) => return Some(Err(e)),
            };
            let mut texts = Vec::new();
            for record in records {
                match UrlContentRow::from_record(record) {
                    Ok(row) if row.content_type == code => texts.push(row.txt),
                    Ok(_) => {}
                    Err(e) => return Some(Err(e)),
                }
            }
            (!texts.is_empty()).then_some(Ok((url_id, texts)))
        })))
    }
}

/// Number of crawled pages: `urlinfos` lines with a non-zero http code, up to
/// the crawl boundary.
pub fn nb_crawled_urls(data_dir: &Path) -> Result<usize> {
    let manifest = CrawlManifest::load(data_dir)?;
    let files = FileStreamFactory::new(data_dir, content::URLINFOS, &manifest, None)?;
    nb_crawled_urls_from_stream(files.stream()?, manifest.max_crawled_urlid())
}

/// Same as [`nb_crawled_urls`] over an already opened `urlinfos` stream
pub fn nb_crawled_urls_from_stream(
    urlinfos: impl Iterator<Item = Result<Record>>,
    max_crawled_urlid: i64,
) -> Result<usize> {
    let mut count = 0;
    for record in urlinfos {
        let info = UrlInfoRow::from_record(record?)?;
        if info.id > max_crawled_urlid {
            break;
        }
        if info.http_code != 0 {
            count += 1;
        }
    }
    Ok(count)
}
