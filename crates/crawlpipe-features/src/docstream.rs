//! Per-url document folding over url-id ordered content streams
//!
//! A document stream definition turns every run of lines sharing a url id
//! into one output document in three phases: `pre_process` builds a
//! schema-complete empty document, `process` folds one line into it, and
//! `post_process` derives the metrics that need the complete sums and drops
//! intermediate values.

use std::path::PathBuf;

use crawlpipe_core::{
    CrawlManifest, FileStream, FileStreamFactory, FromRecord, GroupByUrlId, Record, Result,
};
use serde::Serialize;

use crate::mapping::FieldMapping;

pub trait DocumentStream {
    /// Content basename the definition reads, e.g. `analytics_data`
    const FILE: &'static str;

    /// Typed input line
    type Line: FromRecord;

    /// Output document, owned by the fold for one url id
    type Document: Serialize;

    /// Output field table
    fn mapping(&self) -> &'static FieldMapping;

    fn pre_process(&self) -> Self::Document;

    fn process(&self, document: &mut Self::Document, line: Self::Line);

    fn post_process(&self, document: &mut Self::Document) {
        let _ = document;
    }
}

/// Folded document tagged with its url id; serializes flat, e.g.
/// `{"id": 3, "visits": {...}}`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UrlDocument<D> {
    pub id: i64,
    #[serde(flatten)]
    pub document: D,
}

/// Fold the lines of one url id into a finished document
pub fn fold_group<S: DocumentStream>(
    def: &S,
    url_id: i64,
    records: Vec<Record>,
) -> Result<UrlDocument<S::Document>> {
    let mut document = def.pre_process();
    for record in records {
        def.process(&mut document, <S::Line as FromRecord>::from_record(record)?);
    }
    def.post_process(&mut document);
    Ok(UrlDocument {
        id: url_id,
        document,
    })
}

/// Lazy iterator of folded documents, one per url id run
pub struct DocumentFold<'d, S, I> {
    def: &'d S,
    groups: GroupByUrlId<I>,
    failed: bool,
}

impl<'d, S, I> DocumentFold<'d, S, I>
where
    S: DocumentStream,
    I: Iterator<Item = Result<Record>>,
{
    pub fn new(def: &'d S, records: I) -> Self {
        Self {
            def,
            groups: GroupByUrlId::new(records),
            failed: false,
        }
    }
}

impl<S, I> Iterator for DocumentFold<'_, S, I>
where
    S: DocumentStream,
    I: Iterator<Item = Result<Record>>,
{
    type Item = Result<UrlDocument<S::Document>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        let item = self
            .groups
            .next()?
            .and_then(|(url_id, records)| fold_group(self.def, url_id, records));
        self.failed = item.is_err();
        Some(item)
    }
}

/// Shorthand for [`DocumentFold::new`]
pub fn fold_documents<S, I>(def: &S, records: I) -> DocumentFold<'_, S, I>
where
    S: DocumentStream,
    I: Iterator<Item = Result<Record>>,
{
    DocumentFold::new(def, records)
}

/// Opens a definition's content files and folds them into documents
pub struct DocumentStreamFactory<'m, S> {
    files: FileStreamFactory<'m>,
    def: S,
}

impl<'m, S: DocumentStream> DocumentStreamFactory<'m, S> {
    pub fn new(
        dirpath: impl Into<PathBuf>,
        def: S,
        manifest: &'m CrawlManifest,
        part_id: Option<u64>,
    ) -> Result<Self> {
        Ok(Self {
            files: FileStreamFactory::new(dirpath, S::FILE, manifest, part_id)?,
            def,
        })
    }

    /// Fresh pass over the files on every call
    pub fn documents(&self) -> Result<DocumentFold<'_, S, FileStream>> {
        log::debug!("Folding {} lines into documents", S::FILE);
        Ok(DocumentFold::new(&self.def, self.files.stream()?))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::LazyLock;

    use super::*;
    use crawlpipe_core::Error;
    use crawlpipe_core::content::{CONTENTS, URLCONTENTS, UrlContentRow};

    /// Collects the texts of a url, sorted once complete
    struct Texts;

    static EMPTY: LazyLock<FieldMapping> = LazyLock::new(FieldMapping::new);

    impl DocumentStream for Texts {
        const FILE: &'static str = URLCONTENTS;
        type Line = UrlContentRow;
        type Document = Vec<String>;

        fn mapping(&self) -> &'static FieldMapping {
            &EMPTY
        }

        fn pre_process(&self) -> Vec<String> {
            Vec::new()
        }

        fn process(&self, document: &mut Vec<String>, line: UrlContentRow) {
            document.push(line.txt);
        }

        fn post_process(&self, document: &mut Vec<String>) {
            document.sort();
        }
    }

    fn records(raw: &[&str]) -> impl Iterator<Item = Result<Record>> {
        let lines: Vec<Result<String>> = raw.iter().map(|l| Ok(l.to_string())).collect();
        CONTENTS.cast(lines.into_iter())
    }

    #[test]
    fn one_document_per_url_id_run() {
        let docs: Vec<_> = fold_documents(
            &Texts,
            records(&["1\t1\t0\tb", "1\t2\t0\ta", "3\t1\t0\tc"]),
        )
        .map(|d| d.unwrap())
        .collect();
        assert_eq!(
            docs,
            vec![
                UrlDocument {
                    id: 1,
                    document: vec!["a".to_string(), "b".to_string()],
                },
                UrlDocument {
                    id: 3,
                    document: vec!["c".to_string()],
                },
            ]
        );
    }

    #[test]
    fn empty_stream_yields_nothing() {
        assert_eq!(fold_documents(&Texts, records(&[])).count(), 0);
    }

    #[test]
    fn cast_error_fuses_the_fold() {
        let mut docs = fold_documents(&Texts, records(&["1\t1\t0\ta", "x\t1\t0\tb", "2\t1\t0\tc"]));
        assert!(matches!(docs.next(), Some(Err(Error::Cast { .. }))));
        assert!(docs.next().is_none());
    }

    #[test]
    fn document_serializes_flat_with_id() {
        #[derive(Serialize)]
        struct Doc {
            name: &'static str,
        }
        let doc = UrlDocument {
            id: 3,
            document: Doc { name: "x" },
        };
        assert_eq!(
            serde_json::to_value(&doc).unwrap(),
            serde_json::json!({"id": 3, "name": "x"})
        );
    }
}
