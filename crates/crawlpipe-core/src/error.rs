//! Common error type for crawl file streaming and casting

use std::path::PathBuf;

use thiserror::Error;

/// Error raised while locating, reading or casting crawl files.
///
/// File-level and schema-level problems surface here. Per-field degradations
/// inside document folds (e.g. an extracted value that is not a number) are
/// absorbed into `None` by the fold and never reach this type.
#[derive(Debug, Error)]
pub enum Error {
    /// A manifest entry does not follow `<basename>.txt.<part_id>.gz`
    #[error("{filename} does not contain any part id")]
    MalformedFileName { filename: String },

    /// Requested basename has no registered schema
    #[error("{0} is not a known raw file basename")]
    UnknownContent(String),

    /// Requested metadata kind has no content type code
    #[error("{0} is not a known metadata content type")]
    UnknownContentType(String),

    /// Line carries fewer fields than the schema requires
    #[error("line has {found} fields, column '{column}' is required")]
    MissingColumn { column: &'static str, found: usize },

    /// A decoder rejected a raw field
    #[error("cannot cast column '{column}' from {value:?}: {reason}")]
    Cast {
        column: &'static str,
        value: String,
        reason: String,
    },

    /// Line is not valid UTF-8
    #[error("{}:{line}: invalid UTF-8", path.display())]
    InvalidUtf8 { path: PathBuf, line: usize },

    #[error("IO error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Partition file pattern could not be compiled
    #[error("invalid partition pattern {pattern:?}: {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },

    #[error("invalid manifest {}: {source}", path.display())]
    Manifest {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::ErrorKind;

    #[test]
    fn display_malformed_filename() {
        let err = Error::MalformedFileName {
            filename: "urlids.txt.abc.gz".to_string(),
        };
        assert_eq!(
            format!("{err}"),
            "urlids.txt.abc.gz does not contain any part id"
        );
    }

    #[test]
    fn display_cast_names_column_and_value() {
        let err = Error::Cast {
            column: "id",
            value: "x1".to_string(),
            reason: "invalid digit found in string".to_string(),
        };
        let msg = format!("{err}");
        assert!(msg.contains("'id'"));
        assert!(msg.contains("\"x1\""));
    }

    #[test]
    fn display_io_includes_path() {
        let err = Error::io(
            "/tmp/urlids.txt.0.gz",
            std::io::Error::new(ErrorKind::NotFound, "not found"),
        );
        assert!(format!("{err}").contains("/tmp/urlids.txt.0.gz"));
    }

    #[test]
    fn display_pattern_names_pattern() {
        let err = Error::Pattern {
            pattern: "urlids.txt.[.gz".to_string(),
            source: glob::Pattern::new("urlids.txt.[.gz").unwrap_err(),
        };
        assert!(format!("{err}").starts_with("invalid partition pattern \"urlids.txt.[.gz\""));
        assert!(std::error::Error::source(&err).is_some());
    }
}
