//! Registry of crawler content basenames and their column schemas

use crate::caster::{Column, FromRecord, Record, Schema};
use crate::decode;
use crate::error::{Error, Result};

pub const URLIDS: &str = "urlids";
pub const URLINFOS: &str = "urlinfos";
pub const URLCONTENTS: &str = "urlcontents";
pub const URLLINKS: &str = "urllinks";
pub const ANALYTICS_RAW_DATA: &str = "analytics_raw_data";
pub const ANALYTICS_DATA: &str = "analytics_data";
pub const URLEXTRACT: &str = "urlextract";

pub static PATTERNS: Schema = Schema::new(&[
    Column::new("id", decode::int),
    Column::new("protocol", decode::string),
    Column::new("host", decode::string),
    Column::new("path", decode::string),
    Column::optional("query_string", decode::string),
]);

pub static INFOS: Schema = Schema::new(&[
    Column::new("id", decode::int),
    Column::new("infos_mask", decode::int),
    Column::new("content_type", decode::string),
    Column::new("depth", decode::int),
    Column::new("date_crawled", decode::int),
    Column::new("http_code", decode::int),
    Column::new("byte_size", decode::int),
    Column::new("delay_first_byte", decode::int),
    Column::new("delay_last_byte", decode::int),
]);

pub static CONTENTS: Schema = Schema::new(&[
    Column::new("id", decode::int),
    Column::new("content_type", decode::int),
    Column::new("hash", decode::int),
    Column::new("txt", decode::string),
]);

pub static OUTLINKS: Schema = Schema::new(&[
    Column::new("id", decode::int),
    Column::new("link_type", decode::string),
    Column::new("follow", decode::follow_mask),
    Column::new("dst_url_id", decode::int),
    Column::optional("external_url", decode::string),
]);

pub static RAW_VISITS: Schema = Schema::new(&[
    Column::new("url", decode::string),
    Column::new("medium", decode::string),
    Column::new("source", decode::string),
    Column::new("social_network", decode::lower_or_not_set),
    Column::new("nb_visits", decode::int),
    Column::new("sessions", decode::int),
    Column::new("bounces", decode::int),
    Column::new("page_views", decode::int),
    Column::new("session_duration", decode::float),
    Column::new("new_users", decode::int),
    Column::new("goal_completions_all", decode::int),
]);

pub static VISITS: Schema = Schema::new(&[
    Column::new("id", decode::int),
    Column::new("medium", decode::string),
    Column::new("source", decode::string),
    Column::new("social_network", decode::string),
    Column::new("nb", decode::int),
    Column::new("sessions", decode::int),
    Column::new("bounces", decode::int),
    Column::new("page_views", decode::int),
    Column::new("session_duration", decode::float),
    Column::new("new_users", decode::int),
    Column::new("goal_completions_all", decode::int),
]);

pub static EXTRACT_RESULTS: Schema = Schema::new(&[
    Column::new("id", decode::int),
    Column::new("label", decode::string),
    Column::new("es_field", decode::string),
    Column::new("agg", decode::string),
    Column::new("cast", decode::string),
    Column::new("rank", decode::int),
    Column::new("value", decode::string),
]);

static STREAMS: [(&str, &Schema); 7] = [
    (URLIDS, &PATTERNS),
    (URLINFOS, &INFOS),
    (URLCONTENTS, &CONTENTS),
    (URLLINKS, &OUTLINKS),
    (ANALYTICS_RAW_DATA, &RAW_VISITS),
    (ANALYTICS_DATA, &VISITS),
    (URLEXTRACT, &EXTRACT_RESULTS),
];

/// Schema registered for a content basename
pub fn schema_for(content: &str) -> Result<&'static Schema> {
    STREAMS
        .iter()
        .find(|(name, _)| *name == content)
        .map(|(_, schema)| *schema)
        .ok_or_else(|| Error::UnknownContent(content.to_string()))
}

/// Registered basename matching `content`, with a `'static` lifetime
pub fn registered_name(content: &str) -> Result<&'static str> {
    STREAMS
        .iter()
        .find(|(name, _)| *name == content)
        .map(|(name, _)| *name)
        .ok_or_else(|| Error::UnknownContent(content.to_string()))
}

pub fn content_names() -> impl Iterator<Item = &'static str> {
    STREAMS.iter().map(|(name, _)| *name)
}

/// `urlcontents` content type codes
const CONTENT_TYPES: [(&str, i64); 5] = [
    ("title", 1),
    ("h1", 2),
    ("h2", 3),
    ("description", 4),
    ("h3", 5),
];

pub fn content_type_code(name: &str) -> Result<i64> {
    CONTENT_TYPES
        .iter()
        .find(|(n, _)| *n == name)
        .map(|(_, code)| *code)
        .ok_or_else(|| Error::UnknownContentType(name.to_string()))
}

pub fn content_type_names() -> impl Iterator<Item = &'static str> {
    CONTENT_TYPES.iter().map(|(name, _)| *name)
}

// === Typed rows ===

/// One `urlids` line
#[derive(Debug, Clone, PartialEq)]
pub struct UrlIdRow {
    pub id: i64,
    pub protocol: String,
    pub host: String,
    pub path: String,
    pub query_string: Option<String>,
}

impl FromRecord for UrlIdRow {
    fn from_record(mut record: Record) -> Result<Self> {
        Ok(Self {
            id: record.take_int(0)?,
            protocol: record.take_str(1)?,
            host: record.take_str(2)?,
            path: record.take_str(3)?,
            query_string: record.take_opt_str(4)?,
        })
    }
}

/// The subset of a `urlinfos` line used downstream
#[derive(Debug, Clone, PartialEq)]
pub struct UrlInfoRow {
    pub id: i64,
    pub depth: i64,
    pub http_code: i64,
}

impl FromRecord for UrlInfoRow {
    fn from_record(mut record: Record) -> Result<Self> {
        Ok(Self {
            id: record.take_int(0)?,
            depth: record.take_int(3)?,
            http_code: record.take_int(5)?,
        })
    }
}

/// One `urlcontents` line
#[derive(Debug, Clone, PartialEq)]
pub struct UrlContentRow {
    pub id: i64,
    pub content_type: i64,
    pub hash: i64,
    pub txt: String,
}

impl FromRecord for UrlContentRow {
    fn from_record(mut record: Record) -> Result<Self> {
        Ok(Self {
            id: record.take_int(0)?,
            content_type: record.take_int(1)?,
            hash: record.take_int(2)?,
            txt: record.take_str(3)?,
        })
    }
}
