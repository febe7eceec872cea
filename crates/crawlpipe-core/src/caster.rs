//! Positional casting of tab-separated lines into typed records

use std::fmt;

use serde::Serialize;

use crate::error::{Error, Result};

/// A decoded field value
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<String>),
}

impl Value {
    fn kind(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::Str(_) => "str",
            Self::List(_) => "list",
        }
    }
}

/// Converts one raw text field; the error is a human-readable reason
pub type Decoder = fn(&str) -> std::result::Result<Value, String>;

/// One column of a content schema
#[derive(Clone, Copy)]
pub struct Column {
    pub name: &'static str,
    pub decode: Decoder,
    /// Trailing columns the crawler may omit
    pub optional: bool,
}

impl Column {
    pub const fn new(name: &'static str, decode: Decoder) -> Self {
        Self {
            name,
            decode,
            optional: false,
        }
    }

    pub const fn optional(name: &'static str, decode: Decoder) -> Self {
        Self {
            name,
            decode,
            optional: true,
        }
    }
}

impl fmt::Debug for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Column")
            .field("name", &self.name)
            .field("optional", &self.optional)
            .finish_non_exhaustive()
    }
}

/// Fixed positional layout of one content type
#[derive(Debug)]
pub struct Schema {
    columns: &'static [Column],
}

impl Schema {
    pub const fn new(columns: &'static [Column]) -> Self {
        Self { columns }
    }

    pub fn columns(&self) -> &[Column] {
        self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Position of a column by name
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    /// Number of fields a line must carry
    pub fn required_len(&self) -> usize {
        self.columns
            .iter()
            .position(|c| c.optional)
            .unwrap_or(self.columns.len())
    }

    /// Split and decode one line. Fields beyond the schema are ignored.
    pub fn cast_line(&self, line: &str) -> Result<Record> {
        let fields: Vec<&str> = line.split('\t').collect();
        let required = self.required_len();
        if fields.len() < required {
            return Err(Error::MissingColumn {
                column: self.columns[fields.len()].name,
                found: fields.len(),
            });
        }

        let values = self
            .columns
            .iter()
            .zip(fields)
            .map(|(column, raw)| {
                (column.decode)(raw).map_err(|reason| Error::Cast {
                    column: column.name,
                    value: raw.to_owned(),
                    reason,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Record::new(self.columns, values))
    }

    /// Lazily cast a stream of lines, preserving order
    pub fn cast<I>(&self, lines: I) -> Cast<'_, I>
    where
        I: Iterator<Item = Result<String>>,
    {
        Cast {
            schema: self,
            lines,
            failed: false,
        }
    }
}

/// Iterator returned by [`Schema::cast`]; stops after the first error
pub struct Cast<'s, I> {
    schema: &'s Schema,
    lines: I,
    failed: bool,
}

impl<I> Iterator for Cast<'_, I>
where
    I: Iterator<Item = Result<String>>,
{
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        let item = self
            .lines
            .next()?
            .and_then(|line| self.schema.cast_line(&line));
        self.failed = item.is_err();
        Some(item)
    }
}

/// Casted line: one value per present schema column
#[derive(Debug, Clone)]
pub struct Record {
    columns: &'static [Column],
    values: Vec<Value>,
}

impl Record {
    fn new(columns: &'static [Column], values: Vec<Value>) -> Self {
        Self { columns, values }
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn into_values(self) -> Vec<Value> {
        self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, idx: usize) -> Option<&Value> {
        self.values.get(idx)
    }

    /// Leading url id column, shared by every url-keyed content
    pub fn url_id(&self) -> Option<i64> {
        match self.values.first() {
            Some(Value::Int(id)) => Some(*id),
            _ => None,
        }
    }

    fn column_name(&self, idx: usize) -> &'static str {
        self.columns.get(idx).map_or("?", |c| c.name)
    }

    fn take_value(&mut self, idx: usize) -> Result<Value> {
        if idx >= self.values.len() {
            return Err(Error::MissingColumn {
                column: self.column_name(idx),
                found: self.values.len(),
            });
        }
        Ok(std::mem::replace(&mut self.values[idx], Value::Null))
    }

    fn mismatch(&self, idx: usize, value: &Value, expected: &str) -> Error {
        Error::Cast {
            column: self.column_name(idx),
            value: format!("{value:?}"),
            reason: format!("expected {expected}, decoded {}", value.kind()),
        }
    }

    pub fn take_int(&mut self, idx: usize) -> Result<i64> {
        match self.take_value(idx)? {
            Value::Int(n) => Ok(n),
            other => Err(self.mismatch(idx, &other, "int")),
        }
    }

    pub fn take_float(&mut self, idx: usize) -> Result<f64> {
        match self.take_value(idx)? {
            Value::Float(n) => Ok(n),
            Value::Int(n) => Ok(n as f64),
            other => Err(self.mismatch(idx, &other, "float")),
        }
    }

    pub fn take_str(&mut self, idx: usize) -> Result<String> {
        match self.take_value(idx)? {
            Value::Str(s) => Ok(s),
            other => Err(self.mismatch(idx, &other, "str")),
        }
    }

    /// String column that may be absent: missing trailing field or `Null`
    pub fn take_opt_str(&mut self, idx: usize) -> Result<Option<String>> {
        if idx >= self.values.len() {
            return Ok(None);
        }
        match self.take_value(idx)? {
            Value::Null => Ok(None),
            Value::Str(s) => Ok(Some(s)),
            other => Err(self.mismatch(idx, &other, "str")),
        }
    }
}

/// Typed row built from a casted record of a known schema
pub trait FromRecord: Sized {
    fn from_record(record: Record) -> Result<Self>;
}
