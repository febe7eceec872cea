//! User-defined field extraction results
//!
//! The crawler evaluates the extraction rules configured for a crawl and
//! writes one `urlextract` line per matched value. Each rule targets one of
//! a fixed set of typed slots (`extract_s_0` .. `extract_f_4`).

use std::collections::BTreeMap;
use std::sync::LazyLock;

use crawlpipe_core::content::URLEXTRACT;
use crawlpipe_core::{FromRecord, Record, Result};
use serde::Serialize;

use crate::docstream::DocumentStream;
use crate::mapping::{
    FeatureOptions, FieldMapping, FieldSetting, FieldSpec, PublicField, ValueType,
};

/// Slots per value type
pub const EXTRACT_RESULT_COUNT: usize = 5;

pub const GROUP: &str = "extract";

/// Highest list position kept; lines ranked beyond it are dropped
pub const MAX_LIST_RANK: usize = 10_000;

const SLOT_TYPES: [(ValueType, char); 4] = [
    (ValueType::String, 's'),
    (ValueType::Integer, 'i'),
    (ValueType::Boolean, 'b'),
    (ValueType::Float, 'f'),
];

/// Every slot name with its value type, e.g. `("extract_i_3", Integer)`
pub fn slots() -> impl Iterator<Item = (String, ValueType)> {
    SLOT_TYPES.into_iter().flat_map(|(value_type, short)| {
        (0..EXTRACT_RESULT_COUNT).map(move |i| (format!("extract_{short}_{i}"), value_type))
    })
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ExtractValue {
    Str(String),
    Int(i64),
    Bool(bool),
    Float(f64),
}

/// Content of one slot: a single value, or a rank-addressed list with gaps
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SlotValue {
    Scalar(ExtractValue),
    List(Vec<Option<ExtractValue>>),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ExtractDocument {
    pub extract: BTreeMap<String, Option<SlotValue>>,
}

impl ExtractDocument {
    pub fn slot(&self, es_field: &str) -> Option<&SlotValue> {
        self.extract.get(es_field).and_then(Option::as_ref)
    }
}

/// One `urlextract` line
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractLine {
    pub id: i64,
    pub label: String,
    pub es_field: String,
    /// `list`, `first`, `count` or `exist`
    pub agg: String,
    pub cast: String,
    /// Position within a list; lines of one list come in any order
    pub rank: i64,
    pub value: String,
}

impl FromRecord for ExtractLine {
    fn from_record(mut record: Record) -> Result<Self> {
        Ok(Self {
            id: record.take_int(0)?,
            label: record.take_str(1)?,
            es_field: record.take_str(2)?,
            agg: record.take_str(3)?,
            cast: record.take_str(4)?,
            rank: record.take_int(5)?,
            value: record.take_str(6)?,
        })
    }
}

/// Convert a raw extracted value according to its cast code
///
/// Numeric and boolean casts ignore every whitespace character; numbers that
/// do not parse become absent.
///
/// # Panics
///
/// On a cast code other than `""`, `s`, `i`, `b` or `f`. The crawler never
/// writes any other code.
pub fn apply_cast(cast: &str, value: String) -> Option<ExtractValue> {
    if cast.is_empty() || cast == "s" {
        return Some(ExtractValue::Str(value));
    }
    let compact: String = value.chars().filter(|c| !c.is_whitespace()).collect();
    match cast {
        "i" => compact.parse().ok().map(ExtractValue::Int),
        "f" => compact.parse().ok().map(ExtractValue::Float),
        "b" => Some(ExtractValue::Bool(compact == "1")),
        other => panic!("cast code {other:?} not in 'sibf'"),
    }
}

/// Store `value` at `rank` in the list held by `es_field`
///
/// Shorter lists are padded with absent values and a scalar already in the
/// slot becomes the first element. A negative rank, or one above
/// [`MAX_LIST_RANK`], leaves the slot as is.
pub fn put_in_place(
    extract: &mut BTreeMap<String, Option<SlotValue>>,
    es_field: &str,
    rank: i64,
    value: Option<ExtractValue>,
) {
    let rank = match usize::try_from(rank) {
        Ok(rank) if rank <= MAX_LIST_RANK => rank,
        _ => {
            log::debug!("Ignoring {es_field} value at rank {rank}");
            return;
        }
    };
    let slot = extract.entry(es_field.to_string()).or_default();
    let mut list = match slot.take() {
        None => Vec::new(),
        Some(SlotValue::Scalar(v)) => vec![Some(v)],
        Some(SlotValue::List(list)) => list,
    };
    if list.len() <= rank {
        list.resize(rank + 1, None);
    }
    list[rank] = value;
    *slot = Some(SlotValue::List(list));
}

fn render_field(options: &FeatureOptions, path: &str, public: &mut PublicField) {
    for rule in &options.extract {
        if path.strip_prefix("extract.") != Some(rule.es_field.as_str()) {
            continue;
        }
        // a list rule may store one item or several depending on the page
        if rule.agg == "list" {
            public.multiple = true;
        }
        public.name = rule.name.clone();
    }
}

static MAPPING: LazyLock<FieldMapping> = LazyLock::new(|| {
    let mut mapping = FieldMapping::new();
    for (slot, value_type) in slots() {
        let path = format!("extract.{slot}");
        let spec = FieldSpec::new(
            value_type,
            [FieldSetting::EsNotAnalyzed, FieldSetting::AdminRights],
        )
        .group(GROUP)
        .default_null()
        .enabled_when(move |options| options.extract.iter().any(|r| r.es_field == slot))
        .render_with(render_field);
        mapping.insert(path, spec);
    }
    mapping
});

/// Folds `urlextract` lines into `extract.<slot>` documents
#[derive(Debug, Clone, Copy, Default)]
pub struct ExtractResultsStreamDef;

impl DocumentStream for ExtractResultsStreamDef {
    const FILE: &'static str = URLEXTRACT;
    type Line = ExtractLine;
    type Document = ExtractDocument;

    fn mapping(&self) -> &'static FieldMapping {
        &MAPPING
    }

    fn pre_process(&self) -> ExtractDocument {
        ExtractDocument {
            extract: slots().map(|(slot, _)| (slot, None)).collect(),
        }
    }

    fn process(&self, document: &mut ExtractDocument, line: ExtractLine) {
        let value = apply_cast(&line.cast, line.value);
        if line.agg != "list" {
            document
                .extract
                .insert(line.es_field, value.map(SlotValue::Scalar));
        } else {
            put_in_place(&mut document.extract, &line.es_field, line.rank, value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping::{ExtractRule, public_fields};
    use crawlpipe_core::content::EXTRACT_RESULTS;

    fn line(raw: &str) -> ExtractLine {
        ExtractLine::from_record(EXTRACT_RESULTS.cast_line(raw).unwrap()).unwrap()
    }

    fn s(v: &str) -> Option<ExtractValue> {
        Some(ExtractValue::Str(v.to_string()))
    }

    fn rule(name: &str, agg: &str, es_field: &str) -> ExtractRule {
        ExtractRule {
            name: name.to_string(),
            rx: String::new(),
            rx_match: String::new(),
            rx_ignore_case: false,
            agg: agg.to_string(),
            es_field: es_field.to_string(),
            cast: String::new(),
        }
    }

    #[test]
    fn casts() {
        assert_eq!(apply_cast("i", " 1 2".into()), Some(ExtractValue::Int(12)));
        assert_eq!(apply_cast("i", "abc".into()), None);
        assert_eq!(apply_cast("f", "3 .5".into()), Some(ExtractValue::Float(3.5)));
        assert_eq!(apply_cast("f", "x".into()), None);
        assert_eq!(apply_cast("b", " 1".into()), Some(ExtractValue::Bool(true)));
        assert_eq!(apply_cast("b", "true".into()), Some(ExtractValue::Bool(false)));
        assert_eq!(apply_cast("", " a b ".into()), s(" a b "));
        assert_eq!(apply_cast("s", "7".into()), s("7"));
    }

    #[test]
    #[should_panic(expected = "not in 'sibf'")]
    fn unknown_cast_code() {
        apply_cast("x", "1".into());
    }

    #[test]
    fn list_ranks_fill_gaps_in_any_order() {
        let mut extract = BTreeMap::new();
        put_in_place(&mut extract, "extract_s_0", 2, s("v2"));
        put_in_place(&mut extract, "extract_s_0", 0, s("v0"));
        assert_eq!(
            extract["extract_s_0"],
            Some(SlotValue::List(vec![s("v0"), None, s("v2")]))
        );
    }

    #[test]
    fn negative_rank_is_ignored() {
        let mut extract = BTreeMap::new();
        extract.insert(
            "extract_s_0".to_string(),
            Some(SlotValue::Scalar(ExtractValue::Int(1))),
        );
        let before = extract.clone();
        put_in_place(&mut extract, "extract_s_0", -1, s("x"));
        assert_eq!(extract, before);
    }

    #[test]
    fn rank_beyond_max_is_ignored() {
        let mut extract = BTreeMap::new();
        put_in_place(&mut extract, "extract_s_0", 0, s("a"));
        let before = extract.clone();
        put_in_place(&mut extract, "extract_s_0", i64::MAX, s("x"));
        put_in_place(&mut extract, "extract_s_0", MAX_LIST_RANK as i64 + 1, s("y"));
        assert_eq!(extract, before);

        put_in_place(&mut extract, "extract_s_0", MAX_LIST_RANK as i64, s("z"));
        let Some(SlotValue::List(list)) = &extract["extract_s_0"] else {
            panic!("expected a list");
        };
        assert_eq!(list.len(), MAX_LIST_RANK + 1);
        assert_eq!(list[MAX_LIST_RANK], s("z"));
    }

    #[test]
    fn scalar_becomes_first_list_element() {
        let mut extract = BTreeMap::new();
        extract.insert("extract_s_1".to_string(), s("a").map(SlotValue::Scalar));
        put_in_place(&mut extract, "extract_s_1", 2, s("c"));
        assert_eq!(
            extract["extract_s_1"],
            Some(SlotValue::List(vec![s("a"), None, s("c")]))
        );
    }

    #[test]
    fn fold_lines() {
        let def = ExtractResultsStreamDef;
        let mut document = def.pre_process();
        assert_eq!(document.extract.len(), 4 * EXTRACT_RESULT_COUNT);
        assert!(document.extract.values().all(Option::is_none));

        for raw in [
            "7\tprice\textract_i_0\tfirst\ti\t0\t 1 999",
            "7\ttags\textract_s_0\tlist\t\t1\tblue",
            "7\ttags\textract_s_0\tlist\t\t0\tred",
            "7\tstock\textract_b_0\texist\tb\t0\t1",
            "7\tweight\textract_f_0\tfirst\tf\t0\tn/a",
        ] {
            def.process(&mut document, line(raw));
        }
        def.post_process(&mut document);

        assert_eq!(
            document.slot("extract_i_0"),
            Some(&SlotValue::Scalar(ExtractValue::Int(1999)))
        );
        assert_eq!(
            document.slot("extract_s_0"),
            Some(&SlotValue::List(vec![s("red"), s("blue")]))
        );
        assert_eq!(
            document.slot("extract_b_0"),
            Some(&SlotValue::Scalar(ExtractValue::Bool(true)))
        );
        assert_eq!(document.slot("extract_f_0"), None);
        assert_eq!(document.slot("extract_s_4"), None);

        let json = serde_json::to_value(&document).unwrap();
        assert_eq!(json["extract"]["extract_s_0"], serde_json::json!(["red", "blue"]));
        assert_eq!(json["extract"]["extract_f_0"], serde_json::Value::Null);
    }

    #[test]
    fn only_configured_slots_are_public() {
        let options = FeatureOptions {
            extract: vec![
                rule("Tags", "list", "extract_s_0"),
                rule("Price", "first", "extract_i_2"),
            ],
        };
        let fields = public_fields([ExtractResultsStreamDef.mapping()], &options);
        assert_eq!(fields.len(), 2);

        let tags = fields.iter().find(|f| f.field == "extract.extract_s_0").unwrap();
        assert_eq!(tags.name, "Tags");
        assert!(tags.multiple);
        assert_eq!(tags.group.as_deref(), Some(GROUP));
        assert_eq!(
            tags.settings,
            vec![FieldSetting::EsNotAnalyzed, FieldSetting::AdminRights]
        );

        let price = fields.iter().find(|f| f.field == "extract.extract_i_2").unwrap();
        assert_eq!(price.name, "Price");
        assert_eq!(price.value_type, ValueType::Integer);
        assert!(!price.multiple);

        let none = public_fields([ExtractResultsStreamDef.mapping()], &FeatureOptions::default());
        assert!(none.is_empty());
    }
}
