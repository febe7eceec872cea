//! Output document field mappings and the public field data model
//!
//! Every feature declares, for each dotted document path it may populate, a
//! value type, indexing settings and optional hooks: an enable predicate
//! evaluated against the crawl's feature options, and a render hook that
//! adjusts the public description of the field.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueType {
    String,
    Integer,
    Boolean,
    Float,
}

impl ValueType {
    pub fn as_str(self) -> &'static str {
        match self {
            ValueType::String => "string",
            ValueType::Integer => "integer",
            ValueType::Boolean => "boolean",
            ValueType::Float => "float",
        }
    }
}

/// Indexing, aggregation and access hints
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum FieldSetting {
    #[serde(rename = "es:not_analyzed")]
    EsNotAnalyzed,
    #[serde(rename = "es:doc_values")]
    EsDocValue,
    #[serde(rename = "agg:numerical")]
    AggNumerical,
    #[serde(rename = "rights:admin")]
    AdminRights,
}

impl FieldSetting {
    pub fn as_str(self) -> &'static str {
        match self {
            FieldSetting::EsNotAnalyzed => "es:not_analyzed",
            FieldSetting::EsDocValue => "es:doc_values",
            FieldSetting::AggNumerical => "agg:numerical",
            FieldSetting::AdminRights => "rights:admin",
        }
    }
}

/// One user-declared extraction rule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractRule {
    /// Rule name, shown as the field name
    pub name: String,
    #[serde(default)]
    pub rx: String,
    #[serde(default)]
    pub rx_match: String,
    #[serde(default)]
    pub rx_ignore_case: bool,
    /// `list`, `first`, `count` or `exist`
    pub agg: String,
    /// Target slot, e.g. `extract_i_0`
    pub es_field: String,
    /// `s`, `i`, `b`, `f` or empty for string
    #[serde(default)]
    pub cast: String,
}

/// Per-crawl feature options the mappings are rendered against
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureOptions {
    pub extract: Vec<ExtractRule>,
}

pub type EnabledFn = Box<dyn Fn(&FeatureOptions) -> bool + Send + Sync>;

/// `(options, field path, public field)`
pub type RenderFn = fn(&FeatureOptions, &str, &mut PublicField);

pub struct FieldSpec {
    pub value_type: ValueType,
    pub settings: BTreeSet<FieldSetting>,
    pub group: Option<String>,
    /// Field is `null` until data says otherwise
    pub default_is_null: bool,
    pub enabled: Option<EnabledFn>,
    pub render: Option<RenderFn>,
}

impl FieldSpec {
    pub fn new(value_type: ValueType, settings: impl IntoIterator<Item = FieldSetting>) -> Self {
        Self {
            value_type,
            settings: settings.into_iter().collect(),
            group: None,
            default_is_null: false,
            enabled: None,
            render: None,
        }
    }

    pub fn group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    pub fn default_null(mut self) -> Self {
        self.default_is_null = true;
        self
    }

    pub fn enabled_when(
        mut self,
        predicate: impl Fn(&FeatureOptions) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.enabled = Some(Box::new(predicate));
        self
    }

    pub fn render_with(mut self, render: RenderFn) -> Self {
        self.render = Some(render);
        self
    }

    pub fn is_enabled(&self, options: &FeatureOptions) -> bool {
        self.enabled.as_ref().is_none_or(|f| f(options))
    }
}

impl fmt::Debug for FieldSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldSpec")
            .field("value_type", &self.value_type)
            .field("settings", &self.settings)
            .field("group", &self.group)
            .field("default_is_null", &self.default_is_null)
            .field("enabled", &self.enabled.is_some())
            .field("render", &self.render.is_some())
            .finish()
    }
}

/// Immutable dotted path → spec table
#[derive(Debug, Default)]
pub struct FieldMapping {
    fields: BTreeMap<String, FieldSpec>,
}

impl FieldMapping {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: impl Into<String>, spec: FieldSpec) {
        self.fields.insert(path.into(), spec);
    }

    pub fn get(&self, path: &str) -> Option<&FieldSpec> {
        self.fields.get(path)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldSpec)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }
}

/// Public description of a field, as exposed to query clients
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PublicField {
    pub field: String,
    pub name: String,
    pub value_type: ValueType,
    pub multiple: bool,
    pub group: Option<String>,
    pub settings: Vec<FieldSetting>,
}

/// Enabled fields of every mapping, rendered against `options`
pub fn public_fields<'a>(
    mappings: impl IntoIterator<Item = &'a FieldMapping>,
    options: &FeatureOptions,
) -> Vec<PublicField> {
    let mut fields = Vec::new();
    for mapping in mappings {
        for (path, spec) in mapping.iter() {
            if !spec.is_enabled(options) {
                continue;
            }
            let mut public = PublicField {
                field: path.to_string(),
                name: path.to_string(),
                value_type: spec.value_type,
                multiple: false,
                group: spec.group.clone(),
                settings: spec.settings.iter().copied().collect(),
            };
            if let Some(render) = spec.render {
                render(options, path, &mut public);
            }
            fields.push(public);
        }
    }
    fields
}
