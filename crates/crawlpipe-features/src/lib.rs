//! Per-url document features built on top of the crawl content streams

pub mod docstream;
pub mod extract;
pub mod ganalytics;
pub mod mapping;

pub use docstream::{
    DocumentFold, DocumentStream, DocumentStreamFactory, UrlDocument, fold_documents, fold_group,
};
pub use extract::{ExtractDocument, ExtractResultsStreamDef, ExtractValue, SlotValue};
pub use ganalytics::{VisitsDocument, VisitsStreamDef};
pub use mapping::{
    ExtractRule, FeatureOptions, FieldMapping, FieldSetting, FieldSpec, PublicField, ValueType,
    public_fields,
};

/// Document features the pipeline can produce
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Feature {
    Visits,
    Extract,
}

impl Feature {
    pub const ALL: [Feature; 2] = [Feature::Visits, Feature::Extract];

    pub fn name(self) -> &'static str {
        match self {
            Feature::Visits => "visits",
            Feature::Extract => "extract",
        }
    }

    /// Content basename the feature is folded from
    pub fn content(self) -> &'static str {
        match self {
            Feature::Visits => VisitsStreamDef::FILE,
            Feature::Extract => ExtractResultsStreamDef::FILE,
        }
    }

    pub fn mapping(self) -> &'static FieldMapping {
        match self {
            Feature::Visits => VisitsStreamDef.mapping(),
            Feature::Extract => ExtractResultsStreamDef.mapping(),
        }
    }
}

/// Public fields of every feature in `features`
pub fn feature_fields(features: &[Feature], options: &FeatureOptions) -> Vec<PublicField> {
    public_fields(features.iter().map(|f| f.mapping()), options)
}
