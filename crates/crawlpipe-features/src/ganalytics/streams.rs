//! Per-url visit buckets folded from `analytics_data`
//!
//! Every line lands in `<medium>.all`. Lines whose source is one of the
//! reported sources also land in `<medium>.considered` and in the bucket of
//! the source itself. Ratios are derived once all lines of a url are summed.

use std::collections::BTreeMap;
use std::ops::AddAssign;
use std::sync::LazyLock;

use crawlpipe_core::content::ANALYTICS_DATA;
use crawlpipe_core::{FromRecord, Record, Result};
use serde::Serialize;

use super::metrics::{compute_average_value, compute_percentage};
use super::settings::{self, ORGANIC_SOURCES, SOCIAL_SOURCES};
use crate::docstream::DocumentStream;
use crate::mapping::{FieldMapping, FieldSetting, FieldSpec, ValueType};

pub const ALL: &str = "all";
pub const CONSIDERED: &str = "considered";

/// Derived metric names, in output order
pub const CALCULATED_METRICS: [&str; 5] = [
    "bounce_rate",
    "pages_per_session",
    "average_session_duration",
    "percentage_new_sessions",
    "goal_conversion_rate_all",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Medium {
    Organic,
    Social,
}

impl Medium {
    pub fn as_str(self) -> &'static str {
        match self {
            Medium::Organic => "organic",
            Medium::Social => "social",
        }
    }

    /// Sources reported in their own bucket
    pub fn sources(self) -> &'static [&'static str] {
        match self {
            Medium::Organic => &ORGANIC_SOURCES,
            Medium::Social => &SOCIAL_SOURCES,
        }
    }
}

/// Every `(medium, bucket)` pair a visits document carries
pub fn iterate_sources() -> impl Iterator<Item = (Medium, &'static str)> {
    [Medium::Organic, Medium::Social]
        .into_iter()
        .filter(|medium| !medium.sources().is_empty())
        .flat_map(|medium| {
            [ALL, CONSIDERED]
                .into_iter()
                .chain(medium.sources().iter().copied())
                .map(move |bucket| (medium, bucket))
        })
}

/// Summed raw counters of one bucket
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RawCounters {
    pub nb: i64,
    pub sessions: i64,
    pub bounces: i64,
    pub page_views: i64,
    pub session_duration: f64,
    pub new_users: i64,
    pub goal_completions_all: i64,
}

impl AddAssign<&RawCounters> for RawCounters {
    fn add_assign(&mut self, other: &RawCounters) {
        self.nb += other.nb;
        self.sessions += other.sessions;
        self.bounces += other.bounces;
        self.page_views += other.page_views;
        self.session_duration += other.session_duration;
        self.new_users += other.new_users;
        self.goal_completions_all += other.goal_completions_all;
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct CalculatedMetrics {
    pub bounce_rate: f64,
    pub pages_per_session: f64,
    pub average_session_duration: f64,
    pub percentage_new_sessions: f64,
    pub goal_conversion_rate_all: f64,
}

impl CalculatedMetrics {
    pub fn from_counters(raw: &RawCounters) -> Self {
        let sessions = raw.sessions;
        Self {
            bounce_rate: compute_percentage(raw.bounces as f64, sessions),
            pages_per_session: compute_average_value(raw.page_views as f64, sessions),
            average_session_duration: compute_average_value(raw.session_duration, sessions),
            percentage_new_sessions: compute_percentage(raw.new_users as f64, sessions),
            goal_conversion_rate_all: compute_percentage(raw.goal_completions_all as f64, sessions),
        }
    }
}

/// One `visits.<medium>.<bucket>` entry
///
/// Raw counters are only kept while lines are folded in. Once finished the
/// bucket serializes as `nb` plus the derived metrics.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct VisitBucket {
    #[serde(skip)]
    raw: RawCounters,
    nb: i64,
    #[serde(flatten)]
    metrics: Option<CalculatedMetrics>,
}

impl VisitBucket {
    fn add(&mut self, counters: &RawCounters) {
        self.raw += counters;
        self.nb = self.raw.nb;
    }

    fn finish(&mut self) {
        let raw = std::mem::take(&mut self.raw);
        self.metrics = Some(CalculatedMetrics::from_counters(&raw));
    }

    pub fn nb(&self) -> i64 {
        self.nb
    }

    /// Counters summed so far, zeroed once the bucket is finished
    pub fn raw(&self) -> &RawCounters {
        &self.raw
    }

    pub fn metrics(&self) -> Option<&CalculatedMetrics> {
        self.metrics.as_ref()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Visits {
    pub organic: BTreeMap<String, VisitBucket>,
    pub social: BTreeMap<String, VisitBucket>,
}

impl Visits {
    pub fn medium(&self, medium: Medium) -> &BTreeMap<String, VisitBucket> {
        match medium {
            Medium::Organic => &self.organic,
            Medium::Social => &self.social,
        }
    }

    fn medium_mut(&mut self, medium: Medium) -> &mut BTreeMap<String, VisitBucket> {
        match medium {
            Medium::Organic => &mut self.organic,
            Medium::Social => &mut self.social,
        }
    }

    pub fn bucket(&self, medium: Medium, bucket: &str) -> Option<&VisitBucket> {
        self.medium(medium).get(bucket)
    }

    fn add(&mut self, medium: Medium, bucket: &str, counters: &RawCounters) {
        if let Some(entry) = self.medium_mut(medium).get_mut(bucket) {
            entry.add(counters);
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct VisitsDocument {
    pub visits: Visits,
}

/// One `analytics_data` line
#[derive(Debug, Clone, PartialEq)]
pub struct VisitLine {
    pub id: i64,
    pub medium: String,
    pub source: String,
    pub social_network: String,
    pub counters: RawCounters,
}

impl FromRecord for VisitLine {
    fn from_record(mut record: Record) -> Result<Self> {
        Ok(Self {
            id: record.take_int(0)?,
            medium: record.take_str(1)?,
            source: record.take_str(2)?,
            social_network: record.take_str(3)?,
            counters: RawCounters {
                nb: record.take_int(4)?,
                sessions: record.take_int(5)?,
                bounces: record.take_int(6)?,
                page_views: record.take_int(7)?,
                session_duration: record.take_float(8)?,
                new_users: record.take_int(9)?,
                goal_completions_all: record.take_int(10)?,
            },
        })
    }
}

impl VisitLine {
    /// Bucket the line is reported under, if any
    ///
    /// Any named social network makes the visit social, with the network
    /// standing in for the source.
    pub fn classify(&self) -> Option<(Medium, &str)> {
        let network = self.social_network.as_str();
        if !network.is_empty() && network != "None" {
            Some((Medium::Social, network))
        } else if self.medium == "organic" {
            Some((Medium::Organic, self.source.as_str()))
        } else {
            None
        }
    }
}

/// Whether the classified source has its own bucket
pub fn consider_source(medium: Medium, source: &str) -> bool {
    medium.sources().contains(&source)
}

fn field_spec(value_type: ValueType, prefix: &str) -> FieldSpec {
    let spec = FieldSpec::new(
        value_type,
        [FieldSetting::EsDocValue, FieldSetting::AggNumerical],
    );
    match settings::groups().into_iter().find(|(id, _)| id == prefix) {
        Some((id, _)) => spec.group(id),
        None => spec,
    }
}

static MAPPING: LazyLock<FieldMapping> = LazyLock::new(|| {
    let mut mapping = FieldMapping::new();
    for (medium, bucket) in iterate_sources() {
        let prefix = format!("visits.{}.{}", medium.as_str(), bucket);
        mapping.insert(format!("{prefix}.nb"), field_spec(ValueType::Integer, &prefix));
        for metric in CALCULATED_METRICS {
            mapping.insert(
                format!("{prefix}.{metric}"),
                field_spec(ValueType::Float, &prefix),
            );
        }
    }
    mapping
});

/// Folds `analytics_data` lines into `visits.<medium>.<bucket>` documents
#[derive(Debug, Clone, Copy, Default)]
pub struct VisitsStreamDef;

impl DocumentStream for VisitsStreamDef {
    const FILE: &'static str = ANALYTICS_DATA;
    type Line = VisitLine;
    type Document = VisitsDocument;

    fn mapping(&self) -> &'static FieldMapping {
        &MAPPING
    }

    fn pre_process(&self) -> VisitsDocument {
        let mut document = VisitsDocument::default();
        for (medium, bucket) in iterate_sources() {
            document
                .visits
                .medium_mut(medium)
                .insert(bucket.to_string(), VisitBucket::default());
        }
        document
    }

    fn process(&self, document: &mut VisitsDocument, line: VisitLine) {
        let Some((medium, source)) = line.classify() else {
            return;
        };
        let visits = &mut document.visits;
        visits.add(medium, ALL, &line.counters);
        if !consider_source(medium, source) {
            return;
        }
        visits.add(medium, CONSIDERED, &line.counters);
        visits.add(medium, source, &line.counters);
    }

    fn post_process(&self, document: &mut VisitsDocument) {
        for (medium, bucket) in iterate_sources() {
            if let Some(entry) = document.visits.medium_mut(medium).get_mut(bucket) {
                entry.finish();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crawlpipe_core::content::VISITS;

    fn line(raw: &str) -> VisitLine {
        VisitLine::from_record(VISITS.cast_line(raw).unwrap()).unwrap()
    }

    fn fold(raw: &[&str]) -> VisitsDocument {
        let def = VisitsStreamDef;
        let mut document = def.pre_process();
        for l in raw {
            def.process(&mut document, line(l));
        }
        document
    }

    const GOOGLE: &str = "1\torganic\tgoogle\tNone\t10\t10\t5\t30\t100.0\t2\t1";
    const YAHOO: &str = "1\torganic\tyahoo\tNone\t4\t4\t4\t4\t8.0\t4\t0";

    #[test]
    fn schema_complete_before_any_line() {
        let document = VisitsStreamDef.pre_process();
        assert_eq!(document.visits.organic.len(), 2 + ORGANIC_SOURCES.len());
        assert_eq!(document.visits.social.len(), 2 + SOCIAL_SOURCES.len());
        assert_eq!(document.visits.bucket(Medium::Social, "tumblr").unwrap().nb(), 0);
    }

    #[test]
    fn sums_all_considered_and_source() {
        let document = fold(&[GOOGLE, YAHOO]);
        let visits = &document.visits;

        let all = visits.bucket(Medium::Organic, ALL).unwrap().raw();
        assert_eq!(all.sessions, 14);
        assert_eq!(all.bounces, 9);
        let considered = visits.bucket(Medium::Organic, CONSIDERED).unwrap().raw();
        assert_eq!(considered.sessions, 14);
        let google = visits.bucket(Medium::Organic, "google").unwrap().raw();
        assert_eq!(google.sessions, 10);
        assert_eq!(google.bounces, 5);
        assert_eq!(visits.bucket(Medium::Social, ALL).unwrap().nb(), 0);
    }

    #[test]
    fn post_process_derives_metrics() {
        let def = VisitsStreamDef;
        let mut document = fold(&[GOOGLE, YAHOO]);
        def.post_process(&mut document);
        let visits = &document.visits;

        let google = visits.bucket(Medium::Organic, "google").unwrap();
        let metrics = google.metrics().unwrap();
        assert_eq!(metrics.bounce_rate, 50.0);
        assert_eq!(metrics.pages_per_session, 3.0);
        assert_eq!(metrics.average_session_duration, 10.0);
        assert_eq!(google.raw(), &RawCounters::default());
        assert_eq!(google.nb(), 10);

        let all = visits.bucket(Medium::Organic, ALL).unwrap();
        assert_eq!(all.metrics().unwrap().bounce_rate, 64.29);

        let bing = visits.bucket(Medium::Organic, "bing").unwrap();
        assert_eq!(bing.metrics().unwrap(), &CalculatedMetrics::default());
    }

    #[test]
    fn unlisted_source_counts_only_in_all() {
        let document = fold(&["1\torganic\tduckduckgo\tNone\t3\t3\t1\t3\t3.0\t1\t0"]);
        let organic = &document.visits.organic;
        assert_eq!(organic[ALL].nb(), 3);
        assert_eq!(organic[CONSIDERED].nb(), 0);
        assert!(!organic.contains_key("duckduckgo"));
    }

    #[test]
    fn social_network_wins_over_medium() {
        let document = fold(&["1\treferral\tt.co\ttwitter\t2\t2\t0\t4\t6.0\t1\t0"]);
        let social = &document.visits.social;
        assert_eq!(social[ALL].nb(), 2);
        assert_eq!(social["twitter"].nb(), 2);
        assert_eq!(document.visits.organic[ALL].nb(), 0);
    }

    #[test]
    fn other_mediums_are_dropped() {
        let document = fold(&["1\treferral\texample.com\tNone\t2\t2\t0\t4\t6.0\t1\t0"]);
        assert!(document.visits.organic.values().all(|b| b.nb() == 0));
        assert!(document.visits.social.values().all(|b| b.nb() == 0));
    }

    #[test]
    fn finished_bucket_serializes_nb_and_metrics() {
        let def = VisitsStreamDef;
        let mut document = fold(&[GOOGLE]);
        def.post_process(&mut document);
        let json = serde_json::to_value(&document.visits.organic["google"]).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "nb": 10,
                "bounce_rate": 50.0,
                "pages_per_session": 3.0,
                "average_session_duration": 10.0,
                "percentage_new_sessions": 20.0,
                "goal_conversion_rate_all": 10.0
            })
        );
    }

    #[test]
    fn mapping_covers_every_bucket() {
        let mapping = VisitsStreamDef.mapping();
        let buckets = iterate_sources().count();
        assert_eq!(mapping.len(), buckets * (1 + CALCULATED_METRICS.len()));
        let nb = mapping.get("visits.organic.google.nb").unwrap();
        assert_eq!(nb.value_type, ValueType::Integer);
        assert_eq!(nb.group.as_deref(), Some("visits.organic.google"));
        let rate = mapping.get("visits.social.considered.bounce_rate").unwrap();
        assert_eq!(rate.value_type, ValueType::Float);
        assert!(rate.group.is_none());
    }
}
