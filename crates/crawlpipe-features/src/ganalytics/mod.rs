//! Google Analytics visits import

pub mod metrics;
pub mod settings;
pub mod streams;

pub use settings::{ORGANIC_SOURCES, SOCIAL_SOURCES};
pub use streams::{
    CalculatedMetrics, Medium, RawCounters, VisitBucket, VisitLine, Visits, VisitsDocument,
    VisitsStreamDef,
};
