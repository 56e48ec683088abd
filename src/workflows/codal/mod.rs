//! Detection and reconciliation of Codal disclosures.
//!
//! The engine polls two search filters for the newest announcement, keeps the
//! last one it has seen as the DPM reference, and rebuilds the filing history
//! for its symbol by walking the letter-code taxonomy.

pub mod client;
pub mod domain;
mod engine;
pub mod gateway;
mod normalizer;
mod report;
mod taxonomy;

#[cfg(test)]
mod tests;

pub use domain::{
    AggregateResult, AnnouncementFilter, AnnouncementSummary, EnrichedAnnouncement, LetterCode,
    PublishStamp, StampError, TracingNo,
};
pub use engine::{ReconciliationConfig, ReconciliationEngine, OPEN_CATEGORY, WATCHED_CATEGORY};
pub use gateway::{
    AnnouncementSource, DetailEnricher, DocumentRenderer, EnrichError, RenderError, SourceError,
};
pub use report::AggregateSummaryView;
pub use taxonomy::{LetterCodeTaxonomy, TaxonomyError};
