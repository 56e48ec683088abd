use std::fmt::Debug;

use super::domain::{AnnouncementFilter, AnnouncementSummary, EnrichedAnnouncement};

#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("search request failed: {0}")]
    Transport(String),
    #[error("search API answered with status {status}")]
    Status { status: u16 },
    #[error("search response could not be decoded: {0}")]
    Decode(String),
}

#[derive(Debug, thiserror::Error)]
pub enum EnrichError {
    #[error("announcement {0} has no detail page url")]
    MissingUrl(String),
    #[error("detail page request failed: {0}")]
    Transport(String),
    #[error("detail page answered with status {status}")]
    Status { status: u16 },
    #[error("detail page could not be parsed: {0}")]
    Parse(String),
}

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("announcement {0} has no pdf url")]
    MissingDocument(String),
    #[error("pdf download failed: {0}")]
    Download(String),
    #[error("pdf download answered with status {status}")]
    Status { status: u16 },
    #[error("pdf rasterizer failed: {0}")]
    Rasterize(String),
    #[error("pdf rasterizer produced no image")]
    EmptyOutput,
}

/// Search endpoint returning the newest announcements first.
pub trait AnnouncementSource: Debug {
    fn query(&self, filter: &AnnouncementFilter)
        -> Result<Vec<AnnouncementSummary>, SourceError>;
}

/// Fetches a detail page and merges what it finds into the summary.
pub trait DetailEnricher: Debug {
    fn enrich(&self, summary: &AnnouncementSummary) -> Result<EnrichedAnnouncement, EnrichError>;
}

/// Rasterizes the first page of an announcement's PDF into a base64 PNG.
pub trait DocumentRenderer: Debug {
    fn render_first_page(&self, announcement: &EnrichedAnnouncement)
        -> Result<String, RenderError>;
}
