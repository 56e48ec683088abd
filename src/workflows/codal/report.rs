use chrono::{DateTime, Utc};
use serde::Serialize;

use super::domain::{AggregateResult, EnrichedAnnouncement, PublishStamp};

/// Human-facing projection of a cycle result: the rendered image is reduced
/// to a Yes/No flag so the output stays readable.
#[derive(Debug, Clone, Serialize)]
pub struct AggregateSummaryView<'a> {
    pub symbol: &'a str,
    pub publish_at: PublishStamp,
    pub latest_announcement: &'a EnrichedAnnouncement,
    pub historical_reports: &'a [EnrichedAnnouncement],
    pub has_pdf_image: &'static str,
    pub processed_at: DateTime<Utc>,
}

impl AggregateResult {
    pub fn summary_view(&self) -> AggregateSummaryView<'_> {
        AggregateSummaryView {
            symbol: &self.symbol,
            publish_at: self.publish_at,
            latest_announcement: &self.latest_announcement,
            historical_reports: &self.historical_reports,
            has_pdf_image: if self.pdf_image_base64.is_some() {
                "Yes"
            } else {
                "No"
            },
            processed_at: self.processed_at,
        }
    }

    /// Pretty JSON without the image payload.
    pub fn to_summary_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&self.summary_view())
    }

    /// Pretty JSON including the base64 image.
    pub fn to_full_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
