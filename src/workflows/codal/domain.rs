use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use super::normalizer::to_ascii_digits;

/// Unique per-announcement identifier used for change detection.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TracingNo(pub String);

impl fmt::Display for TracingNo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TracingNo {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Report-type tag within the letter-code taxonomy (for example `ن-۵۶`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LetterCode(pub String);

impl LetterCode {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LetterCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for LetterCode {
    fn from(value: &str) -> Self {
        Self(value.trim().to_string())
    }
}

/// Solar Hijri publish timestamp as reported by the search API.
///
/// Ordering is lexicographic over the six components, which matches
/// chronological order for well-formed values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PublishStamp {
    pub year: u16,
    pub month: u8,
    pub day: u8,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StampError {
    #[error("timestamp '{0}' is not in 'YYYY/MM/DD hh:mm:ss' form")]
    Shape(String),
    #[error("timestamp '{0}' has a non-numeric component")]
    Component(String),
    #[error("timestamp '{0}' has an out-of-range component")]
    Range(String),
}

impl PublishStamp {
    pub fn parse(raw: &str) -> Result<Self, StampError> {
        let ascii = to_ascii_digits(raw.trim());
        let mut parts = ascii.split_whitespace();
        let (Some(date), Some(time), None) = (parts.next(), parts.next(), parts.next()) else {
            return Err(StampError::Shape(raw.to_string()));
        };

        let date = split_numbers(date, '/', raw)?;
        let time = split_numbers(time, ':', raw)?;
        let [year, month, day] = date[..] else {
            return Err(StampError::Shape(raw.to_string()));
        };
        let (hour, minute, second) = match time[..] {
            [hour, minute, second] => (hour, minute, second),
            [hour, minute] => (hour, minute, 0),
            _ => return Err(StampError::Shape(raw.to_string())),
        };

        if !(1..=12).contains(&month)
            || !(1..=31).contains(&day)
            || hour > 23
            || minute > 59
            || second > 59
            || year > u32::from(u16::MAX)
        {
            return Err(StampError::Range(raw.to_string()));
        }

        Ok(Self {
            year: year as u16,
            month: month as u8,
            day: day as u8,
            hour: hour as u8,
            minute: minute as u8,
            second: second as u8,
        })
    }
}

fn split_numbers(value: &str, separator: char, raw: &str) -> Result<Vec<u32>, StampError> {
    value
        .split(separator)
        .map(|part| {
            part.trim()
                .parse::<u32>()
                .map_err(|_| StampError::Component(raw.to_string()))
        })
        .collect()
}

impl FromStr for PublishStamp {
    type Err = StampError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for PublishStamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:04}/{:02}/{:02} {:02}:{:02}:{:02}",
            self.year, self.month, self.day, self.hour, self.minute, self.second
        )
    }
}

impl Serialize for PublishStamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for PublishStamp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}

/// One row of search results. Immutable once returned by the source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnouncementSummary {
    pub tracing_no: TracingNo,
    pub title: String,
    pub publish_at: PublishStamp,
    pub symbol: String,
    pub letter_code: LetterCode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sent_at: Option<PublishStamp>,
    /// Absolute detail-page URL.
    #[serde(default)]
    pub url: Option<String>,
    /// Absolute PDF download URL.
    #[serde(default)]
    pub pdf_url: Option<String>,
}

/// Summary merged with everything scraped from its detail page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrichedAnnouncement {
    #[serde(flatten)]
    pub summary: AnnouncementSummary,
    /// Element id to trimmed text. Opaque to the reconciliation rules.
    #[serde(default)]
    pub details: BTreeMap<String, String>,
    #[serde(default)]
    pub dpm_code: Option<String>,
}

impl EnrichedAnnouncement {
    pub fn tracing_no(&self) -> &TracingNo {
        &self.summary.tracing_no
    }

    pub fn letter_code(&self) -> &LetterCode {
        &self.summary.letter_code
    }

    pub fn symbol(&self) -> &str {
        &self.summary.symbol
    }

    pub fn title(&self) -> &str {
        &self.summary.title
    }
}

/// Search filter keys understood by the announcement source.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct AnnouncementFilter {
    pub category: Option<u8>,
    pub letter_code: Option<LetterCode>,
    pub symbol: Option<String>,
}

impl AnnouncementFilter {
    pub fn category(category: u8) -> Self {
        Self {
            category: Some(category),
            ..Self::default()
        }
    }

    pub fn with_letter_code(mut self, code: LetterCode) -> Self {
        self.letter_code = Some(code);
        self
    }

    pub fn for_symbol(symbol: &str, code: &LetterCode) -> Self {
        Self {
            category: None,
            letter_code: Some(code.clone()),
            symbol: Some(symbol.to_string()),
        }
    }
}

/// Output of one cycle that detected a new announcement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregateResult {
    pub symbol: String,
    pub publish_at: PublishStamp,
    pub latest_announcement: EnrichedAnnouncement,
    pub historical_reports: Vec<EnrichedAnnouncement>,
    pub pdf_image_base64: Option<String>,
    pub processed_at: DateTime<Utc>,
}
