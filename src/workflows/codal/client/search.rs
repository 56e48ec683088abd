use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};

use super::transport::HttpTransport;
use crate::workflows::codal::domain::{
    AnnouncementFilter, AnnouncementSummary, LetterCode, PublishStamp, TracingNo,
};
use crate::workflows::codal::gateway::{AnnouncementSource, SourceError};

/// `AnnouncementSource` backed by the Codal search API (first page only).
#[derive(Debug, Clone)]
pub struct CodalSearchClient {
    transport: Arc<HttpTransport>,
}

impl CodalSearchClient {
    pub fn new(transport: Arc<HttpTransport>) -> Self {
        Self { transport }
    }
}

impl AnnouncementSource for CodalSearchClient {
    fn query(&self, filter: &AnnouncementFilter) -> Result<Vec<AnnouncementSummary>, SourceError> {
        let params = query_params(filter);
        let url = self.transport.settings().api_url.clone();
        debug!(%url, ?params, "querying announcements");

        let body = self.transport.block_on(async {
            let response = self
                .transport
                .client()
                .get(url)
                .query(&params)
                .send()
                .await
                .map_err(|err| SourceError::Transport(err.to_string()))?;

            let status = response.status();
            if !status.is_success() {
                return Err(SourceError::Status {
                    status: status.as_u16(),
                });
            }

            response
                .text()
                .await
                .map_err(|err| SourceError::Transport(err.to_string()))
        })?;

        let rows = parse_letters(&body)?;
        Ok(rows
            .into_iter()
            .filter_map(|row| row.into_summary(&self.transport))
            .collect())
    }
}

fn query_params(filter: &AnnouncementFilter) -> Vec<(&'static str, String)> {
    let mut params = vec![
        ("PageNumber", "1".to_string()),
        ("search", "true".to_string()),
    ];
    if let Some(category) = filter.category {
        params.push(("Category", category.to_string()));
    }
    if let Some(code) = &filter.letter_code {
        params.push(("LetterCode", code.to_string()));
    }
    if let Some(symbol) = &filter.symbol {
        params.push(("Symbol", symbol.clone()));
    }
    params
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(rename = "Letters", default)]
    letters: Option<Vec<LetterRow>>,
}

#[derive(Debug, Deserialize)]
struct LetterRow {
    #[serde(rename = "TracingNo", default)]
    tracing_no: Value,
    #[serde(rename = "Title", default)]
    title: Option<String>,
    #[serde(rename = "PublishDateTime", default)]
    publish_date_time: Option<String>,
    #[serde(rename = "SentDateTime", default)]
    sent_date_time: Option<String>,
    #[serde(rename = "Symbol", default)]
    symbol: Option<String>,
    #[serde(rename = "CompanyName", default)]
    company_name: Option<String>,
    #[serde(rename = "LetterCode", default)]
    letter_code: Option<String>,
    #[serde(rename = "Url", default)]
    url: Option<String>,
    #[serde(rename = "PdfUrl", default)]
    pdf_url: Option<String>,
}

fn parse_letters(body: &str) -> Result<Vec<LetterRow>, SourceError> {
    let response: SearchResponse =
        serde_json::from_str(body).map_err(|err| SourceError::Decode(err.to_string()))?;
    Ok(response.letters.unwrap_or_default())
}

impl LetterRow {
    fn into_summary(self, transport: &HttpTransport) -> Option<AnnouncementSummary> {
        let tracing_no = match &self.tracing_no {
            Value::String(value) if !value.trim().is_empty() => value.trim().to_string(),
            Value::Number(number) => number.to_string(),
            _ => {
                warn!(title = ?self.title, "skipping announcement without a tracing number");
                return None;
            }
        };

        let raw_publish = self.publish_date_time.as_deref().unwrap_or_default();
        let publish_at = match PublishStamp::parse(raw_publish) {
            Ok(stamp) => stamp,
            Err(err) => {
                warn!(%tracing_no, error = %err, "skipping announcement with unreadable publish time");
                return None;
            }
        };

        Some(AnnouncementSummary {
            tracing_no: TracingNo(tracing_no),
            title: self.title.unwrap_or_default(),
            publish_at,
            symbol: self.symbol.map(|s| s.trim().to_string()).unwrap_or_default(),
            letter_code: LetterCode::from(self.letter_code.as_deref().unwrap_or_default()),
            company_name: self.company_name,
            sent_at: self
                .sent_date_time
                .as_deref()
                .and_then(|raw| PublishStamp::parse(raw).ok()),
            url: self.url.as_deref().and_then(|link| transport.resolve(link)),
            pdf_url: self.pdf_url.as_deref().and_then(|link| transport.resolve(link)),
        })
    }
}
