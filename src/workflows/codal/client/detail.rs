use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::collections::BTreeMap;
use std::sync::{Arc, OnceLock};
use tracing::debug;

use super::transport::HttpTransport;
use crate::workflows::codal::domain::{AnnouncementSummary, EnrichedAnnouncement};
use crate::workflows::codal::gateway::{DetailEnricher, EnrichError};
use crate::workflows::codal::normalizer::clean_text;

/// Labels that carry the capital-increase license text, in lookup order.
const DPM_SOURCE_IDS: [&str; 2] = ["ucCapitalIncreaseLicense_lblLicenseCode", "lblLicenseDesc"];

const SKIPPED_TAGS: [&str; 4] = ["html", "head", "script", "style"];

fn dpm_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"DPM-IOP-[A-Z0-9]+-[A-Z0-9]").expect("valid DPM pattern"))
}

/// `DetailEnricher` that scrapes the announcement's detail page.
#[derive(Debug, Clone)]
pub struct DetailPageEnricher {
    transport: Arc<HttpTransport>,
}

impl DetailPageEnricher {
    pub fn new(transport: Arc<HttpTransport>) -> Self {
        Self { transport }
    }
}

impl DetailEnricher for DetailPageEnricher {
    fn enrich(&self, summary: &AnnouncementSummary) -> Result<EnrichedAnnouncement, EnrichError> {
        let url = summary
            .url
            .as_deref()
            .ok_or_else(|| EnrichError::MissingUrl(summary.tracing_no.to_string()))?;
        debug!(tracing_no = %summary.tracing_no, %url, "fetching detail page");

        let html = self.transport.block_on(async {
            let response = self
                .transport
                .client()
                .get(url)
                .send()
                .await
                .map_err(|err| EnrichError::Transport(err.to_string()))?;

            let status = response.status();
            if !status.is_success() {
                return Err(EnrichError::Status {
                    status: status.as_u16(),
                });
            }

            response
                .text()
                .await
                .map_err(|err| EnrichError::Transport(err.to_string()))
        })?;

        if html.trim().is_empty() {
            return Err(EnrichError::Parse("detail page body is empty".to_string()));
        }

        let page = parse_detail_page(&html);
        Ok(EnrichedAnnouncement {
            summary: summary.clone(),
            details: page.details,
            dpm_code: page.dpm_code,
        })
    }
}

#[derive(Debug, Default, PartialEq, Eq)]
pub(crate) struct DetailPage {
    pub(crate) details: BTreeMap<String, String>,
    pub(crate) dpm_code: Option<String>,
}

pub(crate) fn parse_detail_page(html: &str) -> DetailPage {
    let document = Html::parse_document(html);
    DetailPage {
        details: extract_details(&document),
        dpm_code: extract_dpm_code(&document),
    }
}

/// Text of every innermost element carrying an id. Containers whose
/// descendants carry their own ids are left out so the map stays flat.
fn extract_details(document: &Html) -> BTreeMap<String, String> {
    let mut details = BTreeMap::new();
    let Ok(selector) = Selector::parse("[id]") else {
        return details;
    };

    for element in document.select(&selector) {
        if SKIPPED_TAGS.contains(&element.value().name()) || has_identified_descendant(element) {
            continue;
        }
        let Some(id) = element.value().id() else {
            continue;
        };
        let text = clean_text(&element.text().collect::<String>());
        if !text.is_empty() {
            details.entry(id.to_string()).or_insert(text);
        }
    }

    details
}

fn has_identified_descendant(element: ElementRef<'_>) -> bool {
    element
        .descendants()
        .skip(1)
        .filter_map(|node| node.value().as_element())
        .any(|child| child.id().is_some())
}

/// The first license label present on the page decides the code, even when
/// that label is empty.
fn extract_dpm_code(document: &Html) -> Option<String> {
    let text = DPM_SOURCE_IDS.iter().find_map(|id| {
        let selector = Selector::parse(&format!("#{id}")).ok()?;
        document
            .select(&selector)
            .next()
            .map(|element| clean_text(&element.text().collect::<String>()))
    })?;

    dpm_pattern()
        .find(&text)
        .map(|found| found.as_str().to_string())
}
