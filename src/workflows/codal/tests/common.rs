use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, Mutex};

use crate::workflows::codal::domain::{
    AnnouncementFilter, AnnouncementSummary, EnrichedAnnouncement, LetterCode, PublishStamp,
    TracingNo,
};
use crate::workflows::codal::engine::{
    ReconciliationConfig, ReconciliationEngine, OPEN_CATEGORY, WATCHED_CATEGORY,
};
use crate::workflows::codal::gateway::{
    AnnouncementSource, DetailEnricher, DocumentRenderer, EnrichError, RenderError, SourceError,
};
use crate::workflows::codal::taxonomy::LetterCodeTaxonomy;

pub(super) const SYMBOL: &str = "فولاد";
pub(super) const WATCHED_CODE: &str = "C";

#[derive(Debug, Default)]
pub(super) struct MemorySource {
    results: Mutex<HashMap<AnnouncementFilter, Vec<AnnouncementSummary>>>,
    failing: Mutex<HashSet<AnnouncementFilter>>,
    queries: Mutex<Vec<AnnouncementFilter>>,
}

impl MemorySource {
    pub(super) fn set(&self, filter: AnnouncementFilter, results: Vec<AnnouncementSummary>) {
        self.results
            .lock()
            .expect("source mutex poisoned")
            .insert(filter, results);
    }

    pub(super) fn fail(&self, filter: AnnouncementFilter) {
        self.failing
            .lock()
            .expect("source mutex poisoned")
            .insert(filter);
    }

    pub(super) fn queries(&self) -> Vec<AnnouncementFilter> {
        self.queries.lock().expect("source mutex poisoned").clone()
    }

    pub(super) fn symbol_queries(&self) -> Vec<LetterCode> {
        self.queries()
            .into_iter()
            .filter(|filter| filter.symbol.is_some())
            .filter_map(|filter| filter.letter_code)
            .collect()
    }
}

impl AnnouncementSource for MemorySource {
    fn query(&self, filter: &AnnouncementFilter) -> Result<Vec<AnnouncementSummary>, SourceError> {
        self.queries
            .lock()
            .expect("source mutex poisoned")
            .push(filter.clone());

        if self
            .failing
            .lock()
            .expect("source mutex poisoned")
            .contains(filter)
        {
            return Err(SourceError::Transport("connection reset".to_string()));
        }

        Ok(self
            .results
            .lock()
            .expect("source mutex poisoned")
            .get(filter)
            .cloned()
            .unwrap_or_default())
    }
}

/// Enriches from a table of DPM codes keyed by tracing number.
#[derive(Debug, Default)]
pub(super) struct MemoryEnricher {
    dpm_codes: Mutex<HashMap<TracingNo, String>>,
    failing: Mutex<HashSet<TracingNo>>,
    calls: Mutex<Vec<TracingNo>>,
}

impl MemoryEnricher {
    pub(super) fn dpm(&self, tracing_no: &str, code: &str) {
        self.dpm_codes
            .lock()
            .expect("enricher mutex poisoned")
            .insert(TracingNo::from(tracing_no), code.to_string());
    }

    pub(super) fn fail(&self, tracing_no: &str) {
        self.failing
            .lock()
            .expect("enricher mutex poisoned")
            .insert(TracingNo::from(tracing_no));
    }

    pub(super) fn recover(&self, tracing_no: &str) {
        self.failing
            .lock()
            .expect("enricher mutex poisoned")
            .remove(&TracingNo::from(tracing_no));
    }

    pub(super) fn calls(&self) -> Vec<TracingNo> {
        self.calls.lock().expect("enricher mutex poisoned").clone()
    }
}

impl DetailEnricher for MemoryEnricher {
    fn enrich(&self, summary: &AnnouncementSummary) -> Result<EnrichedAnnouncement, EnrichError> {
        self.calls
            .lock()
            .expect("enricher mutex poisoned")
            .push(summary.tracing_no.clone());

        if self
            .failing
            .lock()
            .expect("enricher mutex poisoned")
            .contains(&summary.tracing_no)
        {
            return Err(EnrichError::Status { status: 503 });
        }

        let mut details = BTreeMap::new();
        details.insert("lblTitle".to_string(), summary.title.clone());

        Ok(EnrichedAnnouncement {
            summary: summary.clone(),
            details,
            dpm_code: self
                .dpm_codes
                .lock()
                .expect("enricher mutex poisoned")
                .get(&summary.tracing_no)
                .cloned(),
        })
    }
}

#[derive(Debug)]
pub(super) struct MemoryRenderer {
    image: Mutex<Option<String>>,
    calls: Mutex<usize>,
}

impl Default for MemoryRenderer {
    fn default() -> Self {
        Self {
            image: Mutex::new(Some("iVBORw0KGgo=".to_string())),
            calls: Mutex::new(0),
        }
    }
}

impl MemoryRenderer {
    pub(super) fn break_rendering(&self) {
        *self.image.lock().expect("renderer mutex poisoned") = None;
    }

    pub(super) fn calls(&self) -> usize {
        *self.calls.lock().expect("renderer mutex poisoned")
    }
}

impl DocumentRenderer for MemoryRenderer {
    fn render_first_page(&self, _announcement: &EnrichedAnnouncement) -> Result<String, RenderError> {
        *self.calls.lock().expect("renderer mutex poisoned") += 1;
        self.image
            .lock()
            .expect("renderer mutex poisoned")
            .clone()
            .ok_or(RenderError::EmptyOutput)
    }
}

pub(super) struct Harness {
    pub(super) engine: ReconciliationEngine<MemorySource, MemoryEnricher, MemoryRenderer>,
    pub(super) source: Arc<MemorySource>,
    pub(super) enricher: Arc<MemoryEnricher>,
    pub(super) renderer: Arc<MemoryRenderer>,
}

pub(super) fn codes(values: &[&str]) -> Vec<LetterCode> {
    values.iter().copied().map(LetterCode::from).collect()
}

/// Walk order A, B, C, D with A exempt; the watched code is C.
pub(super) fn taxonomy() -> LetterCodeTaxonomy {
    LetterCodeTaxonomy::new(codes(&["A", "B", "C", "D"]), codes(&["A"])).expect("valid taxonomy")
}

pub(super) fn harness_with(taxonomy: LetterCodeTaxonomy) -> Harness {
    let source = Arc::new(MemorySource::default());
    let enricher = Arc::new(MemoryEnricher::default());
    let renderer = Arc::new(MemoryRenderer::default());
    let config = ReconciliationConfig::new(taxonomy, LetterCode::from(WATCHED_CODE));
    let engine =
        ReconciliationEngine::new(source.clone(), enricher.clone(), renderer.clone(), config);

    Harness {
        engine,
        source,
        enricher,
        renderer,
    }
}

pub(super) fn harness() -> Harness {
    harness_with(taxonomy())
}

pub(super) fn stamp(raw: &str) -> PublishStamp {
    PublishStamp::parse(raw).expect("valid test stamp")
}

pub(super) fn summary(tracing_no: &str, code: &str, published: &str) -> AnnouncementSummary {
    AnnouncementSummary {
        tracing_no: TracingNo::from(tracing_no),
        title: format!("report {tracing_no}"),
        publish_at: stamp(published),
        symbol: SYMBOL.to_string(),
        letter_code: LetterCode::from(code),
        company_name: None,
        sent_at: None,
        url: Some(format!("https://codal.ir/Reports/Decision.aspx?LetterSerial={tracing_no}")),
        pdf_url: Some(format!("https://codal.ir/DownloadFile.aspx?let={tracing_no}")),
    }
}

pub(super) fn watched_filter() -> AnnouncementFilter {
    AnnouncementFilter::category(WATCHED_CATEGORY).with_letter_code(LetterCode::from(WATCHED_CODE))
}

pub(super) fn open_filter() -> AnnouncementFilter {
    AnnouncementFilter::category(OPEN_CATEGORY)
}

pub(super) fn history_filter(code: &str) -> AnnouncementFilter {
    AnnouncementFilter::for_symbol(SYMBOL, &LetterCode::from(code))
}

/// Publishes `latest` on the open category and runs detection once.
pub(super) fn seed_reference(harness: &mut Harness, latest: AnnouncementSummary) {
    harness.source.set(open_filter(), vec![latest]);
    assert!(harness.engine.update_if_new(), "reference announcement accepted");
}
