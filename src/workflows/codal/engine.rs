use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use super::domain::{
    AggregateResult, AnnouncementFilter, AnnouncementSummary, EnrichedAnnouncement, LetterCode,
};
use super::gateway::{AnnouncementSource, DetailEnricher, DocumentRenderer};
use super::taxonomy::LetterCodeTaxonomy;

/// Category searched together with the watched letter code.
pub const WATCHED_CATEGORY: u8 = 6;
/// Category searched without a letter-code filter.
pub const OPEN_CATEGORY: u8 = 7;

/// Rules and filters the engine runs with.
#[derive(Debug, Clone)]
pub struct ReconciliationConfig {
    pub taxonomy: LetterCodeTaxonomy,
    pub watched_filter: AnnouncementFilter,
    pub open_filter: AnnouncementFilter,
}

impl ReconciliationConfig {
    pub fn new(taxonomy: LetterCodeTaxonomy, watched_code: LetterCode) -> Self {
        Self {
            taxonomy,
            watched_filter: AnnouncementFilter::category(WATCHED_CATEGORY)
                .with_letter_code(watched_code),
            open_filter: AnnouncementFilter::category(OPEN_CATEGORY),
        }
    }
}

impl Default for ReconciliationConfig {
    fn default() -> Self {
        Self::new(LetterCodeTaxonomy::standard(), LetterCode::from("ن-۵۶"))
    }
}

/// Holds the last known announcement and reconciles new ones against it.
///
/// Every collaborator failure is logged and collapsed to "nothing found";
/// the public operations never return an error.
#[derive(Debug)]
pub struct ReconciliationEngine<S: ?Sized, E: ?Sized, R: ?Sized> {
    source: Arc<S>,
    enricher: Arc<E>,
    renderer: Arc<R>,
    config: ReconciliationConfig,
    reference: Option<EnrichedAnnouncement>,
}

impl<S, E, R> ReconciliationEngine<S, E, R>
where
    S: AnnouncementSource + ?Sized,
    E: DetailEnricher + ?Sized,
    R: DocumentRenderer + ?Sized,
{
    pub fn new(
        source: Arc<S>,
        enricher: Arc<E>,
        renderer: Arc<R>,
        config: ReconciliationConfig,
    ) -> Self {
        Self {
            source,
            enricher,
            renderer,
            config,
            reference: None,
        }
    }

    pub fn config(&self) -> &ReconciliationConfig {
        &self.config
    }

    /// The announcement currently used as the DPM reference.
    pub fn reference(&self) -> Option<&EnrichedAnnouncement> {
        self.reference.as_ref()
    }

    /// Newest announcement across the watched and open categories.
    pub fn detect_latest(&self) -> Option<AnnouncementSummary> {
        let watched = self.most_recent(&self.config.watched_filter);
        let open = self.most_recent(&self.config.open_filter);

        match (watched, open) {
            (Some(watched), Some(open)) => {
                if open.publish_at > watched.publish_at {
                    Some(open)
                } else {
                    Some(watched)
                }
            }
            (watched, open) => watched.or(open),
        }
    }

    /// Replaces the reference when a different announcement shows up and
    /// its detail page can be enriched.
    pub fn update_if_new(&mut self) -> bool {
        let Some(latest) = self.detect_latest() else {
            info!("no announcements returned by the search API");
            return false;
        };

        if let Some(reference) = &self.reference {
            if reference.tracing_no() == &latest.tracing_no {
                info!(tracing_no = %latest.tracing_no, "no new announcements found");
                return false;
            }
        }

        info!(
            tracing_no = %latest.tracing_no,
            symbol = %latest.symbol,
            title = %latest.title,
            "new announcement detected"
        );

        match self.enricher.enrich(&latest) {
            Ok(enriched) => {
                self.reference = Some(enriched);
                true
            }
            Err(err) => {
                error!(
                    tracing_no = %latest.tracing_no,
                    error = %err,
                    "failed to fetch announcement details; aborting this cycle"
                );
                false
            }
        }
    }

    /// True when the candidate shares the reference's DPM code.
    ///
    /// Exempt letter codes are never validated by this rule.
    pub fn validate(&self, candidate: Option<&EnrichedAnnouncement>) -> bool {
        let Some(candidate) = candidate else {
            warn!("empty announcement cannot be validated by DPM");
            return false;
        };

        if self.config.taxonomy.is_exempt(candidate.letter_code()) {
            return false;
        }

        let Some(reference) = &self.reference else {
            warn!("no reference announcement to compare DPM code against");
            return false;
        };

        let Some(reference_dpm) = reference.dpm_code.as_deref() else {
            warn!(
                tracing_no = %reference.tracing_no(),
                "reference DPM code not found; cannot validate"
            );
            return false;
        };

        candidate.dpm_code.as_deref() == Some(reference_dpm)
    }

    /// Walks the taxonomy up to and including `stop_at`, keeping the most
    /// recent report per code that is exempt or matches the reference DPM.
    pub fn collect_history(&self, symbol: &str, stop_at: &LetterCode) -> Vec<EnrichedAnnouncement> {
        if self.reference.is_none() {
            warn!(symbol, "historical walk requested without a reference announcement");
            return Vec::new();
        }

        let taxonomy = &self.config.taxonomy;
        let mut reports = Vec::new();

        for code in taxonomy.codes() {
            let filter = AnnouncementFilter::for_symbol(symbol, code);
            if let Some(report) = self.most_recent(&filter) {
                match self.enricher.enrich(&report) {
                    Ok(detailed) => {
                        if taxonomy.is_exempt(code) || self.validate(Some(&detailed)) {
                            info!(
                                letter_code = %code,
                                tracing_no = %detailed.tracing_no(),
                                title = %detailed.title(),
                                "found valid historical report"
                            );
                            reports.push(detailed);
                        } else {
                            debug!(
                                letter_code = %code,
                                tracing_no = %detailed.tracing_no(),
                                "historical report does not match reference DPM"
                            );
                        }
                    }
                    Err(err) => {
                        warn!(
                            letter_code = %code,
                            tracing_no = %report.tracing_no,
                            error = %err,
                            "could not fetch details for historical report; skipping"
                        );
                    }
                }
            }

            if code == stop_at {
                break;
            }
        }

        reports
    }

    /// One detect, collect-history and render pass. `None` means nothing new.
    pub fn process_cycle(&mut self) -> Option<AggregateResult> {
        if !self.update_if_new() {
            return None;
        }

        let latest = self.reference.as_ref()?;
        let symbol = latest.symbol().to_string();

        info!(symbol = %symbol, letter_code = %latest.letter_code(), "processing reports");
        let historical_reports = self.collect_history(&symbol, latest.letter_code());

        info!(tracing_no = %latest.tracing_no(), "converting latest announcement pdf to image");
        let pdf_image_base64 = match self.renderer.render_first_page(latest) {
            Ok(image) => Some(image),
            Err(err) => {
                error!(
                    tracing_no = %latest.tracing_no(),
                    error = %err,
                    "failed to render announcement pdf"
                );
                None
            }
        };

        info!(
            symbol = %symbol,
            historical_reports = historical_reports.len(),
            has_image = pdf_image_base64.is_some(),
            "processing complete"
        );

        Some(AggregateResult {
            symbol,
            publish_at: latest.summary.publish_at,
            latest_announcement: latest.clone(),
            historical_reports,
            pdf_image_base64,
            processed_at: Utc::now(),
        })
    }

    fn most_recent(&self, filter: &AnnouncementFilter) -> Option<AnnouncementSummary> {
        match self.source.query(filter) {
            Ok(announcements) => announcements.into_iter().next(),
            Err(err) => {
                warn!(?filter, error = %err, "announcement query failed");
                None
            }
        }
    }
}
