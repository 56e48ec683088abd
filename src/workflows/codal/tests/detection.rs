use super::common::*;
use crate::workflows::codal::domain::TracingNo;

#[test]
fn detect_latest_is_empty_when_both_filters_are_empty() {
    let h = harness();
    assert!(h.engine.detect_latest().is_none());
    assert_eq!(h.source.queries(), vec![watched_filter(), open_filter()]);
}

#[test]
fn detect_latest_prefers_later_publish_time() {
    let h = harness();
    h.source
        .set(watched_filter(), vec![summary("W1", "C", "1403/06/30 09:00:00")]);
    h.source.set(
        open_filter(),
        vec![
            summary("O1", "D", "1403/06/31 08:00:00"),
            summary("O0", "D", "1403/06/01 08:00:00"),
        ],
    );

    let latest = h.engine.detect_latest().expect("announcement found");
    assert_eq!(latest.tracing_no, TracingNo::from("O1"));
}

#[test]
fn detect_latest_breaks_ties_in_favor_of_watched_category() {
    let h = harness();
    h.source
        .set(watched_filter(), vec![summary("W1", "C", "1403/06/30 09:00:00")]);
    h.source
        .set(open_filter(), vec![summary("O1", "D", "1403/06/30 09:00:00")]);

    let latest = h.engine.detect_latest().expect("announcement found");
    assert_eq!(latest.tracing_no, TracingNo::from("W1"));
}

#[test]
fn detect_latest_treats_failed_query_as_empty() {
    let h = harness();
    h.source.fail(open_filter());
    h.source
        .set(watched_filter(), vec![summary("W1", "C", "1403/06/30 09:00:00")]);

    let latest = h.engine.detect_latest().expect("watched result survives");
    assert_eq!(latest.tracing_no, TracingNo::from("W1"));
}

#[test]
fn update_if_new_is_idempotent_without_new_data() {
    let mut h = harness();
    h.source
        .set(open_filter(), vec![summary("T1", "D", "1403/06/30 09:00:00")]);

    assert!(h.engine.update_if_new());
    assert!(!h.engine.update_if_new());
    assert_eq!(h.enricher.calls(), vec![TracingNo::from("T1")]);
    assert_eq!(
        h.engine.reference().map(|r| r.tracing_no().clone()),
        Some(TracingNo::from("T1"))
    );
}

#[test]
fn update_if_new_fires_once_per_distinct_tracing_number() {
    let mut h = harness();
    h.source
        .set(open_filter(), vec![summary("T1", "D", "1403/06/30 09:00:00")]);
    assert!(h.engine.update_if_new());

    h.source
        .set(open_filter(), vec![summary("T2", "D", "1403/06/30 09:00:00")]);
    assert!(h.engine.update_if_new());
    assert!(!h.engine.update_if_new());

    h.source
        .set(open_filter(), vec![summary("T1", "D", "1403/06/30 09:00:00")]);
    assert!(h.engine.update_if_new(), "T1 is new again after T2 replaced it");
}

#[test]
fn update_if_new_without_results_keeps_reference() {
    let mut h = harness();
    seed_reference(&mut h, summary("T1", "D", "1403/06/30 09:00:00"));

    h.source.set(open_filter(), Vec::new());
    assert!(!h.engine.update_if_new());
    assert_eq!(
        h.engine.reference().map(|r| r.tracing_no().clone()),
        Some(TracingNo::from("T1"))
    );
}

#[test]
fn failed_enrichment_never_clobbers_reference() {
    let mut h = harness();
    h.enricher.dpm("T1", "DPM-IOP-AAA-1");
    seed_reference(&mut h, summary("T1", "D", "1403/06/30 09:00:00"));

    h.enricher.fail("T2");
    h.source
        .set(open_filter(), vec![summary("T2", "D", "1403/07/01 09:00:00")]);
    assert!(!h.engine.update_if_new());

    let reference = h.engine.reference().expect("reference kept");
    assert_eq!(reference.tracing_no(), &TracingNo::from("T1"));
    assert_eq!(reference.dpm_code.as_deref(), Some("DPM-IOP-AAA-1"));

    h.enricher.recover("T2");
    assert!(h.engine.update_if_new(), "retried on the next cycle");
    assert_eq!(
        h.engine.reference().map(|r| r.tracing_no().clone()),
        Some(TracingNo::from("T2"))
    );
}
