//! Sequence matcher: decides whether a bounded slice of an event table
//! satisfies a pattern's expected ordered sequence and occurrence count.
//!
//! Two policies coexist, selected by the resolved `PatternSpec`:
//!
//! - fixed-length multi-step sequences (the programming behaviors) are
//!   matched positionally from an anchor, the first observed row equal to
//!   the first expected step. The anchor exists to skip leading noise from
//!   unrelated events that happen to match one of the later steps before
//!   the real sequence begins.
//! - repeated-step sequences with a dynamic count (copy/encrypt/mailing
//!   behaviors) are matched under strict length equality against the
//!   expanded template.
//!
//! Absence never raises: an empty slice or a missing row shows up in the
//! returned `MatchResult`, and every call leaves an audit trail in the
//! quality log (step-level DEBUG counts, one INFO/ERROR summary).

use std::collections::HashSet;

use tracing::{debug, error, info};
use wsal_core::{AuditEvent, BehaviorWindow, EventTable, MatchResult};

use crate::catalog::{PatternSpec, SequenceStep};

/// Run one quality check of `events` against `spec` inside `window`.
///
/// `events` need not be pre-filtered: the matcher copies the rows inside
/// `[window.start, window.end]` (inclusive) and never mutates the source.
pub fn match_window(
    events: &EventTable,
    window: &BehaviorWindow,
    spec: &PatternSpec,
) -> MatchResult {
    info!(label = %window.label, "sequence quality check started");

    let slice = events.slice_window(window.start, window.end);
    if slice.is_empty() {
        for step in spec.filter_steps() {
            log_step_count(&window.label, step, 0, spec.expected_occurrences(step));
        }
        let result = MatchResult::FAIL;
        log_summary(window, &[], result);
        return result;
    }

    let mut observed = collect_observed(&slice, window, spec);

    let result = match spec {
        PatternSpec::Fixed { steps } => {
            // a single row can satisfy two fixed-policy filters at once
            // (multi-valued access list); it must enter the positional
            // comparison only once
            dedup_rows(&mut observed);
            check_fixed(steps, &observed)
        }
        // repeated specs count such a row once per filter: one dual-access
        // row legitimately covers both halves of a create/delete pair
        PatternSpec::Repeated { .. } => check_repeated(spec, &observed),
    };

    log_summary(window, &observed, result);
    result
}

/// Union of the per-step row matches, time-sorted. A row matching several
/// filters appears once per filter.
fn collect_observed(
    slice: &EventTable,
    window: &BehaviorWindow,
    spec: &PatternSpec,
) -> Vec<AuditEvent> {
    let mut observed: Vec<AuditEvent> = Vec::new();
    for step in spec.filter_steps() {
        let rows: Vec<AuditEvent> = slice
            .events()
            .iter()
            .filter(|row| step.matches_row(row))
            .cloned()
            .collect();
        log_step_count(&window.label, step, rows.len(), spec.expected_occurrences(step));
        observed.extend(rows);
    }
    observed.sort_by(|a, b| a.ts.cmp(&b.ts));
    observed
}

/// Drop repeated rows, keeping the earliest occurrence of each.
fn dedup_rows(observed: &mut Vec<AuditEvent>) {
    let mut seen: HashSet<AuditEvent> = HashSet::new();
    observed.retain(|row| seen.insert(row.clone()));
}

/// Fixed-length policy: anchor on the first row equal to the first expected
/// step, then compare positionally. Too few rows after the anchor is a hard
/// failure; a positional mismatch only breaks the order flag.
fn check_fixed(steps: &[SequenceStep], observed: &[AuditEvent]) -> MatchResult {
    let anchor = observed
        .iter()
        .position(|row| steps[0].matches_identity(row))
        .unwrap_or(0);

    if observed.len() - anchor < steps.len() {
        return MatchResult::FAIL;
    }

    let mut order_ok = true;
    for (idx, step) in steps.iter().enumerate() {
        let row = &observed[anchor + idx];
        if !step.matches_identity(row) || !row.access_list_contains(&step.access_type) {
            order_ok = false;
        }
    }

    MatchResult {
        order_ok,
        count_ok: true,
    }
}

/// Repeated-step policy: the observed row count must equal the expanded
/// template length exactly, then rows are compared positionally.
fn check_repeated(spec: &PatternSpec, observed: &[AuditEvent]) -> MatchResult {
    let expected = spec.expected_steps();
    if observed.len() != expected.len() {
        return MatchResult::FAIL;
    }

    let mut order_ok = true;
    for (idx, step) in expected.iter().enumerate() {
        let row = &observed[idx];
        if !step.matches_identity(row) || !row.access_list_contains(&step.access_type) {
            order_ok = false;
        }
    }

    MatchResult {
        order_ok,
        count_ok: true,
    }
}

fn log_step_count(label: &str, step: &SequenceStep, matched: usize, expected: usize) {
    debug!(
        label,
        step = %step.name,
        matched,
        expected,
        "step-level row count"
    );
}

fn log_summary(window: &BehaviorWindow, observed: &[AuditEvent], result: MatchResult) {
    let first_ts = observed.first().map(|r| r.ts.to_rfc3339());
    let last_ts = observed.last().map(|r| r.ts.to_rfc3339());
    if result.passed() {
        info!(
            label = %window.label,
            order_ok = result.order_ok,
            count_ok = result.count_ok,
            first_event_ts = first_ts.as_deref().unwrap_or("none"),
            last_event_ts = last_ts.as_deref().unwrap_or("none"),
            window_start = %window.start.to_rfc3339(),
            window_end = %window.end.to_rfc3339(),
            "security event sequence check passed"
        );
    } else {
        error!(
            label = %window.label,
            order_ok = result.order_ok,
            count_ok = result.count_ok,
            first_event_ts = first_ts.as_deref().unwrap_or("none"),
            last_event_ts = last_ts.as_deref().unwrap_or("none"),
            window_start = %window.start.to_rfc3339(),
            window_end = %window.end.to_rfc3339(),
            "security event sequence check failed"
        );
    }
}
