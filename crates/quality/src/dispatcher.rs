//! Routes recorded behavior windows to their quality checks.
//!
//! Each window's label is classified into a behavior family; windows of
//! unmonitored families (browsing, plain mailing and the like) are skipped
//! without a check. A label that classifies but has no catalog entry is a
//! hard error, returned to the caller instead of being silently skipped.

use tracing::{debug, info, warn};
use wsal_core::{BehaviorWindow, CatalogError, EventTable};

use crate::catalog::{BehaviorFamily, PatternCatalog};
use crate::matcher;

/// Everything one evaluation run needs besides the data itself.
pub struct CheckContext<'a> {
    pub catalog: &'a PatternCatalog,
    pub sim_user: &'a str,
    pub timezone: &'a str,
}

/// Evaluate every routable window against `events` and return the number of
/// checks performed. Results land in the quality log; a pass/fail never
/// stops the run, only an unresolvable label does.
pub fn run_quality_checks(
    windows: &[BehaviorWindow],
    events: &EventTable,
    ctx: &CheckContext<'_>,
) -> Result<usize, CatalogError> {
    let mut performed = 0;

    for window in windows {
        let Some(family) = BehaviorFamily::classify(&window.label) else {
            debug!(label = %window.label, "no quality check configured, skipping window");
            continue;
        };

        let spec = ctx
            .catalog
            .resolve(family, &window.label, ctx.sim_user, ctx.timezone)?;
        matcher::match_window(events, window, &spec);
        performed += 1;
    }

    Ok(performed)
}

/// Compare the performed check count against the configured per-iteration
/// expectation. A shortfall usually means truncated or misordered behavior
/// windows in the recording, which is itself a quality finding.
pub fn verify_check_count(performed: usize, expected: usize) {
    if performed == expected {
        info!(performed, "all expected quality checks were performed");
    } else {
        warn!(
            performed,
            expected,
            "quality check count differs from the per-iteration expectation"
        );
    }
}
