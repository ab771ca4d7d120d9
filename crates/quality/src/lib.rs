//! Quality evaluation for sim23 Windows security audit log recordings.
//!
//! Checks, per ground-truth behavior window, that the expected ordered
//! sequence of security-event tuples was recorded with the expected count,
//! and writes the verdicts to a structured quality log.

pub mod catalog;
pub mod config;
pub mod dispatcher;
pub mod input;
pub mod logging;
pub mod matcher;

pub use catalog::{BehaviorFamily, PatternCatalog, PatternSpec, SequenceStep};
pub use config::RunConfig;
pub use dispatcher::{run_quality_checks, verify_check_count, CheckContext};
pub use input::{load_events, load_windows, InputError};
pub use matcher::match_window;
