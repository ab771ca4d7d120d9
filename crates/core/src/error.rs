//! Error taxonomy for the quality evaluation.
//!
//! Data absence (an empty event slice, a missing continuation file) is not
//! an error: it surfaces as a failed `MatchResult` or a warning log line.
//! Only catalog/data mismatches and broken configuration are typed errors.

use thiserror::Error;

/// A behavior label could not be resolved against the pattern catalog.
///
/// The dynamic-count families derive their expected file count from a fixed
/// per-label table; a label missing from that table means the catalog and
/// the recorded data disagree, and guessing a default count would silently
/// corrupt the evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    #[error("behavior label not present in the count table: {label}")]
    UnknownLabel { label: String },
}

/// Run configuration problems, split into the two outcomes the evaluation
/// distinguishes: unreadable/unparseable files are fatal at load time, a
/// missing key is fatal only where the value is actually required.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}: {message}")]
    Parse { path: String, message: String },
    #[error("required config key missing: {key}")]
    MissingKey { key: String },
}
