use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Time interval plus label asserting "this simulated behavior happened
/// here", parsed from the sim23 behavior log by an external collaborator.
///
/// The label encodes the behavior family and its sub-parameters, e.g.
/// `encrypt_copy_200KB_10_files`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BehaviorWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub label: String,
}

impl BehaviorWindow {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>, label: impl Into<String>) -> Self {
        Self {
            start,
            end,
            label: label.into(),
        }
    }
}
