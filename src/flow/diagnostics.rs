use serde::Serialize;
use std::fmt::{Display, Formatter};
use tracing::{debug, info};

/// Why a statement did not become an edge
#[derive(Serialize, Clone, Debug, PartialEq)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum SkipReason {
    /// Subject or object id is blank
    EmptyEndpoint,
    MissingProcessName,
    PlaceholderProcessName { value: String },
    MissingQuantity,
    InvalidQuantity { value: String },
    NonPositiveQuantity { value: f64 },
    UnknownSubject,
    UnknownObject,
}

impl Display for SkipReason {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::EmptyEndpoint => write!(f, "empty subject or object id"),
            SkipReason::MissingProcessName => write!(f, "missing process name"),
            SkipReason::PlaceholderProcessName { value } => {
                write!(f, "placeholder process name {:?}", value)
            }
            SkipReason::MissingQuantity => write!(f, "missing input quantity"),
            SkipReason::InvalidQuantity { value } => {
                write!(f, "input quantity {:?} is not a number", value)
            }
            SkipReason::NonPositiveQuantity { value } => {
                write!(f, "input quantity {} is not positive", value)
            }
            SkipReason::UnknownSubject => write!(f, "subject is not a resolved entity"),
            SkipReason::UnknownObject => write!(f, "object is not a resolved entity"),
        }
    }
}

#[derive(Serialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SkippedStatement {
    pub statement: String,
    pub subject_id: String,
    pub object_id: String,
    pub reason: SkipReason,
}

/// Data defects encountered during a run. None of them are fatal.
#[derive(Serialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Diagnostics {
    pub skipped: Vec<SkippedStatement>,
    pub duplicates_discarded: usize,
}

impl Diagnostics {
    pub fn skip(&mut self, skipped: SkippedStatement) {
        debug!(
            "Skipping statement {} ({} -> {}): {}",
            skipped.statement, skipped.subject_id, skipped.object_id, skipped.reason
        );
        self.skipped.push(skipped);
    }

    pub fn is_clean(&self) -> bool {
        self.skipped.is_empty() && self.duplicates_discarded == 0
    }

    pub fn log_summary(&self) {
        if !self.is_clean() {
            info!(
                "Skipped {} statement(s), discarded {} duplicate(s)",
                self.skipped.len(),
                self.duplicates_discarded
            );
        }
    }
}
