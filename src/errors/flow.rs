//! Fatal flow-processing errors
//!
//! Only contract violations end up here. Data defects such as a missing
//! process name or a dangling entity reference are skipped and recorded in
//! [`crate::flow::Diagnostics`]; cycles are pruned and reported in
//! [`crate::flow::CycleReport`].
//!
//! # Examples
//!
//! ```rust
//! use materialflow::errors::FlowError;
//!
//! let err = FlowError::InvalidEntity("entity at position 3 has an empty id".to_string());
//! assert!(err.is_data_error());
//! assert_eq!(err.error_code(), "INVALID_ENTITY");
//! ```

use thiserror::Error;

/// Errors that abort the flow pipeline
#[derive(Error, Debug)]
pub enum FlowError {
    /// The entity lookup cannot be built from the supplied entities
    #[error("Invalid entity: {0}")]
    InvalidEntity(String),

    /// The pruned edge set still contains a cycle
    #[error("Cycle remains after pruning: {0}")]
    CycleRemaining(String),
}

impl FlowError {
    /// Errors caused by the caller's input rather than by the pipeline itself
    pub fn is_data_error(&self) -> bool {
        matches!(self, FlowError::InvalidEntity(_))
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            FlowError::InvalidEntity(_) => "INVALID_ENTITY",
            FlowError::CycleRemaining(_) => "INTERNAL",
        }
    }
}
