//! Error types for materialflow
//!
//! The pipeline distinguishes three kinds of problems:
//!
//! - **Skippable data defects** (missing process name, unusable quantity,
//!   dangling entity reference) never raise an error. They are recorded in
//!   the run's diagnostics.
//! - **Structural defects** (cycles) are repaired by pruning and reported.
//! - **Fatal errors** are contract violations and are returned as
//!   [`FlowError`].

pub mod flow;

pub use flow::FlowError;

/// Result type alias for pipeline operations
pub type FlowResult<T> = Result<T, FlowError>;
