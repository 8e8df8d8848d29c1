//! Material-flow graph processing
//!
//! ```text
//! statements + entities
//!   -> normalizer      typed fields, skipped-statement diagnostics
//!   -> classifier      input / output / intermediate
//!   -> lifecycle       stage per entity
//!   -> relationship    deduplicated edges
//!   -> cycles          DAG enforcement and cycle report
//!   -> layers          position on the stage axis
//!   -> stats           flow counts and recycling rate
//! ```
//!
//! Each stage only reads the previous stage's output.

pub mod classifier;
pub mod cycles;
pub mod diagnostics;
pub mod graph;
pub mod layers;
pub mod lifecycle;
pub mod normalizer;
pub mod pipeline;
pub mod properties;
pub mod relationship;
pub mod statement;
pub mod stats;

use serde::{Deserialize, Serialize};

pub use classifier::{classify_roles, GraphRole};
pub use cycles::{is_acyclic, prune_cycles, topological_order, CycleDetector, CycleReport};
pub use diagnostics::{Diagnostics, SkipReason, SkippedStatement};
pub use graph::{LayoutGraph, MaterialGraph, MaterialNode, PositionedNode};
pub use layers::assign_layer;
pub use lifecycle::{resolve_stage, LifecycleStage};
pub use normalizer::{normalize, EntityIndex, NormalizedStatement};
pub use pipeline::{process, FlowPipeline};
pub use relationship::{build_relationships, FlowCategory, MaterialRelationship, QualityChange};
pub use statement::{Entity, Property, PropertyValue, Statement};
pub use stats::{compute_stats, FlowStats};

/// Tunables for a pipeline run
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct FlowOptions {
    /// Process names that mean "not filled in"; compared case-insensitively
    pub placeholder_process_names: Vec<String>,
    /// Characters of an id shown in place of a missing entity name
    pub label_id_length: usize,
}

impl Default for FlowOptions {
    fn default() -> Self {
        Self {
            placeholder_process_names: ["unknown", "n/a", "none", "null", "undefined", "-"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            label_id_length: 8,
        }
    }
}

impl FlowOptions {
    pub fn is_placeholder_process_name(&self, name: &str) -> bool {
        let name = name.trim();
        name.is_empty()
            || self
                .placeholder_process_names
                .iter()
                .any(|p| p.trim().eq_ignore_ascii_case(name))
    }
}
