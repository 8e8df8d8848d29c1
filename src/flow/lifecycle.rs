use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter};
use tracing::debug;

use super::classifier::GraphRole;
use super::normalizer::NormalizedStatement;
use super::properties::parse_token;

/// Semantic position of a material in its reuse/recycling lifecycle
#[derive(
    Serialize,
    Deserialize,
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    Display,
    AsRefStr,
    EnumIter,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum LifecycleStage {
    PrimaryInput,
    SecondaryInput,
    ReusedComponent,
    Processing,
    Component,
    Product,
    UsePhase,
    Waste,
    Disposal,
}

impl LifecycleStage {
    pub fn parse(value: &str) -> Option<Self> {
        parse_token(value)
    }

    pub fn default_for_role(role: GraphRole) -> Self {
        match role {
            GraphRole::Input => LifecycleStage::PrimaryInput,
            GraphRole::Output => LifecycleStage::Product,
            GraphRole::Intermediate => LifecycleStage::Processing,
        }
    }

    pub fn is_end_of_life(self) -> bool {
        matches!(self, LifecycleStage::Waste | LifecycleStage::Disposal)
    }
}

/// Stage metadata found on one side of a statement
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StageHints {
    pub stage: Option<LifecycleStage>,
    pub is_reused: bool,
    pub is_recycling: bool,
}

impl StageHints {
    /// Stage implied by the boolean flags alone
    fn flagged_stage(&self) -> Option<LifecycleStage> {
        if self.is_reused {
            Some(LifecycleStage::ReusedComponent)
        } else if self.is_recycling {
            Some(LifecycleStage::SecondaryInput)
        } else {
            None
        }
    }
}

/// Every statement side touching an entity, keyed by entity id. Each list
/// keeps statement order; a self-loop contributes its input side first.
pub fn hints_by_entity(
    statements: &[NormalizedStatement],
) -> IndexMap<&str, Vec<&StageHints>> {
    let mut index: IndexMap<&str, Vec<&StageHints>> = IndexMap::new();
    for statement in statements {
        index
            .entry(statement.subject_id.as_str())
            .or_default()
            .push(&statement.input_hints);
        index
            .entry(statement.object_id.as_str())
            .or_default()
            .push(&statement.output_hints);
    }
    index
}

fn stage_from_hints(entity_id: &str, role: GraphRole, hints: &[&StageHints]) -> LifecycleStage {
    if let Some(stage) = hints.iter().find_map(|h| h.stage) {
        return stage;
    }
    if let Some(stage) = hints.iter().find_map(|h| h.flagged_stage()) {
        debug!("Stage of {} derived from flags: {}", entity_id, stage);
        return stage;
    }
    LifecycleStage::default_for_role(role)
}

/// Resolves the lifecycle stage of one entity.
///
/// An explicit stage on any touching statement wins, then the reuse and
/// recycling flags, then the default for the entity's graph role.
pub fn resolve_stage(
    entity_id: &str,
    role: GraphRole,
    statements: &[NormalizedStatement],
) -> LifecycleStage {
    let hints = hints_by_entity(statements);
    let touching = hints.get(entity_id).map(Vec::as_slice).unwrap_or_default();
    stage_from_hints(entity_id, role, touching)
}

pub fn resolve_stages(
    roles: &IndexMap<String, GraphRole>,
    statements: &[NormalizedStatement],
) -> IndexMap<String, LifecycleStage> {
    let hints = hints_by_entity(statements);
    roles
        .iter()
        .map(|(id, role)| {
            let touching = hints.get(id.as_str()).map(Vec::as_slice).unwrap_or_default();
            (id.clone(), stage_from_hints(id, *role, touching))
        })
        .collect()
}
