use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use strum::{AsRefStr, Display, EnumIter};
use tracing::debug;

use super::diagnostics::{Diagnostics, SkipReason, SkippedStatement};
use super::lifecycle::LifecycleStage;
use super::normalizer::{EntityIndex, NormalizedStatement};
use super::properties::parse_token;

/// Nature of the process behind an edge
#[derive(
    Serialize,
    Deserialize,
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    Hash,
    Display,
    AsRefStr,
    EnumIter,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum FlowCategory {
    #[default]
    Standard,
    Recycling,
    Reuse,
    Downcycling,
    Circular,
    WasteFlow,
}

impl FlowCategory {
    pub fn parse(value: &str) -> Option<Self> {
        parse_token(value)
    }

    pub fn is_circular(self) -> bool {
        matches!(
            self,
            FlowCategory::Recycling
                | FlowCategory::Circular
                | FlowCategory::Reuse
                | FlowCategory::Downcycling
        )
    }

    /// Category implied by the statement's stage metadata when none is given
    fn infer(statement: &NormalizedStatement) -> Self {
        if statement.input_hints.is_reused
            || statement.input_hints.stage == Some(LifecycleStage::ReusedComponent)
        {
            FlowCategory::Reuse
        } else if statement.input_hints.is_recycling
            || statement.input_hints.stage == Some(LifecycleStage::SecondaryInput)
        {
            FlowCategory::Recycling
        } else if statement
            .output_hints
            .stage
            .is_some_and(LifecycleStage::is_end_of_life)
        {
            FlowCategory::WasteFlow
        } else {
            FlowCategory::Standard
        }
    }
}

#[derive(
    Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, Display, AsRefStr, EnumIter,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum QualityChange {
    Up,
    Same,
    Down,
}

impl QualityChange {
    pub fn parse(value: &str) -> Option<Self> {
        parse_token(value)
    }
}

/// A directed material flow between two entities
#[derive(Serialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MaterialRelationship {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub statement_id: Option<String>,
    pub subject_id: String,
    pub object_id: String,
    pub process_name: String,
    pub process_category: Option<String>,
    pub flow_category: FlowCategory,
    pub is_circular: bool,
    pub input_quantity: f64,
    pub input_unit: Option<String>,
    pub output_quantity: Option<f64>,
    pub output_unit: Option<String>,
    pub emissions_total: Option<f64>,
    pub emissions_unit: Option<String>,
    pub material_loss_percent: Option<f64>,
    pub quality_change_code: Option<QualityChange>,
    pub notes: Option<String>,
    pub input_custom_properties: IndexMap<String, String>,
    pub output_custom_properties: IndexMap<String, String>,
}

impl MaterialRelationship {
    pub fn from_statement(statement: &NormalizedStatement) -> Self {
        Self {
            statement_id: statement.statement_id.clone(),
            subject_id: statement.subject_id.clone(),
            object_id: statement.object_id.clone(),
            process_name: statement.process_name.clone(),
            process_category: statement.process_category.clone(),
            flow_category: statement
                .flow_category
                .unwrap_or_else(|| FlowCategory::infer(statement)),
            is_circular: statement.is_circular,
            input_quantity: statement.input_quantity,
            input_unit: statement.input_unit.clone(),
            output_quantity: statement.output_quantity,
            output_unit: statement.output_unit.clone(),
            emissions_total: statement.emissions_total,
            emissions_unit: statement.emissions_unit.clone(),
            material_loss_percent: statement.material_loss_percent,
            quality_change_code: statement.quality_change,
            notes: statement.notes.clone(),
            input_custom_properties: statement.custom.input.clone(),
            output_custom_properties: statement.custom.output.clone(),
        }
    }

    pub fn key(&self) -> RelationshipKey {
        RelationshipKey::new(
            &self.subject_id,
            &self.object_id,
            &self.process_name,
            self.input_quantity,
            self.input_unit.as_deref(),
        )
    }

    /// Counts towards recycling statistics
    pub fn is_circular_flow(&self) -> bool {
        self.is_circular || self.flow_category.is_circular()
    }
}

/// Identity of an edge for deduplication.
///
/// The quantity is held by its bit pattern so the key can be hashed; quantities
/// reaching the builder are always positive and finite.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct RelationshipKey {
    pub subject_id: String,
    pub object_id: String,
    pub process_name: String,
    quantity_bits: u64,
    pub input_unit: String,
}

impl RelationshipKey {
    pub fn new(
        subject_id: &str,
        object_id: &str,
        process_name: &str,
        input_quantity: f64,
        input_unit: Option<&str>,
    ) -> Self {
        Self {
            subject_id: subject_id.to_string(),
            object_id: object_id.to_string(),
            process_name: process_name.to_string(),
            // fold -0.0 into 0.0
            quantity_bits: (input_quantity + 0.0).to_bits(),
            input_unit: input_unit.unwrap_or_default().to_string(),
        }
    }
}

/// Turns normalized statements into deduplicated edges.
///
/// Statements whose subject or object is not a resolved entity are skipped.
/// The first edge seen for a key wins.
pub fn build_relationships(
    statements: &[NormalizedStatement],
    entities: &EntityIndex,
    diagnostics: &mut Diagnostics,
) -> Vec<MaterialRelationship> {
    let mut seen: HashSet<RelationshipKey> = HashSet::new();
    let mut relationships = Vec::new();

    for statement in statements {
        let reason = if !entities.contains(&statement.subject_id) {
            Some(SkipReason::UnknownSubject)
        } else if !entities.contains(&statement.object_id) {
            Some(SkipReason::UnknownObject)
        } else {
            None
        };
        if let Some(reason) = reason {
            diagnostics.skip(SkippedStatement {
                statement: statement.statement.clone(),
                subject_id: statement.subject_id.clone(),
                object_id: statement.object_id.clone(),
                reason,
            });
            continue;
        }

        let relationship = MaterialRelationship::from_statement(statement);
        if seen.insert(relationship.key()) {
            relationships.push(relationship);
        } else {
            debug!(
                "Discarding duplicate edge {} -> {} ({}) from statement {}",
                statement.subject_id,
                statement.object_id,
                statement.process_name,
                statement.statement
            );
            diagnostics.duplicates_discarded += 1;
        }
    }

    debug!(
        "Built {} relationships from {} statements",
        relationships.len(),
        statements.len()
    );
    relationships
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flow::normalizer::tests::normalized;
    use crate::flow::statement::Entity;

    fn index(ids: &[&str]) -> EntityIndex {
        let entities: Vec<Entity> = ids.iter().map(|id| Entity::new(id, id)).collect();
        EntityIndex::build(&entities).unwrap()
    }

    #[test]
    fn test_duplicates_collapse_to_first() {
        let mut first = normalized("a", "b");
        first.statement_id = Some("st-1".to_string());
        let mut second = normalized("a", "b");
        second.statement_id = Some("st-2".to_string());
        second.notes = Some("re-imported".to_string());

        let mut diagnostics = Diagnostics::default();
        let edges = build_relationships(&[first, second], &index(&["a", "b"]), &mut diagnostics);

        assert_eq!(edges.len(), 1);
        assert_eq!(edges[0].statement_id.as_deref(), Some("st-1"));
        assert_eq!(edges[0].notes, None);
        assert_eq!(diagnostics.duplicates_discarded, 1);
    }

    #[test]
    fn test_key_distinguishes_quantity_and_unit() {
        let base = normalized("a", "b");
        let mut other_quantity = normalized("a", "b");
        other_quantity.input_quantity = 50.0;
        let mut other_unit = normalized("a", "b");
        other_unit.input_unit = Some("t".to_string());
        let mut other_process = normalized("a", "b");
        other_process.process_name = "Drying".to_string();

        let mut diagnostics = Diagnostics::default();
        let edges = build_relationships(
            &[base, other_quantity, other_unit, other_process],
            &index(&["a", "b"]),
            &mut diagnostics,
        );
        assert_eq!(edges.len(), 4);
        assert_eq!(diagnostics.duplicates_discarded, 0);
    }

    #[test]
    fn test_key_does_not_collide_on_delimiters() {
        let left = RelationshipKey::new("a_b", "c", "p", 1.0, None);
        let right = RelationshipKey::new("a", "b_c", "p", 1.0, None);
        assert_ne!(left, right);
        assert_eq!(
            RelationshipKey::new("a", "b", "p", -0.0, None),
            RelationshipKey::new("a", "b", "p", 0.0, None)
        );
    }

    #[test]
    fn test_dangling_references_are_skipped() {
        let mut diagnostics = Diagnostics::default();
        let edges = build_relationships(
            &[normalized("a", "ghost"), normalized("ghost", "b")],
            &index(&["a", "b"]),
            &mut diagnostics,
        );
        assert!(edges.is_empty());
        assert_eq!(diagnostics.skipped[0].reason, SkipReason::UnknownObject);
        assert_eq!(diagnostics.skipped[1].reason, SkipReason::UnknownSubject);
    }

    #[test]
    fn test_flow_category_inference() {
        let mut recycled = normalized("a", "b");
        recycled.input_hints.is_recycling = true;
        assert_eq!(
            MaterialRelationship::from_statement(&recycled).flow_category,
            FlowCategory::Recycling
        );

        let mut disposed = normalized("a", "b");
        disposed.output_hints.stage = Some(LifecycleStage::Disposal);
        assert_eq!(
            MaterialRelationship::from_statement(&disposed).flow_category,
            FlowCategory::WasteFlow
        );

        let mut explicit = normalized("a", "b");
        explicit.input_hints.is_reused = true;
        explicit.flow_category = Some(FlowCategory::Downcycling);
        let edge = MaterialRelationship::from_statement(&explicit);
        assert_eq!(edge.flow_category, FlowCategory::Downcycling);
        assert!(edge.is_circular_flow());
    }

    #[test]
    fn test_category_parsing() {
        assert_eq!(FlowCategory::parse("waste_flow"), Some(FlowCategory::WasteFlow));
        assert_eq!(FlowCategory::parse("Recycling"), Some(FlowCategory::Recycling));
        assert_eq!(QualityChange::parse("SAME"), Some(QualityChange::Same));
        assert_eq!(QualityChange::parse("better"), None);
        assert!(!FlowCategory::WasteFlow.is_circular());
    }
}
