use indexmap::{IndexMap, IndexSet};
use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};
use std::collections::{HashMap, HashSet};
use tracing::{debug, warn};

use super::classifier::GraphRole;
use super::cycles::{is_acyclic, CycleReport};
use super::diagnostics::Diagnostics;
use super::layers::assign_layer;
use super::lifecycle::LifecycleStage;
use super::normalizer::EntityIndex;
use super::relationship::MaterialRelationship;
use super::stats::{compute_stats, FlowStats};

/// An entity placed in the flow graph
#[derive(Clone, Debug, PartialEq)]
pub struct MaterialNode {
    pub id: String,
    pub display_name: String,
    pub description: Option<String>,
    pub graph_role: GraphRole,
    pub lifecycle_stage: Option<LifecycleStage>,
    pub category_code: Option<String>,
    pub source_entity_ref: Option<String>,
    pub target_entity_ref: Option<String>,
}

impl MaterialNode {
    pub fn is_reused_component(&self) -> bool {
        self.lifecycle_stage == Some(LifecycleStage::ReusedComponent)
    }

    pub fn is_recycling_material(&self) -> bool {
        self.lifecycle_stage == Some(LifecycleStage::SecondaryInput)
    }

    pub fn layer(&self) -> f64 {
        assign_layer(self.lifecycle_stage, self.graph_role)
    }
}

// The reuse and recycling flags are written out but never stored.
impl Serialize for MaterialNode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("MaterialNode", 10)?;
        state.serialize_field("id", &self.id)?;
        state.serialize_field("displayName", &self.display_name)?;
        state.serialize_field("description", &self.description)?;
        state.serialize_field("graphRole", &self.graph_role)?;
        state.serialize_field("lifecycleStage", &self.lifecycle_stage)?;
        state.serialize_field("isReusedComponent", &self.is_reused_component())?;
        state.serialize_field("isRecyclingMaterial", &self.is_recycling_material())?;
        state.serialize_field("categoryCode", &self.category_code)?;
        state.serialize_field("sourceEntityRef", &self.source_entity_ref)?;
        state.serialize_field("targetEntityRef", &self.target_entity_ref)?;
        state.end()
    }
}

/// Classified nodes and the acyclic edge set between them
#[derive(Serialize, Clone, Debug, Default)]
pub struct MaterialGraph {
    pub nodes: Vec<MaterialNode>,
    pub edges: Vec<MaterialRelationship>,
}

impl MaterialGraph {
    /// Creates one node per entity referenced by `relationships`, in
    /// first-appearance order.
    pub fn build_nodes(
        relationships: &[MaterialRelationship],
        entities: &EntityIndex,
        roles: &IndexMap<String, GraphRole>,
        stages: &IndexMap<String, LifecycleStage>,
        id_length: usize,
    ) -> Vec<MaterialNode> {
        let mut ids: IndexSet<&str> = IndexSet::new();
        let mut first_source: HashMap<&str, &str> = HashMap::new();
        let mut first_target: HashMap<&str, &str> = HashMap::new();
        for relationship in relationships {
            let subject = relationship.subject_id.as_str();
            let object = relationship.object_id.as_str();
            ids.insert(subject);
            ids.insert(object);
            first_target.entry(subject).or_insert(object);
            first_source.entry(object).or_insert(subject);
        }

        ids.into_iter()
            .map(|id| {
                let profile = entities.get(id);
                MaterialNode {
                    id: id.to_string(),
                    display_name: entities.label(id, id_length),
                    description: profile.and_then(|p| p.description.clone()),
                    graph_role: roles.get(id).copied().unwrap_or(GraphRole::Intermediate),
                    lifecycle_stage: stages.get(id).copied(),
                    category_code: profile.and_then(|p| p.category_code.clone()),
                    source_entity_ref: first_source.get(id).map(|s| s.to_string()),
                    target_entity_ref: first_target.get(id).map(|t| t.to_string()),
                }
            })
            .collect()
    }

    pub fn stats(&self) -> String {
        format!("Nodes: {}, Edges: {}", self.nodes.len(), self.edges.len())
    }

    pub fn verify_graph_integrity(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        let mut node_ids = HashSet::new();
        for node in &self.nodes {
            if !node_ids.insert(node.id.as_str()) {
                errors.push(format!("Duplicate node id: {}", node.id));
            }
        }

        for edge in &self.edges {
            if !node_ids.contains(edge.subject_id.as_str()) {
                errors.push(format!(
                    "Edge {} -> {} ({}): subject not found in nodes",
                    edge.subject_id, edge.object_id, edge.process_name
                ));
            }
            if !node_ids.contains(edge.object_id.as_str()) {
                errors.push(format!(
                    "Edge {} -> {} ({}): object not found in nodes",
                    edge.subject_id, edge.object_id, edge.process_name
                ));
            }
        }

        if !is_acyclic(&self.edges) {
            errors.push("Edges contain a cycle".to_string());
        }

        if errors.is_empty() {
            debug!("Graph integrity verified: {}", self.stats());
            Ok(())
        } else {
            warn!("Identified {} graph integrity error(s)", errors.len());
            Err(errors)
        }
    }
}

#[derive(Serialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PositionedNode {
    #[serde(flatten)]
    pub node: MaterialNode,
    pub layer: f64,
}

/// Everything a renderer needs: positioned nodes, partitioned flows and
/// aggregate statistics, plus the diagnostics of the run
#[derive(Serialize, Clone, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct LayoutGraph {
    pub nodes: Vec<PositionedNode>,
    pub edges: Vec<MaterialRelationship>,
    pub standard_flows: Vec<MaterialRelationship>,
    pub recycling_flows: Vec<MaterialRelationship>,
    pub removed_edges: Vec<MaterialRelationship>,
    pub cycle_report: CycleReport,
    pub stats: FlowStats,
    pub diagnostics: Diagnostics,
}

impl LayoutGraph {
    /// Positions the nodes along the stage axis. Nodes on the same layer
    /// keep their graph order.
    pub fn from_graph(graph: MaterialGraph) -> Self {
        let mut nodes: Vec<PositionedNode> = graph
            .nodes
            .into_iter()
            .map(|node| PositionedNode {
                layer: node.layer(),
                node,
            })
            .collect();
        nodes.sort_by(|a, b| a.layer.total_cmp(&b.layer));

        let (recycling_flows, standard_flows): (Vec<_>, Vec<_>) = graph
            .edges
            .iter()
            .cloned()
            .partition(MaterialRelationship::is_circular_flow);
        let stats = compute_stats(&graph.edges);

        Self {
            nodes,
            edges: graph.edges,
            standard_flows,
            recycling_flows,
            stats,
            ..Default::default()
        }
    }

    pub fn layer_of(&self, id: &str) -> Option<f64> {
        self.nodes
            .iter()
            .find(|n| n.node.id == id)
            .map(|n| n.layer)
    }

    /// Checks the positioned nodes and valid edges the same way
    /// [`MaterialGraph::verify_graph_integrity`] does
    pub fn verify_graph_integrity(&self) -> Result<(), Vec<String>> {
        MaterialGraph {
            nodes: self.nodes.iter().map(|n| n.node.clone()).collect(),
            edges: self.edges.clone(),
        }
        .verify_graph_integrity()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flow::normalizer::tests::normalized;
    use crate::flow::relationship::FlowCategory;

    fn node(id: &str, stage: Option<LifecycleStage>, role: GraphRole) -> MaterialNode {
        MaterialNode {
            id: id.to_string(),
            display_name: id.to_string(),
            description: None,
            graph_role: role,
            lifecycle_stage: stage,
            category_code: None,
            source_entity_ref: None,
            target_entity_ref: None,
        }
    }

    #[test]
    fn test_derived_flags_follow_stage() {
        let reused = node("a", Some(LifecycleStage::ReusedComponent), GraphRole::Input);
        assert!(reused.is_reused_component());
        assert!(!reused.is_recycling_material());

        let recycled = node("b", Some(LifecycleStage::SecondaryInput), GraphRole::Input);
        assert!(recycled.is_recycling_material());
        assert!(!recycled.is_reused_component());

        let unknown = node("c", None, GraphRole::Input);
        assert!(!unknown.is_reused_component());
        assert!(!unknown.is_recycling_material());
    }

    #[test]
    fn test_node_serialization_includes_derived_flags() {
        let positioned = PositionedNode {
            node: node("a", Some(LifecycleStage::SecondaryInput), GraphRole::Input),
            layer: 0.2,
        };
        let json = serde_json::to_value(&positioned).unwrap();
        assert_eq!(json["id"], "a");
        assert_eq!(json["graphRole"], "input");
        assert_eq!(json["lifecycleStage"], "SECONDARY_INPUT");
        assert_eq!(json["isRecyclingMaterial"], true);
        assert_eq!(json["isReusedComponent"], false);
        assert_eq!(json["layer"], 0.2);
    }

    #[test]
    fn test_layout_sorts_by_layer_and_partitions_flows() {
        let mut recycled = normalized("scrap", "beam");
        recycled.flow_category = Some(FlowCategory::Recycling);
        let graph = MaterialGraph {
            nodes: vec![
                node("beam", Some(LifecycleStage::Product), GraphRole::Output),
                node("scrap", Some(LifecycleStage::SecondaryInput), GraphRole::Input),
                node("log", Some(LifecycleStage::PrimaryInput), GraphRole::Input),
            ],
            edges: vec![
                MaterialRelationship::from_statement(&normalized("log", "beam")),
                MaterialRelationship::from_statement(&recycled),
            ],
        };

        let layout = LayoutGraph::from_graph(graph);
        let order: Vec<_> = layout.nodes.iter().map(|n| n.node.id.as_str()).collect();
        assert_eq!(order, vec!["log", "scrap", "beam"]);
        assert_eq!(layout.standard_flows.len(), 1);
        assert_eq!(layout.recycling_flows.len(), 1);
        assert_eq!(layout.stats.recycling_rate, 50);
        assert_eq!(layout.layer_of("beam"), Some(3.5));
    }

    #[test]
    fn test_build_nodes_takes_first_neighbours() {
        let relationships: Vec<_> = [("a", "b"), ("c", "b"), ("b", "d"), ("b", "e")]
            .iter()
            .map(|(s, o)| MaterialRelationship::from_statement(&normalized(s, o)))
            .collect();
        let index = EntityIndex::build(
            &["a", "b", "c", "d", "e"]
                .iter()
                .map(|id| crate::flow::Entity::new(id, id))
                .collect::<Vec<_>>(),
        )
        .unwrap();

        let nodes = MaterialGraph::build_nodes(
            &relationships,
            &index,
            &IndexMap::new(),
            &IndexMap::new(),
            8,
        );
        let b = nodes.iter().find(|n| n.id == "b").unwrap();
        assert_eq!(b.source_entity_ref.as_deref(), Some("a"));
        assert_eq!(b.target_entity_ref.as_deref(), Some("d"));
        assert_eq!(nodes[0].source_entity_ref, None);
        assert_eq!(nodes[0].target_entity_ref.as_deref(), Some("b"));
        assert_eq!(nodes[0].graph_role, GraphRole::Intermediate);
    }

    #[test]
    fn test_verify_graph_integrity_flags_missing_nodes() {
        let graph = MaterialGraph {
            nodes: vec![node("a", None, GraphRole::Input)],
            edges: vec![MaterialRelationship::from_statement(&normalized("a", "b"))],
        };
        let errors = graph.verify_graph_integrity().unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("object not found"));
    }
}
