use std::error::Error;

use super::csv_common::export_to_csv;
use super::optional;
use crate::flow::{LayoutGraph, PositionedNode};

/// One row per node in layout order
pub fn render(graph: &LayoutGraph) -> Result<String, Box<dyn Error>> {
    export_to_csv(
        graph.nodes.iter(),
        &[
            "id",
            "display_name",
            "graph_role",
            "lifecycle_stage",
            "layer",
            "is_reused_component",
            "is_recycling_material",
            "category_code",
            "source_entity_ref",
            "target_entity_ref",
            "description",
        ],
        |positioned: &PositionedNode| {
            let node = &positioned.node;
            vec![
                node.id.clone(),
                node.display_name.clone(),
                node.graph_role.to_string(),
                optional(&node.lifecycle_stage),
                positioned.layer.to_string(),
                node.is_reused_component().to_string(),
                node.is_recycling_material().to_string(),
                optional(&node.category_code),
                optional(&node.source_entity_ref),
                optional(&node.target_entity_ref),
                optional(&node.description),
            ]
        },
    )
}
