use std::error::Error;

use super::csv_common::export_to_csv;
use super::optional;
use crate::flow::{LayoutGraph, MaterialRelationship};

/// Valid edges first, then the edges removed to break cycles
pub fn render(graph: &LayoutGraph) -> Result<String, Box<dyn Error>> {
    let rows = graph
        .edges
        .iter()
        .map(|edge| ("valid", edge))
        .chain(graph.removed_edges.iter().map(|edge| ("removed", edge)));

    export_to_csv(
        rows,
        &[
            "statement_id",
            "subject_id",
            "object_id",
            "process_name",
            "process_category",
            "flow_category",
            "is_circular",
            "input_quantity",
            "input_unit",
            "output_quantity",
            "output_unit",
            "emissions_total",
            "emissions_unit",
            "material_loss_percent",
            "quality_change",
            "notes",
            "status",
        ],
        |(status, edge): (&str, &MaterialRelationship)| {
            vec![
                optional(&edge.statement_id),
                edge.subject_id.clone(),
                edge.object_id.clone(),
                edge.process_name.clone(),
                optional(&edge.process_category),
                edge.flow_category.to_string(),
                edge.is_circular_flow().to_string(),
                edge.input_quantity.to_string(),
                optional(&edge.input_unit),
                optional(&edge.output_quantity),
                optional(&edge.output_unit),
                optional(&edge.emissions_total),
                optional(&edge.emissions_unit),
                optional(&edge.material_loss_percent),
                optional(&edge.quality_change_code),
                optional(&edge.notes),
                status.to_string(),
            ]
        },
    )
}
