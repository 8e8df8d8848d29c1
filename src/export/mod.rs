pub mod csv_common;
pub mod to_csv_edges;
pub mod to_csv_nodes;
pub mod to_json;

use std::error::Error;

use crate::flow::LayoutGraph;
use crate::plan::ExportFileType;

/// Renders the layout with the exporter named in a plan profile
pub fn render(graph: &LayoutGraph, exporter: ExportFileType) -> Result<String, Box<dyn Error>> {
    match exporter {
        ExportFileType::JSON => to_json::render(graph),
        ExportFileType::CSVNodes => to_csv_nodes::render(graph),
        ExportFileType::CSVEdges => to_csv_edges::render(graph),
    }
}

pub(crate) fn optional<T: ToString>(value: &Option<T>) -> String {
    value.as_ref().map(|v| v.to_string()).unwrap_or_default()
}
