use serde_json::json;
use std::error::Error;

use crate::flow::LayoutGraph;

pub fn render(graph: &LayoutGraph) -> Result<String, Box<dyn Error>> {
    let res = json!({
        "nodes": graph.nodes,
        "edges": graph.edges,
        "standardFlows": graph.standard_flows,
        "recyclingFlows": graph.recycling_flows,
        "removedEdges": graph.removed_edges,
        "cycleReport": graph.cycle_report,
        "stats": graph.stats,
        "diagnostics": graph.diagnostics,
    });
    Ok(serde_json::to_string_pretty(&res)?)
}
