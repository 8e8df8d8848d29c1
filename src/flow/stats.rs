use serde::Serialize;

use super::relationship::MaterialRelationship;

/// Aggregate figures over a set of flows
#[derive(Serialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FlowStats {
    pub total_flows: usize,
    pub recycling_flows: usize,
    /// Share of the input quantity that flows through circular processes, 0 to 100
    pub recycling_rate: u32,
    pub total_quantity: f64,
    pub recycling_quantity: f64,
}

pub fn recycling_rate(recycling_quantity: f64, total_quantity: f64) -> u32 {
    if total_quantity <= 0.0 {
        return 0;
    }
    (recycling_quantity / total_quantity * 100.0)
        .round()
        .clamp(0.0, 100.0) as u32
}

pub fn compute_stats(edges: &[MaterialRelationship]) -> FlowStats {
    let (recycling_flows, recycling_quantity) = edges
        .iter()
        .filter(|e| e.is_circular_flow())
        .fold((0, 0.0), |(count, quantity), e| {
            (count + 1, quantity + e.input_quantity)
        });
    let total_quantity: f64 = edges.iter().map(|e| e.input_quantity).sum();

    FlowStats {
        total_flows: edges.len(),
        recycling_flows,
        recycling_rate: recycling_rate(recycling_quantity, total_quantity),
        total_quantity,
        recycling_quantity,
    }
}
