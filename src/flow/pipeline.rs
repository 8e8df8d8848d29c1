use tracing::{debug, info};

use super::classifier::classify_roles;
use super::cycles::{prune_cycles, topological_order};
use super::graph::{LayoutGraph, MaterialGraph};
use super::lifecycle::resolve_stages;
use super::normalizer::{normalize, NormalizedFlows};
use super::relationship::build_relationships;
use super::statement::{Entity, Statement};
use super::FlowOptions;
use crate::errors::{FlowError, FlowResult};

/// Runs the full statement-to-layout pipeline.
///
/// Every call reprocesses the complete input; nothing is cached between runs.
#[derive(Clone, Debug, Default)]
pub struct FlowPipeline {
    options: FlowOptions,
}

impl FlowPipeline {
    pub fn new(options: FlowOptions) -> Self {
        Self { options }
    }

    pub fn run(&self, statements: &[Statement], entities: &[Entity]) -> FlowResult<LayoutGraph> {
        let NormalizedFlows {
            entities: index,
            statements: normalized,
            mut diagnostics,
        } = normalize(statements, entities, &self.options)?;

        let roles = classify_roles(&normalized);
        let stages = resolve_stages(&roles, &normalized);
        let relationships = build_relationships(&normalized, &index, &mut diagnostics);

        let id_length = self.options.label_id_length;
        let pruning = prune_cycles(&relationships, |id| index.label(id, id_length));
        if let Err(remaining) = topological_order(&pruning.valid_edges) {
            return Err(FlowError::CycleRemaining(remaining.join(", ")));
        }

        let graph = MaterialGraph {
            nodes: MaterialGraph::build_nodes(&relationships, &index, &roles, &stages, id_length),
            edges: pruning.valid_edges,
        };
        debug!("Graph stats {}", graph.stats());
        diagnostics.log_summary();

        let layout = LayoutGraph {
            removed_edges: pruning.removed_edges,
            cycle_report: pruning.report,
            diagnostics,
            ..LayoutGraph::from_graph(graph)
        };

        info!(
            "Flow graph built with {} nodes, {} edges ({} recycling)",
            layout.nodes.len(),
            layout.edges.len(),
            layout.recycling_flows.len()
        );
        Ok(layout)
    }
}

/// Convenience wrapper around [`FlowPipeline::run`] with the given options
pub fn process(
    statements: &[Statement],
    entities: &[Entity],
    options: &FlowOptions,
) -> FlowResult<LayoutGraph> {
    FlowPipeline::new(options.clone()).run(statements, entities)
}
