use materialflow::flow::cycles::CycleDetector;
use materialflow::flow::{
    is_acyclic, process, topological_order, Entity, FlowCategory, FlowOptions, FlowPipeline,
    LifecycleStage, SkipReason, Statement,
};

fn flow(subject: &str, object: &str, quantity: &str) -> Statement {
    Statement::new(subject, "isProcessedInto", object)
        .with_property("input_processName", "Processing")
        .with_property("input_quantity", quantity)
        .with_property("input_unit", "kg")
}

fn entities(ids: &[&str]) -> Vec<Entity> {
    ids.iter().map(|id| Entity::new(id, &id.to_uppercase())).collect()
}

#[test]
fn test_simple_chain() {
    let statements = vec![flow("a", "b", "100"), flow("b", "c", "90")];
    let layout = process(&statements, &entities(&["a", "b", "c"]), &FlowOptions::default())
        .expect("chain should process");

    assert_eq!(layout.edges.len(), 2);
    assert!(layout.removed_edges.is_empty());
    assert!(!layout.cycle_report.has_cycles());

    let a = layout.layer_of("a").unwrap();
    let b = layout.layer_of("b").unwrap();
    let c = layout.layer_of("c").unwrap();
    assert!(a < b && b < c, "layers {} {} {}", a, b, c);

    assert_eq!(layout.stats.total_flows, 2);
    assert_eq!(layout.stats.total_quantity, 190.0);
    assert_eq!(layout.stats.recycling_rate, 0);
}

#[test]
fn test_cycle_injection() {
    let statements = vec![
        flow("a", "b", "10"),
        flow("b", "c", "10"),
        flow("c", "a", "10"),
    ];
    let layout = process(&statements, &entities(&["a", "b", "c"]), &FlowOptions::default())
        .expect("cycles are repaired, not fatal");

    assert!(layout.edges.is_empty());
    assert_eq!(layout.removed_edges.len(), 3);
    assert_eq!(layout.cycle_report.total_cycles, 1);
    assert_eq!(layout.cycle_report.removed_edge_count, 3);
    assert_eq!(layout.cycle_report.valid_edge_count, 0);
    assert_eq!(layout.cycle_report.cycles[0].description, "A → B → C → A");
    assert_eq!(layout.nodes.len(), 3);
}

#[test]
fn test_duplicate_statement() {
    let statements = vec![
        flow("a", "b", "100").with_id("st-1"),
        flow("a", "b", "100").with_id("st-2"),
    ];
    let layout = process(&statements, &entities(&["a", "b"]), &FlowOptions::default()).unwrap();

    assert_eq!(layout.edges.len(), 1);
    assert_eq!(layout.edges[0].statement_id.as_deref(), Some("st-1"));
    assert_eq!(layout.diagnostics.duplicates_discarded, 1);
}

#[test]
fn test_missing_quantity() {
    let statements = vec![
        flow("a", "b", "0"),
        flow("a", "c", "lots"),
        Statement::new("a", "flowsTo", "d").with_property("input_processName", "Cutting"),
        flow("a", "e", "5"),
    ];
    let layout = process(
        &statements,
        &entities(&["a", "b", "c", "d", "e"]),
        &FlowOptions::default(),
    )
    .unwrap();

    assert_eq!(layout.edges.len(), 1);
    assert_eq!(layout.edges[0].object_id, "e");

    let reasons: Vec<_> = layout
        .diagnostics
        .skipped
        .iter()
        .map(|s| s.reason.clone())
        .collect();
    assert_eq!(
        reasons,
        vec![
            SkipReason::NonPositiveQuantity { value: 0.0 },
            SkipReason::InvalidQuantity {
                value: "lots".to_string()
            },
            SkipReason::MissingQuantity,
        ]
    );
}

#[test]
fn test_placeholder_process_names_are_skipped() {
    let statements = vec![
        Statement::new("a", "flowsTo", "b")
            .with_property("input_processName", "N/A")
            .with_property("input_quantity", "3"),
        Statement::new("a", "flowsTo", "b")
            .with_property("input_processName", "tbd")
            .with_property("input_quantity", "3"),
    ];
    let options = FlowOptions {
        placeholder_process_names: vec!["n/a".to_string(), "TBD".to_string()],
        ..FlowOptions::default()
    };
    let layout = process(&statements, &entities(&["a", "b"]), &options).unwrap();

    assert!(layout.edges.is_empty());
    assert_eq!(layout.diagnostics.skipped.len(), 2);
}

#[test]
fn test_legacy_aliases() {
    let statements = vec![Statement::new("a", "flowsTo", "b")
        .with_property("processName", "Milling")
        .with_property("inputQuantity", "42")
        .with_property("inputUnit", "t")
        .with_property("output_outputQuantity", "40")];
    let layout = process(&statements, &entities(&["a", "b"]), &FlowOptions::default()).unwrap();

    let edge = &layout.edges[0];
    assert_eq!(edge.process_name, "Milling");
    assert_eq!(edge.input_quantity, 42.0);
    assert_eq!(edge.input_unit.as_deref(), Some("t"));
    assert_eq!(edge.output_quantity, Some(40.0));
}

#[test]
fn test_recycling_rate() {
    let statements = vec![
        flow("ore", "steel", "70"),
        flow("scrap", "steel", "30").with_property("input_flowCategory", "RECYCLING"),
    ];
    let layout = process(
        &statements,
        &entities(&["ore", "scrap", "steel"]),
        &FlowOptions::default(),
    )
    .unwrap();

    assert_eq!(layout.recycling_flows.len(), 1);
    assert_eq!(layout.standard_flows.len(), 1);
    assert_eq!(layout.recycling_flows[0].flow_category, FlowCategory::Recycling);
    assert_eq!(layout.stats.recycling_rate, 30);
    assert!(layout.stats.recycling_rate <= 100);
}

#[test]
fn test_empty_input_has_zero_rate() {
    let layout = FlowPipeline::default().run(&[], &[]).unwrap();
    assert!(layout.nodes.is_empty());
    assert_eq!(layout.stats.total_quantity, 0.0);
    assert_eq!(layout.stats.recycling_rate, 0);
}

#[test]
fn test_layer_ordering() {
    let statements = vec![
        flow("log", "beam", "5").with_property("output_lifecycleStage", "PRODUCT"),
        flow("beam", "house", "5"),
    ];
    let layout = process(
        &statements,
        &entities(&["log", "beam", "house"]),
        &FlowOptions::default(),
    )
    .unwrap();

    let log = layout.nodes.iter().find(|n| n.node.id == "log").unwrap();
    assert_eq!(log.node.lifecycle_stage, Some(LifecycleStage::PrimaryInput));
    let house = layout.nodes.iter().find(|n| n.node.id == "house").unwrap();
    assert_eq!(house.node.lifecycle_stage, Some(LifecycleStage::Product));
    assert!(log.layer < house.layer);

    let layers: Vec<f64> = layout.nodes.iter().map(|n| n.layer).collect();
    assert!(layers.windows(2).all(|w| w[0] <= w[1]));
}

#[test]
fn test_dense_graph_stays_acyclic() {
    let ids = ["a", "b", "c", "d", "e"];
    let mut statements = Vec::new();
    for (i, subject) in ids.iter().enumerate() {
        for (j, object) in ids.iter().enumerate() {
            if i != j && (i + j) % 3 != 0 {
                statements.push(flow(subject, object, &(i * 10 + j + 1).to_string()));
            }
        }
    }
    let layout = process(&statements, &entities(&ids), &FlowOptions::default()).unwrap();

    assert!(is_acyclic(&layout.edges));
    assert!(topological_order(&layout.edges).is_ok());
    assert!(CycleDetector::new(&layout.edges).detect().is_empty());
    assert_eq!(
        layout.edges.len() + layout.removed_edges.len(),
        statements.len()
    );
    assert!(layout.verify_graph_integrity().is_ok());
}

#[test]
fn test_runs_are_deterministic() {
    let statements = vec![
        flow("a", "b", "1"),
        flow("b", "c", "2"),
        flow("c", "a", "3"),
        flow("c", "d", "4"),
        flow("x", "d", "5").with_property("input_isRecyclingMaterial", "yes"),
    ];
    let entities = entities(&["a", "b", "c", "d", "x"]);

    let first = process(&statements, &entities, &FlowOptions::default()).unwrap();
    let second = process(&statements, &entities, &FlowOptions::default()).unwrap();
    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );
}

#[test]
fn test_empty_endpoint_is_skipped() {
    let statements = vec![flow("a", "b", "10"), flow("", "b", "10")];
    let layout = process(&statements, &entities(&["a", "b"]), &FlowOptions::default())
        .expect("an empty endpoint only skips its row");

    assert_eq!(layout.edges.len(), 1);
    assert_eq!(layout.edges[0].subject_id, "a");
    assert_eq!(layout.diagnostics.skipped.len(), 1);
    assert_eq!(layout.diagnostics.skipped[0].statement, "#1");
    assert_eq!(layout.diagnostics.skipped[0].reason, SkipReason::EmptyEndpoint);
}

#[test]
fn test_long_chain_processes() {
    let len = 50_000;
    let ids: Vec<String> = (0..=len).map(|i| format!("n{}", i)).collect();
    let statements: Vec<Statement> = ids
        .windows(2)
        .map(|pair| flow(&pair[0], &pair[1], "1"))
        .collect();
    let entities: Vec<Entity> = ids.iter().map(|id| Entity::new(id, id)).collect();

    let layout = process(&statements, &entities, &FlowOptions::default()).unwrap();
    assert_eq!(layout.edges.len(), len);
    assert_eq!(layout.nodes.len(), len + 1);
    assert!(!layout.cycle_report.has_cycles());
    assert_eq!(layout.nodes[0].node.id, "n0");
    assert_eq!(layout.nodes[0].node.target_entity_ref.as_deref(), Some("n1"));
    assert_eq!(
        layout.nodes[len].node.lifecycle_stage,
        Some(LifecycleStage::Product)
    );
}
