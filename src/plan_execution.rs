use crate::data_loader::{self, JsonFileStore};
use crate::flow::{Entity, FlowPipeline, LayoutGraph, Statement};
use crate::plan::{ExportProfileItem, Plan};
use notify::{Config, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use std::sync::mpsc::channel;
use tracing::{debug, error, info, warn};

use anyhow::{anyhow, Result};

fn plan_dir(plan_file_path: &Path) -> Result<&Path> {
    plan_file_path
        .parent()
        .ok_or_else(|| anyhow!("Plan file has no parent directory"))
}

fn input_paths(plan: &Plan, plan_file_path: &Path) -> Result<(PathBuf, PathBuf)> {
    let parent_dir = plan_dir(plan_file_path)?;
    Ok((
        parent_dir.join(&plan.import.statements),
        parent_dir.join(&plan.import.entities),
    ))
}

/// Loads statements and entities, fetching only the focus neighbourhood
/// when the plan names one
fn load_inputs(plan: &Plan, plan_file_path: &Path) -> Result<(Vec<Statement>, Vec<Entity>)> {
    let (statements_path, entities_path) = input_paths(plan, plan_file_path)?;
    info!(
        "Importing statements from {} and entities from {}",
        statements_path.display(),
        entities_path.display()
    );

    match &plan.import.focus {
        Some(focus) => {
            let store = JsonFileStore::load(&statements_path, &entities_path)?;
            let fetched = data_loader::fetch_statements(&store, focus)?;
            if fetched.is_partial() {
                warn!(
                    "Statement fetch incomplete: {}",
                    fetched.failures.join("; ")
                );
            }
            info!(
                "Fetched {} statements around {} focus entities",
                fetched.statements.len(),
                focus.len()
            );
            Ok((fetched.statements, fetched.entities))
        }
        None => {
            let statements = data_loader::load_statements(&statements_path)?;
            let entities = data_loader::load_entities(&entities_path)?;
            info!(
                "Loaded {} statements and {} entities",
                statements.len(),
                entities.len()
            );
            Ok((statements, entities))
        }
    }
}

/// Renders the layout with the profile's exporter and writes it next to the plan
fn export_graph(graph: &LayoutGraph, profile: &ExportProfileItem, parent_dir: &Path) -> Result<()> {
    info!(
        "Starting export to file: {} using exporter {:?}",
        profile.filename, profile.exporter
    );

    let output = crate::export::render(graph, profile.exporter)
        .map_err(|e| anyhow!("Failed to render {}: {}", profile.filename, e))?;
    let target = parent_dir.join(&profile.filename);
    crate::common::write_string_to_file(&target, &output)?;
    debug!("Wrote {} bytes to {}", output.len(), target.display());
    Ok(())
}

/// Executes a single plan run
pub fn run_plan(plan: &Plan, plan_file_path: &Path) -> Result<LayoutGraph> {
    info!("Running plan {}", plan.name());
    let (statements, entities) = load_inputs(plan, plan_file_path)?;

    let layout = FlowPipeline::new(plan.pipeline.clone()).run(&statements, &entities)?;
    if layout.cycle_report.has_cycles() {
        warn!("{}", layout.cycle_report.summary());
    }

    match layout.verify_graph_integrity() {
        Ok(_) => {
            info!("Graph integrity verified : ok - rendering exports");
            let parent_dir = plan_dir(plan_file_path)?;
            for profile in &plan.export.profiles {
                if let Err(e) = export_graph(&layout, profile, parent_dir) {
                    error!("Failed to export file {}: {}", profile.filename, e);
                }
            }
        }
        Err(errors) => {
            warn!("Identified {} graph integrity error(s)", errors.len());
            errors.iter().for_each(|e| warn!("{}", e));
            warn!("Not rendering exports");
        }
    }

    Ok(layout)
}

/// Main function to execute a plan, with optional file watching
pub fn execute_plan(plan: String, watch: bool) -> Result<()> {
    info!("Executing plan {}", plan);

    let plan_file_path = Path::new(&plan);
    let path_content = std::fs::read_to_string(plan_file_path)?;
    let plan: Plan = serde_yaml::from_str(&path_content)?;

    debug!("Executing plan: {:?}", plan);
    run_plan(&plan, plan_file_path)?;

    if watch {
        watch_for_changes(&plan, plan_file_path)?;
    }

    Ok(())
}

/// Re-runs the plan whenever one of its input files changes
fn watch_for_changes(plan: &Plan, plan_file_path: &Path) -> Result<()> {
    info!("Watching for changes");
    let (statements_path, entities_path) = input_paths(plan, plan_file_path)?;

    let (tx, rx) = channel();
    let mut watcher = RecommendedWatcher::new(tx, Config::default())?;
    for path in [&statements_path, &entities_path] {
        watcher.watch(path, RecursiveMode::NonRecursive)?;
    }

    loop {
        match rx.recv() {
            Ok(Ok(event)) => {
                if let EventKind::Modify(_) = event.kind {
                    debug!("File modified {:?}", event.paths);
                    info!("Change detected, re-executing plan");
                    if let Err(e) = run_plan(plan, plan_file_path) {
                        error!("Plan run failed: {:#}", e);
                    }
                }
            }
            Ok(Err(e)) => error!("Watch error: {:?}", e),
            Err(e) => return Err(anyhow!("Watch channel closed: {}", e)),
        }
    }
}
