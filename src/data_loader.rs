//! Statement source boundary
//!
//! The pipeline itself never performs I/O. Callers fetch statements from a
//! [`StatementStore`] by subject and by object, merge the two directions and
//! resolve the referenced entities before handing everything to
//! [`crate::flow::FlowPipeline`].

use anyhow::{anyhow, Context, Result};
use indexmap::IndexSet;
use std::collections::HashSet;
use std::path::Path;
use tracing::{debug, warn};

use crate::flow::{Entity, Statement};

pub trait StatementStore: Sync {
    fn statements_by_subject(&self, ids: &[String]) -> Result<Vec<Statement>>;
    fn statements_by_object(&self, ids: &[String]) -> Result<Vec<Statement>>;
    fn resolve_entities(&self, ids: &[String]) -> Result<Vec<Entity>>;
}

/// Merged outcome of a two-directional fetch
#[derive(Clone, Debug, Default)]
pub struct FetchResult {
    pub statements: Vec<Statement>,
    pub entities: Vec<Entity>,
    /// Directions that failed and were treated as empty
    pub failures: Vec<String>,
}

impl FetchResult {
    pub fn is_partial(&self) -> bool {
        !self.failures.is_empty()
    }
}

fn direction_or_empty(
    direction: &str,
    result: std::thread::Result<Result<Vec<Statement>>>,
    failures: &mut Vec<String>,
) -> Vec<Statement> {
    match result {
        Ok(Ok(statements)) => statements,
        Ok(Err(e)) => {
            warn!("Fetching statements by {} failed: {:#}", direction, e);
            failures.push(format!("{}: {:#}", direction, e));
            Vec::new()
        }
        Err(_) => {
            warn!("Fetching statements by {} panicked", direction);
            failures.push(format!("{}: worker panicked", direction));
            Vec::new()
        }
    }
}

/// Keeps the first copy of every statement. Statements with an id are
/// compared by id, the others by content.
pub fn merge_statements(
    by_subject: Vec<Statement>,
    by_object: Vec<Statement>,
) -> Vec<Statement> {
    let mut seen_ids: HashSet<String> = HashSet::new();
    let mut merged: Vec<Statement> = Vec::with_capacity(by_subject.len() + by_object.len());

    for statement in by_subject.into_iter().chain(by_object) {
        let duplicate = match &statement.id {
            Some(id) => !seen_ids.insert(id.clone()),
            None => merged.contains(&statement),
        };
        if !duplicate {
            merged.push(statement);
        }
    }
    merged
}

/// Fetches every statement touching `ids` in both directions at once.
///
/// A failing direction counts as empty and is listed in
/// [`FetchResult::failures`]. Entity resolution failures are returned.
/// Repeating the fetch is safe.
pub fn fetch_statements<S: StatementStore>(store: &S, ids: &[String]) -> Result<FetchResult> {
    let (by_subject, by_object) = std::thread::scope(|scope| {
        let subjects = scope.spawn(|| store.statements_by_subject(ids));
        let objects = scope.spawn(|| store.statements_by_object(ids));
        (subjects.join(), objects.join())
    });

    let mut failures = Vec::new();
    let by_subject = direction_or_empty("subject", by_subject, &mut failures);
    let by_object = direction_or_empty("object", by_object, &mut failures);
    let statements = merge_statements(by_subject, by_object);

    let referenced: IndexSet<String> = statements
        .iter()
        .flat_map(|s| [s.subject.clone(), s.object.clone()])
        .collect();
    let referenced: Vec<String> = referenced.into_iter().collect();
    let entities = store
        .resolve_entities(&referenced)
        .context("Failed to resolve entities")?;

    debug!(
        "Fetched {} statements and {} entities for {} ids",
        statements.len(),
        entities.len(),
        ids.len()
    );

    Ok(FetchResult {
        statements,
        entities,
        failures,
    })
}

pub fn load_statements(path: &Path) -> Result<Vec<Statement>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read statements from {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse statements in {}", path.display()))
}

pub fn load_entities(path: &Path) -> Result<Vec<Entity>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read entities from {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse entities in {}", path.display()))
}

/// Statement store backed by two JSON files held in memory
#[derive(Clone, Debug, Default)]
pub struct JsonFileStore {
    statements: Vec<Statement>,
    entities: Vec<Entity>,
}

impl JsonFileStore {
    pub fn new(statements: Vec<Statement>, entities: Vec<Entity>) -> Self {
        Self {
            statements,
            entities,
        }
    }

    pub fn load(statements_path: &Path, entities_path: &Path) -> Result<Self> {
        Ok(Self::new(
            load_statements(statements_path)?,
            load_entities(entities_path)?,
        ))
    }
}

impl StatementStore for JsonFileStore {
    fn statements_by_subject(&self, ids: &[String]) -> Result<Vec<Statement>> {
        Ok(self
            .statements
            .iter()
            .filter(|s| ids.contains(&s.subject))
            .cloned()
            .collect())
    }

    fn statements_by_object(&self, ids: &[String]) -> Result<Vec<Statement>> {
        Ok(self
            .statements
            .iter()
            .filter(|s| ids.contains(&s.object))
            .cloned()
            .collect())
    }

    fn resolve_entities(&self, ids: &[String]) -> Result<Vec<Entity>> {
        if self.entities.iter().any(|e| e.id.trim().is_empty()) {
            return Err(anyhow!("Entity file contains an entity without id"));
        }
        Ok(self
            .entities
            .iter()
            .filter(|e| ids.contains(&e.id))
            .cloned()
            .collect())
    }
}
