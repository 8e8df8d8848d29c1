use indexmap::IndexMap;
use serde::Serialize;
use tracing::debug;

use super::diagnostics::{Diagnostics, SkipReason, SkippedStatement};
use super::lifecycle::{LifecycleStage, StageHints};
use super::properties::{
    custom_properties, is_truthy, lookup, lookup_process, parse_number, CustomProperties,
    FlowField, Side,
};
use super::relationship::{FlowCategory, QualityChange};
use super::statement::{Entity, Statement};
use super::FlowOptions;
use crate::errors::{FlowError, FlowResult};

/// What the pipeline knows about a resolved entity
#[derive(Serialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EntityProfile {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_code: Option<String>,
}

/// Entity lookup keyed by id, in input order
#[derive(Clone, Debug, Default)]
pub struct EntityIndex {
    entities: IndexMap<String, EntityProfile>,
}

impl EntityIndex {
    /// Builds the lookup. Duplicate ids keep the first record; an empty id
    /// makes the lookup impossible to build.
    pub fn build(entities: &[Entity]) -> FlowResult<Self> {
        let mut index = IndexMap::new();
        for (position, entity) in entities.iter().enumerate() {
            let id = entity.id.trim();
            if id.is_empty() {
                return Err(FlowError::InvalidEntity(format!(
                    "entity at position {} has an empty id",
                    position
                )));
            }
            if index.contains_key(id) {
                debug!("Ignoring duplicate entity {}", id);
                continue;
            }
            index.insert(
                id.to_string(),
                EntityProfile {
                    id: id.to_string(),
                    name: entity.name.trim().to_string(),
                    description: entity
                        .description
                        .as_deref()
                        .map(str::trim)
                        .filter(|d| !d.is_empty())
                        .map(str::to_string),
                    category_code: None,
                },
            );
        }
        Ok(Self { entities: index })
    }

    pub fn get(&self, id: &str) -> Option<&EntityProfile> {
        self.entities.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entities.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &EntityProfile> {
        self.entities.values()
    }

    /// Display name, or the id truncated to `id_length` characters
    pub fn label(&self, id: &str, id_length: usize) -> String {
        match self.get(id) {
            Some(profile) if !profile.name.is_empty() => profile.name.clone(),
            _ => truncate_id(id, id_length),
        }
    }

    fn record_category(&mut self, id: &str, category: Option<&String>) {
        if let (Some(profile), Some(category)) = (self.entities.get_mut(id), category) {
            if profile.category_code.is_none() {
                profile.category_code = Some(category.clone());
            }
        }
    }
}

pub fn truncate_id(id: &str, id_length: usize) -> String {
    if id.chars().count() <= id_length {
        id.to_string()
    } else {
        format!("{}…", id.chars().take(id_length).collect::<String>())
    }
}

/// A statement whose property bag has been reduced to typed fields
#[derive(Clone, Debug, Default, PartialEq)]
pub struct NormalizedStatement {
    pub statement: String,
    pub statement_id: Option<String>,
    pub subject_id: String,
    pub predicate: String,
    pub object_id: String,
    pub process_name: String,
    pub process_category: Option<String>,
    pub flow_category: Option<FlowCategory>,
    pub notes: Option<String>,
    pub is_circular: bool,
    pub input_quantity: f64,
    pub input_unit: Option<String>,
    pub output_quantity: Option<f64>,
    pub output_unit: Option<String>,
    pub emissions_total: Option<f64>,
    pub emissions_unit: Option<String>,
    pub material_loss_percent: Option<f64>,
    pub quality_change: Option<QualityChange>,
    pub input_hints: StageHints,
    pub output_hints: StageHints,
    pub input_category: Option<String>,
    pub output_category: Option<String>,
    pub custom: CustomProperties,
}

#[derive(Clone, Debug, Default)]
pub struct NormalizedFlows {
    pub entities: EntityIndex,
    pub statements: Vec<NormalizedStatement>,
    pub diagnostics: Diagnostics,
}

fn text(value: Option<&str>) -> Option<String> {
    value.map(str::to_string)
}

fn optional_number(statement: &Statement, field: FlowField, side: Side) -> Option<f64> {
    let raw = lookup(statement, field, side)?;
    let parsed = parse_number(raw);
    if parsed.is_none() {
        debug!("Ignoring non-numeric {:?} value {:?}", field, raw);
    }
    parsed
}

fn stage_hints(statement: &Statement, side: Side) -> StageHints {
    let stage = lookup(statement, FlowField::LifecycleStage, side).and_then(|raw| {
        let stage = LifecycleStage::parse(raw);
        if stage.is_none() {
            debug!("Ignoring unknown lifecycle stage {:?}", raw);
        }
        stage
    });
    StageHints {
        stage,
        is_reused: lookup(statement, FlowField::IsReused, side).is_some_and(is_truthy),
        is_recycling: lookup(statement, FlowField::IsRecycling, side).is_some_and(is_truthy),
    }
}

fn primary_quantity(statement: &Statement) -> Result<f64, SkipReason> {
    let raw = lookup(statement, FlowField::Quantity, Side::Input).ok_or(SkipReason::MissingQuantity)?;
    let value = parse_number(raw).ok_or_else(|| SkipReason::InvalidQuantity {
        value: raw.to_string(),
    })?;
    if value <= 0.0 {
        return Err(SkipReason::NonPositiveQuantity { value });
    }
    Ok(value)
}

fn process_name(statement: &Statement, options: &FlowOptions) -> Result<String, SkipReason> {
    let name = lookup_process(statement, FlowField::ProcessName)
        .ok_or(SkipReason::MissingProcessName)?;
    if options.is_placeholder_process_name(name) {
        return Err(SkipReason::PlaceholderProcessName {
            value: name.to_string(),
        });
    }
    Ok(name.to_string())
}

fn normalize_statement(
    statement: &Statement,
    position: usize,
    options: &FlowOptions,
) -> Result<NormalizedStatement, SkipReason> {
    if statement.subject.trim().is_empty() || statement.object.trim().is_empty() {
        return Err(SkipReason::EmptyEndpoint);
    }
    let process_name = process_name(statement, options)?;
    let input_quantity = primary_quantity(statement)?;

    Ok(NormalizedStatement {
        statement: statement.reference(position),
        statement_id: statement.id.clone(),
        subject_id: statement.subject.trim().to_string(),
        predicate: statement.predicate.clone(),
        object_id: statement.object.trim().to_string(),
        process_name,
        process_category: text(lookup_process(statement, FlowField::ProcessCategory)),
        flow_category: lookup_process(statement, FlowField::FlowCategory)
            .and_then(FlowCategory::parse),
        notes: text(lookup_process(statement, FlowField::Notes)),
        is_circular: lookup_process(statement, FlowField::IsCircular).is_some_and(is_truthy),
        input_quantity,
        input_unit: text(lookup(statement, FlowField::Unit, Side::Input)),
        output_quantity: optional_number(statement, FlowField::Quantity, Side::Output),
        output_unit: text(lookup(statement, FlowField::Unit, Side::Output)),
        emissions_total: optional_number(statement, FlowField::Emissions, Side::Output),
        emissions_unit: text(lookup(statement, FlowField::EmissionsUnit, Side::Output)),
        material_loss_percent: optional_number(statement, FlowField::MaterialLoss, Side::Output),
        quality_change: lookup(statement, FlowField::QualityChange, Side::Output)
            .and_then(QualityChange::parse),
        input_hints: stage_hints(statement, Side::Input),
        output_hints: stage_hints(statement, Side::Output),
        input_category: text(lookup(statement, FlowField::CategoryCode, Side::Input)),
        output_category: text(lookup(statement, FlowField::CategoryCode, Side::Output)),
        custom: custom_properties(statement),
    })
}

/// Reduces raw statements to typed records.
///
/// Statements without a subject or object id, a usable process name or a
/// positive input quantity are dropped and recorded in the diagnostics.
/// Only an entity list that cannot be indexed is fatal.
pub fn normalize(
    statements: &[Statement],
    entities: &[Entity],
    options: &FlowOptions,
) -> FlowResult<NormalizedFlows> {
    let mut index = EntityIndex::build(entities)?;
    let mut diagnostics = Diagnostics::default();
    let mut normalized = Vec::with_capacity(statements.len());

    for (position, statement) in statements.iter().enumerate() {
        match normalize_statement(statement, position, options) {
            Ok(record) => normalized.push(record),
            Err(reason) => diagnostics.skip(SkippedStatement {
                statement: statement.reference(position),
                subject_id: statement.subject.trim().to_string(),
                object_id: statement.object.trim().to_string(),
                reason,
            }),
        }
    }

    for record in &normalized {
        index.record_category(&record.subject_id, record.input_category.as_ref());
        index.record_category(&record.object_id, record.output_category.as_ref());
    }

    debug!(
        "Normalized {} of {} statements against {} entities",
        normalized.len(),
        statements.len(),
        index.len()
    );

    Ok(NormalizedFlows {
        entities: index,
        statements: normalized,
        diagnostics,
    })
}
