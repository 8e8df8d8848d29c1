use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display};

use super::normalizer::NormalizedStatement;

/// Position of an entity in the statement adjacency sets
#[derive(
    Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, Display, AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum GraphRole {
    /// Never appears as an object
    Input,
    /// Never appears as a subject
    Output,
    /// Appears as both subject and object
    Intermediate,
}

/// Classifies every id referenced by the statements.
///
/// An id seen in both the subject and the object set is always
/// intermediate, no matter how the statements are ordered. The map keeps
/// first-appearance order.
pub fn classify_roles(statements: &[NormalizedStatement]) -> IndexMap<String, GraphRole> {
    let mut all_subjects: IndexSet<&str> = IndexSet::new();
    let mut all_objects: IndexSet<&str> = IndexSet::new();
    let mut seen: IndexSet<&str> = IndexSet::new();

    for statement in statements {
        all_subjects.insert(statement.subject_id.as_str());
        all_objects.insert(statement.object_id.as_str());
        seen.insert(statement.subject_id.as_str());
        seen.insert(statement.object_id.as_str());
    }

    seen.into_iter()
        .map(|id| {
            let role = match (all_subjects.contains(id), all_objects.contains(id)) {
                (true, true) => GraphRole::Intermediate,
                (true, false) => GraphRole::Input,
                _ => GraphRole::Output,
            };
            (id.to_string(), role)
        })
        .collect()
}
