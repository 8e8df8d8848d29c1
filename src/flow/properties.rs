//! Property-bag lookups with legacy key aliases
//!
//! Statement properties have been written by three generations of forms.
//! The current forms namespace every key (`input_quantity`), an earlier
//! revision doubled the namespace (`input_inputQuantity`) and the first one
//! used flat keys (`inputQuantity`). Every logical field has one row in
//! [`ALIASES`] listing the keys to try, in order; the first non-empty value
//! wins.

use indexmap::IndexMap;
use strum::IntoEnumIterator;

use super::statement::Statement;

/// Which end of a statement a property describes
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Side {
    /// The subject: the material going into the process
    Input,
    /// The object: the material coming out of the process
    Output,
}

impl Side {
    fn prefix(self) -> &'static str {
        match self {
            Side::Input => "input_",
            Side::Output => "output_",
        }
    }
}

/// Logical fields extracted from a statement's properties
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FlowField {
    ProcessName,
    ProcessCategory,
    FlowCategory,
    Notes,
    IsCircular,
    Quantity,
    Unit,
    LifecycleStage,
    IsReused,
    IsRecycling,
    CategoryCode,
    Emissions,
    EmissionsUnit,
    MaterialLoss,
    QualityChange,
}

impl FlowField {
    /// Process-level fields describe the statement as a whole and are
    /// recorded on the input side
    pub fn is_process_level(self) -> bool {
        matches!(
            self,
            FlowField::ProcessName
                | FlowField::ProcessCategory
                | FlowField::FlowCategory
                | FlowField::Notes
                | FlowField::IsCircular
        )
    }
}

pub struct FieldAliases {
    pub field: FlowField,
    pub side: Side,
    pub keys: &'static [&'static str],
}

pub static ALIASES: &[FieldAliases] = &[
    // process level
    FieldAliases {
        field: FlowField::ProcessName,
        side: Side::Input,
        keys: &[
            "input_processName",
            "input_inputProcessName",
            "processName",
            "output_processName",
        ],
    },
    FieldAliases {
        field: FlowField::ProcessCategory,
        side: Side::Input,
        keys: &[
            "input_processCategory",
            "input_inputProcessCategory",
            "processCategory",
            "output_processCategory",
        ],
    },
    FieldAliases {
        field: FlowField::FlowCategory,
        side: Side::Input,
        keys: &[
            "input_flowCategory",
            "input_inputFlowCategory",
            "flowCategory",
            "output_flowCategory",
        ],
    },
    FieldAliases {
        field: FlowField::Notes,
        side: Side::Input,
        keys: &["input_notes", "input_inputNotes", "notes", "output_notes"],
    },
    FieldAliases {
        field: FlowField::IsCircular,
        side: Side::Input,
        keys: &[
            "input_isCircular",
            "input_inputIsCircular",
            "isCircular",
            "output_isCircular",
        ],
    },
    // input side
    FieldAliases {
        field: FlowField::Quantity,
        side: Side::Input,
        keys: &["input_quantity", "input_inputQuantity", "inputQuantity"],
    },
    FieldAliases {
        field: FlowField::Unit,
        side: Side::Input,
        keys: &["input_unit", "input_inputUnit", "inputUnit"],
    },
    FieldAliases {
        field: FlowField::LifecycleStage,
        side: Side::Input,
        keys: &[
            "input_lifecycleStage",
            "input_inputLifecycleStage",
            "inputLifecycleStage",
        ],
    },
    FieldAliases {
        field: FlowField::IsReused,
        side: Side::Input,
        keys: &[
            "input_isReusedInput",
            "input_inputIsReused",
            "inputIsReused",
            "isReusedInput",
        ],
    },
    FieldAliases {
        field: FlowField::IsRecycling,
        side: Side::Input,
        keys: &[
            "input_isRecyclingMaterial",
            "input_inputIsRecyclingMaterial",
            "inputIsRecyclingMaterial",
            "isRecyclingMaterial",
        ],
    },
    FieldAliases {
        field: FlowField::CategoryCode,
        side: Side::Input,
        keys: &[
            "input_materialCategory",
            "input_inputMaterialCategory",
            "inputMaterialCategory",
        ],
    },
    // output side
    FieldAliases {
        field: FlowField::Quantity,
        side: Side::Output,
        keys: &["output_quantity", "output_outputQuantity", "outputQuantity"],
    },
    FieldAliases {
        field: FlowField::Unit,
        side: Side::Output,
        keys: &["output_unit", "output_outputUnit", "outputUnit"],
    },
    FieldAliases {
        field: FlowField::LifecycleStage,
        side: Side::Output,
        keys: &[
            "output_lifecycleStage",
            "output_outputLifecycleStage",
            "outputLifecycleStage",
        ],
    },
    FieldAliases {
        field: FlowField::IsReused,
        side: Side::Output,
        keys: &[
            "output_isReusedComponent",
            "output_outputIsReused",
            "outputIsReused",
        ],
    },
    FieldAliases {
        field: FlowField::IsRecycling,
        side: Side::Output,
        keys: &[
            "output_isRecyclingMaterial",
            "output_outputIsRecyclingMaterial",
            "outputIsRecyclingMaterial",
        ],
    },
    FieldAliases {
        field: FlowField::CategoryCode,
        side: Side::Output,
        keys: &[
            "output_materialCategory",
            "output_outputMaterialCategory",
            "outputMaterialCategory",
        ],
    },
    FieldAliases {
        field: FlowField::Emissions,
        side: Side::Output,
        keys: &[
            "output_emissionsTotal",
            "output_outputEmissionsTotal",
            "outputEmissionsTotal",
        ],
    },
    FieldAliases {
        field: FlowField::EmissionsUnit,
        side: Side::Output,
        keys: &[
            "output_emissionsUnit",
            "output_outputEmissionsUnit",
            "outputEmissionsUnit",
        ],
    },
    FieldAliases {
        field: FlowField::MaterialLoss,
        side: Side::Output,
        keys: &[
            "output_materialLoss",
            "output_outputMaterialLoss",
            "outputMaterialLoss",
        ],
    },
    FieldAliases {
        field: FlowField::QualityChange,
        side: Side::Output,
        keys: &[
            "output_qualityChange",
            "output_outputQualityChange",
            "outputQualityChange",
        ],
    },
];

/// Candidate keys for a field, in lookup order
pub fn aliases(field: FlowField, side: Side) -> &'static [&'static str] {
    let side = if field.is_process_level() {
        Side::Input
    } else {
        side
    };
    ALIASES
        .iter()
        .find(|entry| entry.field == field && entry.side == side)
        .map(|entry| entry.keys)
        .unwrap_or(&[])
}

/// First non-empty value among the field's candidate keys
pub fn lookup(statement: &Statement, field: FlowField, side: Side) -> Option<&str> {
    aliases(field, side)
        .iter()
        .find_map(|key| statement.property_value(key))
}

pub fn lookup_process(statement: &Statement, field: FlowField) -> Option<&str> {
    lookup(statement, field, Side::Input)
}

pub fn is_known_key(key: &str) -> bool {
    ALIASES.iter().any(|entry| entry.keys.contains(&key))
}

/// User-defined properties, partitioned by namespace prefix
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CustomProperties {
    pub input: IndexMap<String, String>,
    pub output: IndexMap<String, String>,
}

/// Collects every property that is not part of the alias table.
///
/// Un-prefixed keys land on the input side; the first occurrence of a key wins.
pub fn custom_properties(statement: &Statement) -> CustomProperties {
    let mut custom = CustomProperties::default();

    for property in &statement.properties {
        if is_known_key(&property.key) {
            continue;
        }
        let Some(value) = property.values.first() else {
            continue;
        };

        let (map, key) = if let Some(stripped) = property.key.strip_prefix(Side::Output.prefix()) {
            (&mut custom.output, stripped)
        } else if let Some(stripped) = property.key.strip_prefix(Side::Input.prefix()) {
            (&mut custom.input, stripped)
        } else {
            (&mut custom.input, property.key.as_str())
        };

        if key.is_empty() {
            continue;
        }
        map.entry(key.to_string())
            .or_insert_with(|| value.value.clone());
    }

    custom
}

pub fn is_truthy(s: &str) -> bool {
    let trimmed_lowercase = s.trim().to_lowercase();
    matches!(trimmed_lowercase.as_str(), "true" | "y" | "yes" | "1")
}

/// Parses a finite number, rejecting NaN and infinities
pub fn parse_number(s: &str) -> Option<f64> {
    s.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

fn fold_token(s: &str) -> String {
    s.chars()
        .filter(|c| !matches!(c, '_' | '-' | ' '))
        .flat_map(|c| c.to_lowercase())
        .collect()
}

/// Matches `PRIMARY_INPUT`, `primary_input`, `primary-input` and
/// `primaryInput` against an enum's canonical names
pub fn parse_token<E>(s: &str) -> Option<E>
where
    E: IntoEnumIterator + AsRef<str>,
{
    let wanted = fold_token(s);
    if wanted.is_empty() {
        return None;
    }
    E::iter().find(|variant| fold_token(variant.as_ref()) == wanted)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_namespaced_key_wins_over_legacy_keys() {
        let statement = Statement::new("a", "flowsTo", "b")
            .with_property("inputQuantity", "5")
            .with_property("input_inputQuantity", "7")
            .with_property("input_quantity", "9");

        assert_eq!(lookup(&statement, FlowField::Quantity, Side::Input), Some("9"));
    }

    #[test]
    fn test_falls_back_through_alias_chain() {
        let double = Statement::new("a", "flowsTo", "b")
            .with_property("inputQuantity", "5")
            .with_property("input_inputQuantity", "7");
        assert_eq!(lookup(&double, FlowField::Quantity, Side::Input), Some("7"));

        let flat = Statement::new("a", "flowsTo", "b")
            .with_property("input_quantity", " ")
            .with_property("inputQuantity", "5");
        assert_eq!(lookup(&flat, FlowField::Quantity, Side::Input), Some("5"));
    }

    #[test]
    fn test_sides_do_not_leak() {
        let statement = Statement::new("a", "flowsTo", "b").with_property("output_unit", "t");
        assert_eq!(lookup(&statement, FlowField::Unit, Side::Input), None);
        assert_eq!(lookup(&statement, FlowField::Unit, Side::Output), Some("t"));
    }

    #[test]
    fn test_process_fields_ignore_side() {
        let statement =
            Statement::new("a", "flowsTo", "b").with_property("output_processName", "Milling");
        assert_eq!(
            lookup(&statement, FlowField::ProcessName, Side::Output),
            Some("Milling")
        );
        assert_eq!(
            lookup_process(&statement, FlowField::ProcessName),
            Some("Milling")
        );
    }

    #[test]
    fn test_every_field_has_input_or_output_aliases() {
        let fields = [
            FlowField::ProcessName,
            FlowField::ProcessCategory,
            FlowField::FlowCategory,
            FlowField::Notes,
            FlowField::IsCircular,
            FlowField::Quantity,
            FlowField::Unit,
            FlowField::LifecycleStage,
            FlowField::IsReused,
            FlowField::IsRecycling,
            FlowField::CategoryCode,
            FlowField::Emissions,
            FlowField::EmissionsUnit,
            FlowField::MaterialLoss,
            FlowField::QualityChange,
        ];
        for field in fields {
            assert!(
                !aliases(field, Side::Input).is_empty() || !aliases(field, Side::Output).is_empty(),
                "{:?} has no aliases",
                field
            );
        }
    }

    #[test]
    fn test_custom_properties_are_partitioned() {
        let statement = Statement::new("a", "flowsTo", "b")
            .with_property("input_quantity", "10")
            .with_property("input_supplier", "Sawmill Nord")
            .with_property("output_grade", "C24")
            .with_property("batch", "2024-17")
            .with_property("output_grade", "C16");

        let custom = custom_properties(&statement);
        assert_eq!(custom.input.get("supplier").map(String::as_str), Some("Sawmill Nord"));
        assert_eq!(custom.input.get("batch").map(String::as_str), Some("2024-17"));
        assert_eq!(custom.output.get("grade").map(String::as_str), Some("C24"));
        assert!(!custom.input.contains_key("quantity"));
        assert_eq!(custom.input.len(), 2);
        assert_eq!(custom.output.len(), 1);
    }

    #[test]
    fn test_parse_number_rejects_non_finite() {
        assert_eq!(parse_number(" 12.5 "), Some(12.5));
        assert_eq!(parse_number("NaN"), None);
        assert_eq!(parse_number("inf"), None);
        assert_eq!(parse_number("twelve"), None);
    }

    #[test]
    fn test_is_truthy() {
        assert!(is_truthy("Yes"));
        assert!(is_truthy(" true "));
        assert!(is_truthy("1"));
        assert!(!is_truthy("no"));
        assert!(!is_truthy(""));
    }
}
