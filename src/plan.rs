use serde::{Deserialize, Serialize};

use crate::flow::FlowOptions;

/// ## Structure
/// Data structures for the plan file.
///
/// ```text
/// Plan
///   ├── meta: Option<Meta>
///   │   └── name: Option<String>
///   ├── import: ImportConfig
///   │   ├── statements: String
///   │   ├── entities: String
///   │   └── focus: Option<Vec<String>>
///   ├── pipeline: FlowOptions
///   │   ├── placeholder_process_names: Vec<String>
///   │   └── label_id_length: usize
///   └── export: ExportProfile
///       └── profiles: Vec<ExportProfileItem>
///           ├── filename: String
///           └── exporter: ExportFileType
///               ├── JSON
///               ├── CSVNodes
///               └── CSVEdges
/// ```
///
/// Relative paths are resolved against the directory holding the plan.

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct Meta {
    pub name: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Plan {
    pub meta: Option<Meta>,
    pub import: ImportConfig,
    #[serde(default)]
    pub pipeline: FlowOptions,
    #[serde(default)]
    pub export: ExportProfile,
}

impl Default for Plan {
    fn default() -> Self {
        Self {
            meta: Some(Meta {
                name: Some("Material flows".to_string()),
            }),
            import: ImportConfig::default(),
            pipeline: FlowOptions::default(),
            export: ExportProfile {
                profiles: vec![
                    ExportProfileItem {
                        filename: "out/flows.json".to_string(),
                        exporter: ExportFileType::JSON,
                    },
                    ExportProfileItem {
                        filename: "out/nodes.csv".to_string(),
                        exporter: ExportFileType::CSVNodes,
                    },
                    ExportProfileItem {
                        filename: "out/edges.csv".to_string(),
                        exporter: ExportFileType::CSVEdges,
                    },
                ],
            },
        }
    }
}

impl Plan {
    pub fn name(&self) -> &str {
        self.meta
            .as_ref()
            .and_then(|meta| meta.name.as_deref())
            .unwrap_or("Unnamed plan")
    }
}

//
// Import configuration
//

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ImportConfig {
    /// JSON array of statements
    pub statements: String,
    /// JSON array of entities
    pub entities: String,
    /// When set, only statements touching these entity ids are fetched
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub focus: Option<Vec<String>>,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            statements: "statements.json".to_string(),
            entities: "entities.json".to_string(),
            focus: None,
        }
    }
}

//
// Export configuration
//

#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct ExportProfile {
    pub profiles: Vec<ExportProfileItem>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ExportProfileItem {
    pub filename: String,
    pub exporter: ExportFileType,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFileType {
    JSON,
    CSVNodes,
    CSVEdges,
}
