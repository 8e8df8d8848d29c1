use serde::{Deserialize, Serialize};

/// A raw statement as delivered by the statement store
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Statement {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub subject: String,
    #[serde(default)]
    pub predicate: String,
    pub object: String,
    #[serde(default)]
    pub properties: Vec<Property>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Property {
    pub key: String,
    #[serde(default)]
    pub values: Vec<PropertyValue>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct PropertyValue {
    pub value: String,
}

/// An entity referenced by a statement's subject or object
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Entity {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Statement {
    pub fn new(subject: &str, predicate: &str, object: &str) -> Self {
        Self {
            id: None,
            subject: subject.to_string(),
            predicate: predicate.to_string(),
            object: object.to_string(),
            properties: Vec::new(),
        }
    }

    pub fn with_id(mut self, id: &str) -> Self {
        self.id = Some(id.to_string());
        self
    }

    pub fn with_property(mut self, key: &str, value: &str) -> Self {
        self.properties.push(Property {
            key: key.to_string(),
            values: vec![PropertyValue {
                value: value.to_string(),
            }],
        });
        self
    }

    /// First non-empty value stored under `key`, trimmed
    pub fn property_value(&self, key: &str) -> Option<&str> {
        self.properties
            .iter()
            .filter(|p| p.key == key)
            .flat_map(|p| p.values.iter())
            .map(|v| v.value.trim())
            .find(|v| !v.is_empty())
    }

    /// Label used in diagnostics: the statement id, or its position in the input
    pub fn reference(&self, position: usize) -> String {
        match &self.id {
            Some(id) => id.clone(),
            None => format!("#{}", position),
        }
    }
}

impl Entity {
    pub fn new(id: &str, name: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            description: None,
        }
    }
}
