//! Structural schema description for tool input validation.
//!
//! Generalizes the per-tool `#[derive(Deserialize)]` argument structs seen
//! throughout the teacher's `agent/tools/*.rs` handlers (e.g.
//! `K8sOptimizeArgs`) into one recursive, data-driven description, per the
//! "dynamic argument maps" redesign note: keep one dynamic-map parse at the
//! boundary rather than hand-rolling a struct per tool.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;

/// The JSON type tag of a schema node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemaType {
    Object,
    String,
    Number,
    Integer,
    Boolean,
    Array,
}

/// A recursive structural schema describing a tool's input or a nested
/// property within it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    #[serde(rename = "type")]
    pub schema_type: SchemaType,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: BTreeMap<String, Schema>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub required: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<Schema>>,

    #[serde(rename = "enum", default, skip_serializing_if = "Option::is_none")]
    pub enum_values: Option<Vec<JsonValue>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<JsonValue>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimum: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maximum: Option<f64>,
}

impl Schema {
    fn bare(schema_type: SchemaType) -> Self {
        Self {
            schema_type,
            description: None,
            properties: BTreeMap::new(),
            required: Vec::new(),
            items: None,
            enum_values: None,
            default: None,
            minimum: None,
            maximum: None,
        }
    }

    /// Builds an object schema with the given properties and required list.
    pub fn object(properties: impl Into<BTreeMap<String, Schema>>, required: Vec<&str>) -> Self {
        Self {
            required: required.into_iter().map(str::to_string).collect(),
            ..Self::bare(SchemaType::Object).with_properties(properties.into())
        }
    }

    fn with_properties(mut self, properties: BTreeMap<String, Schema>) -> Self {
        self.properties = properties;
        self
    }

    pub fn string() -> Self {
        Self::bare(SchemaType::String)
    }

    pub fn number() -> Self {
        Self::bare(SchemaType::Number)
    }

    pub fn integer() -> Self {
        Self::bare(SchemaType::Integer)
    }

    pub fn boolean() -> Self {
        Self::bare(SchemaType::Boolean)
    }

    pub fn array(items: Schema) -> Self {
        Self {
            items: Some(Box::new(items)),
            ..Self::bare(SchemaType::Array)
        }
    }

    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_default(mut self, default: JsonValue) -> Self {
        self.default = Some(default);
        self
    }

    pub fn with_enum(mut self, values: Vec<JsonValue>) -> Self {
        self.enum_values = Some(values);
        self
    }

    pub fn with_range(mut self, minimum: Option<f64>, maximum: Option<f64>) -> Self {
        self.minimum = minimum;
        self.maximum = maximum;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn object_schema_serializes_with_type_tag() {
        let schema = Schema::object(
            [("namespace".to_string(), Schema::string().describe("target namespace"))],
            vec![],
        );
        let json = serde_json::to_value(&schema).unwrap();
        assert_eq!(json["type"], "object");
        assert_eq!(json["properties"]["namespace"]["type"], "string");
    }

    #[test]
    fn enum_values_round_trip() {
        let schema = Schema::string().with_enum(vec![JsonValue::from("low"), JsonValue::from("high")]);
        let json = serde_json::to_string(&schema).unwrap();
        let back: Schema = serde_json::from_str(&json).unwrap();
        assert_eq!(back.enum_values, schema.enum_values);
    }
}
