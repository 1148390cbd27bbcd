//! Tool and resource metadata for the Context Protocol.
//!
//! Generalizes `Tool` from the teacher's AG-UI type library
//! (name/description/JSON-schema parameters) into the richer descriptor
//! shape this gateway's registries need: a structural [`Schema`] instead of
//! a bare [`serde_json::Value`], plus a resource counterpart.

use crate::schema::Schema;
use serde::{Deserialize, Serialize};

/// Describes a callable tool: its name, human description, and input schema.
///
/// Descriptors are immutable once registered; the invocation handle lives
/// alongside the descriptor in the gateway's tool registry, not here, since
/// this crate carries no async runtime dependency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDescriptor {
    /// Kebab-case, globally unique tool name (e.g. `cluster-health`).
    pub name: String,
    pub description: String,
    pub input_schema: Schema,
}

impl ToolDescriptor {
    pub fn new(name: impl Into<String>, description: impl Into<String>, input_schema: Schema) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            input_schema,
        }
    }
}

/// Describes a URI-addressable, read-only resource snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceDescriptor {
    /// URI of the form `cluster://<path>`.
    pub uri: String,
    pub name: String,
    pub description: String,
    pub mime_type: String,
}

impl ResourceDescriptor {
    pub fn new(
        uri: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            uri: uri.into(),
            name: name.into(),
            description: description.into(),
            mime_type: "application/json".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Schema;

    #[test]
    fn tool_descriptor_serializes_name_and_schema() {
        let descriptor = ToolDescriptor::new(
            "cluster-health",
            "Summarize cluster health",
            Schema::object([], vec![]),
        );
        let json = serde_json::to_value(&descriptor).unwrap();
        assert_eq!(json["name"], "cluster-health");
        assert!(!json["inputSchema"].is_null());
    }
}
