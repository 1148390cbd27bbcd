//! Resource registry: URI-addressable read-only snapshots.
//!
//! Mirrors the registration-by-key shape of [`super::tool::ToolRegistry`]
//! but for pull-based snapshots instead of invoked handlers; a disabled
//! backing integration still returns a well-formed envelope rather than an
//! error, tagged `source = "not-available"`.

use std::collections::BTreeMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use cp_protocol::ResourceDescriptor;
use serde_json::{json, Value as JsonValue};
use tokio::sync::Mutex;

use crate::error::GatewayError;

pub type ResourceReader =
    Arc<dyn Fn() -> Pin<Box<dyn Future<Output = crate::error::Result<(JsonValue, &'static str)>> + Send>> + Send + Sync>;

struct RegisteredResource {
    descriptor: ResourceDescriptor,
    reader: ResourceReader,
}

pub struct ResourceRegistry {
    resources: Mutex<BTreeMap<String, RegisteredResource>>,
}

impl Default for ResourceRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ResourceRegistry {
    pub fn new() -> Self {
        ResourceRegistry { resources: Mutex::new(BTreeMap::new()) }
    }

    pub async fn register(&self, descriptor: ResourceDescriptor, reader: ResourceReader) -> crate::error::Result<()> {
        let mut resources = self.resources.lock().await;
        if resources.contains_key(&descriptor.uri) {
            return Err(GatewayError::InvalidArgument(format!(
                "resource '{}' is already registered",
                descriptor.uri
            )));
        }
        resources.insert(descriptor.uri.clone(), RegisteredResource { descriptor, reader });
        Ok(())
    }

    pub async fn list(&self) -> Vec<ResourceDescriptor> {
        self.resources.lock().await.values().map(|r| r.descriptor.clone()).collect()
    }

    /// Reads `uri`, wrapping the reader's payload with a `timestamp` and
    /// `source` tag. Never propagates the reader's own failures as an error
    /// when the backing integration is merely disabled — that distinction
    /// is the reader's responsibility via its `source` return value.
    pub async fn read(&self, uri: &str) -> crate::error::Result<JsonValue> {
        let reader = {
            let resources = self.resources.lock().await;
            resources
                .get(uri)
                .map(|r| r.reader.clone())
                .ok_or_else(|| GatewayError::UnknownResource(uri.to_string()))?
        };

        let (payload, source) = reader().await?;
        Ok(json!({
            "timestamp": now_rfc3339(),
            "source": source,
            "data": payload,
        }))
    }
}

fn now_rfc3339() -> String {
    chrono::Utc::now().to_rfc3339()
}

/// Builds the well-formed empty snapshot returned when a backing
/// integration is disabled.
pub fn not_available() -> (JsonValue, &'static str) {
    (json!({}), "not-available")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor(uri: &str) -> ResourceDescriptor {
        ResourceDescriptor::new(uri, uri, "test resource")
    }

    #[tokio::test]
    async fn unknown_uri_is_refused() {
        let registry = ResourceRegistry::new();
        let result = registry.read("cluster://missing").await;
        assert!(matches!(result, Err(GatewayError::UnknownResource(_))));
    }

    #[tokio::test]
    async fn registering_duplicate_uri_is_rejected() {
        let registry = ResourceRegistry::new();
        let reader: ResourceReader = Arc::new(|| Box::pin(async { Ok(not_available()) }));
        registry.register(descriptor("cluster://health"), reader.clone()).await.unwrap();
        let result = registry.register(descriptor("cluster://health"), reader).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn disabled_backing_integration_returns_well_formed_empty_snapshot() {
        let registry = ResourceRegistry::new();
        let reader: ResourceReader = Arc::new(|| Box::pin(async { Ok(not_available()) }));
        registry.register(descriptor("cluster://incidents"), reader).await.unwrap();
        let snapshot = registry.read("cluster://incidents").await.unwrap();
        assert_eq!(snapshot["source"], "not-available");
        assert!(snapshot["timestamp"].is_string());
    }

    #[tokio::test]
    async fn enabled_backing_integration_tags_its_source() {
        let registry = ResourceRegistry::new();
        let reader: ResourceReader =
            Arc::new(|| Box::pin(async { Ok((json!({"nodes": 3}), "kubernetes-api")) }));
        registry.register(descriptor("cluster://nodes"), reader).await.unwrap();
        let snapshot = registry.read("cluster://nodes").await.unwrap();
        assert_eq!(snapshot["source"], "kubernetes-api");
        assert_eq!(snapshot["data"]["nodes"], 3);
    }
}
