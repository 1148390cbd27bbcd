//! Tool registry: descriptor registration, argument validation, and
//! timeout-bound handler dispatch.
//!
//! Generalizes the teacher's per-tool `#[derive(Deserialize)]` argument
//! structs (`agent::tools::k8s_optimize::K8sOptimizeArgs` and siblings) into
//! one schema-driven coercion pass ahead of a single dynamic dispatch point,
//! per the "dynamic argument maps" redesign: the registry owns the JSON
//! boundary, handlers receive an already-validated [`serde_json::Value`].

use std::collections::BTreeMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use cp_protocol::{Schema, SchemaType, ToolDescriptor};
use serde_json::Value as JsonValue;
use tokio::sync::Mutex;

use crate::error::GatewayError;

pub type ToolHandler =
    Arc<dyn Fn(JsonValue) -> Pin<Box<dyn Future<Output = crate::error::Result<JsonValue>> + Send>> + Send + Sync>;

struct RegisteredTool {
    descriptor: ToolDescriptor,
    handler: ToolHandler,
}

#[derive(Debug, Clone, Default)]
pub struct ToolCallCounters {
    pub calls: u64,
    pub successes: u64,
    pub failures: u64,
    pub total_duration: Duration,
}

struct Counters {
    calls: AtomicU64,
    successes: AtomicU64,
    failures: AtomicU64,
    total_duration_micros: AtomicU64,
}

impl Default for Counters {
    fn default() -> Self {
        Counters {
            calls: AtomicU64::new(0),
            successes: AtomicU64::new(0),
            failures: AtomicU64::new(0),
            total_duration_micros: AtomicU64::new(0),
        }
    }
}

pub struct ToolRegistry {
    tools: Mutex<BTreeMap<String, RegisteredTool>>,
    counters: Mutex<BTreeMap<String, Counters>>,
    request_timeout: Duration,
}

impl ToolRegistry {
    pub fn new(request_timeout: Duration) -> Self {
        ToolRegistry {
            tools: Mutex::new(BTreeMap::new()),
            counters: Mutex::new(BTreeMap::new()),
            request_timeout,
        }
    }

    pub async fn register(&self, descriptor: ToolDescriptor, handler: ToolHandler) -> crate::error::Result<()> {
        let mut tools = self.tools.lock().await;
        if tools.contains_key(&descriptor.name) {
            return Err(GatewayError::InvalidArgument(format!(
                "tool '{}' is already registered",
                descriptor.name
            )));
        }
        let name = descriptor.name.clone();
        tools.insert(name.clone(), RegisteredTool { descriptor, handler });
        self.counters.lock().await.insert(name, Counters::default());
        Ok(())
    }

    pub async fn list(&self) -> Vec<ToolDescriptor> {
        self.tools.lock().await.values().map(|t| t.descriptor.clone()).collect()
    }

    pub async fn counters(&self, name: &str) -> Option<ToolCallCounters> {
        let counters = self.counters.lock().await;
        counters.get(name).map(|c| ToolCallCounters {
            calls: c.calls.load(Ordering::Relaxed),
            successes: c.successes.load(Ordering::Relaxed),
            failures: c.failures.load(Ordering::Relaxed),
            total_duration: Duration::from_micros(c.total_duration_micros.load(Ordering::Relaxed)),
        })
    }

    /// Looks up `name`, validates/coerces `arguments` against its schema,
    /// and dispatches to the handler bound to the registry's request
    /// timeout. Records {name, duration, outcome} regardless of outcome.
    pub async fn call(&self, name: &str, arguments: JsonValue) -> crate::error::Result<JsonValue> {
        let (schema, handler) = {
            let tools = self.tools.lock().await;
            let tool = tools.get(name).ok_or_else(|| GatewayError::UnknownTool(name.to_string()))?;
            (tool.descriptor.input_schema.clone(), tool.handler.clone())
        };

        let coerced = coerce(&schema, arguments)?;

        let started = Instant::now();
        let result = tokio::time::timeout(self.request_timeout, handler(coerced)).await;
        let elapsed = started.elapsed();

        let outcome = matches!(&result, Ok(Ok(_)));
        self.record(name, elapsed, outcome).await;

        match result {
            Ok(inner) => inner,
            Err(_) => Err(GatewayError::DeadlineExceeded),
        }
    }

    async fn record(&self, name: &str, elapsed: Duration, success: bool) {
        let counters = self.counters.lock().await;
        if let Some(c) = counters.get(name) {
            c.calls.fetch_add(1, Ordering::Relaxed);
            if success {
                c.successes.fetch_add(1, Ordering::Relaxed);
            } else {
                c.failures.fetch_add(1, Ordering::Relaxed);
            }
            c.total_duration_micros.fetch_add(elapsed.as_micros() as u64, Ordering::Relaxed);
        }
    }
}

/// Coerces and validates a raw argument value against `schema`: numeric
/// widening/narrowing, boolean from `{true, "true"}`, default substitution,
/// then `required`/`enum`/`minimum`/`maximum` checks.
fn coerce(schema: &Schema, value: JsonValue) -> crate::error::Result<JsonValue> {
    match schema.schema_type {
        SchemaType::Object => coerce_object(schema, value),
        SchemaType::Array => coerce_array(schema, value),
        SchemaType::String => coerce_scalar(schema, value, coerce_string),
        SchemaType::Number => coerce_scalar(schema, value, coerce_number),
        SchemaType::Integer => coerce_scalar(schema, value, coerce_integer),
        SchemaType::Boolean => coerce_scalar(schema, value, coerce_boolean),
    }
}

fn coerce_object(schema: &Schema, value: JsonValue) -> crate::error::Result<JsonValue> {
    let mut object = match value {
        JsonValue::Object(map) => map,
        JsonValue::Null => serde_json::Map::new(),
        other => return Err(GatewayError::InvalidArgument(format!("expected object, got {other}"))),
    };

    for (key, prop_schema) in &schema.properties {
        let raw = object.get(key).cloned().or_else(|| prop_schema.default.clone());
        match raw {
            Some(v) => {
                let coerced = coerce(prop_schema, v)?;
                object.insert(key.clone(), coerced);
            }
            None => {
                if schema.required.contains(key) {
                    return Err(GatewayError::InvalidArgument(format!("missing required argument '{key}'")));
                }
            }
        }
    }

    Ok(JsonValue::Object(object))
}

fn coerce_array(schema: &Schema, value: JsonValue) -> crate::error::Result<JsonValue> {
    let items = match value {
        JsonValue::Array(items) => items,
        other => return Err(GatewayError::InvalidArgument(format!("expected array, got {other}"))),
    };
    let item_schema = schema.items.as_deref();
    let coerced = items
        .into_iter()
        .map(|item| match item_schema {
            Some(s) => coerce(s, item),
            None => Ok(item),
        })
        .collect::<crate::error::Result<Vec<_>>>()?;
    Ok(JsonValue::Array(coerced))
}

fn coerce_scalar(
    schema: &Schema,
    value: JsonValue,
    convert: fn(JsonValue) -> crate::error::Result<JsonValue>,
) -> crate::error::Result<JsonValue> {
    let value = convert(value)?;
    check_enum(schema, &value)?;
    check_range(schema, &value)?;
    Ok(value)
}

fn coerce_string(value: JsonValue) -> crate::error::Result<JsonValue> {
    match value {
        JsonValue::String(_) => Ok(value),
        other => Err(GatewayError::InvalidArgument(format!("expected string, got {other}"))),
    }
}

fn coerce_number(value: JsonValue) -> crate::error::Result<JsonValue> {
    match value {
        JsonValue::Number(_) => Ok(value),
        JsonValue::String(s) => s
            .parse::<f64>()
            .ok()
            .and_then(serde_json::Number::from_f64)
            .map(JsonValue::Number)
            .ok_or_else(|| GatewayError::InvalidArgument(format!("'{s}' is not a number"))),
        other => Err(GatewayError::InvalidArgument(format!("expected number, got {other}"))),
    }
}

fn coerce_integer(value: JsonValue) -> crate::error::Result<JsonValue> {
    match value {
        JsonValue::Number(n) if n.is_i64() || n.is_u64() => Ok(JsonValue::Number(n)),
        JsonValue::Number(n) => n
            .as_f64()
            .filter(|f| f.fract() == 0.0)
            .map(|f| JsonValue::Number(serde_json::Number::from(f as i64)))
            .ok_or_else(|| GatewayError::InvalidArgument(format!("{n} is not an integer"))),
        JsonValue::String(s) => s
            .parse::<i64>()
            .map(|n| JsonValue::Number(serde_json::Number::from(n)))
            .map_err(|_| GatewayError::InvalidArgument(format!("'{s}' is not an integer"))),
        other => Err(GatewayError::InvalidArgument(format!("expected integer, got {other}"))),
    }
}

fn coerce_boolean(value: JsonValue) -> crate::error::Result<JsonValue> {
    match value {
        JsonValue::Bool(_) => Ok(value),
        JsonValue::String(s) if s == "true" => Ok(JsonValue::Bool(true)),
        JsonValue::String(s) if s == "false" => Ok(JsonValue::Bool(false)),
        other => Err(GatewayError::InvalidArgument(format!("expected boolean, got {other}"))),
    }
}

fn check_enum(schema: &Schema, value: &JsonValue) -> crate::error::Result<()> {
    if let Some(allowed) = &schema.enum_values
        && !allowed.contains(value)
    {
        return Err(GatewayError::InvalidArgument(format!("{value} is not one of the allowed values")));
    }
    Ok(())
}

fn check_range(schema: &Schema, value: &JsonValue) -> crate::error::Result<()> {
    let Some(n) = value.as_f64() else { return Ok(()) };
    if let Some(min) = schema.minimum
        && n < min
    {
        return Err(GatewayError::InvalidArgument(format!("{n} is below the minimum of {min}")));
    }
    if let Some(max) = schema.maximum
        && n > max
    {
        return Err(GatewayError::InvalidArgument(format!("{n} is above the maximum of {max}")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_schema() -> Schema {
        Schema::object(
            [
                ("namespace".to_string(), Schema::string()),
                ("limit".to_string(), Schema::integer().with_range(Some(1.0), Some(100.0)).with_default(json!(10))),
                ("confirm".to_string(), Schema::boolean()),
                (
                    "severity".to_string(),
                    Schema::string().with_enum(vec![json!("low"), json!("high")]),
                ),
            ],
            vec!["namespace"],
        )
    }

    #[tokio::test]
    async fn registering_duplicate_tool_names_is_rejected() {
        let registry = ToolRegistry::new(Duration::from_secs(1));
        let descriptor = ToolDescriptor::new("cluster-health", "desc", Schema::object([], vec![]));
        let handler: ToolHandler = Arc::new(|_| Box::pin(async { Ok(json!({})) }));
        registry.register(descriptor.clone(), handler.clone()).await.unwrap();
        let result = registry.register(descriptor, handler).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn unknown_tool_name_is_refused() {
        let registry = ToolRegistry::new(Duration::from_secs(1));
        let result = registry.call("does-not-exist", json!({})).await;
        assert!(matches!(result, Err(GatewayError::UnknownTool(_))));
    }

    #[test]
    fn missing_required_argument_is_rejected() {
        let schema = sample_schema();
        let result = coerce(&schema, json!({}));
        assert!(result.is_err());
    }

    #[test]
    fn defaults_and_coercions_apply() {
        let schema = sample_schema();
        let result = coerce(&schema, json!({"namespace": "payments", "confirm": "true", "severity": "low"})).unwrap();
        assert_eq!(result["limit"], json!(10));
        assert_eq!(result["confirm"], json!(true));
    }

    #[test]
    fn out_of_range_integer_is_rejected() {
        let schema = sample_schema();
        let result = coerce(&schema, json!({"namespace": "payments", "limit": 500}));
        assert!(result.is_err());
    }

    #[test]
    fn value_outside_enum_is_rejected() {
        let schema = sample_schema();
        let result = coerce(&schema, json!({"namespace": "payments", "severity": "medium"}));
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn successful_call_records_counters() {
        let registry = ToolRegistry::new(Duration::from_secs(1));
        let descriptor = ToolDescriptor::new(
            "echo",
            "desc",
            Schema::object([("value".to_string(), Schema::string())], vec!["value"]),
        );
        let handler: ToolHandler = Arc::new(|args| Box::pin(async move { Ok(args) }));
        registry.register(descriptor, handler).await.unwrap();
        registry.call("echo", json!({"value": "hi"})).await.unwrap();
        let counters = registry.counters("echo").await.unwrap();
        assert_eq!(counters.calls, 1);
        assert_eq!(counters.successes, 1);
    }

    #[tokio::test]
    async fn timed_out_handler_surfaces_deadline_exceeded() {
        let registry = ToolRegistry::new(Duration::from_millis(10));
        let descriptor = ToolDescriptor::new("slow", "desc", Schema::object([], vec![]));
        let handler: ToolHandler = Arc::new(|_| {
            Box::pin(async move {
                tokio::time::sleep(Duration::from_millis(100)).await;
                Ok(json!({}))
            })
        });
        registry.register(descriptor, handler).await.unwrap();
        let result = registry.call("slow", json!({})).await;
        assert!(matches!(result, Err(GatewayError::DeadlineExceeded)));
    }
}
