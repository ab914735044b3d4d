//! Record kind: string-keyed dictionaries with an optional key schema.
//!
//! The value schema always lands in `additionalProperties`. The key schema
//! is encoded per dialect:
//! - JSON Schema targets: `propertyNames`, with the key's `type` dropped
//!   (keys are always strings) and omitted entirely when nothing is left.
//! - OpenAPI 3 has no `propertyNames`. An enum key becomes one `properties`
//!   entry per value, each a pointer to this record's `additionalProperties`;
//!   other key constraints cannot be expressed and are dropped.

use serde_json::{Map, Value};

use super::typed;
use crate::dialect::Fragment;
use crate::dispatcher::Converter;
use crate::error::ConvertError;
use crate::graph::{NodeId, NodeKind};

pub(super) fn record(
    cx: &mut Converter<'_>,
    key: Option<NodeId>,
    value: NodeId,
) -> Result<Fragment, ConvertError> {
    let mut fragment = typed("object");
    let value_fragment = cx.convert_child(value, &["additionalProperties"])?;
    fragment.insert("additionalProperties".to_string(), Value::Object(value_fragment));

    let Some(key) = key else {
        return Ok(fragment);
    };

    if !cx.dialect().supports_property_names() {
        let key_node = cx.graph().node(key, cx.path())?;
        match &key_node.kind {
            NodeKind::Enum { values } => {
                let pointer = cx.pointer_here(&["additionalProperties"]);
                let properties: Map<String, Value> = values
                    .iter()
                    .map(|v| (v.clone(), serde_json::json!({ "$ref": pointer })))
                    .collect();
                fragment.insert("properties".to_string(), Value::Object(properties));
            }
            other => {
                tracing::debug!(
                    key_kind = other.name(),
                    path = %cx.path(),
                    "record key constraint has no encoding for this target; dropped"
                );
            }
        }
        return Ok(fragment);
    }

    let mut key_fragment = cx.convert_child(key, &["propertyNames"])?;
    key_fragment.remove("type");
    if !key_fragment.is_empty() {
        fragment.insert("propertyNames".to_string(), Value::Object(key_fragment));
    }
    Ok(fragment)
}

#[cfg(test)]
mod tests {
    use crate::config::{DialectConfig, Target};
    use crate::graph::{NodeKind, SchemaGraph, StringChecks, StringFormat};
    use crate::convert;
    use pretty_assertions::assert_eq;
    use serde_json::{json, Value};

    fn config(target: Target) -> DialectConfig {
        DialectConfig {
            emit_schema_uri: false,
            ..DialectConfig::for_target(target)
        }
    }

    #[test]
    fn test_simple_record() {
        let mut graph = SchemaGraph::new();
        let n = graph.number();
        let root = graph.record(None, n);
        let doc = convert(&graph, root, &config(Target::JsonSchema7)).unwrap();
        assert_eq!(
            Value::Object(doc.schema().clone()),
            json!({"type": "object", "additionalProperties": {"type": "number"}})
        );
    }

    #[test]
    fn test_key_schema_becomes_property_names() {
        let mut graph = SchemaGraph::new();
        let uuid = graph.add(NodeKind::String(StringChecks {
            format: Some(StringFormat::Uuid),
            ..StringChecks::default()
        }));
        let n = graph.number();
        let root = graph.record(Some(uuid), n);
        let doc = convert(&graph, root, &config(Target::JsonSchema7)).unwrap();
        assert_eq!(
            Value::Object(doc.schema().clone()),
            json!({
                "type": "object",
                "additionalProperties": {"type": "number"},
                "propertyNames": {"format": "uuid"}
            })
        );
    }

    #[test]
    fn test_plain_string_key_adds_nothing() {
        let mut graph = SchemaGraph::new();
        let s = graph.string();
        let n = graph.number();
        let root = graph.record(Some(s), n);
        let doc = convert(&graph, root, &config(Target::JsonSchema7)).unwrap();
        assert!(doc.schema().get("propertyNames").is_none());
    }

    #[test]
    fn test_enum_key_default_dialect() {
        let mut graph = SchemaGraph::new();
        let keys = graph.enumeration(["foo", "bar"]);
        let n = graph.number();
        let root = graph.record(Some(keys), n);
        let doc = convert(&graph, root, &config(Target::JsonSchema7)).unwrap();
        assert_eq!(
            Value::Object(doc.schema().clone()),
            json!({
                "type": "object",
                "additionalProperties": {"type": "number"},
                "propertyNames": {"enum": ["foo", "bar"]}
            })
        );
    }

    #[test]
    fn test_enum_key_openapi() {
        let mut graph = SchemaGraph::new();
        let keys = graph.enumeration(["foo", "bar"]);
        let n = graph.number();
        let root = graph.record(Some(keys), n);
        let doc = convert(&graph, root, &config(Target::OpenApi3)).unwrap();
        assert_eq!(
            Value::Object(doc.schema().clone()),
            json!({
                "type": "object",
                "additionalProperties": {"type": "number"},
                "properties": {
                    "foo": {"$ref": "#/additionalProperties"},
                    "bar": {"$ref": "#/additionalProperties"}
                }
            })
        );
    }

    #[test]
    fn test_non_enum_key_openapi_is_dropped() {
        let mut graph = SchemaGraph::new();
        let uuid = graph.add(NodeKind::String(StringChecks {
            format: Some(StringFormat::Uuid),
            ..StringChecks::default()
        }));
        let n = graph.number();
        let root = graph.record(Some(uuid), n);
        let doc = convert(&graph, root, &config(Target::OpenApi3)).unwrap();
        assert_eq!(
            Value::Object(doc.schema().clone()),
            json!({"type": "object", "additionalProperties": {"type": "number"}})
        );
    }
}
