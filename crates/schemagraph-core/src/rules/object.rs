//! Object kind: declared properties plus the unknown-key policy.

use serde_json::{Map, Value};

use super::typed;
use crate::dialect::Fragment;
use crate::dispatcher::Converter;
use crate::error::ConvertError;
use crate::graph::{NodeId, UnknownKeys};

pub(super) fn object(
    cx: &mut Converter<'_>,
    properties: &[(String, NodeId)],
    unknown_keys: UnknownKeys,
    catchall: Option<NodeId>,
) -> Result<Fragment, ConvertError> {
    let graph = cx.graph();
    let mut converted = Map::new();
    let mut required = Vec::new();

    for (name, child) in properties {
        let fragment = cx.convert_child(*child, &["properties", name.as_str()])?;
        if !graph.is_optional(*child) && !converted.contains_key(name) {
            required.push(Value::String(name.clone()));
        }
        converted.insert(name.clone(), Value::Object(fragment));
    }

    let mut fragment = typed("object");
    fragment.insert("properties".to_string(), Value::Object(converted));
    if !required.is_empty() {
        fragment.insert("required".to_string(), Value::Array(required));
    }

    let additional = match catchall {
        Some(catchall) => Value::Object(cx.convert_child(catchall, &["additionalProperties"])?),
        None => Value::Bool(unknown_keys == UnknownKeys::Passthrough),
    };
    fragment.insert("additionalProperties".to_string(), additional);
    Ok(fragment)
}
