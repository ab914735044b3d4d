//! Array-shaped kinds: arrays, sets, tuples and key/value maps.

use serde_json::Value;

use super::typed;
use crate::dialect::Fragment;
use crate::dispatcher::Converter;
use crate::error::ConvertError;
use crate::graph::NodeId;

pub(super) fn array(
    cx: &mut Converter<'_>,
    items: NodeId,
    min_items: Option<u64>,
    max_items: Option<u64>,
) -> Result<Fragment, ConvertError> {
    let mut fragment = typed("array");
    let item_fragment = cx.convert_child(items, &["items"])?;
    // `{}` items constrain nothing.
    if !item_fragment.is_empty() {
        fragment.insert("items".to_string(), Value::Object(item_fragment));
    }
    if let Some(min) = min_items {
        fragment.insert("minItems".to_string(), Value::from(min));
    }
    if let Some(max) = max_items {
        fragment.insert("maxItems".to_string(), Value::from(max));
    }
    Ok(fragment)
}

pub(super) fn set(cx: &mut Converter<'_>, items: NodeId) -> Result<Fragment, ConvertError> {
    let mut fragment = array(cx, items, None, None)?;
    fragment.insert("uniqueItems".to_string(), Value::Bool(true));
    Ok(fragment)
}

pub(super) fn tuple(
    cx: &mut Converter<'_>,
    items: &[NodeId],
    rest: Option<NodeId>,
) -> Result<Fragment, ConvertError> {
    let mut fragment = typed("array");
    fragment.insert("minItems".to_string(), Value::from(items.len()));

    if cx.dialect().supports_tuple_items() {
        let positional = positional_items(cx, &["items"], items)?;
        fragment.insert("items".to_string(), Value::Array(positional));
        match rest {
            Some(rest) => {
                let rest_fragment = cx.convert_child(rest, &["additionalItems"])?;
                fragment.insert("additionalItems".to_string(), Value::Object(rest_fragment));
            }
            None => {
                fragment.insert("maxItems".to_string(), Value::from(items.len()));
            }
        }
        return Ok(fragment);
    }

    // No positional items: every element must match one of the members.
    let mut members = items.to_vec();
    if let Some(rest) = rest {
        members.push(rest);
    } else {
        fragment.insert("maxItems".to_string(), Value::from(items.len()));
    }
    if !members.is_empty() {
        let any_of = positional_items(cx, &["items", "anyOf"], &members)?;
        let mut items_fragment = Fragment::new();
        items_fragment.insert("anyOf".to_string(), Value::Array(any_of));
        fragment.insert("items".to_string(), Value::Object(items_fragment));
    }
    Ok(fragment)
}

/// `[key, value]` entry pairs.
pub(super) fn map(cx: &mut Converter<'_>, key: NodeId, value: NodeId) -> Result<Fragment, ConvertError> {
    let mut entry = typed("array");
    entry.insert("minItems".to_string(), Value::from(2));
    entry.insert("maxItems".to_string(), Value::from(2));

    let members = [key, value];
    if cx.dialect().supports_tuple_items() {
        let positional = positional_items(cx, &["items", "items"], &members)?;
        entry.insert("items".to_string(), Value::Array(positional));
    } else {
        let any_of = positional_items(cx, &["items", "items", "anyOf"], &members)?;
        let mut items_fragment = Fragment::new();
        items_fragment.insert("anyOf".to_string(), Value::Array(any_of));
        entry.insert("items".to_string(), Value::Object(items_fragment));
    }

    let mut fragment = typed("array");
    fragment.insert("items".to_string(), Value::Object(entry));
    Ok(fragment)
}

/// Convert `members` at `prefix/0`, `prefix/1`, ...
fn positional_items(
    cx: &mut Converter<'_>,
    prefix: &[&str],
    members: &[NodeId],
) -> Result<Vec<Value>, ConvertError> {
    let mut converted = Vec::with_capacity(members.len());
    for (i, member) in members.iter().enumerate() {
        let index = i.to_string();
        let mut segments = prefix.to_vec();
        segments.push(&index);
        converted.push(Value::Object(cx.convert_child(*member, &segments)?));
    }
    Ok(converted)
}
