//! Combinator kinds: unions, intersections, nullability and defaults.

use serde_json::Value;

use crate::dialect::Fragment;
use crate::dispatcher::Converter;
use crate::error::ConvertError;
use crate::graph::{NodeId, NodeKind};

/// Type names that can share one `type: [...]` list.
const PRIMITIVE_TYPES: &[&str] = &["string", "number", "integer", "boolean", "null"];

pub(super) fn union(cx: &mut Converter<'_>, options: &[NodeId]) -> Result<Fragment, ConvertError> {
    let graph = cx.graph();

    // OpenAPI 3 has no null type: a null branch sets `nullable` on the rest.
    let mut nullable = false;
    let mut branches: Vec<NodeId> = Vec::with_capacity(options.len());
    for &option in options {
        let is_null = matches!(graph.node(option, cx.path())?.kind, NodeKind::Null);
        if is_null && !cx.dialect().supports_type_arrays() {
            nullable = true;
        } else {
            branches.push(option);
        }
    }

    let fragment = match branches.as_slice() {
        [] if nullable => return cx.convert_child(options[0], &[]),
        [] => {
            let mut never = Fragment::new();
            never.insert("not".to_string(), Value::Object(Fragment::new()));
            never
        }
        [single] => cx.convert_child(*single, &[])?,
        many => {
            let mut converted = Vec::with_capacity(many.len());
            for (i, branch) in many.iter().enumerate() {
                let index = i.to_string();
                converted.push(cx.convert_child(*branch, &["anyOf", index.as_str()])?);
            }
            collapse(cx, converted)
        }
    };

    Ok(nullable_here(cx, fragment, nullable))
}

/// Merge branch fragments into one `type` list or one `enum` when every
/// branch is that simple, else emit them as `anyOf`.
fn collapse(cx: &Converter<'_>, branches: Vec<Fragment>) -> Fragment {
    let type_arrays = cx.dialect().supports_type_arrays();

    if type_arrays {
        if let Some(types) = bare_types(&branches) {
            let mut fragment = Fragment::new();
            fragment.insert("type".to_string(), type_value(types));
            return fragment;
        }
    }

    if let Some((types, values)) = literal_values(&branches) {
        if type_arrays || types.len() <= 1 {
            let mut fragment = Fragment::new();
            if !types.is_empty() {
                fragment.insert("type".to_string(), type_value(types));
            }
            fragment.insert("enum".to_string(), Value::Array(values));
            return fragment;
        }
    }

    let mut fragment = Fragment::new();
    fragment.insert(
        "anyOf".to_string(),
        Value::Array(branches.into_iter().map(Value::Object).collect()),
    );
    fragment
}

/// Distinct type names if every branch is exactly `{"type": <primitive>}`.
fn bare_types(branches: &[Fragment]) -> Option<Vec<String>> {
    let mut types: Vec<String> = Vec::new();
    for branch in branches {
        if branch.len() != 1 {
            return None;
        }
        let name = branch.get("type")?.as_str()?;
        if !PRIMITIVE_TYPES.contains(&name) {
            return None;
        }
        if !types.iter().any(|t| t == name) {
            types.push(name.to_string());
        }
    }
    Some(types)
}

/// Distinct primitive type names and all allowed values if every branch is
/// a single-valued literal (`const`, or a one-element `enum`).
fn literal_values(branches: &[Fragment]) -> Option<(Vec<String>, Vec<Value>)> {
    let mut types: Vec<String> = Vec::new();
    let mut values = Vec::with_capacity(branches.len());
    for branch in branches {
        let value = match (branch.get("const"), branch.get("enum")) {
            (Some(value), None) => value.clone(),
            (None, Some(Value::Array(single))) if single.len() == 1 => single[0].clone(),
            _ => return None,
        };
        match branch.get("type") {
            Some(Value::String(name)) if PRIMITIVE_TYPES.contains(&name.as_str()) => {
                if !types.iter().any(|t| t == name) {
                    types.push(name.clone());
                }
            }
            None => {}
            Some(_) => return None,
        }
        if branch.keys().any(|k| k != "type" && k != "const" && k != "enum") {
            return None;
        }
        values.push(value);
    }
    Some((types, values))
}

fn type_value(mut types: Vec<String>) -> Value {
    if types.len() == 1 {
        Value::String(types.remove(0))
    } else {
        Value::Array(types.into_iter().map(Value::String).collect())
    }
}

pub(super) fn intersection(
    cx: &mut Converter<'_>,
    left: NodeId,
    right: NodeId,
) -> Result<Fragment, ConvertError> {
    let left = cx.convert_child(left, &["allOf", "0"])?;
    let right = cx.convert_child(right, &["allOf", "1"])?;
    let mut fragment = Fragment::new();
    fragment.insert(
        "allOf".to_string(),
        Value::Array(vec![Value::Object(left), Value::Object(right)]),
    );
    Ok(fragment)
}

pub(super) fn nullable(cx: &mut Converter<'_>, inner: NodeId) -> Result<Fragment, ConvertError> {
    let fragment = cx.convert_child(inner, &[])?;
    Ok(nullable_here(cx, fragment, true))
}

/// `encode_nullable` for a fragment built at the current location. When the
/// encoding wraps the fragment one level down, pointers into it follow.
fn nullable_here(cx: &Converter<'_>, fragment: Fragment, is_nullable: bool) -> Fragment {
    if !is_nullable {
        return fragment;
    }
    let original = Value::Object(fragment.clone());
    let encoded = cx.dialect().encode_nullable(fragment, true);
    for wrapper in ["anyOf", "allOf"] {
        let wrapped = encoded
            .get(wrapper)
            .and_then(Value::as_array)
            .and_then(|members| members.first())
            .is_some_and(|first| *first == original);
        if wrapped {
            return cx.move_down(encoded, &[wrapper, "0"]);
        }
    }
    encoded
}

pub(super) fn with_default(
    cx: &mut Converter<'_>,
    inner: NodeId,
    value: &Value,
) -> Result<Fragment, ConvertError> {
    let fragment = cx.convert_child(inner, &[])?;
    Ok(cx.dialect().annotate(fragment, "default", value.clone()))
}
