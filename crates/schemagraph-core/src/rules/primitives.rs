//! Leaf kinds: null, strings, numbers, literals, enums, dates.

use serde_json::{json, Value};

use super::typed;
use crate::dialect::{number_value, BoundSide, Fragment};
use crate::dispatcher::Converter;
use crate::graph::{NumberChecks, StringChecks, StringFormat};

/// Pattern for collision-resistant ids (cuid v1).
const CUID_PATTERN: &str = r"^c[^\s-]{8,}$";

pub(super) fn null(cx: &Converter<'_>) -> Fragment {
    if cx.dialect().supports_type_arrays() {
        typed("null")
    } else {
        // OpenAPI 3.0 has no null type.
        let mut fragment = Fragment::new();
        fragment.insert("enum".to_string(), json!([null]));
        fragment.insert("nullable".to_string(), Value::Bool(true));
        fragment
    }
}

pub(super) fn string(checks: &StringChecks) -> Fragment {
    let mut fragment = typed("string");
    if let Some(min) = checks.min_length {
        fragment.insert("minLength".to_string(), Value::from(min));
    }
    if let Some(max) = checks.max_length {
        fragment.insert("maxLength".to_string(), Value::from(max));
    }

    let mut patterns: Vec<&str> = Vec::new();
    match checks.format {
        Some(StringFormat::Cuid) => patterns.push(CUID_PATTERN),
        Some(format) => {
            fragment.insert("format".to_string(), Value::String(format_name(format).to_string()));
        }
        None => {}
    }
    patterns.extend(checks.patterns.iter().map(String::as_str));

    match patterns.as_slice() {
        [] => {}
        [single] => {
            fragment.insert("pattern".to_string(), Value::String(single.to_string()));
        }
        many => {
            let all_of = many.iter().map(|p| json!({ "pattern": p })).collect();
            fragment.insert("allOf".to_string(), Value::Array(all_of));
        }
    }
    fragment
}

fn format_name(format: StringFormat) -> &'static str {
    match format {
        StringFormat::Email => "email",
        StringFormat::Url => "uri",
        StringFormat::Uuid => "uuid",
        StringFormat::DateTime => "date-time",
        StringFormat::Date => "date",
        StringFormat::Time => "time",
        StringFormat::Ipv4 => "ipv4",
        StringFormat::Ipv6 => "ipv6",
        StringFormat::Cuid => "cuid",
    }
}

pub(super) fn number(cx: &Converter<'_>, checks: &NumberChecks) -> Fragment {
    let mut fragment = typed(if checks.integer { "integer" } else { "number" });
    let dialect = cx.dialect();
    if let Some(min) = checks.minimum {
        fragment.extend(dialect.encode_exclusive_bound(BoundSide::Lower, min.value, min.inclusive));
    }
    if let Some(max) = checks.maximum {
        fragment.extend(dialect.encode_exclusive_bound(BoundSide::Upper, max.value, max.inclusive));
    }
    if let Some(step) = checks.multiple_of {
        fragment.insert("multipleOf".to_string(), number_value(step));
    }
    fragment
}

pub(super) fn literal(cx: &Converter<'_>, value: &Value) -> Fragment {
    let type_name = match value {
        Value::Null => return null(cx),
        Value::Bool(_) => Some("boolean"),
        Value::Number(n) if n.is_i64() || n.is_u64() => Some("integer"),
        Value::Number(_) => Some("number"),
        Value::String(_) => Some("string"),
        Value::Array(_) | Value::Object(_) => None,
    };
    let mut fragment = type_name.map(typed).unwrap_or_default();
    fragment.extend(cx.dialect().encode_const(value.clone()));
    fragment
}

pub(super) fn enumeration(values: &[String]) -> Fragment {
    let mut fragment = typed("string");
    fragment.insert(
        "enum".to_string(),
        Value::Array(values.iter().cloned().map(Value::String).collect()),
    );
    fragment
}

pub(super) fn date() -> Fragment {
    let mut fragment = typed("string");
    fragment.insert("format".to_string(), Value::String("date-time".to_string()));
    fragment
}
