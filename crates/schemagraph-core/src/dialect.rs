//! Dialect adapter: the encoding choices that differ between targets.
//!
//! [`Dialect`] is built once per run from a [`DialectConfig`] and never
//! changes. Type rules and the dispatcher ask it how to spell pointers,
//! nullability, exclusive bounds and constants, and the dispatcher runs every
//! rule output through [`Dialect::check_fragment`].

use serde_json::{json, Map, Value};

use crate::config::{DialectConfig, PointerStyle, Target};
use crate::pointer::{build_path, schema_slot, SchemaSlot, TraversalPath};

/// A piece of output schema: a map of keywords to values.
pub type Fragment = Map<String, Value>;

/// Keywords that only exist in JSON Schema 2020-12. No supported target has them.
const DRAFT_2020_12_KEYWORDS: &[&str] = &["prefixItems", "$dynamicRef", "$dynamicAnchor"];

/// Keywords introduced by 2019-09 (rejected for draft-07).
const DRAFT_2019_09_KEYWORDS: &[&str] = &[
    "$defs",
    "$anchor",
    "dependentSchemas",
    "dependentRequired",
    "unevaluatedProperties",
    "unevaluatedItems",
    "minContains",
    "maxContains",
];

/// JSON Schema keywords the OpenAPI 3.0 schema object does not have.
const JSON_SCHEMA_ONLY_KEYWORDS: &[&str] = &[
    "$schema",
    "$id",
    "$defs",
    "$anchor",
    "definitions",
    "const",
    "contains",
    "propertyNames",
    "additionalItems",
    "if",
    "then",
    "else",
    "dependentSchemas",
    "dependentRequired",
    "unevaluatedProperties",
    "unevaluatedItems",
    "examples",
];

/// OpenAPI extensions that are not JSON Schema keywords.
const OPENAPI_ONLY_KEYWORDS: &[&str] =
    &["nullable", "discriminator", "xml", "externalDocs", "example"];

/// Which end of a numeric range a bound constrains.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundSide {
    Lower,
    Upper,
}

/// A keyword the target does not have, found by [`Dialect::check_fragment`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForeignKeyword {
    pub keyword: String,
    /// Location of the offending schema, relative to the checked fragment.
    pub at: TraversalPath,
}

/// Encoding rules for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dialect {
    target: Target,
    pointer_style: PointerStyle,
    base: String,
}

impl Dialect {
    pub fn new(config: &DialectConfig) -> Self {
        Self {
            target: config.target,
            pointer_style: config.pointer_style,
            base: config.base_ref_prefix.clone(),
        }
    }

    pub fn target(&self) -> Target {
        self.target
    }

    pub fn pointer_style(&self) -> PointerStyle {
        self.pointer_style
    }

    pub fn base_ref_prefix(&self) -> &str {
        &self.base
    }

    fn is_openapi(&self) -> bool {
        self.target == Target::OpenApi3
    }

    // -- pointers ----------------------------------------------------------

    /// Pointer to the definitions container, e.g. `#/definitions`.
    pub fn definitions_pointer(&self) -> String {
        build_path(&self.base, self.pointer_style.container_path())
    }

    /// Pointer to the hoisted definition `name`.
    pub fn pointer_for(&self, name: &str) -> String {
        let mut segments = self.pointer_style.container_path().to_vec();
        segments.push(name);
        build_path(&self.base, &segments)
    }

    /// `{"$ref": pointer_for(name)}`.
    pub fn reference(&self, name: &str) -> Fragment {
        let mut fragment = Fragment::new();
        fragment.insert("$ref".to_string(), Value::String(self.pointer_for(name)));
        fragment
    }

    /// Pointer to an in-document location.
    pub fn local_pointer(&self, path: &TraversalPath) -> String {
        path.to_pointer(&self.base)
    }

    /// `$schema` value, if the target has one.
    pub fn schema_uri(&self) -> Option<&'static str> {
        match self.target {
            Target::JsonSchema7 => Some("http://json-schema.org/draft-07/schema#"),
            Target::JsonSchema2019_09 => Some("https://json-schema.org/draft/2019-09/schema"),
            Target::OpenApi3 => None,
        }
    }

    // -- capability queries ------------------------------------------------

    /// `type: ["string", "null"]` style type lists.
    pub fn supports_type_arrays(&self) -> bool {
        !self.is_openapi()
    }

    /// Array-form `items` for positional tuples.
    pub fn supports_tuple_items(&self) -> bool {
        !self.is_openapi()
    }

    pub fn supports_property_names(&self) -> bool {
        !self.is_openapi()
    }

    // -- encodings ---------------------------------------------------------

    /// Make `fragment` accept `null` when `is_nullable` is set.
    ///
    /// JSON Schema targets widen a primitive `type` to a list or fall back to
    /// `anyOf: [fragment, {type: null}]`. OpenAPI 3 sets `nullable: true`.
    pub fn encode_nullable(&self, mut fragment: Fragment, is_nullable: bool) -> Fragment {
        if !is_nullable {
            return fragment;
        }

        if self.is_openapi() {
            if fragment.contains_key("$ref") {
                // 3.0 ignores siblings of $ref.
                let mut wrapped = Fragment::new();
                wrapped.insert("allOf".to_string(), json!([Value::Object(fragment)]));
                wrapped.insert("nullable".to_string(), Value::Bool(true));
                return wrapped;
            }
            if let Some(Value::Array(values)) = fragment.get_mut("enum") {
                if !values.contains(&Value::Null) {
                    values.push(Value::Null);
                }
            }
            fragment.insert("nullable".to_string(), Value::Bool(true));
            return fragment;
        }

        // `{}` already accepts null.
        if fragment.is_empty() || accepts_null(&fragment) {
            return fragment;
        }

        let constrained_values = fragment.contains_key("enum") || fragment.contains_key("const");
        if !constrained_values {
            let widened = match fragment.get("type") {
                Some(Value::String(single)) => Some(json!([single, "null"])),
                Some(Value::Array(types)) => {
                    let mut types = types.clone();
                    types.push(Value::String("null".to_string()));
                    Some(Value::Array(types))
                }
                _ => None,
            };
            if let Some(types) = widened {
                fragment.insert("type".to_string(), types);
                return fragment;
            }
        }

        let mut wrapped = Fragment::new();
        wrapped.insert(
            "anyOf".to_string(),
            json!([Value::Object(fragment), { "type": "null" }]),
        );
        wrapped
    }

    /// Encode one numeric bound.
    ///
    /// JSON Schema targets carry exclusivity in the keyword
    /// (`exclusiveMinimum: 5`); OpenAPI 3 pairs the value keyword with a
    /// boolean flag (`minimum: 5, exclusiveMinimum: true`).
    pub fn encode_exclusive_bound(&self, side: BoundSide, value: f64, inclusive: bool) -> Fragment {
        let (value_key, exclusive_key) = match side {
            BoundSide::Lower => ("minimum", "exclusiveMinimum"),
            BoundSide::Upper => ("maximum", "exclusiveMaximum"),
        };

        let mut fragment = Fragment::new();
        if inclusive {
            fragment.insert(value_key.to_string(), number_value(value));
        } else if self.is_openapi() {
            fragment.insert(value_key.to_string(), number_value(value));
            fragment.insert(exclusive_key.to_string(), Value::Bool(true));
        } else {
            fragment.insert(exclusive_key.to_string(), number_value(value));
        }
        fragment
    }

    /// A single allowed value: `const` or a one-element `enum`.
    pub fn encode_const(&self, value: Value) -> Fragment {
        let mut fragment = Fragment::new();
        if self.is_openapi() {
            fragment.insert("enum".to_string(), Value::Array(vec![value]));
        } else {
            fragment.insert("const".to_string(), value);
        }
        fragment
    }

    /// Attach an annotation such as `default` or `description`.
    ///
    /// Draft-07 and OpenAPI 3.0 ignore the siblings of `$ref`, so there a
    /// reference is wrapped as `allOf: [reference]` first.
    pub fn annotate(&self, fragment: Fragment, keyword: &str, value: Value) -> Fragment {
        let mut fragment = if fragment.contains_key("$ref") && self.target != Target::JsonSchema2019_09 {
            let mut wrapped = Fragment::new();
            wrapped.insert("allOf".to_string(), Value::Array(vec![Value::Object(fragment)]));
            wrapped
        } else {
            fragment
        };
        fragment.insert(keyword.to_string(), value);
        fragment
    }

    // -- keyword gate ------------------------------------------------------

    /// Check a rule output against this dialect, down through every nested
    /// subschema.
    ///
    /// Returns the first offending keyword and where it sits.
    pub fn check_fragment(&self, fragment: &Fragment) -> Result<(), ForeignKeyword> {
        self.check_schema(fragment, &mut TraversalPath::root())
    }

    fn check_schema(&self, fragment: &Fragment, at: &mut TraversalPath) -> Result<(), ForeignKeyword> {
        if let Some((keyword, _)) = fragment.iter().find(|(k, v)| !self.keyword_allowed(k.as_str(), v)) {
            return Err(ForeignKeyword {
                keyword: keyword.clone(),
                at: at.clone(),
            });
        }
        for (keyword, value) in fragment {
            let Some(slot) = schema_slot(keyword) else {
                continue;
            };
            let keyword = keyword.as_str();
            match (slot, value) {
                (SchemaSlot::Map, Value::Object(members)) => {
                    for (key, member) in members {
                        self.check_nested(member, at, &[keyword, key.as_str()])?;
                    }
                }
                (_, Value::Array(members)) => {
                    for (i, member) in members.iter().enumerate() {
                        let index = i.to_string();
                        self.check_nested(member, at, &[keyword, index.as_str()])?;
                    }
                }
                (SchemaSlot::Single, member) => self.check_nested(member, at, &[keyword])?,
                _ => {}
            }
        }
        Ok(())
    }

    fn check_nested(&self, value: &Value, at: &mut TraversalPath, segments: &[&str]) -> Result<(), ForeignKeyword> {
        // Boolean schemas have no keywords.
        let Value::Object(schema) = value else {
            return Ok(());
        };
        let mark = at.len();
        for segment in segments {
            at.push(*segment);
        }
        let result = self.check_schema(schema, at);
        at.truncate(mark);
        result
    }

    fn keyword_allowed(&self, keyword: &str, value: &Value) -> bool {
        if DRAFT_2020_12_KEYWORDS.contains(&keyword) {
            return false;
        }
        match self.target {
            Target::OpenApi3 => {
                if JSON_SCHEMA_ONLY_KEYWORDS.contains(&keyword) {
                    return false;
                }
                match keyword {
                    "type" => value.as_str().is_some_and(|t| t != "null"),
                    "items" => value.is_object(),
                    "exclusiveMinimum" | "exclusiveMaximum" => value.is_boolean(),
                    _ => true,
                }
            }
            Target::JsonSchema7 | Target::JsonSchema2019_09 => {
                if OPENAPI_ONLY_KEYWORDS.contains(&keyword) {
                    return false;
                }
                if self.target == Target::JsonSchema7 && DRAFT_2019_09_KEYWORDS.contains(&keyword) {
                    return false;
                }
                match keyword {
                    "exclusiveMinimum" | "exclusiveMaximum" => value.is_number(),
                    _ => true,
                }
            }
        }
    }
}

/// Render a bound or constant as a JSON number, using an integer when the
/// value has no fractional part (`2`, not `2.0`).
pub fn number_value(value: f64) -> Value {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 9.007_199_254_740_992e15 {
        Value::from(value as i64)
    } else {
        Value::from(value)
    }
}

fn accepts_null(fragment: &Fragment) -> bool {
    match fragment.get("type") {
        Some(Value::String(t)) => t == "null",
        Some(Value::Array(types)) => types.iter().any(|t| t == "null"),
        _ => false,
    }
}
