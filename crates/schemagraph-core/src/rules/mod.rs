//! Type-rule table.
//!
//! One rule per [`NodeKind`]. Every rule is a pure function of the node and
//! the run's dialect: it builds a fragment from the node's payload and calls
//! [`Converter::convert_child`] for each nested node, never reading child
//! nodes itself. Kinds the table does not know arrive as
//! [`NodeKind::Custom`] and are looked up in a caller-supplied [`RuleTable`].

mod collections;
mod combinators;
mod object;
mod primitives;
mod record;

use std::collections::HashMap;
use std::fmt;

use serde_json::Value;

use crate::dialect::Fragment;
use crate::dispatcher::Converter;
use crate::error::ConvertError;
use crate::graph::{NodeKind, SchemaNode};

/// Caller-supplied rule for a custom node kind.
///
/// Same contract as the built-in rules: convert nested nodes through
/// `cx.convert_child`, emit only keywords valid for `cx.dialect()`.
pub trait CustomRule: Send + Sync {
    fn convert(&self, node: &SchemaNode, cx: &mut Converter<'_>) -> Result<Fragment, ConvertError>;
}

impl<F> CustomRule for F
where
    F: Fn(&SchemaNode, &mut Converter<'_>) -> Result<Fragment, ConvertError> + Send + Sync,
{
    fn convert(&self, node: &SchemaNode, cx: &mut Converter<'_>) -> Result<Fragment, ConvertError> {
        self(node, cx)
    }
}

/// Rules for [`NodeKind::Custom`] nodes, keyed by custom kind name.
#[derive(Default)]
pub struct RuleTable {
    rules: HashMap<String, Box<dyn CustomRule>>,
}

impl RuleTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `rule` for custom kind `kind`, replacing any previous rule.
    pub fn register(&mut self, kind: impl Into<String>, rule: impl CustomRule + 'static) -> &mut Self {
        self.rules.insert(kind.into(), Box::new(rule));
        self
    }

    pub fn get(&self, kind: &str) -> Option<&dyn CustomRule> {
        self.rules.get(kind).map(|rule| rule.as_ref())
    }

    pub fn contains(&self, kind: &str) -> bool {
        self.rules.contains_key(kind)
    }
}

impl fmt::Debug for RuleTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut kinds: Vec<&String> = self.rules.keys().collect();
        kinds.sort();
        f.debug_struct("RuleTable").field("kinds", &kinds).finish()
    }
}

/// Apply the rule for `node`'s kind.
pub(crate) fn apply(cx: &mut Converter<'_>, node: &SchemaNode) -> Result<Fragment, ConvertError> {
    match &node.kind {
        NodeKind::Pending => Err(ConvertError::SchemaError {
            path: cx.path().clone(),
            message: "node was declared but never defined".to_string(),
        }),
        NodeKind::Any | NodeKind::Unknown => Ok(Fragment::new()),
        NodeKind::Never => {
            let mut fragment = Fragment::new();
            fragment.insert("not".to_string(), Value::Object(Fragment::new()));
            Ok(fragment)
        }
        NodeKind::Null => Ok(primitives::null(cx)),
        NodeKind::Boolean => Ok(typed("boolean")),
        NodeKind::String(checks) => Ok(primitives::string(checks)),
        NodeKind::Number(checks) => Ok(primitives::number(cx, checks)),
        NodeKind::Literal { value } => Ok(primitives::literal(cx, value)),
        NodeKind::Enum { values } => Ok(primitives::enumeration(values)),
        NodeKind::Date => Ok(primitives::date()),
        NodeKind::Array {
            items,
            min_items,
            max_items,
        } => collections::array(cx, *items, *min_items, *max_items),
        NodeKind::Set { items } => collections::set(cx, *items),
        NodeKind::Tuple { items, rest } => collections::tuple(cx, items, *rest),
        NodeKind::Map { key, value } => collections::map(cx, *key, *value),
        NodeKind::Object {
            properties,
            unknown_keys,
            catchall,
        } => object::object(cx, properties, *unknown_keys, *catchall),
        NodeKind::Record { key, value } => record::record(cx, *key, *value),
        NodeKind::Union { options } => combinators::union(cx, options),
        NodeKind::Intersection { left, right } => combinators::intersection(cx, *left, *right),
        NodeKind::Nullable { inner } => combinators::nullable(cx, *inner),
        NodeKind::Optional { inner } => cx.convert_child(*inner, &[]),
        NodeKind::Default { inner, value } => combinators::with_default(cx, *inner, value),
        NodeKind::Custom { name, .. } => custom(cx, node, name),
    }
}

fn custom(cx: &mut Converter<'_>, node: &SchemaNode, kind: &str) -> Result<Fragment, ConvertError> {
    if let Some(rule) = cx.rules().and_then(|table| table.get(kind)) {
        return rule.convert(node, cx);
    }
    if cx.config().strict_unknown_types {
        return Err(ConvertError::UnsupportedType {
            path: cx.path().clone(),
            kind: kind.to_string(),
        });
    }
    tracing::warn!(kind, path = %cx.path(), "no rule for node kind, emitting an open schema");
    Ok(Fragment::new())
}

/// `{"type": name}`.
pub(crate) fn typed(name: &str) -> Fragment {
    let mut fragment = Fragment::new();
    fragment.insert("type".to_string(), Value::String(name.to_string()));
    fragment
}
