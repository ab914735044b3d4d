//! JSON Pointer helpers and the traversal path tracker.
//!
//! Provides two concerns used by the dispatcher and the type rules:
//! 1. **JSON Pointer escaping** (RFC 6901) for property keys with `/` or `~`
//! 2. **[`TraversalPath`]**, the push/pop stack of segments that locates the
//!    fragment currently being built, rendered as `#/properties/a/items`.
//!
//! It also owns [`rebase_refs`], which rewrites location-relative `$ref`
//! pointers when a fragment is moved to (or copied into) another location.

use std::borrow::Cow;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

// ---------------------------------------------------------------------------
// JSON Pointer escaping (RFC 6901)
// ---------------------------------------------------------------------------

/// Escape a single path segment per RFC 6901.
///
/// - `~` → `~0`
/// - `/` → `~1`
///
/// Returns `Cow::Borrowed` when no escaping is needed (the common case).
pub fn escape_pointer_segment(segment: &str) -> Cow<'_, str> {
    if segment.contains('~') || segment.contains('/') {
        Cow::Owned(segment.replace('~', "~0").replace('/', "~1"))
    } else {
        Cow::Borrowed(segment)
    }
}

/// Build a JSON Pointer by appending escaped segments to a parent pointer.
///
/// # Example
/// ```
/// use schemagraph_core::build_path;
/// assert_eq!(build_path("#", &["properties", "a/b"]), "#/properties/a~1b");
/// ```
pub fn build_path<S: AsRef<str>>(parent: &str, segments: &[S]) -> String {
    let mut path = parent.to_string();
    for segment in segments {
        path.push('/');
        path.push_str(&escape_pointer_segment(segment.as_ref()));
    }
    path
}

// ---------------------------------------------------------------------------
// TraversalPath
// ---------------------------------------------------------------------------

/// Location of the fragment currently being converted, relative to the
/// document root.
///
/// Segments are output-document keys (`properties`, a property name,
/// `anyOf`, a branch index, ...). The path is created empty per run and
/// pushed/popped around each child conversion.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TraversalPath {
    segments: Vec<String>,
}

impl TraversalPath {
    /// The empty path (document root).
    pub fn root() -> Self {
        Self::default()
    }

    pub fn push(&mut self, segment: impl Into<String>) {
        self.segments.push(segment.into());
    }

    /// Drop every segment past `len`.
    pub fn truncate(&mut self, len: usize) {
        self.segments.truncate(len);
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Render as a pointer under `base` (normally `"#"`).
    pub fn to_pointer(&self, base: &str) -> String {
        build_path(base, &self.segments)
    }
}

impl fmt::Display for TraversalPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_pointer("#"))
    }
}

impl<S: Into<String>> FromIterator<S> for TraversalPath {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            segments: iter.into_iter().map(Into::into).collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// Schema-bearing keywords
// ---------------------------------------------------------------------------

/// How a keyword holds subschemas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SchemaSlot {
    /// One schema. `items` may also hold a positional list.
    Single,
    /// A list of schemas.
    List,
    /// Caller keys mapped to schemas.
    Map,
}

/// The subschema layout of `keyword`, or `None` for keywords whose values
/// are data (`default`, `enum`, `const`, `examples`, extensions, ...).
pub(crate) fn schema_slot(keyword: &str) -> Option<SchemaSlot> {
    match keyword {
        "items" | "additionalItems" | "additionalProperties" | "not" | "propertyNames" | "contains" | "if"
        | "then" | "else" | "unevaluatedItems" | "unevaluatedProperties" => Some(SchemaSlot::Single),
        "anyOf" | "allOf" | "oneOf" | "prefixItems" => Some(SchemaSlot::List),
        "properties" | "patternProperties" | "dependentSchemas" | "definitions" | "$defs" => Some(SchemaSlot::Map),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Pointer rebasing
// ---------------------------------------------------------------------------

/// Rewrite `$ref` pointers that point into the subtree at `from` so they
/// point into the same subtree placed at `to`.
///
/// Only schema positions are walked; annotation and value keywords keep
/// caller data as given. Pointers starting with `keep` (the definitions
/// container) are never rewritten: they address hoisted definitions, not the
/// moved subtree. Returns the number of rewritten pointers.
pub fn rebase_refs(value: &mut Value, from: &str, to: &str, keep: &str) -> usize {
    if from == to {
        return 0;
    }
    let Value::Object(obj) = value else {
        return 0;
    };

    let mut rewritten = 0;
    if let Some(Value::String(target)) = obj.get_mut("$ref") {
        if let Some(rebased) = rebase_pointer(target, from, to, keep) {
            *target = rebased;
            rewritten += 1;
        }
    }
    for (keyword, child) in obj.iter_mut() {
        let Some(slot) = schema_slot(keyword) else {
            continue;
        };
        rewritten += match (slot, child) {
            (SchemaSlot::Map, Value::Object(members)) => members
                .values_mut()
                .map(|member| rebase_refs(member, from, to, keep))
                .sum(),
            (_, Value::Array(members)) => members
                .iter_mut()
                .map(|member| rebase_refs(member, from, to, keep))
                .sum(),
            (SchemaSlot::Single, schema) => rebase_refs(schema, from, to, keep),
            _ => 0,
        };
    }
    rewritten
}

fn rebase_pointer(target: &str, from: &str, to: &str, keep: &str) -> Option<String> {
    if target.starts_with(keep) {
        return None;
    }
    let rest = target.strip_prefix(from)?;
    if rest.is_empty() || rest.starts_with('/') {
        Some(format!("{to}{rest}"))
    } else {
        None
    }
}

// ===========================================================================
// Tests
// ===========================================================================
