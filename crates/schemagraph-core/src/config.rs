//! Configuration for schema conversion.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Output dialect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Target {
    /// JSON Schema draft-07 (default).
    #[serde(rename = "jsonSchema7")]
    JsonSchema7,
    /// JSON Schema 2019-09.
    #[serde(rename = "jsonSchema2019-09")]
    JsonSchema2019_09,
    /// The OpenAPI 3.0 schema-object subset.
    #[serde(rename = "openApi3")]
    OpenApi3,
}

impl Target {
    pub fn as_str(self) -> &'static str {
        match self {
            Target::JsonSchema7 => "jsonSchema7",
            Target::JsonSchema2019_09 => "jsonSchema2019-09",
            Target::OpenApi3 => "openApi3",
        }
    }

    /// The pointer style a document for this target uses unless overridden.
    pub fn default_pointer_style(self) -> PointerStyle {
        match self {
            Target::JsonSchema7 => PointerStyle::Definitions,
            Target::JsonSchema2019_09 => PointerStyle::Defs,
            Target::OpenApi3 => PointerStyle::ComponentsSchemas,
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where hoisted definitions live and how pointers to them are spelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PointerStyle {
    /// `#/definitions/{name}`
    Definitions,
    /// `#/$defs/{name}`
    Defs,
    /// `#/components/schemas/{name}`
    ComponentsSchemas,
}

impl PointerStyle {
    /// Document keys leading from the root to the definitions container.
    pub fn container_path(self) -> &'static [&'static str] {
        match self {
            PointerStyle::Definitions => &["definitions"],
            PointerStyle::Defs => &["$defs"],
            PointerStyle::ComponentsSchemas => &["components", "schemas"],
        }
    }
}

/// What to do when two distinct nodes want the same definition name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NamePolicy {
    /// Append `_2`, `_3`, ... in encounter order.
    #[default]
    Suffix,
    /// Fail the run with `NameCollision`.
    Error,
}

/// Options for one conversion run.
///
/// ## Serialization Format
///
/// Fields are serialized in `kebab-case` (e.g., `max-depth`,
/// `strict-unknown-types`). Missing fields take their default values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct DialectConfig {
    /// Output dialect. Default: JSON Schema draft-07.
    pub target: Target,
    /// Definitions container and pointer spelling.
    pub pointer_style: PointerStyle,
    /// Fail on node kinds without a rule instead of emitting `{}`.
    pub strict_unknown_types: bool,
    /// Prefix of every emitted pointer. Default: `#`.
    pub base_ref_prefix: String,
    /// Maximum nesting depth of the traversal (stack overflow guard).
    pub max_depth: usize,
    /// Collision handling for hoisted definition names.
    pub name_policy: NamePolicy,
    /// Hoist the root under this name; the document root becomes a `$ref`.
    pub root_name: Option<String>,
    /// Emit `$schema` for JSON Schema targets.
    pub emit_schema_uri: bool,
}

impl DialectConfig {
    /// Defaults for `target`, including its conventional pointer style.
    pub fn for_target(target: Target) -> Self {
        Self {
            target,
            pointer_style: target.default_pointer_style(),
            ..Self::default()
        }
    }
}

impl Default for DialectConfig {
    fn default() -> Self {
        Self {
            target: Target::JsonSchema7,
            pointer_style: PointerStyle::Definitions,
            strict_unknown_types: false,
            base_ref_prefix: "#".to_string(),
            max_depth: 64,
            name_policy: NamePolicy::Suffix,
            root_name: None,
            emit_schema_uri: true,
        }
    }
}
