//! Document assembler: root fragment plus hoisted definitions.

use serde::{Serialize, Serializer};
use serde_json::{Map, Value};

use crate::dialect::{Dialect, Fragment};

/// Counters for one conversion run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ConversionStats {
    /// Dispatcher visits, including cache hits and cycle references.
    pub nodes_visited: usize,
    /// Type rules actually run. At most once per distinct node.
    pub rules_invoked: usize,
    pub references_emitted: usize,
    pub cache_hits: usize,
}

/// The result of a conversion run.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputDocument {
    schema: Fragment,
    definitions: Map<String, Value>,
    container_path: Vec<&'static str>,
    schema_uri: Option<&'static str>,
    stats: ConversionStats,
}

impl OutputDocument {
    /// The root fragment, without `$schema` or definitions.
    pub fn schema(&self) -> &Fragment {
        &self.schema
    }

    /// Hoisted definitions by name, in first-hoisted order.
    pub fn definitions(&self) -> &Map<String, Value> {
        &self.definitions
    }

    pub fn stats(&self) -> ConversionStats {
        self.stats
    }

    /// Render the full document.
    ///
    /// `$schema` comes first, then the root keywords, then the definitions
    /// container (omitted when empty) nested at the dialect's container path.
    pub fn to_value(&self) -> Value {
        let mut out = Map::new();
        if let Some(uri) = self.schema_uri {
            out.insert("$schema".to_string(), Value::String(uri.to_string()));
        }
        for (key, value) in &self.schema {
            out.insert(key.clone(), value.clone());
        }

        if !self.definitions.is_empty() {
            let mut container = Value::Object(self.definitions.clone());
            for segment in self.container_path.iter().skip(1).rev() {
                let mut wrapper = Map::new();
                wrapper.insert((*segment).to_string(), container);
                container = Value::Object(wrapper);
            }
            if let Some(first) = self.container_path.first() {
                out.insert((*first).to_string(), container);
            }
        }
        Value::Object(out)
    }
}

impl Serialize for OutputDocument {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_value().serialize(serializer)
    }
}

/// Combine the root fragment and the registry's definitions into a document.
pub fn assemble(
    root: Fragment,
    definitions: Vec<(String, Fragment)>,
    dialect: &Dialect,
    emit_schema_uri: bool,
    stats: ConversionStats,
) -> OutputDocument {
    let definitions = definitions
        .into_iter()
        .map(|(name, body)| (name, Value::Object(body)))
        .collect();
    OutputDocument {
        schema: root,
        definitions,
        container_path: dialect.pointer_style().container_path().to_vec(),
        schema_uri: if emit_schema_uri { dialect.schema_uri() } else { None },
        stats,
    }
}

// ===========================================================================
// Tests
// ===========================================================================
