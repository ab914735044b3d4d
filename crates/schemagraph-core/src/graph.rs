//! The input schema graph.
//!
//! A [`SchemaGraph`] is an arena of [`SchemaNode`]s. A node's identity is the
//! [`NodeId`] handed out when it was added, never its structure: two
//! identical nodes added separately are two nodes. Children are referenced by
//! id, so cycles are ordinary edges. Self-referential types are built by
//! reserving an id with [`SchemaGraph::declare`] and filling it later with
//! [`SchemaGraph::define`].

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ConvertError;
use crate::pointer::TraversalPath;

/// Opaque handle to a node inside one [`SchemaGraph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(u32);

impl NodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Built-in string formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StringFormat {
    Email,
    Url,
    Uuid,
    Cuid,
    DateTime,
    Date,
    Time,
    Ipv4,
    Ipv6,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StringChecks {
    pub min_length: Option<u64>,
    pub max_length: Option<u64>,
    pub format: Option<StringFormat>,
    pub patterns: Vec<String>,
}

/// A numeric bound and whether the bound value itself is allowed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bound {
    pub value: f64,
    pub inclusive: bool,
}

impl Bound {
    pub fn inclusive(value: f64) -> Self {
        Self {
            value,
            inclusive: true,
        }
    }

    pub fn exclusive(value: f64) -> Self {
        Self {
            value,
            inclusive: false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NumberChecks {
    pub integer: bool,
    pub minimum: Option<Bound>,
    pub maximum: Option<Bound>,
    pub multiple_of: Option<f64>,
}

/// Policy for object keys not listed in `properties`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnknownKeys {
    /// Unknown keys are dropped by the validator; the schema forbids them.
    #[default]
    Strip,
    /// Unknown keys are rejected.
    Strict,
    /// Unknown keys are allowed.
    Passthrough,
}

/// Kind tag plus kind-specific payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NodeKind {
    /// Reserved by [`SchemaGraph::declare`], not yet defined.
    Pending,
    Any,
    Unknown,
    Never,
    Null,
    Boolean,
    String(StringChecks),
    Number(NumberChecks),
    Literal {
        value: Value,
    },
    Enum {
        values: Vec<String>,
    },
    Date,
    Array {
        items: NodeId,
        #[serde(default)]
        min_items: Option<u64>,
        #[serde(default)]
        max_items: Option<u64>,
    },
    Set {
        items: NodeId,
    },
    Tuple {
        items: Vec<NodeId>,
        #[serde(default)]
        rest: Option<NodeId>,
    },
    Map {
        key: NodeId,
        value: NodeId,
    },
    Object {
        properties: Vec<(String, NodeId)>,
        #[serde(default)]
        unknown_keys: UnknownKeys,
        #[serde(default)]
        catchall: Option<NodeId>,
    },
    Record {
        #[serde(default)]
        key: Option<NodeId>,
        value: NodeId,
    },
    Union {
        options: Vec<NodeId>,
    },
    Intersection {
        left: NodeId,
        right: NodeId,
    },
    Nullable {
        inner: NodeId,
    },
    Optional {
        inner: NodeId,
    },
    Default {
        inner: NodeId,
        value: Value,
    },
    /// A kind the built-in rule table does not know. Converted by a
    /// registered `CustomRule`, or handled per `strict_unknown_types`.
    Custom {
        name: String,
        #[serde(default)]
        children: Vec<NodeId>,
        #[serde(default)]
        payload: Value,
    },
}

impl NodeKind {
    /// Short kind name used in diagnostics.
    pub fn name(&self) -> &str {
        match self {
            NodeKind::Pending => "pending",
            NodeKind::Any => "any",
            NodeKind::Unknown => "unknown",
            NodeKind::Never => "never",
            NodeKind::Null => "null",
            NodeKind::Boolean => "boolean",
            NodeKind::String(_) => "string",
            NodeKind::Number(_) => "number",
            NodeKind::Literal { .. } => "literal",
            NodeKind::Enum { .. } => "enum",
            NodeKind::Date => "date",
            NodeKind::Array { .. } => "array",
            NodeKind::Set { .. } => "set",
            NodeKind::Tuple { .. } => "tuple",
            NodeKind::Map { .. } => "map",
            NodeKind::Object { .. } => "object",
            NodeKind::Record { .. } => "record",
            NodeKind::Union { .. } => "union",
            NodeKind::Intersection { .. } => "intersection",
            NodeKind::Nullable { .. } => "nullable",
            NodeKind::Optional { .. } => "optional",
            NodeKind::Default { .. } => "default",
            NodeKind::Custom { name, .. } => name,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeMeta {
    /// Declared identifier. Named nodes are always hoisted into definitions.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaNode {
    #[serde(flatten)]
    pub kind: NodeKind,
    #[serde(default)]
    pub meta: NodeMeta,
}

impl SchemaNode {
    pub fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            meta: NodeMeta::default(),
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.meta.name = Some(name.into());
        self
    }

    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.meta.description = Some(description.into());
        self
    }
}

impl From<NodeKind> for SchemaNode {
    fn from(kind: NodeKind) -> Self {
        Self::new(kind)
    }
}

/// Arena owning every node of a schema definition.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SchemaGraph {
    nodes: Vec<SchemaNode>,
}

impl SchemaGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, node: impl Into<SchemaNode>) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(node.into());
        id
    }

    /// Reserve an id to be filled by [`define`](Self::define).
    pub fn declare(&mut self) -> NodeId {
        self.add(NodeKind::Pending)
    }

    /// Fill a declared node.
    ///
    /// Fails if `id` is not part of this graph or was already defined.
    pub fn define(&mut self, id: NodeId, node: impl Into<SchemaNode>) -> Result<(), ConvertError> {
        match self.nodes.get_mut(id.index()) {
            Some(slot) if slot.kind == NodeKind::Pending => {
                *slot = node.into();
                Ok(())
            }
            Some(_) => Err(ConvertError::SchemaError {
                path: TraversalPath::root(),
                message: format!("node {} is already defined", id.index()),
            }),
            None => Err(unknown_node(id, &TraversalPath::root())),
        }
    }

    pub fn get(&self, id: NodeId) -> Option<&SchemaNode> {
        self.nodes.get(id.index())
    }

    /// Like [`get`](Self::get), reporting a foreign id as `SchemaError` at `path`.
    pub fn node(&self, id: NodeId, path: &TraversalPath) -> Result<&SchemaNode, ConvertError> {
        self.get(id).ok_or_else(|| unknown_node(id, path))
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        (0..self.nodes.len()).map(|i| NodeId(i as u32))
    }

    /// Whether an object property holding `id` may be absent.
    pub fn is_optional(&self, id: NodeId) -> bool {
        matches!(
            self.get(id).map(|n| &n.kind),
            Some(NodeKind::Optional { .. } | NodeKind::Default { .. })
        )
    }

    // -- shorthand constructors ------------------------------------------

    pub fn any(&mut self) -> NodeId {
        self.add(NodeKind::Any)
    }

    pub fn null(&mut self) -> NodeId {
        self.add(NodeKind::Null)
    }

    pub fn boolean(&mut self) -> NodeId {
        self.add(NodeKind::Boolean)
    }

    pub fn string(&mut self) -> NodeId {
        self.add(NodeKind::String(StringChecks::default()))
    }

    pub fn number(&mut self) -> NodeId {
        self.add(NodeKind::Number(NumberChecks::default()))
    }

    pub fn integer(&mut self) -> NodeId {
        self.add(NodeKind::Number(NumberChecks {
            integer: true,
            ..NumberChecks::default()
        }))
    }

    pub fn literal(&mut self, value: impl Into<Value>) -> NodeId {
        self.add(NodeKind::Literal {
            value: value.into(),
        })
    }

    pub fn enumeration<S: Into<String>>(&mut self, values: impl IntoIterator<Item = S>) -> NodeId {
        self.add(NodeKind::Enum {
            values: values.into_iter().map(Into::into).collect(),
        })
    }

    pub fn array(&mut self, items: NodeId) -> NodeId {
        self.add(NodeKind::Array {
            items,
            min_items: None,
            max_items: None,
        })
    }

    pub fn object<S: Into<String>>(
        &mut self,
        properties: impl IntoIterator<Item = (S, NodeId)>,
    ) -> NodeId {
        self.add(object_kind(properties))
    }

    pub fn record(&mut self, key: Option<NodeId>, value: NodeId) -> NodeId {
        self.add(NodeKind::Record { key, value })
    }

    pub fn union(&mut self, options: impl IntoIterator<Item = NodeId>) -> NodeId {
        self.add(NodeKind::Union {
            options: options.into_iter().collect(),
        })
    }

    pub fn nullable(&mut self, inner: NodeId) -> NodeId {
        self.add(NodeKind::Nullable { inner })
    }

    pub fn optional(&mut self, inner: NodeId) -> NodeId {
        self.add(NodeKind::Optional { inner })
    }
}

/// An `Object` kind with default unknown-key handling and no catchall.
pub fn object_kind<S: Into<String>>(properties: impl IntoIterator<Item = (S, NodeId)>) -> NodeKind {
    NodeKind::Object {
        properties: properties
            .into_iter()
            .map(|(name, id)| (name.into(), id))
            .collect(),
        unknown_keys: UnknownKeys::Strip,
        catchall: None,
    }
}

fn unknown_node(id: NodeId, path: &TraversalPath) -> ConvertError {
    ConvertError::SchemaError {
        path: path.clone(),
        message: format!("node {} does not belong to this graph", id.index()),
    }
}
