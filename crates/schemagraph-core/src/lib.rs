//! Convert an in-memory validation-schema graph into a JSON Schema
//! (draft-07 or 2019-09) or OpenAPI 3 schema document.
//!
//! Build a [`SchemaGraph`], pick a [`DialectConfig`] and call [`convert`].
//! Cycles become `$ref`s to hoisted definitions; nodes reused without a cycle
//! are inlined at each use.
//!
//! ```
//! use schemagraph_core::{convert, object_kind, DialectConfig, SchemaGraph, SchemaNode};
//!
//! let mut graph = SchemaGraph::new();
//! let node = graph.declare();
//! let label = graph.string();
//! let children = graph.array(node);
//! graph
//!     .define(node, SchemaNode::new(object_kind([("label", label), ("children", children)])).named("Node"))
//!     .unwrap();
//!
//! let doc = convert(&graph, node, &DialectConfig::default()).unwrap();
//! let value = doc.to_value();
//! assert_eq!(value["$ref"], "#/definitions/Node");
//! assert_eq!(value["definitions"]["Node"]["properties"]["children"]["items"]["$ref"], "#/definitions/Node");
//! ```
//!
//! Pointer helpers are exposed for callers that post-process documents:
//!
//! ```
//! use schemagraph_core::{build_path, rebase_refs};
//! use serde_json::json;
//!
//! let pointer = build_path("#", &["properties", "a/b"]);
//! assert_eq!(pointer, "#/properties/a~1b");
//!
//! let mut moved = json!({"items": {"$ref": "#/properties/a~1b"}});
//! rebase_refs(&mut moved, "#/properties/a~1b", "#/definitions/AB", "#/definitions/");
//! assert_eq!(moved["items"]["$ref"], "#/definitions/AB");
//! ```

pub mod assembler;
pub mod config;
pub mod dialect;
pub mod dispatcher;
pub mod error;
pub mod graph;
pub mod pointer;
pub mod registry;
pub mod rules;

pub use assembler::{assemble, ConversionStats, OutputDocument};
pub use config::{DialectConfig, NamePolicy, PointerStyle, Target};
pub use dialect::{BoundSide, Dialect, ForeignKeyword, Fragment};
pub use dispatcher::{convert, Converter};
pub use error::{ConvertError, ErrorCode};
pub use graph::{
    object_kind, Bound, NodeId, NodeKind, NodeMeta, NumberChecks, SchemaGraph, SchemaNode, StringChecks,
    StringFormat, UnknownKeys,
};
pub use pointer::{build_path, escape_pointer_segment, rebase_refs, TraversalPath};
pub use registry::{Outcome, ReferenceRegistry, ResolutionRecord, ResolutionState};
pub use rules::{CustomRule, RuleTable};
