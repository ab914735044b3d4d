//! Dispatcher: routes each node to its type rule under registry control.
//!
//! [`Converter`] owns everything one run needs: the dialect, the reference
//! registry, the traversal path and the stats. Rules receive it as their
//! context and call [`Converter::convert_child`] for every nested node, which
//! is what lets cycles be intercepted in one place.
//!
//! Per node:
//! 1. Depth guard.
//! 2. Registry `begin`: `Cached` → stored fragment or reference, `Cyclic` →
//!    reference to a lazily named definition, `Fresh` → continue.
//! 3. Named nodes reserve their definition name up front.
//! 4. Apply the rule, then the description, then the dialect keyword gate.
//! 5. Registry `complete`. A node that picked up a name while in progress is
//!    moved into the definitions and replaced by a reference.

use serde_json::Value;

use crate::assembler::{assemble, ConversionStats, OutputDocument};
use crate::config::DialectConfig;
use crate::dialect::{Dialect, Fragment};
use crate::error::ConvertError;
use crate::graph::{NodeId, SchemaGraph, SchemaNode};
use crate::pointer::{build_path, rebase_refs, TraversalPath};
use crate::registry::{Outcome, ReferenceRegistry};
use crate::rules::{self, RuleTable};

/// One conversion run over a [`SchemaGraph`].
pub struct Converter<'a> {
    graph: &'a SchemaGraph,
    config: &'a DialectConfig,
    dialect: Dialect,
    rules: Option<&'a RuleTable>,
    registry: ReferenceRegistry,
    path: TraversalPath,
    depth: usize,
    root: Option<NodeId>,
    stats: ConversionStats,
}

impl<'a> Converter<'a> {
    pub fn new(graph: &'a SchemaGraph, config: &'a DialectConfig) -> Self {
        Self {
            graph,
            config,
            dialect: Dialect::new(config),
            rules: None,
            registry: ReferenceRegistry::new(config.name_policy),
            path: TraversalPath::root(),
            depth: 0,
            root: None,
            stats: ConversionStats::default(),
        }
    }

    /// Use `rules` for [`NodeKind::Custom`](crate::NodeKind::Custom) nodes.
    pub fn with_rules(mut self, rules: &'a RuleTable) -> Self {
        self.rules = Some(rules);
        self
    }

    /// Convert the graph rooted at `root` into a document.
    ///
    /// Any error aborts the run; no partial document is produced.
    pub fn convert_root(mut self, root: NodeId) -> Result<OutputDocument, ConvertError> {
        self.root = Some(root);
        let schema = self.convert(root)?;
        tracing::debug!(
            nodes = self.stats.nodes_visited,
            rules = self.stats.rules_invoked,
            definitions = self.registry.definitions().len(),
            "conversion finished"
        );
        Ok(assemble(
            schema,
            self.registry.definitions(),
            &self.dialect,
            self.config.emit_schema_uri,
            self.stats,
        ))
    }

    // -- rule context ------------------------------------------------------

    pub fn graph(&self) -> &'a SchemaGraph {
        self.graph
    }

    pub fn dialect(&self) -> &Dialect {
        &self.dialect
    }

    pub fn config(&self) -> &'a DialectConfig {
        self.config
    }

    pub(crate) fn rules(&self) -> Option<&'a RuleTable> {
        self.rules
    }

    /// Location of the fragment being built.
    pub fn path(&self) -> &TraversalPath {
        &self.path
    }

    /// Rebase pointers in `fragment`, built at the current location, for
    /// placement at `segments` below it.
    pub fn move_down(&self, fragment: Fragment, segments: &[&str]) -> Fragment {
        let to = self.pointer_here(segments);
        self.relocate(fragment, &self.path, &to)
    }

    /// In-document pointer to `segments` below the current location.
    pub fn pointer_here(&self, segments: &[&str]) -> String {
        build_path(&self.dialect.local_pointer(&self.path), segments)
    }

    /// Convert a child node placed at `segments` below the current location.
    pub fn convert_child(&mut self, child: NodeId, segments: &[&str]) -> Result<Fragment, ConvertError> {
        let mark = self.path.len();
        for segment in segments {
            self.path.push(*segment);
        }
        let result = self.convert(child);
        self.path.truncate(mark);
        result
    }

    // -- dispatch ----------------------------------------------------------

    fn convert(&mut self, node: NodeId) -> Result<Fragment, ConvertError> {
        if self.depth >= self.config.max_depth {
            return Err(ConvertError::MaxDepthExceeded {
                path: self.path.clone(),
                max_depth: self.config.max_depth,
            });
        }

        let graph = self.graph;
        let schema_node = graph.node(node, &self.path)?;
        self.stats.nodes_visited += 1;
        tracing::trace!(node = node.index(), kind = schema_node.kind.name(), path = %self.path, "visit");

        match self.registry.begin(node, &self.path) {
            Outcome::Fresh => {}
            Outcome::Cached => {
                self.stats.cache_hits += 1;
                return Ok(self.cached_fragment(node));
            }
            Outcome::Cyclic => {
                let declared = self.declared_name(node, schema_node);
                let name = self.registry.ensure_name(node, declared, &self.path)?;
                self.stats.references_emitted += 1;
                return Ok(self.dialect.reference(&name));
            }
        }

        if let Some(declared) = self.declared_name(node, schema_node) {
            self.registry.ensure_name(node, Some(declared), &self.path)?;
        }

        self.depth += 1;
        self.stats.rules_invoked += 1;
        let result = rules::apply(self, schema_node);
        self.depth -= 1;
        let mut fragment = result?;

        if let Some(description) = &schema_node.meta.description {
            fragment = self
                .dialect
                .annotate(fragment, "description", Value::String(description.clone()));
        }

        if let Err(found) = self.dialect.check_fragment(&fragment) {
            let mut path = self.path.clone();
            for segment in found.at.segments() {
                path.push(segment.as_str());
            }
            return Err(ConvertError::DialectMismatch {
                path,
                keyword: found.keyword,
                target: self.dialect.target(),
            });
        }

        match self.registry.name_of(node).map(str::to_owned) {
            Some(name) => {
                let body = self.relocate(fragment, &self.path.clone(), &self.dialect.pointer_for(&name));
                self.registry.complete(node, body);
                self.stats.references_emitted += 1;
                Ok(self.dialect.reference(&name))
            }
            None => {
                self.registry.complete(node, fragment.clone());
                Ok(fragment)
            }
        }
    }

    /// Declared definition name: `root_name` for the root, else the node's own.
    fn declared_name(&self, node: NodeId, schema_node: &'a SchemaNode) -> Option<&'a str> {
        if self.root == Some(node) {
            if let Some(root_name) = self.config.root_name.as_deref() {
                return Some(root_name);
            }
        }
        schema_node.meta.name.as_deref()
    }

    /// Reuse a resolved node: a reference if hoisted, else a copy whose
    /// location-relative pointers follow it to the current path.
    fn cached_fragment(&mut self, node: NodeId) -> Fragment {
        let Some(record) = self.registry.record(node) else {
            return Fragment::new();
        };
        if let Some(name) = &record.name {
            self.stats.references_emitted += 1;
            return self.dialect.reference(name);
        }
        let built_at = record.path.clone();
        let fragment = record.fragment.clone().unwrap_or_default();
        self.relocate(fragment, &built_at, &self.dialect.local_pointer(&self.path))
    }

    /// Rebase pointers into `fragment` from where it was built to `to`.
    fn relocate(&self, fragment: Fragment, built_at: &TraversalPath, to: &str) -> Fragment {
        let from = self.dialect.local_pointer(built_at);
        let keep = format!("{}/", self.dialect.definitions_pointer());
        let mut value = Value::Object(fragment);
        rebase_refs(&mut value, &from, to, &keep);
        match value {
            Value::Object(map) => map,
            _ => Fragment::new(),
        }
    }
}

/// Convert `root` and everything reachable from it with the built-in rules.
pub fn convert(
    graph: &SchemaGraph,
    root: NodeId,
    config: &DialectConfig,
) -> Result<OutputDocument, ConvertError> {
    Converter::new(graph, config).convert_root(root)
}
