//! Reference registry: identity-keyed resolution records for one run.
//!
//! Each node reachable from the root gets exactly one [`ResolutionRecord`].
//! A record is `InProgress` while the node is on the traversal stack and
//! `Resolved` once its fragment is complete, so a revisit either detects a
//! cycle or reuses the finished fragment. Nodes that must be referenced by
//! pointer are given a stable name and listed, in naming order, as the
//! document's definitions.

use std::collections::HashMap;
use std::sync::OnceLock;

use regex::Regex;

use crate::config::NamePolicy;
use crate::dialect::Fragment;
use crate::error::ConvertError;
use crate::graph::NodeId;
use crate::pointer::TraversalPath;

/// Prefix of generated names for hoisted nodes without a declared name.
const GENERATED_NAME_PREFIX: &str = "schema";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionState {
    InProgress,
    Resolved,
}

/// What [`ReferenceRegistry::begin`] found for a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// First visit; a record was created `InProgress`.
    Fresh,
    /// The node is its own ancestor on the current path.
    Cyclic,
    /// The node was already resolved earlier in the run.
    Cached,
}

#[derive(Debug, Clone)]
pub struct ResolutionRecord {
    pub node: NodeId,
    pub state: ResolutionState,
    /// Set once `Resolved`. For hoisted nodes this is the definition body.
    pub fragment: Option<Fragment>,
    /// Set only for hoisted nodes.
    pub name: Option<String>,
    /// Where the fragment was first built.
    pub path: TraversalPath,
}

/// Per-run record table: an arena of records plus an id → record map.
#[derive(Debug)]
pub struct ReferenceRegistry {
    records: Vec<ResolutionRecord>,
    index: HashMap<NodeId, usize>,
    names: HashMap<String, usize>,
    hoisted: Vec<usize>,
    generated: usize,
    policy: NamePolicy,
}

impl ReferenceRegistry {
    pub fn new(policy: NamePolicy) -> Self {
        Self {
            records: Vec::new(),
            index: HashMap::new(),
            names: HashMap::new(),
            hoisted: Vec::new(),
            generated: 0,
            policy,
        }
    }

    /// Start processing `node` at `path`.
    pub fn begin(&mut self, node: NodeId, path: &TraversalPath) -> Outcome {
        if let Some(&idx) = self.index.get(&node) {
            return match self.records[idx].state {
                ResolutionState::InProgress => {
                    tracing::debug!(node = node.index(), path = %path, "cycle detected");
                    Outcome::Cyclic
                }
                ResolutionState::Resolved => Outcome::Cached,
            };
        }

        self.index.insert(node, self.records.len());
        self.records.push(ResolutionRecord {
            node,
            state: ResolutionState::InProgress,
            fragment: None,
            name: None,
            path: path.clone(),
        });
        Outcome::Fresh
    }

    /// Mark `node` resolved with its finished fragment.
    pub fn complete(&mut self, node: NodeId, fragment: Fragment) {
        if let Some(&idx) = self.index.get(&node) {
            let record = &mut self.records[idx];
            record.state = ResolutionState::Resolved;
            record.fragment = Some(fragment);
        }
    }

    /// Return the node's definition name, assigning one on first call.
    ///
    /// `declared` is the node's own identifier, if it has one; otherwise a
    /// `schema{n}` name is generated. A taken name is resolved per the
    /// [`NamePolicy`]; generated names always skip taken ones.
    pub fn ensure_name(
        &mut self,
        node: NodeId,
        declared: Option<&str>,
        path: &TraversalPath,
    ) -> Result<String, ConvertError> {
        let idx = *self
            .index
            .get(&node)
            .ok_or_else(|| ConvertError::SchemaError {
                path: path.clone(),
                message: format!("node {} has no resolution record", node.index()),
            })?;
        if let Some(name) = &self.records[idx].name {
            return Ok(name.clone());
        }

        let name = match declared {
            Some(declared) => self.claim_declared(&sanitize_name(declared), path)?,
            None => self.next_generated(),
        };

        tracing::debug!(node = node.index(), name = %name, path = %path, "hoisting node");
        self.names.insert(name.clone(), idx);
        self.hoisted.push(idx);
        self.records[idx].name = Some(name.clone());
        Ok(name)
    }

    fn claim_declared(&self, base: &str, path: &TraversalPath) -> Result<String, ConvertError> {
        let Some(&owner) = self.names.get(base) else {
            return Ok(base.to_string());
        };
        match self.policy {
            NamePolicy::Error => Err(ConvertError::NameCollision {
                name: base.to_string(),
                first_path: self.records[owner].path.clone(),
                second_path: path.clone(),
            }),
            NamePolicy::Suffix => {
                let mut n = 2;
                loop {
                    let candidate = format!("{base}_{n}");
                    if !self.names.contains_key(&candidate) {
                        return Ok(candidate);
                    }
                    n += 1;
                }
            }
        }
    }

    fn next_generated(&mut self) -> String {
        loop {
            let candidate = format!("{GENERATED_NAME_PREFIX}{}", self.generated);
            self.generated += 1;
            if !self.names.contains_key(&candidate) {
                return candidate;
            }
        }
    }

    pub fn record(&self, node: NodeId) -> Option<&ResolutionRecord> {
        self.index.get(&node).map(|&idx| &self.records[idx])
    }

    /// The assigned name, if `node` is hoisted.
    pub fn name_of(&self, node: NodeId) -> Option<&str> {
        self.record(node).and_then(|r| r.name.as_deref())
    }

    /// Hoisted `(name, fragment)` pairs in the order names were assigned.
    ///
    /// A hoisted node that never finished resolving is skipped; that only
    /// happens when the run is aborting with an error.
    pub fn definitions(&self) -> Vec<(String, Fragment)> {
        self.hoisted
            .iter()
            .filter_map(|&idx| {
                let record = &self.records[idx];
                Some((record.name.clone()?, record.fragment.clone()?))
            })
            .collect()
    }
}

/// Restrict a declared name to characters that are safe in a pointer and a
/// URI fragment. Everything else becomes `_`; an empty name becomes `_`.
pub fn sanitize_name(name: &str) -> String {
    static INVALID: OnceLock<Regex> = OnceLock::new();
    let invalid =
        INVALID.get_or_init(|| Regex::new(r"[^A-Za-z0-9_.\-]").expect("static pattern is valid"));
    let cleaned = invalid.replace_all(name, "_");
    if cleaned.is_empty() {
        "_".to_string()
    } else {
        cleaned.into_owned()
    }
}
