//! Error types for schema conversion.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::Target;
use crate::pointer::TraversalPath;

/// Stable, machine-readable error codes.
///
/// Variant names and their serialized `snake_case` strings are part of the
/// public contract and must not change across versions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[non_exhaustive]
pub enum ErrorCode {
    /// Configuration (de)serialization error.
    JsonParseError,
    /// Malformed input graph (pending node, foreign node id).
    SchemaError,
    /// A node kind has no rule and strict mode is on.
    UnsupportedType,
    /// Two distinct nodes claim the same definition name.
    NameCollision,
    /// Traversal nesting exceeded the configured ceiling.
    MaxDepthExceeded,
    /// A rule emitted a keyword the active dialect does not support.
    DialectMismatch,
}

#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("JSON (de)serialization error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Schema error at {path}: {message}")]
    SchemaError {
        path: TraversalPath,
        message: String,
    },

    #[error("Unsupported node kind '{kind}' at {path}")]
    UnsupportedType { path: TraversalPath, kind: String },

    #[error("Definition name '{name}' claimed by nodes at {first_path} and {second_path}")]
    NameCollision {
        name: String,
        first_path: TraversalPath,
        second_path: TraversalPath,
    },

    #[error("Max depth exceeded at {path} (max: {max_depth})")]
    MaxDepthExceeded {
        path: TraversalPath,
        max_depth: usize,
    },

    #[error("Keyword '{keyword}' is not valid for target {target} at {path}")]
    DialectMismatch {
        path: TraversalPath,
        keyword: String,
        target: Target,
    },
}

impl ConvertError {
    /// Returns the stable error code for this error variant.
    pub fn error_code(&self) -> ErrorCode {
        match self {
            ConvertError::JsonError(_) => ErrorCode::JsonParseError,
            ConvertError::SchemaError { .. } => ErrorCode::SchemaError,
            ConvertError::UnsupportedType { .. } => ErrorCode::UnsupportedType,
            ConvertError::NameCollision { .. } => ErrorCode::NameCollision,
            ConvertError::MaxDepthExceeded { .. } => ErrorCode::MaxDepthExceeded,
            ConvertError::DialectMismatch { .. } => ErrorCode::DialectMismatch,
        }
    }

    /// The traversal path at the point of failure.
    ///
    /// For `NameCollision` this is the path of the second claimant.
    /// Returns `None` for `JsonError` (no traversal context).
    pub fn path(&self) -> Option<&TraversalPath> {
        match self {
            ConvertError::JsonError(_) => None,
            ConvertError::SchemaError { path, .. }
            | ConvertError::UnsupportedType { path, .. }
            | ConvertError::MaxDepthExceeded { path, .. }
            | ConvertError::DialectMismatch { path, .. } => Some(path),
            ConvertError::NameCollision { second_path, .. } => Some(second_path),
        }
    }

    /// Structured form: `{"code": "...", "message": "...", "path": "..." | null}`.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "code": self.error_code(),
            "message": self.to_string(),
            "path": self.path().map(ToString::to_string),
        })
    }
}
