use thiserror::Error;

/// Errors produced while saving or loading serialized graphs.
#[derive(Debug, Error)]
pub enum GraphError {
    /// JSON text did not parse or violated the top-level layout.
    #[error("malformed input: {reason}")]
    MalformedInput {
        /// Parse failure description.
        reason: String,
    },
    /// A node named a type key with no registry entry.
    #[error("unknown type key `{type_key}` at node {node}")]
    UnknownTypeKey {
        /// The unresolved key.
        type_key: String,
        /// Node index where the key appeared.
        node: usize,
    },
    /// A declared field had no matching attrs entry.
    #[error("missing field `{field}` at node {node}")]
    MissingField {
        /// Declared field name.
        field: &'static str,
        /// Node index being filled.
        node: usize,
    },
    /// An attrs entry could not be decoded as its declared type.
    #[error("bad value `{value}` for field `{field}` at node {node}")]
    BadFieldValue {
        /// Declared field name (`v_*` keys for whole-value nodes).
        field: String,
        /// Offending attribute text.
        value: String,
        /// Node index being decoded.
        node: usize,
    },
    /// Node references form a true cycle.
    #[error("Cyclic reference detected")]
    Cycle,
    /// A value has no reflection metadata and cannot be serialized.
    #[error("unsupported type `{type_key}`: {reason}")]
    UnsupportedType {
        /// Type key of the offending value.
        type_key: String,
        /// What was attempted.
        reason: &'static str,
    },
    /// Base64 or repr payload decoding failed.
    #[error("repr decode failed at node {node}: {reason}")]
    ReprDecode {
        /// Node index carrying the repr payload.
        node: usize,
        /// Decode failure description.
        reason: String,
    },
}
