//! Schema decoding and encoding errors.

use ccd_core::{ErrorKind, SerError};
use thiserror::Error;

/// Errors raised while decoding or encoding a schema.
#[derive(Debug, Error)]
pub enum SchemaError {
    /// Bubbled up from the primitive codec: short reads, bad UTF-8, lengths exceeding their
    /// size-length.
    #[error(transparent)]
    SerError(#[from] SerError),

    /// A versioned module did not start with `ff ff`.
    #[error("Expected versioned schema magic ffff. Got {0:02x?}")]
    MagicMismatch([u8; 2]),

    /// The module version is not one this crate understands.
    #[error("Unsupported schema version: {0}")]
    UnsupportedVersion(u8),

    /// The size-length selector byte was not in `0..=3`.
    #[error("Unknown size length tag: {0}")]
    InvalidSizeLength(u8),

    /// Unknown `SchemaType` tag.
    #[error("Unknown schema type tag: {0}")]
    UnknownTypeTag(u8),

    /// Unknown `Fields` tag.
    #[error("Unknown fields tag: {0}")]
    InvalidFieldsTag(u8),

    /// The function schema tag does not select a combination of parameter, return value and
    /// error.
    #[error("Unknown function schema tag: {0}")]
    InvalidFunctionTag(u8),

    /// A function schema with no parameter, return value or error has no wire representation.
    #[error("Function schema has nothing to encode")]
    EmptyFunctionSchema,

    /// Two variants of a tagged enum share a tag byte.
    #[error("Duplicate tagged enum variant tag: {0}")]
    DuplicateVariantTag(u8),

    /// Types nested deeper than the decoder follows.
    #[error("Schema types nested deeper than {0} levels")]
    NestingTooDeep(usize),

    /// An unversioned schema was given without an out-of-band version.
    #[error("Unversioned schema requires an explicit version")]
    MissingVersion,

    /// A lookup named a contract the module does not describe.
    #[error("No schema for contract {0}")]
    ContractNotFound(String),
}

impl From<std::io::Error> for SchemaError {
    fn from(e: std::io::Error) -> Self {
        SchemaError::SerError(e.into())
    }
}

impl SchemaError {
    /// Classify the error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            SchemaError::SerError(e) => e.kind(),
            SchemaError::ContractNotFound(_) => ErrorKind::DomainInvalid,
            SchemaError::EmptyFunctionSchema | SchemaError::DuplicateVariantTag(_) => {
                ErrorKind::DomainInvalid
            }
            _ => ErrorKind::MalformedInput,
        }
    }
}

/// Type alias for schema results
pub type SchemaResult<T> = Result<T, SchemaError>;
