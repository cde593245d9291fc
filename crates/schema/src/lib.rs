//! # CCD Schema
//!
//! `ccd-schema` decodes the self-describing binary schemas embedded in smart-contract modules,
//! and encodes them back. A schema describes the shape of contract parameters, return values,
//! errors, events and (for the oldest modules) state.
//!
//! ## Crate Layout
//!
//! - `types` holds the recursive `SchemaType` grammar and the `Fields` of structs and enum
//!   variants.
//! - `function`, `contract` and `module` compose the grammar into per-version function, contract
//!   and module schemas.
//! - `size` holds the size-length selector and the list, map, string and option combinators the
//!   other modules are built from.
//!
//! Every schema value implements `ccd_core::ByteFormat`. Decoding reads through its own cursor
//! over an immutable buffer and fails on the first structural violation, so a partial tree is
//! never returned.
//!
//! ```
//! use ccd_schema::{decode_module, VersionedSchemaModule};
//!
//! // versioned, version 3, no contracts
//! let bytes = [0xff, 0xff, 0x03, 0x00, 0x00, 0x00, 0x00];
//! let module = decode_module(&bytes, None).unwrap();
//! assert_eq!(module.version(), 3);
//! assert!(matches!(module, VersionedSchemaModule::V3(_)));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(unused_extern_crates)]

pub mod contract;
pub mod error;
pub mod function;
pub mod module;
pub mod size;
pub mod types;

pub use contract::*;
pub use error::*;
pub use function::*;
pub use module::*;
pub use size::*;
pub use types::*;
