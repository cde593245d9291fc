//! # CCD Core
//!
//! `ccd-core` contains the primitive codec used by the `ccd-schema` and
//! `ccd-transactions` crates.
//!
//! ## Crate Layout
//!
//! ### ByteFormat trait
//!
//! The `ByteFormat` trait is a simple serialization API using
//! `std::io::{Read, Write}`. Implementers define the binary serialization
//! format of the type. Decoding reads through a `Read` over an immutable byte
//! slice, so every decode call owns its own cursor and no state is shared
//! between calls.
//!
//! `ByteFormat` has an associated `Error` type. Most basic types can simply use
//! the provided `SerError`. More complex (de)serialization will want to
//! implement a custom error type to handle (e.g.) unknown tags. These types
//! must be easily instantiated from a `SerError` or an `std::io::Error`.
//!
//! The module also carries range-checked fixed-width encoders, LEB128 and
//! length-prefixed byte blobs.
//!
//! ### Hashes
//!
//! The hashes module provides a `Write` interface over SHA-256 and utilities
//! for newtyping hash outputs. These newtypes are called marked digests and
//! are intended to be used for a specific purpose, e.g. a transaction hash
//! versus the digest a signer signs.
//!
//! ### Enc
//!
//! Base58check helpers for versioned, checksummed text encodings.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(unused_extern_crates)]

#[macro_use]
pub mod macros;

pub mod enc;
pub mod hashes;
pub mod leb128;
pub mod ser;

pub use enc::*;
pub use hashes::*;
pub use leb128::*;
pub use ser::*;

#[doc(hidden)]
pub use hex;
