//! # CCD Transactions
//!
//! `ccd-transactions` builds, digests and decodes account transactions and credential
//! deployments in their network wire format.
//!
//! The flow for an account transaction:
//!
//! 1. Build an `AccountTransaction` from a header and a typed payload.
//! 2. `TransactionCodec::signing_digest` serializes the payload, derives the energy amount and
//!    payload size, and hashes header, type and payload into a `SigningDigest`.
//! 3. An external `Signer` signs the digest and returns an `AccountTransactionSignature`.
//! 4. `TransactionCodec::sign` bundles everything into a `SignedAccountTransaction`, which yields
//!    the `TransactionHash` used to poll for status and the bytes to submit.
//!
//! Energy pricing and the clock used for expiry checks are injected (`EnergyModel`, `Clock`), so
//! every computation is a pure function of its inputs.
//!
//! Multi-byte integers are big-endian throughout.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(unused_extern_crates)]

pub mod block_item;
pub mod config;
pub mod credential;
pub mod energy;
pub mod error;
pub mod hashes;
pub mod header;
pub mod payload;
pub mod primitives;
pub mod signature;
pub mod transaction;
pub mod transaction_type;

pub use block_item::*;
pub use config::*;
pub use credential::*;
pub use energy::*;
pub use error::*;
pub use hashes::*;
pub use header::*;
pub use payload::*;
pub use primitives::*;
pub use signature::*;
pub use transaction::*;
pub use transaction_type::*;
