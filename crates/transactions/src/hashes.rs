//! This module holds `MarkedDigest` types used by transactions: the digest a signer signs, and
//! the hash a submitted block item is known by.

use ccd_core::mark_32_byte_hash;

mark_32_byte_hash!(
    /// SHA-256 over header, type byte and payload. This is what signers sign.
    SigningDigest
);

mark_32_byte_hash!(
    /// SHA-256 over a serialized block item without its version byte. Used to look up the
    /// status of a submitted transaction.
    TransactionHash
);
