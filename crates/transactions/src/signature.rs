//! Account transaction signatures and the `Signer` capability.

use std::{
    collections::BTreeMap,
    io::{Read, Write},
};

use ccd_core::{read_prefixed, read_u8, write_prefixed, write_u8, ByteFormat, Endian, LengthPrefix};
use serde::{Deserialize, Serialize};

use crate::{
    error::{TxError, TxResult},
    hashes::SigningDigest,
    primitives::hex_bytes,
};

const SIGNATURE_PREFIX: LengthPrefix = LengthPrefix::U16(Endian::Big);
const MAP_PREFIX: LengthPrefix = LengthPrefix::U8;

/// A single key signature. The bytes are opaque to this crate.
#[derive(Serialize, Deserialize, Clone, Debug, Default, Eq, PartialEq, Hash)]
#[serde(transparent)]
pub struct Signature(#[serde(with = "hex_bytes")] pub Vec<u8>);

impl From<Vec<u8>> for Signature {
    fn from(v: Vec<u8>) -> Self {
        Self(v)
    }
}

/// Signatures keyed by credential index, then key index.
#[derive(Serialize, Deserialize, Clone, Debug, Default, Eq, PartialEq)]
#[serde(transparent)]
pub struct AccountTransactionSignature(pub BTreeMap<u8, BTreeMap<u8, Signature>>);

impl AccountTransactionSignature {
    /// A map with a single credential and key.
    pub fn single(signature: Signature) -> Self {
        let mut keys = BTreeMap::new();
        keys.insert(0, signature);
        let mut credentials = BTreeMap::new();
        credentials.insert(0, keys);
        Self(credentials)
    }

    /// Add a signature, replacing any previous one under the same indices.
    pub fn insert(&mut self, credential_index: u8, key_index: u8, signature: Signature) {
        self.0
            .entry(credential_index)
            .or_default()
            .insert(key_index, signature);
    }

    /// Total number of key signatures across all credentials.
    pub fn count(&self) -> u64 {
        self.0.values().map(|keys| keys.len() as u64).sum()
    }

    /// True if no credential carries signatures
    pub fn is_empty(&self) -> bool {
        self.count() == 0
    }

    /// Every listed credential must carry at least one key signature.
    fn check_non_empty(&self) -> TxResult<()> {
        if self.is_empty() || self.0.values().any(BTreeMap::is_empty) {
            return Err(TxError::EmptySignatureSet);
        }
        Ok(())
    }
}

impl ByteFormat for AccountTransactionSignature {
    type Error = TxError;

    fn serialized_length(&self) -> usize {
        1 + self
            .0
            .values()
            .map(|keys| 2 + keys.values().map(|sig| 3 + sig.0.len()).sum::<usize>())
            .sum::<usize>()
    }

    fn read_from<R>(reader: &mut R, _limit: usize) -> TxResult<Self>
    where
        R: Read,
        Self: std::marker::Sized,
    {
        let mut signatures = Self::default();
        let credentials = read_u8(reader)?;
        for _ in 0..credentials {
            let credential_index = read_u8(reader)?;
            let keys = read_u8(reader)?;
            if keys == 0 {
                return Err(TxError::EmptySignatureSet);
            }
            for _ in 0..keys {
                let key_index = read_u8(reader)?;
                let signature = Signature(read_prefixed(reader, SIGNATURE_PREFIX)?);
                signatures.insert(credential_index, key_index, signature);
            }
        }
        signatures.check_non_empty()?;
        Ok(signatures)
    }

    fn write_to<W>(&self, writer: &mut W) -> TxResult<usize>
    where
        W: Write,
    {
        self.check_non_empty()?;
        let mut len = MAP_PREFIX.write_length(writer, self.0.len() as u64)?;
        for (credential_index, keys) in self.0.iter() {
            len += write_u8(writer, *credential_index)?;
            len += MAP_PREFIX.write_length(writer, keys.len() as u64)?;
            for (key_index, signature) in keys.iter() {
                len += write_u8(writer, *key_index)?;
                len += write_prefixed(writer, SIGNATURE_PREFIX, &signature.0)?;
            }
        }
        Ok(len)
    }
}

/// Produces signatures over a signing digest. Implementations own the key material.
pub trait Signer {
    /// An associated error type
    type Error: std::error::Error + Send + Sync + 'static;

    /// Sign `digest`.
    fn sign(&self, digest: &SigningDigest) -> Result<AccountTransactionSignature, Self::Error>;

    /// Number of signatures `sign` produces. It is priced into the signed header.
    fn signature_count(&self) -> u64;
}
