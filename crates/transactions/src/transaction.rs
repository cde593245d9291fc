//! Account transactions: energy and size derivation, the signing digest, the transaction hash and
//! the submission envelope.
//!
//! ```text
//! signing digest   = SHA-256(header ∥ type ∥ payload)
//! block item       = kind(0) ∥ signatures ∥ header ∥ type ∥ payload
//! transaction hash = SHA-256(block item)
//! submission       = version(0) ∥ block item
//! ```

use std::io::Write;

use ccd_core::{sha256, write_u8, ByteFormat, MarkedDigestWriter, SerError, Sha256Writer};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::{
    config::{Clock, SystemClock, TransactionConfig},
    energy::{EnergyModel, LinearEnergyModel},
    error::{TxError, TxResult},
    hashes::{SigningDigest, TransactionHash},
    header::{AccountTransactionHeader, WireHeader},
    payload::AccountTransactionPayload,
    primitives::Energy,
    signature::{AccountTransactionSignature, Signer},
    transaction_type::{AccountTransactionType, BlockItemKind},
};

/// Version byte of the submission envelope.
pub const BLOCK_ITEM_VERSION: u8 = 0;

/// An unsigned account transaction.
#[derive(Serialize, Deserialize, Clone, Debug, Eq, PartialEq)]
pub struct AccountTransaction {
    /// Sender, nonce and expiry
    pub header: AccountTransactionHeader,
    /// Typed payload
    pub payload: AccountTransactionPayload,
}

impl AccountTransaction {
    /// Instantiate a transaction
    pub fn new<P>(header: AccountTransactionHeader, payload: P) -> Self
    where
        P: Into<AccountTransactionPayload>,
    {
        Self {
            header,
            payload: payload.into(),
        }
    }

    /// The type of the payload
    pub fn transaction_type(&self) -> AccountTransactionType {
        self.payload.transaction_type()
    }
}

/// Type byte and payload, serialized once, with the derived header.
struct Prepared {
    header: WireHeader,
    payload: Vec<u8>,
}

impl Prepared {
    fn write_unsigned<W>(&self, writer: &mut W) -> TxResult<usize>
    where
        W: Write,
    {
        let len = self.header.write_to(writer)?;
        writer.write_all(&self.payload)?;
        Ok(len + self.payload.len())
    }
}

/// Serializes and digests account transactions under a configuration, an energy model and a
/// clock.
#[derive(Clone, Debug, Default)]
pub struct TransactionCodec<M = LinearEnergyModel, C = SystemClock> {
    /// Options
    pub config: TransactionConfig,
    /// Energy pricing
    pub energy_model: M,
    /// Time source for expiry checks
    pub clock: C,
}

impl<M, C> TransactionCodec<M, C>
where
    M: EnergyModel,
    C: Clock,
{
    /// Instantiate a codec
    pub fn new(config: TransactionConfig, energy_model: M, clock: C) -> Self {
        Self {
            config,
            energy_model,
            clock,
        }
    }

    fn check_expiry(&self, header: &AccountTransactionHeader) -> TxResult<()> {
        let now = self.clock.now_unix_seconds();
        if header.expiry.is_expired_at(now) {
            if !self.config.allow_expired {
                return Err(TxError::ExpiredTransaction {
                    expiry: header.expiry.0,
                    now,
                });
            }
            warn!(expiry = header.expiry.0, now, "serializing an expired transaction");
        }
        Ok(())
    }

    fn prepare(&self, tx: &AccountTransaction, signature_count: u64) -> TxResult<Prepared> {
        self.check_expiry(&tx.header)?;
        let payload = tx.payload.to_bytes()?;
        let payload_size = u32::try_from(payload.len()).map_err(|_| SerError::LengthOutOfRange {
            length: payload.len() as u64,
            max: u32::MAX as u64,
        })?;
        let energy = self.energy_model.cost(
            signature_count,
            payload_size as u64,
            tx.payload.base_energy_cost()?,
        )?;
        debug!(
            transaction_type = ?tx.transaction_type(),
            payload_size,
            signature_count,
            energy = energy.0,
            "derived transaction header"
        );
        Ok(Prepared {
            header: tx.header.to_wire(energy, payload_size),
            payload,
        })
    }

    /// Energy the header of `tx` carries when signed `signature_count` times.
    pub fn energy_cost(&self, tx: &AccountTransaction, signature_count: u64) -> TxResult<Energy> {
        Ok(self.prepare(tx, signature_count)?.header.energy_amount)
    }

    /// The header with derived energy and payload size.
    pub fn wire_header(&self, tx: &AccountTransaction, signature_count: u64) -> TxResult<WireHeader> {
        Ok(self.prepare(tx, signature_count)?.header)
    }

    /// The digest to sign, priced for the configured default signature count.
    pub fn signing_digest(&self, tx: &AccountTransaction) -> TxResult<SigningDigest> {
        self.signing_digest_with_count(tx, self.config.default_signature_count)
    }

    /// The digest to sign, priced for `signature_count` signatures.
    pub fn signing_digest_with_count(
        &self,
        tx: &AccountTransaction,
        signature_count: u64,
    ) -> TxResult<SigningDigest> {
        let prepared = self.prepare(tx, signature_count)?;
        let mut w = Sha256Writer::default();
        prepared.write_unsigned(&mut w)?;
        let digest: SigningDigest = w.finish_marked();
        debug!(digest = %digest, "computed signing digest");
        Ok(digest)
    }

    /// The block item: kind ∥ signatures ∥ header ∥ type ∥ payload, priced for the signatures
    /// given.
    pub fn serialize_block_item(
        &self,
        tx: &AccountTransaction,
        signatures: &AccountTransactionSignature,
    ) -> TxResult<Vec<u8>> {
        let prepared = self.prepare(tx, signatures.count())?;
        let mut buf = Vec::with_capacity(
            1 + signatures.serialized_length() + prepared.header.serialized_length() + prepared.payload.len(),
        );
        write_u8(&mut buf, BlockItemKind::AccountTransaction as u8)?;
        signatures.write_to(&mut buf)?;
        prepared.write_unsigned(&mut buf)?;
        Ok(buf)
    }

    /// SHA-256 over the block item.
    pub fn transaction_hash(
        &self,
        tx: &AccountTransaction,
        signatures: &AccountTransactionSignature,
    ) -> TxResult<TransactionHash> {
        Ok(hash_block_item(&self.serialize_block_item(tx, signatures)?))
    }

    /// The bytes to submit: version ∥ block item.
    pub fn submission_bytes(
        &self,
        tx: &AccountTransaction,
        signatures: &AccountTransactionSignature,
    ) -> TxResult<Vec<u8>> {
        Ok(envelope(&self.serialize_block_item(tx, signatures)?))
    }

    /// Sign `tx` with `signer`. The digest is priced for the signer's declared signature count,
    /// and the signer must return exactly that many signatures.
    pub fn sign<S>(&self, tx: AccountTransaction, signer: &S) -> TxResult<SignedAccountTransaction>
    where
        S: Signer,
    {
        let declared = signer.signature_count();
        let digest = self.signing_digest_with_count(&tx, declared)?;
        let signature = signer
            .sign(&digest)
            .map_err(|e| TxError::Signer(Box::new(e)))?;
        let actual = signature.count();
        if actual != declared {
            return Err(TxError::SignatureCountMismatch { declared, actual });
        }
        let block_item = self.serialize_block_item(&tx, &signature)?;
        Ok(SignedAccountTransaction {
            transaction: tx,
            signature,
            block_item,
        })
    }
}

pub(crate) fn hash_block_item(block_item: &[u8]) -> TransactionHash {
    TransactionHash(sha256(&[block_item]))
}

fn envelope(block_item: &[u8]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(1 + block_item.len());
    buf.push(BLOCK_ITEM_VERSION);
    buf.extend_from_slice(block_item);
    buf
}

/// A transaction with its signatures, serialized and ready to submit.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SignedAccountTransaction {
    transaction: AccountTransaction,
    signature: AccountTransactionSignature,
    block_item: Vec<u8>,
}

impl SignedAccountTransaction {
    /// The unsigned transaction
    pub fn transaction(&self) -> &AccountTransaction {
        &self.transaction
    }

    /// The signatures
    pub fn signature(&self) -> &AccountTransactionSignature {
        &self.signature
    }

    /// The serialized block item
    pub fn block_item_bytes(&self) -> &[u8] {
        &self.block_item
    }

    /// The hash the transaction is known by on chain.
    pub fn hash(&self) -> TransactionHash {
        hash_block_item(&self.block_item)
    }

    /// The bytes to submit to a node.
    pub fn to_submission_bytes(&self) -> Vec<u8> {
        envelope(&self.block_item)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        config::FixedClock,
        payload::{RegisterData, Transfer},
        primitives::{AccountAddress, Amount, DataBlob, TransactionExpiry},
        signature::Signature,
    };

    const EXPIRY: u64 = 1_893_456_000;

    fn codec(now: u64) -> TransactionCodec<LinearEnergyModel, FixedClock> {
        TransactionCodec::new(
            TransactionConfig::default(),
            LinearEnergyModel::default(),
            FixedClock(now),
        )
    }

    fn transfer() -> AccountTransaction {
        AccountTransaction::new(
            AccountTransactionHeader::new(
                AccountAddress([0u8; 32]),
                1,
                TransactionExpiry(EXPIRY),
            ),
            Transfer::new(AccountAddress([0u8; 32]), Amount(100)),
        )
    }

    struct FixedSigner {
        keys: u8,
    }

    #[derive(Debug, thiserror::Error)]
    #[error("signer failed")]
    struct SignerFailure;

    impl Signer for FixedSigner {
        type Error = SignerFailure;

        fn sign(&self, digest: &SigningDigest) -> Result<AccountTransactionSignature, SignerFailure> {
            if self.keys == 0 {
                return Err(SignerFailure);
            }
            let mut signatures = AccountTransactionSignature::default();
            for key in 0..self.keys {
                signatures.insert(0, key, Signature(digest.0.to_vec()));
            }
            Ok(signatures)
        }

        fn signature_count(&self) -> u64 {
            1
        }
    }

    #[test]
    fn it_derives_header_fields() {
        let header = codec(0).wire_header(&transfer(), 1).unwrap();
        assert_eq!(header.payload_size, 41);
        assert_eq!(header.energy_amount, Energy(501));
        assert_eq!(codec(0).energy_cost(&transfer(), 2).unwrap(), Energy(601));
    }

    #[test]
    fn it_prices_the_digest_for_the_signature_count() {
        let codec = codec(0);
        let tx = transfer();
        assert_eq!(
            codec.signing_digest(&tx).unwrap(),
            codec.signing_digest_with_count(&tx, 1).unwrap()
        );
        assert_ne!(
            codec.signing_digest_with_count(&tx, 1).unwrap(),
            codec.signing_digest_with_count(&tx, 2).unwrap()
        );
    }

    #[test]
    fn it_rejects_expired_transactions() {
        let tx = transfer();
        assert!(matches!(
            codec(EXPIRY + 1).signing_digest(&tx),
            Err(TxError::ExpiredTransaction { expiry: EXPIRY, now }) if now == EXPIRY + 1
        ));
        assert!(codec(EXPIRY).signing_digest(&tx).is_ok());

        let mut lenient = codec(EXPIRY + 1);
        lenient.config.allow_expired = true;
        assert_eq!(
            lenient.signing_digest(&tx).unwrap(),
            codec(0).signing_digest(&tx).unwrap()
        );
    }

    #[test]
    fn it_lays_out_block_items() {
        let codec = codec(0);
        let tx = transfer();
        let signatures = AccountTransactionSignature::single(Signature(vec![0xaa]));
        let item = codec.serialize_block_item(&tx, &signatures).unwrap();
        assert_eq!(item.len(), 1 + 7 + 60 + 41);
        assert_eq!(item[0], 0);
        assert_eq!(&item[1..8], &[1, 0, 1, 0, 0, 1, 0xaa]);
        assert_eq!(item[68], AccountTransactionType::Transfer.code());

        let submission = codec.submission_bytes(&tx, &signatures).unwrap();
        assert_eq!(submission[0], BLOCK_ITEM_VERSION);
        assert_eq!(&submission[1..], &item[..]);
        assert_eq!(
            codec.transaction_hash(&tx, &signatures).unwrap(),
            hash_block_item(&item)
        );
    }

    #[test]
    fn it_signs_transactions() {
        let codec = codec(0);
        let signed = codec.sign(transfer(), &FixedSigner { keys: 1 }).unwrap();
        let digest = codec.signing_digest(&transfer()).unwrap();
        assert_eq!(signed.signature().count(), 1);
        assert_eq!(signed.signature().0[&0][&0], Signature(digest.0.to_vec()));
        assert_eq!(
            signed.hash(),
            codec.transaction_hash(signed.transaction(), signed.signature()).unwrap()
        );
        assert_eq!(signed.to_submission_bytes()[1..], signed.block_item_bytes()[..]);
    }

    #[test]
    fn it_rejects_signers_that_break_their_count() {
        let codec = codec(0);
        assert!(matches!(
            codec.sign(transfer(), &FixedSigner { keys: 2 }),
            Err(TxError::SignatureCountMismatch { declared: 1, actual: 2 })
        ));
        let err = codec.sign(transfer(), &FixedSigner { keys: 0 }).unwrap_err();
        assert!(matches!(err, TxError::Signer(_)));
        assert_eq!(err.to_string(), "Signer failed: signer failed");
    }

    #[test]
    fn it_refuses_empty_signature_maps() {
        let tx = AccountTransaction::new(
            AccountTransactionHeader::new(AccountAddress([1; 32]), 7, TransactionExpiry(EXPIRY)),
            RegisterData::new(DataBlob::new(vec![1, 2, 3]).unwrap()),
        );
        assert!(matches!(
            codec(0).serialize_block_item(&tx, &AccountTransactionSignature::default()),
            Err(TxError::EmptySignatureSet)
        ));

        let mut keyless = AccountTransactionSignature::default();
        keyless.0.insert(0, Default::default());
        assert!(matches!(
            codec(0).serialize_block_item(&tx, &keyless),
            Err(TxError::EmptySignatureSet)
        ));
    }
}
