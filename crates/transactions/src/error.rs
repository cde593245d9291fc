//! Transaction codec errors.

use ccd_core::{ErrorKind, SerError};
use thiserror::Error;

use crate::transaction_type::AccountTransactionType;

/// An Error type for transaction objects
#[derive(Debug, Error)]
pub enum TxError {
    /// Serialization-related errors
    #[error(transparent)]
    SerError(#[from] SerError),

    /// An account address was not a 32-byte payload under base58check version 1.
    #[error("Invalid account address: {0}")]
    InvalidAddress(String),

    /// The expiry is in the past and the configuration does not allow it.
    #[error("Transaction expired at {expiry}, now is {now}")]
    ExpiredTransaction {
        /// Expiry in unix seconds
        expiry: u64,
        /// Clock reading in unix seconds
        now: u64,
    },

    /// A signature map must hold at least one credential.
    #[error("No signatures were provided")]
    EmptySignatureSet,

    /// The transaction type has a code but no payload codec.
    #[error("Unsupported transaction type: {0:?}")]
    UnsupportedTransactionType(AccountTransactionType),

    /// The byte does not name any transaction type.
    #[error("Unknown transaction type: {0}")]
    UnknownTransactionType(u8),

    /// A payload left bytes unread inside its declared size.
    #[error("Payload declared {declared} bytes but decoded {decoded}")]
    PayloadSizeMismatch {
        /// Size from the header, type byte excluded
        declared: u64,
        /// Bytes the payload decoder consumed
        decoded: u64,
    },

    /// The signer produced a different number of signatures than it declared, so the signed
    /// header would not match the submitted one.
    #[error("Signer declared {declared} signatures but produced {actual}")]
    SignatureCountMismatch {
        /// Count used for the signing digest
        declared: u64,
        /// Count in the returned signature map
        actual: u64,
    },

    /// Bubbled up from a `Signer`.
    #[error("Signer failed: {0}")]
    Signer(Box<dyn std::error::Error + Send + Sync>),

    /// The energy computation does not fit in a u64.
    #[error("Energy cost overflows u64")]
    EnergyOverflow,

    /// A data blob or memo exceeds 256 bytes.
    #[error("Data blob of {0} bytes exceeds 256 bytes")]
    DataBlobTooLarge(usize),

    /// CBOR encoding of a memo failed.
    #[error("CBOR encoding failed: {0}")]
    Cbor(String),

    /// A contract init name on the wire did not start with `init_`.
    #[error("Init name does not start with init_: {0}")]
    InvalidInitName(String),

    /// An enumerated field held a value outside its range.
    #[error("Invalid {field}: {value}")]
    InvalidEnumValue {
        /// Field name
        field: &'static str,
        /// Rejected value
        value: u64,
    },

    /// A verify key used a signature scheme other than Ed25519.
    #[error("Unknown verify key scheme: {0}")]
    UnknownKeyScheme(u8),

    /// Block items carry version 0.
    #[error("Unsupported block item version: {0}")]
    UnsupportedBlockItemVersion(u8),

    /// Chain update instructions are not decoded by this crate.
    #[error("Update instructions are not supported")]
    UpdateInstructionUnsupported,

    /// The byte does not name any block item kind.
    #[error("Unknown block item kind: {0}")]
    UnknownBlockItemKind(u8),
}

impl From<std::io::Error> for TxError {
    fn from(e: std::io::Error) -> Self {
        TxError::SerError(e.into())
    }
}

impl TxError {
    /// Classify the error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            TxError::SerError(e) => e.kind(),
            TxError::EnergyOverflow | TxError::DataBlobTooLarge(_) => ErrorKind::RangeViolation,
            TxError::UnknownTransactionType(_)
            | TxError::PayloadSizeMismatch { .. }
            | TxError::InvalidInitName(_)
            | TxError::InvalidEnumValue { .. }
            | TxError::UnknownKeyScheme(_)
            | TxError::UnsupportedBlockItemVersion(_)
            | TxError::UnknownBlockItemKind(_) => ErrorKind::MalformedInput,
            TxError::InvalidAddress(_)
            | TxError::ExpiredTransaction { .. }
            | TxError::EmptySignatureSet
            | TxError::UnsupportedTransactionType(_)
            | TxError::SignatureCountMismatch { .. }
            | TxError::Signer(_)
            | TxError::Cbor(_)
            | TxError::UpdateInstructionUnsupported => ErrorKind::DomainInvalid,
        }
    }
}

/// Type alias for result with TxError
pub type TxResult<T> = Result<T, TxError>;
