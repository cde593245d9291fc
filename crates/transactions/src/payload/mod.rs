//! Account transaction payloads.
//!
//! Each payload type implements `TransactionPayload`: its wire encoding through `ByteFormat`, its
//! type code and its base energy cost. `AccountTransactionPayload` is the closed set of payloads
//! this crate can build and decode; its `ByteFormat` implementation includes the leading type
//! byte, so its serialized length is the `payload_size` of the header.

use std::io::{Read, Write};

use ccd_core::{read_u8, write_u8, ByteFormat};
use serde::{Deserialize, Serialize};

use crate::{
    error::{TxError, TxResult},
    primitives::Energy,
    transaction_type::AccountTransactionType,
};

pub mod contract;
pub mod credentials;
pub mod data;
pub mod staking;
pub mod transfer;

pub use contract::*;
pub use credentials::*;
pub use data::*;
pub use staking::*;
pub use transfer::*;

/// A typed payload of an account transaction.
pub trait TransactionPayload: ByteFormat<Error = TxError> {
    /// The type code the payload is sent under
    const TRANSACTION_TYPE: AccountTransactionType;

    /// The payload-dependent part of the energy cost.
    fn base_energy_cost(&self) -> TxResult<Energy>;
}

macro_rules! account_payloads {
    ($($(#[$outer:meta])* $variant:ident($payload:ty),)*) => {
        /// Any supported payload.
        #[derive(Serialize, Deserialize, Clone, Debug, Eq, PartialEq)]
        #[serde(tag = "type", content = "payload", rename_all = "camelCase")]
        pub enum AccountTransactionPayload {
            $(
                $(#[$outer])*
                $variant($payload),
            )*
        }

        $(
            impl From<$payload> for AccountTransactionPayload {
                fn from(payload: $payload) -> Self {
                    AccountTransactionPayload::$variant(payload)
                }
            }
        )*

        impl AccountTransactionPayload {
            /// The type code of the payload.
            pub fn transaction_type(&self) -> AccountTransactionType {
                match self {
                    $(AccountTransactionPayload::$variant(_) => <$payload>::TRANSACTION_TYPE,)*
                }
            }

            /// The payload-dependent part of the energy cost.
            pub fn base_energy_cost(&self) -> TxResult<Energy> {
                match self {
                    $(AccountTransactionPayload::$variant(p) => p.base_energy_cost(),)*
                }
            }

            /// Serialized payload without the type byte.
            pub fn payload_length(&self) -> usize {
                match self {
                    $(AccountTransactionPayload::$variant(p) => p.serialized_length(),)*
                }
            }

            /// Read the payload of a transaction of type `ty`. The type byte must already be
            /// consumed.
            pub fn read_typed<R>(reader: &mut R, ty: AccountTransactionType) -> TxResult<Self>
            where
                R: Read,
            {
                $(
                    if ty == <$payload>::TRANSACTION_TYPE {
                        return Ok(AccountTransactionPayload::$variant(<$payload>::read_from(reader, 0)?));
                    }
                )*
                Err(TxError::UnsupportedTransactionType(ty))
            }

            fn write_payload<W>(&self, writer: &mut W) -> TxResult<usize>
            where
                W: Write,
            {
                match self {
                    $(AccountTransactionPayload::$variant(p) => p.write_to(writer),)*
                }
            }
        }
    };
}

account_payloads! {
    /// Deploy a wasm module
    DeployModule(DeployModule),
    /// Initialize a contract instance
    InitContract(InitContract),
    /// Invoke a contract entrypoint
    UpdateContract(UpdateContract),
    /// Transfer CCD
    Transfer(Transfer),
    /// Add and remove account credentials
    UpdateCredentials(UpdateCredentials),
    /// Register data on chain
    RegisterData(RegisterData),
    /// Transfer CCD with a memo
    TransferWithMemo(TransferWithMemo),
    /// Add, change or remove a baker
    ConfigureBaker(ConfigureBaker),
    /// Add, change or remove a delegation
    ConfigureDelegation(ConfigureDelegation),
}

impl ByteFormat for AccountTransactionPayload {
    type Error = TxError;

    fn serialized_length(&self) -> usize {
        1 + self.payload_length()
    }

    fn read_from<R>(reader: &mut R, _limit: usize) -> TxResult<Self>
    where
        R: Read,
        Self: std::marker::Sized,
    {
        let ty = AccountTransactionType::try_from(read_u8(reader)?)?;
        Self::read_typed(reader, ty)
    }

    fn write_to<W>(&self, writer: &mut W) -> TxResult<usize>
    where
        W: Write,
    {
        let mut len = write_u8(writer, self.transaction_type().code())?;
        len += self.write_payload(writer)?;
        Ok(len)
    }
}
