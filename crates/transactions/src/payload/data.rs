//! On-chain data registration.

use std::io::{Read, Write};

use ccd_core::ByteFormat;
use serde::{Deserialize, Serialize};

use crate::{
    error::{TxError, TxResult},
    payload::TransactionPayload,
    primitives::{DataBlob, Energy},
    transaction_type::AccountTransactionType,
};

/// Register up to 256 bytes of data on chain.
#[derive(Serialize, Deserialize, Clone, Debug, Eq, PartialEq)]
pub struct RegisterData {
    /// The registered bytes
    pub data: DataBlob,
}

impl RegisterData {
    /// Instantiate a data registration
    pub fn new(data: DataBlob) -> Self {
        Self { data }
    }
}

impl ByteFormat for RegisterData {
    type Error = TxError;

    fn serialized_length(&self) -> usize {
        self.data.serialized_length()
    }

    fn read_from<R>(reader: &mut R, _limit: usize) -> TxResult<Self>
    where
        R: Read,
        Self: std::marker::Sized,
    {
        Ok(Self::new(DataBlob::read_from(reader, 0)?))
    }

    fn write_to<W>(&self, writer: &mut W) -> TxResult<usize>
    where
        W: Write,
    {
        self.data.write_to(writer)
    }
}

impl TransactionPayload for RegisterData {
    const TRANSACTION_TYPE: AccountTransactionType = AccountTransactionType::RegisterData;

    fn base_energy_cost(&self) -> TxResult<Energy> {
        Ok(Energy(300))
    }
}
