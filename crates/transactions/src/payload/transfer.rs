//! CCD transfers.

use std::io::{Read, Write};

use ccd_core::ByteFormat;
use serde::{Deserialize, Serialize};

use crate::{
    error::{TxError, TxResult},
    payload::TransactionPayload,
    primitives::{AccountAddress, Amount, Energy, Memo},
    transaction_type::AccountTransactionType,
};

/// Base energy of a plain or memo transfer.
pub const TRANSFER_BASE_ENERGY: Energy = Energy(300);

/// Transfer CCD to an account. Wire form: address(32) ∥ amount(u64).
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Eq, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Transfer {
    /// Receiving account
    pub to_address: AccountAddress,
    /// Amount to send
    pub amount: Amount,
}

impl Transfer {
    /// Instantiate a transfer
    pub fn new(to_address: AccountAddress, amount: Amount) -> Self {
        Self { to_address, amount }
    }
}

impl ByteFormat for Transfer {
    type Error = TxError;

    fn serialized_length(&self) -> usize {
        40
    }

    fn read_from<R>(reader: &mut R, _limit: usize) -> TxResult<Self>
    where
        R: Read,
        Self: std::marker::Sized,
    {
        Ok(Self {
            to_address: AccountAddress::read_from(reader, 0)?,
            amount: Amount::read_from(reader, 0)?,
        })
    }

    fn write_to<W>(&self, writer: &mut W) -> TxResult<usize>
    where
        W: Write,
    {
        Ok(self.to_address.write_to(writer)? + self.amount.write_to(writer)?)
    }
}

impl TransactionPayload for Transfer {
    const TRANSACTION_TYPE: AccountTransactionType = AccountTransactionType::Transfer;

    fn base_energy_cost(&self) -> TxResult<Energy> {
        Ok(TRANSFER_BASE_ENERGY)
    }
}

/// Transfer CCD with a memo. Wire form: address(32) ∥ memo ∥ amount(u64).
#[derive(Serialize, Deserialize, Clone, Debug, Eq, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TransferWithMemo {
    /// Receiving account
    pub to_address: AccountAddress,
    /// Memo, usually CBOR
    pub memo: Memo,
    /// Amount to send
    pub amount: Amount,
}

impl TransferWithMemo {
    /// Instantiate a transfer with memo
    pub fn new(to_address: AccountAddress, memo: Memo, amount: Amount) -> Self {
        Self {
            to_address,
            memo,
            amount,
        }
    }
}

impl ByteFormat for TransferWithMemo {
    type Error = TxError;

    fn serialized_length(&self) -> usize {
        40 + self.memo.serialized_length()
    }

    fn read_from<R>(reader: &mut R, _limit: usize) -> TxResult<Self>
    where
        R: Read,
        Self: std::marker::Sized,
    {
        Ok(Self {
            to_address: AccountAddress::read_from(reader, 0)?,
            memo: Memo::read_from(reader, 0)?,
            amount: Amount::read_from(reader, 0)?,
        })
    }

    fn write_to<W>(&self, writer: &mut W) -> TxResult<usize>
    where
        W: Write,
    {
        let mut len = self.to_address.write_to(writer)?;
        len += self.memo.write_to(writer)?;
        len += self.amount.write_to(writer)?;
        Ok(len)
    }
}

impl TransactionPayload for TransferWithMemo {
    const TRANSACTION_TYPE: AccountTransactionType = AccountTransactionType::TransferWithMemo;

    fn base_energy_cost(&self) -> TxResult<Energy> {
        Ok(TRANSFER_BASE_ENERGY)
    }
}
