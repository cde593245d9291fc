//! Account transaction headers.

use std::io::{Read, Write};

use ccd_core::{read_u32, read_u64, write_u32, write_u64, ByteFormat, Endian, SerError, SerResult};
use serde::{Deserialize, Serialize};

use crate::{
    energy::ACCOUNT_TRANSACTION_HEADER_SIZE,
    primitives::{AccountAddress, Energy, TransactionExpiry},
};

/// The caller-supplied part of a header. Energy and payload size are derived when the
/// transaction is serialized.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Eq, PartialEq)]
pub struct AccountTransactionHeader {
    /// Sending account
    pub sender: AccountAddress,
    /// Account nonce
    pub nonce: u64,
    /// Unix seconds after which the transaction is rejected
    pub expiry: TransactionExpiry,
}

impl AccountTransactionHeader {
    /// Instantiate a header
    pub fn new(sender: AccountAddress, nonce: u64, expiry: TransactionExpiry) -> Self {
        Self {
            sender,
            nonce,
            expiry,
        }
    }

    /// Attach the derived fields.
    pub fn to_wire(&self, energy_amount: Energy, payload_size: u32) -> WireHeader {
        WireHeader {
            sender: self.sender,
            nonce: self.nonce,
            energy_amount,
            payload_size,
            expiry: self.expiry,
        }
    }
}

/// The header as it appears on the wire: 60 bytes.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Eq, PartialEq)]
pub struct WireHeader {
    /// Sending account
    pub sender: AccountAddress,
    /// Account nonce
    pub nonce: u64,
    /// Energy the sender pays for at most
    pub energy_amount: Energy,
    /// Serialized payload length including the type byte
    pub payload_size: u32,
    /// Expiry
    pub expiry: TransactionExpiry,
}

impl WireHeader {
    /// Drop the derived fields.
    pub fn header(&self) -> AccountTransactionHeader {
        AccountTransactionHeader::new(self.sender, self.nonce, self.expiry)
    }
}

impl ByteFormat for WireHeader {
    type Error = SerError;

    fn serialized_length(&self) -> usize {
        ACCOUNT_TRANSACTION_HEADER_SIZE as usize
    }

    fn read_from<R>(reader: &mut R, _limit: usize) -> SerResult<Self>
    where
        R: Read,
        Self: std::marker::Sized,
    {
        Ok(Self {
            sender: AccountAddress::read_from(reader, 0)?,
            nonce: read_u64(reader, Endian::Big)?,
            energy_amount: Energy::read_from(reader, 0)?,
            payload_size: read_u32(reader, Endian::Big)?,
            expiry: TransactionExpiry::read_from(reader, 0)?,
        })
    }

    fn write_to<W>(&self, writer: &mut W) -> SerResult<usize>
    where
        W: Write,
    {
        let mut len = self.sender.write_to(writer)?;
        len += write_u64(writer, self.nonce, Endian::Big)?;
        len += self.energy_amount.write_to(writer)?;
        len += write_u32(writer, self.payload_size, Endian::Big)?;
        len += self.expiry.write_to(writer)?;
        Ok(len)
    }
}
