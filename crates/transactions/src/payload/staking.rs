//! Baker and delegation configuration.
//!
//! Both payloads start with a u16 bitmap naming the fields present, lowest bit first, followed by
//! the present fields in declaration order.

use std::io::{Read, Write};

use ccd_core::{
    read_bool, read_prefixed_string, read_u16, read_u32, read_u64, read_u8, wrap_fixed_bytes,
    write_bool, write_prefixed, write_u16, write_u32, write_u64, write_u8, ByteFormat, Endian,
    LengthPrefix,
};
use serde::{Deserialize, Serialize};

use crate::{
    error::{TxError, TxResult},
    payload::TransactionPayload,
    primitives::{Amount, Energy},
    transaction_type::AccountTransactionType,
};

const URL_PREFIX: LengthPrefix = LengthPrefix::U16(Endian::Big);

/// Base energy of a baker configuration that updates keys.
pub const CONFIGURE_BAKER_WITH_KEYS_ENERGY: Energy = Energy(4050);

/// Base energy of other staking configuration.
pub const CONFIGURE_STAKING_ENERGY: Energy = Energy(300);

fn bitmap(present: &[bool]) -> u16 {
    present
        .iter()
        .enumerate()
        .fold(0, |acc, (bit, p)| acc | (u16::from(*p) << bit))
}

fn read_bitmap<R>(reader: &mut R, fields: u32) -> TxResult<u16>
where
    R: Read,
{
    let bits = read_u16(reader, Endian::Big)?;
    if u32::from(bits) >> fields != 0 {
        return Err(TxError::InvalidEnumValue {
            field: "bitmap",
            value: bits as u64,
        });
    }
    Ok(bits)
}

fn has(bits: u16, bit: u32) -> bool {
    bits & (1 << bit) != 0
}

/// Who may delegate to a baker pool.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Eq, PartialEq, Hash)]
#[repr(u8)]
pub enum OpenStatus {
    /// New delegators are accepted
    OpenForAll = 0,
    /// Existing delegators stay, new ones are refused
    ClosedForNew = 1,
    /// No delegation
    ClosedForAll = 2,
}

impl TryFrom<u8> for OpenStatus {
    type Error = TxError;

    fn try_from(value: u8) -> TxResult<Self> {
        match value {
            0 => Ok(OpenStatus::OpenForAll),
            1 => Ok(OpenStatus::ClosedForNew),
            2 => Ok(OpenStatus::ClosedForAll),
            _ => Err(TxError::InvalidEnumValue {
                field: "openForDelegation",
                value: value as u64,
            }),
        }
    }
}

wrap_fixed_bytes!(
    /// A 32-byte baker verify key (election or signature).
    BakerVerifyKey, 32
);

wrap_fixed_bytes!(
    /// A BLS aggregation verify key.
    BakerAggregationVerifyKey, 96
);

wrap_fixed_bytes!(
    /// Proof of knowledge of a baker secret key.
    BakerKeyProof, 64
);

/// New baker keys with proofs of knowledge of the secret keys.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Eq, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BakerKeysWithProofs {
    /// VRF key for leader election
    pub election_verify_key: BakerVerifyKey,
    /// Proof for the election key
    pub proof_election: BakerKeyProof,
    /// Block signing key
    pub signature_verify_key: BakerVerifyKey,
    /// Proof for the signing key
    pub proof_sig: BakerKeyProof,
    /// Finalization aggregation key
    pub aggregation_verify_key: BakerAggregationVerifyKey,
    /// Proof for the aggregation key
    pub proof_aggregation: BakerKeyProof,
}

impl ByteFormat for BakerKeysWithProofs {
    type Error = TxError;

    fn serialized_length(&self) -> usize {
        32 + 64 + 32 + 64 + 96 + 64
    }

    fn read_from<R>(reader: &mut R, _limit: usize) -> TxResult<Self>
    where
        R: Read,
        Self: std::marker::Sized,
    {
        Ok(Self {
            election_verify_key: BakerVerifyKey::read_from(reader, 0)?,
            proof_election: BakerKeyProof::read_from(reader, 0)?,
            signature_verify_key: BakerVerifyKey::read_from(reader, 0)?,
            proof_sig: BakerKeyProof::read_from(reader, 0)?,
            aggregation_verify_key: BakerAggregationVerifyKey::read_from(reader, 0)?,
            proof_aggregation: BakerKeyProof::read_from(reader, 0)?,
        })
    }

    fn write_to<W>(&self, writer: &mut W) -> TxResult<usize>
    where
        W: Write,
    {
        let mut len = self.election_verify_key.write_to(writer)?;
        len += self.proof_election.write_to(writer)?;
        len += self.signature_verify_key.write_to(writer)?;
        len += self.proof_sig.write_to(writer)?;
        len += self.aggregation_verify_key.write_to(writer)?;
        len += self.proof_aggregation.write_to(writer)?;
        Ok(len)
    }
}

/// Add a baker, or change or remove an existing one. Absent fields are left unchanged.
#[derive(Serialize, Deserialize, Clone, Debug, Default, Eq, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ConfigureBaker {
    /// Staked amount. Zero removes the baker.
    pub stake: Option<Amount>,
    /// Add rewards to the stake
    pub restake_earnings: Option<bool>,
    /// Delegation policy of the pool
    pub open_for_delegation: Option<OpenStatus>,
    /// New keys
    pub keys: Option<BakerKeysWithProofs>,
    /// Pool metadata URL
    pub metadata_url: Option<String>,
    /// Commission in parts per hundred thousand
    pub transaction_fee_commission: Option<u32>,
    /// Commission in parts per hundred thousand
    pub baking_reward_commission: Option<u32>,
    /// Commission in parts per hundred thousand
    pub finalization_reward_commission: Option<u32>,
    /// Suspend or resume the baker
    pub suspended: Option<bool>,
}

impl ConfigureBaker {
    fn bitmap(&self) -> u16 {
        bitmap(&[
            self.stake.is_some(),
            self.restake_earnings.is_some(),
            self.open_for_delegation.is_some(),
            self.keys.is_some(),
            self.metadata_url.is_some(),
            self.transaction_fee_commission.is_some(),
            self.baking_reward_commission.is_some(),
            self.finalization_reward_commission.is_some(),
            self.suspended.is_some(),
        ])
    }
}

impl ByteFormat for ConfigureBaker {
    type Error = TxError;

    fn serialized_length(&self) -> usize {
        let commissions = [
            self.transaction_fee_commission,
            self.baking_reward_commission,
            self.finalization_reward_commission,
        ];
        2 + self.stake.map_or(0, |_| 8)
            + self.restake_earnings.map_or(0, |_| 1)
            + self.open_for_delegation.map_or(0, |_| 1)
            + self.keys.as_ref().map_or(0, |k| k.serialized_length())
            + self.metadata_url.as_ref().map_or(0, |url| 2 + url.len())
            + commissions.iter().flatten().count() * 4
            + self.suspended.map_or(0, |_| 1)
    }

    fn read_from<R>(reader: &mut R, _limit: usize) -> TxResult<Self>
    where
        R: Read,
        Self: std::marker::Sized,
    {
        let bits = read_bitmap(reader, 9)?;
        let mut payload = Self::default();
        if has(bits, 0) {
            payload.stake = Some(Amount::read_from(reader, 0)?);
        }
        if has(bits, 1) {
            payload.restake_earnings = Some(read_bool(reader)?);
        }
        if has(bits, 2) {
            payload.open_for_delegation = Some(OpenStatus::try_from(read_u8(reader)?)?);
        }
        if has(bits, 3) {
            payload.keys = Some(BakerKeysWithProofs::read_from(reader, 0)?);
        }
        if has(bits, 4) {
            payload.metadata_url = Some(read_prefixed_string(reader, URL_PREFIX)?);
        }
        if has(bits, 5) {
            payload.transaction_fee_commission = Some(read_u32(reader, Endian::Big)?);
        }
        if has(bits, 6) {
            payload.baking_reward_commission = Some(read_u32(reader, Endian::Big)?);
        }
        if has(bits, 7) {
            payload.finalization_reward_commission = Some(read_u32(reader, Endian::Big)?);
        }
        if has(bits, 8) {
            payload.suspended = Some(read_bool(reader)?);
        }
        Ok(payload)
    }

    fn write_to<W>(&self, writer: &mut W) -> TxResult<usize>
    where
        W: Write,
    {
        let mut len = write_u16(writer, self.bitmap(), Endian::Big)?;
        if let Some(stake) = self.stake {
            len += stake.write_to(writer)?;
        }
        if let Some(restake) = self.restake_earnings {
            len += write_bool(writer, restake)?;
        }
        if let Some(status) = self.open_for_delegation {
            len += write_u8(writer, status as u8)?;
        }
        if let Some(keys) = &self.keys {
            len += keys.write_to(writer)?;
        }
        if let Some(url) = &self.metadata_url {
            len += write_prefixed(writer, URL_PREFIX, url.as_bytes())?;
        }
        for commission in [
            self.transaction_fee_commission,
            self.baking_reward_commission,
            self.finalization_reward_commission,
        ]
        .iter()
        .flatten()
        {
            len += write_u32(writer, *commission, Endian::Big)?;
        }
        if let Some(suspended) = self.suspended {
            len += write_bool(writer, suspended)?;
        }
        Ok(len)
    }
}

impl TransactionPayload for ConfigureBaker {
    const TRANSACTION_TYPE: AccountTransactionType = AccountTransactionType::ConfigureBaker;

    fn base_energy_cost(&self) -> TxResult<Energy> {
        Ok(match self.keys {
            Some(_) => CONFIGURE_BAKER_WITH_KEYS_ENERGY,
            None => CONFIGURE_STAKING_ENERGY,
        })
    }
}

/// Where a delegator's stake goes.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Eq, PartialEq, Hash)]
#[serde(tag = "delegateType", rename_all = "camelCase")]
pub enum DelegationTarget {
    /// The passive pool
    Passive,
    /// A specific baker pool
    #[serde(rename_all = "camelCase")]
    Baker {
        /// The baker's id
        baker_id: u64,
    },
}

impl ByteFormat for DelegationTarget {
    type Error = TxError;

    fn serialized_length(&self) -> usize {
        match self {
            DelegationTarget::Passive => 1,
            DelegationTarget::Baker { .. } => 9,
        }
    }

    fn read_from<R>(reader: &mut R, _limit: usize) -> TxResult<Self>
    where
        R: Read,
        Self: std::marker::Sized,
    {
        match read_u8(reader)? {
            0 => Ok(DelegationTarget::Passive),
            1 => Ok(DelegationTarget::Baker {
                baker_id: read_u64(reader, Endian::Big)?,
            }),
            tag => Err(TxError::InvalidEnumValue {
                field: "delegationTarget",
                value: tag as u64,
            }),
        }
    }

    fn write_to<W>(&self, writer: &mut W) -> TxResult<usize>
    where
        W: Write,
    {
        match self {
            DelegationTarget::Passive => Ok(write_u8(writer, 0)?),
            DelegationTarget::Baker { baker_id } => {
                Ok(write_u8(writer, 1)? + write_u64(writer, *baker_id, Endian::Big)?)
            }
        }
    }
}

/// Add, change or remove a delegation. Absent fields are left unchanged.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, Eq, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ConfigureDelegation {
    /// Delegated amount. Zero removes the delegation.
    pub stake: Option<Amount>,
    /// Add rewards to the stake
    pub restake_earnings: Option<bool>,
    /// Pool to delegate to
    pub delegation_target: Option<DelegationTarget>,
}

impl ByteFormat for ConfigureDelegation {
    type Error = TxError;

    fn serialized_length(&self) -> usize {
        2 + self.stake.map_or(0, |_| 8)
            + self.restake_earnings.map_or(0, |_| 1)
            + self.delegation_target.map_or(0, |t| t.serialized_length())
    }

    fn read_from<R>(reader: &mut R, _limit: usize) -> TxResult<Self>
    where
        R: Read,
        Self: std::marker::Sized,
    {
        let bits = read_bitmap(reader, 3)?;
        let mut payload = Self::default();
        if has(bits, 0) {
            payload.stake = Some(Amount::read_from(reader, 0)?);
        }
        if has(bits, 1) {
            payload.restake_earnings = Some(read_bool(reader)?);
        }
        if has(bits, 2) {
            payload.delegation_target = Some(DelegationTarget::read_from(reader, 0)?);
        }
        Ok(payload)
    }

    fn write_to<W>(&self, writer: &mut W) -> TxResult<usize>
    where
        W: Write,
    {
        let bits = bitmap(&[
            self.stake.is_some(),
            self.restake_earnings.is_some(),
            self.delegation_target.is_some(),
        ]);
        let mut len = write_u16(writer, bits, Endian::Big)?;
        if let Some(stake) = self.stake {
            len += stake.write_to(writer)?;
        }
        if let Some(restake) = self.restake_earnings {
            len += write_bool(writer, restake)?;
        }
        if let Some(target) = self.delegation_target {
            len += target.write_to(writer)?;
        }
        Ok(len)
    }
}

impl TransactionPayload for ConfigureDelegation {
    const TRANSACTION_TYPE: AccountTransactionType = AccountTransactionType::ConfigureDelegation;

    fn base_energy_cost(&self) -> TxResult<Energy> {
        Ok(CONFIGURE_STAKING_ENERGY)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn keys() -> BakerKeysWithProofs {
        BakerKeysWithProofs {
            election_verify_key: BakerVerifyKey([1; 32]),
            proof_election: BakerKeyProof([2; 64]),
            signature_verify_key: BakerVerifyKey([3; 32]),
            proof_sig: BakerKeyProof([4; 64]),
            aggregation_verify_key: BakerAggregationVerifyKey([5; 96]),
            proof_aggregation: BakerKeyProof([6; 64]),
        }
    }

    #[test]
    fn it_serializes_delegation() {
        let payload = ConfigureDelegation {
            stake: Some(Amount(1_000)),
            restake_earnings: None,
            delegation_target: Some(DelegationTarget::Baker { baker_id: 5 }),
        };
        let hex = payload.serialize_hex().unwrap();
        assert_eq!(hex, "0005\
                         00000000000003e8\
                         010000000000000005");
        assert_eq!(payload.serialized_length() * 2, hex.len());
        assert_eq!(ConfigureDelegation::deserialize_hex(&hex).unwrap(), payload);

        let passive = ConfigureDelegation {
            delegation_target: Some(DelegationTarget::Passive),
            ..Default::default()
        };
        assert_eq!(passive.serialize_hex().unwrap(), "000400");
        assert_eq!(passive.base_energy_cost().unwrap(), Energy(300));
    }

    #[test]
    fn it_serializes_baker_configuration() {
        let payload = ConfigureBaker {
            stake: Some(Amount(15_000_000_000)),
            restake_earnings: Some(true),
            open_for_delegation: Some(OpenStatus::ClosedForNew),
            metadata_url: Some("https://a.b".to_owned()),
            baking_reward_commission: Some(5_000),
            suspended: Some(false),
            ..Default::default()
        };
        let bytes = payload.to_bytes().unwrap();
        assert_eq!(bytes.len(), payload.serialized_length());
        // bits 0, 1, 2, 4, 6, 8
        assert_eq!(&bytes[..2], &[0x01, 0x57]);
        assert_eq!(ConfigureBaker::from_bytes(&bytes).unwrap(), payload);
        assert_eq!(payload.base_energy_cost().unwrap(), Energy(300));
    }

    #[test]
    fn it_charges_more_for_key_updates() {
        let payload = ConfigureBaker {
            keys: Some(keys()),
            ..Default::default()
        };
        assert_eq!(payload.base_energy_cost().unwrap(), Energy(4050));
        let bytes = payload.to_bytes().unwrap();
        assert_eq!(bytes.len(), 2 + 352);
        assert_eq!(&bytes[..2], &[0x00, 0x08]);
        assert_eq!(ConfigureBaker::from_bytes(&bytes).unwrap(), payload);
    }

    #[test]
    fn it_rejects_bad_enumerations() {
        assert!(matches!(
            ConfigureDelegation::deserialize_hex("000402"),
            Err(TxError::InvalidEnumValue { field: "delegationTarget", value: 2 })
        ));
        assert!(matches!(
            ConfigureDelegation::deserialize_hex("0008"),
            Err(TxError::InvalidEnumValue { field: "bitmap", value: 8 })
        ));
        assert!(matches!(
            ConfigureBaker::deserialize_hex("000403"),
            Err(TxError::InvalidEnumValue { field: "openForDelegation", value: 3 })
        ));
    }
}
