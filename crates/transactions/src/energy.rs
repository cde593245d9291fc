//! Energy pricing.
//!
//! The energy amount in a header is `base + per_signature * signatures + per_byte * size`,
//! where `size` is the header size plus the payload size (payload bytes and type byte). The
//! base cost comes from the payload; the coefficients are network parameters.

use ccd_core::ByteFormat;
use serde::{Deserialize, Serialize};

use crate::{
    error::{TxError, TxResult},
    payload::AccountTransactionPayload,
    primitives::Energy,
};

/// Serialized size of an account transaction header.
pub const ACCOUNT_TRANSACTION_HEADER_SIZE: u64 = 60;

/// Prices a transaction from its signature count, payload size and payload base cost.
pub trait EnergyModel {
    /// Total energy for a transaction. `payload_size` includes the type byte.
    fn cost(&self, signature_count: u64, payload_size: u64, base_cost: Energy) -> TxResult<Energy>;
}

/// Linear pricing: a fixed price per signature and per byte on top of the base cost.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Eq, PartialEq)]
#[serde(default)]
pub struct LinearEnergyModel {
    /// Energy per signature
    pub per_signature: u64,
    /// Energy per serialized byte
    pub per_byte: u64,
    /// Bytes charged for the header
    pub header_size: u64,
}

impl Default for LinearEnergyModel {
    fn default() -> Self {
        Self {
            per_signature: 100,
            per_byte: 1,
            header_size: ACCOUNT_TRANSACTION_HEADER_SIZE,
        }
    }
}

impl EnergyModel for LinearEnergyModel {
    fn cost(&self, signature_count: u64, payload_size: u64, base_cost: Energy) -> TxResult<Energy> {
        let signatures = self.per_signature.checked_mul(signature_count);
        let bytes = self
            .header_size
            .checked_add(payload_size)
            .and_then(|size| size.checked_mul(self.per_byte));
        signatures
            .zip(bytes)
            .and_then(|(s, b)| s.checked_add(b))
            .and_then(|total| total.checked_add(base_cost.0))
            .map(Energy)
            .ok_or(TxError::EnergyOverflow)
    }
}

/// Energy a header carries for `payload` signed `signature_count` times.
pub fn energy_cost<M>(
    payload: &AccountTransactionPayload,
    signature_count: u64,
    model: &M,
) -> TxResult<Energy>
where
    M: EnergyModel,
{
    model.cost(
        signature_count,
        payload.serialized_length() as u64,
        payload.base_energy_cost()?,
    )
}
