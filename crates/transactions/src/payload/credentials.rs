//! Adding and removing account credentials.

use std::io::{Read, Write};

use ccd_core::{read_u8, write_u8, ByteFormat, LengthPrefix};
use serde::{Deserialize, Serialize};

use crate::{
    credential::CredentialDeploymentInfo,
    error::{TxError, TxResult},
    payload::TransactionPayload,
    primitives::{CredentialRegistrationId, Energy},
    transaction_type::AccountTransactionType,
};

const LIST_PREFIX: LengthPrefix = LengthPrefix::U8;

/// A credential to add, with the credential index it takes on the account.
#[derive(Serialize, Deserialize, Clone, Debug, Eq, PartialEq)]
pub struct IndexedCredentialDeploymentInfo {
    /// Credential index
    pub index: u8,
    /// The credential
    pub cdi: CredentialDeploymentInfo,
}

/// Add and remove credentials of an account and set its signature threshold.
#[derive(Serialize, Deserialize, Clone, Debug, Eq, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCredentials {
    /// Credentials to add
    pub new_credentials: Vec<IndexedCredentialDeploymentInfo>,
    /// Registration ids of credentials to remove
    pub remove_credential_ids: Vec<CredentialRegistrationId>,
    /// New account threshold
    pub threshold: u8,
    /// Credentials on the account before the update. Priced, not sent; zero after decoding.
    pub current_number_of_credentials: u64,
}

impl ByteFormat for UpdateCredentials {
    type Error = TxError;

    fn serialized_length(&self) -> usize {
        1 + self
            .new_credentials
            .iter()
            .map(|c| 1 + c.cdi.serialized_length())
            .sum::<usize>()
            + 1
            + self.remove_credential_ids.len() * CredentialRegistrationId::LENGTH
            + 1
    }

    fn read_from<R>(reader: &mut R, _limit: usize) -> TxResult<Self>
    where
        R: Read,
        Self: std::marker::Sized,
    {
        let added = read_u8(reader)?;
        let mut new_credentials = Vec::with_capacity(added as usize);
        for _ in 0..added {
            new_credentials.push(IndexedCredentialDeploymentInfo {
                index: read_u8(reader)?,
                cdi: CredentialDeploymentInfo::read_from(reader, 0)?,
            });
        }
        let removed = read_u8(reader)?;
        let mut remove_credential_ids = Vec::with_capacity(removed as usize);
        for _ in 0..removed {
            remove_credential_ids.push(CredentialRegistrationId::read_from(reader, 0)?);
        }
        Ok(Self {
            new_credentials,
            remove_credential_ids,
            threshold: read_u8(reader)?,
            current_number_of_credentials: 0,
        })
    }

    fn write_to<W>(&self, writer: &mut W) -> TxResult<usize>
    where
        W: Write,
    {
        let mut len = LIST_PREFIX.write_length(writer, self.new_credentials.len() as u64)?;
        for credential in self.new_credentials.iter() {
            len += write_u8(writer, credential.index)?;
            len += credential.cdi.write_to(writer)?;
        }
        len += LIST_PREFIX.write_length(writer, self.remove_credential_ids.len() as u64)?;
        for cred_id in self.remove_credential_ids.iter() {
            len += cred_id.write_to(writer)?;
        }
        len += write_u8(writer, self.threshold)?;
        Ok(len)
    }
}

impl TransactionPayload for UpdateCredentials {
    const TRANSACTION_TYPE: AccountTransactionType = AccountTransactionType::UpdateCredentials;

    /// 500, plus 500 per existing credential, plus 54000 and 100 per key for each new one.
    fn base_energy_cost(&self) -> TxResult<Energy> {
        let current = self
            .current_number_of_credentials
            .checked_mul(500)
            .ok_or(TxError::EnergyOverflow)?;
        let mut total = current.checked_add(500).ok_or(TxError::EnergyOverflow)?;
        for c in self.new_credentials.iter() {
            let keys = c.cdi.values.credential_public_keys.keys.len() as u64;
            total = keys
                .checked_mul(100)
                .and_then(|k| k.checked_add(54_000))
                .and_then(|cost| total.checked_add(cost))
                .ok_or(TxError::EnergyOverflow)?;
        }
        Ok(Energy(total))
    }
}
