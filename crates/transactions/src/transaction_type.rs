//! Transaction type codes and block item kinds. The codes are part of the wire format; the gaps
//! are retired or reserved types.

use serde::{Deserialize, Serialize};

use crate::error::TxError;

/// The type of an account transaction.
#[derive(Serialize, Deserialize, Copy, Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum AccountTransactionType {
    /// Deploy a wasm module
    DeployModule = 0,
    /// Initialize a contract instance
    InitContract = 1,
    /// Update a contract instance
    Update = 2,
    /// Transfer CCD to an account
    Transfer = 3,
    /// Register as a baker (retired)
    AddBaker = 4,
    /// Stop baking (retired)
    RemoveBaker = 5,
    /// Change baker stake (retired)
    UpdateBakerStake = 6,
    /// Change baker restaking (retired)
    UpdateBakerRestakeEarnings = 7,
    /// Change baker keys (retired)
    UpdateBakerKeys = 8,
    /// Update the keys of a credential
    UpdateCredentialKeys = 13,
    /// Transfer encrypted CCD
    EncryptedTransfer = 16,
    /// Move public CCD to the encrypted balance
    TransferToEncrypted = 17,
    /// Move encrypted CCD to the public balance
    TransferToPublic = 18,
    /// Transfer with a release schedule
    TransferWithSchedule = 19,
    /// Add or remove credentials of an account
    UpdateCredentials = 20,
    /// Register data on chain
    RegisterData = 21,
    /// Transfer CCD with a memo
    TransferWithMemo = 22,
    /// Encrypted transfer with a memo
    EncryptedTransferWithMemo = 23,
    /// Scheduled transfer with a memo
    TransferWithScheduleWithMemo = 24,
    /// Configure a baker
    ConfigureBaker = 25,
    /// Configure delegation
    ConfigureDelegation = 26,
}

impl AccountTransactionType {
    /// The type byte.
    pub fn code(self) -> u8 {
        self as u8
    }

    /// True if this crate has a payload codec for the type.
    pub fn is_supported(self) -> bool {
        matches!(
            self,
            AccountTransactionType::DeployModule
                | AccountTransactionType::InitContract
                | AccountTransactionType::Update
                | AccountTransactionType::Transfer
                | AccountTransactionType::UpdateCredentials
                | AccountTransactionType::RegisterData
                | AccountTransactionType::TransferWithMemo
                | AccountTransactionType::ConfigureBaker
                | AccountTransactionType::ConfigureDelegation
        )
    }
}

impl TryFrom<u8> for AccountTransactionType {
    type Error = TxError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        use AccountTransactionType::*;
        Ok(match code {
            0 => DeployModule,
            1 => InitContract,
            2 => Update,
            3 => Transfer,
            4 => AddBaker,
            5 => RemoveBaker,
            6 => UpdateBakerStake,
            7 => UpdateBakerRestakeEarnings,
            8 => UpdateBakerKeys,
            13 => UpdateCredentialKeys,
            16 => EncryptedTransfer,
            17 => TransferToEncrypted,
            18 => TransferToPublic,
            19 => TransferWithSchedule,
            20 => UpdateCredentials,
            21 => RegisterData,
            22 => TransferWithMemo,
            23 => EncryptedTransferWithMemo,
            24 => TransferWithScheduleWithMemo,
            25 => ConfigureBaker,
            26 => ConfigureDelegation,
            _ => return Err(TxError::UnknownTransactionType(code)),
        })
    }
}

/// The kind byte that opens every block item.
#[derive(Serialize, Deserialize, Copy, Clone, Debug, Eq, PartialEq, Hash)]
#[repr(u8)]
pub enum BlockItemKind {
    /// An account transaction
    AccountTransaction = 0,
    /// A credential deployment creating a new account
    CredentialDeployment = 1,
    /// A chain update instruction
    UpdateInstruction = 2,
}

impl TryFrom<u8> for BlockItemKind {
    type Error = TxError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(BlockItemKind::AccountTransaction),
            1 => Ok(BlockItemKind::CredentialDeployment),
            2 => Ok(BlockItemKind::UpdateInstruction),
            _ => Err(TxError::UnknownBlockItemKind(code)),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn it_maps_codes_both_ways() {
        for code in 0..=u8::MAX {
            match AccountTransactionType::try_from(code) {
                Ok(ty) => assert_eq!(ty.code(), code),
                Err(TxError::UnknownTransactionType(c)) => assert_eq!(c, code),
                Err(e) => panic!("unexpected error {}", e),
            }
        }
        assert_eq!(AccountTransactionType::TransferWithMemo.code(), 22);
        assert_eq!(AccountTransactionType::UpdateCredentialKeys.code(), 13);
        assert!(AccountTransactionType::try_from(9).is_err());
        assert!(AccountTransactionType::try_from(27).is_err());
    }

    #[test]
    fn it_knows_which_types_are_supported() {
        assert!(AccountTransactionType::Transfer.is_supported());
        assert!(!AccountTransactionType::EncryptedTransfer.is_supported());
        assert!(!AccountTransactionType::AddBaker.is_supported());
    }
}
