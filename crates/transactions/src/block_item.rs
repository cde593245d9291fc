//! Decoding of submitted block items.

use std::io::{Cursor, Read};

use ccd_core::{read_exact_vec, read_u8, ByteFormat, SerError};
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::{
    credential::{CredentialDeploymentInfo, NORMAL_CREDENTIAL},
    error::{TxError, TxResult},
    hashes::TransactionHash,
    header::WireHeader,
    payload::AccountTransactionPayload,
    primitives::{hex_bytes, TransactionExpiry},
    signature::AccountTransactionSignature,
    transaction::{hash_block_item, BLOCK_ITEM_VERSION},
    transaction_type::BlockItemKind,
};

/// A decoded block item.
#[derive(Serialize, Deserialize, Clone, Debug, Eq, PartialEq)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum BlockItem {
    /// A signed account transaction
    AccountTransaction {
        /// Signatures
        signature: AccountTransactionSignature,
        /// Header with the energy and size it was signed with
        header: WireHeader,
        /// Payload
        payload: AccountTransactionPayload,
    },
    /// A credential deployment creating an account
    CredentialDeployment {
        /// Expiry
        expiry: TransactionExpiry,
        /// 0 for an initial credential, 1 for a normal one
        credential_type: u8,
        /// The undecoded credential
        #[serde(with = "hex_bytes")]
        credential: Vec<u8>,
    },
}

impl BlockItem {
    /// Decode the credential of a normal credential deployment. `None` for other items.
    pub fn normal_credential(&self) -> TxResult<Option<CredentialDeploymentInfo>> {
        match self {
            BlockItem::CredentialDeployment {
                credential_type,
                credential,
                ..
            } if *credential_type == NORMAL_CREDENTIAL => {
                Ok(Some(CredentialDeploymentInfo::from_bytes(credential)?))
            }
            _ => Ok(None),
        }
    }
}

/// A block item and the hash it is known by.
#[derive(Serialize, Deserialize, Clone, Debug, Eq, PartialEq)]
pub struct DecodedBlockItem {
    /// SHA-256 over the bytes of the item, version byte excluded
    pub hash: TransactionHash,
    /// The item
    pub item: BlockItem,
}

fn read_account_transaction<R>(reader: &mut R) -> TxResult<BlockItem>
where
    R: Read,
{
    let signature = AccountTransactionSignature::read_from(reader, 0)?;
    let header = WireHeader::read_from(reader, 0)?;
    let declared = header.payload_size as u64;
    let body = read_exact_vec(reader, declared)?;

    let mut cursor = Cursor::new(body.as_slice());
    let payload = AccountTransactionPayload::read_from(&mut cursor, 0)?;
    let consumed = cursor.position();
    if consumed != declared {
        return Err(TxError::PayloadSizeMismatch {
            declared: declared.saturating_sub(1),
            decoded: consumed.saturating_sub(1),
        });
    }
    Ok(BlockItem::AccountTransaction {
        signature,
        header,
        payload,
    })
}

fn read_credential_deployment<R>(reader: &mut R) -> TxResult<BlockItem>
where
    R: Read,
{
    let expiry = TransactionExpiry::read_from(reader, 0)?;
    let credential_type = read_u8(reader)?;
    let mut credential = vec![];
    reader.read_to_end(&mut credential)?;
    if credential.is_empty() {
        return Err(SerError::UnexpectedEof.into());
    }
    Ok(BlockItem::CredentialDeployment {
        expiry,
        credential_type,
        credential,
    })
}

/// Decode a versioned block item as submitted to a node. Bytes after a complete account
/// transaction are ignored; a credential deployment extends to the end of the input.
pub fn decode_block_item(bytes: &[u8]) -> TxResult<DecodedBlockItem> {
    let mut cursor = Cursor::new(bytes);
    let version = read_u8(&mut cursor)?;
    if version != BLOCK_ITEM_VERSION {
        return Err(TxError::UnsupportedBlockItemVersion(version));
    }
    let kind = BlockItemKind::try_from(read_u8(&mut cursor)?)?;
    trace!(?kind, "decoding block item");
    let item = match kind {
        BlockItemKind::AccountTransaction => read_account_transaction(&mut cursor)?,
        BlockItemKind::CredentialDeployment => read_credential_deployment(&mut cursor)?,
        BlockItemKind::UpdateInstruction => return Err(TxError::UpdateInstructionUnsupported),
    };
    // the cursor only ever advances over `bytes`
    let end = cursor.position() as usize;
    Ok(DecodedBlockItem {
        hash: hash_block_item(&bytes[1..end]),
        item,
    })
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        config::{FixedClock, TransactionConfig},
        credential::{test::info, CredentialDeploymentTransaction},
        energy::LinearEnergyModel,
        header::AccountTransactionHeader,
        payload::TransferWithMemo,
        primitives::{AccountAddress, Amount, Memo},
        signature::Signature,
        transaction::{AccountTransaction, TransactionCodec},
    };

    fn submission() -> (AccountTransaction, AccountTransactionSignature, Vec<u8>) {
        let codec = TransactionCodec::new(
            TransactionConfig::default(),
            LinearEnergyModel::default(),
            FixedClock(0),
        );
        let tx = AccountTransaction::new(
            AccountTransactionHeader::new(AccountAddress([5; 32]), 3, TransactionExpiry(100)),
            TransferWithMemo::new(
                AccountAddress([6; 32]),
                Memo::from_cbor(&"thanks").unwrap(),
                Amount(1_000_000),
            ),
        );
        let mut signatures = AccountTransactionSignature::single(Signature(vec![0x11; 64]));
        signatures.insert(1, 0, Signature(vec![0x22; 64]));
        let bytes = codec.submission_bytes(&tx, &signatures).unwrap();
        (tx, signatures, bytes)
    }

    #[test]
    fn it_decodes_account_transactions() {
        let (tx, signatures, bytes) = submission();
        let decoded = decode_block_item(&bytes).unwrap();
        assert_eq!(decoded.hash, hash_block_item(&bytes[1..]));
        match decoded.item {
            BlockItem::AccountTransaction {
                signature,
                header,
                payload,
            } => {
                assert_eq!(signature, signatures);
                assert_eq!(header.header(), tx.header);
                assert_eq!(header.payload_size as usize, payload.serialized_length());
                assert_eq!(payload, tx.payload);
            }
            other => panic!("unexpected item {:?}", other),
        }

        // trailing bytes are not part of the item
        let mut padded = bytes.clone();
        padded.extend([0u8; 4]);
        assert_eq!(decode_block_item(&padded).unwrap().hash, decoded.hash);
    }

    #[test]
    fn it_detects_payload_size_mismatches() {
        let (_, signatures, mut bytes) = submission();
        // payload_size follows sender, nonce and energy
        let at = 2 + signatures.serialized_length() + 48;
        let size = u32::from_be_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]]);
        bytes[at..at + 4].copy_from_slice(&(size + 1).to_be_bytes());
        bytes.push(0);
        assert!(matches!(
            decode_block_item(&bytes),
            Err(TxError::PayloadSizeMismatch { declared, decoded }) if declared == decoded as u64 + 1
        ));
    }

    #[test]
    fn it_decodes_credential_deployments() {
        let deployment = CredentialDeploymentTransaction {
            expiry: TransactionExpiry(1_893_456_000),
            info: info(),
        };
        let bytes = deployment.to_submission_bytes().unwrap();
        let decoded = decode_block_item(&bytes).unwrap();
        assert_eq!(decoded.hash, deployment.hash().unwrap());
        assert_eq!(decoded.item.normal_credential().unwrap(), Some(info()));
    }

    #[test]
    fn it_rejects_other_items() {
        assert!(matches!(
            decode_block_item(&[1, 0]),
            Err(TxError::UnsupportedBlockItemVersion(1))
        ));
        assert!(matches!(
            decode_block_item(&[0, 2]),
            Err(TxError::UpdateInstructionUnsupported)
        ));
        assert!(matches!(
            decode_block_item(&[0, 3]),
            Err(TxError::UnknownBlockItemKind(3))
        ));
        assert!(matches!(
            decode_block_item(&[0]),
            Err(TxError::SerError(SerError::UnexpectedEof))
        ));
    }
}
