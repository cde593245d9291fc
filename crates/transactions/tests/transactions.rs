use std::convert::Infallible;

use ccd_core::{ByteFormat, ErrorKind};
use ccd_transactions::*;

const SIGNING_DIGEST: &str = "cf218e56490cd99c4eeb074a1866291f3a96d4ff4b5ca6da8322a7515327ddcd";
const TRANSACTION_HASH: &str = "07c546bb65581394c16f410d3aeb837e3bdc39518d03ef44f842806ef7ee4a09";
const SUBMISSION: &str = "0000010001000001aa\
    0000000000000000000000000000000000000000000000000000000000000000\
    0000000000000001\
    00000000000001f5\
    00000029\
    0000000070dbd880\
    03\
    0000000000000000000000000000000000000000000000000000000000000000\
    0000000000000064";

fn codec() -> TransactionCodec<LinearEnergyModel, FixedClock> {
    TransactionCodec::new(
        TransactionConfig::default(),
        LinearEnergyModel::default(),
        FixedClock(1_700_000_000),
    )
}

fn transfer() -> AccountTransaction {
    AccountTransaction::new(
        AccountTransactionHeader::new(
            AccountAddress([0u8; 32]),
            1,
            TransactionExpiry(1_893_456_000),
        ),
        Transfer::new(AccountAddress([0u8; 32]), Amount::from_micro_ccd(100)),
    )
}

struct StaticSigner;

impl Signer for StaticSigner {
    type Error = Infallible;

    fn sign(&self, _digest: &SigningDigest) -> Result<AccountTransactionSignature, Infallible> {
        Ok(AccountTransactionSignature::single(Signature(vec![0xaa])))
    }

    fn signature_count(&self) -> u64 {
        1
    }
}

#[test]
fn it_matches_the_golden_signing_digest() {
    let digest = codec().signing_digest(&transfer()).unwrap();
    assert_eq!(digest.to_string(), SIGNING_DIGEST);
    assert_eq!(digest, SIGNING_DIGEST.parse::<SigningDigest>().unwrap());
}

#[test]
fn it_matches_the_golden_transaction_hash() {
    let signatures = AccountTransactionSignature::single(Signature(vec![0xaa]));
    let codec = codec();
    let hash = codec.transaction_hash(&transfer(), &signatures).unwrap();
    assert_eq!(hash.serialize_hex().unwrap(), TRANSACTION_HASH);
    assert_eq!(
        hex::encode(codec.submission_bytes(&transfer(), &signatures).unwrap()),
        SUBMISSION
    );

    let signed = codec.sign(transfer(), &StaticSigner).unwrap();
    assert_eq!(signed.hash().to_string(), TRANSACTION_HASH);
    assert_eq!(hex::encode(signed.to_submission_bytes()), SUBMISSION);
}

#[test]
fn it_round_trips_submissions() {
    let bytes = hex::decode(SUBMISSION).unwrap();
    let decoded = decode_block_item(&bytes).unwrap();
    assert_eq!(decoded.hash.to_string(), TRANSACTION_HASH);
    match decoded.item {
        BlockItem::AccountTransaction { header, payload, .. } => {
            assert_eq!(header.energy_amount, Energy(501));
            assert_eq!(header.payload_size, 41);
            assert_eq!(AccountTransaction::new(header.header(), payload), transfer());
        }
        other => panic!("unexpected item {:?}", other),
    }
}

#[test]
fn it_prices_module_deployment() {
    let payload = AccountTransactionPayload::from(DeployModule::versioned(1, vec![0u8; 999]));
    assert_eq!(payload.base_energy_cost().unwrap(), Energy(100));
}

#[test]
fn it_refuses_empty_signature_sets() {
    let signatures = AccountTransactionSignature::single(Signature(vec![0xaa]));
    assert!(codec().serialize_block_item(&transfer(), &signatures).is_ok());

    let err = codec()
        .serialize_block_item(&transfer(), &AccountTransactionSignature::default())
        .unwrap_err();
    assert!(matches!(err, TxError::EmptySignatureSet));
    assert_eq!(err.kind(), ErrorKind::DomainInvalid);
}

#[test]
fn it_classifies_expired_transactions() {
    let codec = TransactionCodec::new(
        TransactionConfig::default(),
        LinearEnergyModel::default(),
        FixedClock(1_893_456_001),
    );
    let err = codec.signing_digest(&transfer()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::DomainInvalid);
}

#[test]
fn it_builds_transactions_from_json() {
    let json = serde_json::json!({
        "header": {
            "sender": AccountAddress([0u8; 32]).to_base58(),
            "nonce": 1,
            "expiry": 1_893_456_000u64,
        },
        "payload": {
            "type": "transfer",
            "payload": {
                "toAddress": AccountAddress([0u8; 32]).to_base58(),
                "amount": 100,
            },
        },
    });
    let tx: AccountTransaction = serde_json::from_value(json).unwrap();
    assert_eq!(tx, transfer());
    assert_eq!(
        codec().signing_digest(&tx).unwrap().to_string(),
        SIGNING_DIGEST
    );
}
