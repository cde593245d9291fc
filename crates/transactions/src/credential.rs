//! Credential deployment: the values a credential publishes on chain, their signing digests, and
//! the credential deployment block item that creates a new account.

use std::{
    collections::BTreeMap,
    fmt,
    io::{Read, Write},
    str::FromStr,
};

use ccd_core::{
    read_prefixed, read_prefixed_string, read_u16, read_u32, read_u8, wrap_fixed_bytes,
    write_prefixed, write_u16, write_u32, write_u64, write_u8, ByteFormat, Endian, LengthPrefix,
    MarkedDigestWriter, Sha256Writer,
};
use serde::{Deserialize, Serialize};

use crate::{
    error::{TxError, TxResult},
    hashes::{SigningDigest, TransactionHash},
    primitives::{hex_bytes, AccountAddress, CredentialRegistrationId, TransactionExpiry},
    transaction_type::BlockItemKind,
};

const KEY_MAP_PREFIX: LengthPrefix = LengthPrefix::U8;
const AR_DATA_PREFIX: LengthPrefix = LengthPrefix::U16(Endian::Big);
const ATTRIBUTE_COUNT_PREFIX: LengthPrefix = LengthPrefix::U16(Endian::Big);
const ATTRIBUTE_VALUE_PREFIX: LengthPrefix = LengthPrefix::U8;
const PROOFS_PREFIX: LengthPrefix = LengthPrefix::U32(Endian::Big);

/// Credential type byte of a normal (non-initial) credential.
pub const NORMAL_CREDENTIAL: u8 = 1;

wrap_fixed_bytes!(
    /// An Ed25519 public key.
    Ed25519VerifyKey, 32
);

wrap_fixed_bytes!(
    /// An anonymity revoker's encrypted share of the credential holder's id.
    EncryptedIdCredPubShare, 96
);

/// A credential public key, tagged with its signature scheme.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Eq, PartialEq, Hash)]
#[serde(tag = "schemeId", content = "verifyKey")]
pub enum VerifyKey {
    /// Scheme 0
    Ed25519(Ed25519VerifyKey),
}

impl ByteFormat for VerifyKey {
    type Error = TxError;

    fn serialized_length(&self) -> usize {
        33
    }

    fn read_from<R>(reader: &mut R, _limit: usize) -> TxResult<Self>
    where
        R: Read,
        Self: std::marker::Sized,
    {
        match read_u8(reader)? {
            0 => Ok(VerifyKey::Ed25519(Ed25519VerifyKey::read_from(reader, 0)?)),
            scheme => Err(TxError::UnknownKeyScheme(scheme)),
        }
    }

    fn write_to<W>(&self, writer: &mut W) -> TxResult<usize>
    where
        W: Write,
    {
        match self {
            VerifyKey::Ed25519(key) => Ok(write_u8(writer, 0)? + key.write_to(writer)?),
        }
    }
}

/// The keys of a credential and how many must sign.
#[derive(Serialize, Deserialize, Clone, Debug, Default, Eq, PartialEq)]
pub struct CredentialPublicKeys {
    /// Keys by key index
    pub keys: BTreeMap<u8, VerifyKey>,
    /// Required signatures
    pub threshold: u8,
}

impl ByteFormat for CredentialPublicKeys {
    type Error = TxError;

    fn serialized_length(&self) -> usize {
        1 + self.keys.len() * 34 + 1
    }

    fn read_from<R>(reader: &mut R, _limit: usize) -> TxResult<Self>
    where
        R: Read,
        Self: std::marker::Sized,
    {
        let count = read_u8(reader)?;
        let mut keys = BTreeMap::new();
        for _ in 0..count {
            let index = read_u8(reader)?;
            keys.insert(index, VerifyKey::read_from(reader, 0)?);
        }
        Ok(Self {
            keys,
            threshold: read_u8(reader)?,
        })
    }

    fn write_to<W>(&self, writer: &mut W) -> TxResult<usize>
    where
        W: Write,
    {
        let mut len = KEY_MAP_PREFIX.write_length(writer, self.keys.len() as u64)?;
        for (index, key) in self.keys.iter() {
            len += write_u8(writer, *index)?;
            len += key.write_to(writer)?;
        }
        len += write_u8(writer, self.threshold)?;
        Ok(len)
    }
}

/// A year and month, written as u16 year ∥ u8 month. Text form `YYYYMM`.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct YearMonth {
    /// Year
    pub year: u16,
    /// Month, 1 to 12
    pub month: u8,
}

impl YearMonth {
    /// Instantiate, rejecting months outside 1 to 12.
    pub fn new(year: u16, month: u8) -> TxResult<Self> {
        if !(1..=12).contains(&month) {
            return Err(TxError::InvalidEnumValue {
                field: "month",
                value: month as u64,
            });
        }
        Ok(Self { year, month })
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}{:02}", self.year, self.month)
    }
}

impl FromStr for YearMonth {
    type Err = TxError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || TxError::InvalidEnumValue {
            field: "yearMonth",
            value: s.len() as u64,
        };
        if s.len() != 6 || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        let year = s[..4].parse().map_err(|_| invalid())?;
        let month = s[4..].parse().map_err(|_| invalid())?;
        Self::new(year, month)
    }
}

impl Serialize for YearMonth {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for YearMonth {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s: String = Deserialize::deserialize(deserializer)?;
        s.parse().map_err(|e: TxError| serde::de::Error::custom(e.to_string()))
    }
}

impl ByteFormat for YearMonth {
    type Error = TxError;

    fn serialized_length(&self) -> usize {
        3
    }

    fn read_from<R>(reader: &mut R, _limit: usize) -> TxResult<Self>
    where
        R: Read,
        Self: std::marker::Sized,
    {
        let year = read_u16(reader, Endian::Big)?;
        Self::new(year, read_u8(reader)?)
    }

    fn write_to<W>(&self, writer: &mut W) -> TxResult<usize>
    where
        W: Write,
    {
        Ok(write_u16(writer, self.year, Endian::Big)? + write_u8(writer, self.month)?)
    }
}

/// Identity attributes a credential may reveal. The discriminant is the wire tag.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "camelCase")]
#[repr(u8)]
#[allow(missing_docs)]
pub enum AttributeTag {
    FirstName = 0,
    LastName = 1,
    Sex = 2,
    Dob = 3,
    CountryOfResidence = 4,
    Nationality = 5,
    IdDocType = 6,
    IdDocNo = 7,
    IdDocIssuer = 8,
    IdDocIssuedAt = 9,
    IdDocExpiresAt = 10,
    NationalIdNo = 11,
    TaxIdNo = 12,
}

impl TryFrom<u8> for AttributeTag {
    type Error = TxError;

    fn try_from(tag: u8) -> TxResult<Self> {
        use AttributeTag::*;
        const TAGS: [AttributeTag; 13] = [
            FirstName,
            LastName,
            Sex,
            Dob,
            CountryOfResidence,
            Nationality,
            IdDocType,
            IdDocNo,
            IdDocIssuer,
            IdDocIssuedAt,
            IdDocExpiresAt,
            NationalIdNo,
            TaxIdNo,
        ];
        TAGS.get(tag as usize)
            .copied()
            .ok_or(TxError::InvalidEnumValue {
                field: "attributeTag",
                value: tag as u64,
            })
    }
}

/// Validity period and revealed attributes of a credential.
#[derive(Serialize, Deserialize, Clone, Debug, Eq, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Policy {
    /// Last month of validity
    pub valid_to: YearMonth,
    /// Month of creation
    pub created_at: YearMonth,
    /// Revealed attributes, written in tag order
    pub revealed_attributes: BTreeMap<AttributeTag, String>,
}

impl ByteFormat for Policy {
    type Error = TxError;

    fn serialized_length(&self) -> usize {
        3 + 3
            + 2
            + self
                .revealed_attributes
                .values()
                .map(|v| 2 + v.len())
                .sum::<usize>()
    }

    fn read_from<R>(reader: &mut R, _limit: usize) -> TxResult<Self>
    where
        R: Read,
        Self: std::marker::Sized,
    {
        let valid_to = YearMonth::read_from(reader, 0)?;
        let created_at = YearMonth::read_from(reader, 0)?;
        let count = ATTRIBUTE_COUNT_PREFIX.read_length(reader)?;
        let mut revealed_attributes = BTreeMap::new();
        for _ in 0..count {
            let tag = AttributeTag::try_from(read_u8(reader)?)?;
            let value = read_prefixed_string(reader, ATTRIBUTE_VALUE_PREFIX)?;
            revealed_attributes.insert(tag, value);
        }
        Ok(Self {
            valid_to,
            created_at,
            revealed_attributes,
        })
    }

    fn write_to<W>(&self, writer: &mut W) -> TxResult<usize>
    where
        W: Write,
    {
        let mut len = self.valid_to.write_to(writer)?;
        len += self.created_at.write_to(writer)?;
        len += ATTRIBUTE_COUNT_PREFIX.write_length(writer, self.revealed_attributes.len() as u64)?;
        for (tag, value) in self.revealed_attributes.iter() {
            len += write_u8(writer, *tag as u8)?;
            len += write_prefixed(writer, ATTRIBUTE_VALUE_PREFIX, value.as_bytes())?;
        }
        Ok(len)
    }
}

/// The public part of a credential.
#[derive(Serialize, Deserialize, Clone, Debug, Eq, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CredentialDeploymentValues {
    /// Keys controlling the credential
    pub credential_public_keys: CredentialPublicKeys,
    /// Registration id
    pub cred_id: CredentialRegistrationId,
    /// Identity provider that issued the identity
    pub ip_identity: u32,
    /// Anonymity revokers needed to reveal the holder
    pub revocation_threshold: u8,
    /// Encrypted id shares by anonymity revoker
    pub ar_data: BTreeMap<u32, EncryptedIdCredPubShare>,
    /// Policy
    pub policy: Policy,
}

impl ByteFormat for CredentialDeploymentValues {
    type Error = TxError;

    fn serialized_length(&self) -> usize {
        self.credential_public_keys.serialized_length()
            + CredentialRegistrationId::LENGTH
            + 4
            + 1
            + 2
            + self.ar_data.len() * (4 + EncryptedIdCredPubShare::LENGTH)
            + self.policy.serialized_length()
    }

    fn read_from<R>(reader: &mut R, _limit: usize) -> TxResult<Self>
    where
        R: Read,
        Self: std::marker::Sized,
    {
        let credential_public_keys = CredentialPublicKeys::read_from(reader, 0)?;
        let cred_id = CredentialRegistrationId::read_from(reader, 0)?;
        let ip_identity = read_u32(reader, Endian::Big)?;
        let revocation_threshold = read_u8(reader)?;
        let count = AR_DATA_PREFIX.read_length(reader)?;
        let mut ar_data = BTreeMap::new();
        for _ in 0..count {
            let ar = read_u32(reader, Endian::Big)?;
            ar_data.insert(ar, EncryptedIdCredPubShare::read_from(reader, 0)?);
        }
        Ok(Self {
            credential_public_keys,
            cred_id,
            ip_identity,
            revocation_threshold,
            ar_data,
            policy: Policy::read_from(reader, 0)?,
        })
    }

    fn write_to<W>(&self, writer: &mut W) -> TxResult<usize>
    where
        W: Write,
    {
        let mut len = self.credential_public_keys.write_to(writer)?;
        len += self.cred_id.write_to(writer)?;
        len += write_u32(writer, self.ip_identity, Endian::Big)?;
        len += write_u8(writer, self.revocation_threshold)?;
        len += AR_DATA_PREFIX.write_length(writer, self.ar_data.len() as u64)?;
        for (ar, share) in self.ar_data.iter() {
            len += write_u32(writer, *ar, Endian::Big)?;
            len += share.write_to(writer)?;
        }
        len += self.policy.write_to(writer)?;
        Ok(len)
    }
}

/// Proofs that the credential holder owns the identity behind it. The proof bytes are opaque;
/// they are written back to back without lengths, so this type only serializes.
#[derive(Serialize, Deserialize, Clone, Debug, Default, Eq, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct IdOwnershipProofs {
    /// Signature of the identity provider
    #[serde(with = "hex_bytes")]
    pub sig: Vec<u8>,
    /// Commitments to the attributes
    #[serde(with = "hex_bytes")]
    pub commitments: Vec<u8>,
    /// Fiat-Shamir challenge
    #[serde(with = "hex_bytes")]
    pub challenge: Vec<u8>,
    /// Per anonymity revoker proofs of the encrypted shares
    pub proof_id_cred_pub: BTreeMap<u32, IdCredPubProof>,
    /// Proof of knowledge of the identity provider signature
    #[serde(with = "hex_bytes")]
    pub proof_ip_sig: Vec<u8>,
    /// Proof that the registration id is well formed
    #[serde(with = "hex_bytes")]
    pub proof_reg_id: Vec<u8>,
    /// Proof that the credential counter is below the account limit
    #[serde(with = "hex_bytes")]
    pub cred_counter_less_than_max_accounts: Vec<u8>,
}

/// An opaque share proof.
#[derive(Serialize, Deserialize, Clone, Debug, Default, Eq, PartialEq)]
#[serde(transparent)]
pub struct IdCredPubProof(#[serde(with = "hex_bytes")] pub Vec<u8>);

impl IdOwnershipProofs {
    /// Write the proofs, returning the number of bytes written.
    pub fn write_raw<W>(&self, writer: &mut W) -> TxResult<usize>
    where
        W: Write,
    {
        let mut len = 0;
        for part in [&self.sig, &self.commitments, &self.challenge] {
            writer.write_all(part)?;
            len += part.len();
        }
        len += write_u32(writer, self.proof_id_cred_pub.len() as u32, Endian::Big)?;
        for (index, proof) in self.proof_id_cred_pub.iter() {
            len += write_u32(writer, *index, Endian::Big)?;
            writer.write_all(&proof.0)?;
            len += proof.0.len();
        }
        for part in [
            &self.proof_ip_sig,
            &self.proof_reg_id,
            &self.cred_counter_less_than_max_accounts,
        ] {
            writer.write_all(part)?;
            len += part.len();
        }
        Ok(len)
    }
}

/// Credential values with ownership proofs, before the credential keys sign them.
#[derive(Serialize, Deserialize, Clone, Debug, Eq, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UnsignedCredentialDeploymentInfo {
    /// Public values
    pub values: CredentialDeploymentValues,
    /// Ownership proofs
    pub proofs: IdOwnershipProofs,
}

impl UnsignedCredentialDeploymentInfo {
    fn digest_with<F>(&self, suffix: F) -> TxResult<SigningDigest>
    where
        F: FnOnce(&mut Sha256Writer) -> TxResult<usize>,
    {
        let mut w = Sha256Writer::default();
        self.values.write_to(&mut w)?;
        self.proofs.write_raw(&mut w)?;
        suffix(&mut w)?;
        Ok(w.finish_marked())
    }

    /// Digest the credential keys sign when the credential creates a new account.
    pub fn new_account_digest(&self, expiry: TransactionExpiry) -> TxResult<SigningDigest> {
        self.digest_with(|w| Ok(write_u8(w, 0)? + write_u64(w, expiry.0, Endian::Big)?))
    }

    /// Digest the credential keys sign when the credential joins `address`.
    pub fn existing_account_digest(&self, address: &AccountAddress) -> TxResult<SigningDigest> {
        self.digest_with(|w| Ok(write_u8(w, 1)? + address.write_to(w)?))
    }
}

/// Credential values with the finished proofs, as deployed.
#[derive(Serialize, Deserialize, Clone, Debug, Eq, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CredentialDeploymentInfo {
    /// Public values
    pub values: CredentialDeploymentValues,
    /// Serialized proofs, signatures included
    #[serde(with = "hex_bytes")]
    pub proofs: Vec<u8>,
}

impl ByteFormat for CredentialDeploymentInfo {
    type Error = TxError;

    fn serialized_length(&self) -> usize {
        self.values.serialized_length() + 4 + self.proofs.len()
    }

    fn read_from<R>(reader: &mut R, _limit: usize) -> TxResult<Self>
    where
        R: Read,
        Self: std::marker::Sized,
    {
        Ok(Self {
            values: CredentialDeploymentValues::read_from(reader, 0)?,
            proofs: read_prefixed(reader, PROOFS_PREFIX)?,
        })
    }

    fn write_to<W>(&self, writer: &mut W) -> TxResult<usize>
    where
        W: Write,
    {
        let len = self.values.write_to(writer)?;
        Ok(len + write_prefixed(writer, PROOFS_PREFIX, &self.proofs)?)
    }
}

/// A credential deployment creating a new account.
#[derive(Serialize, Deserialize, Clone, Debug, Eq, PartialEq)]
pub struct CredentialDeploymentTransaction {
    /// Expiry of the deployment
    pub expiry: TransactionExpiry,
    /// The credential
    pub info: CredentialDeploymentInfo,
}

impl CredentialDeploymentTransaction {
    /// The block item: kind(1) ∥ expiry(u64) ∥ credential type(1) ∥ info.
    pub fn block_item_bytes(&self) -> TxResult<Vec<u8>> {
        let mut buf = Vec::with_capacity(10 + self.info.serialized_length());
        write_u8(&mut buf, BlockItemKind::CredentialDeployment as u8)?;
        self.expiry.write_to(&mut buf)?;
        write_u8(&mut buf, NORMAL_CREDENTIAL)?;
        self.info.write_to(&mut buf)?;
        Ok(buf)
    }

    /// The bytes to submit: version(0) ∥ block item.
    pub fn to_submission_bytes(&self) -> TxResult<Vec<u8>> {
        let item = self.block_item_bytes()?;
        let mut buf = Vec::with_capacity(1 + item.len());
        buf.push(0);
        buf.extend(item);
        Ok(buf)
    }

    /// SHA-256 over the block item.
    pub fn hash(&self) -> TxResult<TransactionHash> {
        let mut w = Sha256Writer::default();
        w.write_all(&self.block_item_bytes()?)?;
        Ok(w.finish_marked())
    }
}

#[cfg(test)]
pub(crate) mod test {
    use super::*;
    use ccd_core::sha256;

    pub(crate) fn values() -> CredentialDeploymentValues {
        let mut keys = BTreeMap::new();
        keys.insert(0, VerifyKey::Ed25519(Ed25519VerifyKey([0x01; 32])));
        let mut ar_data = BTreeMap::new();
        ar_data.insert(1, EncryptedIdCredPubShare([0x02; 96]));
        let mut revealed_attributes = BTreeMap::new();
        revealed_attributes.insert(AttributeTag::Nationality, "DK".to_owned());
        revealed_attributes.insert(AttributeTag::FirstName, "Ann".to_owned());
        CredentialDeploymentValues {
            credential_public_keys: CredentialPublicKeys { keys, threshold: 1 },
            cred_id: CredentialRegistrationId([0x03; 48]),
            ip_identity: 0,
            revocation_threshold: 1,
            ar_data,
            policy: Policy {
                valid_to: YearMonth::new(2030, 12).unwrap(),
                created_at: YearMonth::new(2024, 1).unwrap(),
                revealed_attributes,
            },
        }
    }

    pub(crate) fn info() -> CredentialDeploymentInfo {
        CredentialDeploymentInfo {
            values: values(),
            proofs: vec![0xee; 10],
        }
    }

    #[test]
    fn it_serializes_credential_values() {
        let values = values();
        let bytes = values.to_bytes().unwrap();
        assert_eq!(bytes.len(), values.serialized_length());
        // one key: count, index, scheme, key
        assert_eq!(&bytes[..3], &[0x01, 0x00, 0x00]);
        // policy: 2030-12, 2024-01, two attributes in tag order
        let policy = hex::encode(&bytes[bytes.len() - 17..]);
        assert_eq!(policy, "07ee0c07e8010002\
                            0003416e6e\
                            0502444b");
        assert_eq!(CredentialDeploymentValues::from_bytes(&bytes).unwrap(), values);
    }

    #[test]
    fn it_rejects_unknown_key_schemes() {
        let mut bytes = values().to_bytes().unwrap();
        bytes[2] = 1;
        assert!(matches!(
            CredentialDeploymentValues::from_bytes(&bytes),
            Err(TxError::UnknownKeyScheme(1))
        ));
    }

    #[test]
    fn it_parses_year_months() {
        let ym: YearMonth = "202412".parse().unwrap();
        assert_eq!(ym, YearMonth::new(2024, 12).unwrap());
        assert_eq!(ym.to_string(), "202412");
        assert!("202413".parse::<YearMonth>().is_err());
        assert!("2024-1".parse::<YearMonth>().is_err());
        assert_eq!(serde_json::to_string(&ym).unwrap(), "\"202412\"");
    }

    #[test]
    fn it_digests_unsigned_credentials() {
        let mut proof_id_cred_pub = BTreeMap::new();
        proof_id_cred_pub.insert(2, IdCredPubProof(vec![0x22]));
        proof_id_cred_pub.insert(1, IdCredPubProof(vec![0x11]));
        let unsigned = UnsignedCredentialDeploymentInfo {
            values: values(),
            proofs: IdOwnershipProofs {
                sig: vec![0xa0],
                commitments: vec![0xa1],
                challenge: vec![0xa2],
                proof_id_cred_pub,
                proof_ip_sig: vec![0xa3],
                proof_reg_id: vec![0xa4],
                cred_counter_less_than_max_accounts: vec![0xa5],
            },
        };

        let mut proofs = vec![];
        unsigned.proofs.write_raw(&mut proofs).unwrap();
        assert_eq!(
            hex::encode(&proofs),
            "a0a1a2\
             00000002\
             0000000111\
             0000000222\
             a3a4a5"
        );

        let values = unsigned.values.to_bytes().unwrap();
        let expiry = TransactionExpiry(1_893_456_000);
        let mut preimage = [values.clone(), proofs.clone()].concat();
        preimage.push(0);
        preimage.extend(expiry.0.to_be_bytes());
        let expected = sha256(&[preimage.as_slice()]);
        assert_eq!(
            unsigned.new_account_digest(expiry).unwrap(),
            SigningDigest(expected)
        );

        let address = AccountAddress([0x44; 32]);
        let mut preimage = [values, proofs].concat();
        preimage.push(1);
        preimage.extend(address.0);
        let expected = sha256(&[preimage.as_slice()]);
        assert_eq!(
            unsigned.existing_account_digest(&address).unwrap(),
            SigningDigest(expected)
        );
    }

    #[test]
    fn it_builds_credential_deployment_items() {
        let deployment = CredentialDeploymentTransaction {
            expiry: TransactionExpiry(1_893_456_000),
            info: info(),
        };
        let item = deployment.block_item_bytes().unwrap();
        assert_eq!(hex::encode(&item[..10]), "010000000070dbd88001");
        assert_eq!(CredentialDeploymentInfo::from_bytes(&item[10..]).unwrap(), info());

        let submission = deployment.to_submission_bytes().unwrap();
        assert_eq!(submission[0], 0);
        assert_eq!(&submission[1..], &item[..]);
        assert_eq!(deployment.hash().unwrap(), TransactionHash(sha256(&[item.as_slice()])));
    }
}
