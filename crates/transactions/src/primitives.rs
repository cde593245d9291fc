//! Value types that appear inside transaction headers and payloads.

use std::{
    fmt,
    io::{Read, Write},
    str::FromStr,
};

use ccd_core::{
    decode_b58_check, encode_b58_check, read_array, read_prefixed, read_u64, wrap_fixed_bytes,
    write_prefixed, write_u64, ByteFormat, Endian, LengthPrefix, SerError, SerResult,
};
use serde::{Deserialize, Serialize};

use crate::{
    config::Clock,
    error::{TxError, TxResult},
};

/// Serde adapter writing byte vectors as hex strings.
pub(crate) mod hex_bytes {
    use serde::{Deserialize, Deserializer, Serializer};

    pub(crate) fn serialize<S>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&hex::encode(bytes))
    }

    pub(crate) fn deserialize<'de, D>(deserializer: D) -> Result<Vec<u8>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s: String = Deserialize::deserialize(deserializer)?;
        hex::decode(&s).map_err(serde::de::Error::custom)
    }
}

/// Base58check version byte of account addresses.
pub const ACCOUNT_ADDRESS_VERSION: u8 = 1;

/// An account address: 32 bytes on the wire, base58check with version byte 1 as text.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct AccountAddress(pub [u8; 32]);

impl AccountAddress {
    /// Parse the 50-character base58check form.
    pub fn from_base58(s: &str) -> TxResult<Self> {
        let payload = decode_b58_check(s, ACCOUNT_ADDRESS_VERSION)
            .map_err(|_| TxError::InvalidAddress(s.to_owned()))?;
        let bytes: [u8; 32] = payload
            .as_slice()
            .try_into()
            .map_err(|_| TxError::InvalidAddress(s.to_owned()))?;
        Ok(Self(bytes))
    }

    /// The base58check form.
    pub fn to_base58(&self) -> String {
        encode_b58_check(&self.0, ACCOUNT_ADDRESS_VERSION)
    }
}

impl From<[u8; 32]> for AccountAddress {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

impl fmt::Display for AccountAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_base58())
    }
}

impl FromStr for AccountAddress {
    type Err = TxError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_base58(s)
    }
}

impl Serialize for AccountAddress {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_base58())
    }
}

impl<'de> Deserialize<'de> for AccountAddress {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s: String = Deserialize::deserialize(deserializer)?;
        Self::from_base58(&s).map_err(|e| serde::de::Error::custom(e.to_string()))
    }
}

impl ByteFormat for AccountAddress {
    type Error = SerError;

    fn serialized_length(&self) -> usize {
        32
    }

    fn read_from<R>(reader: &mut R, _limit: usize) -> SerResult<Self>
    where
        R: Read,
        Self: std::marker::Sized,
    {
        Ok(Self(read_array(reader)?))
    }

    fn write_to<W>(&self, writer: &mut W) -> SerResult<usize>
    where
        W: Write,
    {
        writer.write_all(&self.0)?;
        Ok(32)
    }
}

/// A smart contract instance address.
#[derive(Serialize, Deserialize, Copy, Clone, Debug, Default, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct ContractAddress {
    /// Instance index
    pub index: u64,
    /// Instance subindex
    pub subindex: u64,
}

impl ContractAddress {
    /// Instantiate a contract address
    pub fn new(index: u64, subindex: u64) -> Self {
        Self { index, subindex }
    }
}

impl ByteFormat for ContractAddress {
    type Error = SerError;

    fn serialized_length(&self) -> usize {
        16
    }

    fn read_from<R>(reader: &mut R, _limit: usize) -> SerResult<Self>
    where
        R: Read,
        Self: std::marker::Sized,
    {
        Ok(Self {
            index: read_u64(reader, Endian::Big)?,
            subindex: read_u64(reader, Endian::Big)?,
        })
    }

    fn write_to<W>(&self, writer: &mut W) -> SerResult<usize>
    where
        W: Write,
    {
        Ok(write_u64(writer, self.index, Endian::Big)?
            + write_u64(writer, self.subindex, Endian::Big)?)
    }
}

wrap_fixed_bytes!(
    /// Reference to a deployed module: the hash of its source.
    ModuleReference, 32
);

wrap_fixed_bytes!(
    /// A credential registration id: a 48-byte group element.
    CredentialRegistrationId, 48
);

macro_rules! u64_newtype {
    (
        $(#[$outer:meta])*
        $name:ident
    ) => {
        $(#[$outer])*
        #[derive(Serialize, Deserialize, Copy, Clone, Debug, Default, Eq, PartialEq, Hash, PartialOrd, Ord)]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl From<u64> for $name {
            fn from(v: u64) -> Self {
                Self(v)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl ByteFormat for $name {
            type Error = SerError;

            fn serialized_length(&self) -> usize {
                8
            }

            fn read_from<R>(reader: &mut R, _limit: usize) -> SerResult<Self>
            where
                R: Read,
                Self: std::marker::Sized,
            {
                Ok(Self(read_u64(reader, Endian::Big)?))
            }

            fn write_to<W>(&self, writer: &mut W) -> SerResult<usize>
            where
                W: Write,
            {
                write_u64(writer, self.0, Endian::Big)
            }
        }
    };
}

u64_newtype!(
    /// An amount of CCD in micro-CCD.
    Amount
);

u64_newtype!(
    /// An amount of energy.
    Energy
);

u64_newtype!(
    /// Expiry of a transaction in unix seconds.
    TransactionExpiry
);

impl Amount {
    /// Instantiate from micro-CCD
    pub fn from_micro_ccd(micro_ccd: u64) -> Self {
        Self(micro_ccd)
    }

    /// The amount in micro-CCD
    pub fn micro_ccd(&self) -> u64 {
        self.0
    }
}

impl TransactionExpiry {
    /// An expiry `seconds` after the clock's current reading, saturating at `u64::MAX`.
    pub fn seconds_from_now<C: Clock>(clock: &C, seconds: u64) -> Self {
        Self(clock.now_unix_seconds().saturating_add(seconds))
    }

    /// True if the expiry lies strictly before `now`.
    pub fn is_expired_at(&self, now: u64) -> bool {
        self.0 < now
    }
}

/// Maximum size of a data blob or memo.
pub const MAX_DATA_BLOB_SIZE: usize = 256;

const BLOB_PREFIX: LengthPrefix = LengthPrefix::U16(Endian::Big);

/// Arbitrary bytes registered on chain or attached to a transfer, at most 256 of them.
#[derive(Serialize, Clone, Debug, Default, Eq, PartialEq, Hash)]
#[serde(transparent)]
pub struct DataBlob(#[serde(with = "hex_bytes")] Vec<u8>);

/// A transfer memo, conventionally CBOR.
pub type Memo = DataBlob;

impl DataBlob {
    /// Wrap bytes, rejecting more than 256.
    pub fn new(data: Vec<u8>) -> TxResult<Self> {
        if data.len() > MAX_DATA_BLOB_SIZE {
            return Err(TxError::DataBlobTooLarge(data.len()));
        }
        Ok(Self(data))
    }

    /// CBOR-encode `value` into a blob.
    pub fn from_cbor<T: Serialize>(value: &T) -> TxResult<Self> {
        let mut data = vec![];
        ciborium::into_writer(value, &mut data).map_err(|e| TxError::Cbor(e.to_string()))?;
        Self::new(data)
    }

    /// The wrapped bytes
    pub fn data(&self) -> &[u8] {
        &self.0
    }
}

impl<'de> Deserialize<'de> for DataBlob {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let data = hex_bytes::deserialize(deserializer)?;
        Self::new(data).map_err(serde::de::Error::custom)
    }
}

impl ByteFormat for DataBlob {
    type Error = TxError;

    fn serialized_length(&self) -> usize {
        2 + self.0.len()
    }

    fn read_from<R>(reader: &mut R, _limit: usize) -> TxResult<Self>
    where
        R: Read,
        Self: std::marker::Sized,
    {
        Self::new(read_prefixed(reader, BLOB_PREFIX)?)
    }

    fn write_to<W>(&self, writer: &mut W) -> TxResult<usize>
    where
        W: Write,
    {
        Ok(write_prefixed(writer, BLOB_PREFIX, &self.0)?)
    }
}

/// A contract parameter: raw bytes behind a u16 length.
#[derive(Serialize, Deserialize, Clone, Debug, Default, Eq, PartialEq, Hash)]
#[serde(transparent)]
pub struct Parameter(#[serde(with = "hex_bytes")] pub Vec<u8>);

const PARAMETER_PREFIX: LengthPrefix = LengthPrefix::U16(Endian::Big);

impl From<Vec<u8>> for Parameter {
    fn from(v: Vec<u8>) -> Self {
        Self(v)
    }
}

impl ByteFormat for Parameter {
    type Error = SerError;

    fn serialized_length(&self) -> usize {
        2 + self.0.len()
    }

    fn read_from<R>(reader: &mut R, _limit: usize) -> SerResult<Self>
    where
        R: Read,
        Self: std::marker::Sized,
    {
        Ok(Self(read_prefixed(reader, PARAMETER_PREFIX)?))
    }

    fn write_to<W>(&self, writer: &mut W) -> SerResult<usize>
    where
        W: Write,
    {
        write_prefixed(writer, PARAMETER_PREFIX, &self.0)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::config::FixedClock;

    #[test]
    fn it_round_trips_account_addresses() {
        let address = AccountAddress([0x11; 32]);
        let text = address.to_base58();
        assert_eq!(text.len(), 50);
        assert_eq!(text.parse::<AccountAddress>().unwrap(), address);

        let json = serde_json::to_string(&address).unwrap();
        assert_eq!(json, format!("\"{}\"", text));
    }

    #[test]
    fn it_rejects_malformed_addresses() {
        // right version, wrong payload length
        let short = encode_b58_check(&[0u8; 31], ACCOUNT_ADDRESS_VERSION);
        assert!(matches!(
            AccountAddress::from_base58(&short),
            Err(TxError::InvalidAddress(_))
        ));
        // right length, wrong version
        let wrong_version = encode_b58_check(&[0u8; 32], 2);
        let err = AccountAddress::from_base58(&wrong_version).unwrap_err();
        assert_eq!(err.kind(), ccd_core::ErrorKind::DomainInvalid);
        assert!(AccountAddress::from_base58("not an address").is_err());
    }

    #[test]
    fn it_writes_big_endian_values() {
        assert_eq!(
            ContractAddress::new(1, 2).serialize_hex().unwrap(),
            "00000000000000010000000000000002"
        );
        assert_eq!(Amount(100).serialize_hex().unwrap(), "0000000000000064");
    }

    #[test]
    fn it_limits_data_blobs() {
        assert!(DataBlob::new(vec![0; 256]).is_ok());
        assert!(matches!(
            DataBlob::new(vec![0; 257]),
            Err(TxError::DataBlobTooLarge(257))
        ));

        let blob = DataBlob::new(vec![0xaa, 0xbb]).unwrap();
        assert_eq!(blob.serialize_hex().unwrap(), "0002aabb");
        assert_eq!(DataBlob::deserialize_hex("0002aabb").unwrap(), blob);
        assert_eq!(serde_json::to_string(&blob).unwrap(), "\"aabb\"");

        // declared 257 bytes
        let mut too_long = vec![0x01, 0x01];
        too_long.extend(vec![0u8; 257]);
        assert!(DataBlob::from_bytes(&too_long).is_err());
    }

    #[test]
    fn it_limits_data_blobs_from_json() {
        let max = format!("\"{}\"", "ab".repeat(256));
        assert_eq!(serde_json::from_str::<DataBlob>(&max).unwrap().data().len(), 256);

        let over = format!("\"{}\"", "ab".repeat(257));
        let err = serde_json::from_str::<Memo>(&over).unwrap_err();
        assert!(err.to_string().contains("257"));
    }

    #[test]
    fn it_encodes_cbor_memos() {
        let memo = Memo::from_cbor(&"hello").unwrap();
        assert_eq!(memo.data(), &[0x65, b'h', b'e', b'l', b'l', b'o']);
        let number = Memo::from_cbor(&10u8).unwrap();
        assert_eq!(number.data(), &[0x0a]);
    }

    #[test]
    fn it_computes_expiries() {
        let clock = FixedClock(1_000);
        let expiry = TransactionExpiry::seconds_from_now(&clock, 300);
        assert_eq!(expiry, TransactionExpiry(1_300));
        assert!(!expiry.is_expired_at(1_300));
        assert!(expiry.is_expired_at(1_301));
    }
}
