//! Base58check helpers. The checksum is the first four bytes of a double SHA-256 over the
//! version byte and payload.

use crate::ser::SerResult;

/// Decode a base58check string and verify its checksum and version byte. Returns the payload
/// without the version byte.
pub fn decode_b58_check(s: &str, version: u8) -> SerResult<Vec<u8>> {
    let mut data = bs58::decode(s).with_check(Some(version)).into_vec()?;
    // bs58 leaves the verified version byte at the front
    data.remove(0);
    Ok(data)
}

/// Encode a payload as base58check under `version`.
pub fn encode_b58_check(payload: &[u8], version: u8) -> String {
    bs58::encode(payload).with_check_version(version).into_string()
}
