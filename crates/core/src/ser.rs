//! A simple trait for binary (de)Serialization using std `Read` and `Write` traits, together
//! with the fixed-width integer and length-prefix primitives every wire format in this
//! workspace is built from.

use std::io::{Cursor, Error as IOError, ErrorKind as IOErrorKind, Read, Write};

use thiserror::Error;

/// Coarse classification shared by every error type in the workspace.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum ErrorKind {
    /// Truncated buffer, bad magic or version, unknown tag byte.
    MalformedInput,
    /// A numeric value outside its declared width, or a length exceeding its prefix capacity.
    RangeViolation,
    /// A well-formed value rejected by the domain rules (wrong-length address, past expiry, ...).
    DomainInvalid,
}

/// Errors related to serialization of types.
#[derive(Debug, Error)]
pub enum SerError {
    /// A read went past the end of its buffer.
    #[error("Unexpected end of input")]
    UnexpectedEof,

    /// IOError bubbled up from a `Write` or `Read` passed to a `ByteFormat` implementation.
    #[error(transparent)]
    IOError(IOError),

    /// An integer does not fit in the width it is encoded with.
    #[error("Value {value} does not fit in a {target}")]
    IntegerOutOfRange {
        /// The rejected value
        value: i128,
        /// The target integer type
        target: &'static str,
    },

    /// A collection or blob length does not fit in its length prefix.
    #[error("Length {length} exceeds the maximum of {max}")]
    LengthOutOfRange {
        /// The rejected length
        length: u64,
        /// The largest length the prefix can carry
        max: u64,
    },

    /// A LEB128 value used more bytes than permitted.
    #[error("LEB128 encoding exceeds {0} bytes")]
    Leb128TooLong(u32),

    /// A LEB128 value does not fit in 128 bits.
    #[error("LEB128 value overflows 128 bits")]
    Leb128Overflow,

    /// Got a byte other than 0 or 1 where a bool was expected.
    #[error("Expected a bool byte (0 or 1). Got {0}")]
    InvalidBool(u8),

    /// Got a byte other than 0 or 1 where an option tag was expected.
    #[error("Expected an option tag (0 or 1). Got {0}")]
    InvalidOptionTag(u8),

    /// A string was not valid UTF-8.
    #[error(transparent)]
    InvalidUtf8(#[from] std::string::FromUtf8Error),

    /// `deserialize_hex` encountered an error on its input.
    #[error("Error deserializing hex string")]
    FromHexError(#[from] hex::FromHexError),

    /// Bubbled up error from the bs58 library
    #[error(transparent)]
    B58Error(#[from] bs58::decode::Error),
}

impl From<IOError> for SerError {
    fn from(e: IOError) -> Self {
        if e.kind() == IOErrorKind::UnexpectedEof {
            SerError::UnexpectedEof
        } else {
            SerError::IOError(e)
        }
    }
}

impl SerError {
    /// Classify the error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            SerError::IntegerOutOfRange { .. }
            | SerError::LengthOutOfRange { .. }
            | SerError::Leb128Overflow => ErrorKind::RangeViolation,
            SerError::UnexpectedEof
            | SerError::IOError(_)
            | SerError::Leb128TooLong(_)
            | SerError::InvalidBool(_)
            | SerError::InvalidOptionTag(_)
            | SerError::InvalidUtf8(_)
            | SerError::FromHexError(_)
            | SerError::B58Error(_) => ErrorKind::MalformedInput,
        }
    }
}

/// Type alias for serialization errors
pub type SerResult<T> = Result<T, SerError>;

/// Byte order of a multi-byte integer.
#[derive(serde::Serialize, serde::Deserialize, Clone, Copy, Debug, Default, Eq, PartialEq, Hash)]
pub enum Endian {
    /// Most significant byte first. Transaction payloads and headers use this.
    #[default]
    Big,
    /// Least significant byte first. Schema sizes use this.
    Little,
}

macro_rules! impl_int_io {
    ($($read:ident, $write:ident => $t:ty;)*) => {
        $(
            #[doc = concat!("Read a `", stringify!($t), "` in the given byte order.")]
            pub fn $read<R>(reader: &mut R, endian: Endian) -> SerResult<$t>
            where
                R: Read,
            {
                let mut buf = [0u8; std::mem::size_of::<$t>()];
                reader.read_exact(&mut buf)?;
                Ok(match endian {
                    Endian::Big => <$t>::from_be_bytes(buf),
                    Endian::Little => <$t>::from_le_bytes(buf),
                })
            }

            #[doc = concat!("Write a `", stringify!($t), "` in the given byte order.")]
            pub fn $write<W>(writer: &mut W, number: $t, endian: Endian) -> SerResult<usize>
            where
                W: Write,
            {
                let bytes = match endian {
                    Endian::Big => number.to_be_bytes(),
                    Endian::Little => number.to_le_bytes(),
                };
                writer.write_all(&bytes)?;
                Ok(bytes.len())
            }
        )*
    };
}

impl_int_io! {
    read_u16, write_u16 => u16;
    read_u32, write_u32 => u32;
    read_u64, write_u64 => u64;
    read_u128, write_u128 => u128;
    read_i16, write_i16 => i16;
    read_i32, write_i32 => i32;
    read_i64, write_i64 => i64;
    read_i128, write_i128 => i128;
}

/// Read a single byte.
pub fn read_u8<R>(reader: &mut R) -> SerResult<u8>
where
    R: Read,
{
    let mut buf = [0u8; 1];
    reader.read_exact(&mut buf)?;
    Ok(buf[0])
}

/// Write a single byte.
pub fn write_u8<W>(writer: &mut W, number: u8) -> SerResult<usize>
where
    W: Write,
{
    writer.write_all(&[number])?;
    Ok(1)
}

/// Read a single signed byte.
pub fn read_i8<R>(reader: &mut R) -> SerResult<i8>
where
    R: Read,
{
    Ok(i8::from_le_bytes([read_u8(reader)?]))
}

/// Write a single signed byte.
pub fn write_i8<W>(writer: &mut W, number: i8) -> SerResult<usize>
where
    W: Write,
{
    write_u8(writer, number.to_le_bytes()[0])
}

/// Read a bool encoded as a single 0 or 1 byte.
pub fn read_bool<R>(reader: &mut R) -> SerResult<bool>
where
    R: Read,
{
    match read_u8(reader)? {
        0 => Ok(false),
        1 => Ok(true),
        b => Err(SerError::InvalidBool(b)),
    }
}

/// Write a bool as a single 0 or 1 byte.
pub fn write_bool<W>(writer: &mut W, value: bool) -> SerResult<usize>
where
    W: Write,
{
    write_u8(writer, u8::from(value))
}

/// Read exactly `N` bytes into an array.
pub fn read_array<R, const N: usize>(reader: &mut R) -> SerResult<[u8; N]>
where
    R: Read,
{
    let mut buf = [0u8; N];
    reader.read_exact(&mut buf)?;
    Ok(buf)
}

/// Read exactly `length` bytes. The buffer grows with the bytes actually present, so a huge
/// declared length on a short input fails with `UnexpectedEof` instead of allocating up front.
pub fn read_exact_vec<R>(reader: &mut R, length: u64) -> SerResult<Vec<u8>>
where
    R: Read,
{
    let mut buf = vec![];
    let read = reader.take(length).read_to_end(&mut buf)?;
    if (read as u64) < length {
        return Err(SerError::UnexpectedEof);
    }
    Ok(buf)
}

macro_rules! impl_checked_encoder {
    ($($(#[$outer:meta])* $name:ident => $t:ty;)*) => {
        $(
            $(#[$outer])*
            pub fn $name(value: i128, endian: Endian) -> SerResult<[u8; std::mem::size_of::<$t>()]> {
                let number = <$t>::try_from(value).map_err(|_| SerError::IntegerOutOfRange {
                    value,
                    target: stringify!($t),
                })?;
                Ok(match endian {
                    Endian::Big => number.to_be_bytes(),
                    Endian::Little => number.to_le_bytes(),
                })
            }
        )*
    };
}

impl_checked_encoder! {
    /// Encode an unsigned 8-bit integer, rejecting anything outside `0..=255`.
    encode_word8 => u8;
    /// Encode an unsigned 16-bit integer, rejecting anything outside its range.
    encode_word16 => u16;
    /// Encode an unsigned 32-bit integer, rejecting anything outside its range.
    encode_word32 => u32;
    /// Encode an unsigned 64-bit integer, rejecting negative values and values of `2^64` or more.
    encode_word64 => u64;
    /// Encode a signed 8-bit integer, rejecting anything outside its range.
    encode_int8 => i8;
    /// Encode a signed 16-bit integer, rejecting anything outside its range.
    encode_int16 => i16;
    /// Encode a signed 32-bit integer, rejecting anything outside its range.
    encode_int32 => i32;
    /// Encode a signed 64-bit integer, rejecting anything outside its range.
    encode_int64 => i64;
}

/// The integer that carries the length of a following byte run or collection.
#[derive(serde::Serialize, serde::Deserialize, Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum LengthPrefix {
    /// One byte
    U8,
    /// Two bytes
    U16(Endian),
    /// Four bytes
    U32(Endian),
    /// Eight bytes
    U64(Endian),
}

impl LengthPrefix {
    /// The largest length this prefix can carry.
    pub fn max_length(self) -> u64 {
        match self {
            LengthPrefix::U8 => u8::MAX as u64,
            LengthPrefix::U16(_) => u16::MAX as u64,
            LengthPrefix::U32(_) => u32::MAX as u64,
            LengthPrefix::U64(_) => u64::MAX,
        }
    }

    /// The serialized length of the prefix itself.
    pub fn byte_len(self) -> usize {
        match self {
            LengthPrefix::U8 => 1,
            LengthPrefix::U16(_) => 2,
            LengthPrefix::U32(_) => 4,
            LengthPrefix::U64(_) => 8,
        }
    }

    /// Fail with `LengthOutOfRange` if `length` cannot be carried by this prefix.
    pub fn check(self, length: u64) -> SerResult<()> {
        let max = self.max_length();
        if length > max {
            return Err(SerError::LengthOutOfRange { length, max });
        }
        Ok(())
    }

    /// Write `length` as this prefix.
    pub fn write_length<W>(self, writer: &mut W, length: u64) -> SerResult<usize>
    where
        W: Write,
    {
        self.check(length)?;
        // `check` guarantees the narrowing casts below are lossless
        match self {
            LengthPrefix::U8 => write_u8(writer, length as u8),
            LengthPrefix::U16(e) => write_u16(writer, length as u16, e),
            LengthPrefix::U32(e) => write_u32(writer, length as u32, e),
            LengthPrefix::U64(e) => write_u64(writer, length, e),
        }
    }

    /// Read a length encoded as this prefix.
    pub fn read_length<R>(self, reader: &mut R) -> SerResult<u64>
    where
        R: Read,
    {
        Ok(match self {
            LengthPrefix::U8 => read_u8(reader)? as u64,
            LengthPrefix::U16(e) => read_u16(reader, e)? as u64,
            LengthPrefix::U32(e) => read_u32(reader, e)? as u64,
            LengthPrefix::U64(e) => read_u64(reader, e)?,
        })
    }
}

/// Write a byte run preceded by its length.
pub fn write_prefixed<W>(writer: &mut W, prefix: LengthPrefix, bytes: &[u8]) -> SerResult<usize>
where
    W: Write,
{
    let mut written = prefix.write_length(writer, bytes.len() as u64)?;
    writer.write_all(bytes)?;
    written += bytes.len();
    Ok(written)
}

/// Read a byte run preceded by its length.
pub fn read_prefixed<R>(reader: &mut R, prefix: LengthPrefix) -> SerResult<Vec<u8>>
where
    R: Read,
{
    let length = prefix.read_length(reader)?;
    read_exact_vec(reader, length)
}

/// Read a UTF-8 string preceded by its byte length.
pub fn read_prefixed_string<R>(reader: &mut R, prefix: LengthPrefix) -> SerResult<String>
where
    R: Read,
{
    Ok(String::from_utf8(read_prefixed(reader, prefix)?)?)
}

/// A simple trait for deserializing from `std::io::Read` and serializing to `std::io::Write`.
///
/// `ByteFormat` is used for every wire structure in the workspace: schema trees, transaction
/// payloads, headers, signature maps. Signing digests and transaction hashes are computed by
/// writing `ByteFormat` output into a hashing writer.
pub trait ByteFormat {
    /// An associated error type
    type Error: From<SerError> + From<IOError> + std::error::Error;

    /// Returns the byte-length of the serialized data structure.
    fn serialized_length(&self) -> usize;

    /// Deserializes an instance of `Self` from a `std::io::Read`.
    /// The `limit` argument is used only when deserializing collections, and specifies a maximum
    /// number of instances of the underlying type to read.
    ///
    /// ```
    /// use ccd_core::ser::*;
    ///
    /// let bytes = [0xff, 0xff];
    /// let result = LengthPrefix::U16(Endian::Little).read_length(&mut bytes.as_ref()).unwrap();
    ///
    /// assert_eq!(result, 65535);
    /// ```
    fn read_from<R>(reader: &mut R, limit: usize) -> Result<Self, Self::Error>
    where
        R: Read,
        Self: std::marker::Sized;

    /// Serializes `self` to a `std::io::Write`. Following `Write` trait conventions, its `Ok`
    /// type is a `usize` denoting the number of bytes written.
    fn write_to<W>(&self, writer: &mut W) -> Result<usize, Self::Error>
    where
        W: Write;

    /// Serializes `self` to a fresh vector. Nothing is returned unless the whole value encoded,
    /// so callers never observe a truncated buffer.
    fn to_bytes(&self) -> Result<Vec<u8>, Self::Error> {
        let mut buf = Vec::with_capacity(self.serialized_length());
        self.write_to(&mut buf)?;
        Ok(buf)
    }

    /// Deserializes an instance of `Self` from a byte slice, using a cursor owned by this call.
    fn from_bytes(bytes: &[u8]) -> Result<Self, Self::Error>
    where
        Self: std::marker::Sized,
    {
        let mut cursor = Cursor::new(bytes);
        Self::read_from(&mut cursor, 0)
    }

    /// Decodes a hex string to a `Vec<u8>`, deserializes an instance of `Self` from that vector.
    fn deserialize_hex(s: &str) -> Result<Self, Self::Error>
    where
        Self: std::marker::Sized,
    {
        let v: Vec<u8> = hex::decode(s).map_err(SerError::from)?;
        Self::from_bytes(&v)
    }

    /// Serializes `self` to a vector, returns the hex-encoded vector
    fn serialize_hex(&self) -> Result<String, Self::Error> {
        Ok(hex::encode(self.to_bytes()?))
    }
}
