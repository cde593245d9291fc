//! Size-length selectors and the collection combinators schemas are composed from.
//!
//! Sizes are little-endian. The selector itself is a single byte.

use std::collections::BTreeMap;
use std::io::{Read, Write};

use ccd_core::{
    read_prefixed_string, read_u8, write_prefixed, write_u8, ByteFormat, Endian, LengthPrefix,
    SerError,
};

use crate::error::{SchemaError, SchemaResult};

/// Chooses how many bytes encode a following collection's element count or a string's byte
/// length.
#[derive(serde::Serialize, serde::Deserialize, Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum SizeLength {
    /// One byte
    U8,
    /// Two bytes, little-endian
    U16,
    /// Four bytes, little-endian
    U32,
    /// Eight bytes, little-endian
    U64,
}

impl SizeLength {
    /// The selector byte.
    pub fn tag(self) -> u8 {
        match self {
            SizeLength::U8 => 0,
            SizeLength::U16 => 1,
            SizeLength::U32 => 2,
            SizeLength::U64 => 3,
        }
    }

    /// Parse a selector byte.
    pub fn from_tag(tag: u8) -> SchemaResult<Self> {
        match tag {
            0 => Ok(SizeLength::U8),
            1 => Ok(SizeLength::U16),
            2 => Ok(SizeLength::U32),
            3 => Ok(SizeLength::U64),
            _ => Err(SchemaError::InvalidSizeLength(tag)),
        }
    }

    /// The length prefix this selector stands for.
    pub fn prefix(self) -> LengthPrefix {
        match self {
            SizeLength::U8 => LengthPrefix::U8,
            SizeLength::U16 => LengthPrefix::U16(Endian::Little),
            SizeLength::U32 => LengthPrefix::U32(Endian::Little),
            SizeLength::U64 => LengthPrefix::U64(Endian::Little),
        }
    }
}

impl ByteFormat for SizeLength {
    type Error = SchemaError;

    fn serialized_length(&self) -> usize {
        1
    }

    fn read_from<R>(reader: &mut R, _limit: usize) -> SchemaResult<Self>
    where
        R: Read,
        Self: std::marker::Sized,
    {
        SizeLength::from_tag(read_u8(reader)?)
    }

    fn write_to<W>(&self, writer: &mut W) -> SchemaResult<usize>
    where
        W: Write,
    {
        Ok(write_u8(writer, self.tag())?)
    }
}

/// Streaming encoder behind the schema types' `ByteFormat::write_to`. Nested values encode
/// through it so that only the outermost call buffers.
pub(crate) trait WriteRaw {
    /// Write straight to `writer`. On error, part of the value may already be written.
    fn write_raw<W>(&self, writer: &mut W) -> SchemaResult<usize>
    where
        W: Write;
}

/// Encode `value` into a scratch buffer and pass it to `writer` only if the whole encoding
/// succeeded.
pub(crate) fn write_staged<W, T>(writer: &mut W, value: &T) -> SchemaResult<usize>
where
    W: Write,
    T: WriteRaw + ?Sized,
{
    let mut buf = vec![];
    let len = value.write_raw(&mut buf)?;
    writer.write_all(&buf)?;
    Ok(len)
}

/// Write a collection size. Fails with a range violation if `size` exceeds the capacity of
/// `size_length`.
pub fn write_size<W>(writer: &mut W, size_length: SizeLength, size: usize) -> SchemaResult<usize>
where
    W: Write,
{
    Ok(size_length.prefix().write_length(writer, size as u64)?)
}

/// Read a collection size.
pub fn read_size<R>(reader: &mut R, size_length: SizeLength) -> SchemaResult<u64>
where
    R: Read,
{
    Ok(size_length.prefix().read_length(reader)?)
}

/// Read a size-prefixed UTF-8 string.
pub fn read_string<R>(reader: &mut R, size_length: SizeLength) -> SchemaResult<String>
where
    R: Read,
{
    Ok(read_prefixed_string(reader, size_length.prefix())?)
}

/// Write a size-prefixed UTF-8 string.
pub fn write_string<W>(writer: &mut W, size_length: SizeLength, s: &str) -> SchemaResult<usize>
where
    W: Write,
{
    Ok(write_prefixed(writer, size_length.prefix(), s.as_bytes())?)
}

/// The serialized length of a size-prefixed string.
pub fn string_length(size_length: SizeLength, s: &str) -> usize {
    size_length.prefix().byte_len() + s.len()
}

/// Read a size-prefixed list. Items are pushed as they decode, so a declared size larger than
/// the input fails on the first missing item rather than allocating.
pub fn read_list<R, T, F>(
    reader: &mut R,
    size_length: SizeLength,
    mut read_item: F,
) -> SchemaResult<Vec<T>>
where
    R: Read,
    F: FnMut(&mut R) -> SchemaResult<T>,
{
    let size = read_size(reader, size_length)?;
    let mut items = vec![];
    for _ in 0..size {
        items.push(read_item(reader)?);
    }
    Ok(items)
}

/// Write a size-prefixed list.
pub fn write_list<W, T, F>(
    writer: &mut W,
    size_length: SizeLength,
    items: &[T],
    mut write_item: F,
) -> SchemaResult<usize>
where
    W: Write,
    F: FnMut(&mut W, &T) -> SchemaResult<usize>,
{
    let mut len = write_size(writer, size_length, items.len())?;
    for item in items {
        len += write_item(writer, item)?;
    }
    Ok(len)
}

/// Read a size-prefixed map of key-value pairs. A repeated key keeps its last value.
pub fn read_map<R, K, V, FK, FV>(
    reader: &mut R,
    size_length: SizeLength,
    mut read_key: FK,
    mut read_value: FV,
) -> SchemaResult<BTreeMap<K, V>>
where
    R: Read,
    K: Ord,
    FK: FnMut(&mut R) -> SchemaResult<K>,
    FV: FnMut(&mut R) -> SchemaResult<V>,
{
    let size = read_size(reader, size_length)?;
    let mut map = BTreeMap::new();
    for _ in 0..size {
        let key = read_key(reader)?;
        let value = read_value(reader)?;
        map.insert(key, value);
    }
    Ok(map)
}

/// Write a size-prefixed map in key order.
pub fn write_map<W, K, V, FK, FV>(
    writer: &mut W,
    size_length: SizeLength,
    map: &BTreeMap<K, V>,
    mut write_key: FK,
    mut write_value: FV,
) -> SchemaResult<usize>
where
    W: Write,
    FK: FnMut(&mut W, &K) -> SchemaResult<usize>,
    FV: FnMut(&mut W, &V) -> SchemaResult<usize>,
{
    let mut len = write_size(writer, size_length, map.len())?;
    for (key, value) in map {
        len += write_key(writer, key)?;
        len += write_value(writer, value)?;
    }
    Ok(len)
}

/// Read an optional value behind a 0/1 presence byte.
pub fn read_option<R, T, F>(reader: &mut R, read_value: F) -> SchemaResult<Option<T>>
where
    R: Read,
    F: FnOnce(&mut R) -> SchemaResult<T>,
{
    match read_u8(reader)? {
        0 => Ok(None),
        1 => Ok(Some(read_value(reader)?)),
        tag => Err(SerError::InvalidOptionTag(tag).into()),
    }
}

/// Write an optional value behind a 0/1 presence byte.
pub fn write_option<W, T, F>(writer: &mut W, value: Option<&T>, write_value: F) -> SchemaResult<usize>
where
    W: Write,
    F: FnOnce(&mut W, &T) -> SchemaResult<usize>,
{
    match value {
        None => Ok(write_u8(writer, 0)?),
        Some(v) => Ok(write_u8(writer, 1)? + write_value(writer, v)?),
    }
}
