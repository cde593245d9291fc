//! LEB128 variable-length integers.
//!
//! Readers and writers accept an optional byte bound. A value needing more bytes than the bound
//! fails with `SerError::Leb128TooLong`, and a value that does not fit in 128 bits fails with
//! `SerError::Leb128Overflow`.

use std::io::{Read, Write};

use crate::ser::{read_u8, SerError, SerResult};

fn check_bound(count: u32, max_bytes: Option<u32>) -> SerResult<()> {
    match max_bytes {
        Some(max) if count > max => Err(SerError::Leb128TooLong(max)),
        _ => Ok(()),
    }
}

/// The number of bytes the unsigned LEB128 encoding of `value` occupies.
pub fn uleb128_len(value: u128) -> usize {
    let bits = 128 - value.leading_zeros() as usize;
    std::cmp::max(1, (bits + 6) / 7)
}

/// Write `value` as unsigned LEB128. Returns the number of bytes written.
pub fn write_uleb128<W>(writer: &mut W, value: u128, max_bytes: Option<u32>) -> SerResult<usize>
where
    W: Write,
{
    check_bound(uleb128_len(value) as u32, max_bytes)?;
    let mut value = value;
    let mut written = 0;
    loop {
        let mut byte = (value & 0x7f) as u8;
        value >>= 7;
        if value != 0 {
            byte |= 0x80;
        }
        writer.write_all(&[byte])?;
        written += 1;
        if value == 0 {
            return Ok(written);
        }
    }
}

/// Read an unsigned LEB128 value.
pub fn read_uleb128<R>(reader: &mut R, max_bytes: Option<u32>) -> SerResult<u128>
where
    R: Read,
{
    let mut result = 0u128;
    let mut shift = 0u32;
    let mut count = 0u32;
    loop {
        let byte = read_u8(reader)?;
        count += 1;
        check_bound(count, max_bytes)?;

        let payload = (byte & 0x7f) as u128;
        if shift > 126 || (shift == 126 && payload > 0b11) {
            return Err(SerError::Leb128Overflow);
        }
        result |= payload << shift;

        if byte & 0x80 == 0 {
            return Ok(result);
        }
        shift += 7;
    }
}

/// Write `value` as signed LEB128. Returns the number of bytes written.
pub fn write_ileb128<W>(writer: &mut W, value: i128, max_bytes: Option<u32>) -> SerResult<usize>
where
    W: Write,
{
    let mut buf = vec![];
    let mut value = value;
    loop {
        let byte = (value & 0x7f) as u8;
        value >>= 7;
        let done = (value == 0 && byte & 0x40 == 0) || (value == -1 && byte & 0x40 != 0);
        if done {
            buf.push(byte);
            break;
        }
        buf.push(byte | 0x80);
    }
    check_bound(buf.len() as u32, max_bytes)?;
    writer.write_all(&buf)?;
    Ok(buf.len())
}

/// Read a signed LEB128 value.
pub fn read_ileb128<R>(reader: &mut R, max_bytes: Option<u32>) -> SerResult<i128>
where
    R: Read,
{
    let mut result = 0i128;
    let mut shift = 0u32;
    let mut count = 0u32;
    loop {
        let byte = read_u8(reader)?;
        count += 1;
        check_bound(count, max_bytes)?;

        let payload = (byte & 0x7f) as i128;
        if shift > 126 {
            return Err(SerError::Leb128Overflow);
        }
        if shift == 126 {
            // two value bits remain; the rest must repeat the sign bit and end the number
            let high = payload >> 1;
            if byte & 0x80 != 0 || (high != 0 && high != 0x3f) {
                return Err(SerError::Leb128Overflow);
            }
        }
        result |= payload << shift;
        shift += 7;

        if byte & 0x80 == 0 {
            if shift < 128 && byte & 0x40 != 0 {
                result |= -1i128 << shift;
            }
            return Ok(result);
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn it_writes_unsigned_values() {
        let cases: &[(u128, &[u8])] = &[
            (0, &[0x00]),
            (127, &[0x7f]),
            (128, &[0x80, 0x01]),
            (624485, &[0xe5, 0x8e, 0x26]),
        ];
        for (value, expected) in cases {
            let mut buf = vec![];
            let written = write_uleb128(&mut buf, *value, None).unwrap();
            assert_eq!(&buf[..], *expected);
            assert_eq!(written, uleb128_len(*value));
            assert_eq!(read_uleb128(&mut buf.as_slice(), None).unwrap(), *value);
        }
    }

    #[test]
    fn it_writes_signed_values() {
        let cases: &[(i128, &[u8])] = &[
            (0, &[0x00]),
            (-1, &[0x7f]),
            (63, &[0x3f]),
            (64, &[0xc0, 0x00]),
            (-123456, &[0xc0, 0xbb, 0x78]),
        ];
        for (value, expected) in cases {
            let mut buf = vec![];
            write_ileb128(&mut buf, *value, None).unwrap();
            assert_eq!(&buf[..], *expected);
            assert_eq!(read_ileb128(&mut buf.as_slice(), None).unwrap(), *value);
        }
    }

    #[test]
    fn it_handles_the_extremes() {
        let mut buf = vec![];
        write_uleb128(&mut buf, u128::MAX, None).unwrap();
        assert_eq!(buf.len(), 19);
        assert_eq!(read_uleb128(&mut buf.as_slice(), None).unwrap(), u128::MAX);

        for value in [i128::MIN, i128::MAX] {
            let mut buf = vec![];
            write_ileb128(&mut buf, value, None).unwrap();
            assert_eq!(read_ileb128(&mut buf.as_slice(), None).unwrap(), value);
        }
    }

    #[test]
    fn it_enforces_the_byte_bound() {
        let mut buf = vec![];
        assert!(matches!(
            write_uleb128(&mut buf, 128, Some(1)),
            Err(SerError::Leb128TooLong(1))
        ));
        assert!(buf.is_empty());

        let bytes = [0x80, 0x80, 0x01];
        assert!(matches!(
            read_uleb128(&mut bytes.as_ref(), Some(2)),
            Err(SerError::Leb128TooLong(2))
        ));
        assert_eq!(read_uleb128(&mut bytes.as_ref(), Some(3)).unwrap(), 1 << 14);
    }

    #[test]
    fn it_rejects_overflow() {
        let mut bytes = vec![0xff; 18];
        bytes.push(0x7f);
        assert!(matches!(
            read_uleb128(&mut bytes.as_slice(), None),
            Err(SerError::Leb128Overflow)
        ));
    }

    #[test]
    fn it_fails_on_truncated_input() {
        assert!(matches!(
            read_uleb128(&mut [0x80u8].as_ref(), None),
            Err(SerError::UnexpectedEof)
        ));
    }
}
