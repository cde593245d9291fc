//! Schemas of init and receive functions.
//!
//! A single tag byte records which of the parameter, return value and (from version 2) error
//! schemas follow. Tags that select none of them are rejected.

use std::io::{Read, Write};

use ccd_core::{read_u8, write_u8, ByteFormat};
use serde::{Deserialize, Serialize};

use crate::{
    error::{SchemaError, SchemaResult},
    size::{write_staged, WriteRaw},
    types::SchemaType,
};

/// Common view of a function schema, whatever its version.
pub trait FunctionSchema {
    /// Schema of the parameter
    fn parameter(&self) -> Option<&SchemaType>;

    /// Schema of the return value
    fn return_value(&self) -> Option<&SchemaType>;

    /// Schema of the error. Versions before 2 carry none.
    fn error(&self) -> Option<&SchemaType> {
        None
    }
}

/// Function schema used by module versions 0 and 1.
#[derive(Serialize, Deserialize, Clone, Debug, Default, Eq, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FunctionV1 {
    /// Schema of the parameter
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameter: Option<SchemaType>,
    /// Schema of the return value
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub return_value: Option<SchemaType>,
}

impl FunctionV1 {
    /// The tag byte announcing which schemas follow. `0` parameter, `1` return value, `2` both.
    pub fn tag(&self) -> SchemaResult<u8> {
        match (&self.parameter, &self.return_value) {
            (Some(_), None) => Ok(0),
            (None, Some(_)) => Ok(1),
            (Some(_), Some(_)) => Ok(2),
            (None, None) => Err(SchemaError::EmptyFunctionSchema),
        }
    }
}

impl FunctionSchema for FunctionV1 {
    fn parameter(&self) -> Option<&SchemaType> {
        self.parameter.as_ref()
    }

    fn return_value(&self) -> Option<&SchemaType> {
        self.return_value.as_ref()
    }
}

fn read_if<R>(reader: &mut R, present: bool) -> SchemaResult<Option<SchemaType>>
where
    R: Read,
{
    if present {
        Ok(Some(SchemaType::read_from(reader, 0)?))
    } else {
        Ok(None)
    }
}

fn write_present<W>(writer: &mut W, ty: &Option<SchemaType>) -> SchemaResult<usize>
where
    W: Write,
{
    match ty {
        Some(ty) => ty.write_raw(writer),
        None => Ok(0),
    }
}

fn present_length(ty: &Option<SchemaType>) -> usize {
    ty.as_ref().map(ByteFormat::serialized_length).unwrap_or(0)
}

impl ByteFormat for FunctionV1 {
    type Error = SchemaError;

    fn serialized_length(&self) -> usize {
        1 + present_length(&self.parameter) + present_length(&self.return_value)
    }

    fn read_from<R>(reader: &mut R, _limit: usize) -> SchemaResult<Self>
    where
        R: Read,
        Self: std::marker::Sized,
    {
        let tag = read_u8(reader)?;
        if tag > 2 {
            return Err(SchemaError::InvalidFunctionTag(tag));
        }
        let parameter = read_if(reader, tag == 0 || tag == 2)?;
        let return_value = read_if(reader, tag == 1 || tag == 2)?;
        Ok(Self {
            parameter,
            return_value,
        })
    }

    fn write_to<W>(&self, writer: &mut W) -> SchemaResult<usize>
    where
        W: Write,
    {
        write_staged(writer, self)
    }
}

impl WriteRaw for FunctionV1 {
    fn write_raw<W>(&self, writer: &mut W) -> SchemaResult<usize>
    where
        W: Write,
    {
        let mut len = write_u8(writer, self.tag()?)?;
        len += write_present(writer, &self.parameter)?;
        len += write_present(writer, &self.return_value)?;
        Ok(len)
    }
}

/// Function schema used by module versions 2 and 3.
#[derive(Serialize, Deserialize, Clone, Debug, Default, Eq, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FunctionV2 {
    /// Schema of the parameter
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameter: Option<SchemaType>,
    /// Schema of the return value
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub return_value: Option<SchemaType>,
    /// Schema of the error
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<SchemaType>,
}

impl FunctionV2 {
    /// The tag byte announcing which schemas follow.
    ///
    /// | tag | parameter | return value | error |
    /// |-----|-----------|--------------|-------|
    /// | 0   | x         |              |       |
    /// | 1   |           | x            |       |
    /// | 2   | x         | x            |       |
    /// | 3   |           |              | x     |
    /// | 4   | x         |              | x     |
    /// | 5   |           | x            | x     |
    /// | 6   | x         | x            | x     |
    pub fn tag(&self) -> SchemaResult<u8> {
        match (
            self.parameter.is_some(),
            self.return_value.is_some(),
            self.error.is_some(),
        ) {
            (true, false, false) => Ok(0),
            (false, true, false) => Ok(1),
            (true, true, false) => Ok(2),
            (false, false, true) => Ok(3),
            (true, false, true) => Ok(4),
            (false, true, true) => Ok(5),
            (true, true, true) => Ok(6),
            (false, false, false) => Err(SchemaError::EmptyFunctionSchema),
        }
    }
}

impl FunctionSchema for FunctionV2 {
    fn parameter(&self) -> Option<&SchemaType> {
        self.parameter.as_ref()
    }

    fn return_value(&self) -> Option<&SchemaType> {
        self.return_value.as_ref()
    }

    fn error(&self) -> Option<&SchemaType> {
        self.error.as_ref()
    }
}

impl ByteFormat for FunctionV2 {
    type Error = SchemaError;

    fn serialized_length(&self) -> usize {
        1 + present_length(&self.parameter)
            + present_length(&self.return_value)
            + present_length(&self.error)
    }

    fn read_from<R>(reader: &mut R, _limit: usize) -> SchemaResult<Self>
    where
        R: Read,
        Self: std::marker::Sized,
    {
        let tag = read_u8(reader)?;
        if tag > 6 {
            return Err(SchemaError::InvalidFunctionTag(tag));
        }
        let parameter = read_if(reader, matches!(tag, 0 | 2 | 4 | 6))?;
        let return_value = read_if(reader, matches!(tag, 1 | 2 | 5 | 6))?;
        let error = read_if(reader, matches!(tag, 3 | 4 | 5 | 6))?;
        Ok(Self {
            parameter,
            return_value,
            error,
        })
    }

    fn write_to<W>(&self, writer: &mut W) -> SchemaResult<usize>
    where
        W: Write,
    {
        write_staged(writer, self)
    }
}

impl WriteRaw for FunctionV2 {
    fn write_raw<W>(&self, writer: &mut W) -> SchemaResult<usize>
    where
        W: Write,
    {
        let mut len = write_u8(writer, self.tag()?)?;
        len += write_present(writer, &self.parameter)?;
        len += write_present(writer, &self.return_value)?;
        len += write_present(writer, &self.error)?;
        Ok(len)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn it_decodes_v1_tags() {
        let param_only = FunctionV1::from_bytes(&[0, 2]).unwrap();
        assert_eq!(param_only.parameter, Some(SchemaType::U8));
        assert_eq!(param_only.return_value, None);

        let both = FunctionV1::from_bytes(&[2, 2, 1]).unwrap();
        assert_eq!(both.parameter, Some(SchemaType::U8));
        assert_eq!(both.return_value, Some(SchemaType::Bool));
        assert_eq!(both.to_bytes().unwrap(), vec![2, 2, 1]);

        assert!(matches!(
            FunctionV1::from_bytes(&[3, 2]),
            Err(SchemaError::InvalidFunctionTag(3))
        ));
    }

    #[test]
    fn it_decodes_every_v2_tag() {
        for tag in 0..7u8 {
            let present = [
                matches!(tag, 0 | 2 | 4 | 6),
                matches!(tag, 1 | 2 | 5 | 6),
                matches!(tag, 3 | 4 | 5 | 6),
            ];
            // parameter U8, return value U16, error U32
            let mut bytes = vec![tag];
            bytes.extend([2u8, 3, 4].iter().zip(present.iter()).filter(|(_, p)| **p).map(|(b, _)| *b));
            let function = FunctionV2::from_bytes(&bytes).unwrap();
            assert_eq!(function.parameter.is_some(), present[0]);
            assert_eq!(function.return_value.is_some(), present[1]);
            assert_eq!(function.error.is_some(), present[2]);
            assert_eq!(function.tag().unwrap(), tag);
            assert_eq!(function.to_bytes().unwrap(), bytes);
        }
    }

    #[test]
    fn it_rejects_reserved_v2_tags() {
        assert!(matches!(
            FunctionV2::from_bytes(&[7]),
            Err(SchemaError::InvalidFunctionTag(7))
        ));
        assert!(matches!(
            FunctionV2::from_bytes(&[8, 0]),
            Err(SchemaError::InvalidFunctionTag(8))
        ));
    }

    #[test]
    fn it_refuses_to_encode_empty_functions() {
        assert!(matches!(
            FunctionV2::default().to_bytes(),
            Err(SchemaError::EmptyFunctionSchema)
        ));
        assert!(FunctionV1::default().to_bytes().is_err());
    }
}
