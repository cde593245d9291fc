//! The recursive schema type grammar.

use std::io::{Read, Write};

use ccd_core::{read_u32, read_u8, write_u32, write_u8, ByteFormat, Endian};
use serde::{Deserialize, Serialize};

use crate::{
    error::{SchemaError, SchemaResult},
    size::{
        read_list, read_string, string_length, write_list, write_staged, write_string, SizeLength,
        WriteRaw,
    },
};

/// How deep types may nest before the decoder gives up. Real contract schemas stay far below
/// this, and it keeps adversarial input from exhausting the stack.
pub const MAX_NESTING_DEPTH: usize = 256;

/// Names of fields and enum variants are always `U32`-size prefixed.
const NAME_SIZE: SizeLength = SizeLength::U32;

/// A schema type. One tag byte selects the variant, followed by the variant's payload.
#[derive(Serialize, Deserialize, Clone, Debug, Eq, PartialEq)]
#[serde(tag = "type", rename_all_fields = "camelCase")]
pub enum SchemaType {
    /// Tag 0
    Unit,
    /// Tag 1
    Bool,
    /// Tag 2
    U8,
    /// Tag 3
    U16,
    /// Tag 4
    U32,
    /// Tag 5
    U64,
    /// Tag 6
    I8,
    /// Tag 7
    I16,
    /// Tag 8
    I32,
    /// Tag 9
    I64,
    /// Tag 10
    Amount,
    /// Tag 11
    AccountAddress,
    /// Tag 12
    ContractAddress,
    /// Tag 13
    Timestamp,
    /// Tag 14
    Duration,
    /// Tag 15
    Pair {
        /// First component
        first: Box<SchemaType>,
        /// Second component
        second: Box<SchemaType>,
    },
    /// Tag 16
    List {
        /// Width of the element count
        size_length: SizeLength,
        /// Element type
        item: Box<SchemaType>,
    },
    /// Tag 17
    Set {
        /// Width of the element count
        size_length: SizeLength,
        /// Element type
        item: Box<SchemaType>,
    },
    /// Tag 18
    Map {
        /// Width of the entry count
        size_length: SizeLength,
        /// Key type
        key: Box<SchemaType>,
        /// Value type
        value: Box<SchemaType>,
    },
    /// Tag 19
    Array {
        /// Fixed element count
        size: u32,
        /// Element type
        item: Box<SchemaType>,
    },
    /// Tag 20
    Struct {
        /// The struct's fields
        fields: Fields,
    },
    /// Tag 21. Variants are selected by their position.
    Enum {
        /// Variants in declaration order
        variants: Vec<EnumVariant>,
    },
    /// Tag 22
    String {
        /// Width of the byte length
        size_length: SizeLength,
    },
    /// Tag 23
    U128,
    /// Tag 24
    I128,
    /// Tag 25
    ContractName {
        /// Width of the byte length
        size_length: SizeLength,
    },
    /// Tag 26
    ReceiveName {
        /// Width of the byte length
        size_length: SizeLength,
    },
    /// Tag 27
    ULeb128 {
        /// Largest number of bytes a value may take
        max_byte_size: u32,
    },
    /// Tag 28
    ILeb128 {
        /// Largest number of bytes a value may take
        max_byte_size: u32,
    },
    /// Tag 29
    ByteList {
        /// Width of the byte length
        size_length: SizeLength,
    },
    /// Tag 30
    ByteArray {
        /// Fixed byte count
        size: u32,
    },
    /// Tag 31. Variants are selected by an explicit byte, independent of their position. Order
    /// is the order the variants were first decoded or inserted in.
    TaggedEnum {
        /// Tag byte and variant, unique by tag
        variants: Vec<(u8, EnumVariant)>,
    },
}

/// The fields of a struct or enum variant.
#[derive(Serialize, Deserialize, Clone, Debug, Eq, PartialEq)]
#[serde(tag = "type", content = "fields")]
pub enum Fields {
    /// Tag 0: named fields in declaration order
    Named(Vec<(String, SchemaType)>),
    /// Tag 1: positional fields
    Unnamed(Vec<SchemaType>),
    /// Tag 2: no fields
    None,
}

/// A named enum variant with its fields.
#[derive(Serialize, Deserialize, Clone, Debug, Eq, PartialEq)]
pub struct EnumVariant {
    /// Variant name
    pub name: String,
    /// Variant fields
    pub fields: Fields,
}

impl EnumVariant {
    /// Instantiate a variant
    pub fn new(name: impl Into<String>, fields: Fields) -> Self {
        Self {
            name: name.into(),
            fields,
        }
    }

    fn read_nested<R>(reader: &mut R, depth: usize) -> SchemaResult<Self>
    where
        R: Read,
    {
        let name = read_string(reader, NAME_SIZE)?;
        let fields = Fields::read_nested(reader, depth)?;
        Ok(Self { name, fields })
    }
}

/// Insert a tagged variant. A tag that is already present keeps its position and takes the new
/// variant.
pub fn insert_tagged_variant(variants: &mut Vec<(u8, EnumVariant)>, tag: u8, variant: EnumVariant) {
    match variants.iter_mut().find(|(t, _)| *t == tag) {
        Some(entry) => entry.1 = variant,
        None => variants.push((tag, variant)),
    }
}

fn boxed<R>(reader: &mut R, depth: usize) -> SchemaResult<Box<SchemaType>>
where
    R: Read,
{
    Ok(Box::new(SchemaType::read_nested(reader, depth + 1)?))
}

fn read_le_u32<R>(reader: &mut R) -> SchemaResult<u32>
where
    R: Read,
{
    Ok(read_u32(reader, Endian::Little)?)
}

fn write_le_u32<W>(writer: &mut W, number: u32) -> SchemaResult<usize>
where
    W: Write,
{
    Ok(write_u32(writer, number, Endian::Little)?)
}

impl SchemaType {
    /// The tag byte selecting this variant.
    pub fn tag(&self) -> u8 {
        match self {
            SchemaType::Unit => 0,
            SchemaType::Bool => 1,
            SchemaType::U8 => 2,
            SchemaType::U16 => 3,
            SchemaType::U32 => 4,
            SchemaType::U64 => 5,
            SchemaType::I8 => 6,
            SchemaType::I16 => 7,
            SchemaType::I32 => 8,
            SchemaType::I64 => 9,
            SchemaType::Amount => 10,
            SchemaType::AccountAddress => 11,
            SchemaType::ContractAddress => 12,
            SchemaType::Timestamp => 13,
            SchemaType::Duration => 14,
            SchemaType::Pair { .. } => 15,
            SchemaType::List { .. } => 16,
            SchemaType::Set { .. } => 17,
            SchemaType::Map { .. } => 18,
            SchemaType::Array { .. } => 19,
            SchemaType::Struct { .. } => 20,
            SchemaType::Enum { .. } => 21,
            SchemaType::String { .. } => 22,
            SchemaType::U128 => 23,
            SchemaType::I128 => 24,
            SchemaType::ContractName { .. } => 25,
            SchemaType::ReceiveName { .. } => 26,
            SchemaType::ULeb128 { .. } => 27,
            SchemaType::ILeb128 { .. } => 28,
            SchemaType::ByteList { .. } => 29,
            SchemaType::ByteArray { .. } => 30,
            SchemaType::TaggedEnum { .. } => 31,
        }
    }

    pub(crate) fn read_nested<R>(reader: &mut R, depth: usize) -> SchemaResult<Self>
    where
        R: Read,
    {
        if depth > MAX_NESTING_DEPTH {
            return Err(SchemaError::NestingTooDeep(MAX_NESTING_DEPTH));
        }
        let tag = read_u8(reader)?;
        let ty = match tag {
            0 => SchemaType::Unit,
            1 => SchemaType::Bool,
            2 => SchemaType::U8,
            3 => SchemaType::U16,
            4 => SchemaType::U32,
            5 => SchemaType::U64,
            6 => SchemaType::I8,
            7 => SchemaType::I16,
            8 => SchemaType::I32,
            9 => SchemaType::I64,
            10 => SchemaType::Amount,
            11 => SchemaType::AccountAddress,
            12 => SchemaType::ContractAddress,
            13 => SchemaType::Timestamp,
            14 => SchemaType::Duration,
            15 => {
                let first = boxed(reader, depth)?;
                let second = boxed(reader, depth)?;
                SchemaType::Pair { first, second }
            }
            16 => SchemaType::List {
                size_length: SizeLength::read_from(reader, 0)?,
                item: boxed(reader, depth)?,
            },
            17 => SchemaType::Set {
                size_length: SizeLength::read_from(reader, 0)?,
                item: boxed(reader, depth)?,
            },
            18 => {
                let size_length = SizeLength::read_from(reader, 0)?;
                let key = boxed(reader, depth)?;
                let value = boxed(reader, depth)?;
                SchemaType::Map {
                    size_length,
                    key,
                    value,
                }
            }
            19 => SchemaType::Array {
                size: read_le_u32(reader)?,
                item: boxed(reader, depth)?,
            },
            20 => SchemaType::Struct {
                fields: Fields::read_nested(reader, depth + 1)?,
            },
            21 => SchemaType::Enum {
                variants: read_list(reader, NAME_SIZE, |r| {
                    EnumVariant::read_nested(r, depth + 1)
                })?,
            },
            22 => SchemaType::String {
                size_length: SizeLength::read_from(reader, 0)?,
            },
            23 => SchemaType::U128,
            24 => SchemaType::I128,
            25 => SchemaType::ContractName {
                size_length: SizeLength::read_from(reader, 0)?,
            },
            26 => SchemaType::ReceiveName {
                size_length: SizeLength::read_from(reader, 0)?,
            },
            27 => SchemaType::ULeb128 {
                max_byte_size: read_le_u32(reader)?,
            },
            28 => SchemaType::ILeb128 {
                max_byte_size: read_le_u32(reader)?,
            },
            29 => SchemaType::ByteList {
                size_length: SizeLength::read_from(reader, 0)?,
            },
            30 => SchemaType::ByteArray {
                size: read_le_u32(reader)?,
            },
            31 => {
                let entries = read_list(reader, NAME_SIZE, |r| {
                    let tag = read_u8(r)?;
                    Ok((tag, EnumVariant::read_nested(r, depth + 1)?))
                })?;
                let mut variants = Vec::with_capacity(entries.len());
                for (tag, variant) in entries {
                    insert_tagged_variant(&mut variants, tag, variant);
                }
                SchemaType::TaggedEnum { variants }
            }
            _ => return Err(SchemaError::UnknownTypeTag(tag)),
        };
        Ok(ty)
    }
}

impl ByteFormat for SchemaType {
    type Error = SchemaError;

    fn serialized_length(&self) -> usize {
        1 + match self {
            SchemaType::Pair { first, second } => {
                first.serialized_length() + second.serialized_length()
            }
            SchemaType::List { item, .. } | SchemaType::Set { item, .. } => {
                1 + item.serialized_length()
            }
            SchemaType::Map { key, value, .. } => {
                1 + key.serialized_length() + value.serialized_length()
            }
            SchemaType::Array { item, .. } => 4 + item.serialized_length(),
            SchemaType::Struct { fields } => fields.serialized_length(),
            SchemaType::Enum { variants } => {
                4 + variants
                    .iter()
                    .map(ByteFormat::serialized_length)
                    .sum::<usize>()
            }
            SchemaType::String { .. }
            | SchemaType::ContractName { .. }
            | SchemaType::ReceiveName { .. }
            | SchemaType::ByteList { .. } => 1,
            SchemaType::ULeb128 { .. }
            | SchemaType::ILeb128 { .. }
            | SchemaType::ByteArray { .. } => 4,
            SchemaType::TaggedEnum { variants } => {
                4 + variants
                    .iter()
                    .map(|(_, v)| 1 + v.serialized_length())
                    .sum::<usize>()
            }
            _ => 0,
        }
    }

    fn read_from<R>(reader: &mut R, _limit: usize) -> SchemaResult<Self>
    where
        R: Read,
        Self: std::marker::Sized,
    {
        SchemaType::read_nested(reader, 0)
    }

    fn write_to<W>(&self, writer: &mut W) -> SchemaResult<usize>
    where
        W: Write,
    {
        write_staged(writer, self)
    }
}

impl WriteRaw for SchemaType {
    fn write_raw<W>(&self, writer: &mut W) -> SchemaResult<usize>
    where
        W: Write,
    {
        let mut len = write_u8(writer, self.tag())?;
        len += match self {
            SchemaType::Pair { first, second } => first.write_raw(writer)? + second.write_raw(writer)?,
            SchemaType::List { size_length, item } | SchemaType::Set { size_length, item } => {
                size_length.write_to(writer)? + item.write_raw(writer)?
            }
            SchemaType::Map {
                size_length,
                key,
                value,
            } => size_length.write_to(writer)? + key.write_raw(writer)? + value.write_raw(writer)?,
            SchemaType::Array { size, item } => write_le_u32(writer, *size)? + item.write_raw(writer)?,
            SchemaType::Struct { fields } => fields.write_raw(writer)?,
            SchemaType::Enum { variants } => {
                write_list(writer, NAME_SIZE, variants, |w, v| v.write_raw(w))?
            }
            SchemaType::String { size_length }
            | SchemaType::ContractName { size_length }
            | SchemaType::ReceiveName { size_length }
            | SchemaType::ByteList { size_length } => size_length.write_to(writer)?,
            SchemaType::ULeb128 { max_byte_size } | SchemaType::ILeb128 { max_byte_size } => {
                write_le_u32(writer, *max_byte_size)?
            }
            SchemaType::ByteArray { size } => write_le_u32(writer, *size)?,
            SchemaType::TaggedEnum { variants } => {
                for (i, (tag, _)) in variants.iter().enumerate() {
                    if variants[..i].iter().any(|(t, _)| t == tag) {
                        return Err(SchemaError::DuplicateVariantTag(*tag));
                    }
                }
                write_list(writer, NAME_SIZE, variants, |w, (tag, v)| {
                    Ok(write_u8(w, *tag)? + v.write_raw(w)?)
                })?
            }
            _ => 0,
        };
        Ok(len)
    }
}

impl Fields {
    /// The tag byte selecting this variant.
    pub fn tag(&self) -> u8 {
        match self {
            Fields::Named(_) => 0,
            Fields::Unnamed(_) => 1,
            Fields::None => 2,
        }
    }

    fn read_nested<R>(reader: &mut R, depth: usize) -> SchemaResult<Self>
    where
        R: Read,
    {
        if depth > MAX_NESTING_DEPTH {
            return Err(SchemaError::NestingTooDeep(MAX_NESTING_DEPTH));
        }
        match read_u8(reader)? {
            0 => Ok(Fields::Named(read_list(reader, NAME_SIZE, |r| {
                let name = read_string(r, NAME_SIZE)?;
                Ok((name, SchemaType::read_nested(r, depth + 1)?))
            })?)),
            1 => Ok(Fields::Unnamed(read_list(reader, NAME_SIZE, |r| {
                SchemaType::read_nested(r, depth + 1)
            })?)),
            2 => Ok(Fields::None),
            tag => Err(SchemaError::InvalidFieldsTag(tag)),
        }
    }
}

impl ByteFormat for Fields {
    type Error = SchemaError;

    fn serialized_length(&self) -> usize {
        1 + match self {
            Fields::Named(fields) => {
                4 + fields
                    .iter()
                    .map(|(name, ty)| string_length(NAME_SIZE, name) + ty.serialized_length())
                    .sum::<usize>()
            }
            Fields::Unnamed(fields) => {
                4 + fields
                    .iter()
                    .map(ByteFormat::serialized_length)
                    .sum::<usize>()
            }
            Fields::None => 0,
        }
    }

    fn read_from<R>(reader: &mut R, _limit: usize) -> SchemaResult<Self>
    where
        R: Read,
        Self: std::marker::Sized,
    {
        Fields::read_nested(reader, 0)
    }

    fn write_to<W>(&self, writer: &mut W) -> SchemaResult<usize>
    where
        W: Write,
    {
        write_staged(writer, self)
    }
}

impl WriteRaw for Fields {
    fn write_raw<W>(&self, writer: &mut W) -> SchemaResult<usize>
    where
        W: Write,
    {
        let len = write_u8(writer, self.tag())?;
        Ok(len
            + match self {
                Fields::Named(fields) => write_list(writer, NAME_SIZE, fields, |w, (name, ty)| {
                    Ok(write_string(w, NAME_SIZE, name)? + ty.write_raw(w)?)
                })?,
                Fields::Unnamed(fields) => {
                    write_list(writer, NAME_SIZE, fields, |w, ty| ty.write_raw(w))?
                }
                Fields::None => 0,
            })
    }
}

impl ByteFormat for EnumVariant {
    type Error = SchemaError;

    fn serialized_length(&self) -> usize {
        string_length(NAME_SIZE, &self.name) + self.fields.serialized_length()
    }

    fn read_from<R>(reader: &mut R, _limit: usize) -> SchemaResult<Self>
    where
        R: Read,
        Self: std::marker::Sized,
    {
        EnumVariant::read_nested(reader, 0)
    }

    fn write_to<W>(&self, writer: &mut W) -> SchemaResult<usize>
    where
        W: Write,
    {
        write_staged(writer, self)
    }
}

impl WriteRaw for EnumVariant {
    fn write_raw<W>(&self, writer: &mut W) -> SchemaResult<usize>
    where
        W: Write,
    {
        Ok(write_string(writer, NAME_SIZE, &self.name)? + self.fields.write_raw(writer)?)
    }
}

/// Decode a single standalone schema type. Bytes after the type are ignored.
pub fn decode_schema_type(bytes: &[u8]) -> SchemaResult<SchemaType> {
    SchemaType::from_bytes(bytes)
}

#[cfg(test)]
mod test {
    use super::*;

    fn decode(hex_str: &str) -> SchemaResult<SchemaType> {
        decode_schema_type(&hex::decode(hex_str).unwrap())
    }

    fn boxed(ty: SchemaType) -> Box<SchemaType> {
        Box::new(ty)
    }

    #[test]
    fn it_decodes_every_primitive_tag() {
        let expected = [
            (0u8, SchemaType::Unit),
            (1, SchemaType::Bool),
            (2, SchemaType::U8),
            (3, SchemaType::U16),
            (4, SchemaType::U32),
            (5, SchemaType::U64),
            (6, SchemaType::I8),
            (7, SchemaType::I16),
            (8, SchemaType::I32),
            (9, SchemaType::I64),
            (10, SchemaType::Amount),
            (11, SchemaType::AccountAddress),
            (12, SchemaType::ContractAddress),
            (13, SchemaType::Timestamp),
            (14, SchemaType::Duration),
            (23, SchemaType::U128),
            (24, SchemaType::I128),
        ];
        for (tag, ty) in expected.iter() {
            assert_eq!(&decode_schema_type(&[*tag]).unwrap(), ty);
            assert_eq!(ty.tag(), *tag);
            assert_eq!(ty.to_bytes().unwrap(), vec![*tag]);
        }
    }

    #[test]
    fn it_decodes_composite_tags() {
        let cases = [
            (
                "0f0203",
                SchemaType::Pair {
                    first: boxed(SchemaType::U8),
                    second: boxed(SchemaType::U16),
                },
            ),
            (
                "100102",
                SchemaType::List {
                    size_length: SizeLength::U16,
                    item: boxed(SchemaType::U8),
                },
            ),
            (
                "11000b",
                SchemaType::Set {
                    size_length: SizeLength::U8,
                    item: boxed(SchemaType::AccountAddress),
                },
            ),
            (
                "1203160205",
                SchemaType::Map {
                    size_length: SizeLength::U64,
                    key: boxed(SchemaType::String {
                        size_length: SizeLength::U32,
                    }),
                    value: boxed(SchemaType::U64),
                },
            ),
            (
                "130400000001",
                SchemaType::Array {
                    size: 4,
                    item: boxed(SchemaType::Bool),
                },
            ),
            ("1601", SchemaType::String { size_length: SizeLength::U16 }),
            ("1900", SchemaType::ContractName { size_length: SizeLength::U8 }),
            ("1a02", SchemaType::ReceiveName { size_length: SizeLength::U32 }),
            ("1b05000000", SchemaType::ULeb128 { max_byte_size: 5 }),
            ("1c10000000", SchemaType::ILeb128 { max_byte_size: 16 }),
            ("1d03", SchemaType::ByteList { size_length: SizeLength::U64 }),
            ("1e20000000", SchemaType::ByteArray { size: 32 }),
        ];
        for (bytes, ty) in cases.iter() {
            assert_eq!(&decode(bytes).unwrap(), ty);
            assert_eq!(&hex::encode(ty.to_bytes().unwrap()), bytes);
            assert_eq!(ty.serialized_length(), bytes.len() / 2);
        }
    }

    #[test]
    fn it_decodes_structs_and_enums() {
        // struct { a: u8, bc: (bool) } with the inner struct unnamed
        let named = "14000200000001000000610202000000626314010100000001";
        let expected = SchemaType::Struct {
            fields: Fields::Named(vec![
                ("a".to_owned(), SchemaType::U8),
                (
                    "bc".to_owned(),
                    SchemaType::Struct {
                        fields: Fields::Unnamed(vec![SchemaType::Bool]),
                    },
                ),
            ]),
        };
        assert_eq!(decode(named).unwrap(), expected);
        assert_eq!(hex::encode(expected.to_bytes().unwrap()), named);

        // enum { A, B(u32) }
        let enum_bytes = "15020000000100000041020100000042010100000004";
        let expected = SchemaType::Enum {
            variants: vec![
                EnumVariant::new("A", Fields::None),
                EnumVariant::new("B", Fields::Unnamed(vec![SchemaType::U32])),
            ],
        };
        assert_eq!(decode(enum_bytes).unwrap(), expected);
        assert_eq!(expected.serialized_length(), enum_bytes.len() / 2);
    }

    #[test]
    fn it_keeps_tagged_enum_order() {
        // three entries: tag 9 "X", tag 2 "Y", tag 9 again "Z"
        let bytes = "1f03000000090100000058020201000000590209010000005a02";
        let ty = decode(bytes).unwrap();
        assert_eq!(
            ty,
            SchemaType::TaggedEnum {
                variants: vec![
                    (9, EnumVariant::new("Z", Fields::None)),
                    (2, EnumVariant::new("Y", Fields::None)),
                ],
            }
        );
        let reencoded = ty.to_bytes().unwrap();
        assert_eq!(decode_schema_type(&reencoded).unwrap(), ty);
    }

    #[test]
    fn it_rejects_duplicate_tags_on_encode() {
        let ty = SchemaType::TaggedEnum {
            variants: vec![
                (1, EnumVariant::new("A", Fields::None)),
                (1, EnumVariant::new("B", Fields::None)),
            ],
        };
        assert!(matches!(
            ty.to_bytes(),
            Err(SchemaError::DuplicateVariantTag(1))
        ));
    }

    #[test]
    fn it_writes_nothing_when_encoding_fails() {
        let ty = SchemaType::Pair {
            first: Box::new(SchemaType::U8),
            second: Box::new(SchemaType::TaggedEnum {
                variants: vec![
                    (1, EnumVariant::new("A", Fields::None)),
                    (1, EnumVariant::new("B", Fields::None)),
                ],
            }),
        };
        let mut out = vec![];
        assert!(matches!(
            ty.write_to(&mut out),
            Err(SchemaError::DuplicateVariantTag(1))
        ));
        assert!(out.is_empty());

        let ok = SchemaType::Pair {
            first: Box::new(SchemaType::U8),
            second: Box::new(SchemaType::Bool),
        };
        assert_eq!(ok.write_to(&mut out).unwrap(), 3);
        assert_eq!(out, vec![0x0f, 0x02, 0x01]);
    }

    #[test]
    fn it_rejects_unknown_tags() {
        assert!(matches!(decode("20"), Err(SchemaError::UnknownTypeTag(32))));
        assert!(matches!(decode("ff"), Err(SchemaError::UnknownTypeTag(255))));
        assert!(matches!(decode("1004"), Err(SchemaError::InvalidSizeLength(4))));
        assert!(matches!(decode("1403"), Err(SchemaError::InvalidFieldsTag(3))));
    }

    #[test]
    fn it_rejects_truncated_input() {
        for bytes in ["", "0f02", "10", "1e2000", "14000100000001"] {
            let err = decode(bytes).unwrap_err();
            assert_eq!(err.kind(), ccd_core::ErrorKind::MalformedInput, "{}", bytes);
        }
    }

    #[test]
    fn it_limits_nesting() {
        let mut bytes = vec![0x10u8, 0x00].repeat(MAX_NESTING_DEPTH + 1);
        bytes.push(0x00);
        assert!(matches!(
            decode_schema_type(&bytes),
            Err(SchemaError::NestingTooDeep(_))
        ));

        let mut ok = vec![0x10u8, 0x00].repeat(8);
        ok.push(0x00);
        assert!(decode_schema_type(&ok).is_ok());
    }

    #[test]
    fn it_serdes_as_json() {
        let ty = SchemaType::Map {
            size_length: SizeLength::U32,
            key: boxed(SchemaType::U8),
            value: boxed(SchemaType::Struct {
                fields: Fields::Unnamed(vec![SchemaType::Bool]),
            }),
        };
        let json = serde_json::to_value(&ty).unwrap();
        assert_eq!(json["type"], "Map");
        assert_eq!(json["sizeLength"], "U32");
        assert_eq!(json["key"]["type"], "U8");
        assert_eq!(json["value"]["fields"]["type"], "Unnamed");
        assert_eq!(serde_json::from_value::<SchemaType>(json).unwrap(), ty);
    }
}
