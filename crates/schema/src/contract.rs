//! Per-version contract schemas. Receive functions are keyed by entrypoint name; names are
//! `U32`-size prefixed on the wire.

use std::collections::BTreeMap;
use std::io::{Read, Write};

use ccd_core::ByteFormat;
use serde::{Deserialize, Serialize};

use crate::{
    error::{SchemaError, SchemaResult},
    function::{FunctionSchema, FunctionV1, FunctionV2},
    size::{
        read_map, read_option, read_string, string_length, write_map, write_option, write_staged,
        write_string, SizeLength, WriteRaw,
    },
    types::SchemaType,
};

const NAME_SIZE: SizeLength = SizeLength::U32;

/// Common view of a contract schema, whatever its version.
pub trait ContractSchema {
    /// The function schema of this version
    type Function: FunctionSchema;

    /// The init function, if described
    fn init(&self) -> Option<&Self::Function>;

    /// A receive function by entrypoint name
    fn receive(&self, entrypoint: &str) -> Option<&Self::Function>;

    /// The event schema. Only version 3 carries one.
    fn event(&self) -> Option<&SchemaType> {
        None
    }

    /// The state schema. Only version 0 carries one.
    fn state(&self) -> Option<&SchemaType> {
        None
    }
}

pub(crate) fn read_name<R>(reader: &mut R) -> SchemaResult<String>
where
    R: Read,
{
    read_string(reader, NAME_SIZE)
}

pub(crate) fn write_name<W>(writer: &mut W, name: &String) -> SchemaResult<usize>
where
    W: Write,
{
    write_string(writer, NAME_SIZE, name)
}

pub(crate) fn map_length<V: ByteFormat>(map: &BTreeMap<String, V>) -> usize {
    4 + map
        .iter()
        .map(|(name, v)| string_length(NAME_SIZE, name) + v.serialized_length())
        .sum::<usize>()
}

fn read_receive<R, F>(reader: &mut R) -> SchemaResult<BTreeMap<String, F>>
where
    R: Read,
    F: ByteFormat<Error = SchemaError>,
{
    read_map(reader, NAME_SIZE, read_name, |r| F::read_from(r, 0))
}

fn write_receive<W, F>(writer: &mut W, receive: &BTreeMap<String, F>) -> SchemaResult<usize>
where
    W: Write,
    F: WriteRaw,
{
    write_map(writer, NAME_SIZE, receive, write_name, |w, f| f.write_raw(w))
}

fn option_length<T: ByteFormat>(value: &Option<T>) -> usize {
    1 + value.as_ref().map(ByteFormat::serialized_length).unwrap_or(0)
}

fn read_opt<R, T>(reader: &mut R) -> SchemaResult<Option<T>>
where
    R: Read,
    T: ByteFormat<Error = SchemaError>,
{
    read_option(reader, |r| T::read_from(r, 0))
}

fn write_opt<W, T>(writer: &mut W, value: &Option<T>) -> SchemaResult<usize>
where
    W: Write,
    T: WriteRaw,
{
    write_option(writer, value.as_ref(), |w, v| v.write_raw(w))
}

/// Contract schema of a version 0 module.
#[derive(Serialize, Deserialize, Clone, Debug, Default, Eq, PartialEq)]
pub struct ContractV0 {
    /// Schema of the contract state
    pub state: Option<SchemaType>,
    /// Schema of the init function
    pub init: Option<FunctionV1>,
    /// Schemas of the receive functions
    pub receive: BTreeMap<String, FunctionV1>,
}

/// Contract schema of a version 1 module.
#[derive(Serialize, Deserialize, Clone, Debug, Default, Eq, PartialEq)]
pub struct ContractV1 {
    /// Schema of the init function
    pub init: Option<FunctionV1>,
    /// Schemas of the receive functions
    pub receive: BTreeMap<String, FunctionV1>,
}

/// Contract schema of a version 2 module.
#[derive(Serialize, Deserialize, Clone, Debug, Default, Eq, PartialEq)]
pub struct ContractV2 {
    /// Schema of the init function
    pub init: Option<FunctionV2>,
    /// Schemas of the receive functions
    pub receive: BTreeMap<String, FunctionV2>,
}

/// Contract schema of a version 3 module.
#[derive(Serialize, Deserialize, Clone, Debug, Default, Eq, PartialEq)]
pub struct ContractV3 {
    /// Schema of the init function
    pub init: Option<FunctionV2>,
    /// Schemas of the receive functions
    pub receive: BTreeMap<String, FunctionV2>,
    /// Schema of the events the contract logs
    pub event: Option<SchemaType>,
}

impl ByteFormat for ContractV0 {
    type Error = SchemaError;

    fn serialized_length(&self) -> usize {
        option_length(&self.state) + option_length(&self.init) + map_length(&self.receive)
    }

    fn read_from<R>(reader: &mut R, _limit: usize) -> SchemaResult<Self>
    where
        R: Read,
        Self: std::marker::Sized,
    {
        let state = read_opt(reader)?;
        let init = read_opt(reader)?;
        let receive = read_receive(reader)?;
        Ok(Self {
            state,
            init,
            receive,
        })
    }

    fn write_to<W>(&self, writer: &mut W) -> SchemaResult<usize>
    where
        W: Write,
    {
        write_staged(writer, self)
    }
}

impl WriteRaw for ContractV0 {
    fn write_raw<W>(&self, writer: &mut W) -> SchemaResult<usize>
    where
        W: Write,
    {
        let mut len = write_opt(writer, &self.state)?;
        len += write_opt(writer, &self.init)?;
        len += write_receive(writer, &self.receive)?;
        Ok(len)
    }
}

impl ByteFormat for ContractV1 {
    type Error = SchemaError;

    fn serialized_length(&self) -> usize {
        option_length(&self.init) + map_length(&self.receive)
    }

    fn read_from<R>(reader: &mut R, _limit: usize) -> SchemaResult<Self>
    where
        R: Read,
        Self: std::marker::Sized,
    {
        let init = read_opt(reader)?;
        let receive = read_receive(reader)?;
        Ok(Self { init, receive })
    }

    fn write_to<W>(&self, writer: &mut W) -> SchemaResult<usize>
    where
        W: Write,
    {
        write_staged(writer, self)
    }
}

impl WriteRaw for ContractV1 {
    fn write_raw<W>(&self, writer: &mut W) -> SchemaResult<usize>
    where
        W: Write,
    {
        Ok(write_opt(writer, &self.init)? + write_receive(writer, &self.receive)?)
    }
}

impl ByteFormat for ContractV2 {
    type Error = SchemaError;

    fn serialized_length(&self) -> usize {
        option_length(&self.init) + map_length(&self.receive)
    }

    fn read_from<R>(reader: &mut R, _limit: usize) -> SchemaResult<Self>
    where
        R: Read,
        Self: std::marker::Sized,
    {
        let init = read_opt(reader)?;
        let receive = read_receive(reader)?;
        Ok(Self { init, receive })
    }

    fn write_to<W>(&self, writer: &mut W) -> SchemaResult<usize>
    where
        W: Write,
    {
        write_staged(writer, self)
    }
}

impl WriteRaw for ContractV2 {
    fn write_raw<W>(&self, writer: &mut W) -> SchemaResult<usize>
    where
        W: Write,
    {
        Ok(write_opt(writer, &self.init)? + write_receive(writer, &self.receive)?)
    }
}

impl ByteFormat for ContractV3 {
    type Error = SchemaError;

    fn serialized_length(&self) -> usize {
        option_length(&self.init) + map_length(&self.receive) + option_length(&self.event)
    }

    fn read_from<R>(reader: &mut R, _limit: usize) -> SchemaResult<Self>
    where
        R: Read,
        Self: std::marker::Sized,
    {
        let init = read_opt(reader)?;
        let receive = read_receive(reader)?;
        let event = read_opt(reader)?;
        Ok(Self {
            init,
            receive,
            event,
        })
    }

    fn write_to<W>(&self, writer: &mut W) -> SchemaResult<usize>
    where
        W: Write,
    {
        write_staged(writer, self)
    }
}

impl WriteRaw for ContractV3 {
    fn write_raw<W>(&self, writer: &mut W) -> SchemaResult<usize>
    where
        W: Write,
    {
        let mut len = write_opt(writer, &self.init)?;
        len += write_receive(writer, &self.receive)?;
        len += write_opt(writer, &self.event)?;
        Ok(len)
    }
}

impl ContractSchema for ContractV0 {
    type Function = FunctionV1;

    fn init(&self) -> Option<&FunctionV1> {
        self.init.as_ref()
    }

    fn receive(&self, entrypoint: &str) -> Option<&FunctionV1> {
        self.receive.get(entrypoint)
    }

    fn state(&self) -> Option<&SchemaType> {
        self.state.as_ref()
    }
}

impl ContractSchema for ContractV1 {
    type Function = FunctionV1;

    fn init(&self) -> Option<&FunctionV1> {
        self.init.as_ref()
    }

    fn receive(&self, entrypoint: &str) -> Option<&FunctionV1> {
        self.receive.get(entrypoint)
    }
}

impl ContractSchema for ContractV2 {
    type Function = FunctionV2;

    fn init(&self) -> Option<&FunctionV2> {
        self.init.as_ref()
    }

    fn receive(&self, entrypoint: &str) -> Option<&FunctionV2> {
        self.receive.get(entrypoint)
    }
}

impl ContractSchema for ContractV3 {
    type Function = FunctionV2;

    fn init(&self) -> Option<&FunctionV2> {
        self.init.as_ref()
    }

    fn receive(&self, entrypoint: &str) -> Option<&FunctionV2> {
        self.receive.get(entrypoint)
    }

    fn event(&self) -> Option<&SchemaType> {
        self.event.as_ref()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn it_decodes_a_v0_contract() {
        // state: u64, init: none, receive: { "bump": parameter u8 }
        let bytes = hex::decode("01050001000000040000006275 6d700002".replace(' ', "")).unwrap();
        let contract = ContractV0::from_bytes(&bytes).unwrap();
        assert_eq!(contract.state(), Some(&SchemaType::U64));
        assert!(contract.init().is_none());
        assert_eq!(
            contract.receive("bump").and_then(FunctionSchema::parameter),
            Some(&SchemaType::U8)
        );
        assert!(contract.receive("other").is_none());
        assert_eq!(contract.to_bytes().unwrap(), bytes);
        assert_eq!(contract.serialized_length(), bytes.len());
    }

    #[test]
    fn it_decodes_a_v3_contract() {
        // init: parameter unit + error i32, no receive, event: string(u8)
        let bytes = hex::decode("0104000800000000011600").unwrap();
        let contract = ContractV3::from_bytes(&bytes).unwrap();
        let init = contract.init().unwrap();
        assert_eq!(init.parameter(), Some(&SchemaType::Unit));
        assert_eq!(init.error(), Some(&SchemaType::I32));
        assert_eq!(
            contract.event(),
            Some(&SchemaType::String {
                size_length: SizeLength::U8
            })
        );
        assert_eq!(contract.to_bytes().unwrap(), bytes);
    }

    #[test]
    fn it_rejects_bad_option_tags() {
        assert!(ContractV1::from_bytes(&[2]).is_err());
    }
}
