//! Module schemas and version dispatch.
//!
//! A versioned schema starts with the magic `ff ff` and a version byte. An unversioned schema
//! is the module bytes alone, with the version (0 or 1) supplied by the caller.

use std::collections::BTreeMap;
use std::io::{Read, Write};

use ccd_core::{read_array, read_u8, write_u8, ByteFormat};
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::{
    contract::{map_length, read_name, write_name, ContractSchema, ContractV0, ContractV1, ContractV2, ContractV3},
    error::{SchemaError, SchemaResult},
    function::FunctionSchema,
    size::{read_map, write_map, write_staged, SizeLength, WriteRaw},
    types::SchemaType,
};

/// Prefix of a versioned module schema.
pub const VERSIONED_SCHEMA_MAGIC: [u8; 2] = [0xff, 0xff];

macro_rules! module_version {
    (
        $(#[$outer:meta])*
        $name:ident, $contract:ty
    ) => {
        $(#[$outer])*
        #[derive(Serialize, Deserialize, Clone, Debug, Default, Eq, PartialEq)]
        pub struct $name {
            /// Contract schemas keyed by contract name
            pub contracts: BTreeMap<String, $contract>,
        }

        impl ByteFormat for $name {
            type Error = SchemaError;

            fn serialized_length(&self) -> usize {
                map_length(&self.contracts)
            }

            fn read_from<R>(reader: &mut R, _limit: usize) -> SchemaResult<Self>
            where
                R: Read,
                Self: std::marker::Sized,
            {
                let contracts = read_map(reader, SizeLength::U32, read_name, |r| {
                    <$contract>::read_from(r, 0)
                })?;
                trace!(contracts = contracts.len(), "decoded {}", stringify!($name));
                Ok(Self { contracts })
            }

            fn write_to<W>(&self, writer: &mut W) -> SchemaResult<usize>
            where
                W: Write,
            {
                write_staged(writer, self)
            }
        }

        impl WriteRaw for $name {
            fn write_raw<W>(&self, writer: &mut W) -> SchemaResult<usize>
            where
                W: Write,
            {
                write_map(writer, SizeLength::U32, &self.contracts, write_name, |w, c| {
                    c.write_raw(w)
                })
            }
        }
    };
}

module_version!(
    /// Module schema, version 0
    ModuleV0, ContractV0
);
module_version!(
    /// Module schema, version 1
    ModuleV1, ContractV1
);
module_version!(
    /// Module schema, version 2
    ModuleV2, ContractV2
);
module_version!(
    /// Module schema, version 3
    ModuleV3, ContractV3
);

/// A module schema tagged with its version. As JSON the version is the wire version byte in
/// decimal, e.g. `{"version":"3","module":{...}}`.
#[derive(Serialize, Deserialize, Clone, Debug, Eq, PartialEq)]
#[serde(tag = "version", content = "module")]
pub enum VersionedSchemaModule {
    /// Version 0, function schemas v1, contracts carry a state schema
    #[serde(rename = "0")]
    V0(ModuleV0),
    /// Version 1, function schemas v1
    #[serde(rename = "1")]
    V1(ModuleV1),
    /// Version 2, function schemas v2
    #[serde(rename = "2")]
    V2(ModuleV2),
    /// Version 3, function schemas v2, contracts carry an event schema
    #[serde(rename = "3")]
    V3(ModuleV3),
}

/// A borrowed contract schema of any version.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ContractRef<'a> {
    /// From a version 0 module
    V0(&'a ContractV0),
    /// From a version 1 module
    V1(&'a ContractV1),
    /// From a version 2 module
    V2(&'a ContractV2),
    /// From a version 3 module
    V3(&'a ContractV3),
}

fn find<'a, C>(contracts: &'a BTreeMap<String, C>, name: &str) -> SchemaResult<&'a C> {
    contracts
        .get(name)
        .ok_or_else(|| SchemaError::ContractNotFound(name.to_owned()))
}

// Resolve the named contract in whichever version the module is, then evaluate `$body` with
// it bound to `$c`.
macro_rules! with_contract {
    ($module:expr, $name:expr, |$c:ident| $body:expr) => {
        match $module {
            VersionedSchemaModule::V0(m) => {
                let $c = find(&m.contracts, $name)?;
                $body
            }
            VersionedSchemaModule::V1(m) => {
                let $c = find(&m.contracts, $name)?;
                $body
            }
            VersionedSchemaModule::V2(m) => {
                let $c = find(&m.contracts, $name)?;
                $body
            }
            VersionedSchemaModule::V3(m) => {
                let $c = find(&m.contracts, $name)?;
                $body
            }
        }
    };
}

impl VersionedSchemaModule {
    /// The version number.
    pub fn version(&self) -> u8 {
        match self {
            VersionedSchemaModule::V0(_) => 0,
            VersionedSchemaModule::V1(_) => 1,
            VersionedSchemaModule::V2(_) => 2,
            VersionedSchemaModule::V3(_) => 3,
        }
    }

    /// Names of the contracts the module describes, in order.
    pub fn contract_names(&self) -> Vec<&str> {
        match self {
            VersionedSchemaModule::V0(m) => m.contracts.keys().map(String::as_str).collect(),
            VersionedSchemaModule::V1(m) => m.contracts.keys().map(String::as_str).collect(),
            VersionedSchemaModule::V2(m) => m.contracts.keys().map(String::as_str).collect(),
            VersionedSchemaModule::V3(m) => m.contracts.keys().map(String::as_str).collect(),
        }
    }

    /// The schema of a contract.
    pub fn contract(&self, name: &str) -> SchemaResult<ContractRef<'_>> {
        Ok(match self {
            VersionedSchemaModule::V0(m) => ContractRef::V0(find(&m.contracts, name)?),
            VersionedSchemaModule::V1(m) => ContractRef::V1(find(&m.contracts, name)?),
            VersionedSchemaModule::V2(m) => ContractRef::V2(find(&m.contracts, name)?),
            VersionedSchemaModule::V3(m) => ContractRef::V3(find(&m.contracts, name)?),
        })
    }

    /// Schema of the init parameter of `contract`.
    pub fn init_parameter(&self, contract: &str) -> SchemaResult<Option<&SchemaType>> {
        Ok(with_contract!(self, contract, |c| c
            .init()
            .and_then(FunctionSchema::parameter)))
    }

    /// Schema of the init error of `contract`.
    pub fn init_error(&self, contract: &str) -> SchemaResult<Option<&SchemaType>> {
        Ok(with_contract!(self, contract, |c| c
            .init()
            .and_then(FunctionSchema::error)))
    }

    /// Schema of the parameter of `contract.entrypoint`.
    pub fn receive_parameter(
        &self,
        contract: &str,
        entrypoint: &str,
    ) -> SchemaResult<Option<&SchemaType>> {
        Ok(with_contract!(self, contract, |c| c
            .receive(entrypoint)
            .and_then(FunctionSchema::parameter)))
    }

    /// Schema of the return value of `contract.entrypoint`.
    pub fn receive_return_value(
        &self,
        contract: &str,
        entrypoint: &str,
    ) -> SchemaResult<Option<&SchemaType>> {
        Ok(with_contract!(self, contract, |c| c
            .receive(entrypoint)
            .and_then(FunctionSchema::return_value)))
    }

    /// Schema of the error of `contract.entrypoint`.
    pub fn receive_error(
        &self,
        contract: &str,
        entrypoint: &str,
    ) -> SchemaResult<Option<&SchemaType>> {
        Ok(with_contract!(self, contract, |c| c
            .receive(entrypoint)
            .and_then(FunctionSchema::error)))
    }

    /// Schema of the events of `contract`.
    pub fn event(&self, contract: &str) -> SchemaResult<Option<&SchemaType>> {
        Ok(with_contract!(self, contract, |c| c.event()))
    }

    /// Schema of the state of `contract`.
    pub fn state(&self, contract: &str) -> SchemaResult<Option<&SchemaType>> {
        Ok(with_contract!(self, contract, |c| c.state()))
    }

    fn read_module<R>(reader: &mut R, version: u8) -> SchemaResult<Self>
    where
        R: Read,
    {
        trace!(version, "decoding module schema");
        Ok(match version {
            0 => VersionedSchemaModule::V0(ModuleV0::read_from(reader, 0)?),
            1 => VersionedSchemaModule::V1(ModuleV1::read_from(reader, 0)?),
            2 => VersionedSchemaModule::V2(ModuleV2::read_from(reader, 0)?),
            3 => VersionedSchemaModule::V3(ModuleV3::read_from(reader, 0)?),
            _ => return Err(SchemaError::UnsupportedVersion(version)),
        })
    }

    /// Serialize the module bytes without the magic and version prefix.
    pub fn write_unversioned<W>(&self, writer: &mut W) -> SchemaResult<usize>
    where
        W: Write,
    {
        match self {
            VersionedSchemaModule::V0(m) => m.write_to(writer),
            VersionedSchemaModule::V1(m) => m.write_to(writer),
            VersionedSchemaModule::V2(m) => m.write_to(writer),
            VersionedSchemaModule::V3(m) => m.write_to(writer),
        }
    }

    fn write_unversioned_raw<W>(&self, writer: &mut W) -> SchemaResult<usize>
    where
        W: Write,
    {
        match self {
            VersionedSchemaModule::V0(m) => m.write_raw(writer),
            VersionedSchemaModule::V1(m) => m.write_raw(writer),
            VersionedSchemaModule::V2(m) => m.write_raw(writer),
            VersionedSchemaModule::V3(m) => m.write_raw(writer),
        }
    }
}

impl ByteFormat for VersionedSchemaModule {
    type Error = SchemaError;

    fn serialized_length(&self) -> usize {
        3 + match self {
            VersionedSchemaModule::V0(m) => m.serialized_length(),
            VersionedSchemaModule::V1(m) => m.serialized_length(),
            VersionedSchemaModule::V2(m) => m.serialized_length(),
            VersionedSchemaModule::V3(m) => m.serialized_length(),
        }
    }

    fn read_from<R>(reader: &mut R, _limit: usize) -> SchemaResult<Self>
    where
        R: Read,
        Self: std::marker::Sized,
    {
        let magic: [u8; 2] = read_array(reader)?;
        if magic != VERSIONED_SCHEMA_MAGIC {
            return Err(SchemaError::MagicMismatch(magic));
        }
        let version = read_u8(reader)?;
        VersionedSchemaModule::read_module(reader, version)
    }

    fn write_to<W>(&self, writer: &mut W) -> SchemaResult<usize>
    where
        W: Write,
    {
        write_staged(writer, self)
    }
}

impl WriteRaw for VersionedSchemaModule {
    fn write_raw<W>(&self, writer: &mut W) -> SchemaResult<usize>
    where
        W: Write,
    {
        writer.write_all(&VERSIONED_SCHEMA_MAGIC)?;
        let len = 2 + write_u8(writer, self.version())?;
        Ok(len + self.write_unversioned_raw(writer)?)
    }
}

/// Decode a module schema that starts with the `ff ff` magic and a version byte.
pub fn decode_versioned_module(bytes: &[u8]) -> SchemaResult<VersionedSchemaModule> {
    VersionedSchemaModule::from_bytes(bytes)
}

/// Decode a module schema without magic or version prefix. Only versions 0 and 1 exist in
/// unversioned form.
pub fn decode_unversioned_module(bytes: &[u8], version: u8) -> SchemaResult<VersionedSchemaModule> {
    if version > 1 {
        return Err(SchemaError::UnsupportedVersion(version));
    }
    VersionedSchemaModule::read_module(&mut &bytes[..], version)
}

/// Decode a module schema, versioned if it starts with the magic, otherwise unversioned using
/// the supplied version.
pub fn decode_module(bytes: &[u8], version: Option<u8>) -> SchemaResult<VersionedSchemaModule> {
    if bytes.starts_with(&VERSIONED_SCHEMA_MAGIC) {
        return decode_versioned_module(bytes);
    }
    match version {
        Some(version) => decode_unversioned_module(bytes, version),
        None => Err(SchemaError::MissingVersion),
    }
}
