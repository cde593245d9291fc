//! Smart contract payloads: module deployment, instance initialization and entrypoint calls.

use std::io::{Read, Write};

use ccd_core::{
    read_prefixed, read_prefixed_string, read_u32, write_prefixed, write_u32, ByteFormat, Endian,
    LengthPrefix,
};
use serde::{Deserialize, Serialize};

use crate::{
    error::{TxError, TxResult},
    payload::TransactionPayload,
    primitives::{hex_bytes, Amount, ContractAddress, Energy, ModuleReference, Parameter},
    transaction_type::AccountTransactionType,
};

const WASM_PREFIX: LengthPrefix = LengthPrefix::U32(Endian::Big);
const NAME_PREFIX: LengthPrefix = LengthPrefix::U16(Endian::Big);

/// Prefix the chain adds to contract names in init function names.
pub const INIT_NAME_PREFIX: &str = "init_";

/// Bytes of version and length at the head of a module that carries its own version.
pub const EMBEDDED_MODULE_HEADER_SIZE: usize = 8;

/// Deploy a wasm module.
///
/// With a `version`, `source` is bare wasm and is written as version(u32) ∥ length(u32) ∥ wasm.
/// Without one, `source` already starts with its version and length and is written verbatim.
#[derive(Serialize, Deserialize, Clone, Debug, Eq, PartialEq)]
pub struct DeployModule {
    /// Smart contract version of the module, if not embedded in `source`
    pub version: Option<u32>,
    /// Module bytes
    #[serde(with = "hex_bytes")]
    pub source: Vec<u8>,
}

impl DeployModule {
    /// A bare wasm module of the given version.
    pub fn versioned(version: u32, wasm: Vec<u8>) -> Self {
        Self {
            version: Some(version),
            source: wasm,
        }
    }

    /// A module that already carries its version and length.
    pub fn embedded(source: Vec<u8>) -> Self {
        Self {
            version: None,
            source,
        }
    }

    /// Length of the wasm, not counting an embedded header.
    pub fn wasm_length(&self) -> usize {
        match self.version {
            Some(_) => self.source.len(),
            None => self.source.len().saturating_sub(EMBEDDED_MODULE_HEADER_SIZE),
        }
    }
}

impl ByteFormat for DeployModule {
    type Error = TxError;

    fn serialized_length(&self) -> usize {
        match self.version {
            Some(_) => 8 + self.source.len(),
            None => self.source.len(),
        }
    }

    fn read_from<R>(reader: &mut R, _limit: usize) -> TxResult<Self>
    where
        R: Read,
        Self: std::marker::Sized,
    {
        let version = read_u32(reader, Endian::Big)?;
        let wasm = read_prefixed(reader, WASM_PREFIX)?;
        Ok(Self::versioned(version, wasm))
    }

    fn write_to<W>(&self, writer: &mut W) -> TxResult<usize>
    where
        W: Write,
    {
        match self.version {
            Some(version) => {
                let len = write_u32(writer, version, Endian::Big)?;
                Ok(len + write_prefixed(writer, WASM_PREFIX, &self.source)?)
            }
            None => {
                writer.write_all(&self.source)?;
                Ok(self.source.len())
            }
        }
    }
}

impl TransactionPayload for DeployModule {
    const TRANSACTION_TYPE: AccountTransactionType = AccountTransactionType::DeployModule;

    /// One energy per started ten bytes of wasm, counting one extra byte.
    fn base_energy_cost(&self) -> TxResult<Energy> {
        let length = self.wasm_length() as u64 + 1;
        Ok(Energy((length + 9) / 10))
    }
}

/// Create a contract instance from a deployed module.
#[derive(Serialize, Deserialize, Clone, Debug, Eq, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InitContract {
    /// CCD sent to the new instance
    pub amount: Amount,
    /// Module holding the contract
    pub module_ref: ModuleReference,
    /// Contract name, without the `init_` prefix
    pub init_name: String,
    /// Init parameter
    pub param: Parameter,
    /// Energy the init function may use. Not on the wire; zero after decoding.
    pub max_contract_execution_energy: Energy,
}

impl InitContract {
    /// The name as written on the wire.
    pub fn full_init_name(&self) -> String {
        format!("{}{}", INIT_NAME_PREFIX, self.init_name)
    }
}

impl ByteFormat for InitContract {
    type Error = TxError;

    fn serialized_length(&self) -> usize {
        8 + 32 + 2 + INIT_NAME_PREFIX.len() + self.init_name.len() + self.param.serialized_length()
    }

    fn read_from<R>(reader: &mut R, _limit: usize) -> TxResult<Self>
    where
        R: Read,
        Self: std::marker::Sized,
    {
        let amount = Amount::read_from(reader, 0)?;
        let module_ref = ModuleReference::read_from(reader, 0)?;
        let full_name = read_prefixed_string(reader, NAME_PREFIX)?;
        let init_name = full_name
            .strip_prefix(INIT_NAME_PREFIX)
            .ok_or_else(|| TxError::InvalidInitName(full_name.clone()))?
            .to_owned();
        Ok(Self {
            amount,
            module_ref,
            init_name,
            param: Parameter::read_from(reader, 0)?,
            max_contract_execution_energy: Energy(0),
        })
    }

    fn write_to<W>(&self, writer: &mut W) -> TxResult<usize>
    where
        W: Write,
    {
        let mut len = self.amount.write_to(writer)?;
        len += self.module_ref.write_to(writer)?;
        len += write_prefixed(writer, NAME_PREFIX, self.full_init_name().as_bytes())?;
        len += self.param.write_to(writer)?;
        Ok(len)
    }
}

impl TransactionPayload for InitContract {
    const TRANSACTION_TYPE: AccountTransactionType = AccountTransactionType::InitContract;

    fn base_energy_cost(&self) -> TxResult<Energy> {
        Ok(self.max_contract_execution_energy)
    }
}

/// Invoke a receive function of a contract instance.
#[derive(Serialize, Deserialize, Clone, Debug, Eq, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UpdateContract {
    /// CCD sent to the instance
    pub amount: Amount,
    /// The instance
    pub address: ContractAddress,
    /// Receive name, `<contract>.<entrypoint>`
    pub receive_name: String,
    /// Parameter
    pub message: Parameter,
    /// Energy the call may use. Not on the wire; zero after decoding.
    pub max_contract_execution_energy: Energy,
}

impl ByteFormat for UpdateContract {
    type Error = TxError;

    fn serialized_length(&self) -> usize {
        8 + 16 + 2 + self.receive_name.len() + self.message.serialized_length()
    }

    fn read_from<R>(reader: &mut R, _limit: usize) -> TxResult<Self>
    where
        R: Read,
        Self: std::marker::Sized,
    {
        Ok(Self {
            amount: Amount::read_from(reader, 0)?,
            address: ContractAddress::read_from(reader, 0)?,
            receive_name: read_prefixed_string(reader, NAME_PREFIX)?,
            message: Parameter::read_from(reader, 0)?,
            max_contract_execution_energy: Energy(0),
        })
    }

    fn write_to<W>(&self, writer: &mut W) -> TxResult<usize>
    where
        W: Write,
    {
        let mut len = self.amount.write_to(writer)?;
        len += self.address.write_to(writer)?;
        len += write_prefixed(writer, NAME_PREFIX, self.receive_name.as_bytes())?;
        len += self.message.write_to(writer)?;
        Ok(len)
    }
}

impl TransactionPayload for UpdateContract {
    const TRANSACTION_TYPE: AccountTransactionType = AccountTransactionType::Update;

    fn base_energy_cost(&self) -> TxResult<Energy> {
        Ok(self.max_contract_execution_energy)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn it_prices_module_deployment() {
        let module = DeployModule::versioned(1, vec![0u8; 999]);
        assert_eq!(module.base_energy_cost().unwrap(), Energy(100));
        assert_eq!(DeployModule::versioned(1, vec![]).base_energy_cost().unwrap(), Energy(1));
        assert_eq!(
            DeployModule::versioned(1, vec![0u8; 1000]).base_energy_cost().unwrap(),
            Energy(101)
        );
        // the embedded header is not charged
        let embedded = DeployModule::embedded(vec![0u8; 1007]);
        assert_eq!(embedded.base_energy_cost().unwrap(), Energy(100));
    }

    #[test]
    fn it_serializes_module_sources() {
        let module = DeployModule::versioned(1, vec![0xaa, 0xbb]);
        let hex = module.serialize_hex().unwrap();
        assert_eq!(hex, "0000000100000002aabb");

        // an embedded source is written verbatim and decodes as versioned
        let embedded = DeployModule::embedded(hex::decode(&hex).unwrap());
        assert_eq!(embedded.serialize_hex().unwrap(), hex);
        assert_eq!(DeployModule::deserialize_hex(&hex).unwrap(), module);
    }

    #[test]
    fn it_prefixes_init_names() {
        let init = InitContract {
            amount: Amount(0),
            module_ref: ModuleReference([0x11; 32]),
            init_name: "token".to_owned(),
            param: Parameter(vec![0x01]),
            max_contract_execution_energy: Energy(30_000),
        };
        let bytes = init.to_bytes().unwrap();
        assert_eq!(bytes.len(), init.serialized_length());
        assert_eq!(
            hex::encode(&bytes[40..]),
            format!("000a{}000101", hex::encode("init_token"))
        );
        assert_eq!(init.base_energy_cost().unwrap(), Energy(30_000));

        let decoded = InitContract::from_bytes(&bytes).unwrap();
        assert_eq!(decoded.init_name, "token");
        assert_eq!(decoded.max_contract_execution_energy, Energy(0));
    }

    #[test]
    fn it_rejects_unprefixed_init_names() {
        let mut bytes = vec![0u8; 40];
        bytes.extend([0x00u8, 0x05]);
        bytes.extend(b"token");
        bytes.extend([0x00u8, 0x00]);
        assert!(matches!(
            InitContract::from_bytes(&bytes),
            Err(TxError::InvalidInitName(name)) if name == "token"
        ));
    }

    #[test]
    fn it_serializes_contract_updates() {
        let update = UpdateContract {
            amount: Amount(1),
            address: ContractAddress::new(7, 0),
            receive_name: "token.transfer".to_owned(),
            message: Parameter(vec![]),
            max_contract_execution_energy: Energy(5_000),
        };
        let bytes = update.to_bytes().unwrap();
        assert_eq!(bytes.len(), update.serialized_length());
        assert_eq!(
            hex::encode(&bytes[..24]),
            "000000000000000100000000000000070000000000000000"
        );
        let decoded = UpdateContract::from_bytes(&bytes).unwrap();
        assert_eq!(decoded.receive_name, "token.transfer");
        assert_eq!(decoded.address, update.address);
    }

    #[test]
    fn it_rejects_oversized_parameters() {
        let update = UpdateContract {
            amount: Amount(0),
            address: ContractAddress::new(0, 0),
            receive_name: "a.b".to_owned(),
            message: Parameter(vec![0u8; 65_536]),
            max_contract_execution_energy: Energy(0),
        };
        let err = update.to_bytes().unwrap_err();
        assert_eq!(err.kind(), ccd_core::ErrorKind::RangeViolation);
    }
}
