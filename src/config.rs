//! Caller supplied defaults for building transactions.
//!
//! Nothing here is read from disk or the environment, a `TxDefaults` is a
//! plain value that can be deserialized from whatever configuration format
//! the caller uses.
use crate::address::Address;
use crate::constants::GTXCOST;
use crate::transaction::UnsignedTransaction;
use num256::Uint256;
use num_traits::Num;
use serde::Deserialize;
use serde::Deserializer;
use serde::Serializer;
use std::str::FromStr;

/// Serializes a Uint256 as a decimal string
pub fn uint256_serialize<S>(x: &Uint256, s: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    s.serialize_str(&x.to_string())
}

/// Deserializes a Uint256 from a decimal or `0x` prefixed hex string
pub fn uint256_deserialize<'de, D>(d: D) -> Result<Uint256, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(d)?;
    let res = match s.strip_prefix("0x") {
        Some(hex) => Uint256::from_str_radix(hex, 16).ok(),
        None => Uint256::from_str(&s).ok(),
    };
    res.ok_or_else(|| serde::de::Error::custom(format!("invalid integer {s}")))
}

/// Network and gas settings shared by the transactions a caller builds
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TxDefaults {
    /// EIP-155 chain id, zero signs without replay protection
    pub chain_id: u64,
    #[serde(
        serialize_with = "uint256_serialize",
        deserialize_with = "uint256_deserialize"
    )]
    pub gas_price: Uint256,
    #[serde(
        serialize_with = "uint256_serialize",
        deserialize_with = "uint256_deserialize"
    )]
    pub gas_limit: Uint256,
}

impl Default for TxDefaults {
    /// Mainnet, 20 gwei and enough gas for a plain transfer
    fn default() -> Self {
        TxDefaults {
            chain_id: 1,
            gas_price: 20_000_000_000u64.into(),
            gas_limit: GTXCOST.into(),
        }
    }
}

impl TxDefaults {
    /// An Ether transfer without data
    pub fn transfer(&self, nonce: u64, to: Address, value: Uint256) -> UnsignedTransaction {
        self.build(nonce, Some(to), value, Vec::new())
    }

    /// A contract call carrying ABI encoded `data`
    pub fn call(&self, nonce: u64, to: Address, data: Vec<u8>) -> UnsignedTransaction {
        self.build(nonce, Some(to), 0u8.into(), data)
    }

    /// A contract creation transaction, `bytecode` is the init code
    pub fn deploy(&self, nonce: u64, bytecode: Vec<u8>) -> UnsignedTransaction {
        self.build(nonce, None, 0u8.into(), bytecode)
    }

    fn build(
        &self,
        nonce: u64,
        to: Option<Address>,
        value: Uint256,
        data: Vec<u8>,
    ) -> UnsignedTransaction {
        UnsignedTransaction {
            nonce: nonce.into(),
            gas_price: self.gas_price,
            gas_limit: self.gas_limit,
            to,
            value,
            data,
            chain_id: self.chain_id,
        }
    }
}
