//! # Introduction
//! ethtx is a low-level library for legacy Ethereum transactions written in pure Rust.
//!
//! ## Features
//! * Canonical RLP encoding and strict decoding of transactions
//! * EIP-155 replay protected and unprotected signing with low-s signatures
//! * Sender recovery from signed transactions and signed messages
//! * Public/private key handling and EIP-55 addresses
//! * ABI encoding for common data types (see `abi::AbiToken` variants)
//! * Wei denomination helpers
//!
//! ## Getting started
//! Here's an example lifetime of an Alice-to-Bob Ethereum transaction made with ethtx:
//! ```rust
//! use ethtx::{PrivateKey, Transaction, UnsignedTransaction};
//!
//! let alices_key = PrivateKey::random();
//! let bobs_key = PrivateKey::random();
//!
//! // Create a new transaction
//! let tx = UnsignedTransaction {
//!     nonce: 0u32.into(),
//!     gas_price: 1_000_000_000u32.into(),
//!     gas_limit: 21_000u32.into(),
//!     to: Some(bobs_key.to_address()),
//!     value: 100u32.into(),
//!     data: Vec::new(),
//!     chain_id: 1,
//! };
//!
//! let tx_signed = tx.sign(&alices_key).unwrap();
//!
//! // You can always derive the sender from a signed transaction
//! assert_eq!(tx_signed.recover_sender().unwrap(), alices_key.to_address());
//!
//! // The raw bytes are ready for eth_sendRawTransaction, and decode back
//! let raw = tx_signed.raw_bytes();
//! assert_eq!(Transaction::decode(raw).unwrap(), Transaction::Signed(tx_signed.clone()));
//! ```

#![warn(clippy::all)]
#![allow(clippy::pedantic)]

extern crate num_traits;
extern crate secp256k1;
extern crate serde;
extern crate sha3;
#[macro_use]
extern crate serde_derive;
extern crate num256;

pub mod abi;
pub mod address;
pub mod config;
pub mod constants;
mod context;
pub mod error;
pub mod private_key;
pub mod rlp;
pub mod signature;
pub mod transaction;
pub mod units;
pub mod utils;

pub use address::Address;
pub use config::TxDefaults;
pub use error::{Error, ErrorKind};
pub use num256::Uint256;
pub use private_key::PrivateKey;
pub use signature::Signature;
pub use transaction::{SignedTransaction, Transaction, UnsignedTransaction};
