use crate::address::Address;
use crate::constants::secpk1n;
use crate::context::SECP256K1;
use crate::error::Error;
use crate::signature::Signature;
use crate::utils::{bytes_to_hex_str, hex_str_to_bytes, keccak256};
use log::trace;
use num256::Uint256;
use secp256k1::ecdsa::RecoveryId;
use secp256k1::{Message, PublicKey, SecretKey};
use serde::Deserialize;
use serde::Deserializer;
use serde::Serialize;
use serde::Serializer;
use std::fmt::{self, Debug, Display};
use std::hash::{Hash, Hasher};
use std::str::FromStr;

/// The standard Ethereum message signing prefix (EIP-191 version 0x45), it is
/// prepended to every signed message so that a signed message can never be a
/// valid transaction.
pub const ETHEREUM_SALT: &str = "\x19Ethereum Signed Message:\n";

/// Hashes a message the way `personal_sign` and `eth_sign` do before
/// signing it: `keccak256("\x19Ethereum Signed Message:\n" + len(message) + message)`
pub fn hash_message(message: &[u8]) -> [u8; 32] {
    let mut data = Vec::with_capacity(ETHEREUM_SALT.len() + 20 + message.len());
    data.extend_from_slice(ETHEREUM_SALT.as_bytes());
    data.extend_from_slice(message.len().to_string().as_bytes());
    data.extend_from_slice(message);
    keccak256(&data)
}

/// Representation of an Ethereum private key.
///
/// A PrivateKey can only be constructed from a valid secp256k1 scalar, that is
/// a 32 byte big endian number in the range `[1, n - 1]`. The matching address
/// is derived once at construction.
///
/// With PrivateKey you are able to sign hashes, messages and transactions.
#[derive(Clone, Copy)]
pub struct PrivateKey {
    secret: SecretKey,
    address: Address,
}

impl PrivateKey {
    /// Convert a given array of bytes into a valid private key.
    ///
    /// Fails with `ZeroPrivKey` for the zero scalar and `PrivKeyOutOfRange`
    /// when the value is not smaller than the curve order.
    pub fn from_bytes(bytes: [u8; 32]) -> Result<PrivateKey, Error> {
        if bytes == [0u8; 32] {
            return Err(Error::ZeroPrivKey);
        }
        if Uint256::from_be_bytes(&bytes) >= secpk1n() {
            return Err(Error::PrivKeyOutOfRange);
        }
        let secret = SecretKey::from_slice(&bytes).map_err(Error::DecodePrivKey)?;
        let public_key = SECP256K1.with(|object| {
            let secp256k1 = object.borrow();
            PublicKey::from_secret_key(&secp256k1, &secret).serialize_uncompressed()
        });
        Ok(PrivateKey {
            secret,
            address: Address::from_public_key(&public_key),
        })
    }

    /// Generates a new key from the thread local cryptographically secure RNG
    pub fn random() -> PrivateKey {
        loop {
            // the chance of drawing an invalid scalar is about 2^-128
            let bytes: [u8; 32] = rand::random();
            if let Ok(key) = PrivateKey::from_bytes(bytes) {
                return key;
            }
        }
    }

    /// Get bytes back from a PrivateKey
    pub fn to_bytes(&self) -> [u8; 32] {
        self.secret.secret_bytes()
    }

    /// Get the address for a given private key.
    ///
    /// This is well explained in the Ethereum Yellow Paper Appendix F.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use ethtx::PrivateKey;
    /// let private_key : PrivateKey = "0102030405060708090a0b0c0d0e0f101112131415161718191a1b1c1d1e1f1e".parse().unwrap();
    /// let address = private_key.to_address();
    /// ```
    pub fn to_address(&self) -> Address {
        self.address
    }

    /// The uncompressed SEC1 public key, `0x04 || x || y`
    pub fn to_public_key(&self) -> [u8; 65] {
        SECP256K1.with(|object| {
            let secp256k1 = object.borrow();
            PublicKey::from_secret_key(&secp256k1, &self.secret).serialize_uncompressed()
        })
    }

    /// Signs a 32 byte hash.
    ///
    /// The nonce is derived deterministically (RFC 6979) so signing the same
    /// hash twice yields the same signature. The result always has a low `s`
    /// value and `v` set to `27 + recovery_id`.
    ///
    /// You are advised, though, to use [sign_ethereum_msg](#method.sign_ethereum_msg)
    /// for arbitrary messages, or `UnsignedTransaction::sign` for transactions.
    ///
    /// # Example
    ///
    /// ```rust
    /// # use ethtx::PrivateKey;
    /// # use ethtx::utils::keccak256;
    /// let private_key : PrivateKey = "0102030405060708090a0b0c0d0e0f101112131415161718191a1b1c1d1e1f1e".parse().unwrap();
    /// let hash = keccak256("Hello, world!".as_bytes());
    /// let signature = private_key.sign_hash(&hash);
    /// ```
    pub fn sign_hash(&self, hash: &[u8; 32]) -> Signature {
        let msg = Message::from_digest(*hash);
        let (recovery_id, compact) = SECP256K1.with(|object| {
            let context = object.borrow();
            // Serialize the signature into the "compact" form which means
            // it will be exactly 64 bytes, and the "excess" information of
            // recovery id will be given to us.
            context
                .sign_ecdsa_recoverable(&msg, &self.secret)
                .serialize_compact()
        });
        let recovery_id: u64 = match recovery_id {
            RecoveryId::Zero => 0,
            RecoveryId::One => 1,
            RecoveryId::Two => 2,
            RecoveryId::Three => 3,
        };
        let r = Uint256::from_be_bytes(&compact[0..32]);
        let s = Uint256::from_be_bytes(&compact[32..64]);
        trace!("signed hash 0x{}", bytes_to_hex_str(hash));
        Signature::new(27 + recovery_id, r, s).normalized()
    }

    /// Signs the Keccak256 hash of `data` without any prefix.
    ///
    /// This method is provided on the assumption you know what you are doing, it does not prevent signed messages
    /// from being possibly valid transactions. Use with Caution!
    pub fn sign_insecure_msg(&self, data: &[u8]) -> Signature {
        self.sign_hash(&keccak256(data))
    }

    /// Signs a message with the standard Ethereum message prefix, see
    /// [hash_message]. The output matches `personal_sign`.
    ///
    /// # Example
    ///
    /// ```rust
    /// # use ethtx::PrivateKey;
    /// let private_key : PrivateKey = "0102030405060708090a0b0c0d0e0f101112131415161718191a1b1c1d1e1f1e".parse().unwrap();
    /// let signature = private_key.sign_ethereum_msg("Hello, world!".as_bytes());
    /// assert_eq!(signature.recover_ethereum_msg("Hello, world!".as_bytes()).unwrap(), private_key.to_address());
    /// ```
    pub fn sign_ethereum_msg(&self, message: &[u8]) -> Signature {
        self.sign_hash(&hash_message(message))
    }
}

impl PartialEq for PrivateKey {
    fn eq(&self, other: &Self) -> bool {
        self.secret == other.secret
    }
}

impl Eq for PrivateKey {}

impl Hash for PrivateKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.to_bytes().hash(state)
    }
}

impl FromStr for PrivateKey {
    type Err = Error;

    /// Parse a textual representation of a private key back into PrivateKey type.
    ///
    /// It has to be a string that represents 64 characters that are hexadecimal
    /// representation of 32 bytes. Optionally this string can be prefixed with `0x`
    /// at the start.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = match s.strip_prefix("0x") {
            Some(s) => s,
            None => s,
        };
        if s.len() != 64 {
            return Err(Error::InvalidPrivKeyLength {
                got: s.len(),
                expected: 64,
            });
        }
        let bytes = hex_str_to_bytes(s)?;
        let mut res = [0x0u8; 32];
        res.copy_from_slice(&bytes);
        PrivateKey::from_bytes(res)
    }
}

impl TryFrom<[u8; 32]> for PrivateKey {
    type Error = Error;
    fn try_from(val: [u8; 32]) -> Result<PrivateKey, Error> {
        PrivateKey::from_bytes(val)
    }
}

impl Display for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "0x{}", bytes_to_hex_str(&self.to_bytes()))
    }
}

impl Debug for PrivateKey {
    // only the address, keys should not end up in logs by accident
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "PrivateKey({})", self.address)
    }
}

impl Serialize for PrivateKey {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for PrivateKey {
    fn deserialize<D>(deserializer: D) -> Result<PrivateKey, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

impl fmt::LowerHex for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if f.alternate() {
            write!(f, "0x{}", bytes_to_hex_str(&self.to_bytes()))
        } else {
            write!(f, "{}", bytes_to_hex_str(&self.to_bytes()))
        }
    }
}

impl fmt::UpperHex for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if f.alternate() {
            write!(f, "0x{}", bytes_to_hex_str(&self.to_bytes()).to_uppercase())
        } else {
            write!(f, "{}", bytes_to_hex_str(&self.to_bytes()).to_uppercase())
        }
    }
}

#[test]
#[should_panic]
fn too_short() {
    PrivateKey::from_str("abcdef").unwrap();
}

#[test]
#[should_panic]
fn invalid_data() {
    let key = "\u{012345}c85ef7d79691fe79573b1a7064c19c1a9819ebdbd1faaab1a8ec92344438";
    assert_eq!(key.len(), 64);
    PrivateKey::from_str(key).unwrap();
}

#[test]
fn signed_hex_is_not_a_key() {
    let key = format!("+{}", "1".repeat(63));
    assert!(matches!(
        PrivateKey::from_str(&key),
        Err(Error::InvalidHex(_))
    ));
    let sig = format!("+{}", "1".repeat(129));
    assert!(matches!(
        sig.parse::<Signature>(),
        Err(Error::InvalidHex(_))
    ));
}

#[test]
fn zero_private_key() {
    // A key full of zeros is an invalid private key.
    let res = PrivateKey::from_bytes([0u8; 32]);
    assert!(matches!(res, Err(Error::ZeroPrivKey)));
}

#[test]
fn out_of_range_private_key() {
    let order: [u8; 32] = secpk1n().to_be_bytes();
    assert!(matches!(
        PrivateKey::from_bytes(order),
        Err(Error::PrivKeyOutOfRange)
    ));
    assert!(matches!(
        PrivateKey::from_bytes([0xff; 32]),
        Err(Error::PrivKeyOutOfRange)
    ));
    // n - 1 is the largest valid key
    let mut largest = order;
    largest[31] -= 1;
    assert!(PrivateKey::from_bytes(largest).is_ok());
}

#[test]
fn parse_address_1() {
    // https://github.com/ethereum/tests/blob/b44cea1cccf1e4b63a05d1ca9f70f2063f28da6d/BasicTests/txtest.json
    let key: PrivateKey = "c85ef7d79691fe79573b1a7064c19c1a9819ebdbd1faaab1a8ec92344438aaf4"
        .parse()
        .unwrap();
    assert_eq!(
        key.to_bytes(),
        [
            0xc8, 0x5e, 0xf7, 0xd7, 0x96, 0x91, 0xfe, 0x79, 0x57, 0x3b, 0x1a, 0x70, 0x64, 0xc1,
            0x9c, 0x1a, 0x98, 0x19, 0xeb, 0xdb, 0xd1, 0xfa, 0xaa, 0xb1, 0xa8, 0xec, 0x92, 0x34,
            0x44, 0x38, 0xaa, 0xf4
        ]
    );

    // geth account import <(echo c85ef7d79691fe79573b1a7064c19c1a9819ebdbd1faaab1a8ec92344438aaf4)
    assert_eq!(
        bytes_to_hex_str(key.to_address().as_bytes()),
        "cd2a3d9f938e13cd947ec05abc7fe734df8dd826"
    );
}

#[test]
fn parse_address_2() {
    // https://github.com/ethereum/tests/blob/b44cea1cccf1e4b63a05d1ca9f70f2063f28da6d/BasicTests/txtest.json
    let key: PrivateKey = "c87f65ff3f271bf5dc8643484f66b200109caffe4bf98c4cb393dc35740b28c0"
        .parse()
        .unwrap();

    // geth account import <(echo c87f65ff3f271bf5dc8643484f66b200109caffe4bf98c4cb393dc35740b28c0)
    assert_eq!(
        bytes_to_hex_str(key.to_address().as_bytes()),
        "13978aee95f38490e9769c39b2773ed763d9cd5f"
    );
    assert_eq!(Address::from_public_key(&key.to_public_key()), key.to_address());
}

#[test]
fn to_upper_hex() {
    let key: PrivateKey = "c87f65ff3f271bf5dc8643484f66b200109caffe4bf98c4cb393dc35740b28c0"
        .parse()
        .unwrap();
    assert_eq!(
        format!("{key:X}"),
        "C87F65FF3F271BF5DC8643484F66B200109CAFFE4BF98C4CB393DC35740B28C0"
    );
    assert_eq!(
        format!("{key:#x}"),
        "0xc87f65ff3f271bf5dc8643484f66b200109caffe4bf98c4cb393dc35740b28c0"
    );
}

#[test]
fn debug_hides_key() {
    let key: PrivateKey = "c87f65ff3f271bf5dc8643484f66b200109caffe4bf98c4cb393dc35740b28c0"
        .parse()
        .unwrap();
    let debug = format!("{key:?}");
    assert!(!debug.contains("c87f65ff"));
    assert!(debug.contains("0x13978aee95f38490e9769C39B2773Ed763d9cd5F"));
}

#[test]
fn sign_message() {
    // https://github.com/ethereum/tests/blob/b44cea1cccf1e4b63a05d1ca9f70f2063f28da6d/BasicTests/txtest.json
    let key: PrivateKey = "c87f65ff3f271bf5dc8643484f66b200109caffe4bf98c4cb393dc35740b28c0"
        .parse()
        .unwrap();

    let hash = keccak256(b"Hello, world!");

    let sig = key.sign_hash(&hash);
    assert_eq!(sig.recovery_id().unwrap(), 0);
    assert_eq!(sig.v, 27);
    assert_eq!(
        sig.r,
        "60846573560682549108588594828362990367411621835316234394067988873897934296519"
            .parse()
            .unwrap()
    );
    assert_eq!(
        sig.s,
        "38796436849307511461301231459196686786518980571289303247679628937607287361713"
            .parse()
            .unwrap()
    );

    let sig_2 = key.sign_insecure_msg(b"Hello, world!");
    assert_eq!(sig, sig_2);

    // Recover address using just a signature
    let recovered = sig
        .recover(&hash)
        .expect("Unable to recover address from a signature");
    assert_eq!(recovered, key.to_address());
}

#[test]
fn hash_message_vector() {
    // web3.eth.accounts.hashMessage("Hello World")
    assert_eq!(
        bytes_to_hex_str(&hash_message(b"Hello World")),
        "a1de988600a42c4b4ab089b619297c17d53cffae5d5120d82d8a92d0bb3b78f2"
    );
}

#[test]
fn sign_ethereum_message() {
    // web3.eth.accounts.sign('Some data', '0x4c0883a69102937d6231471b5dbb6204fe5129617082792ae468d01a3f362318')
    let key: PrivateKey = "0x4c0883a69102937d6231471b5dbb6204fe5129617082792ae468d01a3f362318"
        .parse()
        .unwrap();
    let sig = key.sign_ethereum_msg(b"Some data");
    assert_eq!(
        sig.to_string(),
        "0xb91467e570a6466aa9e9876cbcd013baba02900b8979d43fe208a4a4f339f5fd6007e74cd82e037b800186422fc2da167c747ef045e5d18a5f5d4300f8e1a0291c"
    );
    assert_eq!(
        sig.recover_ethereum_msg(b"Some data").unwrap(),
        key.to_address()
    );
    assert_ne!(
        sig.recover_ethereum_msg(b"Other data").unwrap(),
        key.to_address()
    );
}

#[test]
fn random_keys_differ() {
    let a = PrivateKey::random();
    let b = PrivateKey::random();
    assert_ne!(a, b);
    assert_ne!(a.to_address(), b.to_address());
}

#[test]
fn serialize_to_json() {
    let unsafe_key: PrivateKey = "0101010101010101010101010101010101010101010101010101010101010101"
        .parse()
        .unwrap();
    let j = serde_json::to_string(&unsafe_key).unwrap();
    assert_eq!(
        j,
        r#""0x0101010101010101010101010101010101010101010101010101010101010101""#
    );
    let recovered_key: PrivateKey = serde_json::from_str(&j).unwrap();
    assert_eq!(unsafe_key, recovered_key);
    assert!(serde_json::from_str::<PrivateKey>(r#""0x0101""#).is_err());
}
