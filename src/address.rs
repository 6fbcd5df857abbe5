use crate::error::Error;
use crate::utils::{bytes_to_hex_str, hex_str_to_bytes, keccak256};
use serde::Deserialize;
use serde::Deserializer;
use serde::Serialize;
use serde::Serializer;
use std::fmt;
use std::str::FromStr;

/// Representation of an Ethereum address.
///
/// Address is usually derived from a `PrivateKey`, or converted from its
/// textual representation.
#[derive(PartialEq, Eq, PartialOrd, Ord, Hash, Clone, Copy, Default)]
pub struct Address([u8; 20]);

impl Address {
    /// Get raw bytes of the address.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Creates an address from a slice that has to be exactly 20 bytes long
    pub fn from_slice(data: &[u8]) -> Result<Address, Error> {
        if data.len() != 20 {
            return Err(Error::InvalidAddressLength {
                got: data.len(),
                expected: 20,
            });
        }
        let mut result = [0u8; 20];
        result.copy_from_slice(data);
        Ok(Address(result))
    }

    /// Derives the address of an uncompressed public key, the last 20 bytes
    /// of the Keccak256 hash of the key without its 0x04 prefix byte.
    pub fn from_public_key(public_key: &[u8; 65]) -> Address {
        let hash = keccak256(&public_key[1..]);
        let mut result = [0u8; 20];
        result.copy_from_slice(&hash[12..]);
        Address(result)
    }

    /// Produces the EIP-55 mixed case checksum representation, `0x` prefixed.
    pub fn to_checksum_string(&self) -> String {
        let lower = bytes_to_hex_str(&self.0);
        let hash = keccak256(lower.as_bytes());
        let mut out = String::with_capacity(42);
        out.push_str("0x");
        for (i, c) in lower.chars().enumerate() {
            // every hex digit of the address is matched with a nibble of the hash
            let nibble = if i % 2 == 0 {
                hash[i / 2] >> 4
            } else {
                hash[i / 2] & 0x0f
            };
            if nibble >= 8 {
                out.push(c.to_ascii_uppercase());
            } else {
                out.push(c);
            }
        }
        out
    }

    /// Checks if a string is a valid address, see the `FromStr` impl for
    /// the accepted formats.
    pub fn is_valid_str(s: &str) -> bool {
        s.parse::<Address>().is_ok()
    }
}

impl From<[u8; 20]> for Address {
    fn from(val: [u8; 20]) -> Address {
        Address(val)
    }
}

impl From<Address> for [u8; 20] {
    fn from(val: Address) -> [u8; 20] {
        val.0
    }
}

impl FromStr for Address {
    type Err = Error;

    /// Parses a string into a valid Ethereum address.
    ///
    /// # Supported formats
    ///
    /// * `0x` prefixed address
    /// * Raw bytes of an address represented by a bytes as an hexadecimal.
    ///
    /// All lowercase and all uppercase strings are accepted as is, a mixed
    /// case string has to carry a valid EIP-55 checksum.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use std::str::FromStr;
    /// use ethtx::Address;
    /// // Method 1
    /// Address::from_str("0x0102030405060708090a0b0c0d0e0f1011121314").unwrap();
    /// // Method 1 (without 0x prefix)
    /// Address::from_str("0102030405060708090a0b0c0d0e0f1011121314").unwrap();
    /// // Method 2
    /// let _address : Address = "14131211100f0e0d0c0b0a090807060504030201".parse().unwrap();
    /// ```
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
            Some(s) => s,
            None => s,
        };
        if digits.len() != 40 {
            return Err(Error::InvalidAddressLength {
                got: digits.len(),
                expected: 40,
            });
        }
        let address = Address::from_slice(&hex_str_to_bytes(digits)?)?;

        let has_lower = digits.chars().any(|c| c.is_ascii_lowercase());
        let has_upper = digits.chars().any(|c| c.is_ascii_uppercase());
        if has_lower && has_upper && address.to_checksum_string()[2..] != *digits {
            return Err(Error::InvalidEip55);
        }
        Ok(address)
    }
}

impl fmt::Display for Address {
    /// Creates the EIP-55 checksummed textual representation of the `Address`.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.to_checksum_string())
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.to_checksum_string())
    }
}

impl fmt::LowerHex for Address {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if f.alternate() {
            write!(f, "0x{}", bytes_to_hex_str(&self.0))
        } else {
            write!(f, "{}", bytes_to_hex_str(&self.0))
        }
    }
}

impl fmt::UpperHex for Address {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if f.alternate() {
            write!(f, "0x{}", bytes_to_hex_str(&self.0).to_uppercase())
        } else {
            write!(f, "{}", bytes_to_hex_str(&self.0).to_uppercase())
        }
    }
}

impl Serialize for Address {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_checksum_string())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D>(deserializer: D) -> Result<Address, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[test]
#[should_panic]
fn decode_invalid_length() {
    "123".parse::<Address>().unwrap();
}

#[test]
#[should_panic]
fn decode_invalid_character() {
    "\u{012345}123456789012345678901234567890123456"
        .parse::<Address>()
        .unwrap();
}

#[test]
fn decode_rejects_sign() {
    let body = format!("+{}", "1".repeat(39));
    assert!(matches!(
        body.parse::<Address>(),
        Err(Error::InvalidHex(_))
    ));
    assert!(format!("0x{body}").parse::<Address>().is_err());
}

#[test]
fn decode() {
    let address: Address = "1234567890123456789012345678901234567890"
        .parse::<Address>()
        .unwrap();

    assert_eq!(
        address,
        Address::from([
            0x12, 0x34, 0x56, 0x78, 0x90, 0x12, 0x34, 0x56, 0x78, 0x90, 0x12, 0x34, 0x56, 0x78,
            0x90, 0x12, 0x34, 0x56, 0x78, 0x90
        ])
    );
}

#[test]
fn address_less_than_20_filler() {
    // Data found in AddressLessThan20Filler.json
    assert!("0b9331677e6ebf".parse::<Address>().is_err());
}

#[test]
fn handle_prefixed() {
    let address: Address = "0x000000000000000000000000000b9331677e6ebf"
        .parse()
        .unwrap();
    assert_eq!(
        address,
        Address::from([
            0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0x0b, 0x93, 0x31, 0x67, 0x7e, 0x6e, 0xbf
        ])
    );
}

#[test]
fn checksum_encoding() {
    // test vectors from EIP-55
    let vectors = [
        "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed",
        "0xfB6916095ca1df60bB79Ce92cE3Ea74c37c5d359",
        "0xdbF03B407c01E7cD3CBea99509d93f8DDDC8C6FB",
        "0xD1220A0cf47c7B9Be7A2E6BA89F429762e7b9aDb",
    ];
    for vector in vectors {
        let address: Address = vector.to_lowercase().parse().unwrap();
        assert_eq!(address.to_checksum_string(), vector);
        assert_eq!(address.to_string(), vector);
        assert_eq!(vector.parse::<Address>().unwrap(), address);
    }
}

#[test]
fn checksum_mismatch() {
    // web3.utils.toChecksumAddress('0XC1912FEE45D61C87CC5EA59DAE31190FFFFF232D')
    let upper: Address = "0XC1912FEE45D61C87CC5EA59DAE31190FFFFF232D".parse().unwrap();
    assert_eq!(
        upper.to_string(),
        "0xc1912fEE45d61C87Cc5EA59DaE31190FFFFf232d"
    );
    assert!(matches!(
        "0xc1912fEE45d61C87Cc5EA59DaE31190FFFFf232D".parse::<Address>(),
        Err(Error::InvalidEip55)
    ));
    assert!(Address::is_valid_str(
        "0xc1912fee45d61c87cc5ea59dae31190fffff232d"
    ));
    assert!(!Address::is_valid_str("0xc1912"));
}

#[test]
fn hashed() {
    // One of the use cases for Address could be a key in a HashMap to store some
    // additional values per address.
    use std::collections::HashMap;
    let a = Address::from_str("0x000000000000000000000000000b9331677e6ebf").unwrap();
    let b = Address::from_str("0x00000000000000000000000000000000deadbeef").unwrap();
    let mut map = HashMap::new();
    map.insert(a, "Foo");
    map.insert(b, "Bar");

    assert_eq!(map.get(&a).unwrap(), &"Foo");
    assert_eq!(map.get(&b).unwrap(), &"Bar");
}

#[test]
fn ordered() {
    let a = Address::from_str("0x000000000000000000000000000000000000000a").unwrap();
    let b = Address::from_str("0x000000000000000000000000000000000000000b").unwrap();
    let c = Address::from_str("0x000000000000000000000000000000000000000c").unwrap();
    assert!(c > b);
    assert!(b > a);
    assert!(a < c);
    assert_ne!(a, b);
}

#[test]
fn to_hex() {
    let address: Address = "1234567890123456789abcdef678901234567890"
        .parse::<Address>()
        .unwrap();

    assert_eq!(
        format!("{address:x}"),
        "1234567890123456789abcdef678901234567890",
    );
    assert_eq!(
        format!("{address:#x}"),
        "0x1234567890123456789abcdef678901234567890",
    );
    assert_eq!(
        format!("{address:#X}"),
        "0x1234567890123456789ABCDEF678901234567890",
    );
}

#[test]
fn serialize_as_checksum_string() {
    let address: Address = "0x5aaeb6053f3e94c9b9a09f33669435e7ef1beaed"
        .parse()
        .unwrap();
    let j = serde_json::to_string(&address).unwrap();
    assert_eq!(j, r#""0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed""#);
    let back: Address = serde_json::from_str(&j).unwrap();
    assert_eq!(back, address);
}
