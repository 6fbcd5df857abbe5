//! A module to simplify ABI encoding
//!
//! For simplicity, it is based on tokens. You have to specify a list of
//! tokens and they will be automatically encoded.
//!
//! Additionally there are helpers to help deal with deriving a function
//! signatures and decoding return data.
//!
//! This is not a full fledged implemementation of ABI encoder, tuples and
//! fixed size arrays are not supported, it is more like a bunch of helpers
//! that would help to successfuly encode a contract call.
use crate::address::Address;
use crate::error::Error;
use crate::utils::keccak256;
use num256::Uint256;
use std::str::FromStr;

/// A token represents a value of parameter of the contract call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AbiToken {
    /// Unsigned integer of any width up to 256 bits
    Uint(Uint256),
    Bool(bool),
    Address(Address),
    /// Fixed size array of bytes (`bytes1` to `bytes32`)
    Bytes(Vec<u8>),
    /// Dynamic array of bytes (`bytes`)
    UnboundedBytes(Vec<u8>),
    /// Represents a string
    String(String),
    /// Dynamic array of tokens of a single type (`T[]`)
    Dynamic(Vec<AbiToken>),
}

/// The type of a parameter, as spelled in a function signature
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AbiType {
    /// Width in bits
    Uint(usize),
    Bool,
    Address,
    /// Width in bytes
    Bytes(usize),
    UnboundedBytes,
    String,
    Array(Box<AbiType>),
}

impl FromStr for AbiType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Some(inner) = s.strip_suffix("[]") {
            return Ok(AbiType::Array(Box::new(inner.parse()?)));
        }
        let unsupported = || Error::AbiEncode(format!("unsupported type {s}"));
        // plain decimal digits, usize parsing would also take a sign
        let width = |digits: &str| -> Result<usize, Error> {
            if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
                return Err(unsupported());
            }
            digits.parse().map_err(|_| unsupported())
        };
        match s {
            "bool" => Ok(AbiType::Bool),
            "address" => Ok(AbiType::Address),
            "bytes" => Ok(AbiType::UnboundedBytes),
            "string" => Ok(AbiType::String),
            "uint" => Ok(AbiType::Uint(256)),
            _ => {
                let kind = if let Some(bits) = s.strip_prefix("uint") {
                    AbiType::Uint(width(bits)?)
                } else if let Some(size) = s.strip_prefix("bytes") {
                    AbiType::Bytes(width(size)?)
                } else {
                    return Err(unsupported());
                };
                if !kind.is_supported() {
                    return Err(unsupported());
                }
                Ok(kind)
            }
        }
    }
}

impl AbiType {
    /// False for widths that do not exist, such as `uint7` or `bytes33`,
    /// including inside arrays
    pub fn is_supported(&self) -> bool {
        match self {
            AbiType::Uint(bits) => *bits != 0 && *bits <= 256 && *bits % 8 == 0,
            AbiType::Bytes(size) => *size != 0 && *size <= 32,
            AbiType::Array(inner) => inner.is_supported(),
            _ => true,
        }
    }
}

impl AbiToken {
    /// Dynamic tokens are stored in the tail of the encoding and referenced
    /// by an offset in the head
    pub fn is_dynamic(&self) -> bool {
        matches!(
            self,
            AbiToken::UnboundedBytes(_) | AbiToken::String(_) | AbiToken::Dynamic(_)
        )
    }

    /// True if this token can be passed where `kind` is expected, never
    /// true for an unsupported `kind`
    pub fn matches(&self, kind: &AbiType) -> bool {
        if !kind.is_supported() {
            return false;
        }
        match (self, kind) {
            (AbiToken::Uint(value), AbiType::Uint(bits)) => fits_bits(value, *bits),
            (AbiToken::Bool(_), AbiType::Bool) => true,
            (AbiToken::Address(_), AbiType::Address) => true,
            (AbiToken::Bytes(value), AbiType::Bytes(size)) => value.len() == *size,
            (AbiToken::UnboundedBytes(_), AbiType::UnboundedBytes) => true,
            (AbiToken::String(_), AbiType::String) => true,
            (AbiToken::Dynamic(items), AbiType::Array(inner)) => {
                items.iter().all(|item| item.matches(inner))
            }
            _ => false,
        }
    }

    /// The 32 byte word of a static token
    fn serialize_static(&self) -> Result<[u8; 32], Error> {
        let mut res = [0u8; 32];
        match self {
            AbiToken::Uint(value) => res = value.to_be_bytes(),
            AbiToken::Bool(value) => res[31] = *value as u8,
            AbiToken::Address(address) => res[12..].copy_from_slice(address.as_bytes()),
            AbiToken::Bytes(value) => {
                if value.is_empty() || value.len() > 32 {
                    return Err(Error::AbiEncode(format!(
                        "fixed bytes must be 1 to 32 bytes long, got {}",
                        value.len()
                    )));
                }
                res[..value.len()].copy_from_slice(value);
            }
            AbiToken::UnboundedBytes(_) | AbiToken::String(_) | AbiToken::Dynamic(_) => {
                return Err(Error::AbiEncode("dynamic token in static position".into()))
            }
        }
        Ok(res)
    }

    /// Length prefixed tail data of a dynamic token
    fn serialize_dynamic(&self) -> Result<Vec<u8>, Error> {
        match self {
            AbiToken::UnboundedBytes(value) => Ok(length_prefixed(value)),
            AbiToken::String(value) => Ok(length_prefixed(value.as_bytes())),
            AbiToken::Dynamic(items) => {
                let mut res = usize_word(items.len()).to_vec();
                res.extend(encode_tokens(items)?);
                Ok(res)
            }
            _ => Err(Error::AbiEncode("static token in dynamic position".into())),
        }
    }
}

impl From<Uint256> for AbiToken {
    fn from(v: Uint256) -> AbiToken {
        AbiToken::Uint(v)
    }
}

impl From<u8> for AbiToken {
    fn from(v: u8) -> AbiToken {
        AbiToken::Uint(v.into())
    }
}

impl From<u16> for AbiToken {
    fn from(v: u16) -> AbiToken {
        AbiToken::Uint(v.into())
    }
}

impl From<u32> for AbiToken {
    fn from(v: u32) -> AbiToken {
        AbiToken::Uint(v.into())
    }
}

impl From<u64> for AbiToken {
    fn from(v: u64) -> AbiToken {
        AbiToken::Uint(v.into())
    }
}

impl From<bool> for AbiToken {
    fn from(v: bool) -> AbiToken {
        AbiToken::Bool(v)
    }
}

impl From<Address> for AbiToken {
    fn from(v: Address) -> AbiToken {
        AbiToken::Address(v)
    }
}

impl From<Vec<u8>> for AbiToken {
    fn from(v: Vec<u8>) -> AbiToken {
        AbiToken::UnboundedBytes(v)
    }
}

impl From<&str> for AbiToken {
    fn from(v: &str) -> AbiToken {
        AbiToken::String(v.to_string())
    }
}

impl From<String> for AbiToken {
    fn from(v: String) -> AbiToken {
        AbiToken::String(v)
    }
}

impl From<Vec<Address>> for AbiToken {
    fn from(v: Vec<Address>) -> AbiToken {
        AbiToken::Dynamic(v.into_iter().map(AbiToken::Address).collect())
    }
}

impl From<Vec<Uint256>> for AbiToken {
    fn from(v: Vec<Uint256>) -> AbiToken {
        AbiToken::Dynamic(v.into_iter().map(AbiToken::Uint).collect())
    }
}

fn fits_bits(value: &Uint256, bits: usize) -> bool {
    let bytes = value.to_be_bytes();
    match 32usize.checked_sub(bits / 8) {
        Some(unused) => bytes[..unused].iter().all(|b| *b == 0),
        None => false,
    }
}

fn usize_word(value: usize) -> [u8; 32] {
    let mut res = [0u8; 32];
    res[24..].copy_from_slice(&(value as u64).to_be_bytes());
    res
}

// length word followed by the data right padded to a multiple of 32
fn length_prefixed(data: &[u8]) -> Vec<u8> {
    let mut res = usize_word(data.len()).to_vec();
    res.extend_from_slice(data);
    let padding = (32 - data.len() % 32) % 32;
    res.extend(std::iter::repeat(0u8).take(padding));
    res
}

/// Given a signature it derives a Method ID
pub fn derive_method_id(signature: &str) -> [u8; 4] {
    let digest = keccak256(signature.as_bytes());
    let mut result = [0u8; 4];
    result.copy_from_slice(&digest[0..4]);
    result
}

/// Splits `name(type1,type2)` into the parameter types
fn parse_signature(signature: &str) -> Result<Vec<AbiType>, Error> {
    let malformed = || Error::AbiEncode(format!("malformed signature {signature}"));
    let open = signature.find('(').ok_or_else(malformed)?;
    let params = signature[open + 1..]
        .strip_suffix(')')
        .ok_or_else(malformed)?;
    if open == 0 || params.contains('(') {
        return Err(malformed());
    }
    if params.is_empty() {
        return Ok(Vec::new());
    }
    params.split(',').map(AbiType::from_str).collect()
}

/// Serializes tokens with the head/tail layout of the contract ABI.
///
/// Static tokens take one word in the head, dynamic tokens put an offset in
/// the head and their data in the tail.
pub fn encode_tokens(tokens: &[AbiToken]) -> Result<Vec<u8>, Error> {
    let head_len = tokens.len() * 32;
    let mut head = Vec::with_capacity(head_len);
    let mut tail = Vec::new();
    for token in tokens {
        if token.is_dynamic() {
            head.extend_from_slice(&usize_word(head_len + tail.len()));
            tail.extend(token.serialize_dynamic()?);
        } else {
            head.extend_from_slice(&token.serialize_static()?);
        }
    }
    head.extend(tail);
    Ok(head)
}

/// Gets the Method ID of the signature and then serializes the tokens after
/// it, the tokens have to match the parameter types of the signature.
///
/// # Example
///
/// ```rust
/// # use ethtx::abi::{encode_call, AbiToken};
/// let data = encode_call("setValue(string)", &["hello".into()]).unwrap();
/// assert_eq!(&data[0..4], &[0x93, 0xa0, 0x93, 0x52]);
/// ```
pub fn encode_call(signature: &str, tokens: &[AbiToken]) -> Result<Vec<u8>, Error> {
    let types = parse_signature(signature)?;
    if types.len() != tokens.len() {
        return Err(Error::AbiEncode(format!(
            "{signature} takes {} arguments, got {}",
            types.len(),
            tokens.len()
        )));
    }
    for (i, (token, kind)) in tokens.iter().zip(types.iter()).enumerate() {
        if !token.matches(kind) {
            return Err(Error::AbiEncode(format!(
                "argument {i} of {signature} is not a {kind:?}"
            )));
        }
    }
    let mut res = derive_method_id(signature).to_vec();
    res.extend(encode_tokens(tokens)?);
    Ok(res)
}

fn word_at(data: &[u8], offset: usize) -> Result<&[u8], Error> {
    offset
        .checked_add(32)
        .and_then(|end| data.get(offset..end))
        .ok_or_else(|| Error::AbiDecode(format!("no word at offset {offset}")))
}

fn word_to_usize(word: &[u8]) -> Result<usize, Error> {
    if word[..24].iter().any(|b| *b != 0) {
        return Err(Error::AbiDecode("offset or length too large".into()));
    }
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&word[24..]);
    usize::try_from(u64::from_be_bytes(bytes))
        .map_err(|_| Error::AbiDecode("offset or length too large".into()))
}

fn decode_static(kind: &AbiType, word: &[u8]) -> Result<AbiToken, Error> {
    match kind {
        AbiType::Uint(bits) => {
            let value = Uint256::from_be_bytes(word);
            if !fits_bits(&value, *bits) {
                return Err(Error::AbiDecode(format!("value wider than uint{bits}")));
            }
            Ok(AbiToken::Uint(value))
        }
        AbiType::Bool => match word_to_usize(word) {
            Ok(0) => Ok(AbiToken::Bool(false)),
            Ok(1) => Ok(AbiToken::Bool(true)),
            _ => Err(Error::AbiDecode("bool must be 0 or 1".into())),
        },
        AbiType::Address => {
            if word[..12].iter().any(|b| *b != 0) {
                return Err(Error::AbiDecode("dirty address padding".into()));
            }
            Ok(AbiToken::Address(Address::from_slice(&word[12..])?))
        }
        AbiType::Bytes(size) => {
            let (value, padding) = word.split_at(*size);
            if padding.iter().any(|b| *b != 0) {
                return Err(Error::AbiDecode(format!("dirty bytes{size} padding")));
            }
            Ok(AbiToken::Bytes(value.to_vec()))
        }
        AbiType::UnboundedBytes | AbiType::String | AbiType::Array(_) => Err(Error::AbiDecode(
            "dynamic type in static position".into(),
        )),
    }
}

fn decode_dynamic(kind: &AbiType, data: &[u8]) -> Result<AbiToken, Error> {
    let len = word_to_usize(word_at(data, 0)?)?;
    let body = &data[32..];
    match kind {
        AbiType::UnboundedBytes | AbiType::String => {
            let bytes = body
                .get(..len)
                .ok_or_else(|| Error::AbiDecode("data shorter than its length".into()))?;
            if *kind == AbiType::String {
                let s = std::str::from_utf8(bytes)
                    .map_err(|_| Error::AbiDecode("string is not utf8".into()))?;
                Ok(AbiToken::String(s.to_string()))
            } else {
                Ok(AbiToken::UnboundedBytes(bytes.to_vec()))
            }
        }
        AbiType::Array(inner) => {
            // every element takes at least a word in the head
            if len > body.len() / 32 {
                return Err(Error::AbiDecode("array longer than the data".into()));
            }
            let types = vec![(**inner).clone(); len];
            Ok(AbiToken::Dynamic(decode_tokens(&types, body)?))
        }
        _ => Err(Error::AbiDecode("static type in dynamic position".into())),
    }
}

/// Decodes ABI encoded data, such as the return value of a call, into tokens
/// of the given types
pub fn decode_tokens(types: &[AbiType], data: &[u8]) -> Result<Vec<AbiToken>, Error> {
    if let Some(kind) = types.iter().find(|kind| !kind.is_supported()) {
        return Err(Error::AbiDecode(format!("unsupported type {kind:?}")));
    }
    let mut res = Vec::with_capacity(types.len());
    for (i, kind) in types.iter().enumerate() {
        let word = word_at(data, i * 32)?;
        match kind {
            AbiType::UnboundedBytes | AbiType::String | AbiType::Array(_) => {
                let offset = word_to_usize(word)?;
                let tail = data
                    .get(offset..)
                    .ok_or_else(|| Error::AbiDecode(format!("offset {offset} out of range")))?;
                res.push(decode_dynamic(kind, tail)?);
            }
            _ => res.push(decode_static(kind, word)?),
        }
    }
    Ok(res)
}
