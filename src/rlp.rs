//! RLP encoder and decoder.
//!
//! Transactions are serialized with the recursive length prefix scheme from
//! the Ethereum Yellow Paper appendix B. The encoder always produces the
//! canonical form and the decoder only accepts the canonical form, so any
//! byte string has at most one meaning.
//! https://ethereum.org/en/developers/docs/data-structures-and-encoding/rlp/
use crate::utils::{trim_leading_zero_bytes, zpad};
use crate::{Address, Error};
use num256::Uint256;

/// Lists nested deeper than this are rejected by the decoder
const MAX_DEPTH: usize = 64;

/// Intermediate representation for RLP serialization and deserialization
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RlpToken {
    /// Conceptually a string is just an arbitrary sequence of bytes, integers
    /// are strings holding their minimal big endian representation
    String(Vec<u8>),
    List(Vec<RlpToken>),
}

impl RlpToken {
    /// Returns the byte content of a String token
    /// returns an Error if the enum is the list variant
    pub fn get_byte_content(&self) -> Result<&[u8], Error> {
        match self {
            RlpToken::String(b) => Ok(b),
            RlpToken::List(_) => Err(Error::DeserializeRlp("expected a string, found a list")),
        }
    }

    pub fn into_list(self) -> Result<Vec<RlpToken>, Error> {
        match self {
            RlpToken::List(v) => Ok(v),
            RlpToken::String(_) => Err(Error::DeserializeRlp("expected a list, found a string")),
        }
    }

    /// Interprets a string token as a minimal big endian 256 bit integer
    pub fn to_uint256(&self, field: &'static str) -> Result<Uint256, Error> {
        let bytes = integer_bytes(self, field)?;
        if bytes.len() > 32 {
            return Err(Error::DeserializeRlp("integer wider than 256 bits"));
        }
        Ok(Uint256::from_be_bytes(&zpad(bytes, 32)))
    }

    /// Interprets a string token as a minimal big endian 64 bit integer
    pub fn to_u64(&self, field: &'static str) -> Result<u64, Error> {
        let bytes = integer_bytes(self, field)?;
        if bytes.len() > 8 {
            return Err(Error::DeserializeRlp("integer wider than 64 bits"));
        }
        Ok(bytes.iter().fold(0u64, |acc, b| (acc << 8) | u64::from(*b)))
    }

    /// Interprets a string token as a transaction destination, the empty
    /// string is contract creation and anything else has to be 20 bytes
    pub fn to_address(&self) -> Result<Option<Address>, Error> {
        let bytes = self.get_byte_content()?;
        if bytes.is_empty() {
            return Ok(None);
        }
        if bytes.len() != 20 {
            return Err(Error::DeserializeRlp("address must be 20 bytes"));
        }
        Address::from_slice(bytes).map(Some)
    }
}

// integers are strings without leading zeros, zero itself is the empty string
fn integer_bytes<'a>(token: &'a RlpToken, field: &'static str) -> Result<&'a [u8], Error> {
    let bytes = token.get_byte_content()?;
    if bytes.first() == Some(&0) {
        return Err(Error::NonCanonicalInteger { field });
    }
    Ok(bytes)
}

impl From<Vec<u8>> for RlpToken {
    fn from(value: Vec<u8>) -> Self {
        RlpToken::String(value)
    }
}

impl From<Uint256> for RlpToken {
    fn from(value: Uint256) -> Self {
        let bytes = value.to_be_bytes();
        RlpToken::String(trim_leading_zero_bytes(&bytes).to_vec())
    }
}

impl From<&Uint256> for RlpToken {
    fn from(value: &Uint256) -> Self {
        (*value).into()
    }
}

impl From<u64> for RlpToken {
    fn from(value: u64) -> Self {
        let bytes = value.to_be_bytes();
        RlpToken::String(trim_leading_zero_bytes(&bytes).to_vec())
    }
}

impl From<Address> for RlpToken {
    fn from(value: Address) -> Self {
        RlpToken::String(value.as_bytes().to_vec())
    }
}

impl From<&Address> for RlpToken {
    fn from(value: &Address) -> Self {
        RlpToken::String(value.as_bytes().to_vec())
    }
}

/// An absent address is the empty string, this is how contract creation is
/// expressed in a transaction
impl From<Option<Address>> for RlpToken {
    fn from(value: Option<Address>) -> Self {
        match value {
            Some(address) => address.into(),
            None => RlpToken::String(Vec::new()),
        }
    }
}

/// Takes RLP token structs and packs the values into a single rlp
/// encoded byte array
pub fn pack_rlp(input: &[RlpToken]) -> Vec<u8> {
    let mut out: Vec<u8> = Vec::new();
    for token in input {
        pack_token(token, &mut out);
    }
    out
}

fn pack_token(token: &RlpToken, out: &mut Vec<u8>) {
    match token {
        RlpToken::String(string) => {
            // a single byte below 0x80 is its own encoding
            if string.len() == 1 && string[0] < 0x80 {
                out.push(string[0]);
            } else {
                pack_header(0x80, string.len(), out);
                out.extend_from_slice(string);
            }
        }
        RlpToken::List(list) => {
            let encoded_list_data = pack_rlp(list);
            pack_header(0xc0, encoded_list_data.len(), out);
            out.extend(encoded_list_data);
        }
    }
}

// small payloads fold the length into the prefix byte, larger ones encode
// the length of the length and then the length itself
fn pack_header(offset: u8, len: usize, out: &mut Vec<u8>) {
    if len <= 55 {
        out.push(offset + len as u8);
    } else {
        let len_bytes = len.to_be_bytes();
        let encoded_len = trim_leading_zero_bytes(&len_bytes);
        out.push(offset + 55 + encoded_len.len() as u8);
        out.extend_from_slice(encoded_len);
    }
}

/// Decodes exactly one RLP item, any bytes left after it are an error
pub fn unpack_rlp(input: &[u8]) -> Result<RlpToken, Error> {
    let (token, consumed) = unpack_token(input, 0)?;
    if consumed != input.len() {
        return Err(Error::TrailingBytes {
            extra: input.len() - consumed,
        });
    }
    Ok(token)
}

/// Unpacks RLP encoded bytes into a series of consecutive items
pub fn unpack_rlp_stream(input: &[u8]) -> Result<Vec<RlpToken>, Error> {
    unpack_sequence(input, 0)
}

fn unpack_sequence(mut input: &[u8], depth: usize) -> Result<Vec<RlpToken>, Error> {
    let mut out = Vec::new();
    while !input.is_empty() {
        let (token, consumed) = unpack_token(input, depth)?;
        out.push(token);
        input = &input[consumed..];
    }
    Ok(out)
}

/// Decodes the item at the start of `input`, returning it along with the
/// number of bytes it occupied
fn unpack_token(input: &[u8], depth: usize) -> Result<(RlpToken, usize), Error> {
    if depth > MAX_DEPTH {
        return Err(Error::DeserializeRlp("lists nested too deeply"));
    }
    let prefix = *input
        .first()
        .ok_or(Error::DeserializeRlp("unexpected end of input"))?;

    match prefix {
        d if d <= 0x7f => Ok((RlpToken::String(vec![d]), 1)),
        d if d <= 0xb7 => {
            // short string
            let len = (d - 0x80) as usize;
            let payload = take(input, 1, len)?;
            if len == 1 && payload[0] < 0x80 {
                return Err(Error::DeserializeRlp(
                    "single byte below 0x80 must not have a prefix",
                ));
            }
            Ok((RlpToken::String(payload.to_vec()), 1 + len))
        }
        d if d < 0xc0 => {
            // long string, decode the length of the length and then the data
            let len_of_len = (d - 0xb7) as usize;
            let len = read_long_length(input, len_of_len)?;
            let payload = take(input, 1 + len_of_len, len)?;
            Ok((RlpToken::String(payload.to_vec()), 1 + len_of_len + len))
        }
        d if d <= 0xf7 => {
            // short list
            let len = (d - 0xc0) as usize;
            let payload = take(input, 1, len)?;
            let items = unpack_sequence(payload, depth + 1)?;
            Ok((RlpToken::List(items), 1 + len))
        }
        d => {
            // long list
            let len_of_len = (d - 0xf7) as usize;
            let len = read_long_length(input, len_of_len)?;
            let payload = take(input, 1 + len_of_len, len)?;
            let items = unpack_sequence(payload, depth + 1)?;
            Ok((RlpToken::List(items), 1 + len_of_len + len))
        }
    }
}

/// Bounds checked `input[start..start + len]`
fn take(input: &[u8], start: usize, len: usize) -> Result<&[u8], Error> {
    let end = start
        .checked_add(len)
        .ok_or(Error::DeserializeRlp("length overflows"))?;
    input
        .get(start..end)
        .ok_or(Error::DeserializeRlp("unexpected end of input"))
}

/// Reads the big endian length that follows a long form prefix byte
fn read_long_length(input: &[u8], len_of_len: usize) -> Result<usize, Error> {
    let len_bytes = take(input, 1, len_of_len)?;
    if len_bytes[0] == 0 {
        return Err(Error::DeserializeRlp("length has leading zero bytes"));
    }
    if len_of_len > (usize::BITS / 8) as usize {
        return Err(Error::DeserializeRlp("length does not fit in memory"));
    }
    let len = len_bytes
        .iter()
        .fold(0usize, |acc, b| (acc << 8) | usize::from(*b));
    if len <= 55 {
        return Err(Error::DeserializeRlp("long form used for a short payload"));
    }
    Ok(len)
}
