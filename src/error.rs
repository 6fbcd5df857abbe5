use std::fmt;
use std::str::Utf8Error;

/// Broad classification of an [`Error`].
///
/// Every variant of [`Error`] belongs to exactly one kind, callers that only
/// care about the category of a failure can match on this instead of the
/// detailed variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// A value can not be represented in the wire format
    Encoding,
    /// Wire bytes are malformed, truncated or not canonical
    Decoding,
    /// A private key is outside of the valid scalar range
    InvalidKey,
    /// A signature is out of range or does not recover to a public key
    InvalidSignature,
    /// Textual input (hex, addresses, amounts) could not be parsed
    Parse,
}

/// Custom error implementation that describes possible
/// error states.
///
/// This is shared by a whole crate.
#[derive(Debug)]
pub enum Error {
    FieldOverflow { field: &'static str },
    InvalidChainId(u64),
    AbiEncode(String),
    DeserializeRlp(&'static str),
    TrailingBytes { extra: usize },
    InvalidFieldCount { got: usize },
    NonCanonicalInteger { field: &'static str },
    UnrecognizedV(u64),
    AbiDecode(String),
    ZeroPrivKey,
    PrivKeyOutOfRange,
    InvalidPrivKeyLength { got: usize, expected: usize },
    DecodePrivKey(secp256k1::Error),
    InvalidV,
    InvalidR,
    InvalidS,
    InvalidSignatureLength,
    NoSignature,
    ParseRecoverableSignature(secp256k1::Error),
    RecoverSignature(secp256k1::Error),
    InvalidAddressLength { got: usize, expected: usize },
    InvalidUtf8(Utf8Error),
    InvalidHex(String),
    OddHexLength { got: usize },
    InvalidEip55,
    InvalidUnit(String),
    InvalidAmount(String),
}

impl Error {
    /// The category this error falls into
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::FieldOverflow { .. } | Error::InvalidChainId(_) | Error::AbiEncode(_) => {
                ErrorKind::Encoding
            }
            Error::DeserializeRlp(_)
            | Error::TrailingBytes { .. }
            | Error::InvalidFieldCount { .. }
            | Error::NonCanonicalInteger { .. }
            | Error::UnrecognizedV(_)
            | Error::AbiDecode(_) => ErrorKind::Decoding,
            Error::ZeroPrivKey
            | Error::PrivKeyOutOfRange
            | Error::InvalidPrivKeyLength { .. }
            | Error::DecodePrivKey(_) => ErrorKind::InvalidKey,
            Error::InvalidV
            | Error::InvalidR
            | Error::InvalidS
            | Error::InvalidSignatureLength
            | Error::NoSignature
            | Error::ParseRecoverableSignature(_)
            | Error::RecoverSignature(_) => ErrorKind::InvalidSignature,
            Error::InvalidAddressLength { .. }
            | Error::InvalidUtf8(_)
            | Error::InvalidHex(_)
            | Error::OddHexLength { .. }
            | Error::InvalidEip55
            | Error::InvalidUnit(_)
            | Error::InvalidAmount(_) => ErrorKind::Parse,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::FieldOverflow { field } => {
                write!(f, "Field {field} does not fit its encoded width")
            }
            Error::InvalidChainId(id) => write!(f, "Chain id {id} is out of range"),
            Error::AbiEncode(val) => write!(f, "Failed to ABI encode: {val}"),
            Error::DeserializeRlp(reason) => {
                write!(f, "failed to deserialize using RLP-encoding: {reason}")
            }
            Error::TrailingBytes { extra } => {
                write!(f, "{extra} unexpected bytes after the RLP item")
            }
            Error::InvalidFieldCount { got } => write!(
                f,
                "Transaction list should have 6 or 9 elements, got {got}"
            ),
            Error::NonCanonicalInteger { field } => {
                write!(f, "Field {field} is not a minimal big endian integer")
            }
            Error::UnrecognizedV(v) => write!(f, "Encoded V value {v} is not recognized"),
            Error::AbiDecode(val) => write!(f, "Failed to ABI decode: {val}"),
            Error::ZeroPrivKey => write!(f, "Zero priv key cannot sign"),
            Error::PrivKeyOutOfRange => {
                write!(f, "Private key is not smaller than the curve order")
            }
            Error::InvalidPrivKeyLength { got, expected } => write!(
                f,
                "Invalid private key length, got {got} expected {expected}"
            ),
            Error::DecodePrivKey(_) => write!(f, "Failed to decode private key"),
            Error::InvalidV => write!(f, "Invalid V value"),
            Error::InvalidR => write!(f, "Invalid R value"),
            Error::InvalidS => write!(f, "Invalid S value"),
            Error::InvalidSignatureLength => write!(f, "Signature should be exactly 65 bytes long"),
            Error::NoSignature => write!(f, "Transaction is not signed"),
            Error::ParseRecoverableSignature(_) => {
                write!(f, "Failed to parse recoverable signature")
            }
            Error::RecoverSignature(_) => write!(f, "Failed to recover signature"),
            Error::InvalidAddressLength { got, expected } => {
                write!(f, "Invalid address length, got {got}, expected {expected}")
            }
            Error::InvalidUtf8(_) => write!(f, "Failed to parse bytes as utf8"),
            Error::InvalidHex(chunk) => write!(f, "Invalid hex characters in {chunk:?}"),
            Error::OddHexLength { got } => {
                write!(f, "Hex string should have an even length, got {got}")
            }
            Error::InvalidEip55 => write!(f, "Invalid EIP-55 Address encoding"),
            Error::InvalidUnit(unit) => write!(f, "Unknown denomination {unit}"),
            Error::InvalidAmount(amount) => write!(f, "Invalid amount {amount}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::DecodePrivKey(inner) => Some(inner),
            Error::ParseRecoverableSignature(inner) => Some(inner),
            Error::RecoverSignature(inner) => Some(inner),
            Error::InvalidUtf8(inner) => Some(inner),
            _ => None,
        }
    }
}

impl From<Utf8Error> for Error {
    fn from(e: Utf8Error) -> Self {
        Error::InvalidUtf8(e)
    }
}


#[test]
fn kinds_cover_categories() {
    assert_eq!(Error::ZeroPrivKey.kind(), ErrorKind::InvalidKey);
    assert_eq!(Error::InvalidS.kind(), ErrorKind::InvalidSignature);
    assert_eq!(
        Error::DeserializeRlp("truncated").kind(),
        ErrorKind::Decoding
    );
    assert_eq!(
        Error::FieldOverflow { field: "nonce" }.kind(),
        ErrorKind::Encoding
    );
    assert_eq!(Error::InvalidEip55.kind(), ErrorKind::Parse);
    assert_eq!(Error::OddHexLength { got: 3 }.kind(), ErrorKind::Parse);
    assert_eq!(Error::InvalidHex("+1".to_owned()).kind(), ErrorKind::Parse);
}

#[test]
fn display_includes_details() {
    let e = Error::InvalidPrivKeyLength {
        got: 3,
        expected: 64,
    };
    assert_eq!(e.to_string(), "Invalid private key length, got 3 expected 64");
    assert_eq!(
        Error::TrailingBytes { extra: 2 }.to_string(),
        "2 unexpected bytes after the RLP item"
    );
    assert_eq!(
        Error::InvalidHex("+1".to_owned()).to_string(),
        "Invalid hex characters in \"+1\""
    );
}
