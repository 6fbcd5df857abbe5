use crate::error::Error;
use sha3::{Digest, Keccak256};
use std::str;

/// A function that takes a hexadecimal representation of bytes
/// back into a stream of bytes.
///
/// The `0x` prefix is optional. Every other character has to be a hex digit
/// and there has to be an even amount of them.
pub fn hex_str_to_bytes(s: &str) -> Result<Vec<u8>, Error> {
    let s = match s.strip_prefix("0x") {
        Some(s) => s,
        None => s,
    };
    if s.len() % 2 != 0 {
        return Err(Error::OddHexLength { got: s.len() });
    }
    let bytes = s
        .as_bytes()
        .chunks(2)
        .map::<Result<u8, Error>, _>(|ch| {
            let str = str::from_utf8(ch)?;
            // from_str_radix alone would take a sign
            if !ch.iter().all(u8::is_ascii_hexdigit) {
                return Err(Error::InvalidHex(str.to_owned()));
            }
            u8::from_str_radix(str, 16).map_err(|_| Error::InvalidHex(str.to_owned()))
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(bytes)
}

pub fn bytes_to_hex_str(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{b:0>2x?}"))
        .fold(String::new(), |acc, x| acc + &x)
}

/// Keccak-256 of arbitrary data, the hash used everywhere in Ethereum
pub fn keccak256(data: &[u8]) -> [u8; 32] {
    let digest = Keccak256::digest(data);
    let mut out = [0u8; 32];
    out.copy_from_slice(&digest);
    out
}

/// Drops leading zero bytes, an all zero input becomes empty
pub fn trim_leading_zero_bytes(bytes: &[u8]) -> &[u8] {
    match bytes.iter().position(|b| *b != 0) {
        Some(i) => &bytes[i..],
        None => &[],
    }
}

/// Pad bytes with zeros at the start.
pub fn zpad(bytes: &[u8], len: usize) -> Vec<u8> {
    if bytes.len() >= len {
        return bytes.to_vec();
    }
    let mut pad = vec![0u8; len - bytes.len()];
    pad.extend(bytes);
    pad
}

/// Random byte strings of random length, used by the fuzz tests
#[cfg(test)]
pub fn get_fuzz_bytes(rng: &mut impl rand::Rng) -> Vec<u8> {
    let range = rng.gen_range(1..200);
    (0..range).map(|_| rng.gen()).collect()
}

#[test]
fn decode_bytes() {
    assert_eq!(
        hex_str_to_bytes("deadbeef").expect("Unable to decode"),
        [222, 173, 190, 239]
    );
}

#[test]
fn decode_odd_amount_of_bytes() {
    assert!(matches!(
        hex_str_to_bytes("f"),
        Err(Error::OddHexLength { got: 1 })
    ));
    assert!(matches!(
        hex_str_to_bytes("0xdeadbee"),
        Err(Error::OddHexLength { got: 7 })
    ));
}

#[test]
fn bytes_rejects_sign() {
    for input in ["+1", "0x+f", "ff+1", "-1"] {
        match hex_str_to_bytes(input).unwrap_err() {
            Error::InvalidHex(chunk) => assert!(input.contains(&chunk)),
            e => panic!("{input}: {e}"),
        }
    }
}

#[test]
fn bytes_raises_decode_error() {
    let e = hex_str_to_bytes("\u{012345}deadbeef").unwrap_err();

    match e {
        Error::InvalidUtf8(_) => {}
        _ => panic!(),
    };
}

#[test]
fn bytes_raises_parse_error() {
    let e = hex_str_to_bytes("Lorem ipsum!").unwrap_err();
    match e {
        Error::InvalidHex(chunk) => assert_eq!(chunk, "Lo"),
        _ => panic!(),
    }
}

#[test]
fn parse_prefixed_empty() {
    assert_eq!(hex_str_to_bytes("0x").unwrap(), Vec::<u8>::new());
}

#[test]
fn parse_prefixed_non_empty() {
    assert_eq!(
        hex_str_to_bytes("0xdeadbeef").unwrap(),
        vec![0xde, 0xad, 0xbe, 0xef]
    );
}

#[test]
fn encode_bytes() {
    assert_eq!(bytes_to_hex_str(&[0xf]), "0f".to_owned());
    assert_eq!(bytes_to_hex_str(&[0xff]), "ff".to_owned());
    assert_eq!(
        bytes_to_hex_str(&[0xde, 0xad, 0xbe, 0xef]),
        "deadbeef".to_owned()
    );
}

#[test]
fn keccak_of_text() {
    // web3.utils.sha3('xoxo')
    assert_eq!(
        bytes_to_hex_str(&keccak256(b"xoxo")),
        "1c2b05dea5e7812c49d24848928e93dd734161ba77b76681689632bb71497dc1"
    );
    assert_eq!(
        bytes_to_hex_str(&keccak256(&[])),
        "c5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470"
    );
}

#[test]
fn trims_zeros() {
    assert_eq!(trim_leading_zero_bytes(&[0, 0, 1, 0]), &[1, 0]);
    assert!(trim_leading_zero_bytes(&[0, 0]).is_empty());
}

#[test]
fn verify_zpad() {
    assert_eq!(zpad(&[1, 2, 3, 4], 8), [0, 0, 0, 0, 1, 2, 3, 4]);
    assert_eq!(zpad(&[1, 2, 3, 4], 2), [1, 2, 3, 4]);
}
