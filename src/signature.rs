use crate::address::Address;
use crate::constants::{secpk1n, secpk1n_half};
use crate::context::SECP256K1;
use crate::error::Error;
use crate::private_key::hash_message;
use crate::utils::{bytes_to_hex_str, hex_str_to_bytes};
use num256::Uint256;
use num_traits::Zero;
use secp256k1::ecdsa::{RecoverableSignature, RecoveryId};
use secp256k1::Message;
use std::fmt::{self, Display};
use std::str::FromStr;

/// An ECDSA signature over secp256k1 in the form carried by legacy
/// transactions.
///
/// `v` holds the recovery id encoded either as `27 + recovery_id` or, for
/// replay protected signatures, as `recovery_id + 35 + 2 * chain_id`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Signature {
    pub v: u64,
    pub r: Uint256,
    pub s: Uint256,
}

impl Signature {
    pub fn new(v: u64, r: Uint256, s: Uint256) -> Signature {
        Signature { v, r, s }
    }

    pub fn get_v(&self) -> u64 {
        self.v
    }

    pub fn get_r(&self) -> Uint256 {
        self.r
    }

    pub fn get_s(&self) -> Uint256 {
        self.s
    }

    /// Like is_valid() but returns a reason
    ///
    /// Both `r` and `s` have to be in `[1, n - 1]` and `v` has to carry a
    /// recovery id. A high `s` is accepted here, see [is_low_s](#method.is_low_s).
    pub fn error_check(&self) -> Result<(), Error> {
        if self.r >= secpk1n() || self.r == Uint256::zero() {
            return Err(Error::InvalidR);
        } else if self.s >= secpk1n() || self.s == Uint256::zero() {
            return Err(Error::InvalidS);
        }
        self.recovery_id().map(|_| ())
    }

    pub fn is_valid(&self) -> bool {
        self.error_check().is_ok()
    }

    /// True when `s <= n / 2`, the only form produced by the signer
    pub fn is_low_s(&self) -> bool {
        self.s <= secpk1n_half()
    }

    /// Returns the equivalent low-s signature.
    ///
    /// `(r, s)` and `(r, n - s)` verify under the same key, switching
    /// between them flips the parity of the recovery id.
    pub fn normalized(&self) -> Signature {
        if self.is_low_s() {
            return *self;
        }
        let v = match self.v {
            27 => 28,
            28 => 27,
            v if v >= 37 && (v - 35) % 2 == 0 => v + 1,
            v if v >= 37 => v - 1,
            v => v,
        };
        Signature {
            v,
            r: self.r,
            s: secpk1n() - self.s,
        }
    }

    /// The recovery id, 0 or 1, hidden in `v`.
    ///
    /// 35 and 36 would be a replay protected `v` for chain id 0 and are
    /// rejected.
    pub fn recovery_id(&self) -> Result<u8, Error> {
        match self.v {
            // Valid V values are in {27, 28} according to Ethereum Yellow paper Appendix F (282).
            27 | 28 => Ok((self.v - 27) as u8),
            v if v >= 37 => Ok(((v - 35) % 2) as u8),
            _ => Err(Error::InvalidV),
        }
    }

    /// The chain id a replay protected signature commits to, `None` for
    /// `v` values of 27 and 28 and for any `v` below 37
    pub fn chain_id(&self) -> Option<u64> {
        if self.v >= 37 {
            Some((self.v - 35) / 2)
        } else {
            None
        }
    }

    /// Converts a signature into its 65 byte form, `r || s || v`.
    ///
    /// Any chain id is dropped, the last byte is `27 + recovery_id` which is
    /// what `personal_sign` style APIs expect. A `v` without a recovery id is
    /// kept as its lowest byte.
    pub fn to_bytes(&self) -> [u8; 65] {
        let r: [u8; 32] = self.r.to_be_bytes();
        let s: [u8; 32] = self.s.to_be_bytes();
        let mut result = [0x00u8; 65];
        // Put r at the beginning
        result[0..32].copy_from_slice(&r);
        // Add s in the middle
        result[32..64].copy_from_slice(&s);
        // End up with v at the end
        result[64] = match self.recovery_id() {
            Ok(id) => 27 + id,
            Err(_) => self.v as u8,
        };
        result
    }

    /// Constructs a signature from a bytes string
    ///
    /// This is opposite to `to_bytes()`. A trailing recovery id of 0 or 1 is
    /// moved into the 27/28 range.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, Error> {
        if bytes.len() != 65 {
            return Err(Error::InvalidSignatureLength);
        }
        let r = Uint256::from_be_bytes(&bytes[0..32]);
        let s = Uint256::from_be_bytes(&bytes[32..64]);
        let v = match bytes[64] {
            v @ (0 | 1) => u64::from(v) + 27,
            v => u64::from(v),
        };
        Ok(Signature { v, r, s })
    }

    /// Recover an address from a signature
    ///
    /// This can be called with any arbitrary signature, and a hashed message.
    pub fn recover(&self, hash: &[u8; 32]) -> Result<Address, Error> {
        self.error_check()?;
        let recovery_id = match self.recovery_id()? {
            0 => RecoveryId::Zero,
            1 => RecoveryId::One,
            _ => return Err(Error::InvalidV),
        };
        // A message to recover which is a hash of the transaction
        let msg = Message::from_digest(*hash);

        // Get the compact form using bytes, and "v" parameter
        let compact = RecoverableSignature::from_compact(&self.to_bytes()[..64], recovery_id)
            .map_err(Error::ParseRecoverableSignature)?;
        // Acquire secp256k1 context from thread local storage
        let pkey = SECP256K1.with(move |object| -> Result<_, Error> {
            // Borrow once and reuse
            let secp256k1 = object.borrow();
            let pkey = secp256k1
                .recover_ecdsa(&msg, &compact)
                .map_err(Error::RecoverSignature)?;
            Ok(pkey.serialize_uncompressed())
        })?;
        Ok(Address::from_public_key(&pkey))
    }

    /// Recovers the signer of a message signed with
    /// `PrivateKey::sign_ethereum_msg`
    pub fn recover_ethereum_msg(&self, message: &[u8]) -> Result<Address, Error> {
        self.recover(&hash_message(message))
    }
}

impl Display for Signature {
    // 0x followed by 130 hex digits, "r", "s" and then "v"
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "0x{}", bytes_to_hex_str(&self.to_bytes()))
    }
}

impl FromStr for Signature {
    type Err = Error;
    /// Constructs a signature back from a string representation
    ///
    /// The input string's length should be exactly 130 not including
    /// optional "0x" prefix at the beggining.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = match s.strip_prefix("0x") {
            Some(s) => s,
            None => s,
        };
        if s.len() != 130 {
            return Err(Error::InvalidSignatureLength);
        }
        let bytes = hex_str_to_bytes(s)?;
        Signature::from_bytes(&bytes)
    }
}

impl fmt::LowerHex for Signature {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if f.alternate() {
            write!(f, "0x{}", bytes_to_hex_str(&self.to_bytes()))
        } else {
            write!(f, "{}", bytes_to_hex_str(&self.to_bytes()))
        }
    }
}

impl fmt::UpperHex for Signature {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if f.alternate() {
            write!(f, "0x{}", bytes_to_hex_str(&self.to_bytes()).to_uppercase())
        } else {
            write!(f, "{}", bytes_to_hex_str(&self.to_bytes()).to_uppercase())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::private_key::PrivateKey;
    use crate::utils::keccak256;

    #[test]
    fn new_signature() {
        let sig = Signature::new(27, 2u32.into(), 3u32.into());
        assert_eq!(sig.recovery_id().unwrap(), 0);
        assert_eq!(sig.get_r(), 2u32.into());
        assert_eq!(sig.get_s(), 3u32.into());
        assert_eq!(sig.chain_id(), None);
    }

    #[test]
    fn replay_protected_v() {
        let sig = Signature::new(37, 1u32.into(), 1u32.into());
        assert_eq!(sig.recovery_id().unwrap(), 0);
        assert_eq!(sig.chain_id(), Some(1));
        let sig = Signature::new(38, 1u32.into(), 1u32.into());
        assert_eq!(sig.recovery_id().unwrap(), 1);
        assert_eq!(sig.chain_id(), Some(1));
        // chain id 0 is spelled 27/28, never 35/36
        for v in [35u64, 36] {
            let sig = Signature::new(v, 1u32.into(), 1u32.into());
            assert_eq!(sig.chain_id(), None);
            assert!(matches!(sig.recovery_id(), Err(Error::InvalidV)));
        }
    }

    #[test]
    fn invalid_v() {
        for v in [0u64, 1, 26, 29, 34, 35, 36] {
            let sig = Signature::new(v, 1u32.into(), 1u32.into());
            assert!(matches!(sig.recovery_id(), Err(Error::InvalidV)));
            assert!(!sig.is_valid());
        }
    }

    #[test]
    fn range_checks() {
        let one: Uint256 = 1u32.into();
        let sig = Signature::new(27, Uint256::zero(), one);
        assert!(matches!(sig.error_check(), Err(Error::InvalidR)));
        let sig = Signature::new(27, secpk1n(), one);
        assert!(matches!(sig.error_check(), Err(Error::InvalidR)));
        let sig = Signature::new(27, one, Uint256::zero());
        assert!(matches!(sig.error_check(), Err(Error::InvalidS)));
        let sig = Signature::new(27, one, secpk1n());
        assert!(matches!(sig.error_check(), Err(Error::InvalidS)));
        // high s is still a valid signature
        let sig = Signature::new(27, one, secpk1n() - one);
        assert!(sig.is_valid());
        assert!(!sig.is_low_s());
    }

    #[test]
    fn normalize_flips_parity() {
        let one: Uint256 = 1u32.into();
        let high = Signature::new(27, one, secpk1n() - one);
        let low = high.normalized();
        assert_eq!(low.v, 28);
        assert_eq!(low.s, one);
        assert!(low.is_low_s());

        let high = Signature::new(38, one, secpk1n() - one);
        assert_eq!(high.normalized().v, 37);
        let high = Signature::new(37, one, secpk1n() - one);
        assert_eq!(high.normalized().v, 38);
        // no recovery id to flip
        let high = Signature::new(35, one, secpk1n() - one);
        assert_eq!(high.normalized().v, 35);

        // already low, nothing changes
        assert_eq!(low.normalized(), low);
        let half = Signature::new(27, one, secpk1n_half());
        assert_eq!(half.normalized(), half);
    }

    #[test]
    fn high_s_recovers_same_address() {
        let key: PrivateKey = "c87f65ff3f271bf5dc8643484f66b200109caffe4bf98c4cb393dc35740b28c0"
            .parse()
            .unwrap();
        let hash = keccak256(b"Hello, world!");
        let low = key.sign_hash(&hash);
        assert!(low.is_low_s());
        let high = Signature::new(if low.v == 27 { 28 } else { 27 }, low.r, secpk1n() - low.s);
        assert!(!high.is_low_s());
        assert_eq!(high.recover(&hash).unwrap(), key.to_address());
        assert_eq!(high.normalized(), low);
    }

    #[test]
    fn recover_rejects_out_of_range() {
        let hash = keccak256(b"Hello, world!");
        let sig = Signature::new(27, Uint256::zero(), 1u32.into());
        assert!(matches!(sig.recover(&hash), Err(Error::InvalidR)));
        let sig = Signature::new(29, 1u32.into(), 1u32.into());
        assert!(matches!(sig.recover(&hash), Err(Error::InvalidV)));
    }

    #[test]
    fn to_string() {
        let sig = Signature::new(
            27,
            "46931453024532474733685283063627880567312440788463010001768937934622226624546"
                .parse()
                .unwrap(),
            "26148548919328017436453040233036932434108521788493693113834017318419224834519"
                .parse()
                .unwrap(),
        );
        let sig_string = sig.to_string();
        assert_eq!(sig_string.len(), 132);
        assert!(sig_string.starts_with("0x67c242d6"));
        assert!(sig_string.ends_with("1b"));
        let parsed: Signature = sig_string.parse().unwrap();
        assert_eq!(parsed, sig);
        assert_eq!(format!("{sig:#x}"), sig_string);
        assert_eq!(format!("{sig:X}"), sig_string[2..].to_uppercase());
    }

    #[test]
    fn to_bytes_drops_chain_id() {
        let sig = Signature::new(38, 2u32.into(), 3u32.into());
        let bytes = sig.to_bytes();
        assert_eq!(bytes[31], 2);
        assert_eq!(bytes[63], 3);
        assert_eq!(bytes[64], 28);
    }

    #[test]
    fn from_bytes_accepts_raw_recovery_id() {
        let mut bytes = [0u8; 65];
        bytes[31] = 2;
        bytes[63] = 3;
        bytes[64] = 1;
        let sig = Signature::from_bytes(&bytes).unwrap();
        assert_eq!(sig.v, 28);
        assert!(matches!(
            Signature::from_bytes(&bytes[..64]),
            Err(Error::InvalidSignatureLength)
        ));
        assert!(matches!(
            "0x1234".parse::<Signature>(),
            Err(Error::InvalidSignatureLength)
        ));
    }
}
