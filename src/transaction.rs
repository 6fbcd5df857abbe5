use crate::address::Address;
use crate::constants::GTXCONTRACTCREATION;
use crate::constants::GTXCOST;
use crate::constants::GTXDATANONZERO;
use crate::constants::GTXDATAZERO;
use crate::constants::MAX_CHAIN_ID;
use crate::constants::MAX_NONCE;
use crate::error::Error;
use crate::private_key::PrivateKey;
use crate::rlp::pack_rlp;
use crate::rlp::unpack_rlp;
use crate::rlp::RlpToken;
use crate::signature::Signature;
use crate::utils::{bytes_to_hex_str, hex_str_to_bytes, keccak256};
use log::{debug, trace};
use num256::Uint256;
use num_traits::Zero;
use serde::Deserialize;
use serde::Deserializer;
use serde::Serialize;
use serde::Serializer;
use std::fmt;
use std::fmt::Display;

/// A legacy Ethereum transaction before it is signed, as explained in the
/// Ethereum Yellow paper section 4.2 with the EIP-155 replay protection
/// extension.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct UnsignedTransaction {
    /// Replay prevention counter, this must be the last nonce successfully on the
    /// chain plus one, multiple tx with incrementing nonces can wait in the mempool
    /// but they must execute in order.
    pub nonce: Uint256,
    /// The price of gas for this transaction, total spend will be price * limit with no
    /// refund for actual utilization
    pub gas_price: Uint256,
    /// The maximum amount of gas that can be used by this transaction
    pub gas_limit: Uint256,
    /// The destination address, `None` deploys `data` as a new contract
    pub to: Option<Address>,
    /// The amount of Ether to send with this transaction in wei
    pub value: Uint256,
    /// Encoded contract call or contract creation code
    pub data: Vec<u8>,
    /// Chain-id value, used to prevent replay attacks accross chains. Zero
    /// produces a pre EIP-155 transaction that is valid on every chain
    pub chain_id: u64,
}

/// Count the number of nonzero bytes in this array
fn count_nonzero_bytes(haystack: &[u8]) -> usize {
    haystack.iter().filter(|b| **b != 0).count()
}

impl UnsignedTransaction {
    /// Checks that every field fits the width the network accepts
    pub fn validate(&self) -> Result<(), Error> {
        // EIP-2681 limits nonces to 2^64-2
        if self.nonce > Uint256::from(MAX_NONCE) {
            return Err(Error::FieldOverflow { field: "nonce" });
        }
        if self.gas_limit > Uint256::from(u64::MAX) {
            return Err(Error::FieldOverflow { field: "gas_limit" });
        }
        if self.chain_id >= MAX_CHAIN_ID {
            return Err(Error::InvalidChainId(self.chain_id));
        }
        Ok(())
    }

    /// The six fields shared by every encoding of the transaction
    fn rlp_fields(&self) -> Vec<RlpToken> {
        vec![
            (&self.nonce).into(),
            (&self.gas_price).into(),
            (&self.gas_limit).into(),
            self.to.into(),
            (&self.value).into(),
            RlpToken::from(self.data.clone()),
        ]
    }

    /// The RLP encoding that is hashed for signing.
    ///
    /// Without a chain id this is the six field list, with a chain id the
    /// list carries `[chain_id, 0, 0]` in place of the signature (EIP-155).
    pub fn encode(&self) -> Result<Vec<u8>, Error> {
        self.validate()?;
        let mut data = self.rlp_fields();
        if self.chain_id != 0 {
            data.push(self.chain_id.into());
            data.push(RlpToken::String(Vec::new()));
            data.push(RlpToken::String(Vec::new()));
        }
        Ok(pack_rlp(&[RlpToken::List(data)]))
    }

    /// Keccak256 of the unsigned encoding, this is what gets signed
    pub fn signing_hash(&self) -> Result<[u8; 32], Error> {
        let hash = keccak256(&self.encode()?);
        trace!("signing hash 0x{}", bytes_to_hex_str(&hash));
        Ok(hash)
    }

    /// Signs the transaction.
    ///
    /// The signature always has a low `s`, `v` carries the recovery id and
    /// the chain id when one is set.
    pub fn sign(&self, key: &PrivateKey) -> Result<SignedTransaction, Error> {
        let hash = self.signing_hash()?;
        let sig = key.sign_hash(&hash);
        let recovery_id = u64::from(sig.recovery_id()?);
        let v = if self.chain_id == 0 {
            27 + recovery_id
        } else {
            // Appendix F (285), `v` is moved out of the 27/28 range
            recovery_id + 35 + 2 * self.chain_id
        };
        trace!("signed transaction for chain {} with v {}", self.chain_id, v);
        SignedTransaction::new(self.clone(), Signature::new(v, sig.r, sig.s))
    }

    /// Like [sign](#method.sign) for a key that is only available as raw
    /// bytes, fails with an `InvalidKey` error for the zero key or a key that
    /// is not below the curve order.
    pub fn sign_with_key_bytes(&self, key: [u8; 32]) -> Result<SignedTransaction, Error> {
        let key = PrivateKey::from_bytes(key)?;
        self.sign(&key)
    }

    /// Gas charged before any code runs, the base cost plus data bytes plus
    /// the contract creation surcharge
    pub fn intrinsic_gas(&self) -> Uint256 {
        let num_non_zero_bytes = count_nonzero_bytes(&self.data);
        let num_zero_bytes = self.data.len() - num_non_zero_bytes;

        let contract_creation_gas: Uint256 = if self.to.is_none() {
            Uint256::from(GTXCONTRACTCREATION)
        } else {
            0u8.into()
        };

        Uint256::from(GTXCOST)
            + Uint256::from(GTXDATAZERO) * Uint256::from(num_zero_bytes as u64)
            + Uint256::from(GTXDATANONZERO) * Uint256::from(num_non_zero_bytes as u64)
            + contract_creation_gas
    }
}

/// A transaction together with its signature.
///
/// The wire encoding and its hash are computed once when the value is
/// built, the value can not be modified afterwards.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SignedTransaction {
    transaction: UnsignedTransaction,
    signature: Signature,
    raw_bytes: Vec<u8>,
    hash: [u8; 32],
}

impl SignedTransaction {
    /// Combines a transaction with a signature over it.
    ///
    /// `v` must match the chain id of the transaction: 27 or 28 without a
    /// chain id, `35 + 2 * chain_id` plus the recovery id otherwise. 35 and 36
    /// are never accepted. `r` and
    /// `s` are not range checked here, [recover_sender](#method.recover_sender)
    /// does that.
    pub fn new(
        transaction: UnsignedTransaction,
        signature: Signature,
    ) -> Result<SignedTransaction, Error> {
        transaction.validate()?;
        let chain_id = match signature.chain_id() {
            Some(chain_id) => chain_id,
            None => {
                signature.recovery_id()?;
                0
            }
        };
        if chain_id != transaction.chain_id {
            return Err(Error::InvalidV);
        }

        let mut data = transaction.rlp_fields();
        data.push(signature.v.into());
        data.push((&signature.r).into());
        data.push((&signature.s).into());
        let raw_bytes = pack_rlp(&[RlpToken::List(data)]);
        let hash = keccak256(&raw_bytes);
        Ok(SignedTransaction {
            transaction,
            signature,
            raw_bytes,
            hash,
        })
    }

    pub fn transaction(&self) -> &UnsignedTransaction {
        &self.transaction
    }

    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    pub fn chain_id(&self) -> u64 {
        self.transaction.chain_id
    }

    /// The bytes to hand to `eth_sendRawTransaction`
    pub fn raw_bytes(&self) -> &[u8] {
        &self.raw_bytes
    }

    /// Creates a byte representation of this transaction
    pub fn encode(&self) -> Vec<u8> {
        self.raw_bytes.clone()
    }

    /// The transaction hash, Keccak256 of the signed encoding
    pub fn hash(&self) -> [u8; 32] {
        self.hash
    }

    pub fn into_parts(self) -> (UnsignedTransaction, Signature) {
        (self.transaction, self.signature)
    }

    /// Get the sender's `Address`; derived from the signature and the
    /// chain aware signing hash. Fails if the signature values are out of
    /// range or no public key can be recovered.
    pub fn recover_sender(&self) -> Result<Address, Error> {
        let hash = self.transaction.signing_hash()?;
        self.signature.recover(&hash)
    }
}

impl Display for SignedTransaction {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "0x{}", bytes_to_hex_str(&self.raw_bytes))
    }
}

impl fmt::LowerHex for SignedTransaction {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if f.alternate() {
            write!(f, "0x{}", bytes_to_hex_str(&self.raw_bytes))
        } else {
            write!(f, "{}", bytes_to_hex_str(&self.raw_bytes))
        }
    }
}

impl fmt::UpperHex for SignedTransaction {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if f.alternate() {
            write!(f, "0x{}", bytes_to_hex_str(&self.raw_bytes).to_uppercase())
        } else {
            write!(f, "{}", bytes_to_hex_str(&self.raw_bytes).to_uppercase())
        }
    }
}

impl Serialize for SignedTransaction {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for SignedTransaction {
    fn deserialize<D>(deserializer: D) -> Result<SignedTransaction, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        let bytes = hex_str_to_bytes(&s).map_err(serde::de::Error::custom)?;
        match Transaction::decode(&bytes).map_err(serde::de::Error::custom)? {
            Transaction::Signed(tx) => Ok(tx),
            Transaction::Unsigned(_) => Err(serde::de::Error::custom(Error::NoSignature)),
        }
    }
}

/// Either form of a transaction, this is what [Transaction::decode] produces
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Transaction {
    Unsigned(UnsignedTransaction),
    Signed(SignedTransaction),
}

impl From<UnsignedTransaction> for Transaction {
    fn from(tx: UnsignedTransaction) -> Transaction {
        Transaction::Unsigned(tx)
    }
}

impl From<SignedTransaction> for Transaction {
    fn from(tx: SignedTransaction) -> Transaction {
        Transaction::Signed(tx)
    }
}

impl Transaction {
    /// Wire bytes of either form
    pub fn encode(&self) -> Result<Vec<u8>, Error> {
        match self {
            Transaction::Unsigned(tx) => tx.encode(),
            Transaction::Signed(tx) => Ok(tx.encode()),
        }
    }

    /// The transaction fields, signed or not
    pub fn unsigned(&self) -> &UnsignedTransaction {
        match self {
            Transaction::Unsigned(tx) => tx,
            Transaction::Signed(tx) => tx.transaction(),
        }
    }

    pub fn signature(&self) -> Option<&Signature> {
        match self {
            Transaction::Unsigned(_) => None,
            Transaction::Signed(tx) => Some(tx.signature()),
        }
    }

    pub fn is_signed(&self) -> bool {
        matches!(self, Transaction::Signed(_))
    }

    /// Parses canonical RLP bytes back into a transaction.
    ///
    /// * 6 items: unsigned, no chain id
    /// * 9 items with `r` and `s` empty: unsigned, the 7th item is the chain id
    /// * any other 9 items: signed, the chain id comes from `v`
    ///
    /// Non canonical integers, wrongly sized addresses, widths the network
    /// would reject and trailing bytes are all decoding errors.
    pub fn decode(raw_rlp_bytes: &[u8]) -> Result<Transaction, Error> {
        let res = decode_transaction(raw_rlp_bytes);
        if let Err(e) = &res {
            debug!("rejected {} transaction bytes: {}", raw_rlp_bytes.len(), e);
        }
        res
    }

    /// Recovers the sender straight from signed wire bytes
    pub fn recover_raw(raw_rlp_bytes: &[u8]) -> Result<Address, Error> {
        match Transaction::decode(raw_rlp_bytes)? {
            Transaction::Signed(tx) => tx.recover_sender(),
            Transaction::Unsigned(_) => Err(Error::NoSignature),
        }
    }
}

fn decode_transaction(raw_rlp_bytes: &[u8]) -> Result<Transaction, Error> {
    let data = unpack_rlp(raw_rlp_bytes)?.into_list()?;
    if data.len() != 6 && data.len() != 9 {
        return Err(Error::InvalidFieldCount { got: data.len() });
    }

    let mut tx = UnsignedTransaction {
        nonce: data[0].to_uint256("nonce")?,
        gas_price: data[1].to_uint256("gas_price")?,
        gas_limit: data[2].to_uint256("gas_limit")?,
        to: data[3].to_address()?,
        value: data[4].to_uint256("value")?,
        data: data[5].get_byte_content()?.to_vec(),
        chain_id: 0,
    };
    if data.len() == 6 {
        check_widths(&tx)?;
        return Ok(Transaction::Unsigned(tx));
    }

    let r = data[7].to_uint256("r")?;
    let s = data[8].to_uint256("s")?;
    if r.is_zero() && s.is_zero() {
        tx.chain_id = data[6].to_u64("chain_id")?;
        if tx.chain_id == 0 {
            // this is spelled with 6 items
            return Err(Error::DeserializeRlp("unsigned transaction with zero chain id"));
        }
        check_widths(&tx)?;
        return Ok(Transaction::Unsigned(tx));
    }

    let v = data[6].to_u64("v")?;
    tx.chain_id = match v {
        27 | 28 => 0,
        // 35 and 36 would be chain id 0, which is only spelled 27/28
        v if v >= 37 => (v - 35) / 2,
        v => return Err(Error::UnrecognizedV(v)),
    };
    check_widths(&tx)?;
    Ok(Transaction::Signed(SignedTransaction::new(
        tx,
        Signature::new(v, r, s),
    )?))
}

// decoded values that the encoder would refuse are malformed input
fn check_widths(tx: &UnsignedTransaction) -> Result<(), Error> {
    tx.validate()
        .map_err(|_| Error::DeserializeRlp("field exceeds its allowed width"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::utils::get_fuzz_bytes;
    use num_traits::Num;
    use rand::thread_rng;
    use std::time::Duration;
    use std::time::Instant;

    const FUZZ_TIME: Duration = Duration::from_secs(10);

    fn scenario_tx() -> UnsignedTransaction {
        UnsignedTransaction {
            nonce: 0u8.into(),
            gas_price: 20_000_000_000u64.into(),
            gas_limit: 21000u32.into(),
            to: Some(Address::default()),
            value: 1_000_000_000_000_000_000u64.into(),
            data: Vec::new(),
            chain_id: 1,
        }
    }

    fn scenario_key() -> PrivateKey {
        "0x4c0883a69102937d6231471b5dbb6204fe5129617082792ae468d01a3f362318"
            .parse()
            .unwrap()
    }

    #[test]
    fn encode_eip155_unsigned() {
        let tx = scenario_tx();
        assert_eq!(
            bytes_to_hex_str(&tx.encode().unwrap()),
            "ec808504a817c800825208940000000000000000000000000000000000000000880de0b6b3a764000080018080"
        );
        assert_eq!(
            bytes_to_hex_str(&tx.signing_hash().unwrap()),
            "de8ae64560453a4a2d4fe7e788d75cfbf89c81e121483ef0c11dff36f39f58d4"
        );
    }

    #[test]
    fn sign_transfer_scenario() {
        let key = scenario_key();
        let signed = scenario_tx().sign(&key).unwrap();
        let sig = signed.signature();
        assert_eq!(sig.v, 37);
        assert_eq!(
            sig.r,
            Uint256::from_str_radix(
                "65443e78506c0dd2ca0327f65f881d9975a9cbf3b4e1c224571e3b4cecdb6e8a",
                16
            )
            .unwrap()
        );
        assert_eq!(
            sig.s,
            Uint256::from_str_radix(
                "2c95897aaf9d99b11260c05b793d3556ad7e3cc8150d8b1b7174bfe813407df6",
                16
            )
            .unwrap()
        );
        assert_eq!(
            signed.to_string(),
            "0xf86c808504a817c800825208940000000000000000000000000000000000000000880de0b6b3a76400008025a065443e78506c0dd2ca0327f65f881d9975a9cbf3b4e1c224571e3b4cecdb6e8aa02c95897aaf9d99b11260c05b793d3556ad7e3cc8150d8b1b7174bfe813407df6"
        );
        assert_eq!(
            bytes_to_hex_str(&signed.hash()),
            "c9fe0766c07b424a7ad39172ccc1118b08976fad947493ed2c32120e1405c216"
        );
        assert_eq!(signed.recover_sender().unwrap(), key.to_address());
        assert_eq!(
            bytes_to_hex_str(key.to_address().as_bytes()),
            "2c7536e3605d9c16a7a3d7b1898e529396a65c23"
        );
    }

    #[test]
    fn eip155_example() {
        // https://github.com/ethereum/EIPs/blob/master/EIPS/eip-155.md#example
        let tx = UnsignedTransaction {
            nonce: 9u8.into(),
            gas_price: 20_000_000_000u64.into(),
            gas_limit: 21000u32.into(),
            to: Some("0x3535353535353535353535353535353535353535".parse().unwrap()),
            value: 1_000_000_000_000_000_000u64.into(),
            data: Vec::new(),
            chain_id: 1,
        };
        assert_eq!(
            bytes_to_hex_str(&tx.encode().unwrap()),
            "ec098504a817c800825208943535353535353535353535353535353535353535880de0b6b3a764000080018080"
        );
        assert_eq!(
            bytes_to_hex_str(&tx.signing_hash().unwrap()),
            "daf5a779ae972f972197303d7b574746c7ef83eadac0f2791ad23db92e4c8e53"
        );
        let key = PrivateKey::from_bytes([0x46; 32]).unwrap();
        let signed = tx.sign(&key).unwrap();
        assert_eq!(
            bytes_to_hex_str(signed.raw_bytes()),
            "f86c098504a817c800825208943535353535353535353535353535353535353535880de0b6b3a76400008025a028ef61340bd939bc2195fe537567866003e1a15d3c71ff63e1590620aa636276a067cbe9d8997f761aecb703304b3800ccf555c9f3dc64214b297fb1966a3b6d83"
        );
        assert_eq!(signed.recover_sender().unwrap(), key.to_address());
    }

    #[test]
    fn contract_creation() {
        let tx = UnsignedTransaction {
            nonce: 3u8.into(),
            gas_price: 1_000_000_000u64.into(),
            gas_limit: 100_000u32.into(),
            to: None,
            value: 0u8.into(),
            data: hex_str_to_bytes("6080604052").unwrap(),
            chain_id: 5,
        };
        let signed = tx.sign(&scenario_key()).unwrap();
        assert_eq!(signed.signature().v, 45);
        assert_eq!(
            bytes_to_hex_str(signed.raw_bytes()),
            "f85503843b9aca00830186a080808560806040522da0f047f141f67d6da79b2ae1dc2df6efe61ccbbedb39505a3cd2a51712673ee637a044961f0efac0ac218f9a659442f5ce5971fc7a57aa15188eba4df39f800d99be"
        );
        let decoded = Transaction::decode(signed.raw_bytes()).unwrap();
        assert_eq!(decoded.unsigned().to, None);
        assert_eq!(decoded, Transaction::Signed(signed));
    }

    #[test]
    fn zero_address_is_not_contract_creation() {
        let tx = scenario_tx();
        let decoded = Transaction::decode(&tx.encode().unwrap()).unwrap();
        assert_eq!(decoded.unsigned().to, Some(Address::default()));
        assert_eq!(decoded, Transaction::Unsigned(tx));
    }

    #[test]
    fn test_basictests_txtest_1() {
        // https://github.com/ethereum/tests/blob/b44cea1cccf1e4b63a05d1ca9f70f2063f28da6d/BasicTests/txtest.json
        let tx = UnsignedTransaction {
            nonce: Uint256::from_str_radix("00", 16).unwrap(),
            gas_price: "1000000000000".parse().unwrap(),
            gas_limit: "10000".parse().unwrap(),
            to: Some("13978aee95f38490e9769c39b2773ed763d9cd5f".parse().unwrap()),
            value: "10000000000000000".parse().unwrap(),
            data: Vec::new(),
            chain_id: 0,
        };
        // Unsigned
        let lhs = bytes_to_hex_str(&tx.encode().unwrap());
        let rhs = "e88085e8d4a510008227109413978aee95f38490e9769c39b2773ed763d9cd5f872386f26fc1000080";
        assert_eq!(lhs, rhs);

        // Signed
        let key: PrivateKey = "c85ef7d79691fe79573b1a7064c19c1a9819ebdbd1faaab1a8ec92344438aaf4"
            .parse()
            .unwrap();
        let signed_tx = tx.sign(&key).unwrap();

        let lhs = bytes_to_hex_str(&signed_tx.encode());
        let rhs = "f86b8085e8d4a510008227109413978aee95f38490e9769c39b2773ed763d9cd5f872386f26fc10000801ba0eab47c1a49bf2fe5d40e01d313900e19ca485867d462fe06e139e3a536c6d4f4a014a569d327dcda4b29f74f93c0e9729d2f49ad726e703f9cd90dbb0fbf6649f1";
        assert_eq!(lhs, rhs);
        assert_eq!(signed_tx.recover_sender().unwrap(), key.to_address());
    }

    #[test]
    fn test_basictests_txtest_2() {
        // https://github.com/ethereum/tests/blob/b44cea1cccf1e4b63a05d1ca9f70f2063f28da6d/BasicTests/txtest.json
        let tx = UnsignedTransaction {
            nonce: "0".parse().unwrap(),
            gas_price: "1000000000000".parse().unwrap(),
            gas_limit: "10000".parse().unwrap(),
            to: None,
            value: "0".parse().unwrap(),
            data: hex_str_to_bytes("6025515b525b600a37f260003556601b596020356000355760015b525b54602052f260255860005b525b54602052f2").unwrap(),
            chain_id: 0,
        };
        let lhs = bytes_to_hex_str(&tx.encode().unwrap());
        let rhs = "f83c8085e8d4a510008227108080af6025515b525b600a37f260003556601b596020356000355760015b525b54602052f260255860005b525b54602052f2";
        assert_eq!(lhs, rhs);

        let key: PrivateKey = "c87f65ff3f271bf5dc8643484f66b200109caffe4bf98c4cb393dc35740b28c0"
            .parse()
            .unwrap();
        let signed_tx = tx.sign(&key).unwrap();

        let lhs = bytes_to_hex_str(signed_tx.raw_bytes());
        let rhs = "f87f8085e8d4a510008227108080af6025515b525b600a37f260003556601b596020356000355760015b525b54602052f260255860005b525b54602052f21ca05afed0244d0da90b67cf8979b0f246432a5112c0d31e8d5eedd2bc17b171c694a044efca37cb9883d1ee7a47236f3592df152931a930566933de2dc6e341c11426";
        assert_eq!(lhs, rhs);

        // 3 zero bytes and 44 non zero bytes of init code
        assert_eq!(
            tx.intrinsic_gas(),
            Uint256::from(21000u32 + 32000 + 3 * 4 + 44 * 16)
        );
    }

    #[test]
    fn test_vitaliks_eip_158_vitalik_12_json() {
        // https://github.com/ethereum/tests/blob/69f55e8608126e6470c2888a5b344c93c1550f40/TransactionTests/ttEip155VitaliksEip158/Vitalik_12.json
        let tx = UnsignedTransaction {
            nonce: Uint256::from_str_radix("0e", 16).unwrap(),
            gas_price: Uint256::from_str_radix("00", 16).unwrap(),
            gas_limit: Uint256::from_str_radix("0493e0", 16).unwrap(),
            to: None,
            value: Uint256::from_str_radix("00", 16).unwrap(),
            data: hex_str_to_bytes("60f2ff61000080610011600039610011565b6000f3").unwrap(),
            chain_id: 0,
        };
        let sig = Signature::new(
            28,
            Uint256::from_str_radix(
                "a310f4d0b26207db76ba4e1e6e7cf1857ee3aa8559bcbc399a6b09bfea2d30b4",
                16,
            )
            .unwrap(),
            Uint256::from_str_radix(
                "6dff38c645a1486651a717ddf3daccb4fd9a630871ecea0758ddfcf2774f9bc6",
                16,
            )
            .unwrap(),
        );
        let signed = SignedTransaction::new(tx, sig).unwrap();

        let lhs = bytes_to_hex_str(signed.raw_bytes());
        let rhs = "f8610e80830493e080809560f2ff61000080610011600039610011565b6000f31ca0a310f4d0b26207db76ba4e1e6e7cf1857ee3aa8559bcbc399a6b09bfea2d30b4a06dff38c645a1486651a717ddf3daccb4fd9a630871ecea0758ddfcf2774f9bc6";
        assert_eq!(lhs, rhs);

        assert_eq!(
            bytes_to_hex_str(signed.recover_sender().unwrap().as_bytes()),
            "874b54a8bd152966d63f706bae1ffeb0411921e5"
        );
        assert_eq!(
            Transaction::decode(&hex_str_to_bytes(rhs).unwrap()).unwrap(),
            Transaction::Signed(signed)
        );
    }

    #[test]
    fn test_vitaliks_eip_158_vitalik_1_json() {
        // https://github.com/ethereum/tests/blob/69f55e8608126e6470c2888a5b344c93c1550f40/TransactionTests/ttEip155VitaliksEip158/Vitalik_1.json
        let rhs = "f864808504a817c800825208943535353535353535353535353535353535353535808025a0044852b2a670ade5407e78fb2863c51de9fcb96542a07186fe3aeda6bb8a116da0044852b2a670ade5407e78fb2863c51de9fcb96542a07186fe3aeda6bb8a116d";
        let bytes = hex_str_to_bytes(rhs).unwrap();
        let tx = match Transaction::decode(&bytes).unwrap() {
            Transaction::Signed(tx) => tx,
            Transaction::Unsigned(_) => panic!("Expected a signed transaction"),
        };
        assert_eq!(tx.chain_id(), 1);
        assert_eq!(tx.signature().v, 37);
        assert_eq!(
            tx.transaction().gas_price,
            Uint256::from_str_radix("04a817c800", 16).unwrap()
        );
        assert_eq!(tx.raw_bytes(), &bytes[..]);
        assert_eq!(
            bytes_to_hex_str(tx.recover_sender().unwrap().as_bytes()),
            "f0f6f18bca1b28cd68e4357452947e021241e9ce"
        );
        assert_eq!(
            Transaction::recover_raw(&bytes).unwrap(),
            tx.recover_sender().unwrap()
        );
    }

    #[test]
    fn test_decode_zero_byte_data_legacy_tx() {
        let bytes = "0xf87c80018261a894095e7baea6a6c7c4c2dfeb977efac326af552d870a9d00000000000000000000000000000000000000000000000000000000001ba048b55bfa915ac795c431978d8a6a992b628d557da5ff759b307d495a36649353a01fffd310ac743f371de3b9f7f9cb56c0b28ad43601b4ab949f53faa07bd2c804";
        let bytes = hex_str_to_bytes(bytes).unwrap();
        let tx = Transaction::decode(&bytes).unwrap();
        assert_eq!(tx.unsigned().data, vec![0u8; 29]);
        assert_eq!(tx.unsigned().chain_id, 0);
        assert_eq!(tx.encode().unwrap(), bytes);
    }

    #[test]
    fn decode_simple_tx() {
        let bytes = "0xd1808609184e72a00082f3888080801b2c04";
        let bytes = hex_str_to_bytes(bytes).unwrap();
        let tx = Transaction::decode(&bytes).unwrap();
        assert!(tx.is_signed());
        assert_eq!(tx.unsigned().to, None);
        assert_eq!(tx.signature().unwrap().r, 0x2cu8.into());
    }

    #[test]
    fn decode_unsigned_forms() {
        let mut tx = scenario_tx();
        tx.chain_id = 0;
        let six = tx.encode().unwrap();
        assert_eq!(Transaction::decode(&six).unwrap(), Transaction::Unsigned(tx.clone()));

        tx.chain_id = 1337;
        let nine = tx.encode().unwrap();
        assert_eq!(Transaction::decode(&nine).unwrap(), Transaction::Unsigned(tx));
        assert!(matches!(
            Transaction::recover_raw(&nine),
            Err(Error::NoSignature)
        ));
    }

    #[test]
    fn decode_rejections() {
        let signed = scenario_tx().sign(&scenario_key()).unwrap();
        let bytes = signed.encode();

        // truncated
        for len in 0..bytes.len() {
            let err = Transaction::decode(&bytes[..len]).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Decoding);
        }

        // trailing garbage
        let mut extra = bytes.clone();
        extra.push(0x00);
        assert!(matches!(
            Transaction::decode(&extra),
            Err(Error::TrailingBytes { extra: 1 })
        ));

        // wrong number of fields
        let seven = pack_rlp(&[RlpToken::List(vec![RlpToken::String(Vec::new()); 7])]);
        assert!(matches!(
            Transaction::decode(&seven),
            Err(Error::InvalidFieldCount { got: 7 })
        ));

        // not a list
        assert_eq!(
            Transaction::decode(&[0x80]).unwrap_err().kind(),
            ErrorKind::Decoding
        );
    }

    #[test]
    fn decode_rejects_bad_fields() {
        let mut fields = scenario_tx().rlp_fields();
        fields.push(RlpToken::String(vec![30]));
        fields.push(RlpToken::String(vec![1]));
        fields.push(RlpToken::String(vec![1]));
        let bytes = pack_rlp(&[RlpToken::List(fields.clone())]);
        assert!(matches!(
            Transaction::decode(&bytes),
            Err(Error::UnrecognizedV(30))
        ));

        // leading zero in the nonce
        let mut bad_nonce = fields.clone();
        bad_nonce[0] = RlpToken::String(vec![0, 1]);
        bad_nonce[6] = RlpToken::String(vec![27]);
        let bytes = pack_rlp(&[RlpToken::List(bad_nonce)]);
        assert!(matches!(
            Transaction::decode(&bytes),
            Err(Error::NonCanonicalInteger { field: "nonce" })
        ));

        // 19 byte address
        let mut bad_to = fields.clone();
        bad_to[3] = RlpToken::String(vec![0x11; 19]);
        bad_to[6] = RlpToken::String(vec![27]);
        let bytes = pack_rlp(&[RlpToken::List(bad_to)]);
        assert_eq!(
            Transaction::decode(&bytes).unwrap_err().kind(),
            ErrorKind::Decoding
        );

        // chain id 0 can not be replay protected
        for v in [35u8, 36] {
            let mut chain_zero = fields.clone();
            chain_zero[6] = RlpToken::String(vec![v]);
            let bytes = pack_rlp(&[RlpToken::List(chain_zero)]);
            assert!(matches!(
                Transaction::decode(&bytes),
                Err(Error::UnrecognizedV(found)) if found == u64::from(v)
            ));
            assert_eq!(
                Transaction::recover_raw(&bytes).unwrap_err().kind(),
                ErrorKind::Decoding
            );
        }

        // nonce of 2^64 - 1 is not allowed
        let mut big_nonce = fields;
        big_nonce[0] = RlpToken::String(vec![0xff; 8]);
        big_nonce[6] = RlpToken::String(vec![27]);
        let bytes = pack_rlp(&[RlpToken::List(big_nonce)]);
        assert_eq!(
            Transaction::decode(&bytes).unwrap_err().kind(),
            ErrorKind::Decoding
        );
    }

    #[test]
    fn encode_rejects_overflow() {
        let mut tx = scenario_tx();
        tx.nonce = u64::MAX.into();
        assert!(matches!(
            tx.encode(),
            Err(Error::FieldOverflow { field: "nonce" })
        ));

        let mut tx = scenario_tx();
        tx.gas_limit = Uint256::from(u64::MAX) + Uint256::from(1u8);
        assert_eq!(tx.encode().unwrap_err().kind(), ErrorKind::Encoding);

        let mut tx = scenario_tx();
        tx.chain_id = MAX_CHAIN_ID;
        assert!(matches!(tx.encode(), Err(Error::InvalidChainId(_))));
        assert!(tx.sign(&scenario_key()).is_err());

        tx.chain_id = MAX_CHAIN_ID - 1;
        let signed = tx.sign(&scenario_key()).unwrap();
        assert_eq!(signed.recover_sender().unwrap(), scenario_key().to_address());
    }

    #[test]
    fn invalid_key_bytes() {
        let tx = scenario_tx();
        let err = tx.sign_with_key_bytes([0u8; 32]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidKey);
        let err = tx.sign_with_key_bytes([0xff; 32]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidKey);
        let signed = tx.sign_with_key_bytes([0x46; 32]).unwrap();
        assert_eq!(
            signed.recover_sender().unwrap(),
            PrivateKey::from_bytes([0x46; 32]).unwrap().to_address()
        );
    }

    #[test]
    fn signature_must_match_chain() {
        let signed = scenario_tx().sign(&scenario_key()).unwrap();
        let (mut tx, sig) = signed.into_parts();
        tx.chain_id = 2;
        assert!(matches!(
            SignedTransaction::new(tx.clone(), sig),
            Err(Error::InvalidV)
        ));
        tx.chain_id = 0;
        assert!(matches!(
            SignedTransaction::new(tx.clone(), sig),
            Err(Error::InvalidV)
        ));

        // a replay protected v for chain id 0 is not an alias of 27/28
        let unprotected = tx.sign(&scenario_key()).unwrap();
        let sig = *unprotected.signature();
        for v in [35u64, 36] {
            let aliased = Signature::new(v, sig.r, sig.s);
            assert!(matches!(
                SignedTransaction::new(tx.clone(), aliased),
                Err(Error::InvalidV)
            ));
        }
    }

    #[test]
    fn recover_rejects_bad_signature_values() {
        let tx = scenario_tx();
        let sig = Signature::new(37, Uint256::zero(), 1u8.into());
        let signed = SignedTransaction::new(tx.clone(), sig).unwrap();
        assert_eq!(
            signed.recover_sender().unwrap_err().kind(),
            ErrorKind::InvalidSignature
        );
        let sig = Signature::new(37, 1u8.into(), crate::constants::secpk1n());
        let signed = SignedTransaction::new(tx, sig).unwrap();
        assert!(matches!(signed.recover_sender(), Err(Error::InvalidS)));
    }

    #[test]
    fn intrinsic_gas() {
        let mut tx = scenario_tx();
        assert_eq!(tx.intrinsic_gas(), 21000u32.into());
        tx.data = vec![0, 1, 0, 2];
        assert_eq!(tx.intrinsic_gas(), (21000u32 + 2 * 4 + 2 * 16).into());
    }

    #[test]
    fn serde_as_hex_string() {
        let signed = scenario_tx().sign(&scenario_key()).unwrap();
        let j = serde_json::to_string(&signed).unwrap();
        assert_eq!(j, format!("\"{signed}\""));
        let back: SignedTransaction = serde_json::from_str(&j).unwrap();
        assert_eq!(back, signed);
        let unsigned = format!("\"0x{}\"", bytes_to_hex_str(&scenario_tx().encode().unwrap()));
        assert!(serde_json::from_str::<SignedTransaction>(&unsigned).is_err());
    }

    #[test]
    fn fuzz_transaction_decode() {
        let start = Instant::now();
        let mut rng = thread_rng();
        while Instant::now() - start < FUZZ_TIME {
            let transaction_bytes = get_fuzz_bytes(&mut rng);

            // anything that decodes has to be canonical
            if let Ok(tx) = Transaction::decode(&transaction_bytes) {
                assert_eq!(tx.encode().unwrap(), transaction_bytes);
            }
        }
    }
}
