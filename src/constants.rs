use num256::Uint256;
use std::str::FromStr;

/// Gas paid by every transaction
pub const GTXCOST: u32 = 21000;
/// Gas per zero byte of transaction data
pub const GTXDATAZERO: u32 = 4;
/// Gas per non zero byte of transaction data (EIP-2028)
pub const GTXDATANONZERO: u32 = 16;
/// Extra gas paid by contract creation transactions
pub const GTXCONTRACTCREATION: u32 = 32000;

/// Largest chain id that can be folded into an EIP-155 `v` value, 1 <= id < 2**63 - 18
pub const MAX_CHAIN_ID: u64 = 9_223_372_036_854_775_790;

/// Nonces must stay below 2**64 - 1 (EIP-2681)
pub const MAX_NONCE: u64 = u64::MAX - 1;

/// Order of the secp256k1 curve group
pub fn secpk1n() -> Uint256 {
    Uint256::from_str(
        "115792089237316195423570985008687907852837564279074904382605163141518161494337",
    )
    .unwrap()
}

/// Half the secp256k1 group order, the largest `s` a canonical signature may carry
pub fn secpk1n_half() -> Uint256 {
    Uint256::from_str(
        "57896044618658097711785492504343953926418782139537452191302581570759080747168",
    )
    .unwrap()
}

#[test]
fn half_order_is_half() {
    assert_eq!(secpk1n_half() + secpk1n_half() + Uint256::from(1u8), secpk1n());
}
