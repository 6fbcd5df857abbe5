//! Conversion between wei and the named Ether denominations
use crate::error::Error;
use num256::Uint256;
use std::fmt;
use std::str::FromStr;

/// Ether denominations, each one is `10^decimals` wei
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Unit {
    Wei,
    Kwei,
    Mwei,
    Gwei,
    Szabo,
    Finney,
    Ether,
}

impl Unit {
    /// Power of ten this unit is worth in wei
    pub fn decimals(&self) -> usize {
        match self {
            Unit::Wei => 0,
            Unit::Kwei => 3,
            Unit::Mwei => 6,
            Unit::Gwei => 9,
            Unit::Szabo => 12,
            Unit::Finney => 15,
            Unit::Ether => 18,
        }
    }
}

impl FromStr for Unit {
    type Err = Error;

    /// Accepts the unit names and their common aliases, case insensitive
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "wei" => Ok(Unit::Wei),
            "kwei" | "babbage" | "femtoether" => Ok(Unit::Kwei),
            "mwei" | "lovelace" | "picoether" => Ok(Unit::Mwei),
            "gwei" | "shannon" | "nanoether" | "nano" => Ok(Unit::Gwei),
            "szabo" | "microether" | "micro" => Ok(Unit::Szabo),
            "finney" | "milliether" | "milli" => Ok(Unit::Finney),
            "ether" => Ok(Unit::Ether),
            _ => Err(Error::InvalidUnit(s.to_string())),
        }
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            Unit::Wei => "wei",
            Unit::Kwei => "kwei",
            Unit::Mwei => "mwei",
            Unit::Gwei => "gwei",
            Unit::Szabo => "szabo",
            Unit::Finney => "finney",
            Unit::Ether => "ether",
        };
        write!(f, "{name}")
    }
}

/// Converts a decimal amount of `unit` into wei.
///
/// The amount may have a fractional part with at most as many digits as the
/// unit has decimals, anything finer than a wei is an error.
///
/// ```rust
/// # use ethtx::units::{to_wei, Unit};
/// assert_eq!(to_wei("1.5", Unit::Gwei).unwrap(), 1_500_000_000u64.into());
/// ```
pub fn to_wei(amount: &str, unit: Unit) -> Result<Uint256, Error> {
    let invalid = || Error::InvalidAmount(amount.to_string());
    let (integer, fraction) = match amount.split_once('.') {
        Some((integer, fraction)) => (integer, fraction),
        None => (amount, ""),
    };
    if integer.is_empty() && fraction.is_empty() {
        return Err(invalid());
    }
    if !integer.chars().chain(fraction.chars()).all(|c| c.is_ascii_digit()) {
        return Err(invalid());
    }
    if fraction.len() > unit.decimals() {
        return Err(invalid());
    }

    let mut digits = String::with_capacity(integer.len() + unit.decimals());
    digits.push_str(integer);
    digits.push_str(fraction);
    digits.extend(std::iter::repeat('0').take(unit.decimals() - fraction.len()));
    let digits = digits.trim_start_matches('0');
    if digits.is_empty() {
        return Ok(0u8.into());
    }
    // 2^256 has 78 decimal digits
    if digits.len() > 78 {
        return Err(invalid());
    }
    Uint256::from_str(digits).map_err(|_| invalid())
}

/// Converts wei into a decimal amount of `unit`, trailing zeros of the
/// fractional part are dropped.
///
/// ```rust
/// # use ethtx::units::{from_wei, Unit};
/// assert_eq!(from_wei(1u8.into(), Unit::Ether), "0.000000000000000001");
/// ```
pub fn from_wei(amount: Uint256, unit: Unit) -> String {
    let digits = amount.to_string();
    let decimals = unit.decimals();
    if decimals == 0 {
        return digits;
    }
    let digits = if digits.len() <= decimals {
        format!("{}{}", "0".repeat(decimals + 1 - digits.len()), digits)
    } else {
        digits
    };
    let (integer, fraction) = digits.split_at(digits.len() - decimals);
    let fraction = fraction.trim_end_matches('0');
    if fraction.is_empty() {
        integer.to_string()
    } else {
        format!("{integer}.{fraction}")
    }
}
