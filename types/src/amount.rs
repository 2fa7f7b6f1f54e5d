//! Amount types for the native coin and registered tokens.
//!
//! Native amounts are fixed-point `i64` values with eight decimal places.
//! Token amounts are unsigned 256-bit integers scaled to eighteen decimal
//! places. Fee computations mix positive and negative results across both
//! domains, so they are carried as [`SignedAmount`].

use primitive_types::U256;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::ops::{Add, Neg, Sub};

/// Decimal places of the native asset.
pub const NATIVE_PRECISION: u8 = 8;
/// Decimal places of the internal token representation.
pub const TOKEN_PRECISION: u8 = 18;

/// Raw token value, scaled to [`TOKEN_PRECISION`] decimals.
pub type TokenValue = U256;

/// Native-asset amount in 10^-8 units.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Fixed64(i64);

impl Fixed64 {
    pub const ZERO: Self = Self(0);
    /// One whole coin.
    pub const ONE: Self = Self(100_000_000);

    pub fn new(raw: i64) -> Self {
        Self(raw)
    }

    /// Whole coins, without fractional part.
    pub fn from_coins(coins: i64) -> Option<Self> {
        coins.checked_mul(Self::ONE.0).map(Self)
    }

    pub fn raw(&self) -> i64 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    pub fn is_positive(&self) -> bool {
        self.0 > 0
    }

    pub fn checked_add(self, other: Self) -> Option<Self> {
        self.0.checked_add(other.0).map(Self)
    }

    pub fn checked_sub(self, other: Self) -> Option<Self> {
        self.0.checked_sub(other.0).map(Self)
    }
}

impl Add for Fixed64 {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl Sub for Fixed64 {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Self(self.0 - rhs.0)
    }
}

impl fmt::Display for Fixed64 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let digits = self.0.unsigned_abs().to_string();
        f.write_str(&format_scaled(&digits, self.0 < 0, NATIVE_PRECISION))
    }
}

/// Render a raw token value with eighteen decimal places.
pub fn token_string(value: &TokenValue) -> String {
    format_scaled(&value.to_string(), false, TOKEN_PRECISION)
}

/// Insert a decimal point `decimals` places from the right of a digit string.
fn format_scaled(digits: &str, negative: bool, decimals: u8) -> String {
    let decimals = decimals as usize;
    let padded = if digits.len() <= decimals {
        format!("{}{}", "0".repeat(decimals + 1 - digits.len()), digits)
    } else {
        digits.to_string()
    };
    let (whole, frac) = padded.split_at(padded.len() - decimals);
    let sign = if negative { "-" } else { "" };
    if decimals == 0 {
        format!("{sign}{whole}")
    } else {
        format!("{sign}{whole}.{frac}")
    }
}

/// A signed amount in either domain: native (10^-8) or token (10^-18).
///
/// The domain is implied by the asset the amount belongs to. Zero is always
/// non-negative.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SignedAmount {
    negative: bool,
    magnitude: U256,
}

impl SignedAmount {
    pub const ZERO: Self = Self {
        negative: false,
        magnitude: U256([0; 4]),
    };

    pub fn positive(magnitude: U256) -> Self {
        Self {
            negative: false,
            magnitude,
        }
    }

    pub fn negative(magnitude: U256) -> Self {
        Self {
            negative: !magnitude.is_zero(),
            magnitude,
        }
    }

    pub fn from_fixed64(value: Fixed64) -> Self {
        let magnitude = U256::from(value.raw().unsigned_abs());
        if value.raw() < 0 {
            Self::negative(magnitude)
        } else {
            Self::positive(magnitude)
        }
    }

    pub fn magnitude(&self) -> U256 {
        self.magnitude
    }

    pub fn is_negative(&self) -> bool {
        self.negative
    }

    pub fn is_zero(&self) -> bool {
        self.magnitude.is_zero()
    }

    pub fn is_positive(&self) -> bool {
        !self.negative && !self.magnitude.is_zero()
    }

    /// Convert back to the native domain, if it fits.
    pub fn to_fixed64(&self) -> Option<Fixed64> {
        if self.magnitude > U256::from(i64::MAX as u64) {
            return None;
        }
        let raw = self.magnitude.low_u64() as i64;
        Some(Fixed64::new(if self.negative { -raw } else { raw }))
    }

    pub fn checked_add(self, other: Self) -> Option<Self> {
        if self.negative == other.negative {
            let magnitude = self.magnitude.checked_add(other.magnitude)?;
            return Some(Self {
                negative: self.negative && !magnitude.is_zero(),
                magnitude,
            });
        }
        // Opposite signs: subtract the smaller magnitude from the larger.
        let (larger, smaller) = if self.magnitude >= other.magnitude {
            (self, other)
        } else {
            (other, self)
        };
        let magnitude = larger.magnitude - smaller.magnitude;
        Some(Self {
            negative: larger.negative && !magnitude.is_zero(),
            magnitude,
        })
    }

    pub fn checked_sub(self, other: Self) -> Option<Self> {
        self.checked_add(-other)
    }
}

impl Neg for SignedAmount {
    type Output = Self;
    fn neg(self) -> Self {
        Self {
            negative: !self.negative && !self.magnitude.is_zero(),
            magnitude: self.magnitude,
        }
    }
}

impl From<Fixed64> for SignedAmount {
    fn from(value: Fixed64) -> Self {
        Self::from_fixed64(value)
    }
}

impl PartialOrd for SignedAmount {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SignedAmount {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.negative, other.negative) {
            (false, true) => Ordering::Greater,
            (true, false) => Ordering::Less,
            (false, false) => self.magnitude.cmp(&other.magnitude),
            (true, true) => other.magnitude.cmp(&self.magnitude),
        }
    }
}

impl fmt::Display for SignedAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.negative {
            write!(f, "-{}", self.magnitude)
        } else {
            write!(f, "{}", self.magnitude)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed64_display_uses_eight_decimals() {
        assert_eq!(Fixed64::new(150_000_000).to_string(), "1.50000000");
        assert_eq!(Fixed64::new(1).to_string(), "0.00000001");
        assert_eq!(Fixed64::new(-25).to_string(), "-0.00000025");
    }

    #[test]
    fn token_string_uses_eighteen_decimals() {
        let value = U256::exp10(18) * U256::from(3u64);
        assert_eq!(token_string(&value), "3.000000000000000000");
        assert_eq!(token_string(&U256::from(5u64)), "0.000000000000000005");
    }

    #[test]
    fn signed_add_crosses_zero() {
        let a = SignedAmount::positive(U256::from(10u64));
        let b = SignedAmount::negative(U256::from(25u64));
        let sum = a.checked_add(b).unwrap();
        assert!(sum.is_negative());
        assert_eq!(sum.magnitude(), U256::from(15u64));
        let back = sum.checked_add(SignedAmount::positive(U256::from(15u64))).unwrap();
        assert_eq!(back, SignedAmount::ZERO);
        assert!(!back.is_negative());
    }

    #[test]
    fn signed_ordering() {
        let neg = SignedAmount::from_fixed64(Fixed64::new(-5));
        let small = SignedAmount::from_fixed64(Fixed64::new(3));
        let big = SignedAmount::from_fixed64(Fixed64::new(7));
        assert!(neg < SignedAmount::ZERO);
        assert!(small < big);
        assert!(SignedAmount::from_fixed64(Fixed64::new(-9)) < neg);
    }

    #[test]
    fn to_fixed64_round_trip() {
        let v = Fixed64::new(-123_456);
        assert_eq!(SignedAmount::from(v).to_fixed64(), Some(v));
        assert_eq!(SignedAmount::positive(U256::MAX).to_fixed64(), None);
    }
}
