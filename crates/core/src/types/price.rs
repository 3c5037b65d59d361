//! Rupee amounts using decimal arithmetic.

use core::fmt;
use core::iter::Sum;
use core::ops::{Add, AddAssign, Sub};
use core::str::FromStr;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Errors from parsing a [`Price`] out of form input.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PriceError {
    #[error("Amount is required")]
    Empty,
    #[error("Enter a valid amount")]
    Invalid,
    #[error("Amount cannot be negative")]
    Negative,
    #[error("Amount cannot exceed ₹10,00,00,000")]
    TooLarge,
}

/// An amount in Indian Rupees.
///
/// Stored as a [`Decimal`] so that GST and percentage coupons never pick up
/// binary floating point error. Amounts shown to customers are whole
/// rupees, grouped the Indian way (`₹1,23,456`).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Price(Decimal);

impl Price {
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Largest amount accepted from form input (ten crore rupees).
    pub const MAX_INPUT: Self = Self(Decimal::from_parts(100_000_000, 0, 0, false, 0));

    #[must_use]
    pub const fn new(amount: Decimal) -> Self {
        Self(amount)
    }

    #[must_use]
    pub fn from_rupees(rupees: i64) -> Self {
        Self(Decimal::from(rupees))
    }

    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Round to whole rupees, half away from zero (`Math.round` for positives).
    #[must_use]
    pub fn round_rupees(self) -> Self {
        Self(
            self.0
                .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero),
        )
    }

    /// `self * rate`, rounded to whole rupees.
    #[must_use]
    pub fn apply_rate(self, rate: Decimal) -> Self {
        Self(self.0.checked_mul(rate).unwrap_or(Decimal::MAX)).round_rupees()
    }

    /// `self * percent / 100`, rounded to whole rupees.
    #[must_use]
    pub fn percent(self, percent: Decimal) -> Self {
        self.apply_rate(percent / Decimal::ONE_HUNDRED)
    }

    /// `self * quantity`, saturating at [`Decimal::MAX`].
    #[must_use]
    pub fn times(self, quantity: u32) -> Self {
        Self(
            self.0
                .checked_mul(Decimal::from(quantity))
                .unwrap_or(Decimal::MAX),
        )
    }

    /// Subtraction that floors at zero.
    #[must_use]
    pub fn saturating_sub(self, rhs: Self) -> Self {
        Self(
            self.0
                .checked_sub(rhs.0)
                .unwrap_or(Decimal::ZERO)
                .max(Decimal::ZERO),
        )
    }

    /// Whole-rupee value, for places that need an integer (charts, exports).
    #[must_use]
    pub fn whole_rupees(&self) -> i64 {
        self.round_rupees().0.to_i64().unwrap_or_default()
    }

    /// Format for display, e.g. `₹1,23,456`.
    #[must_use]
    pub fn display(&self) -> String {
        let rupees = self.whole_rupees();
        let sign = if rupees < 0 { "-" } else { "" };
        format!("{sign}₹{}", group_indian(rupees.unsigned_abs()))
    }

    /// Parse a form value such as `"1,299"`, `"₹499"` or `"49.50"`.
    ///
    /// # Errors
    ///
    /// Returns an error when the input is blank, not a number, negative or
    /// above [`Price::MAX_INPUT`].
    pub fn parse(s: &str) -> Result<Self, PriceError> {
        let cleaned: String = s
            .trim()
            .chars()
            .filter(|c| !matches!(c, ',' | '₹' | ' '))
            .collect();
        if cleaned.is_empty() {
            return Err(PriceError::Empty);
        }
        let amount = Decimal::from_str(&cleaned).map_err(|_| PriceError::Invalid)?;
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(PriceError::Negative);
        }
        if amount > Self::MAX_INPUT.0 {
            return Err(PriceError::TooLarge);
        }
        Ok(Self(amount))
    }
}

/// Group digits in the Indian numbering system: last three, then pairs.
fn group_indian(n: u64) -> String {
    let digits = n.to_string();
    if digits.len() <= 3 {
        return digits;
    }
    let (head, last_three) = digits.split_at(digits.len() - 3);
    let mut out = String::with_capacity(digits.len() + digits.len() / 2);
    for (i, c) in head.chars().enumerate() {
        if i > 0 && (head.len() - i) % 2 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out.push(',');
    out.push_str(last_three);
    out
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display())
    }
}

impl Add for Price {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0.checked_add(rhs.0).unwrap_or(Decimal::MAX))
    }
}

impl AddAssign for Price {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl Sub for Price {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self(self.0.checked_sub(rhs.0).unwrap_or(Decimal::MIN))
    }
}

impl Sum for Price {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

impl From<Decimal> for Price {
    fn from(amount: Decimal) -> Self {
        Self(amount)
    }
}
