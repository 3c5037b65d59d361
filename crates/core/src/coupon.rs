//! Coupon codes and discount calculation.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::Price;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CouponKind {
    /// `value` is a percentage of the subtotal.
    Percentage,
    /// `value` is a flat rupee amount.
    Fixed,
}

/// Why a coupon could not be applied. Messages are shown to the customer.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CouponError {
    #[error("Please enter a valid coupon code.")]
    Empty,
    #[error("The coupon code you entered is invalid or expired.")]
    NotFound,
    #[error("This coupon is not active yet.")]
    NotYetValid,
    #[error("The coupon code you entered is invalid or expired.")]
    Expired,
    #[error("This coupon has reached its usage limit.")]
    UsageLimitReached,
    #[error("Minimum purchase of {minimum} required.")]
    MinimumNotMet { minimum: Price },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coupon {
    /// Canonical upper-case code.
    pub code: String,
    pub description: String,
    pub kind: CouponKind,
    pub value: Decimal,
    pub min_purchase: Price,
    pub max_discount: Option<Price>,
    pub valid_from: DateTime<Utc>,
    pub valid_to: DateTime<Utc>,
    /// `None` means unlimited.
    pub usage_limit: Option<u32>,
    pub used_count: u32,
}

impl Coupon {
    #[must_use]
    pub fn matches_code(&self, code: &str) -> bool {
        self.code.eq_ignore_ascii_case(code.trim())
    }

    /// Discount on `subtotal` ignoring eligibility rules. Never exceeds the
    /// subtotal.
    #[must_use]
    pub fn discount_for(&self, subtotal: Price) -> Price {
        let raw = match self.kind {
            CouponKind::Percentage => {
                let discount = subtotal.percent(self.value);
                self.max_discount.map_or(discount, |cap| discount.min(cap))
            }
            CouponKind::Fixed => Price::new(self.value),
        };
        raw.min(subtotal)
    }

    /// Check every eligibility rule and return the discount.
    ///
    /// # Errors
    ///
    /// Returns the first rule the coupon fails.
    pub fn validate(&self, subtotal: Price, now: DateTime<Utc>) -> Result<Price, CouponError> {
        if now < self.valid_from {
            return Err(CouponError::NotYetValid);
        }
        if now > self.valid_to {
            return Err(CouponError::Expired);
        }
        if self.usage_limit.is_some_and(|limit| self.used_count >= limit) {
            return Err(CouponError::UsageLimitReached);
        }
        if subtotal < self.min_purchase {
            return Err(CouponError::MinimumNotMet {
                minimum: self.min_purchase,
            });
        }
        Ok(self.discount_for(subtotal))
    }

    /// Short offer text such as "10% off up to ₹500" or "₹200 off".
    #[must_use]
    pub fn summary(&self) -> String {
        let headline = match self.kind {
            CouponKind::Percentage => format!("{}% off", self.value.normalize()),
            CouponKind::Fixed => format!("{} off", Price::new(self.value).display()),
        };
        match self.max_discount {
            Some(cap) => format!("{headline} up to {}", cap.display()),
            None => headline,
        }
    }
}

/// A coupon that passed validation for the current cart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedCoupon {
    pub code: String,
    pub discount: Price,
}

/// Look up `code` (case-insensitive) and validate it against `subtotal`.
///
/// # Errors
///
/// Returns [`CouponError::Empty`] for a blank code, [`CouponError::NotFound`]
/// for an unknown one, or the rule the coupon fails.
pub fn apply_coupon(
    coupons: &[Coupon],
    code: &str,
    subtotal: Price,
    now: DateTime<Utc>,
) -> Result<AppliedCoupon, CouponError> {
    if code.trim().is_empty() {
        return Err(CouponError::Empty);
    }
    let coupon = coupons
        .iter()
        .find(|c| c.matches_code(code))
        .ok_or(CouponError::NotFound)?;
    let discount = coupon.validate(subtotal, now)?;
    Ok(AppliedCoupon {
        code: coupon.code.clone(),
        discount,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::{Duration, TimeZone};

    use super::*;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
    }

    fn coupon(code: &str, kind: CouponKind, value: i64) -> Coupon {
        Coupon {
            code: code.to_owned(),
            description: String::new(),
            kind,
            value: Decimal::from(value),
            min_purchase: Price::ZERO,
            max_discount: None,
            valid_from: now() - Duration::days(30),
            valid_to: now() + Duration::days(30),
            usage_limit: None,
            used_count: 0,
        }
    }

    #[test]
    fn test_percentage_rounds() {
        let c = coupon("SAVE10", CouponKind::Percentage, 10);
        // 10% of 1999 = 199.9
        assert_eq!(
            c.discount_for(Price::from_rupees(1999)),
            Price::from_rupees(200)
        );
    }

    #[test]
    fn test_percentage_respects_cap() {
        let mut c = coupon("FIRST20", CouponKind::Percentage, 20);
        c.max_discount = Some(Price::from_rupees(500));
        assert_eq!(
            c.discount_for(Price::from_rupees(10_000)),
            Price::from_rupees(500)
        );
        assert_eq!(
            c.discount_for(Price::from_rupees(1_000)),
            Price::from_rupees(200)
        );
    }

    #[test]
    fn test_fixed_never_exceeds_subtotal() {
        let c = coupon("FLAT200", CouponKind::Fixed, 200);
        assert_eq!(
            c.discount_for(Price::from_rupees(150)),
            Price::from_rupees(150)
        );
    }

    #[test]
    fn test_code_match_is_case_insensitive() {
        let coupons = vec![coupon("SAVE10", CouponKind::Percentage, 10)];
        let applied = apply_coupon(&coupons, " save10 ", Price::from_rupees(1000), now()).unwrap();
        assert_eq!(applied.code, "SAVE10");
        assert_eq!(applied.discount, Price::from_rupees(100));
    }

    #[test]
    fn test_unknown_and_empty_codes() {
        let coupons = vec![coupon("SAVE10", CouponKind::Percentage, 10)];
        assert_eq!(
            apply_coupon(&coupons, "  ", Price::from_rupees(1000), now()),
            Err(CouponError::Empty)
        );
        assert_eq!(
            apply_coupon(&coupons, "NOPE", Price::from_rupees(1000), now()),
            Err(CouponError::NotFound)
        );
    }

    #[test]
    fn test_minimum_purchase() {
        let mut c = coupon("SHOPINDIA", CouponKind::Percentage, 15);
        c.min_purchase = Price::from_rupees(2000);
        let err = c.validate(Price::from_rupees(1999), now()).unwrap_err();
        assert_eq!(
            err,
            CouponError::MinimumNotMet {
                minimum: Price::from_rupees(2000)
            }
        );
        assert_eq!(err.to_string(), "Minimum purchase of ₹2,000 required.");
        assert!(c.validate(Price::from_rupees(2000), now()).is_ok());
    }

    #[test]
    fn test_validity_window_and_usage() {
        let mut c = coupon("SAVE10", CouponKind::Percentage, 10);
        c.valid_to = now() - Duration::days(1);
        assert_eq!(
            c.validate(Price::from_rupees(1000), now()),
            Err(CouponError::Expired)
        );

        let mut c = coupon("SAVE10", CouponKind::Percentage, 10);
        c.valid_from = now() + Duration::days(1);
        assert_eq!(
            c.validate(Price::from_rupees(1000), now()),
            Err(CouponError::NotYetValid)
        );

        let mut c = coupon("SAVE10", CouponKind::Percentage, 10);
        c.usage_limit = Some(5);
        c.used_count = 5;
        assert_eq!(
            c.validate(Price::from_rupees(1000), now()),
            Err(CouponError::UsageLimitReached)
        );
    }

    #[test]
    fn test_summary() {
        let mut c = coupon("FIRST20", CouponKind::Percentage, 20);
        c.max_discount = Some(Price::from_rupees(1000));
        assert_eq!(c.summary(), "20% off up to ₹1,000");
        assert_eq!(
            coupon("FLAT200", CouponKind::Fixed, 200).summary(),
            "₹200 off"
        );
    }
}
