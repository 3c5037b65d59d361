//! Coupon lookups.

use chrono::{DateTime, Utc};
use ttd_core::Price;
use ttd_core::coupon::{AppliedCoupon, Coupon, CouponError, apply_coupon};

use crate::{Store, StoreError};

/// Repository for coupon codes.
pub struct CouponRepository<'a> {
    store: &'a Store,
}

impl<'a> CouponRepository<'a> {
    #[must_use]
    pub const fn new(store: &'a Store) -> Self {
        Self { store }
    }

    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    pub async fn list(&self) -> Result<Vec<Coupon>, StoreError> {
        self.store.read(|d| d.coupons.clone()).await
    }

    /// Validate `code` against a subtotal.
    ///
    /// The outer result is the store; the inner one is the coupon verdict
    /// shown to the customer.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    pub async fn check(
        &self,
        code: &str,
        subtotal: Price,
        now: DateTime<Utc>,
    ) -> Result<Result<AppliedCoupon, CouponError>, StoreError> {
        self.store
            .read(|d| apply_coupon(&d.coupons, code, subtotal, now))
            .await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::seed::seed_data;

    #[tokio::test]
    async fn test_check_seeded_codes() {
        let now = Utc::now();
        let store = Store::in_memory(seed_data(now));
        let repo = CouponRepository::new(&store);

        let applied = repo
            .check("save10", Price::from_rupees(1_000), now)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(applied.code, "SAVE10");
        assert_eq!(applied.discount, Price::from_rupees(100));

        let expired = repo
            .check("MONSOON50", Price::from_rupees(5_000), now)
            .await
            .unwrap();
        assert_eq!(expired, Err(CouponError::Expired));

        let below = repo
            .check("FLAT200", Price::from_rupees(1_000), now)
            .await
            .unwrap();
        assert!(matches!(below, Err(CouponError::MinimumNotMet { .. })));
    }
}
