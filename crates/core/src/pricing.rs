//! Cart pricing: subtotal, GST split, delivery fee and totals.
//!
//! All amounts are whole rupees after rounding. GST is charged on the
//! subtotal before any coupon; the discount comes off the grand total.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::cart::CartItem;
use crate::types::Price;

/// Tunable pricing parameters, editable from the admin settings page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingPolicy {
    /// GST percentage, e.g. `18`.
    pub gst_rate: Decimal,
    /// Orders at or above this subtotal ship free.
    pub free_delivery_threshold: Price,
    /// Flat delivery fee below the threshold.
    pub delivery_fee: Price,
    /// Seller's state. Shipping elsewhere is inter-state (IGST).
    pub home_state: String,
}

impl Default for PricingPolicy {
    fn default() -> Self {
        Self {
            gst_rate: Decimal::from(18),
            free_delivery_threshold: Price::from_rupees(500),
            delivery_fee: Price::from_rupees(49),
            home_state: "Maharashtra".to_owned(),
        }
    }
}

impl PricingPolicy {
    #[must_use]
    pub fn is_inter_state(&self, shipping_state: &str) -> bool {
        !shipping_state.trim().eq_ignore_ascii_case(self.home_state.trim())
    }

    /// GST on `amount` at the policy rate, rounded to rupees.
    #[must_use]
    pub fn gst(&self, amount: Price) -> Price {
        amount.percent(self.gst_rate)
    }

    /// Breakdown for `amount`. Without a shipping state the sale is treated
    /// as intra-state, which is how carts are shown before checkout.
    #[must_use]
    pub fn gst_breakdown(&self, amount: Price, shipping_state: Option<&str>) -> GstBreakdown {
        let total_gst = self.gst(amount);
        let inter_state = shipping_state.is_some_and(|s| self.is_inter_state(s));
        if inter_state {
            return GstBreakdown {
                taxable_amount: amount,
                cgst: Price::ZERO,
                sgst: Price::ZERO,
                igst: total_gst,
                total_gst,
            };
        }
        let cgst = Price::new(total_gst.amount() / Decimal::TWO).round_rupees();
        GstBreakdown {
            taxable_amount: amount,
            cgst,
            // SGST takes the remainder so the halves always add up.
            sgst: total_gst - cgst,
            igst: Price::ZERO,
            total_gst,
        }
    }

    /// Delivery charge for a subtotal. Empty carts pay nothing.
    #[must_use]
    pub fn delivery_charge(&self, subtotal: Price) -> Price {
        if subtotal.is_zero() || subtotal >= self.free_delivery_threshold {
            Price::ZERO
        } else {
            self.delivery_fee
        }
    }

    /// How much more the customer must add to qualify for free delivery.
    #[must_use]
    pub fn free_delivery_shortfall(&self, subtotal: Price) -> Option<Price> {
        (!subtotal.is_zero() && subtotal < self.free_delivery_threshold)
            .then(|| self.free_delivery_threshold - subtotal)
    }

    /// Price a set of cart items with an already-validated coupon discount.
    #[must_use]
    pub fn totals(
        &self,
        items: &[CartItem],
        discount: Price,
        shipping_state: Option<&str>,
    ) -> CartTotals {
        let subtotal: Price = items.iter().map(CartItem::line_total).sum();
        let item_count = items.iter().map(|i| i.quantity).sum();
        self.totals_for_subtotal(subtotal, item_count, discount, shipping_state)
    }

    #[must_use]
    pub fn totals_for_subtotal(
        &self,
        subtotal: Price,
        item_count: u32,
        discount: Price,
        shipping_state: Option<&str>,
    ) -> CartTotals {
        let gst = self.gst_breakdown(subtotal, shipping_state);
        let delivery_charge = self.delivery_charge(subtotal);
        let discount = discount.min(subtotal);
        let total = (subtotal + gst.total_gst + delivery_charge).saturating_sub(discount);
        CartTotals {
            item_count,
            subtotal,
            gst,
            delivery_charge,
            discount,
            total,
        }
    }
}

/// GST split for display on the cart, product and invoice pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GstBreakdown {
    pub taxable_amount: Price,
    pub cgst: Price,
    pub sgst: Price,
    pub igst: Price,
    pub total_gst: Price,
}

impl GstBreakdown {
    #[must_use]
    pub fn is_inter_state(&self) -> bool {
        !self.igst.is_zero()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartTotals {
    pub item_count: u32,
    pub subtotal: Price,
    pub gst: GstBreakdown,
    pub delivery_charge: Price,
    pub discount: Price,
    pub total: Price,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::test_support::product;

    fn item(price: i64, quantity: u32) -> CartItem {
        CartItem {
            product: product(1, "Thing", price, 100),
            quantity,
        }
    }

    #[test]
    fn test_gst_is_eighteen_percent_rounded() {
        let policy = PricingPolicy::default();
        assert_eq!(policy.gst(Price::from_rupees(1000)), Price::from_rupees(180));
        // 18% of 1299 = 233.82
        assert_eq!(policy.gst(Price::from_rupees(1299)), Price::from_rupees(234));
        // 18% of 25 = 4.5 rounds up
        assert_eq!(policy.gst(Price::from_rupees(25)), Price::from_rupees(5));
    }

    #[test]
    fn test_intra_state_split_sums_to_total() {
        let policy = PricingPolicy::default();
        // gst = 5, halves 3 + 2
        let gst = policy.gst_breakdown(Price::from_rupees(25), Some("Maharashtra"));
        assert_eq!(gst.cgst, Price::from_rupees(3));
        assert_eq!(gst.sgst, Price::from_rupees(2));
        assert_eq!(gst.cgst + gst.sgst, gst.total_gst);
        assert!(gst.igst.is_zero());
    }

    #[test]
    fn test_inter_state_uses_igst() {
        let policy = PricingPolicy::default();
        let gst = policy.gst_breakdown(Price::from_rupees(1000), Some("karnataka"));
        assert_eq!(gst.igst, Price::from_rupees(180));
        assert!(gst.cgst.is_zero());
        assert!(gst.is_inter_state());

        let same = policy.gst_breakdown(Price::from_rupees(1000), Some(" maharashtra "));
        assert!(!same.is_inter_state());
    }

    #[test]
    fn test_no_state_is_intra_state() {
        let policy = PricingPolicy::default();
        let gst = policy.gst_breakdown(Price::from_rupees(1000), None);
        assert_eq!(gst.cgst, Price::from_rupees(90));
        assert_eq!(gst.sgst, Price::from_rupees(90));
    }

    #[test]
    fn test_delivery_threshold() {
        let policy = PricingPolicy::default();
        assert_eq!(policy.delivery_charge(Price::ZERO), Price::ZERO);
        assert_eq!(
            policy.delivery_charge(Price::from_rupees(499)),
            Price::from_rupees(49)
        );
        assert_eq!(policy.delivery_charge(Price::from_rupees(500)), Price::ZERO);
        assert_eq!(
            policy.free_delivery_shortfall(Price::from_rupees(450)),
            Some(Price::from_rupees(50))
        );
        assert_eq!(policy.free_delivery_shortfall(Price::from_rupees(500)), None);
    }

    #[test]
    fn test_totals() {
        let policy = PricingPolicy::default();
        let items = vec![item(299, 1), item(100, 1)];
        let totals = policy.totals(&items, Price::from_rupees(40), None);
        assert_eq!(totals.item_count, 2);
        assert_eq!(totals.subtotal, Price::from_rupees(399));
        // 18% of 399 = 71.82
        assert_eq!(totals.gst.total_gst, Price::from_rupees(72));
        assert_eq!(totals.delivery_charge, Price::from_rupees(49));
        assert_eq!(totals.discount, Price::from_rupees(40));
        assert_eq!(totals.total, Price::from_rupees(399 + 72 + 49 - 40));
    }

    #[test]
    fn test_discount_capped_at_subtotal() {
        let policy = PricingPolicy::default();
        let totals = policy.totals(&[item(100, 1)], Price::from_rupees(500), None);
        assert_eq!(totals.discount, Price::from_rupees(100));
        assert_eq!(totals.total, Price::from_rupees(18 + 49));
    }

    #[test]
    fn test_empty_cart_is_free() {
        let policy = PricingPolicy::default();
        let totals = policy.totals(&[], Price::ZERO, None);
        assert_eq!(totals.total, Price::ZERO);
        assert_eq!(totals.item_count, 0);
    }

    #[test]
    fn test_custom_policy() {
        let policy = PricingPolicy {
            gst_rate: Decimal::from(12),
            free_delivery_threshold: Price::from_rupees(1000),
            delivery_fee: Price::from_rupees(99),
            home_state: "Karnataka".to_owned(),
        };
        let totals = policy.totals(&[item(500, 1)], Price::ZERO, Some("Karnataka"));
        assert_eq!(totals.gst.total_gst, Price::from_rupees(60));
        assert_eq!(totals.delivery_charge, Price::from_rupees(99));
        assert_eq!(totals.total, Price::from_rupees(659));
    }
}
