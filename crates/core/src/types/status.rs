//! Status enums for various entities.

use serde::{Deserialize, Serialize};

/// Implements `as_str`, `label`, `Display` and `FromStr` for a unit enum whose
/// serde representation is `snake_case`.
macro_rules! string_enum {
    ($name:ident, $err:literal, { $($variant:ident => ($slug:literal, $label:literal)),+ $(,)? }) => {
        impl $name {
            /// Every variant in display order.
            pub const ALL: &'static [Self] = &[$(Self::$variant),+];

            /// Machine value used in URLs, forms and the data file.
            #[must_use]
            pub const fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $slug),+
                }
            }

            /// Human-readable label.
            #[must_use]
            pub const fn label(&self) -> &'static str {
                match self {
                    $(Self::$variant => $label),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($slug => Ok(Self::$variant),)+
                    _ => Err(format!(concat!("invalid ", $err, ": {}"), s)),
                }
            }
        }
    };
}

/// Order lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[default]
    Pending,
    Confirmed,
    Processing,
    Shipped,
    OutForDelivery,
    Delivered,
    Cancelled,
    Returned,
}

string_enum!(OrderStatus, "order status", {
    Pending => ("pending", "Pending"),
    Confirmed => ("confirmed", "Confirmed"),
    Processing => ("processing", "Processing"),
    Shipped => ("shipped", "Shipped"),
    OutForDelivery => ("out_for_delivery", "Out for Delivery"),
    Delivered => ("delivered", "Delivered"),
    Cancelled => ("cancelled", "Cancelled"),
    Returned => ("returned", "Returned"),
});

impl OrderStatus {
    /// Statuses this one may move to.
    #[must_use]
    pub const fn next_statuses(&self) -> &'static [Self] {
        match self {
            Self::Pending => &[Self::Confirmed, Self::Cancelled],
            Self::Confirmed => &[Self::Processing, Self::Cancelled],
            Self::Processing => &[Self::Shipped, Self::Cancelled],
            Self::Shipped => &[Self::OutForDelivery, Self::Delivered],
            Self::OutForDelivery => &[Self::Delivered],
            Self::Delivered => &[Self::Returned],
            Self::Cancelled | Self::Returned => &[],
        }
    }

    #[must_use]
    pub fn can_transition_to(&self, next: Self) -> bool {
        self.next_statuses().contains(&next)
    }

    /// Customers may cancel until the parcel leaves the warehouse.
    #[must_use]
    pub const fn is_cancellable(&self) -> bool {
        matches!(self, Self::Pending | Self::Confirmed | Self::Processing)
    }

    /// Cancelled and returned orders carry no revenue.
    #[must_use]
    pub const fn counts_as_revenue(&self) -> bool {
        !matches!(self, Self::Cancelled | Self::Returned)
    }

    /// Badge colour class used by both UIs.
    #[must_use]
    pub const fn badge_class(&self) -> &'static str {
        match self {
            Self::Pending => "badge-warning",
            Self::Confirmed | Self::Processing => "badge-info",
            Self::Shipped | Self::OutForDelivery => "badge-primary",
            Self::Delivered => "badge-success",
            Self::Cancelled | Self::Returned => "badge-danger",
        }
    }
}

/// Payment status of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    #[default]
    Pending,
    Paid,
    Failed,
    Refunded,
}

string_enum!(PaymentStatus, "payment status", {
    Pending => ("pending", "Pending"),
    Paid => ("paid", "Paid"),
    Failed => ("failed", "Failed"),
    Refunded => ("refunded", "Refunded"),
});

/// How the customer pays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Upi,
    Card,
    #[serde(rename = "netbanking")]
    NetBanking,
    Wallet,
    Cod,
}

string_enum!(PaymentMethod, "payment method", {
    Upi => ("upi", "UPI"),
    Card => ("card", "Credit / Debit Card"),
    NetBanking => ("netbanking", "Net Banking"),
    Wallet => ("wallet", "Wallet"),
    Cod => ("cod", "Cash on Delivery"),
});

impl PaymentMethod {
    /// Whether the payment is collected before the order ships.
    #[must_use]
    pub const fn is_prepaid(&self) -> bool {
        !matches!(self, Self::Cod)
    }
}

/// Customer role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    #[default]
    User,
    Admin,
}

string_enum!(UserRole, "user role", {
    User => ("user", "Customer"),
    Admin => ("admin", "Admin"),
});

/// Whether a customer account may sign in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CustomerStatus {
    #[default]
    Active,
    Inactive,
}

string_enum!(CustomerStatus, "customer status", {
    Active => ("active", "Active"),
    Inactive => ("inactive", "Inactive"),
});

/// Address label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AddressType {
    #[default]
    Home,
    Work,
    Other,
}

string_enum!(AddressType, "address type", {
    Home => ("home", "Home"),
    Work => ("work", "Work"),
    Other => ("other", "Other"),
});

/// Inventory bucket derived from a stock count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StockLevel {
    InStock,
    LowStock,
    OutOfStock,
}

string_enum!(StockLevel, "stock level", {
    InStock => ("in_stock", "In Stock"),
    LowStock => ("low_stock", "Low Stock"),
    OutOfStock => ("out_of_stock", "Out of Stock"),
});

impl StockLevel {
    #[must_use]
    pub const fn from_stock(stock: u32, low_threshold: u32) -> Self {
        if stock == 0 {
            Self::OutOfStock
        } else if stock < low_threshold {
            Self::LowStock
        } else {
            Self::InStock
        }
    }
}

/// Colour scheme preference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

string_enum!(Theme, "theme", {
    Light => ("light", "Light"),
    Dark => ("dark", "Dark"),
});

impl Theme {
    #[must_use]
    pub const fn toggled(self) -> Self {
        match self {
            Self::Light => Self::Dark,
            Self::Dark => Self::Light,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_order_status_transitions() {
        assert!(OrderStatus::Pending.can_transition_to(OrderStatus::Confirmed));
        assert!(OrderStatus::Processing.can_transition_to(OrderStatus::Shipped));
        assert!(OrderStatus::Shipped.can_transition_to(OrderStatus::Delivered));
        assert!(OrderStatus::Delivered.can_transition_to(OrderStatus::Returned));

        assert!(!OrderStatus::Pending.can_transition_to(OrderStatus::Shipped));
        assert!(!OrderStatus::Shipped.can_transition_to(OrderStatus::Cancelled));
        assert!(!OrderStatus::Cancelled.can_transition_to(OrderStatus::Pending));
        assert!(OrderStatus::Returned.next_statuses().is_empty());
    }

    #[test]
    fn test_order_status_roundtrip() {
        for status in OrderStatus::ALL {
            assert_eq!(status.as_str().parse::<OrderStatus>().unwrap(), *status);
        }
        let json = serde_json::to_string(&OrderStatus::OutForDelivery).unwrap();
        assert_eq!(json, "\"out_for_delivery\"");
    }

    #[test]
    fn test_payment_method_serde_matches_as_str() {
        for method in PaymentMethod::ALL {
            let json = serde_json::to_string(method).unwrap();
            assert_eq!(json, format!("\"{}\"", method.as_str()));
        }
    }

    #[test]
    fn test_parse_invalid() {
        assert!("razorpay".parse::<PaymentMethod>().is_err());
    }

    #[test]
    fn test_stock_level() {
        assert_eq!(StockLevel::from_stock(0, 20), StockLevel::OutOfStock);
        assert_eq!(StockLevel::from_stock(19, 20), StockLevel::LowStock);
        assert_eq!(StockLevel::from_stock(20, 20), StockLevel::InStock);
    }

    #[test]
    fn test_cod_is_not_prepaid() {
        assert!(!PaymentMethod::Cod.is_prepaid());
        assert!(PaymentMethod::Upi.is_prepaid());
    }
}
