//! Status enums for documents.
//!
//! Serialized spellings match the values stored in documents, so existing
//! data (`"out-of-stock"`, `"pending"`) deserializes without migration.

use serde::{Deserialize, Serialize};

/// Catalog status of a product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum ProductStatus {
    #[default]
    Active,
    OutOfStock,
    Discontinued,
}

impl ProductStatus {
    /// Status implied by a stock level, leaving discontinued products alone.
    #[must_use]
    pub const fn for_stock(self, stock: u32) -> Self {
        match self {
            Self::Discontinued => Self::Discontinued,
            _ if stock == 0 => Self::OutOfStock,
            _ => Self::Active,
        }
    }
}

/// Storefront customer account status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AccountStatus {
    #[default]
    Active,
    Suspended,
}

/// Checkout (order) lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[default]
    Pending,
    Completed,
    Cancelled,
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Completed => write!(f, "completed"),
            Self::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Checkout payment status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    #[default]
    Pending,
    Paid,
}

/// Admin role with different permission levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdminRole {
    /// Full access including staff invitations.
    SuperAdmin,
    /// Full access to store management features.
    Admin,
    /// Read-only access to store data.
    Viewer,
}

impl AdminRole {
    /// Whether this role may modify store data.
    #[must_use]
    pub const fn can_write(self) -> bool {
        matches!(self, Self::SuperAdmin | Self::Admin)
    }
}

impl std::fmt::Display for AdminRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SuperAdmin => write!(f, "super_admin"),
            Self::Admin => write!(f, "admin"),
            Self::Viewer => write!(f, "viewer"),
        }
    }
}

impl std::str::FromStr for AdminRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "super_admin" => Ok(Self::SuperAdmin),
            "admin" => Ok(Self::Admin),
            "viewer" => Ok(Self::Viewer),
            _ => Err(format!("invalid admin role: {s}")),
        }
    }
}

/// Kind of back-office notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationType {
    NewOrder,
    NewCustomer,
    NewProduct,
    LowStock,
    OutOfStock,
    OrderStatus,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_product_status_wire_format() {
        assert_eq!(
            serde_json::to_string(&ProductStatus::OutOfStock).unwrap(),
            "\"out-of-stock\""
        );
        let parsed: ProductStatus = serde_json::from_str("\"discontinued\"").unwrap();
        assert_eq!(parsed, ProductStatus::Discontinued);
    }

    #[test]
    fn test_product_status_for_stock() {
        assert_eq!(ProductStatus::Active.for_stock(0), ProductStatus::OutOfStock);
        assert_eq!(ProductStatus::OutOfStock.for_stock(3), ProductStatus::Active);
        assert_eq!(
            ProductStatus::Discontinued.for_stock(0),
            ProductStatus::Discontinued
        );
    }

    #[test]
    fn test_admin_role_roundtrip() {
        for role in [AdminRole::SuperAdmin, AdminRole::Admin, AdminRole::Viewer] {
            assert_eq!(role.to_string().parse::<AdminRole>().unwrap(), role);
        }
        assert!("owner".parse::<AdminRole>().is_err());
    }

    #[test]
    fn test_notification_type_wire_format() {
        let kinds = [
            NotificationType::NewOrder,
            NotificationType::NewCustomer,
            NotificationType::NewProduct,
            NotificationType::LowStock,
            NotificationType::OutOfStock,
            NotificationType::OrderStatus,
        ];
        let wire: Vec<String> = kinds
            .iter()
            .map(|kind| serde_json::to_string(kind).unwrap())
            .collect();
        assert_eq!(
            wire,
            [
                "\"new_order\"",
                "\"new_customer\"",
                "\"new_product\"",
                "\"low_stock\"",
                "\"out_of_stock\"",
                "\"order_status\"",
            ]
        );
    }

    #[test]
    fn test_viewer_cannot_write() {
        assert!(!AdminRole::Viewer.can_write());
        assert!(AdminRole::Admin.can_write());
    }
}
