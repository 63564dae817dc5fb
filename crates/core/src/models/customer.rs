//! Storefront customers, their carts and ID verification.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::{
    AccountStatus, CartLineId, CustomerId, Email, ProductId, UserUid, VariantId, rental_total,
};

/// The customer record behind a storefront sign-in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub id: CustomerId,
    /// The auth identity (`users` document id) this customer belongs to.
    pub firebase_uid: UserUid,
    #[serde(default)]
    pub full_name: String,
    pub email: Email,
    #[serde(default)]
    pub address: Address,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id_verification: Option<IdVerification>,
    #[serde(default)]
    pub account_status: AccountStatus,
    #[serde(default)]
    pub wishlist: Vec<ProductId>,
    #[serde(default)]
    pub cart: Vec<CartLine>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

/// Postal address.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Address {
    pub street: String,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub country: String,
}

/// Government ID submitted for rental approval.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdVerification {
    /// Document type, e.g. `passport` or `drivers_license`.
    #[serde(rename = "type")]
    pub kind: String,
    pub number: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_url: Option<String>,
    #[serde(default)]
    pub verified: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub submitted_at: Option<DateTime<Utc>>,
}

/// One line of a cart (and, once checked out, of an order).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    pub id: CartLineId,
    pub product_id: ProductId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variant_id: Option<VariantId>,
    pub name: String,
    /// Daily rate at the time the line was added.
    pub price: Decimal,
    pub quantity: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default = "default_rental_days")]
    pub rental_days: u32,
}

const fn default_rental_days() -> u32 {
    1
}

impl CartLine {
    /// Whether this line holds the given product/variant combination.
    #[must_use]
    pub fn is_same_item(&self, product_id: &ProductId, variant_id: Option<&VariantId>) -> bool {
        &self.product_id == product_id && self.variant_id.as_ref() == variant_id
    }

    /// Price of the line for its full rental period.
    #[must_use]
    pub fn total(&self) -> Decimal {
        rental_total(self.price, self.quantity, self.rental_days)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_customer_decodes_sparse_document() {
        let customer: Customer = serde_json::from_value(json!({
            "id": "c1",
            "firebaseUid": "u1",
            "email": "ana@example.com"
        }))
        .unwrap();
        assert!(customer.cart.is_empty());
        assert!(customer.wishlist.is_empty());
        assert_eq!(customer.account_status, AccountStatus::Active);
    }

    #[test]
    fn test_cart_line_wire_format() {
        let line: CartLine = serde_json::from_value(json!({
            "id": "1700000000000",
            "productId": "p1",
            "variantId": "black",
            "name": "A7 IV",
            "price": "45.00",
            "quantity": 2,
            "rentalDays": 3
        }))
        .unwrap();
        assert_eq!(line.total(), Decimal::new(27000, 2));
        assert!(line.is_same_item(&ProductId::new("p1"), Some(&VariantId::new("black"))));
        assert!(!line.is_same_item(&ProductId::new("p1"), None));
    }

    #[test]
    fn test_id_verification_type_field() {
        let verification = IdVerification {
            kind: "passport".to_owned(),
            number: "X123".to_owned(),
            document_url: None,
            verified: false,
            submitted_at: None,
        };
        let value = serde_json::to_value(&verification).unwrap();
        assert_eq!(value["type"], "passport");
    }
}
