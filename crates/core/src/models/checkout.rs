//! Checkouts (orders).

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::{CheckoutId, CustomerId, OrderStatus, PaymentStatus};

use super::CartLine;

/// A placed rental order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Checkout {
    pub id: CheckoutId,
    pub user_email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_id: Option<CustomerId>,
    #[serde(default)]
    pub items: Vec<CartLine>,
    #[serde(default)]
    pub pricing: Pricing,
    #[serde(default)]
    pub status: OrderStatus,
    #[serde(default)]
    pub payment_status: PaymentStatus,
    pub created_at: DateTime<Utc>,
}

/// Order totals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Pricing {
    pub subtotal: Decimal,
    pub tax: Decimal,
    pub total: Decimal,
}

impl Pricing {
    /// Totals for a set of lines at a tax rate (`0.08` = 8%), rounded to cents.
    #[must_use]
    pub fn for_lines(lines: &[CartLine], tax_rate: Decimal) -> Self {
        let subtotal: Decimal = lines.iter().map(CartLine::total).sum();
        let tax = (subtotal * tax_rate).round_dp(2);
        Self {
            subtotal,
            tax,
            total: subtotal + tax,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CartLineId, ProductId};

    fn line(price: i64, quantity: u32, days: u32) -> CartLine {
        CartLine {
            id: CartLineId::new("l"),
            product_id: ProductId::new("p"),
            variant_id: None,
            name: "Lens".to_owned(),
            price: Decimal::new(price, 2),
            quantity,
            image_url: None,
            rental_days: days,
        }
    }

    #[test]
    fn test_pricing_for_lines() {
        // 2 x 45.00 x 3 days + 1 x 10.00 x 1 day = 280.00
        let pricing = Pricing::for_lines(&[line(4500, 2, 3), line(1000, 1, 1)], Decimal::new(8, 2));
        assert_eq!(pricing.subtotal, Decimal::new(28000, 2));
        assert_eq!(pricing.tax, Decimal::new(2240, 2));
        assert_eq!(pricing.total, Decimal::new(30240, 2));
    }

    #[test]
    fn test_pricing_empty() {
        assert_eq!(Pricing::for_lines(&[], Decimal::ZERO), Pricing::default());
    }
}
