//! Wire types for the cart and transaction collections.

use chrono::NaiveDate;
use pickngo_core::{CartItemId, CurrencyCode, Price, TransactionId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Customer name recorded when a cart row carries no user name.
pub const GUEST_CUSTOMER: &str = "Guest";

/// Envelope wrapping every request and response body: `{ "data": ... }`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Data<T> {
    pub data: T,
}

impl<T> Data<T> {
    /// Wrap a payload.
    pub const fn new(data: T) -> Self {
        Self { data }
    }
}

/// One product line in a user's cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    /// Server-assigned id.
    pub id: CartItemId,
    pub product_name: String,
    /// Unit price.
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    pub quantity: u32,
    #[serde(default)]
    pub user_name: String,
    #[serde(default)]
    pub branch_name: String,
}

impl CartItem {
    /// Price × quantity.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.price * Decimal::from(self.quantity)
    }

    /// Unit price in `currency`.
    #[must_use]
    pub const fn unit_price(&self, currency: CurrencyCode) -> Price {
        Price::new(self.price, currency)
    }

    /// Whether the row has a positive quantity and a non-negative price.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.quantity > 0 && !self.price.is_sign_negative()
    }
}

/// Purchase record created for one cart row at checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub product_name: String,
    pub quantity: u32,
    /// Unit price × quantity.
    #[serde(with = "rust_decimal::serde::float")]
    pub total: Decimal,
    pub customer_name: String,
    /// Calendar date of the purchase, serialized as `YYYY-MM-DD`.
    pub date: NaiveDate,
    pub branch_name: String,
}

impl TransactionRecord {
    /// Build the record for `item`, stamped with `date`.
    #[must_use]
    pub fn from_cart_item(item: &CartItem, date: NaiveDate) -> Self {
        let customer_name = if item.user_name.trim().is_empty() {
            GUEST_CUSTOMER.to_string()
        } else {
            item.user_name.clone()
        };

        Self {
            product_name: item.product_name.clone(),
            quantity: item.quantity,
            total: item.line_total(),
            customer_name,
            date,
            branch_name: item.branch_name.clone(),
        }
    }
}

/// The part of a created transaction this client reads back.
#[derive(Debug, Clone, Deserialize)]
pub struct CreatedTransaction {
    #[serde(default)]
    pub id: Option<TransactionId>,
}
