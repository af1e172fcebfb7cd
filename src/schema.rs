//! Entity records and output column dictionaries.
//!
//! The serde field names on these structs ARE the output schema: the CSV
//! writer derives its header row from them, and the validator checks files
//! against the `*_COLUMNS` dictionaries below. Keep both in sync.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Column names for products.csv, in output order.
pub const PRODUCT_COLUMNS: &[&str] = &[
    "product_id",
    "product_category",
    "product_name",
    "product_size_label",
    "product_width_cm",
    "product_length_cm",
    "product_height_cm",
    "product_price",
    "product_created_date",
    "product_updated_date",
];

/// Column names for customers.csv, in output order.
pub const CUSTOMER_COLUMNS: &[&str] = &[
    "customer_id",
    "customer_address",
    "customer_state",
    "customer_zip_code",
    "customer_created_date",
    "customer_updated_date",
];

/// Column names for sellers.csv, in output order.
pub const SELLER_COLUMNS: &[&str] = &[
    "seller_id",
    "seller_address",
    "seller_state",
    "seller_zip_code",
    "seller_created_date",
    "seller_updated_date",
];

/// Column names for orders.csv, in output order.
pub const ORDER_COLUMNS: &[&str] = &[
    "order_id",
    "customer_id",
    "order_status",
    "order_purchase_date",
    "order_approved_at",
    "order_delivered_carrier_date",
    "order_delivered_customer_date",
    "order_estimated_delivery_date",
];

/// Column names for order_items.csv, in output order.
pub const ORDER_ITEM_COLUMNS: &[&str] = &[
    "order_id",
    "order_item_id",
    "product_id",
    "seller_id",
    "shipping_limit_date",
    "price",
    "freight_value",
];

/// Format a 1-based record index as a zero-padded 8-digit id.
pub fn format_id(index: u64) -> String {
    format!("{:08}", index)
}

/// A catalogue product. Immutable after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub product_id: String,
    pub product_category: String,
    pub product_name: String,
    pub product_size_label: String,
    pub product_width_cm: f64,
    pub product_length_cm: f64,
    pub product_height_cm: f64,
    pub product_price: f64,
    pub product_created_date: NaiveDate,
    pub product_updated_date: Option<NaiveDate>,
}

/// A customer account. Immutable after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    pub customer_id: String,
    pub customer_address: String,
    pub customer_state: String,
    pub customer_zip_code: String,
    pub customer_created_date: NaiveDate,
    pub customer_updated_date: Option<NaiveDate>,
}

/// A marketplace seller. Immutable after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Seller {
    pub seller_id: String,
    pub seller_address: String,
    pub seller_state: String,
    pub seller_zip_code: String,
    pub seller_created_date: NaiveDate,
    pub seller_updated_date: Option<NaiveDate>,
}

/// Fulfillment status of an order.
///
/// Which timestamps are populated on [`Order`] depends on how far along the
/// fulfillment sequence the order is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Processing,
    Approved,
    Shipped,
    Delivered,
}

impl OrderStatus {
    /// All statuses, in fulfillment order.
    pub const ALL: [OrderStatus; 4] = [
        OrderStatus::Processing,
        OrderStatus::Approved,
        OrderStatus::Shipped,
        OrderStatus::Delivered,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Processing => "PROCESSING",
            OrderStatus::Approved => "APPROVED",
            OrderStatus::Shipped => "SHIPPED",
            OrderStatus::Delivered => "DELIVERED",
        }
    }

    /// Whether the order has been approved (or further along).
    pub fn is_approved(&self) -> bool {
        !matches!(self, OrderStatus::Processing)
    }

    /// Whether the order has left the warehouse.
    pub fn is_shipped(&self) -> bool {
        matches!(self, OrderStatus::Shipped | OrderStatus::Delivered)
    }

    pub fn is_delivered(&self) -> bool {
        matches!(self, OrderStatus::Delivered)
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "PROCESSING" => Ok(OrderStatus::Processing),
            "APPROVED" => Ok(OrderStatus::Approved),
            "SHIPPED" => Ok(OrderStatus::Shipped),
            "DELIVERED" => Ok(OrderStatus::Delivered),
            _ => Err(format!(
                "Unknown order status: {}. Valid: PROCESSING, APPROVED, SHIPPED, DELIVERED",
                s
            )),
        }
    }
}

/// An order. Timestamps are populated according to [`OrderStatus`]; when
/// populated they are non-decreasing along the fulfillment sequence
/// purchase -> approved -> carrier -> customer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub order_id: String,
    pub customer_id: String,
    pub order_status: OrderStatus,
    pub order_purchase_date: NaiveDate,
    pub order_approved_at: Option<NaiveDate>,
    pub order_delivered_carrier_date: Option<NaiveDate>,
    pub order_delivered_customer_date: Option<NaiveDate>,
    pub order_estimated_delivery_date: Option<NaiveDate>,
}

/// A line item on an order. `order_item_id` is the 0-based position of the
/// item within its order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
    pub order_id: String,
    pub order_item_id: u32,
    pub product_id: String,
    pub seller_id: String,
    pub shipping_limit_date: NaiveDate,
    pub price: f64,
    pub freight_value: f64,
}
