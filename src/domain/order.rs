use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Fulfilment status of an order.
///
/// The set is closed. Moves between states go through
/// [`crate::lifecycle::transition`], never through string comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    #[serde(alias = "unfulfilled")]
    Pending,
    Fulfilled,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Fulfilled => "fulfilled",
            OrderStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" | "unfulfilled" => Ok(OrderStatus::Pending),
            "fulfilled" => Ok(OrderStatus::Fulfilled),
            "cancelled" | "canceled" => Ok(OrderStatus::Cancelled),
            other => Err(format!("unknown order status: {other}")),
        }
    }
}

/// A customer order as held by the order store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub order_id: u64,
    /// `<YEAR>-<NNN>`, unique within its year and never reused.
    pub public_id: String,
    pub client_id: u64,
    pub delivery_date: NaiveDate,
    pub status: OrderStatus,
    pub price_minor_units: Option<i64>,
    pub items_text: String,
    pub notes: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub active: bool,
}

impl Order {
    /// Counts toward delivery aggregates and the calendar feed.
    pub fn is_scheduled(&self) -> bool {
        self.active && self.status != OrderStatus::Cancelled
    }
}

/// Validated payload for inserting a new order.
///
/// The public identifier is not part of the payload: the store mints it
/// while handling the insert.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderCreate {
    /// Year component of the identifier, local to the configured timezone.
    pub year: i32,
    pub client_id: u64,
    pub delivery_date: NaiveDate,
    pub price_minor_units: Option<i64>,
    pub items_text: String,
    pub notes: String,
    pub created_at: DateTime<Utc>,
}

/// Edit of the mutable order fields. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OrderPatch {
    pub delivery_date: Option<NaiveDate>,
    pub items_text: Option<String>,
    pub notes: Option<String>,
    /// `Some(None)` clears the price.
    pub price_minor_units: Option<Option<i64>>,
}
