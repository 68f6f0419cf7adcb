//! Order status transitions and the read-side views built on them.
//!
//! Everything here is a pure function of its inputs. "Today" is always
//! passed in; nothing reads the clock.

pub mod aggregates;
pub mod search;

pub use aggregates::*;
pub use search::*;

use std::fmt;

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::domain::{Order, OrderStatus};

/// What the caller tried to do to an order's status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusChange {
    /// The two-state pending/fulfilled switch used by the order list.
    Toggle,
    /// An explicit status edit.
    Set(OrderStatus),
}

impl fmt::Display for StatusChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatusChange::Toggle => f.write_str("toggle"),
            StatusChange::Set(status) => write!(f, "set to {status}"),
        }
    }
}

#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
#[error("invalid transition from {from}: {attempted}")]
pub struct InvalidTransition {
    pub from: OrderStatus,
    pub attempted: StatusChange,
}

/// Explicit edits allowed out of each status. A cancelled order has to be
/// reopened as pending before it can be fulfilled.
const TRANSITIONS: &[(OrderStatus, &[OrderStatus])] = &[
    (OrderStatus::Pending, &[OrderStatus::Fulfilled, OrderStatus::Cancelled]),
    (OrderStatus::Fulfilled, &[OrderStatus::Pending, OrderStatus::Cancelled]),
    (OrderStatus::Cancelled, &[OrderStatus::Pending]),
];

pub fn is_allowed(from: OrderStatus, to: OrderStatus) -> bool {
    from == to
        || TRANSITIONS
            .iter()
            .any(|(source, targets)| *source == from && targets.contains(&to))
}

/// Where a toggle leads from `from`. Cancelled orders do not toggle.
pub fn toggle_target(from: OrderStatus) -> Result<OrderStatus, InvalidTransition> {
    match from {
        OrderStatus::Pending => Ok(OrderStatus::Fulfilled),
        OrderStatus::Fulfilled => Ok(OrderStatus::Pending),
        OrderStatus::Cancelled => Err(InvalidTransition {
            from,
            attempted: StatusChange::Toggle,
        }),
    }
}

/// Applies `change` to `order`. On error the order is left untouched.
pub fn transition(
    order: &mut Order,
    change: StatusChange,
    now: DateTime<Utc>,
) -> Result<OrderStatus, InvalidTransition> {
    let from = order.status;
    let to = match change {
        StatusChange::Toggle => toggle_target(from)?,
        StatusChange::Set(to) if is_allowed(from, to) => to,
        StatusChange::Set(_) => {
            return Err(InvalidTransition { from, attempted: change });
        }
    };
    if to != from {
        order.status = to;
        order.updated_at = now;
    }
    Ok(to)
}

pub fn toggle(order: &mut Order, now: DateTime<Utc>) -> Result<OrderStatus, InvalidTransition> {
    transition(order, StatusChange::Toggle, now)
}
