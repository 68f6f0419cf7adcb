use chrono::{DateTime, Utc};
use tokio::sync::oneshot;

use crate::domain::{Order, OrderCreate, OrderPatch, OrderStatus};
use crate::order_store::OrderError;
use crate::rate_limiter::{Admission, RateLimitError};
use crate::sequencer::MintedId;

/// Generic type aliases for service communication
pub type ServiceResult<T, E> = std::result::Result<T, E>;
pub type ServiceResponse<T, E> = oneshot::Sender<ServiceResult<T, E>>;

/// Typed message enums for the hand-written services. Each variant carries
/// its parameters and a oneshot channel for the reply.

#[derive(Debug)]
pub enum OrderStoreRequest {
    CreateOrder {
        order: OrderCreate,
        respond_to: ServiceResponse<Order, OrderError>,
    },
    MintIdentifier {
        year: i32,
        respond_to: ServiceResponse<MintedId, OrderError>,
    },
    PeekIdentifier {
        year: i32,
        respond_to: ServiceResponse<MintedId, OrderError>,
    },
    GetOrder {
        id: u64,
        respond_to: ServiceResponse<Option<Order>, OrderError>,
    },
    ListOrders {
        respond_to: ServiceResponse<Vec<Order>, OrderError>,
    },
    ToggleStatus {
        id: u64,
        now: DateTime<Utc>,
        respond_to: ServiceResponse<OrderStatus, OrderError>,
    },
    SetStatus {
        id: u64,
        status: OrderStatus,
        now: DateTime<Utc>,
        respond_to: ServiceResponse<OrderStatus, OrderError>,
    },
    UpdateOrder {
        id: u64,
        patch: OrderPatch,
        now: DateTime<Utc>,
        respond_to: ServiceResponse<Order, OrderError>,
    },
    DeactivateOrder {
        id: u64,
        now: DateTime<Utc>,
        respond_to: ServiceResponse<(), OrderError>,
    },
    Shutdown,
    #[cfg(test)]
    GetOrderCount {
        respond_to: ServiceResponse<usize, OrderError>,
    },
}

#[derive(Debug)]
pub enum RateLimitRequest {
    CheckRateLimit {
        key: String,
        now: DateTime<Utc>,
        respond_to: ServiceResponse<Admission, RateLimitError>,
    },
    ResetKey {
        key: String,
        respond_to: ServiceResponse<(), RateLimitError>,
    },
    Shutdown,
    #[cfg(test)]
    GetTrackedKeys {
        respond_to: ServiceResponse<usize, RateLimitError>,
    },
}
