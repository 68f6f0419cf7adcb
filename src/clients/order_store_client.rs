use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use tracing::{debug, instrument};

use crate::domain::{Order, OrderCreate, OrderPatch, OrderStatus};
use crate::messages::OrderStoreRequest;
use crate::order_store::OrderError;
use crate::sequencer::MintedId;

/// Handle to the [`OrderStore`](crate::order_store::OrderStore) actor.
#[derive(Clone)]
pub struct OrderStoreClient {
    sender: mpsc::Sender<OrderStoreRequest>,
}

impl OrderStoreClient {
    pub fn new(sender: mpsc::Sender<OrderStoreRequest>) -> Self {
        Self { sender }
    }

    #[instrument(skip(self))]
    pub async fn shutdown(&self) -> Result<(), OrderError> {
        debug!("Sending request");
        self.sender
            .send(OrderStoreRequest::Shutdown)
            .await
            .map_err(|_| OrderError::ActorCommunicationError("Actor closed".to_string()))
    }
}

client_method!(OrderStoreClient => fn create_order(order: OrderCreate) -> Order as OrderStoreRequest::CreateOrder, Error = OrderError);
client_method!(OrderStoreClient => fn mint_identifier(year: i32) -> MintedId as OrderStoreRequest::MintIdentifier, Error = OrderError);
client_method!(OrderStoreClient => fn peek_identifier(year: i32) -> MintedId as OrderStoreRequest::PeekIdentifier, Error = OrderError);
client_method!(OrderStoreClient => fn get_order(id: u64) -> Option<Order> as OrderStoreRequest::GetOrder, Error = OrderError);
client_method!(OrderStoreClient => fn list_orders() -> Vec<Order> as OrderStoreRequest::ListOrders, Error = OrderError);
client_method!(OrderStoreClient => fn toggle_status(id: u64, now: DateTime<Utc>) -> OrderStatus as OrderStoreRequest::ToggleStatus, Error = OrderError);
client_method!(OrderStoreClient => fn set_status(id: u64, status: OrderStatus, now: DateTime<Utc>) -> OrderStatus as OrderStoreRequest::SetStatus, Error = OrderError);
client_method!(OrderStoreClient => fn update_order(id: u64, patch: OrderPatch, now: DateTime<Utc>) -> Order as OrderStoreRequest::UpdateOrder, Error = OrderError);
client_method!(OrderStoreClient => fn deactivate_order(id: u64, now: DateTime<Utc>) -> () as OrderStoreRequest::DeactivateOrder, Error = OrderError);
#[cfg(test)]
client_method!(OrderStoreClient => fn get_order_count() -> usize as OrderStoreRequest::GetOrderCount, Error = OrderError);
