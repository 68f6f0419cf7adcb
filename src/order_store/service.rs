use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use tracing::{debug, error, info, instrument, warn};

use super::OrderError;
use crate::clients::OrderStoreClient;
use crate::domain::{Order, OrderCreate, OrderPatch, OrderStatus};
use crate::lifecycle::{self, StatusChange};
use crate::messages::{OrderStoreRequest, ServiceResponse};
use crate::sequencer::{max_sequence_in, IdentifierSequencer, LookupFailure, MintedId, SequenceSource};

/// Every stored order, active or not, reserves its sequence number.
struct StoredIds<'a>(&'a BTreeMap<u64, Order>);

impl SequenceSource for StoredIds<'_> {
    fn max_sequence(&self, year: i32) -> Result<u32, LookupFailure> {
        max_sequence_in(year, self.0.values().map(|o| o.public_id.as_str()))
    }
}

fn check_price(price_minor_units: Option<i64>) -> Result<(), OrderError> {
    match price_minor_units {
        Some(price) if price < 0 => Err(OrderError::ValidationFailure(format!(
            "price must not be negative: {price}"
        ))),
        _ => Ok(()),
    }
}

/// Actor owning the orders and the identifier sequencer.
///
/// Minting and inserting happen inside one message handler, so two
/// concurrent creations can never see the same sequence number.
pub struct OrderStore {
    receiver: mpsc::Receiver<OrderStoreRequest>,
    orders: BTreeMap<u64, Order>,
    sequencer: IdentifierSequencer,
    next_order_id: u64,
}

impl OrderStore {
    pub fn new(buffer_size: usize, id_width: usize) -> (Self, OrderStoreClient) {
        Self::with_orders(buffer_size, id_width, Vec::new())
    }

    /// Starts from previously persisted orders. Internal ids continue after
    /// the highest one loaded.
    pub fn with_orders(buffer_size: usize, id_width: usize, existing: Vec<Order>) -> (Self, OrderStoreClient) {
        let (sender, receiver) = mpsc::channel(buffer_size);
        let orders: BTreeMap<u64, Order> = existing.into_iter().map(|o| (o.order_id, o)).collect();
        let next_order_id = orders.keys().next_back().map_or(1, |max| max + 1);
        let store = Self {
            receiver,
            orders,
            sequencer: IdentifierSequencer::new(id_width),
            next_order_id,
        };
        (store, OrderStoreClient::new(sender))
    }

    #[instrument(name = "order_store", skip(self))]
    pub async fn run(mut self) {
        info!(loaded = self.orders.len(), "OrderStore starting");
        while let Some(msg) = self.receiver.recv().await {
            match msg {
                OrderStoreRequest::CreateOrder { order, respond_to } => {
                    self.handle_create_order(order, respond_to);
                }
                OrderStoreRequest::MintIdentifier { year, respond_to } => {
                    self.handle_mint_identifier(year, respond_to);
                }
                OrderStoreRequest::PeekIdentifier { year, respond_to } => {
                    let result = self
                        .sequencer
                        .peek(year, &StoredIds(&self.orders))
                        .map_err(OrderError::from);
                    let _ = respond_to.send(result);
                }
                OrderStoreRequest::GetOrder { id, respond_to } => {
                    self.handle_get_order(id, respond_to);
                }
                OrderStoreRequest::ListOrders { respond_to } => {
                    let active = self.orders.values().filter(|o| o.active).cloned().collect();
                    let _ = respond_to.send(Ok(active));
                }
                OrderStoreRequest::ToggleStatus { id, now, respond_to } => {
                    self.handle_status_change(id, StatusChange::Toggle, now, respond_to);
                }
                OrderStoreRequest::SetStatus { id, status, now, respond_to } => {
                    self.handle_status_change(id, StatusChange::Set(status), now, respond_to);
                }
                OrderStoreRequest::UpdateOrder { id, patch, now, respond_to } => {
                    self.handle_update_order(id, patch, now, respond_to);
                }
                OrderStoreRequest::DeactivateOrder { id, now, respond_to } => {
                    self.handle_deactivate_order(id, now, respond_to);
                }
                OrderStoreRequest::Shutdown => {
                    info!("OrderStore shutting down");
                    break;
                }
                #[cfg(test)]
                OrderStoreRequest::GetOrderCount { respond_to } => {
                    let _ = respond_to.send(Ok(self.orders.len()));
                }
            }
        }
        info!("OrderStore stopped");
    }

    fn active_mut(&mut self, id: u64) -> Result<&mut Order, OrderError> {
        self.orders
            .get_mut(&id)
            .filter(|o| o.active)
            .ok_or(OrderError::NotFound(id))
    }

    fn claim(&mut self, year: i32) -> Result<MintedId, OrderError> {
        self.sequencer
            .claim(year, &StoredIds(&self.orders))
            .map_err(|e| {
                error!(year, error = %e, "Sequence lookup failed");
                OrderError::from(e)
            })
    }

    #[instrument(fields(client_id = order.client_id, year = order.year), skip(self, order, respond_to))]
    fn handle_create_order(&mut self, order: OrderCreate, respond_to: ServiceResponse<Order, OrderError>) {
        debug!("Processing create_order request");

        if let Err(e) = check_price(order.price_minor_units) {
            let _ = respond_to.send(Err(e));
            return;
        }

        let minted = match self.claim(order.year) {
            Ok(minted) => minted,
            Err(e) => {
                let _ = respond_to.send(Err(e));
                return;
            }
        };

        let order_id = self.next_order_id;
        self.next_order_id += 1;
        let order = Order {
            order_id,
            public_id: minted.public_id,
            client_id: order.client_id,
            delivery_date: order.delivery_date,
            status: OrderStatus::Pending,
            price_minor_units: order.price_minor_units,
            items_text: order.items_text,
            notes: order.notes,
            created_at: order.created_at,
            updated_at: order.created_at,
            active: true,
        };
        info!(order_id, public_id = %order.public_id, "Order created");
        self.orders.insert(order_id, order.clone());
        let _ = respond_to.send(Ok(order));
    }

    #[instrument(skip(self, respond_to))]
    fn handle_mint_identifier(&mut self, year: i32, respond_to: ServiceResponse<MintedId, OrderError>) {
        let result = self.claim(year);
        if let Ok(minted) = &result {
            info!(public_id = %minted.public_id, "Identifier minted");
        }
        let _ = respond_to.send(result);
    }

    #[instrument(skip(self, respond_to))]
    fn handle_get_order(&self, id: u64, respond_to: ServiceResponse<Option<Order>, OrderError>) {
        let order = self.orders.get(&id).filter(|o| o.active).cloned();
        if order.is_none() {
            debug!("Order not found");
        }
        let _ = respond_to.send(Ok(order));
    }

    #[instrument(skip(self, now, respond_to))]
    fn handle_status_change(
        &mut self,
        id: u64,
        change: StatusChange,
        now: DateTime<Utc>,
        respond_to: ServiceResponse<OrderStatus, OrderError>,
    ) {
        let result = self.active_mut(id).and_then(|order| {
            lifecycle::transition(order, change, now).map_err(|e| {
                warn!(error = %e, "Status change rejected");
                OrderError::from(e)
            })
        });
        if let Ok(status) = &result {
            info!(status = %status, "Order status updated");
        }
        let _ = respond_to.send(result);
    }

    #[instrument(skip(self, patch, now, respond_to))]
    fn handle_update_order(
        &mut self,
        id: u64,
        patch: OrderPatch,
        now: DateTime<Utc>,
        respond_to: ServiceResponse<Order, OrderError>,
    ) {
        let result = self.active_mut(id).and_then(|order| {
            if let Some(price) = patch.price_minor_units {
                check_price(price)?;
                order.price_minor_units = price;
            }
            if let Some(delivery_date) = patch.delivery_date {
                order.delivery_date = delivery_date;
            }
            if let Some(items_text) = patch.items_text {
                order.items_text = items_text;
            }
            if let Some(notes) = patch.notes {
                order.notes = notes;
            }
            order.updated_at = now;
            Ok(order.clone())
        });
        let _ = respond_to.send(result);
    }

    #[instrument(skip(self, now, respond_to))]
    fn handle_deactivate_order(&mut self, id: u64, now: DateTime<Utc>, respond_to: ServiceResponse<(), OrderError>) {
        let result = self.active_mut(id).map(|order| {
            order.active = false;
            order.updated_at = now;
        });
        if result.is_ok() {
            info!("Order archived");
        }
        let _ = respond_to.send(result);
    }
}
