use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use tracing::{error, info, instrument, warn};

use crate::calendar::{build_calendar_feed, group_by_delivery_date};
use crate::clients::{ClientDirectory, OrderStoreClient, RateLimitClient};
use crate::clock::{today_in, Clock};
use crate::config::TrackerConfig;
use crate::domain::{Client, ClientLookup, Order, OrderCreate, OrderPatch, OrderStatus, OrderSubmission, ValidSubmission};
use crate::export::{export_clients_csv, export_orders_csv};
use crate::lifecycle::{compute_dashboard_aggregates, filter_orders, orders_for_client, recent_orders, DashboardAggregates, OrderFilter, RECENT_ORDERS};
use crate::order_store::OrderError;
use crate::rate_limiter::Admission;
use crate::sequencer::MintedId;

/// Dashboard counts plus the most recent orders.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dashboard {
    pub today: NaiveDate,
    pub aggregates: DashboardAggregates,
    pub recent: Vec<Order>,
}

/// Front door for order operations.
///
/// Orchestrates the rate limiter, the client directory and the order store,
/// and builds the read-side views (dashboard, calendar, exports) from
/// snapshots of the stores.
#[derive(Clone)]
pub struct OrderClient {
    store: OrderStoreClient,
    directory: ClientDirectory,
    rate_limit: RateLimitClient,
    clock: Arc<dyn Clock>,
    config: Arc<TrackerConfig>,
}

impl OrderClient {
    pub fn new(
        store: OrderStoreClient,
        directory: ClientDirectory,
        rate_limit: RateLimitClient,
        clock: Arc<dyn Clock>,
        config: Arc<TrackerConfig>,
    ) -> Self {
        Self {
            store,
            directory,
            rate_limit,
            clock,
            config,
        }
    }

    pub fn today(&self) -> NaiveDate {
        today_in(self.clock.as_ref(), self.config.timezone)
    }

    /// Public order form. `client_key` identifies the submitter for rate
    /// limiting (typically the forwarded IP).
    #[instrument(skip(self, submission))]
    pub async fn submit_order(&self, submission: OrderSubmission, client_key: &str) -> Result<Order, OrderError> {
        info!("Processing submit_order request (Client Side)");

        // Step 1: Honeypot, before the attempt counts against the key
        if !submission.website.trim().is_empty() {
            warn!("Honeypot field filled, rejecting submission");
            return Err(OrderError::ValidationFailure("submission rejected".to_string()));
        }

        // Step 2: Rate limit
        let now = self.clock.now();
        let admission = self
            .rate_limit
            .check_rate_limit(client_key.to_string(), now)
            .await
            .map_err(|e| OrderError::ActorCommunicationError(e.to_string()))?;
        if let Admission::Denied { retry_after } = admission {
            warn!(retry_after_secs = retry_after.num_seconds(), "Submission rate limited");
            return Err(OrderError::RateLimited {
                key: client_key.to_string(),
                retry_after_secs: retry_after.num_seconds(),
            });
        }

        // Step 3: Validate form
        let valid = submission.validate().map_err(|reason| {
            warn!(reason = %reason, "Submission failed validation");
            OrderError::ValidationFailure(reason)
        })?;

        self.place_order(valid).await
    }

    /// Staff order entry. No honeypot and no rate limit.
    #[instrument(skip(self, submission))]
    pub async fn create_order_admin(&self, submission: OrderSubmission) -> Result<Order, OrderError> {
        info!("Processing admin create_order request");
        let valid = submission.validate().map_err(OrderError::ValidationFailure)?;
        self.place_order(valid).await
    }

    async fn place_order(&self, valid: ValidSubmission) -> Result<Order, OrderError> {
        let now = self.clock.now();
        let year = self.today().year();

        // Step 4: Make sure the year's sequence can be read before touching
        // the directory
        self.store.peek_identifier(year).await.map_err(|e| {
            error!(error = %e, year, "Identifier sequence unavailable");
            e
        })?;

        // Step 5: Find or create the client
        let client = self
            .directory
            .find_or_create(valid.contact, now)
            .await
            .map_err(|e| {
                error!(error = %e, "Client lookup failed");
                OrderError::from(e)
            })?;

        // Step 6: Mint and insert in the store
        let payload = OrderCreate {
            year,
            client_id: client.id,
            delivery_date: valid.delivery_date,
            price_minor_units: valid.price_minor_units,
            items_text: valid.items_text,
            notes: valid.notes,
            created_at: now,
        };
        match self.store.create_order(payload).await {
            Ok(order) => {
                info!(public_id = %order.public_id, client_id = client.id, "Order placed");
                Ok(order)
            }
            Err(e) => {
                error!(error = %e, client_id = client.id, "Order insert failed");
                if client.created {
                    // no order references it, so the new record goes too
                    if let Err(undo) = self.directory.deactivate_client(client.id).await {
                        error!(error = %undo, client_id = client.id, "Could not retire orphaned client");
                    }
                }
                Err(e)
            }
        }
    }

    /// Claims an identifier without creating an order. Defaults to the
    /// current local year.
    pub async fn mint_identifier(&self, year: Option<i32>) -> Result<MintedId, OrderError> {
        let year = year.unwrap_or_else(|| self.today().year());
        self.store.mint_identifier(year).await
    }

    pub async fn peek_identifier(&self, year: Option<i32>) -> Result<MintedId, OrderError> {
        let year = year.unwrap_or_else(|| self.today().year());
        self.store.peek_identifier(year).await
    }

    pub async fn get_order(&self, id: u64) -> Result<Option<Order>, OrderError> {
        self.store.get_order(id).await
    }

    pub async fn toggle_status(&self, id: u64) -> Result<OrderStatus, OrderError> {
        self.store.toggle_status(id, self.clock.now()).await
    }

    pub async fn set_status(&self, id: u64, status: OrderStatus) -> Result<OrderStatus, OrderError> {
        self.store.set_status(id, status, self.clock.now()).await
    }

    pub async fn update_order(&self, id: u64, patch: OrderPatch) -> Result<Order, OrderError> {
        self.store.update_order(id, patch, self.clock.now()).await
    }

    pub async fn archive_order(&self, id: u64) -> Result<(), OrderError> {
        self.store.deactivate_order(id, self.clock.now()).await
    }

    async fn snapshot(&self) -> Result<(Vec<Order>, Vec<Client>), OrderError> {
        let orders = self.store.list_orders().await?;
        let clients = self.directory.list_all_clients().await?;
        Ok((orders, clients))
    }

    pub async fn list_orders(&self, filter: &OrderFilter) -> Result<Vec<Order>, OrderError> {
        let (orders, clients) = self.snapshot().await?;
        let lookup = ClientLookup::new(&clients);
        Ok(filter_orders(&orders, &lookup, filter).into_iter().cloned().collect())
    }

    pub async fn orders_for_client(&self, client_id: u64) -> Result<Vec<Order>, OrderError> {
        let orders = self.store.list_orders().await?;
        Ok(orders_for_client(&orders, client_id).into_iter().cloned().collect())
    }

    #[instrument(skip(self))]
    pub async fn dashboard(&self) -> Result<Dashboard, OrderError> {
        let orders = self.store.list_orders().await?;
        let today = self.today();
        Ok(Dashboard {
            today,
            aggregates: compute_dashboard_aggregates(&orders, today),
            recent: recent_orders(&orders, RECENT_ORDERS).into_iter().cloned().collect(),
        })
    }

    /// The `.ics` document for subscribed calendar apps.
    #[instrument(skip(self))]
    pub async fn calendar_feed(&self) -> Result<String, OrderError> {
        let (orders, clients) = self.snapshot().await?;
        let lookup = ClientLookup::new(&clients);
        Ok(build_calendar_feed(
            &orders,
            &lookup,
            &self.config.calendar,
            self.config.timezone.name(),
        ))
    }

    pub async fn calendar_days(&self) -> Result<BTreeMap<NaiveDate, Vec<Order>>, OrderError> {
        let orders = self.store.list_orders().await?;
        Ok(group_by_delivery_date(&orders)
            .into_iter()
            .map(|(date, day)| (date, day.into_iter().cloned().collect()))
            .collect())
    }

    #[instrument(skip(self))]
    pub async fn export_orders_csv(&self) -> Result<String, OrderError> {
        let (orders, clients) = self.snapshot().await?;
        let lookup = ClientLookup::new(&clients);
        export_orders_csv(&orders, &lookup).map_err(|e| {
            error!(error = %e, "Order export failed");
            OrderError::Export(e.to_string())
        })
    }

    #[instrument(skip(self))]
    pub async fn export_clients_csv(&self) -> Result<String, OrderError> {
        let clients = self.directory.list_clients().await?;
        export_clients_csv(&clients).map_err(|e| {
            error!(error = %e, "Client export failed");
            OrderError::Export(e.to_string())
        })
    }
}
