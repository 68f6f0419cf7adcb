use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tracing::{error, info};

use crate::actor_framework::ResourceActor;
use crate::clients::{ClientDirectory, OrderClient, OrderStoreClient, RateLimitClient};
use crate::clock::Clock;
use crate::config::TrackerConfig;
use crate::domain::{Client, Order};
use crate::order_store::OrderStore;
use crate::rate_limiter::RateLimitService;

const CHANNEL_CAPACITY: usize = 32;

/// The running application: every actor, wired together.
///
/// Responsible for starting up actors, wiring them together, and handling shutdown.
pub struct TrackerSystem {
    pub order_client: OrderClient,
    pub directory: ClientDirectory,
    store_client: OrderStoreClient,
    rate_limit_client: RateLimitClient,
    handles: Vec<tokio::task::JoinHandle<()>>,
}

impl TrackerSystem {
    pub fn new(config: TrackerConfig, clock: Arc<dyn Clock>) -> Self {
        Self::with_orders(config, clock, Vec::new())
    }

    /// Starts with previously stored orders so identifier sequences carry on
    /// from them.
    pub fn with_orders(config: TrackerConfig, clock: Arc<dyn Clock>, existing: Vec<Order>) -> Self {
        // 1. Client directory
        let client_id_counter = Arc::new(AtomicU64::new(1));
        let next_client_id = move || client_id_counter.fetch_add(1, Ordering::SeqCst);
        let (client_actor, client_resource) = ResourceActor::<Client>::new(CHANNEL_CAPACITY, next_client_id);
        let directory = ClientDirectory::new(client_resource);
        let client_handle = tokio::spawn(client_actor.run());

        // 2. Rate limiter
        let (limiter, rate_limit_client) = RateLimitService::new(CHANNEL_CAPACITY, config.rate_limit.clone());
        let limiter_handle = tokio::spawn(limiter.run());

        // 3. Order store with the sequencer
        let (store, store_client) = OrderStore::with_orders(CHANNEL_CAPACITY, config.id_width, existing);
        let store_handle = tokio::spawn(store.run());

        info!(timezone = %config.timezone, id_width = config.id_width, "Tracker system started");

        let order_client = OrderClient::new(
            store_client.clone(),
            directory.clone(),
            rate_limit_client.clone(),
            clock,
            Arc::new(config),
        );

        Self {
            order_client,
            directory,
            store_client,
            rate_limit_client,
            handles: vec![client_handle, limiter_handle, store_handle],
        }
    }

    /// Stops every actor and waits for its task. Client handles cloned
    /// out of the system keep compiling but their calls fail with an actor
    /// communication error afterwards.
    pub async fn shutdown(self) -> Result<(), String> {
        info!("Shutting down system...");

        if let Err(e) = self.directory.shutdown().await {
            error!(error = %e, "Client directory already stopped");
        }

        if let Err(e) = self.store_client.shutdown().await {
            error!(error = %e, "OrderStore already stopped");
        }
        if let Err(e) = self.rate_limit_client.shutdown().await {
            error!(error = %e, "RateLimitService already stopped");
        }

        drop(self.order_client);
        drop(self.directory);
        drop(self.store_client);
        drop(self.rate_limit_client);

        for handle in self.handles {
            if let Err(e) = handle.await {
                error!("Actor task failed: {:?}", e);
                return Err(format!("Actor task failed: {:?}", e));
            }
        }

        info!("System shutdown complete.");
        Ok(())
    }
}
