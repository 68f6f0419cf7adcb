use std::sync::Arc;

use chrono::{Datelike, TimeDelta};
use tracing::{error, info, warn, Instrument};

use order_tracker::app_system::{setup_tracing, TrackerSystem};
use order_tracker::clock::SystemClock;
use order_tracker::config::TrackerConfig;
use order_tracker::domain::{ClientCreate, OrderPatch, OrderStatus, OrderSubmission};
use order_tracker::lifecycle::OrderFilter;
use order_tracker::order_store::OrderError;

struct SeedClient {
    name: &'static str,
    phone: &'static str,
    email: &'static str,
    address: &'static str,
}

const SEED_CLIENTS: [SeedClient; 3] = [
    SeedClient {
        name: "Alice Chan",
        phone: "+852 5550 0001",
        email: "alice@example.com",
        address: "12 Flower Street, Central",
    },
    SeedClient {
        name: "Bob Lee",
        phone: "+852 5550 0002",
        email: "bob@example.com",
        address: "8 Harbour Road, Wan Chai",
    },
    SeedClient {
        name: "Carmen Wong",
        phone: "+852 5550 0003",
        email: "",
        address: "",
    },
];

/// (client index, days from today, items, price)
const SEED_ORDERS: [(usize, i64, &str, &str); 4] = [
    (0, 0, "Hand-tied roses, 24 stems", "880"),
    (1, 2, "Orchid centrepiece", "1250.50"),
    (2, 5, "Sympathy wreath", ""),
    (0, 20, "Weekly office flowers", "420"),
];

#[tokio::main]
async fn main() -> Result<(), String> {
    // Setup tracing once for the entire application
    setup_tracing();

    let config = TrackerConfig::from_env().map_err(|e| e.to_string())?;
    info!(?config, "Starting order tracker demo");

    let system = TrackerSystem::new(config, Arc::new(SystemClock));
    let today = system.order_client.today();

    // Seed clients
    let span = tracing::info_span!("seed_clients");
    async {
        for seed in &SEED_CLIENTS {
            let id = system
                .directory
                .create_client(ClientCreate {
                    name: seed.name.to_string(),
                    phone: seed.phone.to_string(),
                    email: seed.email.to_string(),
                    address: seed.address.to_string(),
                    notes: String::new(),
                    created_at: chrono::Utc::now(),
                })
                .await
                .map_err(|e| e.to_string())?;
            info!(client_id = id, name = seed.name, "Client seeded");
        }
        Ok::<(), String>(())
    }
    .instrument(span)
    .await?;

    // Seed orders through the admin path
    let span = tracing::info_span!("seed_orders");
    let placed = async {
        let mut placed = Vec::new();
        for (client, days, items, price) in SEED_ORDERS {
            let seed = &SEED_CLIENTS[client];
            let submission = OrderSubmission {
                client_name: seed.name.to_string(),
                client_phone: seed.phone.to_string(),
                client_email: seed.email.to_string(),
                delivery_date: (today + TimeDelta::days(days)).format("%Y-%m-%d").to_string(),
                items_text: items.to_string(),
                price: price.to_string(),
                ..Default::default()
            };
            let order = system
                .order_client
                .create_order_admin(submission)
                .await
                .map_err(|e| e.to_string())?;
            info!(public_id = %order.public_id, "Order seeded");
            placed.push(order);
        }
        Ok::<_, String>(placed)
    }
    .instrument(span)
    .await?;

    // Public submission with rate limiting
    let span = tracing::info_span!("public_submission");
    async {
        let submission = OrderSubmission {
            client_name: "Dev Patel".to_string(),
            client_email: "dev@example.com".to_string(),
            delivery_date: (today + TimeDelta::days(1)).format("%Y-%m-%d").to_string(),
            items_text: "Sunflowers".to_string(),
            price: "300".to_string(),
            ..Default::default()
        };
        match system.order_client.submit_order(submission, "203.0.113.7").await {
            Ok(order) => info!(public_id = %order.public_id, "Public order accepted"),
            Err(e) => error!(error = %e, "Public order failed"),
        }

        let spam = OrderSubmission {
            website: "http://spam.example".to_string(),
            ..Default::default()
        };
        if let Err(e) = system.order_client.submit_order(spam, "198.51.100.9").await {
            warn!(error = %e, "Spam submission rejected");
        }
    }
    .instrument(span)
    .await;

    // Lifecycle
    if let Some(first) = placed.first() {
        match system.order_client.toggle_status(first.order_id).await {
            Ok(status) => info!(public_id = %first.public_id, %status, "Status toggled"),
            Err(e) => error!(error = %e, "Toggle failed"),
        }
    }
    if let Some(third) = placed.get(2) {
        let cancelled = system.order_client.set_status(third.order_id, OrderStatus::Cancelled).await;
        info!(?cancelled, "Order cancelled");
        match system.order_client.toggle_status(third.order_id).await {
            Err(OrderError::InvalidTransition(e)) => warn!(error = %e, "Cancelled orders cannot be toggled"),
            other => info!(?other, "Unexpected toggle result"),
        }
    }
    if let Some(last) = placed.last() {
        let patch = OrderPatch {
            notes: Some("Deliver to reception".to_string()),
            ..Default::default()
        };
        if let Err(e) = system.order_client.update_order(last.order_id, patch).await {
            error!(error = %e, "Order edit failed");
        }
    }

    // Identifiers
    let next = system.order_client.peek_identifier(None).await.map_err(|e| e.to_string())?;
    info!(next = %next.public_id, year = today.year(), "Next identifier");

    // Read views
    let dashboard = system.order_client.dashboard().await.map_err(|e| e.to_string())?;
    info!(aggregates = ?dashboard.aggregates, recent = dashboard.recent.len(), "Dashboard");

    let pending = system
        .order_client
        .list_orders(&OrderFilter {
            status: Some(OrderStatus::Pending),
            query: String::new(),
        })
        .await
        .map_err(|e| e.to_string())?;
    info!(count = pending.len(), "Pending orders");

    let days = system.order_client.calendar_days().await.map_err(|e| e.to_string())?;
    info!(days = days.len(), "Calendar days with deliveries");

    let feed = system.order_client.calendar_feed().await.map_err(|e| e.to_string())?;
    info!(bytes = feed.len(), events = feed.matches("BEGIN:VEVENT").count(), "Calendar feed built");

    let orders_csv = system.order_client.export_orders_csv().await.map_err(|e| e.to_string())?;
    let clients_csv = system.order_client.export_clients_csv().await.map_err(|e| e.to_string())?;
    info!(order_rows = orders_csv.lines().count().saturating_sub(1), client_rows = clients_csv.lines().count().saturating_sub(1), "CSV exported");

    // Shutdown system gracefully
    system.shutdown().await?;

    info!("Application completed successfully");
    Ok(())
}
