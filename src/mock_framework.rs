//! # Mock Framework
//!
//! Utilities for testing clients in isolation.
//!
//! Use [`create_mock_client`] (or the service-specific constructors) to get a
//! client and a receiver. Then use the `expect_*` helpers to assert what the
//! client sent and to script the reply.

use tokio::sync::{mpsc, oneshot};

use crate::actor_framework::{Entity, FrameworkError, ResourceClient, ResourceRequest, Upserted};
use crate::clients::{OrderStoreClient, RateLimitClient};
use crate::domain::{Order, OrderCreate};
use crate::messages::{OrderStoreRequest, RateLimitRequest};
use crate::order_store::OrderError;
use crate::rate_limiter::{Admission, RateLimitError};
use crate::sequencer::MintedId;

/// Creates a mock client and a receiver for asserting requests.
///
/// The client sends into a channel the test controls, so the test plays the
/// actor: it inspects each request and decides the reply.
pub fn create_mock_client<T: Entity>(buffer_size: usize) -> (ResourceClient<T>, mpsc::Receiver<ResourceRequest<T>>) {
    let (sender, receiver) = mpsc::channel(buffer_size);
    (ResourceClient::new(sender), receiver)
}

pub fn create_mock_store(buffer_size: usize) -> (OrderStoreClient, mpsc::Receiver<OrderStoreRequest>) {
    let (sender, receiver) = mpsc::channel(buffer_size);
    (OrderStoreClient::new(sender), receiver)
}

pub fn create_mock_rate_limiter(buffer_size: usize) -> (RateLimitClient, mpsc::Receiver<RateLimitRequest>) {
    let (sender, receiver) = mpsc::channel(buffer_size);
    (RateLimitClient::new(sender), receiver)
}

/// Helper to verify that the next message is a Create request
pub async fn expect_create<T: Entity>(
    receiver: &mut mpsc::Receiver<ResourceRequest<T>>,
) -> Option<(T::CreatePayload, oneshot::Sender<Result<T::Id, FrameworkError>>)> {
    match receiver.recv().await {
        Some(ResourceRequest::Create { payload, respond_to }) => Some((payload, respond_to)),
        _ => None,
    }
}

/// Helper to verify that the next message is an Upsert request
pub async fn expect_upsert<T: Entity>(
    receiver: &mut mpsc::Receiver<ResourceRequest<T>>,
) -> Option<(T::CreatePayload, oneshot::Sender<Result<Upserted<T::Id>, FrameworkError>>)> {
    match receiver.recv().await {
        Some(ResourceRequest::Upsert { payload, respond_to }) => Some((payload, respond_to)),
        _ => None,
    }
}

/// Helper to verify that the next message is a List request
pub async fn expect_list<T: Entity>(
    receiver: &mut mpsc::Receiver<ResourceRequest<T>>,
) -> Option<(bool, oneshot::Sender<Result<Vec<T>, FrameworkError>>)> {
    match receiver.recv().await {
        Some(ResourceRequest::List { include_inactive, respond_to }) => Some((include_inactive, respond_to)),
        _ => None,
    }
}

/// Helper to verify that the next message is a Deactivate request
pub async fn expect_deactivate<T: Entity>(
    receiver: &mut mpsc::Receiver<ResourceRequest<T>>,
) -> Option<(T::Id, oneshot::Sender<Result<(), FrameworkError>>)> {
    match receiver.recv().await {
        Some(ResourceRequest::Deactivate { id, respond_to }) => Some((id, respond_to)),
        _ => None,
    }
}

pub async fn expect_peek_identifier(
    receiver: &mut mpsc::Receiver<OrderStoreRequest>,
) -> Option<(i32, oneshot::Sender<Result<MintedId, OrderError>>)> {
    match receiver.recv().await {
        Some(OrderStoreRequest::PeekIdentifier { year, respond_to }) => Some((year, respond_to)),
        _ => None,
    }
}

pub async fn expect_create_order(
    receiver: &mut mpsc::Receiver<OrderStoreRequest>,
) -> Option<(OrderCreate, oneshot::Sender<Result<Order, OrderError>>)> {
    match receiver.recv().await {
        Some(OrderStoreRequest::CreateOrder { order, respond_to }) => Some((order, respond_to)),
        _ => None,
    }
}

pub async fn expect_rate_check(
    receiver: &mut mpsc::Receiver<RateLimitRequest>,
) -> Option<(String, oneshot::Sender<Result<Admission, RateLimitError>>)> {
    match receiver.recv().await {
        Some(RateLimitRequest::CheckRateLimit { key, respond_to, .. }) => Some((key, respond_to)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Client, ClientCreate};
    use chrono::{DateTime, Utc};

    #[tokio::test]
    async fn test_mock_client() {
        let (client, mut receiver) = create_mock_client::<Client>(10);

        let create_task = tokio::spawn(async move {
            let payload = ClientCreate {
                name: "Test".to_string(),
                phone: String::new(),
                email: "test@example.com".to_string(),
                address: String::new(),
                notes: String::new(),
                created_at: DateTime::<Utc>::UNIX_EPOCH,
            };
            client.create(payload).await
        });

        let (payload, responder) = expect_create(&mut receiver).await.expect("Expected Create request");
        assert_eq!(payload.name, "Test");
        responder.send(Ok(7)).unwrap();

        let result = create_task.await.unwrap();
        assert_eq!(result, Ok(7));
    }

    #[tokio::test]
    async fn dropped_responder_surfaces_as_actor_error() {
        let (client, mut receiver) = create_mock_rate_limiter(1);
        let task = tokio::spawn(async move {
            client.check_rate_limit("k".to_string(), DateTime::<Utc>::UNIX_EPOCH).await
        });

        let (key, responder) = expect_rate_check(&mut receiver).await.expect("Expected rate check");
        assert_eq!(key, "k");
        drop(responder);

        let result = task.await.unwrap();
        assert_eq!(result, Err(RateLimitError::ActorCommunicationError("Actor dropped".to_string())));
    }
}
