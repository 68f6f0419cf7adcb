use std::collections::BTreeMap;
use std::fmt::{Debug, Display};
use std::hash::Hash;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

// =============================================================================
// 1. THE ABSTRACTION (Traits with Hooks and DTOs)
// =============================================================================

/// Trait that any record must implement to be stored by ResourceActor.
///
/// Records are never physically removed: deactivation flips a flag and the
/// record drops out of `Get` and active listings.
pub trait Entity: Clone + Send + Sync + 'static {
    type Id: Eq + Ord + Hash + Clone + Send + Sync + Display + Debug;
    type CreatePayload: Send + Sync + Debug;
    type Patch: Send + Sync + Debug;

    fn id(&self) -> &Self::Id;

    /// Construct the full record from the assigned ID and the payload
    fn from_create(id: Self::Id, payload: Self::CreatePayload) -> Result<Self, String>;

    fn is_active(&self) -> bool;

    // --- Lifecycle Hooks ---

    fn on_create(&mut self) -> Result<(), String> { Ok(()) }
    fn on_update(&mut self, patch: Self::Patch) -> Result<(), String>;
    fn on_deactivate(&mut self) -> Result<(), String>;

    // --- Find-or-create ---

    /// How well this record matches a create payload. 0 means no match;
    /// among active records the highest rank wins.
    fn match_rank(&self, _payload: &Self::CreatePayload) -> u8 { 0 }

    /// Fold a matching payload into this record instead of creating a new one.
    fn on_merge(&mut self, _payload: Self::CreatePayload) -> Result<(), String> { Ok(()) }
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum FrameworkError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("Rejected: {0}")]
    Rejected(String),
    #[error("Actor closed")]
    ActorClosed,
    #[error("Actor dropped")]
    ActorDropped,
}

/// Outcome of a find-or-create.
#[derive(Debug, Clone, PartialEq)]
pub struct Upserted<Id> {
    pub id: Id,
    pub created: bool,
}

// =============================================================================
// 2. THE GENERIC MESSAGES
// =============================================================================

pub type Response<T> = oneshot::Sender<Result<T, FrameworkError>>;

#[derive(Debug)]
pub enum ResourceRequest<T: Entity> {
    Create {
        payload: T::CreatePayload,
        respond_to: Response<T::Id>,
    },
    Upsert {
        payload: T::CreatePayload,
        respond_to: Response<Upserted<T::Id>>,
    },
    Get {
        id: T::Id,
        respond_to: Response<Option<T>>,
    },
    List {
        include_inactive: bool,
        respond_to: Response<Vec<T>>,
    },
    Update {
        id: T::Id,
        patch: T::Patch,
        respond_to: Response<T>,
    },
    Deactivate {
        id: T::Id,
        respond_to: Response<()>,
    },
    /// Stops the actor even while client handles are still alive.
    Shutdown,
}

// =============================================================================
// 3. THE GENERIC ACTOR SERVER
// =============================================================================

pub struct ResourceActor<T: Entity> {
    receiver: mpsc::Receiver<ResourceRequest<T>>,
    store: BTreeMap<T::Id, T>,
    next_id_fn: Box<dyn Fn() -> T::Id + Send + Sync>,
}

impl<T: Entity> ResourceActor<T> {
    pub fn new(
        buffer_size: usize,
        next_id_fn: impl Fn() -> T::Id + Send + Sync + 'static
    ) -> (Self, ResourceClient<T>) {
        let (sender, receiver) = mpsc::channel(buffer_size);
        let actor = Self {
            receiver,
            store: BTreeMap::new(),
            next_id_fn: Box::new(next_id_fn),
        };
        let client = ResourceClient { sender };
        (actor, client)
    }

    pub async fn run(mut self) {
        debug!("ResourceActor starting");
        while let Some(msg) = self.receiver.recv().await {
            match msg {
                ResourceRequest::Create { payload, respond_to } => {
                    let _ = respond_to.send(self.create(payload));
                }
                ResourceRequest::Upsert { payload, respond_to } => {
                    let _ = respond_to.send(self.upsert(payload));
                }
                ResourceRequest::Get { id, respond_to } => {
                    let item = self.store.get(&id).filter(|item| item.is_active()).cloned();
                    let _ = respond_to.send(Ok(item));
                }
                ResourceRequest::List { include_inactive, respond_to } => {
                    let items = self
                        .store
                        .values()
                        .filter(|item| include_inactive || item.is_active())
                        .cloned()
                        .collect();
                    let _ = respond_to.send(Ok(items));
                }
                ResourceRequest::Update { id, patch, respond_to } => {
                    let result = match self.active_mut(&id) {
                        Ok(item) => item
                            .on_update(patch)
                            .map(|_| item.clone())
                            .map_err(FrameworkError::Rejected),
                        Err(e) => Err(e),
                    };
                    let _ = respond_to.send(result);
                }
                ResourceRequest::Deactivate { id, respond_to } => {
                    let result = self
                        .active_mut(&id)
                        .and_then(|item| item.on_deactivate().map_err(FrameworkError::Rejected));
                    if result.is_ok() {
                        debug!(id = %id, "Record deactivated");
                    }
                    let _ = respond_to.send(result);
                }
                ResourceRequest::Shutdown => {
                    debug!(records = self.store.len(), "ResourceActor shutting down");
                    break;
                }
            }
        }
    }

    fn active_mut(&mut self, id: &T::Id) -> Result<&mut T, FrameworkError> {
        match self.store.get_mut(id) {
            Some(item) if item.is_active() => Ok(item),
            _ => Err(FrameworkError::NotFound(id.to_string())),
        }
    }

    fn create(&mut self, payload: T::CreatePayload) -> Result<T::Id, FrameworkError> {
        let id = (self.next_id_fn)();
        let mut item = T::from_create(id.clone(), payload).map_err(FrameworkError::Rejected)?;
        item.on_create().map_err(FrameworkError::Rejected)?;
        self.store.insert(id.clone(), item);
        Ok(id)
    }

    /// Match lookup and insert happen inside one message, so two
    /// concurrent find-or-creates for the same person cannot both create.
    fn upsert(&mut self, payload: T::CreatePayload) -> Result<Upserted<T::Id>, FrameworkError> {
        let best = self
            .store
            .values()
            .filter(|item| item.is_active())
            .map(|item| (item.match_rank(&payload), item.id().clone()))
            .filter(|(rank, _)| *rank > 0)
            .max_by(|a, b| a.0.cmp(&b.0).then_with(|| b.1.cmp(&a.1)));

        match best {
            Some((_, id)) => {
                let item = self.active_mut(&id)?;
                if let Err(e) = item.on_merge(payload) {
                    warn!(id = %id, error = %e, "Merge rejected");
                    return Err(FrameworkError::Rejected(e));
                }
                Ok(Upserted { id, created: false })
            }
            None => self.create(payload).map(|id| Upserted { id, created: true }),
        }
    }
}

// =============================================================================
// 4. THE GENERIC CLIENT
// =============================================================================

#[derive(Clone)]
pub struct ResourceClient<T: Entity> {
    sender: mpsc::Sender<ResourceRequest<T>>,
}

impl<T: Entity> ResourceClient<T> {
    pub fn new(sender: mpsc::Sender<ResourceRequest<T>>) -> Self {
        Self { sender }
    }

    async fn request<R>(
        &self,
        build: impl FnOnce(Response<R>) -> ResourceRequest<T>,
    ) -> Result<R, FrameworkError> {
        let (respond_to, response) = oneshot::channel();
        self.sender.send(build(respond_to))
            .await.map_err(|_| FrameworkError::ActorClosed)?;
        response.await.map_err(|_| FrameworkError::ActorDropped)?
    }

    pub async fn create(&self, payload: T::CreatePayload) -> Result<T::Id, FrameworkError> {
        self.request(|respond_to| ResourceRequest::Create { payload, respond_to }).await
    }

    pub async fn upsert(&self, payload: T::CreatePayload) -> Result<Upserted<T::Id>, FrameworkError> {
        self.request(|respond_to| ResourceRequest::Upsert { payload, respond_to }).await
    }

    pub async fn get(&self, id: T::Id) -> Result<Option<T>, FrameworkError> {
        self.request(|respond_to| ResourceRequest::Get { id, respond_to }).await
    }

    pub async fn list(&self, include_inactive: bool) -> Result<Vec<T>, FrameworkError> {
        self.request(|respond_to| ResourceRequest::List { include_inactive, respond_to }).await
    }

    pub async fn update(&self, id: T::Id, patch: T::Patch) -> Result<T, FrameworkError> {
        self.request(|respond_to| ResourceRequest::Update { id, patch, respond_to }).await
    }

    pub async fn deactivate(&self, id: T::Id) -> Result<(), FrameworkError> {
        self.request(|respond_to| ResourceRequest::Deactivate { id, respond_to }).await
    }

    pub async fn shutdown(&self) -> Result<(), FrameworkError> {
        self.sender
            .send(ResourceRequest::Shutdown)
            .await
            .map_err(|_| FrameworkError::ActorClosed)
    }
}

// =============================================================================
// 5. EXAMPLE USAGE (Test)
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU64, Ordering};

    // --- Domain Definition ---

    #[derive(Clone, Debug, PartialEq)]
    struct Supplier {
        id: u64,
        name: String,
        email: String,
        active: bool,
    }

    #[derive(Debug)]
    struct SupplierCreate {
        name: String,
        email: String,
    }

    #[derive(Debug)]
    struct SupplierPatch {
        name: Option<String>,
    }

    impl Entity for Supplier {
        type Id = u64;
        type CreatePayload = SupplierCreate;
        type Patch = SupplierPatch;

        fn id(&self) -> &u64 { &self.id }

        fn from_create(id: u64, payload: SupplierCreate) -> Result<Self, String> {
            if payload.name.is_empty() {
                return Err("name is required".to_string());
            }
            Ok(Self { id, name: payload.name, email: payload.email, active: true })
        }

        fn is_active(&self) -> bool { self.active }

        fn on_update(&mut self, patch: SupplierPatch) -> Result<(), String> {
            if let Some(name) = patch.name {
                self.name = name;
            }
            Ok(())
        }

        fn on_deactivate(&mut self) -> Result<(), String> {
            self.active = false;
            Ok(())
        }

        fn match_rank(&self, payload: &SupplierCreate) -> u8 {
            u8::from(self.email == payload.email)
        }

        fn on_merge(&mut self, payload: SupplierCreate) -> Result<(), String> {
            self.name = payload.name;
            Ok(())
        }
    }

    fn spawn_store() -> ResourceClient<Supplier> {
        let counter = Arc::new(AtomicU64::new(1));
        let next_id = move || counter.fetch_add(1, Ordering::SeqCst);
        let (actor, client) = ResourceActor::new(10, next_id);
        tokio::spawn(actor.run());
        client
    }

    fn create(name: &str, email: &str) -> SupplierCreate {
        SupplierCreate { name: name.into(), email: email.into() }
    }

    #[tokio::test]
    async fn test_resource_actor_create_and_update() {
        let client = spawn_store();

        let id = client.create(create("Stems Ltd", "stems@example.com")).await.unwrap();
        assert_eq!(client.get(id).await.unwrap().map(|s| s.name), Some("Stems Ltd".to_string()));

        let updated = client.update(id, SupplierPatch { name: Some("Stems & Co".into()) }).await.unwrap();
        assert_eq!(updated.name, "Stems & Co");

        let err = client.create(create("", "x@example.com")).await.unwrap_err();
        assert_eq!(err, FrameworkError::Rejected("name is required".into()));
    }

    #[tokio::test]
    async fn deactivated_records_are_hidden_but_kept() {
        let client = spawn_store();
        let id = client.create(create("Stems Ltd", "stems@example.com")).await.unwrap();

        client.deactivate(id).await.unwrap();
        assert_eq!(client.get(id).await.unwrap(), None);
        assert!(client.list(false).await.unwrap().is_empty());
        assert_eq!(client.list(true).await.unwrap().len(), 1);
        assert_eq!(client.deactivate(id).await, Err(FrameworkError::NotFound(id.to_string())));
        assert!(client.update(id, SupplierPatch { name: None }).await.is_err());
    }

    #[tokio::test]
    async fn upsert_merges_into_best_active_match() {
        let client = spawn_store();

        let first = client.upsert(create("Stems", "stems@example.com")).await.unwrap();
        assert!(first.created);
        let again = client.upsert(create("Stems Renamed", "stems@example.com")).await.unwrap();
        assert_eq!(again, Upserted { id: first.id, created: false });
        assert_eq!(client.get(first.id).await.unwrap().unwrap().name, "Stems Renamed");

        client.deactivate(first.id).await.unwrap();
        let fresh = client.upsert(create("Stems", "stems@example.com")).await.unwrap();
        assert!(fresh.created);
        assert_ne!(fresh.id, first.id);
    }

    #[tokio::test]
    async fn shutdown_stops_actor_while_handles_live() {
        let counter = Arc::new(AtomicU64::new(1));
        let (actor, client) = ResourceActor::<Supplier>::new(10, move || counter.fetch_add(1, Ordering::SeqCst));
        let handle = tokio::spawn(actor.run());
        let kept = client.clone();

        client.shutdown().await.unwrap();
        handle.await.unwrap();
        assert_eq!(kept.list(true).await, Err(FrameworkError::ActorClosed));
    }
}
