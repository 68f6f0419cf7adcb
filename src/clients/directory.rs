use chrono::{DateTime, Utc};
use tracing::{debug, info, instrument};

use crate::actor_framework::{ResourceClient, Upserted};
use crate::client_directory::ClientError;
use crate::domain::{Client, ClientCreate, ClientPatch, ContactDetails};
use crate::lifecycle::search_clients;

/// Client records, backed by a generic [`ResourceClient`].
#[derive(Clone)]
pub struct ClientDirectory {
    inner: ResourceClient<Client>,
}

impl_basic_client!(ClientDirectory, Client, u64, ClientError, client);

impl ClientDirectory {
    #[instrument(skip(self))]
    pub async fn create_client(&self, client: ClientCreate) -> Result<u64, ClientError> {
        debug!("Sending request");
        self.inner.create(client).await.map_err(ClientError::from)
    }

    #[instrument(skip(self))]
    pub async fn update_client(&self, id: u64, patch: ClientPatch) -> Result<Client, ClientError> {
        debug!("Sending request");
        self.inner.update(id, patch).await.map_err(ClientError::from)
    }

    /// Resolves the active client whose email (preferred) or phone matches,
    /// creating one when nothing matches. The match and the insert happen in
    /// one actor turn; `created` tells the caller which case it got.
    #[instrument(skip(self, contact), fields(email = %contact.email))]
    pub async fn find_or_create(&self, contact: ContactDetails, now: DateTime<Utc>) -> Result<Upserted<u64>, ClientError> {
        let payload = ClientCreate {
            name: contact.name,
            phone: contact.phone,
            email: contact.email,
            address: contact.address,
            notes: String::new(),
            created_at: now,
        };
        let upserted = self.inner.upsert(payload).await.map_err(ClientError::from)?;
        if upserted.created {
            info!(client_id = upserted.id, "New client created from submission");
        } else {
            debug!(client_id = upserted.id, "Matched existing client");
        }
        Ok(upserted)
    }

    /// Every client ever stored, deactivated ones included, for resolving
    /// names on historical orders.
    #[instrument(skip(self))]
    pub async fn list_all_clients(&self) -> Result<Vec<Client>, ClientError> {
        debug!("Sending request");
        self.inner.list(true).await.map_err(ClientError::from)
    }

    #[instrument(skip(self))]
    pub async fn shutdown(&self) -> Result<(), ClientError> {
        debug!("Sending request");
        self.inner.shutdown().await.map_err(ClientError::from)
    }

    /// Active clients matching `query` on name, email or phone, by name.
    #[instrument(skip(self))]
    pub async fn search_clients(&self, query: &str) -> Result<Vec<Client>, ClientError> {
        let clients = self.list_clients().await?;
        Ok(search_clients(&clients, query).into_iter().cloned().collect())
    }
}
