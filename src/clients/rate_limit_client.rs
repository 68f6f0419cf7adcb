use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use tracing::{debug, instrument};

use crate::messages::RateLimitRequest;
use crate::rate_limiter::{Admission, RateLimitError};

/// Handle to the [`RateLimitService`](crate::rate_limiter::RateLimitService).
#[derive(Clone)]
pub struct RateLimitClient {
    sender: mpsc::Sender<RateLimitRequest>,
}

impl RateLimitClient {
    pub fn new(sender: mpsc::Sender<RateLimitRequest>) -> Self {
        Self { sender }
    }

    #[instrument(skip(self))]
    pub async fn shutdown(&self) -> Result<(), RateLimitError> {
        debug!("Sending request");
        self.sender
            .send(RateLimitRequest::Shutdown)
            .await
            .map_err(|_| RateLimitError::ActorCommunicationError("Actor closed".to_string()))
    }
}

client_method!(RateLimitClient => fn check_rate_limit(key: String, now: DateTime<Utc>) -> Admission as RateLimitRequest::CheckRateLimit, Error = RateLimitError);
client_method!(RateLimitClient => fn reset_key(key: String) -> () as RateLimitRequest::ResetKey, Error = RateLimitError);
#[cfg(test)]
client_method!(RateLimitClient => fn get_tracked_keys() -> usize as RateLimitRequest::GetTrackedKeys, Error = RateLimitError);
