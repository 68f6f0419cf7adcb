use tokio::sync::mpsc;
use tracing::{debug, info, instrument};

use super::{RateLimitConfig, RateLimiter};
use crate::clients::RateLimitClient;
use crate::messages::RateLimitRequest;

/// Owns the limiter state for the whole process. Every check for every
/// key goes through this one task, so concurrent submissions from the same
/// key cannot lose updates.
pub struct RateLimitService {
    receiver: mpsc::Receiver<RateLimitRequest>,
    limiter: RateLimiter,
}

impl RateLimitService {
    pub fn new(buffer_size: usize, config: RateLimitConfig) -> (Self, RateLimitClient) {
        let (sender, receiver) = mpsc::channel(buffer_size);
        let service = Self {
            receiver,
            limiter: RateLimiter::new(config),
        };
        (service, RateLimitClient::new(sender))
    }

    #[instrument(name = "rate_limit_service", skip(self))]
    pub async fn run(mut self) {
        info!(
            max_attempts = self.limiter.config().max_attempts,
            window_secs = self.limiter.config().window_secs,
            "RateLimitService starting"
        );
        while let Some(msg) = self.receiver.recv().await {
            match msg {
                RateLimitRequest::CheckRateLimit { key, now, respond_to } => {
                    let admission = self.limiter.check_and_record(&key, now);
                    let _ = respond_to.send(Ok(admission));
                }
                RateLimitRequest::ResetKey { key, respond_to } => {
                    debug!(key = %key, "Resetting rate limit key");
                    self.limiter.reset(&key);
                    let _ = respond_to.send(Ok(()));
                }
                RateLimitRequest::Shutdown => {
                    info!("RateLimitService shutting down");
                    break;
                }
                #[cfg(test)]
                RateLimitRequest::GetTrackedKeys { respond_to } => {
                    let _ = respond_to.send(Ok(self.limiter.tracked_keys()));
                }
            }
        }
        info!("RateLimitService stopped");
    }
}
