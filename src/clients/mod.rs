//! Cloneable handles used to talk to the actors.

/// Generates a request/reply client method for a hand-written service.
///
/// The request variant must carry the method parameters as named fields
/// plus a `respond_to` oneshot sender.
macro_rules! client_method {
    ($client:ty => fn $method:ident($($param:ident: $param_type:ty),*) -> $return_type:ty as $request:ident::$variant:ident, Error = $error_type:ty) => {
        impl $client {
            #[tracing::instrument(skip(self))]
            pub async fn $method(&self, $($param: $param_type),*) -> Result<$return_type, $error_type> {
                tracing::debug!("Sending request");
                let (respond_to, response) = tokio::sync::oneshot::channel();
                self.sender.send($request::$variant {
                    $($param,)*
                    respond_to,
                }).await.map_err(|_| <$error_type>::ActorCommunicationError("Actor closed".to_string()))?;

                response.await.map_err(|_| <$error_type>::ActorCommunicationError("Actor dropped".to_string()))?
            }
        }
    };
}

#[macro_use]
mod macros;

pub mod directory;
pub mod order_client;
pub mod order_store_client;
pub mod rate_limit_client;

pub use directory::*;
pub use order_client::*;
pub use order_store_client::*;
pub use rate_limit_client::*;
