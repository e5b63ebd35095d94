//! # Store Clients
//!
//! Typed wrappers around each store actor. Every call is bounded by the configured store
//! timeout and maps framework errors into [`BayError`].

pub mod bay_client;
pub mod counter_client;
pub mod note_client;
pub mod order_client;

pub use bay_client::BayClient;
pub use counter_client::CounterClient;
pub use note_client::NoteClient;
pub use order_client::OrderClient;

use crate::error::BayError;
use std::future::Future;
use std::time::Duration;
use tracing::warn;

/// Await `call`, giving up after `timeout`. A store that does not answer in time is
/// reported as unavailable.
pub(crate) async fn within<T>(
    timeout: Duration,
    operation: &'static str,
    call: impl Future<Output = Result<T, BayError>>,
) -> Result<T, BayError> {
    match tokio::time::timeout(timeout, call).await {
        Ok(result) => result,
        Err(_) => {
            warn!(operation, ?timeout, "Store call timed out");
            Err(BayError::Dependency(format!(
                "{operation} timed out after {timeout:?}"
            )))
        }
    }
}
