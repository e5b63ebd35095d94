use crate::clients::within;
use crate::error::BayError;
use crate::model::{BayId, BayPatch, BayPrecondition, BaySlot, OrderId};
use actor_framework::{ActorClient, FrameworkError, ResourceClient};
use std::time::Duration;
use tracing::instrument;

/// Client for the singleton bay pointer.
#[derive(Clone)]
pub struct BayClient {
    inner: ResourceClient<BaySlot>,
    timeout: Duration,
}

impl BayClient {
    pub fn new(inner: ResourceClient<BaySlot>, timeout: Duration) -> Self {
        Self { inner, timeout }
    }

    /// Create the free bay record if it does not exist yet.
    pub async fn install(&self) -> Result<BaySlot, BayError> {
        within(self.timeout, "bay.install", async {
            match self.inner.insert(()).await {
                Ok(slot) => Ok(slot),
                Err(FrameworkError::AlreadyExists(_)) => self.slot().await,
                Err(e) => Err(Self::map_error(e)),
            }
        })
        .await
    }

    pub async fn slot(&self) -> Result<BaySlot, BayError> {
        within(self.timeout, "bay.get", self.get(BayId))
            .await?
            .ok_or_else(|| BayError::Dependency("bay record is not installed".into()))
    }

    /// Claim the bay for `order_id`. `Conflict` if someone holds it.
    #[instrument(skip(self), fields(order_id = %order_id))]
    pub async fn occupy(&self, order_id: OrderId) -> Result<BaySlot, BayError> {
        within(self.timeout, "bay.occupy", async {
            self.inner
                .update_if(BayId, BayPrecondition::Free, BayPatch::Occupy(order_id))
                .await
                .map_err(Self::map_error)
        })
        .await
    }

    /// Free the bay if `order_id` still holds it. `Conflict` otherwise.
    #[instrument(skip(self), fields(order_id = %order_id))]
    pub async fn release(&self, order_id: OrderId) -> Result<BaySlot, BayError> {
        within(self.timeout, "bay.release", async {
            self.inner
                .update_if(BayId, BayPrecondition::HeldBy(order_id), BayPatch::Release)
                .await
                .map_err(Self::map_error)
        })
        .await
    }
}

impl ActorClient<BaySlot> for BayClient {
    type Error = BayError;

    fn inner(&self) -> &ResourceClient<BaySlot> {
        &self.inner
    }

    fn map_error(e: FrameworkError) -> Self::Error {
        BayError::from(e)
    }
}
