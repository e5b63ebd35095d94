use crate::clients::within;
use crate::error::BayError;
use crate::model::{DeliveryNote, DeliveryNoteFilter, DeliveryNoteId, NewDeliveryNote};
use actor_framework::{ActorClient, FrameworkError, Query, ResourceClient};
use std::time::Duration;

/// Client for the delivery note store.
#[derive(Clone)]
pub struct NoteClient {
    inner: ResourceClient<DeliveryNote>,
    timeout: Duration,
}

impl NoteClient {
    pub fn new(inner: ResourceClient<DeliveryNote>, timeout: Duration) -> Self {
        Self { inner, timeout }
    }

    pub async fn create(&self, note: NewDeliveryNote) -> Result<DeliveryNote, BayError> {
        within(self.timeout, "note.create", async {
            self.inner.insert(note).await.map_err(Self::map_error)
        })
        .await
    }

    pub async fn get_by_id(&self, id: DeliveryNoteId) -> Result<DeliveryNote, BayError> {
        within(self.timeout, "note.get", self.get(id))
            .await?
            .ok_or_else(|| BayError::NotFound(format!("delivery note {id}")))
    }

    pub async fn find(&self, filter: DeliveryNoteFilter) -> Result<Option<DeliveryNote>, BayError> {
        within(self.timeout, "note.find", self.find_one(filter)).await
    }

    pub async fn count(&self, filter: DeliveryNoteFilter) -> Result<usize, BayError> {
        within(
            self.timeout,
            "note.count",
            self.query(Query::new(filter, ()).count_only()),
        )
        .await
        .map(|page| page.total)
    }

    pub async fn delete(&self, id: DeliveryNoteId) -> Result<(), BayError> {
        within(self.timeout, "note.delete", async {
            self.inner.delete(id).await.map_err(Self::map_error)
        })
        .await
    }
}

impl ActorClient<DeliveryNote> for NoteClient {
    type Error = BayError;

    fn inner(&self) -> &ResourceClient<DeliveryNote> {
        &self.inner
    }

    fn map_error(e: FrameworkError) -> Self::Error {
        BayError::from(e)
    }
}
