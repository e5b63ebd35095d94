use crate::clients::within;
use crate::error::BayError;
use crate::model::{CounterPatch, CounterPrecondition, DayCounter};
use actor_framework::{ActorClient, FrameworkError, ResourceClient};
use chrono::NaiveDate;
use std::time::Duration;

/// Client for the per-day queue counters.
#[derive(Clone)]
pub struct CounterClient {
    inner: ResourceClient<DayCounter>,
    timeout: Duration,
}

impl CounterClient {
    pub fn new(inner: ResourceClient<DayCounter>, timeout: Duration) -> Self {
        Self { inner, timeout }
    }

    pub async fn current(&self, day: NaiveDate) -> Result<Option<DayCounter>, BayError> {
        within(self.timeout, "counter.get", self.get(day)).await
    }

    /// Create the day's counter holding 1. Losing the race to another creator is a
    /// `Conflict`.
    pub async fn start(&self, day: NaiveDate) -> Result<DayCounter, BayError> {
        within(self.timeout, "counter.start", async {
            self.inner.insert(day).await.map_err(Self::map_error)
        })
        .await
    }

    /// Move the counter from `expected` to `next`, or `Conflict` if it moved first.
    pub async fn compare_and_set(
        &self,
        day: NaiveDate,
        expected: u32,
        next: u32,
    ) -> Result<DayCounter, BayError> {
        within(self.timeout, "counter.cas", async {
            self.inner
                .update_if(day, CounterPrecondition(expected), CounterPatch::Set(next))
                .await
                .map_err(Self::map_error)
        })
        .await
    }

    /// Roll the counter back from `number` to `number - 1`, or `Conflict` if another
    /// number was issued since.
    pub async fn give_back(&self, day: NaiveDate, number: u32) -> Result<DayCounter, BayError> {
        within(self.timeout, "counter.give_back", async {
            self.inner
                .update_if(day, CounterPrecondition(number), CounterPatch::Return)
                .await
                .map_err(Self::map_error)
        })
        .await
    }
}

impl ActorClient<DayCounter> for CounterClient {
    type Error = BayError;

    fn inner(&self) -> &ResourceClient<DayCounter> {
        &self.inner
    }

    fn map_error(e: FrameworkError) -> Self::Error {
        BayError::from(e)
    }
}
