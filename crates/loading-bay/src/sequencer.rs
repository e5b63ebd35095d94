//! # Queue Sequencer
//!
//! Issues queue numbers: 1, 2, 3, ... per business day, with no duplicate and no gap
//! however callers interleave.
//!
//! Each day has one counter record. A caller reads it and compare-and-swaps `n` to
//! `n + 1`; if another caller moved it first the write comes back as a conflict and the
//! caller reads again. The first caller of a day creates the counter already holding 1.
//! If two callers race to create it, the loser sees `AlreadyExists` and retries against
//! the record the winner created.

use crate::clients::CounterClient;
use crate::error::BayError;
use crate::retry::RetryPolicy;
use chrono::NaiveDate;
use tracing::{info, instrument, warn};

#[derive(Clone)]
pub struct QueueSequencer {
    counters: CounterClient,
    retry: RetryPolicy,
}

impl QueueSequencer {
    pub fn new(counters: CounterClient, retry: RetryPolicy) -> Self {
        Self { counters, retry }
    }

    #[instrument(skip(self), fields(day = %day))]
    pub async fn next_queue_number(&self, day: NaiveDate) -> Result<u32, BayError> {
        let counters = &self.counters;
        let number = self
            .retry
            .run("next_queue_number", move |_| async move {
                match counters.current(day).await? {
                    None => counters.start(day).await.map(|c| c.value),
                    Some(counter) => {
                        let next = counter.value.checked_add(1).ok_or_else(|| {
                            BayError::Validation(format!("queue numbers for {day} are exhausted"))
                        })?;
                        counters
                            .compare_and_set(day, counter.value, next)
                            .await
                            .map(|c| c.value)
                    }
                }
            })
            .await?;
        info!(queue_number = number, "Queue number issued");
        Ok(number)
    }

    /// Return `number` after the order it was issued for could not be queued.
    ///
    /// Succeeds only while `number` is still the last one issued that day. If someone
    /// took a later number in between, `number` stays burnt and the gap is logged.
    pub async fn give_back(&self, day: NaiveDate, number: u32) {
        match self.counters.give_back(day, number).await {
            Ok(_) => info!(%day, queue_number = number, "Queue number returned"),
            Err(e) => warn!(%day, queue_number = number, error = %e, "Queue number left unused"),
        }
    }
}
