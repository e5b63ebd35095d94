//! # Wait Estimator
//!
//! A wait is the number of trucks ahead times a fixed slot. Nothing is cached: every
//! estimate counts the line as it is at that moment.

use crate::clients::OrderClient;
use crate::clock::{BusinessCalendar, Clock};
use crate::error::BayError;
use crate::model::{Order, OrderFilter};
use chrono::Duration;
use serde::Serialize;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WaitEstimate {
    pub orders_ahead: usize,
    pub wait_minutes: u64,
    /// Local wall-clock time the truck is expected at the bay, `HH:MM`.
    pub estimated_time: String,
}

pub fn estimated_wait(orders_ahead: usize, slot_minutes: u32) -> u64 {
    orders_ahead as u64 * u64::from(slot_minutes)
}

#[derive(Clone)]
pub struct WaitEstimator {
    orders: OrderClient,
    slot_minutes: u32,
    calendar: BusinessCalendar,
    clock: Arc<dyn Clock>,
}

impl WaitEstimator {
    pub fn new(
        orders: OrderClient,
        slot_minutes: u32,
        calendar: BusinessCalendar,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            orders,
            slot_minutes,
            calendar,
            clock,
        }
    }

    /// Queued or Loading orders holding a smaller ticket. An order without a ticket yet
    /// is behind everyone in line; a finished order waits for nobody.
    pub async fn orders_ahead(&self, order: &Order) -> Result<usize, BayError> {
        if order.status.is_terminal() {
            return Ok(0);
        }
        match order.queue_ticket {
            Some(ticket) => self.orders.count(OrderFilter::AheadOf(ticket)).await,
            None => self.orders.count(OrderFilter::InLine).await,
        }
    }

    pub async fn estimate(&self, order: &Order) -> Result<WaitEstimate, BayError> {
        let ahead = self.orders_ahead(order).await?;
        Ok(self.from_ahead(ahead))
    }

    /// What a truck joining the line now would wait.
    pub async fn for_new_arrival(&self) -> Result<WaitEstimate, BayError> {
        let ahead = self.orders.count(OrderFilter::InLine).await?;
        Ok(self.from_ahead(ahead))
    }

    fn from_ahead(&self, orders_ahead: usize) -> WaitEstimate {
        let wait_minutes = estimated_wait(orders_ahead, self.slot_minutes);
        // Capped at a week so absurd queues cannot overflow the timestamp.
        let minutes = wait_minutes.min(7 * 24 * 60) as i64;
        let eta = self.clock.now() + Duration::minutes(minutes);
        WaitEstimate {
            orders_ahead,
            wait_minutes,
            estimated_time: self.calendar.local(eta).format("%H:%M").to_string(),
        }
    }
}
