//! # Admission Controller
//!
//! Decides which truck enters the bay next and keeps the bay to one truck at a time.
//!
//! The bay pointer is a single record naming the order that holds the bay. Admission
//! claims it with a compare-and-swap from free to the chosen order before that order is
//! moved to Loading, and `finish_loading` clears it only after the order is Completed.
//! Two callers cannot both claim a free pointer, so two orders can never be Loading
//! together.
//!
//! ## One attempt of `call_next`
//!
//! 1. Pick the Queued order with the smallest ticket; none means `EmptyQueue`. Note
//!    which order, if any, is Loading.
//! 2. Read the pointer. If it names a Loading order the bay is busy. If it names an
//!    order still Queued, that order's admission was interrupted or is in flight, and
//!    this caller finishes it. If it names a finished or missing order it is stale: it
//!    is released and the attempt starts over.
//! 3. With the pointer free, an order seen Loading in step 1 and still Loading now has
//!    held the bay without the pointer the whole time: `AlreadyLoading`. If it has moved
//!    on, the read raced a finish: retry.
//! 4. Claim the pointer for the chosen order, then move the order from Queued to
//!    Loading.
//!
//! Conflicts are retried with backoff, re-reading everything.
//!
//! ## Lost replies
//!
//! A store call that times out may still have landed. The store answers requests in the
//! order they arrive, so a read sent after the timeout shows whether it did. A claim that
//! landed is carried on to Loading. A failed move to Loading looks at the order before
//! touching the pointer: the pointer is released only once its order has left the line.

use crate::clients::{BayClient, OrderClient};
use crate::clock::Clock;
use crate::error::{AdmissionError, BayError};
use crate::lifecycle;
use crate::model::{
    Order, OrderEvent, OrderFilter, OrderId, OrderPatch, OrderPrecondition, OrderSort,
    OrderStatus,
};
use crate::retry::RetryPolicy;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

#[derive(Clone)]
pub struct AdmissionController {
    orders: OrderClient,
    bay: BayClient,
    retry: RetryPolicy,
    clock: Arc<dyn Clock>,
}

impl AdmissionController {
    pub fn new(
        orders: OrderClient,
        bay: BayClient,
        retry: RetryPolicy,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            orders,
            bay,
            retry,
            clock,
        }
    }

    /// Move the next Queued order into the bay.
    #[instrument(skip(self))]
    pub async fn call_next(&self) -> Result<Order, BayError> {
        let order = self
            .retry
            .run("call_next", move |attempt| self.try_call_next(attempt))
            .await?;
        info!(order_id = %order.id, queue_number = ?order.queue_number(), "Order entered loading");
        Ok(order)
    }

    async fn try_call_next(&self, attempt: u32) -> Result<Order, BayError> {
        let next = self
            .orders
            .first(OrderFilter::Status(OrderStatus::Queued), OrderSort::Ticket)
            .await?
            .ok_or(AdmissionError::EmptyQueue)?;
        let loading = self.current_loading().await?;

        if let Some(holder) = self.bay.slot().await?.current {
            return self.resume(holder, attempt).await;
        }

        if let Some(stray) = loading {
            if self.orders.get_by_id(stray.id).await?.status == OrderStatus::Loading {
                warn!(order_id = %stray.id, "An order is loading while the bay is free");
                return Err(AdmissionError::AlreadyLoading.into());
            }
            return Err(BayError::Conflict(format!(
                "order {} left the bay during admission (attempt {attempt})",
                stray.id
            )));
        }

        match self.bay.occupy(next.id).await {
            Ok(_) => {}
            Err(BayError::Dependency(reason)) => {
                if self.bay.slot().await?.current != Some(next.id) {
                    return Err(BayError::Dependency(reason));
                }
                debug!(order_id = %next.id, "Bay claim landed without a reply");
            }
            Err(e) => return Err(e),
        }
        self.start_loading(next.id).await
    }

    /// Act on the order the bay pointer names.
    async fn resume(&self, holder: OrderId, attempt: u32) -> Result<Order, BayError> {
        let status = match self.orders.get_by_id(holder).await {
            Ok(order) => Some(order.status),
            Err(BayError::NotFound(_)) => None,
            Err(e) => return Err(e),
        };

        match status {
            Some(OrderStatus::Loading) => Err(AdmissionError::BayBusy.into()),
            Some(OrderStatus::Queued) => {
                debug!(order_id = %holder, attempt, "Finishing admission of the bay holder");
                self.start_loading(holder).await
            }
            _ => {
                warn!(order_id = %holder, ?status, "Releasing stale bay pointer");
                self.bay.release(holder).await?;
                Err(BayError::Conflict(format!(
                    "released stale bay pointer for order {holder} (attempt {attempt})"
                )))
            }
        }
    }

    /// Move `order_id`, which holds the bay, from Queued to Loading.
    async fn start_loading(&self, order_id: OrderId) -> Result<Order, BayError> {
        let patch = OrderPatch::StartLoading {
            at: self.clock.now(),
        };
        let err = match self
            .orders
            .conditional_update(order_id, OrderPrecondition::Status(OrderStatus::Queued), patch)
            .await
        {
            Ok(order) => return Ok(order),
            Err(e) => e,
        };

        let order = match self.orders.get_by_id(order_id).await {
            Ok(order) => Some(order),
            Err(BayError::NotFound(_)) => None,
            Err(read) => {
                warn!(order_id = %order_id, error = %read, "Order unreadable, bay left claimed");
                return Err(err);
            }
        };

        match order {
            Some(order) if order.status == OrderStatus::Loading => match err {
                BayError::Dependency(_) => {
                    debug!(order_id = %order_id, "Start of loading landed without a reply");
                    Ok(order)
                }
                _ => Err(BayError::Conflict(format!(
                    "order {order_id} was admitted by another caller"
                ))),
            },
            // Still claimed; the next attempt finishes the admission.
            Some(order) if order.status == OrderStatus::Queued => Err(err),
            _ => {
                warn!(order_id = %order_id, error = %err, "Order left the queue during admission");
                if let Err(release) = self.bay.release(order_id).await {
                    warn!(order_id = %order_id, error = %release, "Could not release the bay");
                }
                Err(err)
            }
        }
    }

    /// Complete the order in the bay and free the bay.
    #[instrument(skip(self), fields(order_id = %order_id))]
    pub async fn finish_loading(&self, order_id: OrderId) -> Result<Order, BayError> {
        let orders = &self.orders;
        let clock = &self.clock;
        let done = self
            .retry
            .run("finish_loading", move |_| async move {
                let order = orders.get_by_id(order_id).await?;
                lifecycle::admit(&order, OrderEvent::FinishLoading)?;
                orders
                    .conditional_update(
                        order_id,
                        OrderPrecondition::Revision(order.revision),
                        OrderPatch::FinishLoading { at: clock.now() },
                    )
                    .await
            })
            .await?;

        // A pointer left behind here is released by the next call_next.
        if let Err(e) = self.bay.release(order_id).await {
            warn!(error = %e, "Bay pointer not released after loading");
        }
        info!("Loading finished");
        Ok(done)
    }

    pub async fn current_loading(&self) -> Result<Option<Order>, BayError> {
        self.orders
            .first(OrderFilter::Status(OrderStatus::Loading), OrderSort::Ticket)
            .await
    }
}
