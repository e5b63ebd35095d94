//! Read-only views. Nothing here writes or caches.

use crate::config::BayConfig;
use crate::error::BayError;
use crate::model::{
    DeliveryNote, DeliveryNoteFilter, DeliveryNoteId, Order, OrderFilter, OrderId, OrderSort,
    OrderStatus, PaymentStatus,
};
use crate::runtime::{BayService, OrderStats, QueueFilter, QueueOverview};
use crate::wait::WaitEstimate;
use actor_framework::Page;

impl QueueFilter {
    fn to_order_filter(self) -> OrderFilter {
        match self {
            QueueFilter::InLine => OrderFilter::InLine,
            QueueFilter::Queued => OrderFilter::Status(OrderStatus::Queued),
            QueueFilter::Loading => OrderFilter::Status(OrderStatus::Loading),
            QueueFilter::Completed => OrderFilter::Status(OrderStatus::Completed),
        }
    }
}

impl BayService {
    pub fn config(&self) -> &BayConfig {
        &self.config
    }

    pub async fn order(&self, id: OrderId) -> Result<Order, BayError> {
        self.orders.get_by_id(id).await
    }

    /// Look up by invoice token or queue token.
    pub async fn order_by_token(&self, token: &str) -> Result<Order, BayError> {
        self.orders
            .find_by_token(OrderFilter::Token(token.to_string()))
            .await?
            .ok_or_else(|| BayError::NotFound("order for token".into()))
    }

    /// Every order, or those in `status`, newest first.
    pub async fn orders(
        &self,
        status: Option<OrderStatus>,
        skip: usize,
        limit: usize,
    ) -> Result<Page<Order>, BayError> {
        let filter = status.map_or(OrderFilter::All, OrderFilter::Status);
        self.orders
            .list(filter, OrderSort::NewestFirst, skip, Some(limit))
            .await
    }

    /// Orders in line, smallest ticket first.
    pub async fn queue(
        &self,
        filter: QueueFilter,
        skip: usize,
        limit: usize,
    ) -> Result<Page<Order>, BayError> {
        self.orders
            .list(filter.to_order_filter(), OrderSort::Ticket, skip, Some(limit))
            .await
    }

    pub async fn current_loading(&self) -> Result<Option<Order>, BayError> {
        self.admission.current_loading().await
    }

    /// Proofs waiting for review, newest upload first.
    pub async fn pending_payments(
        &self,
        skip: usize,
        limit: usize,
    ) -> Result<Page<Order>, BayError> {
        self.orders
            .list(OrderFilter::AwaitingReview, OrderSort::NewestProofFirst, skip, Some(limit))
            .await
    }

    /// Orders whose payment is in `status`, most recently changed first.
    pub async fn payments(
        &self,
        status: PaymentStatus,
        skip: usize,
        limit: usize,
    ) -> Result<Page<Order>, BayError> {
        self.orders
            .list(OrderFilter::Payment(status), OrderSort::RecentlyUpdated, skip, Some(limit))
            .await
    }

    /// Completed orders still waiting for a delivery note, most recently finished first.
    pub async fn ready_for_delivery_note(
        &self,
        skip: usize,
        limit: usize,
    ) -> Result<Page<Order>, BayError> {
        self.orders
            .list(
                OrderFilter::AwaitingDeliveryNote,
                OrderSort::RecentlyCompleted,
                skip,
                Some(limit),
            )
            .await
    }

    pub async fn wait_estimate(&self, id: OrderId) -> Result<WaitEstimate, BayError> {
        let order = self.orders.get_by_id(id).await?;
        self.estimator.estimate(&order).await
    }

    pub async fn queue_overview(&self) -> Result<QueueOverview, BayError> {
        Ok(QueueOverview {
            loading: self.current_loading().await?,
            queued: self
                .orders
                .count(OrderFilter::Status(OrderStatus::Queued))
                .await?,
            next_arrival: self.estimator.for_new_arrival().await?,
        })
    }

    /// Number of orders in each status.
    pub async fn stats(&self) -> Result<OrderStats, BayError> {
        let mut stats = OrderStats::new();
        for status in OrderStatus::ALL {
            let count = self.orders.count(OrderFilter::Status(status)).await?;
            stats.insert(status, count);
        }
        Ok(stats)
    }

    pub async fn delivery_note(&self, id: DeliveryNoteId) -> Result<DeliveryNote, BayError> {
        self.notes.get_by_id(id).await
    }

    pub async fn delivery_note_by_token(&self, token: &str) -> Result<DeliveryNote, BayError> {
        self.notes
            .find(DeliveryNoteFilter::Token(token.to_string()))
            .await?
            .ok_or_else(|| BayError::NotFound("delivery note for token".into()))
    }

    pub async fn delivery_note_for_order(
        &self,
        order_id: OrderId,
    ) -> Result<Option<DeliveryNote>, BayError> {
        self.notes.find(DeliveryNoteFilter::Order(order_id)).await
    }

    pub async fn delivery_note_count(&self, order_id: OrderId) -> Result<usize, BayError> {
        self.notes.count(DeliveryNoteFilter::Order(order_id)).await
    }
}
