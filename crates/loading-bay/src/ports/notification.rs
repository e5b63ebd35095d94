//! # Notifications
//!
//! Best-effort messages to the sales contact when an order changes. A failed notification
//! never undoes the change that triggered it: [`dispatch`] logs the failure and reports
//! [`NotificationOutcome::FailedSilently`].

use crate::model::Order;
use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    Invoice,
    PaymentVerified,
    PaymentRejected,
    QueueEntered,
    LoadingCalled,
    LoadingFinished,
    DeliveryNote,
    Cancelled,
}

/// What a channel did with a message it accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    Sent,
    /// Not sent; the recipient can open this link instead.
    Link(String),
}

/// Result of a notification attempt, returned alongside the command result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "via", content = "url")]
pub enum NotificationOutcome {
    Sent,
    FallbackLink(String),
    FailedSilently,
    NotAttempted,
}

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("Notification channel unavailable: {0}")]
    Unavailable(String),
}

#[async_trait]
pub trait NotificationPort: Send + Sync {
    async fn notify(
        &self,
        order: &Order,
        kind: NotificationKind,
    ) -> Result<Delivery, NotifyError>;
}

/// Send `kind` for `order`, bounded by `timeout`. Never fails.
pub async fn dispatch(
    port: &dyn NotificationPort,
    order: &Order,
    kind: NotificationKind,
    timeout: Duration,
) -> NotificationOutcome {
    match tokio::time::timeout(timeout, port.notify(order, kind)).await {
        Ok(Ok(Delivery::Sent)) => {
            debug!(order_id = %order.id, ?kind, "Notification sent");
            NotificationOutcome::Sent
        }
        Ok(Ok(Delivery::Link(url))) => {
            debug!(order_id = %order.id, ?kind, %url, "Notification fell back to link");
            NotificationOutcome::FallbackLink(url)
        }
        Ok(Err(e)) => {
            warn!(order_id = %order.id, ?kind, error = %e, "Notification failed");
            NotificationOutcome::FailedSilently
        }
        Err(_) => {
            warn!(order_id = %order.id, ?kind, ?timeout, "Notification timed out");
            NotificationOutcome::FailedSilently
        }
    }
}

/// A channel that never sends anything and points the recipient at the client page
/// matching the event.
#[derive(Debug, Clone)]
pub struct LinkNotifier {
    base_url: String,
}

impl LinkNotifier {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn page(&self, token: &str) -> String {
        format!("{}/order/{}", self.base_url, token)
    }
}

#[async_trait]
impl NotificationPort for LinkNotifier {
    async fn notify(&self, order: &Order, kind: NotificationKind) -> Result<Delivery, NotifyError> {
        let url = match kind {
            NotificationKind::QueueEntered
            | NotificationKind::LoadingCalled
            | NotificationKind::LoadingFinished => match &order.queue_token {
                Some(token) => self.page(token),
                None => order.invoice_url.clone(),
            },
            NotificationKind::DeliveryNote => order
                .delivery_note_url
                .clone()
                .unwrap_or_else(|| order.invoice_url.clone()),
            NotificationKind::Invoice
            | NotificationKind::PaymentVerified
            | NotificationKind::PaymentRejected
            | NotificationKind::Cancelled => self.page(&order.invoice_token),
        };
        Ok(Delivery::Link(url))
    }
}
