//! # Runtime
//!
//! [`BaySystem`] starts one store actor per record type and hands out a [`BayService`],
//! the command and query surface of the bay. Every command follows the same shape:
//!
//! 1. Read the order.
//! 2. Check the event against the lifecycle table and build a patch.
//! 3. Write the patch with a precondition on what was read.
//! 4. On a conflict, go back to 1 (bounded, with backoff).
//! 5. Notify, best effort.

pub mod bay_system;
pub mod commands;
pub mod queries;

pub use bay_system::{BayDeps, BayService, BayStores, BaySystem};

use crate::model::{DeliveryNote, ItemInput, Order, OrderId, OrderStatus};
use crate::ports::NotificationOutcome;
use crate::wait::WaitEstimate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateOrder {
    pub sales_id: String,
    pub sales_name: String,
    pub sales_phone: Option<String>,
    pub items: Vec<ItemInput>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DriverDetails {
    pub name: String,
    pub phone: String,
    pub plate: String,
}

/// How a client names an order: staff use the id, drivers hold the invoice token.
#[derive(Debug, Clone, PartialEq)]
pub enum OrderRef {
    Id(OrderId),
    Token(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QueueFilter {
    /// Queued and Loading.
    #[default]
    InLine,
    Queued,
    Loading,
    Completed,
}

/// The order as the command left it, plus what happened to the notification.
#[derive(Debug, Clone)]
pub struct CommandOutcome {
    pub order: Order,
    pub notification: NotificationOutcome,
}

#[derive(Debug, Clone)]
pub struct DeliveryOutcome {
    pub order: Order,
    pub note: DeliveryNote,
    pub notification: NotificationOutcome,
}

#[derive(Debug, Clone)]
pub struct QueueOverview {
    pub loading: Option<Order>,
    pub queued: usize,
    pub next_arrival: WaitEstimate,
}

pub type OrderStats = BTreeMap<OrderStatus, usize>;
