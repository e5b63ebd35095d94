//! Delivery notes: the paper that leaves the bay with a completed load.

use crate::model::{Driver, ModelError, OrderId, OrderItem};
use actor_framework::ActorEntity;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt::{self, Display};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DeliveryNoteId(pub Uuid);

impl DeliveryNoteId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for DeliveryNoteId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for DeliveryNoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.simple())
    }
}

/// A snapshot of the order at the moment the load left. Later changes to the order do
/// not reach the note.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeliveryNote {
    pub id: DeliveryNoteId,
    pub note_number: String,
    pub token: String,
    pub url: String,
    pub order_id: OrderId,
    pub order_number: String,
    pub sales_name: String,
    pub sales_phone: Option<String>,
    pub items: Vec<OrderItem>,
    pub driver: Driver,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
}

pub type NewDeliveryNote = DeliveryNote;

#[derive(Debug, Clone, PartialEq)]
pub enum DeliveryNoteFilter {
    Token(String),
    Order(OrderId),
}

impl ActorEntity for DeliveryNote {
    type Id = DeliveryNoteId;
    type Create = NewDeliveryNote;
    type Patch = ();
    type Precondition = ();
    type Filter = DeliveryNoteFilter;
    type Sort = ();
    type Error = ModelError;

    fn id(&self) -> &DeliveryNoteId {
        &self.id
    }

    fn from_create_params(note: NewDeliveryNote) -> Result<Self, Self::Error> {
        if note.items.is_empty() {
            return Err(ModelError::Validation("delivery note has no items".into()));
        }
        if note.created_by.trim().is_empty() {
            return Err(ModelError::Validation("delivery note needs an issuer".into()));
        }
        Ok(note)
    }

    fn satisfies(&self, _: &()) -> bool {
        true
    }

    /// Notes are immutable once issued.
    fn apply(&mut self, _: ()) -> Result<(), Self::Error> {
        Err(ModelError::Validation("delivery notes cannot be edited".into()))
    }

    fn matches(&self, filter: &DeliveryNoteFilter) -> bool {
        match filter {
            DeliveryNoteFilter::Token(token) => self.token == *token,
            DeliveryNoteFilter::Order(order_id) => self.order_id == *order_id,
        }
    }

    fn compare(&self, other: &Self, _: &()) -> Ordering {
        self.created_at.cmp(&other.created_at)
    }
}
