//! Records kept by the bay's stores.
//!
//! Each record type implements [`ActorEntity`](actor_framework::ActorEntity) and is owned
//! by its own `ResourceActor`: orders, per-day queue counters, the bay pointer and
//! delivery notes.

pub mod bay_slot;
pub mod counter;
pub mod delivery_note;
pub mod order;
pub mod status;

pub use bay_slot::{BayId, BayPatch, BayPrecondition, BaySlot};
pub use counter::{CounterPatch, CounterPrecondition, DayCounter};
pub use delivery_note::{DeliveryNote, DeliveryNoteFilter, DeliveryNoteId, NewDeliveryNote};
pub use order::{
    Driver, ItemInput, NewOrder, Order, OrderFilter, OrderId, OrderItem, OrderPatch,
    OrderPrecondition, OrderSort, PaymentProof, QueueTicket, Rejection, VehiclePhoto,
};
pub use status::{OrderEvent, OrderStatus, PaymentStatus};

use thiserror::Error;

/// Errors raised by a record while it is being created or patched.
///
/// These travel through the store as `FrameworkError::EntityError` and are recovered
/// into [`BayError`](crate::error::BayError) by the clients.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ModelError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Cannot {event} an order that is {status}")]
    InvalidTransition {
        status: OrderStatus,
        event: OrderEvent,
    },
}
