//! # Loading Bay
//!
//! Order intake, payment review and the truck queue for a single loading bay.
//!
//! ## Core Components
//!
//! - **[model]**: Records kept in store actors ([`Order`](model::Order),
//!   [`DayCounter`](model::DayCounter), [`BaySlot`](model::BaySlot),
//!   [`DeliveryNote`](model::DeliveryNote)).
//! - **[lifecycle]**: The status table every order change goes through.
//! - **[clients]**: Typed, time-bounded wrappers around each store.
//! - **[sequencer]**, **[admission]**, **[wait]**, **[payment]**: Queue numbers, the
//!   one-truck-at-the-bay rule, wait estimates and the payment review steps.
//! - **[ports]**: Notifications and file storage, both replaceable.
//! - **[runtime]**: [`BaySystem`](runtime::BaySystem) wires it all together and exposes
//!   [`BayService`](runtime::BayService).
//!
//! ## Concurrency
//!
//! Nothing holds a lock across an await. Every change is a conditional write against a
//! store actor; the loser of a race gets a conflict and tries again from a fresh read
//! (see [`retry`]).

pub mod admission;
pub mod clients;
pub mod clock;
pub mod config;
pub mod error;
pub mod lifecycle;
pub mod model;
pub mod payment;
pub mod ports;
pub mod retry;
pub mod runtime;
pub mod sequencer;
pub mod wait;
