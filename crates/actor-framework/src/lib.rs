//! # Actor Framework
//!
//! Building blocks for type-safe, concurrent record stores on top of the **Actor Model**.
//! Each store is one Tokio task that owns a map of records and processes requests
//! sequentially; callers talk to it through a cloneable client.
//!
//! ## Why Actors for a Store?
//!
//! - Isolated state (no shared memory, no locks)
//! - Message-passing concurrency
//! - Sequential processing within each actor, so a check and a write in the same message
//!   cannot be interleaved with another caller
//!
//! The last point is what the framework builds on. Every mutation is a **conditional write**:
//! the caller states what the record must look like (a precondition) and what should change
//! (a patch). Two callers racing on the same record get one success and one
//! [`FrameworkError::Conflict`]. Higher layers turn that into compare-and-swap loops for
//! counters, pointers and state machines.
//!
//! **Further Reading**:
//! - [Actor Model (Wikipedia)](https://en.wikipedia.org/wiki/Actor_model)
//! - [Actors in Rust](https://ryhl.io/blog/actors-with-tokio/) - Actors on Tokio in practice
//!
//! ## Architecture Overview
//!
//! 1. **Entity Layer** ([`ActorEntity`]) - Your records, patches, preconditions and queries
//! 2. **Runtime Layer** ([`ResourceActor`]) - Message processing and atomicity
//! 3. **Interface Layer** ([`ResourceClient`], [`ActorClient`]) - Type-safe communication
//!
//! ## Example
//!
//! ```rust
//! use actor_framework::{ActorEntity, FrameworkError, ResourceActor};
//! use std::cmp::Ordering;
//!
//! #[derive(Clone, Debug)]
//! struct Counter { name: String, value: u64 }
//!
//! #[derive(Debug, thiserror::Error)]
//! #[error("counter error")]
//! struct CounterError;
//!
//! impl ActorEntity for Counter {
//!     type Id = String;
//!     type Create = String;
//!     type Patch = u64;
//!     type Precondition = u64;
//!     type Filter = ();
//!     type Sort = ();
//!     type Error = CounterError;
//!
//!     fn id(&self) -> &String { &self.name }
//!     fn from_create_params(name: String) -> Result<Self, Self::Error> {
//!         Ok(Self { name, value: 0 })
//!     }
//!     fn satisfies(&self, expected: &u64) -> bool { self.value == *expected }
//!     fn apply(&mut self, value: u64) -> Result<(), Self::Error> { self.value = value; Ok(()) }
//!     fn matches(&self, _: &()) -> bool { true }
//!     fn compare(&self, other: &Self, _: &()) -> Ordering { self.name.cmp(&other.name) }
//! }
//!
//! #[tokio::main]
//! async fn main() {
//!     let (actor, client) = ResourceActor::<Counter>::new(10);
//!     tokio::spawn(actor.run());
//!
//!     client.insert("tickets".into()).await.unwrap();
//!     client.update_if("tickets".into(), 0, 1).await.unwrap();
//!
//!     // A writer that read the old value loses.
//!     let stale = client.update_if("tickets".into(), 0, 1).await;
//!     assert!(matches!(stale, Err(FrameworkError::Conflict(_))));
//! }
//! ```
//!
//! ## Testing
//!
//! [`mock::MockClient`] hands out a real [`ResourceClient`] answered from scripted replies,
//! so failure paths (closed actors, lost races) can be exercised without a live store.

pub mod actor;
pub mod client;
pub mod client_trait;
pub mod entity;
pub mod error;
pub mod message;
pub mod mock;
pub mod query;
pub mod tracing;

// Re-export core types for convenience
pub use actor::ResourceActor;
pub use client::ResourceClient;
pub use client_trait::ActorClient;
pub use entity::ActorEntity;
pub use error::FrameworkError;
pub use message::{ResourceRequest, Response};
pub use query::{Page, Query};
