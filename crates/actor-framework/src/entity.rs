//! # ActorEntity Trait
//!
//! The `ActorEntity` trait is the contract a record type implements to be kept by a
//! `ResourceActor`. The actor is a keyed store; the entity decides what its id is, how a
//! patch is applied, which precondition a conditional write checks, and how queries
//! filter and order records.
//!
//! # Conditional Writes
//! Every mutation goes through [`ActorEntity::satisfies`] and then [`ActorEntity::apply`].
//! The actor runs both inside one message, so no other request can observe or change the
//! record between the check and the write. If the precondition does not hold the write is
//! rejected with [`FrameworkError::Conflict`](crate::FrameworkError::Conflict) and the
//! record is left untouched.
//!
//! `apply` works on a copy of the record. The copy replaces the stored value only when
//! `apply` returns `Ok`, so a failing patch never leaves a half-written record behind.

use std::cmp::Ordering;
use std::fmt::{Debug, Display};
use std::hash::Hash;

/// Trait that any record type must implement to be stored by a `ResourceActor`.
///
/// Associated types keep each store strongly typed: an order store only accepts order
/// patches, order filters and order preconditions.
pub trait ActorEntity: Clone + Send + Sync + 'static {
    /// The unique identifier for this entity (e.g., a newtype over `Uuid` or a date).
    type Id: Eq + Hash + Clone + Send + Sync + Display + Debug;

    /// The data required to create a new instance.
    type Create: Send + Sync + Debug;

    /// A change applied by a conditional write.
    type Patch: Send + Sync + Debug;

    /// What the stored record must look like for a patch to be accepted.
    type Precondition: Send + Sync + Debug;

    /// Selection criteria for `find_one` and `query`.
    type Filter: Send + Sync + Debug;

    /// Ordering used by `query`.
    type Sort: Send + Sync + Debug;

    /// The error type for this entity.
    type Error: std::error::Error + Send + Sync + 'static;

    /// The record's key.
    fn id(&self) -> &Self::Id;

    /// Construct the full entity from its creation payload.
    ///
    /// The entity owns its identity, so the id comes out of the payload (or is generated
    /// here) rather than from the actor.
    fn from_create_params(params: Self::Create) -> Result<Self, Self::Error>;

    /// Whether the stored record meets `precondition`.
    fn satisfies(&self, precondition: &Self::Precondition) -> bool;

    /// Apply `patch` to this record.
    fn apply(&mut self, patch: Self::Patch) -> Result<(), Self::Error>;

    /// Whether this record is selected by `filter`.
    fn matches(&self, filter: &Self::Filter) -> bool;

    /// Relative order of two records under `sort`.
    fn compare(&self, other: &Self, sort: &Self::Sort) -> Ordering;

    /// Called immediately before the entity is removed from the store.
    fn on_delete(&self) -> Result<(), Self::Error> {
        Ok(())
    }
}
