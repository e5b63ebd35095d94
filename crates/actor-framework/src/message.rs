//! # Generic Messages
//!
//! This module defines the generic message types used for communication between
//! the `ResourceClient` and `ResourceActor`.

use crate::entity::ActorEntity;
use crate::error::FrameworkError;
use crate::query::{Page, Query};
use tokio::sync::oneshot;

/// Type alias for the one-shot response channel used by actors.
pub type Response<T> = oneshot::Sender<Result<T, FrameworkError>>;

/// Internal message type sent to the actor to request operations.
///
/// # Store Operations
/// Each variant maps to one store primitive:
///
/// - **Insert**: create a record; fails with `AlreadyExists` if the id is taken.
/// - **Get**: fetch by id.
/// - **FindOne**: fetch any record matching a filter. Meant for unique keys such as tokens.
/// - **Query**: filtered, sorted, paged read.
/// - **ConditionalUpdate**: apply a patch only if the precondition holds.
/// - **Delete**: remove a record.
///
/// The enum is generic over `T: ActorEntity` and uses its associated types, so an order
/// patch can never be sent to a counter store.
#[derive(Debug)]
pub enum ResourceRequest<T: ActorEntity> {
    Insert {
        params: T::Create,
        respond_to: Response<T>,
    },
    Get {
        id: T::Id,
        respond_to: Response<Option<T>>,
    },
    FindOne {
        filter: T::Filter,
        respond_to: Response<Option<T>>,
    },
    Query {
        query: Query<T>,
        respond_to: Response<Page<T>>,
    },
    ConditionalUpdate {
        id: T::Id,
        precondition: T::Precondition,
        patch: T::Patch,
        respond_to: Response<T>,
    },
    Delete {
        id: T::Id,
        respond_to: Response<()>,
    },
}
