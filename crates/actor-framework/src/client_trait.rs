//! # ActorClient Trait
//!
//! Provides a common interface for resource-specific clients, adding default read methods
//! built on top of a generic `ResourceClient`.
use crate::{ActorEntity, FrameworkError, Page, Query, ResourceClient};
use async_trait::async_trait;

/// Trait for resource-specific clients to inherit standard read operations.
///
/// Implementors supply the inner `ResourceClient` and a mapping from `FrameworkError` to
/// their own error type; `get`, `find_one` and `query` come for free.
///
/// # Example
///
/// ```rust
/// use actor_framework::{ActorClient, ActorEntity, FrameworkError, ResourceClient};
/// use std::cmp::Ordering;
///
/// #[derive(Clone, Debug)]
/// struct Truck { plate: String }
/// #[derive(Debug, thiserror::Error)]
/// #[error("{0}")]
/// struct TruckError(String);
///
/// impl ActorEntity for Truck {
///     type Id = String;
///     type Create = String;
///     type Patch = ();
///     type Precondition = ();
///     type Filter = ();
///     type Sort = ();
///     type Error = TruckError;
///
///     fn id(&self) -> &String { &self.plate }
///     fn from_create_params(plate: String) -> Result<Self, Self::Error> { Ok(Self { plate }) }
///     fn satisfies(&self, _: &()) -> bool { true }
///     fn apply(&mut self, _: ()) -> Result<(), Self::Error> { Ok(()) }
///     fn matches(&self, _: &()) -> bool { true }
///     fn compare(&self, other: &Self, _: &()) -> Ordering { self.plate.cmp(&other.plate) }
/// }
///
/// #[derive(Clone)]
/// struct TruckClient { inner: ResourceClient<Truck> }
///
/// impl ActorClient<Truck> for TruckClient {
///     type Error = TruckError;
///     fn inner(&self) -> &ResourceClient<Truck> { &self.inner }
///     fn map_error(e: FrameworkError) -> TruckError { TruckError(e.to_string()) }
/// }
/// ```
#[async_trait]
pub trait ActorClient<T: ActorEntity>: Send + Sync {
    /// The resource-specific error type.
    type Error: Send + Sync;

    /// Access the inner generic ResourceClient.
    fn inner(&self) -> &ResourceClient<T>;

    /// Map framework errors to the specific resource error type.
    fn map_error(e: FrameworkError) -> Self::Error;

    /// Fetch an entity by ID.
    #[tracing::instrument(skip(self))]
    async fn get(&self, id: T::Id) -> Result<Option<T>, Self::Error> {
        tracing::debug!("Sending request");
        self.inner().get(id).await.map_err(Self::map_error)
    }

    /// Fetch any entity matching `filter`.
    #[tracing::instrument(skip(self))]
    async fn find_one(&self, filter: T::Filter) -> Result<Option<T>, Self::Error> {
        tracing::debug!("Sending request");
        self.inner().find_one(filter).await.map_err(Self::map_error)
    }

    /// Run a filtered, sorted, paged read.
    #[tracing::instrument(skip(self))]
    async fn query(&self, query: Query<T>) -> Result<Page<T>, Self::Error> {
        tracing::debug!("Sending request");
        self.inner().query(query).await.map_err(Self::map_error)
    }
}
