//! # Generic Client
//!
//! This module defines the generic client for communicating with actors.

use crate::entity::ActorEntity;
use crate::error::FrameworkError;
use crate::message::{ResourceRequest, Response};
use crate::query::{Page, Query};
use tokio::sync::{mpsc, oneshot};

/// A type-safe client for interacting with a `ResourceActor`.
///
/// Holds only the sender half of the mailbox, so cloning is cheap and every task can own
/// a copy. Each call sends one request and awaits its oneshot reply.
pub struct ResourceClient<T: ActorEntity> {
    sender: mpsc::Sender<ResourceRequest<T>>,
}

impl<T: ActorEntity> Clone for ResourceClient<T> {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
        }
    }
}

impl<T: ActorEntity> ResourceClient<T> {
    pub fn new(sender: mpsc::Sender<ResourceRequest<T>>) -> Self {
        Self { sender }
    }

    async fn call<R>(
        &self,
        build: impl FnOnce(Response<R>) -> ResourceRequest<T>,
    ) -> Result<R, FrameworkError> {
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(build(respond_to))
            .await
            .map_err(|_| FrameworkError::ActorClosed)?;
        response.await.map_err(|_| FrameworkError::ActorDropped)?
    }

    pub async fn insert(&self, params: T::Create) -> Result<T, FrameworkError> {
        self.call(|respond_to| ResourceRequest::Insert { params, respond_to })
            .await
    }

    pub async fn get(&self, id: T::Id) -> Result<Option<T>, FrameworkError> {
        self.call(|respond_to| ResourceRequest::Get { id, respond_to })
            .await
    }

    pub async fn find_one(&self, filter: T::Filter) -> Result<Option<T>, FrameworkError> {
        self.call(|respond_to| ResourceRequest::FindOne { filter, respond_to })
            .await
    }

    pub async fn query(&self, query: Query<T>) -> Result<Page<T>, FrameworkError> {
        self.call(|respond_to| ResourceRequest::Query { query, respond_to })
            .await
    }

    /// Apply `patch` to record `id` only if it still satisfies `precondition`.
    ///
    /// Returns the record as written, or `FrameworkError::Conflict` if the record changed
    /// underneath the caller.
    pub async fn update_if(
        &self,
        id: T::Id,
        precondition: T::Precondition,
        patch: T::Patch,
    ) -> Result<T, FrameworkError> {
        self.call(|respond_to| ResourceRequest::ConditionalUpdate {
            id,
            precondition,
            patch,
            respond_to,
        })
        .await
    }

    pub async fn delete(&self, id: T::Id) -> Result<(), FrameworkError> {
        self.call(|respond_to| ResourceRequest::Delete { id, respond_to })
            .await
    }
}
