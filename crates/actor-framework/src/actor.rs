//! # Generic Actor Server
//!
//! This module defines the `ResourceActor`, the server half of a store. It owns the
//! records of one entity type and processes requests one at a time, which is what makes
//! every conditional write atomic.

use crate::client::ResourceClient;
use crate::entity::ActorEntity;
use crate::error::FrameworkError;
use crate::message::ResourceRequest;
use crate::query::{Page, Query};
use std::collections::HashMap;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// The generic actor that manages a collection of entities.
///
/// **Concurrency Model**:
/// The actor owns `store` exclusively inside its task and handles one message at a time.
/// A `ConditionalUpdate` therefore checks its precondition and writes its patch with no
/// other request in between; two callers racing on the same record get one success and
/// one `Conflict`. No `Mutex` is needed around the map.
///
/// # Usage Pattern
///
/// 1.  **Create**: `ResourceActor::new()` returns the actor and its client.
/// 2.  **Run**: spawn `actor.run()` on the runtime.
/// 3.  **Use**: clone the client into every task that needs the store.
///
/// The actor stops once every client has been dropped.
pub struct ResourceActor<T: ActorEntity> {
    receiver: mpsc::Receiver<ResourceRequest<T>>,
    store: HashMap<T::Id, T>,
}

impl<T: ActorEntity> ResourceActor<T> {
    /// Creates a new `ResourceActor` and its associated `ResourceClient`.
    ///
    /// `buffer_size` is the mailbox capacity; senders wait when it is full.
    pub fn new(buffer_size: usize) -> (Self, ResourceClient<T>) {
        let (sender, receiver) = mpsc::channel(buffer_size);
        let actor = Self {
            receiver,
            store: HashMap::new(),
        };
        (actor, ResourceClient::new(sender))
    }

    /// Runs the actor's event loop, processing messages until the channel closes.
    pub async fn run(mut self) {
        // Extract just the type name (e.g., "Order" instead of "loading_bay::model::order::Order")
        let entity_type = std::any::type_name::<T>()
            .split("::")
            .last()
            .unwrap_or("Unknown");
        info!(entity_type, "Actor started");

        while let Some(msg) = self.receiver.recv().await {
            match msg {
                ResourceRequest::Insert { params, respond_to } => {
                    debug!(entity_type, ?params, "Insert");
                    let _ = respond_to.send(self.insert(entity_type, params));
                }
                ResourceRequest::Get { id, respond_to } => {
                    let item = self.store.get(&id).cloned();
                    debug!(entity_type, %id, found = item.is_some(), "Get");
                    let _ = respond_to.send(Ok(item));
                }
                ResourceRequest::FindOne { filter, respond_to } => {
                    let item = self.store.values().find(|item| item.matches(&filter)).cloned();
                    debug!(entity_type, ?filter, found = item.is_some(), "FindOne");
                    let _ = respond_to.send(Ok(item));
                }
                ResourceRequest::Query { query, respond_to } => {
                    let page = self.query(query);
                    debug!(entity_type, total = page.total, returned = page.items.len(), "Query");
                    let _ = respond_to.send(Ok(page));
                }
                ResourceRequest::ConditionalUpdate {
                    id,
                    precondition,
                    patch,
                    respond_to,
                } => {
                    debug!(entity_type, %id, ?precondition, ?patch, "ConditionalUpdate");
                    let _ = respond_to.send(self.update_if(entity_type, id, precondition, patch));
                }
                ResourceRequest::Delete { id, respond_to } => {
                    debug!(entity_type, %id, "Delete");
                    let _ = respond_to.send(self.delete(entity_type, id));
                }
            }
        }

        info!(entity_type, size = self.store.len(), "Shutdown");
    }

    fn insert(&mut self, entity_type: &str, params: T::Create) -> Result<T, FrameworkError> {
        let item = T::from_create_params(params).map_err(|e| {
            warn!(entity_type, error = %e, "Insert failed");
            FrameworkError::EntityError(Box::new(e))
        })?;
        let id = item.id().clone();
        if self.store.contains_key(&id) {
            warn!(entity_type, %id, "Already exists");
            return Err(FrameworkError::AlreadyExists(id.to_string()));
        }
        self.store.insert(id.clone(), item.clone());
        info!(entity_type, %id, size = self.store.len(), "Inserted");
        Ok(item)
    }

    fn query(&self, query: Query<T>) -> Page<T> {
        let mut matched: Vec<&T> = self
            .store
            .values()
            .filter(|item| item.matches(&query.filter))
            .collect();
        matched.sort_by(|a, b| a.compare(b, &query.sort));
        let total = matched.len();
        let window = matched.into_iter().skip(query.skip);
        let items = match query.limit {
            Some(limit) => window.take(limit).cloned().collect(),
            None => window.cloned().collect(),
        };
        Page { items, total }
    }

    fn update_if(
        &mut self,
        entity_type: &str,
        id: T::Id,
        precondition: T::Precondition,
        patch: T::Patch,
    ) -> Result<T, FrameworkError> {
        let Some(current) = self.store.get_mut(&id) else {
            warn!(entity_type, %id, "Not found");
            return Err(FrameworkError::NotFound(id.to_string()));
        };
        if !current.satisfies(&precondition) {
            warn!(entity_type, %id, ?precondition, "Precondition failed");
            return Err(FrameworkError::Conflict(id.to_string()));
        }
        let mut next = current.clone();
        if let Err(e) = next.apply(patch) {
            warn!(entity_type, %id, error = %e, "Patch rejected");
            return Err(FrameworkError::EntityError(Box::new(e)));
        }
        *current = next.clone();
        info!(entity_type, %id, "Updated");
        Ok(next)
    }

    fn delete(&mut self, entity_type: &str, id: T::Id) -> Result<(), FrameworkError> {
        let Some(item) = self.store.get(&id) else {
            warn!(entity_type, %id, "Not found");
            return Err(FrameworkError::NotFound(id.to_string()));
        };
        if let Err(e) = item.on_delete() {
            warn!(entity_type, %id, error = %e, "on_delete failed");
            return Err(FrameworkError::EntityError(Box::new(e)));
        }
        self.store.remove(&id);
        info!(entity_type, %id, size = self.store.len(), "Deleted");
        Ok(())
    }
}
