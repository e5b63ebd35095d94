//! # Mock Framework & Testing Guide
//!
//! `MockClient<T>` hands out a real `ResourceClient<T>` whose requests are answered from a
//! queue of scripted responses instead of a store. Use it to test code that sits *around*
//! a client: retry loops, error mapping, timeouts.
//!
//! | Feature | MockClient | Real Actor |
//! |---------|------------|------------|
//! | **State** | None, scripted replies | Real records |
//! | **Error Injection** | `return_err` | Needs a contrived race |
//! | **Use Case** | Failure paths, call sequencing | Store semantics, concurrency |
//!
//! Expectations are consumed in order. A request whose kind does not match the next
//! expectation, or that arrives after the queue is empty, panics inside the mock task
//! and the caller sees `FrameworkError::ActorDropped`.
//!
//! [`SlowReplies`] covers the case a script cannot: a write that lands in a live store
//! while its reply arrives after the caller has given up.
//!
//! ```rust
//! use actor_framework::mock::MockClient;
//! use actor_framework::{ActorEntity, FrameworkError};
//! use std::cmp::Ordering;
//!
//! #[derive(Clone, Debug)] struct Slot { id: u32 }
//! #[derive(Debug, thiserror::Error)] #[error("Err")] struct SlotError;
//!
//! impl ActorEntity for Slot {
//!     type Id = u32; type Create = u32; type Patch = (); type Precondition = ();
//!     type Filter = (); type Sort = (); type Error = SlotError;
//!     fn id(&self) -> &u32 { &self.id }
//!     fn from_create_params(id: u32) -> Result<Self, Self::Error> { Ok(Self { id }) }
//!     fn satisfies(&self, _: &()) -> bool { true }
//!     fn apply(&mut self, _: ()) -> Result<(), Self::Error> { Ok(()) }
//!     fn matches(&self, _: &()) -> bool { true }
//!     fn compare(&self, o: &Self, _: &()) -> Ordering { self.id.cmp(&o.id) }
//! }
//!
//! #[tokio::main]
//! async fn main() {
//!     let mock = MockClient::<Slot>::new();
//!     mock.expect_update(1).return_err(FrameworkError::Conflict("1".into()));
//!     mock.expect_update(1).return_ok(Slot { id: 1 });
//!
//!     let client = mock.client();
//!     assert!(matches!(client.update_if(1, (), ()).await, Err(FrameworkError::Conflict(_))));
//!     assert!(client.update_if(1, (), ()).await.is_ok());
//!     mock.verify();
//! }
//! ```

use crate::client::ResourceClient;
use crate::entity::ActorEntity;
use crate::error::FrameworkError;
use crate::message::ResourceRequest;
use crate::query::Page;
use std::collections::VecDeque;
use std::marker::PhantomData;
use std::sync::atomic::{self, AtomicUsize};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;

// =============================================================================
// EXPECTATION BUILDER API
// =============================================================================

/// Represents an expected request to the mock client.
enum Expectation<T: ActorEntity> {
    Insert(Result<T, FrameworkError>),
    Get(T::Id, Result<Option<T>, FrameworkError>),
    FindOne(Result<Option<T>, FrameworkError>),
    Query(Result<Page<T>, FrameworkError>),
    Update(T::Id, Result<T, FrameworkError>),
    Delete(T::Id, Result<(), FrameworkError>),
}

type Expectations<T> = Arc<Mutex<VecDeque<Expectation<T>>>>;

/// A mock client with expectation tracking for fluent testing.
pub struct MockClient<T: ActorEntity> {
    client: ResourceClient<T>,
    expectations: Expectations<T>,
    _handle: tokio::task::JoinHandle<()>,
}

impl<T: ActorEntity> Default for MockClient<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: ActorEntity> MockClient<T> {
    /// Creates a new mock client with no expectations.
    pub fn new() -> Self {
        let (sender, mut receiver) = mpsc::channel::<ResourceRequest<T>>(100);
        let expectations: Expectations<T> = Arc::new(Mutex::new(VecDeque::new()));
        let expectations_clone = expectations.clone();

        let handle = tokio::spawn(async move {
            while let Some(request) = receiver.recv().await {
                let expectation = expectations_clone
                    .lock()
                    .expect("mock expectations poisoned")
                    .pop_front();

                match (request, expectation) {
                    (ResourceRequest::Insert { respond_to, .. }, Some(Expectation::Insert(r))) => {
                        let _ = respond_to.send(r);
                    }
                    (ResourceRequest::Get { id, respond_to }, Some(Expectation::Get(want, r))) => {
                        assert_eq!(id, want, "mock get called with unexpected id");
                        let _ = respond_to.send(r);
                    }
                    (
                        ResourceRequest::FindOne { respond_to, .. },
                        Some(Expectation::FindOne(r)),
                    ) => {
                        let _ = respond_to.send(r);
                    }
                    (ResourceRequest::Query { respond_to, .. }, Some(Expectation::Query(r))) => {
                        let _ = respond_to.send(r);
                    }
                    (
                        ResourceRequest::ConditionalUpdate { id, respond_to, .. },
                        Some(Expectation::Update(want, r)),
                    ) => {
                        assert_eq!(id, want, "mock update called with unexpected id");
                        let _ = respond_to.send(r);
                    }
                    (
                        ResourceRequest::Delete { id, respond_to },
                        Some(Expectation::Delete(want, r)),
                    ) => {
                        assert_eq!(id, want, "mock delete called with unexpected id");
                        let _ = respond_to.send(r);
                    }
                    _ => panic!("Unexpected request or expectation mismatch"),
                }
            }
        });

        Self {
            client: ResourceClient::new(sender),
            expectations,
            _handle: handle,
        }
    }

    /// Returns the client for use in tests.
    pub fn client(&self) -> ResourceClient<T> {
        self.client.clone()
    }

    fn expect<R>(
        &self,
        wrap: impl FnOnce(Result<R, FrameworkError>) -> Expectation<T> + Send + 'static,
    ) -> ExpectationBuilder<T, R> {
        ExpectationBuilder {
            wrap: Box::new(wrap),
            expectations: self.expectations.clone(),
            _reply: PhantomData,
        }
    }

    /// Expects an `insert` operation.
    pub fn expect_insert(&self) -> ExpectationBuilder<T, T> {
        self.expect(Expectation::Insert)
    }

    /// Expects a `get` operation.
    pub fn expect_get(&self, id: T::Id) -> ExpectationBuilder<T, Option<T>> {
        self.expect(move |r| Expectation::Get(id, r))
    }

    /// Expects a `find_one` operation.
    pub fn expect_find_one(&self) -> ExpectationBuilder<T, Option<T>> {
        self.expect(Expectation::FindOne)
    }

    /// Expects a `query` operation.
    pub fn expect_query(&self) -> ExpectationBuilder<T, Page<T>> {
        self.expect(Expectation::Query)
    }

    /// Expects a conditional `update_if` operation.
    pub fn expect_update(&self, id: T::Id) -> ExpectationBuilder<T, T> {
        self.expect(move |r| Expectation::Update(id, r))
    }

    /// Expects a `delete` operation.
    pub fn expect_delete(&self, id: T::Id) -> ExpectationBuilder<T, ()> {
        self.expect(move |r| Expectation::Delete(id, r))
    }

    /// Verifies that all expectations were met.
    pub fn verify(&self) {
        let remaining = self.expectations.lock().expect("mock expectations poisoned").len();
        if remaining > 0 {
            panic!("Not all expectations were met. {} remaining", remaining);
        }
    }
}

/// Builder that records the reply for one expected request.
pub struct ExpectationBuilder<T: ActorEntity, R> {
    wrap: Box<dyn FnOnce(Result<R, FrameworkError>) -> Expectation<T> + Send>,
    expectations: Expectations<T>,
    _reply: PhantomData<fn() -> R>,
}

impl<T: ActorEntity, R> ExpectationBuilder<T, R> {
    /// Sets the expectation to return a successful result.
    pub fn return_ok(self, value: R) {
        self.push(Ok(value));
    }

    /// Sets the expectation to return an error.
    pub fn return_err(self, error: FrameworkError) {
        self.push(Err(error));
    }

    fn push(self, reply: Result<R, FrameworkError>) {
        let expectation = (self.wrap)(reply);
        self.expectations
            .lock()
            .expect("mock expectations poisoned")
            .push_back(expectation);
    }
}

// =============================================================================
// DELAYED REPLIES
// =============================================================================

/// A proxy in front of a live store that holds back the replies to conditional updates.
///
/// The update itself is forwarded at once, so it lands; only the answer is late. Requests
/// are forwarded one at a time in arrival order, so a read sent after a delayed update
/// observes it.
#[derive(Clone)]
pub struct SlowReplies {
    armed: Arc<AtomicUsize>,
    delay: Duration,
}

impl SlowReplies {
    /// Puts a proxy in front of `upstream` and returns the client to use instead. Nothing
    /// is delayed until [`SlowReplies::arm`] is called.
    pub fn wrap<T: ActorEntity>(
        upstream: ResourceClient<T>,
        delay: Duration,
    ) -> (Self, ResourceClient<T>) {
        let slow = Self {
            armed: Arc::new(AtomicUsize::new(0)),
            delay,
        };
        let gate = slow.clone();
        let (sender, mut receiver) = mpsc::channel::<ResourceRequest<T>>(100);

        tokio::spawn(async move {
            while let Some(request) = receiver.recv().await {
                match request {
                    ResourceRequest::Insert { params, respond_to } => {
                        let _ = respond_to.send(upstream.insert(params).await);
                    }
                    ResourceRequest::Get { id, respond_to } => {
                        let _ = respond_to.send(upstream.get(id).await);
                    }
                    ResourceRequest::FindOne { filter, respond_to } => {
                        let _ = respond_to.send(upstream.find_one(filter).await);
                    }
                    ResourceRequest::Query { query, respond_to } => {
                        let _ = respond_to.send(upstream.query(query).await);
                    }
                    ResourceRequest::ConditionalUpdate {
                        id,
                        precondition,
                        patch,
                        respond_to,
                    } => {
                        let reply = upstream.update_if(id, precondition, patch).await;
                        if gate.take() {
                            let delay = gate.delay;
                            tokio::spawn(async move {
                                tokio::time::sleep(delay).await;
                                let _ = respond_to.send(reply);
                            });
                        } else {
                            let _ = respond_to.send(reply);
                        }
                    }
                    ResourceRequest::Delete { id, respond_to } => {
                        let _ = respond_to.send(upstream.delete(id).await);
                    }
                }
            }
        });

        (slow, ResourceClient::new(sender))
    }

    /// Delay the replies to the next `count` conditional updates.
    pub fn arm(&self, count: usize) {
        self.armed.store(count, atomic::Ordering::SeqCst);
    }

    fn take(&self) -> bool {
        self.armed
            .fetch_update(atomic::Ordering::SeqCst, atomic::Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::Query;
    use std::cmp::Ordering;

    #[derive(Clone, Debug, PartialEq)]
    struct Gate {
        id: u32,
        open: bool,
    }

    #[derive(Debug, thiserror::Error)]
    #[error("Gate error")]
    struct GateError;

    impl ActorEntity for Gate {
        type Id = u32;
        type Create = u32;
        type Patch = bool;
        type Precondition = bool;
        type Filter = ();
        type Sort = ();
        type Error = GateError;

        fn id(&self) -> &u32 {
            &self.id
        }
        fn from_create_params(id: u32) -> Result<Self, Self::Error> {
            Ok(Self { id, open: false })
        }
        fn satisfies(&self, open: &bool) -> bool {
            self.open == *open
        }
        fn apply(&mut self, open: bool) -> Result<(), Self::Error> {
            self.open = open;
            Ok(())
        }
        fn matches(&self, _: &()) -> bool {
            true
        }
        fn compare(&self, other: &Self, _: &()) -> Ordering {
            self.id.cmp(&other.id)
        }
    }

    #[tokio::test]
    async fn test_mock_client_replays_in_order() {
        let mock = MockClient::<Gate>::new();
        mock.expect_insert().return_ok(Gate { id: 1, open: false });
        mock.expect_get(1).return_ok(Some(Gate { id: 1, open: false }));
        mock.expect_update(1).return_err(FrameworkError::Conflict("1".into()));
        mock.expect_query().return_ok(Page {
            items: Vec::new(),
            total: 0,
        });

        let client = mock.client();
        assert_eq!(client.insert(1).await.unwrap().id, 1);
        assert!(client.get(1).await.unwrap().is_some());
        let err = client.update_if(1, false, true).await.unwrap_err();
        assert!(err.is_conflict());
        let page = client.query(Query::new((), ())).await.unwrap();
        assert_eq!(page.total, 0);

        mock.verify();
    }

    #[tokio::test]
    async fn test_mock_client_simulates_closed_store() {
        let mock = MockClient::<Gate>::new();
        mock.expect_get(7).return_err(FrameworkError::ActorClosed);

        let result = mock.client().get(7).await;
        assert!(matches!(result, Err(e) if e.is_unavailable()));
    }

    #[tokio::test]
    async fn test_slow_reply_still_lands() {
        let (actor, store) = crate::ResourceActor::<Gate>::new(8);
        tokio::spawn(actor.run());
        let (slow, client) = SlowReplies::wrap(store, Duration::from_millis(200));
        client.insert(1).await.unwrap();

        slow.arm(1);
        let late = client.update_if(1, false, true);
        assert!(tokio::time::timeout(Duration::from_millis(20), late).await.is_err());
        assert!(client.get(1).await.unwrap().unwrap().open);

        // Only one reply was held back.
        let closed = client.update_if(1, true, false);
        let closed = tokio::time::timeout(Duration::from_millis(100), closed).await;
        assert!(!closed.unwrap().unwrap().open);
    }
}
