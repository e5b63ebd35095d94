//! # Order Client
//!
//! Provides the order store contract (`get_by_id`, `find_by_token`,
//! `conditional_update`, `query`) on top of a `ResourceClient<Order>`.

use crate::clients::within;
use crate::error::BayError;
use crate::model::{
    NewOrder, Order, OrderFilter, OrderId, OrderPatch, OrderPrecondition, OrderSort,
};
use actor_framework::{ActorClient, FrameworkError, Page, Query, ResourceClient};
use std::time::Duration;
use tracing::{debug, instrument};

#[derive(Clone)]
pub struct OrderClient {
    inner: ResourceClient<Order>,
    timeout: Duration,
}

impl OrderClient {
    pub fn new(inner: ResourceClient<Order>, timeout: Duration) -> Self {
        Self { inner, timeout }
    }

    #[instrument(skip(self, params), fields(order_id = %params.id))]
    pub async fn create(&self, params: NewOrder) -> Result<Order, BayError> {
        debug!(?params, "create called");
        within(self.timeout, "order.create", async {
            self.inner.insert(params).await.map_err(Self::map_error)
        })
        .await
    }

    /// Fetch an order, failing with `NotFound` if it does not exist.
    pub async fn get_by_id(&self, id: OrderId) -> Result<Order, BayError> {
        within(self.timeout, "order.get", self.get(id))
            .await?
            .ok_or_else(|| BayError::NotFound(format!("order {id}")))
    }

    pub async fn find_by_token(&self, filter: OrderFilter) -> Result<Option<Order>, BayError> {
        within(self.timeout, "order.find", self.find_one(filter)).await
    }

    /// Write `patch` only if the stored order still meets `precondition`.
    #[instrument(skip(self, patch), fields(order_id = %id, event = ?patch.event()))]
    pub async fn conditional_update(
        &self,
        id: OrderId,
        precondition: OrderPrecondition,
        patch: OrderPatch,
    ) -> Result<Order, BayError> {
        within(self.timeout, "order.update", async {
            self.inner
                .update_if(id, precondition, patch)
                .await
                .map_err(Self::map_error)
        })
        .await
    }

    pub async fn list(
        &self,
        filter: OrderFilter,
        sort: OrderSort,
        skip: usize,
        limit: Option<usize>,
    ) -> Result<Page<Order>, BayError> {
        let mut query = Query::new(filter, sort);
        query.skip = skip;
        query.limit = limit;
        within(self.timeout, "order.query", self.query(query)).await
    }

    pub async fn first(
        &self,
        filter: OrderFilter,
        sort: OrderSort,
    ) -> Result<Option<Order>, BayError> {
        within(self.timeout, "order.query", self.query(Query::new(filter, sort).first()))
            .await
            .map(Page::into_first)
    }

    pub async fn count(&self, filter: OrderFilter) -> Result<usize, BayError> {
        within(
            self.timeout,
            "order.count",
            self.query(Query::new(filter, OrderSort::Ticket).count_only()),
        )
        .await
        .map(|page| page.total)
    }
}

impl ActorClient<Order> for OrderClient {
    type Error = BayError;

    fn inner(&self) -> &ResourceClient<Order> {
        &self.inner
    }

    fn map_error(e: FrameworkError) -> Self::Error {
        BayError::from(e)
    }
}
