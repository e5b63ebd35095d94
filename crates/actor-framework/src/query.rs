//! # Queries
//!
//! Filtered, sorted and paged reads over an actor's store.

use crate::entity::ActorEntity;
use std::fmt;

/// A read request: every record matching `filter`, ordered by `sort`, then windowed by
/// `skip` and `limit`.
pub struct Query<T: ActorEntity> {
    pub filter: T::Filter,
    pub sort: T::Sort,
    pub skip: usize,
    /// `None` returns everything after `skip`. `Some(0)` only counts.
    pub limit: Option<usize>,
}

impl<T: ActorEntity> Query<T> {
    pub fn new(filter: T::Filter, sort: T::Sort) -> Self {
        Self {
            filter,
            sort,
            skip: 0,
            limit: None,
        }
    }

    pub fn page(mut self, skip: usize, limit: usize) -> Self {
        self.skip = skip;
        self.limit = Some(limit);
        self
    }

    pub fn first(self) -> Self {
        self.page(0, 1)
    }

    pub fn count_only(self) -> Self {
        self.page(0, 0)
    }
}

impl<T: ActorEntity> fmt::Debug for Query<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Query")
            .field("filter", &self.filter)
            .field("sort", &self.sort)
            .field("skip", &self.skip)
            .field("limit", &self.limit)
            .finish()
    }
}

/// One window of query results plus the number of records that matched overall.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: usize,
}

impl<T> Page<T> {
    pub fn into_first(self) -> Option<T> {
        self.items.into_iter().next()
    }
}
