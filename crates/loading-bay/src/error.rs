//! Error types for bay commands and queries.

use crate::model::{ModelError, OrderEvent, OrderStatus};
use actor_framework::FrameworkError;
use thiserror::Error;

/// Why the bay could not admit the next truck.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum AdmissionError {
    #[error("No orders are waiting in the queue")]
    EmptyQueue,

    #[error("Another order is occupying the bay")]
    BayBusy,

    /// An order is Loading while the bay pointer is free. Only reachable if something
    /// wrote the order without going through admission.
    #[error("An order is already loading")]
    AlreadyLoading,
}

/// Errors returned by every bay command and query.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum BayError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Cannot {event} an order that is {status}")]
    InvalidTransition {
        status: OrderStatus,
        event: OrderEvent,
    },

    /// Lost a conditional write. Safe to retry the whole command.
    #[error("Conflict: {0}")]
    Conflict(String),

    #[error(transparent)]
    Admission(#[from] AdmissionError),

    /// A store or channel did not answer.
    #[error("Dependency unavailable: {0}")]
    Dependency(String),
}

impl BayError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, BayError::Conflict(_))
    }
}

impl From<ModelError> for BayError {
    fn from(e: ModelError) -> Self {
        match e {
            ModelError::Validation(msg) => BayError::Validation(msg),
            ModelError::InvalidTransition { status, event } => {
                BayError::InvalidTransition { status, event }
            }
        }
    }
}

impl From<FrameworkError> for BayError {
    fn from(e: FrameworkError) -> Self {
        match e {
            FrameworkError::ActorClosed | FrameworkError::ActorDropped => {
                BayError::Dependency(e.to_string())
            }
            FrameworkError::NotFound(id) => BayError::NotFound(id),
            FrameworkError::AlreadyExists(id) | FrameworkError::Conflict(id) => {
                BayError::Conflict(id)
            }
            FrameworkError::EntityError(inner) => match inner.downcast::<ModelError>() {
                Ok(model) => (*model).into(),
                Err(other) => BayError::Dependency(other.to_string()),
            },
        }
    }
}
