//! The singleton bay pointer: which order, if any, holds the bay.

use crate::model::{ModelError, OrderId};
use actor_framework::ActorEntity;
use std::cmp::Ordering;
use std::fmt::{self, Display};

/// Key of the single bay record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct BayId;

impl Display for BayId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("bay")
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BaySlot {
    pub id: BayId,
    pub current: Option<OrderId>,
    pub revision: u64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BayPrecondition {
    Free,
    HeldBy(OrderId),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BayPatch {
    Occupy(OrderId),
    Release,
}

impl ActorEntity for BaySlot {
    type Id = BayId;
    type Create = ();
    type Patch = BayPatch;
    type Precondition = BayPrecondition;
    type Filter = ();
    type Sort = ();
    type Error = ModelError;

    fn id(&self) -> &BayId {
        &self.id
    }

    fn from_create_params(_: ()) -> Result<Self, Self::Error> {
        Ok(Self {
            id: BayId,
            current: None,
            revision: 0,
        })
    }

    fn satisfies(&self, precondition: &BayPrecondition) -> bool {
        match precondition {
            BayPrecondition::Free => self.current.is_none(),
            BayPrecondition::HeldBy(id) => self.current == Some(*id),
        }
    }

    fn apply(&mut self, patch: BayPatch) -> Result<(), Self::Error> {
        self.current = match patch {
            BayPatch::Occupy(id) => Some(id),
            BayPatch::Release => None,
        };
        self.revision += 1;
        Ok(())
    }

    fn matches(&self, _: &()) -> bool {
        true
    }

    fn compare(&self, _: &Self, _: &()) -> Ordering {
        Ordering::Equal
    }
}
