//! Per-day queue counter. One record per business day; `value` is the last number issued.

use crate::model::ModelError;
use actor_framework::ActorEntity;
use chrono::NaiveDate;
use std::cmp::Ordering;

#[derive(Debug, Clone, PartialEq)]
pub struct DayCounter {
    pub day: NaiveDate,
    pub value: u32,
}

/// Compare-and-swap guard: the counter still holds the value the caller read.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CounterPrecondition(pub u32);

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CounterPatch {
    Set(u32),
    /// Hand back the number just taken. Paired with a precondition on that number.
    Return,
}

impl ActorEntity for DayCounter {
    type Id = NaiveDate;
    /// The first number of a day is claimed by whoever creates its counter.
    type Create = NaiveDate;
    type Patch = CounterPatch;
    type Precondition = CounterPrecondition;
    type Filter = ();
    type Sort = ();
    type Error = ModelError;

    fn id(&self) -> &NaiveDate {
        &self.day
    }

    fn from_create_params(day: NaiveDate) -> Result<Self, Self::Error> {
        Ok(Self { day, value: 1 })
    }

    fn satisfies(&self, expected: &CounterPrecondition) -> bool {
        self.value == expected.0
    }

    fn apply(&mut self, patch: CounterPatch) -> Result<(), Self::Error> {
        match patch {
            CounterPatch::Set(value) if value > self.value => {
                self.value = value;
                Ok(())
            }
            CounterPatch::Set(value) => Err(ModelError::Validation(format!(
                "queue counter for {} cannot move back from {} to {}",
                self.day, self.value, value
            ))),
            CounterPatch::Return if self.value > 0 => {
                self.value -= 1;
                Ok(())
            }
            CounterPatch::Return => Err(ModelError::Validation(format!(
                "queue counter for {} has nothing to return",
                self.day
            ))),
        }
    }

    fn matches(&self, _: &()) -> bool {
        true
    }

    fn compare(&self, other: &Self, _: &()) -> Ordering {
        self.day.cmp(&other.day)
    }
}
