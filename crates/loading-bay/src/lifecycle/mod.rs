//! # Order Lifecycle
//!
//! Decides whether an event may be applied to an order and which status it lands in.
//!
//! The decision is made twice per command: once by the command service against the
//! snapshot it read, so a doomed command fails fast without a write, and once inside the
//! order actor by [`Order::apply`](actor_framework::ActorEntity::apply), so no patch can
//! reach a record without passing the table.
//!
//! | From | Event | To | Guard |
//! |------|-------|----|-------|
//! | Pending | upload_payment | Paid | |
//! | Paid | upload_payment | Paid | payment rejected |
//! | Paid | verify_payment | Confirmed | payment pending, proof attached |
//! | Paid | reject_payment | Paid | payment pending |
//! | Confirmed | submit_driver | Confirmed | |
//! | Confirmed | scan_entry | Queued | driver details present |
//! | Queued | call_next | Loading | bay free |
//! | Loading | finish_loading | Completed | |
//! | Completed | issue_delivery_note | Completed | no note yet |
//! | Pending, Paid, Confirmed, Queued | cancel | Cancelled | |
//!
//! A vehicle photo is not an event. It can be attached or replaced in any status that is
//! not terminal and never moves the order.

pub mod transitions;

use crate::model::{ModelError, Order, OrderEvent, OrderStatus, PaymentStatus};

/// Checks `event` against the table and the event's guard, returning the target status.
pub fn admit(order: &Order, event: OrderEvent) -> Result<OrderStatus, ModelError> {
    let invalid = || ModelError::InvalidTransition {
        status: order.status,
        event,
    };

    let next = transitions::target(order.status, event).ok_or_else(invalid)?;

    let guard_holds = match event {
        OrderEvent::UploadPayment => {
            order.status == OrderStatus::Pending
                || order.payment_status == PaymentStatus::Rejected
        }
        OrderEvent::VerifyPayment => {
            order.payment_status == PaymentStatus::Pending && order.payment_proof.is_some()
        }
        OrderEvent::RejectPayment => order.payment_status == PaymentStatus::Pending,
        OrderEvent::ScanEntry => order.driver.is_some(),
        OrderEvent::IssueDeliveryNote => order.delivery_note_id.is_none(),
        OrderEvent::SubmitDriver
        | OrderEvent::CallNext
        | OrderEvent::FinishLoading
        | OrderEvent::Cancel => true,
    };

    if guard_holds {
        Ok(next)
    } else {
        Err(invalid())
    }
}

/// Whether a vehicle photo may be attached to `order`.
pub fn admit_vehicle_photo(order: &Order) -> Result<(), ModelError> {
    if order.status.is_terminal() {
        return Err(ModelError::Validation(format!(
            "cannot attach a vehicle photo to a {} order",
            order.status
        )));
    }
    Ok(())
}
