use crate::model::{OrderEvent, OrderStatus};

/// The transition table: where `event` takes an order sitting in `status`, or `None` if
/// the event is not allowed from there.
///
/// Guards that depend on more than the status (payment review state, attached proof,
/// driver details) are checked by [`admit`](super::admit).
pub fn target(status: OrderStatus, event: OrderEvent) -> Option<OrderStatus> {
    use OrderEvent as E;
    use OrderStatus as S;

    match (status, event) {
        (S::Pending, E::UploadPayment) => Some(S::Paid),
        // Re-upload after a rejection.
        (S::Paid, E::UploadPayment) => Some(S::Paid),
        (S::Paid, E::VerifyPayment) => Some(S::Confirmed),
        (S::Paid, E::RejectPayment) => Some(S::Paid),
        (S::Confirmed, E::SubmitDriver) => Some(S::Confirmed),
        (S::Confirmed, E::ScanEntry) => Some(S::Queued),
        (S::Queued, E::CallNext) => Some(S::Loading),
        (S::Loading, E::FinishLoading) => Some(S::Completed),
        (S::Completed, E::IssueDeliveryNote) => Some(S::Completed),

        (S::Pending | S::Paid | S::Confirmed | S::Queued, E::Cancel) => Some(S::Cancelled),

        (S::Pending, _)
        | (S::Paid, _)
        | (S::Confirmed, _)
        | (S::Queued, _)
        | (S::Loading, _)
        | (S::Completed, _)
        | (S::Cancelled, _) => None,
    }
}
