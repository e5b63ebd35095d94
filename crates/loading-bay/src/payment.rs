//! # Payment Gate
//!
//! Turns payment commands into order patches after checking them against the order the
//! caller just read. Nothing here writes; the command service sends the patch with a
//! revision precondition, and the order actor checks the same guards again on apply.
//!
//! A payment is reviewed once. After `verify` or `reject` has resolved it, a second
//! decision fails with `InvalidTransition` if the resolution was already visible, or with
//! `Conflict` if both decisions raced on the same revision.

use crate::error::BayError;
use crate::lifecycle;
use crate::model::{Order, OrderEvent, OrderPatch, PaymentProof, Rejection};
use crate::ports::StoredFile;
use chrono::{DateTime, Utc};

pub struct PaymentGate;

impl PaymentGate {
    /// Attach a proof. Allowed on a pending order, or on a paid order whose last proof
    /// was rejected.
    pub fn upload(
        order: &Order,
        file: StoredFile,
        at: DateTime<Utc>,
    ) -> Result<OrderPatch, BayError> {
        lifecycle::admit(order, OrderEvent::UploadPayment)?;
        Ok(OrderPatch::AttachProof {
            proof: PaymentProof {
                file_id: file.id,
                url: file.url,
                uploaded_at: at,
            },
        })
    }

    pub fn verify(order: &Order, actor: &str, at: DateTime<Utc>) -> Result<OrderPatch, BayError> {
        let actor = required(actor, "reviewer")?;
        lifecycle::admit(order, OrderEvent::VerifyPayment)?;
        Ok(OrderPatch::VerifyPayment { actor, at })
    }

    pub fn reject(
        order: &Order,
        actor: &str,
        reason: &str,
        at: DateTime<Utc>,
    ) -> Result<OrderPatch, BayError> {
        let actor = required(actor, "reviewer")?;
        let reason = required(reason, "rejection reason")?;
        lifecycle::admit(order, OrderEvent::RejectPayment)?;
        Ok(OrderPatch::RejectPayment {
            rejection: Rejection { reason, actor, at },
        })
    }
}

fn required(value: &str, what: &str) -> Result<String, BayError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(BayError::Validation(format!("{what} is required")));
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ItemInput, NewOrder, OrderId, OrderStatus, PaymentStatus};
    use actor_framework::ActorEntity;

    fn paid_order() -> Order {
        let now = Utc::now();
        let mut order = Order::from_create_params(NewOrder {
            id: OrderId::new(),
            order_number: "ORD-P".into(),
            sales_id: "s".into(),
            sales_name: "S".into(),
            sales_phone: None,
            items: vec![ItemInput::new("Cement", 4, 10.0)],
            invoice_token: "t".into(),
            invoice_url: "u".into(),
            created_at: now,
        })
        .unwrap();
        let file = StoredFile {
            id: "f1".into(),
            url: "http://files/f1".into(),
        };
        order
            .apply(PaymentGate::upload(&order, file, now).unwrap())
            .unwrap();
        order
    }

    #[test]
    fn test_verify_requires_reviewer() {
        let order = paid_order();
        assert!(matches!(
            PaymentGate::verify(&order, "  ", Utc::now()),
            Err(BayError::Validation(_))
        ));
    }

    #[test]
    fn test_reject_after_verify_is_invalid() {
        let mut order = paid_order();
        order
            .apply(PaymentGate::verify(&order, "admin", Utc::now()).unwrap())
            .unwrap();
        assert_eq!(order.status, OrderStatus::Confirmed);
        assert_eq!(order.payment_status, PaymentStatus::Verified);

        let result = PaymentGate::reject(&order, "admin", "blurry", Utc::now());
        assert_eq!(
            result.unwrap_err(),
            BayError::InvalidTransition {
                status: OrderStatus::Confirmed,
                event: OrderEvent::RejectPayment
            }
        );
    }

    #[test]
    fn test_reupload_moves_rejection_into_history() {
        let mut order = paid_order();
        order
            .apply(PaymentGate::reject(&order, "admin", "blurry", Utc::now()).unwrap())
            .unwrap();
        assert_eq!(order.status, OrderStatus::Paid);
        assert_eq!(order.payment_status, PaymentStatus::Rejected);

        let file = StoredFile {
            id: "f2".into(),
            url: "http://files/f2".into(),
        };
        order
            .apply(PaymentGate::upload(&order, file, Utc::now()).unwrap())
            .unwrap();
        assert_eq!(order.payment_status, PaymentStatus::Pending);
        assert!(order.rejection.is_none());
        assert_eq!(
            order.last_rejection.as_ref().map(|r| r.reason.as_str()),
            Some("blurry")
        );
        assert_eq!(order.payment_proof.as_ref().map(|p| p.file_id.as_str()), Some("f2"));
    }
}
