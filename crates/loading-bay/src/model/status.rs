use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};

/// Where an order is in its journey from placement to leaving the bay.
///
/// `Completed` and `Cancelled` are terminal. Orders in terminal states are kept for
/// history and never removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Paid,
    Confirmed,
    Queued,
    Loading,
    Completed,
    Cancelled,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 7] = [
        OrderStatus::Pending,
        OrderStatus::Paid,
        OrderStatus::Confirmed,
        OrderStatus::Queued,
        OrderStatus::Loading,
        OrderStatus::Completed,
        OrderStatus::Cancelled,
    ];

    pub fn is_terminal(self) -> bool {
        matches!(self, OrderStatus::Completed | OrderStatus::Cancelled)
    }

    /// Queued or Loading: the order holds a ticket that still counts toward waits.
    pub fn in_line(self) -> bool {
        matches!(self, OrderStatus::Queued | OrderStatus::Loading)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Paid => "paid",
            OrderStatus::Confirmed => "confirmed",
            OrderStatus::Queued => "queued",
            OrderStatus::Loading => "loading",
            OrderStatus::Completed => "completed",
            OrderStatus::Cancelled => "cancelled",
        }
    }
}

impl Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Review state of the attached payment proof.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Verified,
    Rejected,
}

impl Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Verified => "verified",
            PaymentStatus::Rejected => "rejected",
        })
    }
}

/// Commands that move an order through the transition table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderEvent {
    UploadPayment,
    VerifyPayment,
    RejectPayment,
    SubmitDriver,
    ScanEntry,
    CallNext,
    FinishLoading,
    Cancel,
    IssueDeliveryNote,
}

impl OrderEvent {
    pub const ALL: [OrderEvent; 9] = [
        OrderEvent::UploadPayment,
        OrderEvent::VerifyPayment,
        OrderEvent::RejectPayment,
        OrderEvent::SubmitDriver,
        OrderEvent::ScanEntry,
        OrderEvent::CallNext,
        OrderEvent::FinishLoading,
        OrderEvent::Cancel,
        OrderEvent::IssueDeliveryNote,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            OrderEvent::UploadPayment => "upload_payment",
            OrderEvent::VerifyPayment => "verify_payment",
            OrderEvent::RejectPayment => "reject_payment",
            OrderEvent::SubmitDriver => "submit_driver",
            OrderEvent::ScanEntry => "scan_entry",
            OrderEvent::CallNext => "call_next",
            OrderEvent::FinishLoading => "finish_loading",
            OrderEvent::Cancel => "cancel",
            OrderEvent::IssueDeliveryNote => "issue_delivery_note",
        }
    }
}

impl Display for OrderEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
