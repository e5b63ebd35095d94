//! The order record and everything a conditional write can say about it.
//!
//! # Actor Framework
//! [`Order`] implements [`ActorEntity`], so it is managed by a
//! [`ResourceActor`](actor_framework::ResourceActor). Every status change is an
//! [`OrderPatch`] sent with an [`OrderPrecondition`]; `apply` routes the patch through
//! the lifecycle table before touching any field.

use crate::lifecycle;
use crate::model::{DeliveryNoteId, ModelError, OrderEvent, OrderStatus, PaymentStatus};
use actor_framework::ActorEntity;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt::{self, Display};
use uuid::Uuid;

/// Type-safe identifier for Orders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OrderId(pub Uuid);

impl OrderId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for OrderId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.simple())
    }
}

/// A place in line: the business day first, then the number issued that day.
///
/// The derived ordering compares `day` before `number`, so tickets from different days
/// never interleave.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct QueueTicket {
    pub day: NaiveDate,
    pub number: u32,
}

impl Display for QueueTicket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.day.format("%Y%m%d"), self.number)
    }
}

/// Driver and truck details. Always set together.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Driver {
    pub name: String,
    pub phone: String,
    pub plate: String,
}

impl Driver {
    /// Trims each field and rejects the group if any of them is blank.
    pub fn new(
        name: impl Into<String>,
        phone: impl Into<String>,
        plate: impl Into<String>,
    ) -> Result<Self, ModelError> {
        let name = name.into().trim().to_string();
        let phone = phone.into().trim().to_string();
        let plate = plate.into().trim().to_uppercase();
        if name.is_empty() || phone.is_empty() || plate.is_empty() {
            return Err(ModelError::Validation(
                "driver name, phone and plate are all required".into(),
            ));
        }
        Ok(Self { name, phone, plate })
    }
}

/// A line as submitted by sales, before validation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemInput {
    pub product_name: String,
    pub quantity: u32,
    pub unit_price: f64,
    pub unit: Option<String>,
}

impl ItemInput {
    pub fn new(product_name: impl Into<String>, quantity: u32, unit_price: f64) -> Self {
        Self {
            product_name: product_name.into(),
            quantity,
            unit_price,
            unit: None,
        }
    }

    fn into_item(self) -> Option<OrderItem> {
        let product_name = self.product_name.trim().to_string();
        if product_name.is_empty() || self.quantity == 0 {
            return None;
        }
        if !self.unit_price.is_finite() || self.unit_price < 0.0 {
            return None;
        }
        let unit = self
            .unit
            .map(|u| u.trim().to_string())
            .filter(|u| !u.is_empty())
            .unwrap_or_else(|| "pcs".to_string());
        Some(OrderItem {
            subtotal: f64::from(self.quantity) * self.unit_price,
            product_name,
            quantity: self.quantity,
            unit,
            unit_price: self.unit_price,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
    pub product_name: String,
    pub quantity: u32,
    pub unit: String,
    pub unit_price: f64,
    pub subtotal: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentProof {
    pub file_id: String,
    pub url: String,
    pub uploaded_at: DateTime<Utc>,
}

/// Photo of the truck, sent by the driver alongside the driver details.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VehiclePhoto {
    pub file_id: String,
    pub url: String,
    pub uploaded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rejection {
    pub reason: String,
    pub actor: String,
    pub at: DateTime<Utc>,
}

/// Creation payload. Identity, tokens and timestamps are chosen by the caller so the
/// record itself stays free of clocks and randomness.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub id: OrderId,
    pub order_number: String,
    pub sales_id: String,
    pub sales_name: String,
    pub sales_phone: Option<String>,
    pub items: Vec<ItemInput>,
    pub invoice_token: String,
    pub invoice_url: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub order_number: String,
    pub sales_id: String,
    pub sales_name: String,
    pub sales_phone: Option<String>,
    pub items: Vec<OrderItem>,
    pub total_quantity: u64,
    pub total_price: f64,

    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub payment_proof: Option<PaymentProof>,
    pub rejection: Option<Rejection>,
    /// The most recent rejection, kept after the proof is re-uploaded.
    pub last_rejection: Option<Rejection>,
    pub verified_by: Option<String>,

    pub invoice_token: String,
    pub invoice_url: String,
    pub driver: Option<Driver>,
    pub vehicle_photo: Option<VehiclePhoto>,
    pub queue_barcode: Option<String>,
    pub queue_token: Option<String>,
    pub queue_ticket: Option<QueueTicket>,
    pub cancel_reason: Option<String>,

    pub delivery_note_id: Option<DeliveryNoteId>,
    pub delivery_note_url: Option<String>,

    pub created_at: DateTime<Utc>,
    pub paid_at: Option<DateTime<Utc>>,
    pub confirmed_at: Option<DateTime<Utc>>,
    pub queued_at: Option<DateTime<Utc>>,
    pub loading_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,

    /// Bumped by every successful write.
    pub revision: u64,
}

impl Order {
    pub fn queue_number(&self) -> Option<u32> {
        self.queue_ticket.map(|t| t.number)
    }
}

/// A change to an order. Every variant but `AttachVehiclePhoto` is one lifecycle event.
#[derive(Debug, Clone)]
pub enum OrderPatch {
    AttachProof {
        proof: PaymentProof,
    },
    VerifyPayment {
        actor: String,
        at: DateTime<Utc>,
    },
    RejectPayment {
        rejection: Rejection,
    },
    SubmitDriver {
        driver: Driver,
        queue_barcode: String,
        at: DateTime<Utc>,
    },
    EnterQueue {
        ticket: QueueTicket,
        queue_token: String,
        at: DateTime<Utc>,
    },
    StartLoading {
        at: DateTime<Utc>,
    },
    FinishLoading {
        at: DateTime<Utc>,
    },
    Cancel {
        reason: Option<String>,
        at: DateTime<Utc>,
    },
    AttachDeliveryNote {
        note_id: DeliveryNoteId,
        url: String,
        at: DateTime<Utc>,
    },
    /// Sets or replaces the photo. Leaves the status alone.
    AttachVehiclePhoto {
        photo: VehiclePhoto,
    },
}

impl OrderPatch {
    /// The lifecycle event this patch carries, if any.
    pub fn event(&self) -> Option<OrderEvent> {
        let event = match self {
            OrderPatch::AttachProof { .. } => OrderEvent::UploadPayment,
            OrderPatch::VerifyPayment { .. } => OrderEvent::VerifyPayment,
            OrderPatch::RejectPayment { .. } => OrderEvent::RejectPayment,
            OrderPatch::SubmitDriver { .. } => OrderEvent::SubmitDriver,
            OrderPatch::EnterQueue { .. } => OrderEvent::ScanEntry,
            OrderPatch::StartLoading { .. } => OrderEvent::CallNext,
            OrderPatch::FinishLoading { .. } => OrderEvent::FinishLoading,
            OrderPatch::Cancel { .. } => OrderEvent::Cancel,
            OrderPatch::AttachDeliveryNote { .. } => OrderEvent::IssueDeliveryNote,
            OrderPatch::AttachVehiclePhoto { .. } => return None,
        };
        Some(event)
    }

    fn at(&self) -> DateTime<Utc> {
        match self {
            OrderPatch::AttachProof { proof } => proof.uploaded_at,
            OrderPatch::AttachVehiclePhoto { photo } => photo.uploaded_at,
            OrderPatch::RejectPayment { rejection } => rejection.at,
            OrderPatch::VerifyPayment { at, .. }
            | OrderPatch::SubmitDriver { at, .. }
            | OrderPatch::EnterQueue { at, .. }
            | OrderPatch::StartLoading { at }
            | OrderPatch::FinishLoading { at }
            | OrderPatch::Cancel { at, .. }
            | OrderPatch::AttachDeliveryNote { at, .. } => *at,
        }
    }
}

/// What the stored order must look like for a patch to land.
#[derive(Debug, Clone, PartialEq)]
pub enum OrderPrecondition {
    /// Unchanged since the caller read it.
    Revision(u64),
    Status(OrderStatus),
    NoDeliveryNote,
}

#[derive(Debug, Clone, PartialEq)]
pub enum OrderFilter {
    All,
    Status(OrderStatus),
    Payment(PaymentStatus),
    /// Queued or Loading.
    InLine,
    InvoiceToken(String),
    QueueBarcode(String),
    /// Either the invoice token or the queue token.
    Token(String),
    /// Paid with a proof that nobody has reviewed yet.
    AwaitingReview,
    /// Completed without a delivery note.
    AwaitingDeliveryNote,
    /// In line with a ticket smaller than the given one.
    AheadOf(QueueTicket),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OrderSort {
    /// Smallest ticket first. Orders without a ticket sort first, oldest first.
    Ticket,
    NewestFirst,
    NewestProofFirst,
    RecentlyUpdated,
    RecentlyCompleted,
}

impl ActorEntity for Order {
    type Id = OrderId;
    type Create = NewOrder;
    type Patch = OrderPatch;
    type Precondition = OrderPrecondition;
    type Filter = OrderFilter;
    type Sort = OrderSort;
    type Error = ModelError;

    fn id(&self) -> &OrderId {
        &self.id
    }

    /// Validates the payload and builds a `Pending` order.
    ///
    /// Items without a name, with zero quantity or with an unusable price are dropped.
    /// At least one item must survive.
    fn from_create_params(params: NewOrder) -> Result<Self, Self::Error> {
        let sales_id = params.sales_id.trim().to_string();
        if sales_id.is_empty() {
            return Err(ModelError::Validation("sales id is required".into()));
        }

        let items: Vec<OrderItem> = params
            .items
            .into_iter()
            .filter_map(ItemInput::into_item)
            .collect();
        if items.is_empty() {
            return Err(ModelError::Validation(
                "at least one item with a name and quantity is required".into(),
            ));
        }

        let total_quantity = items.iter().map(|i| u64::from(i.quantity)).sum();
        let total_price = items.iter().map(|i| i.subtotal).sum();

        Ok(Self {
            id: params.id,
            order_number: params.order_number,
            sales_id,
            sales_name: params.sales_name.trim().to_string(),
            sales_phone: params.sales_phone.filter(|p| !p.trim().is_empty()),
            items,
            total_quantity,
            total_price,
            status: OrderStatus::Pending,
            payment_status: PaymentStatus::Pending,
            payment_proof: None,
            rejection: None,
            last_rejection: None,
            verified_by: None,
            invoice_token: params.invoice_token,
            invoice_url: params.invoice_url,
            driver: None,
            vehicle_photo: None,
            queue_barcode: None,
            queue_token: None,
            queue_ticket: None,
            cancel_reason: None,
            delivery_note_id: None,
            delivery_note_url: None,
            created_at: params.created_at,
            paid_at: None,
            confirmed_at: None,
            queued_at: None,
            loading_at: None,
            completed_at: None,
            cancelled_at: None,
            updated_at: params.created_at,
            revision: 0,
        })
    }

    fn satisfies(&self, precondition: &OrderPrecondition) -> bool {
        match precondition {
            OrderPrecondition::Revision(revision) => self.revision == *revision,
            OrderPrecondition::Status(status) => self.status == *status,
            OrderPrecondition::NoDeliveryNote => self.delivery_note_id.is_none(),
        }
    }

    fn apply(&mut self, patch: OrderPatch) -> Result<(), Self::Error> {
        let next = match patch.event() {
            Some(event) => lifecycle::admit(self, event)?,
            None => {
                lifecycle::admit_vehicle_photo(self)?;
                self.status
            }
        };
        let at = patch.at();

        match patch {
            OrderPatch::AttachProof { proof } => {
                if self.payment_status == PaymentStatus::Rejected {
                    self.last_rejection = self.rejection.take();
                }
                self.payment_status = PaymentStatus::Pending;
                self.payment_proof = Some(proof);
                self.paid_at = Some(at);
            }
            OrderPatch::VerifyPayment { actor, .. } => {
                self.payment_status = PaymentStatus::Verified;
                self.verified_by = Some(actor);
                self.confirmed_at = Some(at);
            }
            OrderPatch::RejectPayment { rejection } => {
                self.payment_status = PaymentStatus::Rejected;
                self.rejection = Some(rejection);
            }
            OrderPatch::SubmitDriver {
                driver,
                queue_barcode,
                ..
            } => {
                self.driver = Some(driver);
                self.queue_barcode = Some(queue_barcode);
            }
            OrderPatch::EnterQueue {
                ticket,
                queue_token,
                ..
            } => {
                self.queue_ticket = Some(ticket);
                self.queue_token = Some(queue_token);
                self.queue_barcode = None;
                self.queued_at = Some(at);
            }
            OrderPatch::StartLoading { .. } => self.loading_at = Some(at),
            OrderPatch::FinishLoading { .. } => self.completed_at = Some(at),
            OrderPatch::Cancel { reason, .. } => {
                self.cancel_reason = reason;
                self.queue_barcode = None;
                self.cancelled_at = Some(at);
            }
            OrderPatch::AttachDeliveryNote { note_id, url, .. } => {
                self.delivery_note_id = Some(note_id);
                self.delivery_note_url = Some(url);
            }
            OrderPatch::AttachVehiclePhoto { photo } => self.vehicle_photo = Some(photo),
        }

        self.status = next;
        self.updated_at = at;
        self.revision += 1;
        Ok(())
    }

    fn matches(&self, filter: &OrderFilter) -> bool {
        match filter {
            OrderFilter::All => true,
            OrderFilter::Status(status) => self.status == *status,
            OrderFilter::Payment(status) => self.payment_status == *status,
            OrderFilter::InLine => self.status.in_line(),
            OrderFilter::InvoiceToken(token) => self.invoice_token == *token,
            OrderFilter::QueueBarcode(code) => self.queue_barcode.as_deref() == Some(code),
            OrderFilter::Token(token) => {
                self.invoice_token == *token || self.queue_token.as_deref() == Some(token)
            }
            OrderFilter::AwaitingReview => {
                self.status == OrderStatus::Paid
                    && self.payment_status == PaymentStatus::Pending
                    && self.payment_proof.is_some()
            }
            OrderFilter::AwaitingDeliveryNote => {
                self.status == OrderStatus::Completed && self.delivery_note_id.is_none()
            }
            OrderFilter::AheadOf(ticket) => {
                self.status.in_line() && self.queue_ticket.is_some_and(|t| t < *ticket)
            }
        }
    }

    fn compare(&self, other: &Self, sort: &OrderSort) -> Ordering {
        let tie = || {
            self.created_at
                .cmp(&other.created_at)
                .then_with(|| self.id.0.cmp(&other.id.0))
        };
        match sort {
            OrderSort::Ticket => self.queue_ticket.cmp(&other.queue_ticket).then_with(tie),
            OrderSort::NewestFirst => other.created_at.cmp(&self.created_at).then_with(tie),
            OrderSort::NewestProofFirst => {
                let uploaded = |o: &Order| o.payment_proof.as_ref().map(|p| p.uploaded_at);
                uploaded(other).cmp(&uploaded(self)).then_with(tie)
            }
            OrderSort::RecentlyUpdated => other.updated_at.cmp(&self.updated_at).then_with(tie),
            OrderSort::RecentlyCompleted => {
                other.completed_at.cmp(&self.completed_at).then_with(tie)
            }
        }
    }
}
