//! Commands that change orders.

use crate::error::BayError;
use crate::lifecycle;
use crate::model::{
    DeliveryNoteId, Driver, NewDeliveryNote, NewOrder, Order, OrderEvent, OrderFilter, OrderId,
    OrderPatch, OrderPrecondition, QueueTicket, VehiclePhoto,
};
use crate::payment::PaymentGate;
use crate::ports::notification::dispatch;
use crate::ports::{NotificationKind, NotificationOutcome};
use crate::runtime::{
    BayService, CommandOutcome, CreateOrder, DeliveryOutcome, DriverDetails, OrderRef,
};
use chrono::{DateTime, Utc};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

/// An opaque token for client links and barcodes.
fn new_token() -> String {
    Uuid::new_v4().simple().to_string()
}

impl BayService {
    /// Read, check, write; again on conflict. `build` sees the order as it was read and
    /// the current time, and returns the patch to write or a terminal error.
    async fn transition<F>(
        &self,
        operation: &'static str,
        id: OrderId,
        build: F,
    ) -> Result<Order, BayError>
    where
        F: Fn(&Order, DateTime<Utc>) -> Result<OrderPatch, BayError> + Send + Sync,
    {
        let build = &build;
        self.retry
            .run(operation, move |attempt| async move {
                let order = self.orders.get_by_id(id).await?;
                let patch = build(&order, self.clock.now())?;
                debug!(
                    operation,
                    attempt,
                    order_id = %id,
                    revision = order.revision,
                    "Writing patch"
                );
                self.orders
                    .conditional_update(id, OrderPrecondition::Revision(order.revision), patch)
                    .await
            })
            .await
    }

    async fn notify(&self, order: &Order, kind: NotificationKind) -> NotificationOutcome {
        dispatch(self.notifier.as_ref(), order, kind, self.notify_timeout).await
    }

    /// Read an order back after a write to it timed out. The store answers in arrival
    /// order, so the read shows whether the write landed. `None` if the read fails too.
    async fn read_back(&self, id: OrderId) -> Option<Order> {
        match self.orders.get_by_id(id).await {
            Ok(order) => Some(order),
            Err(e) => {
                warn!(order_id = %id, error = %e, "Order unreadable after a lost reply");
                None
            }
        }
    }

    async fn by_invoice_token(&self, invoice_token: &str) -> Result<Order, BayError> {
        self.orders
            .find_by_token(OrderFilter::InvoiceToken(invoice_token.to_string()))
            .await?
            .ok_or_else(|| BayError::NotFound("order for invoice token".into()))
    }

    /// `PREFIX-YYYYMMDDHHMMSS-XXXX` in bay-local time.
    fn document_number(&self, prefix: &str, at: DateTime<Utc>) -> String {
        format!(
            "{}-{}-{}",
            prefix,
            self.calendar.local(at).format("%Y%m%d%H%M%S"),
            new_token()[..4].to_uppercase()
        )
    }

    async fn resolve(&self, target: &OrderRef) -> Result<OrderId, BayError> {
        match target {
            OrderRef::Id(id) => Ok(*id),
            OrderRef::Token(token) => self.by_invoice_token(token).await.map(|order| order.id),
        }
    }

    #[instrument(skip(self, request), fields(sales_id = %request.sales_id))]
    pub async fn create_order(&self, request: CreateOrder) -> Result<CommandOutcome, BayError> {
        let now = self.clock.now();
        let invoice_token = new_token();
        let params = NewOrder {
            id: OrderId::new(),
            order_number: self.document_number("ORD", now),
            sales_id: request.sales_id,
            sales_name: request.sales_name,
            sales_phone: request.sales_phone,
            items: request.items,
            invoice_url: self.config.client_url(&format!("order/{invoice_token}")),
            invoice_token,
            created_at: now,
        };

        let order = self.orders.create(params).await?;
        info!(
            order_id = %order.id,
            order_number = %order.order_number,
            total_price = order.total_price,
            "Order created"
        );
        let notification = self.notify(&order, NotificationKind::Invoice).await;
        Ok(CommandOutcome { order, notification })
    }

    /// Store the proof file and attach it to the order holding `invoice_token`.
    #[instrument(skip(self, bytes), fields(size = bytes.len()))]
    pub async fn upload_payment_proof(
        &self,
        invoice_token: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<CommandOutcome, BayError> {
        let order = self.by_invoice_token(invoice_token).await?;
        // Refuse before a file is stored for an order that cannot take it.
        lifecycle::admit(&order, OrderEvent::UploadPayment)?;

        let file = self.files.upload(bytes, content_type).await?;
        let order = self
            .transition("upload_payment", order.id, |order, at| {
                PaymentGate::upload(order, file.clone(), at)
            })
            .await?;

        info!(order_id = %order.id, file_id = %file.id, "Payment proof attached");
        Ok(CommandOutcome {
            order,
            notification: NotificationOutcome::NotAttempted,
        })
    }

    /// Store a photo of the truck on the order holding `invoice_token`. A later photo
    /// replaces the earlier one.
    #[instrument(skip(self, bytes), fields(size = bytes.len()))]
    pub async fn upload_vehicle_photo(
        &self,
        invoice_token: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<CommandOutcome, BayError> {
        let order = self.by_invoice_token(invoice_token).await?;
        lifecycle::admit_vehicle_photo(&order)?;
        if !content_type.starts_with("image/") {
            return Err(BayError::Validation(format!(
                "vehicle photo must be an image, got {content_type}"
            )));
        }

        let file = self.files.upload(bytes, content_type).await?;
        let order = self
            .transition("vehicle_photo", order.id, |order, at| {
                lifecycle::admit_vehicle_photo(order)?;
                Ok(OrderPatch::AttachVehiclePhoto {
                    photo: VehiclePhoto {
                        file_id: file.id.clone(),
                        url: file.url.clone(),
                        uploaded_at: at,
                    },
                })
            })
            .await?;

        info!(order_id = %order.id, file_id = %file.id, "Vehicle photo attached");
        Ok(CommandOutcome {
            order,
            notification: NotificationOutcome::NotAttempted,
        })
    }

    #[instrument(skip(self), fields(order_id = %id))]
    pub async fn verify_payment(
        &self,
        id: OrderId,
        actor: &str,
    ) -> Result<CommandOutcome, BayError> {
        let order = self
            .transition("verify_payment", id, |order, at| {
                PaymentGate::verify(order, actor, at)
            })
            .await?;
        info!(status = %order.status, "Payment verified");
        let notification = self.notify(&order, NotificationKind::PaymentVerified).await;
        Ok(CommandOutcome { order, notification })
    }

    #[instrument(skip(self), fields(order_id = %id))]
    pub async fn reject_payment(
        &self,
        id: OrderId,
        actor: &str,
        reason: &str,
    ) -> Result<CommandOutcome, BayError> {
        let order = self
            .transition("reject_payment", id, |order, at| {
                PaymentGate::reject(order, actor, reason, at)
            })
            .await?;
        info!(reason, "Payment rejected");
        let notification = self.notify(&order, NotificationKind::PaymentRejected).await;
        Ok(CommandOutcome { order, notification })
    }

    /// Record driver and truck details and issue the barcode scanned at the gate.
    /// Submitting again before the scan replaces the details and the barcode.
    #[instrument(skip(self, details))]
    pub async fn submit_driver(
        &self,
        target: OrderRef,
        details: DriverDetails,
    ) -> Result<CommandOutcome, BayError> {
        let driver = Driver::new(details.name, details.phone, details.plate)?;
        let id = self.resolve(&target).await?;

        let order = self
            .transition("submit_driver", id, |order, at| {
                lifecycle::admit(order, OrderEvent::SubmitDriver)?;
                Ok(OrderPatch::SubmitDriver {
                    driver: driver.clone(),
                    queue_barcode: new_token(),
                    at,
                })
            })
            .await?;

        info!(order_id = %order.id, plate = %driver.plate, "Driver submitted");
        Ok(CommandOutcome {
            order,
            notification: NotificationOutcome::NotAttempted,
        })
    }

    /// The truck is at the gate: take a queue number for today and join the line.
    #[instrument(skip(self))]
    pub async fn scan_entry(&self, barcode: &str) -> Result<CommandOutcome, BayError> {
        let barcode = barcode.trim();
        if barcode.is_empty() {
            return Err(BayError::Validation("queue barcode is required".into()));
        }
        let id = self
            .orders
            .find_by_token(OrderFilter::QueueBarcode(barcode.to_string()))
            .await?
            .map(|order| order.id)
            .ok_or_else(|| BayError::NotFound(format!("queue barcode {barcode}")))?;

        let order = self
            .retry
            .run("scan_entry", move |_| async move {
                let order = self.orders.get_by_id(id).await?;
                lifecycle::admit(&order, OrderEvent::ScanEntry)?;
                if order.queue_barcode.as_deref() != Some(barcode) {
                    return Err(BayError::NotFound(format!("queue barcode {barcode}")));
                }

                let now = self.clock.now();
                let day = self.calendar.day(now);
                let number = self.sequencer.next_queue_number(day).await?;
                let ticket = QueueTicket { day, number };
                let patch = OrderPatch::EnterQueue {
                    ticket,
                    queue_token: new_token(),
                    at: now,
                };
                let err = match self
                    .orders
                    .conditional_update(id, OrderPrecondition::Revision(order.revision), patch)
                    .await
                {
                    Ok(order) => return Ok(order),
                    Err(e) => e,
                };

                // A number may only go back once it is certain no order holds it.
                if matches!(err, BayError::Dependency(_)) {
                    match self.read_back(id).await {
                        Some(stored) if stored.queue_ticket == Some(ticket) => {
                            debug!(%ticket, "Queue entry landed without a reply");
                            return Ok(stored);
                        }
                        Some(_) => {}
                        None => {
                            warn!(%ticket, "Queue number left unused");
                            return Err(err);
                        }
                    }
                }
                self.sequencer.give_back(day, number).await;
                Err(err)
            })
            .await?;

        info!(order_id = %order.id, queue_number = ?order.queue_number(), "Order queued");
        let notification = self.notify(&order, NotificationKind::QueueEntered).await;
        Ok(CommandOutcome { order, notification })
    }

    pub async fn call_next(&self) -> Result<CommandOutcome, BayError> {
        let order = self.admission.call_next().await?;
        let notification = self.notify(&order, NotificationKind::LoadingCalled).await;
        Ok(CommandOutcome { order, notification })
    }

    pub async fn finish_loading(&self, id: OrderId) -> Result<CommandOutcome, BayError> {
        let order = self.admission.finish_loading(id).await?;
        let notification = self.notify(&order, NotificationKind::LoadingFinished).await;
        Ok(CommandOutcome { order, notification })
    }

    #[instrument(skip(self), fields(order_id = %id))]
    pub async fn cancel_order(
        &self,
        id: OrderId,
        reason: Option<&str>,
    ) -> Result<CommandOutcome, BayError> {
        let reason = reason
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .map(str::to_string);
        let order = self
            .transition("cancel", id, |order, at| {
                lifecycle::admit(order, OrderEvent::Cancel)?;
                Ok(OrderPatch::Cancel {
                    reason: reason.clone(),
                    at,
                })
            })
            .await?;
        info!(queue_number = ?order.queue_number(), "Order cancelled");
        let notification = self.notify(&order, NotificationKind::Cancelled).await;
        Ok(CommandOutcome { order, notification })
    }

    /// Issue the delivery note for a completed order.
    ///
    /// The note is stored first and then linked from the order with a write that only
    /// succeeds while the order has no note. If another note got there first, this one is
    /// deleted and the call fails with `Conflict`. If the link's reply is lost, the order
    /// is read back and the note is kept when the order points at it.
    #[instrument(skip(self), fields(order_id = %order_id))]
    pub async fn create_delivery_note(
        &self,
        order_id: OrderId,
        actor: &str,
    ) -> Result<DeliveryOutcome, BayError> {
        let actor = actor.trim();
        if actor.is_empty() {
            return Err(BayError::Validation("issuer is required".into()));
        }
        let order = self.orders.get_by_id(order_id).await?;
        lifecycle::admit(&order, OrderEvent::IssueDeliveryNote)?;
        let driver = order
            .driver
            .clone()
            .ok_or_else(|| BayError::Validation("order has no driver details".into()))?;

        let now = self.clock.now();
        let token = new_token();
        let note = self
            .notes
            .create(NewDeliveryNote {
                id: DeliveryNoteId::new(),
                note_number: self.document_number("SJ", now),
                url: self.config.client_url(&format!("delivery-note/{token}")),
                token,
                order_id,
                order_number: order.order_number.clone(),
                sales_name: order.sales_name.clone(),
                sales_phone: order.sales_phone.clone(),
                items: order.items.clone(),
                driver,
                created_by: actor.to_string(),
                created_at: now,
            })
            .await?;

        let patch = OrderPatch::AttachDeliveryNote {
            note_id: note.id,
            url: note.url.clone(),
            at: now,
        };
        let order = match self
            .orders
            .conditional_update(order_id, OrderPrecondition::NoDeliveryNote, patch)
            .await
        {
            Ok(order) => order,
            Err(BayError::Dependency(reason)) => match self.read_back(order_id).await {
                Some(stored) if stored.delivery_note_id == Some(note.id) => {
                    debug!(note_id = %note.id, "Delivery note link landed without a reply");
                    stored
                }
                Some(_) => {
                    self.discard_note(note.id).await;
                    return Err(BayError::Dependency(reason));
                }
                None => {
                    warn!(note_id = %note.id, "Delivery note kept, link state unknown");
                    return Err(BayError::Dependency(reason));
                }
            },
            Err(e) => {
                warn!(note_id = %note.id, error = %e, "Delivery note not linked, removing it");
                self.discard_note(note.id).await;
                return Err(e);
            }
        };

        info!(note_id = %note.id, note_number = %note.note_number, "Delivery note issued");
        let notification = self.notify(&order, NotificationKind::DeliveryNote).await;
        Ok(DeliveryOutcome {
            order,
            note,
            notification,
        })
    }

    async fn discard_note(&self, id: DeliveryNoteId) {
        if let Err(e) = self.notes.delete(id).await {
            warn!(note_id = %id, error = %e, "Orphan delivery note left behind");
        }
    }
}
