mod common;

use actor_framework::mock::{MockClient, SlowReplies};
use actor_framework::{FrameworkError, ResourceClient};
use async_trait::async_trait;
use common::*;
use loading_bay::clients::OrderClient;
use loading_bay::config::BayConfig;
use loading_bay::error::{AdmissionError, BayError};
use loading_bay::model::{
    BayId, BayPatch, BayPrecondition, Order, OrderId, OrderPatch, OrderPrecondition, OrderStatus,
};
use loading_bay::ports::{
    Delivery, NotificationKind, NotificationOutcome, NotificationPort, NotifyError,
};
use loading_bay::runtime::{BayStores, QueueFilter};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Pattern: real client wrapper over a scripted store. The mock answers from its queue,
/// so failure paths can be exercised without a contrived race.
#[tokio::test]
async fn test_closed_store_is_a_dependency_error() {
    let mock = MockClient::<Order>::new();
    let id = OrderId::new();
    mock.expect_get(id).return_err(FrameworkError::ActorClosed);

    let orders = OrderClient::new(mock.client(), Duration::from_secs(1));
    let err = orders.get_by_id(id).await.unwrap_err();
    assert!(matches!(err, BayError::Dependency(_)));
    assert!(!err.is_retryable());
    mock.verify();
}

#[tokio::test]
async fn test_lost_conditional_write_is_a_conflict() {
    let mock = MockClient::<Order>::new();
    let id = OrderId::new();
    mock.expect_update(id)
        .return_err(FrameworkError::Conflict(id.to_string()));

    let orders = OrderClient::new(mock.client(), Duration::from_secs(1));
    let err = orders
        .conditional_update(
            id,
            OrderPrecondition::Revision(3),
            OrderPatch::StartLoading { at: morning() },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, BayError::Conflict(_)));
    assert!(err.is_retryable());
    mock.verify();
}

#[tokio::test]
async fn test_missing_order_is_not_found() {
    let mock = MockClient::<Order>::new();
    let id = OrderId::new();
    mock.expect_get(id).return_ok(None);

    let orders = OrderClient::new(mock.client(), Duration::from_secs(1));
    assert!(matches!(
        orders.get_by_id(id).await,
        Err(BayError::NotFound(_))
    ));
    mock.verify();
}

#[tokio::test]
async fn test_unresponsive_store_times_out() {
    // The receiver is kept alive but never polled, so requests are accepted and never
    // answered.
    let (sender, _receiver) = tokio::sync::mpsc::channel(8);
    let orders = OrderClient::new(ResourceClient::<Order>::new(sender), Duration::from_millis(50));

    let started = Instant::now();
    let err = orders.get_by_id(OrderId::new()).await.unwrap_err();
    assert!(matches!(err, BayError::Dependency(_)), "got {err:?}");
    assert!(started.elapsed() < Duration::from_secs(5));
}

struct FailingNotifier {
    calls: AtomicUsize,
}

#[async_trait]
impl NotificationPort for FailingNotifier {
    async fn notify(
        &self,
        _order: &Order,
        _kind: NotificationKind,
    ) -> Result<Delivery, NotifyError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(NotifyError::Unavailable("gateway down".into()))
    }
}

struct StalledNotifier;

#[async_trait]
impl NotificationPort for StalledNotifier {
    async fn notify(
        &self,
        _order: &Order,
        _kind: NotificationKind,
    ) -> Result<Delivery, NotifyError> {
        tokio::time::sleep(Duration::from_secs(30)).await;
        Ok(Delivery::Sent)
    }
}

struct RecordingNotifier {
    kinds: std::sync::Mutex<Vec<NotificationKind>>,
}

#[async_trait]
impl NotificationPort for RecordingNotifier {
    async fn notify(
        &self,
        _order: &Order,
        kind: NotificationKind,
    ) -> Result<Delivery, NotifyError> {
        self.kinds.lock().unwrap().push(kind);
        Ok(Delivery::Sent)
    }
}

#[tokio::test]
async fn test_failed_notification_keeps_the_transition() {
    let notifier = Arc::new(FailingNotifier {
        calls: AtomicUsize::new(0),
    });
    let harness = start_with(test_config(), notifier.clone()).await;
    let service = harness.service();

    let created = service
        .create_order(loading_bay::runtime::CreateOrder {
            sales_id: "sales-9".into(),
            sales_name: "Sari".into(),
            sales_phone: None,
            items: vec![loading_bay::model::ItemInput::new("Sand", 2, 150_000.0)],
        })
        .await
        .unwrap();
    assert_eq!(created.notification, NotificationOutcome::FailedSilently);

    service
        .upload_payment_proof(&created.order.invoice_token, PNG.to_vec(), "image/jpeg")
        .await
        .unwrap();
    let verified = service
        .verify_payment(created.order.id, "finance")
        .await
        .unwrap();
    assert_eq!(verified.notification, NotificationOutcome::FailedSilently);
    assert_eq!(
        service.order(created.order.id).await.unwrap().status,
        OrderStatus::Confirmed
    );
    assert_eq!(notifier.calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_stalled_notification_is_abandoned() {
    let mut config = test_config();
    config.store.timeout_ms = 100;
    let harness = start_with(config, Arc::new(StalledNotifier)).await;
    let service = harness.service();

    let started = Instant::now();
    let order = place_order(service).await;
    assert!(started.elapsed() < Duration::from_secs(10));

    let cancelled = service.cancel_order(order.id, None).await.unwrap();
    assert_eq!(cancelled.notification, NotificationOutcome::FailedSilently);
    assert_eq!(cancelled.order.status, OrderStatus::Cancelled);
}

#[tokio::test]
async fn test_notifications_follow_the_journey() {
    let notifier = Arc::new(RecordingNotifier {
        kinds: std::sync::Mutex::new(Vec::new()),
    });
    let harness = start_with(test_config(), notifier.clone()).await;
    let service = harness.service();

    let order = completed_order(service).await;
    let outcome = service
        .create_delivery_note(order.id, "warehouse")
        .await
        .unwrap();
    assert_eq!(outcome.notification, NotificationOutcome::Sent);

    let kinds = notifier.kinds.lock().unwrap().clone();
    assert_eq!(
        kinds,
        vec![
            NotificationKind::Invoice,
            NotificationKind::PaymentVerified,
            NotificationKind::QueueEntered,
            NotificationKind::LoadingCalled,
            NotificationKind::LoadingFinished,
            NotificationKind::DeliveryNote,
        ]
    );
}

#[tokio::test]
async fn test_rejected_file_leaves_no_trace() {
    let harness = start().await;
    let service = harness.service();
    let order = place_order(service).await;

    let err = service
        .upload_payment_proof(&order.invoice_token, b"GIF89a".to_vec(), "image/gif")
        .await
        .unwrap_err();
    assert!(matches!(err, BayError::Validation(_)));
    assert!(harness.files.is_empty().await);
    assert_eq!(service.order(order.id).await.unwrap(), order);
}

// Writes that land while their reply is lost. A proxy holds back the reply past the
// store timeout, so the service sees `Dependency` for a write that happened.

const LATE: Duration = Duration::from_millis(300);

fn short_timeout() -> BayConfig {
    let mut config = test_config();
    config.store.timeout_ms = 100;
    config
}

async fn slow_orders() -> (Harness, SlowReplies) {
    let mut slow = None;
    let harness = start_routed(short_timeout(), |stores| {
        let (replies, orders) = SlowReplies::wrap(stores.orders, LATE);
        slow = Some(replies);
        BayStores { orders, ..stores }
    })
    .await;
    (harness, slow.expect("order store routed"))
}

async fn slow_bay() -> (Harness, SlowReplies) {
    let mut slow = None;
    let harness = start_routed(short_timeout(), |stores| {
        let (replies, bay) = SlowReplies::wrap(stores.bay, LATE);
        slow = Some(replies);
        BayStores { bay, ..stores }
    })
    .await;
    (harness, slow.expect("bay store routed"))
}

fn bay_busy() -> BayError {
    BayError::Admission(AdmissionError::BayBusy)
}

#[tokio::test]
async fn test_scan_with_lost_reply_keeps_its_number() {
    let (harness, slow) = slow_orders().await;
    let service = harness.service();
    let first = driver_submitted(service, 1).await;
    let second = driver_submitted(service, 2).await;

    slow.arm(1);
    let entered = service
        .scan_entry(first.queue_barcode.as_deref().unwrap())
        .await
        .unwrap()
        .order;
    assert_eq!(entered.status, OrderStatus::Queued);
    assert_eq!(entered.queue_number(), Some(1));

    let next = service
        .scan_entry(second.queue_barcode.as_deref().unwrap())
        .await
        .unwrap()
        .order;
    assert_eq!(next.queue_number(), Some(2));

    let line = service.queue(QueueFilter::Queued, 0, 10).await.unwrap();
    let numbers: Vec<_> = line.items.iter().map(Order::queue_number).collect();
    assert_eq!(numbers, vec![Some(1), Some(2)]);
}

#[tokio::test]
async fn test_bay_claim_with_lost_reply_still_admits() {
    let (harness, slow) = slow_bay().await;
    let service = harness.service();
    let first = queued_order(service, 1).await;
    let second = queued_order(service, 2).await;

    slow.arm(1);
    let called = service.call_next().await.unwrap().order;
    assert_eq!(called.id, first.id);
    assert_eq!(called.status, OrderStatus::Loading);
    assert_eq!(service.call_next().await.unwrap_err(), bay_busy());

    service.finish_loading(first.id).await.unwrap();
    assert_eq!(service.call_next().await.unwrap().order.id, second.id);
}

#[tokio::test]
async fn test_start_of_loading_with_lost_reply_keeps_the_bay() {
    let (harness, slow) = slow_orders().await;
    let service = harness.service();
    let first = queued_order(service, 1).await;
    queued_order(service, 2).await;

    slow.arm(1);
    let called = service.call_next().await.unwrap().order;
    assert_eq!(called.id, first.id);
    assert_eq!(called.status, OrderStatus::Loading);

    assert_eq!(service.call_next().await.unwrap_err(), bay_busy());
    let stats = service.stats().await.unwrap();
    assert_eq!(stats[&OrderStatus::Loading], 1);
    assert_eq!(stats[&OrderStatus::Queued], 1);
}

#[tokio::test]
async fn test_claim_left_by_vanished_caller_is_carried_on() {
    let mut bay = None;
    let harness = start_routed(test_config(), |stores| {
        bay = Some(stores.bay.clone());
        stores
    })
    .await;
    let bay = bay.expect("bay store routed");
    let service = harness.service();
    let first = queued_order(service, 1).await;
    queued_order(service, 2).await;

    // Claimed, never moved to Loading.
    bay.update_if(BayId, BayPrecondition::Free, BayPatch::Occupy(first.id))
        .await
        .unwrap();

    let called = service.call_next().await.unwrap().order;
    assert_eq!(called.id, first.id);
    assert_eq!(
        service.current_loading().await.unwrap().map(|o| o.id),
        Some(first.id)
    );
    assert_eq!(service.call_next().await.unwrap_err(), bay_busy());
}

#[tokio::test]
async fn test_claim_on_cancelled_order_is_released() {
    let mut bay = None;
    let harness = start_routed(test_config(), |stores| {
        bay = Some(stores.bay.clone());
        stores
    })
    .await;
    let bay = bay.expect("bay store routed");
    let service = harness.service();
    let first = queued_order(service, 1).await;
    let second = queued_order(service, 2).await;

    bay.update_if(BayId, BayPrecondition::Free, BayPatch::Occupy(first.id))
        .await
        .unwrap();
    service.cancel_order(first.id, Some("left the gate")).await.unwrap();

    assert_eq!(service.call_next().await.unwrap().order.id, second.id);
}

#[tokio::test]
async fn test_note_link_with_lost_reply_keeps_the_note() {
    let (harness, slow) = slow_orders().await;
    let service = harness.service();
    let order = completed_order(service).await;

    slow.arm(1);
    let outcome = service
        .create_delivery_note(order.id, "warehouse")
        .await
        .unwrap();

    let stored = service.order(order.id).await.unwrap();
    assert_eq!(stored.delivery_note_id, Some(outcome.note.id));
    assert_eq!(stored.delivery_note_url.as_deref(), Some(outcome.note.url.as_str()));
    assert_eq!(
        service.delivery_note(outcome.note.id).await.unwrap(),
        outcome.note
    );
    assert_eq!(service.delivery_note_count(order.id).await.unwrap(), 1);
}
