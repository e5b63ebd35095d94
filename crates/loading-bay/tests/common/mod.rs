#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};
use loading_bay::clock::ManualClock;
use loading_bay::config::BayConfig;
use loading_bay::model::{ItemInput, Order};
use loading_bay::ports::{InMemoryFileStore, LinkNotifier, NotificationPort};
use loading_bay::runtime::{
    BayDeps, BayService, BayStores, BaySystem, CreateOrder, DriverDetails, OrderRef,
};
use std::sync::Arc;

pub const PNG: &[u8] = &[0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a];

pub struct Harness {
    pub system: BaySystem,
    pub clock: Arc<ManualClock>,
    pub files: Arc<InMemoryFileStore>,
}

impl Harness {
    pub fn service(&self) -> &BayService {
        &self.system.service
    }
}

/// 10:00 local time at +07:00.
pub fn morning() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 2, 3, 0, 0).unwrap()
}

/// Plenty of attempts and short backoff so heavy contention settles quickly.
pub fn test_config() -> BayConfig {
    let mut config = BayConfig::default();
    config.retry.max_attempts = 64;
    config.retry.base_backoff_ms = 1;
    config.retry.max_backoff_ms = 10;
    config
}

pub async fn start() -> Harness {
    let config = test_config();
    let notifier = Arc::new(LinkNotifier::new(config.client_base_url.clone()));
    start_with(config, notifier).await
}

pub async fn start_with(config: BayConfig, notifier: Arc<dyn NotificationPort>) -> Harness {
    launch(config, notifier, |stores| stores).await
}

/// A bay whose store clients pass through `route` first.
pub async fn start_routed(
    config: BayConfig,
    route: impl FnOnce(BayStores) -> BayStores,
) -> Harness {
    let notifier = Arc::new(LinkNotifier::new(config.client_base_url.clone()));
    launch(config, notifier, route).await
}

async fn launch(
    config: BayConfig,
    notifier: Arc<dyn NotificationPort>,
    route: impl FnOnce(BayStores) -> BayStores,
) -> Harness {
    let clock = Arc::new(ManualClock::new(morning()));
    let files = Arc::new(InMemoryFileStore::new(config.client_base_url.clone()));
    let deps = BayDeps {
        clock: clock.clone(),
        notifier,
        files: files.clone(),
    };
    let system = BaySystem::start_with(config, deps, route)
        .await
        .expect("bay starts");
    Harness {
        system,
        clock,
        files,
    }
}

pub fn driver(n: usize) -> DriverDetails {
    DriverDetails {
        name: format!("Driver {n}"),
        phone: format!("081300000{n}"),
        plate: format!("b {n}234 xy"),
    }
}

pub async fn place_order(service: &BayService) -> Order {
    service
        .create_order(CreateOrder {
            sales_id: "sales-1".into(),
            sales_name: "Budi".into(),
            sales_phone: Some("08120000001".into()),
            items: vec![
                ItemInput::new("Cement 50kg", 10, 65_000.0),
                ItemInput::new("Rebar 10mm", 4, 48_500.0),
            ],
        })
        .await
        .expect("order created")
        .order
}

pub async fn paid_order(service: &BayService) -> Order {
    let order = place_order(service).await;
    service
        .upload_payment_proof(&order.invoice_token, PNG.to_vec(), "image/png")
        .await
        .expect("proof uploaded")
        .order
}

pub async fn confirmed_order(service: &BayService) -> Order {
    let order = paid_order(service).await;
    service
        .verify_payment(order.id, "finance")
        .await
        .expect("payment verified")
        .order
}

pub async fn driver_submitted(service: &BayService, n: usize) -> Order {
    let order = confirmed_order(service).await;
    service
        .submit_driver(OrderRef::Id(order.id), driver(n))
        .await
        .expect("driver submitted")
        .order
}

pub async fn queued_order(service: &BayService, n: usize) -> Order {
    let order = driver_submitted(service, n).await;
    let barcode = order.queue_barcode.expect("barcode issued");
    service
        .scan_entry(&barcode)
        .await
        .expect("entered queue")
        .order
}

pub async fn completed_order(service: &BayService) -> Order {
    let order = queued_order(service, 1).await;
    let called = service.call_next().await.expect("called").order;
    assert_eq!(called.id, order.id);
    service
        .finish_loading(order.id)
        .await
        .expect("finished")
        .order
}
