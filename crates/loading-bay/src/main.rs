//! Runs one day at the bay end to end: three orders are placed, paid and queued, the
//! first truck is loaded and gets its delivery note.

use actor_framework::tracing::setup_tracing;
use loading_bay::config::BayConfig;
use loading_bay::model::{ItemInput, OrderId};
use loading_bay::runtime::{
    BayDeps, BayService, BaySystem, CreateOrder, DriverDetails, OrderRef,
};
use std::error::Error;
use tracing::{info, warn, Instrument};

/// PNG signature bytes, enough for the upload check.
const SAMPLE_PNG: &[u8] = &[0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a];

async fn place_and_queue(service: &BayService, n: usize) -> Result<OrderId, Box<dyn Error>> {
    let outcome = service
        .create_order(CreateOrder {
            sales_id: format!("sales-{n}"),
            sales_name: format!("Sales {n}"),
            sales_phone: Some(format!("0812000000{n}")),
            items: vec![
                ItemInput::new("Cement 50kg", 20, 65_000.0),
                ItemInput::new("Rebar 10mm", 12, 48_500.0),
            ],
        })
        .await?;
    let order = outcome.order;
    info!(
        order_number = %order.order_number,
        notification = ?outcome.notification,
        "Invoice sent"
    );

    service
        .upload_payment_proof(&order.invoice_token, SAMPLE_PNG.to_vec(), "image/png")
        .await?;
    service.verify_payment(order.id, "finance").await?;

    let queued = service
        .submit_driver(
            OrderRef::Token(order.invoice_token.clone()),
            DriverDetails {
                name: format!("Driver {n}"),
                phone: format!("0813000000{n}"),
                plate: format!("b {n}23 cd"),
            },
        )
        .await?
        .order;
    service
        .upload_vehicle_photo(&order.invoice_token, SAMPLE_PNG.to_vec(), "image/png")
        .await?;
    let barcode = queued.queue_barcode.ok_or("driver submission issued no barcode")?;
    let entered = service.scan_entry(&barcode).await?.order;

    let wait = service.wait_estimate(entered.id).await?;
    info!(
        queue_number = ?entered.queue_number(),
        orders_ahead = wait.orders_ahead,
        eta = %wait.estimated_time,
        "Truck in line"
    );
    Ok(entered.id)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    setup_tracing();

    let config = BayConfig::load().unwrap_or_else(|e| {
        warn!(error = %e, "Falling back to default configuration");
        BayConfig::default()
    });
    let deps = BayDeps::defaults(&config);
    let system = BaySystem::start(config, deps).await?;
    let service = system.service.clone();

    let span = tracing::info_span!("intake");
    let mut ids = Vec::new();
    for n in 1..=3 {
        ids.push(place_and_queue(&service, n).instrument(span.clone()).await?);
    }

    let span = tracing::info_span!("bay");
    async {
        let called = service.call_next().await?;
        info!(order_number = %called.order.order_number, "Truck called to the bay");

        let overview = service.queue_overview().await?;
        info!(
            queued = overview.queued,
            next_arrival_wait = overview.next_arrival.wait_minutes,
            "Queue overview"
        );

        service.finish_loading(called.order.id).await?;
        let ready = service.ready_for_delivery_note(0, 10).await?;
        info!(waiting = ready.total, "Orders awaiting a delivery note");
        let delivery = service.create_delivery_note(called.order.id, "warehouse").await?;
        info!(
            note_number = %delivery.note.note_number,
            url = %delivery.note.url,
            "Delivery note issued"
        );

        for id in &ids {
            let wait = service.wait_estimate(*id).await?;
            info!(
                order_id = %id,
                orders_ahead = wait.orders_ahead,
                wait_minutes = wait.wait_minutes,
                "Wait"
            );
        }
        info!(stats = ?service.stats().await?, "Order counts");
        Ok::<_, Box<dyn Error>>(())
    }
    .instrument(span)
    .await?;

    drop(service);
    system.shutdown().await?;
    info!("Application completed successfully");
    Ok(())
}
