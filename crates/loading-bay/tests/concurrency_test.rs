mod common;

use actor_framework::ResourceActor;
use chrono::{Duration, NaiveDate, TimeZone, Utc};
use common::*;
use loading_bay::clients::CounterClient;
use loading_bay::error::{AdmissionError, BayError};
use loading_bay::model::{DayCounter, OrderStatus};
use loading_bay::retry::RetryPolicy;
use loading_bay::runtime::QueueFilter;
use loading_bay::sequencer::QueueSequencer;
use std::collections::BTreeSet;

fn sequencer() -> QueueSequencer {
    let config = test_config();
    let (actor, client) = ResourceActor::<DayCounter>::new(config.store.channel_capacity);
    tokio::spawn(actor.run());
    QueueSequencer::new(
        CounterClient::new(client, config.store_timeout()),
        RetryPolicy::new(&config.retry),
    )
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_numbers_are_dense_and_unique() {
    let sequencer = sequencer();
    let day = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();

    let mut handles = Vec::new();
    for _ in 0..24 {
        let sequencer = sequencer.clone();
        handles.push(tokio::spawn(async move {
            sequencer.next_queue_number(day).await
        }));
    }

    let mut numbers = Vec::new();
    for handle in handles {
        numbers.push(handle.await.unwrap().unwrap());
    }
    numbers.sort_unstable();
    assert_eq!(numbers, (1..=24).collect::<Vec<u32>>());
}

#[tokio::test]
async fn test_given_back_number_is_reissued_only_if_still_last() {
    let sequencer = sequencer();
    let day = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();

    assert_eq!(sequencer.next_queue_number(day).await.unwrap(), 1);
    assert_eq!(sequencer.next_queue_number(day).await.unwrap(), 2);
    sequencer.give_back(day, 2).await;
    assert_eq!(sequencer.next_queue_number(day).await.unwrap(), 2);

    // 2 is no longer the last number once 3 is out: it stays burnt.
    assert_eq!(sequencer.next_queue_number(day).await.unwrap(), 3);
    sequencer.give_back(day, 2).await;
    assert_eq!(sequencer.next_queue_number(day).await.unwrap(), 4);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_scans_take_distinct_numbers() {
    let harness = start().await;
    let service = harness.service();

    let mut barcodes = Vec::new();
    for n in 1..=3 {
        let order = driver_submitted(service, n).await;
        barcodes.push(order.queue_barcode.unwrap());
    }

    let mut handles = Vec::new();
    for barcode in barcodes {
        let service = service.clone();
        handles.push(tokio::spawn(async move { service.scan_entry(&barcode).await }));
    }

    let mut numbers = BTreeSet::new();
    for handle in handles {
        let order = handle.await.unwrap().unwrap().order;
        assert_eq!(order.status, OrderStatus::Queued);
        numbers.insert(order.queue_number().unwrap());
    }
    assert_eq!(numbers, BTreeSet::from([1, 2, 3]));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_same_barcode_scanned_twice_queues_once() {
    let harness = start().await;
    let service = harness.service();
    let barcode = driver_submitted(service, 1).await.queue_barcode.unwrap();

    let first = tokio::spawn({
        let service = service.clone();
        let barcode = barcode.clone();
        async move { service.scan_entry(&barcode).await }
    });
    let second = tokio::spawn({
        let service = service.clone();
        async move { service.scan_entry(&barcode).await }
    });

    let results = [first.await.unwrap(), second.await.unwrap()];
    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    for result in &results {
        if let Err(e) = result {
            assert!(
                matches!(e, BayError::NotFound(_) | BayError::InvalidTransition { .. }),
                "unexpected {e:?}"
            );
        }
    }
    let queued = service.queue(QueueFilter::Queued, 0, 10).await.unwrap();
    assert_eq!(queued.total, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_call_next_admits_one_truck() {
    let harness = start().await;
    let service = harness.service();
    for n in 1..=4 {
        queued_order(service, n).await;
    }

    let mut handles = Vec::new();
    for _ in 0..8 {
        let service = service.clone();
        handles.push(tokio::spawn(async move { service.call_next().await }));
    }

    let mut admitted = Vec::new();
    for handle in handles {
        match handle.await.unwrap() {
            Ok(outcome) => admitted.push(outcome.order),
            Err(e) => assert_eq!(e, BayError::Admission(AdmissionError::BayBusy)),
        }
    }
    assert_eq!(admitted.len(), 1);
    assert_eq!(admitted[0].queue_number(), Some(1));

    let stats = service.stats().await.unwrap();
    assert_eq!(stats[&OrderStatus::Loading], 1);
    assert_eq!(stats[&OrderStatus::Queued], 3);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_two_callers_one_order_one_empty_queue() {
    let harness = start().await;
    let service = harness.service();
    queued_order(service, 1).await;

    let a = tokio::spawn({
        let service = service.clone();
        async move { service.call_next().await }
    });
    let b = tokio::spawn({
        let service = service.clone();
        async move { service.call_next().await }
    });
    let results = [a.await.unwrap(), b.await.unwrap()];

    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    let failure = results.iter().find_map(|r| r.as_ref().err()).unwrap();
    assert_eq!(*failure, BayError::Admission(AdmissionError::EmptyQueue));
}

#[tokio::test]
async fn test_busy_bay_and_empty_queue() {
    let harness = start().await;
    let service = harness.service();

    assert_eq!(
        service.call_next().await.unwrap_err(),
        BayError::Admission(AdmissionError::EmptyQueue)
    );

    let first = queued_order(service, 1).await;
    queued_order(service, 2).await;
    service.call_next().await.unwrap();
    assert_eq!(
        service.call_next().await.unwrap_err(),
        BayError::Admission(AdmissionError::BayBusy)
    );

    service.finish_loading(first.id).await.unwrap();
    let next = service.call_next().await.unwrap().order;
    assert_eq!(next.queue_number(), Some(2));
}

#[tokio::test]
async fn test_call_next_is_first_in_first_out() {
    let harness = start().await;
    let service = harness.service();
    let a = queued_order(service, 1).await;
    let b = queued_order(service, 2).await;
    let c = queued_order(service, 3).await;

    for expected in [&a, &b, &c] {
        let called = service.call_next().await.unwrap().order;
        assert_eq!(called.id, expected.id);
        service.finish_loading(called.id).await.unwrap();
    }

    let completed = service.queue(QueueFilter::Completed, 0, 10).await.unwrap();
    let numbers: Vec<_> = completed.items.iter().map(|o| o.queue_number()).collect();
    assert_eq!(numbers, vec![Some(1), Some(2), Some(3)]);
}

#[tokio::test]
async fn test_cancelled_order_leaves_the_line_and_ticket_gap_stays() {
    let harness = start().await;
    let service = harness.service();
    let a = queued_order(service, 1).await;
    let b = queued_order(service, 2).await;

    service.cancel_order(a.id, Some("no show")).await.unwrap();
    assert_eq!(service.wait_estimate(b.id).await.unwrap().orders_ahead, 0);

    let c = queued_order(service, 3).await;
    assert_eq!(c.queue_number(), Some(3));
    assert_eq!(service.call_next().await.unwrap().order.id, b.id);
}

#[tokio::test]
async fn test_wait_estimates_follow_the_line() {
    let harness = start().await;
    let service = harness.service();
    let a = queued_order(service, 1).await;
    let b = queued_order(service, 2).await;
    let c = queued_order(service, 3).await;

    let waits = |ahead: usize| (ahead, ahead as u64 * 30);
    let c_before = service.wait_estimate(c.id).await.unwrap();
    assert_eq!((c_before.orders_ahead, c_before.wait_minutes), waits(2));
    // 10:00 local plus an hour.
    assert_eq!(c_before.estimated_time, "11:00");

    // The truck being loaded still counts toward the wait.
    service.call_next().await.unwrap();
    let c_loading = service.wait_estimate(c.id).await.unwrap();
    assert_eq!(c_loading, c_before);

    service.finish_loading(a.id).await.unwrap();
    let b_after = service.wait_estimate(b.id).await.unwrap();
    let c_after = service.wait_estimate(c.id).await.unwrap();
    assert_eq!((b_after.orders_ahead, b_after.wait_minutes), waits(0));
    assert_eq!((c_after.orders_ahead, c_after.wait_minutes), waits(1));
    assert_eq!(service.wait_estimate(a.id).await.unwrap().orders_ahead, 0);

    let overview = service.queue_overview().await.unwrap();
    assert!(overview.loading.is_none());
    assert_eq!(overview.queued, 2);
    assert_eq!(overview.next_arrival.orders_ahead, 2);

    // A confirmed order not yet at the gate waits behind everyone in line.
    let waiting = driver_submitted(service, 4).await;
    assert_eq!(service.wait_estimate(waiting.id).await.unwrap().orders_ahead, 2);
}

#[tokio::test]
async fn test_numbering_restarts_at_local_midnight() {
    let harness = start().await;
    let service = harness.service();

    // 23:50 at +07:00.
    harness
        .clock
        .set(Utc.with_ymd_and_hms(2026, 3, 2, 16, 50, 0).unwrap());
    let late_1 = queued_order(service, 1).await;
    let late_2 = queued_order(service, 2).await;
    assert_eq!(late_1.queue_number(), Some(1));
    assert_eq!(late_2.queue_number(), Some(2));

    harness.clock.advance(Duration::minutes(20));
    let early = queued_order(service, 3).await;
    assert_eq!(early.queue_number(), Some(1));
    assert_eq!(
        early.queue_ticket.unwrap().day,
        NaiveDate::from_ymd_opt(2026, 3, 3).unwrap()
    );

    // Yesterday's tickets stay ahead of today's.
    let line = service.queue(QueueFilter::InLine, 0, 10).await.unwrap();
    let ids: Vec<_> = line.items.iter().map(|o| o.id).collect();
    assert_eq!(ids, vec![late_1.id, late_2.id, early.id]);
    assert_eq!(service.wait_estimate(early.id).await.unwrap().orders_ahead, 2);
    assert_eq!(service.call_next().await.unwrap().order.id, late_1.id);
}
