//! Scheduler lifecycle tests. These drive a real `JobScheduler`, so they run
//! on the multi-threaded runtime.

mod support;

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use brandpulse_core::MonitorEvent;
use brandpulse_monitor::{MemoryStore, MonitorError, MonitorScheduler, MonitorStore};
use support::{config, monitor, monitor_with, raw, GatedSource, StaticSource};

fn mentions() -> Vec<brandpulse_core::RawMention> {
    vec![
        raw("1", "love it"),
        raw("2", "terrible"),
        raw("3", "arrived today"),
    ]
}

#[tokio::test(flavor = "multi_thread")]
async fn start_runs_an_immediate_cycle() {
    let store = Arc::new(MemoryStore::new());
    let source = Arc::new(StaticSource::new(mentions()));
    let monitor = monitor_with(store.clone(), Some(source), Vec::new(), config());
    let scheduler = MonitorScheduler::with_interval(monitor, Duration::from_secs(3600))
        .await
        .unwrap();

    let outcome = scheduler.start("Acme").await.unwrap();

    assert_eq!(outcome.mentions_found, 3);
    assert!(!outcome.already_active);
    assert!(outcome.brand.is_monitoring);
    assert!(scheduler.is_active(outcome.brand.id).await);

    let cycle = outcome.cycle.expect("immediate cycle");
    assert_eq!(cycle.analyzed, 3);
    assert_eq!(cycle.snapshot.map(|s| s.total_count), Some(3));
    assert_eq!(
        store.list_snapshots(outcome.brand.id, 10).await.unwrap().len(),
        1
    );

    scheduler.shutdown().await.unwrap();
}

#[tokio::test(flavor = "multi_thread")]
async fn starting_an_active_brand_does_not_add_a_second_job() {
    let store = Arc::new(MemoryStore::new());
    let source = Arc::new(StaticSource::new(mentions()));
    let monitor = monitor_with(store.clone(), Some(source.clone()), Vec::new(), config());
    let scheduler = MonitorScheduler::with_interval(monitor, Duration::from_secs(3600))
        .await
        .unwrap();

    let first = scheduler.start("Acme").await.unwrap();
    let second = scheduler.start("acme").await.unwrap();

    assert_eq!(first.brand.id, second.brand.id);
    assert!(second.already_active);
    assert_eq!(scheduler.active_brands().await, vec![first.brand.id]);
    assert_eq!(source.calls.load(Ordering::SeqCst), 2);
    // Duplicates from the second fetch are ignored.
    assert_eq!(store.mentions(first.brand.id).len(), 3);

    scheduler.shutdown().await.unwrap();
}

#[tokio::test(flavor = "multi_thread")]
async fn blank_name_is_rejected() {
    let scheduler =
        MonitorScheduler::with_interval(monitor(Arc::new(MemoryStore::new())), Duration::from_secs(60))
            .await
            .unwrap();

    let err = scheduler.start("  ").await.unwrap_err();
    assert!(matches!(err, MonitorError::Validation(_)));
    assert!(scheduler.active_brands().await.is_empty());

    scheduler.shutdown().await.unwrap();
}

#[tokio::test(flavor = "multi_thread")]
async fn zero_interval_is_rejected() {
    let err = MonitorScheduler::with_interval(monitor(Arc::new(MemoryStore::new())), Duration::ZERO)
        .await
        .unwrap_err();
    assert!(matches!(err, MonitorError::Validation(_)));
}

#[tokio::test(flavor = "multi_thread")]
async fn stopping_an_unknown_brand_is_not_found() {
    let scheduler =
        MonitorScheduler::with_interval(monitor(Arc::new(MemoryStore::new())), Duration::from_secs(60))
            .await
            .unwrap();

    let id = uuid::Uuid::new_v4();
    let err = scheduler.stop(id).await.unwrap_err();
    assert!(matches!(err, MonitorError::BrandNotFound(missing) if missing == id));

    scheduler.shutdown().await.unwrap();
}

#[tokio::test(flavor = "multi_thread")]
async fn stop_clears_the_flag_and_keeps_history() {
    let store = Arc::new(MemoryStore::new());
    let source = Arc::new(StaticSource::new(mentions()));
    let monitor = monitor_with(store.clone(), Some(source), Vec::new(), config());
    let scheduler = MonitorScheduler::with_interval(monitor, Duration::from_secs(3600))
        .await
        .unwrap();
    let brand = scheduler.start("Acme").await.unwrap().brand;

    scheduler.stop(brand.id).await.unwrap();

    assert!(!scheduler.is_active(brand.id).await);
    let reloaded = store.get_brand(brand.id).await.unwrap().unwrap();
    assert!(!reloaded.is_monitoring);
    assert_eq!(store.mentions(brand.id).len(), 3);
    assert_eq!(store.list_snapshots(brand.id, 10).await.unwrap().len(), 1);
    assert!(scheduler.trigger(brand.id).await.is_none());

    scheduler.shutdown().await.unwrap();
}

#[tokio::test(flavor = "multi_thread")]
async fn stop_during_a_running_cycle_lets_it_finish_and_schedules_nothing_more() {
    let store = Arc::new(MemoryStore::new());
    let source = Arc::new(GatedSource::new(mentions()));
    let monitor = monitor_with(store.clone(), Some(source.clone()), Vec::new(), config());
    let scheduler = Arc::new(
        MonitorScheduler::with_interval(monitor, Duration::from_secs(1))
            .await
            .unwrap(),
    );
    let brand = scheduler.monitor().register_brand("Acme").await.unwrap();
    let mut events = scheduler.monitor().notifier().subscribe(brand.id);

    let starter = {
        let scheduler = Arc::clone(&scheduler);
        tokio::spawn(async move { scheduler.start("Acme").await })
    };
    source.entered.notified().await;

    scheduler.stop(brand.id).await.unwrap();
    source.release.notify_one();

    let outcome = starter.await.unwrap().unwrap();
    let snapshot = outcome
        .cycle
        .and_then(|c| c.snapshot)
        .expect("in-flight cycle completes");
    assert_eq!(snapshot.total_count, 3);

    match events.recv().await.unwrap() {
        MonitorEvent::Snapshot(pushed) => assert_eq!(pushed, snapshot),
        other @ MonitorEvent::Alert(_) => panic!("expected snapshot, got {other:?}"),
    }

    assert!(scheduler.trigger(brand.id).await.is_none());
    tokio::time::sleep(Duration::from_millis(2500)).await;
    assert_eq!(store.list_snapshots(brand.id, 10).await.unwrap().len(), 1);
    assert!(!store.get_brand(brand.id).await.unwrap().unwrap().is_monitoring);

    scheduler.shutdown().await.unwrap();
}

#[tokio::test(flavor = "multi_thread")]
async fn tick_is_skipped_while_a_cycle_is_in_flight() {
    let store = Arc::new(MemoryStore::new());
    let source = Arc::new(GatedSource::new(mentions()));
    let monitor = monitor_with(store.clone(), Some(source.clone()), Vec::new(), config());
    let scheduler = Arc::new(
        MonitorScheduler::with_interval(monitor, Duration::from_secs(3600))
            .await
            .unwrap(),
    );

    let starter = {
        let scheduler = Arc::clone(&scheduler);
        tokio::spawn(async move { scheduler.start("Acme").await })
    };
    source.entered.notified().await;

    let brand_id = scheduler.active_brands().await[0];
    assert!(scheduler.trigger(brand_id).await.is_none());

    source.release.notify_one();
    starter.await.unwrap().unwrap();

    let report = scheduler.trigger(brand_id).await.expect("no cycle in flight now");
    assert!(report.ingest.is_none());
    assert_eq!(store.list_snapshots(brand_id, 10).await.unwrap().len(), 2);

    scheduler.shutdown().await.unwrap();
}

#[tokio::test(flavor = "multi_thread")]
async fn interval_job_re_runs_the_cycle() {
    let store = Arc::new(MemoryStore::new());
    let source = Arc::new(StaticSource::new(mentions()));
    let monitor = monitor_with(store.clone(), Some(source.clone()), Vec::new(), config());
    let scheduler = MonitorScheduler::with_interval(monitor, Duration::from_secs(1))
        .await
        .unwrap();

    let brand = scheduler.start("Acme").await.unwrap().brand;
    tokio::time::sleep(Duration::from_millis(3500)).await;

    let snapshots = store.list_snapshots(brand.id, 20).await.unwrap();
    assert!(snapshots.len() >= 2, "got {} snapshots", snapshots.len());
    assert!(snapshots.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
    // Interval cycles do not fetch again.
    assert_eq!(source.calls.load(Ordering::SeqCst), 1);

    scheduler.shutdown().await.unwrap();
}

#[tokio::test(flavor = "multi_thread")]
async fn flag_cleared_in_store_stops_interval_cycles() {
    let store = Arc::new(MemoryStore::new());
    let source = Arc::new(StaticSource::new(mentions()));
    let monitor = monitor_with(store.clone(), Some(source), Vec::new(), config());
    let scheduler = MonitorScheduler::with_interval(monitor, Duration::from_secs(1))
        .await
        .unwrap();

    let brand = scheduler.start("Acme").await.unwrap().brand;
    // Another process (the CLI) stops the brand through the database only.
    store.set_monitoring(brand.id, false).await.unwrap();
    tokio::time::sleep(Duration::from_millis(3500)).await;

    assert_eq!(store.list_snapshots(brand.id, 20).await.unwrap().len(), 1);
    assert!(!scheduler.is_active(brand.id).await);
    assert!(scheduler.active_brands().await.is_empty());

    scheduler.shutdown().await.unwrap();
}

#[tokio::test(flavor = "multi_thread")]
async fn trigger_retires_a_brand_stopped_elsewhere() {
    let store = Arc::new(MemoryStore::new());
    let source = Arc::new(StaticSource::new(mentions()));
    let monitor = monitor_with(store.clone(), Some(source), Vec::new(), config());
    let scheduler = MonitorScheduler::with_interval(monitor, Duration::from_secs(3600))
        .await
        .unwrap();

    let brand = scheduler.start("Acme").await.unwrap().brand;
    store.set_monitoring(brand.id, false).await.unwrap();

    assert!(scheduler.trigger(brand.id).await.is_none());
    assert!(!scheduler.is_active(brand.id).await);
    assert_eq!(store.list_snapshots(brand.id, 10).await.unwrap().len(), 1);

    // Starting again re-enables the flag and schedules a fresh job.
    let restarted = scheduler.start("Acme").await.unwrap();
    assert!(!restarted.already_active);
    assert!(scheduler.is_active(brand.id).await);
    assert!(scheduler.trigger(brand.id).await.is_some());

    scheduler.shutdown().await.unwrap();
}

#[tokio::test(flavor = "multi_thread")]
async fn resume_schedules_persisted_brands_without_running_them() {
    let store = Arc::new(MemoryStore::new());
    let acme = store.upsert_brand("Acme").await.unwrap();
    let idle = store.upsert_brand("Idle").await.unwrap();
    store.set_monitoring(idle.id, false).await.unwrap();

    let scheduler = MonitorScheduler::with_interval(monitor(store.clone()), Duration::from_secs(3600))
        .await
        .unwrap();

    assert_eq!(scheduler.resume_active().await.unwrap(), 1);
    assert_eq!(scheduler.active_brands().await, vec![acme.id]);
    assert!(store.list_snapshots(acme.id, 10).await.unwrap().is_empty());
    // A second resume finds nothing new.
    assert_eq!(scheduler.resume_active().await.unwrap(), 0);

    assert!(scheduler.trigger(acme.id).await.is_some());
    assert!(scheduler.trigger(idle.id).await.is_none());

    scheduler.shutdown().await.unwrap();
}
