use notifier_core::models::DeliveryOutcome;
use notifier_pipeline::{run_poll_loop, CycleOrchestrator, CycleState};
use notifier_testing_utils::{
    staged_sequence, InMemoryLaunchStore, MockNameResolver, MockNotificationDispatcher,
    StagedRecordBuilder, TestEnv,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;

fn orchestrator(
    store: &InMemoryLaunchStore,
    resolver: &MockNameResolver,
    dispatcher: &MockNotificationDispatcher,
    batch_size: usize,
) -> CycleOrchestrator {
    CycleOrchestrator::new(
        Arc::new(store.clone()),
        Arc::new(resolver.clone()),
        Arc::new(dispatcher.clone()),
        Arc::new(store.clone()),
        batch_size,
    )
}

fn resolver_for(keys: &[&str]) -> MockNameResolver {
    keys.iter().fold(MockNameResolver::new(), |resolver, key| {
        resolver.with_name(&format!("id-{key}"), &format!("Ad {key} // auto"))
    })
}

#[tokio::test]
async fn test_successful_delivery_archives_all_as_success() {
    let store = InMemoryLaunchStore::with_records(staged_sequence(&["A", "B"]));
    let resolver = resolver_for(&["A", "B"]);
    let dispatcher = MockNotificationDispatcher::responding(200);
    let mut orchestrator = orchestrator(&store, &resolver, &dispatcher, 100);

    let report = orchestrator.run_cycle().await;

    assert_eq!(report.found, 2);
    assert_eq!(report.resolved, 2);
    assert_eq!(report.archived, 2);
    assert_eq!(report.outcome, Some(DeliveryOutcome::Success));
    assert!(store.staged_keys().is_empty());

    let archived = store.archived();
    assert_eq!(archived.len(), 2);
    assert!(archived.iter().all(|r| r.outcome == DeliveryOutcome::Success));

    let payloads = dispatcher.payloads();
    assert_eq!(payloads.len(), 1);
    assert_eq!(payloads[0].count, 2);
    assert_eq!(payloads[0].items[0].display_name, "Ad A");
    assert_eq!(payloads[0].items[1].display_name, "Ad B");
    assert_eq!(orchestrator.state(), CycleState::Sleeping);
}

#[tokio::test]
async fn test_unresolved_record_stays_staged_and_skips_dispatch() {
    let store = InMemoryLaunchStore::with_records(staged_sequence(&["A"]));
    let resolver = MockNameResolver::new();
    let dispatcher = MockNotificationDispatcher::responding(200);
    let mut orchestrator = orchestrator(&store, &resolver, &dispatcher, 100);

    let report = orchestrator.run_cycle().await;

    assert_eq!(report.found, 1);
    assert_eq!(report.unresolved, 1);
    assert!(!report.dispatched);
    assert_eq!(report.outcome, None);
    assert_eq!(dispatcher.call_count(), 0);
    assert_eq!(store.archive_calls(), 0);
    assert!(store.archived().is_empty());
    assert_eq!(store.staged_keys(), vec!["A".to_string()]);

    // 下个周期会再次尝试解析
    orchestrator.run_cycle().await;
    assert_eq!(resolver.calls(), vec!["id-A".to_string(), "id-A".to_string()]);
}

#[tokio::test]
async fn test_rejected_delivery_archives_all_as_failed() {
    let store = InMemoryLaunchStore::with_records(staged_sequence(&["A", "B", "C"]));
    let resolver = resolver_for(&["A", "B", "C"]);
    let dispatcher = MockNotificationDispatcher::responding(500);
    let mut orchestrator = orchestrator(&store, &resolver, &dispatcher, 100);

    let report = orchestrator.run_cycle().await;

    assert_eq!(report.outcome, Some(DeliveryOutcome::Failed));
    assert_eq!(report.archived, 3);
    assert!(store.staged_keys().is_empty());
    assert!(store
        .archived()
        .iter()
        .all(|r| r.outcome == DeliveryOutcome::Failed));
    assert_eq!(dispatcher.call_count(), 1);
}

#[tokio::test]
async fn test_unreachable_endpoint_archives_as_failed() {
    let store = InMemoryLaunchStore::with_records(staged_sequence(&["A"]));
    let resolver = resolver_for(&["A"]);
    let dispatcher = MockNotificationDispatcher::unreachable();
    let mut orchestrator = orchestrator(&store, &resolver, &dispatcher, 100);

    let report = orchestrator.run_cycle().await;
    assert_eq!(report.outcome, Some(DeliveryOutcome::Failed));
    assert_eq!(store.archived().len(), 1);
}

#[tokio::test]
async fn test_batch_cap_processes_in_creation_order() {
    let keys = ["A", "B", "C", "D", "E"];
    let store = InMemoryLaunchStore::with_records(staged_sequence(&keys));
    let resolver = resolver_for(&keys);
    let dispatcher = MockNotificationDispatcher::responding(200);
    let mut orchestrator = orchestrator(&store, &resolver, &dispatcher, 2);

    let report = orchestrator.run_cycle().await;
    assert_eq!(report.found, 2);
    assert_eq!(store.archived_keys(), vec!["A", "B"]);
    assert_eq!(store.staged_keys(), vec!["C", "D", "E"]);

    orchestrator.run_cycle().await;
    orchestrator.run_cycle().await;

    assert_eq!(store.archived_keys(), vec!["A", "B", "C", "D", "E"]);
    assert!(store.staged_keys().is_empty());
    let counts: Vec<_> = dispatcher.payloads().iter().map(|p| p.count).collect();
    assert_eq!(counts, vec![2, 2, 1]);
}

#[tokio::test]
async fn test_empty_cycle_is_idempotent() {
    let store = InMemoryLaunchStore::new();
    let resolver = MockNameResolver::new();
    let dispatcher = MockNotificationDispatcher::responding(200);
    let mut orchestrator = orchestrator(&store, &resolver, &dispatcher, 100);

    for _ in 0..3 {
        let report = orchestrator.run_cycle().await;
        assert_eq!(report.found, 0);
        assert_eq!(report.outcome, None);
    }
    assert_eq!(dispatcher.call_count(), 0);
    assert_eq!(store.archive_calls(), 0);
}

#[tokio::test]
async fn test_partial_resolution_only_archives_resolved() {
    let store = InMemoryLaunchStore::with_records(staged_sequence(&["A", "B", "C"]));
    let resolver = resolver_for(&["A", "C"]);
    let dispatcher = MockNotificationDispatcher::responding(204);
    let mut orchestrator = orchestrator(&store, &resolver, &dispatcher, 100);

    let report = orchestrator.run_cycle().await;

    assert_eq!(report.resolved, 2);
    assert_eq!(report.unresolved, 1);
    assert_eq!(store.archived_keys(), vec!["A", "C"]);
    assert_eq!(store.staged_keys(), vec!["B"]);
    let items = &dispatcher.payloads()[0].items;
    assert_eq!(items.len(), 2);
    assert_eq!(items[0].external_id.as_deref(), Some("id-A"));
    assert_eq!(items[1].external_id.as_deref(), Some("id-C"));
}

#[tokio::test]
async fn test_missing_external_id_is_unresolved_without_lookup() {
    let store = InMemoryLaunchStore::with_records(vec![StagedRecordBuilder::new("A")
        .without_external_id()
        .build()]);
    let resolver = MockNameResolver::new();
    let dispatcher = MockNotificationDispatcher::responding(200);
    let mut orchestrator = orchestrator(&store, &resolver, &dispatcher, 100);

    let report = orchestrator.run_cycle().await;

    assert_eq!(report.unresolved, 1);
    assert!(resolver.calls().is_empty());
    assert_eq!(store.staged_keys(), vec!["A"]);
}

#[tokio::test]
async fn test_read_failure_is_contained() {
    let store = InMemoryLaunchStore::with_records(staged_sequence(&["A"]));
    store.set_fail_reads(true);
    let resolver = resolver_for(&["A"]);
    let dispatcher = MockNotificationDispatcher::responding(200);
    let mut orchestrator = orchestrator(&store, &resolver, &dispatcher, 100);

    let report = orchestrator.run_cycle().await;
    assert!(report.storage_error.is_some());
    assert_eq!(dispatcher.call_count(), 0);
    assert_eq!(orchestrator.state(), CycleState::Sleeping);

    // 存储恢复后继续处理
    store.set_fail_reads(false);
    let report = orchestrator.run_cycle().await;
    assert_eq!(report.archived, 1);
}

#[tokio::test]
async fn test_archive_failure_leaves_records_for_next_cycle() {
    let store = InMemoryLaunchStore::with_records(staged_sequence(&["A", "B"]));
    store.set_fail_archive(true);
    let resolver = resolver_for(&["A", "B"]);
    let dispatcher = MockNotificationDispatcher::responding(200);
    let mut orchestrator = orchestrator(&store, &resolver, &dispatcher, 100);

    let report = orchestrator.run_cycle().await;
    assert!(report.dispatched);
    assert!(report.storage_error.is_some());
    assert_eq!(report.archived, 0);
    assert_eq!(store.staged_keys(), vec!["A", "B"]);

    store.set_fail_archive(false);
    orchestrator.run_cycle().await;
    assert_eq!(dispatcher.call_count(), 2);
    assert_eq!(store.archived_keys(), vec!["A", "B"]);
}

#[tokio::test]
async fn test_archived_record_keeps_full_name() {
    let store = InMemoryLaunchStore::with_records(staged_sequence(&["A"]));
    let resolver = resolver_for(&["A"]);
    let dispatcher = MockNotificationDispatcher::responding(200);
    let mut orchestrator = orchestrator(&store, &resolver, &dispatcher, 100);

    orchestrator.run_cycle().await;
    assert_eq!(
        store.archived()[0].display_name.as_deref(),
        Some("Ad A // auto")
    );
}

#[tokio::test]
async fn test_poll_loop_stops_on_shutdown() {
    TestEnv::init_logging();
    let store = InMemoryLaunchStore::with_records(staged_sequence(&["A"]));
    let resolver = resolver_for(&["A"]);
    let dispatcher = MockNotificationDispatcher::responding(200);
    let orchestrator = orchestrator(&store, &resolver, &dispatcher, 100);

    let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
    let handle = tokio::spawn(run_poll_loop(
        orchestrator,
        Duration::from_secs(3600),
        shutdown_rx,
    ));

    let archived = TestEnv::wait_for(
        || {
            let store = store.clone();
            async move { store.archived().len() == 1 }
        },
        Duration::from_secs(5),
    )
    .await;
    assert!(archived);

    shutdown_tx.send(()).unwrap();
    let cycles = tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(cycles, 1);
}

#[tokio::test]
async fn test_poll_loop_does_not_start_after_shutdown() {
    let store = InMemoryLaunchStore::with_records(staged_sequence(&["A"]));
    let resolver = resolver_for(&["A"]);
    let dispatcher = MockNotificationDispatcher::responding(200);
    let orchestrator = orchestrator(&store, &resolver, &dispatcher, 100);

    let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
    shutdown_tx.send(()).unwrap();

    let cycles = run_poll_loop(orchestrator, Duration::from_millis(10), shutdown_rx).await;
    assert_eq!(cycles, 0);
    assert_eq!(store.staged_keys(), vec!["A"]);
}

#[tokio::test]
async fn test_fully_unresolved_oldest_batch_blocks_newer_records() {
    let store = InMemoryLaunchStore::with_records(staged_sequence(&["bad1", "bad2", "good"]));
    let resolver = resolver_for(&["good"]);
    let dispatcher = MockNotificationDispatcher::responding(200);
    let mut orchestrator = orchestrator(&store, &resolver, &dispatcher, 2);

    for _ in 0..10 {
        let report = orchestrator.run_cycle().await;
        assert_eq!(report.found, 2);
        assert_eq!(report.unresolved, 2);
        assert!(report.stalled);
    }

    // 无法解析的记录留在暂存表，较新的记录一直读不到
    assert_eq!(dispatcher.call_count(), 0);
    assert!(store.archived().is_empty());
    assert_eq!(store.staged_keys(), vec!["bad1", "bad2", "good"]);
    assert!(!resolver.calls().contains(&"id-good".to_string()));
}

#[tokio::test]
async fn test_partially_unresolved_batch_is_not_stalled() {
    let store = InMemoryLaunchStore::with_records(staged_sequence(&["bad1", "good"]));
    let resolver = resolver_for(&["good"]);
    let dispatcher = MockNotificationDispatcher::responding(200);
    let mut orchestrator = orchestrator(&store, &resolver, &dispatcher, 2);

    let report = orchestrator.run_cycle().await;
    assert!(!report.stalled);
    assert_eq!(store.archived_keys(), vec!["good"]);

    // 批次未读满时即使全部失败也不算阻塞
    let report = orchestrator.run_cycle().await;
    assert_eq!(report.found, 1);
    assert!(!report.stalled);
}

#[tokio::test]
async fn test_shutdown_during_dispatch_lets_cycle_finish() {
    let store = InMemoryLaunchStore::with_records(staged_sequence(&["A", "B"]));
    let resolver = resolver_for(&["A", "B"]);
    let (dispatcher, gate) = MockNotificationDispatcher::gated(200);
    let orchestrator = orchestrator(&store, &resolver, &dispatcher, 100);

    let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
    let handle = tokio::spawn(run_poll_loop(
        orchestrator,
        Duration::from_secs(3600),
        shutdown_rx,
    ));

    tokio::time::timeout(Duration::from_secs(5), gate.wait_started())
        .await
        .unwrap();
    shutdown_tx.send(()).unwrap();
    assert!(store.archived().is_empty());
    gate.release();

    let cycles = tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(cycles, 1);
    assert_eq!(dispatcher.call_count(), 1);
    assert_eq!(store.archived_keys(), vec!["A", "B"]);
    assert!(store.staged_keys().is_empty());
}

#[tokio::test]
async fn test_failed_batch_is_not_resent_after_receiver_recovers() {
    let store = InMemoryLaunchStore::with_records(staged_sequence(&["A"]));
    let resolver = resolver_for(&["A", "B"]);
    let dispatcher = MockNotificationDispatcher::responding(503);
    let mut orchestrator = orchestrator(&store, &resolver, &dispatcher, 100);

    let report = orchestrator.run_cycle().await;
    assert_eq!(report.outcome, Some(DeliveryOutcome::Failed));

    dispatcher.set_status(200);
    store.stage(staged_sequence(&["B"]).remove(0));
    let report = orchestrator.run_cycle().await;
    assert_eq!(report.outcome, Some(DeliveryOutcome::Success));

    let payloads = dispatcher.payloads();
    assert_eq!(payloads.len(), 2);
    assert_eq!(payloads[1].count, 1);
    assert_eq!(payloads[1].items[0].external_id.as_deref(), Some("id-B"));
    let outcomes: Vec<_> = store.archived().iter().map(|r| r.outcome).collect();
    assert_eq!(outcomes, vec![DeliveryOutcome::Failed, DeliveryOutcome::Success]);
}

#[tokio::test]
async fn test_payload_carries_record_attributes() {
    let record = StagedRecordBuilder::new("A")
        .with_external_id("id-A")
        .with_group_id("adset-42")
        .with_category("retargeting")
        .build();
    let store = InMemoryLaunchStore::with_records(vec![record]);
    let resolver = resolver_for(&["A"]);
    let dispatcher = MockNotificationDispatcher::responding(200);
    let mut orchestrator = orchestrator(&store, &resolver, &dispatcher, 100);

    orchestrator.run_cycle().await;

    let item = &dispatcher.payloads()[0].items[0];
    assert_eq!(item.display_name, "Ad A");
    assert_eq!(item.group_id.as_deref(), Some("adset-42"));
    assert_eq!(item.subgroup_id.as_deref(), Some("campaign-1"));
    assert_eq!(item.category.as_deref(), Some("retargeting"));
}
