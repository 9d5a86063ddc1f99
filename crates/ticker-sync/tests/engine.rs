//! 동기화 엔진 통합 테스트.

mod common;

use std::time::Duration;

use common::*;
use ticker_sync::{
    BatchDelay, BatchPersister, DiffClassifier, ErrorPolicy, FailureReason, FieldwiseComparator,
    MemoryRepository, PersistOperation, PersistedIndex, Repository, SourceSet, SyncEngine,
    SyncError,
};

#[tokio::test]
async fn test_reference_scenario() {
    // 소스 {A, B, C}, 저장소 {B, D}, B는 조회 실패
    let source = StaticSource::new(&["A", "B", "C"]);
    let enricher = ScriptedEnricher::new()
        .ok("A", 10)
        .failing("B", FailureReason::UnknownKey)
        .ok("C", 30);
    let repo = MemoryRepository::with_records(vec![quote("B", 1), quote("D", 2)]);

    let result = engine(&source, &enricher, &repo, options(50)).run().await.unwrap();

    assert_eq!(sorted(result.added_keys()), keys(&["A", "C"]));
    assert_eq!(result.to_delete, keys(&["D"]));
    assert_eq!(result.to_remove_due_to_errors, keys(&["B"]));
    assert!(result.unchanged.is_empty());
    assert!(result.to_update.is_empty());
    assert_eq!(result.failed_keys(), keys(&["B"]));
    assert_eq!(result.deleted_count, 2);

    assert_eq!(repo.snapshot().await, vec![quote("A", 10), quote("C", 30)]);
}

#[tokio::test]
async fn test_second_run_is_idempotent() {
    let source = StaticSource::new(&["A", "B", "C"]);
    let enricher = ScriptedEnricher::new().ok("A", 1).ok("B", 2).ok("C", 3);
    let repo = MemoryRepository::with_records(vec![quote("A", 1), quote("Z", 9)]);
    let engine = engine(&source, &enricher, &repo, options(2));

    let first = engine.run().await.unwrap();
    assert_eq!(sorted(first.added_keys()), keys(&["B", "C"]));
    assert_eq!(first.to_delete, keys(&["Z"]));

    let second = engine.run().await.unwrap();
    assert!(second.to_add.is_empty());
    assert!(second.to_update.is_empty());
    assert!(second.to_delete.is_empty());
    assert!(second.to_remove_due_to_errors.is_empty());
    assert_eq!(sorted(second.unchanged.clone()), keys(&["A", "B", "C"]));
    assert!(second.is_noop());
}

#[tokio::test]
async fn test_lookup_failure_deletes_existing_row() {
    let source = StaticSource::new(&["A", "B"]);
    let enricher = ScriptedEnricher::new().ok("A", 1).ok("B", 2);
    let repo = MemoryRepository::new();
    let engine = engine(&source, &enricher, &repo, options(50));

    engine.run().await.unwrap();
    assert_eq!(repo.count().await.unwrap(), 2);

    enricher.set("B", Err(FailureReason::missing("marketCap")));
    let result = engine.run().await.unwrap();

    assert_eq!(result.to_remove_due_to_errors, keys(&["B"]));
    assert!(result.to_delete.is_empty());
    let remaining: Vec<String> = repo.get_all().await.unwrap().into_iter().map(|q| q.symbol).collect();
    assert_eq!(remaining, keys(&["A"]));
}

#[tokio::test]
async fn test_retain_policy_keeps_erroring_row() {
    let source = StaticSource::new(&["A", "B"]);
    let enricher = ScriptedEnricher::new()
        .ok("A", 1)
        .failing("B", FailureReason::NoData);
    let repo = MemoryRepository::with_records(vec![quote("B", 2)]);

    let mut opts = options(50);
    opts.error_policy = ErrorPolicy::Retain;
    let result = engine(&source, &enricher, &repo, opts).run().await.unwrap();

    assert!(result.to_remove_due_to_errors.is_empty());
    assert_eq!(result.retained_due_to_errors, keys(&["B"]));
    assert_eq!(repo.get(&"B".to_string()).await, Some(quote("B", 2)));
    assert_eq!(result.deleted_count, 0);
}

#[tokio::test]
async fn test_new_key_is_persisted_with_enriched_fields() {
    let source = StaticSource::new(&["NEW"]);
    let enricher = ScriptedEnricher::new().ok("NEW", 42);
    let repo = MemoryRepository::new();

    let result = engine(&source, &enricher, &repo, options(50)).run().await.unwrap();

    assert_eq!(result.added_keys(), keys(&["NEW"]));
    assert_eq!(repo.get(&"NEW".to_string()).await, Some(quote("NEW", 42)));
}

#[tokio::test]
async fn test_single_field_change_is_update() {
    let source = StaticSource::new(&["A", "B", "C"]);
    let enricher = ScriptedEnricher::new().ok("A", 1).ok("B", 2).ok("C", 3);
    let repo =
        MemoryRepository::with_records(vec![quote("A", 1), quote("B", 2), quote("C", 3)]);
    let engine = engine(&source, &enricher, &repo, options(50));

    let mut renamed = quote("B", 2);
    renamed.name = "B Holdings".to_string();
    enricher.set("B", Ok(renamed.clone()));

    let result = engine.run().await.unwrap();

    assert_eq!(result.updated_keys(), keys(&["B"]));
    assert_eq!(sorted(result.unchanged.clone()), keys(&["A", "C"]));
    assert!(result.to_add.is_empty());
    assert_eq!(repo.get(&"B".to_string()).await, Some(renamed));
    assert_eq!(repo.calls().await, vec![PersistOperation::Update]);
}

#[tokio::test]
async fn test_invalid_record_counts_as_failure() {
    let source = StaticSource::new(&["A"]);
    let enricher = ScriptedEnricher::new().ok("A", -5);
    let repo = MemoryRepository::with_records(vec![quote("A", 5)]);

    let result = engine(&source, &enricher, &repo, options(50)).run().await.unwrap();

    assert!(matches!(result.failed_lookup[0].reason, FailureReason::Invalid(_)));
    assert_eq!(result.to_remove_due_to_errors, keys(&["A"]));
    assert_eq!(repo.count().await.unwrap(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_batch_boundary_and_inter_batch_delay() {
    // 2 × batch_size + 1 = 5
    let symbols = ["A", "B", "C", "D", "E"];
    let source = StaticSource::new(&symbols);
    let mut enricher = ScriptedEnricher::new();
    for (i, s) in symbols.iter().enumerate() {
        enricher = enricher.ok(s, i as i64);
    }
    let repo = MemoryRepository::new();

    let mut opts = options(2);
    opts.delay = BatchDelay::default();
    let started = tokio::time::Instant::now();
    let result = engine(&source, &enricher, &repo, opts).run().await.unwrap();

    assert_eq!(result.batches_processed, 3);
    let batch_lens: Vec<usize> = enricher.calls().iter().map(Vec::len).collect();
    assert_eq!(batch_lens, vec![2, 2, 1]);
    assert_eq!(
        repo.calls().await,
        vec![PersistOperation::Insert, PersistOperation::Insert, PersistOperation::Insert]
    );

    // 마지막 배치 뒤에는 쉬지 않음: 1040ms × 2
    assert!(started.elapsed() >= Duration::from_millis(2080));
    assert!(started.elapsed() < Duration::from_millis(3000));
}

#[tokio::test]
async fn test_later_batch_sees_earlier_write() {
    let repo = MemoryRepository::<Quote>::new();
    let source: SourceSet<String> = SourceSet::from_keys(keys(&["A"]));
    let mut index = PersistedIndex::<Quote>::empty();
    let classifier = DiffClassifier::new(FieldwiseComparator);
    let persister = BatchPersister::new(&repo);

    // 배치 1: A 추가
    let diff = classifier.classify(vec![("A".to_string(), Ok(quote("A", 1)))], &source, &index);
    assert_eq!(diff.to_add.len(), 1);
    persister.persist(1, &diff.to_add, &diff.to_update, &mut index).await.unwrap();

    // 배치 3: 같은 데이터는 기존 레코드로 보임
    let diff = classifier.classify(vec![("A".to_string(), Ok(quote("A", 1)))], &source, &index);
    assert!(diff.to_add.is_empty());
    assert_eq!(diff.unchanged, keys(&["A"]));

    // 시작 시점 키가 아니므로 삭제 대상이 아님
    assert!(index.initial_keys().is_empty());
    assert!(index.contains(&"A".to_string()));
}

#[tokio::test]
async fn test_reconcile_updates_caller_index() {
    let source = StaticSource::new(&[]);
    let enricher = ScriptedEnricher::new().ok("A", 1).ok("B", 2).ok("C", 3);
    let repo = MemoryRepository::new();
    let engine = engine(&source, &enricher, &repo, options(1));

    let set: SourceSet<String> = SourceSet::from_keys(keys(&["A", "B", "C"]));
    let mut index = PersistedIndex::<Quote>::empty();
    let result = engine.reconcile(&set, &mut index).await.unwrap();

    assert_eq!(result.batches_processed, 3);
    assert_eq!(index.len(), 3);
    assert!(result.to_delete.is_empty());
}

#[tokio::test]
async fn test_batch_transport_failure_falls_back_to_single_lookups() {
    let source = StaticSource::new(&["A", "B", "C"]);
    let enricher = ScriptedEnricher::new().ok("A", 1).ok("C", 3);
    enricher.fail_batches(true);
    let repo = MemoryRepository::new();

    let result = engine(&source, &enricher, &repo, options(50)).run().await.unwrap();

    assert_eq!(result.fallback_batches, 1);
    assert_eq!(sorted(result.added_keys()), keys(&["A", "C"]));
    assert_eq!(result.failed_lookup[0].key, "B");
    assert_eq!(result.failed_lookup[0].reason, FailureReason::NoData);
}

#[tokio::test]
async fn test_insert_failure_aborts_run() {
    let source = StaticSource::new(&["A"]);
    let enricher = ScriptedEnricher::new().ok("A", 1);
    let repo = MemoryRepository::with_records(vec![quote("OLD", 1)]);
    repo.fail_on(Some(PersistOperation::Insert)).await;

    let err = engine(&source, &enricher, &repo, options(50)).run().await.unwrap_err();

    assert!(matches!(
        err,
        SyncError::Persistence {
            operation: PersistOperation::Insert,
            batch: 1,
            ..
        }
    ));
    // 중단되었으므로 삭제도 일어나지 않음
    assert_eq!(repo.count().await.unwrap(), 1);
}

#[tokio::test]
async fn test_delete_failure_propagates() {
    let source = StaticSource::new(&["A"]);
    let enricher = ScriptedEnricher::new().ok("A", 1);
    let repo = MemoryRepository::with_records(vec![quote("A", 1), quote("GONE", 1)]);
    repo.fail_on(Some(PersistOperation::Delete)).await;

    let err = engine(&source, &enricher, &repo, options(50)).run().await.unwrap_err();
    assert!(matches!(
        err,
        SyncError::Persistence {
            operation: PersistOperation::Delete,
            ..
        }
    ));
}

#[tokio::test]
async fn test_source_failure_is_fatal_before_diffing() {
    let enricher = ScriptedEnricher::new();
    let repo = MemoryRepository::with_records(vec![quote("A", 1)]);
    let engine = SyncEngine::new("quotes", BrokenSource, &enricher, &repo, options(50));

    let err = engine.run().await.unwrap_err();

    assert!(matches!(err, SyncError::Source(_)));
    assert!(enricher.calls().is_empty());
    assert!(repo.calls().await.is_empty());
}

#[tokio::test]
async fn test_empty_source_is_refused() {
    let source = StaticSource::new(&[]);
    let enricher = ScriptedEnricher::new();
    let repo = MemoryRepository::with_records(vec![quote("A", 1)]);

    let err = engine(&source, &enricher, &repo, options(50)).run().await.unwrap_err();

    assert!(matches!(err, SyncError::Source(_)));
    assert_eq!(repo.count().await.unwrap(), 1);
}

#[tokio::test]
async fn test_custom_comparator_suppresses_update() {
    let source = StaticSource::new(&["A"]);
    let mut renamed = quote("A", 1);
    renamed.name = "Renamed".to_string();
    let enricher = ScriptedEnricher::new();
    enricher.set("A", Ok(renamed));
    let repo = MemoryRepository::with_records(vec![quote("A", 1)]);

    let price_only = |old: &Quote, new: &Quote| old.price != new.price;
    let result = engine(&source, &enricher, &repo, options(50))
        .with_comparator(price_only)
        .run()
        .await
        .unwrap();

    assert_eq!(result.unchanged, keys(&["A"]));
}

#[tokio::test]
async fn test_changed_source_between_runs() {
    let source = StaticSource::new(&["A", "B"]);
    let enricher = ScriptedEnricher::new().ok("A", 1).ok("B", 2).ok("C", 3);
    let repo = MemoryRepository::new();
    let engine = engine(&source, &enricher, &repo, options(50));

    engine.run().await.unwrap();
    source.set(&["B", "C"]);
    let result = engine.run().await.unwrap();

    assert_eq!(result.added_keys(), keys(&["C"]));
    assert_eq!(result.to_delete, keys(&["A"]));
    assert_eq!(result.unchanged, keys(&["B"]));
}
