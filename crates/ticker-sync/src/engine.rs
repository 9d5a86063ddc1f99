//! 범용 동기화 엔진.
//!
//! 다섯 테이블의 동기화는 모두 이 엔진 하나로 실행되며, 테이블마다
//! 소스/조회기/저장소/비교기만 바꿔 끼웁니다.

use std::collections::HashSet;
use std::time::{Duration, Instant};

use ticker_core::{ErrorPolicy, JobSettings, SourceRecord, SyncRecord};
use tracing::{info, warn};

use crate::classifier::{DiffClassifier, FieldwiseComparator, RecordComparator};
use crate::enricher::{enrich_batch, RecordEnricher, RetryPolicy};
use crate::error::{PersistOperation, SyncError, SyncResult};
use crate::index::PersistedIndex;
use crate::obsolete::ObsoleteResolver;
use crate::persister::BatchPersister;
use crate::repository::Repository;
use crate::result::SynchronizationResult;
use crate::source::{SourceProvider, SourceSet};

/// 배치 간 지연.
///
/// 마지막 배치를 제외한 각 배치 뒤에 `min(max, base + per_key × 배치 크기)`만큼 쉽니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchDelay {
    pub base: Duration,
    pub per_key: Duration,
    pub max: Duration,
}

impl Default for BatchDelay {
    fn default() -> Self {
        Self {
            base: Duration::from_millis(1000),
            per_key: Duration::from_millis(20),
            max: Duration::from_millis(2000),
        }
    }
}

impl BatchDelay {
    /// 지연 없음.
    pub fn none() -> Self {
        Self {
            base: Duration::ZERO,
            per_key: Duration::ZERO,
            max: Duration::ZERO,
        }
    }

    /// 배치 크기에 따른 지연 시간.
    pub fn for_batch(&self, batch_len: usize) -> Duration {
        let keys = u32::try_from(batch_len).unwrap_or(u32::MAX);
        self.base
            .saturating_add(self.per_key.saturating_mul(keys))
            .min(self.max)
    }
}

/// 엔진 실행 옵션.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineOptions {
    pub batch_size: usize,
    pub delay: BatchDelay,
    pub retry: RetryPolicy,
    pub error_policy: ErrorPolicy,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            batch_size: 50,
            delay: BatchDelay::default(),
            retry: RetryPolicy::default(),
            error_policy: ErrorPolicy::Remove,
        }
    }
}

impl From<&JobSettings> for EngineOptions {
    fn from(settings: &JobSettings) -> Self {
        Self {
            batch_size: settings.batch_size.max(1),
            delay: BatchDelay {
                base: Duration::from_millis(settings.delay_base_ms),
                per_key: Duration::from_millis(settings.delay_per_key_ms),
                max: Duration::from_millis(settings.delay_max_ms),
            },
            retry: RetryPolicy::new(
                settings.retry_attempts,
                Duration::from_millis(settings.retry_backoff_ms),
            ),
            error_policy: settings.error_policy,
        }
    }
}

/// 소스 → 조회 → 분류 → 저장 → 삭제를 실행하는 엔진.
pub struct SyncEngine<S, E, R, C = FieldwiseComparator> {
    name: String,
    source: S,
    enricher: E,
    repository: R,
    classifier: DiffClassifier<C>,
    options: EngineOptions,
}

impl<S, E, R> SyncEngine<S, E, R> {
    /// 모든 필드를 비교하는 기본 비교기로 엔진을 생성합니다.
    pub fn new(
        name: impl Into<String>,
        source: S,
        enricher: E,
        repository: R,
        options: EngineOptions,
    ) -> Self {
        Self {
            name: name.into(),
            source,
            enricher,
            repository,
            classifier: DiffClassifier::new(FieldwiseComparator),
            options,
        }
    }
}

impl<S, E, R, C> SyncEngine<S, E, R, C> {
    /// 비교기를 교체합니다.
    pub fn with_comparator<C2>(self, comparator: C2) -> SyncEngine<S, E, R, C2> {
        SyncEngine {
            name: self.name,
            source: self.source,
            enricher: self.enricher,
            repository: self.repository,
            classifier: DiffClassifier::new(comparator),
            options: self.options,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    pub fn repository(&self) -> &R {
        &self.repository
    }
}

impl<S, E, R, C> SyncEngine<S, E, R, C>
where
    S: SourceProvider,
    E: RecordEnricher<Key = S::Key>,
    E::Record: SourceRecord<S::Attribute, Store = R::Record>,
    R: Repository,
    R::Record: SyncRecord<Key = S::Key>,
    C: RecordComparator<R::Record>,
{
    /// 한 번의 동기화를 실행합니다.
    ///
    /// 소스 조회 실패, 저장소 작업 실패는 실행을 중단시키고 에러를 반환합니다.
    pub async fn run(&self) -> SyncResult<SynchronizationResult<R::Record>> {
        let started = Instant::now();
        info!(job = %self.name, source = self.source.name(), "동기화 시작");

        let source = self
            .source
            .fetch_keys()
            .await
            .map_err(SyncError::source_failed)?;
        if source.is_empty() {
            // 빈 목록으로 진행하면 테이블 전체가 삭제됨
            return Err(SyncError::Source(
                format!("{}: 소스가 비어 있습니다", self.source.name()).into(),
            ));
        }
        info!(job = %self.name, count = source.len(), "소스 키 조회 완료");

        let records = self
            .repository
            .get_all()
            .await
            .map_err(|e| SyncError::persistence(PersistOperation::Load, 0, e))?;
        let mut index = PersistedIndex::from_records(records)?;
        info!(job = %self.name, count = index.len(), "저장소 스냅샷 로드 완료");

        let mut result = self.reconcile(&source, &mut index).await?;
        result.elapsed = started.elapsed();
        Ok(result)
    }

    /// 이미 가져온 소스와 스냅샷으로 동기화합니다.
    ///
    /// 배치 N의 쓰기는 배치 N+1이 분류되기 전에 `index`에 반영됩니다.
    pub async fn reconcile(
        &self,
        source: &SourceSet<S::Key, S::Attribute>,
        index: &mut PersistedIndex<R::Record>,
    ) -> SyncResult<SynchronizationResult<R::Record>> {
        let started = Instant::now();
        let batch_size = self.options.batch_size.max(1);
        let total_batches = source.batch_count(batch_size);
        let persister = BatchPersister::new(&self.repository);

        let mut result = SynchronizationResult::new();
        let mut processed: HashSet<S::Key> = HashSet::with_capacity(source.len());
        let mut erroring = Vec::new();

        for (i, keys) in source.chunks(batch_size).enumerate() {
            let batch = i + 1;
            info!(
                job = %self.name,
                batch,
                total_batches,
                keys = keys.len(),
                "배치 처리 시작"
            );

            let enriched = enrich_batch(&self.enricher, keys, &self.options.retry).await;
            if enriched.used_fallback {
                result.fallback_batches += 1;
            }

            let diff = self.classifier.classify(enriched.results, source, index);
            let outcome = persister
                .persist(batch, &diff.to_add, &diff.to_update, index)
                .await?;

            info!(
                job = %self.name,
                batch,
                total_batches,
                inserted = outcome.inserted,
                updated = outcome.updated,
                unchanged = diff.unchanged.len(),
                failed = diff.failed.len(),
                "배치 처리 완료"
            );

            processed.extend(diff.to_add.iter().map(|r| r.key()));
            processed.extend(diff.to_update.iter().map(|r| r.key()));
            processed.extend(diff.unchanged.iter().cloned());
            erroring.extend(diff.existing_erroring);

            result.to_add.extend(diff.to_add);
            result.to_update.extend(diff.to_update);
            result.unchanged.extend(diff.unchanged);
            result.failed_lookup.extend(diff.failed);
            result.batches_processed += 1;

            if batch < total_batches {
                let delay = self.options.delay.for_batch(keys.len());
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
            }
        }

        let resolver = ObsoleteResolver::new(self.options.error_policy, batch_size);
        let plan = resolver.plan(index, &processed, &erroring);
        if !plan.retained.is_empty() {
            warn!(
                job = %self.name,
                count = plan.retained.len(),
                "조회 실패 키를 삭제하지 않고 유지"
            );
        }
        result.deleted_count = resolver.execute(&self.repository, index, &plan).await?;

        result.to_delete = plan.to_delete;
        result.to_remove_due_to_errors = plan.remove_due_to_errors;
        result.retained_due_to_errors = plan.retained;
        result.elapsed = started.elapsed();

        info!(
            job = %self.name,
            added = result.to_add.len(),
            updated = result.to_update.len(),
            deleted = result.deleted_count,
            "동기화 종료"
        );

        Ok(result)
    }
}
