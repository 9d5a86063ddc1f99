//! 동기화 실행 결과.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::Serialize;
use ticker_core::SyncRecord;

use crate::enricher::FailureReason;

/// 조회에 실패한 키와 사유.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FailedLookup<K> {
    pub key: K,
    pub reason: FailureReason,
}

/// 한 번의 동기화 실행 보고서.
///
/// 소스 키는 `to_add`, `to_update`, `unchanged`, `failed_lookup` 중 정확히 하나에,
/// 시작 시점의 저장소 키는 `to_update`, `unchanged`, `to_delete`,
/// `to_remove_due_to_errors` 중 정확히 하나에 들어갑니다.
/// (`ErrorPolicy::Retain`이면 마지막 목록 대신 `retained_due_to_errors`에 들어갑니다.)
#[derive(Debug, Clone)]
pub struct SynchronizationResult<R: SyncRecord> {
    pub to_add: Vec<R>,
    pub to_update: Vec<R>,
    pub unchanged: Vec<R::Key>,
    pub failed_lookup: Vec<FailedLookup<R::Key>>,
    /// 소스에서 사라진 키
    pub to_delete: Vec<R::Key>,
    /// 조회에 실패하여 삭제된 기존 키
    pub to_remove_due_to_errors: Vec<R::Key>,
    /// 조회에 실패했지만 유지된 기존 키
    pub retained_due_to_errors: Vec<R::Key>,
    /// 실제 삭제된 행 수
    pub deleted_count: u64,
    /// 처리된 배치 수
    pub batches_processed: usize,
    /// 개별 조회 폴백을 사용한 배치 수
    pub fallback_batches: usize,
    /// 소요 시간
    pub elapsed: Duration,
}

impl<R: SyncRecord> Default for SynchronizationResult<R> {
    fn default() -> Self {
        Self {
            to_add: Vec::new(),
            to_update: Vec::new(),
            unchanged: Vec::new(),
            failed_lookup: Vec::new(),
            to_delete: Vec::new(),
            to_remove_due_to_errors: Vec::new(),
            retained_due_to_errors: Vec::new(),
            deleted_count: 0,
            batches_processed: 0,
            fallback_batches: 0,
            elapsed: Duration::ZERO,
        }
    }
}

/// 결과 요약 통계.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SyncStats {
    pub added: usize,
    pub updated: usize,
    pub unchanged: usize,
    pub failed: usize,
    pub deleted: usize,
    pub removed_due_to_errors: usize,
    pub retained_due_to_errors: usize,
    pub batches: usize,
    pub fallback_batches: usize,
    /// 실패 사유별 건수
    pub failures_by_kind: BTreeMap<&'static str, usize>,
    #[serde(skip)]
    pub elapsed: Duration,
}

impl<R: SyncRecord> SynchronizationResult<R> {
    pub fn new() -> Self {
        Self::default()
    }

    /// 요약 통계.
    pub fn stats(&self) -> SyncStats {
        let mut failures_by_kind = BTreeMap::new();
        for failed in &self.failed_lookup {
            *failures_by_kind.entry(failed.reason.kind()).or_insert(0) += 1;
        }

        SyncStats {
            added: self.to_add.len(),
            updated: self.to_update.len(),
            unchanged: self.unchanged.len(),
            failed: self.failed_lookup.len(),
            deleted: self.to_delete.len(),
            removed_due_to_errors: self.to_remove_due_to_errors.len(),
            retained_due_to_errors: self.retained_due_to_errors.len(),
            batches: self.batches_processed,
            fallback_batches: self.fallback_batches,
            failures_by_kind,
            elapsed: self.elapsed,
        }
    }

    /// 추가 + 변경 + 삭제된 행 수.
    pub fn total_operations(&self) -> u64 {
        (self.to_add.len() + self.to_update.len()) as u64 + self.deleted_count
    }

    /// 저장소에 쓰기가 없었는지.
    pub fn is_noop(&self) -> bool {
        self.total_operations() == 0
    }

    /// 소스에서 처리된 키 수.
    pub fn processed(&self) -> usize {
        self.to_add.len() + self.to_update.len() + self.unchanged.len() + self.failed_lookup.len()
    }

    /// 실패한 키 앞쪽 `n`개.
    pub fn failed_sample(&self, n: usize) -> &[FailedLookup<R::Key>] {
        &self.failed_lookup[..n.min(self.failed_lookup.len())]
    }

    pub fn added_keys(&self) -> Vec<R::Key> {
        self.to_add.iter().map(|r| r.key()).collect()
    }

    pub fn updated_keys(&self) -> Vec<R::Key> {
        self.to_update.iter().map(|r| r.key()).collect()
    }

    pub fn failed_keys(&self) -> Vec<R::Key> {
        self.failed_lookup.iter().map(|f| f.key.clone()).collect()
    }

    /// 요약 로그 출력
    pub fn log_summary(&self, job: &str) {
        tracing::info!(
            job = job,
            added = self.to_add.len(),
            updated = self.to_update.len(),
            unchanged = self.unchanged.len(),
            failed = self.failed_lookup.len(),
            deleted = self.to_delete.len(),
            removed_due_to_errors = self.to_remove_due_to_errors.len(),
            retained_due_to_errors = self.retained_due_to_errors.len(),
            batches = self.batches_processed,
            elapsed = format!("{:.1}s", self.elapsed.as_secs_f64()),
            "동기화 완료"
        );

        for failed in self.failed_sample(10) {
            tracing::info!(job = job, key = %failed.key, reason = %failed.reason, "조회 실패 키");
        }
        if !self.to_remove_due_to_errors.is_empty() {
            let sample: Vec<String> = self
                .to_remove_due_to_errors
                .iter()
                .take(10)
                .map(|k| k.to_string())
                .collect();
            tracing::warn!(
                job = job,
                count = self.to_remove_due_to_errors.len(),
                sample = ?sample,
                "조회 실패로 삭제된 키"
            );
        }
    }
}
