//! 소스에서 사라진 키와 조회 실패 키의 삭제.

use std::collections::HashSet;

use ticker_core::{ErrorPolicy, RecordKey, SyncRecord};
use tracing::{debug, info};

use crate::error::{PersistOperation, SyncError, SyncResult};
use crate::index::PersistedIndex;
use crate::repository::Repository;

/// 삭제 계획.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObsoletePlan<K> {
    /// 시작 시점에 있었지만 처리되지 않은 키
    pub to_delete: Vec<K>,
    /// 조회 실패로 삭제할 기존 키
    pub remove_due_to_errors: Vec<K>,
    /// 조회 실패했지만 유지할 기존 키
    pub retained: Vec<K>,
}

impl<K: RecordKey> ObsoletePlan<K> {
    /// 실제로 삭제할 키 (중복 없음).
    pub fn deletion_keys(&self) -> Vec<K> {
        let mut seen = HashSet::new();
        self.to_delete
            .iter()
            .chain(self.remove_due_to_errors.iter())
            .filter(|k| seen.insert((*k).clone()))
            .cloned()
            .collect()
    }
}

/// 모든 배치가 끝난 뒤 삭제 대상을 계산하고 삭제합니다.
#[derive(Debug, Clone, Copy)]
pub struct ObsoleteResolver {
    policy: ErrorPolicy,
    batch_size: usize,
}

impl ObsoleteResolver {
    pub fn new(policy: ErrorPolicy, batch_size: usize) -> Self {
        Self {
            policy,
            batch_size: batch_size.max(1),
        }
    }

    /// 삭제 계획을 세웁니다.
    ///
    /// `to_delete`는 시작 시점 키에서 처리된 키(추가/변경/동일)와 조회 실패 키를 뺀
    /// 집합이므로 `remove_due_to_errors`와 겹치지 않습니다.
    pub fn plan<R: SyncRecord>(
        &self,
        index: &PersistedIndex<R>,
        processed: &HashSet<R::Key>,
        erroring: &[R::Key],
    ) -> ObsoletePlan<R::Key> {
        let mut seen = HashSet::new();
        let erroring: Vec<R::Key> = erroring
            .iter()
            .filter(|k| index.was_initially_present(k))
            .filter(|k| seen.insert((*k).clone()))
            .cloned()
            .collect();

        let to_delete = index
            .initial_keys()
            .iter()
            .filter(|k| !processed.contains(*k) && !seen.contains(*k))
            .cloned()
            .collect();

        let (remove_due_to_errors, retained) = match self.policy {
            ErrorPolicy::Remove => (erroring, Vec::new()),
            ErrorPolicy::Retain => (Vec::new(), erroring),
        };

        ObsoletePlan {
            to_delete,
            remove_due_to_errors,
            retained,
        }
    }

    /// 계획된 키를 배치 크기 단위로 삭제하고 삭제된 행 수를 반환합니다.
    ///
    /// 삭제 배치 하나라도 실패하면 즉시 에러를 반환합니다.
    pub async fn execute<R: Repository>(
        &self,
        repository: &R,
        index: &mut PersistedIndex<R::Record>,
        plan: &ObsoletePlan<<R::Record as SyncRecord>::Key>,
    ) -> SyncResult<u64> {
        let keys = plan.deletion_keys();
        if keys.is_empty() {
            return Ok(0);
        }

        let total_batches = keys.len().div_ceil(self.batch_size);
        info!(
            count = keys.len(),
            obsolete = plan.to_delete.len(),
            erroring = plan.remove_due_to_errors.len(),
            total_batches,
            "삭제 시작"
        );

        let mut deleted = 0;
        for (i, chunk) in keys.chunks(self.batch_size).enumerate() {
            let count = repository
                .bulk_delete(chunk)
                .await
                .map_err(|e| SyncError::persistence(PersistOperation::Delete, i + 1, e))?;
            for key in chunk {
                index.remove(key);
            }
            deleted += count;
            debug!(batch = i + 1, total_batches, count, "삭제 배치 완료");
        }

        Ok(deleted)
    }
}
