//! 배치 단위 즉시 저장.

use ticker_core::SyncRecord;
use tracing::debug;

use crate::error::{PersistOperation, SyncError, SyncResult};
use crate::index::PersistedIndex;
use crate::repository::Repository;

/// 한 배치의 저장 결과.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PersistOutcome {
    pub inserted: u64,
    pub updated: u64,
}

/// 배치의 추가/변경 목록을 저장소에 반영하고 인덱스를 갱신합니다.
pub struct BatchPersister<'a, R: Repository> {
    repository: &'a R,
}

impl<'a, R: Repository> BatchPersister<'a, R> {
    pub fn new(repository: &'a R) -> Self {
        Self { repository }
    }

    /// 추가/변경을 저장합니다.
    ///
    /// 대량 호출은 각각 전부 반영되거나 에러이며, 에러는 실행을 중단시킵니다.
    /// 성공한 레코드만 인덱스에 병합되어 이후 배치에서 기존 레코드로 보입니다.
    pub async fn persist(
        &self,
        batch: usize,
        to_add: &[R::Record],
        to_update: &[R::Record],
        index: &mut PersistedIndex<R::Record>,
    ) -> SyncResult<PersistOutcome> {
        let mut outcome = PersistOutcome::default();

        if !to_add.is_empty() {
            outcome.inserted = self
                .repository
                .bulk_insert(to_add)
                .await
                .map_err(|e| SyncError::persistence(PersistOperation::Insert, batch, e))?;
            merge(index, to_add);
            debug!(batch, count = outcome.inserted, "신규 레코드 저장");
        }

        if !to_update.is_empty() {
            outcome.updated = self
                .repository
                .bulk_update(to_update)
                .await
                .map_err(|e| SyncError::persistence(PersistOperation::Update, batch, e))?;
            merge(index, to_update);
            debug!(batch, count = outcome.updated, "변경 레코드 저장");
        }

        Ok(outcome)
    }
}

fn merge<R: SyncRecord>(index: &mut PersistedIndex<R>, records: &[R]) {
    for record in records {
        index.upsert(record.clone());
    }
}
