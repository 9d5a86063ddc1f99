//! 메모리 저장소.
//!
//! 드라이런(실제 테이블 스냅샷을 복사해 두고 엔진을 돌림)과 테스트에서 사용합니다.

use std::collections::BTreeMap;

use async_trait::async_trait;
use thiserror::Error;
use ticker_core::SyncRecord;
use tokio::sync::Mutex;

use crate::error::PersistOperation;
use crate::repository::Repository;

/// 메모리 저장소 에러.
#[derive(Debug, Error)]
pub enum MemoryRepositoryError {
    /// 이미 존재하는 키 추가 (기본 키 위반)
    #[error("중복 키: {0}")]
    DuplicateKey(String),

    /// 주입된 장애
    #[error("{0} 장애 주입")]
    Injected(PersistOperation),
}

#[derive(Debug)]
struct State<R: SyncRecord> {
    rows: BTreeMap<R::Key, R>,
    fail_on: Option<PersistOperation>,
    calls: Vec<PersistOperation>,
}

/// 키 순서로 레코드를 보관하는 저장소.
#[derive(Debug)]
pub struct MemoryRepository<R: SyncRecord> {
    state: Mutex<State<R>>,
}

impl<R: SyncRecord> Default for MemoryRepository<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: SyncRecord> MemoryRepository<R> {
    pub fn new() -> Self {
        Self::with_records(Vec::new())
    }

    /// 초기 레코드로 생성합니다 (같은 키는 나중 값이 남음).
    pub fn with_records(records: Vec<R>) -> Self {
        let rows = records.into_iter().map(|r| (r.key(), r)).collect();
        Self {
            state: Mutex::new(State {
                rows,
                fail_on: None,
                calls: Vec::new(),
            }),
        }
    }

    /// 지정한 작업이 호출되면 실패하게 합니다.
    pub async fn fail_on(&self, operation: Option<PersistOperation>) {
        self.state.lock().await.fail_on = operation;
    }

    /// 키 순서의 현재 레코드.
    pub async fn snapshot(&self) -> Vec<R> {
        self.state.lock().await.rows.values().cloned().collect()
    }

    pub async fn get(&self, key: &R::Key) -> Option<R> {
        self.state.lock().await.rows.get(key).cloned()
    }

    /// 지금까지 호출된 쓰기 작업 (호출 순서).
    pub async fn calls(&self) -> Vec<PersistOperation> {
        self.state.lock().await.calls.clone()
    }
}

fn check<R: SyncRecord>(
    state: &mut State<R>,
    operation: PersistOperation,
) -> Result<(), MemoryRepositoryError> {
    if operation != PersistOperation::Load && operation != PersistOperation::Count {
        state.calls.push(operation);
    }
    if state.fail_on == Some(operation) {
        return Err(MemoryRepositoryError::Injected(operation));
    }
    Ok(())
}

#[async_trait]
impl<R: SyncRecord> Repository for MemoryRepository<R> {
    type Record = R;
    type Error = MemoryRepositoryError;

    async fn get_all(&self) -> Result<Vec<R>, Self::Error> {
        let mut state = self.state.lock().await;
        check(&mut state, PersistOperation::Load)?;
        Ok(state.rows.values().cloned().collect())
    }

    async fn bulk_insert(&self, records: &[R]) -> Result<u64, Self::Error> {
        let mut state = self.state.lock().await;
        check(&mut state, PersistOperation::Insert)?;

        // 전부 반영되거나 아무것도 반영되지 않음
        if let Some(dup) = records.iter().find(|r| state.rows.contains_key(&r.key())) {
            return Err(MemoryRepositoryError::DuplicateKey(dup.key().to_string()));
        }
        for record in records {
            state.rows.insert(record.key(), record.clone());
        }
        Ok(records.len() as u64)
    }

    async fn bulk_update(&self, records: &[R]) -> Result<u64, Self::Error> {
        let mut state = self.state.lock().await;
        check(&mut state, PersistOperation::Update)?;

        let mut updated = 0;
        for record in records {
            if let Some(row) = state.rows.get_mut(&record.key()) {
                *row = record.clone();
                updated += 1;
            }
        }
        Ok(updated)
    }

    async fn bulk_delete(&self, keys: &[R::Key]) -> Result<u64, Self::Error> {
        let mut state = self.state.lock().await;
        check(&mut state, PersistOperation::Delete)?;

        Ok(keys.iter().filter(|k| state.rows.remove(*k).is_some()).count() as u64)
    }

    async fn count(&self) -> Result<u64, Self::Error> {
        let mut state = self.state.lock().await;
        check(&mut state, PersistOperation::Count)?;
        Ok(state.rows.len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Row(u32, &'static str);

    impl SyncRecord for Row {
        type Key = u32;

        fn key(&self) -> u32 {
            self.0
        }

        fn differs_from(&self, other: &Self) -> bool {
            self.1 != other.1
        }
    }

    #[tokio::test]
    async fn test_insert_is_all_or_nothing() {
        let repo = MemoryRepository::with_records(vec![Row(2, "b")]);

        let err = repo.bulk_insert(&[Row(1, "a"), Row(2, "x")]).await.unwrap_err();
        assert!(matches!(err, MemoryRepositoryError::DuplicateKey(_)));
        assert_eq!(repo.count().await.unwrap(), 1);

        assert_eq!(repo.bulk_insert(&[Row(1, "a")]).await.unwrap(), 1);
        assert_eq!(repo.snapshot().await, vec![Row(1, "a"), Row(2, "b")]);
    }

    #[tokio::test]
    async fn test_update_and_delete_counts() {
        let repo = MemoryRepository::with_records(vec![Row(1, "a"), Row(2, "b")]);

        assert_eq!(repo.bulk_update(&[Row(1, "z"), Row(9, "?")]).await.unwrap(), 1);
        assert_eq!(repo.get(&1).await, Some(Row(1, "z")));
        assert_eq!(repo.bulk_delete(&[2, 3]).await.unwrap(), 1);
        assert_eq!(repo.count().await.unwrap(), 1);
        assert_eq!(
            repo.calls().await,
            vec![PersistOperation::Update, PersistOperation::Delete]
        );
    }

    #[tokio::test]
    async fn test_injected_failure() {
        let repo = MemoryRepository::<Row>::new();
        repo.fail_on(Some(PersistOperation::Delete)).await;
        assert!(repo.bulk_delete(&[1]).await.is_err());
        assert!(repo.bulk_insert(&[Row(1, "a")]).await.is_ok());
    }
}
