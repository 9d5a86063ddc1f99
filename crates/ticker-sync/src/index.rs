//! 저장소 스냅샷.

use std::collections::{HashMap, HashSet};

use ticker_core::SyncRecord;

use crate::error::{SyncError, SyncResult};

/// 실행 시작 시 한 번 읽은 저장소 내용.
///
/// 배치가 저장될 때마다 갱신되므로 이후 배치는 저장소를 다시 읽지 않고도
/// 앞선 배치의 쓰기를 봅니다. 시작 시점의 키 집합은 별도로 보관되어
/// 삭제 대상 계산에 사용됩니다.
#[derive(Debug, Clone)]
pub struct PersistedIndex<R: SyncRecord> {
    records: HashMap<R::Key, R>,
    initial_keys: Vec<R::Key>,
    initial_set: HashSet<R::Key>,
}

impl<R: SyncRecord> PersistedIndex<R> {
    /// `get_all` 결과로 인덱스를 만듭니다. 키가 중복되면 에러입니다.
    pub fn from_records(records: Vec<R>) -> SyncResult<Self> {
        let mut map = HashMap::with_capacity(records.len());
        let mut initial_keys = Vec::with_capacity(records.len());

        for record in records {
            let key = record.key();
            if map.contains_key(&key) {
                return Err(SyncError::Index(format!("중복 키: {}", key)));
            }
            initial_keys.push(key.clone());
            map.insert(key, record);
        }

        initial_keys.sort();
        let initial_set = initial_keys.iter().cloned().collect();

        Ok(Self {
            records: map,
            initial_keys,
            initial_set,
        })
    }

    /// 빈 인덱스.
    pub fn empty() -> Self {
        Self {
            records: HashMap::new(),
            initial_keys: Vec::new(),
            initial_set: HashSet::new(),
        }
    }

    pub fn get(&self, key: &R::Key) -> Option<&R> {
        self.records.get(key)
    }

    /// 현재(실행 중 쓰기 포함) 존재 여부.
    pub fn contains(&self, key: &R::Key) -> bool {
        self.records.contains_key(key)
    }

    /// 실행 시작 시점에 존재했는지 여부.
    pub fn was_initially_present(&self, key: &R::Key) -> bool {
        self.initial_set.contains(key)
    }

    /// 시작 시점의 키 (정렬됨).
    pub fn initial_keys(&self) -> &[R::Key] {
        &self.initial_keys
    }

    /// 저장된 레코드를 반영합니다.
    pub fn upsert(&mut self, record: R) {
        self.records.insert(record.key(), record);
    }

    /// 삭제된 키를 제거합니다.
    pub fn remove(&mut self, key: &R::Key) -> Option<R> {
        self.records.remove(key)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> impl Iterator<Item = &R> {
        self.records.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Row {
        key: u32,
        value: i32,
    }

    impl SyncRecord for Row {
        type Key = u32;

        fn key(&self) -> u32 {
            self.key
        }

        fn differs_from(&self, other: &Self) -> bool {
            self.value != other.value
        }
    }

    #[test]
    fn test_duplicate_key_is_error() {
        let rows = vec![Row { key: 1, value: 1 }, Row { key: 1, value: 2 }];
        assert!(matches!(
            PersistedIndex::from_records(rows),
            Err(SyncError::Index(_))
        ));
    }

    #[test]
    fn test_initial_keys_survive_upserts() {
        let mut index =
            PersistedIndex::from_records(vec![Row { key: 2, value: 0 }, Row { key: 1, value: 0 }])
                .unwrap();

        index.upsert(Row { key: 3, value: 0 });
        index.upsert(Row { key: 1, value: 9 });

        assert_eq!(index.initial_keys(), &[1, 2]);
        assert!(index.contains(&3));
        assert!(!index.was_initially_present(&3));
        assert_eq!(index.get(&1).map(|r| r.value), Some(9));
        assert_eq!(index.len(), 3);
    }
}
