//! 배치 조회 결과를 저장소 스냅샷과 비교하여 분류합니다.

use ticker_core::{SourceRecord, SyncRecord};
use tracing::debug;

use crate::enricher::{FailureReason, Lookup};
use crate::index::PersistedIndex;
use crate::result::FailedLookup;
use crate::source::SourceSet;

/// 저장된 레코드와 후보 레코드의 비교 전략.
pub trait RecordComparator<R>: Send + Sync {
    /// 하나라도 다른 필드가 있으면 true.
    fn differs(&self, persisted: &R, candidate: &R) -> bool;
}

/// [`SyncRecord::differs_from`]으로 모든 필드를 정확히 비교합니다.
#[derive(Debug, Clone, Copy, Default)]
pub struct FieldwiseComparator;

impl<R: SyncRecord> RecordComparator<R> for FieldwiseComparator {
    fn differs(&self, persisted: &R, candidate: &R) -> bool {
        candidate.differs_from(persisted)
    }
}

impl<R, F> RecordComparator<R> for F
where
    F: Fn(&R, &R) -> bool + Send + Sync,
{
    fn differs(&self, persisted: &R, candidate: &R) -> bool {
        self(persisted, candidate)
    }
}

/// 한 배치의 분류 결과.
#[derive(Debug)]
pub struct BatchDiff<R: SyncRecord> {
    pub to_add: Vec<R>,
    pub to_update: Vec<R>,
    pub unchanged: Vec<R::Key>,
    pub failed: Vec<FailedLookup<R::Key>>,
    /// 조회에 실패했지만 저장소에 이미 있는 키
    pub existing_erroring: Vec<R::Key>,
}

impl<R: SyncRecord> Default for BatchDiff<R> {
    fn default() -> Self {
        Self {
            to_add: Vec::new(),
            to_update: Vec::new(),
            unchanged: Vec::new(),
            failed: Vec::new(),
            existing_erroring: Vec::new(),
        }
    }
}

impl<R: SyncRecord> BatchDiff<R> {
    /// 분류된 키 수.
    pub fn len(&self) -> usize {
        self.to_add.len() + self.to_update.len() + self.unchanged.len() + self.failed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn has_writes(&self) -> bool {
        !self.to_add.is_empty() || !self.to_update.is_empty()
    }
}

/// 추가/변경/동일/실패 분류기.
#[derive(Debug, Clone, Default)]
pub struct DiffClassifier<C = FieldwiseComparator> {
    comparator: C,
}

impl<C> DiffClassifier<C> {
    pub fn new(comparator: C) -> Self {
        Self { comparator }
    }

    /// 배치 조회 결과를 분류합니다.
    ///
    /// 각 키는 정확히 하나의 목록에 들어갑니다. 조회 결과의 변환이 실패하면
    /// [`FailureReason::Invalid`]로 처리됩니다. 필드 비교 순서는 결과에 영향이 없습니다.
    pub fn classify<R, S, A>(
        &self,
        results: Vec<(R::Key, Lookup<S>)>,
        source: &SourceSet<R::Key, A>,
        index: &PersistedIndex<R>,
    ) -> BatchDiff<R>
    where
        R: SyncRecord,
        S: SourceRecord<A, Store = R>,
        C: RecordComparator<R>,
    {
        let mut diff = BatchDiff::default();

        for (key, lookup) in results {
            let candidate = lookup.and_then(|record| {
                let store = record
                    .into_store_record(source.attribute(&key))
                    .map_err(|e| FailureReason::Invalid(e.to_string()))?;
                if store.key() != key {
                    return Err(FailureReason::Invalid(format!(
                        "키 불일치: 요청 {}, 응답 {}",
                        key,
                        store.key()
                    )));
                }
                Ok(store)
            });

            match candidate {
                Err(reason) => {
                    debug!(key = %key, reason = %reason, "조회 실패");
                    if index.contains(&key) {
                        diff.existing_erroring.push(key.clone());
                    }
                    diff.failed.push(FailedLookup { key, reason });
                }
                Ok(record) => match index.get(&key) {
                    None => diff.to_add.push(record),
                    Some(persisted) if self.comparator.differs(persisted, &record) => {
                        diff.to_update.push(record)
                    }
                    Some(_) => diff.unchanged.push(key),
                },
            }
        }

        diff
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ticker_core::TickerResult;

    #[derive(Debug, Clone, PartialEq)]
    struct Row {
        key: String,
        price: i64,
        note: String,
    }

    impl SyncRecord for Row {
        type Key = String;

        fn key(&self) -> String {
            self.key.clone()
        }

        fn differs_from(&self, other: &Self) -> bool {
            self.price != other.price || self.note != other.note
        }
    }

    impl SourceRecord for Row {
        type Store = Row;

        fn into_store_record(self, _attribute: Option<&()>) -> TickerResult<Row> {
            if self.price < 0 {
                return Err(ticker_core::TickerError::validation(
                    "price",
                    self.price,
                    "negative",
                ));
            }
            Ok(self)
        }
    }

    fn row(key: &str, price: i64) -> Row {
        Row {
            key: key.to_string(),
            price,
            note: String::new(),
        }
    }

    fn index(rows: Vec<Row>) -> PersistedIndex<Row> {
        PersistedIndex::from_records(rows).unwrap()
    }

    fn source(keys: &[&str]) -> SourceSet<String> {
        SourceSet::from_keys(keys.iter().map(|k| k.to_string()))
    }

    #[test]
    fn test_classifies_each_key_once() {
        let idx = index(vec![row("B", 1), row("C", 5), row("D", 9)]);
        let src = source(&["A", "B", "C", "E"]);
        let results = vec![
            ("A".to_string(), Ok(row("A", 1))),
            ("B".to_string(), Err(FailureReason::UnknownKey)),
            ("C".to_string(), Ok(row("C", 6))),
            ("E".to_string(), Ok(row("E", -1))),
        ];

        let diff = DiffClassifier::<FieldwiseComparator>::default().classify(results, &src, &idx);

        assert_eq!(diff.to_add, vec![row("A", 1)]);
        assert_eq!(diff.to_update, vec![row("C", 6)]);
        assert!(diff.unchanged.is_empty());
        assert_eq!(diff.failed.len(), 2);
        assert!(matches!(diff.failed[1].reason, FailureReason::Invalid(_)));
        assert_eq!(diff.existing_erroring, vec!["B".to_string()]);
        assert_eq!(diff.len(), 4);
    }

    #[test]
    fn test_identical_record_is_unchanged() {
        let idx = index(vec![row("A", 1)]);
        let diff = DiffClassifier::<FieldwiseComparator>::default().classify(
            vec![("A".to_string(), Ok(row("A", 1)))],
            &source(&["A"]),
            &idx,
        );
        assert_eq!(diff.unchanged, vec!["A".to_string()]);
        assert!(!diff.has_writes());
    }

    #[test]
    fn test_custom_comparator_ignores_note() {
        let idx = index(vec![row("A", 1)]);
        let mut changed = row("A", 1);
        changed.note = "memo".to_string();

        let price_only = |a: &Row, b: &Row| a.price != b.price;
        let diff = DiffClassifier::new(price_only).classify(
            vec![("A".to_string(), Ok(changed))],
            &source(&["A"]),
            &idx,
        );
        assert_eq!(diff.unchanged.len(), 1);
    }

    #[test]
    fn test_key_mismatch_is_invalid() {
        let idx = index(vec![]);
        let diff = DiffClassifier::<FieldwiseComparator>::default().classify(
            vec![("A".to_string(), Ok(row("Z", 1)))],
            &source(&["A"]),
            &idx,
        );
        assert!(diff.to_add.is_empty());
        assert_eq!(diff.failed[0].key, "A");
    }
}
