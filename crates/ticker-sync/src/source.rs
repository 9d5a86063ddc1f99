//! 소스 키 집합과 소스 협력 인터페이스.

use std::collections::{HashMap, HashSet};
use std::slice::Chunks;

use async_trait::async_trait;
use ticker_core::{RecordKey, SyncRecord};

use crate::repository::Repository;

/// 외부 피드에서 가져온 중복 없는 키 목록.
///
/// 처음 등장한 순서를 유지하며, 같은 키가 다시 들어오면 무시합니다
/// (먼저 들어온 속성이 유지됩니다).
#[derive(Debug, Clone)]
pub struct SourceSet<K, A = ()> {
    keys: Vec<K>,
    seen: HashSet<K>,
    attributes: HashMap<K, A>,
}

impl<K: RecordKey, A> Default for SourceSet<K, A> {
    fn default() -> Self {
        Self {
            keys: Vec::new(),
            seen: HashSet::new(),
            attributes: HashMap::new(),
        }
    }
}

impl<K: RecordKey, A> SourceSet<K, A> {
    pub fn new() -> Self {
        Self::default()
    }

    /// 속성 없는 키 목록에서 생성합니다.
    pub fn from_keys(keys: impl IntoIterator<Item = K>) -> Self {
        let mut set = Self::new();
        for key in keys {
            set.insert(key, None);
        }
        set
    }

    /// (키, 속성) 목록에서 생성합니다.
    pub fn from_entries(entries: impl IntoIterator<Item = (K, A)>) -> Self {
        let mut set = Self::new();
        for (key, attribute) in entries {
            set.insert(key, Some(attribute));
        }
        set
    }

    /// 키를 추가합니다. 새 키였으면 true.
    pub fn insert(&mut self, key: K, attribute: Option<A>) -> bool {
        if !self.seen.insert(key.clone()) {
            return false;
        }
        if let Some(attribute) = attribute {
            self.attributes.insert(key.clone(), attribute);
        }
        self.keys.push(key);
        true
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn contains(&self, key: &K) -> bool {
        self.seen.contains(key)
    }

    /// 삽입 순서의 키 목록.
    pub fn keys(&self) -> &[K] {
        &self.keys
    }

    /// 키의 부가 속성.
    pub fn attribute(&self, key: &K) -> Option<&A> {
        self.attributes.get(key)
    }

    /// `batch_size` 크기의 배치로 나눕니다 (마지막 배치는 더 작을 수 있음).
    pub fn chunks(&self, batch_size: usize) -> Chunks<'_, K> {
        self.keys.chunks(batch_size.max(1))
    }

    /// 배치 수.
    pub fn batch_count(&self, batch_size: usize) -> usize {
        self.keys.len().div_ceil(batch_size.max(1))
    }
}

/// 키 집합을 제공하는 외부 소스.
///
/// 키 정규화와 필터링(길이, 허용 문자 등)은 소스가 직접 수행합니다.
/// 일부만 가져온 목록을 반환해서는 안 되며, 전체 조회 실패는 에러입니다.
#[async_trait]
pub trait SourceProvider: Send + Sync {
    type Key: RecordKey;
    /// 키와 함께 제공되는 부가 속성 (예: 거래소 태그)
    type Attribute: Send + Sync + 'static;
    type Error: std::error::Error + Send + Sync + 'static;

    /// 로그용 소스 이름.
    fn name(&self) -> &str;

    /// 전체 키 집합을 가져옵니다.
    async fn fetch_keys(&self) -> Result<SourceSet<Self::Key, Self::Attribute>, Self::Error>;
}

#[async_trait]
impl<'a, T: SourceProvider + ?Sized> SourceProvider for &'a T {
    type Key = T::Key;
    type Attribute = T::Attribute;
    type Error = T::Error;

    fn name(&self) -> &str {
        (**self).name()
    }

    async fn fetch_keys(&self) -> Result<SourceSet<Self::Key, Self::Attribute>, Self::Error> {
        (**self).fetch_keys().await
    }
}

/// 다른 테이블에 저장된 키를 소스로 사용합니다.
pub struct RepositoryKeySource<R> {
    name: String,
    repository: R,
}

impl<R: Repository> RepositoryKeySource<R> {
    pub fn new(name: impl Into<String>, repository: R) -> Self {
        Self {
            name: name.into(),
            repository,
        }
    }
}

#[async_trait]
impl<R: Repository> SourceProvider for RepositoryKeySource<R> {
    type Key = <R::Record as SyncRecord>::Key;
    type Attribute = ();
    type Error = R::Error;

    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch_keys(&self) -> Result<SourceSet<Self::Key>, Self::Error> {
        let records = self.repository.get_all().await?;
        let mut keys: Vec<_> = records.iter().map(|r| r.key()).collect();
        keys.sort();
        Ok(SourceSet::from_keys(keys))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dedup_keeps_first_occurrence() {
        let set = SourceSet::from_entries(vec![
            ("AAPL".to_string(), "NASDAQ"),
            ("IBM".to_string(), "NYSE"),
            ("AAPL".to_string(), "NYSE"),
        ]);

        assert_eq!(set.len(), 2);
        assert_eq!(set.keys(), &["AAPL".to_string(), "IBM".to_string()]);
        assert_eq!(set.attribute(&"AAPL".to_string()), Some(&"NASDAQ"));
    }

    #[test]
    fn test_chunks_cover_all_keys_in_order() {
        let set: SourceSet<u32> = SourceSet::from_keys(1..=7);
        let batches: Vec<Vec<u32>> = set.chunks(3).map(|c| c.to_vec()).collect();

        assert_eq!(batches, vec![vec![1, 2, 3], vec![4, 5, 6], vec![7]]);
        assert_eq!(set.batch_count(3), 3);
        assert_eq!(set.batch_count(7), 1);
    }

    #[test]
    fn test_zero_batch_size_is_clamped() {
        let set: SourceSet<u32> = SourceSet::from_keys(1..=2);
        assert_eq!(set.chunks(0).count(), 2);
    }
}
