//! 엔진 통합 테스트용 고정 소스/조회기/레코드.

#![allow(dead_code)]

use std::collections::HashMap;
use std::convert::Infallible;
use std::sync::Mutex;

use async_trait::async_trait;
use ticker_core::{SourceRecord, SyncRecord, TickerError, TickerResult};
use ticker_sync::{
    BatchDelay, EngineOptions, ErrorPolicy, FailureReason, Lookup, MemoryRepository,
    RecordEnricher, RetryPolicy, SourceProvider, SourceSet, SyncEngine,
};

#[derive(Debug, Clone, PartialEq)]
pub struct Quote {
    pub symbol: String,
    pub price: i64,
    pub name: String,
}

impl SyncRecord for Quote {
    type Key = String;

    fn key(&self) -> String {
        self.symbol.clone()
    }

    fn differs_from(&self, other: &Self) -> bool {
        self.price != other.price || self.name != other.name
    }
}

impl SourceRecord for Quote {
    type Store = Quote;

    fn into_store_record(self, _attribute: Option<&()>) -> TickerResult<Quote> {
        if self.price < 0 {
            return Err(TickerError::validation("price", self.price, "Price cannot be negative"));
        }
        Ok(self)
    }
}

pub fn quote(symbol: &str, price: i64) -> Quote {
    Quote {
        symbol: symbol.to_string(),
        price,
        name: format!("{} Inc.", symbol),
    }
}

pub fn keys(symbols: &[&str]) -> Vec<String> {
    symbols.iter().map(|s| s.to_string()).collect()
}

pub fn sorted(mut keys: Vec<String>) -> Vec<String> {
    keys.sort();
    keys
}

/// 고정 키 목록 소스.
pub struct StaticSource {
    keys: Mutex<Vec<String>>,
}

impl StaticSource {
    pub fn new(symbols: &[&str]) -> Self {
        Self {
            keys: Mutex::new(keys(symbols)),
        }
    }

    pub fn set(&self, symbols: &[&str]) {
        *self.keys.lock().unwrap() = keys(symbols);
    }
}

#[async_trait]
impl SourceProvider for StaticSource {
    type Key = String;
    type Attribute = ();
    type Error = Infallible;

    fn name(&self) -> &str {
        "static"
    }

    async fn fetch_keys(&self) -> Result<SourceSet<String>, Infallible> {
        let keys = self.keys.lock().unwrap().clone();
        Ok(SourceSet::from_keys(keys))
    }
}

/// 항상 실패하는 소스.
pub struct BrokenSource;

#[async_trait]
impl SourceProvider for BrokenSource {
    type Key = String;
    type Attribute = ();
    type Error = std::io::Error;

    fn name(&self) -> &str {
        "broken"
    }

    async fn fetch_keys(&self) -> Result<SourceSet<String>, std::io::Error> {
        Err(std::io::Error::other("feed unreachable"))
    }
}

/// 미리 정한 응답을 돌려주는 조회기. 호출된 배치를 기록합니다.
#[derive(Default)]
pub struct ScriptedEnricher {
    responses: Mutex<HashMap<String, Lookup<Quote>>>,
    calls: Mutex<Vec<Vec<String>>>,
    fail_batches: Mutex<bool>,
}

impl ScriptedEnricher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ok(self, symbol: &str, price: i64) -> Self {
        self.set(symbol, Ok(quote(symbol, price)));
        self
    }

    pub fn failing(self, symbol: &str, reason: FailureReason) -> Self {
        self.set(symbol, Err(reason));
        self
    }

    pub fn set(&self, symbol: &str, lookup: Lookup<Quote>) {
        self.responses
            .lock()
            .unwrap()
            .insert(symbol.to_string(), lookup);
    }

    /// 2개 이상 키의 배치 호출을 실패시킵니다.
    pub fn fail_batches(&self, enabled: bool) {
        *self.fail_batches.lock().unwrap() = enabled;
    }

    pub fn calls(&self) -> Vec<Vec<String>> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl RecordEnricher for ScriptedEnricher {
    type Key = String;
    type Record = Quote;
    type Error = std::io::Error;

    async fn lookup_batch(
        &self,
        keys: &[String],
    ) -> Result<HashMap<String, Lookup<Quote>>, std::io::Error> {
        self.calls.lock().unwrap().push(keys.to_vec());

        if keys.len() > 1 && *self.fail_batches.lock().unwrap() {
            return Err(std::io::Error::other("batch endpoint down"));
        }

        let responses = self.responses.lock().unwrap();
        Ok(keys
            .iter()
            .filter_map(|k| responses.get(k).map(|r| (k.clone(), r.clone())))
            .collect())
    }
}

pub type TestEngine<'a> =
    SyncEngine<&'a StaticSource, &'a ScriptedEnricher, &'a MemoryRepository<Quote>>;

pub fn options(batch_size: usize) -> EngineOptions {
    EngineOptions {
        batch_size,
        delay: BatchDelay::none(),
        retry: RetryPolicy::none(),
        error_policy: ErrorPolicy::Remove,
    }
}

pub fn engine<'a>(
    source: &'a StaticSource,
    enricher: &'a ScriptedEnricher,
    repository: &'a MemoryRepository<Quote>,
    options: EngineOptions,
) -> TestEngine<'a> {
    SyncEngine::new("quotes", source, enricher, repository, options)
}
