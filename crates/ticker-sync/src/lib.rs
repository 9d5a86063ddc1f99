//! # Ticker Sync
//!
//! 외부 소스와 저장소를 맞추는 범용 동기화 엔진입니다.
//!
//! 한 번의 실행은 다음 순서로 진행됩니다:
//! 1. [`SourceProvider`]에서 키 집합([`SourceSet`])을 가져옵니다.
//! 2. [`Repository::get_all`]로 [`PersistedIndex`]를 만듭니다.
//! 3. 키를 배치로 나눠 [`RecordEnricher`]로 조회하고, [`DiffClassifier`]로
//!    추가/변경/동일/실패를 분류한 뒤 [`BatchPersister`]가 즉시 저장합니다.
//! 4. 모든 배치가 끝나면 [`ObsoleteResolver`]가 소스에서 사라진 키와
//!    조회에 실패한 기존 키를 삭제합니다.
//! 5. [`SynchronizationResult`]를 반환합니다.
//!
//! 테이블마다 다른 것은 소스, 조회기, 저장소, 비교기뿐이며 엔진은 하나입니다.

pub mod classifier;
pub mod engine;
pub mod enricher;
pub mod error;
pub mod index;
pub mod memory;
pub mod obsolete;
pub mod persister;
pub mod repository;
pub mod result;
pub mod source;

pub use classifier::{BatchDiff, DiffClassifier, FieldwiseComparator, RecordComparator};
pub use engine::{BatchDelay, EngineOptions, SyncEngine};
pub use enricher::{enrich_batch, EnrichedBatch, FailureReason, Lookup, RecordEnricher, RetryPolicy};
pub use error::{BoxError, PersistOperation, SyncError, SyncResult};
pub use index::PersistedIndex;
pub use memory::{MemoryRepository, MemoryRepositoryError};
pub use obsolete::{ObsoletePlan, ObsoleteResolver};
pub use persister::{BatchPersister, PersistOutcome};
pub use repository::Repository;
pub use result::{FailedLookup, SyncStats, SynchronizationResult};
pub use source::{RepositoryKeySource, SourceProvider, SourceSet};
pub use ticker_core::ErrorPolicy;
