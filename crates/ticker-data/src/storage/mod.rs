//! PostgreSQL 저장소.
//!
//! 테이블마다 하나의 repository가 [`ticker_sync::Repository`]를 구현합니다.
//! 대량 추가/갱신은 컬럼별 배열을 `UNNEST`로 풀어 하나의 트랜잭션 안에서 실행하고,
//! 삭제는 `= ANY($1)`로 처리합니다. 타임스탬프는 DB의 `NOW()`로 기록합니다.

pub mod cik_lookup;
pub mod database;
pub mod stocks;
pub mod ticker_directory;
pub mod ticker_overview;
pub mod ticker_summary;

pub use cik_lookup::CikLookupRepository;
pub use database::{Database, DatabaseConfig};
pub use stocks::StocksRepository;
pub use ticker_directory::TickerDirectoryRepository;
pub use ticker_overview::TickerOverviewRepository;
pub use ticker_summary::TickerSummaryRepository;

/// 한 SQL 문에 담는 최대 행 수.
pub(crate) const UNNEST_CHUNK_SIZE: usize = 1000;
