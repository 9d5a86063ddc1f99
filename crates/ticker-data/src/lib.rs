//! 동기화 엔진의 외부 협력자.
//!
//! 이 crate는 다음을 제공합니다:
//! - 다섯 개 테이블의 PostgreSQL 저장소 (sqlx)
//! - GitHub 티커 목록, SEC 회사 디렉토리, Yahoo Finance 클라이언트
//! - 테이블별 조회기 (`RecordEnricher` 구현)

pub mod enrich;
pub mod error;
pub mod provider;
pub mod storage;

pub use error::{DataError, Result};

pub use enrich::{
    CompanyNameEnricher, DirectoryEnricher, OverviewEnricher, StockEnricher, SummaryEnricher,
};
pub use provider::{
    is_common_stock, normalize_symbol, CompanyEntry, ExchangeTickerSource, GithubTickerSource,
    QuoteSummary, SecCikSource, SecCompanyDirectory, YahooClient, YahooError,
};
pub use storage::{
    CikLookupRepository, Database, DatabaseConfig, StocksRepository, TickerDirectoryRepository,
    TickerOverviewRepository, TickerSummaryRepository,
};
