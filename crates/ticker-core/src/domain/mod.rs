//! 동기화 대상 테이블의 도메인 모델.
//!
//! 이 모듈은 다섯 개 테이블의 엔티티와 동기화 계약을 정의합니다:
//! - `SyncRecord` / `SourceRecord` - 엔진이 다루는 레코드 계약
//! - `CikLookup` - CIK → 회사명
//! - `TickerDirectory` - 티커 ↔ CIK 매핑
//! - `TickerSummary` - 시가총액, 가격, 배당 요약
//! - `TickerOverview` - 밸류에이션 및 수익성 지표
//! - `Stock` - 종목 목록

mod cik_lookup;
mod record;
mod stock;
mod ticker_directory;
mod ticker_overview;
mod ticker_summary;

pub use cik_lookup::*;
pub use record::*;
pub use stock::*;
pub use ticker_directory::*;
pub use ticker_overview::*;
pub use ticker_summary::*;
