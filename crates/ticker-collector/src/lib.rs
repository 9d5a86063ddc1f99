//! 티커 메타데이터 테이블 동기화 CLI.
//!
//! 이 crate는 다섯 개 테이블의 동기화 작업을 조립해 실행합니다:
//! - `cik_lookup`: CIK → 회사명 (SEC)
//! - `ticker_directory`: 티커 → CIK (SEC)
//! - `ticker_summary`: 시가총액, 가격, 배당 (SEC + Yahoo Finance)
//! - `ticker_overview`: 밸류에이션, 수익성 (Yahoo Finance)
//! - `stocks`: 거래소별 종목 목록 (Yahoo Finance)

pub mod context;
pub mod error;
pub mod jobs;
pub mod report;
pub mod status;

pub use context::JobContext;
pub use error::{CollectorError, Result};
pub use jobs::{execute, run_all, run_job, JobKind};
pub use report::JobReport;
pub use status::StatusReport;
