//! 외부 데이터 소스.
//!
//! - [`github`]: 미국 상장 티커 목록 (GitHub raw JSON)
//! - [`sec`]: SEC `company_tickers.json` 디렉토리 (티커 ↔ CIK ↔ 회사명)
//! - [`yahoo`]: Yahoo Finance quoteSummary API

mod http;

pub mod github;
pub mod sec;
pub mod yahoo;

pub use github::{is_common_stock, normalize_symbol, ExchangeTickerSource, GithubTickerSource};
pub use sec::{CompanyEntry, SecCikSource, SecCompanyDirectory};
pub use yahoo::{QuoteSummary, YahooClient, YahooError};
