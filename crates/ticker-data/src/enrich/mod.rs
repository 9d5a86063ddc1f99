//! 테이블별 조회기 (`RecordEnricher` 구현).
//!
//! | 조회기 | 키 | 외부 소스 | 결과 |
//! |---|---|---|---|
//! | [`CompanyNameEnricher`] | CIK | SEC | `CompanyName` |
//! | [`DirectoryEnricher`] | 티커 | SEC | `DirectoryListing` |
//! | [`SummaryEnricher`] | 티커 | SEC + Yahoo `summaryDetail` | `TickerSummary` |
//! | [`OverviewEnricher`] | 티커 | Yahoo `defaultKeyStatistics` + `financialData` | `OverviewMetrics` |
//! | [`StockEnricher`] | 티커 | Yahoo `price` + `summaryDetail` | `StockQuote` |

mod directory;
mod overview;
mod stock;
mod summary;

pub use directory::{CompanyNameEnricher, DirectoryEnricher};
pub use overview::OverviewEnricher;
pub use stock::StockEnricher;
pub use summary::SummaryEnricher;

use rust_decimal::Decimal;
use ticker_core::decimal_from_f64;
use ticker_sync::FailureReason;

use crate::provider::{QuoteSummary, YahooError};

/// 심볼 단위 Yahoo 에러를 실패 사유로 변환합니다.
pub(crate) fn yahoo_failure(err: YahooError) -> FailureReason {
    match err {
        YahooError::NotFound(_) => FailureReason::UnknownKey,
        YahooError::Api { code, message } => FailureReason::api_error(code, message),
        YahooError::Transport(e) => FailureReason::Transport(e.to_string()),
    }
}

/// 선택 숫자 필드를 Decimal로 읽습니다.
pub(crate) fn optional_decimal(summary: &QuoteSummary, module: &str, field: &str) -> Option<Decimal> {
    summary.number(module, field).and_then(decimal_from_f64)
}

/// 필수 숫자 필드를 Decimal로 읽습니다.
pub(crate) fn required_decimal(
    summary: &QuoteSummary,
    module: &str,
    field: &str,
) -> Result<Decimal, FailureReason> {
    optional_decimal(summary, module, field).ok_or_else(|| FailureReason::missing(field))
}
