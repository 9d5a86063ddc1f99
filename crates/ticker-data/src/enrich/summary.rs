//! 종목 요약 조회기.
//!
//! CIK를 먼저 SEC에서 찾고, CIK가 있는 티커만 Yahoo `summaryDetail`을 조회합니다.
//! 값은 저장 컬럼 정밀도로 반올림해서 돌려주므로, 다음 실행에서 DB 값과 비교해도
//! 반올림 차이로 인한 변경이 생기지 않습니다.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use rust_decimal::Decimal;
use ticker_core::{Cik, Precision, Ticker, TickerSummary, PRICE_PRECISION, RATE_PRECISION};
use ticker_sync::{FailureReason, Lookup, RecordEnricher};
use tracing::debug;

use super::{optional_decimal, required_decimal, yahoo_failure};
use crate::error::DataError;
use crate::provider::{QuoteSummary, SecCompanyDirectory, YahooClient};

const SUMMARY_DETAIL: &str = "summaryDetail";

/// CIK + `summaryDetail` → [`TickerSummary`].
pub struct SummaryEnricher {
    directory: Arc<SecCompanyDirectory>,
    yahoo: Arc<YahooClient>,
    max_workers: usize,
}

impl SummaryEnricher {
    pub fn new(directory: Arc<SecCompanyDirectory>, yahoo: Arc<YahooClient>, max_workers: usize) -> Self {
        Self {
            directory,
            yahoo,
            max_workers,
        }
    }
}

/// 컬럼 범위를 벗어난 필수 값은 검증 실패입니다.
fn required_column(value: Decimal, field: &str, precision: Precision) -> Result<Decimal, FailureReason> {
    precision
        .apply(Some(value))
        .ok_or_else(|| FailureReason::Invalid(format!("{} 값이 컬럼 범위를 벗어남: {}", field, value)))
}

/// `summaryDetail`에서 요약 행을 만듭니다.
///
/// 실패 조건: 모듈 없음, 시가총액 없음/0 이하, 전일 종가 없음/0 이하,
/// 50일·200일 이동평균 없음.
pub(crate) fn build_summary(
    ticker: &Ticker,
    cik: Cik,
    summary: &QuoteSummary,
) -> Lookup<TickerSummary> {
    if !summary.has_module(SUMMARY_DETAIL) {
        return Err(FailureReason::NoData);
    }

    let market_cap = summary
        .integer(SUMMARY_DETAIL, "marketCap")
        .ok_or_else(|| FailureReason::missing("marketCap"))?;
    if market_cap <= 0 {
        return Err(FailureReason::non_positive("marketCap", market_cap));
    }

    let previous_close = required_decimal(summary, SUMMARY_DETAIL, "previousClose")?;
    if previous_close <= Decimal::ZERO {
        return Err(FailureReason::non_positive("previousClose", previous_close));
    }
    let fifty_day = required_decimal(summary, SUMMARY_DETAIL, "fiftyDayAverage")?;
    let two_hundred_day = required_decimal(summary, SUMMARY_DETAIL, "twoHundredDayAverage")?;

    Ok(TickerSummary {
        ticker: ticker.clone(),
        cik: Some(cik),
        market_cap,
        previous_close: required_column(previous_close, "previousClose", PRICE_PRECISION)?,
        pe_ratio: PRICE_PRECISION.apply(optional_decimal(summary, SUMMARY_DETAIL, "trailingPE")),
        forward_pe_ratio: PRICE_PRECISION.apply(optional_decimal(summary, SUMMARY_DETAIL, "forwardPE")),
        dividend_yield: RATE_PRECISION.apply(optional_decimal(summary, SUMMARY_DETAIL, "dividendYield")),
        payout_ratio: RATE_PRECISION.apply(optional_decimal(summary, SUMMARY_DETAIL, "payoutRatio")),
        fifty_day_average: required_column(fifty_day, "fiftyDayAverage", PRICE_PRECISION)?,
        two_hundred_day_average: required_column(
            two_hundred_day,
            "twoHundredDayAverage",
            PRICE_PRECISION,
        )?,
    })
}

#[async_trait]
impl RecordEnricher for SummaryEnricher {
    type Key = Ticker;
    type Record = TickerSummary;
    type Error = DataError;

    async fn lookup_batch(
        &self,
        keys: &[Ticker],
    ) -> Result<HashMap<Ticker, Lookup<TickerSummary>>, DataError> {
        let entries = self.directory.lookup_tickers(keys).await?;

        let mut results = HashMap::with_capacity(keys.len());
        let mut with_cik = Vec::with_capacity(keys.len());
        for ticker in keys {
            if entries.contains_key(ticker) {
                with_cik.push(ticker.clone());
            } else {
                debug!(ticker = %ticker, "CIK 없음, Yahoo 조회 생략");
                results.insert(ticker.clone(), Err(FailureReason::missing("cik")));
            }
        }

        if with_cik.is_empty() {
            return Ok(results);
        }

        let quotes = self
            .yahoo
            .quote_summaries(&with_cik, &[SUMMARY_DETAIL], self.max_workers)
            .await?;

        for (ticker, quote) in quotes {
            let Some(entry) = entries.get(&ticker) else {
                continue;
            };
            let lookup = match quote {
                Ok(summary) => build_summary(&ticker, entry.cik, &summary),
                Err(e) => Err(yahoo_failure(e)),
            };
            results.insert(ticker, lookup);
        }

        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enrich::test_support::summary;
    use rust_decimal_macros::dec;

    fn ticker() -> Ticker {
        Ticker::parse("AAPL").unwrap()
    }

    fn cik() -> Cik {
        Cik::new(320193).unwrap()
    }

    const FULL: &str = r#"{
        "summaryDetail": {
            "marketCap": {"raw": 2950000000000},
            "previousClose": {"raw": 187.44},
            "trailingPE": {"raw": 29.123456},
            "forwardPE": {},
            "dividendYield": {"raw": 0.0051234567},
            "payoutRatio": {"raw": 0.1555},
            "fiftyDayAverage": {"raw": 182.10312},
            "twoHundredDayAverage": {"raw": 179.95}
        }
    }"#;

    #[test]
    fn test_build_summary_rounds_to_columns() {
        let s = build_summary(&ticker(), cik(), &summary(FULL)).unwrap();

        assert_eq!(s.cik, Some(cik()));
        assert_eq!(s.market_cap, 2_950_000_000_000);
        assert_eq!(s.previous_close, dec!(187.44));
        assert_eq!(s.pe_ratio, Some(dec!(29.1235)));
        assert_eq!(s.forward_pe_ratio, None);
        assert_eq!(s.dividend_yield, Some(dec!(0.005123)));
        assert_eq!(s.payout_ratio, Some(dec!(0.1555)));
        assert_eq!(s.fifty_day_average, dec!(182.1031));
        assert!(s.validate().is_ok());
    }

    #[test]
    fn test_market_cap_rules() {
        let missing = summary(r#"{"summaryDetail": {"previousClose": {"raw": 1.0}}}"#);
        assert_eq!(
            build_summary(&ticker(), cik(), &missing),
            Err(FailureReason::missing("marketCap"))
        );

        let zero = summary(r#"{"summaryDetail": {"marketCap": {"raw": 0}}}"#);
        assert_eq!(
            build_summary(&ticker(), cik(), &zero),
            Err(FailureReason::non_positive("marketCap", 0))
        );
    }

    #[test]
    fn test_required_prices() {
        let no_average = summary(
            r#"{"summaryDetail": {
                "marketCap": {"raw": 100},
                "previousClose": {"raw": 10.5},
                "fiftyDayAverage": {"raw": 10.0}
            }}"#,
        );
        assert_eq!(
            build_summary(&ticker(), cik(), &no_average),
            Err(FailureReason::missing("twoHundredDayAverage"))
        );

        let zero_close = summary(
            r#"{"summaryDetail": {"marketCap": {"raw": 100}, "previousClose": {"raw": 0}}}"#,
        );
        assert!(matches!(
            build_summary(&ticker(), cik(), &zero_close),
            Err(FailureReason::NonPositive { .. })
        ));
    }

    #[test]
    fn test_missing_module_is_no_data() {
        let empty = summary(r#"{"summaryDetail": {}}"#);
        assert_eq!(build_summary(&ticker(), cik(), &empty), Err(FailureReason::NoData));
    }
}
