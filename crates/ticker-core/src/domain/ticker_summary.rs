//! 종목 요약 테이블 (시가총액, 가격, 배당).

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::record::{ensure_ticker_len, SourceRecord, SyncRecord};
use super::ticker_directory::SHORT_TICKER_LEN;
use super::ticker_overview::Precision;
use crate::error::{TickerError, TickerResult};
use crate::types::{Cik, Ticker};

/// 가격, 이동평균, PE 컬럼 정밀도.
pub const PRICE_PRECISION: Precision = Precision::new(12, 4);
/// 배당 수익률, 배당 성향 컬럼 정밀도.
pub const RATE_PRECISION: Precision = Precision::new(8, 6);

/// `ticker_summary` 테이블 행.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickerSummary {
    pub ticker: Ticker,
    /// `cik_lookup` 참조
    pub cik: Option<Cik>,
    /// 시가총액
    pub market_cap: i64,
    /// 전일 종가
    pub previous_close: Decimal,
    pub pe_ratio: Option<Decimal>,
    pub forward_pe_ratio: Option<Decimal>,
    /// 배당 수익률 (0~1 비율)
    pub dividend_yield: Option<Decimal>,
    /// 배당 성향 (0~1 비율)
    pub payout_ratio: Option<Decimal>,
    /// 50일 이동평균
    pub fifty_day_average: Decimal,
    /// 200일 이동평균
    pub two_hundred_day_average: Decimal,
}

impl TickerSummary {
    /// 필드를 검증합니다.
    pub fn validate(&self) -> TickerResult<()> {
        ensure_ticker_len(&self.ticker, SHORT_TICKER_LEN)?;

        if self.market_cap < 0 {
            return Err(TickerError::validation(
                "market_cap",
                self.market_cap,
                "Market cap cannot be negative",
            ));
        }

        non_negative("previous_close", self.previous_close)?;
        non_negative("fifty_day_average", self.fifty_day_average)?;
        non_negative("two_hundred_day_average", self.two_hundred_day_average)?;

        if let Some(pe) = self.pe_ratio {
            non_negative("pe_ratio", pe)?;
        }
        if let Some(pe) = self.forward_pe_ratio {
            non_negative("forward_pe_ratio", pe)?;
        }
        if let Some(value) = self.dividend_yield {
            unit_interval("dividend_yield", value)?;
        }
        if let Some(value) = self.payout_ratio {
            unit_interval("payout_ratio", value)?;
        }

        Ok(())
    }
}

fn non_negative(field: &'static str, value: Decimal) -> TickerResult<()> {
    if value.is_sign_negative() && !value.is_zero() {
        return Err(TickerError::validation(field, value, format!("{} cannot be negative", field)));
    }
    Ok(())
}

fn unit_interval(field: &'static str, value: Decimal) -> TickerResult<()> {
    if value < Decimal::ZERO || value > Decimal::ONE {
        return Err(TickerError::validation(
            field,
            value,
            format!("{} must be between 0 and 1", field),
        ));
    }
    Ok(())
}

impl SyncRecord for TickerSummary {
    type Key = Ticker;

    fn key(&self) -> Ticker {
        self.ticker.clone()
    }

    fn differs_from(&self, other: &Self) -> bool {
        self.cik != other.cik
            || self.market_cap != other.market_cap
            || self.previous_close != other.previous_close
            || self.pe_ratio != other.pe_ratio
            || self.forward_pe_ratio != other.forward_pe_ratio
            || self.dividend_yield != other.dividend_yield
            || self.payout_ratio != other.payout_ratio
            || self.fifty_day_average != other.fifty_day_average
            || self.two_hundred_day_average != other.two_hundred_day_average
    }
}

/// 조회 결과가 이미 테이블 형태이므로 검증만 수행합니다.
impl SourceRecord for TickerSummary {
    type Store = TickerSummary;

    fn into_store_record(self, _attribute: Option<&()>) -> TickerResult<TickerSummary> {
        self.validate()?;
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn summary() -> TickerSummary {
        TickerSummary {
            ticker: Ticker::parse("AAPL").unwrap(),
            cik: Some(Cik::new(320193).unwrap()),
            market_cap: 3_000_000_000_000,
            previous_close: dec!(187.44),
            pe_ratio: Some(dec!(29.1)),
            forward_pe_ratio: Some(dec!(27.3)),
            dividend_yield: Some(dec!(0.0051)),
            payout_ratio: Some(dec!(0.1555)),
            fifty_day_average: dec!(182.10),
            two_hundred_day_average: dec!(179.95),
        }
    }

    #[test]
    fn test_valid_summary() {
        assert!(summary().into_store_record(None).is_ok());
    }

    #[test]
    fn test_rejects_out_of_range_ratios() {
        let mut s = summary();
        s.payout_ratio = Some(dec!(1.2));
        assert!(s.validate().is_err());

        let mut s = summary();
        s.pe_ratio = Some(dec!(-3));
        assert!(s.validate().is_err());

        let mut s = summary();
        s.market_cap = -1;
        assert!(s.validate().is_err());
    }

    #[test]
    fn test_single_field_difference() {
        let a = summary();
        let mut b = a.clone();
        assert!(!a.differs_from(&b));

        b.previous_close = dec!(187.45);
        assert!(a.differs_from(&b));

        // 스케일만 다른 같은 값은 동일
        let mut c = a.clone();
        c.previous_close = dec!(187.440);
        assert!(!a.differs_from(&c));
    }
}
