//! 종목 개요 테이블 (밸류에이션, 수익성, 성장률).
//!
//! 마진과 성장률은 XX.XX 퍼센트 형식으로 저장됩니다. 외부 API의 0.XXXX 비율은
//! [`OverviewMetrics::into_store_record`]에서 변환되고, 모든 값은 컬럼 정밀도에
//! 맞춰 정리됩니다. 정밀도를 벗어난 값은 레코드 전체를 실패시키지 않고 NULL이 됩니다.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::record::{ensure_ticker_len, SourceRecord, SyncRecord};
use super::ticker_directory::SHORT_TICKER_LEN;
use crate::error::{TickerError, TickerResult};
use crate::types::{column_limit, sanitize_decimal, to_percentage, Ticker};

/// 컬럼 정밀도 `NUMERIC(p, s)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Precision {
    pub max_digits: u32,
    pub scale: u32,
}

impl Precision {
    pub const fn new(max_digits: u32, scale: u32) -> Self {
        Self { max_digits, scale }
    }

    pub fn apply(&self, value: Option<Decimal>) -> Option<Decimal> {
        sanitize_decimal(value, self.max_digits, self.scale)
    }

    fn check(&self, field: &'static str, value: Option<Decimal>) -> TickerResult<()> {
        let (Some(value), Some(limit)) = (value, column_limit(self.max_digits, self.scale)) else {
            return Ok(());
        };
        if value.abs() > limit {
            return Err(TickerError::validation(
                field,
                value,
                format!("{} must be between -{} and {}", field, limit, limit),
            ));
        }
        Ok(())
    }
}

pub const RATIO_PRECISION: Precision = Precision::new(7, 2);
pub const MARGIN_PRECISION: Precision = Precision::new(5, 2);
pub const EARNINGS_GROWTH_PRECISION: Precision = Precision::new(9, 2);
pub const REVENUE_GROWTH_PRECISION: Precision = Precision::new(10, 2);
pub const EPS_PRECISION: Precision = Precision::new(7, 2);

/// `ticker_overview` 테이블 행.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickerOverview {
    /// `ticker_summary` 참조
    pub ticker: Ticker,
    pub enterprise_to_ebitda: Option<Decimal>,
    pub price_to_book: Option<Decimal>,
    pub gross_margin: Option<Decimal>,
    pub operating_margin: Option<Decimal>,
    pub profit_margin: Option<Decimal>,
    pub ebitda_margin: Option<Decimal>,
    pub earnings_growth: Option<Decimal>,
    pub revenue_growth: Option<Decimal>,
    pub trailing_eps: Option<Decimal>,
    pub forward_eps: Option<Decimal>,
    pub peg_ratio: Option<Decimal>,
}

impl TickerOverview {
    /// 빈 개요 행.
    pub fn new(ticker: Ticker) -> Self {
        Self {
            ticker,
            enterprise_to_ebitda: None,
            price_to_book: None,
            gross_margin: None,
            operating_margin: None,
            profit_margin: None,
            ebitda_margin: None,
            earnings_growth: None,
            revenue_growth: None,
            trailing_eps: None,
            forward_eps: None,
            peg_ratio: None,
        }
    }

    /// 필드를 검증합니다.
    pub fn validate(&self) -> TickerResult<()> {
        ensure_ticker_len(&self.ticker, SHORT_TICKER_LEN)?;

        MARGIN_PRECISION.check("gross_margin", self.gross_margin)?;
        MARGIN_PRECISION.check("operating_margin", self.operating_margin)?;
        MARGIN_PRECISION.check("profit_margin", self.profit_margin)?;
        MARGIN_PRECISION.check("ebitda_margin", self.ebitda_margin)?;
        EARNINGS_GROWTH_PRECISION.check("earnings_growth", self.earnings_growth)?;
        REVENUE_GROWTH_PRECISION.check("revenue_growth", self.revenue_growth)?;
        EPS_PRECISION.check("trailing_eps", self.trailing_eps)?;
        EPS_PRECISION.check("forward_eps", self.forward_eps)?;
        Ok(())
    }

    /// 값이 있는 지표 수.
    pub fn populated_fields(&self) -> usize {
        [
            self.enterprise_to_ebitda,
            self.price_to_book,
            self.gross_margin,
            self.operating_margin,
            self.profit_margin,
            self.ebitda_margin,
            self.earnings_growth,
            self.revenue_growth,
            self.trailing_eps,
            self.forward_eps,
            self.peg_ratio,
        ]
        .iter()
        .filter(|v| v.is_some())
        .count()
    }
}

impl SyncRecord for TickerOverview {
    type Key = Ticker;

    fn key(&self) -> Ticker {
        self.ticker.clone()
    }

    fn differs_from(&self, other: &Self) -> bool {
        self.enterprise_to_ebitda != other.enterprise_to_ebitda
            || self.price_to_book != other.price_to_book
            || self.gross_margin != other.gross_margin
            || self.operating_margin != other.operating_margin
            || self.profit_margin != other.profit_margin
            || self.ebitda_margin != other.ebitda_margin
            || self.earnings_growth != other.earnings_growth
            || self.revenue_growth != other.revenue_growth
            || self.trailing_eps != other.trailing_eps
            || self.forward_eps != other.forward_eps
            || self.peg_ratio != other.peg_ratio
    }
}

/// Yahoo `defaultKeyStatistics` + `financialData` 원본 지표.
///
/// 마진과 성장률은 0.XXXX 비율 그대로입니다.
#[derive(Debug, Clone, PartialEq)]
pub struct OverviewMetrics {
    pub ticker: Ticker,
    pub enterprise_to_ebitda: Option<Decimal>,
    pub price_to_book: Option<Decimal>,
    pub gross_margins: Option<Decimal>,
    pub operating_margins: Option<Decimal>,
    pub profit_margins: Option<Decimal>,
    pub ebitda_margins: Option<Decimal>,
    pub earnings_growth: Option<Decimal>,
    pub revenue_growth: Option<Decimal>,
    pub trailing_eps: Option<Decimal>,
    pub forward_eps: Option<Decimal>,
    pub peg_ratio: Option<Decimal>,
}

impl OverviewMetrics {
    /// 모든 지표가 비어 있는 원본.
    pub fn new(ticker: Ticker) -> Self {
        Self {
            ticker,
            enterprise_to_ebitda: None,
            price_to_book: None,
            gross_margins: None,
            operating_margins: None,
            profit_margins: None,
            ebitda_margins: None,
            earnings_growth: None,
            revenue_growth: None,
            trailing_eps: None,
            forward_eps: None,
            peg_ratio: None,
        }
    }
}

impl SourceRecord for OverviewMetrics {
    type Store = TickerOverview;

    fn into_store_record(self, _attribute: Option<&()>) -> TickerResult<TickerOverview> {
        let pct = |value: Option<Decimal>| value.map(to_percentage);

        let overview = TickerOverview {
            ticker: self.ticker,
            enterprise_to_ebitda: RATIO_PRECISION.apply(self.enterprise_to_ebitda),
            price_to_book: RATIO_PRECISION.apply(self.price_to_book),
            gross_margin: MARGIN_PRECISION.apply(pct(self.gross_margins)),
            operating_margin: MARGIN_PRECISION.apply(pct(self.operating_margins)),
            profit_margin: MARGIN_PRECISION.apply(pct(self.profit_margins)),
            ebitda_margin: MARGIN_PRECISION.apply(pct(self.ebitda_margins)),
            earnings_growth: EARNINGS_GROWTH_PRECISION.apply(pct(self.earnings_growth)),
            revenue_growth: REVENUE_GROWTH_PRECISION.apply(pct(self.revenue_growth)),
            trailing_eps: EPS_PRECISION.apply(self.trailing_eps),
            forward_eps: EPS_PRECISION.apply(self.forward_eps),
            peg_ratio: RATIO_PRECISION.apply(self.peg_ratio),
        };
        overview.validate()?;
        Ok(overview)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn metrics() -> OverviewMetrics {
        OverviewMetrics {
            ticker: Ticker::parse("MSFT").unwrap(),
            enterprise_to_ebitda: Some(dec!(24.567)),
            price_to_book: Some(dec!(12.1)),
            gross_margins: Some(dec!(0.6962)),
            operating_margins: Some(dec!(0.4459)),
            profit_margins: Some(dec!(0.3596)),
            ebitda_margins: Some(dec!(0.5231)),
            earnings_growth: Some(dec!(0.104)),
            revenue_growth: Some(dec!(0.16)),
            trailing_eps: Some(dec!(11.8)),
            forward_eps: Some(dec!(13.04)),
            peg_ratio: Some(dec!(2.31)),
        }
    }

    #[test]
    fn test_margins_become_percentages() {
        let overview = metrics().into_store_record(None).unwrap();
        assert_eq!(overview.gross_margin, Some(dec!(69.62)));
        assert_eq!(overview.operating_margin, Some(dec!(44.59)));
        assert_eq!(overview.earnings_growth, Some(dec!(10.40)));
        assert_eq!(overview.enterprise_to_ebitda, Some(dec!(24.57)));
        assert_eq!(overview.populated_fields(), 11);
    }

    #[test]
    fn test_growth_above_one_not_rescaled() {
        let mut m = metrics();
        m.earnings_growth = Some(dec!(2.5));
        let overview = m.into_store_record(None).unwrap();
        assert_eq!(overview.earnings_growth, Some(dec!(2.5)));
    }

    #[test]
    fn test_out_of_precision_becomes_none() {
        let mut m = metrics();
        m.enterprise_to_ebitda = Some(dec!(123456.78));
        m.profit_margins = Some(dec!(-1500));
        let overview = m.into_store_record(None).unwrap();
        assert_eq!(overview.enterprise_to_ebitda, None);
        assert_eq!(overview.profit_margin, None);
    }

    #[test]
    fn test_validate_rejects_direct_out_of_range() {
        let mut overview = TickerOverview::new(Ticker::parse("MSFT").unwrap());
        overview.gross_margin = Some(dec!(1000));
        assert!(overview.validate().is_err());
    }
}
