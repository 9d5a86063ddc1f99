//! 종목 목록 테이블.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::cik_lookup::MAX_COMPANY_NAME_LEN;
use super::record::{SourceRecord, SyncRecord};
use crate::error::{TickerError, TickerResult};
use crate::types::Ticker;

/// `stocks` 테이블 행.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stock {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub symbol: Ticker,
    pub company: Option<String>,
    /// 상장 거래소 (NASDAQ, NYSE, AMEX)
    pub exchange: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_updated_at: Option<DateTime<Utc>>,
}

impl Stock {
    /// 회사명을 정리하고 검증하여 생성합니다. 빈 회사명은 `None`이 됩니다.
    pub fn new(
        symbol: Ticker,
        company: Option<&str>,
        exchange: Option<&str>,
    ) -> TickerResult<Self> {
        let company = company
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(str::to_string);

        if let Some(name) = &company {
            if name.chars().count() > MAX_COMPANY_NAME_LEN {
                return Err(TickerError::validation(
                    "company",
                    name,
                    "Company name cannot be longer than 255 characters",
                ));
            }
        }

        Ok(Self {
            id: None,
            symbol,
            company,
            exchange: exchange.map(|e| e.trim().to_uppercase()).filter(|e| !e.is_empty()),
            created_at: None,
            last_updated_at: None,
        })
    }
}

impl SyncRecord for Stock {
    type Key = Ticker;

    fn key(&self) -> Ticker {
        self.symbol.clone()
    }

    fn differs_from(&self, other: &Self) -> bool {
        self.company != other.company || self.exchange != other.exchange
    }
}

/// Yahoo `price` 모듈에서 조회한 종목 정보.
#[derive(Debug, Clone, PartialEq)]
pub struct StockQuote {
    pub symbol: Ticker,
    pub long_name: Option<String>,
    pub short_name: Option<String>,
}

impl StockQuote {
    /// 정식 회사명, 없으면 약칭.
    pub fn company(&self) -> Option<&str> {
        self.long_name
            .as_deref()
            .filter(|n| !n.trim().is_empty())
            .or(self.short_name.as_deref())
    }
}

/// 부가 속성은 소스가 알려준 거래소 태그입니다.
impl SourceRecord<String> for StockQuote {
    type Store = Stock;

    fn into_store_record(self, exchange: Option<&String>) -> TickerResult<Stock> {
        Stock::new(self.symbol.clone(), self.company(), exchange.map(String::as_str))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quote(long: Option<&str>, short: Option<&str>) -> StockQuote {
        StockQuote {
            symbol: Ticker::parse("AAPL").unwrap(),
            long_name: long.map(str::to_string),
            short_name: short.map(str::to_string),
        }
    }

    #[test]
    fn test_company_prefers_long_name() {
        let stock = quote(Some("Apple Inc."), Some("Apple"))
            .into_store_record(Some(&"nasdaq".to_string()))
            .unwrap();
        assert_eq!(stock.company.as_deref(), Some("Apple Inc."));
        assert_eq!(stock.exchange.as_deref(), Some("NASDAQ"));
    }

    #[test]
    fn test_company_falls_back_to_short_name() {
        let stock = quote(Some("  "), Some("Apple")).into_store_record(None).unwrap();
        assert_eq!(stock.company.as_deref(), Some("Apple"));
        assert_eq!(stock.exchange, None);
    }

    #[test]
    fn test_empty_company_becomes_none() {
        let stock = quote(None, Some("   ")).into_store_record(None).unwrap();
        assert_eq!(stock.company, None);
    }

    #[test]
    fn test_long_company_rejected() {
        let long = "X".repeat(300);
        assert!(quote(Some(&long), None).into_store_record(None).is_err());
    }
}
