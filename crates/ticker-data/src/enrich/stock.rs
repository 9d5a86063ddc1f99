//! 종목 목록 조회기.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use ticker_core::{StockQuote, Ticker};
use ticker_sync::{FailureReason, Lookup, RecordEnricher};

use super::yahoo_failure;
use crate::error::DataError;
use crate::provider::{QuoteSummary, YahooClient};

const PRICE: &str = "price";
const SUMMARY_DETAIL: &str = "summaryDetail";

/// `price` + `summaryDetail` → [`StockQuote`].
///
/// 시가총액이 없거나 0 이하인 종목(상장폐지, 펀드 등)은 실패로 처리합니다.
pub struct StockEnricher {
    yahoo: Arc<YahooClient>,
    max_workers: usize,
}

impl StockEnricher {
    pub fn new(yahoo: Arc<YahooClient>, max_workers: usize) -> Self {
        Self { yahoo, max_workers }
    }
}

pub(crate) fn build_quote(ticker: &Ticker, summary: &QuoteSummary) -> Lookup<StockQuote> {
    if !summary.has_module(PRICE) && !summary.has_module(SUMMARY_DETAIL) {
        return Err(FailureReason::NoData);
    }

    let market_cap = summary
        .integer(SUMMARY_DETAIL, "marketCap")
        .or_else(|| summary.integer(PRICE, "marketCap"))
        .ok_or_else(|| FailureReason::missing("marketCap"))?;
    if market_cap <= 0 {
        return Err(FailureReason::non_positive("marketCap", market_cap));
    }

    Ok(StockQuote {
        symbol: ticker.clone(),
        long_name: summary.text(PRICE, "longName").map(str::to_string),
        short_name: summary.text(PRICE, "shortName").map(str::to_string),
    })
}

#[async_trait]
impl RecordEnricher for StockEnricher {
    type Key = Ticker;
    type Record = StockQuote;
    type Error = DataError;

    async fn lookup_batch(
        &self,
        keys: &[Ticker],
    ) -> Result<HashMap<Ticker, Lookup<StockQuote>>, DataError> {
        let quotes = self
            .yahoo
            .quote_summaries(keys, &[PRICE, SUMMARY_DETAIL], self.max_workers)
            .await?;

        Ok(quotes
            .into_iter()
            .map(|(ticker, quote)| {
                let lookup = match quote {
                    Ok(summary) => build_quote(&ticker, &summary),
                    Err(e) => Err(yahoo_failure(e)),
                };
                (ticker, lookup)
            })
            .collect())
    }
}
