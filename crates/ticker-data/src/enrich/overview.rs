//! 종목 개요 조회기.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use ticker_core::{OverviewMetrics, Ticker};
use ticker_sync::{FailureReason, Lookup, RecordEnricher};

use super::{optional_decimal, yahoo_failure};
use crate::error::DataError;
use crate::provider::{QuoteSummary, YahooClient};

const KEY_STATISTICS: &str = "defaultKeyStatistics";
const FINANCIAL_DATA: &str = "financialData";

/// `defaultKeyStatistics` + `financialData` → [`OverviewMetrics`].
///
/// 개별 지표는 모두 선택 값이며, 두 모듈이 모두 비어 있을 때만 실패합니다.
pub struct OverviewEnricher {
    yahoo: Arc<YahooClient>,
    max_workers: usize,
}

impl OverviewEnricher {
    pub fn new(yahoo: Arc<YahooClient>, max_workers: usize) -> Self {
        Self { yahoo, max_workers }
    }
}

pub(crate) fn build_metrics(ticker: &Ticker, summary: &QuoteSummary) -> Lookup<OverviewMetrics> {
    if !summary.has_module(KEY_STATISTICS) && !summary.has_module(FINANCIAL_DATA) {
        return Err(FailureReason::NoData);
    }

    let stats = |field: &str| optional_decimal(summary, KEY_STATISTICS, field);
    let financial = |field: &str| optional_decimal(summary, FINANCIAL_DATA, field);

    Ok(OverviewMetrics {
        ticker: ticker.clone(),
        enterprise_to_ebitda: stats("enterpriseToEbitda"),
        price_to_book: stats("priceToBook"),
        trailing_eps: stats("trailingEps"),
        forward_eps: stats("forwardEps"),
        peg_ratio: stats("pegRatio"),
        gross_margins: financial("grossMargins"),
        operating_margins: financial("operatingMargins"),
        profit_margins: financial("profitMargins"),
        ebitda_margins: financial("ebitdaMargins"),
        earnings_growth: financial("earningsGrowth"),
        revenue_growth: financial("revenueGrowth"),
    })
}

#[async_trait]
impl RecordEnricher for OverviewEnricher {
    type Key = Ticker;
    type Record = OverviewMetrics;
    type Error = DataError;

    async fn lookup_batch(
        &self,
        keys: &[Ticker],
    ) -> Result<HashMap<Ticker, Lookup<OverviewMetrics>>, DataError> {
        let quotes = self
            .yahoo
            .quote_summaries(keys, &[KEY_STATISTICS, FINANCIAL_DATA], self.max_workers)
            .await?;

        Ok(quotes
            .into_iter()
            .map(|(ticker, quote)| {
                let lookup = match quote {
                    Ok(summary) => build_metrics(&ticker, &summary),
                    Err(e) => Err(yahoo_failure(e)),
                };
                (ticker, lookup)
            })
            .collect())
    }
}
