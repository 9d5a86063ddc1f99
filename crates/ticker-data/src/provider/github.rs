//! GitHub 미국 티커 목록 소스.
//!
//! `Improved-US-Stock-Symbols` 저장소의 raw JSON 파일을 읽습니다.
//!
//! - `all/all_full_tickers.json`: `{ "symbol": ..., "name": ... }` 객체 배열
//! - `{exchange}/{exchange}_tickers.json`: 심볼 문자열 배열

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use ticker_core::{SourceSettings, Ticker};
use ticker_sync::{SourceProvider, SourceSet};
use tracing::{info, warn};

use super::http::{build_client, get_json};
use crate::error::{DataError, Result};

/// 정규화 후 허용하는 최대 심볼 길이.
pub const MAX_SOURCE_SYMBOL_LEN: usize = 6;

/// 보통주가 아님을 나타내는 증권명 키워드 (대문자 비교).
const NON_COMMON_STOCK_KEYWORDS: &[&str] = &[
    // 채권
    "JUNIOR SUBORDINATED",
    "SUBORDINATED NOTES",
    "SUBORDINATED DEBENTURES",
    "SENIOR NOTES",
    "MORTGAGE BONDS",
    "DEBENTURES",
    "NOTES DUE",
    "NOTES EXP",
    "GLOBAL NOTES",
    "ZONES",
    // 우선주
    "PREFERRED",
    "PREF",
    "PERPETUAL",
    "CUMULATIVE REDEEMABLE",
    "NON-CUMULATIVE",
    "NON CUMULATIVE",
    "PREFERENCE SHARES",
    "FIXED TO FLOATING",
    "FIXED-TO-FLOATING",
    "FIXED-RATE",
    "FIXED RATE",
    "FLOATING RATE",
    "SERIES A",
    "SERIES B",
    "SERIES C",
    "SERIES D",
    "SERIES E",
    "SERIES F",
    "SERIES G",
    "SERIES H",
    "SERIES I",
    "SERIES J",
    "SERIES K",
    "SERIES L",
    "SERIES M",
    "SERIES N",
    "SERIES O",
    "SERIES P",
    "SERIES Q",
    "SERIES R",
    "SERIES S",
    "SERIES T",
    "SERIES 202",
    // 예탁증서
    "DEPOSITARY SHARE",
    "DS REP",
    "1000 DS",
    "REPRESENTING A 1/1000TH",
    "REPRESENTING 1/1000TH",
    "REPRESENTING A 1/20TH",
    "LIQUIDATION PREFERENCE",
    "ADS REPRESENTING",
    "REPRESENTING 1 ORD",
    // 워런트, 권리, 유닛
    "WARRANT",
    "RIGHT",
    "UNIT",
    // 기타
    "PAR VALUE",
    "CONVERTIBLE",
    "EXCHANGEABLE",
    "CONV.",
    "CONV PREF",
    "EXP 20",
    "DUE 2",
    "TERM PREF",
];

/// 증권명이 보통주인지 판정합니다.
///
/// "Common Stock"이 들어 있으면 항상 보통주입니다. 그 밖에는 제외 키워드가
/// 하나라도 포함되면 보통주가 아닙니다.
pub fn is_common_stock(name: &str) -> bool {
    let upper = name.to_uppercase();
    if upper.contains("COMMON STOCK") {
        return true;
    }
    !NON_COMMON_STOCK_KEYWORDS.iter().any(|k| upper.contains(k))
}

/// 원본 심볼을 정규화합니다.
///
/// `^`가 포함된 심볼, 정규화 후 `MAX_SOURCE_SYMBOL_LEN`보다 긴 심볼,
/// 허용되지 않는 문자가 있는 심볼은 `None`입니다.
pub fn normalize_symbol(raw: &str) -> Option<Ticker> {
    if raw.contains('^') {
        return None;
    }
    Ticker::parse(raw)
        .ok()
        .filter(|t| t.len() <= MAX_SOURCE_SYMBOL_LEN)
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum TickerEntry {
    Full {
        symbol: String,
        #[serde(default)]
        name: Option<String>,
    },
    Symbol(String),
}

/// 필터링 통계.
#[derive(Debug, Default)]
struct FilterStats {
    caret: usize,
    non_common: usize,
    invalid: usize,
}

/// 전체 미국 티커 목록 소스.
#[derive(Clone)]
pub struct GithubTickerSource {
    client: reqwest::Client,
    base_url: String,
}

impl GithubTickerSource {
    pub fn new(settings: &SourceSettings) -> Result<Self> {
        Self::with_base_url(
            &settings.github_raw_base_url,
            Duration::from_secs(settings.request_timeout_secs),
        )
    }

    pub fn with_base_url(base_url: &str, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: build_client(timeout, "ticker-sync", false)?,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// 보통주 티커 목록을 원본 순서대로 가져옵니다 (중복은 그대로).
    ///
    /// 배열이 아닌 JSON, 유효한 티커가 하나도 없는 응답은 에러입니다.
    pub async fn fetch_tickers(&self) -> Result<Vec<Ticker>> {
        let url = format!("{}/all/all_full_tickers.json", self.base_url);
        info!(url = %url, "GitHub 티커 목록 조회");

        let raw: Value = get_json(&self.client, &url).await?;
        let Value::Array(items) = raw else {
            return Err(DataError::ParseError(format!("{}: JSON 배열이 아닙니다", url)));
        };

        let mut stats = FilterStats::default();
        let mut tickers = Vec::with_capacity(items.len());

        for item in items {
            let (symbol, name) = match serde_json::from_value::<TickerEntry>(item) {
                Ok(TickerEntry::Full { symbol, name }) => (symbol, name),
                Ok(TickerEntry::Symbol(symbol)) => (symbol, None),
                Err(_) => {
                    stats.invalid += 1;
                    continue;
                }
            };

            let symbol = symbol.trim();
            if symbol.is_empty() {
                continue;
            }
            if symbol.contains('^') {
                stats.caret += 1;
                continue;
            }
            if let Some(name) = name.as_deref().map(str::trim).filter(|n| !n.is_empty()) {
                if !is_common_stock(name) {
                    stats.non_common += 1;
                    continue;
                }
            }
            match normalize_symbol(symbol) {
                Some(ticker) => tickers.push(ticker),
                None => stats.invalid += 1,
            }
        }

        info!(
            count = tickers.len(),
            caret_filtered = stats.caret,
            non_common_filtered = stats.non_common,
            invalid_filtered = stats.invalid,
            "GitHub 티커 목록 조회 완료"
        );

        if tickers.is_empty() {
            return Err(DataError::FetchError(format!("{}: 유효한 티커가 없습니다", url)));
        }
        Ok(tickers)
    }
}

#[async_trait]
impl SourceProvider for GithubTickerSource {
    type Key = Ticker;
    type Attribute = ();
    type Error = DataError;

    fn name(&self) -> &str {
        "github:all_full_tickers"
    }

    async fn fetch_keys(&self) -> Result<SourceSet<Ticker>> {
        Ok(SourceSet::from_keys(self.fetch_tickers().await?))
    }
}

/// 거래소별 티커 목록 소스.
///
/// 부가 속성은 거래소 태그(`NASDAQ`, `NYSE`, `AMEX`)이며, 여러 거래소에 같은
/// 심볼이 있으면 먼저 나온 거래소가 남습니다.
#[derive(Clone)]
pub struct ExchangeTickerSource {
    client: reqwest::Client,
    base_url: String,
    exchanges: Vec<String>,
}

impl ExchangeTickerSource {
    /// 기본 거래소 목록.
    pub const DEFAULT_EXCHANGES: [&'static str; 3] = ["nasdaq", "nyse", "amex"];

    pub fn new(settings: &SourceSettings) -> Result<Self> {
        Self::with_base_url(
            &settings.github_raw_base_url,
            Duration::from_secs(settings.request_timeout_secs),
            &Self::DEFAULT_EXCHANGES,
        )
    }

    pub fn with_base_url(base_url: &str, timeout: Duration, exchanges: &[&str]) -> Result<Self> {
        Ok(Self {
            client: build_client(timeout, "ticker-sync", false)?,
            base_url: base_url.trim_end_matches('/').to_string(),
            exchanges: exchanges.iter().map(|e| e.to_lowercase()).collect(),
        })
    }
}

#[async_trait]
impl SourceProvider for ExchangeTickerSource {
    type Key = Ticker;
    type Attribute = String;
    type Error = DataError;

    fn name(&self) -> &str {
        "github:exchange_tickers"
    }

    async fn fetch_keys(&self) -> Result<SourceSet<Ticker, String>> {
        let mut set = SourceSet::new();

        for exchange in &self.exchanges {
            let url = format!("{}/{ex}/{ex}_tickers.json", self.base_url, ex = exchange);
            let symbols: Vec<String> = get_json(&self.client, &url).await?;
            let tag = exchange.to_uppercase();

            let mut added = 0;
            let mut skipped = 0;
            for symbol in &symbols {
                match normalize_symbol(symbol) {
                    Some(ticker) => {
                        if set.insert(ticker, Some(tag.clone())) {
                            added += 1;
                        }
                    }
                    None => skipped += 1,
                }
            }

            if added == 0 {
                warn!(exchange = %tag, "거래소 티커 목록이 비어 있음");
            }
            info!(exchange = %tag, total = symbols.len(), added, skipped, "거래소 티커 목록 조회 완료");
        }

        Ok(set)
    }
}
