//! SEC 회사 디렉토리 (`company_tickers.json`).
//!
//! 전체 파일을 프로세스당 한 번만 내려받아 메모리에서 티커/CIK 조회를 처리합니다.
//! SEC는 연락처가 포함된 User-Agent를 요구합니다.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use ticker_core::{Cik, SourceSettings, Ticker};
use ticker_sync::{SourceProvider, SourceSet};
use tokio::sync::OnceCell;
use tracing::{debug, info};

use super::github::GithubTickerSource;
use super::http::{build_client, get_json};
use crate::error::{DataError, Result};

/// 디렉토리 항목.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompanyEntry {
    pub cik: Cik,
    pub ticker: Ticker,
    pub title: String,
}

#[derive(Debug, Deserialize)]
struct RawEntry {
    cik_str: Cik,
    ticker: String,
    title: String,
}

/// 메모리 색인.
#[derive(Debug, Default)]
struct CompanyIndex {
    by_ticker: HashMap<Ticker, CompanyEntry>,
    by_cik: HashMap<Cik, CompanyEntry>,
}

impl CompanyIndex {
    fn build(raw: HashMap<String, RawEntry>) -> Self {
        // 원본 순서("0", "1", ...)대로 넣어 같은 CIK의 첫 항목이 남도록 함
        let mut rows: Vec<(u64, RawEntry)> = raw
            .into_iter()
            .map(|(idx, entry)| (idx.parse().unwrap_or(u64::MAX), entry))
            .collect();
        rows.sort_by_key(|(idx, _)| *idx);

        let mut index = Self::default();
        let mut skipped = 0usize;
        for (_, raw) in rows {
            let Ok(ticker) = Ticker::parse(&raw.ticker) else {
                skipped += 1;
                continue;
            };
            let entry = CompanyEntry {
                cik: raw.cik_str,
                ticker: ticker.clone(),
                title: raw.title.trim().to_string(),
            };
            index.by_cik.entry(entry.cik).or_insert_with(|| entry.clone());
            index.by_ticker.entry(ticker).or_insert(entry);
        }

        if skipped > 0 {
            debug!(skipped, "SEC 디렉토리에서 잘못된 티커 제외");
        }
        index
    }
}

/// SEC 회사 디렉토리 클라이언트.
pub struct SecCompanyDirectory {
    client: reqwest::Client,
    url: String,
    index: OnceCell<CompanyIndex>,
}

impl SecCompanyDirectory {
    /// 설정에서 생성합니다. 이메일이 없으면 설정 에러입니다.
    pub fn new(settings: &SourceSettings, user_email: &str) -> Result<Self> {
        Self::with_url(
            &settings.sec_company_tickers_url,
            user_email,
            Duration::from_secs(settings.request_timeout_secs),
        )
    }

    pub fn with_url(url: &str, user_email: &str, timeout: Duration) -> Result<Self> {
        let email = user_email.trim();
        if email.is_empty() {
            return Err(DataError::ConfigError(
                "SEC User-Agent에 사용할 이메일이 필요합니다".to_string(),
            ));
        }

        Ok(Self {
            client: build_client(timeout, &format!("ticker-sync {}", email), false)?,
            url: url.to_string(),
            index: OnceCell::new(),
        })
    }

    async fn index(&self) -> Result<&CompanyIndex> {
        self.index
            .get_or_try_init(|| async {
                info!(url = %self.url, "SEC 회사 디렉토리 조회");
                let raw: HashMap<String, RawEntry> = get_json(&self.client, &self.url).await?;
                let index = CompanyIndex::build(raw);
                if index.by_ticker.is_empty() {
                    return Err(DataError::FetchError(format!(
                        "{}: 회사 디렉토리가 비어 있습니다",
                        self.url
                    )));
                }
                info!(
                    tickers = index.by_ticker.len(),
                    ciks = index.by_cik.len(),
                    "SEC 회사 디렉토리 로드 완료"
                );
                Ok(index)
            })
            .await
    }

    /// 티커로 조회합니다.
    pub async fn by_ticker(&self, ticker: &Ticker) -> Result<Option<CompanyEntry>> {
        Ok(self.index().await?.by_ticker.get(ticker).cloned())
    }

    /// CIK로 조회합니다.
    pub async fn by_cik(&self, cik: Cik) -> Result<Option<CompanyEntry>> {
        Ok(self.index().await?.by_cik.get(&cik).cloned())
    }

    /// 여러 티커를 한 번에 조회합니다. 디렉토리에 없는 티커는 결과에 없습니다.
    pub async fn lookup_tickers(&self, tickers: &[Ticker]) -> Result<HashMap<Ticker, CompanyEntry>> {
        let index = self.index().await?;
        Ok(tickers
            .iter()
            .filter_map(|t| index.by_ticker.get(t).map(|e| (t.clone(), e.clone())))
            .collect())
    }

    /// 여러 CIK를 한 번에 조회합니다.
    pub async fn lookup_ciks(&self, ciks: &[Cik]) -> Result<HashMap<Cik, CompanyEntry>> {
        let index = self.index().await?;
        Ok(ciks
            .iter()
            .filter_map(|c| index.by_cik.get(c).map(|e| (*c, e.clone())))
            .collect())
    }
}

/// GitHub 티커 목록을 SEC 디렉토리로 변환한 CIK 소스.
pub struct SecCikSource {
    tickers: GithubTickerSource,
    directory: Arc<SecCompanyDirectory>,
}

impl SecCikSource {
    pub fn new(tickers: GithubTickerSource, directory: Arc<SecCompanyDirectory>) -> Self {
        Self { tickers, directory }
    }
}

#[async_trait]
impl SourceProvider for SecCikSource {
    type Key = Cik;
    type Attribute = ();
    type Error = DataError;

    fn name(&self) -> &str {
        "sec:company_tickers"
    }

    async fn fetch_keys(&self) -> Result<SourceSet<Cik>> {
        let tickers = self.tickers.fetch_tickers().await?;
        let resolved = self.directory.lookup_tickers(&tickers).await?;

        let mut set = SourceSet::new();
        let mut unresolved = 0usize;
        for ticker in &tickers {
            match resolved.get(ticker) {
                Some(entry) => {
                    set.insert(entry.cik, None);
                }
                None => {
                    unresolved += 1;
                    debug!(ticker = %ticker, "CIK 없음");
                }
            }
        }

        info!(
            tickers = tickers.len(),
            ciks = set.len(),
            unresolved,
            "티커 → CIK 변환 완료"
        );
        Ok(set)
    }
}
