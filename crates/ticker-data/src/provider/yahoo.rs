//! Yahoo Finance quoteSummary 클라이언트.
//!
//! Yahoo는 쿠키와 crumb가 없는 요청을 거부하므로, 먼저 쿠키 발급 URL을 방문한 뒤
//! `/v1/test/getcrumb`로 crumb를 받아 프로세스 동안 재사용합니다.
//!
//! # 에러 구분
//!
//! - 심볼 단위 실패 (404, 응답 본문의 `error` 객체): [`YahooError::NotFound`], [`YahooError::Api`]
//! - 배치 전체 실패 (crumb 발급 실패, HTTP 429): [`DataError`]

use std::time::Duration;

use futures::stream::{self, StreamExt};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::{Map, Value};
use thiserror::Error;
use ticker_core::{SourceSettings, Ticker};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::http::{build_client, BROWSER_USER_AGENT};
use crate::error::{DataError, Result};

/// 심볼 단위 조회 에러.
#[derive(Debug, Error)]
pub enum YahooError {
    /// 존재하지 않는 심볼
    #[error("Symbol not found: {0}")]
    NotFound(String),

    /// 응답 본문의 구조화된 에러 객체
    #[error("Yahoo API error [{code}]: {message}")]
    Api { code: String, message: String },

    /// 전송/파싱 실패
    #[error(transparent)]
    Transport(#[from] DataError),
}

impl YahooError {
    /// 배치 전체를 중단해야 하는 에러인지 (요청 제한).
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, YahooError::Transport(DataError::RateLimited(_)))
    }
}

#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(rename = "quoteSummary")]
    quote_summary: Body,
}

#[derive(Debug, Deserialize)]
struct Body {
    #[serde(default)]
    result: Option<Vec<Map<String, Value>>>,
    #[serde(default)]
    error: Option<ErrorObject>,
}

/// `{"code": "Not Found", "description": ...}` 또는
/// `{"code": 404, "type": "NotFoundError", "message": ...}`
#[derive(Debug, Deserialize)]
struct ErrorObject {
    #[serde(default)]
    code: Option<Value>,
    #[serde(default, rename = "type")]
    kind: Option<String>,
    #[serde(default, alias = "description")]
    message: Option<String>,
}

impl ErrorObject {
    fn into_error(self, symbol: &str) -> YahooError {
        let code = match self.code {
            Some(Value::String(s)) => s,
            Some(Value::Number(n)) => n.to_string(),
            _ => "unknown".to_string(),
        };
        let not_found = code.eq_ignore_ascii_case("Not Found")
            || code == "404"
            || self.kind.as_deref() == Some("NotFoundError");
        if not_found {
            return YahooError::NotFound(symbol.to_string());
        }

        let message = self.message.or(self.kind).unwrap_or_default();
        YahooError::Api { code, message }
    }
}

/// 한 심볼의 quoteSummary 모듈 묶음.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QuoteSummary {
    modules: Map<String, Value>,
}

impl QuoteSummary {
    pub fn new(modules: Map<String, Value>) -> Self {
        Self { modules }
    }

    /// 모듈이 있고 비어 있지 않으면 true.
    pub fn has_module(&self, module: &str) -> bool {
        self.module(module).is_some_and(|m| !m.is_empty())
    }

    fn module(&self, module: &str) -> Option<&Map<String, Value>> {
        self.modules.get(module).and_then(Value::as_object)
    }

    fn field(&self, module: &str, field: &str) -> Option<&Value> {
        self.module(module)?.get(field).filter(|v| !v.is_null())
    }

    /// 숫자 필드. `{"raw": 1.5, "fmt": "1.50"}`와 `1.5` 형식을 모두 받습니다.
    /// 빈 객체, NaN, 무한대는 `None`입니다.
    pub fn number(&self, module: &str, field: &str) -> Option<f64> {
        let value = self.field(module, field)?;
        let raw = match value {
            Value::Object(obj) => obj.get("raw")?,
            other => other,
        };
        raw.as_f64().filter(|v| v.is_finite())
    }

    /// 정수 필드 (시가총액 등). 소수는 버립니다.
    pub fn integer(&self, module: &str, field: &str) -> Option<i64> {
        let value = self.field(module, field)?;
        let raw = match value {
            Value::Object(obj) => obj.get("raw")?,
            other => other,
        };
        raw.as_i64()
            .or_else(|| raw.as_f64().filter(|v| v.is_finite()).map(|v| v as i64))
    }

    /// 문자열 필드 (공백뿐인 값은 `None`).
    pub fn text(&self, module: &str, field: &str) -> Option<&str> {
        self.field(module, field)?
            .as_str()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

/// Yahoo Finance 클라이언트.
pub struct YahooClient {
    client: Client,
    base_url: String,
    cookie_url: String,
    crumb: Mutex<Option<String>>,
}

impl YahooClient {
    pub fn new(settings: &SourceSettings) -> Result<Self> {
        Self::with_urls(
            &settings.yahoo_base_url,
            &settings.yahoo_cookie_url,
            Duration::from_secs(settings.request_timeout_secs),
        )
    }

    pub fn with_urls(base_url: &str, cookie_url: &str, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: build_client(timeout, BROWSER_USER_AGENT, true)?,
            base_url: base_url.trim_end_matches('/').to_string(),
            cookie_url: cookie_url.to_string(),
            crumb: Mutex::new(None),
        })
    }

    /// 캐시된 crumb를 반환하고, 없으면 쿠키/crumb 핸드셰이크를 수행합니다.
    pub async fn crumb(&self) -> Result<String> {
        let mut cached = self.crumb.lock().await;
        if let Some(crumb) = cached.as_ref() {
            return Ok(crumb.clone());
        }

        // 쿠키 발급 응답은 보통 404이므로 상태는 보지 않음
        if let Err(e) = self.client.get(&self.cookie_url).send().await {
            warn!(url = %self.cookie_url, error = %e, "Yahoo 쿠키 요청 실패");
        }

        let url = format!("{}/v1/test/getcrumb", self.base_url);
        let response = self.client.get(&url).send().await?;
        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(DataError::RateLimited(url));
        }
        if !status.is_success() {
            return Err(DataError::FetchError(format!("{}: HTTP {}", url, status)));
        }

        let crumb = response.text().await?.trim().to_string();
        if crumb.is_empty() || crumb.contains('<') || crumb.contains(' ') {
            return Err(DataError::ParseError(format!("{}: 유효하지 않은 crumb", url)));
        }

        info!("Yahoo crumb 발급 완료");
        *cached = Some(crumb.clone());
        Ok(crumb)
    }

    async fn reset_crumb(&self) {
        *self.crumb.lock().await = None;
    }

    /// 한 심볼의 quoteSummary를 조회합니다.
    pub async fn quote_summary(
        &self,
        symbol: &Ticker,
        modules: &[&str],
    ) -> std::result::Result<QuoteSummary, YahooError> {
        let crumb = self.crumb().await?;
        let url = format!("{}/v10/finance/quoteSummary/{}", self.base_url, symbol);

        let response = self
            .client
            .get(&url)
            .query(&[("modules", modules.join(",")), ("crumb", crumb)])
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(DataError::from)?;

        let status = response.status();
        match status {
            StatusCode::TOO_MANY_REQUESTS => {
                return Err(DataError::RateLimited(symbol.to_string()).into());
            }
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                self.reset_crumb().await;
                return Err(DataError::FetchError(format!("{}: HTTP {}", url, status)).into());
            }
            _ => {}
        }

        let text = response.text().await.map_err(DataError::from)?;
        let envelope: Option<Envelope> = serde_json::from_str(&text).ok();

        if status == StatusCode::NOT_FOUND {
            return Err(envelope
                .and_then(|e| e.quote_summary.error)
                .map(|e| e.into_error(symbol.as_str()))
                .unwrap_or_else(|| YahooError::NotFound(symbol.to_string())));
        }
        if !status.is_success() {
            return Err(DataError::FetchError(format!("{}: HTTP {}", url, status)).into());
        }

        let envelope = envelope
            .ok_or_else(|| DataError::ParseError(format!("{}: quoteSummary 응답 형식 오류", url)))?;
        if let Some(error) = envelope.quote_summary.error {
            return Err(error.into_error(symbol.as_str()));
        }

        envelope
            .quote_summary
            .result
            .and_then(|mut r| if r.is_empty() { None } else { Some(r.swap_remove(0)) })
            .map(QuoteSummary::new)
            .ok_or_else(|| YahooError::NotFound(symbol.to_string()))
    }

    /// 여러 심볼을 최대 `max_workers`개씩 동시에 조회합니다.
    ///
    /// crumb 발급 실패나 요청 제한은 배치 전체 에러이고,
    /// 나머지는 심볼별 결과로 돌려줍니다. 결과 순서는 입력 순서와 같지 않습니다.
    pub async fn quote_summaries(
        &self,
        symbols: &[Ticker],
        modules: &[&str],
        max_workers: usize,
    ) -> Result<Vec<(Ticker, std::result::Result<QuoteSummary, YahooError>)>> {
        self.crumb().await?;

        let requests: Vec<_> = symbols
            .iter()
            .map(|symbol| async move {
                let result = self.quote_summary(symbol, modules).await;
                (symbol.clone(), result)
            })
            .collect();

        let results: Vec<_> = stream::iter(requests)
            .buffer_unordered(max_workers.max(1))
            .collect()
            .await;

        if let Some((symbol, _)) = results.iter().find(|(_, r)| matches!(r, Err(e) if e.is_rate_limited())) {
            warn!(symbol = %symbol, "Yahoo 요청 제한, 배치 중단");
            return Err(DataError::RateLimited(format!("quoteSummary {}", symbol)));
        }

        let failed = results.iter().filter(|(_, r)| r.is_err()).count();
        debug!(requested = symbols.len(), failed, "quoteSummary 배치 조회 완료");
        Ok(results)
    }
}
