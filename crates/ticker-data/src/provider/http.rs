//! 공용 HTTP 헬퍼.

use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;

use crate::error::{DataError, Result};

/// 브라우저 User-Agent (Yahoo는 기본 UA를 거부함).
pub(crate) const BROWSER_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// 타임아웃과 User-Agent를 지정한 클라이언트를 생성합니다.
pub(crate) fn build_client(timeout: Duration, user_agent: &str, cookies: bool) -> Result<Client> {
    Client::builder()
        .timeout(timeout)
        .user_agent(user_agent)
        .cookie_store(cookies)
        .build()
        .map_err(|e| DataError::ConfigError(format!("HTTP 클라이언트 생성 실패: {}", e)))
}

/// GET 요청 후 JSON 본문을 역직렬화합니다.
///
/// HTTP 429는 [`DataError::RateLimited`], 그 밖의 실패 상태는 [`DataError::FetchError`]입니다.
pub(crate) async fn get_json<T: DeserializeOwned>(client: &Client, url: &str) -> Result<T> {
    let response = client
        .get(url)
        .header("Accept", "application/json")
        .send()
        .await?;

    let status = response.status();
    if status == StatusCode::TOO_MANY_REQUESTS {
        return Err(DataError::RateLimited(url.to_string()));
    }
    if !status.is_success() {
        return Err(DataError::FetchError(format!("{}: HTTP {}", url, status)));
    }

    let body = response.text().await?;
    serde_json::from_str(&body).map_err(|e| DataError::ParseError(format!("{}: {}", url, e)))
}
