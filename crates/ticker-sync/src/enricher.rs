//! 배치 조회 어댑터와 재시도/폴백 드라이버.
//!
//! 키 단위 실패는 [`FailureReason`]으로 표현되는 정상적인 결과입니다.
//! 배치 호출 전체가 실패하면 재시도 후 키 단위 개별 조회로 전환하며,
//! 개별 조회까지 실패한 키는 [`FailureReason::Transport`]가 됩니다.

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use ticker_core::RecordKey;
use tracing::{debug, warn};

/// 키 단위 조회 실패 사유.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum FailureReason {
    /// 외부 서비스가 모르는 키
    UnknownKey,
    /// 응답에 포함된 구조화된 에러 객체
    ApiError { code: String, message: String },
    /// 필수 필드 없음 (또는 NaN/무한대)
    MissingField(String),
    /// 양수여야 하는 필드가 0 이하
    NonPositive { field: String, value: String },
    /// 응답에 해당 키 데이터 없음
    NoData,
    /// 검증/정규화 실패
    Invalid(String),
    /// 개별 조회까지 실패한 전송 에러
    Transport(String),
}

impl FailureReason {
    pub fn missing(field: impl Into<String>) -> Self {
        FailureReason::MissingField(field.into())
    }

    pub fn non_positive(field: impl Into<String>, value: impl fmt::Display) -> Self {
        FailureReason::NonPositive {
            field: field.into(),
            value: value.to_string(),
        }
    }

    pub fn api_error(code: impl Into<String>, message: impl Into<String>) -> Self {
        FailureReason::ApiError {
            code: code.into(),
            message: message.into(),
        }
    }

    /// 집계용 짧은 이름.
    pub fn kind(&self) -> &'static str {
        match self {
            FailureReason::UnknownKey => "unknown_key",
            FailureReason::ApiError { .. } => "api_error",
            FailureReason::MissingField(_) => "missing_field",
            FailureReason::NonPositive { .. } => "non_positive",
            FailureReason::NoData => "no_data",
            FailureReason::Invalid(_) => "invalid",
            FailureReason::Transport(_) => "transport",
        }
    }
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureReason::UnknownKey => write!(f, "알 수 없는 키"),
            FailureReason::ApiError { code, message } => write!(f, "API 에러 [{}]: {}", code, message),
            FailureReason::MissingField(field) => write!(f, "필수 필드 없음: {}", field),
            FailureReason::NonPositive { field, value } => {
                write!(f, "{} 값이 양수가 아님: {}", field, value)
            }
            FailureReason::NoData => write!(f, "데이터 없음"),
            FailureReason::Invalid(message) => write!(f, "검증 실패: {}", message),
            FailureReason::Transport(message) => write!(f, "전송 실패: {}", message),
        }
    }
}

/// 키 단위 조회 결과.
pub type Lookup<S> = Result<S, FailureReason>;

/// 외부 API를 감싸는 배치 조회기.
///
/// 배치 내부의 병렬 처리는 구현의 몫이며 엔진은 배치 결과만 봅니다.
#[async_trait]
pub trait RecordEnricher: Send + Sync {
    type Key: RecordKey;
    /// 조회 결과 (SourceRecord)
    type Record: Send + 'static;
    /// 배치 전체 실패 (네트워크 등)
    type Error: std::error::Error + Send + Sync + 'static;

    /// 키 목록을 조회합니다. 키 단위 실패는 에러가 아니라 `Err(FailureReason)` 항목입니다.
    async fn lookup_batch(
        &self,
        keys: &[Self::Key],
    ) -> Result<HashMap<Self::Key, Lookup<Self::Record>>, Self::Error>;

    /// 키 하나를 조회합니다 (배치 실패 시 폴백).
    async fn lookup_one(&self, key: &Self::Key) -> Result<Lookup<Self::Record>, Self::Error> {
        let mut results = self.lookup_batch(std::slice::from_ref(key)).await?;
        Ok(results.remove(key).unwrap_or(Err(FailureReason::NoData)))
    }
}

#[async_trait]
impl<'a, T: RecordEnricher + ?Sized> RecordEnricher for &'a T {
    type Key = T::Key;
    type Record = T::Record;
    type Error = T::Error;

    async fn lookup_batch(
        &self,
        keys: &[Self::Key],
    ) -> Result<HashMap<Self::Key, Lookup<Self::Record>>, Self::Error> {
        (**self).lookup_batch(keys).await
    }

    async fn lookup_one(&self, key: &Self::Key) -> Result<Lookup<Self::Record>, Self::Error> {
        (**self).lookup_one(key).await
    }
}

/// 배치 조회 재시도 정책.
///
/// n번째 시도가 실패하면 `backoff × n`만큼 기다린 뒤 다시 시도합니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff: Duration::from_millis(500),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, backoff: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff,
        }
    }

    /// 재시도 없이 한 번만 시도합니다.
    pub fn none() -> Self {
        Self::new(1, Duration::ZERO)
    }

    /// 작업을 정책에 따라 실행합니다.
    pub async fn run<T, E, F, Fut>(&self, operation: &str, mut f: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: fmt::Display,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            match f().await {
                Ok(value) => return Ok(value),
                Err(e) if attempt < max_attempts => {
                    warn!(
                        operation,
                        attempt,
                        max_attempts,
                        error = %e,
                        "조회 실패, 재시도"
                    );
                    tokio::time::sleep(self.backoff.saturating_mul(attempt)).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

/// 한 배치의 조회 결과 (요청한 키 순서).
#[derive(Debug)]
pub struct EnrichedBatch<K, S> {
    pub results: Vec<(K, Lookup<S>)>,
    /// 개별 조회 폴백을 사용했는지
    pub used_fallback: bool,
}

/// 배치를 조회합니다. 이 함수는 실패하지 않습니다.
///
/// 응답에 없는 키는 [`FailureReason::NoData`], 요청하지 않은 키는 무시됩니다.
/// 배치 응답 안에서 [`FailureReason::Transport`]로 온 키는 개별 조회로 다시 시도합니다.
pub async fn enrich_batch<E>(
    enricher: &E,
    keys: &[E::Key],
    retry: &RetryPolicy,
) -> EnrichedBatch<E::Key, E::Record>
where
    E: RecordEnricher + ?Sized,
{
    match retry.run("lookup_batch", || enricher.lookup_batch(keys)).await {
        Ok(mut found) => {
            let mut results = Vec::with_capacity(keys.len());
            let mut used_fallback = false;
            for key in keys {
                let lookup = match found.remove(key) {
                    // 배치 안의 키 단위 전송 실패도 개별 조회로 재시도
                    Some(Err(FailureReason::Transport(message))) => {
                        debug!(key = %key, error = %message, "키 단위 전송 실패, 개별 조회");
                        used_fallback = true;
                        lookup_single(enricher, key, retry).await
                    }
                    Some(lookup) => lookup,
                    None => Err(FailureReason::NoData),
                };
                results.push((key.clone(), lookup));
            }

            if !found.is_empty() {
                debug!(extra = found.len(), "요청하지 않은 키 무시");
            }

            EnrichedBatch {
                results,
                used_fallback,
            }
        }
        Err(e) => {
            warn!(
                error = %e,
                keys = keys.len(),
                "배치 조회 실패, 개별 조회로 전환"
            );

            let mut results = Vec::with_capacity(keys.len());
            for key in keys {
                results.push((key.clone(), lookup_single(enricher, key, retry).await));
            }

            EnrichedBatch {
                results,
                used_fallback: true,
            }
        }
    }
}

/// 키 하나를 재시도 정책에 따라 조회합니다.
///
/// 호출 에러와 `Transport` 결과는 재시도 대상이고, 마지막 시도까지 실패하면
/// [`FailureReason::Transport`]가 됩니다.
async fn lookup_single<E>(enricher: &E, key: &E::Key, retry: &RetryPolicy) -> Lookup<E::Record>
where
    E: RecordEnricher + ?Sized,
{
    let outcome = retry
        .run("lookup_one", || async {
            match enricher.lookup_one(key).await {
                Ok(Err(FailureReason::Transport(message))) => Err(message),
                Ok(lookup) => Ok(lookup),
                Err(e) => Err(e.to_string()),
            }
        })
        .await;

    outcome.unwrap_or_else(|message| {
        debug!(key = %key, error = %message, "개별 조회 실패");
        Err(FailureReason::Transport(message))
    })
}
