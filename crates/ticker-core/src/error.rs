//! 동기화 시스템의 공통 에러 타입.

use std::fmt;

use thiserror::Error;

/// 핵심 에러.
#[derive(Debug, Error)]
pub enum TickerError {
    /// 설정 에러
    #[error("설정 에러: {0}")]
    Config(String),

    /// 필드 검증 실패
    #[error("검증 에러 ({field}={value}): {message}")]
    Validation {
        field: &'static str,
        value: String,
        message: String,
    },

    /// 잘못된 키 (티커, CIK)
    #[error("잘못된 키: {0}")]
    InvalidKey(String),

    /// 직렬화 에러
    #[error("직렬화 에러: {0}")]
    Serialization(String),
}

/// 핵심 작업을 위한 Result 타입.
pub type TickerResult<T> = Result<T, TickerError>;

impl TickerError {
    /// 검증 에러를 생성합니다.
    pub fn validation(
        field: &'static str,
        value: impl fmt::Display,
        message: impl Into<String>,
    ) -> Self {
        TickerError::Validation {
            field,
            value: value.to_string(),
            message: message.into(),
        }
    }

    /// 데이터 자체의 문제인지 확인합니다 (재시도해도 결과가 같음).
    pub fn is_data_error(&self) -> bool {
        matches!(
            self,
            TickerError::Validation { .. } | TickerError::InvalidKey(_)
        )
    }
}

impl From<serde_json::Error> for TickerError {
    fn from(err: serde_json::Error) -> Self {
        TickerError::Serialization(err.to_string())
    }
}

impl From<config::ConfigError> for TickerError {
    fn from(err: config::ConfigError) -> Self {
        TickerError::Config(err.to_string())
    }
}
