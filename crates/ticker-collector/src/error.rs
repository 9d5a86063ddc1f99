//! 에러 타입 정의.

use thiserror::Error;
use ticker_core::TickerError;
use ticker_data::DataError;
use ticker_sync::{BoxError, SyncError};

/// Collector 에러 타입
#[derive(Debug, Error)]
pub enum CollectorError {
    /// 설정 에러
    #[error("Configuration error: {0}")]
    Config(#[from] TickerError),

    /// 외부 소스/데이터베이스 연결 에러
    #[error("Data error: {0}")]
    Data(#[from] DataError),

    /// 동기화 실행 에러
    #[error("Sync error: {0}")]
    Sync(#[from] SyncError),

    /// 저장소 직접 호출 에러 (연결 확인, 스냅샷, 행 수)
    #[error("Repository error: {0}")]
    Repository(#[source] BoxError),
}

impl CollectorError {
    pub fn repository<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Repository(Box::new(err))
    }
}

/// Result 타입 별칭
pub type Result<T> = std::result::Result<T, CollectorError>;
