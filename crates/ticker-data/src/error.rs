//! 저장소와 외부 소스 오류.

use thiserror::Error;

/// 저장소/HTTP 클라이언트 공용 오류.
#[derive(Debug, Error)]
pub enum DataError {
    /// 풀 생성 또는 연결 획득 실패
    #[error("Database connection error: {0}")]
    ConnectionError(String),

    /// SELECT/COUNT 실패
    #[error("Query error: {0}")]
    QueryError(String),

    /// 행 없음
    #[error("Record not found: {0}")]
    NotFound(String),

    /// UNNEST INSERT 실패 (트랜잭션 롤백됨)
    #[error("Insert error: {0}")]
    InsertError(String),

    /// UNNEST UPDATE 실패 (트랜잭션 롤백됨)
    #[error("Update error: {0}")]
    UpdateError(String),

    /// DELETE 또는 비활성화 실패
    #[error("Delete error: {0}")]
    DeleteError(String),

    /// GitHub/SEC/Yahoo 요청 실패 또는 비정상 상태 코드
    #[error("Fetch error: {0}")]
    FetchError(String),

    /// 응답 본문 또는 저장된 행 해석 실패
    #[error("Parse error: {0}")]
    ParseError(String),

    /// HTTP 429
    #[error("Rate limited: {0}")]
    RateLimited(String),

    /// 잘못된 클라이언트 설정 (User-Agent 이메일 누락 등)
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Migration error: {0}")]
    MigrationError(String),
}

impl From<sqlx::Error> for DataError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DataError::NotFound("Row not found".to_string()),
            sqlx::Error::PoolTimedOut => {
                DataError::ConnectionError("Connection pool exhausted".to_string())
            }
            sqlx::Error::Database(db_err) => DataError::QueryError(db_err.message().to_string()),
            _ => DataError::QueryError(err.to_string()),
        }
    }
}

impl From<reqwest::Error> for DataError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            DataError::ParseError(err.to_string())
        } else {
            DataError::FetchError(err.to_string())
        }
    }
}

impl From<serde_json::Error> for DataError {
    fn from(err: serde_json::Error) -> Self {
        DataError::ParseError(err.to_string())
    }
}

impl From<ticker_core::TickerError> for DataError {
    fn from(err: ticker_core::TickerError) -> Self {
        match err {
            ticker_core::TickerError::Config(msg) => DataError::ConfigError(msg),
            other => DataError::ParseError(other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, DataError>;
