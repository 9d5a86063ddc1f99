//! 동기화 엔진 에러 타입.
//!
//! 키 단위 조회 실패는 에러가 아니라 [`crate::FailureReason`] 데이터로 다룹니다.
//! 여기 정의된 에러는 모두 실행을 중단시킵니다.

use std::fmt;

use thiserror::Error;

/// 협력 객체(소스, 저장소) 에러를 담는 박스 타입.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// 저장소 작업 종류.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersistOperation {
    Load,
    Insert,
    Update,
    Delete,
    Count,
}

impl fmt::Display for PersistOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PersistOperation::Load => "get_all",
            PersistOperation::Insert => "bulk_insert",
            PersistOperation::Update => "bulk_update",
            PersistOperation::Delete => "bulk_delete",
            PersistOperation::Count => "count",
        };
        f.write_str(name)
    }
}

/// 동기화 실행 에러.
#[derive(Debug, Error)]
pub enum SyncError {
    /// 소스 전체 조회 실패
    #[error("소스 조회 실패: {0}")]
    Source(#[source] BoxError),

    /// 저장소 작업 실패
    #[error("저장소 {operation} 실패 (배치 {batch}): {source}")]
    Persistence {
        operation: PersistOperation,
        batch: usize,
        #[source]
        source: BoxError,
    },

    /// 저장소 스냅샷 불일치
    #[error("인덱스 에러: {0}")]
    Index(String),

    /// 설정 에러
    #[error("설정 에러: {0}")]
    Config(String),
}

/// 동기화 작업을 위한 Result 타입.
pub type SyncResult<T> = Result<T, SyncError>;

impl SyncError {
    /// 소스 에러로 감쌉니다.
    pub fn source_failed<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        SyncError::Source(Box::new(err))
    }

    /// 저장소 에러로 감쌉니다.
    pub fn persistence<E>(operation: PersistOperation, batch: usize, err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        SyncError::Persistence {
            operation,
            batch,
            source: Box::new(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Error)]
    #[error("connection reset")]
    struct Reset;

    #[test]
    fn test_persistence_message() {
        let err = SyncError::persistence(PersistOperation::Insert, 3, Reset);
        assert_eq!(
            err.to_string(),
            "저장소 bulk_insert 실패 (배치 3): connection reset"
        );
        assert!(std::error::Error::source(&err).is_some());
    }
}
