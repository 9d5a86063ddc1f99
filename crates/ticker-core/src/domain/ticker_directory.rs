//! 티커 ↔ CIK 디렉토리 테이블.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::record::{ensure_ticker_len, SourceRecord, SyncRecord};
use crate::error::{TickerError, TickerResult};
use crate::types::{Cik, Ticker};

/// 디렉토리/요약/개요 테이블의 티커 컬럼 길이.
pub const SHORT_TICKER_LEN: usize = 7;

/// 디렉토리 행 상태.
///
/// 소스에서 사라진 티커는 삭제되지 않고 `Inactive`로 표시됩니다.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DirectoryStatus {
    #[default]
    Active,
    Inactive,
}

impl DirectoryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DirectoryStatus::Active => "active",
            DirectoryStatus::Inactive => "inactive",
        }
    }
}

impl fmt::Display for DirectoryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DirectoryStatus {
    type Err = TickerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "active" => Ok(Self::Active),
            "inactive" => Ok(Self::Inactive),
            _ => Err(TickerError::validation("status", s, "Unknown directory status")),
        }
    }
}

/// `ticker_directory` 테이블 행.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickerDirectory {
    /// 자동 증가 ID
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub ticker: Ticker,
    pub cik: Cik,
    pub status: DirectoryStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_updated_at: Option<DateTime<Utc>>,
}

impl TickerDirectory {
    /// 활성 상태의 새 디렉토리 행을 생성합니다.
    pub fn active(ticker: Ticker, cik: Cik) -> TickerResult<Self> {
        let row = Self {
            id: None,
            ticker,
            cik,
            status: DirectoryStatus::Active,
            created_at: None,
            last_updated_at: None,
        };
        row.validate()?;
        Ok(row)
    }

    pub fn validate(&self) -> TickerResult<()> {
        ensure_ticker_len(&self.ticker, SHORT_TICKER_LEN)?;
        if let Some(id) = self.id {
            if id <= 0 {
                return Err(TickerError::validation("id", id, "ID must be a positive integer"));
            }
        }
        Ok(())
    }

    pub fn is_active(&self) -> bool {
        self.status == DirectoryStatus::Active
    }
}

impl SyncRecord for TickerDirectory {
    type Key = Ticker;

    fn key(&self) -> Ticker {
        self.ticker.clone()
    }

    fn differs_from(&self, other: &Self) -> bool {
        self.cik != other.cik || self.status != other.status
    }
}

/// SEC 디렉토리에서 확인한 티커의 CIK.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryListing {
    pub ticker: Ticker,
    pub cik: Cik,
}

impl SourceRecord for DirectoryListing {
    type Store = TickerDirectory;

    fn into_store_record(self, _attribute: Option<&()>) -> TickerResult<TickerDirectory> {
        TickerDirectory::active(self.ticker, self.cik)
    }
}
