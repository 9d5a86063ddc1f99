//! CIK → 회사명 조회 테이블.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::record::{SourceRecord, SyncRecord};
use crate::error::{TickerError, TickerResult};
use crate::types::Cik;

/// 회사명 최대 길이.
pub const MAX_COMPANY_NAME_LEN: usize = 255;

/// `cik_lookup` 테이블 행.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CikLookup {
    /// SEC CIK (기본 키)
    pub cik: Cik,
    /// 회사명
    pub company_name: String,
    /// 생성 시각 (저장소가 할당)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    /// 마지막 수정 시각 (저장소가 할당)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_updated_at: Option<DateTime<Utc>>,
}

impl CikLookup {
    /// 회사명을 정리하고 검증하여 생성합니다.
    pub fn new(cik: Cik, company_name: impl AsRef<str>) -> TickerResult<Self> {
        let lookup = Self {
            cik,
            company_name: company_name.as_ref().trim().to_string(),
            created_at: None,
            last_updated_at: None,
        };
        lookup.validate()?;
        Ok(lookup)
    }

    /// 필드를 검증합니다.
    pub fn validate(&self) -> TickerResult<()> {
        if self.company_name.is_empty() {
            return Err(TickerError::validation(
                "company_name",
                &self.company_name,
                "Company name cannot be empty",
            ));
        }
        if self.company_name.chars().count() > MAX_COMPANY_NAME_LEN {
            return Err(TickerError::validation(
                "company_name",
                &self.company_name,
                "Company name cannot be longer than 255 characters",
            ));
        }
        Ok(())
    }
}

impl SyncRecord for CikLookup {
    type Key = Cik;

    fn key(&self) -> Cik {
        self.cik
    }

    fn differs_from(&self, other: &Self) -> bool {
        self.company_name != other.company_name
    }
}

/// SEC 디렉토리에서 조회한 회사명.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompanyName {
    pub cik: Cik,
    pub name: String,
}

impl SourceRecord for CompanyName {
    type Store = CikLookup;

    fn into_store_record(self, _attribute: Option<&()>) -> TickerResult<CikLookup> {
        CikLookup::new(self.cik, self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cik(n: i64) -> Cik {
        Cik::new(n).unwrap()
    }

    #[test]
    fn test_company_name_trimmed() {
        let lookup = CikLookup::new(cik(320193), "  Apple Inc.  ").unwrap();
        assert_eq!(lookup.company_name, "Apple Inc.");
    }

    #[test]
    fn test_company_name_rejects_empty_and_long() {
        assert!(CikLookup::new(cik(1), "   ").is_err());
        assert!(CikLookup::new(cik(1), "A".repeat(256)).is_err());
        assert!(CikLookup::new(cik(1), "A".repeat(255)).is_ok());
    }

    #[test]
    fn test_differs_ignores_timestamps() {
        let a = CikLookup::new(cik(1), "Acme").unwrap();
        let mut b = a.clone();
        b.created_at = Some(Utc::now());
        assert!(!a.differs_from(&b));

        b.company_name = "Acme Corp".to_string();
        assert!(a.differs_from(&b));
    }
}
