//! `cik_lookup` 테이블 repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use ticker_core::{Cik, CikLookup};
use ticker_sync::Repository;
use tracing::{debug, instrument};

use super::{Database, UNNEST_CHUNK_SIZE};
use crate::error::{DataError, Result};

/// CIK 조회 데이터베이스 레코드.
#[derive(Debug, Clone, FromRow)]
pub struct CikLookupRecord {
    pub cik: i64,
    pub company_name: String,
    pub created_at: Option<DateTime<Utc>>,
    pub last_updated_at: Option<DateTime<Utc>>,
}

impl TryFrom<CikLookupRecord> for CikLookup {
    type Error = DataError;

    fn try_from(row: CikLookupRecord) -> Result<Self> {
        let mut record = CikLookup::new(Cik::new(row.cik)?, &row.company_name)?;
        record.created_at = row.created_at;
        record.last_updated_at = row.last_updated_at;
        Ok(record)
    }
}

/// CIK → 회사명 repository.
#[derive(Clone)]
pub struct CikLookupRepository {
    db: Database,
}

impl CikLookupRepository {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// 회사명으로 검색합니다 (대소문자 무시, 부분 일치).
    pub async fn search_by_company_name(&self, pattern: &str, limit: i64) -> Result<Vec<CikLookup>> {
        let rows: Vec<CikLookupRecord> = sqlx::query_as(
            r#"
            SELECT cik, company_name, created_at, last_updated_at
            FROM cik_lookup
            WHERE LOWER(company_name) LIKE LOWER($1)
            ORDER BY company_name
            LIMIT $2
            "#,
        )
        .bind(format!("%{}%", pattern))
        .bind(limit)
        .fetch_all(self.db.pool())
        .await?;

        rows.into_iter().map(CikLookup::try_from).collect()
    }
}

#[async_trait]
impl Repository for CikLookupRepository {
    type Record = CikLookup;
    type Error = DataError;

    #[instrument(skip(self))]
    async fn get_all(&self) -> Result<Vec<CikLookup>> {
        let rows: Vec<CikLookupRecord> = sqlx::query_as(
            "SELECT cik, company_name, created_at, last_updated_at FROM cik_lookup ORDER BY cik",
        )
        .fetch_all(self.db.pool())
        .await?;

        rows.into_iter().map(CikLookup::try_from).collect()
    }

    #[instrument(skip(self, records), fields(count = records.len()))]
    async fn bulk_insert(&self, records: &[CikLookup]) -> Result<u64> {
        if records.is_empty() {
            return Ok(0);
        }

        let mut tx = self.db.pool().begin().await?;
        let mut inserted = 0;

        for chunk in records.chunks(UNNEST_CHUNK_SIZE) {
            let ciks: Vec<i64> = chunk.iter().map(|r| r.cik.value()).collect();
            let names: Vec<&str> = chunk.iter().map(|r| r.company_name.as_str()).collect();

            let result = sqlx::query(
                r#"
                INSERT INTO cik_lookup (cik, company_name, created_at, last_updated_at)
                SELECT t.cik, t.company_name, NOW(), NOW()
                FROM UNNEST($1::bigint[], $2::text[]) AS t(cik, company_name)
                "#,
            )
            .bind(&ciks)
            .bind(&names)
            .execute(&mut *tx)
            .await
            .map_err(|e| DataError::InsertError(e.to_string()))?;

            inserted += result.rows_affected();
        }

        tx.commit().await?;
        debug!(inserted, "cik_lookup 추가");
        Ok(inserted)
    }

    #[instrument(skip(self, records), fields(count = records.len()))]
    async fn bulk_update(&self, records: &[CikLookup]) -> Result<u64> {
        if records.is_empty() {
            return Ok(0);
        }

        let mut tx = self.db.pool().begin().await?;
        let mut updated = 0;

        for chunk in records.chunks(UNNEST_CHUNK_SIZE) {
            let ciks: Vec<i64> = chunk.iter().map(|r| r.cik.value()).collect();
            let names: Vec<&str> = chunk.iter().map(|r| r.company_name.as_str()).collect();

            let result = sqlx::query(
                r#"
                UPDATE cik_lookup AS c
                SET company_name = t.company_name, last_updated_at = NOW()
                FROM UNNEST($1::bigint[], $2::text[]) AS t(cik, company_name)
                WHERE c.cik = t.cik
                "#,
            )
            .bind(&ciks)
            .bind(&names)
            .execute(&mut *tx)
            .await
            .map_err(|e| DataError::UpdateError(e.to_string()))?;

            updated += result.rows_affected();
        }

        tx.commit().await?;
        debug!(updated, "cik_lookup 갱신");
        Ok(updated)
    }

    #[instrument(skip(self, keys), fields(count = keys.len()))]
    async fn bulk_delete(&self, keys: &[Cik]) -> Result<u64> {
        if keys.is_empty() {
            return Ok(0);
        }

        let ciks: Vec<i64> = keys.iter().map(Cik::value).collect();
        let result = sqlx::query("DELETE FROM cik_lookup WHERE cik = ANY($1)")
            .bind(&ciks)
            .execute(self.db.pool())
            .await
            .map_err(|e| DataError::DeleteError(e.to_string()))?;

        Ok(result.rows_affected())
    }

    async fn count(&self) -> Result<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM cik_lookup")
            .fetch_one(self.db.pool())
            .await?;
        Ok(count.max(0) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_conversion_trims_name() {
        let row = CikLookupRecord {
            cik: 320193,
            company_name: "  Apple Inc. ".to_string(),
            created_at: None,
            last_updated_at: None,
        };
        let record = CikLookup::try_from(row).unwrap();
        assert_eq!(record.cik.value(), 320193);
        assert_eq!(record.company_name, "Apple Inc.");
    }

    #[test]
    fn test_record_conversion_rejects_bad_cik() {
        let row = CikLookupRecord {
            cik: 0,
            company_name: "Nobody".to_string(),
            created_at: None,
            last_updated_at: None,
        };
        assert!(CikLookup::try_from(row).is_err());
    }
}
