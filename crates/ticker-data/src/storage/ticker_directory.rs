//! `ticker_directory` 테이블 repository.
//!
//! 이 테이블은 행을 지우지 않습니다. 소스에서 사라진 티커는 `inactive`로 바뀌고,
//! 다시 나타나면 추가 시 `active`로 되살아납니다.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use ticker_core::{Cik, DirectoryStatus, Ticker, TickerDirectory};
use ticker_sync::Repository;
use tracing::{debug, instrument};

use super::{Database, UNNEST_CHUNK_SIZE};
use crate::error::{DataError, Result};

/// 티커 디렉토리 데이터베이스 레코드.
#[derive(Debug, Clone, FromRow)]
pub struct TickerDirectoryRecord {
    pub id: i64,
    pub ticker: String,
    pub cik: i64,
    pub status: String,
    pub created_at: Option<DateTime<Utc>>,
    pub last_updated_at: Option<DateTime<Utc>>,
}

impl TryFrom<TickerDirectoryRecord> for TickerDirectory {
    type Error = DataError;

    fn try_from(row: TickerDirectoryRecord) -> Result<Self> {
        Ok(TickerDirectory {
            id: Some(row.id),
            ticker: Ticker::parse(&row.ticker)?,
            cik: Cik::new(row.cik)?,
            status: row.status.parse()?,
            created_at: row.created_at,
            last_updated_at: row.last_updated_at,
        })
    }
}

/// 티커 ↔ CIK 디렉토리 repository.
#[derive(Clone)]
pub struct TickerDirectoryRepository {
    db: Database,
}

impl TickerDirectoryRepository {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// 상태와 무관하게 티커 하나를 조회합니다.
    pub async fn find_by_ticker(&self, ticker: &Ticker) -> Result<Option<TickerDirectory>> {
        let row: Option<TickerDirectoryRecord> = sqlx::query_as(
            r#"
            SELECT id, ticker, cik, status, created_at, last_updated_at
            FROM ticker_directory
            WHERE ticker = $1
            "#,
        )
        .bind(ticker.as_str())
        .fetch_optional(self.db.pool())
        .await?;

        row.map(TickerDirectory::try_from).transpose()
    }

    /// 상태별 행 수.
    pub async fn count_by_status(&self, status: DirectoryStatus) -> Result<u64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM ticker_directory WHERE status = $1")
                .bind(status.as_str())
                .fetch_one(self.db.pool())
                .await?;
        Ok(count.max(0) as u64)
    }
}

#[async_trait]
impl Repository for TickerDirectoryRepository {
    type Record = TickerDirectory;
    type Error = DataError;

    /// 활성 행만 반환합니다.
    #[instrument(skip(self))]
    async fn get_all(&self) -> Result<Vec<TickerDirectory>> {
        let rows: Vec<TickerDirectoryRecord> = sqlx::query_as(
            r#"
            SELECT id, ticker, cik, status, created_at, last_updated_at
            FROM ticker_directory
            WHERE status = 'active'
            ORDER BY ticker
            "#,
        )
        .fetch_all(self.db.pool())
        .await?;

        rows.into_iter().map(TickerDirectory::try_from).collect()
    }

    /// 비활성 행이 있으면 활성으로 되살립니다.
    #[instrument(skip(self, records), fields(count = records.len()))]
    async fn bulk_insert(&self, records: &[TickerDirectory]) -> Result<u64> {
        if records.is_empty() {
            return Ok(0);
        }

        let mut tx = self.db.pool().begin().await?;
        let mut inserted = 0;

        for chunk in records.chunks(UNNEST_CHUNK_SIZE) {
            let tickers: Vec<&str> = chunk.iter().map(|r| r.ticker.as_str()).collect();
            let ciks: Vec<i64> = chunk.iter().map(|r| r.cik.value()).collect();

            let result = sqlx::query(
                r#"
                INSERT INTO ticker_directory (ticker, cik, status, created_at, last_updated_at)
                SELECT t.ticker, t.cik, 'active', NOW(), NOW()
                FROM UNNEST($1::text[], $2::bigint[]) AS t(ticker, cik)
                ON CONFLICT (ticker) DO UPDATE SET
                    cik = EXCLUDED.cik,
                    status = 'active',
                    last_updated_at = NOW()
                "#,
            )
            .bind(&tickers)
            .bind(&ciks)
            .execute(&mut *tx)
            .await
            .map_err(|e| DataError::InsertError(e.to_string()))?;

            inserted += result.rows_affected();
        }

        tx.commit().await?;
        debug!(inserted, "ticker_directory 추가");
        Ok(inserted)
    }

    #[instrument(skip(self, records), fields(count = records.len()))]
    async fn bulk_update(&self, records: &[TickerDirectory]) -> Result<u64> {
        if records.is_empty() {
            return Ok(0);
        }

        let mut tx = self.db.pool().begin().await?;
        let mut updated = 0;

        for chunk in records.chunks(UNNEST_CHUNK_SIZE) {
            let tickers: Vec<&str> = chunk.iter().map(|r| r.ticker.as_str()).collect();
            let ciks: Vec<i64> = chunk.iter().map(|r| r.cik.value()).collect();
            let statuses: Vec<&str> = chunk.iter().map(|r| r.status.as_str()).collect();

            let result = sqlx::query(
                r#"
                UPDATE ticker_directory AS d
                SET cik = t.cik, status = t.status, last_updated_at = NOW()
                FROM UNNEST($1::text[], $2::bigint[], $3::text[]) AS t(ticker, cik, status)
                WHERE d.ticker = t.ticker
                "#,
            )
            .bind(&tickers)
            .bind(&ciks)
            .bind(&statuses)
            .execute(&mut *tx)
            .await
            .map_err(|e| DataError::UpdateError(e.to_string()))?;

            updated += result.rows_affected();
        }

        tx.commit().await?;
        debug!(updated, "ticker_directory 갱신");
        Ok(updated)
    }

    /// 행을 지우지 않고 `inactive`로 표시합니다.
    #[instrument(skip(self, keys), fields(count = keys.len()))]
    async fn bulk_delete(&self, keys: &[Ticker]) -> Result<u64> {
        if keys.is_empty() {
            return Ok(0);
        }

        let tickers: Vec<&str> = keys.iter().map(Ticker::as_str).collect();
        let result = sqlx::query(
            r#"
            UPDATE ticker_directory
            SET status = 'inactive', last_updated_at = NOW()
            WHERE ticker = ANY($1) AND status = 'active'
            "#,
        )
        .bind(&tickers)
        .execute(self.db.pool())
        .await
        .map_err(|e| DataError::DeleteError(e.to_string()))?;

        Ok(result.rows_affected())
    }

    /// 활성 행 수.
    async fn count(&self) -> Result<u64> {
        self.count_by_status(DirectoryStatus::Active).await
    }
}
