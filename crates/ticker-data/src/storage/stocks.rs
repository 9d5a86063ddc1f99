//! `stocks` 테이블 repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use ticker_core::{Stock, Ticker};
use ticker_sync::Repository;
use tracing::{debug, instrument};

use super::{Database, UNNEST_CHUNK_SIZE};
use crate::error::{DataError, Result};

/// 종목 데이터베이스 레코드.
#[derive(Debug, Clone, FromRow)]
pub struct StockRecord {
    pub id: i64,
    pub symbol: String,
    pub company: Option<String>,
    pub exchange: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub last_updated_at: Option<DateTime<Utc>>,
}

impl TryFrom<StockRecord> for Stock {
    type Error = DataError;

    fn try_from(row: StockRecord) -> Result<Self> {
        let mut stock = Stock::new(
            Ticker::parse(&row.symbol)?,
            row.company.as_deref(),
            row.exchange.as_deref(),
        )?;
        stock.id = Some(row.id);
        stock.created_at = row.created_at;
        stock.last_updated_at = row.last_updated_at;
        Ok(stock)
    }
}

/// 종목 목록 repository.
#[derive(Clone)]
pub struct StocksRepository {
    db: Database,
}

impl StocksRepository {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// 거래소별 종목 수.
    pub async fn count_by_exchange(&self) -> Result<Vec<(Option<String>, u64)>> {
        let rows: Vec<(Option<String>, i64)> = sqlx::query_as(
            "SELECT exchange, COUNT(*) FROM stocks GROUP BY exchange ORDER BY exchange",
        )
        .fetch_all(self.db.pool())
        .await?;

        Ok(rows
            .into_iter()
            .map(|(exchange, count)| (exchange, count.max(0) as u64))
            .collect())
    }
}

#[async_trait]
impl Repository for StocksRepository {
    type Record = Stock;
    type Error = DataError;

    #[instrument(skip(self))]
    async fn get_all(&self) -> Result<Vec<Stock>> {
        let rows: Vec<StockRecord> = sqlx::query_as(
            r#"
            SELECT id, symbol, company, exchange, created_at, last_updated_at
            FROM stocks
            ORDER BY symbol
            "#,
        )
        .fetch_all(self.db.pool())
        .await?;

        rows.into_iter().map(Stock::try_from).collect()
    }

    #[instrument(skip(self, records), fields(count = records.len()))]
    async fn bulk_insert(&self, records: &[Stock]) -> Result<u64> {
        if records.is_empty() {
            return Ok(0);
        }

        let mut tx = self.db.pool().begin().await?;
        let mut inserted = 0;

        for chunk in records.chunks(UNNEST_CHUNK_SIZE) {
            let symbols: Vec<&str> = chunk.iter().map(|r| r.symbol.as_str()).collect();
            let companies: Vec<Option<&str>> = chunk.iter().map(|r| r.company.as_deref()).collect();
            let exchanges: Vec<Option<&str>> = chunk.iter().map(|r| r.exchange.as_deref()).collect();

            let result = sqlx::query(
                r#"
                INSERT INTO stocks (symbol, company, exchange, created_at, last_updated_at)
                SELECT t.symbol, t.company, t.exchange, NOW(), NOW()
                FROM UNNEST($1::text[], $2::text[], $3::text[]) AS t(symbol, company, exchange)
                "#,
            )
            .bind(&symbols)
            .bind(&companies)
            .bind(&exchanges)
            .execute(&mut *tx)
            .await
            .map_err(|e| DataError::InsertError(e.to_string()))?;

            inserted += result.rows_affected();
        }

        tx.commit().await?;
        debug!(inserted, "stocks 추가");
        Ok(inserted)
    }

    #[instrument(skip(self, records), fields(count = records.len()))]
    async fn bulk_update(&self, records: &[Stock]) -> Result<u64> {
        if records.is_empty() {
            return Ok(0);
        }

        let mut tx = self.db.pool().begin().await?;
        let mut updated = 0;

        for chunk in records.chunks(UNNEST_CHUNK_SIZE) {
            let symbols: Vec<&str> = chunk.iter().map(|r| r.symbol.as_str()).collect();
            let companies: Vec<Option<&str>> = chunk.iter().map(|r| r.company.as_deref()).collect();
            let exchanges: Vec<Option<&str>> = chunk.iter().map(|r| r.exchange.as_deref()).collect();

            let result = sqlx::query(
                r#"
                UPDATE stocks AS s
                SET company = t.company, exchange = t.exchange, last_updated_at = NOW()
                FROM UNNEST($1::text[], $2::text[], $3::text[]) AS t(symbol, company, exchange)
                WHERE s.symbol = t.symbol
                "#,
            )
            .bind(&symbols)
            .bind(&companies)
            .bind(&exchanges)
            .execute(&mut *tx)
            .await
            .map_err(|e| DataError::UpdateError(e.to_string()))?;

            updated += result.rows_affected();
        }

        tx.commit().await?;
        debug!(updated, "stocks 갱신");
        Ok(updated)
    }

    #[instrument(skip(self, keys), fields(count = keys.len()))]
    async fn bulk_delete(&self, keys: &[Ticker]) -> Result<u64> {
        if keys.is_empty() {
            return Ok(0);
        }

        let symbols: Vec<&str> = keys.iter().map(Ticker::as_str).collect();
        let result = sqlx::query("DELETE FROM stocks WHERE symbol = ANY($1)")
            .bind(&symbols)
            .execute(self.db.pool())
            .await
            .map_err(|e| DataError::DeleteError(e.to_string()))?;

        Ok(result.rows_affected())
    }

    async fn count(&self) -> Result<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM stocks")
            .fetch_one(self.db.pool())
            .await?;
        Ok(count.max(0) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_conversion() {
        let row = StockRecord {
            id: 1,
            symbol: "aapl".to_string(),
            company: Some("Apple Inc.".to_string()),
            exchange: Some("nasdaq".to_string()),
            created_at: None,
            last_updated_at: None,
        };
        let stock = Stock::try_from(row).unwrap();
        assert_eq!(stock.symbol.as_str(), "AAPL");
        assert_eq!(stock.exchange.as_deref(), Some("NASDAQ"));
        assert_eq!(stock.id, Some(1));
    }

    #[test]
    fn test_blank_company_is_none() {
        let row = StockRecord {
            id: 2,
            symbol: "XYZ".to_string(),
            company: Some("   ".to_string()),
            exchange: None,
            created_at: None,
            last_updated_at: None,
        };
        assert!(Stock::try_from(row).unwrap().company.is_none());
    }
}
