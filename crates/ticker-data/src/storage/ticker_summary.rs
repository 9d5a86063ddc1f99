//! `ticker_summary` 테이블 repository.

use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::FromRow;
use ticker_core::{Cik, Ticker, TickerSummary};
use ticker_sync::Repository;
use tracing::{debug, instrument};

use super::{Database, UNNEST_CHUNK_SIZE};
use crate::error::{DataError, Result};

/// 티커 요약 데이터베이스 레코드.
#[derive(Debug, Clone, FromRow)]
pub struct TickerSummaryRecord {
    pub ticker: String,
    pub cik: Option<i64>,
    pub market_cap: i64,
    pub previous_close: Decimal,
    pub pe_ratio: Option<Decimal>,
    pub forward_pe_ratio: Option<Decimal>,
    pub dividend_yield: Option<Decimal>,
    pub payout_ratio: Option<Decimal>,
    pub fifty_day_average: Decimal,
    pub two_hundred_day_average: Decimal,
}

impl TryFrom<TickerSummaryRecord> for TickerSummary {
    type Error = DataError;

    fn try_from(row: TickerSummaryRecord) -> Result<Self> {
        Ok(TickerSummary {
            ticker: Ticker::parse(&row.ticker)?,
            cik: row.cik.map(Cik::new).transpose()?,
            market_cap: row.market_cap,
            previous_close: row.previous_close,
            pe_ratio: row.pe_ratio,
            forward_pe_ratio: row.forward_pe_ratio,
            dividend_yield: row.dividend_yield,
            payout_ratio: row.payout_ratio,
            fifty_day_average: row.fifty_day_average,
            two_hundred_day_average: row.two_hundred_day_average,
        })
    }
}

/// 컬럼별 배열 (UNNEST 바인딩용).
struct SummaryColumns<'a> {
    tickers: Vec<&'a str>,
    ciks: Vec<Option<i64>>,
    market_caps: Vec<i64>,
    previous_closes: Vec<Decimal>,
    pe_ratios: Vec<Option<Decimal>>,
    forward_pe_ratios: Vec<Option<Decimal>>,
    dividend_yields: Vec<Option<Decimal>>,
    payout_ratios: Vec<Option<Decimal>>,
    fifty_day_averages: Vec<Decimal>,
    two_hundred_day_averages: Vec<Decimal>,
}

impl<'a> SummaryColumns<'a> {
    fn from_records(records: &'a [TickerSummary]) -> Self {
        Self {
            tickers: records.iter().map(|r| r.ticker.as_str()).collect(),
            ciks: records.iter().map(|r| r.cik.map(|c| c.value())).collect(),
            market_caps: records.iter().map(|r| r.market_cap).collect(),
            previous_closes: records.iter().map(|r| r.previous_close).collect(),
            pe_ratios: records.iter().map(|r| r.pe_ratio).collect(),
            forward_pe_ratios: records.iter().map(|r| r.forward_pe_ratio).collect(),
            dividend_yields: records.iter().map(|r| r.dividend_yield).collect(),
            payout_ratios: records.iter().map(|r| r.payout_ratio).collect(),
            fifty_day_averages: records.iter().map(|r| r.fifty_day_average).collect(),
            two_hundred_day_averages: records.iter().map(|r| r.two_hundred_day_average).collect(),
        }
    }

    fn bind<'q>(
        &'q self,
        query: sqlx::query::Query<'q, sqlx::Postgres, sqlx::postgres::PgArguments>,
    ) -> sqlx::query::Query<'q, sqlx::Postgres, sqlx::postgres::PgArguments> {
        query
            .bind(&self.tickers)
            .bind(&self.ciks)
            .bind(&self.market_caps)
            .bind(&self.previous_closes)
            .bind(&self.pe_ratios)
            .bind(&self.forward_pe_ratios)
            .bind(&self.dividend_yields)
            .bind(&self.payout_ratios)
            .bind(&self.fifty_day_averages)
            .bind(&self.two_hundred_day_averages)
    }
}

const UNNEST_COLUMNS: &str = r#"
    UNNEST(
        $1::text[], $2::bigint[], $3::bigint[], $4::numeric[], $5::numeric[],
        $6::numeric[], $7::numeric[], $8::numeric[], $9::numeric[], $10::numeric[]
    ) AS t(
        ticker, cik, market_cap, previous_close, pe_ratio,
        forward_pe_ratio, dividend_yield, payout_ratio,
        fifty_day_average, two_hundred_day_average
    )
"#;

/// 티커 요약 repository.
#[derive(Clone)]
pub struct TickerSummaryRepository {
    db: Database,
}

impl TickerSummaryRepository {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

#[async_trait]
impl Repository for TickerSummaryRepository {
    type Record = TickerSummary;
    type Error = DataError;

    #[instrument(skip(self))]
    async fn get_all(&self) -> Result<Vec<TickerSummary>> {
        let rows: Vec<TickerSummaryRecord> = sqlx::query_as(
            r#"
            SELECT ticker, cik, market_cap, previous_close, pe_ratio, forward_pe_ratio,
                   dividend_yield, payout_ratio, fifty_day_average, two_hundred_day_average
            FROM ticker_summary
            ORDER BY ticker
            "#,
        )
        .fetch_all(self.db.pool())
        .await?;

        rows.into_iter().map(TickerSummary::try_from).collect()
    }

    #[instrument(skip(self, records), fields(count = records.len()))]
    async fn bulk_insert(&self, records: &[TickerSummary]) -> Result<u64> {
        if records.is_empty() {
            return Ok(0);
        }

        let sql = format!(
            r#"
            INSERT INTO ticker_summary (
                ticker, cik, market_cap, previous_close, pe_ratio, forward_pe_ratio,
                dividend_yield, payout_ratio, fifty_day_average, two_hundred_day_average,
                created_at, last_updated_at
            )
            SELECT t.*, NOW(), NOW() FROM {}
            "#,
            UNNEST_COLUMNS
        );

        let mut tx = self.db.pool().begin().await?;
        let mut inserted = 0;

        for chunk in records.chunks(UNNEST_CHUNK_SIZE) {
            let columns = SummaryColumns::from_records(chunk);
            let result = columns
                .bind(sqlx::query(&sql))
                .execute(&mut *tx)
                .await
                .map_err(|e| DataError::InsertError(e.to_string()))?;
            inserted += result.rows_affected();
        }

        tx.commit().await?;
        debug!(inserted, "ticker_summary 추가");
        Ok(inserted)
    }

    #[instrument(skip(self, records), fields(count = records.len()))]
    async fn bulk_update(&self, records: &[TickerSummary]) -> Result<u64> {
        if records.is_empty() {
            return Ok(0);
        }

        let sql = format!(
            r#"
            UPDATE ticker_summary AS s SET
                cik = t.cik,
                market_cap = t.market_cap,
                previous_close = t.previous_close,
                pe_ratio = t.pe_ratio,
                forward_pe_ratio = t.forward_pe_ratio,
                dividend_yield = t.dividend_yield,
                payout_ratio = t.payout_ratio,
                fifty_day_average = t.fifty_day_average,
                two_hundred_day_average = t.two_hundred_day_average,
                last_updated_at = NOW()
            FROM {}
            WHERE s.ticker = t.ticker
            "#,
            UNNEST_COLUMNS
        );

        let mut tx = self.db.pool().begin().await?;
        let mut updated = 0;

        for chunk in records.chunks(UNNEST_CHUNK_SIZE) {
            let columns = SummaryColumns::from_records(chunk);
            let result = columns
                .bind(sqlx::query(&sql))
                .execute(&mut *tx)
                .await
                .map_err(|e| DataError::UpdateError(e.to_string()))?;
            updated += result.rows_affected();
        }

        tx.commit().await?;
        debug!(updated, "ticker_summary 갱신");
        Ok(updated)
    }

    #[instrument(skip(self, keys), fields(count = keys.len()))]
    async fn bulk_delete(&self, keys: &[Ticker]) -> Result<u64> {
        if keys.is_empty() {
            return Ok(0);
        }

        let tickers: Vec<&str> = keys.iter().map(Ticker::as_str).collect();
        let result = sqlx::query("DELETE FROM ticker_summary WHERE ticker = ANY($1)")
            .bind(&tickers)
            .execute(self.db.pool())
            .await
            .map_err(|e| DataError::DeleteError(e.to_string()))?;

        Ok(result.rows_affected())
    }

    async fn count(&self) -> Result<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM ticker_summary")
            .fetch_one(self.db.pool())
            .await?;
        Ok(count.max(0) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_record_conversion_keeps_optional_cik() {
        let row = TickerSummaryRecord {
            ticker: "MSFT".to_string(),
            cik: None,
            market_cap: 3_100_000_000_000,
            previous_close: dec!(415.5000),
            pe_ratio: Some(dec!(36.2)),
            forward_pe_ratio: None,
            dividend_yield: Some(dec!(0.0072)),
            payout_ratio: None,
            fifty_day_average: dec!(410.12),
            two_hundred_day_average: dec!(390.4),
        };
        let summary = TickerSummary::try_from(row).unwrap();
        assert_eq!(summary.ticker.as_str(), "MSFT");
        assert!(summary.cik.is_none());
        // NUMERIC 스케일 차이는 값 비교에 영향이 없음
        assert_eq!(summary.previous_close, dec!(415.5));
    }

    #[test]
    fn test_columns_follow_record_order() {
        let summary = TickerSummary {
            ticker: Ticker::parse("KO").unwrap(),
            cik: Some(Cik::new(21344).unwrap()),
            market_cap: 260_000_000_000,
            previous_close: dec!(60.1),
            pe_ratio: None,
            forward_pe_ratio: None,
            dividend_yield: None,
            payout_ratio: None,
            fifty_day_average: dec!(59.0),
            two_hundred_day_average: dec!(58.0),
        };
        let records = vec![summary];
        let columns = SummaryColumns::from_records(&records);
        assert_eq!(columns.tickers, vec!["KO"]);
        assert_eq!(columns.ciks, vec![Some(21344)]);
        assert_eq!(columns.market_caps, vec![260_000_000_000]);
    }
}
