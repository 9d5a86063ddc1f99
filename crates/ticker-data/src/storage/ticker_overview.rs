//! `ticker_overview` 테이블 repository.

use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::FromRow;
use ticker_core::{Ticker, TickerOverview};
use ticker_sync::Repository;
use tracing::{debug, instrument};

use super::{Database, UNNEST_CHUNK_SIZE};
use crate::error::{DataError, Result};

/// 티커 개요 데이터베이스 레코드.
#[derive(Debug, Clone, FromRow)]
pub struct TickerOverviewRecord {
    pub ticker: String,
    pub enterprise_to_ebitda: Option<Decimal>,
    pub price_to_book: Option<Decimal>,
    pub gross_margin: Option<Decimal>,
    pub operating_margin: Option<Decimal>,
    pub profit_margin: Option<Decimal>,
    pub ebitda_margin: Option<Decimal>,
    pub earnings_growth: Option<Decimal>,
    pub revenue_growth: Option<Decimal>,
    pub trailing_eps: Option<Decimal>,
    pub forward_eps: Option<Decimal>,
    pub peg_ratio: Option<Decimal>,
}

impl TryFrom<TickerOverviewRecord> for TickerOverview {
    type Error = DataError;

    fn try_from(row: TickerOverviewRecord) -> Result<Self> {
        Ok(TickerOverview {
            ticker: Ticker::parse(&row.ticker)?,
            enterprise_to_ebitda: row.enterprise_to_ebitda,
            price_to_book: row.price_to_book,
            gross_margin: row.gross_margin,
            operating_margin: row.operating_margin,
            profit_margin: row.profit_margin,
            ebitda_margin: row.ebitda_margin,
            earnings_growth: row.earnings_growth,
            revenue_growth: row.revenue_growth,
            trailing_eps: row.trailing_eps,
            forward_eps: row.forward_eps,
            peg_ratio: row.peg_ratio,
        })
    }
}

/// 숫자 컬럼 이름 (테이블 정의 순서).
const METRIC_COLUMNS: [&str; 11] = [
    "enterprise_to_ebitda",
    "price_to_book",
    "gross_margin",
    "operating_margin",
    "profit_margin",
    "ebitda_margin",
    "earnings_growth",
    "revenue_growth",
    "trailing_eps",
    "forward_eps",
    "peg_ratio",
];

fn metric_values(record: &TickerOverview) -> [Option<Decimal>; 11] {
    [
        record.enterprise_to_ebitda,
        record.price_to_book,
        record.gross_margin,
        record.operating_margin,
        record.profit_margin,
        record.ebitda_margin,
        record.earnings_growth,
        record.revenue_growth,
        record.trailing_eps,
        record.forward_eps,
        record.peg_ratio,
    ]
}

/// `UNNEST($1::text[], $2::numeric[], ...) AS t(ticker, ...)` 절.
fn unnest_clause() -> String {
    let params: Vec<String> = (0..METRIC_COLUMNS.len())
        .map(|i| format!("${}::numeric[]", i + 2))
        .collect();
    format!(
        "UNNEST($1::text[], {}) AS t(ticker, {})",
        params.join(", "),
        METRIC_COLUMNS.join(", ")
    )
}

/// 레코드 목록을 컬럼별 배열로 바꿔 바인딩합니다.
fn bind_columns<'q>(
    mut query: sqlx::query::Query<'q, sqlx::Postgres, sqlx::postgres::PgArguments>,
    records: &[TickerOverview],
) -> sqlx::query::Query<'q, sqlx::Postgres, sqlx::postgres::PgArguments> {
    let tickers: Vec<String> = records.iter().map(|r| r.ticker.to_string()).collect();
    query = query.bind(tickers);

    let rows: Vec<[Option<Decimal>; 11]> = records.iter().map(metric_values).collect();
    for i in 0..METRIC_COLUMNS.len() {
        let column: Vec<Option<Decimal>> = rows.iter().map(|values| values[i]).collect();
        query = query.bind(column);
    }
    query
}

/// 티커 개요 repository.
#[derive(Clone)]
pub struct TickerOverviewRepository {
    db: Database,
}

impl TickerOverviewRepository {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

#[async_trait]
impl Repository for TickerOverviewRepository {
    type Record = TickerOverview;
    type Error = DataError;

    #[instrument(skip(self))]
    async fn get_all(&self) -> Result<Vec<TickerOverview>> {
        let sql = format!(
            "SELECT ticker, {} FROM ticker_overview ORDER BY ticker",
            METRIC_COLUMNS.join(", ")
        );
        let rows: Vec<TickerOverviewRecord> = sqlx::query_as(&sql)
            .fetch_all(self.db.pool())
            .await?;

        rows.into_iter().map(TickerOverview::try_from).collect()
    }

    #[instrument(skip(self, records), fields(count = records.len()))]
    async fn bulk_insert(&self, records: &[TickerOverview]) -> Result<u64> {
        if records.is_empty() {
            return Ok(0);
        }

        let sql = format!(
            r#"
            INSERT INTO ticker_overview (ticker, {}, created_at, last_updated_at)
            SELECT t.*, NOW(), NOW() FROM {}
            "#,
            METRIC_COLUMNS.join(", "),
            unnest_clause()
        );

        let mut tx = self.db.pool().begin().await?;
        let mut inserted = 0;

        for chunk in records.chunks(UNNEST_CHUNK_SIZE) {
            let result = bind_columns(sqlx::query(&sql), chunk)
                .execute(&mut *tx)
                .await
                .map_err(|e| DataError::InsertError(e.to_string()))?;
            inserted += result.rows_affected();
        }

        tx.commit().await?;
        debug!(inserted, "ticker_overview 추가");
        Ok(inserted)
    }

    #[instrument(skip(self, records), fields(count = records.len()))]
    async fn bulk_update(&self, records: &[TickerOverview]) -> Result<u64> {
        if records.is_empty() {
            return Ok(0);
        }

        let assignments: Vec<String> = METRIC_COLUMNS
            .iter()
            .map(|c| format!("{c} = t.{c}"))
            .collect();
        let sql = format!(
            r#"
            UPDATE ticker_overview AS o SET {}, last_updated_at = NOW()
            FROM {}
            WHERE o.ticker = t.ticker
            "#,
            assignments.join(", "),
            unnest_clause()
        );

        let mut tx = self.db.pool().begin().await?;
        let mut updated = 0;

        for chunk in records.chunks(UNNEST_CHUNK_SIZE) {
            let result = bind_columns(sqlx::query(&sql), chunk)
                .execute(&mut *tx)
                .await
                .map_err(|e| DataError::UpdateError(e.to_string()))?;
            updated += result.rows_affected();
        }

        tx.commit().await?;
        debug!(updated, "ticker_overview 갱신");
        Ok(updated)
    }

    #[instrument(skip(self, keys), fields(count = keys.len()))]
    async fn bulk_delete(&self, keys: &[Ticker]) -> Result<u64> {
        if keys.is_empty() {
            return Ok(0);
        }

        let tickers: Vec<&str> = keys.iter().map(Ticker::as_str).collect();
        let result = sqlx::query("DELETE FROM ticker_overview WHERE ticker = ANY($1)")
            .bind(&tickers)
            .execute(self.db.pool())
            .await
            .map_err(|e| DataError::DeleteError(e.to_string()))?;

        Ok(result.rows_affected())
    }

    async fn count(&self) -> Result<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM ticker_overview")
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
    fn test_unnest_clause_numbers_parameters() {
        let clause = unnest_clause();
        assert!(clause.starts_with("UNNEST($1::text[], $2::numeric[]"));
        assert!(clause.contains("$12::numeric[]) AS t(ticker, enterprise_to_ebitda"));
        assert!(clause.ends_with("forward_eps, peg_ratio)"));
    }

    #[test]
    fn test_metric_values_follow_column_order() {
        let mut overview = TickerOverview::new(Ticker::parse("AAPL").unwrap());
        overview.gross_margin = Some(dec!(45.96));
        overview.peg_ratio = Some(dec!(2.1));

        let values = metric_values(&overview);
        assert_eq!(values[2], Some(dec!(45.96)));
        assert_eq!(values[10], Some(dec!(2.1)));
        assert_eq!(values.iter().filter(|v| v.is_some()).count(), 2);
    }
}
