//! 테이블 상태 조회 (`status` 명령).

use std::fmt;

use serde::Serialize;
use ticker_core::DirectoryStatus;
use ticker_data::{
    CikLookupRepository, Database, StocksRepository, TickerDirectoryRepository,
    TickerOverviewRepository, TickerSummaryRepository,
};
use ticker_sync::Repository;

use crate::jobs::JobKind;
use crate::Result;

/// 전체 테이블 상태.
#[derive(Debug, Clone, Serialize)]
pub struct StatusReport {
    /// 테이블별 행 수 (의존 순서)
    pub tables: Vec<(String, u64)>,
    /// 비활성 디렉토리 행 수
    pub inactive_directory: u64,
    /// 거래소별 종목 수
    pub stocks_by_exchange: Vec<(String, u64)>,
}

/// 각 테이블의 행 수를 조회합니다.
pub async fn collect(db: &Database) -> Result<StatusReport> {
    db.health_check().await?;

    let directory = TickerDirectoryRepository::new(db.clone());
    let stocks = StocksRepository::new(db.clone());

    let mut tables = Vec::with_capacity(JobKind::ALL.len());
    for job in JobKind::ALL {
        let rows = match job {
            JobKind::CikLookup => CikLookupRepository::new(db.clone()).count().await?,
            JobKind::TickerDirectory => directory.count().await?,
            JobKind::TickerSummary => TickerSummaryRepository::new(db.clone()).count().await?,
            JobKind::TickerOverview => TickerOverviewRepository::new(db.clone()).count().await?,
            JobKind::Stocks => stocks.count().await?,
        };
        tables.push((job.table().to_string(), rows));
    }

    let inactive_directory = directory.count_by_status(DirectoryStatus::Inactive).await?;
    let stocks_by_exchange = stocks
        .count_by_exchange()
        .await?
        .into_iter()
        .map(|(exchange, rows)| (exchange.unwrap_or_else(|| "-".to_string()), rows))
        .collect();

    Ok(StatusReport {
        tables,
        inactive_directory,
        stocks_by_exchange,
    })
}

impl fmt::Display for StatusReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "== table status ==")?;
        for (table, rows) in &self.tables {
            writeln!(f, "  {:<18} {}", table, rows)?;
        }
        writeln!(f, "  {:<18} {}", "(inactive tickers)", self.inactive_directory)?;
        for (exchange, rows) in &self.stocks_by_exchange {
            writeln!(f, "  stocks[{}]: {}", exchange, rows)?;
        }
        Ok(())
    }
}
