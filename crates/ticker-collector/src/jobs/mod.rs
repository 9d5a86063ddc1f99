//! 테이블별 동기화 작업.
//!
//! 각 작업은 소스, 조회기, 저장소를 조립해 같은 엔진([`SyncEngine`])으로 실행합니다.
//! `run-all`은 [`JobKind::ALL`] 순서(의존 순서)로 실행합니다.

mod cik_lookup;
mod stocks;
mod ticker_directory;
mod ticker_overview;
mod ticker_summary;

use std::fmt;

use clap::ValueEnum;
use ticker_core::{JobSettings, SourceRecord, SyncRecord};
use ticker_sync::{
    EngineOptions, MemoryRepository, RecordEnricher, Repository, SourceProvider, SyncEngine,
};
use tracing::info;

use crate::context::JobContext;
use crate::error::{CollectorError, Result};
use crate::report::JobReport;

/// 동기화 작업 종류.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum)]
pub enum JobKind {
    CikLookup,
    TickerDirectory,
    TickerSummary,
    TickerOverview,
    Stocks,
}

impl JobKind {
    /// 의존 순서.
    pub const ALL: [JobKind; 5] = [
        JobKind::CikLookup,
        JobKind::TickerDirectory,
        JobKind::TickerSummary,
        JobKind::TickerOverview,
        JobKind::Stocks,
    ];

    /// 테이블 이름.
    pub fn table(&self) -> &'static str {
        match self {
            JobKind::CikLookup => "cik_lookup",
            JobKind::TickerDirectory => "ticker_directory",
            JobKind::TickerSummary => "ticker_summary",
            JobKind::TickerOverview => "ticker_overview",
            JobKind::Stocks => "stocks",
        }
    }

    /// 이 작업의 설정.
    pub fn settings<'a>(&self, ctx: &'a JobContext) -> &'a JobSettings {
        let jobs = &ctx.config().jobs;
        match self {
            JobKind::CikLookup => &jobs.cik_lookup,
            JobKind::TickerDirectory => &jobs.ticker_directory,
            JobKind::TickerSummary => &jobs.ticker_summary,
            JobKind::TickerOverview => &jobs.ticker_overview,
            JobKind::Stocks => &jobs.stocks,
        }
    }
}

impl fmt::Display for JobKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.table())
    }
}

/// 작업 하나를 실행합니다.
pub async fn run_job(ctx: &JobContext, job: JobKind, dry_run: bool) -> Result<JobReport> {
    match job {
        JobKind::CikLookup => cik_lookup::run(ctx, dry_run).await,
        JobKind::TickerDirectory => ticker_directory::run(ctx, dry_run).await,
        JobKind::TickerSummary => ticker_summary::run(ctx, dry_run).await,
        JobKind::TickerOverview => ticker_overview::run(ctx, dry_run).await,
        JobKind::Stocks => stocks::run(ctx, dry_run).await,
    }
}

/// 모든 작업을 의존 순서로 실행합니다. 하나라도 실패하면 즉시 중단합니다.
pub async fn run_all(ctx: &JobContext, dry_run: bool) -> Result<Vec<JobReport>> {
    let mut reports = Vec::with_capacity(JobKind::ALL.len());
    for (step, job) in JobKind::ALL.iter().enumerate() {
        info!(step = step + 1, total = JobKind::ALL.len(), job = %job, "작업 시작");
        reports.push(run_job(ctx, *job, dry_run).await?);
    }
    Ok(reports)
}

/// 엔진을 실행하고 보고서를 만듭니다.
///
/// 실행 전에 `count()`로 연결을 확인합니다. 드라이런이면 테이블 스냅샷을
/// 메모리 저장소로 복사해 그 사본에 대해 실행하므로 실제 테이블은 바뀌지 않습니다.
pub async fn execute<S, E, R>(
    job: JobKind,
    settings: &JobSettings,
    source: S,
    enricher: E,
    repository: R,
    dry_run: bool,
) -> Result<JobReport>
where
    S: SourceProvider,
    E: RecordEnricher<Key = S::Key>,
    E::Record: SourceRecord<S::Attribute, Store = R::Record>,
    R: Repository,
    R::Record: SyncRecord<Key = S::Key>,
{
    let existing = repository.count().await.map_err(CollectorError::repository)?;
    info!(job = %job, rows = existing, dry_run, "연결 확인 완료");

    let options = EngineOptions::from(settings);

    if dry_run {
        let snapshot = repository.get_all().await.map_err(CollectorError::repository)?;
        let memory = MemoryRepository::with_records(snapshot);

        let engine = SyncEngine::new(job.table(), source, enricher, &memory, options);
        let result = engine.run().await?;
        let final_count = memory.count().await.map_err(CollectorError::repository)?;

        result.log_summary(job.table());
        return Ok(JobReport::from_result(job.table(), &result, final_count, true));
    }

    let engine = SyncEngine::new(job.table(), source, enricher, &repository, options);
    let result = engine.run().await?;
    let final_count = repository.count().await.map_err(CollectorError::repository)?;

    result.log_summary(job.table());
    Ok(JobReport::from_result(job.table(), &result, final_count, false))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dependency_order() {
        let names: Vec<&str> = JobKind::ALL.iter().map(JobKind::table).collect();
        assert_eq!(
            names,
            vec!["cik_lookup", "ticker_directory", "ticker_summary", "ticker_overview", "stocks"]
        );
    }

    #[test]
    fn test_cli_names() {
        assert_eq!(JobKind::from_str("ticker-summary", true), Ok(JobKind::TickerSummary));
        assert_eq!(JobKind::from_str("cik-lookup", true), Ok(JobKind::CikLookup));
        assert!(JobKind::from_str("prices", true).is_err());
    }
}
