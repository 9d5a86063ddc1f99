//! `ticker_overview` 동기화.
//!
//! 키 소스는 `ticker_summary` 테이블입니다. 요약이 있는 티커만 개요를 가집니다.

use ticker_data::{OverviewEnricher, TickerOverviewRepository, TickerSummaryRepository};
use ticker_sync::RepositoryKeySource;

use super::{execute, JobKind};
use crate::context::JobContext;
use crate::report::JobReport;
use crate::Result;

pub(super) async fn run(ctx: &JobContext, dry_run: bool) -> Result<JobReport> {
    let job = JobKind::TickerOverview;
    let settings = job.settings(ctx);

    let source = RepositoryKeySource::new(
        "table:ticker_summary",
        TickerSummaryRepository::new(ctx.database().clone()),
    );
    let enricher = OverviewEnricher::new(ctx.yahoo().await?, settings.max_workers);
    let repository = TickerOverviewRepository::new(ctx.database().clone());

    execute(job, settings, source, enricher, repository, dry_run).await
}
