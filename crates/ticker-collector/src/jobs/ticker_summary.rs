//! `ticker_summary` 동기화: GitHub 티커 → SEC CIK + Yahoo `summaryDetail`.

use ticker_data::{SummaryEnricher, TickerSummaryRepository};

use super::{execute, JobKind};
use crate::context::JobContext;
use crate::report::JobReport;
use crate::Result;

pub(super) async fn run(ctx: &JobContext, dry_run: bool) -> Result<JobReport> {
    let job = JobKind::TickerSummary;
    let settings = job.settings(ctx);

    let source = ctx.github_tickers()?;
    let enricher = SummaryEnricher::new(
        ctx.sec_directory().await?,
        ctx.yahoo().await?,
        settings.max_workers,
    );
    let repository = TickerSummaryRepository::new(ctx.database().clone());

    execute(job, settings, source, enricher, repository, dry_run).await
}
