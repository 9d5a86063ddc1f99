//! `cik_lookup` 동기화: GitHub 티커 → SEC CIK → 회사명.

use ticker_data::{CikLookupRepository, CompanyNameEnricher, SecCikSource};

use super::{execute, JobKind};
use crate::context::JobContext;
use crate::report::JobReport;
use crate::Result;

pub(super) async fn run(ctx: &JobContext, dry_run: bool) -> Result<JobReport> {
    let job = JobKind::CikLookup;
    let directory = ctx.sec_directory().await?;

    let source = SecCikSource::new(ctx.github_tickers()?, directory.clone());
    let enricher = CompanyNameEnricher::new(directory);
    let repository = CikLookupRepository::new(ctx.database().clone());

    execute(job, job.settings(ctx), source, enricher, repository, dry_run).await
}
