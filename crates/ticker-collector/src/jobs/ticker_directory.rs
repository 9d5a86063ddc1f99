//! `ticker_directory` 동기화: GitHub 티커 → SEC CIK.
//!
//! 소스에서 사라진 티커는 행을 지우지 않고 비활성으로 표시합니다 (저장소가 처리).

use ticker_data::{DirectoryEnricher, TickerDirectoryRepository};

use super::{execute, JobKind};
use crate::context::JobContext;
use crate::report::JobReport;
use crate::Result;

pub(super) async fn run(ctx: &JobContext, dry_run: bool) -> Result<JobReport> {
    let job = JobKind::TickerDirectory;

    let source = ctx.github_tickers()?;
    let enricher = DirectoryEnricher::new(ctx.sec_directory().await?);
    let repository = TickerDirectoryRepository::new(ctx.database().clone());

    execute(job, job.settings(ctx), source, enricher, repository, dry_run).await
}
