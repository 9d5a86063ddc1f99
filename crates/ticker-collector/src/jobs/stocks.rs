//! `stocks` 동기화: 거래소별 티커 목록 → Yahoo `price` + `summaryDetail`.

use ticker_data::{ExchangeTickerSource, StockEnricher, StocksRepository};

use super::{execute, JobKind};
use crate::context::JobContext;
use crate::report::JobReport;
use crate::Result;

pub(super) async fn run(ctx: &JobContext, dry_run: bool) -> Result<JobReport> {
    let job = JobKind::Stocks;
    let settings = job.settings(ctx);

    let source = ExchangeTickerSource::new(&ctx.config().sources)?;
    let enricher = StockEnricher::new(ctx.yahoo().await?, settings.max_workers);
    let repository = StocksRepository::new(ctx.database().clone());

    execute(job, settings, source, enricher, repository, dry_run).await
}
