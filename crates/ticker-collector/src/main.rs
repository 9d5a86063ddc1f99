//! 티커 테이블 동기화 CLI.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use ticker_collector::{jobs, status, JobContext, JobKind};
use ticker_core::{init_logging, init_logging_from_env, LogFormat, SyncConfig};
use ticker_data::{Database, DatabaseConfig};

#[derive(Parser)]
#[command(name = "ticker-collector")]
#[command(about = "Ticker metadata table synchronizer", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// 설정 파일 경로 (TOML)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// 로그 레벨 (trace, debug, info, warn, error)
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// 로그 형식 (pretty, json, compact)
    #[arg(long, global = true)]
    log_format: Option<LogFormat>,
}

#[derive(Subcommand)]
enum Commands {
    /// 테이블 하나 동기화
    Sync {
        #[arg(value_enum)]
        job: JobKind,

        /// 메모리 사본에 대해서만 실행 (DB 변경 없음)
        #[arg(long)]
        dry_run: bool,
    },

    /// 전체 테이블을 의존 순서로 동기화
    RunAll {
        /// 메모리 사본에 대해서만 실행 (DB 변경 없음)
        #[arg(long)]
        dry_run: bool,
    },

    /// 마이그레이션 적용
    Migrate,

    /// 테이블별 행 수 조회
    Status,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    // 설정 로드 (실패하면 환경 변수 기준 로깅으로 에러를 남김)
    let mut config = match SyncConfig::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            init_logging_from_env().ok();
            tracing::error!(error = %e, "설정 로드 실패");
            return Err(anyhow::Error::new(e).context("설정 로드 실패"));
        }
    };
    if let Some(level) = cli.log_level {
        config.logging.level = level;
    }
    if let Some(format) = cli.log_format {
        config.logging.format = format;
    }

    // 로깅 초기화
    init_logging(config.logging.clone()).map_err(|e| anyhow::anyhow!("로깅 초기화 실패: {}", e))?;

    tracing::info!("Ticker Collector 시작");

    let result = run(cli.command, config).await;
    if let Err(e) = &result {
        tracing::error!(error = %format!("{:#}", e), "실행 실패");
    }
    result
}

async fn run(command: Commands, config: SyncConfig) -> anyhow::Result<()> {
    // DB 연결
    let db_config = DatabaseConfig::from_settings(config.database_url()?, &config.database);
    let db = Database::connect(&db_config).await?;
    tracing::info!("데이터베이스 연결 성공");

    let ctx = JobContext::new(config, db.clone());

    match command {
        Commands::Sync { job, dry_run } => {
            let report = jobs::run_job(&ctx, job, dry_run).await?;
            println!("{}", report);
        }
        Commands::RunAll { dry_run } => {
            tracing::info!("=== 전체 동기화 시작 ===");
            let reports = jobs::run_all(&ctx, dry_run).await?;
            for report in &reports {
                println!("{}\n", report);
            }
            tracing::info!(jobs = reports.len(), "=== 전체 동기화 완료 ===");
        }
        Commands::Migrate => {
            db.migrate().await?;
            println!("migrations applied");
        }
        Commands::Status => {
            let report = status::collect(&db).await?;
            println!("{}", report);
        }
    }

    db.close().await;
    tracing::info!("Ticker Collector 종료");

    Ok(())
}
