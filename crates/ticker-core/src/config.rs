//! 설정 관리.
//!
//! 기본값 → TOML 파일 → `TICKER_SYNC__` 접두사 환경 변수 순으로 덮어씁니다.
//!
//! ```text
//! TICKER_SYNC__JOBS__TICKER_SUMMARY__BATCH_SIZE=25
//! TICKER_SYNC__LOGGING__FORMAT=json
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{TickerError, TickerResult};
use crate::logging::LogConfig;

/// 환경 변수 접두사.
pub const ENV_PREFIX: &str = "TICKER_SYNC";

/// 동기화 설정.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct SyncConfig {
    /// 데이터베이스 설정
    pub database: DatabaseSettings,
    /// 로깅 설정
    pub logging: LogConfig,
    /// 외부 소스 설정
    pub sources: SourceSettings,
    /// 테이블별 작업 설정
    pub jobs: JobsConfig,
}

/// 데이터베이스 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DatabaseSettings {
    /// 연결 URL (비어 있으면 `DATABASE_URL` 사용)
    #[serde(skip_serializing)]
    pub url: Option<String>,
    /// 최대 연결 수
    pub max_connections: u32,
    /// 최소 연결 수
    pub min_connections: u32,
    /// 연결 타임아웃 (초)
    pub connect_timeout_secs: u64,
    /// 유휴 타임아웃 (초)
    pub idle_timeout_secs: u64,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            url: None,
            max_connections: 5,
            min_connections: 1,
            connect_timeout_secs: 30,
            idle_timeout_secs: 600,
        }
    }
}

/// 외부 소스 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SourceSettings {
    /// 티커 목록 저장소의 raw 파일 기본 URL
    pub github_raw_base_url: String,
    /// SEC company_tickers.json URL
    pub sec_company_tickers_url: String,
    /// SEC User-Agent 이메일 (비어 있으면 `SEC_API_USER_EMAIL` 사용)
    pub sec_user_email: Option<String>,
    /// Yahoo Finance API 기본 URL
    pub yahoo_base_url: String,
    /// Yahoo 쿠키 발급 URL
    pub yahoo_cookie_url: String,
    /// 요청 타임아웃 (초)
    pub request_timeout_secs: u64,
}

impl Default for SourceSettings {
    fn default() -> Self {
        Self {
            github_raw_base_url:
                "https://raw.githubusercontent.com/JNewman-cell/Improved-US-Stock-Symbols/main"
                    .to_string(),
            sec_company_tickers_url: "https://www.sec.gov/files/company_tickers.json".to_string(),
            sec_user_email: None,
            yahoo_base_url: "https://query2.finance.yahoo.com".to_string(),
            yahoo_cookie_url: "https://fc.yahoo.com".to_string(),
            request_timeout_secs: 30,
        }
    }
}

/// 조회에 실패한 기존 레코드 처리 방식.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorPolicy {
    /// 저장소에서 삭제 (한 번의 조회 실패로도 삭제)
    #[default]
    Remove,
    /// 기존 행을 유지하고 보고만 함
    Retain,
}

/// 테이블별 작업 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct JobsConfig {
    pub cik_lookup: JobSettings,
    pub ticker_directory: JobSettings,
    pub ticker_summary: JobSettings,
    pub ticker_overview: JobSettings,
    pub stocks: JobSettings,
}

/// CIK 조회 작업 기본 배치 크기.
pub const CIK_LOOKUP_BATCH_SIZE: usize = 100;

impl Default for JobsConfig {
    fn default() -> Self {
        Self {
            cik_lookup: JobSettings {
                batch_size: CIK_LOOKUP_BATCH_SIZE,
                ..Default::default()
            },
            ticker_directory: JobSettings::default(),
            ticker_summary: JobSettings::default(),
            ticker_overview: JobSettings::default(),
            stocks: JobSettings::default(),
        }
    }
}

impl JobsConfig {
    /// 이름과 설정 쌍 (검증/출력용).
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &JobSettings)> {
        [
            ("cik_lookup", &self.cik_lookup),
            ("ticker_directory", &self.ticker_directory),
            ("ticker_summary", &self.ticker_summary),
            ("ticker_overview", &self.ticker_overview),
            ("stocks", &self.stocks),
        ]
        .into_iter()
    }
}

/// 한 동기화 작업의 배치/재시도/지연 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct JobSettings {
    /// 배치당 키 수
    pub batch_size: usize,
    /// 배치 내부 동시 조회 수
    pub max_workers: usize,
    /// 배치 간 기본 지연 (ms)
    pub delay_base_ms: u64,
    /// 키당 추가 지연 (ms)
    pub delay_per_key_ms: u64,
    /// 배치 간 최대 지연 (ms)
    pub delay_max_ms: u64,
    /// 배치 조회 시도 횟수
    pub retry_attempts: u32,
    /// 재시도 간격 (ms, 시도 횟수에 비례)
    pub retry_backoff_ms: u64,
    /// 조회 실패 레코드 처리 방식
    pub error_policy: ErrorPolicy,
}

impl Default for JobSettings {
    fn default() -> Self {
        Self {
            batch_size: 50,
            max_workers: 8,
            delay_base_ms: 1000,
            delay_per_key_ms: 20,
            delay_max_ms: 2000,
            retry_attempts: 3,
            retry_backoff_ms: 500,
            error_policy: ErrorPolicy::Remove,
        }
    }
}

impl JobSettings {
    fn validate(&self, job: &str) -> TickerResult<()> {
        if self.batch_size == 0 {
            return Err(TickerError::Config(format!("{}: batch_size는 0보다 커야 합니다", job)));
        }
        if self.max_workers == 0 {
            return Err(TickerError::Config(format!("{}: max_workers는 0보다 커야 합니다", job)));
        }
        if self.retry_attempts == 0 {
            return Err(TickerError::Config(format!(
                "{}: retry_attempts는 1 이상이어야 합니다",
                job
            )));
        }
        Ok(())
    }
}

impl SyncConfig {
    /// 설정을 로드합니다.
    ///
    /// `path`가 주어지면 해당 TOML 파일을 읽고, 환경 변수로 덮어쓴 뒤
    /// `DATABASE_URL`, `SEC_API_USER_EMAIL`로 빈 값을 채웁니다.
    pub fn load(path: Option<&Path>) -> TickerResult<Self> {
        let mut builder = Self::builder()?;

        // 파일에서 로드
        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path));
        }

        // 환경 변수로 오버라이드
        builder = builder.add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .try_parsing(true),
        );

        let mut config: SyncConfig = builder.build()?.try_deserialize()?;
        config.apply_env_fallbacks();
        config.validate()?;
        Ok(config)
    }

    /// TOML 문자열에서 설정을 생성합니다 (환경 변수 미적용).
    pub fn from_toml_str(toml: &str) -> TickerResult<Self> {
        let config: SyncConfig = Self::builder()?
            .add_source(config::File::from_str(toml, config::FileFormat::Toml))
            .build()?
            .try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    fn builder() -> TickerResult<config::ConfigBuilder<config::builder::DefaultState>> {
        // 부분 오버라이드 시에도 CIK 작업의 배치 크기 유지
        Ok(config::Config::builder()
            .set_default("jobs.cik_lookup.batch_size", CIK_LOOKUP_BATCH_SIZE as i64)?)
    }

    fn apply_env_fallbacks(&mut self) {
        if self.database.url.as_deref().map_or(true, str::is_empty) {
            self.database.url = std::env::var("DATABASE_URL").ok();
        }
        if self.sources.sec_user_email.as_deref().map_or(true, str::is_empty) {
            self.sources.sec_user_email = std::env::var("SEC_API_USER_EMAIL").ok();
        }
    }

    /// 값 범위를 검증합니다.
    pub fn validate(&self) -> TickerResult<()> {
        for (name, job) in self.jobs.iter() {
            job.validate(name)?;
        }
        if self.database.max_connections == 0 {
            return Err(TickerError::Config(
                "database.max_connections는 0보다 커야 합니다".to_string(),
            ));
        }
        Ok(())
    }

    /// 데이터베이스 URL (필수).
    pub fn database_url(&self) -> TickerResult<&str> {
        self.database
            .url
            .as_deref()
            .filter(|u| !u.is_empty())
            .ok_or_else(|| TickerError::Config("DATABASE_URL이 설정되지 않았습니다".to_string()))
    }

    /// SEC User-Agent 이메일 (필수).
    pub fn sec_user_email(&self) -> TickerResult<&str> {
        self.sources
            .sec_user_email
            .as_deref()
            .filter(|e| !e.is_empty())
            .ok_or_else(|| {
                TickerError::Config("SEC_API_USER_EMAIL이 설정되지 않았습니다".to_string())
            })
    }
}
