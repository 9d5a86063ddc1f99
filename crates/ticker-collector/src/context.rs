//! 작업 간 공유 자원.

use std::sync::Arc;

use ticker_core::SyncConfig;
use ticker_data::{Database, GithubTickerSource, SecCompanyDirectory, YahooClient};
use tokio::sync::OnceCell;

use crate::Result;

/// 설정, DB 연결, 외부 클라이언트.
///
/// SEC 디렉토리와 Yahoo 클라이언트는 처음 필요할 때 만들어 `run-all`의
/// 모든 작업이 같은 인스턴스(같은 다운로드, 같은 crumb)를 씁니다.
pub struct JobContext {
    config: SyncConfig,
    db: Database,
    sec: OnceCell<Arc<SecCompanyDirectory>>,
    yahoo: OnceCell<Arc<YahooClient>>,
}

impl JobContext {
    pub fn new(config: SyncConfig, db: Database) -> Self {
        Self {
            config,
            db,
            sec: OnceCell::new(),
            yahoo: OnceCell::new(),
        }
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    pub fn github_tickers(&self) -> Result<GithubTickerSource> {
        Ok(GithubTickerSource::new(&self.config.sources)?)
    }

    pub async fn sec_directory(&self) -> Result<Arc<SecCompanyDirectory>> {
        let directory = self
            .sec
            .get_or_try_init(|| async {
                let email = self.config.sec_user_email()?;
                let directory = SecCompanyDirectory::new(&self.config.sources, email)?;
                Ok::<_, crate::CollectorError>(Arc::new(directory))
            })
            .await?;
        Ok(Arc::clone(directory))
    }

    pub async fn yahoo(&self) -> Result<Arc<YahooClient>> {
        let client = self
            .yahoo
            .get_or_try_init(|| async {
                Ok::<_, crate::CollectorError>(Arc::new(YahooClient::new(&self.config.sources)?))
            })
            .await?;
        Ok(Arc::clone(client))
    }
}
