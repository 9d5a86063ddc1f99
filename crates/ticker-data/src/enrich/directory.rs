//! SEC 디렉토리 기반 조회기.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use ticker_core::{Cik, CompanyName, DirectoryListing, Ticker};
use ticker_sync::{FailureReason, Lookup, RecordEnricher};

use crate::error::DataError;
use crate::provider::SecCompanyDirectory;

/// CIK → 회사명.
pub struct CompanyNameEnricher {
    directory: Arc<SecCompanyDirectory>,
}

impl CompanyNameEnricher {
    pub fn new(directory: Arc<SecCompanyDirectory>) -> Self {
        Self { directory }
    }
}

#[async_trait]
impl RecordEnricher for CompanyNameEnricher {
    type Key = Cik;
    type Record = CompanyName;
    type Error = DataError;

    async fn lookup_batch(
        &self,
        keys: &[Cik],
    ) -> Result<HashMap<Cik, Lookup<CompanyName>>, DataError> {
        let found = self.directory.lookup_ciks(keys).await?;

        Ok(keys
            .iter()
            .map(|cik| {
                let lookup = match found.get(cik) {
                    Some(entry) if entry.title.is_empty() => Err(FailureReason::missing("title")),
                    Some(entry) => Ok(CompanyName {
                        cik: *cik,
                        name: entry.title.clone(),
                    }),
                    None => Err(FailureReason::UnknownKey),
                };
                (*cik, lookup)
            })
            .collect())
    }
}

/// 티커 → CIK.
pub struct DirectoryEnricher {
    directory: Arc<SecCompanyDirectory>,
}

impl DirectoryEnricher {
    pub fn new(directory: Arc<SecCompanyDirectory>) -> Self {
        Self { directory }
    }
}

#[async_trait]
impl RecordEnricher for DirectoryEnricher {
    type Key = Ticker;
    type Record = DirectoryListing;
    type Error = DataError;

    async fn lookup_batch(
        &self,
        keys: &[Ticker],
    ) -> Result<HashMap<Ticker, Lookup<DirectoryListing>>, DataError> {
        let found = self.directory.lookup_tickers(keys).await?;

        Ok(keys
            .iter()
            .map(|ticker| {
                let lookup = found
                    .get(ticker)
                    .map(|entry| DirectoryListing {
                        ticker: ticker.clone(),
                        cik: entry.cik,
                    })
                    .ok_or(FailureReason::UnknownKey);
                (ticker.clone(), lookup)
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    async fn directory(server: &mut mockito::ServerGuard) -> Arc<SecCompanyDirectory> {
        server
            .mock("GET", "/company_tickers.json")
            .with_status(200)
            .with_body(
                r#"{
                    "0": {"cik_str": 320193, "ticker": "AAPL", "title": "Apple Inc."},
                    "1": {"cik_str": 789019, "ticker": "MSFT", "title": "MICROSOFT CORP"},
                    "2": {"cik_str": 42, "ticker": "NONAME", "title": "   "}
                }"#,
            )
            .create_async()
            .await;

        Arc::new(
            SecCompanyDirectory::with_url(
                &format!("{}/company_tickers.json", server.url()),
                "ops@example.com",
                Duration::from_secs(5),
            )
            .unwrap(),
        )
    }

    #[tokio::test]
    async fn test_company_names() {
        let mut server = mockito::Server::new_async().await;
        let enricher = CompanyNameEnricher::new(directory(&mut server).await);

        let apple = Cik::new(320193).unwrap();
        let unknown = Cik::new(7).unwrap();
        let blank = Cik::new(42).unwrap();
        let results = enricher.lookup_batch(&[apple, unknown, blank]).await.unwrap();

        assert_eq!(results[&apple].as_ref().unwrap().name, "Apple Inc.");
        assert_eq!(results[&unknown], Err(FailureReason::UnknownKey));
        assert_eq!(results[&blank], Err(FailureReason::missing("title")));
    }

    #[tokio::test]
    async fn test_directory_listings() {
        let mut server = mockito::Server::new_async().await;
        let enricher = DirectoryEnricher::new(directory(&mut server).await);

        let msft = Ticker::parse("MSFT").unwrap();
        let nope = Ticker::parse("NOPE").unwrap();
        let results = enricher.lookup_batch(&[msft.clone(), nope.clone()]).await.unwrap();

        assert_eq!(results[&msft].as_ref().unwrap().cik.value(), 789019);
        assert_eq!(results[&nope], Err(FailureReason::UnknownKey));
    }
}
