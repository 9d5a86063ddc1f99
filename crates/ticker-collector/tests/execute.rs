//! 작업 실행 경로 테스트 (고정 소스 + 메모리 저장소).

use std::collections::HashMap;
use std::convert::Infallible;

use async_trait::async_trait;
use ticker_collector::{execute, JobKind};
use ticker_core::{Cik, CikLookup, CompanyName, JobSettings};
use ticker_sync::{
    FailureReason, Lookup, MemoryRepository, PersistOperation, RecordEnricher, SourceProvider,
    SourceSet,
};

fn cik(n: i64) -> Cik {
    Cik::new(n).unwrap()
}

struct FixedCiks(Vec<i64>);

#[async_trait]
impl SourceProvider for FixedCiks {
    type Key = Cik;
    type Attribute = ();
    type Error = Infallible;

    fn name(&self) -> &str {
        "fixed"
    }

    async fn fetch_keys(&self) -> Result<SourceSet<Cik>, Infallible> {
        Ok(SourceSet::from_keys(self.0.iter().map(|n| cik(*n))))
    }
}

/// 짝수 CIK만 회사명을 돌려줍니다.
struct EvenNames;

#[async_trait]
impl RecordEnricher for EvenNames {
    type Key = Cik;
    type Record = CompanyName;
    type Error = Infallible;

    async fn lookup_batch(
        &self,
        keys: &[Cik],
    ) -> Result<HashMap<Cik, Lookup<CompanyName>>, Infallible> {
        Ok(keys
            .iter()
            .map(|key| {
                let lookup = if key.value() % 2 == 0 {
                    Ok(CompanyName {
                        cik: *key,
                        name: format!("Company {}", key.value()),
                    })
                } else {
                    Err(FailureReason::UnknownKey)
                };
                (*key, lookup)
            })
            .collect())
    }
}

fn settings() -> JobSettings {
    JobSettings {
        batch_size: 2,
        delay_base_ms: 0,
        delay_per_key_ms: 0,
        delay_max_ms: 0,
        retry_backoff_ms: 0,
        ..JobSettings::default()
    }
}

fn existing() -> Vec<CikLookup> {
    vec![
        CikLookup::new(cik(2), "Old Name").unwrap(),
        CikLookup::new(cik(3), "Gone Corp").unwrap(),
        CikLookup::new(cik(9), "Delisted").unwrap(),
    ]
}

#[tokio::test]
async fn test_dry_run_leaves_table_untouched() {
    let table = MemoryRepository::with_records(existing());

    let report = execute(
        JobKind::CikLookup,
        &settings(),
        FixedCiks(vec![2, 3, 4]),
        EvenNames,
        &table,
        true,
    )
    .await
    .unwrap();

    assert!(report.dry_run);
    assert_eq!(report.stats.added, 1);
    assert_eq!(report.stats.updated, 1);
    assert_eq!(report.stats.deleted, 1);
    assert_eq!(report.stats.removed_due_to_errors, 1);
    // 2, 4만 남음
    assert_eq!(report.final_count, 2);

    assert!(table.calls().await.is_empty());
    assert_eq!(table.snapshot().await, existing());
}

#[tokio::test]
async fn test_run_writes_changes() {
    let table = MemoryRepository::with_records(existing());

    let report = execute(
        JobKind::CikLookup,
        &settings(),
        FixedCiks(vec![2, 3, 4]),
        EvenNames,
        &table,
        false,
    )
    .await
    .unwrap();

    assert!(!report.dry_run);
    assert_eq!(report.final_count, 2);
    assert_eq!(report.failed_sample.len(), 1);
    assert_eq!(report.failed_sample[0].key, cik(3).to_string());

    let rows = table.snapshot().await;
    let names: Vec<&str> = rows.iter().map(|r| r.company_name.as_str()).collect();
    assert_eq!(names, vec!["Company 2", "Company 4"]);
    assert!(table.calls().await.contains(&PersistOperation::Insert));
}

#[tokio::test]
async fn test_empty_source_is_fatal() {
    let table = MemoryRepository::with_records(existing());

    let result = execute(
        JobKind::CikLookup,
        &settings(),
        FixedCiks(Vec::new()),
        EvenNames,
        &table,
        false,
    )
    .await;

    assert!(result.is_err());
    assert_eq!(table.snapshot().await, existing());
}
