//! 작업 실행 보고서.

use std::fmt;
use std::time::Duration;

use serde::Serialize;
use ticker_sync::{SyncStats, SynchronizationResult};
use ticker_core::SyncRecord;

/// 보고서에 싣는 실패 키 최대 수.
pub const SAMPLE_SIZE: usize = 10;

/// 실패 키와 사유.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedKey {
    pub key: String,
    pub reason: String,
}

/// 한 작업의 결과 요약.
#[derive(Debug, Clone, Serialize)]
pub struct JobReport {
    pub job: String,
    pub dry_run: bool,
    pub stats: SyncStats,
    /// 조회 실패 키 샘플
    pub failed_sample: Vec<FailedKey>,
    /// 조회 실패로 삭제된 키 샘플
    pub removed_sample: Vec<String>,
    /// 작업 후 테이블 행 수 (드라이런이면 메모리 사본의 행 수)
    pub final_count: u64,
    #[serde(skip)]
    pub elapsed: Duration,
}

impl JobReport {
    pub fn from_result<R: SyncRecord>(
        job: &str,
        result: &SynchronizationResult<R>,
        final_count: u64,
        dry_run: bool,
    ) -> Self {
        Self {
            job: job.to_string(),
            dry_run,
            stats: result.stats(),
            failed_sample: result
                .failed_sample(SAMPLE_SIZE)
                .iter()
                .map(|f| FailedKey {
                    key: f.key.to_string(),
                    reason: f.reason.to_string(),
                })
                .collect(),
            removed_sample: result
                .to_remove_due_to_errors
                .iter()
                .take(SAMPLE_SIZE)
                .map(|k| k.to_string())
                .collect(),
            final_count,
            elapsed: result.elapsed,
        }
    }

    /// 성공률 (%), 처리한 키가 없으면 0.
    pub fn success_rate(&self) -> f64 {
        let processed = self.stats.added + self.stats.updated + self.stats.unchanged + self.stats.failed;
        if processed == 0 {
            0.0
        } else {
            ((processed - self.stats.failed) as f64 / processed as f64) * 100.0
        }
    }
}

impl fmt::Display for JobReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mode = if self.dry_run { " (dry run)" } else { "" };
        writeln!(f, "== {}{} ==", self.job, mode)?;
        writeln!(f, "  added:                 {}", self.stats.added)?;
        writeln!(f, "  updated:               {}", self.stats.updated)?;
        writeln!(f, "  unchanged:             {}", self.stats.unchanged)?;
        writeln!(f, "  failed lookups:        {}", self.stats.failed)?;
        writeln!(f, "  deleted:               {}", self.stats.deleted)?;
        writeln!(f, "  removed due to errors: {}", self.stats.removed_due_to_errors)?;
        if self.stats.retained_due_to_errors > 0 {
            writeln!(f, "  retained (errors):     {}", self.stats.retained_due_to_errors)?;
        }
        writeln!(
            f,
            "  batches:               {} ({} with fallback)",
            self.stats.batches, self.stats.fallback_batches
        )?;
        for (kind, count) in &self.stats.failures_by_kind {
            writeln!(f, "    {:<20} {}", kind, count)?;
        }
        if !self.failed_sample.is_empty() {
            writeln!(f, "  failed sample:")?;
            for failed in &self.failed_sample {
                writeln!(f, "    {:<10} {}", failed.key, failed.reason)?;
            }
        }
        if !self.removed_sample.is_empty() {
            writeln!(f, "  removed sample: {}", self.removed_sample.join(", "))?;
        }
        writeln!(f, "  success rate:          {:.1}%", self.success_rate())?;
        writeln!(f, "  final row count:       {}", self.final_count)?;
        write!(f, "  elapsed:               {:.1}s", self.elapsed.as_secs_f64())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ticker_sync::{FailedLookup, FailureReason};

    #[derive(Debug, Clone, PartialEq)]
    struct Row(&'static str);

    impl SyncRecord for Row {
        type Key = String;

        fn key(&self) -> String {
            self.0.to_string()
        }

        fn differs_from(&self, _other: &Self) -> bool {
            false
        }
    }

    fn result() -> SynchronizationResult<Row> {
        let mut result = SynchronizationResult::new();
        result.to_add = vec![Row("A")];
        result.unchanged = vec!["B".to_string(), "C".to_string()];
        result.failed_lookup = vec![FailedLookup {
            key: "D".to_string(),
            reason: FailureReason::NoData,
        }];
        result.to_remove_due_to_errors = vec!["D".to_string()];
        result.batches_processed = 1;
        result
    }

    #[test]
    fn test_report_from_result() {
        let report = JobReport::from_result("stocks", &result(), 3, false);

        assert_eq!(report.stats.added, 1);
        assert_eq!(report.stats.unchanged, 2);
        assert_eq!(report.failed_sample.len(), 1);
        assert_eq!(report.failed_sample[0].key, "D");
        assert_eq!(report.removed_sample, vec!["D".to_string()]);
        assert!((report.success_rate() - 75.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_report_display() {
        let text = JobReport::from_result("stocks", &result(), 3, true).to_string();

        assert!(text.starts_with("== stocks (dry run) =="));
        assert!(text.contains("final row count:       3"));
        assert!(text.contains("removed sample: D"));
        assert!(text.contains("no_data"));
    }
}
