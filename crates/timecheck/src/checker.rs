//! Dataset-level continuity check: detect, scan in parallel, reconcile.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use netcdf_parser::TimeAxisReader;
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use crate::dataset::Dataset;
use crate::error::{Result, TimecheckError};
use crate::frequency::{detect_frequency, ExpectedFrequency};
use crate::issue::Issue;
use crate::reconciler::Reconciler;
use crate::scanner::{scan_file, ScanResult};

/// Default scan pool width.
pub const DEFAULT_JOBS: usize = 8;

/// Pass/fail outcome of a continuity check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Verdict {
    Pass,
    Fail,
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Pass => f.write_str("Pass"),
            Verdict::Fail => f.write_str("Fail"),
        }
    }
}

/// Everything learned from checking one dataset.
#[derive(Debug, Clone, Serialize)]
pub struct CheckReport {
    pub dataset: PathBuf,
    pub frequency: ExpectedFrequency,
    pub files_checked: usize,
    pub issues: Vec<Issue>,
    pub verdict: Verdict,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl CheckReport {
    pub fn passed(&self) -> bool {
        self.verdict == Verdict::Pass
    }

    /// Process exit code: 0 on pass, 1 if any issue was recorded.
    pub fn exit_code(&self) -> i32 {
        match self.verdict {
            Verdict::Pass => 0,
            Verdict::Fail => 1,
        }
    }

    /// Status line consumed by the workflow that schedules checks.
    pub fn result_line(&self) -> String {
        format!("Result={}:dataset={}", self.verdict, self.dataset.display())
    }
}

/// Checks datasets with a bounded pool of scan workers.
#[derive(Clone)]
pub struct TimeChecker {
    reader: Arc<dyn TimeAxisReader>,
    jobs: usize,
}

impl TimeChecker {
    pub fn new(reader: impl TimeAxisReader + 'static) -> Self {
        Self {
            reader: Arc::new(reader),
            jobs: DEFAULT_JOBS,
        }
    }

    /// Set the maximum number of files scanned at once.
    pub fn with_jobs(mut self, jobs: usize) -> Self {
        self.jobs = jobs.max(1);
        self
    }

    /// Discover the `.nc` files in `dir` and check them.
    pub async fn check_dir(&self, dir: impl AsRef<Path>) -> Result<CheckReport> {
        let dir = dir.as_ref().to_path_buf();
        let dataset = tokio::task::spawn_blocking(move || Dataset::discover(dir)).await??;
        self.check_dataset(&dataset).await
    }

    /// Check an already-ordered dataset.
    #[instrument(skip(self, dataset), fields(dataset = %dataset.dir.display(), files = dataset.len()))]
    pub async fn check_dataset(&self, dataset: &Dataset) -> Result<CheckReport> {
        let started_at = Utc::now();
        info!("Running time continuity check");

        let first = dataset
            .representative()
            .ok_or_else(|| TimecheckError::EmptyDataset(dataset.dir.clone()))?
            .to_path_buf();
        let reader = Arc::clone(&self.reader);
        let frequency =
            tokio::task::spawn_blocking(move || detect_frequency(reader.as_ref(), &first)).await??;

        let results = self.scan_all(dataset, frequency.fixed_delta()).await?;
        let issues = Reconciler::new(&frequency).reconcile(&results)?;

        let verdict = if issues.is_empty() { Verdict::Pass } else { Verdict::Fail };
        if issues.is_empty() {
            info!("No time index issues found");
        } else {
            warn!(issues = issues.len(), "Time index issues found");
        }

        Ok(CheckReport {
            dataset: dataset.dir.clone(),
            frequency,
            files_checked: results.len(),
            issues,
            verdict,
            started_at,
            finished_at: Utc::now(),
        })
    }

    /// Scan every file on the worker pool and return results in index order.
    async fn scan_all(&self, dataset: &Dataset, expected_delta: Option<f64>) -> Result<Vec<ScanResult>> {
        let total = dataset.len();
        let completed = Arc::new(AtomicUsize::new(0));
        let mut buffer = ScanBuffer::new(total);

        let mut scans = stream::iter(dataset.files.iter().cloned().enumerate())
            .map(|(index, path)| {
                let reader = Arc::clone(&self.reader);
                let completed = Arc::clone(&completed);
                tokio::task::spawn_blocking(move || {
                    let result = scan_file(reader.as_ref(), &path, expected_delta, index);
                    let done = completed.fetch_add(1, Ordering::Relaxed) + 1;
                    debug!(file = %path.display(), done, total, "Checked time index");
                    result
                })
            })
            .buffer_unordered(self.jobs);

        while let Some(joined) = scans.next().await {
            buffer.insert(joined??);
        }

        buffer.into_ordered()
    }
}

/// Slots scan results by sequence index as they complete in any order.
struct ScanBuffer {
    slots: Vec<Option<ScanResult>>,
}

impl ScanBuffer {
    fn new(len: usize) -> Self {
        Self {
            slots: vec![None; len],
        }
    }

    fn insert(&mut self, result: ScanResult) {
        let index = result.index;
        self.slots[index] = Some(result);
    }

    fn into_ordered(self) -> Result<Vec<ScanResult>> {
        self.slots
            .into_iter()
            .enumerate()
            .map(|(index, slot)| slot.ok_or(TimecheckError::MissingScan(index)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::TimeSpan;

    fn result(index: usize) -> ScanResult {
        ScanResult {
            index,
            file: PathBuf::from(format!("f{}.nc", index)),
            span: Some(TimeSpan { first: index as f64, last: index as f64 }),
            issues: Vec::new(),
        }
    }

    #[test]
    fn test_buffer_reorders_by_index() {
        let mut buffer = ScanBuffer::new(3);
        buffer.insert(result(2));
        buffer.insert(result(0));
        buffer.insert(result(1));
        let ordered = buffer.into_ordered().unwrap();
        let indices: Vec<_> = ordered.iter().map(|r| r.index).collect();
        assert_eq!(indices, vec![0, 1, 2]);
    }

    #[test]
    fn test_buffer_reports_missing_slot() {
        let mut buffer = ScanBuffer::new(2);
        buffer.insert(result(1));
        assert!(matches!(buffer.into_ordered(), Err(TimecheckError::MissingScan(0))));
    }

    #[test]
    fn test_verdict_display() {
        assert_eq!(Verdict::Pass.to_string(), "Pass");
        assert_eq!(Verdict::Fail.to_string(), "Fail");
    }
}
