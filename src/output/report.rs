use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// What happened to one enumerated interval.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum IntervalOutcome {
    AlreadyCompleted,
    BatchMissing,
    Written { rows: usize, failures: usize },
    Empty { records: usize, failures: usize },
    Failed { message: String },
}

impl IntervalOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            IntervalOutcome::AlreadyCompleted => "done",
            IntervalOutcome::BatchMissing => "missing",
            IntervalOutcome::Written { .. } => "written",
            IntervalOutcome::Empty { .. } => "empty",
            IntervalOutcome::Failed { .. } => "failed",
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, IntervalOutcome::Failed { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntervalReport {
    pub timestamp: String,
    pub outcome: IntervalOutcome,
    pub malformed_lines: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrawlSummary {
    pub intervals_total: usize,
    pub intervals_skipped: usize,
    pub intervals_missing: usize,
    pub intervals_written: usize,
    pub intervals_empty: usize,
    pub intervals_failed: usize,
    pub rows_written: usize,
    pub retrieval_failures: usize,
    pub malformed_lines: usize,
}

impl CrawlSummary {
    fn record(&mut self, report: &IntervalReport) {
        self.intervals_total += 1;
        self.malformed_lines += report.malformed_lines;

        match &report.outcome {
            IntervalOutcome::AlreadyCompleted => self.intervals_skipped += 1,
            IntervalOutcome::BatchMissing => self.intervals_missing += 1,
            IntervalOutcome::Written { rows, failures } => {
                self.intervals_written += 1;
                self.rows_written += rows;
                self.retrieval_failures += failures;
            }
            IntervalOutcome::Empty { failures, .. } => {
                self.intervals_empty += 1;
                self.retrieval_failures += failures;
            }
            IntervalOutcome::Failed { .. } => self.intervals_failed += 1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlReport {
    pub started_at: DateTime<Utc>,
    pub duration: Duration,
    pub intervals: Vec<IntervalReport>,
    pub summary: CrawlSummary,
    pub errors: Vec<String>,
    pub cancelled: bool,
}

impl CrawlReport {
    pub fn new() -> Self {
        Self {
            started_at: Utc::now(),
            duration: Duration::ZERO,
            intervals: Vec::new(),
            summary: CrawlSummary::default(),
            errors: Vec::new(),
            cancelled: false,
        }
    }

    pub fn push(&mut self, report: IntervalReport) {
        self.summary.record(&report);
        if let IntervalOutcome::Failed { message } = &report.outcome {
            self.errors.push(format!("{}: {}", report.timestamp, message));
        }
        self.intervals.push(report);
    }

    pub fn has_failures(&self) -> bool {
        self.summary.intervals_failed > 0
    }

    pub fn outcome_of(&self, timestamp: &str) -> Option<&IntervalOutcome> {
        self.intervals
            .iter()
            .find(|r| r.timestamp == timestamp)
            .map(|r| &r.outcome)
    }
}

impl Default for CrawlReport {
    fn default() -> Self {
        Self::new()
    }
}
